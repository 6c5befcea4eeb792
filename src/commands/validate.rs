//! Validate command implementation

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::thread;

use crate::config::{ClusterConfiguration, ConfigError, NodePoolConfiguration};
use crate::utils::{KubeAwsError, discover_node_pools, read_config};

/// Options for the validate command
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub cluster_config: PathBuf,
    pub node_pools_dir: PathBuf,
    /// Extra node pool files given on the command line
    pub node_pool_files: Vec<PathBuf>,
    pub parallel: bool,
}

/// Outcome of validating one node pool file
#[derive(Debug)]
pub struct NodePoolOutcome {
    pub path: PathBuf,
    pub result: Result<NodePoolConfiguration, ConfigError>,
}

/// Results for a cluster and all of its node pools
#[derive(Debug)]
pub struct ValidationReport {
    pub cluster_config: PathBuf,
    pub node_pools: Vec<NodePoolOutcome>,
}

impl ValidationReport {
    pub fn is_success(&self) -> bool {
        self.node_pools.iter().all(|outcome| outcome.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &ConfigError)> {
        self.node_pools.iter().filter_map(|outcome| match &outcome.result {
            Ok(_) => None,
            Err(err) => Some((outcome.path.as_path(), err)),
        })
    }

    /// Print one line per node pool followed by details for each failure
    pub fn print(&self) {
        println!("{} {}", "✓".green(), self.cluster_config.display());

        for outcome in &self.node_pools {
            match &outcome.result {
                Ok(config) => println!(
                    "{} {} (node pool {})",
                    "✓".green(),
                    outcome.path.display(),
                    config.node_pool_name
                ),
                Err(_) => println!("{} {}", "✗".red(), outcome.path.display()),
            }
        }

        for (path, err) in self.failures() {
            println!();
            KubeAwsError::from_config_error(path, err).display();
        }
    }
}

/// Load and validate the cluster configuration
pub fn load_cluster(path: &Path) -> Result<ClusterConfiguration> {
    let bytes = read_config(path)?;
    ClusterConfiguration::parse(&bytes)
        .with_context(|| format!("Invalid cluster configuration: {}", path.display()))
}

/// Validate every node pool file against the same cluster
///
/// Each node pool is independent, so with `parallel` set they are
/// validated on scoped threads sharing the read-only cluster.
pub fn validate_node_pools(
    cluster: &ClusterConfiguration,
    files: Vec<(PathBuf, Vec<u8>)>,
    parallel: bool,
) -> Vec<NodePoolOutcome> {
    let check = |(path, bytes): (PathBuf, Vec<u8>)| {
        tracing::debug!(path = %path.display(), "validating node pool");
        NodePoolOutcome {
            result: NodePoolConfiguration::parse(&bytes, cluster),
            path,
        }
    };

    if !parallel || files.len() < 2 {
        return files.into_iter().map(check).collect();
    }

    thread::scope(|scope| {
        let handles: Vec<_> = files
            .into_iter()
            .map(|file| scope.spawn(move || check(file)))
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(outcome) => outcome,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

/// Handle validate command
pub fn validate(options: ValidateOptions) -> Result<ValidationReport> {
    crate::log_info!("Validating {}", options.cluster_config.display());
    let cluster = load_cluster(&options.cluster_config)?;

    let mut paths = discover_node_pools(&options.node_pools_dir)?;
    for path in options.node_pool_files {
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    let files = paths
        .into_iter()
        .map(|path| read_config(&path).map(|bytes| (path, bytes)))
        .collect::<Result<Vec<_>>>()?;

    crate::log_info!("Found {} node pool(s)", files.len());
    let node_pools = validate_node_pools(&cluster, files, options.parallel);

    Ok(ValidationReport {
        cluster_config: options.cluster_config,
        node_pools,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CLUSTER_YAML: &str = "region: us-west-1
availabilityZone: us-west-1a
apiEndpoints:
- name: default
  dnsName: k8s.example.com
";

    fn pool_yaml(name: &str) -> String {
        format!(
            "clusterName: mycluster\nnodePoolName: {}\ndnsServiceIP: 10.3.0.10\netcdEndpoints: 10.0.0.1\n",
            name
        )
    }

    fn write_pool(root: &Path, name: &str, contents: &str) -> PathBuf {
        let dir = root.join("node-pools").join(name);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cluster.yaml");
        fs::write(&path, contents).unwrap();
        path
    }

    fn options(root: &Path, parallel: bool) -> ValidateOptions {
        ValidateOptions {
            cluster_config: root.join("cluster.yaml"),
            node_pools_dir: root.join("node-pools"),
            node_pool_files: Vec::new(),
            parallel,
        }
    }

    #[test]
    fn test_validate_all_pools() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cluster.yaml"), CLUSTER_YAML).unwrap();
        write_pool(dir.path(), "pool1", &pool_yaml("pool1"));
        write_pool(dir.path(), "pool2", &pool_yaml("pool2"));

        for parallel in [false, true] {
            let report = validate(options(dir.path(), parallel)).unwrap();
            assert!(report.is_success());
            assert_eq!(report.node_pools.len(), 2);
            let names: Vec<_> = report
                .node_pools
                .iter()
                .map(|outcome| outcome.result.as_ref().unwrap().node_pool_name.clone())
                .collect();
            assert_eq!(names, vec!["pool1", "pool2"]);
        }
    }

    #[test]
    fn test_failing_pool_does_not_hide_others() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cluster.yaml"), CLUSTER_YAML).unwrap();
        write_pool(dir.path(), "good", &pool_yaml("good"));
        let bad = write_pool(
            dir.path(),
            "bad",
            &format!("{}region: us-east-1\n", pool_yaml("bad")),
        );

        let report = validate(options(dir.path(), true)).unwrap();
        assert!(!report.is_success());

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, bad.as_path());
        assert!(matches!(failures[0].1, ConfigError::Inheritance { field: "region", .. }));
    }

    #[test]
    fn test_explicit_node_pool_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cluster.yaml"), CLUSTER_YAML).unwrap();
        let extra = dir.path().join("extra.yaml");
        fs::write(&extra, pool_yaml("extra")).unwrap();

        let mut opts = options(dir.path(), false);
        opts.node_pool_files.push(extra);
        let report = validate(opts).unwrap();
        assert_eq!(report.node_pools.len(), 1);
        assert!(report.is_success());
    }

    #[test]
    fn test_invalid_cluster_fails_command() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cluster.yaml"), "region: us-west-1\n").unwrap();

        let err = validate(options(dir.path(), false)).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }
}
