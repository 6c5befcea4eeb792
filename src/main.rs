//! kube-aws CLI - validate cluster and node pool configuration

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use kube_aws::commands::{show, validate};
use kube_aws::config::settings::{OutputFormat, Settings};
use kube_aws::utils::{display_error_and_exit, enhance_error, logger};
use kube_aws::{log_error, log_info};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kube-aws")]
#[command(author, version, about = "Validate kube-aws cluster and node pool configuration", long_about = None)]
struct Cli {
    /// Verbose output (can be used multiple times: -v, -vv, -vvv)
    /// -v: INFO, -vv: DEBUG, -vvv: TRACE
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the cluster configuration and every node pool
    Validate {
        /// Path to the cluster's cluster.yaml
        #[arg(short, long)]
        cluster: Option<PathBuf>,

        /// Directory holding one <name>/cluster.yaml per node pool
        #[arg(long)]
        node_pools: Option<PathBuf>,

        /// Validate node pools one after another
        #[arg(long)]
        sequential: bool,

        /// Additional node pool files
        files: Vec<PathBuf>,
    },

    /// Print a node pool's configuration after inheritance and defaults
    Show {
        /// Path to the node pool's cluster.yaml
        #[arg(short, long)]
        node_pool: PathBuf,

        /// Path to the cluster's cluster.yaml
        #[arg(short, long)]
        cluster: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// Manage kube-aws settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print an example settings file
    Example,

    /// Write a settings file with the default values
    Init {
        /// Where to write the settings file
        #[arg(short, long, default_value = ".kube-aws.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logger::init(cli.verbose);

    let settings = Settings::load();
    if cli.no_color || !settings.colors.enabled {
        colored::control::set_override(false);
    }

    let result = match cli.command {
        Commands::Validate {
            cluster,
            node_pools,
            sequential,
            files,
        } => handle_validate_command(&settings, cluster, node_pools, sequential, files),
        Commands::Show {
            node_pool,
            cluster,
            output,
        } => handle_show_command(&settings, node_pool, cluster, output),
        Commands::Settings { command } => handle_settings_command(command),
        Commands::Completion { shell } => handle_completion_command(shell),
        Commands::Version => handle_version_command(),
    };

    if let Err(err) = result {
        display_error_and_exit(enhance_error(err));
    }

    Ok(())
}

fn handle_validate_command(
    settings: &Settings,
    cluster: Option<PathBuf>,
    node_pools: Option<PathBuf>,
    sequential: bool,
    files: Vec<PathBuf>,
) -> Result<()> {
    let options = validate::ValidateOptions {
        cluster_config: cluster.unwrap_or_else(|| PathBuf::from(&settings.defaults.cluster_config)),
        node_pools_dir: node_pools
            .unwrap_or_else(|| PathBuf::from(&settings.defaults.node_pools_dir)),
        node_pool_files: files,
        parallel: settings.behavior.parallel_validation && !sequential,
    };

    let report = validate::validate(options)?;
    report.print();

    if !report.is_success() {
        let failed = report.failures().count();
        log_error!("{} node pool(s) failed validation", failed);
        std::process::exit(1);
    }

    log_info!("All configuration is valid");
    Ok(())
}

fn handle_show_command(
    settings: &Settings,
    node_pool: PathBuf,
    cluster: Option<PathBuf>,
    output: Option<OutputFormat>,
) -> Result<()> {
    let cluster = cluster.unwrap_or_else(|| PathBuf::from(&settings.defaults.cluster_config));
    show::show(&cluster, &node_pool, output.unwrap_or(settings.defaults.output))
}

fn handle_settings_command(command: SettingsCommands) -> Result<()> {
    match command {
        SettingsCommands::Example => {
            print!("{}", Settings::example_config()?);
            Ok(())
        }
        SettingsCommands::Init { path, force } => {
            Settings::init(&path, force)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn handle_completion_command(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "kube-aws", &mut io::stdout());
    Ok(())
}

fn handle_version_command() -> Result<()> {
    println!("kube-aws {}", env!("CARGO_PKG_VERSION"));
    println!("Cluster and node pool configuration validator");
    Ok(())
}
