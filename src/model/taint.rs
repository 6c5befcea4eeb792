//! Node taints applied to every worker of a node pool

use super::UnknownVariant;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the scheduler treats pods that do not tolerate a taint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

impl TaintEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaintEffect::NoSchedule => "NoSchedule",
            TaintEffect::PreferNoSchedule => "PreferNoSchedule",
            TaintEffect::NoExecute => "NoExecute",
        }
    }
}

impl FromStr for TaintEffect {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NoSchedule" => Ok(TaintEffect::NoSchedule),
            "PreferNoSchedule" => Ok(TaintEffect::PreferNoSchedule),
            "NoExecute" => Ok(TaintEffect::NoExecute),
            other => Err(UnknownVariant::new("taint effect", other)),
        }
    }
}

impl fmt::Display for TaintEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    pub value: String,
    pub effect: TaintEffect,
}

impl Taint {
    /// Build a taint from its document form, rejecting unknown effects
    pub fn parse(
        key: impl Into<String>,
        value: impl Into<String>,
        effect: &str,
    ) -> Result<Self, UnknownVariant> {
        Ok(Self {
            key: key.into(),
            value: value.into(),
            effect: effect.parse()?,
        })
    }
}

/// Renders as `key=value:Effect`, the form kubelet's `--register-with-taints` takes
impl fmt::Display for Taint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}:{}", self.key, self.value, self.effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_effects() {
        for effect in ["NoSchedule", "PreferNoSchedule", "NoExecute"] {
            let parsed: TaintEffect = effect.parse().unwrap();
            assert_eq!(parsed.as_str(), effect);
        }
    }

    #[test]
    fn test_unknown_effect_message() {
        let err = Taint::parse("foo", "bar", "UnknownEffect").unwrap_err();
        assert_eq!(err.to_string(), "invalid taint effect: UnknownEffect");
    }

    #[test]
    fn test_effect_is_case_sensitive() {
        assert!("noschedule".parse::<TaintEffect>().is_err());
    }

    #[test]
    fn test_taint_display() {
        let taint = Taint::parse("dedicated", "gpu", "NoSchedule").unwrap();
        assert_eq!(taint.to_string(), "dedicated=gpu:NoSchedule");
    }
}
