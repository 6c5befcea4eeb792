//! Command implementations for kube-aws CLI

pub mod show;
pub mod validate;
