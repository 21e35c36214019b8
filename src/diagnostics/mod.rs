//! Service self-diagnostics.
//!
//! - [`self_repair`] - Model-driven introspection report with safe defaults
//! - [`history`] - Bounded log of past reports, optionally file-backed
//! - [`system_check`] - Live probes of environment, generator and store

pub mod history;
pub mod self_repair;
pub mod system_check;

pub use history::DiagnosticLog;
pub use self_repair::{
    CheckResult, Checks, DiagnosticReport, HealthStatus, OverallStatus, SelfRepair,
    SelfRepairInput,
};
pub use system_check::{SystemCheck, SystemHealth, SystemStatus};
