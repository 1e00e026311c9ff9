//! # Vigil Core — shared ambient library
//!
//! Common plumbing for the Vigil crisis-risk triage suite. Every analysis
//! component links against this crate for:
//! - **Errors** — the `VigilError` taxonomy and `VigilResult` alias
//! - **Configuration** — typed TOML config with tuned-default fallbacks
//! - **Case log** — the append-only sink high/critical assessments are
//!   forwarded to for operator review

pub mod case_log;
pub mod config;
pub mod error;

pub use case_log::{CaseLog, HighRiskCase};
pub use config::VigilConfig;
pub use error::{VigilError, VigilResult};
