//! Command-line front end for the scenario-call preprocessor.
//!
//! The `scenario-call` binary expands scenario calls in feature files
//! before they are handed to a Gherkin runner, writing the expanded text
//! to stdout or to an output directory.
//!
//! # Configuration
//!
//! - `SCENARIO_CALL_LOG_LEVEL`: log verbosity (trace, debug, info, warn,
//!   error, off)
//! - `SCENARIO_CALL_ROOT`: directory searched for called features
//!
//! Command-line flags override both.

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
