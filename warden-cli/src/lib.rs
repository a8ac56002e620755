//! Interactive front end for the warden tool mediator
//!
//! This crate provides:
//! - An interactive REPL that routes tool calls through a [`ToolMediator`]
//! - Slash commands for policies, risk, audit history and the provider's catalog
//! - Free-text approval replies for parked calls
//!
//! [`ToolMediator`]: warden_core::ToolMediator

mod error;
pub mod launch;
pub mod repl;

pub use error::CliError;
pub use launch::{resolve_config, resolve_server};
pub use repl::{run_cli, CommandType, SpecialCommandResult};
