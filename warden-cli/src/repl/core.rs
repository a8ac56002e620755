//! Core REPL utilities

use std::io::Write;
use warden_core::{ApprovalState, SessionId, ToolMediator};

/// ANSI escape code to reset terminal styling
pub const RESET_STYLE: &str = "\x1b[0m";

/// The input prompt, marked while a call awaits approval
pub fn input_prompt(state: ApprovalState) -> &'static str {
    match state {
        ApprovalState::Idle => "  ❯ ",
        ApprovalState::AwaitingApproval => "  approve? ❯ ",
    }
}

/// Format the welcome banner header
pub fn format_welcome_header() -> String {
    format!("🛡️  warden v{}", env!("CARGO_PKG_VERSION"))
}

/// Format session info for display
pub fn format_session_info(session: SessionId) -> String {
    let id = session.to_string();
    format!("Session: {}", &id[..8.min(id.len())])
}

/// Reset terminal styling after input
pub fn reset_input_style() {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "{}", RESET_STYLE);
    let _ = stdout.flush();
}

/// Format the tip line shown at startup
pub fn format_tip() -> &'static str {
    "Type /help for commands, /tools to list tools, Ctrl+J for multiline"
}

/// Print welcome message, provider and session info
pub async fn print_welcome(mediator: &ToolMediator, provider: &str, session: SessionId) {
    println!("\n{}", format_welcome_header());
    println!("Provider: {}", provider);
    println!("{}", format_session_info(session));

    match mediator.annotated_tools().await {
        Ok(tools) => println!("Tools: {}", tools.len()),
        Err(e) => log::warn!("Could not list tools: {}", e),
    }

    println!("{}", format_tip());
    println!();
}
