//! Interactive REPL over a tool mediator

mod commands;
mod core;
mod display;
mod input;

use crate::error::CliError;
use commands::handle_special_command;
use self::core::{input_prompt, print_welcome, reset_input_style};
use display::format_reply;
use input::InputStyleHelper;
use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::{Cmd, CompletionType, Editor, KeyEvent};
use warden_core::{SessionId, ToolMediator};

pub use commands::{help, parse_policy_args, CommandType, PolicyTarget, SpecialCommandResult};
pub use display::indent_lines;

/// Run an interactive REPL over the mediator
///
/// This provides a command-line interface with:
/// - Up/down arrow history and Ctrl+R reverse search
/// - Multi-line input (Ctrl+J)
/// - Slash commands with Tab completion (/call, /policy, /audit, ...)
/// - Free-text approval replies for calls awaiting a decision
///
/// Errors from individual commands are reported and the loop continues.
///
/// # Errors
///
/// Returns `CliError` which can be:
/// - `Readline` - the line editor could not be created
/// - `Io` - the history file could not be saved
///
/// # Example
/// ```ignore
/// use warden_cli::run_cli;
/// use warden_core::{ToolMediator, WardenConfig};
///
/// let mediator = ToolMediator::from_config(&WardenConfig::default(), executor)?;
/// run_cli(&mediator, "my-server").await?;
/// ```
pub async fn run_cli(mediator: &ToolMediator, provider: &str) -> Result<(), CliError> {
    let session = SessionId::new();
    print_welcome(mediator, provider, session).await;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();
    let mut rl: Editor<InputStyleHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(InputStyleHelper));

    // Bind Ctrl-J to insert newline instead of submitting
    rl.bind_sequence(KeyEvent::ctrl('J'), Cmd::Newline);

    let history_path = dirs::cache_dir()
        .map(|p| p.join("warden/history.txt"))
        .unwrap_or_else(|| ".warden/history.txt".into());

    if history_path.exists() {
        rl.load_history(&history_path).ok();
    }

    loop {
        let readline = rl.readline(input_prompt(mediator.approval_state(session)));
        reset_input_style();

        match readline {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line)?;

                match handle_special_command(line, mediator, session).await {
                    Ok(Some(SpecialCommandResult::Exit)) => break,
                    Ok(Some(SpecialCommandResult::Continue)) => continue,
                    Ok(None) => {}
                    Err(e) => {
                        report(&e);
                        continue;
                    }
                }

                match handle_reply(mediator, session, line).await {
                    Ok(text) => println!("{}", text),
                    Err(e) => report(&e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C - just continue
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    mediator.end_session(session);

    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    rl.save_history(&history_path)?;

    println!("\n👋 Goodbye!\n");
    Ok(())
}

fn report(error: &CliError) {
    log::debug!("Command failed: {:?}", error);
    eprintln!("❌ Error: {}\n", error);
}

/// Offer a non-command line to the mediator as an approval reply.
async fn handle_reply(
    mediator: &ToolMediator,
    session: SessionId,
    line: &str,
) -> Result<String, CliError> {
    let reply = mediator.reply(session, line).await?;
    if let Some(text) = format_reply(&reply) {
        return Ok(format!("\n{}\n", text));
    }

    Ok(match mediator.pending(session) {
        Some(pending) => format!(
            "Reply yes to run {} or no to cancel (waiting {}s).",
            pending.tool_name,
            pending.waiting_for().num_seconds()
        ),
        None => "Not a command. Type /help for available commands.".to_string(),
    })
}
