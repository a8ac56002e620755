use super::display::{
    format_assessment, format_audit_tail, format_outcome, format_prompt_list, format_reply,
    format_resource_list, format_tool_list, print_confirmation,
};
use crate::error::CliError;
use serde_json::Value;
use std::sync::Arc;
use warden_core::{MediatorError, SessionId, ToolCatalog, ToolMediator, Verdict};

const DEFAULT_AUDIT_LINES: usize = 20;

/// Result of handling a special command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialCommandResult {
    /// Exit the REPL
    Exit,
    /// Continue to next input
    Continue,
}

/// Parsed command type from user input
#[derive(Debug, PartialEq)]
pub enum CommandType<'a> {
    /// Slash command (e.g., "/call write_file {...}"); `args` keeps the raw remainder
    Slash { command: &'a str, args: &'a str },
    /// Anything else, offered to the mediator as an approval reply
    Regular,
}

impl<'a> CommandType<'a> {
    /// Parse input into a command type
    pub fn parse(input: &'a str) -> Self {
        if !input.starts_with('/') {
            return CommandType::Regular;
        }
        let (command, args) = split_word(input);
        CommandType::Slash { command, args }
    }
}

/// Split off the first whitespace-delimited word; the remainder is trimmed.
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

/// JSON object from command arguments; blank means `{}`.
fn parse_arguments(raw: &str, usage: &str) -> Result<Value, CliError> {
    if raw.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw).map_err(|e| CliError::Usage(format!("{} (invalid JSON: {})", usage, e)))
}

/// What a `/policy` command targets.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyTarget {
    /// Every invocation of the tool
    Tool(String),
    /// One argument combination, given as `tool:{json}`
    Arguments { tool: String, arguments: Value },
}

/// Parse `/policy <key> <allow|deny|ask>`.
///
/// The verdict is the last word so composite keys may contain spaces.
pub fn parse_policy_args(args: &str) -> Result<(PolicyTarget, Verdict), CliError> {
    const USAGE: &str = "/policy <tool|tool:{json}> <allow|deny|ask>";

    let (key, verdict) = args
        .trim()
        .rsplit_once(char::is_whitespace)
        .ok_or_else(|| CliError::Usage(USAGE.to_string()))?;
    let verdict: Verdict = verdict
        .parse()
        .map_err(|e| CliError::Usage(format!("{} ({})", USAGE, e)))?;

    let key = key.trim();
    let target = match split_composite(key) {
        Some((tool, json)) if !tool.is_empty() => PolicyTarget::Arguments {
            tool: tool.to_string(),
            arguments: parse_arguments(json, USAGE)?,
        },
        Some(_) => return Err(CliError::Usage(USAGE.to_string())),
        None => PolicyTarget::Tool(key.to_string()),
    };
    Ok((target, verdict))
}

/// Split `tool:{json}` at the colon before the first `{`, allowing spaces
/// between them. Colons inside the tool name stay with the tool.
fn split_composite(key: &str) -> Option<(&str, &str)> {
    let brace = key.find('{')?;
    let tool = key[..brace].trim_end().strip_suffix(':')?;
    Some((tool, &key[brace..]))
}

/// Handle a special command, returning None for lines that are not commands
pub async fn handle_special_command(
    line: &str,
    mediator: &ToolMediator,
    session: SessionId,
) -> Result<Option<SpecialCommandResult>, CliError> {
    let CommandType::Slash { command, args } = CommandType::parse(line) else {
        return Ok(None);
    };

    match command {
        "/help" => show_help(),
        "/tools" => {
            let tools = mediator.annotated_tools().await?;
            print!("{}", format_tool_list(&tools));
        }
        "/call" => {
            let (tool, json) = split_word(args);
            if tool.is_empty() {
                return Err(CliError::Usage("/call <tool> [json]".into()));
            }
            let outcome = mediator.request_json(session, tool, json, false).await?;
            println!("\n{}\n", format_outcome(&outcome));
        }
        "/approve" => {
            let reply = mediator.approve(session).await?;
            match format_reply(&reply) {
                Some(text) => println!("\n{}\n", text),
                None => println!("Nothing is awaiting approval."),
            }
        }
        "/deny" => {
            let reply = mediator.deny(session)?;
            match format_reply(&reply) {
                Some(text) => println!("{}", text),
                None => println!("Nothing is awaiting approval."),
            }
        }
        "/policies" => show_policies(mediator).await?,
        "/policy" => {
            let (target, verdict) = parse_policy_args(args)?;
            match &target {
                PolicyTarget::Tool(tool) => mediator.set_policy(tool.as_str(), verdict).await?,
                PolicyTarget::Arguments { tool, arguments } => {
                    mediator
                        .set_argument_policy(tool, arguments, verdict)
                        .await?
                }
            }
            print_confirmation(&format!("Policy updated: {}", verdict));
        }
        "/risk" => {
            let (tool, json) = split_word(args);
            if tool.is_empty() {
                return Err(CliError::Usage("/risk <tool> [json]".into()));
            }
            let arguments = parse_arguments(json, "/risk <tool> [json]")?;
            let assessment = mediator.assess(tool, &arguments).await?;
            print!("{}", format_assessment(&assessment));
        }
        "/audit" => {
            let limit = args.parse().unwrap_or(DEFAULT_AUDIT_LINES);
            let lines = mediator.audit_history()?;
            print!("{}", format_audit_tail(&lines, limit));
        }
        "/resources" => {
            let resources = catalog(mediator)?.list_resources().await?;
            print!("{}", format_resource_list(&resources));
        }
        "/read" => {
            if args.is_empty() {
                return Err(CliError::Usage("/read <uri>".into()));
            }
            let text = catalog(mediator)?.read_resource(args).await?;
            println!("\n{}\n", text);
        }
        "/prompts" => {
            let prompts = catalog(mediator)?.list_prompts().await?;
            print!("{}", format_prompt_list(&prompts));
        }
        "/prompt" => {
            let (name, json) = split_word(args);
            if name.is_empty() {
                return Err(CliError::Usage("/prompt <name> [json]".into()));
            }
            let arguments = parse_arguments(json, "/prompt <name> [json]")?;
            let text = catalog(mediator)?.get_prompt(name, arguments).await?;
            println!("\n{}\n", text);
        }
        "/exit" | "/quit" => return Ok(Some(SpecialCommandResult::Exit)),
        _ => println!(
            "Unknown command: {}. Type /help for available commands.",
            command
        ),
    }

    Ok(Some(SpecialCommandResult::Continue))
}

fn catalog(mediator: &ToolMediator) -> Result<&Arc<dyn ToolCatalog>, CliError> {
    mediator
        .catalog()
        .ok_or(CliError::Mediator(MediatorError::NoCatalog))
}

/// Help text sections
pub mod help {
    /// Header for help output
    pub const HEADER: &str = "\n📖 Available Commands:\n\n";

    /// Tool commands section
    pub const TOOLS: &str = "\
Tools:
  /tools                 List tools with permission and risk
  /call <tool> [json]    Request a tool call through the mediator
  /risk <tool> [json]    Show verdict and risk without running anything
";

    /// Approval commands section
    pub const APPROVAL: &str = "\
Approval:
  /approve               Run the call awaiting approval
  /deny                  Cancel the call awaiting approval
  yes, y, ok, confirm    Same as /approve
  no, n, deny, cancel    Same as /deny
";

    /// Policy commands section
    pub const POLICY: &str = "\
Policies:
  /policies              List stored policies
  /policy <key> <v>      Set a policy (v: allow, deny or ask)
                         key: tool or tool:{\"arg\": \"value\"}
  /audit [n]             Show the last n audit entries
";

    /// Provider catalog section
    pub const CATALOG: &str = "\
Provider:
  /resources             List resources
  /read <uri>            Read a resource
  /prompts               List prompts
  /prompt <name> [json]  Render a prompt
";

    /// Exit commands section
    pub const EXIT: &str = "\
Exit:
  /exit, /quit           Exit
  Ctrl+C                 Clear the current line
  Ctrl+D                 Exit
";

    /// Keyboard shortcuts section
    pub const KEYBOARD: &str = "\
Keyboard Shortcuts:
  Up/Down                Navigate command history
  Ctrl+R                 Reverse search history
  Ctrl+J                 Insert a newline
  Tab                    Complete a command
";

    /// Get the complete help text
    pub fn full_text() -> String {
        format!(
            "{}{}\n{}\n{}\n{}\n{}\n{}",
            HEADER, TOOLS, APPROVAL, POLICY, CATALOG, EXIT, KEYBOARD
        )
    }
}

/// Every slash command, for completion.
pub const COMMANDS: &[&str] = &[
    "/tools",
    "/call",
    "/approve",
    "/deny",
    "/policies",
    "/policy",
    "/risk",
    "/audit",
    "/resources",
    "/read",
    "/prompts",
    "/prompt",
    "/help",
    "/exit",
    "/quit",
];

fn show_help() {
    print!("{}", help::full_text());
}

async fn show_policies(mediator: &ToolMediator) -> Result<(), CliError> {
    let summary = mediator.permission_summary().await?;
    if summary.is_empty() {
        println!("\nNo policies stored.\n");
    } else {
        println!("\n🔐 Policies:\n\n{}\n", summary);
    }
    Ok(())
}
