//! Rendering of mediator results for the terminal

use warden_core::tool::{format_params_plain, format_result_plain};
use warden_core::{
    AnnotatedTool, Outcome, PromptDescriptor, ReplyOutcome, ResourceDescriptor, RiskAssessment,
    RiskTier, Verdict,
};

const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Indent tool output under a `└` marker.
pub fn indent_lines(text: &str) -> String {
    let mut lines = text.lines();
    let Some(first) = lines.next() else {
        return String::new();
    };
    let mut output = format!("  └ {}", first);
    for line in lines {
        output.push_str(&format!("\n    {}", line));
    }
    output
}

fn verdict_color(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Allow => GREEN,
        Verdict::Ask => YELLOW,
        Verdict::Deny => RED,
    }
}

fn tier_color(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Low => GREEN,
        RiskTier::Medium => YELLOW,
        RiskTier::High | RiskTier::Critical => RED,
    }
}

/// Format the provider's tools with their current verdict and risk.
pub fn format_tool_list(tools: &[AnnotatedTool]) -> String {
    let mut output = String::from("\n🔧 Available Tools:\n\n");

    if tools.is_empty() {
        output.push_str("  No tools offered by the provider\n");
        return output;
    }

    let width = tools.iter().map(|t| t.tool.name.len()).max().unwrap_or(0);
    for tool in tools {
        output.push_str(&format!(
            "  {:<width$}  {}{:<5}{}  {}{:<8}{}  {}\n",
            tool.tool.name,
            verdict_color(tool.verdict),
            tool.verdict,
            RESET,
            tier_color(tool.tier),
            tool.tier,
            RESET,
            first_line(&tool.tool.description),
            width = width
        ));
    }

    output
}

/// Descriptions come back annotated; show only the provider's own text.
fn first_line(description: &str) -> &str {
    let plain = description
        .rsplit_once(" (Permission: ")
        .map(|(head, _)| head)
        .unwrap_or(description);
    plain.lines().next().unwrap_or_default()
}

/// Format the outcome of a `/call`.
pub fn format_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Executed {
            tool_name,
            result,
            approved,
        } => {
            let header = if *approved {
                format!("{}✓{} {}{}{} (approved)", GREEN, RESET, BOLD, tool_name, RESET)
            } else {
                format!("{}✓{} {}{}{}", GREEN, RESET, BOLD, tool_name, RESET)
            };
            let body = indent_lines(&format_result_plain(result));
            if body.is_empty() {
                header
            } else {
                format!("{}\n{}", header, body)
            }
        }
        Outcome::Denied { reason, .. } => format!("{}⛔ {}{}", RED, reason, RESET),
        Outcome::PendingApproval {
            tool_name,
            arguments,
            ..
        } => format!(
            "{}Permission required:{}\n{}\n\n  Reply {}yes{} to run it or {}no{} to cancel (/approve, /deny)",
            YELLOW,
            RESET,
            indent_lines(&format_params_plain(tool_name, arguments)),
            BOLD,
            RESET,
            BOLD,
            RESET
        ),
    }
}

/// Format the answer to an approval reply, or `None` when nothing happened.
pub fn format_reply(reply: &ReplyOutcome) -> Option<String> {
    match reply {
        ReplyOutcome::Approved(outcome) => Some(format_outcome(outcome)),
        ReplyOutcome::Cancelled { tool_name, message } => Some(format!(
            "  {}✗{} {} ({})",
            RED, RESET, message, tool_name
        )),
        ReplyOutcome::NotAReply => None,
    }
}

pub fn format_assessment(assessment: &RiskAssessment) -> String {
    format!(
        "\n⚖️  {}{}{}\n  Permission: {}{}{}\n  Risk:       {}{}{} ({})\n  Approval:   {}\n",
        BOLD,
        assessment.tool,
        RESET,
        verdict_color(assessment.verdict),
        assessment.verdict,
        RESET,
        tier_color(assessment.tier),
        assessment.tier,
        RESET,
        assessment.description,
        if assessment.requires_approval {
            "required"
        } else {
            "not required"
        }
    )
}

pub fn format_resource_list(resources: &[ResourceDescriptor]) -> String {
    let mut output = String::from("\n📚 Resources:\n\n");
    if resources.is_empty() {
        output.push_str("  No resources offered by the provider\n");
    }
    for resource in resources {
        match &resource.description {
            Some(description) => output.push_str(&format!(
                "  {} ({}) - {}\n",
                resource.uri, resource.name, description
            )),
            None => output.push_str(&format!("  {} ({})\n", resource.uri, resource.name)),
        }
    }
    output
}

pub fn format_prompt_list(prompts: &[PromptDescriptor]) -> String {
    let mut output = String::from("\n💬 Prompts:\n\n");
    if prompts.is_empty() {
        output.push_str("  No prompts offered by the provider\n");
    }
    for prompt in prompts {
        output.push_str(&format!("  {}", prompt.name));
        if !prompt.arguments.is_empty() {
            output.push_str(&format!(" [{}]", prompt.arguments.join(", ")));
        }
        if let Some(description) = prompt.description.as_deref().filter(|d| !d.is_empty()) {
            output.push_str(&format!(" - {}", description));
        }
        output.push('\n');
    }
    output
}

/// The last `limit` audit lines, oldest first.
pub fn format_audit_tail(lines: &[String], limit: usize) -> String {
    if lines.is_empty() {
        return "\nNo audit entries yet.\n".to_string();
    }
    let start = lines.len().saturating_sub(limit);
    let mut output = format!(
        "\n📜 Audit Log (last {} of {}):\n\n",
        lines.len() - start,
        lines.len()
    );
    for line in &lines[start..] {
        output.push_str(&format!("  {}\n", line));
    }
    output
}

pub fn print_confirmation(message: &str) {
    println!("  {}✓{} {}", GREEN, RESET, message);
}
