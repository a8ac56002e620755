//! Static risk classification of tools.
//!
//! Risk tiers are shown to humans next to approval prompts and permission
//! summaries. They never influence which verdict a call gets.

use crate::policy::Verdict;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Severity label for a tool.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
            RiskTier::Critical => "critical",
        }
    }

    /// One-line description of what a tool in this tier can do.
    pub fn description(&self) -> &'static str {
        match self {
            RiskTier::Low => "Safe operation with minimal impact",
            RiskTier::Medium => "Moderate impact - modifies data",
            RiskTier::High => "High impact - destructive operation",
            RiskTier::Critical => "Critical impact - system-level operation",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Human-facing summary of a pending or hypothetical call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub tool: String,
    pub tier: RiskTier,
    pub verdict: Verdict,
    /// True for `ask` and `deny`, whatever the tier.
    pub requires_approval: bool,
    pub description: String,
}

/// Maps tool names to risk tiers. Unknown tools are [`RiskTier::Medium`].
///
/// # Example
///
/// ```rust
/// use warden_core::{RiskCatalog, RiskTier};
///
/// let catalog = RiskCatalog::default().with_tier("deploy", RiskTier::Critical);
/// assert_eq!(catalog.tier_of("read_file"), RiskTier::Low);
/// assert_eq!(catalog.tier_of("deploy"), RiskTier::Critical);
/// assert_eq!(catalog.tier_of("anything_else"), RiskTier::Medium);
/// ```
#[derive(Debug, Clone)]
pub struct RiskCatalog {
    tiers: HashMap<String, RiskTier>,
}

impl RiskCatalog {
    /// A catalog with no registered tools.
    pub fn empty() -> Self {
        Self {
            tiers: HashMap::new(),
        }
    }

    /// Register or replace the tier for a tool.
    pub fn with_tier(mut self, tool: impl Into<String>, tier: RiskTier) -> Self {
        self.tiers.insert(tool.into(), tier);
        self
    }

    /// Register or replace tiers for several tools.
    pub fn with_tiers<I, S>(mut self, tiers: I) -> Self
    where
        I: IntoIterator<Item = (S, RiskTier)>,
        S: Into<String>,
    {
        self.tiers
            .extend(tiers.into_iter().map(|(tool, tier)| (tool.into(), tier)));
        self
    }

    pub fn tier_of(&self, tool: &str) -> RiskTier {
        self.tiers.get(tool).copied().unwrap_or_default()
    }

    /// Combine a tool's tier with the verdict it resolved to.
    pub fn assess(&self, tool: &str, verdict: Verdict) -> RiskAssessment {
        let tier = self.tier_of(tool);
        RiskAssessment {
            tool: tool.to_string(),
            tier,
            verdict,
            requires_approval: verdict.requires_approval(),
            description: tier.description().to_string(),
        }
    }
}

impl Default for RiskCatalog {
    fn default() -> Self {
        Self::empty().with_tiers([
            ("read_file", RiskTier::Low),
            ("write_file", RiskTier::Medium),
            ("delete_file", RiskTier::High),
            ("execute_command", RiskTier::Critical),
        ])
    }
}
