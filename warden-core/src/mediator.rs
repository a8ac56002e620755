//! The single entry point for tool calls.
//!
//! [`ToolMediator`] resolves a verdict for each call, records the decision,
//! and either rejects the call, runs it, or parks it until a human answers.
//!
//! ```text
//! request ──► evaluate ──┬── deny  ──► audit DENIED  ──► Outcome::Denied
//!                        ├── allow ──► audit ALLOWED ──► execute ──► Outcome::Executed
//!                        └── ask   ──► audit ASK     ──► park    ──► Outcome::PendingApproval
//!
//! reply "yes" ──► audit ALLOWED ──► execute parked call
//! reply "no"  ──► audit CANCELLED
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::approval::{ApprovalCoordinator, ApprovalState, PendingApproval, Reply, SessionId};
use crate::audit::{AuditError, AuditLog, AuditRecord, Decision, FileAuditLog};
use crate::config::WardenConfig;
use crate::policy::{
    FilePolicyStore, PermissionEvaluator, PolicyKey, PolicyStoreError, Verdict,
};
use crate::risk::{RiskAssessment, RiskCatalog, RiskTier};
use crate::tool::{ToolCatalog, ToolDescriptor, ToolError, ToolExecutor, ToolResult};

const CANCELLED_MESSAGE: &str = "Operation cancelled by user.";

/// Errors from mediator operations.
///
/// Policy denials and pending approvals are not errors; see [`Outcome`].
#[derive(Debug, thiserror::Error)]
pub enum MediatorError {
    /// Arguments were not a JSON object. Nothing was evaluated or audited.
    #[error("Malformed arguments for tool {tool_name}: {message}")]
    MalformedArguments { tool_name: String, message: String },

    /// The call was authorized and audited, then the tool failed.
    #[error("Tool {tool_name} failed: {source}")]
    Execution {
        tool_name: String,
        #[source]
        source: ToolError,
    },

    #[error(transparent)]
    Policy(#[from] PolicyStoreError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("No tool catalog configured")]
    NoCatalog,

    #[error("Catalog query failed: {0}")]
    Catalog(#[source] ToolError),
}

/// What happened to a tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Executed {
        tool_name: String,
        result: ToolResult,
        /// True when a human (or a pre-approval) authorized the call.
        approved: bool,
    },
    Denied {
        tool_name: String,
        reason: String,
    },
    PendingApproval {
        tool_name: String,
        arguments: Value,
        description: String,
    },
}

impl Outcome {
    pub fn tool_name(&self) -> &str {
        match self {
            Outcome::Executed { tool_name, .. }
            | Outcome::Denied { tool_name, .. }
            | Outcome::PendingApproval { tool_name, .. } => tool_name,
        }
    }

    /// Text to show the human or hand back to the caller.
    pub fn message(&self) -> String {
        match self {
            Outcome::Executed {
                result,
                approved: true,
                ..
            } => format!("Operation approved and executed.\n\n{}", result.as_text()),
            Outcome::Executed { result, .. } => result.as_text(),
            Outcome::Denied { reason, .. } => reason.clone(),
            Outcome::PendingApproval { description, .. } => description.clone(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::PendingApproval { .. })
    }
}

/// Result of offering free text as an approval reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    /// The parked call ran.
    Approved(Outcome),
    /// The parked call was discarded.
    Cancelled { tool_name: String, message: String },
    /// Nothing was waiting, or the text was not a recognized reply.
    NotAReply,
}

/// A catalog tool annotated with its current verdict and risk.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedTool {
    pub tool: ToolDescriptor,
    pub verdict: Verdict,
    pub tier: RiskTier,
}

/// Orchestrates evaluation, approval, execution and auditing of tool calls.
pub struct ToolMediator {
    evaluator: PermissionEvaluator,
    audit: Arc<dyn AuditLog>,
    executor: Arc<dyn ToolExecutor>,
    catalog: Option<Arc<dyn ToolCatalog>>,
    approvals: ApprovalCoordinator,
    risk: RiskCatalog,
}

impl ToolMediator {
    pub fn new(
        evaluator: PermissionEvaluator,
        audit: Arc<dyn AuditLog>,
        executor: Arc<dyn ToolExecutor>,
    ) -> Self {
        Self {
            evaluator,
            audit,
            executor,
            catalog: None,
            approvals: ApprovalCoordinator::new(),
            risk: RiskCatalog::default(),
        }
    }

    /// Build a mediator over the file-backed stores named by `config`.
    pub fn from_config(
        config: &WardenConfig,
        executor: Arc<dyn ToolExecutor>,
    ) -> Result<Self, MediatorError> {
        let store = FilePolicyStore::open(config.policy_path())?;
        log::debug!(
            "Policies from {}, audit log at {}",
            store.path().display(),
            config.audit_path().display()
        );
        Ok(Self::new(
            PermissionEvaluator::new(store),
            Arc::new(FileAuditLog::new(config.audit_path())),
            executor,
        )
        .with_risk_catalog(config.risk_catalog()))
    }

    pub fn with_risk_catalog(mut self, risk: RiskCatalog) -> Self {
        self.risk = risk;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn ToolCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn catalog(&self) -> Option<&Arc<dyn ToolCatalog>> {
        self.catalog.as_ref()
    }

    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    pub fn risk_catalog(&self) -> &RiskCatalog {
        &self.risk
    }

    /// Submit a tool call.
    ///
    /// With `pre_approved` set, a parked call matching this one runs without
    /// re-evaluation; an `ask` verdict with nothing parked runs as well. A
    /// `deny` verdict is never overridden.
    pub async fn request(
        &self,
        session: SessionId,
        tool_name: &str,
        arguments: Value,
        pre_approved: bool,
    ) -> Result<Outcome, MediatorError> {
        let arguments = object_arguments(tool_name, arguments)?;

        if pre_approved {
            if let Some(pending) = self.approvals.take_matching(session, tool_name, &arguments) {
                return self.run_approved(session, pending).await;
            }
        }

        let verdict = self.evaluator.evaluate(tool_name, &arguments).await?;
        let operation = AuditRecord::tool_descriptor(tool_name);

        match verdict {
            Verdict::Deny => {
                self.audit
                    .record(&operation, Decision::Denied, "Policy: deny")?;
                log::info!("Denied {} by policy", tool_name);
                Ok(Outcome::Denied {
                    tool_name: tool_name.to_string(),
                    reason: format!("Permission denied for tool: {}", tool_name),
                })
            }
            Verdict::Allow => {
                self.audit
                    .record(&operation, Decision::Allowed, "Policy: allow")?;
                self.execute(tool_name, arguments, false).await
            }
            Verdict::Ask if pre_approved => {
                self.audit
                    .record(&operation, Decision::Allowed, "Pre-approved")?;
                self.execute(tool_name, arguments, true).await
            }
            Verdict::Ask => {
                self.audit
                    .record(&operation, Decision::Ask, "Awaiting approval")?;
                let pending = PendingApproval::new(tool_name, arguments.clone());
                let description = pending.description();
                self.approvals.register(session, pending);
                log::info!("Session {}: {} awaiting approval", session, tool_name);
                Ok(Outcome::PendingApproval {
                    tool_name: tool_name.to_string(),
                    arguments,
                    description,
                })
            }
        }
    }

    /// Like [`request`](Self::request) but takes raw JSON text.
    /// Blank text means no arguments.
    pub async fn request_json(
        &self,
        session: SessionId,
        tool_name: &str,
        arguments: &str,
        pre_approved: bool,
    ) -> Result<Outcome, MediatorError> {
        let arguments = if arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(arguments).map_err(|e| MediatorError::MalformedArguments {
                tool_name: tool_name.to_string(),
                message: e.to_string(),
            })?
        };
        self.request(session, tool_name, arguments, pre_approved)
            .await
    }

    /// Offer free text as an answer to the session's parked call.
    pub async fn reply(
        &self,
        session: SessionId,
        text: &str,
    ) -> Result<ReplyOutcome, MediatorError> {
        match Reply::classify(text) {
            Some(Reply::Affirmative) => self.approve(session).await,
            Some(Reply::Negative) => self.deny(session),
            None => Ok(ReplyOutcome::NotAReply),
        }
    }

    /// Run the session's parked call.
    pub async fn approve(&self, session: SessionId) -> Result<ReplyOutcome, MediatorError> {
        match self.approvals.take(session) {
            Some(pending) => Ok(ReplyOutcome::Approved(
                self.run_approved(session, pending).await?,
            )),
            None => Ok(ReplyOutcome::NotAReply),
        }
    }

    /// Discard the session's parked call.
    pub fn deny(&self, session: SessionId) -> Result<ReplyOutcome, MediatorError> {
        let Some(pending) = self.approvals.take(session) else {
            return Ok(ReplyOutcome::NotAReply);
        };
        let recorded = self.audit.record(
            &AuditRecord::tool_descriptor(&pending.tool_name),
            Decision::Cancelled,
            "Denied by user",
        );
        if let Err(e) = recorded {
            self.approvals.restore(session, pending);
            return Err(e.into());
        }
        log::info!("Session {}: {} cancelled by user", session, pending.tool_name);
        Ok(ReplyOutcome::Cancelled {
            tool_name: pending.tool_name,
            message: CANCELLED_MESSAGE.to_string(),
        })
    }

    pub fn approval_state(&self, session: SessionId) -> ApprovalState {
        self.approvals.state(session)
    }

    pub fn pending(&self, session: SessionId) -> Option<PendingApproval> {
        self.approvals.pending(session)
    }

    /// Drop whatever the session had parked.
    pub fn end_session(&self, session: SessionId) {
        if self.approvals.clear_session(session) {
            log::debug!("Session {} ended with a pending approval", session);
        }
    }

    pub async fn set_policy(
        &self,
        key: impl Into<PolicyKey>,
        verdict: Verdict,
    ) -> Result<(), MediatorError> {
        self.evaluator.store().set(key.into(), verdict).await?;
        Ok(())
    }

    pub async fn set_argument_policy(
        &self,
        tool_name: &str,
        arguments: &Value,
        verdict: Verdict,
    ) -> Result<(), MediatorError> {
        self.evaluator
            .set_argument_policy(tool_name, arguments, verdict)
            .await?;
        Ok(())
    }

    /// Snapshot of every stored policy.
    pub async fn policies(&self) -> Result<Vec<(PolicyKey, Verdict)>, MediatorError> {
        let entries = self.evaluator.store().entries().await?;
        Ok(entries
            .into_iter()
            .map(|(key, verdict)| (PolicyKey::from(key), verdict))
            .collect())
    }

    pub fn audit_history(&self) -> Result<Vec<String>, MediatorError> {
        Ok(self.audit.read_all()?)
    }

    /// Verdict and risk for a call, without running or recording anything.
    pub async fn assess(
        &self,
        tool_name: &str,
        arguments: &Value,
    ) -> Result<RiskAssessment, MediatorError> {
        let verdict = self.evaluator.evaluate(tool_name, arguments).await?;
        Ok(self.risk.assess(tool_name, verdict))
    }

    /// One line per stored policy: `- <key>: <VERDICT> (Risk: <tier>)`.
    pub async fn permission_summary(&self) -> Result<String, MediatorError> {
        let lines: Vec<String> = self
            .policies()
            .await?
            .into_iter()
            .map(|(key, verdict)| {
                format!(
                    "- {}: {} (Risk: {})",
                    key,
                    verdict.as_str().to_uppercase(),
                    self.risk.tier_of(key.tool_name())
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }

    /// The catalog's tools with verdict and risk appended to each description.
    pub async fn annotated_tools(&self) -> Result<Vec<AnnotatedTool>, MediatorError> {
        let catalog = self.catalog.as_ref().ok_or(MediatorError::NoCatalog)?;
        let tools = catalog.list_tools().await.map_err(MediatorError::Catalog)?;

        let empty = Value::Object(Default::default());
        let mut annotated = Vec::with_capacity(tools.len());
        for mut tool in tools {
            let verdict = self.evaluator.evaluate(&tool.name, &empty).await?;
            let tier = self.risk.tier_of(&tool.name);
            tool.description = format!(
                "{} (Permission: {}, Risk: {})",
                tool.description, verdict, tier
            );
            annotated.push(AnnotatedTool {
                tool,
                verdict,
                tier,
            });
        }
        Ok(annotated)
    }

    /// Record and run a call taken out of the coordinator. If the record
    /// cannot be written the call goes back to waiting.
    async fn run_approved(
        &self,
        session: SessionId,
        pending: PendingApproval,
    ) -> Result<Outcome, MediatorError> {
        let recorded = self.audit.record(
            &AuditRecord::tool_descriptor(&pending.tool_name),
            Decision::Allowed,
            "Approved by user",
        );
        if let Err(e) = recorded {
            self.approvals.restore(session, pending);
            return Err(e.into());
        }
        self.execute(&pending.tool_name, pending.arguments, true)
            .await
    }

    async fn execute(
        &self,
        tool_name: &str,
        arguments: Value,
        approved: bool,
    ) -> Result<Outcome, MediatorError> {
        match self.executor.execute(tool_name, arguments).await {
            Ok(result) => {
                log::debug!("Executed {}", tool_name);
                Ok(Outcome::Executed {
                    tool_name: tool_name.to_string(),
                    result,
                    approved,
                })
            }
            Err(source) => {
                log::warn!("Tool {} failed: {}", tool_name, source);
                Err(MediatorError::Execution {
                    tool_name: tool_name.to_string(),
                    source,
                })
            }
        }
    }
}

fn object_arguments(tool_name: &str, arguments: Value) -> Result<Value, MediatorError> {
    match arguments {
        Value::Null => Ok(Value::Object(Default::default())),
        Value::Object(_) => Ok(arguments),
        other => Err(MediatorError::MalformedArguments {
            tool_name: tool_name.to_string(),
            message: format!("expected a JSON object, got {}", other),
        }),
    }
}
