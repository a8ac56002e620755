//! Per-session approval state.
//!
//! A session is either idle or waiting on exactly one approval. A new `ask`
//! replaces whatever was waiting; a reply only resolves the request that is
//! currently waiting.

use crate::policy::PolicyKey;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Identifies one conversation with the mediator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tool call held back until a human decides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub tool_name: String,
    pub arguments: Value,
    pub requested_at: DateTime<Utc>,
}

impl PendingApproval {
    pub fn new(tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            requested_at: Utc::now(),
        }
    }

    /// How long the call has been waiting.
    pub fn waiting_for(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.requested_at)
    }

    /// Text shown to the human deciding on this call.
    pub fn description(&self) -> String {
        let arguments = serde_json::to_string_pretty(&self.arguments)
            .unwrap_or_else(|_| self.arguments.to_string());
        format!(
            "Permission required for tool: {}\nArguments: {}\n\n\
             This tool requires approval before execution.\n\
             Please approve this operation to proceed.",
            self.tool_name, arguments
        )
    }

    /// Whether this request is for the same call, ignoring key order.
    pub fn matches(&self, tool_name: &str, arguments: &Value) -> bool {
        self.key() == PolicyKey::with_arguments(tool_name, arguments)
    }

    fn key(&self) -> PolicyKey {
        PolicyKey::with_arguments(&self.tool_name, &self.arguments)
    }
}

/// Whether a session has something waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalState {
    Idle,
    AwaitingApproval,
}

/// A human answer to an approval prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Affirmative,
    Negative,
}

const AFFIRMATIVE: &[&str] = &["yes", "approve", "ok", "confirm", "y"];
const NEGATIVE: &[&str] = &["no", "deny", "cancel", "n"];

impl Reply {
    /// Classify free text. Only whole-message matches count, so
    /// "yes please" is not an approval.
    pub fn classify(text: &str) -> Option<Self> {
        let normalized = text.trim().to_lowercase();
        if AFFIRMATIVE.contains(&normalized.as_str()) {
            Some(Reply::Affirmative)
        } else if NEGATIVE.contains(&normalized.as_str()) {
            Some(Reply::Negative)
        } else {
            None
        }
    }
}

/// Holds at most one [`PendingApproval`] per session.
#[derive(Default)]
pub struct ApprovalCoordinator {
    pending: Mutex<HashMap<SessionId, PendingApproval>>,
}

impl ApprovalCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, session: SessionId) -> ApprovalState {
        if self.pending.lock().contains_key(&session) {
            ApprovalState::AwaitingApproval
        } else {
            ApprovalState::Idle
        }
    }

    /// A copy of the waiting request, if any.
    pub fn pending(&self, session: SessionId) -> Option<PendingApproval> {
        self.pending.lock().get(&session).cloned()
    }

    /// Make `request` the session's waiting call.
    ///
    /// Returns the request it superseded, which is dropped without ever
    /// executing.
    pub fn register(
        &self,
        session: SessionId,
        request: PendingApproval,
    ) -> Option<PendingApproval> {
        let superseded = self.pending.lock().insert(session, request);
        if let Some(old) = &superseded {
            log::warn!(
                "Session {}: pending approval for {} superseded by a new request",
                session,
                old.tool_name
            );
        }
        superseded
    }

    /// Remove and return the waiting request only if it is for this call.
    pub fn take_matching(
        &self,
        session: SessionId,
        tool_name: &str,
        arguments: &Value,
    ) -> Option<PendingApproval> {
        let mut pending = self.pending.lock();
        match pending.get(&session) {
            Some(request) if request.matches(tool_name, arguments) => pending.remove(&session),
            _ => None,
        }
    }

    /// Remove and return the waiting request, whatever it is.
    pub fn take(&self, session: SessionId) -> Option<PendingApproval> {
        self.pending.lock().remove(&session)
    }

    /// Put back a request that was taken but could not be resolved.
    ///
    /// A request registered in the meantime wins; returns false in that case.
    pub fn restore(&self, session: SessionId, request: PendingApproval) -> bool {
        let mut pending = self.pending.lock();
        if pending.contains_key(&session) {
            return false;
        }
        pending.insert(session, request);
        true
    }

    /// Forget a session. Returns true if something was waiting.
    pub fn clear_session(&self, session: SessionId) -> bool {
        self.take(session).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_vocabulary() {
        for text in ["yes", "approve", "ok", "confirm", "y", "  YES ", "Ok"] {
            assert_eq!(Reply::classify(text), Some(Reply::Affirmative), "{text}");
        }
        for text in ["no", "deny", "cancel", "n", "\tNo\n", "CANCEL"] {
            assert_eq!(Reply::classify(text), Some(Reply::Negative), "{text}");
        }
        for text in ["", "yes please", "nope", "maybe", "okay"] {
            assert_eq!(Reply::classify(text), None, "{text}");
        }
    }

    #[test]
    fn test_description() {
        let request = PendingApproval::new("write_file", json!({"filepath": "a.txt"}));
        let text = request.description();

        assert!(text.starts_with("Permission required for tool: write_file\nArguments: {\n"));
        assert!(text.contains("  \"filepath\": \"a.txt\""));
        assert!(text.ends_with(
            "This tool requires approval before execution.\nPlease approve this operation to proceed."
        ));
    }

    #[test]
    fn test_waiting_for_counts_from_request() {
        let mut request = PendingApproval::new("write_file", json!({}));
        assert!(request.waiting_for().num_seconds() < 5);

        request.requested_at = Utc::now() - chrono::Duration::seconds(90);
        assert!(request.waiting_for().num_seconds() >= 90);
    }

    #[test]
    fn test_matches_ignores_key_order() {
        let request = PendingApproval::new("calc", json!({"a": 1, "b": 2}));
        assert!(request.matches("calc", &json!({"b": 2, "a": 1})));
        assert!(!request.matches("calc", &json!({"a": 1})));
        assert!(!request.matches("other", &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_register_and_take() {
        let coordinator = ApprovalCoordinator::new();
        let session = SessionId::new();
        assert_eq!(coordinator.state(session), ApprovalState::Idle);

        let superseded = coordinator.register(session, PendingApproval::new("a", json!({})));
        assert!(superseded.is_none());
        assert_eq!(coordinator.state(session), ApprovalState::AwaitingApproval);

        let taken = coordinator.take(session).unwrap();
        assert_eq!(taken.tool_name, "a");
        assert_eq!(coordinator.state(session), ApprovalState::Idle);
        assert!(coordinator.take(session).is_none());
    }

    #[test]
    fn test_register_supersedes() {
        let coordinator = ApprovalCoordinator::new();
        let session = SessionId::new();

        coordinator.register(session, PendingApproval::new("first", json!({})));
        let superseded = coordinator
            .register(session, PendingApproval::new("second", json!({})))
            .unwrap();

        assert_eq!(superseded.tool_name, "first");
        assert_eq!(coordinator.pending(session).unwrap().tool_name, "second");
    }

    #[test]
    fn test_take_matching_leaves_mismatch() {
        let coordinator = ApprovalCoordinator::new();
        let session = SessionId::new();
        coordinator.register(session, PendingApproval::new("write_file", json!({"x": 1})));

        assert!(coordinator
            .take_matching(session, "write_file", &json!({"x": 2}))
            .is_none());
        assert_eq!(coordinator.state(session), ApprovalState::AwaitingApproval);

        assert!(coordinator
            .take_matching(session, "write_file", &json!({"x": 1}))
            .is_some());
        assert_eq!(coordinator.state(session), ApprovalState::Idle);
    }

    #[test]
    fn test_restore_does_not_clobber_newer_request() {
        let coordinator = ApprovalCoordinator::new();
        let session = SessionId::new();
        coordinator.register(session, PendingApproval::new("first", json!({})));

        let taken = coordinator.take(session).unwrap();
        assert!(coordinator.restore(session, taken.clone()));
        assert_eq!(coordinator.pending(session).unwrap(), taken);

        coordinator.take(session);
        coordinator.register(session, PendingApproval::new("second", json!({})));
        assert!(!coordinator.restore(session, taken));
        assert_eq!(coordinator.pending(session).unwrap().tool_name, "second");
    }

    #[test]
    fn test_sessions_isolated() {
        let coordinator = ApprovalCoordinator::new();
        let a = SessionId::new();
        let b = SessionId::new();

        coordinator.register(a, PendingApproval::new("write_file", json!({})));

        assert_eq!(coordinator.state(b), ApprovalState::Idle);
        assert!(coordinator.take(b).is_none());
        assert!(!coordinator.clear_session(b));
        assert!(coordinator.clear_session(a));
    }
}
