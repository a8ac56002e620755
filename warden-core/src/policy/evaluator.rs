//! Verdict resolution for tool calls.

use super::key::{PolicyKey, Verdict};
use super::store::{PolicyStore, PolicyStoreError};
use serde_json::Value;
use std::sync::Arc;

/// Resolves the verdict for a tool call against a [`PolicyStore`].
///
/// Lookup order:
/// 1. the composite key `tool:canonical_arguments`
/// 2. the bare tool name
/// 3. [`Verdict::Ask`]
///
/// # Example
///
/// ```rust
/// use warden_core::policy::{MemoryPolicyStore, PermissionEvaluator, Verdict};
///
/// # tokio_test::block_on(async {
/// let evaluator = PermissionEvaluator::new(MemoryPolicyStore::new());
///
/// let params = serde_json::json!({"filepath": "notes.txt"});
/// assert_eq!(evaluator.evaluate("read_file", &params).await.unwrap(), Verdict::Allow);
/// assert_eq!(evaluator.evaluate("delete_file", &params).await.unwrap(), Verdict::Deny);
/// assert_eq!(evaluator.evaluate("launch_rocket", &params).await.unwrap(), Verdict::Ask);
/// # });
/// ```
#[derive(Clone)]
pub struct PermissionEvaluator {
    store: Arc<dyn PolicyStore>,
}

impl PermissionEvaluator {
    /// Create an evaluator over a store.
    pub fn new(store: impl PolicyStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }

    /// Resolve the verdict for a tool call. Never modifies the store.
    pub async fn evaluate(
        &self,
        tool_name: &str,
        arguments: &Value,
    ) -> Result<Verdict, PolicyStoreError> {
        let pinned = PolicyKey::with_arguments(tool_name, arguments);
        if let Some(verdict) = self.store.get(&pinned).await? {
            log::trace!("{} matched argument policy {}", tool_name, verdict);
            return Ok(verdict);
        }

        if let Some(verdict) = self.store.get(&PolicyKey::tool(tool_name)).await? {
            return Ok(verdict);
        }

        Ok(Verdict::default())
    }

    /// Set the verdict for every invocation of a tool.
    pub async fn set_tool_policy(
        &self,
        tool_name: &str,
        verdict: Verdict,
    ) -> Result<(), PolicyStoreError> {
        self.store.set(PolicyKey::tool(tool_name), verdict).await
    }

    /// Pin a verdict to one exact argument combination.
    pub async fn set_argument_policy(
        &self,
        tool_name: &str,
        arguments: &Value,
        verdict: Verdict,
    ) -> Result<(), PolicyStoreError> {
        self.store
            .set(PolicyKey::with_arguments(tool_name, arguments), verdict)
            .await
    }
}
