//! Policy storage and evaluation for tool calls.
//!
//! Every tool call resolves to one of three [`Verdict`]s: `allow`, `deny`
//! or `ask`. Verdicts are stored under a [`PolicyKey`], which is either a
//! bare tool name or a tool name pinned to one exact argument combination.
//!
//! # Overview
//!
//! - **[`PermissionEvaluator`]**: Resolves the verdict for a call
//! - **[`PolicyStore`]**: Trait for storing verdicts
//! - **[`MemoryPolicyStore`]**: In-memory store (cleared on exit)
//! - **[`FilePolicyStore`]**: JSON file store, rewritten on every change
//!
//! # Lookup Order
//!
//! | Step | Key | Example |
//! |------|-----|---------|
//! | 1 | Pinned arguments | `write_file:{"filepath": "a.txt"}` |
//! | 2 | Tool name | `write_file` |
//! | 3 | Fallback | `ask` |
//!
//! # Example
//!
//! ```rust
//! use warden_core::policy::{MemoryPolicyStore, PermissionEvaluator, Verdict};
//!
//! # tokio_test::block_on(async {
//! let evaluator = PermissionEvaluator::new(MemoryPolicyStore::new());
//!
//! let pinned = serde_json::json!({"filepath": "secrets.txt"});
//! evaluator.set_argument_policy("read_file", &pinned, Verdict::Deny).await.unwrap();
//!
//! assert_eq!(evaluator.evaluate("read_file", &pinned).await.unwrap(), Verdict::Deny);
//! let other = serde_json::json!({"filepath": "notes.txt"});
//! assert_eq!(evaluator.evaluate("read_file", &other).await.unwrap(), Verdict::Allow);
//! # });
//! ```

mod evaluator;
mod key;
mod store;

pub use evaluator::PermissionEvaluator;
pub use key::{canonicalize, PolicyKey, Verdict};
pub use store::{
    baseline_policies, FilePolicyStore, MemoryPolicyStore, PolicyStore, PolicyStoreError,
};
