//! Policy storage trait and implementations.

use super::key::{PolicyKey, Verdict};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Errors that can occur in policy store operations.
#[derive(Debug, thiserror::Error)]
pub enum PolicyStoreError {
    /// Failed to read policies from storage.
    #[error("Failed to read policies from {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// Failed to write policies to storage. The change was not applied.
    #[error("Failed to write policies to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key cannot be stored.
    #[error("Invalid policy key: {0:?}")]
    InvalidKey(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Verdicts every new store starts with.
///
/// Read-only operations run freely, writes need a human, and irreversible
/// operations are blocked.
pub fn baseline_policies() -> BTreeMap<String, Verdict> {
    [
        ("read_file", Verdict::Allow),
        ("write_file", Verdict::Ask),
        ("delete_file", Verdict::Deny),
        ("execute_command", Verdict::Deny),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Trait for policy storage implementations.
///
/// `set` must not return until the change is durable (for stores that
/// persist at all). A failed `set` leaves the store unchanged.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Look up the verdict stored under an exact key.
    async fn get(&self, key: &PolicyKey) -> Result<Option<Verdict>, PolicyStoreError>;

    /// Store a verdict, replacing any previous one for the key.
    async fn set(&self, key: PolicyKey, verdict: Verdict) -> Result<(), PolicyStoreError>;

    /// Snapshot of every stored entry, sorted by key.
    async fn entries(&self) -> Result<BTreeMap<String, Verdict>, PolicyStoreError>;
}

fn validate_key(key: &PolicyKey) -> Result<(), PolicyStoreError> {
    if key.as_str().trim().is_empty() || key.tool_name().trim().is_empty() {
        return Err(PolicyStoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// In-memory policy store.
///
/// Changes are lost when the process exits.
pub struct MemoryPolicyStore {
    policies: RwLock<BTreeMap<String, Verdict>>,
}

impl MemoryPolicyStore {
    /// Create a store seeded with [`baseline_policies`].
    pub fn new() -> Self {
        Self::with_policies(baseline_policies())
    }

    /// Create a store with no entries at all.
    pub fn empty() -> Self {
        Self::with_policies(BTreeMap::new())
    }

    /// Create a store with the given entries.
    pub fn with_policies(policies: BTreeMap<String, Verdict>) -> Self {
        Self {
            policies: RwLock::new(policies),
        }
    }
}

impl Default for MemoryPolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn get(&self, key: &PolicyKey) -> Result<Option<Verdict>, PolicyStoreError> {
        Ok(self.policies.read().get(key.as_str()).copied())
    }

    async fn set(&self, key: PolicyKey, verdict: Verdict) -> Result<(), PolicyStoreError> {
        validate_key(&key)?;
        self.policies.write().insert(key.to_string(), verdict);
        Ok(())
    }

    async fn entries(&self) -> Result<BTreeMap<String, Verdict>, PolicyStoreError> {
        Ok(self.policies.read().clone())
    }
}

/// File-based policy store.
///
/// The whole mapping is loaded once by [`FilePolicyStore::open`] and the
/// file is rewritten on every `set`. The write goes to a sibling temporary
/// file which is then renamed over the original, so a crash never leaves a
/// half-written policy file behind.
pub struct FilePolicyStore {
    path: PathBuf,
    policies: RwLock<BTreeMap<String, Verdict>>,
    write_lock: Mutex<()>,
}

impl FilePolicyStore {
    /// Open the store at `path`.
    ///
    /// A missing or blank file yields the baseline policies; nothing is
    /// written until the first `set`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PolicyStoreError> {
        let path = path.into();
        let policies = Self::load(&path)?;
        log::debug!(
            "loaded {} policies from {}",
            policies.len(),
            path.display()
        );
        Ok(Self {
            path,
            policies: RwLock::new(policies),
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the policy file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<BTreeMap<String, Verdict>, PolicyStoreError> {
        if !path.exists() {
            return Ok(baseline_policies());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| PolicyStoreError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if contents.trim().is_empty() {
            return Ok(baseline_policies());
        }

        serde_json::from_str(&contents).map_err(|e| PolicyStoreError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn persist(&self, policies: &BTreeMap<String, Verdict>) -> Result<(), PolicyStoreError> {
        let json = serde_json::to_string_pretty(policies)?;
        let write_err = |source| PolicyStoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

#[async_trait]
impl PolicyStore for FilePolicyStore {
    async fn get(&self, key: &PolicyKey) -> Result<Option<Verdict>, PolicyStoreError> {
        Ok(self.policies.read().get(key.as_str()).copied())
    }

    async fn set(&self, key: PolicyKey, verdict: Verdict) -> Result<(), PolicyStoreError> {
        validate_key(&key)?;

        // One writer at a time; readers keep seeing the old map until the
        // new one is on disk.
        let _guard = self.write_lock.lock();
        let mut updated = self.policies.read().clone();
        updated.insert(key.to_string(), verdict);
        self.persist(&updated)?;
        *self.policies.write() = updated;

        log::info!("policy {} set to {}", key, verdict);
        Ok(())
    }

    async fn entries(&self) -> Result<BTreeMap<String, Verdict>, PolicyStoreError> {
        Ok(self.policies.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_baseline() {
        let store = MemoryPolicyStore::new();

        let entries = store.entries().await.unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(
            store.get(&PolicyKey::tool("read_file")).await.unwrap(),
            Some(Verdict::Allow)
        );
        assert_eq!(
            store.get(&PolicyKey::tool("delete_file")).await.unwrap(),
            Some(Verdict::Deny)
        );
        assert_eq!(store.get(&PolicyKey::tool("unknown")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_empty() {
        let store = MemoryPolicyStore::empty();
        assert!(store.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_set_replaces() {
        let store = MemoryPolicyStore::empty();

        store.set(PolicyKey::tool("test"), Verdict::Allow).await.unwrap();
        store.set(PolicyKey::tool("test"), Verdict::Deny).await.unwrap();

        assert_eq!(
            store.get(&PolicyKey::tool("test")).await.unwrap(),
            Some(Verdict::Deny)
        );
        assert_eq!(store.entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_blank_key() {
        let store = MemoryPolicyStore::empty();
        let result = store.set(PolicyKey::tool("  "), Verdict::Allow).await;
        assert!(matches!(result, Err(PolicyStoreError::InvalidKey(_))));

        let result = store.set(PolicyKey::from(":{}"), Verdict::Allow).await;
        assert!(matches!(result, Err(PolicyStoreError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_file_store_missing_file_uses_baseline() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("permissions.json");

        let store = FilePolicyStore::open(&path).unwrap();
        assert_eq!(store.entries().await.unwrap(), baseline_policies());

        // Loading alone never creates the file
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_file_store_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("permissions.json");

        let store = FilePolicyStore::open(&path).unwrap();
        store
            .set(PolicyKey::tool("write_file"), Verdict::Allow)
            .await
            .unwrap();
        assert!(path.exists());

        // New instance sees the change and the baseline entries
        let store2 = FilePolicyStore::open(&path).unwrap();
        assert_eq!(
            store2.get(&PolicyKey::tool("write_file")).await.unwrap(),
            Some(Verdict::Allow)
        );
        assert_eq!(
            store2.get(&PolicyKey::tool("delete_file")).await.unwrap(),
            Some(Verdict::Deny)
        );
    }

    #[tokio::test]
    async fn test_file_store_format() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("permissions.json");

        let store = FilePolicyStore::open(&path).unwrap();
        store.set(PolicyKey::tool("x"), Verdict::Ask).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["x"], "ask");
        assert_eq!(raw["read_file"], "allow");
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested/dir/permissions.json");

        let store = FilePolicyStore::open(&path).unwrap();
        store.set(PolicyKey::tool("test"), Verdict::Allow).await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_file_store_handles_empty_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("permissions.json");
        std::fs::write(&path, "  \n").unwrap();

        let store = FilePolicyStore::open(&path).unwrap();
        assert_eq!(store.entries().await.unwrap(), baseline_policies());
    }

    #[tokio::test]
    async fn test_file_store_rejects_unknown_verdict() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("permissions.json");
        std::fs::write(&path, r#"{"read_file": "sometimes"}"#).unwrap();

        let result = FilePolicyStore::open(&path);
        assert!(matches!(result, Err(PolicyStoreError::Read { .. })));
    }

    #[tokio::test]
    async fn test_file_store_failed_write_not_applied() {
        let temp_dir = tempfile::tempdir().unwrap();
        // The parent "directory" is a regular file, so the write must fail
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let path = blocker.join("permissions.json");

        let store = FilePolicyStore::open(&path).unwrap();
        let result = store.set(PolicyKey::tool("read_file"), Verdict::Deny).await;

        assert!(matches!(result, Err(PolicyStoreError::Write { .. })));
        assert_eq!(
            store.get(&PolicyKey::tool("read_file")).await.unwrap(),
            Some(Verdict::Allow)
        );
    }
}
