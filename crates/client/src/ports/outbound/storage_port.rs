//! Durable key/value storage port
//!
//! The contract is infallible from the caller's view: adapters log their own
//! I/O problems and degrade to "not found" on read.

/// Persistent string key/value storage
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait StorageProvider: Send + Sync {
    /// Load a value by key, `None` if absent
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value, replacing any previous one
    fn put(&self, key: &str, value: &str);

    /// Remove a value; removing a missing key is a no-op
    fn remove(&self, key: &str);
}

/// Storage key constants
///
/// Stable across releases: changing them orphans sessions persisted by older builds.
pub mod storage_keys {
    pub const SESSION_ID: &str = "workflow_session_id";
    pub const WORKFLOW_ID: &str = "workflow_workflow_id";
}
