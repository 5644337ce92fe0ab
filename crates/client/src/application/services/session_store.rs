//! Session identity persistence
//!
//! Owns the two durable entries of a workflow session: the session id and the
//! workflow id. The session id is generated locally when missing and later
//! overwritten by whatever the server echoes back.

use std::sync::{Arc, Mutex};

use crate::ports::outbound::{storage_keys, StorageProvider};

pub struct SessionStore {
    storage: Arc<dyn StorageProvider>,
    // Serializes get-or-create so two callers never mint different ids
    create_lock: Mutex<()>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn StorageProvider>) -> Self {
        Self {
            storage,
            create_lock: Mutex::new(()),
        }
    }

    /// Existing session id, or a freshly generated and persisted one.
    pub fn get_session_id(&self) -> String {
        let _guard = self
            .create_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(existing) = self.current_session_id() {
            return existing;
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        self.storage.put(storage_keys::SESSION_ID, &session_id);
        tracing::info!(session_id = %session_id, "Generated new local session id");
        session_id
    }

    /// Stored session id without creating one.
    pub fn current_session_id(&self) -> Option<String> {
        non_empty(self.storage.get(storage_keys::SESSION_ID))
    }

    pub fn update_session_id(&self, session_id: &str) {
        self.storage.put(storage_keys::SESSION_ID, session_id);
    }

    /// Forget the session id. The workflow id is kept.
    pub fn clear_session(&self) {
        self.storage.remove(storage_keys::SESSION_ID);
    }

    pub fn has_active_session(&self) -> bool {
        self.current_session_id().is_some()
    }

    pub fn save_workflow_id(&self, workflow_id: &str) {
        self.storage.put(storage_keys::WORKFLOW_ID, workflow_id);
    }

    pub fn get_workflow_id(&self) -> Option<String> {
        non_empty(self.storage.get(storage_keys::WORKFLOW_ID))
    }

    pub fn clear_workflow_id(&self) {
        self.storage.remove(storage_keys::WORKFLOW_ID);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::ports::outbound::MockStorageProvider;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(InMemoryStorage::new()))
    }

    fn is_uuid_v4_shaped(id: &str) -> bool {
        let groups: Vec<&str> = id.split('-').collect();
        let lengths: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        lengths == [8, 4, 4, 4, 12]
            && id.chars().all(|c| c == '-' || c.is_ascii_hexdigit())
            && groups[2].starts_with('4')
            && matches!(groups[3].chars().next(), Some('8' | '9' | 'a' | 'b'))
    }

    #[test]
    fn generates_uuid_v4_shaped_id_once() {
        let store = store();
        assert!(!store.has_active_session());

        let first = store.get_session_id();
        let second = store.get_session_id();

        assert!(is_uuid_v4_shaped(&first), "{first}");
        assert_eq!(first, second);
        assert!(store.has_active_session());
    }

    #[test]
    fn concurrent_callers_share_one_generated_id() {
        let store = Arc::new(store());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.get_session_id())
            })
            .collect();

        let ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn server_id_overwrites_local_one() {
        let store = store();
        store.get_session_id();
        store.update_session_id("srv-42");
        assert_eq!(store.get_session_id(), "srv-42");
    }

    #[test]
    fn clear_session_keeps_workflow_id() {
        let store = store();
        store.get_session_id();
        store.save_workflow_id("wf-1");

        store.clear_session();

        assert!(!store.has_active_session());
        assert_eq!(store.get_workflow_id().as_deref(), Some("wf-1"));
    }

    #[test]
    fn existing_id_is_not_rewritten() {
        let mut storage = MockStorageProvider::new();
        storage
            .expect_get()
            .returning(|key| (key == storage_keys::SESSION_ID).then(|| "s-1".to_string()));
        storage.expect_put().times(0);

        let store = SessionStore::new(Arc::new(storage));
        assert_eq!(store.get_session_id(), "s-1");
    }

    #[test]
    fn empty_stored_values_count_as_absent() {
        let store = store();
        store.update_session_id("");
        store.save_workflow_id("");
        assert!(!store.has_active_session());
        assert_eq!(store.get_workflow_id(), None);
    }
}
