use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::session::types::{Session, UserProfile};
use crate::store::{ProfileStore, StoreError, StoreResult};

/// In-process store. Writes can be made to fail for exercising error paths.
#[derive(Default)]
pub struct MemoryStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
    sessions: RwLock<HashMap<String, Vec<Session>>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: UserProfile) -> Self {
        let store = Self::new();
        store.profiles.write().insert(profile.id.clone(), profile);
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes, profiles and sessions combined.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl ProfileStore for MemoryStore {
    fn load_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        Ok(self.profiles.read().get(user_id).cloned())
    }

    fn save_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        self.check_writable()?;
        self.profiles
            .write()
            .insert(profile.id.clone(), profile.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn save_session(&self, session: &Session) -> StoreResult<()> {
        self.check_writable()?;
        let mut sessions = self.sessions.write();
        let list = sessions.entry(session.user_id.clone()).or_default();
        match list.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => *existing = session.clone(),
            None => list.push(session.clone()),
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_sessions(&self, user_id: &str) -> StoreResult<Vec<Session>> {
        Ok(self
            .sessions
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}
