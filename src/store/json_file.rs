use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::session::types::{Session, UserProfile};
use crate::store::{ProfileStore, StoreResult};

/// Directory-backed store:
///
/// ```text
/// <root>/profiles/<user>.json
/// <root>/sessions/<user>/<session>.json
/// ```
///
/// Files are written to a temporary sibling and renamed into place.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn open<P: AsRef<Path>>(root: P) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("profiles"))?;
        fs::create_dir_all(root.join("sessions"))?;
        tracing::debug!(root = %root.display(), "json store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profile_path(&self, user_id: &str) -> PathBuf {
        self.root
            .join("profiles")
            .join(format!("{}.json", file_key(user_id)))
    }

    fn session_dir(&self, user_id: &str) -> PathBuf {
        self.root.join("sessions").join(file_key(user_id))
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn file_key(id: &str) -> String {
    let key: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if key.is_empty() {
        "_".to_string()
    } else {
        key
    }
}

impl ProfileStore for JsonFileStore {
    fn load_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        let path = self.profile_path(user_id);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        Self::write_json(&self.profile_path(&profile.id), profile)
    }

    fn save_session(&self, session: &Session) -> StoreResult<()> {
        let dir = self.session_dir(&session.user_id);
        fs::create_dir_all(&dir)?;
        Self::write_json(&dir.join(format!("{}.json", file_key(&session.id))), session)
    }

    fn load_sessions(&self, user_id: &str) -> StoreResult<Vec<Session>> {
        let dir = self.session_dir(user_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut sessions = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path)?;
            sessions.push(serde_json::from_slice::<Session>(&bytes)?);
        }
        sessions.sort_by_key(|s| s.start_time);
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_key_sanitizes() {
        assert_eq!(file_key("ada"), "ada");
        assert_eq!(file_key("../etc/passwd"), "___etc_passwd");
        assert_eq!(file_key(""), "_");
    }

    #[test]
    fn test_missing_profile_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(store.load_profile("nobody").unwrap().is_none());
        assert!(store.load_sessions("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_profile_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("profiles").join("ada.json"), b"{not json").unwrap();
        assert!(store.load_profile("ada").is_err());
    }
}
