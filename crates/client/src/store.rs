//! File-backed session store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use causehive_core::{SessionKey, SessionStore};
use tracing::{debug, warn};

/// Session store persisted as one JSON object in a file.
///
/// The whole file is rewritten on every change. A missing, unreadable or
/// corrupt file is treated as an empty session, and write failures are
/// logged rather than returned, so the in-memory view stays authoritative
/// for the life of the process.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    values: Mutex<BTreeMap<SessionKey, String>>,
}

impl FileSessionStore {
    /// Open the store at `path`, loading any existing session.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = load(&path);
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<SessionKey, String>)) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut values);
        persist(&self.path, &values);
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn set(&self, key: SessionKey, value: &str) {
        self.update(|values| {
            values.insert(key, value.to_owned());
        });
    }

    fn remove(&self, key: SessionKey) {
        self.update(|values| {
            values.remove(&key);
        });
    }

    fn clear(&self) {
        self.update(BTreeMap::clear);
    }
}

fn load(path: &Path) -> BTreeMap<SessionKey, String> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read session file, starting empty");
            return BTreeMap::new();
        }
    };

    serde_json::from_str(&contents).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Corrupt session file, starting empty");
        BTreeMap::new()
    })
}

fn persist(path: &Path, values: &BTreeMap<SessionKey, String>) {
    let result = serde_json::to_vec_pretty(values)
        .map_err(std::io::Error::other)
        .and_then(|bytes| std::fs::write(path, bytes));

    match result {
        Ok(()) => debug!(path = %path.display(), keys = values.len(), "Session saved"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to save session"),
    }
}
