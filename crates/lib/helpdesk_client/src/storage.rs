//! Local persistence of the chat session id across restarts.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{ClientError, Result};

/// Where the widget keeps its session id between runs.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Option<String>;

    fn save(&self, session_id: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// Stores the session id in a single file.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$APP_DATA/helpdesk/chat_session_id`.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::data_dir().ok_or(ClientError::NoDataDir)?;
        Ok(Self::new(dir.join("helpdesk").join("chat_session_id")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read session file {}: {e}", self.path.display());
                None
            }
        }
    }

    fn save(&self, session_id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, session_id)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Keeps the session id in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    value: Mutex<Option<String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session_id: &str) -> Self {
        Self {
            value: Mutex::new(Some(session_id.to_string())),
        }
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Option<String> {
        self.value.lock().ok().and_then(|v| v.clone())
    }

    fn save(&self, session_id: &str) -> Result<()> {
        if let Ok(mut v) = self.value.lock() {
            *v = Some(session_id.to_string());
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if let Ok(mut v) = self.value.lock() {
            *v = None;
        }
        Ok(())
    }
}
