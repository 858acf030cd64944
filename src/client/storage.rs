use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::client::store::ChatSession;

/// Fixed key the session record is persisted under.
pub const STORAGE_NAMESPACE: &str = "nutrition-chat-storage";

/// Local persistence for the current session. Only the session is durable;
/// transient flags and errors reset on reload.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> anyhow::Result<Option<ChatSession>>;
    fn save(&self, session: &ChatSession) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    session: Option<ChatSession>,
}

/// JSON file under a caller-supplied directory, one record per namespace.
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let path = dir.into().join(format!("{}.json", STORAGE_NAMESPACE));
        Self { path }
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> anyhow::Result<Option<ChatSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        let state: PersistedState =
            serde_json::from_str(&raw).with_context(|| format!("parse {}", self.path.display()))?;
        Ok(state.session)
    }

    fn save(&self, session: &ChatSession) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let state = PersistedState {
            session: Some(session.clone()),
        };
        let raw = serde_json::to_string_pretty(&state)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("remove {}", self.path.display()))?;
        }
        Ok(())
    }
}
