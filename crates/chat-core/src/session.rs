//! Session Management
//!
//! A session is one user's conversation plus the holdings it has built up.
//! Stores persist whole sessions after every turn.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ChatError, Result};
use crate::message::{Conversation, Sender};
use crate::portfolio::Holding;

const TITLE_LEN: usize = 50;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a client-supplied identifier.
    ///
    /// Only ASCII letters, digits and `-` are allowed, so an id is always
    /// safe to use as a file name.
    pub fn parse(s: &str) -> Result<Self> {
        let valid = !s.is_empty()
            && s.len() <= 64
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(ChatError::Session(format!("invalid session id: {s:?}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A complete chat session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Conversation history
    pub conversation: Conversation,

    /// Holdings as of the last completed turn
    #[serde(default)]
    pub holdings: Vec<Holding>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    /// Create with specific ID
    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            conversation: Conversation::new(),
            holdings: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Preview of the first user message
    pub fn title(&self) -> String {
        self.conversation
            .messages()
            .iter()
            .find(|m| m.sender == Sender::User)
            .and_then(|m| m.content())
            .map(|content| {
                let preview: String = content.chars().take(TITLE_LEN).collect();
                if content.chars().count() > TITLE_LEN {
                    format!("{preview}...")
                } else {
                    preview
                }
            })
            .unwrap_or_else(|| {
                let short_id: String = self.id.as_str().chars().take(8).collect();
                format!("Session {short_id}")
            })
    }

    /// Message count
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Session store trait for persistence
pub trait SessionStore: Send + Sync {
    /// Save a session, replacing any stored copy
    fn save(&self, session: &Session) -> Result<()>;

    /// Load a session by ID
    fn load(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Delete a session; returns whether it existed
    fn delete(&self, id: &SessionId) -> Result<bool>;

    /// Most recently active sessions first
    fn list(&self, limit: usize) -> Result<Vec<Session>>;
}

fn most_recent(mut sessions: Vec<Session>, limit: usize) -> Vec<Session> {
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    sessions.truncate(limit);
    sessions
}

/// In-memory session store (for development/testing)
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

fn poisoned<T>(_: T) -> ChatError {
    ChatError::Session("session store lock poisoned".into())
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<Session>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(id).cloned())
    }

    fn delete(&self, id: &SessionId) -> Result<bool> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        Ok(sessions.remove(id).is_some())
    }

    fn list(&self, limit: usize) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(most_recent(sessions.values().cloned().collect(), limit))
    }
}

/// One JSON file per session under a directory
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Open a store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        tracing::info!(dir = %dir.display(), "Opened file session store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{}.json", id.as_str()))
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let path = self.path_for(&session.id);
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_vec_pretty(session)?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;

        tracing::debug!(session_id = %session.id, "Saved session");
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<Session>> {
        match std::fs::read(self.path_for(id)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, id: &SessionId) -> Result<bool> {
        match std::fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, limit: usize) -> Result<Vec<Session>> {
        let mut sessions = Vec::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let parsed = std::fs::read(&path)
                .map_err(ChatError::from)
                .and_then(|bytes| Ok(serde_json::from_slice::<Session>(&bytes)?));
            match parsed {
                Ok(session) => sessions.push(session),
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Skipping unreadable session"
                ),
            }
        }

        Ok(most_recent(sessions, limit))
    }
}
