//! JSON file conversation store.
//!
//! Each conversation is a pretty-printed JSON array of turns stored as
//! `<history dir>/<id>`. The id doubles as the file name.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use jarvis_core::domain::{
    CONVERSATION_EXTENSION, ConversationId, TIMESTAMP_FORMAT, TitleResult, Turn, UNTITLED_TITLE,
};
use jarvis_core::ports::{Clock, ConversationStore, StoreError};
use tokio::sync::Mutex;
use tracing::debug;

use crate::io::{remove_if_exists, write_atomic};
use crate::naming::{candidate_id, validate_id, validate_title};
use crate::paths::ensure_directory;

/// Upper bound on ` (n)` suffixes tried before giving up.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Conversation store backed by one JSON file per conversation.
pub struct JsonConversationStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    /// Serializes read-modify-write cycles and renames.
    write_lock: Mutex<()>,
}

impl JsonConversationStore {
    /// Open the store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let dir = dir.into();
        ensure_directory(&dir)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(Self {
            dir,
            clock,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory holding the conversation files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, id: &ConversationId) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.dir.join(id.as_str()))
    }

    async fn read_turns(&self, id: &ConversationId, path: &Path) -> Result<Vec<Turn>, StoreError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()));
            }
            Err(e) => return Err(io_error(path, &e)),
        };
        serde_json::from_str(&contents)
            .map_err(|e| StoreError::Serialization(format!("{id}: {e}")))
    }

    /// Create a file for `title`/`stem`, trying suffixed names on collision.
    async fn create_unique(&self, title: &str, stem: &str) -> Result<ConversationId, StoreError> {
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let id = candidate_id(title, stem, attempt);
            let path = self.path_of(&id)?;
            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match file {
                Ok(_) => {
                    write_atomic(&path, b"[]")
                        .await
                        .map_err(|e| io_error(&path, &e))?;
                    return Ok(id);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(io_error(&path, &e)),
            }
        }
        Err(StoreError::Io(format!(
            "no free file name for {title:?} after {MAX_NAME_ATTEMPTS} attempts"
        )))
    }
}

#[async_trait]
impl ConversationStore for JsonConversationStore {
    async fn list(&self) -> Result<Vec<ConversationId>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, &e))?;

        let mut files: Vec<(SystemTime, String)> = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.dir, &e))?
        {
            let path = entry.path();
            let is_json = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(CONVERSATION_EXTENSION));
            if !is_json {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((modified, name.to_string()));
        }

        // Newest first; names break ties so equal mtimes list deterministically.
        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        Ok(files
            .into_iter()
            .map(|(_, name)| ConversationId::new(name))
            .collect())
    }

    async fn create(&self) -> Result<ConversationId, StoreError> {
        let _guard = self.write_lock.lock().await;
        let stem = self.clock.now().format(TIMESTAMP_FORMAT).to_string();
        let id = self.create_unique(UNTITLED_TITLE, &stem).await?;
        debug!(conversation = %id, "Created conversation");
        Ok(id)
    }

    async fn read(&self, id: &ConversationId) -> Result<Vec<Turn>, StoreError> {
        let path = self.path_of(id)?;
        self.read_turns(id, &path).await
    }

    async fn append(&self, id: &ConversationId, turn: Turn) -> Result<(), StoreError> {
        let path = self.path_of(id)?;
        let _guard = self.write_lock.lock().await;

        let mut turns = self.read_turns(id, &path).await?;
        turns.push(turn);

        let contents = serde_json::to_string_pretty(&turns)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&path, contents.as_bytes())
            .await
            .map_err(|e| io_error(&path, &e))?;

        debug!(conversation = %id, turns = turns.len(), "Appended turn");
        Ok(())
    }

    async fn rename(&self, id: &ConversationId, title: &str) -> Result<TitleResult, StoreError> {
        let path = self.path_of(id)?;
        let title = validate_title(title)?;
        let _guard = self.write_lock.lock().await;

        if !path_exists(&path).await {
            return Err(StoreError::NotFound(id.clone()));
        }

        let stem = id.timestamp_stem().map_or_else(
            || self.clock.now().format(TIMESTAMP_FORMAT).to_string(),
            str::to_string,
        );

        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let new_id = candidate_id(&title, &stem, attempt);
            if &new_id == id {
                return Ok(TitleResult { new_id, title });
            }
            let new_path = self.path_of(&new_id)?;
            if path_exists(&new_path).await {
                continue;
            }
            tokio::fs::rename(&path, &new_path)
                .await
                .map_err(|e| io_error(&path, &e))?;
            debug!(from = %id, to = %new_id, "Renamed conversation");
            return Ok(TitleResult { new_id, title });
        }

        Err(StoreError::Io(format!(
            "no free file name for {title:?} after {MAX_NAME_ATTEMPTS} attempts"
        )))
    }

    async fn delete(&self, id: &ConversationId) -> Result<(), StoreError> {
        let path = self.path_of(id)?;
        let _guard = self.write_lock.lock().await;
        let removed = remove_if_exists(&path)
            .await
            .map_err(|e| io_error(&path, &e))?;
        debug!(conversation = %id, removed, "Deleted conversation");
        Ok(())
    }
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

fn io_error(path: &Path, e: &io::Error) -> StoreError {
    StoreError::Io(format!("{}: {e}", path.display()))
}
