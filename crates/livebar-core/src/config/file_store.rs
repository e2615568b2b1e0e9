//! FileSettingsStore - 設定ファイルへの永続化
//!
//! Holds the full snapshot in memory and rewrites the whole file on every
//! save (temp file in the same directory, then rename).

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::Settings;
use crate::domain::{DestinationState, LivebarError, Result};
use crate::ports::SettingsStore;

pub struct FileSettingsStore {
    path: PathBuf,
    // held across the file write so saves land in order
    snapshot: Mutex<Settings>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            path: path.into(),
            snapshot: Mutex::new(settings),
        }
    }

    #[cfg(test)]
    fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    async fn snapshot(&self) -> Settings {
        self.snapshot.lock().await.clone()
    }

    async fn write(&self, settings: &Settings) -> Result<()> {
        let text = settings
            .to_json_pretty()
            .map_err(|e| LivebarError::Persist(e.to_string()))?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, text.as_bytes()))
            .await
            .map_err(|e| LivebarError::Persist(format!("save task failed: {e}")))?
            .map_err(|e| LivebarError::Persist(format!("{}: {e}", self.path.display())))?;

        debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn save_destination(&self, state: &DestinationState) -> Result<()> {
        let mut snapshot = self.snapshot.lock().await;
        let Some(entry) = snapshot.subreddits.iter_mut().find(|s| s.name == state.name) else {
            return Err(LivebarError::Persist(format!(
                "subreddit {} is not in the settings file",
                state.name
            )));
        };
        *entry = state.clone();
        self.write(&snapshot).await
    }
}

/// Same-directory temp file, then rename over `path`.
fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
