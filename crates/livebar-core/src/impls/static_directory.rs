//! StaticDirectory - 開発・テスト用の StreamDirectory
//!
//! A fixed catalogue of games and live streams. Streams carry the raw provider
//! game id, exactly like the real client returns them.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::{LivebarError, Result, StreamRecord};
use crate::ports::StreamDirectory;

#[derive(Default)]
struct Inner {
    /// (id, name)
    games: Vec<(String, String)>,
    streams: Vec<StreamRecord>,
    list_failures: VecDeque<LivebarError>,
    resolve_calls: Vec<Vec<String>>,
    list_calls: Vec<Vec<String>>,
}

#[derive(Default)]
pub struct StaticDirectory {
    inner: Mutex<Inner>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_game(self, id: &str, name: &str) -> Self {
        self.lock().games.push((id.to_string(), name.to_string()));
        self
    }

    pub fn with_stream(self, stream: StreamRecord) -> Self {
        self.lock().streams.push(stream);
        self
    }

    /// Replaces the live streams (between cycles).
    pub fn set_streams(&self, streams: Vec<StreamRecord>) {
        self.lock().streams = streams;
    }

    /// The next `list_streams` call fails with `error`.
    pub fn fail_next_list(&self, error: LivebarError) {
        self.lock().list_failures.push_back(error);
    }

    pub fn resolve_calls(&self) -> Vec<Vec<String>> {
        self.lock().resolve_calls.clone()
    }

    pub fn list_calls(&self) -> Vec<Vec<String>> {
        self.lock().list_calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StreamDirectory for StaticDirectory {
    async fn resolve_game_ids(&self, names: &[String]) -> Result<HashMap<String, String>> {
        let mut inner = self.lock();
        inner.resolve_calls.push(names.to_vec());
        Ok(inner
            .games
            .iter()
            .filter_map(|(id, game)| {
                names
                    .iter()
                    .find(|n| n.eq_ignore_ascii_case(game))
                    .map(|n| (id.clone(), n.clone()))
            })
            .collect())
    }

    async fn list_streams(&self, game_ids: &[String]) -> Result<Vec<StreamRecord>> {
        let mut inner = self.lock();
        inner.list_calls.push(game_ids.to_vec());
        if let Some(error) = inner.list_failures.pop_front() {
            return Err(error);
        }
        Ok(inner
            .streams
            .iter()
            .filter(|s| game_ids.contains(&s.game))
            .cloned()
            .collect())
    }
}
