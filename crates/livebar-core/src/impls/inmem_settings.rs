//! InMemorySettingsStore - 開発・テスト用の SettingsStore

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::{DestinationState, LivebarError, Result};
use crate::ports::SettingsStore;

/// Records every saved snapshot instead of writing a file.
#[derive(Default)]
pub struct InMemorySettingsStore {
    saves: Mutex<Vec<DestinationState>>,
    failures: Mutex<VecDeque<LivebarError>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next save fails with `error`.
    pub fn fail_next(&self, error: LivebarError) {
        lock(&self.failures).push_back(error);
    }

    pub fn saves(&self) -> Vec<DestinationState> {
        lock(&self.saves).clone()
    }

    pub fn save_count(&self) -> usize {
        lock(&self.saves).len()
    }

    /// Most recent snapshot saved for `destination`.
    pub fn latest(&self, destination: &str) -> Option<DestinationState> {
        lock(&self.saves)
            .iter()
            .rev()
            .find(|s| s.name == destination)
            .cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn save_destination(&self, state: &DestinationState) -> Result<()> {
        if let Some(error) = lock(&self.failures).pop_front() {
            return Err(error);
        }
        lock(&self.saves).push(state.clone());
        Ok(())
    }
}
