//! SettingsStore port - 設定の永続化

use async_trait::async_trait;

use crate::domain::{DestinationState, Result};

/// Durable home of the settings snapshot.
///
/// Tasks own a copy of their destination's state and hand it back here after
/// every mutation; the store replaces that entry and persists the full snapshot.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn save_destination(&self, state: &DestinationState) -> Result<()>;
}
