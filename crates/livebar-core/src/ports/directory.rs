//! StreamDirectory port - 配信ディレクトリの抽象化

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{Result, StreamRecord};

/// What a destination task needs from the stream provider.
///
/// `ProviderClient` is the production implementation.
#[async_trait]
pub trait StreamDirectory: Send + Sync {
    /// Provider game id -> name for every name the provider knows.
    /// Unknown names are simply absent.
    async fn resolve_game_ids(&self, names: &[String]) -> Result<HashMap<String, String>>;

    /// Live streams for the given game ids, in provider order.
    async fn list_streams(&self, game_ids: &[String]) -> Result<Vec<StreamRecord>>;
}
