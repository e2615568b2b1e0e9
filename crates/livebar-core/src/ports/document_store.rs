//! DocumentStore port - sidebar / wiki の保存先

use async_trait::async_trait;

use crate::domain::Result;

/// Maximum sidebar description length accepted by the document store, in bytes.
pub const MAX_SIDEBAR_LENGTH: usize = 10_240;

/// Remote documents owned by a destination.
///
/// Each write is a whole-document overwrite; there is no locking against
/// concurrent human edits.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_description(&self, destination: &str) -> Result<String>;

    async fn set_description(&self, destination: &str, text: &str) -> Result<()>;

    async fn write_wiki_page(
        &self,
        destination: &str,
        page: &str,
        text: &str,
        reason: &str,
    ) -> Result<()>;

    fn max_description_len(&self) -> usize {
        MAX_SIDEBAR_LENGTH
    }
}
