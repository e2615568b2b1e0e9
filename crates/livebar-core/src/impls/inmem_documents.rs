//! InMemoryDocumentStore - 開発・テスト用の DocumentStore
//!
//! Keeps sidebars and wiki pages in a map, records every call and can be told
//! to fail specific operations.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::{LivebarError, Result};
use crate::ports::{DocumentStore, MAX_SIDEBAR_LENGTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOpKind {
    GetDescription,
    SetDescription,
    WriteWiki,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOp {
    GetDescription {
        destination: String,
    },
    SetDescription {
        destination: String,
        text: String,
    },
    WriteWiki {
        destination: String,
        page: String,
        text: String,
        reason: String,
    },
}

impl DocumentOp {
    pub fn kind(&self) -> DocumentOpKind {
        match self {
            DocumentOp::GetDescription { .. } => DocumentOpKind::GetDescription,
            DocumentOp::SetDescription { .. } => DocumentOpKind::SetDescription,
            DocumentOp::WriteWiki { .. } => DocumentOpKind::WriteWiki,
        }
    }
}

#[derive(Default)]
struct Inner {
    descriptions: HashMap<String, String>,
    wiki_pages: HashMap<(String, String), String>,
    ops: Vec<DocumentOp>,
    failures: VecDeque<(DocumentOpKind, LivebarError)>,
}

pub struct InMemoryDocumentStore {
    inner: Mutex<Inner>,
    max_len: usize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_len: MAX_SIDEBAR_LENGTH,
        }
    }

    /// Overrides the description limit reported to callers.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Registers a destination with its current sidebar.
    pub fn with_description(self, destination: &str, text: impl Into<String>) -> Self {
        self.lock()
            .descriptions
            .insert(destination.to_string(), text.into());
        self
    }

    /// The next call of `kind` fails with `error` (calls are still recorded).
    pub fn fail_next(&self, kind: DocumentOpKind, error: LivebarError) {
        self.lock().failures.push_back((kind, error));
    }

    pub fn description(&self, destination: &str) -> Option<String> {
        self.lock().descriptions.get(destination).cloned()
    }

    pub fn wiki_page(&self, destination: &str, page: &str) -> Option<String> {
        self.lock()
            .wiki_pages
            .get(&(destination.to_string(), page.to_string()))
            .cloned()
    }

    pub fn ops(&self) -> Vec<DocumentOp> {
        self.lock().ops.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(inner: &mut Inner, op: DocumentOp) -> Result<()> {
        let kind = op.kind();
        inner.ops.push(op);
        match inner.failures.iter().position(|(k, _)| *k == kind) {
            Some(index) => match inner.failures.remove(index) {
                Some((_, error)) => Err(error),
                None => Ok(()),
            },
            None => Ok(()),
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_description(&self, destination: &str) -> Result<String> {
        let mut inner = self.lock();
        Self::record(
            &mut inner,
            DocumentOp::GetDescription {
                destination: destination.to_string(),
            },
        )?;
        inner
            .descriptions
            .get(destination)
            .cloned()
            .ok_or_else(|| LivebarError::Rejected(format!("unknown subreddit {destination}")))
    }

    async fn set_description(&self, destination: &str, text: &str) -> Result<()> {
        let mut inner = self.lock();
        Self::record(
            &mut inner,
            DocumentOp::SetDescription {
                destination: destination.to_string(),
                text: text.to_string(),
            },
        )?;
        if text.len() > self.max_len {
            return Err(LivebarError::Rejected(format!(
                "description is {} bytes, limit is {}",
                text.len(),
                self.max_len
            )));
        }
        inner
            .descriptions
            .insert(destination.to_string(), text.to_string());
        Ok(())
    }

    async fn write_wiki_page(
        &self,
        destination: &str,
        page: &str,
        text: &str,
        reason: &str,
    ) -> Result<()> {
        let mut inner = self.lock();
        Self::record(
            &mut inner,
            DocumentOp::WriteWiki {
                destination: destination.to_string(),
                page: page.to_string(),
                text: text.to_string(),
                reason: reason.to_string(),
            },
        )?;
        inner
            .wiki_pages
            .insert((destination.to_string(), page.to_string()), text.to_string());
        Ok(())
    }

    fn max_description_len(&self) -> usize {
        self.max_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_records_documents() {
        let store = InMemoryDocumentStore::new().with_description("chess", "old");

        assert_eq!(store.get_description("chess").await.unwrap(), "old");
        store.set_description("chess", "new").await.unwrap();
        store
            .write_wiki_page("chess", "livestreams", "page", "Bot action")
            .await
            .unwrap();

        assert_eq!(store.description("chess").as_deref(), Some("new"));
        assert_eq!(store.wiki_page("chess", "livestreams").as_deref(), Some("page"));
        assert_eq!(store.ops().len(), 3);
    }

    #[tokio::test]
    async fn scripted_failure_hits_matching_operation_once() {
        let store = InMemoryDocumentStore::new().with_description("chess", "old");
        store.fail_next(DocumentOpKind::SetDescription, LivebarError::Network("reset".into()));

        assert!(store.get_description("chess").await.is_ok());
        assert!(store.set_description("chess", "new").await.is_err());
        assert!(store.set_description("chess", "new").await.is_ok());
    }

    #[tokio::test]
    async fn unknown_destination_and_oversized_text_are_rejected() {
        let store = InMemoryDocumentStore::new().with_max_len(4);
        let err = store.get_description("nope").await.unwrap_err();
        assert!(matches!(err, LivebarError::Rejected(_)));

        let err = store.set_description("nope", "12345").await.unwrap_err();
        assert!(matches!(err, LivebarError::Rejected(_)));
        assert_eq!(store.max_description_len(), 4);
    }
}
