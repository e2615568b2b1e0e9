//! Impls - ports の実装
//!
//! - **ReqwestTransport**: 本番用 HTTP
//! - **RedditDocumentStore**: Reddit の sidebar / wiki
//! - **InMemoryDocumentStore / InMemorySettingsStore / StaticDirectory**: 開発・テスト用

pub mod inmem_documents;
pub mod inmem_settings;
pub mod reddit;
pub mod reqwest_transport;
pub mod static_directory;

#[cfg(test)]
pub mod scripted;

pub use self::inmem_documents::{DocumentOp, DocumentOpKind, InMemoryDocumentStore};
pub use self::inmem_settings::InMemorySettingsStore;
pub use self::reddit::{RedditConfig, RedditDocumentStore};
pub use self::reqwest_transport::ReqwestTransport;
pub use self::static_directory::StaticDirectory;
