//! Ports - 抽象化レイヤー
//!
//! 各 trait は外部システム（stream provider, Reddit, settings file）への
//! インターフェースを提供し、実装の詳細を隠蔽します。

pub mod clock;
pub mod directory;
pub mod document_store;
pub mod settings_store;
pub mod transport;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::directory::StreamDirectory;
pub use self::document_store::{DocumentStore, MAX_SIDEBAR_LENGTH};
pub use self::settings_store::SettingsStore;
pub use self::transport::{HttpRequest, HttpResponse, HttpTransport, Method};
