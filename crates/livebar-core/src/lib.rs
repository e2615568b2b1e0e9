//! livebar-core
//!
//! Publishes live-stream listings for configured games into subreddit
//! sidebars and wiki pages.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（stream record, destination state, game index, token lease, phase, errors）
//! - **ports**: 抽象化レイヤー（HttpTransport, StreamDirectory, DocumentStore, SettingsStore, Clock）
//! - **provider**: Twitch Helix クライアント（token, rate limit, pagination）
//! - **render**: sidebar の fitting と wiki ページの描画
//! - **app**: destination ごとの更新ループと Scheduler
//! - **config**: 設定ファイルの検証・読み込み・保存
//! - **impls**: ports の実装（reqwest, Reddit, in-memory）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod provider;
pub mod render;
