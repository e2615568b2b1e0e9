//! App - アプリケーション層
//!
//! ports を組み合わせて subreddit ごとの更新ループを実装します。
//!
//! # 主要コンポーネント
//! - **Scheduler**: destination ごとのタスク起動と停止
//! - **DestinationTask**: fetch → sidebar → wiki → sleep のループ
//! - **RetryPolicy**: 操作ごとの固定待ち時間での再試行
//! - **RecordTracker**: 合計視聴者数の記録更新
//! - **ShutdownSignal**: watch チャネルによる停止通知

pub mod destination_task;
pub mod record;
pub mod retry;
pub mod scheduler;
pub mod shutdown;

// 主要な型を再エクスポート
pub use self::destination_task::{CycleReport, DestinationTask, TaskServices};
pub use self::record::{RecordUpdate, observe_total};
pub use self::retry::{Operation, RetryPolicy};
pub use self::scheduler::Scheduler;
pub use self::shutdown::ShutdownSignal;
