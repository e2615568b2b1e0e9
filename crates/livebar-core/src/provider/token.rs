//! TokenCache - bearer token の single-flight 更新
//!
//! # 学習ポイント
//! - RwLock で読み取りの fast path
//! - Mutex を refresh 全体で保持して二重 refresh を防ぐ
//! - lock 取得後の再チェック（double-checked locking）

use std::future::Future;

use tokio::sync::{Mutex, RwLock};

use crate::domain::{Result, TokenLease};
use crate::ports::Clock;

/// Process-wide token holder shared by every destination task.
///
/// At most one exchange runs at a time. Callers that find the lease expired
/// while an exchange is underway wait for it and reuse its result.
#[derive(Debug, Default)]
pub struct TokenCache {
    lease: RwLock<Option<TokenLease>>,
    refresh: Mutex<()>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current bearer if it is still valid at `clock.now()`.
    pub async fn current(&self, clock: &dyn Clock) -> Option<String> {
        let lease = self.lease.read().await;
        lease
            .as_ref()
            .filter(|l| l.is_valid_at(clock.now()))
            .map(|l| l.bearer.clone())
    }

    /// Returns a valid bearer, running `exchange` if there is none.
    pub async fn get_or_refresh<F, Fut>(&self, clock: &dyn Clock, exchange: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenLease>>,
    {
        if let Some(bearer) = self.current(clock).await {
            return Ok(bearer);
        }

        let _guard = self.refresh.lock().await;
        // 先に refresh した caller がいれば、その結果を使う
        if let Some(bearer) = self.current(clock).await {
            return Ok(bearer);
        }

        let lease = exchange().await?;
        let bearer = lease.bearer.clone();
        *self.lease.write().await = Some(lease);
        Ok(bearer)
    }

    /// Drops the lease if it still holds `stale`.
    ///
    /// A caller that saw a 401 only clears the token it used, so a lease
    /// installed by someone else in the meantime survives.
    pub async fn invalidate(&self, stale: &str) {
        let mut lease = self.lease.write().await;
        if lease.as_ref().is_some_and(|l| l.bearer == stale) {
            *lease = None;
        }
    }

    pub async fn install(&self, lease: TokenLease) {
        *self.lease.write().await = Some(lease);
    }
}
