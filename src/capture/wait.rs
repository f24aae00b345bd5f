//! 轮询等待
//!
//! 反复执行探测，直到就绪或超时。暂时性错误视为"尚未就绪"继续重试，
//! 致命错误立即返回。超时不是错误：返回 `Ok(None)`，由调用方决定如何处理。

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::SessionError;

/// 一次探测的结果
#[derive(Debug)]
pub enum Probe<T> {
    /// 已就绪
    Ready(T),
    /// 尚未就绪（包括暂时性错误）
    NotReady,
    /// 致命错误，停止等待
    Fatal(SessionError),
}

impl<T> From<Result<Option<T>, SessionError>> for Probe<T> {
    fn from(result: Result<Option<T>, SessionError>) -> Self {
        match result {
            Ok(Some(value)) => Probe::Ready(value),
            Ok(None) => Probe::NotReady,
            Err(e) if e.is_transient() => {
                debug!("探测暂时失败，继续等待: {}", e);
                Probe::NotReady
            }
            Err(e) => Probe::Fatal(e),
        }
    }
}

/// 轮询参数
#[derive(Debug, Clone, Copy)]
pub struct PollingWait {
    /// 总超时时间
    pub timeout: Duration,
    /// 每次探测前的等待间隔
    pub interval: Duration,
}

impl PollingWait {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// 轮询直到探测就绪或超时
    ///
    /// 至少探测一次；每次探测前先等待 `interval`
    pub async fn until<T, F, Fut>(&self, mut probe: F) -> Result<Option<T>, SessionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Probe<T>>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut attempts = 0u32;

        loop {
            sleep(self.interval).await;
            attempts += 1;

            match probe().await {
                Probe::Ready(value) => return Ok(Some(value)),
                Probe::Fatal(e) => return Err(e),
                Probe::NotReady => {}
            }

            if Instant::now() >= deadline {
                debug!("等待超时 ({:?}, 共探测 {} 次)", self.timeout, attempts);
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn wait() -> PollingWait {
        PollingWait::new(Duration::from_secs(10), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_value_once_ready() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = wait()
            .until(|| async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n >= 3 {
                    Probe::Ready(n)
                } else {
                    Probe::NotReady
                }
            })
            .await;

        assert_eq!(result.unwrap(), Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_none_without_error() {
        let start = Instant::now();

        let result: Result<Option<()>, _> = wait().until(|| async { Probe::NotReady }).await;

        assert!(result.unwrap().is_none());
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = wait()
            .until(|| async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Probe::from(Err::<Option<u32>, _>(SessionError::transient("no such element")))
                } else {
                    Probe::from(Ok::<_, SessionError>(Some(7)))
                }
            })
            .await;

        assert_eq!(result.unwrap(), Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_stops_waiting() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<Option<()>, _> = wait()
            .until(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Probe::from(Err(SessionError::fatal("connection closed")))
            })
            .await;

        assert!(matches!(result, Err(SessionError::Fatal { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
