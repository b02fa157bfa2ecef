use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// 优雅关机。
///
/// 服务器为每个连接发放一个[`ConnectionGuard`]，守卫存在期间连接被视为仍在处理中。
/// 关机时通知所有连接在完成当前请求后关闭，然后等待守卫全部释放。
#[derive(Debug)]
pub struct GracefulShutdown {
    live: watch::Sender<()>,
    closing: CancellationToken,
}

impl GracefulShutdown {
    pub(super) fn new() -> Self {
        let (live, _) = watch::channel(());
        Self {
            live,
            closing: CancellationToken::new(),
        }
    }

    pub(super) fn track(&self) -> ConnectionGuard {
        ConnectionGuard {
            _live: self.live.subscribe(),
            closing: self.closing.clone(),
        }
    }

    /// 仍在处理中的连接数。
    pub fn open_connections(&self) -> usize {
        self.live.receiver_count()
    }

    /// 通知所有连接关闭，并等待它们完成。
    ///
    /// 超时时间为`None`时一直等待。
    ///
    /// # 错误
    ///
    /// 超时后仍有连接未关闭时返回[`ShutdownTimeout`]。
    pub async fn shutdown(self, timeout: Option<Duration>) -> Result<(), ShutdownTimeout> {
        self.closing.cancel();

        let Some(timeout) = timeout else {
            self.live.closed().await;
            return Ok(());
        };

        tokio::time::timeout(timeout, self.live.closed())
            .await
            .map_err(|_| ShutdownTimeout {
                open: self.open_connections(),
            })
    }
}

/// 优雅关机超时。
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{open} connection(s) still open after the shutdown timeout")]
pub struct ShutdownTimeout {
    /// 超时时仍未关闭的连接数。
    pub open: usize,
}

/// 单个连接的守卫。
#[derive(Debug)]
pub(super) struct ConnectionGuard {
    _live: watch::Receiver<()>,
    closing: CancellationToken,
}

impl ConnectionGuard {
    /// 驱动连接直到完成。收到关机通知时调用一次`close`，让连接处理完当前请求后关闭。
    pub(super) async fn serve<C>(self, conn: C, close: impl FnOnce(Pin<&mut C>)) -> C::Output
    where
        C: Future,
    {
        let mut conn = std::pin::pin!(conn);

        tokio::select! {
            output = conn.as_mut() => return output,
            () = self.closing.cancelled() => {}
        }

        close(conn.as_mut());
        conn.await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn no_connections() {
        let graceful = GracefulShutdown::new();
        assert_eq!(graceful.open_connections(), 0);
        assert_eq!(graceful.shutdown(Some(Duration::from_secs(1))).await, Ok(()));
    }

    #[tokio::test]
    async fn counts_open_connections() {
        let graceful = GracefulShutdown::new();
        let first = graceful.track();
        let second = graceful.track();
        assert_eq!(graceful.open_connections(), 2);

        drop(first);
        assert_eq!(graceful.open_connections(), 1);
        drop(second);
        assert_eq!(graceful.open_connections(), 0);
    }

    #[tokio::test]
    async fn closes_connections_and_waits() {
        let graceful = GracefulShutdown::new();
        let (tx, rx) = oneshot::channel::<()>();
        let closed = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(graceful.track().serve(
            async move {
                let _ = rx.await;
            },
            {
                let closed = closed.clone();
                move |_| closed.store(true, Ordering::SeqCst)
            },
        ));

        let shutdown = tokio::spawn(graceful.shutdown(None));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(closed.load(Ordering::SeqCst));
        assert!(!shutdown.is_finished());

        tx.send(()).unwrap();
        task.await.unwrap();
        assert_eq!(shutdown.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn finished_connection_is_not_closed() {
        let graceful = GracefulShutdown::new();
        let closed = Arc::new(AtomicBool::new(false));

        let flag = closed.clone();
        graceful
            .track()
            .serve(async {}, move |_| flag.store(true, Ordering::SeqCst))
            .await;

        assert!(!closed.load(Ordering::SeqCst));
        assert_eq!(graceful.open_connections(), 0);
    }

    #[tokio::test]
    async fn reports_open_connections_on_timeout() {
        let graceful = GracefulShutdown::new();
        let stuck = tokio::spawn(graceful.track().serve(std::future::pending::<()>(), |_| {}));

        assert_eq!(
            graceful.shutdown(Some(Duration::from_millis(10))).await,
            Err(ShutdownTimeout { open: 1 })
        );
        stuck.abort();
    }
}
