// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP accept loop.
//!
//! Each connection is served on its own tracked task with the header read
//! timeout and the idle timeout from configuration. Cancelling the shutdown
//! token stops accepting and asks every open connection to finish its
//! in-flight request and close.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder;
use hyper_util::service::TowerToHyperService;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace, warn};

use agentflow_core::domain::config::ServerTimeouts;

/// Limits enforced per connection.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ConnectionLimits {
    pub(crate) read_header: Option<Duration>,
    pub(crate) idle: Option<Duration>,
}

impl From<&ServerTimeouts> for ConnectionLimits {
    fn from(timeouts: &ServerTimeouts) -> Self {
        Self {
            read_header: timeouts.read_header(),
            idle: timeouts.idle(),
        }
    }
}

/// Accepts until `shutdown` is cancelled. Transient accept failures are
/// skipped; any other accept error ends the loop and is returned.
pub(crate) async fn serve(
    listener: TcpListener,
    router: Router,
    limits: ConnectionLimits,
    shutdown: CancellationToken,
    tracker: TaskTracker,
) -> io::Result<()> {
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = shutdown.cancelled() => break,
        };
        let (stream, peer) = match accepted {
            Ok(conn) => conn,
            Err(e) if is_transient(&e) => {
                debug!("Accept failed: {}", e);
                continue;
            }
            Err(e) => {
                warn!("Accept failed, stopping HTTP server: {}", e);
                return Err(e);
            }
        };
        trace!(peer = %peer, "Connection accepted");

        let router = router.clone();
        let shutdown = shutdown.clone();
        tracker.spawn(async move {
            if let Err(e) = serve_connection(stream, router, limits, shutdown).await {
                debug!(peer = %peer, "Connection closed with error: {}", e);
            }
        });
    }
    debug!("HTTP accept loop stopped");
    Ok(())
}

async fn serve_connection(
    stream: TcpStream,
    router: Router,
    limits: ConnectionLimits,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let activity = Activity::default();
    let io = TokioIo::new(TrackedStream {
        inner: stream,
        activity: activity.clone(),
    });

    let mut builder = Builder::new(TokioExecutor::new());
    builder.http1().timer(TokioTimer::new());
    if let Some(read_header) = limits.read_header {
        builder.http1().header_read_timeout(read_header);
    }
    builder.http2().timer(TokioTimer::new());

    let conn = builder.serve_connection(io, TowerToHyperService::new(router));
    tokio::pin!(conn);

    let mut closing = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => return result,
            _ = shutdown.cancelled(), if !closing => {
                closing = true;
                conn.as_mut().graceful_shutdown();
            }
            _ = activity.idle_for(limits.idle), if !closing => {
                trace!("Closing idle connection");
                closing = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

/// Time of the last byte moved in either direction.
#[derive(Clone)]
struct Activity(Arc<Mutex<Instant>>);

impl Default for Activity {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(Instant::now())))
    }
}

impl Activity {
    fn touch(&self) {
        *self.0.lock() = Instant::now();
    }

    /// Resolves once nothing has moved for `limit`. Never resolves without one.
    async fn idle_for(&self, limit: Option<Duration>) {
        let Some(limit) = limit else {
            return std::future::pending().await;
        };
        loop {
            let deadline = *self.0.lock() + limit;
            if Instant::now() >= deadline {
                return;
            }
            tokio::time::sleep_until(deadline).await;
        }
    }
}

struct TrackedStream {
    inner: TcpStream,
    activity: Activity,
}

impl AsyncRead for TrackedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if matches!(poll, Poll::Ready(Ok(()))) && buf.filled().len() > before {
            this.activity.touch();
        }
        poll
    }
}

impl AsyncWrite for TrackedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        if matches!(poll, Poll::Ready(Ok(n)) if n > 0) {
            this.activity.touch();
        }
        poll
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_idle_for_waits_from_last_activity() {
        let activity = Activity::default();
        tokio::time::sleep(Duration::from_millis(60)).await;
        activity.touch();

        let touched = Instant::now();
        activity.idle_for(Some(Duration::from_millis(100))).await;
        assert!(touched.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_idle_for_without_limit_never_fires() {
        let activity = Activity::default();
        let waited =
            tokio::time::timeout(Duration::from_millis(200), activity.idle_for(None)).await;
        assert!(waited.is_err());
    }

    #[test]
    fn test_limits_skip_zero_timeouts() {
        let timeouts = ServerTimeouts {
            http_idle: Some(Duration::ZERO),
            http_read_header: Some(Duration::from_secs(2)),
            ..Default::default()
        };
        let limits = ConnectionLimits::from(&timeouts);
        assert_eq!(limits.idle, None);
        assert_eq!(limits.read_header, Some(Duration::from_secs(2)));
    }
}
