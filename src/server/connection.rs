// Connection handling module
// Serves a single accepted TCP connection

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Tracks whether a connection is busy and since when it has been idle
#[derive(Clone)]
struct IdleTracker {
    opened: Instant,
    in_flight: Arc<AtomicUsize>,
    /// Milliseconds after `opened` at which the last request finished
    last_active_ms: Arc<AtomicU64>,
}

impl IdleTracker {
    fn new() -> Self {
        Self {
            opened: Instant::now(),
            in_flight: Arc::new(AtomicUsize::new(0)),
            last_active_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    fn begin(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    fn end(&self) {
        let elapsed = u64::try_from(self.opened.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.last_active_ms.store(elapsed, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Time left before the connection has been idle for `limit`
    ///
    /// A connection with a request in progress is never idle, so the full
    /// `limit` is returned.
    fn remaining(&self, limit: Duration) -> Duration {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return limit;
        }
        let last_active = Duration::from_millis(self.last_active_ms.load(Ordering::SeqCst));
        let idle = self.opened.elapsed().saturating_sub(last_active);
        limit.saturating_sub(idle)
    }
}

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive
/// 3. Serves the connection with the request handler
/// 4. Closes the connection once it has been idle for `keep_alive_timeout`
///
/// Idle means no request is being handled: waiting for the next request, or
/// for the headers of a request still being received. A response that is
/// being written is allowed to finish before the connection closes.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
pub fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
) {
    let state = Arc::clone(state);

    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let keep_alive_secs = state.config.performance.keep_alive_timeout;
        let keep_alive = Duration::from_secs(keep_alive_secs);
        let idle = IdleTracker::new();

        let mut builder = http1::Builder::new();
        builder.keep_alive(keep_alive_secs > 0);

        let service = {
            let idle = idle.clone();
            service_fn(move |req| {
                let state = Arc::clone(&state);
                let idle = idle.clone();
                async move {
                    idle.begin();
                    let response = handler::handle_request(req, state, peer_addr).await;
                    idle.end();
                    response
                }
            })
        };
        let conn = builder.serve_connection(io, service);
        tokio::pin!(conn);

        let mut closing = false;
        let result = loop {
            tokio::select! {
                result = conn.as_mut() => break result,
                () = tokio::time::sleep(idle.remaining(keep_alive)),
                    if keep_alive_secs > 0 && !closing =>
                {
                    if idle.remaining(keep_alive).is_zero() {
                        conn.as_mut().graceful_shutdown();
                        closing = true;
                    }
                }
            }
        };

        if let Err(err) = result {
            logger::log_connection_error(&err);
        }
    });
}
