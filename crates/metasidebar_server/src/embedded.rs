//! In-process API server for headless sidebars and integration tests.

use crate::{resolve_bind_address, serve_router, AppState, ServerError};
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Metadata API served from a background thread until dropped.
pub struct EmbeddedServer {
    addr: SocketAddr,
    used_fallback: bool,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

/// Bind `requested`, or an auto-assigned port on the same interface when it
/// is taken. The flag reports whether the fallback was used.
fn bind_with_fallback(requested: SocketAddr) -> Result<(TcpListener, bool), ServerError> {
    let bind_error = |err: std::io::Error| ServerError::Bind(err.to_string());
    match TcpListener::bind(requested) {
        Ok(listener) => Ok((listener, false)),
        Err(err) if err.kind() == ErrorKind::AddrInUse => {
            warn!("{} is in use; taking an auto-assigned port", requested);
            TcpListener::bind(SocketAddr::new(requested.ip(), 0))
                .map(|listener| (listener, true))
                .map_err(bind_error)
        }
        Err(err) => Err(bind_error(err)),
    }
}

fn server_runtime() -> Result<Runtime, ServerError> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|err| ServerError::Runtime(err.to_string()))
}

impl EmbeddedServer {
    /// Bind the address resolved from `state.config` and start serving.
    ///
    /// Binding happens before this returns, so [`Self::addr`] is immediately
    /// reachable. A busy port is replaced by an auto-assigned one.
    ///
    /// # Errors
    /// Returns [`ServerError`] if the socket, runtime or thread cannot be set up.
    pub fn start(state: AppState, allow_public: bool) -> Result<Self, ServerError> {
        let requested = resolve_bind_address(&state.config, allow_public);
        let (listener, used_fallback) = bind_with_fallback(requested)?;
        listener
            .set_nonblocking(true)
            .map_err(|err| ServerError::Bind(err.to_string()))?;
        let addr = listener
            .local_addr()
            .map_err(|err| ServerError::Bind(err.to_string()))?;
        let runtime = server_runtime()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = thread::Builder::new()
            .name("metasidebar-embedded-server".into())
            .spawn(move || {
                let served = runtime.block_on(async move {
                    let listener = tokio::net::TcpListener::from_std(listener)?;
                    let shutdown = async {
                        let _ = shutdown_rx.await;
                    };
                    serve_router(listener, state, allow_public, shutdown).await
                });
                if let Err(err) = served {
                    warn!("embedded server on {} stopped: {}", addr, err);
                }
            })?;

        if !addr.ip().is_loopback() {
            warn!("embedded server exposed on non-localhost address {}", addr);
        }
        info!("metadata API listening on http://{}", addr);
        Ok(Self {
            addr,
            used_fallback,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `http://` URL for [`metasidebar_core::MetadataApi`] clients.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Whether the configured port was busy at start.
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }
}

impl Drop for EmbeddedServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metasidebar_core::memory::SeedData;
    use metasidebar_core::{Config, MemoryMetadataApi};

    fn state(port: u16) -> AppState {
        let config = Config {
            port,
            ..Config::default()
        };
        AppState::new(config, MemoryMetadataApi::from_seed(SeedData::demo()))
    }

    #[test]
    fn busy_port_falls_back_to_auto_port() {
        let first = EmbeddedServer::start(state(0), false).expect("first server");
        let second = EmbeddedServer::start(state(first.addr().port()), false).expect("second server");
        assert!(!first.used_fallback());
        assert!(second.used_fallback());
        assert_ne!(first.addr(), second.addr());
        assert!(second.base_url().starts_with("http://127.0.0.1:"));
    }

    #[test]
    fn address_is_reachable_once_start_returns() {
        let server = EmbeddedServer::start(state(0), false).expect("server");
        std::net::TcpStream::connect(server.addr()).expect("connect to embedded server");
    }

    #[test]
    fn bind_with_fallback_reports_direct_bind() {
        let requested: SocketAddr = "127.0.0.1:0".parse().expect("addr");
        let (listener, used_fallback) = bind_with_fallback(requested).expect("bind");
        assert!(!used_fallback);
        assert_ne!(listener.local_addr().expect("local addr").port(), 0);
    }
}
