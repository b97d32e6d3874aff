//! JSON-RPC server over raw TCP
//!
//! This crate serves newline-delimited JSON-RPC over plain TCP streams.
//! Incoming bytes are framed into complete JSON documents by the
//! hand-written streaming parser from `jrot-core`, validated as requests,
//! dispatched to registered procedures, and answered with pretty-printed,
//! newline-terminated response documents.
//!
//! # Core behavior
//!
//! - **Framing**: partial requests sit in a per-connection buffer until the
//!   rest arrives; multiple requests sent back-to-back are all answered, in
//!   order, without waiting for each response (pipelining).
//! - **Dispatch**: method names map to [`Procedure`]s through an ordered
//!   registration table; procedures can return a result or signal an error
//!   code through their [`CallContext`].
//! - **Error discipline**: every per-request failure becomes a wire error
//!   response. Only malformed JSON (and I/O failure) closes a connection,
//!   and never any other connection.
//!
//! # Concurrency
//!
//! Each connection runs in its own Tokio task; requests on one connection
//! are processed strictly in arrival order, so per-connection
//! request/response ordering always holds. A slow procedure stalls only its
//! own connection.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use jrot_server::{from_fn, Server};
//! use jrot_core::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .bind_str("127.0.0.1:1234")?
//!         .procedure("sayHello", from_fn(|_ctx, _params, _id| async {
//!             Some(Value::from("Hello!"))
//!         }))
//!         .build()
//!         .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

mod builder;
mod connection;
mod dispatch;
mod procedure;
mod registry;

pub use builder::{ServerBuilder, DEBUG_ENV_VAR};
pub use procedure::{from_fn, CallContext, Procedure, ProcedureFuture};
pub use registry::ProcedureTable;

use jrot_core::{Error, Result};
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::net::TcpListener;
use tokio::sync::watch;

/// JSON-RPC server over TCP.
///
/// Construct with [`Server::builder`], then call [`Server::run`] to accept
/// connections. The procedure table can be changed while the server runs,
/// from the server itself or from a cloneable [`ServerHandle`] - including
/// from inside a procedure (which is how an `exit`-style method stops the
/// server it runs on).
pub struct Server {
    pub(crate) listener: TcpListener,
    pub(crate) procedures: Arc<RwLock<ProcedureTable>>,
    pub(crate) verbosity: u8,
    pub(crate) shutdown: watch::Sender<bool>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.listener.local_addr().ok())
            .field("verbosity", &self.verbosity)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Create a new server builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Accept connections until [`Server::stop`] is called.
    ///
    /// Each accepted socket is served in its own task. Stopping breaks the
    /// accept loop after the in-flight callback; it does not abort requests
    /// already being processed.
    pub async fn run(&self) -> Result<()> {
        if self.verbosity >= 1 {
            tracing::info!(addr = ?self.listener.local_addr().ok(), "server waiting for connections");
        }
        let conn_counter = AtomicU64::new(0);
        let mut shutdown = self.shutdown.subscribe();

        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                _ = shutdown.changed() => {
                    if self.verbosity >= 1 {
                        tracing::info!("server stopped");
                    }
                    return Ok(());
                }
            };
            let (stream, addr) = accepted.map_err(|e| Error::Io(e.to_string()))?;
            let conn_id = conn_counter.fetch_add(1, Ordering::SeqCst);
            if self.verbosity >= 1 {
                tracing::info!(conn_id, addr = %addr, "connection accepted");
            }

            let table = Arc::clone(&self.procedures);
            let verbosity = self.verbosity;
            let shutdown_rx = self.shutdown.subscribe();
            tokio::spawn(async move {
                if let Err(e) = connection::serve(stream, conn_id, table, verbosity, shutdown_rx).await
                {
                    tracing::error!(conn_id, error = %e, "connection error");
                }
            });
        }
    }

    /// Stop the accept loop and close idle connections.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// A cloneable handle for registration and shutdown from elsewhere -
    /// other tasks, or procedures running on this server.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            procedures: Arc::clone(&self.procedures),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Register a procedure under `name`.
    pub fn register(&self, name: impl Into<String>, procedure: Box<dyn Procedure>) {
        self.procedures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(name, procedure);
    }

    /// Register a procedure with opaque per-registration data.
    pub fn register_with_data(
        &self,
        name: impl Into<String>,
        procedure: Box<dyn Procedure>,
        data: Arc<dyn Any + Send + Sync>,
    ) {
        self.procedures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_with_data(name, procedure, data);
    }

    /// Remove the oldest registration for `name`. Returns whether an entry
    /// was removed; subsequent calls to an unregistered method get
    /// `-32601`.
    pub fn deregister(&self, name: &str) -> bool {
        self.procedures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .deregister(name)
    }

    /// The address the server is listening on; useful with a `0` bind port.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// The effective verbosity level.
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }
}

/// Cloneable handle to a running server's procedure table and shutdown
/// signal.
#[derive(Clone)]
pub struct ServerHandle {
    procedures: Arc<RwLock<ProcedureTable>>,
    shutdown: watch::Sender<bool>,
}

impl ServerHandle {
    /// Stop the server this handle belongs to.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Register a procedure under `name`.
    pub fn register(&self, name: impl Into<String>, procedure: Box<dyn Procedure>) {
        self.procedures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(name, procedure);
    }

    /// Remove the oldest registration for `name`.
    pub fn deregister(&self, name: &str) -> bool {
        self.procedures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .deregister(name)
    }
}
