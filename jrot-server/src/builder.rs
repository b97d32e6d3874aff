//! Server builder
//!
//! Fluent configuration for a [`Server`]: bind address, initial procedure
//! table, and verbosity. `build()` binds the listener, so a `0` port can be
//! used and the chosen port read back with
//! [`Server::local_addr`](crate::Server::local_addr).
//!
//! # Verbosity
//!
//! When not set explicitly, the level comes from the `JROT_DEBUG`
//! environment variable: `0` (or unset/unparsable) is silent, `1` logs
//! connections and method invocations, `2` and above additionally dumps
//! request and response bodies. The threshold gates the server's `tracing`
//! calls; wire a subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use jrot_server::{from_fn, Server};
//! use jrot_core::Value;
//!
//! # async fn example() -> jrot_core::Result<()> {
//! let server = Server::builder()
//!     .bind_str("127.0.0.1:1234")?
//!     .procedure("ping", from_fn(|_ctx, _params, _id| async {
//!         Some(Value::from("pong"))
//!     }))
//!     .verbosity(1)
//!     .build()
//!     .await?;
//! # let _ = server;
//! # Ok(())
//! # }
//! ```

use crate::procedure::Procedure;
use crate::registry::ProcedureTable;
use crate::Server;
use jrot_core::{Error, Result};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Environment variable consulted for the default verbosity level.
pub const DEBUG_ENV_VAR: &str = "JROT_DEBUG";

/// Builder for constructing a [`Server`].
pub struct ServerBuilder {
    addr: Option<SocketAddr>,
    table: ProcedureTable,
    verbosity: Option<u8>,
}

impl ServerBuilder {
    /// Create a new builder with an empty procedure table.
    pub fn new() -> ServerBuilder {
        ServerBuilder {
            addr: None,
            table: ProcedureTable::new(),
            verbosity: None,
        }
    }

    /// Set the bind address.
    pub fn bind(mut self, addr: impl Into<SocketAddr>) -> ServerBuilder {
        self.addr = Some(addr.into());
        self
    }

    /// Set the bind address from a string such as `"127.0.0.1:1234"`.
    pub fn bind_str(mut self, addr: &str) -> Result<ServerBuilder> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::InvalidRequest(format!("invalid listen address: {}", e)))?;
        self.addr = Some(addr);
        Ok(self)
    }

    /// Register a procedure.
    pub fn procedure(
        mut self,
        name: impl Into<String>,
        procedure: Box<dyn Procedure>,
    ) -> ServerBuilder {
        self.table.register(name, procedure);
        self
    }

    /// Register a procedure along with opaque data handed to every
    /// invocation.
    pub fn procedure_with_data(
        mut self,
        name: impl Into<String>,
        procedure: Box<dyn Procedure>,
        data: Arc<dyn Any + Send + Sync>,
    ) -> ServerBuilder {
        self.table.register_with_data(name, procedure, data);
        self
    }

    /// Set the verbosity level explicitly, overriding `JROT_DEBUG`.
    pub fn verbosity(mut self, level: u8) -> ServerBuilder {
        self.verbosity = Some(level);
        self
    }

    /// Bind the listener and assemble the server.
    pub async fn build(self) -> Result<Server> {
        let addr = self
            .addr
            .ok_or_else(|| Error::InvalidRequest("no listen address configured".to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Io(e.to_string()))?;
        let verbosity = self.verbosity.unwrap_or_else(verbosity_from_env);
        let (shutdown, _) = watch::channel(false);
        Ok(Server {
            listener,
            procedures: Arc::new(RwLock::new(self.table)),
            verbosity,
            shutdown,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn verbosity_from_env() -> u8 {
    std::env::var(DEBUG_ENV_VAR)
        .ok()
        .and_then(|level| level.trim().parse().ok())
        .unwrap_or(0)
}
