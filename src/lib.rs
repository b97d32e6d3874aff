//! JROT - JSON-RPC Over TCP
//!
//! This is the main convenience crate that re-exports all JROT sub-crates.
//! Use this crate if you want a single dependency that provides both client
//! and server functionality.
//!
//! # Architecture
//!
//! JROT is organized into modular crates:
//!
//! - **jrot-core**: the JSON document model with its hand-written parser and
//!   printer, plus the wire-level error types
//! - **jrot-server**: newline-delimited JSON-RPC server over raw TCP
//! - **jrot-client**: TCP JSON-RPC client built on the same framing
//!
//! # Quick Start - Server
//!
//! ```rust,no_run
//! use jrot::Server;
//! use jrot::server::from_fn;
//! use jrot::core::Value;
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
//!
//! # Quick Start - Client
//!
//! ```rust,no_run
//! use jrot::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1:1234").await?;
//!
//!     let reply = client.call("sayHello", None).await?;
//!     println!("{}", reply);
//!
//!     Ok(())
//! }
//! ```

// Re-export all public APIs from sub-crates
// This allows users to access everything through the `jrot::` prefix
pub use jrot_client as client;
pub use jrot_core as core;
pub use jrot_server as server;

// Convenience re-exports of the most commonly used types
pub use jrot_client::Client;
pub use jrot_core::{Error, ErrorData, Result, Value};
pub use jrot_server::Server;
