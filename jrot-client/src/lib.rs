//! TCP JSON-RPC client
//!
//! A small blocking-style client over an async TCP stream: each
//! [`Client::call`] writes one request document and reads until one
//! complete response document has arrived, using the same
//! accumulate-and-parse framing as the server. Responses are expected in
//! request order on the connection, which is exactly what the server
//! guarantees.
//!
//! Request ids are auto-incremented numbers. An error response surfaces as
//! [`Error::Rpc`] carrying the wire error's code and message; a success
//! response yields its `result` value.
//!
//! # Examples
//!
//! ```rust,no_run
//! use jrot_client::Client;
//! use jrot_core::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1:1234").await?;
//!
//!     let greeting = client.call("sayHello", None).await?;
//!     println!("{}", greeting);
//!
//!     let params = Value::from_iter([Value::from(6), Value::from(7)]);
//!     let product = client.call("multiply", Some(params)).await?;
//!     println!("{}", product);
//!     Ok(())
//! }
//! ```

use jrot_core::{parse_buffer, print_compact, Error, ErrorData, Result, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Initial capacity of the client's receive buffer.
const INITIAL_BUFFER_SIZE: usize = 1500;

/// A connected JSON-RPC client.
pub struct Client {
    stream: TcpStream,
    buf: Vec<u8>,
    next_id: i64,
}

impl Client {
    /// Connect to a jrot server.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Client> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| Error::Io(e.to_string()))?;
        Ok(Client {
            stream,
            buf: Vec::with_capacity(INITIAL_BUFFER_SIZE),
            next_id: 1,
        })
    }

    /// Call a remote method and wait for its response.
    ///
    /// `params`, when given, should be an array or object value - the only
    /// kinds the request shape permits. Returns the response's `result`
    /// value, or [`Error::Rpc`] when the server answered with an error
    /// object.
    pub async fn call(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let mut request = Value::object();
        request.insert("method", method);
        if let Some(params) = params {
            request.insert("params", params);
        }
        request.insert("id", id);

        let mut text = print_compact(&request);
        text.push('\n');
        tracing::debug!(method, id, "sending request");
        self.stream
            .write_all(text.as_bytes())
            .await
            .map_err(|e| Error::Io(e.to_string()))?;

        let mut response = self.read_document().await?;
        if let Some(error) = response.member("error") {
            let data = ErrorData::from_value(error).ok_or_else(|| {
                Error::InvalidRequest("malformed error object in response".to_string())
            })?;
            return Err(Error::Rpc(data));
        }
        Ok(response.detach_member("result").unwrap_or(Value::Null))
    }

    /// Read bytes until the buffer holds one complete document, then take
    /// it off the front. Unconsumed bytes stay buffered for the next call.
    async fn read_document(&mut self) -> Result<Value> {
        loop {
            match parse_buffer(&self.buf) {
                Ok(Some((value, consumed))) => {
                    self.buf.drain(..consumed);
                    return Ok(value);
                }
                Ok(None) => {}
                Err(e) => return Err(Error::Parse(e)),
            }

            if self.buf.len() == self.buf.capacity() {
                self.buf.reserve(self.buf.capacity().max(INITIAL_BUFFER_SIZE));
            }
            let bytes_read = self
                .stream
                .read_buf(&mut self.buf)
                .await
                .map_err(|e| Error::Io(e.to_string()))?;
            if bytes_read == 0 {
                return Err(Error::ConnectionClosed);
            }
        }
    }
}
