//! Per-connection framing and read loop
//!
//! Each accepted socket gets one task running [`serve`]. The task owns a
//! growable byte buffer that accumulates whatever the peer sends; after
//! every read it repeatedly tries to carve one complete JSON document off
//! the front of the buffer:
//!
//! - **complete document** - dispatch it, write the response, shift the
//!   unconsumed tail to the buffer front, and try again immediately. Several
//!   requests arriving in one read are all answered before the next read
//!   (pipelining), with responses in receipt order.
//! - **incomplete** - the buffer ends mid-document; keep it and wait for
//!   more bytes. No reply, no timeout.
//! - **malformed** - the buffer is broken before its end; reply with a
//!   `-32700` error and close the connection. No resynchronization is
//!   attempted.
//!
//! The buffer starts at 1500 bytes and doubles whenever it fills. A read
//! returning zero bytes is an orderly shutdown by the peer; read and write
//! errors close the connection without touching any other connection.

use crate::dispatch;
use crate::registry::ProcedureTable;
use jrot_core::{parse_buffer, print, print_compact, Error, ErrorData, Result};
use std::sync::{Arc, RwLock};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;

/// Initial capacity of a connection's receive buffer.
const INITIAL_BUFFER_SIZE: usize = 1500;

/// Outcome of one framing attempt against the buffered bytes.
enum Framed {
    Complete(jrot_core::Value, usize),
    Incomplete,
    Malformed,
}

/// Run one connection to completion.
///
/// Returns `Ok(())` on orderly shutdown (peer EOF, malformed-input close, or
/// server stop) and `Err` on socket failures.
pub(crate) async fn serve(
    mut stream: TcpStream,
    conn_id: u64,
    table: Arc<RwLock<ProcedureTable>>,
    verbosity: u8,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut buf: Vec<u8> = Vec::with_capacity(INITIAL_BUFFER_SIZE);

    loop {
        // Double the buffer whenever the last read filled it.
        if buf.len() == buf.capacity() {
            buf.reserve(buf.capacity().max(INITIAL_BUFFER_SIZE));
        }

        let read = tokio::select! {
            read = stream.read_buf(&mut buf) => read,
            _ = shutdown.changed() => return Ok(()),
        };
        let bytes_read = match read {
            Ok(n) => n,
            Err(e) => return Err(Error::Io(e.to_string())),
        };
        if bytes_read == 0 {
            if verbosity >= 1 {
                tracing::info!(conn_id, "client closed connection");
            }
            return Ok(());
        }

        // Serve every complete document already buffered before reading again.
        loop {
            match frame(&buf) {
                Framed::Complete(request, consumed) => {
                    if verbosity >= 2 {
                        tracing::debug!(conn_id, body = %print_compact(&request), "request received");
                    }
                    let response =
                        dispatch::process_request(&table, conn_id, verbosity, request).await;
                    write_document(&mut stream, conn_id, verbosity, &response).await?;
                    buf.drain(..consumed);
                }
                Framed::Incomplete => break,
                Framed::Malformed => {
                    if verbosity >= 1 {
                        tracing::warn!(conn_id, "malformed input, closing connection");
                    }
                    let response =
                        dispatch::error_response(ErrorData::parse_error(), None);
                    write_document(&mut stream, conn_id, verbosity, &response).await?;
                    return Ok(());
                }
            }
        }
    }
}

fn frame(buf: &[u8]) -> Framed {
    match parse_buffer(buf) {
        Ok(Some((value, consumed))) => Framed::Complete(value, consumed),
        Ok(None) => Framed::Incomplete,
        Err(_) => Framed::Malformed,
    }
}

/// Pretty-print a response document and write it newline-terminated.
async fn write_document(
    stream: &mut TcpStream,
    conn_id: u64,
    verbosity: u8,
    document: &jrot_core::Value,
) -> Result<()> {
    if verbosity >= 2 {
        tracing::debug!(conn_id, body = %print_compact(document), "response sent");
    }
    let mut text = print(document);
    text.push('\n');
    stream
        .write_all(text.as_bytes())
        .await
        .map_err(|e| Error::Io(e.to_string()))
}
