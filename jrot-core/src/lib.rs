//! Core document model and codec for jrot
//!
//! This crate holds everything the jrot server and client share:
//!
//! - [`value`]: the JSON document model ([`Value`], [`Member`])
//! - [`parser`]: the hand-written recursive-descent parser, including the
//!   streaming variant that reports where a document ends
//! - [`printer`]: pretty and compact rendering back to text
//! - [`error`]: the library error enum and the wire-format error object
//!
//! There is deliberately no third-party JSON machinery here: the document
//! model, parser, and printer are the product, and every byte that crosses
//! a jrot connection goes through them.

pub mod error;
pub mod parser;
pub mod printer;
pub mod value;

pub use error::{Error, ErrorData, Result};
pub use parser::{parse, parse_buffer, parse_stream, ParseError};
pub use printer::{print, print_compact};
pub use value::{Member, Value};
