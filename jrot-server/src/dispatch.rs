//! Request validation and dispatch
//!
//! Takes one parsed document off a connection, validates its request shape,
//! routes it through the procedure table, and produces the response
//! document the connection writes back. Every outcome - including every
//! validation failure - is a response; only the framing layer ever decides
//! to close a connection.
//!
//! Validation order:
//!
//! 1. the document must be an object with a `method` member of string kind;
//! 2. `params`, if present, must be an array or object;
//! 3. `id`, if present, must be a string or number.
//!
//! A violation yields `-32600` with a null id (a request too malformed to
//! trust its id is not worth echoing one). An unknown method yields
//! `-32601` carrying the id. A procedure-set error code takes precedence
//! over its returned value; otherwise the value (or `null`) becomes the
//! `result`.

use crate::procedure::CallContext;
use crate::registry::ProcedureTable;
use jrot_core::{ErrorData, Value};
use std::sync::{PoisonError, RwLock};

/// Validate and dispatch one request document, returning the response
/// document.
pub(crate) async fn process_request(
    table: &RwLock<ProcedureTable>,
    conn_id: u64,
    verbosity: u8,
    mut root: Value,
) -> Value {
    let method = match root.member("method").map(Value::resolve) {
        Some(Value::String(name)) => name.clone(),
        _ => return error_response(ErrorData::invalid_request(), None),
    };
    let params_valid = match root.member("params").map(Value::resolve) {
        None => true,
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        Some(_) => false,
    };
    let id_valid = match root.member("id").map(Value::resolve) {
        None => true,
        Some(Value::String(_)) | Some(Value::Number(_)) => true,
        Some(_) => false,
    };
    if !params_valid || !id_valid {
        return error_response(ErrorData::invalid_request(), None);
    }

    // The id has to outlive the request document: the response is built
    // after the document is gone, so take ownership now.
    let params = root.detach_member("params");
    let id = root.detach_member("id");
    drop(root);

    let looked_up = table
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .lookup(&method);
    let Some((procedure, data)) = looked_up else {
        return error_response(ErrorData::method_not_found(), id);
    };

    if verbosity >= 1 {
        tracing::info!(conn_id, method = %method, "method invoked");
    }

    let ctx = CallContext::new(conn_id, data);
    let result = procedure.call(ctx.clone(), params, id.clone()).await;

    match ctx.take_error() {
        Some(error) => error_response(error, id),
        None => success_response(result, id),
    }
}

/// Build `{"result": ..., "id": ...}`.
pub(crate) fn success_response(result: Option<Value>, id: Option<Value>) -> Value {
    let mut response = Value::object();
    response.insert("result", result.unwrap_or(Value::Null));
    response.insert("id", id.unwrap_or(Value::Null));
    response
}

/// Build `{"error": {"code": ..., "message": ...}, "id": ...}`.
pub(crate) fn error_response(error: ErrorData, id: Option<Value>) -> Value {
    let mut response = Value::object();
    response.insert("error", error.to_value());
    response.insert("id", id.unwrap_or(Value::Null));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedure::from_fn;
    use jrot_core::parse;

    fn table_with_echo() -> RwLock<ProcedureTable> {
        let mut table = ProcedureTable::new();
        table.register("echo", from_fn(|_ctx, params, _id| async move { params }));
        table.register(
            "fail",
            from_fn(|ctx: CallContext, _params, _id| async move {
                ctx.set_error(-320, "always fails");
                Some(Value::from("discarded"))
            }),
        );
        RwLock::new(table)
    }

    async fn run(table: &RwLock<ProcedureTable>, request: &str) -> Value {
        process_request(table, 0, 0, parse(request).unwrap()).await
    }

    #[tokio::test]
    async fn test_successful_dispatch_echoes_params() {
        let table = table_with_echo();
        let response = run(&table, r#"{"method":"echo","params":[1,2],"id":1}"#).await;
        let result = response.member("result").unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.get(0).and_then(Value::as_i64), Some(1));
        assert_eq!(result.get(1).and_then(Value::as_i64), Some(2));
        assert_eq!(response.member("id").and_then(Value::as_i64), Some(1));
        assert!(response.member("error").is_none());
    }

    #[tokio::test]
    async fn test_missing_params_yields_null_result() {
        let table = table_with_echo();
        let response = run(&table, r#"{"method":"echo","id":"r-1"}"#).await;
        assert!(response.member("result").map(Value::is_null).unwrap_or(false));
        assert_eq!(response.member("id").and_then(Value::as_str), Some("r-1"));
    }

    #[tokio::test]
    async fn test_method_not_found_carries_id() {
        let table = table_with_echo();
        let response = run(&table, r#"{"method":"missing","id":2}"#).await;
        let error = response.member("error").unwrap();
        assert_eq!(error.member("code").and_then(Value::as_i64), Some(-32601));
        assert_eq!(response.member("id").and_then(Value::as_i64), Some(2));
        assert!(response.member("result").is_none());
    }

    #[tokio::test]
    async fn test_invalid_request_shapes() {
        let table = table_with_echo();
        for request in [
            r#"[1, 2]"#,                               // not an object
            r#"{"params": []}"#,                       // no method
            r#"{"method": 5}"#,                        // method not a string
            r#"{"method": "echo", "params": 5}"#,      // params wrong kind
            r#"{"method": "echo", "params": "x"}"#,    // params wrong kind
            r#"{"method": "echo", "id": [1]}"#,        // id wrong kind
            r#"{"method": "echo", "id": true}"#,       // id wrong kind
        ] {
            let response = run(&table, request).await;
            let error = response.member("error").expect(request);
            assert_eq!(
                error.member("code").and_then(Value::as_i64),
                Some(-32600),
                "request: {}",
                request
            );
            // id is never echoed on an invalid request
            assert!(response.member("id").map(Value::is_null).unwrap_or(false));
        }
    }

    #[tokio::test]
    async fn test_method_member_lookup_is_case_insensitive() {
        let table = table_with_echo();
        let response = run(&table, r#"{"Method":"echo","id":3}"#).await;
        assert!(response.member("error").is_none());
        assert_eq!(response.member("id").and_then(Value::as_i64), Some(3));
    }

    #[tokio::test]
    async fn test_procedure_error_takes_precedence_over_result() {
        let table = table_with_echo();
        let response = run(&table, r#"{"method":"fail","id":4}"#).await;
        let error = response.member("error").unwrap();
        assert_eq!(error.member("code").and_then(Value::as_i64), Some(-320));
        assert_eq!(
            error.member("message").and_then(Value::as_str),
            Some("always fails")
        );
        assert!(response.member("result").is_none());
        assert_eq!(response.member("id").and_then(Value::as_i64), Some(4));
    }

    #[tokio::test]
    async fn test_response_has_exactly_one_of_result_or_error() {
        let table = table_with_echo();
        let ok = run(&table, r#"{"method":"echo","id":1}"#).await;
        assert!(ok.member("result").is_some() && ok.member("error").is_none());
        let err = run(&table, r#"{"method":"nope","id":1}"#).await;
        assert!(err.member("error").is_some() && err.member("result").is_none());
    }
}
