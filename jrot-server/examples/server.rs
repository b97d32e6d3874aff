//! Demo server mirroring the classic greeting service: `sayHello`,
//! `multiply`, and an `exit` method that stops the server remotely.
//!
//! Run with `cargo run --example server`, then use the client example from
//! `jrot-client` (or `nc 127.0.0.1 1234` and type a request by hand).

use jrot_core::Value;
use jrot_server::{from_fn, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let server = Server::builder()
        .bind_str("127.0.0.1:1234")?
        .procedure("sayHello", from_fn(|_ctx, _params, _id| async {
            Some(Value::from("Hello!"))
        }))
        .procedure("multiply", from_fn(|ctx, params, _id| async move {
            let factors = params.as_ref().map(|p| (p.get(0), p.get(1)));
            match factors {
                Some((Some(a), Some(b))) => match (a.as_f64(), b.as_f64()) {
                    (Some(a), Some(b)) => Some(Value::from(a * b)),
                    _ => {
                        ctx.set_error(-32602, "factors must be numbers");
                        None
                    }
                },
                _ => {
                    ctx.set_error(-32602, "expected params [a, b]");
                    None
                }
            }
        }))
        .build()
        .await?;

    let handle = server.handle();
    server.register("exit", from_fn(move |_ctx, _params, _id| {
        let handle = handle.clone();
        async move {
            handle.stop();
            Some(Value::from("Bye!"))
        }
    }));

    server.run().await?;
    Ok(())
}
