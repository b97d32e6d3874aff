//! Demo client for the `server` example: greets, multiplies, then prints
//! whatever comes back.

use jrot_client::Client;
use jrot_core::Value;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut client = Client::connect("127.0.0.1:1234").await?;

    let greeting = client.call("sayHello", None).await?;
    println!("{}", greeting);

    let params = Value::from_iter([Value::from(6), Value::from(7)]);
    let product = client.call("multiply", Some(params)).await?;
    println!("6 * 7 = {}", product);

    Ok(())
}
