#![allow(clippy::expect_used, clippy::doc_markdown)]
//! Example: submit one message read from stdin.
//!
//! ## Running
//!
//! ```bash
//! echo -e "Subject: hello\r\n\r\nHi there\r\n" | \
//!     SMTPC_OPTIONS='{"use_ssl": 1, "timeout": 30}' \
//!     cargo run --package smtpc-curl --example send_mail -- \
//!     smtp://localhost:2525 me@example.com you@example.com
//! ```
//!
//! `SMTPC_OPTIONS` takes the same keys as `smtpc::RequestOptions`.

use std::io::{self, Read};
use std::sync::Arc;

use smtpc::{Client, RequestOptions};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smtpc=debug,smtpc_curl=debug,send_mail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let url = args.next().expect("usage: send_mail URL FROM RCPT...");
    let from = args.next().expect("usage: send_mail URL FROM RCPT...");
    let recipients: Vec<String> = args.collect();

    let options: RequestOptions = match std::env::var("SMTPC_OPTIONS") {
        Ok(json) => serde_json::from_str(&json)?,
        Err(_) => RequestOptions::default(),
    };

    let mut body = Vec::new();
    io::stdin().read_to_end(&mut body)?;

    let curl = smtpc_curl::init()?;
    info!(version = %curl.version(), origin = %curl.origin(), "using libcurl");
    let client = Client::new(Arc::new(curl));

    let response = client
        .request(&url, &from, recipients, Some(body.as_slice()), &options)
        .await?;
    println!("{} {}", response.status, response.reason);
    println!("{}", serde_json::to_string(&client.stat())?);
    Ok(())
}
