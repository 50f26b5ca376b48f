//! postbox server binary.
//!
//! Run with:
//!   RUST_LOG=info postbox --database posts.db
//!
//! Try:
//!   curl -H 'accept: application/json' http://localhost:8080/api/posts
//!   curl -X POST http://localhost:8080/api/posts \
//!        -H 'content-type: application/json' \
//!        -d '{"title":"Hello","body":"World"}'
//!   curl 'http://localhost:8080/api/posts?title_like=Hel'
//!   curl -X DELETE http://localhost:8080/api/posts/1

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use postbox::config::Config;
use postbox::{Server, api};

#[tokio::main]
async fn main() -> Result<(), postbox::Error> {
    init_tracing();

    let config = Config::parse();
    let store = config.open_store()?;
    info!(store = ?config.store, negotiation = ?config.negotiation, "store opened");

    let app = api::router(store, config.negotiation);
    Server::bind(config.bind).serve(app).await
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
