mod analyst;
mod config;
mod critic;
mod error;
mod inference;
mod parse;
mod pipeline;
mod progress;
mod report;
mod researcher;
mod server;
mod synthesizer;

use anyhow::{Context, Result};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::Config::load();

    std::fs::create_dir_all(&config.server.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.server.output_dir.display()
        )
    })?;

    let client = Arc::new(inference::InferenceClient::new(&config)?);
    eprintln!("[Server] Inference model: {}", client.model());

    let pipeline = pipeline::Pipeline::new(client, &config);
    let state = Arc::new(server::AppState { pipeline });
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_addr))?;

    eprintln!(
        "[Server] Research pipeline listening on {}",
        config.server.listen_addr
    );
    progress::log("server started");

    axum::serve(listener, app).await?;
    Ok(())
}
