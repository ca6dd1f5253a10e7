mod analysis;
mod app;
mod audio;
mod commands;
mod config;
mod engine;
mod error;
mod logging;
mod setup;
mod ui;
mod visual;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        tracing::error!("Fatal: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
