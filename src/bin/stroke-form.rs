use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::info;
use tokio::net::TcpListener;

use stroke_risk::config::{init_logging, DEFAULT_MODEL_PATH};
use stroke_risk::inference::InferenceContext;
use stroke_risk::web;
use stroke_risk::StrokeError;

#[derive(Parser, Debug)]
#[command(name = "stroke-form", version, about = "Serve the stroke prediction form")]
struct Cli {
    /// Model artifact written by stroke-train
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Bind address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Bind port
    #[arg(short, long, default_value = "8501")]
    port: u16,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), StrokeError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = Arc::new(InferenceContext::load(&cli.model)?);
    info!("feature schema: {:?}", ctx.schema().names());

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("stroke form listening on http://{addr}");
    axum::serve(listener, web::router(ctx)).await?;
    Ok(())
}
