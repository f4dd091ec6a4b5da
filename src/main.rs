use std::sync::Arc;

use anyhow::{bail, Context};
use nail_designer::{
    models::{BaseColor, ColorConfiguration, Length, Shape, Style},
    AttributeSelection, Config, Gateway, GenerationOutcome, Generator, StaticTokenProvider,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "usage: nail_designer <length> <shape> <style> <color-configuration> [base-color]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let selection = selection_from_args(std::env::args().skip(1).collect())?;
    let config = Config::from_env()?;
    tracing::info!(api = %config.api_base, models = config.models.len(), "Starting generation");

    let gateway = Arc::new(Gateway::new(&config, Arc::new(StaticTokenProvider::from_env())));
    let generator = Generator::new(gateway, &config);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    match generator.generate(&selection, &cancel).await? {
        GenerationOutcome::Images(images) => {
            println!("{}", serde_json::to_string_pretty(&images)?);
        }
        GenerationOutcome::RateLimited { message, images, .. } => {
            eprintln!("{message}");
            println!("{}", serde_json::to_string_pretty(&images)?);
        }
    }
    Ok(())
}

fn selection_from_args(args: Vec<String>) -> anyhow::Result<AttributeSelection> {
    if !(4..=5).contains(&args.len()) {
        bail!(USAGE);
    }
    let mut selection = AttributeSelection::new();
    selection.select_length(args[0].parse::<Length>()?);
    selection.select_shape(args[1].parse::<Shape>()?);
    selection.select_style(args[2].parse::<Style>()?);
    selection.select_color(args[3].parse::<ColorConfiguration>()?);
    if let Some(raw) = args.get(4) {
        selection.set_base_color(Some(raw.parse::<BaseColor>().context("base color")?));
    }
    if !selection.is_complete() {
        bail!("a base color is required with the Select color configuration\n{USAGE}");
    }
    Ok(selection)
}
