use std::path::Path;

use anyhow::{bail, Context, Result};
use odoscan_core::{reconcile as reconcile_trip, AppConfig, TripReconciliation};
use odoscan_journal::{digest, NativeSummarizer, ScriptRelay, Summarizer};
use odoscan_ocr::{ImageInput, OdometerExtractor};
use odoscan_server::AppState;
use serde_json::json;
use tokio::io::AsyncReadExt;
use tracing::warn;

/// Read a text file, or stdin when the path is `-`.
pub async fn read_text(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await.context("reading stdin")?;
        return Ok(text);
    }
    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("reading {}", input.display()))
}

pub async fn extract(input: &Path) -> Result<()> {
    let reading = OdometerExtractor::read(&read_text(input).await?);
    match &reading.matched_value {
        Some(value) => println!("{value}"),
        None => bail!("no odometer value found"),
    }
    Ok(())
}

pub fn reconcile(config: &AppConfig, first: u64, second: u64) -> Result<()> {
    let trip = reconcile_trip(first, second, &config.mileage);
    print_trip(config, &trip);
    Ok(())
}

pub async fn mileage(config: AppConfig, start_image: &Path, end_image: &Path) -> Result<()> {
    let first = ImageInput::read(start_image)
        .await
        .with_context(|| format!("reading {}", start_image.display()))?;
    let second = ImageInput::read(end_image)
        .await
        .with_context(|| format!("reading {}", end_image.display()))?;

    let state = AppState::from_config(config)?;
    let report = state.mileage_pipeline().process_pair(first, second).await;
    println!("{}", serde_json::to_string_pretty(&report.slots)?);

    match &report.reconciliation {
        Some(trip) => print_trip(&state.config, trip),
        None => bail!("trip not reconciled: both photos need a readable odometer value"),
    }
    Ok(())
}

fn print_trip(config: &AppConfig, trip: &TripReconciliation) {
    println!(
        "{}",
        json!({
            "start": trip.start,
            "end": trip.end,
            "distance": trip.distance,
            "cost": trip.cost.to_string(),
            "over_threshold": trip.over_threshold,
        })
    );
    if let Some(advisory) = trip.advisory(&config.mileage, &config.advisory) {
        warn!("{advisory}");
        eprintln!("{advisory}");
    }
}

pub async fn summarize(config: &AppConfig, input: &Path, script: bool, as_json: bool) -> Result<()> {
    let text = read_text(input).await?;

    let summary = if script {
        if config.summarizer.command.is_empty() {
            bail!("--script needs summarizer.command in the config file");
        }
        ScriptRelay::new(&config.summarizer.command)?.summarize(&text).await?
    } else {
        NativeSummarizer.summarize(&text).await?
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", digest(&text));
        println!("{}", summary.render());
    }
    Ok(())
}

pub async fn serve(mut config: AppConfig, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    odoscan_server::serve(config).await
}
