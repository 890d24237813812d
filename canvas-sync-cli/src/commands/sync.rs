use anyhow::{Context, Result};
use canvas_sync_caldav::CalDavTodoStore;
use canvas_sync_core::Reconciler;
use canvas_sync_core::config::Settings;
use canvas_sync_lms::CanvasClient;
use chrono::Utc;
use owo_colors::OwoColorize;

use crate::render::Render;

pub async fn run(settings: &Settings) -> Result<()> {
    let canvas = CanvasClient::new(&settings.canvas)?;
    canvas
        .user()
        .await
        .with_context(|| format!("Failed to connect to Canvas at {}", settings.canvas.url))?;

    let store = CalDavTodoStore::new(&settings.caldav)?;

    let report = Reconciler::new(&canvas, &store, &settings.sync)
        .run(Utc::now())
        .await?;

    if settings.sync.dry_run {
        println!("{}", "Dry run, nothing was written".dimmed());
    }
    println!("{}", report.render());

    Ok(())
}
