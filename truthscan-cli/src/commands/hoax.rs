//! Add-hoax command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::info;
use truthscan_core::{EngineConfig, HoaxMetadata, Verdict};

use crate::utils::{open_index, open_store, paint_verdict, print_json};

/// Known hoax as mirrored into the record store.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KnownHoax<'a> {
    text: &'a str,
    verdict: &'a Verdict,
    source: &'a str,
    category: &'a str,
    /// Position of the entry in the similarity index
    index_position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    hoax_id: Option<String>,
}

/// Execute the add-hoax command.
pub fn execute(
    config: &EngineConfig,
    text: &str,
    verdict: Verdict,
    source: String,
    category: String,
    json: bool,
) -> Result<()> {
    let mut index = open_index(config)?;
    let metadata = HoaxMetadata::new(verdict, source, category);
    let position = index
        .insert(text, metadata.clone())
        .context("Failed to add statement to the index")?;
    index.persist().context("Failed to write hoax index")?;

    let mut hoax = KnownHoax {
        text,
        verdict: &metadata.verdict,
        source: &metadata.source,
        category: &metadata.category,
        index_position: position,
        hoax_id: None,
    };
    let id = open_store(config).add_known_hoax(&hoax)?;
    hoax.hoax_id = Some(id);
    info!(position, total = index.len(), "Added known hoax");

    if json {
        return print_json(&hoax);
    }

    println!(
        "{} {} {}",
        "Added".green().bold(),
        paint_verdict(&metadata.verdict.to_string()),
        text
    );
    println!("   {} {}", "Index entries:".dimmed(), index.len());
    if let Some(id) = &hoax.hoax_id {
        println!("   {} {}", "Record:".dimmed(), id);
    }
    Ok(())
}
