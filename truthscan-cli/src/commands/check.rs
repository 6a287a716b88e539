//! Check command implementation.

use anyhow::{bail, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::info;
use truthscan_core::{EngineConfig, SearchHit, SearchOutcome, Verdict};

use crate::utils::{open_index, open_store, paint_verdict, print_json, truncate};

/// Text analysis as stored in the history and printed with `--json`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextAnalysis<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    content: &'a str,
    /// Verdict of the best match, `UNVERIFIED` without one
    verdict: Verdict,
    /// Similarity of the best match
    confidence: f32,
    matches: &'a [SearchHit],
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis_id: Option<String>,
}

/// Execute the check command.
pub fn execute(
    config: &EngineConfig,
    text: &str,
    k: Option<usize>,
    threshold: Option<f32>,
    save: bool,
    json: bool,
) -> Result<()> {
    let k = k.unwrap_or(config.search_k);
    let threshold = threshold.unwrap_or(config.similarity_threshold);

    let index = open_index(config)?;
    let outcome = index.search(text, k, threshold);
    if let SearchOutcome::Failed(reason) = &outcome {
        bail!("Search failed: {reason}");
    }

    let best = outcome.best();
    let mut analysis = TextAnalysis {
        kind: "text",
        content: text,
        verdict: best.map_or(Verdict::Unverified, |hit| hit.matched_metadata.verdict().clone()),
        confidence: best.map_or(0.0, |hit| hit.similarity),
        matches: outcome.hits(),
        analysis_id: None,
    };
    info!(matches = analysis.matches.len(), verdict = %analysis.verdict, "Checked statement");

    if save {
        let id = open_store(config).save_analysis(&analysis)?;
        analysis.analysis_id = Some(id);
    }

    if json {
        return print_json(&analysis);
    }

    println!();
    match &outcome {
        SearchOutcome::Matches(hits) => {
            println!(
                "   {} {}",
                "Verdict:".dimmed(),
                paint_verdict(&analysis.verdict.to_string())
            );
            println!();
            for hit in hits {
                let record = &hit.matched_metadata;
                println!(
                    "   {}. {} {:.3}  {}",
                    hit.rank,
                    paint_verdict(&record.verdict().to_string()),
                    hit.similarity,
                    truncate(&record.text, 70)
                );
                if !record.category().is_empty() {
                    println!("      {} {}", "category:".dimmed(), record.category());
                }
                if !record.metadata.source.is_empty() {
                    println!("      {} {}", "source:".dimmed(), record.metadata.source);
                }
            }
        }
        _ => {
            println!(
                "   {} (no known hoax with similarity >= {threshold})",
                paint_verdict("UNVERIFIED")
            );
        }
    }

    if let Some(id) = &analysis.analysis_id {
        println!();
        println!("   {} {}", "Saved as:".dimmed(), id);
    }
    Ok(())
}
