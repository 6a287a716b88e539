//! Record store commands: feedback, recent, stats, clear.

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::{json, Value};
use tracing::warn;
use truthscan_core::{EngineConfig, Feedback, Record};

use crate::utils::{open_index, open_store, paint_verdict, print_json, truncate};

/// Record feedback on a saved analysis.
pub fn feedback(
    config: &EngineConfig,
    analysis_id: String,
    is_correct: bool,
    comment: Option<String>,
    json: bool,
) -> Result<()> {
    let store = open_store(config);
    let known = store.analysis_by_id(&analysis_id).is_some();
    if !known {
        warn!(analysis_id = %analysis_id, "Feedback for an analysis that is not in the history");
    }

    let id = store.save_feedback(&Feedback {
        analysis_id: analysis_id.clone(),
        is_correct,
        comment,
    })?;

    if json {
        return print_json(&json!({ "feedbackId": id, "analysisId": analysis_id, "knownAnalysis": known }));
    }

    if !known {
        eprintln!(
            "{}",
            format!("No saved analysis with id {analysis_id}; feedback stored anyway").yellow()
        );
    }
    println!("{} {}", "Feedback saved:".green().bold(), id);
    Ok(())
}

/// Print the most recent analyses.
pub fn recent(config: &EngineConfig, limit: usize, json: bool) -> Result<()> {
    let analyses = open_store(config).recent_analyses(limit);

    if json {
        return print_json(&analyses);
    }

    if analyses.is_empty() {
        println!("No saved analyses");
        return Ok(());
    }

    for record in &analyses {
        println!(
            "{}  {}  {}  {}",
            record.timestamp.dimmed(),
            record.id,
            paint_verdict(&record_verdict(record)),
            truncate(&record_subject(record), 60)
        );
    }
    Ok(())
}

/// Print index and record store statistics.
pub fn stats(config: &EngineConfig, json: bool) -> Result<()> {
    let index = open_index(config)?.stats();
    let store = open_store(config).stats();

    if json {
        return print_json(&json!({ "index": index, "store": store }));
    }

    println!("{}", "Index".bold());
    println!("   {} {}", "Entries:".dimmed(), index.total_entries);
    println!("   {} {}", "Vectors:".dimmed(), index.index_size);
    println!("   {} {}", "Dimension:".dimmed(), index.embedding_dimension);
    println!();
    println!("{}", "Records".bold());
    println!("   {} {}", "Analyses:".dimmed(), store.total_analyses);
    println!("   {} {}", "Feedback:".dimmed(), store.total_feedback);
    println!("   {} {}", "Known hoaxes:".dimmed(), store.total_known_hoaxes);
    println!("   {} {}", "Users:".dimmed(), store.total_users);
    println!(
        "   {} {}",
        "Last updated:".dimmed(),
        store.last_updated.as_deref().unwrap_or("never")
    );
    println!("   {} {}", "File:".dimmed(), store.storage_file);
    Ok(())
}

/// Wipe the record store. Requires `--yes`.
pub fn clear(config: &EngineConfig, confirm: bool, json: bool) -> Result<()> {
    let store = open_store(config);
    store
        .clear_all(confirm)
        .context("Records were not cleared (pass --yes to confirm)")?;

    if json {
        return print_json(&json!({ "cleared": true, "storageFile": store.path() }));
    }
    println!("{} {}", "Cleared".red().bold(), store.path().display());
    Ok(())
}

fn record_verdict(record: &Record) -> String {
    let verdict = record
        .get("verdict")
        .or_else(|| record.get("result").and_then(|result| result.get("verdict")));
    match verdict {
        Some(Value::String(v)) => v.clone(),
        _ => "-".to_string(),
    }
}

fn record_subject(record: &Record) -> String {
    ["content", "fileName"]
        .iter()
        .find_map(|key| record.get(key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}
