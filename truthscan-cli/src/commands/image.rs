//! Image command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::info;
use truthscan_core::{EngineConfig, ImageAnalysis};

use crate::exit_codes::READ_FILE_CONTEXT;
use crate::utils::{open_forensics, open_store, paint_verdict, print_json};

/// Image analysis as stored in the history and printed with `--json`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageReport<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    file_name: String,
    result: &'a ImageAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis_id: Option<String>,
}

/// Execute the image command.
pub fn execute(config: &EngineConfig, file: &Path, save: bool, json: bool) -> Result<()> {
    let content = std::fs::read(file)
        .with_context(|| format!("{READ_FILE_CONTEXT}: {}", file.display()))?;
    info!(path = %file.display(), bytes = content.len(), "Read file");

    let forensics = open_forensics(config)?;
    let analysis = forensics.analyze_bytes(&content);

    let mut report = ImageReport {
        kind: "image",
        file_name: file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        result: &analysis,
        analysis_id: None,
    };

    if save {
        let id = open_store(config).save_analysis(&report)?;
        report.analysis_id = Some(id);
    }

    if json {
        return print_json(&report);
    }

    println!();
    println!(
        "   {} {}",
        "Verdict:".dimmed(),
        paint_verdict(&analysis.verdict().to_string())
    );

    match &analysis {
        ImageAnalysis::Failed(failure) => {
            println!("   {} {}", "Error:".dimmed(), failure.error.red());
        }
        ImageAnalysis::Complete(result) => {
            let meta = &result.metadata;
            println!(
                "   {} {} {}x{} {}",
                "Image:".dimmed(),
                meta.format,
                meta.width,
                meta.height,
                meta.color_mode
            );
            if meta.has_embedded_metadata {
                println!("   {} {}", "Camera:".dimmed(), meta.camera.as_deref().unwrap_or("-"));
                println!("   {} {}", "Software:".dimmed(), meta.software.as_deref().unwrap_or("-"));
                if let Some(taken) = &meta.timestamp {
                    println!("   {} {}", "Taken:".dimmed(), taken);
                }
            } else {
                println!("   {} {}", "EXIF:".dimmed(), "missing".yellow());
            }
            if result.metadata_flags.edited_by_software {
                println!("   {} {}", "Editing:".dimmed(), "edited with image software".yellow());
            }

            println!();
            for (algorithm, hash) in result.hashes.iter() {
                println!("   {:<12} {}", format!("{algorithm}:").dimmed(), hash);
            }

            for hit in &result.matches {
                println!();
                println!(
                    "   {} {} ({}, distance {})",
                    "Known fake:".red().bold(),
                    hit.entry.description,
                    hit.algorithm,
                    hit.distance
                );
                if !hit.entry.source.is_empty() {
                    println!("      {} {}", "source:".dimmed(), hit.entry.source);
                }
            }
        }
    }

    if let Some(id) = &report.analysis_id {
        println!();
        println!("   {} {}", "Saved as:".dimmed(), id);
    }
    Ok(())
}
