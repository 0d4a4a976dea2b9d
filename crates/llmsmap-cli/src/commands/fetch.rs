//! Fetch command implementation

use std::path::Path;

use anyhow::{Result, bail};
use colored::Colorize;
use llmsmap_core::retrieval::parse_markdown_response;
use llmsmap_core::{FetchHandler, FetchRequest, FetchResponse, FsContentStore, ResponseFormat};

use super::OutputSettings;
use crate::utils::formatting::format_count;

/// Run one fetch request against the output directory and print the result.
pub fn execute(
    config_path: Option<&Path>,
    output: Option<&Path>,
    query: &str,
    summary: bool,
) -> Result<()> {
    let settings = OutputSettings::load(config_path, output)?;
    let handler = FetchHandler::new(FsContentStore::new(&settings.output_dir)).with_cors(false);

    let mut request = FetchRequest::from_query(query);
    if summary {
        request.format = ResponseFormat::Markdown;
    }
    let response = handler.handle(&request);
    if !response.is_success() {
        bail!(
            "fetch failed ({}): {}",
            response.status,
            error_message(&response)
        );
    }

    if summary {
        print_summary(&response.body);
    } else {
        print!("{}", response.body);
        if !response.body.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn error_message(response: &FetchResponse) -> String {
    serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(ToString::to_string))
        .unwrap_or_else(|| response.body.clone())
}

fn print_summary(body: &str) {
    let sections = parse_markdown_response(body);
    let total: u64 = sections.iter().map(|s| s.token_count).sum();
    for section in &sections {
        println!(
            "{}  {}  ~{} tokens  {}",
            section.path.cyan(),
            section.title,
            format_count(section.token_count),
            section.last_updated.dimmed()
        );
    }
    println!(
        "{} sections, ~{} tokens",
        sections.len(),
        format_count(total)
    );
}
