#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::Path;
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Create a configured `llmsmap` command suitable for integration tests.
///
/// Runs inside `dir` with config-related environment cleared so a developer's
/// shell settings cannot leak into assertions.
#[allow(dead_code)]
pub fn llmsmap_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("llmsmap"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.current_dir(dir);
    for var in [
        "LLMSMAP_URL",
        "LLMSMAP_OUTPUT_DIR",
        "LLMSMAP_CONFIG",
        "FIRECRAWL_API_KEY",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Write a small scraped-pages fixture and return its path.
#[allow(dead_code)]
pub fn write_pages(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("pages.json");
    let pages = serde_json::json!([
        {
            "url": "https://example.com/",
            "markdown": "# Example Docs\n\nEverything about the example product lives here."
        },
        {
            "url": "https://example.com/docs/auth",
            "markdown": "# Authentication\n\nHow API tokens and sessions are issued."
        },
        {
            "url": "https://example.com/docs/billing",
            "markdown": "# Billing\n\nInvoices, plans and payment methods explained."
        },
        {
            "url": "https://example.com/admin/secret",
            "markdown": "# Secret\n\nShould be excluded by default."
        }
    ]);
    std::fs::write(&path, serde_json::to_string_pretty(&pages).unwrap()).unwrap();
    path
}
