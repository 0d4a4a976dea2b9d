//! llmsmap CLI - composable-context site maps for LLM agents
//!
//! All command implementations live in the library crate so integration
//! tests can exercise them.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    llmsmap_cli::run().await
}
