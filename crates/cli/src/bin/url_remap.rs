use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    remap_cli::main_entry().await
}
