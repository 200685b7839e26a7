use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    wikipath_cli::main_entry().await
}
