use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dompatch::cli::app::run().await
}
