use anyhow::Result;
use pgprobe::cli::start;

#[tokio::main]
async fn main() -> Result<()> {
    start::start().await
}
