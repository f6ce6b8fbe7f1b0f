/*
 * Responsibility
 * - Start the tokio runtime
 * - Call app::run() (no logic here)
 */
use anyhow::Result;

use user_management_auth::app;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await?;
    Ok(())
}
