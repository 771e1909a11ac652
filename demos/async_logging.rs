//! Async logging example
//!
//! Demonstrates detached writes, explicit commit and close on an async
//! file stream.
//!
//! Run with: cargo run --example async_logging --features async-appenders

use bitmask_logger::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Bitmask Logger - Async Logging Example ===\n");

    let mut logger = AsyncLogger::standalone("async-app");
    logger
        .bind_stream("stdout", BindOptions::new().levels(Level::Warning | Level::Error))
        .await?;
    logger
        .bind_stream("async_test.log", BindOptions::new().interval(25))
        .await?;

    println!("1. Detached logging:");
    for i in 0..100 {
        let level = if i % 20 == 0 { "warning" } else { "info" };
        logger
            .log_detached(level, "Message #{n}", context!("n" => i))
            .await?;
    }
    println!("   {} write(s) outstanding", logger.pending());

    println!("\n2. Commit:");
    logger.commit().await?;
    println!("   {} write(s) outstanding after commit", logger.pending());

    println!("\n3. Awaited logging:");
    logger
        .log("error", "Request {id} failed", context!("id" => "r-17"))
        .await?;

    logger.close().await?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'async_test.log' for file output");

    Ok(())
}
