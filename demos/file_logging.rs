//! File logging example
//!
//! Demonstrates fan-out to stdout and a batched file stream, with a custom
//! level and JSON output.
//!
//! Run with: cargo run --example file_logging

use bitmask_logger::prelude::*;

fn main() -> Result<()> {
    println!("=== Bitmask Logger - File Logging Example ===\n");

    let registry = Registry::shared();
    let mut logger = Logger::builder("service")
        .registry(std::sync::Arc::clone(&registry))
        .custom_level("audit")
        .build()?;

    let audit = logger.mask(["audit"]);

    // Everything to stdout, errors and audit records to a file in batches of 4
    logger.bind_stream("stdout", BindOptions::new())?;
    logger.bind_stream(
        "application.log",
        BindOptions::new().levels(audit | Level::Error).interval(4),
    )?;

    println!("1. Logging to stdout and file:");
    logger.log("info", "Application started", LogContext::new())?;
    logger.log("audit", "User {user} granted role {role}", context!("user" => "bob", "role" => "admin"))?;
    logger.log("error", "Failed to load optional plugin {name}", context!("name" => "metrics"))?;

    println!("\n2. Performing some operations:");
    for i in 1..=5 {
        logger.log("info", "Processing item {i}/5", context!("i" => i))?;
        if i == 3 {
            logger.log("audit", "Item {i} approved", context!("i" => i))?;
        }
    }

    // The last partial batch reaches the file on close
    logger.close()?;

    println!("\n3. JSON records:");
    let mut json = Logger::builder("service-json")
        .output_format(OutputFormat::Json)
        .timestamp_format(TimestampFormat::Iso8601)
        .build()?;
    json.bind_stream("stdout", BindOptions::new())?;
    json.log("warning", "Slow query", context!("table" => "orders", "ms" => 812))?;
    json.close()?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'application.log' for the audit and error records");

    Ok(())
}
