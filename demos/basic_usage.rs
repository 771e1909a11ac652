//! Basic logger usage example
//!
//! Demonstrates level masks, context interpolation and processors with a
//! stdout stream.
//!
//! Run with: cargo run --example basic_usage

use bitmask_logger::prelude::*;
use bitmask_logger::{info, warning};

fn main() -> Result<()> {
    println!("=== Bitmask Logger - Basic Usage Example ===\n");

    let registry = Registry::shared();
    let mut logger = Logger::new("app", &registry)?;
    logger.bind_stream("stdout", BindOptions::new())?;

    println!("1. Logging at every standard level:");
    for level in Level::ALL {
        logger.log(level, "This is a {level} message", context!("level" => level.as_str()))?;
    }

    println!("\n2. Disabling debug and info:");
    logger.disable(Level::Debug | Level::Info)?;
    info!(logger, "Info message (hidden)")?;
    warning!(logger, "Warning message (visible)")?;
    logger.enable(Level::Debug | Level::Info)?;

    println!("\n3. Context interpolation:");
    logger.log(
        "notice",
        "User {user} logged in from {ip}",
        context!("user" => "alice", "ip" => "10.0.0.7"),
    )?;
    logger.log("notice", "Unknown keys stay as {placeholder}", LogContext::new())?;

    println!("\n4. Processors:");
    logger.add_tag("demo")?;
    logger.add_pid()?;
    logger.add_memory_usage(Some("MB"), false)?;
    info!(logger, "[{tag}] pid={pid} memory={memory_usage}")?;

    println!("\n5. A warning-only binding next to the stdout stream:");
    logger.bind_memory(BindOptions::new().levels(Level::Warning))?;
    warning!(logger, "Disk {disk} at {usage}%", "disk" => "/var", "usage" => 91)?;
    info!(logger, "Not captured")?;

    let captured = logger.close()?;
    println!("   captured {} record(s): {:?}", captured.len(), captured);

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
