//! Validate command - check a forwarder configuration before applying it.
//!
//! Exit codes: 0 valid, 1 errors, 2 valid with warnings.

use std::path::Path;

use wslports_core::{ConfigStore, ForwarderConfig};

const EXIT_OK: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_WARNINGS: i32 = 2;

pub async fn run(file: &Path) -> i32 {
    println!("WSL2 Port Forwarder - Configuration Validation");
    println!("=============================================");
    println!("Config file: {}\n", file.display());

    let config = match ConfigStore::with_path(file).load().await {
        Ok(config) => config,
        Err(e) => {
            println!("❌ {}", e);
            return finish(EXIT_ERROR);
        }
    };

    if let Err(e) = config.validate() {
        println!("❌ {}", e);
        return finish(EXIT_ERROR);
    }

    println!("✅ Configuration syntax and structure: Valid");
    println!("✅ Check interval: {} seconds", config.check_interval_seconds);
    println!("✅ Configured instances: {}\n", config.instances.len());

    finish(report_shared_ports(&config))
}

/// Print external ports listed by several instances and return the exit code.
fn report_shared_ports(config: &ForwarderConfig) -> i32 {
    let shared = config.shared_external_ports();
    if shared.is_empty() {
        println!("✅ No external port conflicts detected");
        return EXIT_OK;
    }

    println!("⚠️  Potential external port conflicts (if instances run simultaneously):");
    for entry in &shared {
        println!("  Port {}: {}", entry.port, entry.instances.join(", "));
        println!(
            "    → First instance ({}) will win, others ignored at runtime",
            entry.instances[0]
        );
    }
    println!("\nℹ️  Note: Port conflicts are allowed if instances don't run simultaneously.");

    EXIT_WARNINGS
}

fn finish(code: i32) -> i32 {
    println!("\n{}", "=".repeat(50));
    match code {
        EXIT_OK => println!("✅ Configuration is valid and ready for use"),
        EXIT_WARNINGS => println!("⚠️  Configuration is valid but has warnings"),
        _ => println!("❌ Configuration has errors that must be fixed"),
    }
    code
}
