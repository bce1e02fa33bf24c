//! Scan command - discover services and write the forwarder configuration.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::warn;
use wslports_core::{
    AllocationPlan, ConfigStore, ForwarderConfig, InstanceScanResult, ScanReport, ScanService,
    ScanSummary, Settings, WslEnumerator, WslSocketLister,
};

use super::truncate;

#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Where to write the generated configuration
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Timeout for each wsl invocation, in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Print scan results and the plan as JSON instead of the report
    #[arg(long)]
    json: bool,

    /// Do not write the configuration file
    #[arg(long)]
    dry_run: bool,
}

impl ScanArgs {
    /// Apply command-line overrides on top of the settings file.
    fn apply(&self, settings: &mut Settings) {
        if let Some(output) = &self.output {
            settings.output_file = output.clone();
        }
        if let Some(secs) = self.timeout {
            settings.command_timeout_secs = secs.max(1);
        }
    }
}

/// Machine-readable scan output.
#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a ScanReport,
    plan: &'a AllocationPlan,
    summary: &'a ScanSummary,
    config: &'a ForwarderConfig,
}

pub async fn run(args: ScanArgs) -> Result<()> {
    let mut settings = Settings::load_default().await?;
    args.apply(&mut settings);

    let service = ScanService::new(
        WslEnumerator::new(&settings),
        WslSocketLister::new(&settings),
    );

    // Ctrl-C stops the scan after the instance in progress
    let abort = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&abort);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current instance");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let quiet = args.json;
    if !quiet {
        println!("Scanning all WSL instances for listening services...\n");
    }

    let (instance_ids, enumeration_error) = service.enumerate().await;
    if !quiet {
        if let Some(error) = &enumeration_error {
            println!("{}", error);
        }
        println!(
            "Found {} WSL instances: {}\n",
            instance_ids.len(),
            instance_ids.join(", ")
        );
    }

    let mut report = service
        .scan_all(&instance_ids, &abort, |result| {
            if !quiet {
                print_progress(result);
            }
        })
        .await;
    report.enumeration_error = enumeration_error;

    let plan = report.plan();
    let summary = report.summary();
    let config = ForwarderConfig::from_plan(&plan);

    if !args.dry_run {
        ConfigStore::with_path(&settings.output_file)
            .save(&config)
            .await?;
    }

    if quiet {
        let output = JsonOutput {
            report: &report,
            plan: &plan,
            summary: &summary,
            config: &config,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if report.aborted {
        println!(
            "\nScan interrupted: {} of {} instances scanned",
            report.instances.len(),
            instance_ids.len()
        );
    }

    print_details(&report.instances);
    print_summary(&summary, &config, &settings, args.dry_run);
    print_conflicts(&plan);
    print_service_types(&summary);
    print_next_steps(&settings);

    Ok(())
}

fn print_progress(result: &InstanceScanResult) {
    if result.accessible {
        println!(
            "✓ {}: {} listening ports",
            result.instance_id,
            result.ports.len()
        );
    } else {
        println!(
            "✗ {}: {}",
            result.instance_id,
            result.error_detail.as_deref().unwrap_or("unknown error")
        );
    }
}

fn print_banner(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}

fn print_details(results: &[InstanceScanResult]) {
    print_banner("DETAILED RESULTS");

    for result in results {
        println!("\n{}:", result.instance_id);

        if !result.accessible {
            println!(
                "  ERROR: {}",
                result.error_detail.as_deref().unwrap_or("unknown error")
            );
            continue;
        }

        if result.ports.is_empty() {
            println!("  No external listening ports found");
            continue;
        }

        for port in result.ports_by_number() {
            let process = port.process.as_deref().map(|p| truncate(p, 20));
            println!(
                "  Port {:>5}: {:<12} ({}){}",
                port.port,
                port.service_label,
                port.bound_address,
                process.map(|p| format!(" [{}]", p)).unwrap_or_default()
            );
        }
    }
}

fn print_summary(summary: &ScanSummary, config: &ForwarderConfig, settings: &Settings, dry_run: bool) {
    print_banner("SUMMARY");
    println!("Total accessible instances: {}", summary.accessible_instances);
    println!("Total instances in config: {}", config.instances.len());
    println!("Total port mappings: {}", config.port_count());
    if dry_run {
        println!("Configuration not written (dry run)");
    } else {
        println!("Configuration saved to: {}", settings.output_file.display());
    }
}

fn print_conflicts(plan: &AllocationPlan) {
    if plan.conflicts.is_empty() {
        return;
    }

    println!(
        "\nPORT CONFLICTS ({} external ports affected):",
        plan.conflicts.len()
    );
    for conflict in &plan.conflicts {
        println!("  External port {}:", conflict.external_port);
        for claimant in &conflict.claimants {
            println!(
                "    - {} (internal {}, {})",
                claimant.instance_id, claimant.internal_port, claimant.service_label
            );
        }
    }
    println!("\nNote: First instance in config file will win conflicts at runtime");
}

fn print_service_types(summary: &ScanSummary) {
    println!("\nSERVICE TYPES FOUND:");
    for (label, count) in &summary.service_counts {
        println!("  {:<15}: {:>2} ports", label, count);
    }
}

fn print_next_steps(settings: &Settings) {
    let file = settings.output_file.display();
    println!("\nNext steps:");
    println!("1. Review {}", file);
    println!("2. Test with: ./wsl2-port-forwarder.exe --validate {}", file);
    println!("   (or without the forwarder: wslports validate {})", file);
    println!("3. Apply with: ./wsl2-port-forwarder.exe {}", file);
}
