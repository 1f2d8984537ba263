use std::time::Duration;

use pocket_pick::contexts::SweepReport;

use super::Config;

pub fn print_sweep_summary(report: &SweepReport, elapsed: Duration, config: &Config) {
    println!("\n{}", "=".repeat(60));
    println!("Summary:");
    println!("  Checked:   {}", report.total_processed());
    println!("  Skipped:   {}", report.skipped);
    println!("  Dead:      {}", report.dead.len());
    if config.dry_run {
        println!("  Deleted:   0 (dry run)");
    } else {
        println!("  Deleted:   {}", report.deleted());
    }
    if report.cancelled {
        println!("  Cancelled: yes, partial results");
    }
    if config.verbose {
        for (worker, processed) in report.processed_per_worker.iter().enumerate() {
            println!("  Worker {}:  {}", worker, processed);
        }
    }
    println!("  Duration:  {:.2}s", elapsed.as_secs_f64());
    println!("{}", "=".repeat(60));
}
