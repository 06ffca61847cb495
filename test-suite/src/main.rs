//! Runs the JSON scenario cases and prints one line per case:
//! - observe/set_type_mismatch PASS
//! - merge/scenario_a FAIL

use clap::Parser;
use test_suite::{TestRunner, cases_dir};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "test-suite", about = "Vigil scenario runner")]
struct Args {
    /// Enable trace output for debugging
    #[arg(short, long)]
    trace: bool,

    /// Filter cases by name (substring match)
    #[arg(short, long)]
    filter: Option<String>,

    /// Print only the first line of each failure
    #[arg(short, long)]
    short: bool,
}

mod colors {
    pub const GREEN: &str = "\x1b[32m";
    pub const RED: &str = "\x1b[31m";
    pub const CYAN: &str = "\x1b[36m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RESET: &str = "\x1b[0m";
}

fn main() {
    let args = Args::parse();
    let filter = if args.trace {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    std::process::exit(run(&args));
}

fn run(args: &Args) -> i32 {
    println!("\n{}{}Vigil Test Suite{}", colors::BOLD, colors::CYAN, colors::RESET);
    println!("{}{}{}\n", colors::DIM, "=".repeat(50), colors::RESET);

    let mut runner = TestRunner::new(cases_dir());
    if let Some(filter) = &args.filter {
        runner = runner.with_filter(filter);
    }
    let results = match runner.run_all() {
        Ok(results) => results,
        Err(err) => {
            eprintln!("{}{}Error:{} {err:#}", colors::BOLD, colors::RED, colors::RESET);
            return 1;
        }
    };

    let mut lines: Vec<(&str, bool)> = results
        .passed
        .iter()
        .map(|name| (name.as_str(), true))
        .chain(results.failures.iter().map(|failure| (failure.case.as_str(), false)))
        .collect();
    lines.sort();
    for (name, passed) in lines {
        let (status, color) = if passed {
            ("PASS", colors::GREEN)
        } else {
            ("FAIL", colors::RED)
        };
        println!("  {}{color}{status}{} {name}", colors::BOLD, colors::RESET);
    }

    if !results.failures.is_empty() {
        println!("\n{}{}Failures{}", colors::BOLD, colors::RED, colors::RESET);
        for failure in &results.failures {
            println!("\n  {}{}{}", colors::BOLD, failure.case, colors::RESET);
            let text = if args.short {
                failure.error.lines().next().unwrap_or_default()
            } else {
                failure.error.as_str()
            };
            for line in text.lines() {
                println!("    {line}");
            }
        }
    }

    println!(
        "\n  {} passed, {} failed, {} total\n",
        results.passed.len(),
        results.failures.len(),
        results.total()
    );
    if results.is_success() { 0 } else { 1 }
}
