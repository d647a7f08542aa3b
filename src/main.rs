use anyhow::{bail, Context, Result};
use std::env;
use std::fs::File;
use std::path::Path;

use call_dashboard::{fetch_spreadsheet, group_counts, load_workbook, write_csv, Snapshot, VERSION};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("check") => run_check(&args[2..]),
        Some("export") => run_export(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

/// Load the four source tables from whichever backend the arguments name.
fn load_snapshot(args: &[String]) -> Result<Snapshot> {
    let sources = match args.first().map(String::as_str) {
        Some("--remote") => {
            if args.len() < 3 {
                bail!("--remote needs <credentials.json> and <spreadsheet title>");
            }
            println!("🌐 Fetching '{}' from the spreadsheet service...", args[2]);
            fetch_spreadsheet(Path::new(&args[1]), &args[2])?
        }
        Some(path) => {
            println!("📂 Loading workbook {}...", path);
            load_workbook(Path::new(path))?
        }
        None => bail!("Missing input: pass a workbook path or --remote <credentials.json> <title>"),
    };

    Ok(Snapshot::build(sources))
}

fn run_check(args: &[String]) -> Result<()> {
    println!("📞 Call Dashboard - Data Check");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let snapshot = load_snapshot(args)?;

    println!("✓ Loaded {} call entries", snapshot.total_rows());
    for source in &snapshot.sources {
        println!("  {:<10} {:>5} rows", source.name, source.rows.len());
    }

    if let (Some(earliest), Some(latest)) = (snapshot.earliest_date(), snapshot.latest_date()) {
        println!("✓ Date range: {} - {}", earliest, latest);
    }

    let counts = group_counts(&snapshot.consolidated);
    if !counts.is_empty() {
        println!("\n📊 Category distribution:");
        let total = snapshot.total_rows() as f64;
        for slice in &counts {
            println!(
                "  {:<24} {:>5}  ({:.1}%)",
                slice.category,
                slice.count,
                slice.count as f64 / total * 100.0
            );
        }
    }

    Ok(())
}

fn run_export(args: &[String]) -> Result<()> {
    println!("📞 Call Dashboard - CSV Export");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let out_path = args
        .first()
        .context("Missing output path: call-dashboard export <out.csv> <input...>")?;

    let snapshot = load_snapshot(&args[1..])?;

    let file = File::create(out_path).with_context(|| format!("Failed to create {}", out_path))?;
    write_csv(&snapshot.default_columns(), &snapshot.consolidated, file)?;

    println!("✓ Wrote {} rows to {}", snapshot.total_rows(), out_path);

    Ok(())
}

fn print_usage() {
    eprintln!("Call Dashboard v{}", VERSION);
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  call-dashboard check <workbook.xlsx>");
    eprintln!("  call-dashboard check --remote <credentials.json> <spreadsheet title>");
    eprintln!("  call-dashboard export <out.csv> <workbook.xlsx>");
    eprintln!("  call-dashboard export <out.csv> --remote <credentials.json> <spreadsheet title>");
    eprintln!();
    eprintln!("  The dashboard itself is served by: cargo run --bin call-server --features server");
}
