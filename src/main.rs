// Console front end for the DAC reports.
//
// Interactive mode loops over a selection menu:
// - Option [1] fetches visit rows, asks for a year, and prints the visit views.
// - Option [2] fetches schema sizes and prints the top databases.
// Every report writes its CSV files (and a JSON summary for visits) to the
// configured output directory. `--batch` runs both reports once and exits.
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use dac_report::types::{VisitRecord, VisitReport};
use dac_report::util::{format_int, format_number};
use dac_report::{output, reports, CsvSource, ReportConfig};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Clinic visit and server space reports")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "dac_report.toml")]
    config: PathBuf,

    /// CSV export of the visit query (overrides the config file).
    #[arg(long)]
    visits: Option<PathBuf>,

    /// CSV export of the schema size query (overrides the config file).
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Output directory for report files.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Year for the voided/unvoided views; defaults to the latest year.
    #[arg(short, long)]
    year: Option<i32>,

    /// Generate both reports once without prompting.
    #[arg(long)]
    batch: bool,
}

/// Session settings. Data is fetched again for every report.
struct App {
    cfg: ReportConfig,
    source: CsvSource,
}

fn read_line(prompt: &str) -> String {
    print!("{prompt}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask whether to go back to the report selection menu.
fn prompt_back_to_menu() -> bool {
    loop {
        match read_line("Back to Report Selection (Y/N): ")
            .to_uppercase()
            .as_str()
        {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Pick a year from `years`; an empty answer takes the first (latest) one.
fn prompt_year(years: &[i32]) -> i32 {
    let listed: Vec<String> = years.iter().map(i32::to_string).collect();
    println!("Available years: {}", listed.join(", "));
    loop {
        let answer = read_line(&format!("Select a year [{}]: ", years[0]));
        if answer.is_empty() {
            return years[0];
        }
        match answer.parse::<i32>() {
            Ok(y) if years.contains(&y) => return y,
            _ => println!("Invalid year. Choose one of the listed years."),
        }
    }
}

fn print_visit_report(app: &App, rows: &[VisitRecord], report: &VisitReport) -> anyhow::Result<()> {
    let n = app.cfg.preview_rows;
    let summary = reports::generate_summary(rows, report).context("failed to summarise visits")?;
    println!(
        "Processing dataset... ({} rows, {} records)",
        format_int(summary.total_rows),
        format_int(summary.total_records)
    );
    println!("Selected year: {}\n", report.selected_year);

    println!("Voided/Unvoided");
    output::print_headline(&report.split.voided);
    output::print_headline(&report.split.unvoided);
    if !report.split.voided.is_available() {
        println!(
            "(not tracked for {} and earlier)",
            app.cfg.voided_cutoff_year
        );
    }
    println!();

    println!("Visits Categorisation");
    match &report.categorisation {
        Some(c) => println!(
            "{} of {} facilities above {} visits ({}%)\n",
            c.above_threshold,
            c.facilities,
            format_int(c.threshold),
            format_number(c.percent, 1)
        ),
        None => println!("-\n"),
    }

    println!("Total Visits Per Site (max per year and facility)");
    output::preview_table_rows(&report.heatmap, n);
    println!("Total Visits Trend Analysis (voided + unvoided)");
    output::preview_table_rows(&report.year_totals, n);
    println!("Top Facilities (max {})", format_int(report.max_records));
    output::preview_table_rows(&report.ranking, n);

    let paths = output::write_visit_report(&app.cfg.output_dir, report)?;
    let summary_path = app.cfg.output_dir.join(output::SUMMARY_FILE);
    output::write_json(&summary_path, &summary)?;
    for p in paths.iter().chain(std::iter::once(&summary_path)) {
        println!("(Exported {})", p.display());
    }
    println!();
    Ok(())
}

fn handle_visit_report(app: &App) -> anyhow::Result<()> {
    let rows = dac_report::fetch_visits(&app.source).context("failed to load visit data")?;
    let years = dac_report::aggregate::available_years(&rows);
    if years.is_empty() {
        println!("No visit data available.\n");
        return Ok(());
    }
    let year = prompt_year(&years);
    let report = reports::generate_visit_report(&rows, year, &app.cfg)
        .context("failed to build visit report")?;
    print_visit_report(app, &rows, &report)
}

fn handle_storage_report(app: &App) -> anyhow::Result<()> {
    let report = dac_report::run_storage_report(&app.source, &app.cfg)
        .context("failed to load storage data")?;
    println!("Top {} Databases (size in MB)", app.cfg.storage_top_n);
    output::preview_table_rows(&report.rows, app.cfg.storage_top_n);
    let path = output::write_storage_report(&app.cfg.output_dir, &report)?;
    println!("(Exported {})\n", path.display());
    Ok(())
}

fn run_batch(app: &App, year: Option<i32>) -> anyhow::Result<()> {
    match dac_report::run_visit_report(&app.source, year, &app.cfg)
        .context("failed to build visit report")?
    {
        Some((rows, report)) => print_visit_report(app, &rows, &report)?,
        None => println!("No visit data available.\n"),
    }
    handle_storage_report(app)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = ReportConfig::load(&cli.config).context("failed to read configuration")?;
    if let Some(p) = cli.visits {
        cfg.visits_path = p;
    }
    if let Some(p) = cli.storage {
        cfg.storage_path = p;
    }
    if let Some(p) = cli.out {
        cfg.output_dir = p;
    }
    let source = CsvSource::new(&cfg.visits_path, &cfg.storage_path);
    let app = App { cfg, source };

    if cli.batch {
        return run_batch(&app, cli.year);
    }

    loop {
        println!("Select Report:");
        println!("[1] Clinic Visits");
        println!("[2] Server Space");
        println!("[3] Exit\n");
        let result = match read_line("Enter choice: ").as_str() {
            "1" => handle_visit_report(&app),
            "2" => handle_storage_report(&app),
            "3" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
                continue;
            }
        };
        if let Err(e) = result {
            eprintln!("Report failed: {e:#}\n");
        }
        if !prompt_back_to_menu() {
            println!("Exiting the program.");
            break;
        }
    }
    Ok(())
}

