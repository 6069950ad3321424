// Entry point and high-level CLI flow.
//
// One invocation produces one report:
// - load and normalize the records file, printing diagnostics,
// - keep the projects scheduled to start by the cutoff date,
// - generate the report and save it into the output directory,
// - print a short markdown preview and optionally dump the statistics.
use chrono::Local;
use clap::Parser;
use poa_report::config::{ReportRequest, Settings};
use poa_report::loader::{filter_by_cutoff, load_records};
use poa_report::util::{format_currency, format_int};
use poa_report::{output, telemetry, FormatDispatcher, ReportPipeline, SectionBuilder};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "poa-report", version, about = "Generate POA project reports")]
struct Cli {
    /// Project records, as .csv or .json.
    #[arg(long)]
    records: PathBuf,

    /// executive, portfolio, budget, risk, territorial or transparency.
    #[arg(long = "type", default_value = "executive")]
    report_type: String,

    /// weekly, monthly, quarterly or annual.
    #[arg(long, default_value = "monthly")]
    period: String,

    /// Cutoff date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    cutoff: Option<String>,

    /// document, spreadsheet or both.
    #[arg(long, default_value = "document")]
    format: String,

    #[arg(long)]
    no_charts: bool,

    #[arg(long)]
    annex: bool,

    /// Report name used for archive entries.
    #[arg(long)]
    name: Option<String>,

    /// Overrides POA_OUTPUT_DIR.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Also write the statistics bundle to this JSON file.
    #[arg(long)]
    stats_json: Option<PathBuf>,

    /// Data-table rows to preview on stdout.
    #[arg(long, default_value_t = 5)]
    preview: usize,
}

impl Cli {
    fn request(&self) -> ReportRequest {
        ReportRequest {
            report_type: Some(self.report_type.clone()),
            period: Some(self.period.clone()),
            cutoff_date: self.cutoff.clone(),
            format: Some(self.format.clone()),
            include_charts: Some(!self.no_charts),
            include_annex: Some(self.annex),
            name: self.name.clone(),
        }
    }
}

fn run(cli: Cli, settings: Settings) -> Result<(), Box<dyn Error>> {
    let today = Local::now().date_naive();
    let config = cli.request().validate(today)?;

    let (records, load_report) = load_records(&cli.records)?;
    let total = records.len();
    let records = filter_by_cutoff(records, config.cutoff_date);
    println!(
        "Processing dataset... ({} rows loaded, {} started by {})",
        format_int(total as u64),
        format_int(records.len() as u64),
        config.cutoff_date.format("%d/%m/%Y")
    );
    if load_report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse errors.",
            format_int(load_report.parse_errors as u64)
        );
    }

    let dispatcher = FormatDispatcher::new(SectionBuilder::now()).spool_limit(settings.spool_limit);
    let report = ReportPipeline::new(dispatcher).run(&config, &records)?;

    let out_dir = cli.out_dir.unwrap_or(settings.output_dir);
    let path = output::write_bytes(&out_dir, report.output.file_name(), report.output.bytes())?;
    println!(
        "\n{} ({}, {} bytes)",
        path.display(),
        report.output.media_type(),
        format_int(report.output.bytes().len() as u64)
    );
    println!(
        "{} projects | total budget {} | executed {}\n",
        format_int(report.stats.total_count as u64),
        format_currency(report.stats.total_budget),
        format_currency(report.stats.executed_budget)
    );

    let table = report.layout.data_table().unwrap_or(&report.layout.detail);
    println!("{}", table.heading);
    println!("{}\n", output::preview_table(table, cli.preview));

    if let Some(stats_path) = cli.stats_json {
        output::write_json(&stats_path, &report.stats)?;
        println!("(Statistics exported to {})", stats_path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = telemetry::init(&settings.log_level) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(cli, settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "report generation failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
