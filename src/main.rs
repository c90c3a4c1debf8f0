use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use table_cleaner::data::{loader, writer};
use table_cleaner::{clean, CleanReport, ColumnClassification};

/// Deduplicate a table, convert date columns and report column types.
#[derive(Parser, Debug)]
#[command(name = "table-cleaner", version, about)]
struct Cli {
    /// Input file (.csv, .json or .parquet)
    input: PathBuf,

    /// Column to convert to dates; repeat for several columns
    #[arg(short = 'd', long = "date-column", value_name = "NAME")]
    date_columns: Vec<String>,

    /// Write the cleaned table here (format chosen by extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the summary as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Exit with status 2 when any warning was raised
    #[arg(long)]
    strict: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    rows_in: usize,
    rows_out: usize,
    duplicates_removed: usize,
    columns: &'a ColumnClassification,
    warnings: Vec<String>,
}

impl<'a> Summary<'a> {
    fn new(rows_in: usize, report: &'a CleanReport) -> Self {
        Summary {
            rows_in,
            rows_out: report.dataset.height(),
            duplicates_removed: report.duplicates_removed,
            columns: &report.columns,
            warnings: report.warnings.iter().map(ToString::to_string).collect(),
        }
    }

    fn print_text(&self) {
        println!(
            "Rows: {} -> {} ({} duplicates removed)",
            self.rows_in, self.rows_out, self.duplicates_removed
        );
        print_group("Categorical", &self.columns.categorical);
        print_group("Numerical", &self.columns.numerical);
        print_group("Converted date", &self.columns.converted_date);
        for warning in &self.warnings {
            println!("Warning: {warning}");
        }
    }
}

fn print_group(label: &str, names: &[String]) {
    println!("{label} columns ({}): {}", names.len(), names.join(", "));
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let dataset = loader::load_file(&cli.input)?;
    let report = clean(&dataset, &cli.date_columns);

    if let Some(output) = &cli.output {
        writer::write_file(&report.dataset, output)?;
    }

    let summary = Summary::new(dataset.height(), &report);
    if cli.json {
        let text = serde_json::to_string_pretty(&summary).context("serialising summary")?;
        println!("{text}");
    } else {
        summary.print_text();
    }

    if cli.strict && !report.is_clean() {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
