// src/main.rs
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use trivia_rubric::extractors::Backend;
use trivia_rubric::pipeline::{self, RunOptions};
use trivia_rubric::rubric::ParserConfig;
use trivia_rubric::utils;

/// Extract a grading rubric CSV from a Geeks Who Drink trivia PDF
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the source PDF exported from Geeks Who Drink
    input_pdf: PathBuf,

    /// Destination CSV file (defaults to the PDF name with a .csv extension)
    output_csv: Option<PathBuf>,

    /// Text extraction backend
    #[arg(long, value_enum, default_value_t = Backend::Auto)]
    backend: Backend,

    /// Keep only the text after the last '?' or '!' of each answer
    #[arg(long)]
    split_question_text: bool,

    /// Strip grader notes and normalize '/' and ',' spacing in answers
    #[arg(long)]
    clean_answers: bool,

    /// Leave out rounds that have no answers
    #[arg(long)]
    skip_empty_sections: bool,

    /// Also write a JSON summary next to the CSV
    #[arg(long)]
    metadata: bool,

    /// Debug mode - save the extracted lines with their classification
    #[arg(short, long)]
    debug: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            input: self.input_pdf.clone(),
            output: self.output_csv.clone(),
            backend: self.backend,
            parser: ParserConfig {
                split_question_text: self.split_question_text,
                clean_answers: self.clean_answers,
                skip_empty_sections: self.skip_empty_sections,
            },
            write_metadata: self.metadata,
            write_debug_lines: self.debug,
        }
    }
}

fn main() -> ExitCode {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.verbose);
    tracing::info!("Starting processing for args: {:?}", args);

    // 3. Run the pipeline
    match pipeline::run(&args.run_options()) {
        Ok(summary) => {
            tracing::info!(
                "Processing finished via {}. Sections: {}, entries: {}, anomalies: {}",
                summary.backend,
                summary.sections,
                summary.entries,
                summary.anomalies
            );
            println!(
                "Wrote {} rounds ({} answers) to {}",
                summary.sections,
                summary.entries,
                summary.csv_path.display()
            );
            if let Some(path) = summary.metadata_path {
                println!("Wrote metadata to {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            tracing::debug!("Error detail: {:?}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
