//! pdfscope CLI - structured PDF inspection tool

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;

/// Directory (relative to the working directory) where extracted images
/// are saved.
const IMAGE_OUTPUT_DIR: &str = "images";

#[derive(Parser)]
#[command(name = "pdfscope")]
#[command(version)]
#[command(about = "Inspect a PDF: text spans, links, and embedded images", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    // Missing argument is not an error: print the usage hint and exit
    // cleanly without touching the filesystem.
    let Some(input) = cli.input else {
        println!("Valid argument required: path to PDF document");
        return;
    };

    log::debug!("inspecting {}", input.display());
    if let Err(e) = pdfscope::inspect_file(&input, IMAGE_OUTPUT_DIR) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}
