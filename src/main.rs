use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use depin::log_status;
use depin::rewrite::{self, FileError, ImportRule, DEFAULT_EXTENSIONS};
use depin::utils::args::normalize_extensions;
use depin::{Error, Result};

mod output;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "depin")]
#[command(version = VERSION)]
#[command(about = "Strip pinned registry versions from source import specifiers")]
struct Cli {
    /// Root directory to rewrite
    #[arg(default_value = ".")]
    path: String,

    /// File extensions that qualify as source files
    #[arg(
        long = "ext",
        value_name = "EXT",
        value_delimiter = ',',
        default_values_t = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string())
    )]
    extensions: Vec<String>,

    /// Report edits without writing anything to disk
    #[arg(long)]
    dry_run: bool,
}

#[derive(Serialize)]
struct RewriteOutput {
    root: String,
    extensions: Vec<String>,
    dry_run: bool,
    files_scanned: usize,
    total_replacements: usize,
    edits: Vec<EditSummary>,
    errors: Vec<FileError>,
    applied: bool,
}

#[derive(Serialize)]
struct EditSummary {
    file: String,
    replacements: usize,
}

fn run(cli: Cli) -> Result<(RewriteOutput, i32)> {
    let extensions = normalize_extensions(&cli.extensions);
    if extensions.is_empty() {
        return Err(Error::InvalidArgument(
            "At least one file extension is required (e.g. --ext ts,tsx)".to_string(),
        ));
    }

    let root = PathBuf::from(shellexpand::tilde(&cli.path).into_owned());

    log_status!("rewrite", "Scanning {}", root.display());

    let rule = ImportRule::new();
    let mut result = rewrite::generate_edits(&rule, &root, &extensions)?;

    if !cli.dry_run {
        rewrite::apply_edits(&mut result, &root);
    }

    // Per-file errors are reported, not fatal: a completed traversal
    // exits 0 even when individual files errored.
    Ok((
        RewriteOutput {
            root: root.display().to_string(),
            extensions,
            dry_run: cli.dry_run,
            files_scanned: result.files_scanned,
            total_replacements: result.total_replacements,
            edits: result
                .edits
                .iter()
                .map(|e| EditSummary {
                    file: e.file.clone(),
                    replacements: e.replacements,
                })
                .collect(),
            errors: result.errors.clone(),
            applied: result.applied,
        },
        0,
    ))
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let (json_result, exit_code) = output::map_cmd_result_to_json(run(cli));
    output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
