//! sqlgraph CLI - SQL dependency graph extraction tool

mod args;
mod config;
mod output;

use std::fs;
use std::io::Read;
use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use sqlgraph_core::{extract_graph, mask_comments};

use crate::args::{Args, Command, OutputFormat};
use crate::config::Config;
use crate::output::GraphFormatter;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Extract {
            files,
            config: config_path,
            format,
        } => {
            // Load configuration
            let config = if let Some(path) = config_path {
                // Load from specified path
                Config::from_file(&path)?
            } else {
                // Try to find sqlgraph.toml
                Config::find_and_load()?.unwrap_or_default()
            };

            // Merge CLI args with config (CLI takes precedence)
            let config = config.merge_with_args(&files, &format);

            // Determine output format
            let output_format = if let Some(fmt_str) = &config.format {
                match fmt_str.as_str() {
                    "json" => OutputFormat::Json,
                    "dot" => OutputFormat::Dot,
                    _ => OutputFormat::Human,
                }
            } else {
                OutputFormat::Human
            };

            // `-` alone means read the query from stdin
            if config.files.len() == 1 && config.files[0] == "-" {
                let mut sql = String::new();
                std::io::stdin()
                    .read_to_string(&mut sql)
                    .into_diagnostic()?;
                let graph = extract_graph(&sql);
                GraphFormatter::new(output_format, "<stdin>".to_string()).print_graph(&graph);
                return Ok(());
            }

            // Collect input files, expanding glob patterns
            let mut sql_files = Vec::new();
            for pattern in &config.files {
                if pattern.contains('*') {
                    for path in glob::glob(pattern).into_diagnostic()?.flatten() {
                        sql_files.push(path);
                    }
                } else {
                    sql_files.push(std::path::PathBuf::from(pattern));
                }
            }

            if sql_files.is_empty() {
                miette::bail!(
                    "No input files specified. Pass SQL files, `-` for stdin, or configure files in sqlgraph.toml"
                );
            }

            for sql_file in &sql_files {
                let sql = fs::read_to_string(sql_file).into_diagnostic()?;
                let graph = extract_graph(&sql);
                let formatter =
                    GraphFormatter::new(output_format, sql_file.display().to_string());
                formatter.print_graph(&graph);
            }

            Ok(())
        }

        Command::Mask { file } => {
            // Print the comment-masked text; offsets into it match the
            // original byte for byte.
            let sql = fs::read_to_string(&file).into_diagnostic()?;
            print!("{}", mask_comments(&sql));
            Ok(())
        }
    }
}
