//! Event Graph CLI Application
//!
//! Command-line front end for the event graph renderer. It wires together
//! argument parsing, logging, optional TOML configuration, and the
//! library's load/build/layout/annotate/render pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use event_graph_render::RenderConfig;
use std::path::PathBuf;

mod config;

/// Event Graph Renderer - Draw an event-rule diagram as a PNG image
#[derive(Parser, Debug)]
#[command(name = "event-graph-cli")]
#[command(about = "Render an event-rule JSON document as a graph diagram", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the event-rule JSON document (default: output.json)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Path of the PNG image to write (default: event_graph.png)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to a TOML configuration file with renderer settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Event Graph CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using renderer library v{}", event_graph_render::VERSION);

    let mut render_config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => RenderConfig::default(),
    };
    if let Some(input) = &args.input {
        render_config.input_path = input.clone();
    }
    if let Some(output) = &args.output {
        render_config.output_path = output.clone();
    }

    log::info!(
        "Rendering {:?} -> {:?}",
        render_config.input_path,
        render_config.output_path
    );

    event_graph_render::render_file(&render_config).with_context(|| {
        format!(
            "Failed to render {:?} to {:?}",
            render_config.input_path, render_config.output_path
        )
    })?;

    log::info!("Done");
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
