//! Command-line shell: open an image, replay UI events, write the results.

use std::path::PathBuf;

use annomark::config::{AppConfig, ConfigError};
use annomark::render::{self, RasterPainter};
use annomark::script::{self, ScriptError};
use annomark::Session;
use clap::Parser;

/// Annotate an image with boxes and strokes from a scripted event list.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image to open (PNG or JPEG)
    image: PathBuf,

    /// JSON list of UI events to replay
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Existing annotations to import before the script runs
    #[arg(short, long)]
    import: Option<PathBuf>,

    /// Write annotations here; the format follows the extension (.txt, .json)
    #[arg(short, long)]
    annotations: Option<PathBuf>,

    /// Write the image with annotations burned in (.png, .jpg)
    #[arg(short, long)]
    flatten: Option<PathBuf>,

    /// Print annotations to stdout in this format (text, json)
    #[arg(long)]
    format: Option<String>,

    /// Font for burned-in labels (falls back to the config, then $ANNOMARK_FONT)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Store the effective configuration at the default location
    #[arg(long)]
    save_config: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Session(#[from] annomark::Error),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match AppConfig::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {:?}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => AppConfig::load_from_default_path().unwrap_or_default(),
    };

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_env("RUST_LOG")
        .init();

    if let Err(e) = run(&args, &config) {
        log::error!("{}", e);
        eprintln!("annomark: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args, config: &AppConfig) -> Result<(), CliError> {
    if args.save_config {
        config.save_to_default_path()?;
    }

    let mut session = Session::with_options(config.session_options());
    session.load_path(&args.image)?;

    if let Some(path) = &args.import {
        let ids = session.load_annotations(path)?;
        log::info!("Imported {} annotations from {:?}", ids.len(), path);
    }

    if let Some(path) = &args.script {
        let json = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?;
        let steps = script::parse(&json)?;
        script::run(&mut session, &steps)?;
    }

    if let Some(format_id) = &args.format {
        print!("{}", session.export_annotations(format_id)?);
    }

    if let Some(path) = &args.annotations {
        session.save_annotations(path)?;
    }

    if let Some(path) = &args.flatten {
        let font_path = args.font.as_deref().or(config.drawing.font_path.as_deref());
        let mut painter = RasterPainter::new(render::load_font(font_path));
        if !painter.has_font() && session.annotations().any(|a| a.label().is_some()) {
            log::warn!("No label font configured, labels will be left out of {:?}", path);
        }
        session.save_flattened(path, &mut painter)?;
    }

    Ok(())
}
