//! yolo_detect - run object detection on one image and print JSON
//!
//! stdout: `[{"class": "...", "confidence": 0.0}, ...]`, exit 0.
//! Any failure: `Error: <message>` on stderr, exit 2.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::error::ErrorKind;
use clap::Parser;
use yolo_detect::{detect_image, render_json, BackendKind, DetectConfig};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image file to run detection on.
    image_path: PathBuf,
    /// JSON config file (default: $YOLO_DETECT_CONFIG when set and non-empty).
    #[arg(long)]
    config: Option<PathBuf>,
    /// ONNX model file (overrides config).
    #[arg(long)]
    model: Option<PathBuf>,
    /// Detector backend: tract or stub (overrides config).
    #[arg(long)]
    backend: Option<String>,
    /// Minimum class confidence (overrides config).
    #[arg(long)]
    confidence: Option<f32>,
    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    // Logs share stderr with the error line; stdout is reserved for JSON.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = err.print();
                return ExitCode::SUCCESS;
            }
            _ => return fail(anyhow!(clap_message(&err))),
        },
    };

    match run(args) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => fail(err),
    }
}

fn run(args: Args) -> Result<String> {
    let mut cfg = match args.config.as_deref() {
        Some(path) => DetectConfig::load_from(Some(path))?,
        None => DetectConfig::load()?,
    };
    if let Some(model) = args.model {
        cfg.model_path = model;
    }
    if let Some(backend) = args.backend.as_deref() {
        cfg.backend = BackendKind::parse(backend)?;
    }
    if let Some(confidence) = args.confidence {
        cfg.confidence_threshold = confidence;
    }
    cfg.validate()?;
    log::debug!("config: {:?}", cfg);

    let detections = detect_image(&args.image_path, &cfg)?;
    render_json(&detections, args.pretty)
}

fn fail(err: anyhow::Error) -> ExitCode {
    let message = format!("{:#}", err).replace('\n', " ");
    eprintln!("Error: {}", message);
    ExitCode::from(yolo_detect::EXIT_FAILURE)
}

/// Collapse clap's multi-line report into one line without the usage block.
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let body = rendered.split("\n\n").next().unwrap_or_default();
    body.trim_start_matches("error: ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
