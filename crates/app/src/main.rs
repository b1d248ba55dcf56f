//! PDF Editor - egui-based desktop application
//!
//! Opens PDFs in tabs and offers merge, split, rearrange and password tools.

mod app;
mod config;
mod dialogs;
mod logging;
mod viewer;

use anyhow::{anyhow, Result};
use clap::Parser;
use config::{ConfigError, EditorConfig};
use eframe::egui;
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdf-editor")]
#[command(about = "View and edit PDF documents")]
struct Args {
    /// PDF files to open at start-up
    files: Vec<PathBuf>,

    /// Log file (overrides PDF_EDITOR_LOG_FILE)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (overrides PDF_EDITOR_LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,

    /// Directory containing the PDFium library (overrides PDF_EDITOR_PDFIUM_DIR)
    #[arg(long)]
    pdfium_dir: Option<PathBuf>,
}

impl Args {
    fn apply(&self, mut config: EditorConfig) -> Result<EditorConfig, ConfigError> {
        if let Some(path) = &self.log_file {
            config = config.with_log_file(path);
        }
        if let Some(level) = &self.log_level {
            let level = config::parse_level(level)
                .ok_or_else(|| ConfigError::InvalidValue("--log-level".to_string()))?;
            config = config.with_log_level(level);
        }
        if let Some(dir) = &self.pdfium_dir {
            config = config.with_pdfium_dir(dir);
        }
        Ok(config)
    }
}

fn run(args: Args) -> Result<()> {
    let config = args.apply(EditorConfig::from_env()?)?;
    logging::init(&config)?;
    info!("Starting PDF Editor");

    let engine = pdf_engine::preferred_engine(config.pdfium_dir.as_deref());
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("PDF Editor"),
        ..Default::default()
    };

    eframe::run_native(
        "PDF Editor",
        options,
        Box::new(move |_cc| Ok(Box::new(app::PdfEditorApp::new(engine, args.files)))),
    )
    .map_err(|err| {
        error!("Application error: {err}");
        anyhow!("{err}")
    })
}

fn main() {
    if let Err(err) = run(Args::parse()) {
        error!("Start-up failed: {err:#}");
        eprintln!("pdf-editor: {err:#}");
        std::process::exit(1);
    }
}
