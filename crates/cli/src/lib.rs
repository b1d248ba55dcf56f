use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use pdf_editor_core::{
    metadata_rows, open_document, operations, DocumentSession, PageOrder, ReorderEvent,
};
use pdf_engine::{default_engine, LopdfEngine, PdfEngine, ThumbnailSize};
use serde::Serialize;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Parser)]
#[command(name = "pdf-editor-cli")]
#[command(about = "PDF Editor CLI")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open a PDF in the desktop app.
    Open {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        password: Option<String>,
    },
    /// Render a thumbnail PNG for a page.
    RenderThumb {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 200)]
        width: u32,
        #[arg(long, default_value_t = 260)]
        height: u32,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Concatenate PDFs, in the given order, into merged.pdf beside the first.
    Merge {
        #[arg(value_name = "FILE", required = true, num_args = 1..)]
        files: Vec<PathBuf>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Copy the listed pages (1-based, in order) into split.pdf.
    Split {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        pages: Vec<u32>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Write the pages in a new order (1-based permutation) to <stem>_reordered.pdf.
    Rearrange {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        order: Vec<u32>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Protect an unencrypted PDF with AES-256 into <stem>_encrypted.pdf.
    Encrypt {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        password: String,
    },
    /// Re-encrypt with a new password into <stem>_newpassword.pdf.
    ChangePassword {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        current: String,
        #[arg(long = "new")]
        new_password: String,
    },
    /// Remove encryption into <stem>_decrypted.pdf.
    Decrypt {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        password: String,
    },
    /// Copy a PDF byte for byte.
    SaveAs {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(value_name = "DEST")]
        destination: PathBuf,
        #[arg(long)]
        password: Option<String>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    encrypted: bool,
    first_page_size_pt: Option<PageSizeOutput>,
    metadata: Vec<MetadataOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

#[derive(Debug, Serialize)]
struct MetadataOutput {
    key: &'static str,
    value: String,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.verbose);

    match cli.command {
        Commands::Open { file } => run_open(&file),
        Commands::Info { file, password } => run_info(&file, password.as_deref()),
        Commands::RenderThumb { file, page, width, height, output, password } => {
            run_render_thumb(&file, page, width, height, output.as_deref(), password.as_deref())
        }
        Commands::Merge { files, password } => run_merge(&files, password.as_deref()),
        Commands::Split { file, pages, password } => run_split(&file, &pages, password.as_deref()),
        Commands::Rearrange { file, order, password } => {
            run_rearrange(&file, &order, password.as_deref())
        }
        Commands::Encrypt { file, password } => run_encrypt(&file, &password),
        Commands::ChangePassword { file, current, new_password } => {
            run_change_password(&file, &current, &new_password)
        }
        Commands::Decrypt { file, password } => run_decrypt(&file, &password),
        Commands::SaveAs { file, destination, password } => {
            run_save_as(&file, &destination, password.as_deref())
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    // Only fails when a logger is already installed.
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Never);
}

fn run_open(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    if std::env::var_os("PDF_EDITOR_TEST_NO_SPAWN").is_some() {
        println!("open:{}", file.display());
        return Ok(());
    }

    let desktop_bin =
        std::env::var_os("PDF_EDITOR_APP_BIN").unwrap_or_else(|| OsString::from("pdf-editor"));

    let status =
        Command::new(desktop_bin).arg(file).status().context("failed to launch desktop app")?;

    if !status.success() {
        anyhow::bail!("desktop app exited with status {status}");
    }

    Ok(())
}

fn open_session(
    engine: &mut LopdfEngine,
    file: &Path,
    password: Option<&str>,
) -> Result<DocumentSession> {
    ensure_pdf_exists(file)?;
    open_document(engine, file, password)
        .with_context(|| format!("failed to open PDF {}", file.display()))
}

fn run_info(file: &Path, password: Option<&str>) -> Result<()> {
    let mut engine = default_engine();
    let session = open_session(&mut engine, file, password)?;
    let handle = session.handle();

    let first_page_size_pt = if session.page_count() > 0 {
        let size = engine.page_size(handle, 0)?;
        Some(PageSizeOutput { width: size.width_pt, height: size.height_pt })
    } else {
        None
    };
    let metadata = metadata_rows(&engine.metadata(handle)?)
        .into_iter()
        .map(|row| MetadataOutput { key: row.key, value: row.value })
        .collect();

    let payload = InfoOutput {
        path: file.display().to_string(),
        page_count: session.page_count(),
        encrypted: session.is_encrypted(),
        first_page_size_pt,
        metadata,
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    session.close(&mut engine)?;

    Ok(())
}

fn run_render_thumb(
    file: &Path,
    page: u32,
    width: u32,
    height: u32,
    output: Option<&Path>,
    password: Option<&str>,
) -> Result<()> {
    if page == 0 {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }

    let mut engine = default_engine();
    let session = open_session(&mut engine, file, password)?;

    let image = engine
        .render_thumbnail(
            session.handle(),
            page - 1,
            ThumbnailSize { width_px: width, height_px: height },
        )
        .context("failed to render thumbnail")?;

    let output =
        output.map(ToOwned::to_owned).unwrap_or_else(|| default_thumbnail_output(file, page));

    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    image
        .save(&output)
        .with_context(|| format!("failed to write image to {}", output.display()))?;

    println!("{}", output.display());

    session.close(&mut engine)?;

    Ok(())
}

fn run_merge(files: &[PathBuf], password: Option<&str>) -> Result<()> {
    let mut engine = default_engine();
    let sessions = files
        .iter()
        .map(|file| open_session(&mut engine, file, password))
        .collect::<Result<Vec<_>>>()?;

    let sources: Vec<&DocumentSession> = sessions.iter().collect();
    let output = operations::merge(&mut engine, &sources)?;
    println!("{}", output.display());
    Ok(())
}

fn run_split(file: &Path, pages: &[u32], password: Option<&str>) -> Result<()> {
    let mut engine = default_engine();
    let session = open_session(&mut engine, file, password)?;
    let pages = page_indices(pages, session.page_count())?;

    let output = operations::split(&mut engine, &session, &pages)?;
    println!("{}", output.display());
    Ok(())
}

fn run_rearrange(file: &Path, order: &[u32], password: Option<&str>) -> Result<()> {
    let mut engine = default_engine();
    let session = open_session(&mut engine, file, password)?;
    let order = page_order(&page_indices(order, session.page_count())?, session.page_count())?;

    let output = operations::rearrange(&mut engine, &session, &order)?;
    println!("{}", output.display());
    Ok(())
}

fn run_encrypt(file: &Path, password: &str) -> Result<()> {
    let mut engine = default_engine();
    let session = open_session(&mut engine, file, None)?;

    let output = operations::set_password(&mut engine, &session, password)?;
    println!("{}", output.display());
    Ok(())
}

fn run_change_password(file: &Path, current: &str, new_password: &str) -> Result<()> {
    ensure_pdf_exists(file)?;
    let mut engine = default_engine();

    let output = operations::change_password(&mut engine, file, current, new_password)?;
    println!("{}", output.display());
    Ok(())
}

fn run_decrypt(file: &Path, password: &str) -> Result<()> {
    ensure_pdf_exists(file)?;
    let mut engine = default_engine();

    let output = operations::decrypt(&mut engine, file, password)?;
    println!("{}", output.display());
    Ok(())
}

fn run_save_as(file: &Path, destination: &Path, password: Option<&str>) -> Result<()> {
    let mut engine = default_engine();
    let session = open_session(&mut engine, file, password)?;

    let output = operations::save_as(&session, destination)
        .with_context(|| format!("failed to write {}", destination.display()))?;
    println!("{}", output.display());
    Ok(())
}

/// Converts 1-based page numbers to indices, checking each against the
/// document.
fn page_indices(pages: &[u32], page_count: u32) -> Result<Vec<u32>> {
    pages
        .iter()
        .map(|&page| {
            if page == 0 || page > page_count {
                anyhow::bail!("page {page} is out of range (document has {page_count} pages)");
            }
            Ok(page - 1)
        })
        .collect()
}

/// Builds the permutation by dropping each wanted page into its slot.
fn page_order(wanted: &[u32], page_count: u32) -> Result<PageOrder> {
    let mut order = PageOrder::identity(page_count);
    if wanted.len() != order.len() {
        anyhow::bail!(
            "--order must list each of the {page_count} pages exactly once (got {})",
            wanted.len()
        );
    }

    for (slot, page) in wanted.iter().enumerate() {
        let from = order.as_slice()[slot..]
            .iter()
            .position(|candidate| candidate == page)
            .map(|offset| slot + offset)
            .with_context(|| format!("page {} appears more than once in --order", page + 1))?;
        order.apply(ReorderEvent::Drop { from, to: slot });
    }

    Ok(order)
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn default_thumbnail_output(file: &Path, page: u32) -> PathBuf {
    let stem = file.file_stem().and_then(|name| name.to_str()).unwrap_or("thumbnail");

    file.with_file_name(format!("{stem}-page-{page}.png"))
}
