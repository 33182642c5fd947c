use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pagedeck::{
    default_rasterizer, BlankRasterizer, CompressionPreset, DirectorySink, DocumentSession,
    ExportFormat, HttpUsageRecorder, HyperlinkService, PageId, PageRasterizer, PipelineConfig,
    Preview, ProgressBar, ProgressUpdate, RotateDirection, SourceFile, StrategyKind,
};
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pagedeck",
    about = "Merge, rotate, compress and export PDF pages and images",
    version,
    author
)]
struct Cli {
    /// Pipeline configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Skip pdfium and render blank pages of the right size
    #[arg(long, global = true)]
    no_render: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Page edits applied before the operation runs.
///
/// Page numbers are 1-based and refer to the order the pages were loaded
/// in, whatever earlier edits did.
#[derive(Args, Debug, Default)]
struct PageEdits {
    /// Move page FROM to where page TO is (e.g. "4:1")
    #[arg(long = "move", value_name = "FROM:TO", value_parser = parse_move)]
    moves: Vec<(usize, usize)>,

    /// Rotate a page a quarter turn (e.g. "2:right"); repeat to turn further
    #[arg(long = "rotate", value_name = "PAGE:left|right", value_parser = parse_rotation)]
    rotations: Vec<(usize, RotateDirection)>,

    /// Remove a page
    #[arg(long = "delete", value_name = "PAGE", value_parser = parse_page)]
    deletions: Vec<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the pages the inputs would contribute
    Info {
        /// Input PDFs and images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Merge the inputs into one PDF
    Merge {
        /// Input PDFs and images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        edits: PageEdits,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Base name of the result (defaults to the first input's name plus a timestamp)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Merge the inputs and compress the result
    Compress {
        /// Input PDFs and images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        edits: PageEdits,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Base name of the result
        #[arg(short, long)]
        name: Option<String>,

        /// Compression strategy: raster or server
        #[arg(short, long, value_parser = parse_with::<StrategyKind>)]
        strategy: Option<StrategyKind>,

        /// Raster preset: high, medium or low
        #[arg(short, long, value_parser = parse_with::<CompressionPreset>)]
        preset: Option<CompressionPreset>,

        /// Compression endpoint for the server strategy
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Also write the uncompressed merged document
        #[arg(long)]
        keep_merged: bool,
    },

    /// Export every page as an image in a ZIP archive
    Export {
        /// Input PDFs and images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        edits: PageEdits,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Image format: jpg or png
        #[arg(short, long, default_value = "jpg", value_parser = parse_with::<ExportFormat>)]
        format: ExportFormat,
    },
}

fn parse_with<T>(s: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    s.parse().map_err(|e: T::Err| e.to_string())
}

fn parse_page(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("page numbers start at 1".to_string()),
        Ok(page) => Ok(page),
        Err(_) => Err(format!("invalid page number '{s}'")),
    }
}

fn parse_move(s: &str) -> Result<(usize, usize), String> {
    let (from, to) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FROM:TO, got '{s}'"))?;
    Ok((parse_page(from)?, parse_page(to)?))
}

fn parse_rotation(s: &str) -> Result<(usize, RotateDirection), String> {
    let (page, direction) = s
        .split_once(':')
        .ok_or_else(|| format!("expected PAGE:left|right, got '{s}'"))?;
    let direction = direction
        .parse::<RotateDirection>()
        .map_err(|e| e.to_string())?;
    Ok((parse_page(page)?, direction))
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

fn open_session(cli_config: PipelineConfig, no_render: bool) -> Result<DocumentSession> {
    let rasterizer: Box<dyn PageRasterizer> = if no_render {
        Box::new(BlankRasterizer)
    } else {
        default_rasterizer()
    };
    debug!("Rendering with {}", rasterizer.name());

    let usage_url = cli_config.usage_url.clone();
    let hyperlink_url = cli_config.hyperlink_url.clone();
    let mut session = DocumentSession::new(cli_config, rasterizer);
    if let Some(url) = usage_url {
        session.set_usage_recorder(Box::new(HttpUsageRecorder::new(url)?));
    }
    if let Some(url) = hyperlink_url {
        session.set_post_processor(Box::new(HyperlinkService::new(url)?));
    }
    Ok(session)
}

fn print_progress(update: &ProgressUpdate) {
    let bar = ProgressBar::default();
    eprint!("\r{:<80}", bar.render(update));
    if update.is_complete() {
        eprintln!();
    }
}

fn load_inputs(session: &mut DocumentSession, inputs: &[PathBuf]) -> Result<()> {
    let files = inputs
        .iter()
        .map(|path| {
            SourceFile::from_path(path).with_context(|| format!("failed to read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let added = session.add_files(files, &print_progress)?;
    if added == 0 {
        bail!("none of the inputs is a PDF or a supported image");
    }
    Ok(())
}

fn page_at(initial: &[PageId], page: usize) -> Result<&PageId> {
    initial
        .get(page - 1)
        .with_context(|| format!("page {page} does not exist ({} pages loaded)", initial.len()))
}

fn apply_edits(session: &mut DocumentSession, edits: &PageEdits) -> Result<()> {
    let initial = session.page_order();

    for &(page, direction) in &edits.rotations {
        let angle = session.rotate(page_at(&initial, page)?, direction)?;
        debug!("Page {} now at {}°", page, angle.to_degrees());
    }
    for &(from, to) in &edits.moves {
        session.reorder(page_at(&initial, from)?, page_at(&initial, to)?)?;
    }
    for &page in &edits.deletions {
        if !session.delete(page_at(&initial, page)?) {
            warn!("Page {} was already deleted", page);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "pagedeck=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info { inputs } => {
            let mut session = open_session(config, cli.no_render)?;
            load_inputs(&mut session, &inputs)?;

            println!("{} pages", session.len());
            println!("==========================================");
            for (position, page) in session.pages().iter().enumerate() {
                let preview = match &page.preview {
                    Preview::Rendered { width, height, .. } => format!("{width}x{height} px preview"),
                    Preview::Object(url) => url.to_string(),
                };
                println!(
                    "{:>3}. {} page {} ({})",
                    position + 1,
                    page.source.name,
                    page.page_index + 1,
                    preview
                );
            }
        }

        Commands::Merge {
            inputs,
            edits,
            output,
            name,
        } => {
            let mut session = open_session(config, cli.no_render)?;
            load_inputs(&mut session, &inputs)?;
            apply_edits(&mut session, &edits)?;
            if let Some(name) = name {
                session.set_output_name(name);
            }

            let merged = session.merge(&print_progress)?;
            let size = merged.size_bytes;
            let mut sink = DirectorySink::new(&output);
            session.download_merged(&mut sink)?;

            for path in sink.written() {
                println!("✓ Merged {} pages into {} ({} bytes)", session.len(), path.display(), size);
            }
        }

        Commands::Compress {
            inputs,
            edits,
            output,
            name,
            strategy,
            preset,
            endpoint,
            keep_merged,
        } => {
            if let Some(strategy) = strategy {
                config.compression.strategy = strategy;
            }
            if let Some(preset) = preset {
                config.compression.preset = preset;
            }
            if let Some(endpoint) = endpoint {
                config.compression.endpoint = endpoint;
            }
            config.validate()?;

            let mut session = open_session(config, cli.no_render)?;
            load_inputs(&mut session, &inputs)?;
            apply_edits(&mut session, &edits)?;
            if let Some(name) = name {
                session.set_output_name(name);
            }

            let report = session.compress(&print_progress)?.report;
            let mut sink = DirectorySink::new(&output);
            if keep_merged {
                session.download_merged(&mut sink)?;
            }
            session.download_compressed(&mut sink)?;

            for path in sink.written() {
                println!("✓ Wrote {}", path.display());
            }
            println!("{report}");
        }

        Commands::Export {
            inputs,
            edits,
            output,
            format,
        } => {
            let mut session = open_session(config, cli.no_render)?;
            load_inputs(&mut session, &inputs)?;
            apply_edits(&mut session, &edits)?;

            let mut sink = DirectorySink::new(&output);
            let summary = session.export_images(format, &mut sink, &print_progress)?;

            for path in sink.written() {
                println!(
                    "✓ Exported {} pages as {} to {}",
                    summary.entries.len(),
                    format,
                    path.display()
                );
            }
        }
    }

    Ok(())
}
