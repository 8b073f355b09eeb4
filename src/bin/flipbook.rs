use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "flipbook", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print page count and page sizes of a PDF.
    Info(InfoArgs),
    /// Embed a GIF into one page of a PDF.
    Embed(EmbedArgs),
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input PDF.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct EmbedArgs {
    /// Input PDF.
    #[arg(long)]
    pdf: PathBuf,

    /// GIF to embed (with --no-animated only its first frame is used).
    #[arg(long)]
    gif: PathBuf,

    /// Target page (0-based).
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Placement rectangle on the preview canvas, top-left origin.
    #[arg(long, default_value_t = 100.0)]
    x: f64,
    #[arg(long, default_value_t = 100.0)]
    y: f64,
    #[arg(long, default_value_t = 200.0)]
    width: f64,
    #[arg(long, default_value_t = 150.0)]
    height: f64,

    /// Preview canvas size the rectangle is expressed in.
    #[arg(long, default_value_t = 600.0)]
    canvas_width: f64,
    #[arg(long, default_value_t = 800.0)]
    canvas_height: f64,

    /// Text grid resolution (one of 40x20, 60x30, 80x40, 100x50).
    #[arg(long, default_value = "60x30")]
    grid: flipbook::GridSize,

    /// Animation mode.
    #[arg(long, value_enum, default_value = "scripted")]
    mode: ModeChoice,

    /// Frame-advance interval in milliseconds (scripted mode).
    #[arg(long, default_value_t = 120)]
    interval: u32,

    /// Start the animation when the document opens instead of via a button.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    autoplay: bool,

    /// Disable the animated decoder; always take the single-frame path.
    #[arg(long, default_value_t = false)]
    no_animated: bool,

    /// Output PDF path. Defaults to animated_<timestamp>.pdf.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeChoice {
    Scripted,
    StaticButton,
}

impl From<ModeChoice> for flipbook::AnimationMode {
    fn from(choice: ModeChoice) -> Self {
        match choice {
            ModeChoice::Scripted => flipbook::AnimationMode::Scripted,
            ModeChoice::StaticButton => flipbook::AnimationMode::StaticButton,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Embed(args) => cmd_embed(args),
    }
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read '{}'", args.in_path.display()))?;
    let source = flipbook::SourceDocument::from_bytes(&bytes)?;

    println!("pages: {}", source.page_count());
    for index in 0..source.page_count() {
        let size = source.page_size(index)?;
        println!(
            "  page {index}: {:.1} x {:.1} pts",
            size.width_pts, size.height_pts
        );
    }
    Ok(())
}

fn cmd_embed(args: EmbedArgs) -> anyhow::Result<()> {
    let pdf_bytes =
        std::fs::read(&args.pdf).with_context(|| format!("read '{}'", args.pdf.display()))?;
    let gif_bytes =
        std::fs::read(&args.gif).with_context(|| format!("read '{}'", args.gif.display()))?;

    let source = flipbook::SourceDocument::from_bytes(&pdf_bytes)?;
    let canvas = flipbook::Canvas::new(args.canvas_width, args.canvas_height)?;

    let mut session = flipbook::Session::new();
    session.document_loaded();
    session.select_page(args.page, source.page_count())?;
    session.set_rect(
        flipbook::Rect::new(args.x, args.y, args.width, args.height),
        canvas,
    )?;

    let opts = flipbook::PipelineOptions {
        extract: flipbook::ExtractOptions {
            animated: !args.no_animated,
            ..flipbook::ExtractOptions::default()
        },
        compose: flipbook::ComposeOptions {
            mode: args.mode.into(),
            autoplay: args.autoplay,
            interval_ms: args.interval,
            grid: args.grid,
        },
    };

    let bytes = flipbook::run_pipeline(&mut session, &source, &gif_bytes, canvas, &opts)?;

    let out_path = args.out.unwrap_or_else(default_out_path);
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&out_path, &bytes)
        .with_context(|| format!("write '{}'", out_path.display()))?;

    eprintln!("wrote {}", out_path.display());
    Ok(())
}

fn default_out_path() -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Path::new(&format!("animated_{stamp}.pdf")).to_path_buf()
}
