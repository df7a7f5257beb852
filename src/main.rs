//! Tiled watermarks from the command line.
//!
//! `tilemark stamp` draws a watermark over an image, `tilemark render`
//! writes the transparent layer alone, and `tilemark preview` opens a live
//! terminal preview.

use std::io::{self, stderr, Stderr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

use tilemark::app::input::{spawn_event_reader, AppEvent};
use tilemark::app::preview::{handle_key, PreviewState};
use tilemark::render::fonts::FontBook;
use tilemark::ui::{layout::AppLayout, preview::PreviewWidget, theme::Theme};
use tilemark::{Bitmap, Content, ImageInfo, Options, RasterSurface, Size, Watermark, WatermarkConfig};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Tiled text/image watermarks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draw the watermark over an image file.
    Stamp {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        content: ContentArgs,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// Write the transparent watermark layer alone.
    Render {
        #[arg(short = 'W', long)]
        width: u32,
        #[arg(short = 'H', long)]
        height: u32,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        content: ContentArgs,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// Open a live terminal preview.
    Preview {
        #[command(flatten)]
        content: ContentArgs,
        #[command(flatten)]
        style: StyleArgs,
    },
}

#[derive(Args, Debug)]
struct ContentArgs {
    /// Text to tile.
    #[arg(long, conflicts_with = "image", default_value = "CONFIDENTIAL")]
    text: String,

    /// Image file to tile instead of text.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Drawn tile width for `--image` (defaults to the image's own).
    #[arg(long, requires = "image")]
    image_width: Option<f32>,

    #[arg(long, requires = "image")]
    image_height: Option<f32>,
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// Tile rotation in degrees.
    #[arg(long, allow_hyphen_values = true)]
    rotate: Option<f32>,

    /// CSS font shorthand, e.g. "bold 24px Noto Sans".
    #[arg(long)]
    font: Option<String>,

    #[arg(long)]
    color: Option<String>,

    #[arg(long)]
    x_gap: Option<f32>,

    #[arg(long)]
    y_gap: Option<f32>,

    /// Pass opacity for `--image`.
    #[arg(long)]
    opacity: Option<f32>,

    /// Render at 2× density.
    #[arg(long)]
    hd: bool,

    /// Extra font directory (repeatable).
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,

    /// Persist these options as the new defaults.
    #[arg(long)]
    save_config: bool,
}

impl StyleArgs {
    fn apply(&self, config: &mut WatermarkConfig) {
        if let Some(v) = self.rotate {
            config.rotate = v;
        }
        if let Some(ref v) = self.font {
            config.font = v.clone();
        }
        if let Some(ref v) = self.color {
            config.color = v.clone();
        }
        if let Some(v) = self.x_gap {
            config.x_gap = v;
        }
        if let Some(v) = self.y_gap {
            config.y_gap = v;
        }
        if let Some(v) = self.opacity {
            config.opacity = v;
        }
        config.high_density |= self.hd;
        config.font_dirs.extend(self.font_dirs.iter().cloned());
    }
}

/// Merge config, flags and content into watermark options plus a font book.
fn build_options(content: &ContentArgs, style: &StyleArgs) -> Result<(Options, FontBook)> {
    let mut config = WatermarkConfig::load();
    style.apply(&mut config);
    if style.save_config {
        config.save().context("failed to save config")?;
    }

    let options = match content.image {
        Some(ref path) => {
            let bitmap = Bitmap::open(path)
                .with_context(|| format!("failed to open image {}", path.display()))?;
            config.options(Content::Bitmap(bitmap)).image_info(ImageInfo {
                width: content.image_width.unwrap_or(0.0),
                height: content.image_height.unwrap_or(0.0),
                opacity: Some(config.opacity),
            })
        }
        None => config.options(Content::Text(content.text.clone())),
    };
    Ok((options, FontBook::new(config.font_dirs)))
}

// ───────────────────────────────────────── stamp / render ───

fn render_layer(width: u32, height: u32, options: Options, fonts: FontBook) -> Result<RasterSurface> {
    if width == 0 || height == 0 {
        bail!("surface must be at least 1x1 (got {width}x{height})");
    }
    let surface = RasterSurface::with_fonts(Size::new(width as f32, height as f32), fonts);
    let watermark = Watermark::new(surface, options).context("failed to create watermark")?;
    Ok(watermark.into_surface())
}

fn stamp(input: &Path, output: &Path, options: Options, fonts: FontBook) -> Result<()> {
    let mut base = image::open(input)
        .with_context(|| format!("failed to open {}", input.display()))?
        .to_rgba8();
    let (width, height) = base.dimensions();

    let mut layer = render_layer(width, height, options, fonts)?.to_image();
    if layer.dimensions() != (width, height) {
        // High-density layers come back at 2×.
        layer = imageops::resize(&layer, width, height, FilterType::Lanczos3);
    }
    imageops::overlay(&mut base, &layer, 0, 0);

    let stamped = DynamicImage::ImageRgba8(base);
    let written = match ImageFormat::from_path(output) {
        // JPEG has no alpha channel.
        Ok(ImageFormat::Jpeg) => stamped.to_rgb8().save(output),
        _ => stamped.save(output),
    };
    written.with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!("stamped {} -> {}", input.display(), output.display());
    Ok(())
}

// ───────────────────────────────────────── preview ──────────

type Tui = Terminal<CrosstermBackend<Stderr>>;

fn terminal_area(terminal: &Tui) -> Result<Rect> {
    let size = terminal.size()?;
    Ok(Rect::new(0, 0, size.width, size.height))
}

async fn run_preview(terminal: &mut Tui, options: Options, fonts: FontBook) -> Result<()> {
    let layout = AppLayout::from_area(terminal_area(terminal)?);
    let snapshot_dir = std::env::current_dir()?;
    let mut state = PreviewState::new(options, fonts, layout.preview_inner(), snapshot_dir)
        .context("failed to create watermark")?;
    let mut events = spawn_event_reader(Duration::from_millis(250));

    loop {
        let layout = AppLayout::from_area(terminal_area(terminal)?);
        state.set_area(layout.preview_inner())?;

        let layer = state.image();
        let status = state
            .status_message
            .clone()
            .unwrap_or_else(|| state.status_line());
        terminal.draw(|frame| {
            let block = Block::default()
                .title(" tilemark ")
                .title_style(Theme::title_style())
                .borders(Borders::ALL)
                .border_style(Theme::border_style());
            frame.render_widget(PreviewWidget::new(&layer).block(block), layout.preview_area);
            frame.render_widget(
                Paragraph::new(status).style(Theme::status_bar_style()),
                layout.status_area,
            );
        })?;

        let Some(event) = events.recv().await else {
            break;
        };
        match event {
            AppEvent::Key(k) => handle_key(&mut state, k)?,
            // The next iteration picks the new size up from the terminal.
            AppEvent::Resize(_, _) => {}
            AppEvent::Tick => continue,
        }

        if state.should_quit {
            break;
        }
    }
    Ok(())
}

async fn preview(options: Options, fonts: FontBook) -> Result<()> {
    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    execute!(stderr(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stderr()))?;

    let result = run_preview(&mut terminal, options, fonts).await;

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr) // never pollute stdout
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Stamp {
            input,
            output,
            content,
            style,
        } => {
            let (options, fonts) = build_options(&content, &style)?;
            stamp(&input, &output, options, fonts)
        }
        Command::Render {
            width,
            height,
            output,
            content,
            style,
        } => {
            let (options, fonts) = build_options(&content, &style)?;
            render_layer(width, height, options, fonts)?
                .save_png(&output)
                .with_context(|| format!("failed to write {}", output.display()))
        }
        Command::Preview { content, style } => {
            let (options, fonts) = build_options(&content, &style)?;
            preview(options, fonts).await
        }
    }
}
