use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use text_portrait::{
    DetectOptions, FontdueFace, MaskFile, ModelFidelity, RenderTarget, Session, StyleParams,
};

#[derive(Parser, Debug)]
#[command(name = "text-portrait", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the full text-portrait export as a PNG.
    Render(RenderArgs),
    /// Write the dimmed-background preview as a PNG.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Source photo. Falls back to the content config's default image.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Font file (ttf/otf) used for the text mask.
    #[arg(long)]
    font: PathBuf,

    /// Precomputed segmentation mask raster; enables background dimming.
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Portrait text. Falls back to --text-file, then the content config.
    #[arg(long)]
    text: Option<String>,

    /// Read the portrait text from a file.
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// Content config JSON with optional default_text / default_image_url.
    #[arg(long)]
    content: Option<PathBuf>,

    /// Nominal export width in px (device size is this times the 2x scale).
    #[arg(long, default_value_t = 540)]
    width: u32,

    /// Nominal export height in px.
    #[arg(long, default_value_t = 675)]
    height: u32,

    #[arg(long, default_value_t = 16.0)]
    font_size: f32,

    #[arg(long, default_value_t = 400)]
    font_weight: u16,

    #[arg(long, default_value_t = 0.0)]
    letter_spacing: f32,

    /// Line height in px; defaults to font size x 0.65.
    #[arg(long)]
    line_height: Option<f32>,

    /// CSS-style filter chain, e.g. "grayscale(1) contrast(1.2)".
    #[arg(long)]
    filter: Option<String>,

    /// Background dimming factor in [0, 1]; effective once a mask is set.
    #[arg(long, default_value_t = 0.5)]
    dimness: f32,

    #[arg(long, value_enum, default_value_t = FidelityChoice::Balanced)]
    fidelity: FidelityChoice,

    /// Segmentation timeout budget in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Output PNG path.
    #[arg(long, default_value = text_portrait::EXPORT_FILENAME)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Source photo.
    #[arg(long)]
    image: PathBuf,

    /// Precomputed segmentation mask raster.
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Background dimming factor in [0, 1].
    #[arg(long, default_value_t = 0.5)]
    dimness: f32,

    /// Output PNG path.
    #[arg(long, default_value = "preview.png")]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FidelityChoice {
    Fast,
    Balanced,
    Accurate,
}

impl From<FidelityChoice> for ModelFidelity {
    fn from(choice: FidelityChoice) -> Self {
        match choice {
            FidelityChoice::Fast => ModelFidelity::Fast,
            FidelityChoice::Balanced => ModelFidelity::Balanced,
            FidelityChoice::Accurate => ModelFidelity::Accurate,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn read_bytes(path: &Path, what: &str) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read {what} '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let content = match &args.content {
        Some(path) => Some(text_portrait::load_content_config(path)?),
        None => None,
    };

    let mut session = match &content {
        Some(config) => Session::with_content(config),
        None => Session::new(),
    };

    let image_path = args
        .image
        .clone()
        .or_else(|| {
            content
                .as_ref()
                .and_then(|c| c.default_image_url.clone())
                .map(PathBuf::from)
        })
        .context("no source image: pass --image or a content config with default_image_url")?;
    session.load_image(read_bytes(&image_path, "image")?)?;

    session.set_style(StyleParams {
        font_size_px: args.font_size,
        font_weight: args.font_weight,
        letter_spacing_px: args.letter_spacing,
        line_height_px: args.line_height,
        filter: args.filter.clone(),
        dimness: args.dimness,
    })?;

    if let Some(text) = args.text {
        session.set_text(text);
    } else if let Some(path) = &args.text_file {
        session.set_text(String::from_utf8_lossy(&read_bytes(path, "text file")?).into_owned());
    }

    if let Some(mask_path) = &args.mask {
        let mut provider = MaskFile::new(mask_path);
        let opts = DetectOptions {
            fidelity: args.fidelity.into(),
            timeout: Duration::from_secs(args.timeout_secs),
        };
        session.detect(&mut provider, &opts)?;
    }

    let face = FontdueFace::from_bytes(&read_bytes(&args.font, "font")?)?;
    let target = RenderTarget::new(args.width, args.height);

    let report = text_portrait::export(&mut session, &face, &target);
    let Some(output) = report.output else {
        anyhow::bail!(report.status);
    };

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &output.png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {} ({})", args.out.display(), report.status);
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let mut session = Session::new();
    session.load_image(read_bytes(&args.image, "image")?)?;
    session.set_dimness(args.dimness)?;

    if let Some(mask_path) = &args.mask {
        let mut provider = MaskFile::new(mask_path);
        session.detect(&mut provider, &DetectOptions::default())?;
    }

    let png = session
        .background_png()
        .context("no background committed")?
        .to_vec();
    std::fs::write(&args.out, png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
