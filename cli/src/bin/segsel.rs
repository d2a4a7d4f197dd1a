use clap::{Parser, Subcommand};
use cli::{run_session, score_files};
use color_eyre::eyre::{Result, WrapErr};
use mask_select::{ImageInput, PerimeterMethod, Segmenter, SegmenterConfig};
use sam2::{Sam2Bridge, Sam2Process};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract masks from an image, largest regions first
    Segment {
        /// Path to the input image
        #[arg(short, long)]
        image: PathBuf,
        /// SAM2 runner script
        #[arg(short, long)]
        script: PathBuf,
        /// Run the script through `uv run` with this uv executable
        #[arg(long)]
        uv: Option<PathBuf>,
        /// Session configuration (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory for the refined mask PNGs and report.json
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Stop after this many masks
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Score mask images and report the one the selector would pick
    Score {
        /// Mask images (non-zero pixels are covered)
        #[arg(required = true)]
        masks: Vec<PathBuf>,
        /// Model confidence of each mask, in the same order
        #[arg(long, value_delimiter = ',')]
        confidences: Vec<f32>,
        /// Session configuration (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the configured perimeter estimator
        #[arg(long)]
        perimeter: Option<PerimeterMethod>,
    },
    /// Print the JSON schema of the session configuration
    Schema,
}

fn load_config(path: Option<&Path>) -> Result<SegmenterConfig> {
    match path {
        Some(path) => SegmenterConfig::from_file(path)
            .wrap_err_with(|| format!("failed to load config {}", path.display())),
        None => Ok(SegmenterConfig::default()),
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Segment {
            image,
            script,
            uv,
            config,
            output_dir,
            limit,
        } => {
            let config = load_config(config.as_deref())?;
            let image = ImageInput::open(&image)
                .wrap_err_with(|| format!("failed to read image {}", image.display()))?;

            let process = Sam2Process::new(script, uv);
            let mut generator = Sam2Bridge::new(process.clone())?;
            let predictor = Sam2Bridge::new(process)?;

            let mut session = Segmenter::new(image, &mut generator, predictor, &config)?;
            info!(kept = session.inventory().len(), "session ready");

            let report = run_session(&mut session, &output_dir, limit)?;
            let report_path = output_dir.join("report.json");
            report.to_json_file(&report_path)?;
            info!(
                masks = report.masks.len(),
                report = %report_path.display(),
                "segmentation finished"
            );
        }
        Commands::Score {
            masks,
            confidences,
            config,
            perimeter,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(perimeter) = perimeter {
                config.perimeter = perimeter;
            }

            let report = score_files(&masks, &confidences, &config.scorer())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&SegmenterConfig::schema())?);
        }
    }

    Ok(())
}
