//! # PixelGenius CLI
//!
//! Command-line interface for image generation and captioning.
//!
//! ## Usage
//!
//! ```bash
//! # Run the web interface
//! HUGGINGFACE_TOKEN=hf_xxx pixelgenius serve --listen 0.0.0.0:8080
//!
//! # Caption a picture
//! pixelgenius caption photo.jpg out.png --text "Hello world" --effect shadow
//!
//! # Generate one image per style and zip them
//! pixelgenius generate "a lighthouse at dusk" --zip images.zip
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info};

use pixelgenius::{
    AppConfig, PixelError, archive, canvas,
    compositor::{self, Color, PlacementPolicy, TextEffect, VerticalAnchor},
    config::TOKEN_ENV,
    filters::Adjustments,
    generate::{GenerationRequest, StyleChoice, run_batch},
    server,
};

/// PixelGenius - Image generation and captioning
#[derive(Parser, Debug)]
#[command(name = "pixelgenius")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,

        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Extra directory searched for named fonts (repeatable)
        #[arg(long, value_name = "DIR")]
        font_dir: Vec<PathBuf>,
    },

    /// Draw caption text onto an image
    Caption {
        /// Input image
        input: PathBuf,

        /// Output PNG
        output: PathBuf,

        /// Caption text
        #[arg(long)]
        text: String,

        /// Font: "builtin", a file path such as ./arial.ttf, or a face name found in font dirs
        #[arg(long, default_value = "builtin")]
        font: String,

        /// Pixel size (defaults to 5% of the image height)
        #[arg(long)]
        size: Option<u32>,

        /// Text color: a name or #rrggbb[aa]
        #[arg(long, default_value = "white")]
        color: Color,

        /// Effect: none, outline[:radius] or shadow
        #[arg(long, default_value = "outline")]
        effect: TextEffect,

        /// Vertical anchor: middle, below-middle[:fraction], lower-half or px:N
        #[arg(long, default_value = "middle")]
        anchor: VerticalAnchor,

        /// Extra directory searched for named fonts (repeatable)
        #[arg(long, value_name = "DIR")]
        font_dir: Vec<PathBuf>,
    },

    /// Generate images for a prompt
    Generate {
        /// Prompt text
        prompt: String,

        /// Style name or "all"
        #[arg(long, default_value = "realistic")]
        style: StyleChoice,

        /// Images per style (1-2)
        #[arg(long, default_value = "1")]
        count: u32,

        /// Brightness factor (0.5-2.0)
        #[arg(long, default_value = "1.0")]
        brightness: f32,

        /// Contrast factor (0.5-2.0)
        #[arg(long, default_value = "1.0")]
        contrast: f32,

        /// Sharpness factor (0.5-2.0)
        #[arg(long, default_value = "1.0")]
        sharpness: f32,

        /// Write all images into this zip file
        #[arg(long, value_name = "FILE", conflicts_with = "out_dir")]
        zip: Option<PathBuf>,

        /// Write one PNG per image into this directory
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        #[command(flatten)]
        endpoint: EndpointArgs,
    },
}

/// Inference endpoint options shared by `serve` and `generate`.
#[derive(clap::Args, Debug)]
struct EndpointArgs {
    /// Text-to-image endpoint URL
    #[arg(long, default_value = pixelgenius::inference::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// API token
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "120")]
    timeout: u64,
}

impl EndpointArgs {
    fn apply(self, config: AppConfig) -> AppConfig {
        AppConfig {
            endpoint: self.endpoint,
            token: self.token,
            timeout: Duration::from_secs(self.timeout),
            ..config
        }
    }
}

fn with_font_dirs(mut config: AppConfig, extra: Vec<PathBuf>) -> AppConfig {
    if !extra.is_empty() {
        let mut dirs = extra;
        dirs.append(&mut config.font_dirs);
        config.font_dirs = dirs;
    }
    config
}

/// One-line report printed after writing a captioned image.
fn caption_summary(output: &std::path::Path, result: &compositor::Composite) -> String {
    let lines = result.lines.len();
    format!(
        "Wrote {} ({} line{}{})",
        output.display(),
        lines,
        if lines == 1 { "" } else { "s" },
        if result.fallback.is_some() { ", built-in face" } else { "" }
    )
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn run() -> Result<(), PixelError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Serve {
            listen,
            endpoint,
            font_dir,
        } => {
            let config = AppConfig {
                listen_addr: listen,
                ..AppConfig::default()
            };
            let config = with_font_dirs(endpoint.apply(config), font_dir);
            let generator = config.generator()?;

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(config, Arc::new(generator)))
        }

        Commands::Caption {
            input,
            output,
            text,
            font,
            size,
            color,
            effect,
            anchor,
            font_dir,
        } => {
            let config = with_font_dirs(AppConfig::default(), font_dir);
            let bytes = std::fs::read(&input)?;
            let img = canvas::decode_image(&bytes)?;

            let size = size.unwrap_or_else(|| compositor::default_pixel_size(img.height()));
            let placement = PlacementPolicy::default()
                .with_fill(color)
                .with_effect(effect)
                .with_anchor(anchor);
            let font = config.font_spec(&font);
            // composite() already logs the fallback reason
            let result = compositor::composite(&img, &text, &font, size, &placement);

            let png = canvas::encode_png(&result.image)?;
            std::fs::write(&output, png)?;
            println!("{}", caption_summary(&output, &result));
            Ok(())
        }

        Commands::Generate {
            prompt,
            style,
            count,
            brightness,
            contrast,
            sharpness,
            zip,
            out_dir,
            endpoint,
        } => {
            let config = endpoint.apply(AppConfig::default());
            let generator = config.generator()?;
            let adjustments = Adjustments {
                brightness,
                contrast,
                sharpness,
            }
            .clamped();
            let request = GenerationRequest::new(prompt)
                .with_style(style)
                .with_count(count)
                .with_adjustments(adjustments);

            let runtime = tokio::runtime::Runtime::new()?;
            let outcome = runtime.block_on(run_batch(&generator, &request));

            for error in &outcome.errors {
                eprintln!("  {}", error);
            }
            if outcome.is_empty() {
                println!("No images were generated. Try another prompt or check API status.");
                return Ok(());
            }

            match zip {
                Some(path) => {
                    let bytes = archive::package(&outcome.images)?;
                    std::fs::write(&path, bytes)?;
                    info!(images = outcome.images.len(), "wrote archive");
                    println!("Wrote {}", path.display());
                }
                None => {
                    std::fs::create_dir_all(&out_dir)?;
                    let labels = outcome.images.iter().map(|(label, _)| label.as_str());
                    let names = archive::entry_names(labels);
                    for (name, (_, img)) in names.iter().zip(&outcome.images) {
                        let path = out_dir.join(name);
                        std::fs::write(&path, canvas::encode_png(img)?)?;
                        println!("Wrote {}", path.display());
                    }
                }
            }
            Ok(())
        }
    }
}
