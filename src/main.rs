use clap::Parser;
use eyre::WrapErr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, trace, Level};
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vitaelib::{RenderConfig, ResumeRenderer, Settings, ThemePaths};

#[derive(clap::Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Theme directory; the bundled theme is used when omitted
    #[clap(long, env = "VITAE_THEME")]
    theme_dir: Option<PathBuf>,

    /// Icon stylesheet, relative to the theme directory
    #[clap(long, env = "VITAE_ICONS")]
    icons: Option<PathBuf>,

    #[clap(long, default_value = "vitae.toml", env = "VITAE_SETTINGS")]
    settings: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Render a resume JSON document to HTML
    Render(RenderOptions),
    /// Print the effective settings as TOML
    Settings,
}

#[derive(clap::Args, Debug)]
struct RenderOptions {
    resume: PathBuf,

    /// Output file; HTML is written to stdout when omitted
    #[clap(short, long, env = "VITAE_OUTPUT")]
    output: Option<PathBuf>,

    /// Convert markdown in text fields to HTML
    #[clap(long)]
    markdown: bool,

    /// Inline profile images as base64 data URIs
    #[clap(long)]
    process_images: bool,

    /// Resolve deferred values on a multi-threaded runtime
    #[clap(long = "async")]
    use_async: bool,
}

fn main() -> Result<(), eyre::Report> {
    dotenv::dotenv().ok();
    color_eyre::install()?;

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vitae=info,vitaelib=warn"));
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_line_number(true)
        .with_env_filter(filter)
        // stdout carries the rendered HTML
        .with_writer(std::io::stderr)
        .finish()
        .with(ErrorLayer::default());

    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&args.settings)?;

    match args.command {
        Command::Render(opt) => {
            let mut config = config;
            if opt.markdown {
                config = config.enable_markdown_support();
            }
            if opt.process_images {
                config = config.enable_image_processing();
            }

            let mut paths = match &args.theme_dir {
                Some(dir) => ThemePaths::new(dir),
                None => ThemePaths::bundled(),
            };
            if let Some(icons) = &args.icons {
                paths = paths.with_icon_stylesheet(icons);
            }
            trace!(theme = %paths.root().display(), "using theme");

            let resume = read_resume(&opt.resume)?;
            let renderer = ResumeRenderer::new(Arc::new(paths), config);

            let html = if opt.use_async {
                let rt = tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()?;
                rt.block_on(renderer.render_async(&resume))?
            } else {
                renderer.render(&resume)?
            };

            match opt.output {
                Some(path) => {
                    std::fs::write(&path, html).wrap_err_with(|| {
                        format!("Failed to write output to '{}'", path.display())
                    })?;
                    info!(output = %path.display(), "resume rendered");
                }
                None => println!("{html}"),
            }
        }
        Command::Settings => {
            print!("{}", Settings::from(&config).to_toml_string()?);
        }
    }

    Ok(())
}

/// Settings file first, then the environment. A missing settings file is not an error.
fn load_config(settings: &Path) -> eyre::Result<RenderConfig> {
    let config = if settings.exists() {
        Settings::from_file(settings)?.into_config()
    } else {
        trace!(path = %settings.display(), "no settings file, using defaults");
        RenderConfig::default()
    };
    Ok(config.apply_env())
}

fn read_resume(path: &Path) -> eyre::Result<serde_json::Value> {
    let raw = vitaelib::util::read_to_string(path)?;
    serde_json::from_str(&raw)
        .wrap_err_with(|| format!("Failed to parse resume '{}'", path.display()))
}
