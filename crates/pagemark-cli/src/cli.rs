// Imports
use crate::{inspect, replay, validators};
use anyhow::Context;
use clap::Parser;
use pagemark_compose::Viewport;
use pagemark_engine::EngineConfig;
use smol::fs::File;
use smol::io::{AsyncReadExt, AsyncWriteExt};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

///    pagemark-cli{n}{n}
///    Inspects and replays page annotation documents.
#[derive(clap::Parser, Debug, Clone)]
#[command(author, version, about, long_about = None, arg_required_else_help = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
    /// An engine config JSON file. The default config is used when it is not given.
    #[arg(short = 'c', long, global = true)]
    pub(crate) config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub(crate) enum Command {
    /// Imports the annotation document and prints the pixel bounding rect{n}
    /// of every live annotation in paint order.
    Inspect {
        /// The annotation document, a JSON array of annotation snapshots.
        doc: PathBuf,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Feeds a recorded pointer script through the engine{n}
    /// and writes the resulting annotations.
    Replay {
        /// The annotation document, a JSON array of annotation snapshots.
        doc: PathBuf,
        /// The recorded pointer script.
        #[arg(short = 'e', long)]
        events: PathBuf,
        /// The output file. The annotations are printed to stdout when it is not given.
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub(crate) struct PageArgs {
    /// The page size in pixels, as WIDTHxHEIGHT.
    #[arg(long, value_parser = validators::parse_page_size, default_value = "800x1000")]
    pub(crate) viewport: (f64, f64),
    /// The zoom scale of the page.
    #[arg(long, value_parser = validators::parse_scale, default_value_t = 1.0)]
    pub(crate) scale: f64,
}

impl PageArgs {
    pub(crate) fn viewport(&self) -> Viewport {
        let (width, height) = self.viewport;
        Viewport::new(width, height, self.scale)
    }
}

pub(crate) async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;

    match cli.command {
        Command::Inspect { doc, page } => {
            inspect::run_inspect(&doc, config, page.viewport()).await?;
        }
        Command::Replay {
            doc,
            events,
            output,
            page,
        } => {
            replay::run_replay(&doc, &events, output.as_deref(), config, page.viewport()).await?;
        }
    }

    Ok(())
}

async fn load_config(config_file: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(config_file) = config_file else {
        return Ok(EngineConfig::default());
    };
    validators::file_has_ext(config_file, "json")?;
    let json = read_string_from_file(config_file).await?;
    EngineConfig::load_from_json(&json).with_context(|| {
        format!(
            "Failed to load engine config from file \"{}\".",
            config_file.display()
        )
    })
}

pub(crate) async fn read_string_from_file(file_path: impl AsRef<Path>) -> anyhow::Result<String> {
    let mut contents = String::new();
    let mut fh = File::open(&file_path).await.with_context(|| {
        format!("Failed to open file \"{}\".", file_path.as_ref().display())
    })?;
    fh.read_to_string(&mut contents).await?;
    Ok(contents)
}

pub(crate) async fn create_overwrite_file_w_bytes(
    output_file: impl AsRef<Path>,
    bytes: &[u8],
) -> anyhow::Result<()> {
    let mut fh = File::create(&output_file).await.with_context(|| {
        format!(
            "Failed to create output file \"{}\".",
            output_file.as_ref().display()
        )
    })?;
    fh.write_all(bytes).await?;
    fh.sync_all().await?;
    Ok(())
}
