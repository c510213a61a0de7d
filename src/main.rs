use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use promptcloud::render::{DEFAULT_PALETTE, Shape};
use promptcloud::{AppState, RenderConfig, settings};

#[derive(Parser, Debug)]
#[command(
    name = "promptcloud",
    version,
    about = "Word clouds from generated text, pasted text or uploaded files"
)]
struct Cli {
    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings", global = true)]
    read_settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve(ServeArgs),
    /// Render text from stdin to a PNG file
    Render(RenderArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Bind address (overrides [server] addr)
    #[arg(long = "addr")]
    addr: Option<String>,

    /// Serve a built front end from this directory
    #[arg(long = "static-dir")]
    static_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Canvas shape
    #[arg(long = "shape", value_enum, default_value_t = Shape::Rectangle)]
    shape: Shape,

    /// Color palette name (e.g. viridis, Blues, plasma_r)
    #[arg(long = "palette", default_value = DEFAULT_PALETTE)]
    palette: String,

    /// Comma separated words to leave out
    #[arg(long = "exclude")]
    exclude: Option<String>,

    /// Output PNG path
    #[arg(short = 'o', long = "output", default_value = "wordcloud.png")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    promptcloud::logging::init(cli.verbose)?;
    let mut settings = settings::load_settings(cli.read_settings.as_deref())?;

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => {
            if let Some(addr) = args.addr {
                settings.server_addr = addr;
            }
            if let Some(dir) = args.static_dir {
                settings.static_dir = Some(dir);
            }
            let addr = settings.server_addr.clone();
            let state = AppState::from_settings(settings)?;
            promptcloud::run_server(state, &addr).await
        }
        Command::Render(args) => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .with_context(|| "failed to read stdin")?;
            let config = RenderConfig {
                shape: args.shape,
                color_palette: args.palette,
                exclude_words: args.exclude,
            };
            let png = promptcloud::render_png(&input, &config, &settings)?;
            write_output(&args.output, &png)?;
            info!("wrote {} ({} bytes)", args.output.display(), png.len());
            Ok(())
        }
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output dir: {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
