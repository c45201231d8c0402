/// Blueprint viewer for the terminal
///
/// Loads the metadata of one converted blueprint and shows it as a colored, slowly rotating
/// solid with its dimensions label.
/// Controls:
///   - 1-4 / V: Top, front, right, left view / cycle views
///   - C / N: Cycle colors / reset to the default color
///   - WASD / Arrow Keys: Orbit the camera
///   - Space: Toggle auto-rotation
///   - X / B / O: Export ASCII STL, binary STL, OBJ
///   - Q/ESC: Quit
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use bpv_core::{ColorSpec, Credential, ViewName, ViewerConfig};
use bpv_terminal::{AppOptions, HttpBlueprintClient, TerminalApp};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bpv-terminal", version, about = "Show a converted blueprint in the terminal")]
struct Args {
    /// Blueprint identifier
    id: String,

    /// Base URL of the blueprint API
    #[arg(long)]
    api_url: Option<String>,

    /// Bearer token for the API
    #[arg(long, env = "BPV_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Initial view: top, front, right or left
    #[arg(long)]
    view: Option<ViewName>,

    /// Solid color as hex (#rrggbb) or "none"; overrides the blueprint's stored color
    #[arg(long)]
    color: Option<String>,

    /// JSON viewer configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Write logs to this file; the terminal itself is taken by the renderer
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Directory for STL/OBJ exports
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false);

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let mut config = match &args.config {
        Some(path) => ViewerConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(url) = args.api_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }

    let mut viewer = TerminalApp::viewer(&config).with_blueprint(args.id.as_str());
    if let Some(token) = args.token {
        viewer = viewer.with_credential(Credential::bearer(token));
    }

    let options = AppOptions {
        fps: args.fps,
        export_dir: args.export_dir,
        color: args.color.map(ColorSpec::from),
        view: args.view,
    };

    tracing::info!(blueprint = %args.id, api = %config.api_base_url, "starting terminal viewer");
    let client =
        HttpBlueprintClient::new(Duration::from_secs(10)).context("failed to build HTTP client")?;
    let mut app = TerminalApp::new(&config, viewer, client, options);
    app.run()?;

    Ok(())
}
