/// Example: Show a blueprint record stored on disk instead of fetching it from the API
///
/// Usage: cargo run --example local_blueprint -- path/to/blueprint.json
///
/// The file has the shape the API serves, e.g.
/// `{"dimensions": "{\"x\": 12, \"y\": 4, \"z\": 8}", "color": "#ff8800"}`
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use bpv_core::{BlueprintClient, Credential, FetchError, ViewerConfig};
use bpv_terminal::{AppOptions, TerminalApp};

/// Serves every request from one local file
struct FileClient(Option<PathBuf>);

impl BlueprintClient for FileClient {
    fn get_blueprint(&self, _url: &str, _credential: Option<&Credential>) -> Result<String, FetchError> {
        match &self.0 {
            Some(path) => fs::read_to_string(path).map_err(|err| FetchError::Transport(err.to_string())),
            None => Ok("{}".to_string()),
        }
    }
}

fn main() -> Result<()> {
    let path = env::args().nth(1).map(PathBuf::from);
    if path.is_none() {
        eprintln!("No blueprint file provided, showing the default solid...");
    }

    let config = ViewerConfig::default();
    let viewer = TerminalApp::viewer(&config).with_blueprint("local");
    let mut app = TerminalApp::new(&config, viewer, FileClient(path), AppOptions::default());
    app.run()
}
