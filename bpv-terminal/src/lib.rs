/// Terminal host for the blueprint viewer
use anyhow::{Context, Result};
use bpv_core::export::write_scene_file;
use bpv_core::{
    BlueprintClient, ColorSpec, ExportFormat, FetchOutcome, FrameQueue, StaticFont, Typeface, ViewName, Viewer,
    ViewerConfig,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub mod client;
pub mod renderer;
pub mod surface;

pub use client::HttpBlueprintClient;
pub use renderer::AsciiRenderer;
pub use surface::{TerminalMount, TerminalSurface};

/// Colors offered by the `c` key, starting with the `none` sentinel
const PALETTE: &[&str] = &[
    "none", "#ff0000", "#0000ff", "#ffff00", "#ff00ff", "#00ffff", "#ffffff", "#8b4513",
];

/// Orbit step for the arrow keys, in radians
const ORBIT_STEP: f32 = 0.1;

pub struct AppOptions {
    pub fps: u32,
    pub export_dir: PathBuf,
    /// Applied once the first metadata fetch settles
    pub color: Option<ColorSpec>,
    pub view: Option<ViewName>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            fps: 30,
            export_dir: PathBuf::from("."),
            color: None,
            view: None,
        }
    }
}

/// Main application struct for terminal blueprint viewing
pub struct TerminalApp {
    viewer: Viewer<TerminalMount, FrameQueue>,
    client: Arc<dyn BlueprintClient + Send + Sync>,
    fetch_tx: Sender<FetchOutcome>,
    fetch_rx: Receiver<FetchOutcome>,
    options: AppOptions,
    pending_color: Option<ColorSpec>,
    palette_index: usize,
    message: Option<String>,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(
        config: &ViewerConfig,
        viewer: Viewer<TerminalMount, FrameQueue>,
        client: impl BlueprintClient + Send + Sync + 'static,
        options: AppOptions,
    ) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel();
        let mut viewer = viewer;
        viewer.set_view(options.view.unwrap_or(config.initial_view));

        Self {
            viewer,
            client: Arc::new(client),
            fetch_tx,
            fetch_rx,
            pending_color: options.color.clone(),
            options,
            palette_index: 0,
            message: None,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    /// Build the viewer with a terminal mount, frame queue and monospace label font
    pub fn viewer(config: &ViewerConfig) -> Viewer<TerminalMount, FrameQueue> {
        Viewer::new(config, FrameQueue::new(), StaticFont(Typeface::new("monospace")))
    }

    pub fn run(&mut self) -> Result<()> {
        self.viewer
            .mount(TerminalMount)
            .context("could not open the terminal for rendering")?;

        let result = self.main_loop();

        // Cleanup
        self.viewer.unmount();

        result
    }

    fn main_loop(&mut self) -> Result<()> {
        let target_frame_time = Duration::from_millis(1000 / self.options.fps.max(1) as u64);

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            // Fetches
            self.dispatch_fetch();
            self.collect_fetches();

            // Render
            self.update_status();
            self.viewer.pump();

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    /// Run the viewer's pending fetch on a worker thread; the outcome comes back over a channel
    fn dispatch_fetch(&mut self) {
        let Some(request) = self.viewer.take_fetch_request() else {
            return;
        };
        let client = Arc::clone(&self.client);
        let tx = self.fetch_tx.clone();
        thread::spawn(move || {
            let outcome = request.execute(client.as_ref());
            // The receiver is gone once the app has shut down
            let _ = tx.send(outcome);
        });
    }

    fn collect_fetches(&mut self) {
        while let Ok(outcome) = self.fetch_rx.try_recv() {
            let failed = outcome.result.as_ref().err().map(ToString::to_string);
            if !self.viewer.complete_fetch(outcome) {
                continue;
            }
            if let Some(err) = failed {
                self.message = Some(format!("load failed: {err}"));
            }
            if let Some(color) = self.pending_color.take() {
                self.viewer.set_color(color);
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code, modifiers),
            Event::Resize(cols, rows) => self.viewer.resize(surface::size_from_cells(cols, rows)),
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('1') => self.viewer.set_view(ViewName::Top),
            KeyCode::Char('2') => self.viewer.set_view(ViewName::Front),
            KeyCode::Char('3') => self.viewer.set_view(ViewName::Right),
            KeyCode::Char('4') => self.viewer.set_view(ViewName::Left),
            KeyCode::Char('v') => {
                let next = self.viewer.view().next();
                self.viewer.set_view(next);
            }
            KeyCode::Char('c') => {
                self.palette_index = (self.palette_index + 1) % PALETTE.len();
                self.pending_color = None;
                self.viewer.set_color(PALETTE[self.palette_index]);
            }
            KeyCode::Char('n') => {
                self.palette_index = 0;
                self.pending_color = None;
                self.viewer.set_color(ColorSpec::None);
            }
            KeyCode::Char('w') | KeyCode::Up => self.viewer.orbit(0.0, ORBIT_STEP),
            KeyCode::Char('s') | KeyCode::Down => self.viewer.orbit(0.0, -ORBIT_STEP),
            KeyCode::Char('a') | KeyCode::Left => self.viewer.orbit(-ORBIT_STEP, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.viewer.orbit(ORBIT_STEP, 0.0),
            KeyCode::Char(' ') => {
                let spinning = self.viewer.controls().auto_rotate;
                self.viewer.set_auto_rotate(!spinning);
            }
            KeyCode::Char('x') => self.export(ExportFormat::StlAscii),
            KeyCode::Char('b') => self.export(ExportFormat::StlBinary),
            KeyCode::Char('o') => self.export(ExportFormat::Obj),
            _ => {}
        }
    }

    fn export(&mut self, format: ExportFormat) {
        self.message = Some(match self.write_export(format) {
            Ok(path) => format!("exported {}", path.display()),
            Err(err) => {
                tracing::warn!(%format, error = %err, "export failed");
                format!("export failed: {err:#}")
            }
        });
    }

    fn write_export(&self, format: ExportFormat) -> Result<PathBuf> {
        let scene = self.viewer.scene().context("nothing to export")?;
        let id = self.viewer.blueprint_id().context("no blueprint selected")?;
        let file_name = format.file_name(id);
        let path = self.options.export_dir.join(&file_name);

        let name = file_name.trim_end_matches(&format!(".{}", format.extension()));
        write_scene_file(scene, format, name, &path)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), %format, "scene exported");
        Ok(path)
    }

    fn update_status(&mut self) {
        let id = self
            .viewer
            .blueprint_id()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        let loading = if self.viewer.metadata().is_none() && self.message.is_none() {
            " (loading)"
        } else {
            ""
        };
        let mut status = format!(
            "Blueprint {id}{loading} | {} | Color: {} | FPS: {:.1} | 1-4/v=View c/n=Color WASD=Orbit Space=Spin x/b/o=Export q=Quit",
            self.viewer.view().title(),
            self.viewer.color(),
            self.fps,
        );
        if let Some(message) = &self.message {
            status = format!("{message} | {status}");
        }
        if let Some(surface) = self.viewer.surface_mut() {
            surface.set_status(status);
        }
    }
}
