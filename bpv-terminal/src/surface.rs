/// The terminal as a mount point and render surface
use std::io::{stdout, Stdout, Write};

use bpv_core::{
    Frame, MountPoint, RenderSurface, ResourceAcquisitionError, SurfaceError, SurfaceSize,
};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};

use crate::renderer::AsciiRenderer;

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: u32 = 2;

/// Logical size of a terminal of `cols` x `rows` cells, in half-row units
pub fn size_from_cells(cols: u16, rows: u16) -> SurfaceSize {
    SurfaceSize {
        width: cols as u32,
        height: rows as u32 * CELL_ASPECT,
    }
}

/// Renders into the alternate screen of the controlling terminal
pub struct TerminalSurface {
    renderer: AsciiRenderer,
    out: Stdout,
    status: String,
}

impl TerminalSurface {
    /// Text shown on the first line, above the scene
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    fn write_frame(&mut self, frame: &Frame<'_>) -> std::io::Result<()> {
        self.renderer.clear();
        self.renderer.render_scene(frame.scene, frame.camera);
        self.renderer.draw(&mut self.out)?;

        let width = self.renderer.width();
        let status: String = self.status.chars().take(width).collect();
        queue!(
            self.out,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(status),
            ResetColor
        )?;
        self.out.flush()
    }
}

impl RenderSurface for TerminalSurface {
    fn size(&self) -> SurfaceSize {
        size_from_cells(self.renderer.width() as u16, self.renderer.height() as u16)
    }

    fn draw(&mut self, frame: &Frame<'_>) -> Result<(), SurfaceError> {
        self.write_frame(frame)
            .map_err(|err| SurfaceError::Draw(err.to_string()))
    }

    fn resize(&mut self, size: SurfaceSize) {
        let cols = size.width as usize;
        let rows = (size.height / CELL_ASPECT) as usize;
        self.renderer = AsciiRenderer::new(cols, rows);
    }
}

/// The controlling terminal: attaching enters raw mode and the alternate screen
#[derive(Debug, Default)]
pub struct TerminalMount;

impl MountPoint for TerminalMount {
    type Surface = TerminalSurface;

    fn acquire(&mut self, _size: SurfaceSize) -> Result<TerminalSurface, ResourceAcquisitionError> {
        let (cols, rows) =
            terminal::size().map_err(|err| ResourceAcquisitionError::NoSurface(err.to_string()))?;
        if cols == 0 || rows == 0 {
            return Err(ResourceAcquisitionError::NoSurface(format!(
                "terminal reports {cols}x{rows} cells"
            )));
        }
        Ok(TerminalSurface {
            renderer: AsciiRenderer::new(cols as usize, rows as usize),
            out: stdout(),
            status: String::new(),
        })
    }

    fn attach(&mut self, surface: &mut TerminalSurface) -> Result<(), ResourceAcquisitionError> {
        terminal::enable_raw_mode().map_err(|err| ResourceAcquisitionError::Attach(err.to_string()))?;
        if let Err(err) = execute!(surface.out, terminal::EnterAlternateScreen, cursor::Hide) {
            let _ = terminal::disable_raw_mode();
            return Err(ResourceAcquisitionError::Attach(err.to_string()));
        }
        Ok(())
    }

    fn detach(&mut self, mut surface: TerminalSurface) {
        if let Err(err) = execute!(surface.out, terminal::LeaveAlternateScreen, cursor::Show) {
            tracing::warn!(%err, "failed to leave alternate screen");
        }
        if let Err(err) = terminal::disable_raw_mode() {
            tracing::warn!(%err, "failed to disable raw mode");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_from_cells_corrects_aspect() {
        assert_eq!(
            size_from_cells(120, 40),
            SurfaceSize {
                width: 120,
                height: 80
            }
        );
    }
}
