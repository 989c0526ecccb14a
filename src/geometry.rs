//! Local window geometry and the sources that report it.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A window's origin and extent in the shared global coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Read-only source of the local window's current geometry. Must be cheap
/// enough to poll every few milliseconds.
pub trait GeometrySource: Send + Sync {
    fn current(&self) -> WindowRect;
}

/// Settable rect for embedders that learn geometry from their own windowing
/// toolkit, and for tests.
#[derive(Clone, Default)]
pub struct SharedRect {
    inner: Arc<RwLock<WindowRect>>,
}

impl SharedRect {
    pub fn new(rect: WindowRect) -> Self {
        Self {
            inner: Arc::new(RwLock::new(rect)),
        }
    }

    pub fn set(&self, rect: WindowRect) {
        *self.inner.write() = rect;
    }
}

impl GeometrySource for SharedRect {
    fn current(&self) -> WindowRect {
        *self.inner.read()
    }
}

/// Terminal-backed geometry for the demo shell: a fixed origin plus the
/// terminal size as the extent. Falls back to the last good sample when the
/// size query fails (e.g. output is not a tty).
pub struct TerminalGeometry {
    x: i32,
    y: i32,
    last_size: RwLock<(u32, u32)>,
}

impl TerminalGeometry {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            last_size: RwLock::new((80, 24)),
        }
    }
}

impl GeometrySource for TerminalGeometry {
    fn current(&self) -> WindowRect {
        match crossterm::terminal::size() {
            Ok((cols, rows)) => {
                *self.last_size.write() = (cols as u32, rows as u32);
                WindowRect::new(self.x, self.y, cols as u32, rows as u32)
            }
            Err(_) => {
                let (width, height) = *self.last_size.read();
                WindowRect::new(self.x, self.y, width, height)
            }
        }
    }
}
