//! Telling clicks from drags, and opening links.

use crate::error::{EmblemError, Result};
use crate::rotation::DRAG_THRESHOLD;
use glam::Vec2;

/// Remembers where the button went down and whether the pointer has since
/// travelled far enough to count as a drag.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClickGate {
    down_at: Option<Vec2>,
    dragged: bool,
}

impl ClickGate {
    pub fn pointer_down(&mut self, pos: Vec2) {
        self.dragged = false;
        self.down_at = Some(pos);
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        if let Some(start) = self.down_at {
            if pos.distance(start) > DRAG_THRESHOLD {
                self.dragged = true;
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.down_at = None;
    }

    pub fn is_pressed(&self) -> bool {
        self.down_at.is_some()
    }

    pub fn dragged(&self) -> bool {
        self.dragged
    }

    /// Decides a click. The drag flag is cleared either way.
    pub fn click(&mut self, hovered: bool, rotating: bool) -> bool {
        let accept = hovered && !self.dragged && !rotating;
        self.dragged = false;
        accept
    }
}

pub trait LinkOpener {
    fn open(&mut self, url: &str) -> Result<()>;
}

/// Opens links in the system browser without waiting for it.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemBrowser;

impl LinkOpener for SystemBrowser {
    fn open(&mut self, url: &str) -> Result<()> {
        open::that_detached(url).map_err(|source| EmblemError::LinkOpen {
            url: url.to_string(),
            source,
        })
    }
}
