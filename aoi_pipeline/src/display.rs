//! Rendering collaborator and pointer events
//!
//! Window management is out of scope for the library. A [`Renderer`] shows
//! composited frames, samples the keyboard without blocking and forwards
//! mouse events to the single registered click handler.

use crate::error::Result;
use aoigeom::Point;
use image::RgbImage;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    LeftDown,
    RightDown,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: i32,
    pub y: i32,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: i32, y: i32) -> Self {
        Self { kind, x, y }
    }

    pub fn left(x: i32, y: i32) -> Self {
        Self::new(PointerKind::LeftDown, x, y)
    }

    pub fn right(x: i32, y: i32) -> Self {
        Self::new(PointerKind::RightDown, x, y)
    }

    pub fn point(&self) -> Point {
        Point::from((self.x, self.y))
    }
}

pub type ClickHandler = Box<dyn FnMut(PointerEvent) + Send>;

pub trait Renderer {
    fn show(&mut self, frame: &RgbImage) -> Result<()>;

    /// Non-blocking key sample
    fn pressed_key(&mut self) -> Option<char>;

    fn set_click_handler(&mut self, handler: ClickHandler);

    fn destroy(&mut self);
}

/// Renderer without a window: counts frames and can dump one to a PNG
pub struct HeadlessRenderer {
    snapshot_path: Option<PathBuf>,
    snapshot_every: u64,
    frames_shown: u64,
    handler: Option<ClickHandler>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            snapshot_path: None,
            snapshot_every: 1,
            frames_shown: 0,
            handler: None,
        }
    }

    /// Write every `every`-th shown frame to `path`
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>, every: u64) -> Self {
        self.snapshot_path = Some(path.into());
        self.snapshot_every = every.max(1);
        self
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }

    /// Feed a pointer event as if it came from a window
    pub fn inject_pointer(&mut self, event: PointerEvent) {
        if let Some(handler) = self.handler.as_mut() {
            handler(event);
        }
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HeadlessRenderer {
    fn show(&mut self, frame: &RgbImage) -> Result<()> {
        self.frames_shown += 1;
        if let Some(path) = &self.snapshot_path {
            if self.frames_shown % self.snapshot_every == 0 {
                frame.save(path)?;
                log::debug!("Saved frame {} to {}", self.frames_shown, path.display());
            }
        }
        Ok(())
    }

    fn pressed_key(&mut self) -> Option<char> {
        None
    }

    fn set_click_handler(&mut self, handler: ClickHandler) {
        self.handler = Some(handler);
    }

    fn destroy(&mut self) {
        self.handler = None;
        log::info!("Headless renderer closed after {} frames", self.frames_shown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;

    #[test]
    fn test_injected_pointer_reaches_handler() {
        let (tx, rx) = unbounded();
        let mut renderer = HeadlessRenderer::new();
        renderer.inject_pointer(PointerEvent::left(1, 1));
        renderer.set_click_handler(Box::new(move |e| {
            let _ = tx.send(e);
        }));
        renderer.inject_pointer(PointerEvent::right(5, 6));

        assert_eq!(rx.try_recv().unwrap(), PointerEvent::right(5, 6));
        assert!(rx.try_recv().is_err());
        assert_eq!(PointerEvent::left(3, 4).point(), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_snapshot_written() {
        let path = std::env::temp_dir().join(format!("aoi-headless-{}.png", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let mut renderer = HeadlessRenderer::new().with_snapshot(path.clone(), 2);
        renderer.show(&RgbImage::new(4, 4)).unwrap();
        assert!(!path.exists());
        renderer.show(&RgbImage::new(4, 4)).unwrap();
        assert!(path.exists());
        assert_eq!(renderer.frames_shown(), 2);
        let _ = std::fs::remove_file(path);
    }
}
