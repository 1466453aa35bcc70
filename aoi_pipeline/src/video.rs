/// Frame acquisition
///
/// Camera and video-file capture live outside this crate; anything that can
/// hand out RGB frames implements [`FrameSource`].
use crate::error::Result;
use crate::types::Frame;
use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use std::path::Path;

pub trait FrameSource: Send {
    /// Next frame, or `None` at end of stream
    fn next_frame(&mut self) -> Option<Frame>;

    /// Release the underlying device. Later calls to `next_frame` return `None`.
    fn stop(&mut self);
}

/// Repeats one decoded image forever
pub struct StillImageSource {
    image: RgbImage,
    next_id: u64,
    stopped: bool,
}

impl StillImageSource {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            next_id: 0,
            stopped: false,
        }
    }

    /// Decode an image file and resize it to `width` x `height`
    pub fn open<P: AsRef<Path>>(path: P, width: u32, height: u32) -> Result<Self> {
        let decoded = image::open(path.as_ref())?.to_rgb8();
        let image = if decoded.dimensions() == (width, height) {
            decoded
        } else {
            image::imageops::resize(&decoded, width, height, FilterType::Triangle)
        };
        log::info!(
            "Opened still image {} ({}x{})",
            path.as_ref().display(),
            width,
            height
        );
        Ok(Self::new(image))
    }
}

impl FrameSource for StillImageSource {
    fn next_frame(&mut self) -> Option<Frame> {
        if self.stopped {
            return None;
        }
        let frame = Frame::new(self.next_id, self.image.clone());
        self.next_id += 1;
        Some(frame)
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Generated gradient frames with a moving bar, optionally finite
pub struct SyntheticSource {
    width: u32,
    height: u32,
    remaining: Option<u64>,
    next_id: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            remaining: None,
            next_id: 0,
        }
    }

    /// Stop after `frames` frames
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }

    fn render(&self, frame_id: u64) -> RgbImage {
        let bar = (frame_id * 4 % self.width.max(1) as u64) as u32;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            if x.abs_diff(bar) < 3 {
                Rgb([255, 255, 255])
            } else {
                Rgb([
                    ((x * 255) / self.width.max(1)) as u8,
                    ((y * 255) / self.height.max(1)) as u8,
                    96,
                ])
            }
        })
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Option<Frame> {
        match self.remaining {
            Some(0) => return None,
            Some(ref mut n) => *n -= 1,
            None => {}
        }
        let frame = Frame::new(self.next_id, self.render(self.next_id));
        self.next_id += 1;
        Some(frame)
    }

    fn stop(&mut self) {
        self.remaining = Some(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_still_image_ids_increase_until_stopped() {
        let mut source = StillImageSource::new(RgbImage::new(4, 4));
        assert_eq!(source.next_frame().unwrap().frame_id, 0);
        assert_eq!(source.next_frame().unwrap().frame_id, 1);
        source.stop();
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn test_synthetic_limit() {
        let mut source = SyntheticSource::new(32, 16).with_limit(2);
        let frame = source.next_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (32, 16));
        assert!(source.next_frame().is_some());
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn test_open_missing_file_fails() {
        assert!(StillImageSource::open("/definitely/not/here.png", 8, 8).is_err());
    }
}
