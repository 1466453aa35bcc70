/// Drawing helpers for detection overlays, AOI outlines and the FPS counter
use crate::types::{HandDetection, Marker, MarkerId};
use aoigeom::{Point, Polygon};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::collections::BTreeSet;

pub const HAND_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const SELECTED_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const AOI_COLOR: Rgb<u8> = Rgb([255, 200, 0]);
pub const DRAFT_COLOR: Rgb<u8> = Rgb([0, 200, 255]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_BG: Rgb<u8> = Rgb([0, 0, 0]);

const GLYPH_WIDTH: i32 = 5;
const GLYPH_HEIGHT: i32 = 7;

// 5x7 bitmaps, one row per byte, most significant of the low five bits leftmost
const GLYPHS: &[(char, [u8; 7])] = &[
    ('0', [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E]),
    ('1', [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('2', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F]),
    ('3', [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E]),
    ('4', [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02]),
    ('5', [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E]),
    ('6', [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E]),
    ('7', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E]),
    ('9', [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C]),
    ('F', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10]),
    ('P', [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10]),
    ('S', [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E]),
    ('A', [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C]),
    (':', [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00]),
    ('#', [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A]),
    (' ', [0x00; 7]),
];

fn glyph(ch: char) -> [u8; 7] {
    GLYPHS
        .iter()
        .find(|(c, _)| *c == ch)
        .map(|(_, bits)| *bits)
        .unwrap_or([0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F])
}

fn put_pixel_clipped(img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Draw text with the built-in 5x7 font. Unknown characters render as a box.
pub fn draw_text(
    img: &mut RgbImage,
    text: &str,
    x: i32,
    y: i32,
    color: Rgb<u8>,
    bg_color: Option<Rgb<u8>>,
) {
    let len = text.chars().count() as i32;
    if let Some(bg) = bg_color {
        for dy in 0..GLYPH_HEIGHT + 2 {
            for dx in 0..len * (GLYPH_WIDTH + 1) + 2 {
                put_pixel_clipped(img, x + dx, y + dy, bg);
            }
        }
    }

    for (i, ch) in text.to_uppercase().chars().enumerate() {
        let origin_x = x + 1 + i as i32 * (GLYPH_WIDTH + 1);
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 1 {
                    put_pixel_clipped(img, origin_x + col, y + 1 + row as i32, color);
                }
            }
        }
    }
}

/// Deterministic, reasonably dark color for a marker id
pub fn generate_marker_color(id: MarkerId) -> Rgb<u8> {
    let mut hash = id.wrapping_add(1).wrapping_mul(2654435761);
    let mut channel = || {
        let value = (hash >> 8) as u8;
        hash = hash.wrapping_mul(2654435761);
        value.clamp(40, 180)
    };
    Rgb([channel(), channel(), channel()])
}

/// Hollow rectangle with the given border thickness
pub fn draw_rect(
    img: &mut RgbImage,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    color: Rgb<u8>,
    thickness: i32,
) {
    for offset in 0..thickness.max(1) {
        let rect = Rect::at(x - offset, y - offset)
            .of_size(width + (offset * 2) as u32, height + (offset * 2) as u32);
        draw_hollow_rect_mut(img, rect, color);
    }
}

/// Open path through `points`
pub fn draw_polyline(img: &mut RgbImage, points: &[Point], color: Rgb<u8>) {
    for pair in points.windows(2) {
        draw_line_segment_mut(img, (pair[0].x, pair[0].y), (pair[1].x, pair[1].y), color);
    }
}

/// Closed outline; thickness is approximated by offset copies
pub fn draw_polygon(img: &mut RgbImage, polygon: &Polygon, color: Rgb<u8>, thickness: i32) {
    for (a, b) in polygon.edges() {
        for offset in 0..thickness.max(1) {
            let d = offset as f32;
            draw_line_segment_mut(img, (a.x + d, a.y), (b.x + d, b.y), color);
            draw_line_segment_mut(img, (a.x, a.y + d), (b.x, b.y + d), color);
        }
    }
}

pub fn draw_point(img: &mut RgbImage, p: Point, radius: i32, color: Rgb<u8>) {
    draw_filled_circle_mut(img, p.to_pixel(), radius, color);
}

pub fn draw_hands(img: &mut RgbImage, hands: &[HandDetection]) {
    for hand in hands {
        let bbox = &hand.bbox;
        draw_rect(
            img,
            bbox.xmin as i32,
            bbox.ymin as i32,
            bbox.width().max(1.0) as u32,
            bbox.height().max(1.0) as u32,
            HAND_COLOR,
            2,
        );
        draw_point(img, hand.center, 3, HAND_COLOR);
    }
}

/// Marker outlines labelled with their ids; `selected` ones are highlighted
pub fn draw_markers(img: &mut RgbImage, markers: &[Marker], selected: &BTreeSet<MarkerId>) {
    for marker in markers {
        let polygon = marker.polygon();
        let (color, thickness) = if selected.contains(&marker.id) {
            (SELECTED_COLOR, 3)
        } else {
            (generate_marker_color(marker.id), 1)
        };
        draw_polygon(img, &polygon, color, thickness);
        if let Some(c) = polygon.centroid() {
            let (x, y) = c.to_pixel();
            draw_text(img, &format!("#{}", marker.id), x - 6, y - 4, TEXT_COLOR, Some(color));
        }
    }
}

/// FPS readout in the top-left corner
pub fn draw_fps(img: &mut RgbImage, fps: f64) {
    draw_text(img, &format!("FPS: {:.1}", fps), 8, 8, TEXT_COLOR, Some(TEXT_BG));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_text_marks_pixels() {
        let mut img = RgbImage::new(40, 12);
        draw_text(&mut img, "1", 0, 0, TEXT_COLOR, None);
        let lit = img.pixels().filter(|p| **p == TEXT_COLOR).count();
        let expected: u32 = glyph('1').iter().map(|b| b.count_ones()).sum();
        assert_eq!(lit as u32, expected);
    }

    #[test]
    fn test_drawing_clips_at_borders() {
        let mut img = RgbImage::new(10, 10);
        draw_text(&mut img, "FPS: 30.0", -5, 5, TEXT_COLOR, Some(TEXT_BG));
        draw_rect(&mut img, -3, -3, 20, 20, HAND_COLOR, 2);
        draw_polygon(
            &mut img,
            &Polygon::from_corners(&[[-10, -10], [30, 0], [5, 40]]),
            AOI_COLOR,
            2,
        );
    }

    #[test]
    fn test_marker_color_is_deterministic() {
        assert_eq!(generate_marker_color(3), generate_marker_color(3));
        let Rgb([r, g, b]) = generate_marker_color(42);
        assert!(r <= 180 && g <= 180 && b <= 180);
    }

    #[test]
    fn test_selected_marker_is_highlighted() {
        let mut img = RgbImage::new(100, 100);
        let markers = vec![Marker::square(3, 20, 20, 40)];
        draw_markers(&mut img, &markers, &BTreeSet::from([3]));
        assert_eq!(*img.get_pixel(40, 20), SELECTED_COLOR);
    }
}
