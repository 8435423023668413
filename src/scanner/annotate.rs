use std::io::Cursor;

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::scanner::action_model::Action;

const PALETTE: [[u8; 4]; 6] = [
    [255, 59, 48, 255],
    [0, 122, 255, 255],
    [52, 199, 89, 255],
    [255, 149, 0, 255],
    [175, 82, 222, 255],
    [255, 45, 85, 255],
];
const BADGE_TEXT: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OUTLINE_THICKNESS: u32 = 2;
const BADGE_SCALE: u32 = 2;
const BADGE_PADDING: i32 = 3;

/// Rings searched around a badge's preferred spot before giving up on a
/// collision-free position.
const MAX_SEARCH_RINGS: i32 = 64;

/// Where one action's index badge is painted, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeRect {
    pub index: usize,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BadgeRect {
    pub fn overlaps(&self, other: &BadgeRect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    fn fits(&self, width: i32, height: i32) -> bool {
        self.x >= 0 && self.y >= 0 && self.x + self.width <= width && self.y + self.height <= height
    }
}

/// Draw an outline and an index badge for every action onto a copy of `png`.
///
/// Outlines go down first and badges last, each badge on a spot no earlier
/// badge occupies, so every index stays legible even for nested elements
/// that share a box.
pub fn annotate_screenshot(png: &[u8], actions: &[Action]) -> Result<Vec<u8>, image::ImageError> {
    if actions.is_empty() {
        return Ok(png.to_vec());
    }

    let mut img = image::load_from_memory(png)?.to_rgba8();
    for action in actions {
        if let Some((x, y, w, h)) = clip_to_image(action, img.width(), img.height()) {
            let color = marker_color(action.index);
            draw_rect_outline(&mut img, x as u32, y as u32, w as u32, h as u32, color, OUTLINE_THICKNESS);
        }
    }
    for badge in place_badges(actions, img.width(), img.height()) {
        let color = marker_color(badge.index);
        let (x1, y1) = (badge.x + badge.width - 1, badge.y + badge.height - 1);
        fill_rect_alpha(&mut img, badge.x, badge.y, x1, y1, color);
        draw_bitmap_text(
            &mut img,
            badge.x + BADGE_PADDING,
            badge.y + BADGE_PADDING,
            &badge.index.to_string(),
            BADGE_TEXT,
            BADGE_SCALE,
        );
    }

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

pub fn marker_color(index: usize) -> Rgba<u8> {
    Rgba(PALETTE[index % PALETTE.len()])
}

/// Choose a badge position for every action, in action order.
///
/// Each badge tries above the box, then the box's inner corners, then below
/// and beside it, and takes the first spot that lies inside the image and
/// clear of the badges already placed. Failing that it searches outward from
/// the first spot. Only when the image has no free room left does a badge
/// overlap another.
pub fn place_badges(actions: &[Action], width: u32, height: u32) -> Vec<BadgeRect> {
    let (img_w, img_h) = (width as i32, height as i32);
    let mut placed: Vec<BadgeRect> = Vec::with_capacity(actions.len());

    for action in actions {
        let (bw, bh) = badge_size(&action.index.to_string());
        let (x, y, w, h) = clip_to_image(action, width, height).unwrap_or((0, 0, 1, 1));
        let rect_at = |bx: i32, by: i32| BadgeRect {
            index: action.index,
            x: bx,
            y: by,
            width: bw,
            height: bh,
        };
        let is_free = |r: &BadgeRect| r.fits(img_w, img_h) && !placed.iter().any(|p| p.overlaps(r));

        let candidates = [
            (x, y - bh),
            (x, y),
            (x + w - bw, y),
            (x + w - bw, y - bh),
            (x, y + h),
            (x, y + h - bh),
            (x + w, y),
            (x - bw, y),
        ];
        let preferred = rect_at(
            candidates[0].0.clamp(0, (img_w - bw).max(0)),
            candidates[0].1.clamp(0, (img_h - bh).max(0)),
        );

        let chosen = candidates
            .iter()
            .map(|&(cx, cy)| rect_at(cx, cy))
            .find(|r| is_free(r))
            .or_else(|| search_around(preferred, bh, &is_free))
            .unwrap_or(preferred);
        placed.push(chosen);
    }

    placed
}

/// Walk rings of growing radius around `start` looking for a free spot.
fn search_around(start: BadgeRect, step: i32, is_free: &dyn Fn(&BadgeRect) -> bool) -> Option<BadgeRect> {
    let step = (step / 2).max(1);
    (1..=MAX_SEARCH_RINGS).find_map(|ring| {
        let d = ring * step;
        [(d, 0), (-d, 0), (0, d), (0, -d), (d, d), (-d, d), (d, -d), (-d, -d)]
            .into_iter()
            .map(|(dx, dy)| BadgeRect {
                x: start.x + dx,
                y: start.y + dy,
                ..start
            })
            .find(|r| is_free(r))
    })
}

/// The part of the action's box that lies on the image, as `(x, y, w, h)`.
fn clip_to_image(action: &Action, width: u32, height: u32) -> Option<(i32, i32, i32, i32)> {
    let b = action.bounds;
    let x0 = b.x.max(0.0).round() as i32;
    let y0 = b.y.max(0.0).round() as i32;
    let x1 = (b.x + b.width).min(f64::from(width)).round() as i32;
    let y1 = (b.y + b.height).min(f64::from(height)).round() as i32;
    (x1 > x0 && y1 > y0).then_some((x0, y0, x1 - x0, y1 - y0))
}

/// Pixel size of the badge for `text`, padding included.
pub fn badge_size(text: &str) -> (i32, i32) {
    let glyph = 8 * BADGE_SCALE as i32;
    let chars = text.chars().count() as i32;
    (chars * glyph + BADGE_PADDING * 2, glyph + BADGE_PADDING * 2)
}

fn draw_rect_outline(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>, thickness: u32) {
    if w == 0 || h == 0 {
        return;
    }
    let img_w = img.width();
    let img_h = img.height();

    let x0 = x.min(img_w.saturating_sub(1));
    let y0 = y.min(img_h.saturating_sub(1));
    let x1 = (x + w.saturating_sub(1)).min(img_w.saturating_sub(1));
    let y1 = (y + h.saturating_sub(1)).min(img_h.saturating_sub(1));

    for t in 0..thickness.max(1) {
        let tx0 = x0.saturating_sub(t);
        let ty0 = y0.saturating_sub(t);
        let tx1 = (x1 + t).min(img_w.saturating_sub(1));
        let ty1 = (y1 + t).min(img_h.saturating_sub(1));

        for xx in tx0..=tx1 {
            img.put_pixel(xx, ty0, color);
            img.put_pixel(xx, ty1, color);
        }
        for yy in ty0..=ty1 {
            img.put_pixel(tx0, yy, color);
            img.put_pixel(tx1, yy, color);
        }
    }
}

fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let mix = |d: u8, s: u8| (f64::from(d) * inv + f64::from(s) * a).round().clamp(0.0, 255.0) as u8;
    let out_a = (f64::from(dst[3]) * inv + f64::from(src[3])).round().clamp(0.0, 255.0) as u8;
    Rgba([mix(dst[0], src[0]), mix(dst[1], src[1]), mix(dst[2], src[2]), out_a])
}

fn fill_rect_alpha(img: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    let max_x = img.width() as i32 - 1;
    let max_y = img.height() as i32 - 1;
    let min_x = x0.min(x1).clamp(0, max_x);
    let hi_x = x0.max(x1).clamp(0, max_x);
    let min_y = y0.min(y1).clamp(0, max_y);
    let hi_y = y0.max(y1).clamp(0, max_y);
    for y in min_y..=hi_y {
        for x in min_x..=hi_x {
            let dst = *img.get_pixel(x as u32, y as u32);
            img.put_pixel(x as u32, y as u32, blend_pixel(dst, color));
        }
    }
}

fn draw_bitmap_text(img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>, scale: u32) {
    let scale_i = scale.max(1) as i32;
    let mut cursor_x = x;
    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch) else {
            cursor_x += 8 * scale_i;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            for col_idx in 0..8 {
                if (*row >> col_idx) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col_idx * scale_i;
                let py = y + row_idx as i32 * scale_i;
                for sy in 0..scale_i {
                    for sx in 0..scale_i {
                        let (tx, ty) = (px + sx, py + sy);
                        if tx >= 0 && ty >= 0 && tx < img.width() as i32 && ty < img.height() as i32 {
                            let dst = *img.get_pixel(tx as u32, ty as u32);
                            img.put_pixel(tx as u32, ty as u32, blend_pixel(dst, color));
                        }
                    }
                }
            }
        }
        cursor_x += 8 * scale_i;
    }
}
