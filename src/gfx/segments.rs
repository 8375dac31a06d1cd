//! Seven-segment glyphs for every readout in the app.
//!
//! Segment order is the usual `a..g`: top, upper right, lower right, bottom,
//! lower left, upper left, middle.

use super::draw::DrawContext;
use super::math::{Color, Vec2};

const DIGITS: [[bool; 7]; 10] = [
    [true, true, true, true, true, true, false],     // 0
    [false, true, true, false, false, false, false], // 1
    [true, true, false, true, true, false, true],    // 2
    [true, true, true, true, false, false, true],    // 3
    [false, true, true, false, false, true, true],   // 4
    [true, false, true, true, false, true, true],    // 5
    [true, false, true, true, true, true, true],     // 6
    [true, true, true, false, false, false, false],  // 7
    [true, true, true, true, true, true, true],      // 8
    [true, true, true, true, false, true, true],     // 9
];

const LETTER_A: [bool; 7] = [true, true, true, false, true, true, true];
const LETTER_P: [bool; 7] = [true, true, false, false, true, true, true];
// Closest seven-segment approximation of M.
const LETTER_M: [bool; 7] = [true, true, true, false, true, true, false];
const DASH: [bool; 7] = [false, false, false, false, false, false, true];

/// Width of a glyph cell relative to its height.
pub const GLYPH_ASPECT: f32 = 0.62;
/// Gap between cells relative to glyph height.
const SPACING: f32 = 0.1;
/// Width of ':' and '.' cells relative to glyph width.
const NARROW: f32 = 0.35;

fn segments_for(ch: char) -> Option<[bool; 7]> {
    match ch {
        '0'..='9' => Some(DIGITS[ch as usize - '0' as usize]),
        'A' | 'a' => Some(LETTER_A),
        'P' | 'p' => Some(LETTER_P),
        'M' | 'm' => Some(LETTER_M),
        '-' => Some(DASH),
        _ => None,
    }
}

fn is_narrow(ch: char) -> bool {
    matches!(ch, ':' | '.')
}

/// Horizontal extent of `text` rendered at glyph height `height`.
pub fn text_width(text: &str, height: f32) -> f32 {
    let glyph_w = height * GLYPH_ASPECT;
    let spacing = height * SPACING;
    let mut width = 0.0;
    for (i, ch) in text.chars().enumerate() {
        if i > 0 {
            width += spacing;
        }
        width += if is_narrow(ch) { glyph_w * NARROW } else { glyph_w };
    }
    width
}

/// Draws `text` with its top-left corner at `(x, y)`.
pub fn draw_text(draw: &mut DrawContext, text: &str, x: f32, y: f32, height: f32, color: Color) {
    let glyph_w = height * GLYPH_ASPECT;
    let spacing = height * SPACING;
    let mut cursor = x;
    for ch in text.chars() {
        if is_narrow(ch) {
            let w = glyph_w * NARROW;
            let dot = glyph_w * 0.14;
            let dx = cursor + (w - dot) / 2.0;
            if ch == ':' {
                draw.rect(dx, y + height * 0.28, dot, dot, color);
            }
            draw.rect(dx, y + height * 0.68, dot, dot, color);
            cursor += w + spacing;
            continue;
        }
        if let Some(segments) = segments_for(ch) {
            draw_glyph(draw, segments, cursor, y, glyph_w, height, color);
        }
        cursor += glyph_w + spacing;
    }
}

/// Draws `text` centered on `(cx, cy)`.
pub fn draw_text_centered(draw: &mut DrawContext, text: &str, cx: f32, cy: f32, height: f32, color: Color) {
    let w = text_width(text, height);
    draw_text(draw, text, cx - w / 2.0, cy - height / 2.0, height, color);
}

fn draw_glyph(draw: &mut DrawContext, segments: [bool; 7], x: f32, y: f32, width: f32, height: f32, color: Color) {
    let thickness = width * 0.15;
    let h_len = width * 0.8;
    let h_offset = width * 0.1;
    let v_len = height * 0.4;
    let bevel = thickness * 0.5;
    let mid = y + height * 0.5;

    for (idx, &on) in segments.iter().enumerate() {
        if !on {
            continue;
        }
        match idx {
            0 => horizontal(draw, x + h_offset, y, h_len, thickness, bevel, color),
            1 => vertical(draw, x + width - thickness, y + thickness, v_len, thickness, bevel, color),
            2 => vertical(draw, x + width - thickness, mid + thickness * 0.5, v_len, thickness, bevel, color),
            3 => horizontal(draw, x + h_offset, y + height - thickness, h_len, thickness, bevel, color),
            4 => vertical(draw, x, mid + thickness * 0.5, v_len, thickness, bevel, color),
            5 => vertical(draw, x, y + thickness, v_len, thickness, bevel, color),
            6 => horizontal(draw, x + h_offset, mid - thickness * 0.5, h_len, thickness, bevel, color),
            _ => {}
        }
    }
}

// Hexagonal segments: a rectangle with pointed ends, as two trapezoids.
fn horizontal(draw: &mut DrawContext, x: f32, y: f32, len: f32, thickness: f32, bevel: f32, color: Color) {
    let half = thickness / 2.0;
    let left = Vec2::new(x, y + half);
    let right = Vec2::new(x + len, y + half);
    let tl = Vec2::new(x + bevel, y);
    let tr = Vec2::new(x + len - bevel, y);
    let bl = Vec2::new(x + bevel, y + thickness);
    let br = Vec2::new(x + len - bevel, y + thickness);
    draw.quad([left, tl, tr, right], color);
    draw.quad([left, right, br, bl], color);
}

fn vertical(draw: &mut DrawContext, x: f32, y: f32, len: f32, thickness: f32, bevel: f32, color: Color) {
    let half = thickness / 2.0;
    let top = Vec2::new(x + half, y);
    let bottom = Vec2::new(x + half, y + len);
    let lt = Vec2::new(x, y + bevel);
    let lb = Vec2::new(x, y + len - bevel);
    let rt = Vec2::new(x + thickness, y + bevel);
    let rb = Vec2::new(x + thickness, y + len - bevel);
    draw.quad([top, rt, rb, bottom], color);
    draw.quad([top, bottom, lb, lt], color);
}
