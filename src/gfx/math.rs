use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point at `radius` from `self`, `degrees` clockwise from straight up (y grows downward).
    pub fn polar_cw(self, radius: f32, degrees: f32) -> Self {
        let rad = degrees.to_radians();
        Self::new(self.x + radius * rad.sin(), self.y - radius * rad.cos())
    }

    pub fn distance(self, other: Vec2) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Square of side `size` centered on `center`.
    pub fn centered(center: Vec2, size: f32) -> Self {
        Self::new(center.x - size / 2.0, center.y - size / 2.0, size, size)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Splits off a strip of `height` at the bottom, returning `(rest, strip)`.
    pub fn split_bottom(&self, height: f32) -> (Rect, Rect) {
        let height = height.min(self.height);
        let rest = Rect::new(self.x, self.y, self.width, self.height - height);
        let strip = Rect::new(self.x, self.y + self.height - height, self.width, height);
        (rest, strip)
    }

    /// Splits off a strip of `height` at the top, returning `(strip, rest)`.
    pub fn split_top(&self, height: f32) -> (Rect, Rect) {
        let height = height.min(self.height);
        let strip = Rect::new(self.x, self.y, self.width, height);
        let rest = Rect::new(self.x, self.y + height, self.width, self.height - height);
        (strip, rest)
    }

    /// Divides the rect into `n` equal columns.
    pub fn columns(&self, n: usize) -> Vec<Rect> {
        let w = self.width / n.max(1) as f32;
        (0..n)
            .map(|i| Rect::new(self.x + w * i as f32, self.y, w, self.height))
            .collect()
    }

    pub fn inset(&self, amount: f32) -> Rect {
        Rect::new(
            self.x + amount,
            self.y + amount,
            (self.width - amount * 2.0).max(0.0),
            (self.height - amount * 2.0).max(0.0),
        )
    }
}

/// Straight-alpha color with components in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self::new(self.r, self.g, self.b, self.a * alpha)
    }

    /// Parses `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return Err(anyhow!("Invalid color '{}': expected #rrggbb or #rrggbbaa", hex));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| anyhow!("Invalid color '{}': {}", hex, e))
        };
        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }
}
