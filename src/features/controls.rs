//! Reset / start-pause / share buttons shared by the timer and the stopwatch.

use crate::app::{UiEvent, BTN_LEFT};
use crate::config::Palette;
use crate::gfx::{draw::DrawContext, math::{Color, Rect, Vec2}};
use xkbcommon::xkb::keysyms;

pub const BAR_HEIGHT: f32 = 56.0;
const BUTTON_SIZE: f32 = 44.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Reset,
    StartPause,
    Share,
}

impl Control {
    pub const ALL: [Control; 3] = [Control::Reset, Control::StartPause, Control::Share];

    /// Control triggered by `event` when the bar occupies `bar`.
    pub fn from_event(event: &UiEvent, bar: Rect) -> Option<Control> {
        match *event {
            UiEvent::PointerDown { pos, button: BTN_LEFT } => button_at(bar, pos),
            UiEvent::Key(keysyms::KEY_space) => Some(Control::StartPause),
            UiEvent::Key(keysyms::KEY_r) => Some(Control::Reset),
            UiEvent::Key(keysyms::KEY_s) => Some(Control::Share),
            _ => None,
        }
    }
}

/// Square button rects, centered in equal thirds of `bar`.
pub fn button_rects(bar: Rect) -> [(Control, Rect); 3] {
    let cols = bar.columns(3);
    let size = BUTTON_SIZE.min(bar.height).min(bar.width / 3.0);
    std::array::from_fn(|i| (Control::ALL[i], Rect::centered(cols[i].center(), size)))
}

pub fn button_at(bar: Rect, pos: Vec2) -> Option<Control> {
    button_rects(bar)
        .into_iter()
        .find(|(_, r)| r.contains(pos))
        .map(|(control, _)| control)
}

pub fn render(draw: &mut DrawContext, bar: Rect, running: bool, palette: &Palette) {
    for (control, r) in button_rects(bar) {
        let c = r.center();
        let radius = r.width / 2.0;
        draw.ring(c, radius - 1.0, 2.0, palette.foreground);
        let s = radius * 0.45;
        match control {
            Control::Reset => reset_icon(draw, c, s, palette.foreground),
            Control::StartPause if running => {
                draw.rect(c.x - s * 0.7, c.y - s, s * 0.5, s * 2.0, palette.accent);
                draw.rect(c.x + s * 0.2, c.y - s, s * 0.5, s * 2.0, palette.accent);
            }
            Control::StartPause => {
                draw.triangle(
                    Vec2::new(c.x - s * 0.6, c.y - s),
                    Vec2::new(c.x + s, c.y),
                    Vec2::new(c.x - s * 0.6, c.y + s),
                    palette.accent,
                );
            }
            Control::Share => share_icon(draw, c, s, palette.foreground),
        }
    }
}

fn reset_icon(draw: &mut DrawContext, c: Vec2, s: f32, color: Color) {
    // Open circular arrow: 300 degrees of arc plus a head at the gap.
    let steps = 20;
    for i in 0..steps {
        let a0 = 30.0 + i as f32 * 15.0;
        let a1 = a0 + 15.0;
        draw.line(c.polar_cw(s, a0), c.polar_cw(s, a1), 2.0, color);
    }
    let tip = c.polar_cw(s, 30.0);
    draw.triangle(
        Vec2::new(tip.x - s * 0.45, tip.y - s * 0.1),
        Vec2::new(tip.x + s * 0.2, tip.y - s * 0.35),
        Vec2::new(tip.x + s * 0.05, tip.y + s * 0.35),
        color,
    );
}

fn share_icon(draw: &mut DrawContext, c: Vec2, s: f32, color: Color) {
    let right_top = Vec2::new(c.x + s * 0.7, c.y - s * 0.7);
    let right_bottom = Vec2::new(c.x + s * 0.7, c.y + s * 0.7);
    let left = Vec2::new(c.x - s * 0.7, c.y);
    draw.line(left, right_top, 2.0, color);
    draw.line(left, right_bottom, 2.0, color);
    for p in [left, right_top, right_bottom] {
        draw.disc(p, s * 0.28, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::BTN_RIGHT;

    fn bar() -> Rect {
        Rect::new(0.0, 300.0, 300.0, BAR_HEIGHT)
    }

    #[test]
    fn buttons_sit_in_thirds() {
        let rects = button_rects(bar());
        assert_eq!(rects.map(|(c, _)| c), Control::ALL);
        assert_eq!(rects[0].1.center(), Vec2::new(50.0, 328.0));
        assert_eq!(rects[1].1.center(), Vec2::new(150.0, 328.0));
        assert_eq!(rects[2].1.center(), Vec2::new(250.0, 328.0));
    }

    #[test]
    fn clicks_map_to_buttons() {
        let click = |x, y| UiEvent::PointerDown { pos: Vec2::new(x, y), button: BTN_LEFT };
        assert_eq!(Control::from_event(&click(50.0, 328.0), bar()), Some(Control::Reset));
        assert_eq!(Control::from_event(&click(150.0, 310.0), bar()), Some(Control::StartPause));
        assert_eq!(Control::from_event(&click(260.0, 340.0), bar()), Some(Control::Share));
        assert_eq!(Control::from_event(&click(100.0, 328.0), bar()), None);
        let right = UiEvent::PointerDown { pos: Vec2::new(150.0, 328.0), button: BTN_RIGHT };
        assert_eq!(Control::from_event(&right, bar()), None);
    }

    #[test]
    fn keys_map_to_controls() {
        assert_eq!(Control::from_event(&UiEvent::Key(keysyms::KEY_space), bar()), Some(Control::StartPause));
        assert_eq!(Control::from_event(&UiEvent::Key(keysyms::KEY_r), bar()), Some(Control::Reset));
        assert_eq!(Control::from_event(&UiEvent::Key(keysyms::KEY_s), bar()), Some(Control::Share));
        assert_eq!(Control::from_event(&UiEvent::Key(keysyms::KEY_q), bar()), None);
    }
}
