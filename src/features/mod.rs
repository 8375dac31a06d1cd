pub mod clock;
pub mod controls;
pub mod stopwatch;
pub mod timer;

use crate::app::UiEvent;
use crate::config::Palette;
use crate::gfx::{draw::DrawContext, math::Rect};
use crate::ticker::Ticker;
use anyhow::Result;
use std::time::Duration;

/// What the host needs to react to after a feature consumed an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ignored,
    Handled,
    Share(String),
}

/// Event-time services a feature may need: tick registration and the monotonic clock.
pub struct EventCtx<'a> {
    pub ticker: &'a Ticker,
    pub now: Duration,
}

pub trait Feature {
    fn name(&self) -> &'static str;
    /// Called when this feature's tick subscription fires.
    fn tick(&mut self, now: Duration);
    /// Called every frame before rendering.
    fn update(&mut self, now: Duration);
    fn handle_event(&mut self, event: &UiEvent, viewport: Rect, ctx: &mut EventCtx) -> Result<Response>;
    fn render(&self, draw: &mut DrawContext, viewport: Rect, palette: &Palette, now: Duration);
}
