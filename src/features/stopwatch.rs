//! Stopwatch sampled on a 100 ms tick; the readout blinks while paused.

use crate::app::UiEvent;
use crate::config::Palette;
use crate::features::controls::{self, Control, BAR_HEIGHT};
use crate::features::{EventCtx, Feature, Response};
use crate::gfx::{anim, draw::DrawContext, math::Rect, segments};
use crate::ticker::{TickKind, TickSubscription, Ticker};
use anyhow::Result;
use log::info;
use std::time::Duration;

const DISPLAY_TEXT: f32 = 40.0;
const BLINK_PERIOD: f32 = 1.0;
const BLINK_LOW: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopwatchMode {
    Stopped { since: Duration },
    Running { since: Duration },
}

/// `MM:SS:CC`; minutes wrap at the hour.
pub fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    let centis = (ms % 1000) / 10;
    let seconds = (ms / 1000) % 60;
    let minutes = (ms / 60_000) % 60;
    format!("{:02}:{:02}:{:02}", minutes, seconds, centis)
}

pub struct Stopwatch {
    pub mode: StopwatchMode,
    /// Accumulated over finished runs.
    banked: Duration,
    /// Value sampled on the last tick; this is what is shown and shared.
    shown: Duration,
    interval: Duration,
    subscription: Option<TickSubscription>,
}

impl Stopwatch {
    pub fn new(interval: Duration) -> Self {
        Self {
            mode: StopwatchMode::Stopped { since: Duration::ZERO },
            banked: Duration::ZERO,
            shown: Duration::ZERO,
            interval,
            subscription: None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.mode, StopwatchMode::Running { .. })
    }

    /// Exact elapsed time at `now`, independent of tick sampling.
    pub fn elapsed(&self, now: Duration) -> Duration {
        match self.mode {
            StopwatchMode::Running { since } => self.banked + now.saturating_sub(since),
            StopwatchMode::Stopped { .. } => self.banked,
        }
    }

    pub fn shown(&self) -> Duration {
        self.shown
    }

    pub fn display(&self) -> String {
        format_elapsed(self.shown)
    }

    pub fn share_message(&self) -> String {
        format!("Check out my stopwatch time: {}", self.display())
    }

    pub fn start(&mut self, ticker: &Ticker, now: Duration) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        self.subscription = Some(ticker.subscribe(TickKind::Stopwatch, self.interval)?);
        self.mode = StopwatchMode::Running { since: now };
        info!("Stopwatch started at {}", self.display());
        Ok(())
    }

    pub fn pause(&mut self, now: Duration) {
        if self.is_running() {
            self.banked = self.elapsed(now);
            self.shown = self.banked;
            self.mode = StopwatchMode::Stopped { since: now };
            self.subscription = None;
            info!("Stopwatch paused at {}", self.display());
        }
    }

    pub fn toggle(&mut self, ticker: &Ticker, now: Duration) -> Result<()> {
        if self.is_running() {
            self.pause(now);
            Ok(())
        } else {
            self.start(ticker, now)
        }
    }

    pub fn reset(&mut self, now: Duration) {
        self.mode = StopwatchMode::Stopped { since: now };
        self.subscription = None;
        self.banked = Duration::ZERO;
        self.shown = Duration::ZERO;
        info!("Stopwatch reset");
    }

    /// Readout opacity at `now`.
    pub fn opacity(&self, now: Duration) -> f32 {
        match self.mode {
            StopwatchMode::Running { .. } => 1.0,
            StopwatchMode::Stopped { since } => {
                anim::blink(now.saturating_sub(since).as_secs_f32(), BLINK_PERIOD, BLINK_LOW)
            }
        }
    }
}

impl Feature for Stopwatch {
    fn name(&self) -> &'static str {
        "Stopwatch"
    }

    fn tick(&mut self, now: Duration) {
        if self.is_running() {
            self.shown = self.elapsed(now);
        }
    }

    fn update(&mut self, _now: Duration) {}

    fn handle_event(&mut self, event: &UiEvent, viewport: Rect, ctx: &mut EventCtx) -> Result<Response> {
        let (_, bar) = viewport.split_bottom(BAR_HEIGHT);
        match Control::from_event(event, bar) {
            Some(Control::Reset) => self.reset(ctx.now),
            Some(Control::StartPause) => self.toggle(ctx.ticker, ctx.now)?,
            Some(Control::Share) => return Ok(Response::Share(self.share_message())),
            None => return Ok(Response::Ignored),
        }
        Ok(Response::Handled)
    }

    fn render(&self, draw: &mut DrawContext, viewport: Rect, palette: &Palette, now: Duration) {
        let (display, bar) = viewport.split_bottom(BAR_HEIGHT);
        let c = display.center();
        let radius = (display.width.min(display.height) / 2.0 - 8.0).max(0.0);
        draw.ring(c, radius, 2.0, palette.foreground);

        let color = palette.foreground.with_alpha(self.opacity(now));
        segments::draw_text_centered(draw, &self.display(), c.x, c.y, DISPLAY_TEXT.min(radius * 0.3), color);

        controls::render(draw, bar, self.is_running(), palette);
    }
}
