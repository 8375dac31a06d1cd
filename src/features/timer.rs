//! Countdown timer with HH:MM:SS entry fields.

use crate::app::{UiEvent, BTN_LEFT};
use crate::config::Palette;
use crate::features::controls::{self, Control, BAR_HEIGHT};
use crate::features::{EventCtx, Feature, Response};
use crate::gfx::{draw::DrawContext, math::{Rect, Vec2}, segments};
use crate::ticker::{TickKind, TickSubscription, Ticker};
use anyhow::Result;
use log::{debug, info};
use std::time::Duration;

const FIELD_STRIP: f32 = 56.0;
const FIELD_TEXT: f32 = 24.0;
const DISPLAY_TEXT: f32 = 34.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Hours,
    Minutes,
    Seconds,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Hours, Field::Minutes, Field::Seconds];

    fn limit(self) -> u32 {
        match self {
            Field::Hours => 100,
            Field::Minutes | Field::Seconds => 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerMode {
    Idle,
    Running {
        since: Duration,
        remaining_at_start: Duration,
    },
    Paused,
}

/// `HH:MM:SS`, hours unbounded.
pub fn format_hms(total_secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}

pub struct CountdownTimer {
    pub mode: TimerMode,
    hours: u32,
    minutes: u32,
    seconds: u32,
    remaining: Duration,
    interval: Duration,
    subscription: Option<TickSubscription>,
}

impl CountdownTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            mode: TimerMode::Idle,
            hours: 0,
            minutes: 0,
            seconds: 0,
            remaining: Duration::ZERO,
            interval,
            subscription: None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.mode, TimerMode::Running { .. })
    }

    pub fn field(&self, field: Field) -> u32 {
        match field {
            Field::Hours => self.hours,
            Field::Minutes => self.minutes,
            Field::Seconds => self.seconds,
        }
    }

    /// Total of the entry fields.
    pub fn entered(&self) -> Duration {
        Duration::from_secs(u64::from(self.hours * 3600 + self.minutes * 60 + self.seconds))
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Remaining whole seconds, rounded up so a fresh 10 s timer shows 10 until a full second passed.
    pub fn display_secs(&self) -> u64 {
        let secs = self.remaining.as_secs();
        if self.remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    pub fn display(&self) -> String {
        format_hms(self.display_secs())
    }

    pub fn share_message(&self) -> String {
        format!("Check out my timer set to: {}", self.display())
    }

    /// Steps a field by `delta`, wrapping inside its range, and re-arms from the fields.
    pub fn adjust(&mut self, field: Field, delta: i32, now: Duration) {
        let limit = field.limit() as i32;
        let slot = match field {
            Field::Hours => &mut self.hours,
            Field::Minutes => &mut self.minutes,
            Field::Seconds => &mut self.seconds,
        };
        *slot = (*slot as i32 + delta).rem_euclid(limit) as u32;
        self.remaining = self.entered();
        if self.is_running() {
            self.mode = TimerMode::Running {
                since: now,
                remaining_at_start: self.remaining,
            };
        }
        debug!("Timer fields set to {}", format_hms(self.remaining.as_secs()));
    }

    pub fn start(&mut self, ticker: &Ticker, now: Duration) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        if self.remaining.is_zero() {
            self.remaining = self.entered();
        }
        if self.remaining.is_zero() {
            info!("Timer not started: nothing to count down");
            return Ok(());
        }
        self.subscription = Some(ticker.subscribe(TickKind::Timer, self.interval)?);
        self.mode = TimerMode::Running {
            since: now,
            remaining_at_start: self.remaining,
        };
        info!("Timer started at {}", self.display());
        Ok(())
    }

    pub fn pause(&mut self, now: Duration) {
        self.advance(now);
        if self.is_running() {
            self.mode = TimerMode::Paused;
            self.subscription = None;
            info!("Timer paused at {}", self.display());
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

    pub fn reset(&mut self) {
        self.mode = TimerMode::Idle;
        self.subscription = None;
        self.hours = 0;
        self.minutes = 0;
        self.seconds = 0;
        self.remaining = Duration::ZERO;
        info!("Timer reset");
    }

    fn advance(&mut self, now: Duration) {
        if let TimerMode::Running { since, remaining_at_start } = self.mode {
            self.remaining = remaining_at_start.saturating_sub(now.saturating_sub(since));
            if self.remaining.is_zero() {
                self.mode = TimerMode::Idle;
                self.subscription = None;
                info!("Timer finished");
            }
        }
    }

    fn layout(viewport: Rect) -> (Rect, Rect, Rect) {
        let (fields, rest) = viewport.split_top(FIELD_STRIP);
        let (display, bar) = rest.split_bottom(BAR_HEIGHT);
        (fields, display, bar)
    }

    fn field_at(fields: Rect, pos: Vec2) -> Option<Field> {
        fields
            .columns(3)
            .iter()
            .position(|r| r.contains(pos))
            .map(|i| Field::ALL[i])
    }
}

impl Feature for CountdownTimer {
    fn name(&self) -> &'static str {
        "Timer"
    }

    fn tick(&mut self, now: Duration) {
        self.advance(now);
    }

    fn update(&mut self, _now: Duration) {}

    fn handle_event(&mut self, event: &UiEvent, viewport: Rect, ctx: &mut EventCtx) -> Result<Response> {
        let (fields, _, bar) = Self::layout(viewport);

        match *event {
            UiEvent::Scroll { pos, delta } => {
                if let Some(field) = Self::field_at(fields, pos) {
                    self.adjust(field, if delta > 0.0 { 1 } else { -1 }, ctx.now);
                    return Ok(Response::Handled);
                }
            }
            UiEvent::PointerDown { pos, button: BTN_LEFT } => {
                if let Some(field) = Self::field_at(fields, pos) {
                    self.adjust(field, 1, ctx.now);
                    return Ok(Response::Handled);
                }
            }
            _ => {}
        }

        match Control::from_event(event, bar) {
            Some(Control::Reset) => self.reset(),
            Some(Control::StartPause) => self.toggle(ctx.ticker, ctx.now)?,
            Some(Control::Share) => return Ok(Response::Share(self.share_message())),
            None => return Ok(Response::Ignored),
        }
        Ok(Response::Handled)
    }

    fn render(&self, draw: &mut DrawContext, viewport: Rect, palette: &Palette, _now: Duration) {
        let (fields, display, bar) = Self::layout(viewport);

        for (field, cell) in Field::ALL.iter().zip(fields.columns(3)) {
            let boxed = cell.inset(8.0);
            draw.fill_rect(boxed, palette.foreground.with_alpha(0.15));
            let c = boxed.center();
            let text = format!("{:02}", self.field(*field));
            segments::draw_text_centered(draw, &text, c.x, c.y, FIELD_TEXT, palette.foreground);
        }

        let c = display.center();
        let radius = (display.width.min(display.height) / 2.0 - 8.0).max(0.0);
        let ring_color = if self.is_running() { palette.accent } else { palette.foreground };
        draw.ring(c, radius, 2.0, ring_color);
        segments::draw_text_centered(draw, &self.display(), c.x, c.y, DISPLAY_TEXT.min(radius * 0.3), palette.foreground);

        controls::render(draw, bar, self.is_running(), palette);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticker::TickQueue;
    use calloop::EventLoop;
    use xkbcommon::xkb::keysyms;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn ticker() -> (EventLoop<'static, TickQueue>, Ticker) {
        let event_loop = EventLoop::try_new().unwrap();
        let ticker = Ticker::new(event_loop.handle());
        (event_loop, ticker)
    }

    fn timer_with(h: u32, m: u32, s: u32) -> CountdownTimer {
        let mut timer = CountdownTimer::new(secs(1));
        timer.adjust(Field::Hours, h as i32, Duration::ZERO);
        timer.adjust(Field::Minutes, m as i32, Duration::ZERO);
        timer.adjust(Field::Seconds, s as i32, Duration::ZERO);
        timer
    }

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(61), "00:01:01");
        assert_eq!(format_hms(3661), "01:01:01");
        assert_eq!(format_hms(100 * 3600), "100:00:00");
    }

    #[test]
    fn fields_wrap_in_both_directions() {
        let mut timer = CountdownTimer::new(secs(1));
        timer.adjust(Field::Minutes, -1, Duration::ZERO);
        assert_eq!(timer.field(Field::Minutes), 59);
        timer.adjust(Field::Minutes, 1, Duration::ZERO);
        assert_eq!(timer.field(Field::Minutes), 0);
        timer.adjust(Field::Hours, -1, Duration::ZERO);
        assert_eq!(timer.field(Field::Hours), 99);
        assert_eq!(timer.display(), "99:00:00");
    }

    #[test]
    fn counts_down_and_stops_at_zero() {
        let (_loop, ticker) = ticker();
        let mut timer = timer_with(0, 0, 3);
        timer.start(&ticker, secs(100)).unwrap();
        assert!(timer.is_running());
        assert_eq!(timer.display(), "00:00:03");

        timer.tick(secs(101));
        assert_eq!(timer.display(), "00:00:02");
        timer.tick(Duration::from_millis(101_500));
        assert_eq!(timer.display(), "00:00:02");
        timer.tick(secs(103));
        assert_eq!(timer.display(), "00:00:00");
        assert_eq!(timer.mode, TimerMode::Idle);
        assert!(timer.subscription.is_none());
        assert_eq!(timer.remaining(), Duration::ZERO);
    }

    #[test]
    fn late_tick_never_goes_negative() {
        let (_loop, ticker) = ticker();
        let mut timer = timer_with(0, 0, 2);
        timer.start(&ticker, secs(0)).unwrap();
        timer.tick(secs(60));
        assert_eq!(timer.remaining(), Duration::ZERO);
        assert_eq!(timer.mode, TimerMode::Idle);
    }

    #[test]
    fn pause_freezes_remaining_time() {
        let (_loop, ticker) = ticker();
        let mut timer = timer_with(0, 1, 0);
        timer.start(&ticker, secs(0)).unwrap();
        timer.pause(secs(20));
        assert_eq!(timer.mode, TimerMode::Paused);
        assert_eq!(timer.display(), "00:00:40");
        assert!(timer.subscription.is_none());

        timer.tick(secs(30));
        assert_eq!(timer.display(), "00:00:40");

        timer.start(&ticker, secs(50)).unwrap();
        timer.tick(secs(60));
        assert_eq!(timer.display(), "00:00:30");
    }

    #[test]
    fn zero_timer_does_not_start() {
        let (_loop, ticker) = ticker();
        let mut timer = CountdownTimer::new(secs(1));
        timer.start(&ticker, secs(0)).unwrap();
        assert_eq!(timer.mode, TimerMode::Idle);
        assert!(timer.subscription.is_none());
    }

    #[test]
    fn finished_timer_rearms_from_fields() {
        let (_loop, ticker) = ticker();
        let mut timer = timer_with(0, 0, 5);
        timer.start(&ticker, secs(0)).unwrap();
        timer.tick(secs(5));
        assert_eq!(timer.mode, TimerMode::Idle);
        timer.start(&ticker, secs(10)).unwrap();
        assert_eq!(timer.display(), "00:00:05");
    }

    #[test]
    fn reset_clears_fields_and_stops() {
        let (_loop, ticker) = ticker();
        let mut timer = timer_with(1, 2, 3);
        timer.start(&ticker, secs(0)).unwrap();
        timer.reset();
        assert_eq!(timer.mode, TimerMode::Idle);
        assert_eq!(timer.display(), "00:00:00");
        assert_eq!(timer.entered(), Duration::ZERO);
        assert!(timer.subscription.is_none());
    }

    #[test]
    fn editing_while_running_restarts_from_new_total() {
        let (_loop, ticker) = ticker();
        let mut timer = timer_with(0, 0, 30);
        timer.start(&ticker, secs(0)).unwrap();
        timer.tick(secs(10));
        timer.adjust(Field::Minutes, 1, secs(10));
        assert_eq!(timer.display(), "00:01:30");
        timer.tick(secs(20));
        assert_eq!(timer.display(), "00:01:20");
    }

    #[test]
    fn share_message_uses_remaining_time() {
        let timer = timer_with(0, 25, 0);
        assert_eq!(timer.share_message(), "Check out my timer set to: 00:25:00");
    }

    #[test]
    fn events_route_to_fields_and_controls() {
        let (_loop, ticker) = ticker();
        let mut timer = CountdownTimer::new(secs(1));
        let viewport = Rect::new(0.0, 0.0, 300.0, 400.0);
        let mut ctx = EventCtx { ticker: &ticker, now: secs(0) };

        let scroll = UiEvent::Scroll { pos: Vec2::new(150.0, 20.0), delta: 1.0 };
        assert_eq!(timer.handle_event(&scroll, viewport, &mut ctx).unwrap(), Response::Handled);
        assert_eq!(timer.field(Field::Minutes), 1);

        let start = UiEvent::Key(keysyms::KEY_space);
        timer.handle_event(&start, viewport, &mut ctx).unwrap();
        assert!(timer.is_running());

        let share = UiEvent::Key(keysyms::KEY_s);
        assert_eq!(
            timer.handle_event(&share, viewport, &mut ctx).unwrap(),
            Response::Share("Check out my timer set to: 00:01:00".to_string())
        );
    }
}
