use crate::config::{Config, Palette};
use crate::features::clock::{AnalogClock, ClockTime, SelectedTime};
use crate::features::stopwatch::Stopwatch;
use crate::features::timer::CountdownTimer;
use crate::features::{EventCtx, Feature, Response};
use crate::gfx::{draw::DrawContext, math::{Color, Rect, Vec2}, segments};
use crate::ticker::{TickKind, Ticker};
use anyhow::Result;
use log::info;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use xkbcommon::xkb::keysyms;

pub const BTN_LEFT: u32 = 0x110;
pub const BTN_RIGHT: u32 = 0x111;

pub const TAB_BAR_HEIGHT: f32 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiEvent {
    PointerEnter { pos: Vec2 },
    PointerLeave,
    PointerMove { pos: Vec2 },
    PointerDown { pos: Vec2, button: u32 },
    PointerUp,
    /// Positive `delta` scrolls up.
    Scroll { pos: Vec2, delta: f32 },
    Key(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Clock,
    Timer,
    Stopwatch,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Clock, Tab::Timer, Tab::Stopwatch];
}

pub struct App {
    pub config: Config,
    pub palette: Palette,
    pub tab: Tab,
    pub logical_size: [u32; 2],
    pub now: Duration,

    pub clock: AnalogClock,
    pub timer: CountdownTimer,
    pub stopwatch: Stopwatch,

    picked: Rc<Cell<Option<SelectedTime>>>,
    ticker: Ticker,
}

impl App {
    pub fn new(config: Config, ticker: Ticker) -> Result<Self> {
        let palette = config.theme.palette()?;
        let logical_size = [config.size.width, config.size.height];

        let mut clock = AnalogClock::new(
            ClockTime::now(),
            config.ticks.clock(),
            config.clock.digit_margin,
            config.animations_enabled,
        );
        let picked = Rc::new(Cell::new(None));
        let sink = Rc::clone(&picked);
        clock.on_time_select(move |selection| sink.set(Some(selection)));

        Ok(Self {
            timer: CountdownTimer::new(config.ticks.timer()),
            stopwatch: Stopwatch::new(config.ticks.stopwatch()),
            config,
            palette,
            tab: Tab::Clock,
            logical_size,
            now: Duration::ZERO,
            clock,
            picked,
            ticker,
        })
    }

    /// Starts the wall-clock refresh; the clock stays mounted for the app's lifetime.
    pub fn mount(&mut self) -> Result<()> {
        self.clock.mount(&self.ticker, self.config.ticks.clock())
    }

    /// Releases every tick source before the loop goes away.
    pub fn unmount(&mut self) {
        self.clock.unmount();
        self.timer.reset();
        self.stopwatch.reset(self.now);
    }

    pub fn picked(&self) -> Option<SelectedTime> {
        self.picked.get()
    }

    pub fn viewport(&self) -> Rect {
        Rect::new(0.0, 0.0, self.logical_size[0] as f32, self.logical_size[1] as f32)
    }

    /// `(content, tab_bar)`.
    pub fn layout(&self) -> (Rect, Rect) {
        self.viewport().split_bottom(TAB_BAR_HEIGHT)
    }

    pub fn tab_at(&self, pos: Vec2) -> Option<Tab> {
        let (_, bar) = self.layout();
        bar.columns(Tab::ALL.len())
            .iter()
            .position(|r| r.contains(pos))
            .map(|i| Tab::ALL[i])
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            info!("Switched to {}", self.active().name());
        }
    }

    fn active(&mut self) -> &mut dyn Feature {
        match self.tab {
            Tab::Clock => &mut self.clock,
            Tab::Timer => &mut self.timer,
            Tab::Stopwatch => &mut self.stopwatch,
        }
    }

    pub fn handle_event(&mut self, event: UiEvent) -> Result<()> {
        match event {
            UiEvent::PointerDown { pos, button: BTN_LEFT } => {
                if let Some(tab) = self.tab_at(pos) {
                    self.switch_tab(tab);
                    return Ok(());
                }
            }
            UiEvent::Key(keysyms::KEY_1) => {
                self.switch_tab(Tab::Clock);
                return Ok(());
            }
            UiEvent::Key(keysyms::KEY_2) => {
                self.switch_tab(Tab::Timer);
                return Ok(());
            }
            UiEvent::Key(keysyms::KEY_3) => {
                self.switch_tab(Tab::Stopwatch);
                return Ok(());
            }
            _ => {}
        }

        let (content, _) = self.layout();
        let ticker = self.ticker.clone();
        let mut ctx = EventCtx { ticker: &ticker, now: self.now };
        if let Response::Share(message) = self.active().handle_event(&event, content, &mut ctx)? {
            share(&message);
        }
        Ok(())
    }

    pub fn on_tick(&mut self, kind: TickKind) {
        let now = self.now;
        match kind {
            TickKind::Clock => self.clock.tick(now),
            TickKind::Timer => self.timer.tick(now),
            TickKind::Stopwatch => self.stopwatch.tick(now),
        }
    }

    pub fn update(&mut self, dt: Duration) {
        self.now += dt;
        let now = self.now;
        self.clock.update(now);
        self.timer.update(now);
        self.stopwatch.update(now);
    }

    pub fn render(&self, draw: &mut DrawContext) {
        let (content, bar) = self.layout();
        let palette = &self.palette;

        match self.tab {
            Tab::Clock => {
                self.clock.render(draw, content, palette, self.now);
                if let Some(picked) = self.picked() {
                    let text = format!("{:02}:{:02}", picked.hours, picked.minutes);
                    let c = content.center();
                    segments::draw_text_centered(draw, &text, c.x, content.y + content.height - 10.0, 12.0, palette.accent);
                }
            }
            Tab::Timer => self.timer.render(draw, content, palette, self.now),
            Tab::Stopwatch => self.stopwatch.render(draw, content, palette, self.now),
        }

        self.render_tab_bar(draw, bar);
    }

    fn render_tab_bar(&self, draw: &mut DrawContext, bar: Rect) {
        let palette = &self.palette;
        draw.rect(bar.x, bar.y, bar.width, 1.0, palette.foreground.with_alpha(0.3));

        for (tab, cell) in Tab::ALL.iter().zip(bar.columns(Tab::ALL.len())) {
            let active = *tab == self.tab;
            let color = if active { palette.accent } else { palette.foreground.with_alpha(0.5) };
            if active {
                draw.rect(cell.x + 8.0, cell.y + 1.0, cell.width - 16.0, 3.0, palette.accent);
            }
            tab_icon(draw, *tab, cell.center(), cell.height * 0.28, color);
        }
    }
}

fn tab_icon(draw: &mut DrawContext, tab: Tab, c: Vec2, r: f32, color: Color) {
    match tab {
        Tab::Clock => {
            draw.ring(c, r, 2.0, color);
            draw.line(c, c.polar_cw(r * 0.55, 300.0), 2.0, color);
            draw.line(c, c.polar_cw(r * 0.8, 0.0), 2.0, color);
        }
        Tab::Timer => {
            // Hourglass.
            draw.triangle(Vec2::new(c.x - r * 0.7, c.y - r), Vec2::new(c.x + r * 0.7, c.y - r), c, color);
            draw.triangle(c, Vec2::new(c.x + r * 0.7, c.y + r), Vec2::new(c.x - r * 0.7, c.y + r), color);
        }
        Tab::Stopwatch => {
            let face = Vec2::new(c.x, c.y + r * 0.15);
            draw.ring(face, r * 0.85, 2.0, color);
            draw.rect(c.x - r * 0.2, c.y - r * 1.05, r * 0.4, r * 0.3, color);
            draw.line(face, face.polar_cw(r * 0.6, 45.0), 2.0, color);
        }
    }
}

/// Sharing has no system sheet here: the message goes to the log and stdout.
fn share(message: &str) {
    info!("Sharing: {}", message);
    println!("{}", message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::clock::{layout_hour_digits, layout_minute_digits, PickerState};
    use crate::ticker::TickQueue;
    use calloop::EventLoop;

    fn app() -> (EventLoop<'static, TickQueue>, App) {
        let event_loop = EventLoop::try_new().unwrap();
        let app = App::new(Config::default(), Ticker::new(event_loop.handle())).unwrap();
        (event_loop, app)
    }

    fn click(pos: Vec2) -> UiEvent {
        UiEvent::PointerDown { pos, button: BTN_LEFT }
    }

    #[test]
    fn starts_on_the_clock_tab() {
        let (_loop, app) = app();
        assert_eq!(app.tab, Tab::Clock);
        assert!(app.picked().is_none());
        assert_eq!(app.layout().1.height, TAB_BAR_HEIGHT);
    }

    #[test]
    fn tab_bar_clicks_switch_screens() {
        let (_loop, mut app) = app();
        let (_, bar) = app.layout();
        let cols = bar.columns(3);
        app.handle_event(click(cols[2].center())).unwrap();
        assert_eq!(app.tab, Tab::Stopwatch);
        app.handle_event(click(cols[1].center())).unwrap();
        assert_eq!(app.tab, Tab::Timer);
        assert_eq!(app.tab_at(Vec2::new(10.0, 10.0)), None);
    }

    #[test]
    fn number_keys_switch_screens() {
        let (_loop, mut app) = app();
        app.handle_event(UiEvent::Key(keysyms::KEY_3)).unwrap();
        assert_eq!(app.tab, Tab::Stopwatch);
        app.handle_event(UiEvent::Key(keysyms::KEY_1)).unwrap();
        assert_eq!(app.tab, Tab::Clock);
    }

    #[test]
    fn picking_on_the_face_records_the_selection() {
        let (_loop, mut app) = app();
        let (content, _) = app.layout();
        let (_, face) = app.clock.layout(content);

        let seven = layout_hour_digits(&face)[6];
        assert_eq!(seven.value, 7);
        app.handle_event(click(seven.center)).unwrap();
        assert_eq!(app.clock.picker(), PickerState::Minutes { hour: 7 });
        assert!(app.picked().is_none());

        let thirty_five = layout_minute_digits(&face)[7];
        assert_eq!(thirty_five.value, 35);
        app.handle_event(click(thirty_five.center)).unwrap();
        assert_eq!(app.picked(), Some(SelectedTime { hours: 7, minutes: 35 }));
        assert_eq!(app.clock.picker(), PickerState::Hours);
    }

    #[test]
    fn right_click_cancels_a_pending_pick() {
        let (_loop, mut app) = app();
        app.clock.handle_digit_tap(4);
        app.handle_event(UiEvent::PointerDown { pos: Vec2::new(5.0, 5.0), button: BTN_RIGHT })
            .unwrap();
        assert_eq!(app.clock.picker(), PickerState::Hours);
        assert!(app.picked().is_none());
    }

    #[test]
    fn hidden_screens_keep_ticking() {
        let (_loop, mut app) = app();
        app.switch_tab(Tab::Stopwatch);
        app.handle_event(UiEvent::Key(keysyms::KEY_space)).unwrap();
        assert!(app.stopwatch.is_running());

        app.switch_tab(Tab::Clock);
        app.update(Duration::from_millis(1_500));
        app.on_tick(TickKind::Stopwatch);
        assert_eq!(app.stopwatch.display(), "00:01:50");
    }

    #[test]
    fn keys_go_to_the_active_screen_only() {
        let (_loop, mut app) = app();
        app.switch_tab(Tab::Timer);
        app.handle_event(UiEvent::Key(keysyms::KEY_space)).unwrap();
        assert!(!app.stopwatch.is_running());
    }

    #[test]
    fn unmount_stops_every_screen() {
        let (_loop, mut app) = app();
        app.mount().unwrap();
        assert!(app.clock.is_mounted());
        app.switch_tab(Tab::Stopwatch);
        app.handle_event(UiEvent::Key(keysyms::KEY_space)).unwrap();

        app.unmount();
        assert!(!app.clock.is_mounted());
        assert!(!app.stopwatch.is_running());
        assert!(!app.timer.is_running());
    }
}
