//! Analog clock face with a digital readout and a two-step tap time picker.
//!
//! The widget keeps a [`ClockTime`] snapshot that the host replaces on every
//! tick. Hand angles, the AM/PM indicator and the readout are derived from
//! that snapshot. Independently of the face, tapping an hour digit and then a
//! minute digit emits a [`SelectedTime`] to the installed handler.

use crate::app::{UiEvent, BTN_LEFT, BTN_RIGHT};
use crate::config::Palette;
use crate::features::{EventCtx, Feature, Response};
use crate::gfx::{
    anim::{lerp, Timeline},
    draw::DrawContext,
    math::{Rect, Vec2},
    segments,
};
use crate::ticker::{TickKind, TickSubscription, Ticker};
use anyhow::Result;
use log::{debug, info, warn};
use std::sync::Once;
use std::time::Duration;
use time::OffsetDateTime;
use xkbcommon::xkb::keysyms;

/// Side of the square touch target around each digit.
pub const TOUCH_SIZE: f32 = 40.0;

const READOUT_HEIGHT: f32 = 28.0;
const HOUR_LABEL_HEIGHT: f32 = 18.0;
const MINUTE_LABEL_HEIGHT: f32 = 14.0;

static LOCAL_OFFSET_WARNING: Once = Once::new();

/// Wall-clock snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
    second: u8,
}

impl ClockTime {
    pub fn from_hms(hour: u8, minute: u8, second: u8) -> Option<Self> {
        (hour < 24 && minute < 60 && second < 60).then_some(Self { hour, minute, second })
    }

    /// Local wall time, or UTC when the local offset cannot be determined.
    pub fn now() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|e| {
            LOCAL_OFFSET_WARNING.call_once(|| warn!("Local UTC offset unavailable ({}), using UTC", e));
            OffsetDateTime::now_utc()
        });
        Self::from(now.time())
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    pub fn meridiem(&self) -> Meridiem {
        if self.hour >= 12 {
            Meridiem::Pm
        } else {
            Meridiem::Am
        }
    }

    /// Hour on a 12-hour dial, `1..=12`.
    pub fn hour12(&self) -> u8 {
        match self.hour % 12 {
            0 => 12,
            h => h,
        }
    }

    /// `HH:MM AM` in 12-hour form.
    pub fn readout(&self) -> String {
        format!("{:02}:{:02} {}", self.hour12(), self.minute, self.meridiem().as_str())
    }
}

impl From<time::Time> for ClockTime {
    fn from(t: time::Time) -> Self {
        Self {
            hour: t.hour(),
            minute: t.minute(),
            second: t.second(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        }
    }
}

/// Hand rotations in degrees, clockwise from 12 o'clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandAngles {
    pub hour: f32,
    pub minute: f32,
    pub second: f32,
}

impl HandAngles {
    pub fn from_time(t: ClockTime) -> Self {
        let second = t.second as f32;
        let minute = t.minute as f32;
        Self {
            second: second * 6.0,
            minute: (minute + second / 60.0) * 6.0,
            hour: ((t.hour % 12) as f32 + minute / 60.0) * 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Hours,
    Minutes { hour: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedTime {
    pub hours: u8,
    pub minutes: u8,
}

/// Dial geometry in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceGeometry {
    pub center: Vec2,
    pub radius: f32,
    /// Inset of the digit circle from the rim.
    pub margin: f32,
}

impl FaceGeometry {
    /// Largest face that fits `area`, leaving a small gutter.
    pub fn fit(area: Rect, margin: f32) -> Self {
        Self {
            center: area.center(),
            radius: (area.width.min(area.height) / 2.0 - 4.0).max(0.0),
            margin,
        }
    }

    pub fn digit_radius(&self) -> f32 {
        (self.radius - self.margin).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DigitPosition {
    pub value: u8,
    pub center: Vec2,
}

/// Hour digits 1..=12; digit 3 sits at angle 0 and angles grow clockwise.
pub fn layout_hour_digits(geometry: &FaceGeometry) -> [DigitPosition; 12] {
    let r = geometry.digit_radius();
    std::array::from_fn(|i| {
        let value = i as u8 + 1;
        let angle = ((value as f32 - 3.0) * 30.0).to_radians();
        DigitPosition {
            value,
            center: Vec2::new(
                geometry.center.x + r * angle.cos(),
                geometry.center.y + r * angle.sin(),
            ),
        }
    })
}

/// Minute values 0, 5, .., 55 with 0 at the top.
pub fn layout_minute_digits(geometry: &FaceGeometry) -> [DigitPosition; 12] {
    let r = geometry.digit_radius();
    std::array::from_fn(|i| {
        let value = i as u8 * 5;
        let angle = (value as f32 / 60.0 * 360.0 - 90.0).to_radians();
        DigitPosition {
            value,
            center: Vec2::new(
                geometry.center.x + r * angle.cos(),
                geometry.center.y + r * angle.sin(),
            ),
        }
    })
}

/// Eased interpolation of one hand toward its latest angle. Always sweeps forward.
#[derive(Debug, Clone)]
pub struct HandSweep {
    from: f32,
    to: f32,
    tl: Timeline,
    primed: bool,
}

impl HandSweep {
    pub fn new(duration: f32) -> Self {
        Self {
            from: 0.0,
            to: 0.0,
            tl: Timeline::new(duration),
            primed: false,
        }
    }

    pub fn retarget(&mut self, target: f32, now: f32, animate: bool) {
        self.tl.start(now);
        if !self.primed || !animate {
            self.from = target;
            self.to = target;
            self.primed = true;
            return;
        }
        let current = self.angle();
        let mut to = target;
        if to < current {
            to += 360.0;
        }
        self.from = current;
        self.to = to;
    }

    pub fn update(&mut self, now: f32) {
        self.tl.update(now);
    }

    /// Angle to draw right now, in `0..360`.
    pub fn angle(&self) -> f32 {
        lerp(self.from, self.to, self.tl.eased_progress()) % 360.0
    }

    pub fn target(&self) -> f32 {
        self.to % 360.0
    }

    fn needs_retarget(&self, target: f32) -> bool {
        !self.primed || (self.target() - target).abs() > 1e-3
    }
}

pub struct AnalogClock {
    time: ClockTime,
    angles: HandAngles,
    meridiem: Meridiem,
    readout: String,
    picker: PickerState,
    on_time_select: Option<Box<dyn FnMut(SelectedTime)>>,
    hour_sweep: HandSweep,
    minute_sweep: HandSweep,
    second_sweep: HandSweep,
    animate: bool,
    digit_margin: f32,
    subscription: Option<TickSubscription>,
}

impl AnalogClock {
    pub fn new(initial: ClockTime, tick_interval: Duration, digit_margin: f32, animate: bool) -> Self {
        let sweep = tick_interval.as_secs_f32();
        let mut clock = Self {
            time: initial,
            angles: HandAngles::from_time(initial),
            meridiem: initial.meridiem(),
            readout: initial.readout(),
            picker: PickerState::Hours,
            on_time_select: None,
            hour_sweep: HandSweep::new(sweep),
            minute_sweep: HandSweep::new(sweep),
            second_sweep: HandSweep::new(sweep),
            animate,
            digit_margin,
            subscription: None,
        };
        clock.on_tick(initial);
        clock
    }

    pub fn on_time_select(&mut self, handler: impl FnMut(SelectedTime) + 'static) {
        self.on_time_select = Some(Box::new(handler));
    }

    /// Starts the recurring wall-clock refresh. Replaces any earlier subscription.
    pub fn mount(&mut self, ticker: &Ticker, interval: Duration) -> Result<()> {
        self.subscription = Some(ticker.subscribe(TickKind::Clock, interval)?);
        self.on_tick(ClockTime::now());
        Ok(())
    }

    pub fn unmount(&mut self) {
        self.subscription = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn on_tick(&mut self, now: ClockTime) {
        self.time = now;
        self.angles = HandAngles::from_time(now);
        self.meridiem = now.meridiem();
        self.readout = now.readout();
    }

    pub fn time(&self) -> ClockTime {
        self.time
    }

    pub fn angles(&self) -> HandAngles {
        self.angles
    }

    pub fn meridiem(&self) -> Meridiem {
        self.meridiem
    }

    pub fn readout(&self) -> &str {
        &self.readout
    }

    pub fn picker(&self) -> PickerState {
        self.picker
    }

    /// First step of the picker. Returns whether the tap was accepted.
    pub fn handle_digit_tap(&mut self, digit: u8) -> bool {
        if self.picker != PickerState::Hours || !(1..=12).contains(&digit) {
            debug!("Ignoring hour tap {} in {:?}", digit, self.picker);
            return false;
        }
        self.picker = PickerState::Minutes { hour: digit };
        debug!("Hour {} picked, waiting for minutes", digit);
        true
    }

    /// Second step of the picker; emits the selection. Returns whether the tap was accepted.
    pub fn handle_minute_tap(&mut self, value: u8) -> bool {
        let hour = match self.picker {
            PickerState::Minutes { hour } if value <= 55 && value % 5 == 0 => hour,
            _ => {
                debug!("Ignoring minute tap {} in {:?}", value, self.picker);
                return false;
            }
        };
        self.picker = PickerState::Hours;
        let selection = SelectedTime { hours: hour, minutes: value };
        info!("Time picked: {:02}:{:02}", selection.hours, selection.minutes);
        if let Some(handler) = self.on_time_select.as_mut() {
            handler(selection);
        }
        true
    }

    /// Abandons a half-finished selection without emitting anything.
    pub fn cancel_selection(&mut self) -> bool {
        if let PickerState::Minutes { hour } = self.picker {
            debug!("Selection of hour {} cancelled", hour);
            self.picker = PickerState::Hours;
            true
        } else {
            false
        }
    }

    /// Digit of the currently visible set under `pos`, if any.
    pub fn hit_test(&self, pos: Vec2, geometry: &FaceGeometry) -> Option<u8> {
        let digits = match self.picker {
            PickerState::Hours => layout_hour_digits(geometry),
            PickerState::Minutes { .. } => layout_minute_digits(geometry),
        };
        digits
            .iter()
            .filter(|d| Rect::centered(d.center, TOUCH_SIZE).contains(pos))
            .min_by(|a, b| a.center.distance(pos).total_cmp(&b.center.distance(pos)))
            .map(|d| d.value)
    }

    /// Splits the feature viewport into the readout strip and the face.
    pub fn layout(&self, viewport: Rect) -> (Rect, FaceGeometry) {
        let (readout, face) = viewport.split_top(READOUT_HEIGHT + 16.0);
        (readout, FaceGeometry::fit(face, self.digit_margin))
    }

    fn tap(&mut self, pos: Vec2, viewport: Rect) -> bool {
        let (_, geometry) = self.layout(viewport);
        match (self.hit_test(pos, &geometry), self.picker) {
            (Some(digit), PickerState::Hours) => self.handle_digit_tap(digit),
            (Some(value), PickerState::Minutes { .. }) => self.handle_minute_tap(value),
            (None, _) => false,
        }
    }
}

impl Feature for AnalogClock {
    fn name(&self) -> &'static str {
        "Clock"
    }

    fn tick(&mut self, _now: Duration) {
        self.on_tick(ClockTime::now());
    }

    fn update(&mut self, now: Duration) {
        let t = now.as_secs_f32();
        let angles = self.angles;
        for (sweep, target) in [
            (&mut self.hour_sweep, angles.hour),
            (&mut self.minute_sweep, angles.minute),
            (&mut self.second_sweep, angles.second),
        ] {
            if sweep.needs_retarget(target) {
                sweep.retarget(target, t, self.animate);
            }
            sweep.update(t);
        }
    }

    fn handle_event(&mut self, event: &UiEvent, viewport: Rect, _ctx: &mut EventCtx) -> Result<Response> {
        let handled = match *event {
            UiEvent::PointerDown { pos, button: BTN_LEFT } => self.tap(pos, viewport),
            UiEvent::PointerDown { button: BTN_RIGHT, .. } => self.cancel_selection(),
            UiEvent::Key(keysyms::KEY_Escape) => self.cancel_selection(),
            _ => false,
        };
        Ok(if handled { Response::Handled } else { Response::Ignored })
    }

    fn render(&self, draw: &mut DrawContext, viewport: Rect, palette: &Palette, _now: Duration) {
        let (readout_rect, face) = self.layout(viewport);
        let c = readout_rect.center();
        segments::draw_text_centered(draw, &self.readout, c.x, c.y, READOUT_HEIGHT, palette.foreground);

        draw.ring(face.center, face.radius, 2.0, palette.foreground);

        match self.picker {
            PickerState::Hours => {
                for d in layout_hour_digits(&face) {
                    let label = d.value.to_string();
                    segments::draw_text_centered(draw, &label, d.center.x, d.center.y, HOUR_LABEL_HEIGHT, palette.foreground);
                }
            }
            PickerState::Minutes { hour } => {
                for d in layout_minute_digits(&face) {
                    let label = format!("{:02}", d.value);
                    segments::draw_text_centered(draw, &label, d.center.x, d.center.y, MINUTE_LABEL_HEIGHT, palette.accent);
                }
                let label = format!("{:02}", hour);
                let y = face.center.y - face.radius * 0.35;
                segments::draw_text_centered(draw, &label, face.center.x, y, HOUR_LABEL_HEIGHT, palette.accent);
            }
        }

        let r = face.radius;
        let hands = [
            (self.hour_sweep.angle(), r * 0.5, 6.0, palette.foreground),
            (self.minute_sweep.angle(), r * 0.72, 4.0, palette.accent),
            (self.second_sweep.angle(), r * 0.88, 2.0, palette.second_hand),
        ];
        for (angle, length, thickness, color) in hands {
            draw.line(face.center, face.center.polar_cw(length, angle), thickness, color);
        }
        draw.disc(face.center, 5.0, palette.foreground);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn hms(h: u8, m: u8, s: u8) -> ClockTime {
        ClockTime::from_hms(h, m, s).unwrap()
    }

    fn clock() -> AnalogClock {
        AnalogClock::new(hms(0, 0, 0), Duration::from_secs(1), 30.0, true)
    }

    fn recording_clock() -> (AnalogClock, Rc<RefCell<Vec<SelectedTime>>>) {
        let mut clock = clock();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        clock.on_time_select(move |t| sink.borrow_mut().push(t));
        (clock, seen)
    }

    fn geometry() -> FaceGeometry {
        FaceGeometry {
            center: Vec2::new(150.0, 150.0),
            radius: 150.0,
            margin: 30.0,
        }
    }

    fn near(a: Vec2, x: f32, y: f32) -> bool {
        (a.x - x).abs() < 1e-3 && (a.y - y).abs() < 1e-3
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert!(ClockTime::from_hms(24, 0, 0).is_none());
        assert!(ClockTime::from_hms(0, 60, 0).is_none());
        assert!(ClockTime::from_hms(0, 0, 60).is_none());
        assert!(ClockTime::from_hms(23, 59, 59).is_some());
    }

    #[test]
    fn second_angle_is_six_degrees_per_second() {
        for s in 0..60 {
            let a = HandAngles::from_time(hms(0, 0, s));
            assert_eq!(a.second, s as f32 * 6.0);
            assert!((0.0..=354.0).contains(&a.second));
        }
    }

    #[test]
    fn minute_and_hour_angles_stay_below_a_full_turn() {
        for h in 0..24 {
            for m in 0..60 {
                for s in [0, 30, 59] {
                    let a = HandAngles::from_time(hms(h, m, s));
                    let expected_minute = (m as f32 + s as f32 / 60.0) * 6.0;
                    let expected_hour = ((h % 12) as f32 + m as f32 / 60.0) * 30.0;
                    assert_eq!(a.minute, expected_minute);
                    assert_eq!(a.hour, expected_hour);
                    assert!(a.minute >= 0.0 && a.minute < 360.0);
                    assert!(a.hour >= 0.0 && a.hour < 360.0);
                }
            }
        }
    }

    #[test]
    fn afternoon_hours_share_the_dial_with_morning_hours() {
        assert_eq!(HandAngles::from_time(hms(15, 0, 0)).hour, 90.0);
        assert_eq!(HandAngles::from_time(hms(3, 0, 0)).hour, 90.0);
        assert_eq!(HandAngles::from_time(hms(6, 30, 0)).hour, 195.0);
    }

    #[test]
    fn readout_uses_twelve_hour_form() {
        assert_eq!(hms(0, 5, 0).readout(), "12:05 AM");
        assert_eq!(hms(13, 7, 0).readout(), "01:07 PM");
        assert_eq!(hms(12, 0, 0).readout(), "12:00 PM");
        assert_eq!(hms(11, 59, 59).readout(), "11:59 AM");
        assert_eq!(hms(0, 0, 0).meridiem(), Meridiem::Am);
        assert_eq!(hms(13, 0, 0).hour12(), 1);
    }

    #[test]
    fn tick_replaces_all_derived_state() {
        let mut clock = clock();
        clock.on_tick(hms(13, 15, 30));
        assert_eq!(clock.time(), hms(13, 15, 30));
        assert_eq!(clock.meridiem(), Meridiem::Pm);
        assert_eq!(clock.readout(), "01:15 PM");
        assert_eq!(clock.angles().second, 180.0);
    }

    #[test]
    fn repeated_identical_ticks_do_not_drift() {
        let mut clock = clock();
        clock.on_tick(hms(9, 41, 17));
        let first = clock.angles();
        for _ in 0..1000 {
            clock.on_tick(hms(9, 41, 17));
        }
        assert_eq!(clock.angles(), first);
    }

    #[test]
    fn hour_digits_follow_the_dial() {
        let g = geometry();
        let digits = layout_hour_digits(&g);
        assert_eq!(digits.map(|d| d.value), [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        assert!(near(digits[11].center, 150.0, 30.0));
        assert!(near(digits[2].center, 270.0, 150.0));
        assert!(near(digits[5].center, 150.0, 270.0));
        assert!(near(digits[8].center, 30.0, 150.0));
    }

    #[test]
    fn minute_digits_start_at_the_top() {
        let g = geometry();
        let digits = layout_minute_digits(&g);
        assert_eq!(digits.map(|d| d.value), [0, 5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55]);
        assert!(near(digits[0].center, 150.0, 30.0));
        assert!(near(digits[3].center, 270.0, 150.0));
        assert!(near(digits[6].center, 150.0, 270.0));
    }

    #[test]
    fn layouts_are_deterministic() {
        let g = geometry();
        assert_eq!(layout_hour_digits(&g), layout_hour_digits(&g));
        assert_eq!(layout_minute_digits(&g), layout_minute_digits(&g));
    }

    #[test]
    fn full_picker_cycle_emits_once() {
        let (mut clock, seen) = recording_clock();
        assert_eq!(clock.picker(), PickerState::Hours);
        assert!(clock.handle_digit_tap(7));
        assert_eq!(clock.picker(), PickerState::Minutes { hour: 7 });
        assert!(seen.borrow().is_empty());
        assert!(clock.handle_minute_tap(35));
        assert_eq!(*seen.borrow(), vec![SelectedTime { hours: 7, minutes: 35 }]);
        assert_eq!(clock.picker(), PickerState::Hours);
    }

    #[test]
    fn twelve_and_zero_are_valid_boundaries() {
        let (mut clock, seen) = recording_clock();
        clock.handle_digit_tap(12);
        clock.handle_minute_tap(0);
        assert_eq!(*seen.borrow(), vec![SelectedTime { hours: 12, minutes: 0 }]);
    }

    #[test]
    fn hour_tap_alone_never_emits() {
        let (mut clock, seen) = recording_clock();
        clock.handle_digit_tap(3);
        clock.on_tick(hms(4, 0, 0));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn invalid_taps_are_ignored() {
        let (mut clock, seen) = recording_clock();
        assert!(!clock.handle_minute_tap(10));
        assert!(!clock.handle_digit_tap(0));
        assert!(!clock.handle_digit_tap(13));
        assert_eq!(clock.picker(), PickerState::Hours);

        clock.handle_digit_tap(4);
        assert!(!clock.handle_digit_tap(5));
        assert!(!clock.handle_minute_tap(7));
        assert!(!clock.handle_minute_tap(60));
        assert_eq!(clock.picker(), PickerState::Minutes { hour: 4 });
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn cancel_returns_to_hours_silently() {
        let (mut clock, seen) = recording_clock();
        assert!(!clock.cancel_selection());
        clock.handle_digit_tap(9);
        assert!(clock.cancel_selection());
        assert_eq!(clock.picker(), PickerState::Hours);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn selection_without_handler_still_resets() {
        let mut clock = clock();
        clock.handle_digit_tap(1);
        assert!(clock.handle_minute_tap(55));
        assert_eq!(clock.picker(), PickerState::Hours);
    }

    #[test]
    fn hit_test_uses_visible_digit_set() {
        let mut clock = clock();
        let g = geometry();
        let top = Vec2::new(152.0, 28.0);
        assert_eq!(clock.hit_test(top, &g), Some(12));
        assert_eq!(clock.hit_test(Vec2::new(270.0, 150.0), &g), Some(3));
        assert_eq!(clock.hit_test(g.center, &g), None);

        clock.handle_digit_tap(12);
        assert_eq!(clock.hit_test(top, &g), Some(0));
        assert_eq!(clock.hit_test(Vec2::new(270.0, 150.0), &g), Some(15));
    }

    #[test]
    fn sweep_snaps_on_first_target() {
        let mut sweep = HandSweep::new(1.0);
        sweep.retarget(90.0, 0.0, true);
        sweep.update(0.0);
        assert_eq!(sweep.angle(), 90.0);
    }

    #[test]
    fn sweep_moves_forward_across_twelve() {
        let mut sweep = HandSweep::new(1.0);
        sweep.retarget(354.0, 0.0, true);
        sweep.retarget(0.0, 1.0, true);
        sweep.update(1.5);
        let mid = sweep.angle();
        assert!(mid > 354.0 && mid < 360.0, "mid-sweep angle {}", mid);
        sweep.update(2.0);
        assert_eq!(sweep.angle(), 0.0);
        assert_eq!(sweep.target(), 0.0);
    }

    #[test]
    fn sweep_without_animation_jumps() {
        let mut sweep = HandSweep::new(1.0);
        sweep.retarget(10.0, 0.0, false);
        sweep.retarget(20.0, 1.0, false);
        sweep.update(1.0);
        assert_eq!(sweep.angle(), 20.0);
    }

    #[test]
    fn update_retargets_hands_after_a_tick() {
        let mut clock = clock();
        clock.update(Duration::from_secs(10));
        clock.on_tick(hms(0, 0, 1));
        clock.update(Duration::from_secs(11));
        assert_eq!(clock.second_sweep.target(), 6.0);
        clock.update(Duration::from_secs(12));
        assert_eq!(clock.second_sweep.angle(), 6.0);
    }
}
