//! Recurring ticks on top of the calloop event loop.
//!
//! A screen asks the [`Ticker`] for a [`TickSubscription`] when it becomes
//! active and keeps it for as long as it needs refreshing. Dropping the
//! subscription removes the timer source from the loop. Tick callbacks only
//! enqueue a [`TickKind`]; the app drains the queue after each dispatch.

use anyhow::{anyhow, Result};
use calloop::timer::{TimeoutAction, Timer};
use calloop::{LoopHandle, RegistrationToken};
use log::debug;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    Clock,
    Timer,
    Stopwatch,
}

/// Loop data shared by every tick callback.
#[derive(Debug, Default)]
pub struct TickQueue {
    pending: Vec<TickKind>,
}

impl TickQueue {
    pub fn push(&mut self, kind: TickKind) {
        // One pending tick per kind is enough; a late loop should not replay a burst.
        if !self.pending.contains(&kind) {
            self.pending.push(kind);
        }
    }

    pub fn drain(&mut self) -> impl Iterator<Item = TickKind> + '_ {
        self.pending.drain(..)
    }
}

#[derive(Clone)]
pub struct Ticker {
    handle: LoopHandle<'static, TickQueue>,
}

impl Ticker {
    pub fn new(handle: LoopHandle<'static, TickQueue>) -> Self {
        Self { handle }
    }

    /// Registers a timer that enqueues `kind` every `interval`, first firing one interval from now.
    pub fn subscribe(&self, kind: TickKind, interval: Duration) -> Result<TickSubscription> {
        let token = self
            .handle
            .insert_source(Timer::from_duration(interval), move |_, _, queue: &mut TickQueue| {
                queue.push(kind);
                TimeoutAction::ToDuration(interval)
            })
            .map_err(|e| anyhow!("Failed to register {:?} tick source: {}", kind, e.error))?;

        debug!("Subscribed {:?} ticks every {:?}", kind, interval);
        Ok(TickSubscription {
            handle: self.handle.clone(),
            token: Some(token),
            kind,
        })
    }
}

/// Live tick registration; the timer source is removed on drop.
pub struct TickSubscription {
    handle: LoopHandle<'static, TickQueue>,
    token: Option<RegistrationToken>,
    kind: TickKind,
}

impl TickSubscription {
    pub fn kind(&self) -> TickKind {
        self.kind
    }
}

impl Drop for TickSubscription {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            self.handle.remove(token);
            debug!("Released {:?} ticks", self.kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calloop::EventLoop;

    #[test]
    fn queue_coalesces_repeated_kinds() {
        let mut queue = TickQueue::default();
        queue.push(TickKind::Clock);
        queue.push(TickKind::Stopwatch);
        queue.push(TickKind::Clock);
        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained, vec![TickKind::Clock, TickKind::Stopwatch]);
        assert!(queue.drain().next().is_none());
    }

    #[test]
    fn subscription_fires_until_dropped() {
        let mut event_loop: EventLoop<'static, TickQueue> = EventLoop::try_new().unwrap();
        let ticker = Ticker::new(event_loop.handle());
        let mut queue = TickQueue::default();

        let sub = ticker.subscribe(TickKind::Timer, Duration::from_millis(5)).unwrap();
        assert_eq!(sub.kind(), TickKind::Timer);

        std::thread::sleep(Duration::from_millis(10));
        event_loop.dispatch(Some(Duration::from_millis(50)), &mut queue).unwrap();
        assert_eq!(queue.drain().collect::<Vec<_>>(), vec![TickKind::Timer]);

        drop(sub);
        std::thread::sleep(Duration::from_millis(10));
        event_loop.dispatch(Some(Duration::from_millis(20)), &mut queue).unwrap();
        assert!(queue.drain().next().is_none());
    }
}
