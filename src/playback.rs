//! Playback cursor, transport modes and the tick clock that drives them.

use std::time::{Duration, Instant};

use crate::config::{Direction, FrameHold, FrameRate};

/// Transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    #[default]
    Stopped,
    Forward,
    Reverse,
    Bounce,
}

/// Frame-advance state machine for the preview.
///
/// Every method that moves the cursor returns the new index so the caller
/// can refresh the display; `None` means nothing visible changed.
#[derive(Debug, Clone)]
pub struct Playback {
    cursor: usize,
    total: usize,
    mode: PlaybackMode,
    direction: isize,
    looping: bool,
    frame_hold: FrameHold,
    hold_counter: u8,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            cursor: 0,
            total: 0,
            mode: PlaybackMode::Stopped,
            direction: 1,
            looping: false,
            frame_hold: FrameHold::default(),
            hold_counter: 0,
        }
    }
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.mode != PlaybackMode::Stopped
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn direction(&self) -> isize {
        self.direction
    }

    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        if total == 0 {
            self.cursor = 0;
            self.stop();
        } else if self.cursor >= total {
            self.cursor = total - 1;
        }
    }

    pub fn set_frame_hold(&mut self, hold: FrameHold) {
        self.frame_hold = hold;
        self.hold_counter = 0;
    }

    /// Direction used when bouncing starts.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction.sign();
    }

    pub fn play_forward(&mut self) {
        self.start(PlaybackMode::Forward, 1);
    }

    pub fn play_reverse(&mut self) {
        self.start(PlaybackMode::Reverse, -1);
    }

    fn start(&mut self, mode: PlaybackMode, direction: isize) {
        if self.total == 0 {
            return;
        }
        self.direction = direction;
        self.mode = mode;
        self.hold_counter = 0;
    }

    pub fn toggle_bounce(&mut self) {
        if self.mode == PlaybackMode::Bounce {
            self.stop();
        } else if self.total > 0 {
            self.mode = PlaybackMode::Bounce;
            self.hold_counter = 0;
        }
    }

    pub fn stop(&mut self) {
        self.mode = PlaybackMode::Stopped;
        self.hold_counter = 0;
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.looping = !self.looping;
        self.looping
    }

    /// One timer period elapsed.
    pub fn tick(&mut self) -> Option<usize> {
        if self.mode == PlaybackMode::Stopped || self.total == 0 {
            return None;
        }

        self.hold_counter += 1;
        if self.hold_counter < self.frame_hold.get() {
            return None;
        }
        self.hold_counter = 0;

        let total = self.total as isize;
        let mut next = self.cursor as isize + self.direction;

        if self.mode == PlaybackMode::Bounce {
            if next >= total || next < 0 {
                self.direction = -self.direction;
                next += self.direction * 2;
            }
            // a single frame has nowhere to bounce to
            next = next.clamp(0, total - 1);
        } else {
            next = next.rem_euclid(total);
            if next == 0 && !self.looping {
                self.stop();
            }
        }

        self.cursor = next as usize;
        Some(self.cursor)
    }

    pub fn step_forward(&mut self) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.total;
        Some(self.cursor)
    }

    pub fn step_back(&mut self) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        self.cursor = (self.cursor + self.total - 1) % self.total;
        Some(self.cursor)
    }

    pub fn goto_start(&mut self) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        self.cursor = 0;
        Some(self.cursor)
    }

    pub fn goto_end(&mut self) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        self.cursor = self.total - 1;
        Some(self.cursor)
    }

    pub fn goto(&mut self, index: usize) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        self.cursor = index.min(self.total - 1);
        Some(self.cursor)
    }
}

/// Most ticks replayed at once after the UI thread stalled.
const MAX_CATCH_UP_TICKS: u32 = 4;

/// Turns wall-clock time into whole playback ticks.
#[derive(Debug, Clone)]
pub struct TickClock {
    interval: Duration,
    next_due: Instant,
}

impl TickClock {
    pub fn new(fps: FrameRate, now: Instant) -> Self {
        let interval = fps.tick_interval();
        Self {
            interval,
            next_due: now + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Restart the period, e.g. after the frame rate changed or playback resumed.
    pub fn reset(&mut self, fps: FrameRate, now: Instant) {
        *self = Self::new(fps, now);
    }

    /// Number of ticks that became due since the last call.
    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        let mut ticks = 0;
        while now >= self.next_due {
            ticks += 1;
            self.next_due += self.interval;
            if ticks == MAX_CATCH_UP_TICKS {
                self.next_due = now + self.interval;
                break;
            }
        }
        ticks
    }

    pub fn until_next(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playback(total: usize) -> Playback {
        let mut p = Playback::new();
        p.set_total(total);
        p
    }

    #[test]
    fn test_forward_without_loop_stops_on_wrap() {
        let mut p = playback(5);
        p.play_forward();

        let mut shown = Vec::new();
        while p.is_playing() {
            shown.push(p.tick().unwrap());
        }
        assert_eq!(shown, vec![1, 2, 3, 4, 0]);
        assert_eq!(p.mode(), PlaybackMode::Stopped);
        assert_eq!(p.tick(), None);
    }

    #[test]
    fn test_forward_with_loop_keeps_going() {
        let mut p = playback(3);
        p.toggle_loop();
        p.play_forward();
        let shown: Vec<_> = (0..7).filter_map(|_| p.tick()).collect();
        assert_eq!(shown, vec![1, 2, 0, 1, 2, 0, 1]);
        assert!(p.is_playing());
    }

    #[test]
    fn test_reverse_wraps_to_end_then_stops_at_zero() {
        let mut p = playback(4);
        p.play_reverse();
        let mut shown = Vec::new();
        while p.is_playing() {
            shown.push(p.tick().unwrap());
        }
        assert_eq!(shown, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_frame_hold_delays_advance() {
        let mut p = playback(4);
        p.set_frame_hold(FrameHold::new(3).unwrap());
        p.play_forward();
        let ticks: Vec<_> = (0..6).map(|_| p.tick()).collect();
        assert_eq!(ticks, vec![None, None, Some(1), None, None, Some(2)]);
    }

    #[test]
    fn test_reselecting_mode_restarts_hold_counter() {
        let mut p = playback(4);
        p.set_frame_hold(FrameHold::new(2).unwrap());
        p.play_forward();
        assert_eq!(p.tick(), None);
        p.play_forward();
        assert_eq!(p.tick(), None);
        assert_eq!(p.tick(), Some(1));
    }

    #[test]
    fn test_bounce_reflects_at_both_ends() {
        let mut p = playback(4);
        p.toggle_bounce();
        let shown: Vec<_> = (0..10).filter_map(|_| p.tick()).collect();
        assert_eq!(shown, vec![1, 2, 3, 2, 1, 0, 1, 2, 3, 2]);
    }

    #[test]
    fn test_bounce_stays_in_range_for_any_length() {
        for total in 1..8 {
            let mut p = playback(total);
            p.toggle_bounce();
            for _ in 0..50 {
                let index = p.tick().unwrap();
                assert!(index < total, "index {} out of range for {}", index, total);
            }
        }
    }

    #[test]
    fn test_bounce_ignores_loop_flag() {
        let mut p = playback(3);
        p.toggle_bounce();
        for _ in 0..20 {
            p.tick();
        }
        assert_eq!(p.mode(), PlaybackMode::Bounce);
    }

    #[test]
    fn test_bounce_starts_with_configured_direction() {
        let mut p = playback(4);
        p.goto_end();
        p.set_direction(Direction::Reverse);
        p.toggle_bounce();
        assert_eq!(p.tick(), Some(2));
    }

    #[test]
    fn test_toggle_bounce_twice_stops() {
        let mut p = playback(3);
        p.toggle_bounce();
        p.toggle_bounce();
        assert!(!p.is_playing());
    }

    #[test]
    fn test_manual_navigation_keeps_mode() {
        let mut p = playback(5);
        p.play_forward();
        assert_eq!(p.step_back(), Some(4));
        assert_eq!(p.step_forward(), Some(0));
        assert_eq!(p.goto_end(), Some(4));
        assert_eq!(p.goto_start(), Some(0));
        assert_eq!(p.mode(), PlaybackMode::Forward);
    }

    #[test]
    fn test_empty_sequence_does_not_play() {
        let mut p = Playback::new();
        p.play_forward();
        p.toggle_bounce();
        assert!(!p.is_playing());
        assert_eq!(p.tick(), None);
        assert_eq!(p.step_forward(), None);
        assert_eq!(p.goto_end(), None);
    }

    #[test]
    fn test_shrinking_total_clamps_cursor() {
        let mut p = playback(5);
        p.goto_end();
        p.set_total(2);
        assert_eq!(p.cursor(), 1);
        p.play_forward();
        p.set_total(0);
        assert_eq!(p.cursor(), 0);
        assert!(!p.is_playing());
    }

    #[test]
    fn test_tick_clock_counts_elapsed_periods() {
        let start = Instant::now();
        let mut clock = TickClock::new(FrameRate::Fps24, start);
        assert_eq!(clock.due_ticks(start), 0);
        assert_eq!(clock.due_ticks(start + Duration::from_millis(41)), 1);
        assert_eq!(clock.due_ticks(start + Duration::from_millis(124)), 2);
        assert_eq!(
            clock.until_next(start + Duration::from_millis(124)),
            Duration::from_millis(40)
        );
    }

    #[test]
    fn test_tick_clock_limits_catch_up() {
        let start = Instant::now();
        let mut clock = TickClock::new(FrameRate::Fps30, start);
        let later = start + Duration::from_secs(10);
        assert_eq!(clock.due_ticks(later), MAX_CATCH_UP_TICKS);
        assert_eq!(clock.until_next(later), clock.interval());
    }
}
