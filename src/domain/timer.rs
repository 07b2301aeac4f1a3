/// Timers shared by every timed behaviour in the simulation.
///
/// `Countdown` is a one-shot: armed with a duration, ticked with `dt`, and
/// reports the tick on which it ran out. `Repeat` is a free-running period
/// accumulator for frame-stepped animation (mouth frames, death frames,
/// blink toggles).
///
/// Both are plain values: they never read a clock, so the simulation stays
/// deterministic under a fixed `dt`.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Countdown {
    remaining: f32,
    running: bool,
}

impl Countdown {
    /// A countdown that is not running.
    pub const IDLE: Countdown = Countdown { remaining: 0.0, running: false };

    pub fn armed(secs: f32) -> Self {
        let mut c = Countdown::IDLE;
        c.arm(secs);
        c
    }

    /// Start (or restart) the countdown. An infinite duration never expires.
    pub fn arm(&mut self, secs: f32) {
        self.remaining = secs.max(0.0);
        self.running = true;
    }

    /// Advance by `dt`. Returns `true` only on the tick the countdown reaches zero.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.running {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.running = false;
            return true;
        }
        false
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ran to zero, or was never armed.
    pub fn is_expired(&self) -> bool {
        !self.running
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn clear(&mut self) {
        *self = Countdown::IDLE;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Repeat {
    period: f32,
    acc: f32,
}

impl Repeat {
    pub fn new(period: f32) -> Self {
        Repeat { period, acc: 0.0 }
    }

    /// Advance by `dt`. Returns how many whole periods elapsed.
    pub fn tick(&mut self, dt: f32) -> u32 {
        if self.period <= 0.0 {
            return 0;
        }
        self.acc += dt;
        let mut fired = 0;
        while self.acc >= self.period {
            self.acc -= self.period;
            fired += 1;
        }
        fired
    }

    pub fn reset(&mut self) {
        self.acc = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_fires_once() {
        let mut c = Countdown::armed(0.3);
        assert!(c.is_running());
        assert!(!c.tick(0.1));
        assert!(!c.tick(0.1));
        assert!(c.tick(0.15));
        assert!(c.is_expired());
        assert!(!c.tick(0.1), "an expired countdown stays quiet");
    }

    #[test]
    fn idle_countdown_never_fires() {
        let mut c = Countdown::IDLE;
        assert!(!c.tick(10.0));
        assert!(c.is_expired());
    }

    #[test]
    fn rearm_restarts_from_full() {
        let mut c = Countdown::armed(1.0);
        c.tick(0.9);
        c.arm(1.0);
        assert!(!c.tick(0.5));
        assert!((c.remaining() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn infinite_countdown_runs_forever() {
        let mut c = Countdown::armed(f32::INFINITY);
        for _ in 0..10_000 {
            assert!(!c.tick(0.1));
        }
        assert!(c.is_running());
    }

    #[test]
    fn repeat_counts_periods() {
        let mut r = Repeat::new(0.1);
        assert_eq!(r.tick(0.05), 0);
        assert_eq!(r.tick(0.06), 1);
        assert_eq!(r.tick(0.25), 2);
        r.reset();
        assert_eq!(r.tick(0.09), 0);
    }
}
