//! Slow-start / congestion-avoidance window controller.
//!
//! [`CongestionWindow`] decides how many packets the sender may emit per
//! round:
//!
//! ```text
//!  ACK advancing the window:  cwnd < ssthresh  →  cwnd *= 2   (slow start)
//!                             otherwise        →  cwnd += 1   (avoidance)
//!  timeout:                   cwnd = 1
//! ```
//!
//! The threshold stays fixed for the whole transfer unless
//! [`CongestionWindow::with_threshold_decrease`] is used, in which case each
//! timeout also halves it (never below [`MIN_THRESHOLD`]).

/// Default slow-start threshold.
pub const INITIAL_THRESHOLD: u32 = 16;

/// Floor for the threshold when multiplicative decrease is enabled.
pub const MIN_THRESHOLD: u32 = 2;

/// Growth regime the window is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SlowStart,
    CongestionAvoidance,
}

#[derive(Debug, Clone)]
pub struct CongestionWindow {
    cwnd: u32,
    ssthresh: u32,
    decrease_threshold: bool,
}

impl CongestionWindow {
    /// Start in slow start with a window of one packet.
    pub fn new(ssthresh: u32) -> Self {
        Self {
            cwnd: 1,
            ssthresh,
            decrease_threshold: false,
        }
    }

    /// Also halve the threshold on every timeout.
    pub fn with_threshold_decrease(mut self, enabled: bool) -> Self {
        self.decrease_threshold = enabled;
        self
    }

    /// Packets that may be sent in the next round.
    pub fn size(&self) -> u32 {
        self.cwnd
    }

    pub fn threshold(&self) -> u32 {
        self.ssthresh
    }

    pub fn phase(&self) -> Phase {
        if self.cwnd < self.ssthresh {
            Phase::SlowStart
        } else {
            Phase::CongestionAvoidance
        }
    }

    /// Grow after a cumulative ACK advanced the send base.  Returns the
    /// regime that was applied.
    pub fn on_ack(&mut self) -> Phase {
        let phase = self.phase();
        self.cwnd = match phase {
            Phase::SlowStart => self.cwnd.saturating_mul(2),
            Phase::CongestionAvoidance => self.cwnd.saturating_add(1),
        };
        phase
    }

    /// Collapse to one packet after a receive timeout.
    pub fn on_timeout(&mut self) {
        if self.decrease_threshold {
            self.ssthresh = (self.ssthresh / 2).max(MIN_THRESHOLD);
        }
        self.cwnd = 1;
    }
}

impl Default for CongestionWindow {
    fn default() -> Self {
        Self::new(INITIAL_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_start_then_additive_growth() {
        let mut cw = CongestionWindow::default();
        let mut seen = vec![cw.size()];
        for _ in 0..7 {
            cw.on_ack();
            seen.push(cw.size());
        }
        assert_eq!(seen, [1, 2, 4, 8, 16, 17, 18, 19]);
    }

    #[test]
    fn phase_reported_per_growth_step() {
        let mut cw = CongestionWindow::new(4);
        assert_eq!(cw.on_ack(), Phase::SlowStart); // 1 -> 2
        assert_eq!(cw.on_ack(), Phase::SlowStart); // 2 -> 4
        assert_eq!(cw.on_ack(), Phase::CongestionAvoidance); // 4 -> 5
        assert_eq!(cw.size(), 5);
    }

    #[test]
    fn doubling_may_overshoot_threshold() {
        let mut cw = CongestionWindow::new(5);
        cw.on_ack(); // 2
        cw.on_ack(); // 4
        cw.on_ack(); // 8, still below-threshold rule applied at 4
        assert_eq!(cw.size(), 8);
        cw.on_ack();
        assert_eq!(cw.size(), 9);
    }

    #[test]
    fn timeout_resets_window_keeps_threshold() {
        let mut cw = CongestionWindow::default();
        for _ in 0..6 {
            cw.on_ack();
        }
        cw.on_timeout();
        assert_eq!(cw.size(), 1);
        assert_eq!(cw.threshold(), INITIAL_THRESHOLD);
        assert_eq!(cw.phase(), Phase::SlowStart);
    }

    #[test]
    fn optional_threshold_halving_has_a_floor() {
        let mut cw = CongestionWindow::new(6).with_threshold_decrease(true);
        cw.on_timeout();
        assert_eq!(cw.threshold(), 3);
        cw.on_timeout();
        assert_eq!(cw.threshold(), MIN_THRESHOLD);
        cw.on_timeout();
        assert_eq!(cw.threshold(), MIN_THRESHOLD);
        assert_eq!(cw.size(), 1);
    }
}
