//! Driver state tracking
//!
//! Turns the per-frame openness score into a debounced, latched alarm
//! decision. The alarm is raised once the eyes have stayed closed for the
//! configured duration and cleared on the first open frame after that.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::DmsConfig;

/// Status classification for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrowsinessStatus {
    /// Eyes open
    #[default]
    Awake,
    /// Eyes closed, not yet long enough to alarm (time closed so far)
    Closing(Duration),
    /// Eyes closed at least the configured sleep duration
    Sleeping,
}

/// Edge-triggered alarm change produced by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlarmTransition {
    AlarmOn,
    AlarmOff,
    #[default]
    NoChange,
}

impl AlarmTransition {
    pub fn is_change(self) -> bool {
        self != AlarmTransition::NoChange
    }
}

/// Driver state (tracked over the session)
///
/// `closure_start` is set exactly while the latest run of closed-eye frames
/// is non-empty. `is_sleeping` is the alarm latch: it only becomes true inside
/// such a run and only clears on an open frame.
#[derive(Debug, Clone, Default)]
pub struct DrowsinessState {
    closure_start: Option<Instant>,
    is_sleeping: bool,
}

impl DrowsinessState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one processed frame.
    ///
    /// Must be called in frame order. Frames without a face are not ticked.
    pub fn tick(
        &mut self,
        score: f32,
        now: Instant,
        config: &DmsConfig,
    ) -> (DrowsinessStatus, AlarmTransition) {
        if score < config.eye_closed_threshold {
            let start = *self.closure_start.get_or_insert(now);
            let elapsed = now.saturating_duration_since(start);

            if elapsed.as_secs_f64() >= config.sleep_duration_seconds {
                if self.is_sleeping {
                    (DrowsinessStatus::Sleeping, AlarmTransition::NoChange)
                } else {
                    self.is_sleeping = true;
                    (DrowsinessStatus::Sleeping, AlarmTransition::AlarmOn)
                }
            } else {
                (DrowsinessStatus::Closing(elapsed), AlarmTransition::NoChange)
            }
        } else {
            // Any open frame ends the closure run
            self.closure_start = None;
            if self.is_sleeping {
                self.is_sleeping = false;
                (DrowsinessStatus::Awake, AlarmTransition::AlarmOff)
            } else {
                (DrowsinessStatus::Awake, AlarmTransition::NoChange)
            }
        }
    }

    pub fn closure_start(&self) -> Option<Instant> {
        self.closure_start
    }

    pub fn is_sleeping(&self) -> bool {
        self.is_sleeping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const OPEN: f32 = 0.25;
    const CLOSED: f32 = 0.15;

    /// ~30 fps, rounded up so 90 frames span slightly more than 3 s
    const FRAME: Duration = Duration::from_micros(33_334);

    fn at(base: Instant, frame: u32) -> Instant {
        base + FRAME * frame
    }

    #[test]
    fn test_initial_state() {
        let state = DrowsinessState::new();
        assert!(state.closure_start().is_none());
        assert!(!state.is_sleeping());
    }

    #[test]
    fn test_reference_scenario() {
        // 10 open, 91 closed, 5 open at ~30 fps with a 3 s sleep duration
        let config = DmsConfig::default();
        let mut state = DrowsinessState::new();
        let base = Instant::now();

        let scores: Vec<f32> = std::iter::repeat(OPEN)
            .take(10)
            .chain(std::iter::repeat(CLOSED).take(91))
            .chain(std::iter::repeat(OPEN).take(5))
            .collect();

        let mut transitions = Vec::new();
        for (i, score) in scores.iter().enumerate() {
            let (status, transition) = state.tick(*score, at(base, i as u32), &config);
            if i == 99 {
                assert!(matches!(status, DrowsinessStatus::Closing(_)));
            }
            if i == 100 {
                assert_eq!(status, DrowsinessStatus::Sleeping);
            }
            if transition.is_change() {
                transitions.push((i, transition));
            }
        }

        assert_eq!(
            transitions,
            vec![(100, AlarmTransition::AlarmOn), (101, AlarmTransition::AlarmOff)]
        );
        assert!(!state.is_sleeping());
        assert!(state.closure_start().is_none());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let config = DmsConfig::default();
        let mut state = DrowsinessState::new();
        let (status, transition) = state.tick(config.eye_closed_threshold, Instant::now(), &config);
        assert_eq!(status, DrowsinessStatus::Awake);
        assert_eq!(transition, AlarmTransition::NoChange);
        assert!(state.closure_start().is_none());
    }

    #[test]
    fn test_zero_score_counts_as_closed() {
        let config = DmsConfig::default();
        let mut state = DrowsinessState::new();
        let now = Instant::now();
        let (status, _) = state.tick(0.0, now, &config);
        assert_eq!(status, DrowsinessStatus::Closing(Duration::ZERO));
        assert_eq!(state.closure_start(), Some(now));
    }

    #[test]
    fn test_closing_reports_elapsed() {
        let config = DmsConfig::default();
        let mut state = DrowsinessState::new();
        let base = Instant::now();
        state.tick(CLOSED, base, &config);
        let (status, transition) = state.tick(CLOSED, base + Duration::from_millis(1200), &config);
        assert_eq!(status, DrowsinessStatus::Closing(Duration::from_millis(1200)));
        assert_eq!(transition, AlarmTransition::NoChange);
        assert_eq!(state.closure_start(), Some(base));
    }

    #[test]
    fn test_sleeping_emits_alarm_once() {
        let config = DmsConfig::default();
        let mut state = DrowsinessState::new();
        let base = Instant::now();

        state.tick(CLOSED, base, &config);
        let (_, first) = state.tick(CLOSED, base + Duration::from_secs(3), &config);
        let (status, second) = state.tick(CLOSED, base + Duration::from_secs(10), &config);

        assert_eq!(first, AlarmTransition::AlarmOn);
        assert_eq!(second, AlarmTransition::NoChange);
        assert_eq!(status, DrowsinessStatus::Sleeping);
        assert!(state.is_sleeping());
    }

    #[test]
    fn test_single_open_frame_resets_closure() {
        let config = DmsConfig::default();
        let mut state = DrowsinessState::new();
        let base = Instant::now();

        state.tick(CLOSED, base, &config);
        state.tick(CLOSED, base + Duration::from_millis(2900), &config);
        state.tick(OPEN, base + Duration::from_millis(2950), &config);
        let reopened = base + Duration::from_millis(3000);
        let (status, transition) = state.tick(CLOSED, reopened, &config);

        assert_eq!(status, DrowsinessStatus::Closing(Duration::ZERO));
        assert_eq!(transition, AlarmTransition::NoChange);
        assert_eq!(state.closure_start(), Some(reopened));

        let (_, transition) = state.tick(CLOSED, reopened + Duration::from_millis(2999), &config);
        assert_eq!(transition, AlarmTransition::NoChange);
        let (_, transition) = state.tick(CLOSED, reopened + Duration::from_secs(3), &config);
        assert_eq!(transition, AlarmTransition::AlarmOn);
    }

    #[test]
    fn test_open_while_awake_is_no_change() {
        let config = DmsConfig::default();
        let mut state = DrowsinessState::new();
        for i in 0..5 {
            let (_, transition) = state.tick(OPEN, at(Instant::now(), i), &config);
            assert_eq!(transition, AlarmTransition::NoChange);
        }
    }

    fn score_strategy() -> impl Strategy<Value = f32> {
        prop_oneof![Just(CLOSED), Just(OPEN), 0.0_f32..0.5]
    }

    proptest! {
        #[test]
        fn pt_alarm_transitions_alternate(
            steps in prop::collection::vec((score_strategy(), 0_u64..1500), 1..300),
        ) {
            let config = DmsConfig::default();
            let mut state = DrowsinessState::new();
            let mut now = Instant::now();
            let mut expect_on = true;

            for (score, gap_ms) in steps {
                now += Duration::from_millis(gap_ms);
                let (_, transition) = state.tick(score, now, &config);
                match transition {
                    AlarmTransition::AlarmOn => {
                        prop_assert!(expect_on);
                        expect_on = false;
                    }
                    AlarmTransition::AlarmOff => {
                        prop_assert!(!expect_on);
                        expect_on = true;
                    }
                    AlarmTransition::NoChange => {}
                }
                prop_assert_eq!(state.is_sleeping(), !expect_on);
                // Latch implies an ongoing closure run
                prop_assert!(!state.is_sleeping() || state.closure_start().is_some());
            }
        }

        #[test]
        fn pt_short_closure_never_alarms(
            gaps in prop::collection::vec(0_u64..100, 1..500),
        ) {
            let config = DmsConfig::default();
            let limit = Duration::from_secs_f64(config.sleep_duration_seconds);
            let mut state = DrowsinessState::new();
            let base = Instant::now();
            let mut offset = Duration::ZERO;

            for gap in gaps {
                offset += Duration::from_millis(gap);
                if offset >= limit {
                    break;
                }
                let (status, transition) = state.tick(CLOSED, base + offset, &config);
                prop_assert_eq!(transition, AlarmTransition::NoChange);
                prop_assert!(matches!(status, DrowsinessStatus::Closing(_)));
            }
        }

        #[test]
        fn pt_reopen_restarts_debounce(
            before_ms in 0_u64..2999,
            after_ms in 0_u64..2999,
        ) {
            let config = DmsConfig::default();
            let mut state = DrowsinessState::new();
            let base = Instant::now();

            state.tick(CLOSED, base, &config);
            state.tick(CLOSED, base + Duration::from_millis(before_ms), &config);
            let reopen = base + Duration::from_millis(before_ms + 1);
            state.tick(OPEN, reopen, &config);
            state.tick(CLOSED, reopen + Duration::from_millis(1), &config);
            let (_, transition) = state.tick(
                CLOSED,
                reopen + Duration::from_millis(1 + after_ms),
                &config,
            );
            prop_assert_eq!(transition, AlarmTransition::NoChange);
        }
    }
}
