use std::time::Duration;

use quiz_core::model::QuestionId;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Armed {
    question_id: QuestionId,
    deadline: Instant,
    fired: bool,
}

/// Per-question countdown.
///
/// Remaining time is derived from a deadline, so it never goes negative and does not drift
/// with how often it is sampled. Expiry is reported at most once per arming.
#[derive(Debug, Clone, Copy, Default)]
pub struct Countdown {
    armed: Option<Armed>,
}

impl Countdown {
    /// Start (or restart) the countdown for `question_id` with `budget` left.
    pub fn arm(&mut self, question_id: QuestionId, budget: Duration, now: Instant) {
        self.armed = Some(Armed {
            question_id,
            deadline: now + budget,
            fired: false,
        });
    }

    /// Stop the countdown. A disarmed countdown never ticks nor expires.
    pub fn disarm(&mut self) {
        self.armed = None;
    }

    #[cfg(test)]
    fn is_armed(&self) -> bool {
        self.armed.is_some_and(|armed| !armed.fired)
    }

    #[cfg(test)]
    fn question_id(&self) -> Option<QuestionId> {
        self.armed.map(|armed| armed.question_id)
    }

    /// Time left, saturating at zero. `None` when disarmed.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.armed
            .map(|armed| armed.deadline.saturating_duration_since(now))
    }

    /// Remaining time rounded up to whole seconds, for display.
    #[must_use]
    pub fn remaining_seconds(&self, now: Instant) -> Option<u32> {
        self.remaining(now).map(|left| {
            let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
            u32::try_from(secs).unwrap_or(u32::MAX)
        })
    }

    /// Deadline of a countdown that has not fired yet.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.armed
            .filter(|armed| !armed.fired)
            .map(|armed| armed.deadline)
    }

    /// Report expiry once the deadline has passed. Later calls return `None`.
    pub fn poll_expired(&mut self, now: Instant) -> Option<QuestionId> {
        let armed = self.armed.as_mut()?;
        if armed.fired || now < armed.deadline {
            return None;
        }
        armed.fired = true;
        Some(armed.question_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_fires_exactly_once() {
        let start = Instant::now();
        let mut countdown = Countdown::default();
        countdown.arm(QuestionId::new(1), Duration::from_secs(10), start);

        assert_eq!(countdown.poll_expired(start + Duration::from_secs(9)), None);
        assert_eq!(
            countdown.poll_expired(start + Duration::from_secs(10)),
            Some(QuestionId::new(1))
        );
        assert_eq!(countdown.poll_expired(start + Duration::from_secs(11)), None);
        assert_eq!(countdown.deadline(), None);
    }

    #[test]
    fn remaining_never_goes_negative_and_rounds_up() {
        let start = Instant::now();
        let mut countdown = Countdown::default();
        countdown.arm(QuestionId::new(1), Duration::from_secs(3), start);

        assert_eq!(
            countdown.remaining_seconds(start + Duration::from_millis(500)),
            Some(3)
        );
        assert_eq!(
            countdown.remaining_seconds(start + Duration::from_millis(2_001)),
            Some(1)
        );
        assert_eq!(
            countdown.remaining(start + Duration::from_secs(60)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn rearming_resets_the_fired_flag() {
        let start = Instant::now();
        let mut countdown = Countdown::default();
        countdown.arm(QuestionId::new(1), Duration::from_secs(1), start);
        let later = start + Duration::from_secs(1);
        assert!(countdown.poll_expired(later).is_some());

        countdown.arm(QuestionId::new(2), Duration::from_secs(5), later);
        assert!(countdown.is_armed());
        assert_eq!(countdown.question_id(), Some(QuestionId::new(2)));
        assert_eq!(countdown.poll_expired(later), None);
    }

    #[test]
    fn disarmed_countdown_is_inert() {
        let start = Instant::now();
        let mut countdown = Countdown::default();
        countdown.arm(QuestionId::new(1), Duration::from_secs(1), start);
        countdown.disarm();

        assert_eq!(countdown.poll_expired(start + Duration::from_secs(5)), None);
        assert_eq!(countdown.remaining(start), None);
        assert_eq!(countdown.deadline(), None);
    }
}
