use std::time::Duration;

use tokio::time::Instant;

/// Step the sequencer performs when its dwell elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellStep {
    /// End of the selection reveal: show the verdict.
    ShowVerdict,
    /// End of the verdict dwell: move on.
    Advance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    step: DwellStep,
    due: Instant,
}

/// Schedules the feedback dwells. Holds at most one pending step.
#[derive(Debug, Clone)]
pub struct FeedbackSequencer {
    reveal_dwell: Duration,
    feedback_dwell: Duration,
    pending: Option<Pending>,
}

impl FeedbackSequencer {
    #[must_use]
    pub fn new(reveal_dwell: Duration, feedback_dwell: Duration) -> Self {
        Self {
            reveal_dwell,
            feedback_dwell,
            pending: None,
        }
    }

    /// Begin the reveal dwell after a manual selection.
    ///
    /// Returns `false` without scheduling when a step is already pending.
    pub fn schedule_reveal(&mut self, now: Instant) -> bool {
        self.schedule(DwellStep::ShowVerdict, now + self.reveal_dwell)
    }

    /// Begin the verdict dwell that ends in an advance.
    ///
    /// Returns `false` without scheduling when a step is already pending.
    pub fn schedule_advance(&mut self, now: Instant) -> bool {
        self.schedule(DwellStep::Advance, now + self.feedback_dwell)
    }

    fn schedule(&mut self, step: DwellStep, due: Instant) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(Pending { step, due });
        true
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    #[must_use]
    pub fn due(&self) -> Option<Instant> {
        self.pending.map(|pending| pending.due)
    }

    #[cfg(test)]
    fn pending_step(&self) -> Option<DwellStep> {
        self.pending.map(|pending| pending.step)
    }

    /// Take the pending step if its dwell has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<DwellStep> {
        let pending = self.pending?;
        if now < pending.due {
            return None;
        }
        self.pending = None;
        Some(pending.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequencer() -> FeedbackSequencer {
        FeedbackSequencer::new(Duration::from_millis(800), Duration::from_millis(2_500))
    }

    #[test]
    fn reveal_then_advance_use_their_own_dwells() {
        let start = Instant::now();
        let mut seq = sequencer();

        assert!(seq.schedule_reveal(start));
        assert_eq!(seq.poll(start + Duration::from_millis(799)), None);
        let revealed_at = start + Duration::from_millis(800);
        assert_eq!(seq.poll(revealed_at), Some(DwellStep::ShowVerdict));

        assert!(seq.schedule_advance(revealed_at));
        assert_eq!(seq.due(), Some(revealed_at + Duration::from_millis(2_500)));
        assert_eq!(
            seq.poll(revealed_at + Duration::from_millis(2_500)),
            Some(DwellStep::Advance)
        );
        assert_eq!(seq.pending_step(), None);
    }

    #[test]
    fn only_one_step_can_be_pending() {
        let start = Instant::now();
        let mut seq = sequencer();

        assert!(seq.schedule_advance(start));
        assert!(!seq.schedule_reveal(start));
        assert!(!seq.schedule_advance(start + Duration::from_secs(1)));
        assert_eq!(seq.due(), Some(start + Duration::from_millis(2_500)));
    }

    #[test]
    fn cancelled_step_never_fires() {
        let start = Instant::now();
        let mut seq = sequencer();
        seq.schedule_advance(start);
        seq.cancel();
        assert_eq!(seq.poll(start + Duration::from_secs(10)), None);
    }
}
