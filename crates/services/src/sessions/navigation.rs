use quiz_core::model::Phase;
use serde::Serialize;

use crate::error::SessionError;

/// Which navigation affordances are currently enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationState {
    pub can_go_back: bool,
    pub can_go_forward: bool,
    /// The next automatic advance ends the session.
    pub on_last_question: bool,
    pub submitting: bool,
}

/// Tracks the active index, how far the student has reached, and the submission latch.
///
/// Questions beyond `furthest` have never been shown; only `0..=furthest` are reachable by
/// manual navigation. Finishing is only possible through [`Navigator::advance`].
#[derive(Debug, Clone)]
pub struct Navigator {
    len: usize,
    current: usize,
    furthest: usize,
    submitting: bool,
}

/// Result of advancing past the active question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    Finish,
}

impl Navigator {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            len,
            current: 0,
            furthest: 0,
            submitting: false,
        }
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn is_on_frontier(&self) -> bool {
        self.current == self.furthest
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.len
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub fn state(&self, phase: Phase) -> NavigationState {
        let movable = phase.is_in_progress() && !self.submitting;
        NavigationState {
            can_go_back: movable && self.current > 0,
            can_go_forward: movable && self.current < self.furthest,
            on_last_question: !phase.is_finished() && self.is_last(),
            submitting: self.submitting,
        }
    }

    /// Reject any mutation while a submission is in flight.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SubmissionInFlight` while the latch is set.
    pub fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.submitting {
            return Err(SessionError::SubmissionInFlight);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError` when the phase is not in-progress, a submission is in flight,
    /// or there is no earlier question.
    pub fn go_back(&mut self, phase: Phase) -> Result<usize, SessionError> {
        self.ensure_movable("go back", phase)?;
        if self.current == 0 {
            return Err(SessionError::NavigationBlocked {
                operation: "go back",
            });
        }
        self.current -= 1;
        Ok(self.current)
    }

    /// # Errors
    ///
    /// Returns `SessionError` when the phase is not in-progress, a submission is in flight,
    /// or the next question has not been reached yet.
    pub fn go_forward(&mut self, phase: Phase) -> Result<usize, SessionError> {
        self.ensure_movable("go forward", phase)?;
        if self.current >= self.furthest {
            return Err(SessionError::NavigationBlocked {
                operation: "go forward",
            });
        }
        self.current += 1;
        Ok(self.current)
    }

    /// Move past the active question, or report that the session is done.
    pub fn advance(&mut self) -> Advance {
        if self.is_last() {
            return Advance::Finish;
        }
        self.current += 1;
        self.furthest = self.furthest.max(self.current);
        Advance::Next(self.current)
    }

    /// Set the submission latch.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SubmissionInFlight` if it is already set.
    pub fn begin_submission(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.submitting = true;
        Ok(())
    }

    pub fn end_submission(&mut self) {
        self.submitting = false;
    }

    fn ensure_movable(&self, operation: &'static str, phase: Phase) -> Result<(), SessionError> {
        self.ensure_idle()?;
        if !phase.is_in_progress() {
            return Err(SessionError::IllegalTransition { operation, phase });
        }
        Ok(())
    }
}
