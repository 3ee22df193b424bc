use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use quiz_core::model::{
    AnswerChoice, FeedbackStage, OptionKey, Phase, Question, QuestionId, QuizId, SessionId,
};
use quiz_core::{Resolution, resolve};
use tokio::time::Instant;

use super::countdown::Countdown;
use super::navigation::{Advance, NavigationState, Navigator};
use super::progress::SessionProgress;
use super::sequencer::{DwellStep, FeedbackSequencer};
use crate::error::SessionError;
use crate::settings::EngineSettings;

//
// ─── TIMER OUTCOME ─────────────────────────────────────────────────────────────
//

/// What a timer wake-up did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    Expired {
        question_id: QuestionId,
        resolution: Resolution,
    },
    VerdictShown,
    Advanced(Advance),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine of one quiz attempt.
///
/// Owns the countdown and the feedback sequencer, so every timer that can mutate the
/// session lives here and disappears with it. All mutations take the current monotonic
/// time from the caller.
pub struct QuizSession {
    session_id: SessionId,
    quiz_id: QuizId,
    questions: Vec<Question>,
    answers: HashMap<QuestionId, AnswerChoice>,
    response_times_ms: HashMap<QuestionId, u64>,
    hints_used: HashSet<QuestionId>,
    phase: Phase,
    started_wall: DateTime<Utc>,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    question_started_at: Option<Instant>,
    /// Time already spent on the frontier question before the student navigated away.
    frontier_spent: Duration,
    countdown: Countdown,
    sequencer: FeedbackSequencer,
    navigator: Navigator,
}

impl QuizSession {
    /// Create a session that has not started yet.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyQuizData` if `questions` is empty.
    pub fn new(
        session_id: SessionId,
        quiz_id: QuizId,
        questions: Vec<Question>,
        started_wall: DateTime<Utc>,
        settings: &EngineSettings,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyQuizData);
        }

        let len = questions.len();
        Ok(Self {
            session_id,
            quiz_id,
            questions,
            answers: HashMap::new(),
            response_times_ms: HashMap::new(),
            hints_used: HashSet::new(),
            phase: Phase::NotStarted,
            started_wall,
            started_at: None,
            finished_at: None,
            question_started_at: None,
            frontier_spent: Duration::ZERO,
            countdown: Countdown::default(),
            sequencer: FeedbackSequencer::new(settings.reveal_dwell(), settings.feedback_dwell()),
            navigator: Navigator::new(len),
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn started_wall(&self) -> DateTime<Utc> {
        self.started_wall
    }

    #[must_use]
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }

    /// Index of the active question. Meaningless once finished.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.navigator.current()
    }

    /// The active question, `None` once the session is finished.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase.is_finished() {
            return None;
        }
        self.questions.get(self.navigator.current())
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<AnswerChoice> {
        self.answers.get(&question_id).copied()
    }

    #[must_use]
    pub fn response_time_ms(&self, question_id: QuestionId) -> Option<u64> {
        self.response_times_ms.get(&question_id).copied()
    }

    #[must_use]
    pub fn hint_used(&self, question_id: QuestionId) -> bool {
        self.hints_used.contains(&question_id)
    }

    /// Hinted question ids in question order.
    #[must_use]
    pub fn hints_used(&self) -> Vec<QuestionId> {
        self.questions
            .iter()
            .map(Question::id)
            .filter(|id| self.hints_used.contains(id))
            .collect()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.navigator.is_submitting()
    }

    #[must_use]
    pub fn navigation(&self) -> NavigationState {
        self.navigator.state(self.phase)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self.answered_count();
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.phase.is_finished(),
        }
    }

    /// Countdown display value; `None` while the countdown is inert.
    #[must_use]
    pub fn remaining_seconds(&self, now: Instant) -> Option<u32> {
        if !self.phase.is_in_progress() {
            return None;
        }
        self.countdown.remaining_seconds(now)
    }

    /// Next instant at which [`QuizSession::on_timer`] has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::InProgress => self.countdown.deadline(),
            Phase::Feedback(_) => self.sequencer.due(),
            Phase::NotStarted | Phase::Finished => None,
        }
    }

    /// Enter in-progress and arm the first question's countdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalTransition` unless the session has not started.
    pub fn start(&mut self, now: Instant) -> Result<(), SessionError> {
        if self.phase != Phase::NotStarted {
            return Err(self.illegal("start session"));
        }
        self.started_at = Some(now);
        self.phase = Phase::InProgress;
        self.arm_frontier(now);
        tracing::debug!(session_id = %self.session_id, questions = self.questions.len(), "session started");
        Ok(())
    }

    /// Record a manual selection for the active question and enter the reveal dwell.
    ///
    /// No deadline check happens here: a selection processed before the expiry wins.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if a submission is in flight, the phase is not in-progress,
    /// `question_id` is not active, the question is already answered, or the slot is empty.
    pub fn select_answer(
        &mut self,
        question_id: QuestionId,
        key: OptionKey,
        now: Instant,
    ) -> Result<Resolution, SessionError> {
        self.navigator.ensure_idle()?;
        self.require_in_progress("select answer")?;
        let question = self.active_question(question_id)?;
        if question.option(key).is_none() {
            return Err(SessionError::UnknownOption { question_id, key });
        }

        let resolution = self.record(AnswerChoice::Option(key), now)?;
        self.phase = Phase::Feedback(FeedbackStage::Reveal);
        self.sequencer.schedule_reveal(now);
        tracing::debug!(session_id = %self.session_id, %question_id, %key, correct = resolution.is_correct, "answer selected");
        Ok(resolution)
    }

    /// Record the timeout sentinel for the active question and enter the verdict dwell.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if a submission is in flight, the phase is not in-progress,
    /// or the active question already has an answer.
    pub fn expire_current_question(&mut self, now: Instant) -> Result<Resolution, SessionError> {
        self.navigator.ensure_idle()?;
        self.require_in_progress("expire question")?;
        let question_id = self.current_id()?;
        self.active_question(question_id)?;

        let resolution = self.record(AnswerChoice::Timeout, now)?;
        self.phase = Phase::Feedback(FeedbackStage::Verdict);
        self.sequencer.schedule_advance(now);
        tracing::debug!(session_id = %self.session_id, %question_id, "question timed out");
        Ok(resolution)
    }

    /// Consume the hint of the active question.
    ///
    /// Returns the hint embedded in the question, if any; callers fetch it remotely
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if a submission is in flight, the phase is not in-progress,
    /// `question_id` is not active or already answered, or the hint was already used.
    pub fn request_hint(&mut self, question_id: QuestionId) -> Result<Option<&str>, SessionError> {
        self.navigator.ensure_idle()?;
        self.require_in_progress("request hint")?;
        self.active_question(question_id)?;
        if !self.hints_used.insert(question_id) {
            return Err(SessionError::HintAlreadyUsed(question_id));
        }
        tracing::debug!(session_id = %self.session_id, %question_id, "hint consumed");
        Ok(self
            .questions
            .get(self.navigator.current())
            .and_then(Question::hint))
    }

    /// End the reveal dwell early or on schedule, showing the verdict.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalTransition` unless the session is in the reveal stage.
    pub fn show_verdict(&mut self, now: Instant) -> Result<(), SessionError> {
        self.navigator.ensure_idle()?;
        if self.phase != Phase::Feedback(FeedbackStage::Reveal) {
            return Err(self.illegal("show verdict"));
        }
        self.sequencer.cancel();
        self.phase = Phase::Feedback(FeedbackStage::Verdict);
        self.sequencer.schedule_advance(now);
        Ok(())
    }

    /// Leave feedback: move to the next question, or finish after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalTransition` unless the session is in feedback.
    pub fn advance(&mut self, now: Instant) -> Result<Advance, SessionError> {
        self.navigator.ensure_idle()?;
        if !self.phase.is_feedback() {
            return Err(self.illegal("advance"));
        }
        self.sequencer.cancel();

        let step = self.navigator.advance();
        match step {
            Advance::Next(index) => {
                self.frontier_spent = Duration::ZERO;
                self.phase = Phase::InProgress;
                self.arm_frontier(now);
                tracing::debug!(session_id = %self.session_id, index, "advanced to next question");
            }
            Advance::Finish => {
                self.countdown.disarm();
                self.phase = Phase::Finished;
                self.finished_at = Some(now);
                tracing::debug!(session_id = %self.session_id, answered = self.answers.len(), "session finished");
            }
        }
        Ok(step)
    }

    /// Step back to an earlier question. The frontier countdown is suspended.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if navigation is not allowed right now.
    pub fn go_back(&mut self, now: Instant) -> Result<usize, SessionError> {
        let was_on_frontier = self.navigator.is_on_frontier();
        let index = self.navigator.go_back(self.phase)?;
        if was_on_frontier {
            self.suspend_frontier(now);
        }
        Ok(index)
    }

    /// Step forward among reached questions. Returning to the frontier resumes its countdown
    /// with the time it had left.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if navigation is not allowed right now.
    pub fn go_forward(&mut self, now: Instant) -> Result<usize, SessionError> {
        let index = self.navigator.go_forward(self.phase)?;
        if self.navigator.is_on_frontier() {
            self.arm_frontier(now);
        }
        Ok(index)
    }

    /// Run whichever timer is due: countdown expiry while in-progress, the pending
    /// dwell step while in feedback. Does nothing in any other phase.
    ///
    /// # Errors
    ///
    /// Propagates a rejected transition; this only happens if a submission is in flight.
    pub fn on_timer(&mut self, now: Instant) -> Result<Option<TimerOutcome>, SessionError> {
        match self.phase {
            Phase::InProgress => {
                let Some(question_id) = self.countdown.poll_expired(now) else {
                    return Ok(None);
                };
                if self.answers.contains_key(&question_id) {
                    return Ok(None);
                }
                let resolution = self.expire_current_question(now)?;
                Ok(Some(TimerOutcome::Expired {
                    question_id,
                    resolution,
                }))
            }
            Phase::Feedback(_) => match self.sequencer.poll(now) {
                Some(DwellStep::ShowVerdict) => {
                    self.show_verdict(now)?;
                    Ok(Some(TimerOutcome::VerdictShown))
                }
                Some(DwellStep::Advance) => Ok(Some(TimerOutcome::Advanced(self.advance(now)?))),
                None => Ok(None),
            },
            Phase::NotStarted | Phase::Finished => Ok(None),
        }
    }

    /// Set the submission latch on a finished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` unless the session is finished and no submission is in flight.
    pub fn begin_submission(&mut self) -> Result<(), SessionError> {
        if !self.phase.is_finished() {
            return Err(self.illegal("submit"));
        }
        self.navigator.begin_submission()
    }

    /// Clear the submission latch once the submit call has settled.
    pub fn end_submission(&mut self) {
        self.navigator.end_submission();
    }

    fn record(&mut self, choice: AnswerChoice, now: Instant) -> Result<Resolution, SessionError> {
        let index = self.navigator.current();
        let question = self
            .questions
            .get(index)
            .ok_or_else(|| self.illegal("record answer"))?;
        let question_id = question.id();
        if self.answers.contains_key(&question_id) {
            return Err(SessionError::AlreadyAnswered(question_id));
        }

        let since_shown = self
            .question_started_at
            .map_or(Duration::ZERO, |shown| now.saturating_duration_since(shown));
        let spent = (self.frontier_spent + since_shown).min(question.time_limit());
        let resolution = resolve(question, choice);

        self.answers.insert(question_id, choice);
        self.response_times_ms
            .insert(question_id, u64::try_from(spent.as_millis()).unwrap_or(u64::MAX));
        self.countdown.disarm();
        self.frontier_spent = Duration::ZERO;
        Ok(resolution)
    }

    fn arm_frontier(&mut self, now: Instant) {
        let Some(question) = self.questions.get(self.navigator.current()) else {
            return;
        };
        let budget = question.time_limit().saturating_sub(self.frontier_spent);
        self.question_started_at = Some(now);
        self.countdown.arm(question.id(), budget, now);
    }

    fn suspend_frontier(&mut self, now: Instant) {
        if let Some(shown) = self.question_started_at.take() {
            self.frontier_spent += now.saturating_duration_since(shown);
        }
        self.countdown.disarm();
    }

    fn current_id(&self) -> Result<QuestionId, SessionError> {
        self.questions
            .get(self.navigator.current())
            .map(Question::id)
            .ok_or_else(|| self.illegal("resolve question"))
    }

    /// The active question, provided it is `question_id` and still open.
    fn active_question(&self, question_id: QuestionId) -> Result<&Question, SessionError> {
        let expected = self.current_id()?;
        if expected != question_id {
            return Err(SessionError::NotCurrentQuestion {
                expected,
                got: question_id,
            });
        }
        if self.answers.contains_key(&question_id) {
            return Err(SessionError::AlreadyAnswered(question_id));
        }
        self.questions
            .get(self.navigator.current())
            .ok_or_else(|| self.illegal("resolve question"))
    }

    fn require_in_progress(&self, operation: &'static str) -> Result<(), SessionError> {
        if self.phase.is_in_progress() {
            Ok(())
        } else {
            Err(self.illegal(operation))
        }
    }

    fn illegal(&self, operation: &'static str) -> SessionError {
        SessionError::IllegalTransition {
            operation,
            phase: self.phase,
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("session_id", &self.session_id)
            .field("quiz_id", &self.quiz_id)
            .field("questions_len", &self.questions.len())
            .field("current", &self.navigator.current())
            .field("answers_len", &self.answers.len())
            .field("hints_used", &self.hints_used.len())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::test_support::{question, question_with_hint};
    use quiz_core::time::fixed_now;

    const REVEAL: Duration = Duration::from_millis(800);
    const DWELL: Duration = Duration::from_millis(2_500);

    fn started(questions: Vec<Question>) -> (QuizSession, Instant) {
        let mut session = QuizSession::new(
            SessionId::generate(),
            QuizId::new(1),
            questions,
            fixed_now(),
            &EngineSettings::default(),
        )
        .unwrap();
        let now = Instant::now();
        session.start(now).unwrap();
        (session, now)
    }

    fn three() -> Vec<Question> {
        vec![
            question(1, OptionKey::A, 10),
            question(2, OptionKey::B, 10),
            question(3, OptionKey::C, 10),
        ]
    }

    #[test]
    fn empty_quiz_never_starts() {
        let err = QuizSession::new(
            SessionId::generate(),
            QuizId::new(1),
            Vec::new(),
            fixed_now(),
            &EngineSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::EmptyQuizData));
    }

    #[test]
    fn operations_before_start_are_rejected() {
        let mut session = QuizSession::new(
            SessionId::generate(),
            QuizId::new(1),
            three(),
            fixed_now(),
            &EngineSettings::default(),
        )
        .unwrap();
        let now = Instant::now();
        assert!(matches!(
            session.select_answer(QuestionId::new(1), OptionKey::A, now),
            Err(SessionError::IllegalTransition { .. })
        ));
        assert_eq!(session.next_deadline(), None);
        session.start(now).unwrap();
        assert!(session.start(now).is_err());
    }

    #[test]
    fn manual_selection_runs_reveal_then_verdict_then_advance() {
        let (mut session, t0) = started(three());
        let t1 = t0 + Duration::from_secs(4);

        let verdict = session
            .select_answer(QuestionId::new(1), OptionKey::A, t1)
            .unwrap();
        assert!(verdict.is_correct);
        assert_eq!(session.phase(), Phase::Feedback(FeedbackStage::Reveal));
        assert_eq!(session.response_time_ms(QuestionId::new(1)), Some(4_000));
        assert_eq!(session.next_deadline(), Some(t1 + REVEAL));

        assert_eq!(session.on_timer(t1 + REVEAL).unwrap(), Some(TimerOutcome::VerdictShown));
        assert_eq!(session.phase(), Phase::Feedback(FeedbackStage::Verdict));

        let t2 = t1 + REVEAL + DWELL;
        assert_eq!(
            session.on_timer(t2).unwrap(),
            Some(TimerOutcome::Advanced(Advance::Next(1)))
        );
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.remaining_seconds(t2), Some(30));
    }

    #[test]
    fn timeout_records_sentinel_and_still_advances() {
        let (mut session, t0) = started(three());
        let deadline = t0 + Duration::from_secs(30);
        assert_eq!(session.next_deadline(), Some(deadline));
        assert_eq!(session.on_timer(deadline - Duration::from_millis(1)).unwrap(), None);

        let outcome = session.on_timer(deadline).unwrap();
        assert_eq!(
            outcome,
            Some(TimerOutcome::Expired {
                question_id: QuestionId::new(1),
                resolution: Resolution {
                    is_correct: false,
                    points_earned: 0
                },
            })
        );
        assert_eq!(session.answer_for(QuestionId::new(1)), Some(AnswerChoice::Timeout));
        assert_eq!(session.response_time_ms(QuestionId::new(1)), Some(30_000));
        assert_eq!(session.phase(), Phase::Feedback(FeedbackStage::Verdict));
        assert_eq!(session.remaining_seconds(deadline), None);

        assert_eq!(
            session.on_timer(deadline + DWELL).unwrap(),
            Some(TimerOutcome::Advanced(Advance::Next(1)))
        );
    }

    #[test]
    fn manual_selection_beats_expiry_at_the_same_instant() {
        let (mut session, t0) = started(three());
        let deadline = t0 + Duration::from_secs(30);

        session
            .select_answer(QuestionId::new(1), OptionKey::B, deadline)
            .unwrap();
        assert_eq!(session.on_timer(deadline).unwrap(), None);
        assert!(matches!(
            session.expire_current_question(deadline),
            Err(SessionError::IllegalTransition { .. })
        ));
        assert_eq!(
            session.answer_for(QuestionId::new(1)),
            Some(AnswerChoice::Option(OptionKey::B))
        );
        assert_eq!(session.answered_count(), 1);
    }

    #[test]
    fn late_click_after_expiry_is_rejected() {
        let (mut session, t0) = started(three());
        let deadline = t0 + Duration::from_secs(30);
        session.on_timer(deadline).unwrap();

        assert!(matches!(
            session.select_answer(QuestionId::new(1), OptionKey::A, deadline),
            Err(SessionError::IllegalTransition { .. })
        ));
        assert_eq!(session.answer_for(QuestionId::new(1)), Some(AnswerChoice::Timeout));
    }

    #[test]
    fn double_advance_moves_once() {
        let (mut session, t0) = started(three());
        session.select_answer(QuestionId::new(1), OptionKey::A, t0).unwrap();

        assert_eq!(session.advance(t0).unwrap(), Advance::Next(1));
        assert!(matches!(
            session.advance(t0),
            Err(SessionError::IllegalTransition { operation: "advance", .. })
        ));
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn hint_can_be_used_once_per_question() {
        let (mut session, _) = started(vec![
            question_with_hint(1, OptionKey::A, "starts with A"),
            question(2, OptionKey::A, 5),
        ]);

        assert_eq!(
            session.request_hint(QuestionId::new(1)).unwrap(),
            Some("starts with A")
        );
        assert!(matches!(
            session.request_hint(QuestionId::new(1)),
            Err(SessionError::HintAlreadyUsed(_))
        ));
        assert!(matches!(
            session.request_hint(QuestionId::new(2)),
            Err(SessionError::NotCurrentQuestion { .. })
        ));
        assert_eq!(session.hints_used(), vec![QuestionId::new(1)]);
    }

    #[test]
    fn selecting_wrong_question_or_empty_slot_is_rejected() {
        let (mut session, t0) = started(three());
        assert!(matches!(
            session.select_answer(QuestionId::new(2), OptionKey::A, t0),
            Err(SessionError::NotCurrentQuestion { .. })
        ));
        // Test questions leave slot D empty.
        assert!(matches!(
            session.select_answer(QuestionId::new(1), OptionKey::D, t0),
            Err(SessionError::UnknownOption { .. })
        ));
        assert_eq!(session.phase(), Phase::InProgress);
    }

    #[test]
    fn revisiting_answered_question_keeps_it_closed() {
        let (mut session, t0) = started(three());
        session.select_answer(QuestionId::new(1), OptionKey::C, t0).unwrap();
        session.advance(t0).unwrap();

        let t1 = t0 + Duration::from_secs(10);
        assert_eq!(session.go_back(t1).unwrap(), 0);
        assert_eq!(
            session.answer_for(QuestionId::new(1)),
            Some(AnswerChoice::Option(OptionKey::C))
        );
        assert_eq!(session.remaining_seconds(t1), None);
        assert_eq!(session.next_deadline(), None);
        assert!(matches!(
            session.select_answer(QuestionId::new(1), OptionKey::A, t1),
            Err(SessionError::AlreadyAnswered(_))
        ));
        assert!(matches!(
            session.request_hint(QuestionId::new(1)),
            Err(SessionError::AlreadyAnswered(_))
        ));
        assert!(matches!(
            session.expire_current_question(t1),
            Err(SessionError::AlreadyAnswered(_))
        ));

        // Away for a long time: the frontier keeps the 20s it had left.
        let t2 = t1 + Duration::from_secs(300);
        assert_eq!(session.go_forward(t2).unwrap(), 1);
        assert_eq!(session.remaining_seconds(t2), Some(20));

        session.select_answer(QuestionId::new(2), OptionKey::B, t2 + Duration::from_secs(5)).unwrap();
        assert_eq!(session.response_time_ms(QuestionId::new(2)), Some(15_000));
    }

    #[test]
    fn navigation_is_blocked_mid_feedback() {
        let (mut session, t0) = started(three());
        session.select_answer(QuestionId::new(1), OptionKey::A, t0).unwrap();
        session.advance(t0).unwrap();
        session.select_answer(QuestionId::new(2), OptionKey::A, t0).unwrap();

        assert!(!session.navigation().can_go_back);
        assert!(matches!(
            session.go_back(t0),
            Err(SessionError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn finishing_and_submission_latch() {
        let (mut session, t0) = started(vec![question(1, OptionKey::A, 10)]);
        assert!(session.begin_submission().is_err());

        session.select_answer(QuestionId::new(1), OptionKey::A, t0).unwrap();
        assert_eq!(session.advance(t0).unwrap(), Advance::Finish);
        assert!(session.phase().is_finished());
        assert!(session.current_question().is_none());
        assert_eq!(session.on_timer(t0 + Duration::from_secs(100)).unwrap(), None);

        session.begin_submission().unwrap();
        assert!(matches!(
            session.begin_submission(),
            Err(SessionError::SubmissionInFlight)
        ));
        assert!(matches!(
            session.advance(t0),
            Err(SessionError::SubmissionInFlight)
        ));
        session.end_submission();
        assert!(session.begin_submission().is_ok());
        assert!(session.progress().is_complete);
    }

    #[test]
    fn answers_stay_unique_under_any_event_order() {
        // Interleave expiry, clicks and advances in every order for a short quiz.
        let orders: [[u8; 4]; 6] = [
            [0, 1, 2, 3],
            [1, 0, 3, 2],
            [2, 2, 0, 1],
            [3, 1, 1, 0],
            [0, 0, 3, 3],
            [2, 1, 3, 0],
        ];
        for order in orders {
            let (mut session, t0) = started(three());
            let mut now = t0;
            for _ in 0..10 {
                for event in order {
                    now += Duration::from_secs(7);
                    let id = session.current_question().map(Question::id);
                    let _ = match (event, id) {
                        (0, Some(id)) => session.select_answer(id, OptionKey::A, now).map(|_| ()),
                        (1, _) => session.expire_current_question(now).map(|_| ()),
                        (2, _) => session.advance(now).map(|_| ()),
                        _ => session.on_timer(now).map(|_| ()),
                    };
                    assert!(session.answered_count() <= session.questions().len());
                }
            }
            let progress = session.progress();
            assert_eq!(progress.answered + progress.remaining, progress.total);
        }
    }
}
