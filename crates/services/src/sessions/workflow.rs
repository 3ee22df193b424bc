use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{QuizId, SessionId};
use quiz_remote::{GamificationSink, HintSource, QuizSource, SubmissionSink};
use rand::rng;
use rand::seq::SliceRandom;
use tokio::time::Instant;

use super::driver::SessionHandle;
use super::finalizer::Finalizer;
use super::state::QuizSession;
use crate::error::SessionError;
use crate::settings::EngineSettings;

/// Loads quizzes and starts running sessions against the remote collaborators.
#[derive(Clone)]
pub struct QuizSessionService {
    clock: Clock,
    settings: EngineSettings,
    quizzes: Arc<dyn QuizSource>,
    hints: Arc<dyn HintSource>,
    submissions: Arc<dyn SubmissionSink>,
    gamification: Arc<dyn GamificationSink>,
    shuffle: bool,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizSource>,
        hints: Arc<dyn HintSource>,
        submissions: Arc<dyn SubmissionSink>,
        gamification: Arc<dyn GamificationSink>,
    ) -> Self {
        Self {
            clock,
            settings: EngineSettings::default(),
            quizzes,
            hints,
            submissions,
            gamification,
            shuffle: false,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Present questions in random order instead of the order the source returned.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Fetch the quiz and start a session on its first question.
    ///
    /// `question_count` falls back to the configured default.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyQuizData` when the source returns no questions, or
    /// `SessionError::Remote` when fetching fails.
    pub async fn start_session(
        &self,
        quiz_id: QuizId,
        question_count: Option<usize>,
    ) -> Result<SessionHandle, SessionError> {
        let count = question_count.unwrap_or(self.settings.default_question_count);
        let mut questions = self.quizzes.fetch_quiz(quiz_id, count).await?;
        if questions.is_empty() {
            tracing::warn!(%quiz_id, "quiz source returned no questions");
            return Err(SessionError::EmptyQuizData);
        }
        if self.shuffle {
            questions.as_mut_slice().shuffle(&mut rng());
        }

        let session_id = SessionId::generate();
        let mut session = QuizSession::new(
            session_id,
            quiz_id,
            questions,
            self.clock.now(),
            &self.settings,
        )?;
        session.start(Instant::now())?;
        tracing::info!(
            %session_id,
            %quiz_id,
            questions = session.questions().len(),
            "quiz session started"
        );

        Ok(SessionHandle::spawn(
            session,
            self.clock,
            Finalizer::new(self.submissions.clone(), self.gamification.clone()),
            self.hints.clone(),
            self.settings.tick_interval(),
        ))
    }
}
