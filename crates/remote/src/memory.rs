use async_trait::async_trait;
use quiz_core::model::{Question, QuestionId, QuizId, ResultSummary};
use quiz_core::resolve;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::contract::{
    GamificationSink, GamificationUpdate, HintSource, QuizResultMetadata, QuizSource,
    RemoteError, SubmissionPayload, SubmissionReceipt, SubmissionSink,
};

#[derive(Default)]
struct State {
    quizzes: HashMap<QuizId, Vec<Question>>,
    hints: HashMap<QuestionId, String>,
    hint_requests: Vec<QuestionId>,
    submissions: Vec<SubmissionPayload>,
    recorded_results: Vec<(ResultSummary, QuizResultMetadata)>,
    failing_submissions: usize,
    fail_gamification: bool,
    submit_delay: Option<Duration>,
    streak: u32,
    total_points: u64,
}

/// In-memory implementation of every collaborator, for tests and offline demos.
///
/// Records each call so tests can assert on what reached the "remote" side, and can be
/// told to fail submissions or gamification.
#[derive(Clone, Default)]
pub struct InMemoryRemote {
    state: Arc<Mutex<State>>,
}

impl InMemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, RemoteError> {
        self.state
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))
    }

    fn lock_unchecked(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_quiz(&self, quiz_id: QuizId, questions: Vec<Question>) {
        self.lock_unchecked().quizzes.insert(quiz_id, questions);
    }

    pub fn insert_hint(&self, question_id: QuestionId, hint: impl Into<String>) {
        self.lock_unchecked().hints.insert(question_id, hint.into());
    }

    /// Make the next `count` submissions fail with `RemoteError::Rejected`.
    pub fn fail_next_submissions(&self, count: usize) {
        self.lock_unchecked().failing_submissions = count;
    }

    pub fn set_gamification_failing(&self, failing: bool) {
        self.lock_unchecked().fail_gamification = failing;
    }

    /// Delay every submission by `delay` (runtime time, so paused tests can step it).
    pub fn set_submit_delay(&self, delay: Option<Duration>) {
        self.lock_unchecked().submit_delay = delay;
    }

    #[must_use]
    pub fn submissions(&self) -> Vec<SubmissionPayload> {
        self.lock_unchecked().submissions.clone()
    }

    #[must_use]
    pub fn hint_requests(&self) -> Vec<QuestionId> {
        self.lock_unchecked().hint_requests.clone()
    }

    #[must_use]
    pub fn recorded_results(&self) -> Vec<(ResultSummary, QuizResultMetadata)> {
        self.lock_unchecked().recorded_results.clone()
    }
}

#[async_trait]
impl QuizSource for InMemoryRemote {
    async fn fetch_quiz(
        &self,
        quiz_id: QuizId,
        question_count: usize,
    ) -> Result<Vec<Question>, RemoteError> {
        let guard = self.lock()?;
        let questions = guard.quizzes.get(&quiz_id).ok_or(RemoteError::NotFound)?;
        Ok(questions.iter().take(question_count).cloned().collect())
    }
}

#[async_trait]
impl HintSource for InMemoryRemote {
    async fn fetch_hint(&self, question_id: QuestionId) -> Result<String, RemoteError> {
        let mut guard = self.lock()?;
        guard.hint_requests.push(question_id);
        guard
            .hints
            .get(&question_id)
            .cloned()
            .ok_or(RemoteError::NotFound)
    }
}

#[async_trait]
impl SubmissionSink for InMemoryRemote {
    async fn submit_quiz(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, RemoteError> {
        let delay = self.lock()?.submit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut guard = self.lock()?;
        guard.submissions.push(payload.clone());
        if guard.failing_submissions > 0 {
            guard.failing_submissions -= 1;
            return Err(RemoteError::Rejected("scoring service unavailable".into()));
        }

        let questions: HashMap<QuestionId, &Question> = guard
            .quizzes
            .get(&payload.quiz_id)
            .map(|questions| questions.iter().map(|q| (q.id(), q)).collect())
            .unwrap_or_default();

        let mut score = 0u64;
        let mut max_score = 0u64;
        for answer in &payload.answers {
            let question = questions
                .get(&answer.question_id)
                .ok_or_else(|| RemoteError::Rejected(format!("unknown question {}", answer.question_id)))?;
            score += u64::from(resolve(question, answer.answer).points_earned);
            max_score += u64::from(question.point_value());
        }

        Ok(SubmissionReceipt {
            score: Some(score),
            max_score: Some(max_score),
            ..SubmissionReceipt::default()
        })
    }
}

#[async_trait]
impl GamificationSink for InMemoryRemote {
    async fn record_quiz_result(
        &self,
        summary: &ResultSummary,
        metadata: &QuizResultMetadata,
    ) -> Result<GamificationUpdate, RemoteError> {
        let mut guard = self.lock()?;
        if guard.fail_gamification {
            return Err(RemoteError::Connection("gamification backend offline".into()));
        }
        guard
            .recorded_results
            .push((summary.clone(), metadata.clone()));
        guard.streak += 1;
        guard.total_points += summary.score();

        let mut achievements = Vec::new();
        if summary.total_count() > 0 && summary.percentage() == 100 {
            achievements.push("perfect-score".to_owned());
        }
        Ok(GamificationUpdate {
            new_streak: Some(guard.streak),
            total_points: Some(guard.total_points),
            achievements_unlocked: achievements,
        })
    }
}
