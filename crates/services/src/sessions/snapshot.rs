use quiz_core::model::{
    AnswerChoice, Difficulty, FeedbackStage, OptionKey, Phase, Question, QuestionId, SessionId,
};
use quiz_core::{Resolution, resolve};
use serde::Serialize;
use tokio::time::Instant;

use super::finalizer::FinalReport;
use super::navigation::NavigationState;
use super::progress::SessionProgress;
use super::state::QuizSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub key: OptionKey,
    pub text: String,
}

/// The active question as the student sees it. Never exposes the correct key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub index: usize,
    pub prompt: String,
    pub options: Vec<OptionView>,
    pub point_value: u32,
    pub time_limit_seconds: u32,
    pub difficulty: Difficulty,
    pub has_embedded_hint: bool,
    /// Only filled once the verdict is visible.
    pub explanation: Option<String>,
}

impl QuestionView {
    fn new(question: &Question, index: usize, verdict_visible: bool) -> Self {
        Self {
            id: question.id(),
            index,
            prompt: question.prompt().to_owned(),
            options: question
                .available_options()
                .map(|(key, text)| OptionView {
                    key,
                    text: text.to_owned(),
                })
                .collect(),
            point_value: question.point_value(),
            time_limit_seconds: question.time_limit_seconds(),
            difficulty: question.difficulty(),
            has_embedded_hint: question.hint().is_some(),
            explanation: verdict_visible
                .then(|| question.explanation().map(str::to_owned))
                .flatten(),
        }
    }
}

/// Read-only picture of a session, published after every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub phase: Phase,
    pub question: Option<QuestionView>,
    pub remaining_seconds: Option<u32>,
    pub selected: Option<AnswerChoice>,
    pub verdict: Option<Resolution>,
    pub hint_used: bool,
    pub navigation: NavigationState,
    pub progress: SessionProgress,
    pub result: Option<FinalReport>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn capture(session: &QuizSession, now: Instant, result: Option<&FinalReport>) -> Self {
        let active = session.current_question();
        let selected = active.and_then(|q| session.answer_for(q.id()));
        // Revisited questions show their stored verdict; the reveal stage hides it.
        let verdict_visible = selected.is_some()
            && session.phase() != Phase::Feedback(FeedbackStage::Reveal);
        let verdict = match (active, selected) {
            (Some(question), Some(choice)) if verdict_visible => Some(resolve(question, choice)),
            _ => None,
        };

        Self {
            session_id: session.session_id(),
            phase: session.phase(),
            question: active.map(|q| QuestionView::new(q, session.current_index(), verdict_visible)),
            remaining_seconds: session.remaining_seconds(now),
            selected,
            verdict,
            hint_used: active.is_some_and(|q| session.hint_used(q.id())),
            navigation: session.navigation(),
            progress: session.progress(),
            result: result.cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::test_support::question;
    use crate::settings::EngineSettings;
    use quiz_core::model::QuizId;
    use quiz_core::time::fixed_now;
    use std::time::Duration;

    #[test]
    fn verdict_is_hidden_during_reveal_and_shown_on_revisit() {
        let mut session = QuizSession::new(
            SessionId::generate(),
            QuizId::new(1),
            vec![question(1, OptionKey::A, 10), question(2, OptionKey::A, 10)],
            fixed_now(),
            &EngineSettings::default(),
        )
        .unwrap();
        let t0 = Instant::now();
        session.start(t0).unwrap();

        let fresh = SessionSnapshot::capture(&session, t0, None);
        assert_eq!(fresh.remaining_seconds, Some(30));
        assert_eq!(fresh.question.as_ref().map(|q| q.options.len()), Some(3));

        session.select_answer(QuestionId::new(1), OptionKey::B, t0).unwrap();
        let reveal = SessionSnapshot::capture(&session, t0, None);
        assert_eq!(reveal.selected, Some(AnswerChoice::Option(OptionKey::B)));
        assert_eq!(reveal.verdict, None);
        assert_eq!(reveal.remaining_seconds, None);

        session.advance(t0).unwrap();
        let t1 = t0 + Duration::from_secs(2);
        session.go_back(t1).unwrap();
        let revisit = SessionSnapshot::capture(&session, t1, None);
        assert_eq!(revisit.selected, Some(AnswerChoice::Option(OptionKey::B)));
        assert_eq!(
            revisit.verdict,
            Some(Resolution {
                is_correct: false,
                points_earned: 0
            })
        );
        assert!(revisit.navigation.can_go_forward);
        assert!(!revisit.navigation.can_go_back);
    }
}
