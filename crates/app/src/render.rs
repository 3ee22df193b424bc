use std::fmt::Write as _;

use quiz_core::model::{AnswerChoice, FeedbackStage, Phase};
use quiz_services::{FinalReport, SessionSnapshot, SubmissionStatus};

/// The parts of a snapshot that warrant redrawing the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    phase: Phase,
    index: Option<usize>,
    remaining_seconds: Option<u32>,
    hint_used: bool,
    submitting: bool,
    has_result: bool,
}

impl Frame {
    #[must_use]
    pub fn of(snapshot: &SessionSnapshot) -> Self {
        Self {
            phase: snapshot.phase,
            index: snapshot.question.as_ref().map(|q| q.index),
            // Only redraw the countdown every five seconds and in the final five.
            remaining_seconds: snapshot
                .remaining_seconds
                .map(|left| if left <= 5 { left } else { left.div_ceil(5) * 5 }),
            hint_used: snapshot.hint_used,
            submitting: snapshot.navigation.submitting,
            has_result: snapshot.result.is_some(),
        }
    }
}

#[must_use]
pub fn snapshot(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();

    if let Some(question) = &snapshot.question {
        let _ = writeln!(
            out,
            "[{}/{}] {} ({} pts, {})",
            question.index + 1,
            snapshot.progress.total,
            question.prompt,
            question.point_value,
            question.difficulty,
        );
        for option in &question.options {
            let marker = match snapshot.selected {
                Some(AnswerChoice::Option(key)) if key == option.key => '>',
                _ => ' ',
            };
            let _ = writeln!(out, " {marker} {}) {}", option.key, option.text);
        }
    }

    match snapshot.phase {
        Phase::NotStarted => out.push_str("waiting to start\n"),
        Phase::InProgress => match snapshot.remaining_seconds {
            Some(left) => {
                let _ = writeln!(out, "{left}s left");
            }
            None if snapshot.selected.is_some() => out.push_str("already answered\n"),
            None => {}
        },
        Phase::Feedback(FeedbackStage::Reveal) => out.push_str("answer locked in...\n"),
        Phase::Feedback(FeedbackStage::Verdict) => {}
        Phase::Finished if snapshot.navigation.submitting => out.push_str("submitting...\n"),
        Phase::Finished => {}
    }

    if let Some(verdict) = snapshot.verdict {
        if snapshot.selected == Some(AnswerChoice::Timeout) {
            out.push_str("time is up\n");
        }
        if verdict.is_correct {
            let _ = writeln!(out, "correct (+{})", verdict.points_earned);
        } else {
            out.push_str("incorrect\n");
        }
        if let Some(explanation) = snapshot.question.as_ref().and_then(|q| q.explanation.as_ref()) {
            let _ = writeln!(out, "{explanation}");
        }
    }

    if let Some(result) = &snapshot.result {
        out.push_str(&report(result));
    }
    out
}

#[must_use]
pub fn report(report: &FinalReport) -> String {
    let summary = &report.summary;
    let mut out = format!(
        "score {}/{} ({}%), {}/{} correct in {}s\n",
        summary.score(),
        summary.max_score(),
        summary.percentage(),
        summary.correct_count(),
        summary.total_count(),
        summary.time_taken_seconds(),
    );
    match &report.submission {
        SubmissionStatus::Submitted { receipt } => {
            if let Some(final_score) = receipt.final_score {
                let _ = writeln!(out, "final score after hints and bonuses: {final_score}");
            }
        }
        SubmissionStatus::Failed { reason } => {
            let _ = writeln!(out, "not submitted: {reason} (type `retry`)");
        }
    }
    if let Some(gamification) = &report.gamification {
        if let Some(streak) = gamification.new_streak {
            let _ = writeln!(out, "streak: {streak}");
        }
        for achievement in &gamification.achievements_unlocked {
            let _ = writeln!(out, "unlocked: {achievement}");
        }
    }
    out
}
