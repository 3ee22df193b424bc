use quiz_core::model::{Difficulty, OptionKey, QuestionDraft, QuestionId, QuizId};
use quiz_remote::InMemoryRemote;

struct Seed {
    prompt: &'static str,
    options: [&'static str; 4],
    correct: OptionKey,
    explanation: &'static str,
    hint: Option<&'static str>,
    points: u32,
    seconds: u32,
    difficulty: Difficulty,
}

const SEEDS: &[Seed] = &[
    Seed {
        prompt: "Which keyword moves a value into a closure?",
        options: ["ref", "move", "static", "dyn"],
        correct: OptionKey::B,
        explanation: "`move` closures take ownership of captured variables.",
        hint: Some("It describes what happens to ownership."),
        points: 10,
        seconds: 20,
        difficulty: Difficulty::Easy,
    },
    Seed {
        prompt: "What does the `?` operator do on an `Err` value?",
        options: [
            "Panics",
            "Returns it early from the function",
            "Ignores it",
            "Converts it to `None`",
        ],
        correct: OptionKey::B,
        explanation: "`?` converts the error with `From` and returns it.",
        hint: None,
        points: 20,
        seconds: 25,
        difficulty: Difficulty::Medium,
    },
    Seed {
        prompt: "Which trait lets a type be sent to another thread?",
        options: ["Sync", "Copy", "Send", "Unpin"],
        correct: OptionKey::C,
        explanation: "`Send` marks types whose ownership can move across threads.",
        hint: None,
        points: 30,
        seconds: 30,
        difficulty: Difficulty::Hard,
    },
];

/// An in-process backend with a small quiz under `quiz_id`.
#[must_use]
pub fn remote(quiz_id: QuizId) -> InMemoryRemote {
    let remote = InMemoryRemote::new();
    let mut questions = Vec::with_capacity(SEEDS.len());
    for (id, seed) in (1u64..).zip(SEEDS) {
        let draft = QuestionDraft {
            id: QuestionId::new(id),
            prompt: seed.prompt.to_owned(),
            options: seed.options.map(|text| Some(text.to_owned())),
            correct_option_key: seed.correct,
            explanation: Some(seed.explanation.to_owned()),
            hint: seed.hint.map(str::to_owned),
            point_value: seed.points,
            time_limit_seconds: seed.seconds,
            difficulty: seed.difficulty,
        };
        match draft.validate() {
            Ok(question) => questions.push(question),
            Err(err) => tracing::warn!(question_id = id, error = %err, "skipping demo question"),
        }
    }
    remote.insert_hint(
        QuestionId::new(2),
        "Think about what happens to the error after it is found.",
    );
    remote.insert_quiz(quiz_id, questions);
    remote
}
