use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use quiz_core::Clock;
use quiz_core::model::QuizId;
use quiz_remote::{
    GamificationSink, HintSource, HttpRemote, QuizSource, RemoteConfig, SubmissionSink,
};
use quiz_services::{EngineSettings, QuizSessionService, SessionHandle, SessionOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod demo;
mod input;
mod render;

use input::Input;
use render::Frame;

/// Run a timed quiz in the terminal.
#[derive(Debug, Parser)]
#[command(name = "quiz", version)]
struct Args {
    /// Quiz to load.
    #[arg(long, default_value_t = 1)]
    quiz_id: u64,

    /// Number of questions to request (defaults to the configured count).
    #[arg(long)]
    count: Option<usize>,

    /// Base URL of the scoring service. Falls back to `QUIZ_API_URL`.
    #[arg(long)]
    api_url: Option<String>,

    /// Bearer token for the scoring service. Falls back to `QUIZ_API_KEY`.
    #[arg(long)]
    api_key: Option<String>,

    /// Use the built-in sample quiz instead of a remote service.
    #[arg(long)]
    demo: bool,

    /// Present questions in random order.
    #[arg(long)]
    shuffle: bool,
}

struct Backend {
    quizzes: Arc<dyn QuizSource>,
    hints: Arc<dyn HintSource>,
    submissions: Arc<dyn SubmissionSink>,
    gamification: Arc<dyn GamificationSink>,
}

impl Backend {
    fn from_args(args: &Args, quiz_id: QuizId) -> Self {
        let remote_config = args
            .api_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .map(|base_url| RemoteConfig {
                base_url,
                api_key: args.api_key.clone(),
            })
            .or_else(RemoteConfig::from_env);

        match remote_config {
            Some(config) if !args.demo => {
                tracing::info!(base_url = %config.base_url, "using remote scoring service");
                let remote = Arc::new(HttpRemote::new(config));
                Self {
                    quizzes: remote.clone(),
                    hints: remote.clone(),
                    submissions: remote.clone(),
                    gamification: remote,
                }
            }
            _ => {
                tracing::info!("using the built-in demo quiz");
                let remote = Arc::new(demo::remote(quiz_id));
                Self {
                    quizzes: remote.clone(),
                    hints: remote.clone(),
                    submissions: remote.clone(),
                    gamification: remote,
                }
            }
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("quiz_app=info,quiz_services=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Apply one student command. Returns `false` when the student quits.
async fn apply(handle: &SessionHandle, input: Input) -> bool {
    let snapshot = handle.snapshot();
    let active = snapshot.question.as_ref().map(|q| q.id);
    let outcome = match (input, active) {
        (Input::Quit, _) => return false,
        (Input::Select(key), Some(question_id)) => {
            handle.select_answer(question_id, key).await.map(|_| ())
        }
        (Input::Hint, Some(question_id)) => {
            // Remote hints may take a while; keep redrawing meanwhile.
            let pending = handle.request_hint(question_id);
            tokio::spawn(async move {
                match pending.await {
                    Ok(hint) => println!("hint: {hint}"),
                    Err(err) => println!("{err}"),
                }
            });
            Ok(())
        }
        (Input::Back, _) => handle.go_back().await.map(|_| ()),
        (Input::Next, _) => handle.go_forward().await.map(|_| ()),
        (Input::Retry, _) => handle.retry_submission().await.map(|_| ()),
        (Input::Select(_) | Input::Hint, None) => {
            println!("no active question");
            Ok(())
        }
    };
    if let Err(err) = outcome {
        println!("{err}");
    }
    true
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = EngineSettings::load().context("loading engine settings")?;
    let quiz_id = QuizId::new(args.quiz_id);
    let backend = Backend::from_args(&args, quiz_id);

    let service = QuizSessionService::new(
        Clock::default(),
        backend.quizzes,
        backend.hints,
        backend.submissions,
        backend.gamification,
    )
    .with_settings(settings)
    .with_shuffle(args.shuffle);

    let handle = service
        .start_session(quiz_id, args.count)
        .await
        .with_context(|| format!("starting quiz {quiz_id}"))?;
    let mut snapshots = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_frame = None;

    loop {
        let current = snapshots.borrow_and_update().clone();
        let frame = Frame::of(&current);
        if last_frame.as_ref() != Some(&frame) {
            print!("{}", render::snapshot(&current));
            last_frame = Some(frame);
        }
        if current.result.as_ref().is_some_and(|r| r.is_submitted()) {
            break;
        }

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                match input::parse(&line) {
                    Ok(Some(command)) => {
                        if !apply(&handle, command).await {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => println!("{err}"),
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    let last = snapshots.borrow().clone();
    if last_frame.as_ref() != Some(&Frame::of(&last)) {
        print!("{}", render::snapshot(&last));
    }

    match handle.abandon().await {
        SessionOutcome::Completed(report) => {
            tracing::info!(submitted = report.is_submitted(), "session closed");
        }
        SessionOutcome::Abandoned => println!("quiz abandoned"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    run().await
}
