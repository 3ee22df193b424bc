use std::future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use quiz_core::Clock;
use quiz_core::Resolution;
use quiz_core::model::{OptionKey, QuestionId, SessionId};
use quiz_remote::{HintSource, RemoteError};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::finalizer::{FinalReport, Finalization, Finalizer};
use super::navigation::Advance;
use super::snapshot::SessionSnapshot;
use super::state::{QuizSession, TimerOutcome};
use crate::error::SessionError;

const COMMAND_BUFFER: usize = 16;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;
type HintFetch = BoxFuture<'static, (Reply<String>, Result<String, SessionError>)>;

enum Command {
    Select {
        question_id: QuestionId,
        key: OptionKey,
        reply: Reply<Resolution>,
    },
    Hint {
        question_id: QuestionId,
        reply: Reply<String>,
    },
    Back {
        reply: Reply<usize>,
    },
    Forward {
        reply: Reply<usize>,
    },
    Retry {
        reply: Reply<FinalReport>,
    },
    Abandon,
}

/// How a session task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed(FinalReport),
    Abandoned,
}

//
// ─── DRIVER ────────────────────────────────────────────────────────────────────
//

/// Task that owns one session and serializes every input to it.
///
/// Commands, countdown expiry, dwell steps, remote hint fetches and the submission future
/// all go through one `select!`, commands first, so a click that is already queued when the
/// countdown expires is applied before the expiry.
struct SessionDriver {
    session: QuizSession,
    clock: Clock,
    finalizer: Finalizer,
    hints: Arc<dyn HintSource>,
    hint_fetches: FuturesUnordered<HintFetch>,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<SessionSnapshot>,
    tick_interval: Duration,
    finalization: Option<Finalization>,
    in_flight: Option<BoxFuture<'static, FinalReport>>,
    retry_waiters: Vec<Reply<FinalReport>>,
    report: Option<FinalReport>,
}

impl SessionDriver {
    async fn run(mut self) -> SessionOutcome {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.session.next_deadline();
            let ticking = self.session.phase().is_in_progress();

            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Abandon) | None => return self.abandon(),
                    Some(command) => self.handle(command),
                },
                report = settle(&mut self.in_flight) => {
                    if let Some(outcome) = self.on_settled(report) {
                        return outcome;
                    }
                }
                Some((reply, hint)) = self.hint_fetches.next(), if !self.hint_fetches.is_empty() => {
                    let _ = reply.send(hint);
                }
                () = wait_until(deadline) => self.on_timer(),
                _ = ticker.tick(), if ticking => {}
            }

            self.publish();
        }
    }

    fn handle(&mut self, command: Command) {
        let now = Instant::now();
        match command {
            Command::Select {
                question_id,
                key,
                reply,
            } => {
                let _ = reply.send(self.session.select_answer(question_id, key, now));
            }
            Command::Hint { question_id, reply } => match self.session.request_hint(question_id) {
                Ok(Some(embedded)) => {
                    let _ = reply.send(Ok(embedded.to_owned()));
                }
                Ok(None) => self.fetch_hint(question_id, reply),
                Err(err) => {
                    let _ = reply.send(Err(err));
                }
            },
            Command::Back { reply } => {
                let _ = reply.send(self.session.go_back(now));
            }
            Command::Forward { reply } => {
                let _ = reply.send(self.session.go_forward(now));
            }
            Command::Retry { reply } => self.retry(reply),
            Command::Abandon => {}
        }
    }

    /// The hint is already consumed; the fetch only delivers its text.
    fn fetch_hint(&mut self, question_id: QuestionId, reply: Reply<String>) {
        let hints = Arc::clone(&self.hints);
        self.hint_fetches.push(
            async move {
                let hint = hints
                    .fetch_hint(question_id)
                    .await
                    .map_err(|err| match err {
                        RemoteError::NotFound => SessionError::NoHintAvailable(question_id),
                        other => SessionError::Remote(other),
                    });
                (reply, hint)
            }
            .boxed(),
        );
    }

    fn on_timer(&mut self) {
        let now = Instant::now();
        match self.session.on_timer(now) {
            Ok(Some(TimerOutcome::Advanced(Advance::Finish))) => self.finalize(now),
            Ok(Some(TimerOutcome::Expired { question_id, .. })) => {
                tracing::debug!(session_id = %self.session.session_id(), %question_id, "countdown expired");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(session_id = %self.session.session_id(), error = %err, "timer transition rejected");
            }
        }
    }

    fn finalize(&mut self, now: Instant) {
        match Finalization::from_session(&self.session, now, self.clock.now()) {
            Ok(finalization) => {
                tracing::info!(
                    session_id = %self.session.session_id(),
                    score = finalization.summary.score(),
                    correct = finalization.summary.correct_count(),
                    total = finalization.summary.total_count(),
                    "session finalized"
                );
                self.finalization = Some(finalization);
                if let Err(err) = self.start_submission() {
                    tracing::warn!(error = %err, "could not start submission");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "finalization rejected");
            }
        }
    }

    fn start_submission(&mut self) -> Result<(), SessionError> {
        let Some(finalization) = self.finalization.clone() else {
            return Err(SessionError::IllegalTransition {
                operation: "submit",
                phase: self.session.phase(),
            });
        };
        self.session.begin_submission()?;
        let finalizer = self.finalizer.clone();
        self.in_flight = Some(async move { finalizer.deliver(&finalization).await }.boxed());
        Ok(())
    }

    fn retry(&mut self, reply: Reply<FinalReport>) {
        if self.session.is_submitting() {
            let _ = reply.send(Err(SessionError::SubmissionInFlight));
            return;
        }
        if let Some(report) = self.report.as_ref().filter(|report| report.is_submitted()) {
            let _ = reply.send(Ok(report.clone()));
            return;
        }
        match self.start_submission() {
            Ok(()) => {
                tracing::info!(session_id = %self.session.session_id(), "retrying submission");
                self.retry_waiters.push(reply);
            }
            Err(err) => {
                let _ = reply.send(Err(err));
            }
        }
    }

    fn on_settled(&mut self, report: FinalReport) -> Option<SessionOutcome> {
        self.in_flight = None;
        self.session.end_submission();
        for waiter in self.retry_waiters.drain(..) {
            let _ = waiter.send(Ok(report.clone()));
        }
        let submitted = report.is_submitted();
        self.report = Some(report);

        if submitted {
            self.publish();
            return self.report.clone().map(SessionOutcome::Completed);
        }
        None
    }

    /// Dropping the driver drops the countdown, the pending dwell, hint fetches and any
    /// in-flight submission together.
    fn abandon(self) -> SessionOutcome {
        tracing::info!(
            session_id = %self.session.session_id(),
            phase = %self.session.phase(),
            submitting = self.session.is_submitting(),
            "session abandoned"
        );
        match self.report {
            Some(report) => SessionOutcome::Completed(report),
            None => SessionOutcome::Abandoned,
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(SessionSnapshot::capture(
            &self.session,
            Instant::now(),
            self.report.as_ref(),
        ));
    }
}

async fn settle(in_flight: &mut Option<BoxFuture<'static, FinalReport>>) -> FinalReport {
    match in_flight {
        Some(submission) => submission.await,
        None => future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

//
// ─── HANDLE ────────────────────────────────────────────────────────────────────
//

/// UI-facing handle to a running session.
///
/// Dropping the handle abandons the session.
pub struct SessionHandle {
    session_id: SessionId,
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    /// Spawn the driver task for a started session.
    #[must_use]
    pub(crate) fn spawn(
        session: QuizSession,
        clock: Clock,
        finalizer: Finalizer,
        hints: Arc<dyn HintSource>,
        tick_interval: Duration,
    ) -> Self {
        let session_id = session.session_id();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) =
            watch::channel(SessionSnapshot::capture(&session, Instant::now(), None));

        let driver = SessionDriver {
            session,
            clock,
            finalizer,
            hints,
            hint_fetches: FuturesUnordered::new(),
            commands: command_rx,
            snapshots: snapshot_tx,
            tick_interval,
            finalization: None,
            in_flight: None,
            retry_waiters: Vec::new(),
            report: None,
        };
        let task = tokio::spawn(driver.run());

        Self {
            session_id,
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// # Errors
    ///
    /// Returns the rejection from the session, or `SessionError::SessionClosed`.
    pub async fn select_answer(
        &self,
        question_id: QuestionId,
        key: OptionKey,
    ) -> Result<Resolution, SessionError> {
        self.call(|reply| Command::Select {
            question_id,
            key,
            reply,
        })
        .await
    }

    /// Consume the hint of the active question and return its text.
    ///
    /// The hint counts as used even if fetching its text fails. A remote fetch runs inside
    /// the session task, so abandoning the session cancels it. The returned future does not
    /// borrow the handle and can be spawned.
    ///
    /// # Errors
    ///
    /// Returns the rejection from the session, `SessionError::NoHintAvailable` when the hint
    /// source has nothing for the question, the remote error, or
    /// `SessionError::SessionClosed`.
    pub fn request_hint(
        &self,
        question_id: QuestionId,
    ) -> BoxFuture<'static, Result<String, SessionError>> {
        let commands = self.commands.clone();
        async move {
            let (reply, response) = oneshot::channel();
            commands
                .send(Command::Hint { question_id, reply })
                .await
                .map_err(|_| SessionError::SessionClosed)?;
            // The handle alone keeps the session alive.
            drop(commands);
            response.await.map_err(|_| SessionError::SessionClosed)?
        }
        .boxed()
    }

    /// # Errors
    ///
    /// Returns the rejection from the session, or `SessionError::SessionClosed`.
    pub async fn go_back(&self) -> Result<usize, SessionError> {
        self.call(|reply| Command::Back { reply }).await
    }

    /// # Errors
    ///
    /// Returns the rejection from the session, or `SessionError::SessionClosed`.
    pub async fn go_forward(&self) -> Result<usize, SessionError> {
        self.call(|reply| Command::Forward { reply }).await
    }

    /// Resubmit the stored payload after a failed submission.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SubmissionInFlight` while a submission is running,
    /// `SessionError::IllegalTransition` before the session is finished, or
    /// `SessionError::SessionClosed`.
    pub async fn retry_submission(&self) -> Result<FinalReport, SessionError> {
        self.call(|reply| Command::Retry { reply }).await
    }

    /// Wait until the session is finished and its first submission attempt has settled.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionClosed` if the session ends without a result.
    pub async fn wait_for_result(&mut self) -> Result<FinalReport, SessionError> {
        let snapshot = self
            .snapshots
            .wait_for(|snapshot| snapshot.result.is_some())
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        snapshot.result.clone().ok_or(SessionError::SessionClosed)
    }

    /// Tear the session down. Pending timers and remote calls are cancelled.
    pub async fn abandon(self) -> SessionOutcome {
        let _ = self.commands.send(Command::Abandon).await;
        self.task.await.unwrap_or(SessionOutcome::Abandoned)
    }

    /// Wait for the session to end on its own, which happens once a submission succeeds.
    ///
    /// A session whose submission failed keeps waiting for a retry; use
    /// [`SessionHandle::abandon`] to close it.
    pub async fn join(self) -> SessionOutcome {
        let Self { commands, task, .. } = self;
        let outcome = task.await.unwrap_or(SessionOutcome::Abandoned);
        drop(commands);
        outcome
    }

    async fn call<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        response.await.map_err(|_| SessionError::SessionClosed)?
    }
}
