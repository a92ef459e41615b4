// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Session state machine (C2).
//!
//! Grounded on the teacher's `SessionActor`/`SessionState` (Idle/Receiving/
//! Processing/Responding/Draining) for the split between a pure, mutex-
//! guarded state struct and an async driver loop that owns the tick, and on
//! `original_source/src/websocket/InteractiveSession.py`'s `_main_loop` /
//! `_waiting_timer` / `_question_timer` / `_discussion_timer` for the exact
//! phase transitions and idle-timer semantics this reimplements. One
//! `tokio::task` per Session runs [`Session::run`]; everything else
//! (attach/detach/commands/submissions) is called from whichever gateway
//! task handles the originating connection, synchronized through the single
//! `Mutex<SessionState>`.
//!
//! The pure pieces -- [`SessionState`], [`apply_leader_command`], and
//! [`apply_tick`] -- carry no I/O and are exercised directly by the unit
//! tests below; the async [`Session`] wrapper is exercised by the crate's
//! integration tests against a real [`StorageRepository`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};

use livequiz_core::wire::{LeaderCommand, OutboundFrame, ParticipantSubmission};
use livequiz_core::{
    EndReason, EngineError, IdleState, InteractiveMeta, Phase, Question, QuestionType, Role,
    StorageRepository, UserAnswer, UserId,
};

use crate::broadcast::{self, DiscussionAggregates};
use crate::ingest;
use crate::registry::ConnectionRegistry;
use crate::winners;

/// The four idle/pause timer windows, read from `livequiz-config`'s
/// `EngineConfig` by the caller that constructs a [`Session`] -- kept as a
/// plain struct here so this crate does not need a dependency on the config
/// crate's TOML model.
#[derive(Debug, Clone, Copy)]
pub struct IdleConfig {
    pub waiting_idle_seconds: i64,
    pub waiting_warning_seconds: i64,
    pub paused_idle_seconds: i64,
    pub paused_warning_seconds: i64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            waiting_idle_seconds: 30 * 60,
            waiting_warning_seconds: 15 * 60,
            paused_idle_seconds: 10 * 60,
            paused_warning_seconds: 5 * 60,
        }
    }
}

/// Per-interactive phase durations, read once at Session construction.
#[derive(Debug, Clone, Copy)]
pub struct PhaseDurations {
    pub answer: i64,
    pub discussion: i64,
}

/// The Session's mutable fields, guarded by a single mutex (§5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub question_index: usize,
    pub duration: i64,
    pub remaining: i64,
    pub elapsed_on_question: i64,
    /// `1` while running, `0` while paused. Subtracted from `remaining` each
    /// tick so pausing freezes the phase timer without a separate branch.
    pub tick_step: u8,
    pub idle_state: IdleState,
    pub idle_seconds_left: i64,
    /// Set the first time the Session enters DISCUSSION. Distinguishes a
    /// completion END from a cancellation END (§7, §8 invariant 4) even when
    /// the forcing event (leader `END`, idle timeout) fires later.
    pub passed_discussion: bool,
    /// Set the moment a leader `END` command (or a WAITING leader-disconnect)
    /// flips `phase` to `End` outside the normal tick-driven transitions.
    /// [`apply_tick`] consumes this on the next tick to produce the
    /// [`TickResult::destroyed`] the driver loop needs to stop -- without it,
    /// a phase already at `End` would otherwise never report a reason and
    /// the Session would broadcast END forever instead of finishing.
    pub forced_end_reason: Option<EndReason>,
}

impl SessionState {
    pub fn new(idle_cfg: &IdleConfig) -> Self {
        Self {
            phase: Phase::Waiting,
            question_index: 0,
            duration: 0,
            remaining: 0,
            elapsed_on_question: 0,
            tick_step: 1,
            idle_state: IdleState::Idle,
            idle_seconds_left: idle_cfg.waiting_idle_seconds,
            passed_discussion: false,
            forced_end_reason: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderCommandOutcome {
    Applied,
    Ignored,
}

/// Applies a LEADER command to `state`, per the §4.1.1 transition table. A
/// command not valid for the current phase is ignored, never an error -- the
/// gateway still acknowledges receipt; only the command's effect is a no-op.
pub fn apply_leader_command(
    state: &mut SessionState,
    cmd: LeaderCommand,
    idle_cfg: &IdleConfig,
    countdown_duration: i64,
) -> LeaderCommandOutcome {
    use LeaderCommandOutcome::*;
    match (state.phase, cmd) {
        (Phase::Waiting, LeaderCommand::Going) => {
            state.phase = Phase::Countdown;
            state.duration = countdown_duration;
            state.remaining = countdown_duration;
            state.idle_state = IdleState::Active;
            Applied
        }
        (Phase::Waiting, LeaderCommand::MorePause) => {
            state.idle_state = IdleState::Idle;
            state.idle_seconds_left = idle_cfg.waiting_idle_seconds;
            Applied
        }
        (Phase::Waiting, LeaderCommand::End) => {
            state.phase = Phase::End;
            state.forced_end_reason = Some(EndReason::Cancelled);
            Applied
        }
        (Phase::Countdown | Phase::Question | Phase::Discussion, LeaderCommand::Pause) => {
            state.tick_step = if state.tick_step == 1 { 0 } else { 1 };
            if state.tick_step == 0 {
                state.idle_state = IdleState::Idle;
                state.idle_seconds_left = idle_cfg.paused_idle_seconds;
            } else {
                state.idle_state = IdleState::Active;
            }
            Applied
        }
        (Phase::Countdown | Phase::Question | Phase::Discussion, LeaderCommand::MorePause)
            if state.tick_step == 0 =>
        {
            state.idle_state = IdleState::Idle;
            state.idle_seconds_left = idle_cfg.paused_idle_seconds;
            Applied
        }
        (Phase::Countdown | Phase::Question | Phase::Discussion, LeaderCommand::End) => {
            state.phase = Phase::End;
            // §8 invariant 4 overrides the literal transition-table wording
            // ("COUNTDOWN/QUESTION/DISCUSSION -> END, set conducted=true"):
            // `conducted` is only ever set once the Session has passed
            // through a DISCUSSION phase, so an explicit END issued during
            // COUNTDOWN or before the first DISCUSSION is still a
            // cancellation.
            state.forced_end_reason = Some(if state.passed_discussion {
                EndReason::Completed
            } else {
                EndReason::Cancelled
            });
            Applied
        }
        _ => Ignored,
    }
}

/// What the async driver loop must do after one tick of [`apply_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickResult {
    pub phase_changed: bool,
    /// `true` for exactly the ticks during which a connected PARTICIPANT's
    /// elapsed QUESTION-connected-time should be credited.
    pub participant_time_ticked: bool,
    pub destroyed: Option<EndReason>,
}

/// Advances `state` by one second. Pure: no I/O, no randomness, no clock
/// reads -- the caller supplies the question count and per-interactive phase
/// durations.
pub fn apply_tick(
    state: &mut SessionState,
    idle_cfg: &IdleConfig,
    total_questions: usize,
    durations: &PhaseDurations,
) -> TickResult {
    let mut result = TickResult {
        phase_changed: false,
        participant_time_ticked: false,
        destroyed: None,
    };

    // Phase already flipped to End by a leader `END` command or a WAITING
    // leader-disconnect (both set `forced_end_reason` synchronously, ahead
    // of the next tick). Report it once and stop -- nothing below applies
    // to a Session that has already ended.
    if state.phase == Phase::End {
        result.destroyed = state.forced_end_reason.take();
        return result;
    }

    let idle_active = state.phase == Phase::Waiting || state.tick_step == 0;
    if idle_active {
        state.idle_seconds_left -= 1;
        if state.idle_seconds_left < 0 {
            match state.idle_state {
                IdleState::Idle => {
                    state.idle_state = IdleState::Warning;
                    state.idle_seconds_left = if state.phase == Phase::Waiting {
                        idle_cfg.waiting_warning_seconds
                    } else {
                        idle_cfg.paused_warning_seconds
                    };
                }
                IdleState::Warning => {
                    state.phase = Phase::End;
                    result.phase_changed = true;
                    // Idle-timeout ends are always a cancellation, even if
                    // the Session had already passed a DISCUSSION phase
                    // (§7: "conducted is not set on cancellation").
                    result.destroyed = Some(EndReason::Cancelled);
                    return result;
                }
                IdleState::Active => {}
            }
        }
    }

    if state.phase == Phase::Waiting {
        return result;
    }

    if state.phase == Phase::Question && state.tick_step == 1 {
        state.elapsed_on_question += 1;
        result.participant_time_ticked = true;
    }
    state.remaining -= state.tick_step as i64;

    if state.remaining < 0 {
        match state.phase {
            Phase::Countdown => {
                state.phase = Phase::Question;
                state.question_index = 0;
                state.duration = durations.answer;
                state.remaining = durations.answer;
                state.elapsed_on_question = 0;
                result.phase_changed = true;
            }
            Phase::Question => {
                state.phase = Phase::Discussion;
                state.passed_discussion = true;
                state.duration = durations.discussion;
                state.remaining = durations.discussion;
                result.phase_changed = true;
            }
            Phase::Discussion => {
                if state.question_index + 1 < total_questions {
                    state.question_index += 1;
                    state.phase = Phase::Question;
                    state.duration = durations.answer;
                    state.remaining = durations.answer;
                    state.elapsed_on_question = 0;
                } else {
                    state.phase = Phase::End;
                    result.destroyed = Some(EndReason::Completed);
                }
                result.phase_changed = true;
            }
            _ => {}
        }
    }

    result
}

/// How long a single send may block a full connection queue before the
/// Session gives up on it and treats it as disconnected (§4.7, §5
/// Backpressure).
const SEND_DEADLINE: Duration = Duration::from_secs(2);

/// The live, async-driven Session: one instance per running interactive.
pub struct Session {
    pub interactive: InteractiveMeta,
    questions: Vec<Question>,
    state: Mutex<SessionState>,
    pub registry: ConnectionRegistry,
    storage: Arc<dyn StorageRepository>,
    idle_cfg: IdleConfig,
    tick_seconds: u64,
    /// Seconds of QUESTION-phase connected time accrued since the last
    /// flush, per participant. Flushed to storage on disconnect and at END
    /// -- the single write site for `Participant::total_time` (§9).
    time_tracker: Mutex<HashMap<UserId, i64>>,
    participant_ids: Mutex<HashMap<UserId, livequiz_core::ParticipantId>>,
    /// This question's ingested answers, keyed by user. Backs the
    /// DISCUSSION-phase own-answer personalization without a second storage
    /// read; cleared when the Session advances to the next QUESTION.
    current_answers: Mutex<HashMap<UserId, UserAnswer>>,
}

impl Session {
    pub fn new(
        interactive: InteractiveMeta,
        questions: Vec<Question>,
        storage: Arc<dyn StorageRepository>,
        idle_cfg: IdleConfig,
        tick_seconds: u64,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SessionState::new(&idle_cfg)),
            interactive,
            questions,
            registry: ConnectionRegistry::new(),
            storage,
            idle_cfg,
            tick_seconds: tick_seconds.max(1),
            time_tracker: Mutex::new(HashMap::new()),
            participant_ids: Mutex::new(HashMap::new()),
            current_answers: Mutex::new(HashMap::new()),
        })
    }

    pub async fn current_phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    /// Attaches a connection and sends it an immediate snapshot frame so a
    /// (re)connecting client doesn't wait for the next tick to see state.
    ///
    /// Per §4.2: a PARTICIPANT attaching outside WAITING must already hold a
    /// registered Participant record -- a brand-new participant cannot join
    /// mid-session (S5). `register_participant` itself is idempotent, so the
    /// call below is also how an already-registered reconnect recovers its
    /// `ParticipantId` without a separate lookup method.
    pub async fn attach(
        &self,
        user: UserId,
        role: Role,
        sender: mpsc::Sender<OutboundFrame>,
    ) -> Result<(), EngineError> {
        if role == Role::Participant {
            let phase = self.current_phase().await;
            if phase != Phase::Waiting
                && !self
                    .storage
                    .is_participant_registered(self.interactive.id, user)
                    .await?
            {
                return Err(EngineError::Authorization(
                    "participant is not registered and the session is past WAITING".into(),
                ));
            }
            let participant_id = self
                .storage
                .register_participant(self.interactive.id, user)
                .await?;
            self.participant_ids.lock().await.insert(user, participant_id);
        }
        self.registry.attach(user, role, sender.clone())?;
        let frame = self.frame_for(user, role).await;
        let _ = Self::send_with_deadline(&sender, frame).await;
        Ok(())
    }

    /// Detaches a connection, flushing any accrued participant time first.
    ///
    /// Per §4.1 WAITING's exit conditions: a LEADER disconnecting before
    /// ever sending `GOING` destroys the Session (S6) -- flagged here so the
    /// next tick's [`apply_tick`] reports it, rather than the run loop
    /// drifting in WAITING with no leader forever.
    pub async fn detach(&self, user: UserId, role: Role) {
        if role == Role::Participant {
            self.flush_participant_time(user).await;
        }
        if role == Role::Leader {
            let mut state = self.state.lock().await;
            if state.phase == Phase::Waiting {
                state.phase = Phase::End;
                state.forced_end_reason = Some(EndReason::Cancelled);
            }
        }
        self.registry.detach(user, role);
    }

    pub async fn handle_leader_command(
        &self,
        user: UserId,
        cmd: LeaderCommand,
    ) -> Result<(), EngineError> {
        if !self.registry.is_attached(user, Role::Leader) {
            return Err(EngineError::Authorization(
                "command received from a connection that is not the attached leader".into(),
            ));
        }
        let mut state = self.state.lock().await;
        if apply_leader_command(&mut state, cmd, &self.idle_cfg, self.interactive.countdown_duration)
            == LeaderCommandOutcome::Ignored
        {
            tracing::debug!(?cmd, phase = ?state.phase, "leader command ignored in this phase");
        }
        Ok(())
    }

    /// Validates and records a PARTICIPANT's answer. Silently drops
    /// malformed or out-of-phase submissions per §4.4 -- callers must not
    /// translate a dropped submission into an error frame.
    pub async fn handle_participant_submission(
        &self,
        user: UserId,
        submission: ParticipantSubmission,
    ) -> Result<(), EngineError> {
        let (phase, question_index, elapsed) = {
            let state = self.state.lock().await;
            (state.phase, state.question_index, state.elapsed_on_question)
        };
        if phase != Phase::Question {
            return Ok(());
        }
        let Some(question) = self.questions.get(question_index) else {
            return Err(EngineError::FatalInvariant(
                "question_index out of range during QUESTION phase".into(),
            ));
        };
        let Some(ingested) = ingest::validate_submission(question, &submission) else {
            return Ok(());
        };
        let participant_id = {
            let cache = self.participant_ids.lock().await;
            match cache.get(&user) {
                Some(id) => *id,
                None => {
                    return Err(EngineError::Authorization(
                        "submission from a user with no registered participant record".into(),
                    ))
                }
            }
        };
        self.storage
            .upsert_user_answer(
                participant_id,
                question.id,
                &ingested.payload,
                ingested.is_correct,
                elapsed,
            )
            .await?;
        let answer = UserAnswer {
            participant_id,
            question_id: question.id,
            payload: ingested.payload,
            is_correct: ingested.is_correct,
            time_seconds: elapsed,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.current_answers.lock().await.insert(user, answer);
        Ok(())
    }

    /// Drives the Session's tick loop until it reaches END. Returns once the
    /// terminal broadcast has been sent; the caller (Session Manager) is
    /// responsible for removing this Session from its map afterward.
    pub async fn run(self: Arc<Self>) -> EndReason {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.tick_seconds));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let durations = PhaseDurations {
            answer: self.interactive.answer_duration,
            discussion: self.interactive.discussion_duration,
        };
        loop {
            ticker.tick().await;
            let (old_phase, new_phase, result, snapshot) = {
                let mut state = self.state.lock().await;
                let old_phase = state.phase;
                let total_questions = self.questions.len();
                let result = apply_tick(&mut state, &self.idle_cfg, total_questions, &durations);
                (old_phase, state.phase, result, *state)
            };

            if old_phase == Phase::Question && new_phase == Phase::Discussion {
                if let Some(q) = self.questions.get(snapshot.question_index) {
                    let _ = self
                        .storage
                        .record_question_time(self.interactive.id, q.id, snapshot.elapsed_on_question)
                        .await;
                }
            }
            if result.participant_time_ticked {
                self.tick_participant_time().await;
            }
            if old_phase != new_phase && new_phase == Phase::Question {
                self.current_answers.lock().await.clear();
            }

            if let Some(reason) = result.destroyed {
                self.finish(reason).await;
                return reason;
            }

            self.broadcast(new_phase, &snapshot).await;
        }
    }

    async fn tick_participant_time(&self) {
        let mut tracker = self.time_tracker.lock().await;
        for (user, role, _) in self.registry.snapshot() {
            if role == Role::Participant {
                *tracker.entry(user).or_insert(0) += 1;
            }
        }
    }

    async fn flush_participant_time(&self, user: UserId) {
        let seconds = self.time_tracker.lock().await.remove(&user).unwrap_or(0);
        if seconds > 0 {
            let _ = self
                .storage
                .accumulate_participant_time(self.interactive.id, user, seconds)
                .await;
        }
    }

    async fn flush_all_participant_time(&self) {
        let entries: Vec<(UserId, i64)> = self.time_tracker.lock().await.drain().collect();
        for (user, seconds) in entries {
            if seconds > 0 {
                let _ = self
                    .storage
                    .accumulate_participant_time(self.interactive.id, user, seconds)
                    .await;
            }
        }
    }

    async fn discussion_aggregates(&self, question: &Question) -> DiscussionAggregates {
        match question.question_type {
            QuestionType::Text => DiscussionAggregates::Text(
                self.storage
                    .text_match_percentages(question.id)
                    .await
                    .unwrap_or_default(),
            ),
            QuestionType::Single | QuestionType::Multi => DiscussionAggregates::Choices(
                self.storage
                    .selection_percentages(question.id)
                    .await
                    .unwrap_or_default(),
            ),
        }
    }

    /// Sends the current phase's broadcast to every attached connection.
    /// Fetches DISCUSSION aggregates at most once here and reuses them for
    /// every recipient, per §4.3.
    async fn broadcast(&self, phase: Phase, snapshot: &SessionState) {
        match phase {
            Phase::Waiting => {
                let frame = broadcast::waiting_frame(
                    &self.interactive,
                    snapshot.idle_state,
                    snapshot.idle_seconds_left,
                    self.registry.participant_count(),
                );
                self.send_to_all(frame).await;
            }
            Phase::Countdown => {
                let frame = broadcast::countdown_frame(snapshot.remaining, snapshot.duration);
                self.send_to_all(frame).await;
            }
            Phase::Question => {
                let Some(question) = self.questions.get(snapshot.question_index) else {
                    return;
                };
                let frame = broadcast::question_frame(
                    question,
                    snapshot.remaining,
                    snapshot.duration,
                    snapshot.idle_state,
                    snapshot.idle_seconds_left,
                    snapshot.tick_step,
                );
                self.send_to_all(frame).await;
            }
            Phase::Discussion => {
                let Some(question) = self.questions.get(snapshot.question_index) else {
                    return;
                };
                let aggregates = self.discussion_aggregates(question).await;
                let leaderboard = self
                    .storage
                    .leaderboard(self.interactive.id)
                    .await
                    .unwrap_or_default();
                let top3 = winners::top_n(&leaderboard, 3);
                let standings = winners::own_standings(&leaderboard);
                let targets = {
                    let answers = self.current_answers.lock().await;
                    self.registry
                        .snapshot()
                        .into_iter()
                        .map(|(user, role, sender)| {
                            let frame = if role == Role::Participant {
                                let own_score = standings.get(&user).map(|s| s.score).unwrap_or(0);
                                broadcast::discussion_frame_for_participant(
                                    question,
                                    &aggregates,
                                    &top3,
                                    answers.get(&user),
                                    own_score,
                                )
                            } else {
                                broadcast::discussion_frame_for_leader(question, &aggregates, &top3)
                            };
                            (user, role, sender, frame)
                        })
                        .collect()
                };
                self.dispatch(targets).await;
            }
            Phase::End => {}
        }
    }

    /// Flushes time, marks the interactive conducted (on natural completion),
    /// sends every connection its final END frame, then closes every
    /// transport. Per spec.md §4.1 ("Close all connections. Remove self from
    /// C6") and §8 S6, the server -- not just the client -- must end these
    /// connections; dropping the registry's senders here unblocks each
    /// gateway `sender_task`'s `outbound_rx.recv()` with `None`, which ends
    /// that task and drops its side of the socket.
    async fn finish(&self, reason: EndReason) {
        self.flush_all_participant_time().await;
        if reason == EndReason::Completed {
            let now = chrono::Utc::now().to_rfc3339();
            let _ = self.storage.mark_conducted(self.interactive.id, &now).await;
        }
        let leaderboard = self
            .storage
            .leaderboard(self.interactive.id)
            .await
            .unwrap_or_default();
        let top3 = winners::top_n(&leaderboard, 3);
        let standings = winners::own_standings(&leaderboard);
        let targets = self
            .registry
            .snapshot()
            .into_iter()
            .map(|(user, role, sender)| {
                let own = if role == Role::Participant {
                    standings.get(&user).copied()
                } else {
                    None
                };
                let frame = broadcast::end_frame(&top3, own);
                (user, role, sender, frame)
            })
            .collect();
        self.dispatch(targets).await;
        self.registry.detach_all();
    }

    /// Builds a one-off frame for a just-attached connection. Not subject to
    /// the "fetch once per broadcast" invariant: this is a single connection
    /// reacting to its own attach, not a tick fan-out.
    async fn frame_for(&self, user: UserId, role: Role) -> OutboundFrame {
        let snapshot = *self.state.lock().await;
        match snapshot.phase {
            Phase::Waiting => broadcast::waiting_frame(
                &self.interactive,
                snapshot.idle_state,
                snapshot.idle_seconds_left,
                self.registry.participant_count(),
            ),
            Phase::Countdown => broadcast::countdown_frame(snapshot.remaining, snapshot.duration),
            Phase::Question => match self.questions.get(snapshot.question_index) {
                Some(q) => broadcast::question_frame(
                    q,
                    snapshot.remaining,
                    snapshot.duration,
                    snapshot.idle_state,
                    snapshot.idle_seconds_left,
                    snapshot.tick_step,
                ),
                None => broadcast::countdown_frame(0, 0),
            },
            Phase::Discussion => match self.questions.get(snapshot.question_index) {
                Some(q) => {
                    let aggregates = self.discussion_aggregates(q).await;
                    let leaderboard = self
                        .storage
                        .leaderboard(self.interactive.id)
                        .await
                        .unwrap_or_default();
                    let top3 = winners::top_n(&leaderboard, 3);
                    if role == Role::Participant {
                        let standings = winners::own_standings(&leaderboard);
                        let own_score = standings.get(&user).map(|s| s.score).unwrap_or(0);
                        let answers = self.current_answers.lock().await;
                        broadcast::discussion_frame_for_participant(
                            q,
                            &aggregates,
                            &top3,
                            answers.get(&user),
                            own_score,
                        )
                    } else {
                        broadcast::discussion_frame_for_leader(q, &aggregates, &top3)
                    }
                }
                None => broadcast::end_frame(&[], None),
            },
            Phase::End => {
                let leaderboard = self
                    .storage
                    .leaderboard(self.interactive.id)
                    .await
                    .unwrap_or_default();
                let top3 = winners::top_n(&leaderboard, 3);
                let own = if role == Role::Participant {
                    winners::own_standings(&leaderboard).get(&user).copied()
                } else {
                    None
                };
                broadcast::end_frame(&top3, own)
            }
        }
    }

    async fn send_to_all(&self, frame: OutboundFrame) {
        let targets = self
            .registry
            .snapshot()
            .into_iter()
            .map(|(user, role, sender)| (user, role, sender, frame.clone()))
            .collect();
        self.dispatch(targets).await;
    }

    /// Sends each `(user, role, sender, frame)` concurrently, each send
    /// bounded by [`SEND_DEADLINE`], per spec.md §4.7 ("send concurrently
    /// with bounded deadline") and §5's backpressure rule. A slow connection
    /// no longer head-of-line-blocks the rest of the fan-out: every send
    /// runs on its own task, and only after all of them finish does this
    /// detach the ones that failed or timed out -- `detach` takes `&self`
    /// and must not run inside a `'static` spawned task.
    async fn dispatch(
        &self,
        targets: Vec<(UserId, Role, mpsc::Sender<OutboundFrame>, OutboundFrame)>,
    ) {
        let mut handles = Vec::with_capacity(targets.len());
        for (user, role, sender, frame) in targets {
            handles.push(tokio::spawn(async move {
                let ok = Self::send_with_deadline(&sender, frame).await;
                (user, role, ok)
            }));
        }
        for handle in handles {
            if let Ok((user, role, ok)) = handle.await {
                if !ok {
                    self.detach(user, role).await;
                }
            }
        }
    }

    /// Sends one frame to `sender`, treating a full queue that doesn't drain
    /// within [`SEND_DEADLINE`] -- or an already-closed channel -- as a
    /// disconnect rather than blocking forever.
    async fn send_with_deadline(sender: &mpsc::Sender<OutboundFrame>, frame: OutboundFrame) -> bool {
        match sender.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Closed(_)) => false,
            Err(TrySendError::Full(frame)) => {
                matches!(tokio::time::timeout(SEND_DEADLINE, sender.send(frame)).await, Ok(Ok(())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livequiz_core::wire::LeaderCommand;

    fn cfg() -> IdleConfig {
        IdleConfig {
            waiting_idle_seconds: 3,
            waiting_warning_seconds: 2,
            paused_idle_seconds: 3,
            paused_warning_seconds: 2,
        }
    }

    fn durations() -> PhaseDurations {
        PhaseDurations { answer: 2, discussion: 2 }
    }

    #[test]
    fn going_transitions_waiting_to_countdown() {
        let mut state = SessionState::new(&cfg());
        let outcome = apply_leader_command(&mut state, LeaderCommand::Going, &cfg(), 5);
        assert_eq!(outcome, LeaderCommandOutcome::Applied);
        assert_eq!(state.phase, Phase::Countdown);
        assert_eq!(state.remaining, 5);
        assert_eq!(state.idle_state, IdleState::Active);
    }

    #[test]
    fn pause_then_unpause_restores_active_idle_state() {
        let mut state = SessionState::new(&cfg());
        apply_leader_command(&mut state, LeaderCommand::Going, &cfg(), 5);
        apply_leader_command(&mut state, LeaderCommand::Pause, &cfg(), 5);
        assert_eq!(state.tick_step, 0);
        assert_eq!(state.idle_state, IdleState::Idle);
        apply_leader_command(&mut state, LeaderCommand::Pause, &cfg(), 5);
        assert_eq!(state.tick_step, 1);
        assert_eq!(state.idle_state, IdleState::Active);
    }

    #[test]
    fn going_command_ignored_outside_waiting() {
        let mut state = SessionState::new(&cfg());
        state.phase = Phase::Question;
        let outcome = apply_leader_command(&mut state, LeaderCommand::Going, &cfg(), 5);
        assert_eq!(outcome, LeaderCommandOutcome::Ignored);
        assert_eq!(state.phase, Phase::Question);
    }

    #[test]
    fn explicit_end_before_any_discussion_is_cancelled_not_completed() {
        let mut state = SessionState::new(&cfg());
        state.phase = Phase::Question;
        apply_leader_command(&mut state, LeaderCommand::End, &cfg(), 5);
        assert_eq!(state.phase, Phase::End);
        let result = apply_tick(&mut state, &cfg(), 2, &durations());
        assert_eq!(result.destroyed, Some(EndReason::Cancelled));
    }

    #[test]
    fn explicit_end_after_discussion_is_completed() {
        let mut state = SessionState::new(&cfg());
        state.phase = Phase::Discussion;
        state.passed_discussion = true;
        apply_leader_command(&mut state, LeaderCommand::End, &cfg(), 5);
        let result = apply_tick(&mut state, &cfg(), 2, &durations());
        assert_eq!(result.destroyed, Some(EndReason::Completed));
    }

    #[test]
    fn explicit_end_from_waiting_is_cancelled() {
        let mut state = SessionState::new(&cfg());
        apply_leader_command(&mut state, LeaderCommand::End, &cfg(), 5);
        let result = apply_tick(&mut state, &cfg(), 2, &durations());
        assert_eq!(result.destroyed, Some(EndReason::Cancelled));
    }

    #[test]
    fn a_phase_already_at_end_reports_destroyed_only_once() {
        let mut state = SessionState::new(&cfg());
        apply_leader_command(&mut state, LeaderCommand::End, &cfg(), 5);
        let first = apply_tick(&mut state, &cfg(), 2, &durations());
        assert!(first.destroyed.is_some());
        let second = apply_tick(&mut state, &cfg(), 2, &durations());
        assert!(second.destroyed.is_none());
    }

    #[test]
    fn countdown_expires_into_first_question() {
        let mut state = SessionState::new(&cfg());
        apply_leader_command(&mut state, LeaderCommand::Going, &cfg(), 1);
        let result = apply_tick(&mut state, &cfg(), 2, &durations());
        assert!(result.phase_changed);
        assert_eq!(state.phase, Phase::Question);
        assert_eq!(state.question_index, 0);
    }

    #[test]
    fn question_expires_into_discussion_and_marks_passed_discussion() {
        let mut state = SessionState::new(&cfg());
        apply_leader_command(&mut state, LeaderCommand::Going, &cfg(), 0);
        apply_tick(&mut state, &cfg(), 2, &durations()); // -> Question
        apply_tick(&mut state, &cfg(), 2, &durations());
        apply_tick(&mut state, &cfg(), 2, &durations()); // remaining goes -1 -> Discussion
        assert_eq!(state.phase, Phase::Discussion);
        assert!(state.passed_discussion);
    }

    #[test]
    fn discussion_advances_to_next_question_when_more_remain() {
        let mut state = SessionState::new(&cfg());
        state.phase = Phase::Discussion;
        state.question_index = 0;
        state.remaining = 0;
        state.tick_step = 1;
        let result = apply_tick(&mut state, &cfg(), 2, &durations());
        assert!(result.phase_changed);
        assert_eq!(state.phase, Phase::Question);
        assert_eq!(state.question_index, 1);
    }

    #[test]
    fn discussion_ends_session_on_last_question() {
        let mut state = SessionState::new(&cfg());
        state.phase = Phase::Discussion;
        state.question_index = 1;
        state.remaining = 0;
        state.tick_step = 1;
        let result = apply_tick(&mut state, &cfg(), 2, &durations());
        assert_eq!(result.destroyed, Some(EndReason::Completed));
        assert_eq!(state.phase, Phase::End);
    }

    #[test]
    fn waiting_idle_timeout_destroys_as_cancelled() {
        let my_cfg = cfg();
        let mut state = SessionState::new(&my_cfg);
        // idle_seconds_left starts at 3: 3 ticks to exhaust IDLE, then a
        // warning window of 2 more ticks to exhaust WARNING.
        for _ in 0..3 {
            let r = apply_tick(&mut state, &my_cfg, 1, &durations());
            assert!(r.destroyed.is_none());
        }
        assert_eq!(state.idle_state, IdleState::Warning);
        let mut destroyed = None;
        for _ in 0..3 {
            let r = apply_tick(&mut state, &my_cfg, 1, &durations());
            if r.destroyed.is_some() {
                destroyed = r.destroyed;
                break;
            }
        }
        assert_eq!(destroyed, Some(EndReason::Cancelled));
    }

    #[test]
    fn more_pause_resets_waiting_idle_window() {
        let my_cfg = cfg();
        let mut state = SessionState::new(&my_cfg);
        apply_tick(&mut state, &my_cfg, 1, &durations());
        apply_tick(&mut state, &my_cfg, 1, &durations());
        apply_leader_command(&mut state, LeaderCommand::MorePause, &my_cfg, 0);
        assert_eq!(state.idle_state, IdleState::Idle);
        assert_eq!(state.idle_seconds_left, my_cfg.waiting_idle_seconds);
    }

    #[test]
    fn paused_idle_timeout_is_always_cancelled_even_after_discussion() {
        let my_cfg = cfg();
        let mut state = SessionState::new(&my_cfg);
        state.phase = Phase::Question;
        state.passed_discussion = true;
        state.tick_step = 0;
        state.idle_state = IdleState::Idle;
        state.idle_seconds_left = my_cfg.paused_idle_seconds;
        let mut destroyed = None;
        for _ in 0..8 {
            let r = apply_tick(&mut state, &my_cfg, 5, &durations());
            if r.destroyed.is_some() {
                destroyed = r.destroyed;
                break;
            }
        }
        assert_eq!(destroyed, Some(EndReason::Cancelled));
    }

    #[test]
    fn paused_question_does_not_advance_remaining() {
        let mut state = SessionState::new(&cfg());
        state.phase = Phase::Question;
        state.tick_step = 0;
        state.idle_state = IdleState::Idle;
        state.idle_seconds_left = 100;
        state.remaining = 5;
        apply_tick(&mut state, &cfg(), 2, &durations());
        assert_eq!(state.remaining, 5, "paused question timer must not decrement remaining");
    }
}
