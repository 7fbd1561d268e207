use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, sleep_until};

use crate::ambient::{AmbientEvent, AmbientSampler};
use crate::config::EngineConfig;
use crate::error::{EngineResult, SessionClosedSnafu};
use crate::events::{SessionEvent, SessionHooks};
use crate::ids::{MessageId, SpeakerId};
use crate::message::{LiveMessage, Origin, ReplyPreview};
use crate::playback::{Effect, Epoch, PlaybackMachine, PlaybackPhase};
use crate::script::Script;
use crate::surface::{RestrictedFeature, accept_send_text};
use crate::typing::TypingEstimator;

/// Control input accepted by the session worker.
#[derive(Debug, Clone)]
enum Command {
    Play,
    Pause,
    Reset,
    Seek(usize),
    Send {
        text: String,
        reply_to: Option<MessageId>,
    },
    SetReply {
        target: Option<MessageId>,
    },
    RequestFeature {
        feature: RestrictedFeature,
    },
    Shutdown,
}

/// Self-contained read-model published after every mutation; the render
/// layer loads it lock-free while the worker stays the single writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: PlaybackPhase,
    pub cursor: usize,
    pub script_len: usize,
    pub visible: Vec<LiveMessage>,
    pub typing_speakers: Vec<SpeakerId>,
    pub reply_target: Option<MessageId>,
}

impl SessionSnapshot {
    fn empty(script_len: usize) -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            cursor: 0,
            script_len,
            visible: Vec::new(),
            typing_speakers: Vec::new(),
            reply_target: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase.is_playing()
    }
}

/// Clonable control surface for one running session.
///
/// Commands are fire-and-forget; resulting state lands in the snapshot and
/// the event stream. `send` in particular always succeeds regardless of
/// playback state, and the produced message arrives as `MessageSent`.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: Arc<ArcSwap<SessionSnapshot>>,
}

impl SessionHandle {
    fn command(&self, command: Command) -> EngineResult<()> {
        self.commands
            .send(command)
            .map_err(|_| SessionClosedSnafu { stage: "send-session-command" }.build())
    }

    pub fn play(&self) -> EngineResult<()> {
        self.command(Command::Play)
    }

    pub fn pause(&self) -> EngineResult<()> {
        self.command(Command::Pause)
    }

    pub fn reset(&self) -> EngineResult<()> {
        self.command(Command::Reset)
    }

    pub fn seek(&self, index: usize) -> EngineResult<()> {
        self.command(Command::Seek(index))
    }

    /// Sends an operator message, using the sticky reply target if one is
    /// set. Empty/whitespace-only text is a silent no-op.
    pub fn send(&self, text: impl Into<String>) -> EngineResult<()> {
        self.command(Command::Send {
            text: text.into(),
            reply_to: None,
        })
    }

    /// Sends an operator message replying to an explicitly chosen visible
    /// message, overriding the sticky reply target.
    pub fn send_reply(&self, text: impl Into<String>, reply_to: MessageId) -> EngineResult<()> {
        self.command(Command::Send {
            text: text.into(),
            reply_to: Some(reply_to),
        })
    }

    /// Marks a visible message as the sticky reply target; `None` clears it.
    pub fn set_reply(&self, target: Option<MessageId>) -> EngineResult<()> {
        self.command(Command::SetReply { target })
    }

    /// Invokes a gated premium action. The underlying action never runs;
    /// exactly one `FeatureRestricted` signal is emitted instead.
    pub fn request_feature(&self, feature: RestrictedFeature) -> EngineResult<()> {
        self.command(Command::RequestFeature { feature })
    }

    /// Stops the worker. Idempotent; a worker that already exited is fine.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    /// Latest published read-model.
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshot.load_full()
    }
}

/// Receiving half of the session's ordered event feed.
pub struct SessionEventStream {
    events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionEventStream {
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.events.try_recv().ok()
    }
}

pub type SessionWorker = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Everything a host needs to run one playback session: spawn `worker`,
/// drive `handle`, consume `events`.
pub struct SessionLaunch {
    pub handle: SessionHandle,
    pub events: SessionEventStream,
    pub worker: SessionWorker,
}

/// Launches a session with an OS-seeded RNG.
pub fn start_session(
    script: Script,
    config: EngineConfig,
    hooks: SessionHooks,
) -> EngineResult<SessionLaunch> {
    let seed = rand::rng().random();
    start_session_seeded(script, config, hooks, seed)
}

/// Launches a session with a fixed RNG seed, for deterministic replay and
/// tests.
pub fn start_session_seeded(
    script: Script,
    config: EngineConfig,
    hooks: SessionHooks,
    seed: u64,
) -> EngineResult<SessionLaunch> {
    let config = config.validated()?;
    let script = Arc::new(script);

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let snapshot = Arc::new(ArcSwap::from_pointee(SessionSnapshot::empty(script.len())));

    let actor = SessionActor {
        machine: PlaybackMachine::new(script.len()),
        next_injected_id: script.max_message_id(),
        estimator: TypingEstimator::new(config.typing.clone()),
        sampler: AmbientSampler::new(config.ambient.clone()),
        rng: StdRng::seed_from_u64(seed),
        script,
        hooks,
        visible: Vec::new(),
        typing: Vec::new(),
        reply_target: None,
        armed_timer: None,
        ambient_next: None,
        event_tx,
        snapshot: snapshot.clone(),
    };

    let worker: SessionWorker = Box::pin(run_session(actor, command_rx));

    Ok(SessionLaunch {
        handle: SessionHandle {
            commands: command_tx,
            snapshot,
        },
        events: SessionEventStream { events: event_rx },
        worker,
    })
}

/// The single step timer; `epoch` guards against a superseded schedule.
#[derive(Debug, Clone, Copy)]
struct ArmedStepTimer {
    epoch: Epoch,
    deadline: Instant,
}

struct SessionActor {
    script: Arc<Script>,
    machine: PlaybackMachine,
    estimator: TypingEstimator,
    sampler: AmbientSampler,
    hooks: SessionHooks,
    rng: StdRng,
    visible: Vec<LiveMessage>,
    typing: Vec<SpeakerId>,
    reply_target: Option<MessageId>,
    next_injected_id: u64,
    armed_timer: Option<ArmedStepTimer>,
    ambient_next: Option<Instant>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    snapshot: Arc<ArcSwap<SessionSnapshot>>,
}

/// One cooperative event loop per session: commands, the single step timer,
/// and the ambient ticker all resolve here, so state has exactly one writer
/// and no transition races another.
async fn run_session(mut actor: SessionActor, mut command_rx: mpsc::UnboundedReceiver<Command>) {
    actor.publish_snapshot();

    loop {
        let step_deadline = actor.armed_timer.as_ref().map(|timer| timer.deadline);
        let ambient_deadline = actor.ambient_next;

        tokio::select! {
            maybe_command = command_rx.recv() => {
                match maybe_command {
                    None | Some(Command::Shutdown) => break,
                    Some(command) => actor.handle_command(command),
                }
            }
            _ = sleep_until_or_never(step_deadline), if step_deadline.is_some() => {
                actor.step_timer_elapsed();
            }
            _ = sleep_until_or_never(ambient_deadline), if ambient_deadline.is_some() => {
                actor.ambient_tick_elapsed();
            }
        }

        actor.publish_snapshot();
    }

    tracing::debug!("session worker stopped");
}

async fn sleep_until_or_never(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}

impl SessionActor {
    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play => {
                let effects = self.machine.play();
                self.perform(effects);
            }
            Command::Pause => {
                let effects = self.machine.pause();
                self.perform(effects);
            }
            Command::Reset => {
                let effects = self.machine.reset();
                self.perform(effects);
            }
            Command::Seek(index) => {
                let effects = self.machine.seek(index);
                self.perform(effects);
            }
            Command::Send { text, reply_to } => self.handle_send(text, reply_to),
            Command::SetReply { target } => self.handle_set_reply(target),
            Command::RequestFeature { feature } => {
                tracing::info!(feature = %feature, "restricted feature intercepted");
                self.emit(SessionEvent::FeatureRestricted { feature });
            }
            Command::Shutdown => {}
        }
    }

    fn step_timer_elapsed(&mut self) {
        let Some(timer) = self.armed_timer.take() else {
            return;
        };
        if timer.epoch != self.machine.epoch() {
            tracing::debug!(
                armed_epoch = timer.epoch,
                current_epoch = self.machine.epoch(),
                "discarding stale step timer"
            );
            return;
        }
        let effects = self.machine.timer_fired(timer.epoch);
        self.perform(effects);
    }

    fn ambient_tick_elapsed(&mut self) {
        if !self.machine.is_playing() {
            self.ambient_next = None;
            return;
        }
        self.ambient_next = Some(Instant::now() + self.ambient_interval());

        let Some(event) = self.sampler.sample(&mut self.rng) else {
            return;
        };

        let (text, origin) = match event {
            AmbientEvent::SystemNotice { text } => (text, Origin::AmbientSystem),
            AmbientEvent::GoldReview { text, .. } => (text, Origin::AmbientPromo),
        };

        // Ambient injections bypass typing and the cursor entirely.
        let message = LiveMessage::new(
            self.mint_message_id(),
            SpeakerId::system(),
            text,
            origin,
            current_unix_timestamp_millis(),
        );
        self.visible.push(message.clone());
        self.emit(SessionEvent::MessageRevealed { message });
    }

    fn perform(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ArmTypingTimer { epoch, index } => {
                    let delay = match self.script.messages.get(index) {
                        Some(message) => self.estimator.estimate(&message.text, &mut self.rng),
                        None => Duration::ZERO,
                    };
                    self.arm_step_timer(epoch, delay);
                }
                Effect::ArmPostDelayTimer { epoch, index } => {
                    let delay = self
                        .script
                        .messages
                        .get(index)
                        .map(|message| message.post_delay)
                        .unwrap_or_default();
                    self.arm_step_timer(epoch, delay);
                }
                Effect::DisarmTimer => self.armed_timer = None,
                Effect::StartAmbientTicker => {
                    self.ambient_next = Some(Instant::now() + self.ambient_interval());
                }
                Effect::StopAmbientTicker => self.ambient_next = None,
                Effect::MarkTyping { index } => self.mark_typing(index),
                Effect::ClearTyping { index } => self.clear_typing(index),
                Effect::RevealScripted { index } => self.reveal_scripted(index),
                Effect::ClearVisible => self.clear_visible(),
                Effect::PhaseChanged { phase } => {
                    self.emit(SessionEvent::PhaseChanged { phase });
                }
            }
        }
    }

    fn arm_step_timer(&mut self, epoch: Epoch, delay: Duration) {
        self.armed_timer = Some(ArmedStepTimer {
            epoch,
            deadline: Instant::now() + delay,
        });
    }

    fn ambient_interval(&self) -> Duration {
        Duration::from_millis(self.sampler.tick_interval_ms())
    }

    fn mark_typing(&mut self, index: usize) {
        let Some(message) = self.script.messages.get(index) else {
            return;
        };
        let speaker_id = message.speaker_id.clone();
        if !self.typing.contains(&speaker_id) {
            self.typing.push(speaker_id.clone());
            self.emit(SessionEvent::TypingStarted { speaker_id });
        }
    }

    fn clear_typing(&mut self, index: usize) {
        let Some(message) = self.script.messages.get(index) else {
            return;
        };
        let speaker_id = message.speaker_id.clone();
        if let Some(position) = self.typing.iter().position(|typing| typing == &speaker_id) {
            self.typing.remove(position);
            self.emit(SessionEvent::TypingStopped { speaker_id });
        }
    }

    fn reveal_scripted(&mut self, index: usize) {
        let script = self.script.clone();
        let Some(scripted) = script.messages.get(index) else {
            return;
        };

        if !scripted.speaker_id.is_reserved() && script.persona(&scripted.speaker_id).is_none() {
            // Unknown speakers degrade to a fallback persona downstream;
            // playback itself never halts on a bad record.
            tracing::warn!(
                speaker_id = %scripted.speaker_id,
                message_id = %scripted.id,
                "scripted message references an unknown persona"
            );
        }

        let reply = scripted
            .reply_to
            .and_then(|target| self.find_visible(target))
            .map(ReplyPreview::of);

        let mut message = LiveMessage::new(
            scripted.id,
            scripted.speaker_id.clone(),
            scripted.text.clone(),
            Origin::Scripted,
            current_unix_timestamp_millis(),
        );
        if let Some(reply) = reply {
            message = message.with_reply(reply);
        }

        self.visible.push(message.clone());
        self.emit(SessionEvent::MessageRevealed { message });
    }

    fn handle_send(&mut self, text: String, explicit_reply: Option<MessageId>) {
        if accept_send_text(&text).is_none() {
            tracing::debug!("ignoring empty operator send");
            return;
        }

        let reply_source = explicit_reply.or(self.reply_target);
        let reply = reply_source
            .and_then(|target| self.find_visible(target))
            .map(ReplyPreview::of);

        let mut message = LiveMessage::new(
            self.mint_message_id(),
            SpeakerId::user(),
            text,
            Origin::User,
            current_unix_timestamp_millis(),
        );
        if let Some(reply) = reply {
            message = message.with_reply(reply);
        }

        // A send consumes the sticky reply selection.
        if self.reply_target.take().is_some() {
            self.emit(SessionEvent::ReplyTargetChanged { target: None });
        }

        self.visible.push(message.clone());
        if let Some(hook) = &self.hooks.on_message_sent {
            hook(&message);
        }
        self.emit(SessionEvent::MessageRevealed {
            message: message.clone(),
        });
        self.emit(SessionEvent::MessageSent { message });
    }

    fn handle_set_reply(&mut self, target: Option<MessageId>) {
        match target {
            None => {
                if self.reply_target.take().is_some() {
                    self.emit(SessionEvent::ReplyTargetChanged { target: None });
                }
            }
            Some(id) => {
                if self.find_visible(id).is_none() {
                    tracing::debug!(message_id = %id, "reply target is not visible, ignoring");
                    return;
                }
                if self.reply_target != Some(id) {
                    self.reply_target = Some(id);
                    self.emit(SessionEvent::ReplyTargetChanged { target: Some(id) });
                }
            }
        }
    }

    fn clear_visible(&mut self) {
        self.visible.clear();
        self.typing.clear();
        self.reply_target = None;
        self.emit(SessionEvent::SessionReset);
    }

    fn find_visible(&self, id: MessageId) -> Option<&LiveMessage> {
        self.visible.iter().find(|message| message.id == id)
    }

    fn mint_message_id(&mut self) -> MessageId {
        self.next_injected_id += 1;
        MessageId::new(self.next_injected_id)
    }

    fn emit(&self, event: SessionEvent) {
        // Receiver loss is not an error; the snapshot remains authoritative.
        let _ = self.event_tx.send(event);
    }

    fn publish_snapshot(&self) {
        self.snapshot.store(Arc::new(SessionSnapshot {
            phase: self.machine.phase(),
            cursor: self.machine.cursor(),
            script_len: self.machine.script_len(),
            visible: self.visible.clone(),
            typing_speakers: self.typing.clone(),
            reply_target: self.reply_target,
        }));
    }
}

fn current_unix_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::ambient::AmbientConfig;
    use crate::script::{Persona, ScriptedMessage};

    use super::*;

    fn three_line_script() -> Script {
        Script::new(
            "demo",
            vec![
                Persona::new("ghost", "GhostRider"),
                Persona::new("lena", "Lena K."),
            ],
            vec![
                ScriptedMessage::new(
                    MessageId::new(1),
                    "ghost",
                    "anyone tried the new build?",
                    Duration::from_secs(2),
                ),
                ScriptedMessage::new(
                    MessageId::new(2),
                    "lena",
                    "yes, running it right now",
                    Duration::from_secs(3),
                ),
                ScriptedMessage::new(
                    MessageId::new(3),
                    "ghost",
                    "nice",
                    Duration::from_secs(1),
                ),
            ],
        )
    }

    fn quiet_ambient() -> AmbientConfig {
        // Thresholds that never fire, so scripted assertions stay exact.
        AmbientConfig {
            promo_threshold: 1.0,
            notice_threshold: 0.0,
            ..AmbientConfig::default()
        }
    }

    fn quiet_config() -> EngineConfig {
        EngineConfig {
            ambient: quiet_ambient(),
            ..EngineConfig::default()
        }
    }

    async fn recv_until(
        events: &mut SessionEventStream,
        mut predicate: impl FnMut(&SessionEvent) -> bool,
    ) -> Vec<SessionEvent> {
        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            let done = predicate(&event);
            seen.push(event);
            if done {
                return seen;
            }
        }
        panic!("event stream closed before the expected event");
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_run_reveals_three_messages_in_order() {
        let launch =
            start_session_seeded(three_line_script(), quiet_config(), SessionHooks::default(), 1)
                .expect("launch session");
        let SessionLaunch {
            handle,
            mut events,
            worker,
        } = launch;
        tokio::spawn(worker);

        handle.play().expect("play");
        let seen = recv_until(&mut events, |event| {
            matches!(
                event,
                SessionEvent::PhaseChanged {
                    phase: PlaybackPhase::Finished
                }
            )
        })
        .await;

        let revealed: Vec<u64> = seen
            .iter()
            .filter_map(|event| match event {
                SessionEvent::MessageRevealed { message } => Some(message.id.0),
                _ => None,
            })
            .collect();
        assert_eq!(revealed, vec![1, 2, 3]);

        settle().await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.cursor, 3);
        assert_eq!(snapshot.visible.len(), 3);
        assert!(!snapshot.is_playing());
        assert!(snapshot.typing_speakers.is_empty());
        assert!(
            snapshot
                .visible
                .iter()
                .all(|message| message.origin == Origin::Scripted)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pause_during_typing_reveals_nothing_even_after_long_waits() {
        let launch =
            start_session_seeded(three_line_script(), quiet_config(), SessionHooks::default(), 2)
                .expect("launch session");
        let SessionLaunch {
            handle,
            mut events,
            worker,
        } = launch;
        tokio::spawn(worker);

        handle.play().expect("play");
        recv_until(&mut events, |event| {
            matches!(event, SessionEvent::TypingStarted { .. })
        })
        .await;

        handle.pause().expect("pause");
        recv_until(&mut events, |event| {
            matches!(
                event,
                SessionEvent::PhaseChanged {
                    phase: PlaybackPhase::Paused
                }
            )
        })
        .await;

        // The abandoned typing timer must never fire, no matter how long the
        // session stays paused.
        tokio::time::advance(Duration::from_secs(600)).await;
        settle().await;

        assert!(events.try_recv().is_none());
        let snapshot = handle.snapshot();
        assert!(snapshot.visible.is_empty());
        assert_eq!(snapshot.cursor, 0);
        assert!(snapshot.typing_speakers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn resume_after_pause_still_reveals_everything_in_order() {
        let launch =
            start_session_seeded(three_line_script(), quiet_config(), SessionHooks::default(), 3)
                .expect("launch session");
        let SessionLaunch {
            handle,
            mut events,
            worker,
        } = launch;
        tokio::spawn(worker);

        handle.play().expect("play");
        recv_until(&mut events, |event| {
            matches!(event, SessionEvent::TypingStarted { .. })
        })
        .await;
        handle.pause().expect("pause");
        recv_until(&mut events, |event| {
            matches!(
                event,
                SessionEvent::PhaseChanged {
                    phase: PlaybackPhase::Paused
                }
            )
        })
        .await;

        handle.play().expect("resume");
        let seen = recv_until(&mut events, |event| {
            matches!(
                event,
                SessionEvent::PhaseChanged {
                    phase: PlaybackPhase::Finished
                }
            )
        })
        .await;

        let revealed: Vec<u64> = seen
            .iter()
            .filter_map(|event| match event {
                SessionEvent::MessageRevealed { message } => Some(message.id.0),
                _ => None,
            })
            .collect();
        assert_eq!(revealed, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn send_while_idle_appends_one_user_message_without_moving_the_cursor() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink = sent.clone();
        let hooks = SessionHooks::default().with_on_message_sent(move |message: &LiveMessage| {
            sink.lock().expect("hook sink").push(message.id);
        });

        let launch = start_session_seeded(three_line_script(), quiet_config(), hooks, 4)
            .expect("launch session");
        let SessionLaunch {
            handle,
            mut events,
            worker,
        } = launch;
        tokio::spawn(worker);

        handle.send("hello in there").expect("send");
        let seen = recv_until(&mut events, |event| {
            matches!(event, SessionEvent::MessageSent { .. })
        })
        .await;

        let Some(SessionEvent::MessageSent { message }) = seen.last() else {
            panic!("expected a MessageSent event");
        };
        assert_eq!(message.origin, Origin::User);
        assert!(message.speaker_id.is_user());
        // Minted above the script's max id.
        assert_eq!(message.id, MessageId::new(4));

        settle().await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.cursor, 0);
        assert!(!snapshot.is_playing());
        assert_eq!(snapshot.visible.len(), 1);
        assert_eq!(sent.lock().expect("hook sink").as_slice(), &[MessageId::new(4)]);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_send_is_a_silent_no_op() {
        let launch =
            start_session_seeded(three_line_script(), quiet_config(), SessionHooks::default(), 5)
                .expect("launch session");
        let SessionLaunch {
            handle,
            mut events,
            worker,
        } = launch;
        tokio::spawn(worker);

        handle.send("   \n").expect("send");
        settle().await;

        assert!(events.try_recv().is_none());
        assert!(handle.snapshot().visible.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dangling_reply_reference_reveals_without_decoration() {
        let script = Script::new(
            "replies",
            vec![Persona::new("ghost", "GhostRider")],
            vec![
                // Forward reference: target not yet revealed at reveal time.
                ScriptedMessage::new(MessageId::new(1), "ghost", "look below", Duration::ZERO)
                    .with_reply_to(MessageId::new(2)),
                ScriptedMessage::new(MessageId::new(2), "ghost", "here", Duration::ZERO)
                    .with_reply_to(MessageId::new(1)),
            ],
        );

        let launch = start_session_seeded(script, quiet_config(), SessionHooks::default(), 6)
            .expect("launch session");
        let SessionLaunch {
            handle,
            mut events,
            worker,
        } = launch;
        tokio::spawn(worker);

        handle.play().expect("play");
        let seen = recv_until(&mut events, |event| {
            matches!(
                event,
                SessionEvent::PhaseChanged {
                    phase: PlaybackPhase::Finished
                }
            )
        })
        .await;

        let revealed: Vec<&LiveMessage> = seen
            .iter()
            .filter_map(|event| match event {
                SessionEvent::MessageRevealed { message } => Some(message),
                _ => None,
            })
            .collect();
        assert_eq!(revealed.len(), 2);
        // Forward reference silently dropped, backward reference resolved.
        assert!(revealed[0].reply_to.is_none());
        let reply = revealed[1].reply_to.as_ref().expect("resolved reply");
        assert_eq!(reply.message_id, MessageId::new(1));
        assert_eq!(reply.text, "look below");
    }

    #[tokio::test(start_paused = true)]
    async fn restricted_feature_yields_exactly_one_signal_and_no_side_effects() {
        let launch =
            start_session_seeded(three_line_script(), quiet_config(), SessionHooks::default(), 7)
                .expect("launch session");
        let SessionLaunch {
            handle,
            mut events,
            worker,
        } = launch;
        tokio::spawn(worker);

        handle
            .request_feature(RestrictedFeature::Attachments)
            .expect("request feature");
        let seen = recv_until(&mut events, |event| {
            matches!(event, SessionEvent::FeatureRestricted { .. })
        })
        .await;

        let restrictions: Vec<_> = seen
            .iter()
            .filter(|event| matches!(event, SessionEvent::FeatureRestricted { .. }))
            .collect();
        assert_eq!(restrictions.len(), 1);
        assert_eq!(
            restrictions[0],
            &SessionEvent::FeatureRestricted {
                feature: RestrictedFeature::Attachments
            }
        );

        settle().await;
        assert!(events.try_recv().is_none());
        assert!(handle.snapshot().visible.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn ambient_messages_never_move_the_cursor_and_stop_with_playback() {
        let script = Script::new(
            "slow",
            vec![Persona::new("ghost", "GhostRider")],
            vec![ScriptedMessage::new(
                MessageId::new(1),
                "ghost",
                "hold on",
                Duration::from_secs(60),
            )],
        );
        // Every tick injects a promo; short tick so several land during the
        // one-minute post delay.
        let config = EngineConfig {
            ambient: AmbientConfig {
                tick_interval_ms: 10_000,
                promo_threshold: 0.0,
                notice_threshold: 0.0,
                ..AmbientConfig::default()
            },
            ..EngineConfig::default()
        };

        let launch = start_session_seeded(script, config, SessionHooks::default(), 8)
            .expect("launch session");
        let SessionLaunch {
            handle,
            mut events,
            worker,
        } = launch;
        tokio::spawn(worker);

        handle.play().expect("play");
        let seen = recv_until(&mut events, |event| {
            matches!(
                event,
                SessionEvent::PhaseChanged {
                    phase: PlaybackPhase::Finished
                }
            )
        })
        .await;

        let ambient_count = seen
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    SessionEvent::MessageRevealed {
                        message: LiveMessage {
                            origin: Origin::AmbientPromo,
                            ..
                        }
                    }
                )
            })
            .count();
        assert!(ambient_count >= 4, "ambient_count={ambient_count}");

        settle().await;
        let snapshot = handle.snapshot();
        // Only the single scripted message counts toward the cursor.
        assert_eq!(snapshot.cursor, 1);
        assert_eq!(snapshot.phase, PlaybackPhase::Finished);

        // Finished playback arms no further ticks.
        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;
        assert!(events.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_everything_and_is_idempotent() {
        let launch =
            start_session_seeded(three_line_script(), quiet_config(), SessionHooks::default(), 9)
                .expect("launch session");
        let SessionLaunch {
            handle,
            mut events,
            worker,
        } = launch;
        tokio::spawn(worker);

        handle.play().expect("play");
        recv_until(&mut events, |event| {
            matches!(event, SessionEvent::MessageRevealed { .. })
        })
        .await;

        handle.reset().expect("reset");
        handle.reset().expect("reset again");
        recv_until(&mut events, |event| {
            matches!(event, SessionEvent::SessionReset)
        })
        .await;
        settle().await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.cursor, 0);
        assert_eq!(snapshot.phase, PlaybackPhase::Idle);
        assert!(snapshot.visible.is_empty());
        assert!(snapshot.typing_speakers.is_empty());
        assert!(snapshot.reply_target.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn sticky_reply_target_is_resolved_and_consumed_by_send() {
        let launch =
            start_session_seeded(three_line_script(), quiet_config(), SessionHooks::default(), 10)
                .expect("launch session");
        let SessionLaunch {
            handle,
            mut events,
            worker,
        } = launch;
        tokio::spawn(worker);

        handle.send("first").expect("send");
        recv_until(&mut events, |event| {
            matches!(event, SessionEvent::MessageSent { .. })
        })
        .await;
        settle().await;
        let first_id = handle.snapshot().visible[0].id;

        handle.set_reply(Some(first_id)).expect("set reply");
        handle.send("second, replying").expect("send reply");
        let seen = recv_until(&mut events, |event| {
            matches!(event, SessionEvent::MessageSent { .. })
        })
        .await;

        let Some(SessionEvent::MessageSent { message }) = seen.last() else {
            panic!("expected a MessageSent event");
        };
        let reply = message.reply_to.as_ref().expect("reply resolved");
        assert_eq!(reply.message_id, first_id);

        settle().await;
        // Consumed by the send.
        assert!(handle.snapshot().reply_target.is_none());
    }
}
