use serde::{Deserialize, Serialize};

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Playing,
    Paused,
    /// Terminal: the cursor reached the end of the script. Only `reset`
    /// leaves this state.
    Finished,
}

impl PlaybackPhase {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Which wait the in-flight scripted step is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStage {
    /// Waiting out the simulated typing delay before reveal.
    Typing,
    /// Holding the authored post-display delay before advancing.
    PostDelay,
}

/// Stale-timer guard. Every armed timer captures the epoch current at arm
/// time; pause/reset/seek bump it, so a timer that fires late is discarded
/// without racing the new schedule.
pub type Epoch = u64;

/// Side effects the session driver must perform after a transition.
///
/// The machine itself owns no timers, no clock, and no message list; it only
/// decides. Indexes refer to the scripted message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Arm the single step timer for the typing estimate of `index`.
    ArmTypingTimer { epoch: Epoch, index: usize },
    /// Arm the single step timer for the authored post-delay of `index`.
    ArmPostDelayTimer { epoch: Epoch, index: usize },
    /// Tear down whatever step timer is armed.
    DisarmTimer,
    /// Start the ambient injection ticker (fresh, no catch-up).
    StartAmbientTicker,
    /// Stop the ambient injection ticker.
    StopAmbientTicker,
    /// Show the typing indicator for the speaker of `index`.
    MarkTyping { index: usize },
    /// Hide the typing indicator for the speaker of `index`.
    ClearTyping { index: usize },
    /// Reveal scripted message `index` (stamp, resolve reply, append).
    RevealScripted { index: usize },
    /// Drop all visible messages, typing indicators, and reply selection.
    ClearVisible,
    PhaseChanged { phase: PlaybackPhase },
}

/// Pure scheduler state machine for one scripted conversation.
///
/// Drives the per-step sequence: mark typing, wait, reveal, wait the post
/// delay, advance. All waits are represented as armed-timer effects so the
/// driver can cancel them by bumping the epoch.
#[derive(Debug, Clone)]
pub struct PlaybackMachine {
    script_len: usize,
    cursor: usize,
    phase: PlaybackPhase,
    step: Option<StepStage>,
    epoch: Epoch,
}

impl PlaybackMachine {
    pub fn new(script_len: usize) -> Self {
        Self {
            script_len,
            cursor: 0,
            phase: PlaybackPhase::Idle,
            step: None,
            epoch: 0,
        }
    }

    /// Next scripted index to reveal; equals the count of fully revealed
    /// scripted messages. Monotonic except across `reset`/`seek`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase.is_playing()
    }

    pub fn script_len(&self) -> usize {
        self.script_len
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Starts or resumes playback. No-op while already playing; an exhausted
    /// cursor deterministically lands in `Finished` instead.
    pub fn play(&mut self) -> Vec<Effect> {
        match self.phase {
            PlaybackPhase::Playing | PlaybackPhase::Finished => Vec::new(),
            PlaybackPhase::Idle | PlaybackPhase::Paused => {
                if self.cursor >= self.script_len {
                    return self.finish();
                }

                self.phase = PlaybackPhase::Playing;
                self.step = Some(StepStage::Typing);

                let mut effects = vec![
                    Effect::PhaseChanged {
                        phase: PlaybackPhase::Playing,
                    },
                    Effect::StartAmbientTicker,
                ];
                effects.extend(self.begin_typing());
                effects
            }
        }
    }

    /// Suspends playback, abandoning the in-flight wait. Resuming restarts
    /// the current message's typing phase from zero; partial progress within
    /// a step is intentionally not preserved. A message whose post-delay was
    /// underway has already revealed and counts as completed, so resume
    /// continues with the next one instead of replaying it.
    pub fn pause(&mut self) -> Vec<Effect> {
        if self.phase != PlaybackPhase::Playing {
            return Vec::new();
        }

        self.epoch += 1;
        let abandoned = self.step.take();
        if matches!(abandoned, Some(StepStage::PostDelay)) {
            self.cursor += 1;
        }
        self.phase = PlaybackPhase::Paused;

        let mut effects = vec![Effect::DisarmTimer, Effect::StopAmbientTicker];
        if matches!(abandoned, Some(StepStage::Typing)) {
            effects.push(Effect::ClearTyping { index: self.cursor });
        }
        effects.push(Effect::PhaseChanged {
            phase: PlaybackPhase::Paused,
        });
        effects
    }

    /// Returns to `Idle` with an empty room, from any state. Idempotent.
    pub fn reset(&mut self) -> Vec<Effect> {
        self.epoch += 1;
        let was_idle = self.phase == PlaybackPhase::Idle && self.cursor == 0;
        self.cursor = 0;
        self.step = None;
        self.phase = PlaybackPhase::Idle;

        let mut effects = vec![
            Effect::DisarmTimer,
            Effect::StopAmbientTicker,
            Effect::ClearVisible,
        ];
        if !was_idle {
            effects.push(Effect::PhaseChanged {
                phase: PlaybackPhase::Idle,
            });
        }
        effects
    }

    /// Moves the cursor without revealing or un-revealing anything. The
    /// in-flight wait is abandoned; a playing session continues from the new
    /// position, and seeking to the end lands in `Finished`.
    pub fn seek(&mut self, index: usize) -> Vec<Effect> {
        let target = index.min(self.script_len);
        let was_playing = self.phase == PlaybackPhase::Playing;

        self.epoch += 1;
        let abandoned_typing = matches!(self.step, Some(StepStage::Typing));
        self.step = None;

        let mut effects = vec![Effect::DisarmTimer];
        if abandoned_typing {
            effects.push(Effect::ClearTyping { index: self.cursor });
        }

        self.cursor = target;

        if target >= self.script_len {
            if was_playing {
                effects.push(Effect::StopAmbientTicker);
            }
            if self.phase != PlaybackPhase::Finished {
                self.phase = PlaybackPhase::Finished;
                effects.push(Effect::PhaseChanged {
                    phase: PlaybackPhase::Finished,
                });
            }
            return effects;
        }

        if was_playing {
            self.step = Some(StepStage::Typing);
            effects.extend(self.begin_typing());
        } else if target == 0 {
            self.phase = PlaybackPhase::Idle;
        } else {
            // A non-zero cursor means part of the script already ran.
            self.phase = PlaybackPhase::Paused;
        }

        effects
    }

    /// Advances the in-flight step when its armed timer fires. A timer from
    /// a superseded epoch is stale and produces no transition.
    pub fn timer_fired(&mut self, epoch: Epoch) -> Vec<Effect> {
        if epoch != self.epoch {
            return Vec::new();
        }
        if self.phase != PlaybackPhase::Playing {
            return Vec::new();
        }

        match self.step {
            Some(StepStage::Typing) => {
                self.step = Some(StepStage::PostDelay);
                vec![
                    Effect::ClearTyping { index: self.cursor },
                    Effect::RevealScripted { index: self.cursor },
                    Effect::ArmPostDelayTimer {
                        epoch: self.epoch,
                        index: self.cursor,
                    },
                ]
            }
            Some(StepStage::PostDelay) => {
                self.cursor += 1;
                if self.cursor < self.script_len {
                    self.step = Some(StepStage::Typing);
                    self.begin_typing()
                } else {
                    self.step = None;
                    self.finish()
                }
            }
            None => Vec::new(),
        }
    }

    fn begin_typing(&self) -> Vec<Effect> {
        vec![
            Effect::MarkTyping { index: self.cursor },
            Effect::ArmTypingTimer {
                epoch: self.epoch,
                index: self.cursor,
            },
        ]
    }

    fn finish(&mut self) -> Vec<Effect> {
        if self.phase == PlaybackPhase::Finished {
            return Vec::new();
        }

        let was_playing = self.phase == PlaybackPhase::Playing;
        self.phase = PlaybackPhase::Finished;
        self.step = None;

        let mut effects = Vec::new();
        if was_playing {
            effects.push(Effect::StopAmbientTicker);
        }
        effects.push(Effect::PhaseChanged {
            phase: PlaybackPhase::Finished,
        });
        effects
    }
}
