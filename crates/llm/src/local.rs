use std::time::Duration;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use snafu::ensure;

use chatstage_engine::{MessageId, Script, ScriptedMessage};

use crate::error::{EmptyRosterSnafu, GenerateResult};
use crate::generate::{BoxFuture, ScriptGenerator, ScriptRequest};

pub const LOCAL_PROVIDER_ID: &str = "local";

/// Chance that a generated line replies to an earlier one.
const REPLY_CHANCE: f32 = 0.25;
/// Authored pacing band for randomized post-display delays.
const POST_DELAY_RANGE_SECONDS: (f32, f32) = (1.5, 6.0);

fn default_openers() -> Vec<String> {
    [
        "anyone here actually tried it on {topic}?",
        "ok real talk, how is everyone doing with {topic}",
        "just got in, what did I miss about {topic}?",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_lines() -> Vec<String> {
    [
        "been running it all week, zero problems",
        "the {topic} update made a huge difference for me",
        "my duo partner refuses to play without it now lol",
        "took me two minutes to set up, genuinely",
        "not gonna lie I was skeptical at first",
        "stats went way up since I started with {topic}",
        "support sorted my issue in one message",
        "same here, smooth as ever",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_reactions() -> Vec<String> {
    [
        "this ^",
        "can confirm",
        "exactly what happened to me",
        "wait really? trying tonight",
        "no way it's that easy",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Phrase material the local generator draws from; `{topic}` placeholders
/// are substituted with the request theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhrasePools {
    pub openers: Vec<String>,
    pub lines: Vec<String>,
    pub reactions: Vec<String>,
}

impl Default for PhrasePools {
    fn default() -> Self {
        Self {
            openers: default_openers(),
            lines: default_lines(),
            reactions: default_reactions(),
        }
    }
}

/// Offline, data-driven script generator: a random phrase picker that casts
/// the roster over the pools. No provider, no parsing, never fails on
/// content; it exists so the playback engine always has something to chew on.
#[derive(Debug, Clone, Default)]
pub struct LocalScriptGenerator {
    pools: PhrasePools,
}

impl LocalScriptGenerator {
    pub fn new(pools: PhrasePools) -> Self {
        Self { pools }
    }

    /// Deterministic variant used by tests and reproducible demo rooms.
    pub fn generate_seeded(&self, request: &ScriptRequest, seed: u64) -> GenerateResult<Script> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.generate_with(request, &mut rng)
    }

    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        request: &ScriptRequest,
        rng: &mut R,
    ) -> GenerateResult<Script> {
        ensure!(
            !request.personas.is_empty(),
            EmptyRosterSnafu {
                stage: "local-generate",
            }
        );

        let budget = request.line_budget();
        let mut messages: Vec<ScriptedMessage> = Vec::with_capacity(budget);
        let mut previous_speaker: Option<usize> = None;

        for index in 0..budget {
            let speaker_index = self.pick_speaker(request, previous_speaker, rng);
            previous_speaker = Some(speaker_index);

            let template = if index == 0 {
                pick(&self.pools.openers, rng)
            } else if rng.random::<f32>() < 0.3 {
                pick(&self.pools.reactions, rng)
            } else {
                pick(&self.pools.lines, rng)
            };
            let text = template.replace("{topic}", &request.theme);

            let delay_seconds =
                rng.random_range(POST_DELAY_RANGE_SECONDS.0..=POST_DELAY_RANGE_SECONDS.1);
            let mut message = ScriptedMessage::new(
                MessageId::new(index as u64 + 1),
                request.personas[speaker_index].id.clone(),
                text,
                Duration::from_secs_f32(delay_seconds),
            );

            // Occasionally thread a reply back to an earlier line.
            if index > 1 && rng.random::<f32>() < REPLY_CHANCE {
                let target = rng.random_range(0..index) as u64 + 1;
                message = message.with_reply_to(MessageId::new(target));
            }

            messages.push(message);
        }

        Ok(Script::new(
            request.theme.clone(),
            request.personas.clone(),
            messages,
        ))
    }

    fn pick_speaker<R: Rng + ?Sized>(
        &self,
        request: &ScriptRequest,
        previous: Option<usize>,
        rng: &mut R,
    ) -> usize {
        let count = request.personas.len();
        if count == 1 {
            return 0;
        }

        // Avoid the same persona talking twice in a row.
        loop {
            let candidate = rng.random_range(0..count);
            if previous != Some(candidate) {
                return candidate;
            }
        }
    }
}

fn pick<'a, R: Rng + ?Sized>(pool: &'a [String], rng: &mut R) -> &'a str {
    if pool.is_empty() {
        return "…";
    }
    &pool[rng.random_range(0..pool.len())]
}

impl ScriptGenerator for LocalScriptGenerator {
    fn id(&self) -> &str {
        LOCAL_PROVIDER_ID
    }

    fn generate<'a>(&'a self, request: ScriptRequest) -> BoxFuture<'a, GenerateResult<Script>> {
        Box::pin(async move {
            let seed = rand::rng().random();
            self.generate_seeded(&request, seed)
        })
    }
}
