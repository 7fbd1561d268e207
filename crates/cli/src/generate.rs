use std::path::PathBuf;

use clap::Args;

use chatstage_engine::{Persona, Script};
use chatstage_llm::{ProviderConfig, ScriptRequest, create_generator};
use chatstage_store::{MemoryStore, NewRoom, RoomStore, ScriptStore, SnapshotStore};

#[derive(Args)]
pub(super) struct GenerateArgs {
    /// Conversation topic woven into the generated lines.
    #[arg(long)]
    topic: String,
    #[arg(long, default_value = "casual")]
    tone: String,
    /// Rough conversation length in minutes.
    #[arg(long, default_value_t = 5)]
    minutes: u32,
    /// Optional JSON file with a custom persona roster.
    #[arg(long)]
    personas: Option<PathBuf>,
    /// Where to write the generated script JSON.
    #[arg(long, default_value = "script.json")]
    out: PathBuf,
    /// Model id for the remote provider; local generation if unset and no
    /// OPENAI_API_KEY is present.
    #[arg(long)]
    model: Option<String>,
}

pub(super) async fn run(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let personas = match &args.personas {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str::<Vec<Persona>>(&raw)?
        }
        None => default_cast(),
    };

    let provider_config = std::env::var("OPENAI_API_KEY").ok().map(|api_key| {
        ProviderConfig::new(
            "openai",
            api_key,
            std::env::var("OPENAI_BASE_URL").unwrap_or_default(),
            args.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string()),
        )
    });

    let generator = create_generator(provider_config)?;
    tracing::info!(generator = generator.id(), topic = %args.topic, "generating script");

    let request = ScriptRequest::new(personas, args.topic.clone())
        .with_tone(args.tone.clone())
        .with_duration_minutes(args.minutes);
    let script = generator.generate(request).await?;

    std::fs::write(&args.out, serde_json::to_string_pretty(&script)?)?;
    println!(
        "wrote {} lines for {} personas to {}",
        script.len(),
        script.personas.len(),
        args.out.display()
    );

    record_in_snapshot(&args.topic, script);
    Ok(())
}

/// Best-effort bookkeeping: the generated script and a room bound to it land
/// in the local snapshot so `play` can find them later.
fn record_in_snapshot(topic: &str, script: Script) {
    let snapshot_store = SnapshotStore::default();
    let store = MemoryStore::from_snapshot(snapshot_store.load_or_default());

    let saved = match store.save_script(script) {
        Ok(saved) => saved,
        Err(error) => {
            tracing::warn!(error = %error, "could not record script in snapshot");
            return;
        }
    };
    match store.create_room(NewRoom::new(topic, topic)) {
        Ok(room) => {
            if let Err(error) = store.assign_script(room.id, Some(saved.id)) {
                tracing::warn!(error = %error, "could not bind script to room");
            }
        }
        Err(error) => tracing::warn!(error = %error, "could not create room"),
    }

    snapshot_store.save_best_effort(&store.to_snapshot());
    tracing::info!(script_id = %saved.id, "recorded script in snapshot");
}

fn default_cast() -> Vec<Persona> {
    vec![
        Persona::new("ghost", "GhostRider").with_archetype("hypeman"),
        Persona::new("lena", "Lena K.").with_archetype("veteran"),
        Persona::new("bo", "Bo").with_archetype("newbie"),
        Persona::new("maxim", "MaximOff").with_archetype("skeptic"),
    ]
}
