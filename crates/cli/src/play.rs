use std::path::PathBuf;

use clap::Args;

use chatstage_engine::{
    BubbleAlignment, EngineConfig, Script, SessionEvent, SessionHooks, SessionLaunch,
    start_session, start_session_seeded,
};
use chatstage_engine::{PlaybackPhase, project, project_typing};
use chatstage_store::{MemoryStore, ScriptStore, SnapshotStore};

#[derive(Args)]
pub(super) struct PlayArgs {
    /// Script JSON to play; the most recent snapshot script if omitted.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Fixed RNG seed for reproducible pacing.
    #[arg(long)]
    seed: Option<u64>,
    /// Operator message injected after the first reveal, to demo the live
    /// interaction surface.
    #[arg(long)]
    interject: Option<String>,
}

pub(super) async fn run(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let script = load_script(&args)?;
    let personas = script.personas.clone();
    let title = if script.title.is_empty() {
        "untitled room".to_string()
    } else {
        script.title.clone()
    };

    let launch = match args.seed {
        Some(seed) => {
            start_session_seeded(script, EngineConfig::default(), SessionHooks::default(), seed)?
        }
        None => start_session(script, EngineConfig::default(), SessionHooks::default())?,
    };
    let SessionLaunch {
        handle,
        mut events,
        worker,
    } = launch;
    let worker = tokio::spawn(worker);

    println!("── {title} ──");
    handle.play()?;

    let mut interjection = args.interject;
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::TypingStarted { .. } => {
                let snapshot = handle.snapshot();
                for row in project_typing(&snapshot, &personas) {
                    println!("    {} is typing…", row.display_name);
                }
            }
            SessionEvent::MessageRevealed { .. } => {
                let snapshot = handle.snapshot();
                if let Some(bubble) = project(&snapshot, &personas).last() {
                    let line = match bubble.alignment {
                        BubbleAlignment::Center => format!("· {} ·", bubble.text),
                        BubbleAlignment::Right => {
                            format!("{:>40}  [{}]", bubble.text, bubble.display_name)
                        }
                        BubbleAlignment::Left => {
                            format!("[{}] {}", bubble.display_name, bubble.text)
                        }
                    };
                    if let Some(reply) = &bubble.reply {
                        println!("    ↪ {}: {}", reply.display_name, reply.excerpt);
                    }
                    println!("{line}");
                }

                // One-shot demo of a live operator send.
                if let Some(text) = interjection.take() {
                    handle.send(text)?;
                }
            }
            SessionEvent::PhaseChanged {
                phase: PlaybackPhase::Finished,
            } => {
                println!("── room finished ──");
                break;
            }
            _ => {}
        }
    }

    handle.shutdown();
    worker.await?;
    Ok(())
}

fn load_script(args: &PlayArgs) -> Result<Script, Box<dyn std::error::Error>> {
    if let Some(path) = &args.script {
        let raw = std::fs::read_to_string(path)?;
        return Ok(serde_json::from_str(&raw)?);
    }

    let store = MemoryStore::from_snapshot(SnapshotStore::default().load_or_default());
    let documents = store.list_scripts()?;
    match documents.into_iter().next() {
        Some(document) => Ok(document.script),
        None => Err("no --script given and no stored scripts found; run `chatstage generate` first".into()),
    }
}
