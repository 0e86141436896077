// Imports
use crate::{cli, validators};
use anyhow::Context;
use pagemark_compose::penevent::{Element, ModifierKey};
use pagemark_compose::{PenEvent, Viewport};
use pagemark_engine::pens::PenStyle;
use pagemark_engine::{Engine, EngineConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A recorded pointer script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename = "replay_script")]
pub(crate) struct ReplayScript {
    #[serde(rename = "steps")]
    pub(crate) steps: Vec<ReplayStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "replay_step")]
pub(crate) struct ReplayStep {
    /// Milliseconds since the start of the recording.
    #[serde(default, rename = "at_ms")]
    pub(crate) at_ms: u64,
    #[serde(rename = "action")]
    pub(crate) action: ReplayAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum ReplayAction {
    #[serde(rename = "tool")]
    Tool {
        #[serde(rename = "style")]
        style: PenStyle,
    },
    #[serde(rename = "down")]
    Down {
        #[serde(rename = "pos")]
        pos: na::Vector2<f64>,
        #[serde(default, rename = "modifiers")]
        modifiers: HashSet<ModifierKey>,
    },
    #[serde(rename = "up")]
    Up {
        #[serde(rename = "pos")]
        pos: na::Vector2<f64>,
        #[serde(default, rename = "modifiers")]
        modifiers: HashSet<ModifierKey>,
    },
    #[serde(rename = "proximity")]
    Proximity {
        #[serde(rename = "pos")]
        pos: na::Vector2<f64>,
    },
    #[serde(rename = "cancel")]
    Cancel,
    #[serde(rename = "tick")]
    Tick,
    #[serde(rename = "undo")]
    Undo,
    #[serde(rename = "redo")]
    Redo,
    #[serde(rename = "select_all")]
    SelectAll,
    #[serde(rename = "trash_selection")]
    TrashSelection,
}

pub(crate) async fn run_replay(
    doc: &Path,
    events: &Path,
    output: Option<&Path>,
    config: EngineConfig,
    viewport: Viewport,
) -> anyhow::Result<()> {
    validators::file_has_ext(doc, "json")?;
    validators::file_has_ext(events, "json")?;

    let doc_json = cli::read_string_from_file(doc).await?;
    let script: ReplayScript = serde_json::from_str(&cli::read_string_from_file(events).await?)
        .with_context(|| format!("Failed to parse pointer script \"{}\".", events.display()))?;

    let mut engine = Engine::new(config, viewport);
    engine
        .import_remote_json(&doc_json)
        .with_context(|| format!("Failed to import document \"{}\".", doc.display()))?;
    // the imported state is the baseline, not something to undo
    engine.commit_pending();

    replay_script(&mut engine, &script, Instant::now());

    let out_json = serde_json::to_string_pretty(&engine.export_snapshots())?;
    match output {
        Some(output) => {
            cli::create_overwrite_file_w_bytes(output, out_json.as_bytes()).await?;
            println!("Replay finished, annotations written to \"{}\".", output.display());
        }
        None => println!("{out_json}"),
    }
    Ok(())
}

/// Feeds the script through the engine, with step times relative to `start`.
///
/// Pending edits are committed after the last step.
pub(crate) fn replay_script(engine: &mut Engine, script: &ReplayScript, start: Instant) {
    let mut last_at_ms = 0;

    for (i, step) in script.steps.iter().enumerate() {
        if step.at_ms < last_at_ms {
            warn!(
                "Replay step {i} goes back in time ({} ms after {last_at_ms} ms), keeping the previous time",
                step.at_ms
            );
        }
        last_at_ms = last_at_ms.max(step.at_ms);
        let now = start + Duration::from_millis(last_at_ms);
        debug!("Replaying step {i} at {last_at_ms} ms: {:?}", step.action);

        match &step.action {
            ReplayAction::Tool { style } => {
                engine.change_pen_style(*style, now);
            }
            ReplayAction::Down { pos, modifiers } => {
                engine.handle_pen_event(
                    PenEvent::Down {
                        element: Element::new(*pos),
                        modifier_keys: modifiers.clone(),
                    },
                    now,
                );
            }
            ReplayAction::Up { pos, modifiers } => {
                engine.handle_pen_event(
                    PenEvent::Up {
                        element: Element::new(*pos),
                        modifier_keys: modifiers.clone(),
                    },
                    now,
                );
            }
            ReplayAction::Proximity { pos } => {
                engine.handle_pen_event(
                    PenEvent::Proximity {
                        element: Element::new(*pos),
                        modifier_keys: HashSet::new(),
                    },
                    now,
                );
            }
            ReplayAction::Cancel => {
                engine.handle_pen_event(PenEvent::Cancel, now);
            }
            ReplayAction::Tick => {
                engine.tick(now);
            }
            ReplayAction::Undo => {
                engine.undo();
            }
            ReplayAction::Redo => {
                engine.redo();
            }
            ReplayAction::SelectAll => {
                engine.select_all();
            }
            ReplayAction::TrashSelection => {
                engine.trash_selection(now);
            }
        }
    }

    engine.commit_pending();
}
