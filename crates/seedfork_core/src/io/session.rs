use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::io::record::Record;
use crate::registry::ForkRegistry;
use crate::seed::RootSeed;
use crate::source::RandomSource;

/// Session document: a root seed and a plan of registry operations.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Session {
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default)]
    pub seed: RootSeed,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Draw {
        label: String,
        #[serde(flatten)]
        kind: DrawKind,
        #[serde(default = "default_count")]
        count: u32,
    },
    Checkpoint,
    CheckpointCurrent,
    Replay {
        label: String,
    },
    ReplayAll,
    Reseed {
        seed: RootSeed,
    },
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawKind {
    Float,
    Int { min: i64, max: i64 },
    Range { min: f64, max: f64 },
    Chance { p: f64 },
    Pick { items: Vec<Value> },
    Uuid {
        #[serde(default)]
        namespace: String,
    },
}

fn default_owner() -> String {
    "session".to_string()
}

fn default_count() -> u32 {
    1
}

impl Session {
    /// Load a session JSON document from disk.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open session file {:?}", path))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Deserialize a session document from an arbitrary reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).context("invalid session json")
    }
}

/// Execute every step of `session` against a fresh registry.
pub fn run_session(session: &Session) -> Result<Vec<Record>> {
    let mut registry = ForkRegistry::new(session.owner.clone(), session.seed.clone());
    run_steps(&mut registry, &session.steps)
}

/// Execute `steps` against an existing registry.
pub fn run_steps(registry: &mut ForkRegistry, steps: &[Step]) -> Result<Vec<Record>> {
    let mut records = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        let record = match step {
            Step::Draw { label, kind, count } => {
                let mut stream = registry.fork(label);
                let values = (0..*count)
                    .map(|_| draw_value(&mut stream, kind))
                    .collect::<crate::error::Result<Vec<_>>>()
                    .with_context(|| format!("step {index}: draw from {label:?} failed"))?;
                Record::new(index, "draw")
                    .with_label(label)
                    .with_values(values)
            }
            Step::Checkpoint => {
                registry.checkpoint();
                Record::new(index, "checkpoint").with_note(format!("{} fork(s)", registry.len()))
            }
            Step::CheckpointCurrent => {
                registry.checkpoint_current();
                Record::new(index, "checkpoint_current")
                    .with_note(format!("{} fork(s)", registry.len()))
            }
            Step::Replay { label } => {
                let note = if registry.replay(label) {
                    "reset"
                } else {
                    "skipped"
                };
                Record::new(index, "replay").with_label(label).with_note(note)
            }
            Step::ReplayAll => {
                let reset = registry.replay_all();
                Record::new(index, "replay_all").with_note(format!("{reset} fork(s) reset"))
            }
            Step::Reseed { seed } => {
                registry.reseed(seed.clone());
                Record::new(index, "reseed").with_note(format!("root {}", registry.root_seed()))
            }
        };
        records.push(record);
    }
    Ok(records)
}

fn draw_value<R: RandomSource>(source: &mut R, kind: &DrawKind) -> crate::error::Result<Value> {
    Ok(match kind {
        DrawKind::Float => Value::from(source.float()),
        DrawKind::Int { min, max } => Value::from(source.int(*min, *max)?),
        DrawKind::Range { min, max } => Value::from(source.range(*min, *max)?),
        DrawKind::Chance { p } => Value::from(source.chance(*p)),
        DrawKind::Pick { items } => source.pick(items)?.clone(),
        DrawKind::Uuid { namespace } => Value::from(source.uuid(namespace)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SCENARIO: &str = r#"{
        "owner": "scenario",
        "seed": 1337,
        "steps": [
            {"op": "draw", "label": "a", "kind": "float", "count": 3},
            {"op": "checkpoint"},
            {"op": "draw", "label": "b", "kind": "int", "min": 0, "max": 9, "count": 5},
            {"op": "replay", "label": "a"},
            {"op": "draw", "label": "a", "kind": "float", "count": 3}
        ]
    }"#;

    #[test]
    fn scenario_document_replays_fork_a() {
        let session = Session::from_reader(SCENARIO.as_bytes()).unwrap();
        let records = run_session(&session).unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].values.len(), 3);
        assert_eq!(records[0].values, records[4].values);
        assert_eq!(records[3].note.as_deref(), Some("reset"));
    }

    #[test]
    fn every_draw_kind_parses_and_runs() {
        let json = r#"{
            "steps": [
                {"op": "draw", "label": "x", "kind": "range", "min": 0, "max": 2.5},
                {"op": "draw", "label": "x", "kind": "chance", "p": 0.25, "count": 4},
                {"op": "draw", "label": "x", "kind": "pick", "items": ["rock", "ice", 3]},
                {"op": "draw", "label": "x", "kind": "uuid", "namespace": "belt"},
                {"op": "checkpoint_current"},
                {"op": "reseed", "seed": "other"},
                {"op": "replay_all"}
            ]
        }"#;
        let session = Session::from_reader(json.as_bytes()).unwrap();
        assert_eq!(session.owner, "session");
        assert_eq!(session.seed, RootSeed::default());
        let records = run_session(&session).unwrap();
        assert_eq!(records[1].values.len(), 4);
        assert!(records[3].values[0].as_str().is_some());
        assert_eq!(records[6].note.as_deref(), Some("1 fork(s) reset"));
    }

    #[test]
    fn invalid_range_is_reported_with_step() {
        let json = r#"{"steps": [{"op": "draw", "label": "x", "kind": "int", "min": 5, "max": 1}]}"#;
        let session = Session::from_reader(json.as_bytes()).unwrap();
        let err = run_session(&session).unwrap_err();
        assert!(format!("{err:#}").contains("step 0"));
    }

    #[test]
    fn empty_pick_is_rejected() {
        let json = r#"{"steps": [{"op": "draw", "label": "x", "kind": "pick", "items": []}]}"#;
        let session = Session::from_reader(json.as_bytes()).unwrap();
        assert!(run_session(&session).is_err());
    }

    #[test]
    fn repository_sessions_deserialize() {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let sessions_dir = manifest_dir.join("../../testdata/sessions");
        for name in ["scenario_1337.json", "belt_and_starfield.json"] {
            let path = sessions_dir.join(name);
            let session = Session::load_from_path(&path)
                .unwrap_or_else(|err| panic!("failed to load {:?}: {}", path, err));
            assert!(!session.steps.is_empty(), "session {:?} must define steps", path);
            run_session(&session).unwrap_or_else(|err| panic!("{:?} failed: {:#}", path, err));
        }
    }
}
