//! Persists agent state documents as `<states_dir>/<id>.json`.
//!
//! Writes are atomic (write to a sibling temp file, then rename) the way
//! the teacher persists its run ledger in
//! `crates/gateway/src/runtime/runs.rs::rewrite_jsonl`. Oversized string
//! fields are trimmed before the document is written, mirroring
//! `original_source/utils/state.py::trim_state`.

use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::state::AgentState;

pub struct StateStore {
    states_dir: PathBuf,
}

impl StateStore {
    pub fn new(states_dir: impl Into<PathBuf>) -> Self {
        Self {
            states_dir: states_dir.into(),
        }
    }

    fn path_for(&self, state_id: &str) -> PathBuf {
        self.states_dir.join(format!("{state_id}.json"))
    }

    pub fn load(&self, state_id: &str) -> Result<AgentState> {
        let path = self.path_for(state_id);
        let bytes = std::fs::read(&path)
            .map_err(|_| StoreError::NotFound(state_id.to_string()))?;
        let state: AgentState = serde_json::from_slice(&bytes)?;
        Ok(state)
    }

    /// Trims oversized fields, then writes the document atomically.
    pub fn save(&self, state: &AgentState) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.states_dir)?;
        let path = self.path_for(&state.id);

        let mut value = serde_json::to_value(state)?;
        let char_limit = usize::try_from(state.context_trimming_threshold).unwrap_or(usize::MAX);
        trim_json_state(&mut value, char_limit);

        let bytes = serde_json::to_vec_pretty(&value)?;
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    pub fn exists(&self, state_id: &str) -> bool {
        self.path_for(state_id).exists()
    }

    /// Variant of `load` returning the document as-is, for callers (like
    /// the `/run_workflow` handler building a `save_state` operation)
    /// that need to round-trip whatever fields are on disk without
    /// funneling them through the typed `AgentState` schema.
    pub fn load_raw(&self, state_id: &str) -> Result<serde_json::Value> {
        let path = self.path_for(state_id);
        let bytes = std::fs::read(&path)
            .map_err(|_| StoreError::NotFound(state_id.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Variant of `save` taking an untyped JSON document — used by the
    /// `save_state` operation handler, which receives a phase-produced
    /// `serde_json::Value` rather than a typed `AgentState` (a phase may
    /// carry fields the engine's `AgentState` struct doesn't know about).
    /// Falls back to the default trimming threshold when the document
    /// carries none.
    pub fn save_raw(&self, state_id: &str, mut value: serde_json::Value) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.states_dir)?;
        let path = self.path_for(state_id);

        let char_limit = value
            .get("context_trimming_threshold")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(500_000);
        trim_json_state(&mut value, char_limit);

        let bytes = serde_json::to_vec_pretty(&value)?;
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    /// Writes an append-only snapshot under `<id>/snapshots/state_<timestamp>.json`,
    /// in addition to (not instead of) the canonical `<id>.json` document —
    /// every `save_state` dispatch gets its own timestamped copy so a run's
    /// history can be replayed even after the canonical file moves on.
    /// Returns the snapshot's path.
    pub fn save_snapshot(
        &self,
        state_id: &str,
        timestamp: &str,
        value: &serde_json::Value,
    ) -> Result<PathBuf> {
        let snapshots_dir = self.states_dir.join(state_id).join("snapshots");
        std::fs::create_dir_all(&snapshots_dir)?;
        let path = snapshots_dir.join(format!("state_{timestamp}.json"));
        let bytes = serde_json::to_vec_pretty(value)?;
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    pub fn states_dir(&self) -> &Path {
        &self.states_dir
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp_name = format!(
        ".{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("state")
    );
    let tmp_path = dir.join(tmp_name);
    std::fs::write(&tmp_path, bytes)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Walks `state["nodes"][].options[].content` (and the analogous string
/// fields surfaced on saved operation results) truncating any string
/// longer than `char_limit` to its first and last halves, joined by an
/// ellipsis marker — same shape as `trim_state` in the original, applied
/// generically over the JSON tree so new string-bearing fields are
/// trimmed without code changes here.
fn trim_json_state(value: &mut serde_json::Value, char_limit: usize) {
    if char_limit == 0 {
        return;
    }
    trim_value(value, char_limit);
}

fn trim_value(value: &mut serde_json::Value, char_limit: usize) {
    match value {
        serde_json::Value::String(s) => {
            if s.chars().count() > char_limit {
                *s = truncate_middle(s, char_limit);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items.iter_mut() {
                trim_value(item, char_limit);
            }
        }
        serde_json::Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                trim_value(v, char_limit);
            }
        }
        _ => {}
    }
}

fn truncate_middle(s: &str, char_limit: usize) -> String {
    const MARKER: &str = "...";
    let half = char_limit.saturating_sub(MARKER.len()) / 2;
    let chars: Vec<char> = s.chars().collect();
    let head: String = chars[..half].iter().collect();
    let tail: String = chars[chars.len() - half..].iter().collect();
    format!("{head}{MARKER}{tail}")
}
