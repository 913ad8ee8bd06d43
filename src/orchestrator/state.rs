use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::actor::{ActorId, Position};
use crate::phase::PhaseId;

/// Persisted state of one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSnapshot {
    pub id: PhaseId,
    pub meeting_point: Position,
    /// Actors recorded at the meeting point, for phases that track presence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gathered: Option<Vec<ActorId>>,
}

/// Everything a formation needs to resume after a reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationSnapshot {
    pub group: String,
    pub current: PhaseId,
    /// Game tick the snapshot was taken on
    #[serde(default)]
    pub tick: u64,
    pub phases: Vec<PhaseSnapshot>,
    pub saved_at: DateTime<Utc>,
}

impl FormationSnapshot {
    pub fn phase(&self, id: &PhaseId) -> Option<&PhaseSnapshot> {
        self.phases.iter().find(|p| &p.id == id)
    }
}

/// Reads and writes a formation snapshot file.
pub struct StateManager {
    state_file: PathBuf,
}

impl StateManager {
    pub fn new(state_file: PathBuf) -> Self {
        Self { state_file }
    }

    pub fn path(&self) -> &PathBuf {
        &self.state_file
    }

    /// Write `snapshot`, replacing any previous one.
    pub fn save(&self, snapshot: &FormationSnapshot) -> Result<()> {
        if let Some(parent) = self.state_file.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create state directory")?;
        }
        let json =
            serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;
        fs::write(&self.state_file, json)
            .with_context(|| format!("Failed to write state file: {}", self.state_file.display()))?;
        Ok(())
    }

    /// The saved snapshot, or `None` if nothing was saved yet.
    pub fn load(&self) -> Result<Option<FormationSnapshot>> {
        if !self.state_file.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.state_file).context("Failed to read state file")?;
        let snapshot = serde_json::from_str(&content).with_context(|| {
            format!("Failed to parse state file: {}", self.state_file.display())
        })?;
        Ok(Some(snapshot))
    }

    pub fn reset(&self) -> Result<()> {
        if self.state_file.exists() {
            fs::remove_file(&self.state_file).context("Failed to remove state file")?;
        }
        Ok(())
    }
}
