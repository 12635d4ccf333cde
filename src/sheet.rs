use crate::calculator::MatchResultInput;
use crate::rule::{load_file, LoadError};
use crate::types::Uid;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// A participant as reported by the match service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub uid: Uid,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub push_reachable: bool,
    #[serde(rename = "teamId", default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl RosterEntry {
    pub fn new(uid: impl AsRef<str>, username: impl Into<String>) -> Self {
        Self {
            uid: Uid::new(uid),
            username: username.into(),
            push_reachable: false,
            team_id: None,
        }
    }
}

pub trait RosterSource {
    fn roster(&self, match_id: &str) -> Result<Vec<RosterEntry>, String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    #[error("uid {0} appears more than once in the roster")]
    DuplicateUid(Uid),
    #[error("uid {0} is not on the roster")]
    UnknownUid(Uid),
}

/// Roster joined with the rank and kills the operator types in.
#[derive(Debug, Clone, Default)]
pub struct ResultSheet {
    rows: Vec<MatchResultInput>,
    index: HashMap<Uid, usize>,
}

impl ResultSheet {
    pub fn from_roster(entries: Vec<RosterEntry>) -> Result<Self, SheetError> {
        let mut rows = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        for entry in entries {
            if index.insert(entry.uid.clone(), rows.len()).is_some() {
                return Err(SheetError::DuplicateUid(entry.uid));
            }
            rows.push(MatchResultInput {
                uid: entry.uid,
                username: entry.username,
                kills: 0,
                rank: 0,
                team_id: entry.team_id,
            });
        }
        Ok(Self { rows, index })
    }

    pub fn load(source: &dyn RosterSource, match_id: &str) -> Result<Self, String> {
        let entries = source.roster(match_id)?;
        debug!("loaded {} roster entries for match {}", entries.len(), match_id);
        Self::from_roster(entries).map_err(|e| e.to_string())
    }

    pub fn record(&mut self, uid: &Uid, rank: u32, kills: u32) -> Result<(), SheetError> {
        let pos = *self
            .index
            .get(uid)
            .ok_or_else(|| SheetError::UnknownUid(uid.clone()))?;
        let row = &mut self.rows[pos];
        row.rank = rank;
        row.kills = kills;
        Ok(())
    }

    pub fn inputs(&self) -> &[MatchResultInput] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads a saved result sheet, picking JSON or YAML by extension.
pub fn load_results(path: impl AsRef<Path>) -> Result<Vec<MatchResultInput>, LoadError> {
    let path = path.as_ref();
    let results: Vec<MatchResultInput> = load_file(path)?;
    debug!("loaded {} result(s) from {}", results.len(), path.display());
    Ok(results)
}

/// Entries finishing at `rank`, in input order. Callers use this to narrow the
/// field before an equal split.
pub fn ranked_at(results: &[MatchResultInput], rank: u32) -> Vec<MatchResultInput> {
    results
        .iter()
        .filter(|r| r.rank == rank)
        .cloned()
        .collect()
}
