use crate::rule::{PrizeRule, RuleSource};
use crate::sheet::{RosterEntry, RosterSource};
use crate::types::Uid;
use serde_json::Value as JsonValue;

/// Participant record as the match service returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalParticipant {
    pub uid: String,
    pub username: Option<String>,
    pub has_push_token: bool,
    pub team_id: Option<String>,
}

pub trait ExternalRosterSource {
    fn lookup_participants(&self, match_id: &str) -> Option<Vec<ExternalParticipant>>;
}

pub trait ExternalRuleSource {
    fn lookup_rule(&self, id: &str) -> Option<JsonValue>;
}

impl<T: ExternalRosterSource + ?Sized> ExternalRosterSource for &T {
    fn lookup_participants(&self, match_id: &str) -> Option<Vec<ExternalParticipant>> {
        (**self).lookup_participants(match_id)
    }
}

impl<T: ExternalRuleSource + ?Sized> ExternalRuleSource for &T {
    fn lookup_rule(&self, id: &str) -> Option<JsonValue> {
        (**self).lookup_rule(id)
    }
}

pub struct RosterSourceAdapter<S> {
    source: S,
}

impl<S> RosterSourceAdapter<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S> RosterSource for RosterSourceAdapter<S>
where
    S: ExternalRosterSource,
{
    fn roster(&self, match_id: &str) -> Result<Vec<RosterEntry>, String> {
        let participants = self
            .source
            .lookup_participants(match_id)
            .ok_or_else(|| format!("unknown match {}", match_id))?;
        Ok(participants
            .into_iter()
            .filter(|p| !p.uid.trim().is_empty())
            .map(|p| {
                let username = p.username.unwrap_or_else(|| p.uid.trim().to_string());
                RosterEntry {
                    uid: Uid::new(&p.uid),
                    username,
                    push_reachable: p.has_push_token,
                    team_id: p.team_id.filter(|t| !t.trim().is_empty()),
                }
            })
            .collect())
    }
}

pub struct RuleSourceAdapter<S> {
    source: S,
}

impl<S> RuleSourceAdapter<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S> RuleSource for RuleSourceAdapter<S>
where
    S: ExternalRuleSource,
{
    fn rule(&self, id: &str) -> Result<PrizeRule, String> {
        let raw = self
            .source
            .lookup_rule(id)
            .ok_or_else(|| format!("unknown rule {}", id))?;
        serde_json::from_value(raw).map_err(|e| format!("rule {} unreadable: {}", id, e))
    }
}
