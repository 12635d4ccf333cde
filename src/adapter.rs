use crate::rule::{PrizeRule, RuleSource};
use crate::sheet::{RosterEntry, RosterSource};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct StaticRosterSource {
    map: HashMap<String, Vec<RosterEntry>>,
}

impl StaticRosterSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, match_id: impl AsRef<str>, entries: Vec<RosterEntry>) {
        self.map.insert(match_id.as_ref().trim().to_string(), entries);
    }
}

impl RosterSource for StaticRosterSource {
    fn roster(&self, match_id: &str) -> Result<Vec<RosterEntry>, String> {
        self.map
            .get(match_id.trim())
            .cloned()
            .ok_or_else(|| format!("unknown match {}", match_id))
    }
}

pub struct FnRosterSource<F> {
    lookup: F,
}

impl<F> FnRosterSource<F> {
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }
}

impl<F> RosterSource for FnRosterSource<F>
where
    F: Fn(&str) -> Option<Vec<RosterEntry>>,
{
    fn roster(&self, match_id: &str) -> Result<Vec<RosterEntry>, String> {
        (self.lookup)(match_id).ok_or_else(|| format!("unknown match {}", match_id))
    }
}

pub struct FnRuleSource<F> {
    lookup: F,
}

impl<F> FnRuleSource<F> {
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }
}

impl<F> RuleSource for FnRuleSource<F>
where
    F: Fn(&str) -> Option<PrizeRule>,
{
    fn rule(&self, id: &str) -> Result<PrizeRule, String> {
        (self.lookup)(id).ok_or_else(|| format!("unknown rule {}", id))
    }
}
