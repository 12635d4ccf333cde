use crate::types::{amount_from_value, Amount};
use log::{debug, warn};
use serde::de::{DeserializeOwned, Deserializer, Error as DeError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EqualShareConfig {
    pub total_prize: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RankKillConfig {
    pub per_kill: Amount,
    pub rank_rewards: BTreeMap<String, Amount>,
}

impl RankKillConfig {
    pub fn reward_for_rank(&self, rank: u32) -> Option<Amount> {
        self.rank_rewards.get(&rank.to_string()).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixedListConfig {
    pub prizes: Vec<Amount>,
}

impl FixedListConfig {
    pub fn prize_for_rank(&self, rank: u32) -> Option<Amount> {
        let index = (rank as usize).checked_sub(1)?;
        self.prizes.get(index).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum RuleKind {
    EqualShare(EqualShareConfig),
    RankKill(RankKillConfig),
    FixedList(FixedListConfig),
}

impl RuleKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::EqualShare(_) => "equal_share",
            Self::RankKill(_) => "rank_kill",
            Self::FixedList(_) => "fixed_list",
        }
    }

    /// Builds a variant from its wire tag and a loosely shaped config object.
    ///
    /// Missing or unreadable fields fall back to zero or empty.
    pub fn from_parts(type_name: &str, config: &JsonValue) -> Result<Self, String> {
        match type_name.trim().to_ascii_lowercase().as_str() {
            "equal_share" => Ok(Self::EqualShare(EqualShareConfig {
                total_prize: config_amount(config, "total_prize"),
            })),
            "rank_kill" => {
                let rank_rewards = config
                    .get("rank_rewards")
                    .and_then(JsonValue::as_object)
                    .map(|map| {
                        map.iter()
                            .map(|(rank, reward)| {
                                (rank.trim().to_string(), amount_from_value(reward))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(Self::RankKill(RankKillConfig {
                    per_kill: config_amount(config, "per_kill"),
                    rank_rewards,
                }))
            }
            "fixed_list" => {
                let prizes = config
                    .get("prizes")
                    .and_then(JsonValue::as_array)
                    .map(|items| items.iter().map(amount_from_value).collect())
                    .unwrap_or_default();
                Ok(Self::FixedList(FixedListConfig { prizes }))
            }
            other => Err(format!(
                "unknown rule type '{}'; expected equal_share, rank_kill or fixed_list",
                other
            )),
        }
    }
}

fn config_amount(config: &JsonValue, key: &str) -> Amount {
    config.get(key).map(amount_from_value).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrizeRule {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: RuleKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Deserialize)]
struct RawRule {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    config: JsonValue,
    #[serde(default)]
    created_at: JsonValue,
}

impl<'de> Deserialize<'de> for PrizeRule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawRule::deserialize(deserializer)?;
        let kind = RuleKind::from_parts(&raw.type_name, &raw.config).map_err(D::Error::custom)?;
        let created_at = match raw.created_at {
            JsonValue::String(s) => Some(s),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        };
        Ok(PrizeRule {
            id: raw.id.trim().to_string(),
            name: raw.name,
            kind,
            created_at,
        })
    }
}

impl PrizeRule {
    pub fn new(id: impl AsRef<str>, name: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            id: id.as_ref().trim().to_string(),
            name: name.into(),
            kind,
            created_at: None,
        }
    }

    pub fn equal_share(
        id: impl AsRef<str>,
        name: impl Into<String>,
        total_prize: impl Into<Amount>,
    ) -> Self {
        Self::new(
            id,
            name,
            RuleKind::EqualShare(EqualShareConfig {
                total_prize: total_prize.into(),
            }),
        )
    }

    pub fn rank_kill<I, K, A>(
        id: impl AsRef<str>,
        name: impl Into<String>,
        per_kill: impl Into<Amount>,
        rank_rewards: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, A)>,
        K: ToString,
        A: Into<Amount>,
    {
        let rank_rewards = rank_rewards
            .into_iter()
            .map(|(rank, reward)| (rank.to_string(), reward.into()))
            .collect();
        Self::new(
            id,
            name,
            RuleKind::RankKill(RankKillConfig {
                per_kill: per_kill.into(),
                rank_rewards,
            }),
        )
    }

    pub fn fixed_list<I, A>(id: impl AsRef<str>, name: impl Into<String>, prizes: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Amount>,
    {
        let prizes = prizes.into_iter().map(Into::into).collect();
        Self::new(id, name, RuleKind::FixedList(FixedListConfig { prizes }))
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(input)
    }

    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        load_file(path)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("json parse failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml parse failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported extension '{0}'; expected .yaml/.yml/.json")]
    UnsupportedExtension(String),
    #[error(transparent)]
    Book(#[from] RuleBookError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Result<Self, LoadError> {
        let ext = ext.trim().to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(LoadError::UnsupportedExtension(ext)),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        Self::from_extension(
            path.extension()
                .and_then(|v| v.to_str())
                .unwrap_or_default(),
        )
    }

    pub fn parse<T: DeserializeOwned>(self, raw: &str) -> Result<T, LoadError> {
        match self {
            Self::Json => Ok(serde_json::from_str(raw)?),
            Self::Yaml => Ok(serde_yaml::from_str(raw)?),
        }
    }
}

/// Reads a JSON or YAML document, picking the format from the file extension.
pub fn load_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, LoadError> {
    let path_ref = path.as_ref();
    let format = FileFormat::from_path(path_ref)?;
    let raw = fs::read_to_string(path_ref).map_err(|source| LoadError::Io {
        path: path_ref.display().to_string(),
        source,
    })?;
    format.parse(&raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleIssueKind {
    MissingId,
    MissingName,
    InvalidRank,
    NeverPays,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleIssue {
    pub kind: RuleIssueKind,
    pub message: String,
}

impl RuleIssue {
    fn new(kind: RuleIssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Strict checks run before a rule is stored. The calculator never calls this.
pub fn validate_rule(rule: &PrizeRule) -> Vec<RuleIssue> {
    let mut issues = Vec::new();
    if rule.id.trim().is_empty() {
        issues.push(RuleIssue::new(RuleIssueKind::MissingId, "rule id is empty"));
    }
    if rule.name.trim().is_empty() {
        issues.push(RuleIssue::new(RuleIssueKind::MissingName, "rule name is empty"));
    }

    match &rule.kind {
        RuleKind::EqualShare(config) => {
            if config.total_prize.is_zero() {
                issues.push(RuleIssue::new(
                    RuleIssueKind::NeverPays,
                    "equal_share total_prize is 0",
                ));
            }
        }
        RuleKind::RankKill(config) => {
            for rank in config.rank_rewards.keys() {
                if !is_canonical_rank(rank) {
                    issues.push(RuleIssue::new(
                        RuleIssueKind::InvalidRank,
                        format!("rank_rewards key '{}' is not a positive integer", rank),
                    ));
                }
            }
            let any_reward = config.rank_rewards.values().any(|v| !v.is_zero());
            if !any_reward && config.per_kill.is_zero() {
                issues.push(RuleIssue::new(
                    RuleIssueKind::NeverPays,
                    "rank_kill has no positive rank reward and per_kill is 0",
                ));
            }
        }
        RuleKind::FixedList(config) => {
            if config.prizes.is_empty() {
                issues.push(RuleIssue::new(
                    RuleIssueKind::NeverPays,
                    "fixed_list prizes is empty",
                ));
            } else if config.prizes.iter().all(|v| v.is_zero()) {
                issues.push(RuleIssue::new(
                    RuleIssueKind::NeverPays,
                    "fixed_list prizes are all 0",
                ));
            }
        }
    }
    issues
}

fn is_canonical_rank(key: &str) -> bool {
    match key.parse::<u32>() {
        Ok(rank) => rank > 0 && rank.to_string() == key,
        Err(_) => false,
    }
}

pub fn render_rule_issues(issues: &[RuleIssue]) -> Vec<String> {
    issues.iter().map(ToString::to_string).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleBookError {
    #[error("rule {0} already exists")]
    Duplicate(String),
    #[error("rule {0} not found")]
    NotFound(String),
    #[error("rule {id} is invalid: {}", render_rule_issues(.issues).join("; "))]
    Invalid { id: String, issues: Vec<RuleIssue> },
}

pub trait RuleSource {
    fn rule(&self, id: &str) -> Result<PrizeRule, String>;
}

/// In-memory collection of rules keyed by id.
#[derive(Debug, Default, Clone)]
pub struct RuleBook {
    rules: BTreeMap<String, PrizeRule>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, rule: PrizeRule) -> Result<(), RuleBookError> {
        check_rule(&rule)?;
        if self.rules.contains_key(&rule.id) {
            warn!("rejected duplicate rule {}", rule.id);
            return Err(RuleBookError::Duplicate(rule.id));
        }
        debug!("created {} rule {}", rule.kind.type_name(), rule.id);
        self.rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    pub fn update(&mut self, rule: PrizeRule) -> Result<PrizeRule, RuleBookError> {
        check_rule(&rule)?;
        let slot = self
            .rules
            .get_mut(&rule.id)
            .ok_or_else(|| RuleBookError::NotFound(rule.id.clone()))?;
        debug!("updated rule {}", rule.id);
        Ok(std::mem::replace(slot, rule))
    }

    pub fn delete(&mut self, id: &str) -> Result<PrizeRule, RuleBookError> {
        let key = id.trim();
        let removed = self
            .rules
            .remove(key)
            .ok_or_else(|| RuleBookError::NotFound(key.to_string()))?;
        debug!("deleted rule {}", key);
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<&PrizeRule> {
        self.rules.get(id.trim())
    }

    pub fn list(&self) -> impl Iterator<Item = &PrizeRule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn check_rule(rule: &PrizeRule) -> Result<(), RuleBookError> {
    let issues = validate_rule(rule);
    if issues.is_empty() {
        Ok(())
    } else {
        warn!("rejected invalid rule {}: {} issue(s)", rule.id, issues.len());
        Err(RuleBookError::Invalid {
            id: rule.id.clone(),
            issues,
        })
    }
}

impl RuleSource for RuleBook {
    fn rule(&self, id: &str) -> Result<PrizeRule, String> {
        self.get(id)
            .cloned()
            .ok_or_else(|| format!("unknown rule {}", id.trim()))
    }
}

pub mod rule_packs {
    use super::{load_file, FileFormat, LoadError, PrizeRule, RuleBook};
    use std::path::Path;

    pub fn parse_rule_pack(raw: &str, format: FileFormat) -> Result<Vec<PrizeRule>, LoadError> {
        format.parse(raw)
    }

    pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<PrizeRule>, LoadError> {
        load_file(path)
    }

    pub fn load_rule_pack(path: impl AsRef<Path>) -> Result<RuleBook, LoadError> {
        let mut book = RuleBook::new();
        for rule in load_rules(path)? {
            book.create(rule)?;
        }
        Ok(book)
    }
}
