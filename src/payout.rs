use crate::calculator::{CalculatedWinner, MatchResultInput};
use crate::types::{Amount, Uid};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayoutError {
    #[error("no winners to pay for match {0}")]
    NoWinners(String),
    #[error("every winner amount is 0 for match {0}")]
    NothingToPay(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutItem {
    pub uid: Uid,
    pub amount: Amount,
}

/// Request body for the distribution action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutPlan {
    pub match_id: String,
    pub winners: Vec<PayoutItem>,
}

impl PayoutPlan {
    /// Refuses to build a plan that would credit nobody.
    pub fn build(
        match_id: impl Into<String>,
        winners: &[CalculatedWinner],
    ) -> Result<Self, PayoutError> {
        let match_id = match_id.into();
        if winners.is_empty() {
            warn!("payout blocked for match {}: no winners", match_id);
            return Err(PayoutError::NoWinners(match_id));
        }
        if winners.iter().all(|w| w.amount.is_zero()) {
            warn!("payout blocked for match {}: all amounts are 0", match_id);
            return Err(PayoutError::NothingToPay(match_id));
        }
        let plan = Self {
            winners: winners
                .iter()
                .map(|w| PayoutItem {
                    uid: w.uid.clone(),
                    amount: w.amount,
                })
                .collect(),
            match_id,
        };
        info!(
            "payout plan for match {}: {} winner(s), total {}",
            plan.match_id,
            plan.winners.len(),
            plan.total()
        );
        Ok(plan)
    }

    pub fn total(&self) -> Amount {
        self.winners
            .iter()
            .fold(Amount::ZERO, |acc, item| acc.saturating_add(item.amount))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub uid: Uid,
    pub username: String,
    pub amount: Amount,
    pub breakdown: String,
}

pub fn history_snapshot(
    winners: &[CalculatedWinner],
    results: &[MatchResultInput],
) -> Vec<HistoryEntry> {
    let names: HashMap<&Uid, &str> = results
        .iter()
        .map(|r| (&r.uid, r.username.as_str()))
        .collect();
    winners
        .iter()
        .map(|w| HistoryEntry {
            uid: w.uid.clone(),
            username: names.get(&w.uid).copied().unwrap_or_default().to_string(),
            amount: w.amount,
            breakdown: w.breakdown.clone(),
        })
        .collect()
}
