use crate::rule::{EqualShareConfig, FixedListConfig, PrizeRule, RankKillConfig, RuleKind};
use crate::types::{Amount, Uid};
use serde::{Deserialize, Serialize};

/// One participant considered for payout, as entered by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResultInput {
    pub uid: Uid,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub kills: u32,
    /// Finishing position; 0 means unranked.
    #[serde(default)]
    pub rank: u32,
    #[serde(rename = "teamId", default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl MatchResultInput {
    pub fn new(uid: impl AsRef<str>, username: impl Into<String>, rank: u32, kills: u32) -> Self {
        Self {
            uid: Uid::new(uid),
            username: username.into(),
            kills,
            rank,
            team_id: None,
        }
    }

    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatedWinner {
    pub uid: Uid,
    pub amount: Amount,
    pub breakdown: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

/// Computes payouts for `results` under `rule`.
///
/// Winners come back in input order. `equal_share` pays every entry, zero
/// included; `rank_kill` and `fixed_list` leave out anyone who would earn 0.
pub fn calculate_winnings(rule: &PrizeRule, results: &[MatchResultInput]) -> Vec<CalculatedWinner> {
    match &rule.kind {
        RuleKind::EqualShare(config) => equal_share(config, results),
        RuleKind::RankKill(config) => rank_kill(config, results),
        RuleKind::FixedList(config) => fixed_list(config, results),
    }
}

fn equal_share(config: &EqualShareConfig, results: &[MatchResultInput]) -> Vec<CalculatedWinner> {
    if results.is_empty() {
        return Vec::new();
    }
    let count = results.len();
    // Whole units only; the remainder stays unpaid.
    let amount_each = (config.total_prize / Amount::from(count)).floor();
    let breakdown = format!("Equal Share ({} / {})", config.total_prize, count);
    results
        .iter()
        .map(|result| CalculatedWinner {
            uid: result.uid.clone(),
            amount: amount_each,
            breakdown: breakdown.clone(),
            position: Some(result.rank),
        })
        .collect()
}

fn rank_kill(config: &RankKillConfig, results: &[MatchResultInput]) -> Vec<CalculatedWinner> {
    results
        .iter()
        .filter_map(|result| {
            let mut total = Amount::ZERO;
            let mut parts = Vec::with_capacity(2);

            if let Some(reward) = config.reward_for_rank(result.rank).filter(|v| !v.is_zero()) {
                total = total.saturating_add(reward);
                parts.push(format!("Rank {} ({})", result.rank, reward));
            }
            if result.kills > 0 {
                let kill_amount = Amount::from(result.kills)
                    .saturating_mul(config.per_kill)
                    .normalize();
                total = total.saturating_add(kill_amount);
                parts.push(format!("{} Kills ({})", result.kills, kill_amount));
            }

            (!total.is_zero()).then(|| CalculatedWinner {
                uid: result.uid.clone(),
                amount: total.normalize(),
                breakdown: parts.join(" + "),
                position: Some(result.rank),
            })
        })
        .collect()
}

fn fixed_list(config: &FixedListConfig, results: &[MatchResultInput]) -> Vec<CalculatedWinner> {
    results
        .iter()
        .filter_map(|result| {
            let amount = config.prize_for_rank(result.rank).filter(|v| !v.is_zero())?;
            Some(CalculatedWinner {
                uid: result.uid.clone(),
                amount,
                breakdown: format!("Rank {} Fixed Prize", result.rank),
                position: Some(result.rank),
            })
        })
        .collect()
}

#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationSummary {
    pub winners: usize,
    pub total_paid: Amount,
    /// Pool left over by floor division; only set for `equal_share`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undistributed: Option<Amount>,
}

pub fn summarize(rule: &PrizeRule, winners: &[CalculatedWinner]) -> CalculationSummary {
    let total_paid = winners
        .iter()
        .fold(Amount::ZERO, |acc, w| acc.saturating_add(w.amount));
    let undistributed = match &rule.kind {
        RuleKind::EqualShare(config) => Some(config.total_prize.saturating_sub(total_paid)),
        _ => None,
    };
    CalculationSummary {
        winners: winners.len(),
        total_paid,
        undistributed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn result(uid: &str, rank: u32, kills: u32) -> MatchResultInput {
        MatchResultInput::new(uid, uid.to_uppercase(), rank, kills)
    }

    fn amount(text: &str) -> Amount {
        Amount::from_str(text).unwrap()
    }

    fn squad_rule() -> PrizeRule {
        PrizeRule::rank_kill("squad", "Squad", 10, [(1, 500), (2, 300)])
    }

    fn uids(winners: &[CalculatedWinner]) -> Vec<&str> {
        winners.iter().map(|w| w.uid.as_str()).collect()
    }

    fn paid(winners: &[CalculatedWinner]) -> Vec<(&str, String, &str)> {
        winners
            .iter()
            .map(|w| (w.uid.as_str(), w.amount.to_string(), w.breakdown.as_str()))
            .collect()
    }

    #[test]
    fn equal_share_floors_and_drops_remainder() {
        let rule = PrizeRule::equal_share("duo", "Duo", 1000);
        let results = vec![result("a", 1, 0), result("b", 1, 2), result("c", 1, 5)];
        let winners = calculate_winnings(&rule, &results);

        assert_eq!(uids(&winners), vec!["a", "b", "c"]);
        assert!(winners.iter().all(|w| w.amount == Amount::from(333)));
        assert!(winners
            .iter()
            .all(|w| w.breakdown == "Equal Share (1000 / 3)"));
        let summary = summarize(&rule, &winners);
        assert_eq!(
            summary,
            CalculationSummary {
                winners: 3,
                total_paid: Amount::from(999),
                undistributed: Some(Amount::ONE),
            }
        );
        assert!(summary.total_paid <= Amount::from(1000));
    }

    #[test]
    fn equal_share_floors_fractional_pool() {
        let rule = PrizeRule::equal_share("odd", "Odd", amount("100.5"));
        let winners = calculate_winnings(&rule, &[result("a", 1, 0), result("b", 1, 0)]);
        assert_eq!(
            paid(&winners),
            vec![
                ("a", "50".to_string(), "Equal Share (100.5 / 2)"),
                ("b", "50".to_string(), "Equal Share (100.5 / 2)"),
            ]
        );
        assert_eq!(summarize(&rule, &winners).undistributed, Some(amount("0.5")));

        let rule = PrizeRule::equal_share("tiny", "Tiny", amount("0.9"));
        let winners = calculate_winnings(&rule, &[result("a", 1, 0)]);
        assert_eq!(winners[0].amount, Amount::ZERO);
    }

    #[test]
    fn equal_share_with_no_results_is_empty() {
        let rule = PrizeRule::equal_share("duo", "Duo", 1000);
        assert!(calculate_winnings(&rule, &[]).is_empty());
    }

    #[test]
    fn equal_share_ignores_rank_and_keeps_zero_amounts() {
        let rule = PrizeRule::equal_share("empty", "Empty", 0);
        let results = vec![result("a", 0, 0), result("b", 7, 0)];
        let winners = calculate_winnings(&rule, &results);
        assert_eq!(winners.len(), 2);
        assert!(winners.iter().all(|w| w.amount.is_zero()));
        assert_eq!(winners[1].position, Some(7));

        let rule = PrizeRule::equal_share("small", "Small", 2);
        let results = vec![result("a", 1, 0), result("b", 1, 0), result("c", 1, 0)];
        assert!(calculate_winnings(&rule, &results)
            .iter()
            .all(|w| w.amount.is_zero()));
    }

    #[test]
    fn rank_kill_combines_rank_reward_and_kills() {
        let winners = calculate_winnings(&squad_rule(), &[result("a", 1, 3)]);
        assert_eq!(
            winners,
            vec![CalculatedWinner {
                uid: Uid::new("a"),
                amount: Amount::from(530),
                breakdown: "Rank 1 (500) + 3 Kills (30)".to_string(),
                position: Some(1),
            }]
        );
    }

    #[test]
    fn rank_kill_pays_fractional_rates_exactly() {
        let rule: PrizeRule = serde_json::from_str(
            r#"{"id": "frac", "name": "Frac", "type": "rank_kill",
                "config": {"per_kill": 2.5, "rank_rewards": {"1": 100.5}}}"#,
        )
        .unwrap();
        let winners = calculate_winnings(&rule, &[result("a", 1, 3), result("b", 4, 1)]);
        assert_eq!(
            paid(&winners),
            vec![
                ("a", "108".to_string(), "Rank 1 (100.5) + 3 Kills (7.5)"),
                ("b", "2.5".to_string(), "1 Kills (2.5)"),
            ]
        );
    }

    #[test]
    fn rank_kill_pays_kills_alone_and_rank_alone() {
        let results = vec![result("a", 0, 4), result("b", 2, 0), result("c", 9, 1)];
        let winners = calculate_winnings(&squad_rule(), &results);
        assert_eq!(
            paid(&winners),
            vec![
                ("a", "40".to_string(), "4 Kills (40)"),
                ("b", "300".to_string(), "Rank 2 (300)"),
                ("c", "10".to_string(), "1 Kills (10)"),
            ]
        );
    }

    #[test]
    fn rank_kill_excludes_non_earners() {
        let results = vec![result("a", 5, 0), result("b", 1, 0), result("c", 0, 0)];
        let winners = calculate_winnings(&squad_rule(), &results);
        assert_eq!(uids(&winners), vec!["b"]);
    }

    #[test]
    fn rank_kill_with_zero_rates_pays_nothing() {
        let rule = PrizeRule::rank_kill("zero", "Zero", 0, [(1, 0)]);
        let winners = calculate_winnings(&rule, &[result("a", 1, 12)]);
        assert!(winners.is_empty());
    }

    #[test]
    fn rank_kill_honors_configured_rank_zero() {
        let rule = PrizeRule::rank_kill("consolation", "Consolation", 0, [(0, 25)]);
        let winners = calculate_winnings(&rule, &[result("a", 0, 0)]);
        assert_eq!(winners[0].amount, Amount::from(25));
        assert_eq!(winners[0].breakdown, "Rank 0 (25)");
    }

    #[test]
    fn rank_kill_saturates_instead_of_overflowing() {
        let rule = PrizeRule::rank_kill("huge", "Huge", Amount::MAX, [(1, Amount::MAX)]);
        let winners = calculate_winnings(&rule, &[result("a", 1, u32::MAX)]);
        assert_eq!(winners[0].amount, Amount::MAX);
    }

    #[test]
    fn fixed_list_pays_by_position() {
        let rule = PrizeRule::fixed_list("top3", "Top 3", [500, 300, 100]);
        let results = vec![
            result("a", 4, 9),
            result("b", 2, 0),
            result("c", 0, 0),
            result("d", 3, 1),
        ];
        let winners = calculate_winnings(&rule, &results);
        assert_eq!(
            winners,
            vec![
                CalculatedWinner {
                    uid: Uid::new("b"),
                    amount: Amount::from(300),
                    breakdown: "Rank 2 Fixed Prize".to_string(),
                    position: Some(2),
                },
                CalculatedWinner {
                    uid: Uid::new("d"),
                    amount: Amount::from(100),
                    breakdown: "Rank 3 Fixed Prize".to_string(),
                    position: Some(3),
                },
            ]
        );
        assert_eq!(summarize(&rule, &winners).undistributed, None);
    }

    #[test]
    fn fixed_list_pays_fractional_prizes_exactly() {
        let rule = PrizeRule::fixed_list("cents", "Cents", [amount("50.75"), amount("0.5")]);
        let winners = calculate_winnings(&rule, &[result("a", 2, 0), result("b", 1, 0)]);
        assert_eq!(
            paid(&winners),
            vec![
                ("a", "0.5".to_string(), "Rank 2 Fixed Prize"),
                ("b", "50.75".to_string(), "Rank 1 Fixed Prize"),
            ]
        );
        assert_eq!(summarize(&rule, &winners).total_paid, amount("51.25"));
    }

    #[test]
    fn fixed_list_skips_zero_slots() {
        let rule = PrizeRule::fixed_list("gap", "Gap", [0, 300]);
        let winners = calculate_winnings(&rule, &[result("a", 1, 0), result("b", 2, 0)]);
        assert_eq!(uids(&winners), vec!["b"]);
    }

    #[test]
    fn malformed_config_never_panics() {
        let rule: PrizeRule = serde_json::from_str(
            r#"{"id": "broken", "name": "Broken", "type": "rank_kill", "config": {"per_kill": "ten"}}"#,
        )
        .unwrap();
        assert!(calculate_winnings(&rule, &[result("a", 1, 3)]).is_empty());

        let rule: PrizeRule =
            serde_json::from_str(r#"{"id": "broken", "name": "Broken", "type": "fixed_list"}"#)
                .unwrap();
        assert!(calculate_winnings(&rule, &[result("a", 1, 0)]).is_empty());
    }

    #[test]
    fn repeated_calls_are_identical() {
        let results = vec![result("a", 2, 1), result("b", 1, 3), result("c", 3, 0)];
        for rule in [
            squad_rule(),
            PrizeRule::equal_share("duo", "Duo", 1000),
            PrizeRule::fixed_list("top3", "Top 3", [500, 300, 100]),
        ] {
            let first = calculate_winnings(&rule, &results);
            let second = calculate_winnings(&rule, &results);
            assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }
    }

    #[test]
    fn surviving_winners_keep_input_order() {
        let results = vec![
            result("c", 2, 0),
            result("x", 7, 0),
            result("a", 1, 0),
            result("b", 2, 1),
        ];
        let winners = calculate_winnings(&squad_rule(), &results);
        assert_eq!(uids(&winners), vec!["c", "a", "b"]);
    }

    #[test]
    fn results_deserialize_with_team_id_and_defaults() {
        let parsed: Vec<MatchResultInput> = serde_json::from_str(
            r#"[{"uid": "u1", "username": "One", "rank": 1, "kills": 2, "teamId": "t1"},
                {"uid": 22}]"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            vec![
                MatchResultInput::new("u1", "One", 1, 2).with_team("t1"),
                MatchResultInput::new("22", "", 0, 0),
            ]
        );
    }
}
