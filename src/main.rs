use prize_engine::adapter::StaticRosterSource;
use prize_engine::calculator::{calculate_winnings, summarize};
use prize_engine::payout::PayoutPlan;
use prize_engine::rule::{rule_packs, RuleSource};
use prize_engine::sheet::{RosterEntry, ResultSheet};
use prize_engine::types::Uid;

fn main() {
    let book = rule_packs::load_rule_pack("rules/standard.json").expect("load standard rules");

    let mut roster = StaticRosterSource::new();
    roster.insert(
        "m-1",
        vec![
            RosterEntry::new("u-ace", "Ace"),
            RosterEntry::new("u-bolt", "Bolt"),
            RosterEntry::new("u-cinder", "Cinder"),
        ],
    );

    let mut sheet = ResultSheet::load(&roster, "m-1").expect("roster for m-1");
    sheet.record(&Uid::new("u-ace"), 1, 3).expect("ace is on the roster");
    sheet.record(&Uid::new("u-bolt"), 2, 1).expect("bolt is on the roster");

    let rule = book.rule("squad-kills").expect("squad-kills rule");
    let winners = calculate_winnings(&rule, sheet.inputs());
    for winner in &winners {
        println!("{}: {} ({})", winner.uid, winner.amount, winner.breakdown);
    }
    let summary = summarize(&rule, &winners);
    println!("winners={}, total={}", summary.winners, summary.total_paid);

    match PayoutPlan::build("m-1", &winners) {
        Ok(plan) => println!("payout total {}", plan.total()),
        Err(err) => println!("payout blocked: {err}"),
    }
}
