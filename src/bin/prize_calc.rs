use clap::{crate_version, App, Arg, ArgMatches};
use log::{debug, info};
use prize_engine::calculator::{
    calculate_winnings, summarize, CalculatedWinner, CalculationSummary, MatchResultInput,
};
use prize_engine::payout::{history_snapshot, PayoutPlan};
use prize_engine::rule::{rule_packs, PrizeRule, RuleSource};
use prize_engine::sheet::load_results;
use std::io::{self, Write};

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("prize_calc")
        .version(crate_version!())
        .about("Compute match payouts from a rule pack and a result sheet")
        .arg(
            Arg::with_name("rules")
                .long("rules")
                .value_name("FILE")
                .takes_value(true)
                .required(true)
                .help("Rule pack (.json, .yaml or .yml)"),
        )
        .arg(
            Arg::with_name("rule")
                .long("rule")
                .value_name("ID")
                .takes_value(true)
                .required(true)
                .help("Id of the rule to apply"),
        )
        .arg(
            Arg::with_name("results")
                .long("results")
                .value_name("FILE")
                .takes_value(true)
                .required(true)
                .help("Match results with uid, username, rank and kills per participant"),
        )
        .arg(
            Arg::with_name("match")
                .long("match")
                .value_name("ID")
                .takes_value(true)
                .default_value("local")
                .help("Match id stamped on the payout plan"),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Print the payout plan as JSON instead of a table"),
        )
}

fn run(matches: &ArgMatches<'_>, out: &mut impl Write) -> Result<(), String> {
    let rules_path = matches.value_of("rules").unwrap_or_default();
    let rule_id = matches.value_of("rule").unwrap_or_default();
    let results_path = matches.value_of("results").unwrap_or_default();
    let match_id = matches.value_of("match").unwrap_or("local");

    let book = rule_packs::load_rule_pack(rules_path).map_err(|e| e.to_string())?;
    debug!("loaded {} rule(s) from {}", book.len(), rules_path);
    let rule = book.rule(rule_id)?;
    let results = load_results(results_path).map_err(|e| e.to_string())?;
    info!(
        "applying {} rule {} to {} result(s)",
        rule.kind.type_name(),
        rule.id,
        results.len()
    );

    let winners = calculate_winnings(&rule, &results);
    let summary = summarize(&rule, &winners);
    let plan = PayoutPlan::build(match_id, &winners).map_err(|e| e.to_string())?;

    if matches.is_present("json") {
        let rendered = serde_json::to_string_pretty(&plan).map_err(|e| e.to_string())?;
        writeln!(out, "{rendered}").map_err(|e| e.to_string())?;
        return Ok(());
    }

    write_table(out, &rule, &plan, &winners, &results, &summary).map_err(|e| e.to_string())
}

fn write_table(
    out: &mut impl Write,
    rule: &PrizeRule,
    plan: &PayoutPlan,
    winners: &[CalculatedWinner],
    results: &[MatchResultInput],
    summary: &CalculationSummary,
) -> io::Result<()> {
    writeln!(out, "Rule: {} ({})", rule.name, rule.kind.type_name())?;
    writeln!(out, "Match: {}", plan.match_id)?;
    for entry in history_snapshot(winners, results) {
        writeln!(
            out,
            "  {:<16} {:<16} {:>10}  {}",
            entry.uid, entry.username, entry.amount, entry.breakdown
        )?;
    }
    writeln!(out, "Winners: {}", summary.winners)?;
    writeln!(out, "Total Paid: {}", summary.total_paid)?;
    if let Some(left) = summary.undistributed {
        writeln!(out, "Undistributed: {left}")?;
    }
    Ok(())
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = app().get_matches();
    run(&matches, &mut io::stdout().lock())
}
