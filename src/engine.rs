use log::{info, warn};

use opportunity_scoring::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use chrono::{SecondsFormat, Utc};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::engine::data_reader::*;

pub mod data_reader;

#[derive(Debug, Snafu)]
pub enum EngineError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON in {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing output to {path}"))]
    WritingJson {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;

fn district_to_json(opp: &DistrictOpportunity) -> JSValue {
    json!({
        "districtNumber": opp.district,
        "opportunityScore": opp.score,
        "tier": opp.tier.code(),
        "tierLabel": opp.tier.label(),
        "factors": {
            "competitiveness": opp.factors.competitiveness,
            "marginTrend": opp.factors.margin_trend,
            "incumbency": opp.factors.incumbency,
            "candidatePresence": opp.factors.candidate_presence,
            "openSeatBonus": opp.factors.open_seat_bonus,
        },
        "metrics": {
            "avgMargin": opp.metrics.avg_margin,
            "trendChange": opp.metrics.trend_change,
            "competitivenessScore": opp.metrics.competitiveness_score,
        },
        "flags": {
            "needsCandidate": opp.flags.needs_candidate,
            "openSeat": opp.flags.open_seat,
            "trendingDem": opp.flags.trending_dem,
            "defensive": opp.flags.defensive,
            "hasDemocrat": opp.flags.has_democrat,
        },
        "recommendation": opp.recommendation,
    })
}

fn chamber_to_json(opps: &[DistrictOpportunity]) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for opp in opps.iter() {
        m.insert(opp.district.to_string(), district_to_json(opp));
    }
    JSValue::Object(m)
}

fn build_summary_js(house: &ChamberOpportunities, senate: &ChamberOpportunities) -> JSValue {
    json!({
        "lastUpdated": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "house": chamber_to_json(&house.districts),
        "senate": chamber_to_json(&senate.districts),
    })
}

fn log_chamber_summary(chamber: &str, result: &ChamberOpportunities) {
    let count = |tier: Tier| result.districts.iter().filter(|d| d.tier == tier).count();
    let needs_candidate = result
        .districts
        .iter()
        .filter(|d| d.flags.needs_candidate)
        .count();
    info!("{} ({} districts):", chamber.to_uppercase(), result.districts.len());
    info!("  High Opportunity (70+):  {:3}", count(Tier::HighOpportunity));
    info!("  Emerging (50-69):        {:3}", count(Tier::Emerging));
    info!("  Build (30-49):           {:3}", count(Tier::Build));
    info!("  Defensive:               {:3}", count(Tier::Defensive));
    info!("  Non-Competitive (<30):   {:3}", count(Tier::NonCompetitive));
    info!("  Needs candidate:         {:3}", needs_candidate);
    if !result.skipped.is_empty() {
        warn!(
            "{}: {} district(s) excluded for data problems",
            chamber,
            result.skipped.len()
        );
    }
}

fn score_chamber(
    chamber: &str,
    elections: &ElectionsFile,
    candidates: &CandidatesFile,
    rules: &ScoringRules,
) -> EngineResult<ChamberOpportunities> {
    let histories = validate_histories(chamber, elections.chamber(chamber));
    let filings = validate_filings(chamber, candidates.chamber(chamber));
    match score_all(&histories, &filings, rules) {
        Ok(r) => Ok(r),
        Err(e) => whatever!("Scoring failed for the {} chamber: {}", chamber, e),
    }
}

/// Compares the computed output against a reference file, ignoring the batch
/// timestamp on both sides.
fn check_reference(path: &str, computed: &JSValue) -> EngineResult<()> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut reference: JSValue =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    let mut computed = computed.clone();
    mask_timestamp(&mut reference);
    mask_timestamp(&mut computed);

    let pretty_reference = match serde_json::to_string_pretty(&reference) {
        Ok(s) => s,
        Err(e) => whatever!("Failed to render reference JSON: {}", e),
    };
    let pretty_computed = match serde_json::to_string_pretty(&computed) {
        Ok(s) => s,
        Err(e) => whatever!("Failed to render output JSON: {}", e),
    };
    if pretty_reference != pretty_computed {
        warn!("Found differences with the reference file");
        print_diff(pretty_reference.as_str(), pretty_computed.as_ref(), "\n");
        whatever!(
            "Difference detected between computed output and reference {}",
            path
        );
    }
    info!("Output matches reference {}", path);
    Ok(())
}

fn mask_timestamp(js: &mut JSValue) {
    if let Some(obj) = js.as_object_mut() {
        if obj.contains_key("lastUpdated") {
            obj.insert("lastUpdated".to_string(), json!("(dynamic)"));
        }
    }
}

pub fn run_scoring(args: &Args) -> EngineResult<()> {
    let elections = read_elections_file(&args.elections)?;
    info!(
        "Loaded election history from {} (updated {:?})",
        args.elections, elections.last_updated
    );
    let candidates = read_candidates_file(&args.candidates)?;
    info!(
        "Loaded candidate filings from {} (updated {:?})",
        args.candidates, candidates.last_updated
    );

    let mut rules = ScoringRules::default_rules();
    if let Some(party) = args.party.clone() {
        rules.target_party = party;
    }
    if let Err(e) = rules.validate() {
        whatever!("Invalid scoring rules: {}", e);
    }

    let house = score_chamber("house", &elections, &candidates, &rules)?;
    let senate = score_chamber("senate", &elections, &candidates, &rules)?;

    log_chamber_summary("house", &house);
    log_chamber_summary("senate", &senate);

    let result_js = build_summary_js(&house, &senate);
    let pretty_js = match serde_json::to_string_pretty(&result_js) {
        Ok(s) => s,
        Err(e) => whatever!("Failed to render output JSON: {}", e),
    };

    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty_js),
        Some(path) => {
            fs::write(path, &pretty_js).context(WritingJsonSnafu { path })?;
            info!("Output written to {}", path);
        }
    }

    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &result_js)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run_scoring;
    use crate::args::Args;

    fn test_args(case: &str) -> Args {
        let test_dir = option_env!("OPPSCORE_TEST_DIR")
            .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/test_data"));
        Args {
            elections: format!("{}/{}/elections.json", test_dir, case),
            candidates: format!("{}/{}/candidates.json", test_dir, case),
            out: None,
            reference: Some(format!("{}/{}/expected_opportunity.json", test_dir, case)),
            party: None,
            verbose: false,
        }
    }

    #[test]
    fn baseline() {
        let res = run_scoring(&test_args("baseline"));
        assert!(res.is_ok(), "{:?}", res.err());
    }

    #[test]
    fn malformed_districts_are_excluded() {
        let res = run_scoring(&test_args("malformed"));
        assert!(res.is_ok(), "{:?}", res.err());
    }
}
