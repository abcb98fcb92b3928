mod config;
pub mod builder;
pub mod manual;

use log::{debug, info, warn};

use std::collections::BTreeMap;

pub use crate::config::*;

// Tier thresholds on the 0-100 score. Lower bounds are inclusive.
const TIER_HIGH: u8 = 70;
const TIER_EMERGING: u8 = 50;
const TIER_BUILD: u8 = 30;

// Neutral midpoints used when a district has no history.
const NEUTRAL_COMPETITIVENESS: f64 = 50.0;
const NEUTRAL_MARGIN: f64 = 50.0;

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn party_matches(party: Option<&str>, target: &str) -> bool {
    party.map(|p| p.eq_ignore_ascii_case(target)).unwrap_or(false)
}

/// Margins of the recent elections, newest first, paired with the winning
/// party. An uncontested race sweeps the full 100 points.
fn recent_margins(history: &DistrictHistory) -> Vec<(f64, Option<&str>)> {
    let mut ordered: Vec<&ElectionRecord> = history.elections.iter().collect();
    ordered.sort_by_key(|e| std::cmp::Reverse(e.year));
    ordered
        .iter()
        .map(|e| {
            let margin = if e.uncontested { 100.0 } else { e.margin_pct };
            (margin, e.winning_party.as_deref())
        })
        .collect()
}

/// Stage 1: pull the raw numeric signals out of the district history.
fn extract_metrics(history: &DistrictHistory, rules: &ScoringRules) -> OpportunityMetrics {
    let (avg_margin, competitiveness_score) = match &history.competitiveness {
        Some(c) => (c.avg_margin, c.score),
        None => (NEUTRAL_MARGIN, NEUTRAL_COMPETITIVENESS),
    };

    let margins = recent_margins(history);
    let trend_change = match margins.as_slice() {
        [(newest, newest_party), (previous, _), ..] => {
            let shrink = previous - newest;
            // A shrinking margin only helps the target party when the seat
            // is held by someone else.
            if party_matches(*newest_party, &rules.target_party) {
                -shrink
            } else {
                shrink
            }
        }
        _ => 0.0,
    };

    OpportunityMetrics {
        avg_margin,
        trend_change,
        competitiveness_score,
    }
}

/// The incumbent counts as running when they appear in the filing list,
/// either flagged as the incumbent or matched by name.
fn incumbent_is_running(filing: &DistrictFiling) -> bool {
    let incumbent = match &filing.incumbent {
        Some(i) => i,
        None => return false,
    };
    let needle = incumbent.name.to_lowercase();
    filing.candidates.iter().filter(|c| c.is_active()).any(|c| {
        let name = c.name.to_lowercase();
        c.incumbent || name.contains(&needle) || needle.contains(&name)
    })
}

fn has_target_candidate(filing: &DistrictFiling, rules: &ScoringRules) -> bool {
    filing
        .candidates
        .iter()
        .any(|c| c.is_active() && party_matches(c.party.as_deref(), &rules.target_party))
}

/// Stage 2: convert the metrics and the filing snapshot into bounded
/// factors. Pure and deterministic.
fn compute_factors(
    metrics: &OpportunityMetrics,
    filing: &DistrictFiling,
    rules: &ScoringRules,
) -> OpportunityFactors {
    let competitiveness = clamp01(metrics.competitiveness_score / 100.0);
    let margin_trend = clamp01(0.5 + metrics.trend_change / (2.0 * rules.trend_saturation));
    let incumbency = if incumbent_is_running(filing) { 0.5 } else { 1.0 };
    let candidate_presence = if has_target_candidate(filing, rules) {
        1.0
    } else {
        0.0
    };
    OpportunityFactors {
        competitiveness,
        margin_trend,
        incumbency,
        candidate_presence,
        open_seat_bonus: filing.incumbent.is_none(),
    }
}

/// Stage 3a: weighted sum of the four bounded factors, plus the open seat
/// bonus, rounded and clamped to [0, 100].
fn aggregate_score(
    factors: &OpportunityFactors,
    metrics: &OpportunityMetrics,
    rules: &ScoringRules,
) -> u8 {
    let w = &rules.weights;
    let mut raw = (w.competitiveness * factors.competitiveness
        + w.margin_trend * factors.margin_trend
        + w.incumbency * factors.incumbency
        + w.candidate_presence * factors.candidate_presence)
        * 100.0;
    if factors.open_seat_bonus && metrics.competitiveness_score > rules.open_seat_bonus_floor {
        raw = (raw + rules.open_seat_bonus_points).min(100.0);
    }
    raw.round().clamp(0.0, 100.0) as u8
}

/// Stage 3b: maps a score onto its band. Lower bounds are inclusive: a score
/// of exactly 70 is HIGH_OPPORTUNITY and exactly 50 is EMERGING. The
/// defensive override wins over any band and is applied last.
pub fn classify(score: u8, defensive: bool) -> Tier {
    if defensive {
        return Tier::Defensive;
    }
    if score >= TIER_HIGH {
        Tier::HighOpportunity
    } else if score >= TIER_EMERGING {
        Tier::Emerging
    } else if score >= TIER_BUILD {
        Tier::Build
    } else {
        Tier::NonCompetitive
    }
}

fn is_defended_by_target(filing: &DistrictFiling, rules: &ScoringRules) -> bool {
    filing
        .incumbent
        .as_ref()
        .map(|i| i.party.eq_ignore_ascii_case(&rules.target_party))
        .unwrap_or(false)
}

/// Stage 4a: projections of the scored state for downstream filtering.
fn derive_flags(score: u8, factors: &OpportunityFactors, tier: Tier) -> OpportunityFlags {
    let has_democrat = factors.candidate_presence == 1.0;
    OpportunityFlags {
        needs_candidate: score >= TIER_EMERGING && !has_democrat,
        open_seat: factors.open_seat_bonus,
        trending_dem: factors.margin_trend > 0.5,
        defensive: tier == Tier::Defensive,
        has_democrat,
    }
}

/// Stage 4b: the strategic recommendation for a district, keyed on the
/// classified tier, whether the district still needs a candidate and whether
/// the seat has no incumbent on record. The match is total so that every
/// reachable combination yields a string.
pub fn recommend(tier: Tier, needs_candidate: bool, open_seat: bool) -> &'static str {
    match (tier, needs_candidate, open_seat) {
        (Tier::Defensive, true, _) => {
            "Protect seat - incumbent has not filed, confirm re-election plans"
        }
        (Tier::Defensive, false, _) => "Protect seat - ensure strong candidate and resources",
        (Tier::HighOpportunity, true, true) => "URGENT: Recruit candidate for high-value open seat",
        (Tier::HighOpportunity, true, false) => "URGENT: Recruit Democratic candidate immediately",
        (Tier::HighOpportunity, false, true) => {
            "High priority open seat - maximum resource investment"
        }
        (Tier::HighOpportunity, false, false) => "High priority - maximum resource investment",
        (Tier::Emerging, true, true) => "Open seat recruitment target - file a candidate early",
        (Tier::Emerging, true, false) => "Priority candidate recruitment target",
        (Tier::Emerging, false, true) => "Open seat opportunity - invest early",
        (Tier::Emerging, false, false) => "Winnable with strong campaign - invest resources",
        (Tier::Build, _, true) => "Long-term investment - open seat worth monitoring",
        (Tier::Build, _, false) => "Long-term investment - party building focus",
        (Tier::NonCompetitive, _, true) => "Low priority - monitor filing activity",
        (Tier::NonCompetitive, _, false) => "Low priority - minimal resources",
    }
}

/// Scores a single district.
///
/// The four stages run in order: metric extraction, factor calculation,
/// score aggregation with tier classification, then flag and recommendation
/// derivation. Deterministic for identical inputs.
pub fn score_district(
    district: u32,
    history: &DistrictHistory,
    filing: &DistrictFiling,
    rules: &ScoringRules,
) -> DistrictOpportunity {
    let metrics = extract_metrics(history, rules);
    let factors = compute_factors(&metrics, filing, rules);
    let score = aggregate_score(&factors, &metrics, rules);
    let tier = classify(score, is_defended_by_target(filing, rules));
    let flags = derive_flags(score, &factors, tier);
    let recommendation = recommend(tier, flags.needs_candidate, flags.open_seat);
    debug!(
        "district {}: score {} tier {:?} factors {:?}",
        district, score, tier, factors
    );

    DistrictOpportunity {
        district,
        score,
        tier,
        factors: OpportunityFactors {
            competitiveness: round2(factors.competitiveness),
            margin_trend: round2(factors.margin_trend),
            incumbency: factors.incumbency,
            candidate_presence: factors.candidate_presence,
            open_seat_bonus: factors.open_seat_bonus,
        },
        metrics: OpportunityMetrics {
            avg_margin: round1(metrics.avg_margin),
            trend_change: round1(metrics.trend_change),
            competitiveness_score: metrics.competitiveness_score,
        },
        flags,
        recommendation,
    }
}

/// Scores every district present in both input maps.
///
/// Districts present in only one map are excluded from the output and
/// reported in `skipped`. A data problem with one district never aborts the
/// rest of the batch.
pub fn score_all(
    histories: &BTreeMap<u32, DistrictHistory>,
    filings: &BTreeMap<u32, DistrictFiling>,
    rules: &ScoringRules,
) -> Result<ChamberOpportunities, ScoringError> {
    rules.validate()?;
    info!(
        "Scoring {} filing records against {} history records, target party: {}",
        filings.len(),
        histories.len(),
        rules.target_party
    );

    let mut districts: Vec<DistrictOpportunity> = Vec::new();
    let mut skipped: Vec<SkippedDistrict> = Vec::new();
    for (&district, filing) in filings.iter() {
        match histories.get(&district) {
            Some(history) => districts.push(score_district(district, history, filing, rules)),
            None => {
                warn!(
                    "district {}: present in filings but missing from election history, skipping",
                    district
                );
                skipped.push(SkippedDistrict {
                    district,
                    error: ScoringError::MissingHistory { district },
                });
            }
        }
    }
    for &district in histories.keys() {
        if !filings.contains_key(&district) {
            warn!(
                "district {}: present in election history but missing from filings, skipping",
                district
            );
            skipped.push(SkippedDistrict {
                district,
                error: ScoringError::MissingFiling { district },
            });
        }
    }

    Ok(ChamberOpportunities { districts, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DistrictBuilder;

    fn rules() -> ScoringRules {
        ScoringRules::default_rules()
    }

    #[test]
    fn band_boundaries_are_inclusive() {
        assert_eq!(classify(100, false), Tier::HighOpportunity);
        assert_eq!(classify(70, false), Tier::HighOpportunity);
        assert_eq!(classify(69, false), Tier::Emerging);
        assert_eq!(classify(50, false), Tier::Emerging);
        assert_eq!(classify(49, false), Tier::Build);
        assert_eq!(classify(30, false), Tier::Build);
        assert_eq!(classify(29, false), Tier::NonCompetitive);
        assert_eq!(classify(0, false), Tier::NonCompetitive);
    }

    #[test]
    fn defensive_override_beats_any_score() {
        for score in [0, 29, 47, 69, 100] {
            assert_eq!(classify(score, true), Tier::Defensive);
        }
    }

    #[test]
    fn open_seat_without_history_scores_mid_range() {
        let opp = DistrictBuilder::new(7).score(&rules()).unwrap();
        assert_eq!(opp.factors.competitiveness, 0.5);
        assert_eq!(opp.factors.margin_trend, 0.5);
        assert_eq!(opp.factors.incumbency, 1.0);
        assert_eq!(opp.factors.candidate_presence, 0.0);
        assert!(opp.factors.open_seat_bonus);
        assert_eq!(opp.score, 63);
        assert_eq!(opp.tier, Tier::Emerging);
        assert!(opp.flags.open_seat);
        assert!(!opp.flags.trending_dem);
        assert_eq!(opp.flags.needs_candidate, opp.score >= 50);
    }

    #[test]
    fn unopposed_target_incumbent_is_defensive() {
        let opp = DistrictBuilder::new(3)
            .election(2020, 18.0, "Democratic", false)
            .election(2022, 24.0, "Democratic", false)
            .election(2024, 0.0, "Democratic", true)
            .competitiveness(20.0, 21.0)
            .incumbent("Grace Hollis", "Democratic")
            .candidate("Grace Hollis", Some("Democratic"))
            .score(&rules())
            .unwrap();
        assert_eq!(opp.tier, Tier::Defensive);
        assert!(opp.flags.defensive);
        assert!(opp.flags.has_democrat);
        assert!(!opp.flags.needs_candidate);
    }

    #[test]
    fn opposing_incumbent_is_never_defensive() {
        let opp = DistrictBuilder::new(3)
            .election(2022, 24.0, "Republican", false)
            .election(2024, 18.0, "Republican", false)
            .competitiveness(40.0, 21.0)
            .incumbent("Ray Cole", "Republican")
            .candidate("Ray Cole", Some("Republican"))
            .score(&rules())
            .unwrap();
        assert_ne!(opp.tier, Tier::Defensive);
        assert!(!opp.flags.defensive);
    }

    #[test]
    fn needs_candidate_implies_emerging_score_without_a_filer() {
        for comp in [5.0, 30.0, 55.0, 80.0, 95.0] {
            for has_dem in [false, true] {
                let mut b = DistrictBuilder::new(1)
                    .election(2022, 12.0, "Republican", false)
                    .election(2024, 8.0, "Republican", false)
                    .competitiveness(comp, 10.0)
                    .incumbent("Ray Cole", "Republican")
                    .candidate("Ray Cole", Some("Republican"));
                if has_dem {
                    b = b.candidate("Lena Park", Some("Democratic"));
                }
                let opp = b.score(&rules()).unwrap();
                assert_eq!(opp.flags.has_democrat, has_dem);
                if opp.flags.needs_candidate {
                    assert!(opp.score >= 50);
                    assert!(!opp.flags.has_democrat);
                }
            }
        }
    }

    #[test]
    fn identical_inputs_score_identically() {
        let build = || {
            DistrictBuilder::new(42)
                .election(2022, 9.5, "Republican", false)
                .election(2024, 4.1, "Republican", false)
                .competitiveness(80.0, 6.8)
                .candidate("Dana Whitfield", Some("Democratic"))
                .score(&rules())
                .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn trend_factor_is_monotonic_and_symmetric() {
        let r = rules();
        let factor = |trend: f64| {
            let metrics = OpportunityMetrics {
                avg_margin: 10.0,
                trend_change: trend,
                competitiveness_score: 50.0,
            };
            compute_factors(&metrics, &DistrictFiling::default(), &r).margin_trend
        };
        assert_eq!(factor(0.0), 0.5);
        assert_eq!(factor(30.0), 1.0);
        assert_eq!(factor(-30.0), 0.0);
        assert_eq!(factor(60.0), 1.0);
        assert_eq!(factor(-60.0), 0.0);
        let mut last = factor(-80.0);
        for i in -7..=8 {
            let f = factor(i as f64 * 10.0);
            assert!(f >= last);
            last = f;
        }
        for t in [2.5, 10.0, 25.0, 40.0] {
            assert!((factor(t) + factor(-t) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn uncontested_race_counts_as_full_sweep() {
        let opp = DistrictBuilder::new(9)
            .election(2022, 30.0, "Republican", false)
            .election(2024, 0.0, "Republican", true)
            .competitiveness(10.0, 30.0)
            .incumbent("Saul Brand", "Republican")
            .score(&rules())
            .unwrap();
        // A 30-point margin became an uncontested sweep: 70 points away from
        // the target party.
        assert_eq!(opp.metrics.trend_change, -70.0);
        assert_eq!(opp.factors.margin_trend, 0.0);
        assert!(!opp.flags.trending_dem);
    }

    #[test]
    fn growing_margin_for_target_held_seat_reads_favorable() {
        let opp = DistrictBuilder::new(5)
            .election(2022, 4.0, "Democratic", false)
            .election(2024, 10.0, "Democratic", false)
            .competitiveness(80.0, 7.0)
            .incumbent("June Ashby", "Democratic")
            .score(&rules())
            .unwrap();
        assert_eq!(opp.metrics.trend_change, 6.0);
        assert!(opp.flags.trending_dem);
    }

    #[test]
    fn scores_stay_in_bounds_for_extreme_inputs() {
        for comp in [0.0, 100.0] {
            for (m_old, m_new) in [(100.0, 0.5), (0.5, 100.0)] {
                let opp = DistrictBuilder::new(11)
                    .election(2022, m_old, "Republican", false)
                    .election(2024, m_new, "Republican", false)
                    .competitiveness(comp, 20.0)
                    .candidate("Iris Quinn", Some("Democratic"))
                    .score(&rules())
                    .unwrap();
                assert!(opp.score <= 100);
                assert!(Tier::ALL.contains(&opp.tier));
            }
        }
    }

    #[test]
    fn district_missing_from_history_is_skipped_not_fatal() {
        let mut histories: BTreeMap<u32, DistrictHistory> = BTreeMap::new();
        histories.insert(1, DistrictHistory::default());
        let mut filings: BTreeMap<u32, DistrictFiling> = BTreeMap::new();
        filings.insert(1, DistrictFiling::default());
        filings.insert(2, DistrictFiling::default());

        let res = score_all(&histories, &filings, &rules()).unwrap();
        assert_eq!(res.districts.len(), 1);
        assert_eq!(res.districts[0].district, 1);
        assert_eq!(
            res.skipped,
            vec![SkippedDistrict {
                district: 2,
                error: ScoringError::MissingHistory { district: 2 },
            }]
        );
    }

    #[test]
    fn withdrawn_candidates_do_not_count_as_presence() {
        let mut filing = DistrictFiling::default();
        filing.candidates.push(FiledCandidate {
            name: "Omar Reyes".to_string(),
            party: Some("Democratic".to_string()),
            status: FilingStatus::Withdrawn,
            filing_date: None,
            source: None,
            report_id: None,
            incumbent: false,
        });
        let opp = score_district(8, &DistrictHistory::default(), &filing, &rules());
        assert_eq!(opp.factors.candidate_presence, 0.0);
        assert!(!opp.flags.has_democrat);
    }

    #[test]
    fn every_tier_combination_has_a_recommendation() {
        for tier in Tier::ALL {
            for needs_candidate in [false, true] {
                for open_seat in [false, true] {
                    assert!(!recommend(tier, needs_candidate, open_seat).is_empty());
                }
            }
        }
    }

    #[test]
    fn lopsided_weights_are_rejected() {
        let mut r = rules();
        r.weights.competitiveness = 0.9;
        let res = score_all(&BTreeMap::new(), &BTreeMap::new(), &r);
        assert!(matches!(res, Err(ScoringError::InvalidWeights { .. })));
    }
}
