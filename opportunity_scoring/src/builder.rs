pub use crate::config::*;
use crate::score_district;

/// Assembles the inputs for one district and scores them in place.
///
/// Using the builder should be considered for programmatic use and tests;
/// batch runs over whole chambers go through [`crate::score_all`].
///
/// ```
/// use opportunity_scoring::builder::DistrictBuilder;
/// use opportunity_scoring::{ScoringRules, Tier};
///
/// let opp = DistrictBuilder::new(12)
///     .election(2022, 14.0, "Republican", false)
///     .election(2024, 9.0, "Republican", false)
///     .competitiveness(80.0, 11.5)
///     .candidate("Jane Doe", Some("Democratic"))
///     .score(&ScoringRules::default_rules())?;
///
/// assert!(opp.score <= 100);
/// assert_ne!(opp.tier, Tier::Defensive);
/// # Ok::<(), opportunity_scoring::ScoringError>(())
/// ```
pub struct DistrictBuilder {
    district: u32,
    history: DistrictHistory,
    filing: DistrictFiling,
}

impl DistrictBuilder {
    pub fn new(district: u32) -> DistrictBuilder {
        DistrictBuilder {
            district,
            history: DistrictHistory::default(),
            filing: DistrictFiling::default(),
        }
    }

    /// Adds one historical result. Elections may be added in any order.
    pub fn election(
        mut self,
        year: u16,
        margin_pct: f64,
        winning_party: &str,
        uncontested: bool,
    ) -> DistrictBuilder {
        self.history.elections.push(ElectionRecord {
            year,
            winner_name: None,
            winning_party: Some(winning_party.to_string()),
            total_votes: 0,
            margin_pct,
            margin_votes: 0,
            uncontested,
        });
        self
    }

    /// Sets the precomputed competitiveness summary.
    pub fn competitiveness(mut self, score: f64, avg_margin: f64) -> DistrictBuilder {
        let contested_races = self
            .history
            .elections
            .iter()
            .filter(|e| !e.uncontested)
            .count() as u32;
        self.history.competitiveness = Some(CompetitivenessSummary {
            score,
            avg_margin,
            has_swung: false,
            contested_races,
            dominant_party: None,
        });
        self
    }

    /// Adds a filed candidate. Use `None` for an unknown party.
    pub fn candidate(mut self, name: &str, party: Option<&str>) -> DistrictBuilder {
        self.filing.candidates.push(FiledCandidate {
            name: name.to_string(),
            party: party.map(|p| p.to_string()),
            status: FilingStatus::Filed,
            filing_date: None,
            source: None,
            report_id: None,
            incumbent: false,
        });
        self
    }

    /// Sets the seat holder on record.
    pub fn incumbent(mut self, name: &str, party: &str) -> DistrictBuilder {
        self.filing.incumbent = Some(Incumbent {
            name: name.to_string(),
            party: party.to_string(),
        });
        self
    }

    pub fn score(self, rules: &ScoringRules) -> Result<DistrictOpportunity, ScoringError> {
        rules.validate()?;
        Ok(score_district(
            self.district,
            &self.history,
            &self.filing,
            rules,
        ))
    }
}
