// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One historical general-election result for a district.
///
/// In most cases, it is enough to use the higher-level builder API.
#[derive(PartialEq, Debug, Clone)]
pub struct ElectionRecord {
    pub year: u16,
    pub winner_name: Option<String>,
    pub winning_party: Option<String>,
    pub total_votes: u64,
    /// Winning margin over the runner-up, in percentage points.
    pub margin_pct: f64,
    pub margin_votes: i64,
    /// A single-candidate race. The trend computation treats an uncontested
    /// race as a 100-point sweep.
    pub uncontested: bool,
}

/// Precomputed competitiveness summary for a district, produced by the
/// election-history fetcher.
#[derive(PartialEq, Debug, Clone)]
pub struct CompetitivenessSummary {
    /// 0-100, with 100 being the most competitive.
    pub score: f64,
    /// Average margin of the recent contested races, in percentage points.
    pub avg_margin: f64,
    /// The district has been won by more than one party in recent cycles.
    pub has_swung: bool,
    pub contested_races: u32,
    /// The only party to have won the district recently, if there is one.
    pub dominant_party: Option<String>,
}

/// Everything known about a district's electoral past.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct DistrictHistory {
    pub elections: Vec<ElectionRecord>,
    /// Absent when the district has no history at all.
    pub competitiveness: Option<CompetitivenessSummary>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum FilingStatus {
    Filed,
    Declared,
    Withdrawn,
    Unknown,
}

/// A candidate as reported by the filing feed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FiledCandidate {
    pub name: String,
    pub party: Option<String>,
    pub status: FilingStatus,
    pub filing_date: Option<String>,
    pub source: Option<String>,
    pub report_id: Option<String>,
    /// Marked as the sitting incumbent by the filing feed.
    pub incumbent: bool,
}

impl FiledCandidate {
    /// A candidate stays on the board unless they pulled out of the race.
    pub fn is_active(&self) -> bool {
        self.status != FilingStatus::Withdrawn
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Incumbent {
    pub name: String,
    pub party: String,
}

/// The current filing snapshot for a district. No filing history is kept,
/// only the latest known state.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct DistrictFiling {
    pub candidates: Vec<FiledCandidate>,
    /// The seat holder on record, if any.
    pub incumbent: Option<Incumbent>,
}

// ******** Output data structures *********

/// Strategic classification of a district.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Tier {
    HighOpportunity,
    Emerging,
    Build,
    NonCompetitive,
    /// Held by the target party. This tier is an identity-based override,
    /// not a score band.
    Defensive,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::HighOpportunity,
        Tier::Emerging,
        Tier::Build,
        Tier::NonCompetitive,
        Tier::Defensive,
    ];

    /// Stable identifier used in the published data set.
    pub fn code(&self) -> &'static str {
        match self {
            Tier::HighOpportunity => "HIGH_OPPORTUNITY",
            Tier::Emerging => "EMERGING",
            Tier::Build => "BUILD",
            Tier::NonCompetitive => "NON_COMPETITIVE",
            Tier::Defensive => "DEFENSIVE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::HighOpportunity => "High Opportunity",
            Tier::Emerging => "Emerging",
            Tier::Build => "Build",
            Tier::NonCompetitive => "Non-Competitive",
            Tier::Defensive => "Defensive",
        }
    }
}

/// Raw numeric signals pulled out of a district's records.
#[derive(PartialEq, Debug, Clone)]
pub struct OpportunityMetrics {
    pub avg_margin: f64,
    /// Margin movement between the two most recent elections, in percentage
    /// points. Positive always means movement in the target party's favor.
    pub trend_change: f64,
    pub competitiveness_score: f64,
}

/// The bounded factors that feed the weighted score.
#[derive(PartialEq, Debug, Clone)]
pub struct OpportunityFactors {
    /// [0, 1]
    pub competitiveness: f64,
    /// [0, 1], 0.5 is neutral.
    pub margin_trend: f64,
    /// 1.0 for an open seat, 0.5 when the incumbent is running.
    pub incumbency: f64,
    /// 1.0 iff the target party has an active filer.
    pub candidate_presence: f64,
    /// The district has no incumbent on record at all.
    pub open_seat_bonus: bool,
}

/// Booleans for filtering and highlighting downstream. Projections of the
/// scored state, never inputs to it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OpportunityFlags {
    pub needs_candidate: bool,
    pub open_seat: bool,
    pub trending_dem: bool,
    pub defensive: bool,
    pub has_democrat: bool,
}

/// The scored record for one district, rebuilt whole on every run.
#[derive(PartialEq, Debug, Clone)]
pub struct DistrictOpportunity {
    pub district: u32,
    /// Always an integer in [0, 100].
    pub score: u8,
    pub tier: Tier,
    pub factors: OpportunityFactors,
    pub metrics: OpportunityMetrics,
    pub flags: OpportunityFlags,
    pub recommendation: &'static str,
}

/// The outcome of scoring one chamber.
#[derive(PartialEq, Debug, Clone)]
pub struct ChamberOpportunities {
    pub districts: Vec<DistrictOpportunity>,
    /// Districts excluded from the output, with the reason.
    pub skipped: Vec<SkippedDistrict>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SkippedDistrict {
    pub district: u32,
    pub error: ScoringError,
}

/// Errors that exclude a district from scoring or reject a whole run.
#[derive(PartialEq, Debug, Clone)]
pub enum ScoringError {
    /// The district has a filing record but no election-history record.
    MissingHistory { district: u32 },
    /// The district has an election-history record but no filing record.
    MissingFiling { district: u32 },
    /// The factor weights do not sum to 1.
    InvalidWeights { sum: f64 },
}

impl Error for ScoringError {}

impl Display for ScoringError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringError::MissingHistory { district } => {
                write!(f, "district {}: no election history record", district)
            }
            ScoringError::MissingFiling { district } => {
                write!(f, "district {}: no candidate filing record", district)
            }
            ScoringError::InvalidWeights { sum } => {
                write!(f, "factor weights must sum to 1.0, got {}", sum)
            }
        }
    }
}

// ********* Configuration **********

/// Relative weight of each bounded factor in the final score. The four
/// weights must sum to 1.0.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct FactorWeights {
    pub competitiveness: f64,
    pub margin_trend: f64,
    pub incumbency: f64,
    pub candidate_presence: f64,
}

impl FactorWeights {
    pub const DEFAULT: FactorWeights = FactorWeights {
        competitiveness: 0.40,
        margin_trend: 0.25,
        incumbency: 0.20,
        candidate_presence: 0.15,
    };

    pub fn sum(&self) -> f64 {
        self.competitiveness + self.margin_trend + self.incumbency + self.candidate_presence
    }
}

/// The knobs that govern a scoring run.
#[derive(PartialEq, Debug, Clone)]
pub struct ScoringRules {
    /// The party from whose perspective opportunity is computed.
    pub target_party: String,
    pub weights: FactorWeights,
    /// Points added when a district has no incumbent on record.
    pub open_seat_bonus_points: f64,
    /// Competitiveness score a district must exceed to receive the open seat
    /// bonus.
    pub open_seat_bonus_floor: f64,
    /// Points of margin movement at which the trend factor saturates.
    pub trend_saturation: f64,
}

impl ScoringRules {
    pub fn default_rules() -> ScoringRules {
        ScoringRules {
            target_party: "Democratic".to_string(),
            weights: FactorWeights::DEFAULT,
            open_seat_bonus_points: 10.0,
            open_seat_bonus_floor: 30.0,
            trend_saturation: 30.0,
        }
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(ScoringError::InvalidWeights { sum });
        }
        Ok(())
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        ScoringRules::default_rules()
    }
}
