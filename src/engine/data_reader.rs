use crate::engine::*;

use log::warn;
use opportunity_scoring::{
    CompetitivenessSummary, DistrictFiling, DistrictHistory, ElectionRecord, FiledCandidate,
    FilingStatus, Incumbent,
};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use std::collections::{BTreeMap, HashMap};
use std::fs;

// The raw records mirror the input files field for field. Validation into
// the library types happens per district, so that one malformed record only
// drops that district from the run.

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionsFile {
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<String>,
    pub source: Option<String>,
    pub years: Option<Vec<u16>>,
    pub house: Option<HashMap<String, RawDistrictHistory>>,
    pub senate: Option<HashMap<String, RawDistrictHistory>>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RawDistrictHistory {
    pub elections: Option<HashMap<String, RawElectionResult>>,
    pub competitiveness: Option<RawCompetitiveness>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RawElectionResult {
    pub winner: Option<RawWinner>,
    #[serde(rename = "totalVotes")]
    pub total_votes: Option<u64>,
    pub margin: Option<f64>,
    #[serde(rename = "marginVotes")]
    pub margin_votes: Option<i64>,
    pub uncontested: Option<bool>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RawWinner {
    pub name: Option<String>,
    pub party: Option<String>,
    pub votes: Option<u64>,
    pub percentage: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RawCompetitiveness {
    pub score: Option<f64>,
    #[serde(rename = "avgMargin")]
    pub avg_margin: Option<f64>,
    #[serde(rename = "hasSwung")]
    pub has_swung: Option<bool>,
    #[serde(rename = "contestedRaces")]
    pub contested_races: Option<u32>,
    #[serde(rename = "dominantParty")]
    pub dominant_party: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CandidatesFile {
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<String>,
    pub source: Option<String>,
    pub house: Option<HashMap<String, RawDistrictFiling>>,
    pub senate: Option<HashMap<String, RawDistrictFiling>>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RawDistrictFiling {
    pub candidates: Option<Vec<RawCandidate>>,
    pub incumbent: Option<RawIncumbent>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RawCandidate {
    pub name: Option<String>,
    pub party: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "filingDate")]
    pub filing_date: Option<String>,
    pub source: Option<String>,
    #[serde(rename = "reportId")]
    pub report_id: Option<String>,
    #[serde(rename = "isIncumbent")]
    pub is_incumbent: Option<bool>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RawIncumbent {
    pub name: Option<String>,
    pub party: Option<String>,
}

impl ElectionsFile {
    pub fn chamber(&self, chamber: &str) -> Option<&HashMap<String, RawDistrictHistory>> {
        match chamber {
            "house" => self.house.as_ref(),
            "senate" => self.senate.as_ref(),
            _ => None,
        }
    }
}

impl CandidatesFile {
    pub fn chamber(&self, chamber: &str) -> Option<&HashMap<String, RawDistrictFiling>> {
        match chamber {
            "house" => self.house.as_ref(),
            "senate" => self.senate.as_ref(),
            _ => None,
        }
    }
}

pub fn read_elections_file(path: &str) -> EngineResult<ElectionsFile> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}

pub fn read_candidates_file(path: &str) -> EngineResult<CandidatesFile> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}

fn parse_district_key(key: &str) -> EngineResult<u32> {
    match key.parse::<u32>() {
        Ok(x) if x > 0 => Ok(x),
        _ => whatever!("district key {:?} is not a positive number", key),
    }
}

pub fn parse_filing_status(status: Option<&str>) -> FilingStatus {
    match status.map(|s| s.to_lowercase()).as_deref() {
        Some("filed") => FilingStatus::Filed,
        Some("declared") | Some("announced") => FilingStatus::Declared,
        Some("withdrawn") | Some("disqualified") => FilingStatus::Withdrawn,
        _ => FilingStatus::Unknown,
    }
}

pub fn validate_history(district: u32, raw: &RawDistrictHistory) -> EngineResult<DistrictHistory> {
    let mut elections: Vec<ElectionRecord> = Vec::new();
    if let Some(map) = &raw.elections {
        for (year_s, r) in map.iter() {
            let year = match year_s.parse::<u16>() {
                Ok(y) => y,
                Err(_) => whatever!(
                    "district {}: election year {:?} is not a number",
                    district,
                    year_s
                ),
            };
            elections.push(ElectionRecord {
                year,
                winner_name: r.winner.as_ref().and_then(|w| w.name.clone()),
                winning_party: r.winner.as_ref().and_then(|w| w.party.clone()),
                total_votes: r.total_votes.unwrap_or(0),
                // A missing margin reads as out of reach, not as a dead heat.
                margin_pct: r.margin.unwrap_or(100.0),
                margin_votes: r.margin_votes.unwrap_or(0),
                uncontested: r.uncontested.unwrap_or(false),
            });
        }
    }

    let competitiveness = match &raw.competitiveness {
        None => None,
        Some(c) => {
            let score = match c.score {
                Some(s) => s,
                None => whatever!(
                    "district {}: competitiveness summary is missing its score",
                    district
                ),
            };
            Some(CompetitivenessSummary {
                score,
                avg_margin: c.avg_margin.unwrap_or(100.0),
                has_swung: c.has_swung.unwrap_or(false),
                contested_races: c.contested_races.unwrap_or(0),
                dominant_party: c.dominant_party.clone(),
            })
        }
    };

    Ok(DistrictHistory {
        elections,
        competitiveness,
    })
}

pub fn validate_filing(district: u32, raw: &RawDistrictFiling) -> EngineResult<DistrictFiling> {
    let mut candidates: Vec<FiledCandidate> = Vec::new();
    for rc in raw.candidates.as_deref().unwrap_or(&[]) {
        let name = match &rc.name {
            Some(n) if !n.is_empty() => n.clone(),
            _ => whatever!("district {}: filed candidate without a name", district),
        };
        candidates.push(FiledCandidate {
            name,
            party: rc.party.clone(),
            status: parse_filing_status(rc.status.as_deref()),
            filing_date: rc.filing_date.clone(),
            source: rc.source.clone(),
            report_id: rc.report_id.clone(),
            incumbent: rc.is_incumbent.unwrap_or(false),
        });
    }

    let incumbent = match &raw.incumbent {
        None => None,
        Some(ri) => match (&ri.name, &ri.party) {
            (Some(name), Some(party)) => Some(Incumbent {
                name: name.clone(),
                party: party.clone(),
            }),
            _ => whatever!(
                "district {}: incumbent record is missing name or party",
                district
            ),
        },
    };

    Ok(DistrictFiling {
        candidates,
        incumbent,
    })
}

pub fn validate_histories(
    chamber: &str,
    raw: Option<&HashMap<String, RawDistrictHistory>>,
) -> BTreeMap<u32, DistrictHistory> {
    let mut res: BTreeMap<u32, DistrictHistory> = BTreeMap::new();
    for (key, r) in raw.into_iter().flatten() {
        let validated =
            parse_district_key(key).and_then(|d| validate_history(d, r).map(|h| (d, h)));
        match validated {
            Ok((district, history)) => {
                res.insert(district, history);
            }
            Err(e) => warn!(
                "{} district {:?}: dropping malformed history record: {}",
                chamber, key, e
            ),
        }
    }
    res
}

pub fn validate_filings(
    chamber: &str,
    raw: Option<&HashMap<String, RawDistrictFiling>>,
) -> BTreeMap<u32, DistrictFiling> {
    let mut res: BTreeMap<u32, DistrictFiling> = BTreeMap::new();
    for (key, r) in raw.into_iter().flatten() {
        let validated = parse_district_key(key).and_then(|d| validate_filing(d, r).map(|f| (d, f)));
        match validated {
            Ok((district, filing)) => {
                res.insert(district, filing);
            }
            Err(e) => warn!(
                "{} district {:?}: dropping malformed filing record: {}",
                chamber, key, e
            ),
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filing_status_parsing_is_lenient() {
        assert_eq!(parse_filing_status(Some("Filed")), FilingStatus::Filed);
        assert_eq!(parse_filing_status(Some("declared")), FilingStatus::Declared);
        assert_eq!(
            parse_filing_status(Some("Disqualified")),
            FilingStatus::Withdrawn
        );
        assert_eq!(parse_filing_status(Some("pending")), FilingStatus::Unknown);
        assert_eq!(parse_filing_status(None), FilingStatus::Unknown);
    }

    #[test]
    fn summary_without_score_is_malformed() {
        let raw = RawDistrictHistory {
            elections: Some(HashMap::new()),
            competitiveness: Some(RawCompetitiveness {
                score: None,
                avg_margin: Some(12.0),
                has_swung: None,
                contested_races: None,
                dominant_party: None,
            }),
        };
        assert!(validate_history(2, &raw).is_err());
    }

    #[test]
    fn non_numeric_district_keys_are_dropped() {
        let mut raw: HashMap<String, RawDistrictHistory> = HashMap::new();
        raw.insert(
            "at-large".to_string(),
            RawDistrictHistory {
                elections: None,
                competitiveness: None,
            },
        );
        raw.insert(
            "3".to_string(),
            RawDistrictHistory {
                elections: None,
                competitiveness: None,
            },
        );
        let validated = validate_histories("house", Some(&raw));
        assert_eq!(validated.len(), 1);
        assert!(validated.contains_key(&3));
    }
}
