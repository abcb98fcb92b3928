/*!

This is the long-form manual for `opportunity_scoring` and `oppscore`.

## Input files

The program reads two JSON files, both keyed by chamber (`house`, `senate`)
and then by district number written as a string.

### Election history

Produced by the election-history fetcher. Per district: a map from election
year to result, plus a precomputed competitiveness summary.

```text
{
  "lastUpdated": "2026-07-28T14:02:11Z",
  "house": {
    "17": {
      "elections": {
        "2024": {
          "totalVotes": 16102,
          "winner": { "name": "Anna Price", "party": "Democratic",
                      "votes": 8712, "percentage": 54.1 },
          "margin": 8.2,
          "marginVotes": 1320,
          "uncontested": false
        }
      },
      "competitiveness": {
        "score": 80, "avgMargin": 10.3, "hasSwung": false,
        "contestedRaces": 2, "dominantParty": "Democratic"
      }
    }
  },
  "senate": { ... }
}
```

Unknown fields are ignored. A district with an empty `elections` map and no
`competitiveness` summary is still scored, using neutral midpoints for the
missing signals.

### Candidate filings

Produced by the filing fetcher. Per district: the current list of filed
candidates and the seat holder on record. This file is a snapshot; the
program does not track filing history.

```text
{
  "lastUpdated": "2026-08-01T09:30:00Z",
  "house": {
    "17": {
      "candidates": [
        { "name": "Anna Price", "party": "Democratic", "status": "filed",
          "filingDate": "2026-03-16", "source": "scvotes",
          "reportId": "H017-2026", "isIncumbent": true }
      ],
      "incumbent": { "name": "Anna Price", "party": "Democratic" }
    }
  },
  "senate": { ... }
}
```

Recognized `status` values are `filed`, `declared` (or `announced`) and
`withdrawn` (or `disqualified`); anything else reads as unknown. Withdrawn
candidates stay in the list but no longer count toward candidate presence.

## Output

One record per district, keyed like the inputs, with a top-level
`lastUpdated` timestamp for the whole batch:

```text
{
  "districtNumber": 17,
  "opportunityScore": 68,
  "tier": "DEFENSIVE",
  "tierLabel": "Defensive",
  "factors": { "competitiveness": 0.8, "marginTrend": 0.43,
               "incumbency": 0.5, "candidatePresence": 1.0,
               "openSeatBonus": false },
  "metrics": { "avgMargin": 10.3, "trendChange": -4.2,
               "competitivenessScore": 80.0 },
  "flags": { "needsCandidate": false, "openSeat": false,
             "trendingDem": false, "defensive": true, "hasDemocrat": true },
  "recommendation": "Protect seat - ensure strong candidate and resources"
}
```

`tier` is always one of `HIGH_OPPORTUNITY`, `EMERGING`, `BUILD`,
`NON_COMPETITIVE` and `DEFENSIVE`, so consumers can switch on it without a
default case. The whole output is rebuilt on every run; consumers must treat
it as a full-replacement snapshot.

A district present in only one of the two input files is excluded from the
output with a logged warning. The run itself keeps going and scores all the
other districts.

## Scoring

The score is a weighted sum of four bounded factors (competitiveness 0.40,
margin trend 0.25, incumbency 0.20, candidate presence 0.15), scaled to
0-100, with a 10-point bonus for seats with no incumbent on record in
districts that are at least somewhat competitive. Score bands map onto tiers
(70 and up is high opportunity, 50-69 emerging, 30-49 build, below 30
non-competitive); a district whose incumbent belongs to the target party is
always classified `DEFENSIVE`, whatever its numeric score.

*/
