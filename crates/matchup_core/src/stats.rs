//! Historical batter-versus-bowler statistics.
//!
//! Source artifact: `data_with_features.csv` with at least the columns
//! `batsman`, `bowler`, `dismissal_count`, `strike_rate_vs_bowler`.
//! Rows keep their file order; when a pair repeats, the first row wins.

use crate::error::ArtifactError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 4] = [
    "batsman",
    "bowler",
    "dismissal_count",
    "strike_rate_vs_bowler",
];

/// One row of the statistics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupRow {
    pub batsman: String,
    pub bowler: String,
    pub dismissal_count: u32,
    /// `None` when the source cell was empty or NaN.
    pub strike_rate_vs_bowler: Option<f64>,
}

impl MatchupRow {
    pub fn new(
        batsman: impl Into<String>,
        bowler: impl Into<String>,
        dismissal_count: u32,
        strike_rate_vs_bowler: Option<f64>,
    ) -> Self {
        Self {
            batsman: batsman.into(),
            bowler: bowler.into(),
            dismissal_count,
            strike_rate_vs_bowler,
        }
    }
}

/// Whether a lookup found historical data for the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum History {
    Observed,
    /// No row for the pair; the numeric features fell back to zero.
    ColdStart,
}

/// The two numeric features taken from the table for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchupHistory {
    pub dismissal_count: u32,
    pub strike_rate: f64,
    pub source: History,
}

impl MatchupHistory {
    pub const COLD_START: MatchupHistory = MatchupHistory {
        dismissal_count: 0,
        strike_rate: 0.0,
        source: History::ColdStart,
    };
}

/// CSV parsing statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub total_rows: u32,
    pub parsed: u32,
    pub failed: u32,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    batsman: String,
    bowler: String,
    dismissal_count: String,
    strike_rate_vs_bowler: String,
}

/// Read-only statistics table with a first-occurrence index per pair.
#[derive(Debug, Clone, Default)]
pub struct MatchupStatsTable {
    rows: Vec<MatchupRow>,
    /// batsman → bowler → index of the first matching row
    first_row: FxHashMap<String, FxHashMap<String, usize>>,
    /// batsman → row indices in table order
    batter_rows: FxHashMap<String, Vec<usize>>,
}

impl MatchupStatsTable {
    pub fn from_rows(rows: Vec<MatchupRow>) -> Self {
        let mut first_row: FxHashMap<String, FxHashMap<String, usize>> = FxHashMap::default();
        let mut batter_rows: FxHashMap<String, Vec<usize>> = FxHashMap::default();

        for (idx, row) in rows.iter().enumerate() {
            first_row
                .entry(row.batsman.clone())
                .or_default()
                .entry(row.bowler.clone())
                .or_insert(idx);
            batter_rows.entry(row.batsman.clone()).or_default().push(idx);
        }

        Self {
            rows,
            first_row,
            batter_rows,
        }
    }

    /// Parse CSV text. Rows that fail to parse are skipped and counted.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<(Self, ParseStats), ArtifactError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h.trim_start_matches('\u{feff}') == column) {
                return Err(ArtifactError::MissingColumn {
                    column: column.to_string(),
                });
            }
        }
        // Strip BOM so serde sees the plain column name
        let cleaned: csv::StringRecord = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}'))
            .collect();
        reader.set_headers(cleaned);

        let mut rows = Vec::new();
        let mut stats = ParseStats::default();

        for result in reader.deserialize::<RawRow>() {
            stats.total_rows += 1;
            let line = stats.total_rows + 1;

            let raw = match result {
                Ok(raw) => raw,
                Err(e) => {
                    stats.failed += 1;
                    log::warn!("Line {} - CSV parse error: {}", line, e);
                    continue;
                }
            };

            match parse_row(raw) {
                Ok(row) => {
                    rows.push(row);
                    stats.parsed += 1;
                }
                Err(reason) => {
                    stats.failed += 1;
                    log::warn!("Line {} - {}, skipping", line, reason);
                }
            }
        }

        Ok((Self::from_rows(rows), stats))
    }

    pub fn load_csv(path: &Path) -> Result<(Self, ParseStats), ArtifactError> {
        let file = std::fs::File::open(path).map_err(|e| ArtifactError::io(path, e))?;
        let (table, stats) = Self::from_csv_reader(file)?;

        if table.is_empty() {
            return Err(ArtifactError::EmptyTable {
                path: path.to_path_buf(),
            });
        }

        log::info!(
            "Loaded {} matchup rows from {} (failed: {}, total: {})",
            stats.parsed,
            path.display(),
            stats.failed,
            stats.total_rows
        );
        Ok((table, stats))
    }

    /// First row for the exact `(batsman, bowler)` pair.
    pub fn lookup(&self, batsman: &str, bowler: &str) -> Option<&MatchupRow> {
        let idx = *self.first_row.get(batsman)?.get(bowler)?;
        self.rows.get(idx)
    }

    /// Numeric features for a pair, zero when the pair has no history.
    pub fn history(&self, batsman: &str, bowler: &str) -> MatchupHistory {
        match self.lookup(batsman, bowler) {
            Some(row) => MatchupHistory {
                dismissal_count: row.dismissal_count,
                strike_rate: row.strike_rate_vs_bowler.unwrap_or(0.0),
                source: History::Observed,
            },
            None => MatchupHistory::COLD_START,
        }
    }

    /// Rows for one batter, in table order.
    pub fn rows_for_batter<'a>(&'a self, batsman: &str) -> impl Iterator<Item = &'a MatchupRow> {
        self.batter_rows
            .get(batsman)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.rows[idx])
    }

    /// Sorted, de-duplicated batter names.
    pub fn batters(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.rows.iter().map(|r| r.batsman.as_str()).collect();
        names.into_iter().map(str::to_string).collect()
    }

    /// Sorted, de-duplicated bowler names.
    pub fn bowlers(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.rows.iter().map(|r| r.bowler.as_str()).collect();
        names.into_iter().map(str::to_string).collect()
    }

    pub fn rows(&self) -> &[MatchupRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<MatchupRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_row(raw: RawRow) -> Result<MatchupRow, String> {
    if raw.batsman.is_empty() || raw.bowler.is_empty() {
        return Err("empty batsman or bowler".to_string());
    }

    // Names stay as written; only numeric cells are trimmed.
    // Exports may write integer counts as floats ("3.0")
    let count: f64 = raw
        .dismissal_count
        .trim()
        .parse()
        .map_err(|_| format!("invalid dismissal_count '{}'", raw.dismissal_count))?;
    if !count.is_finite() || count < 0.0 || count.fract() != 0.0 || count > u32::MAX as f64 {
        return Err(format!("invalid dismissal_count '{}'", raw.dismissal_count));
    }

    let strike_rate = parse_optional_rate(raw.strike_rate_vs_bowler.trim())
        .ok_or_else(|| format!("invalid strike_rate_vs_bowler '{}'", raw.strike_rate_vs_bowler))?;

    Ok(MatchupRow {
        batsman: raw.batsman,
        bowler: raw.bowler,
        dismissal_count: count as u32,
        strike_rate_vs_bowler: strike_rate,
    })
}

/// `Some(None)` for a missing cell, `None` for an invalid one.
fn parse_optional_rate(cell: &str) -> Option<Option<f64>> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Some(None);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(Some(v)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CSV: &str = "\
batsman,bowler,phase,dismissal_count,strike_rate_vs_bowler
A,B,Powerplay,3,120.5
A,C,Middle,1,
A,B,Death,7,90.0
D,B,Middle,2.0,NaN
";

    #[test]
    fn test_parse_csv_keeps_order_and_ignores_extra_columns() {
        let (table, stats) = MatchupStatsTable::from_csv_reader(CSV.as_bytes()).unwrap();

        assert_eq!(stats.total_rows, 4);
        assert_eq!(stats.parsed, 4);
        assert_eq!(stats.failed, 0);
        assert_eq!(table.len(), 4);
        assert_eq!(table.rows()[1], MatchupRow::new("A", "C", 1, None));
        assert_eq!(table.rows()[3], MatchupRow::new("D", "B", 2, None));
    }

    #[test]
    fn test_first_match_governs() {
        let (table, _) = MatchupStatsTable::from_csv_reader(CSV.as_bytes()).unwrap();

        let row = table.lookup("A", "B").unwrap();
        assert_eq!(row.dismissal_count, 3);
        assert_eq!(row.strike_rate_vs_bowler, Some(120.5));
    }

    #[test]
    fn test_history_defaults() {
        let (table, _) = MatchupStatsTable::from_csv_reader(CSV.as_bytes()).unwrap();

        assert_eq!(
            table.history("A", "B"),
            MatchupHistory {
                dismissal_count: 3,
                strike_rate: 120.5,
                source: History::Observed,
            }
        );

        // Matched row without a strike rate
        let partial = table.history("A", "C");
        assert_eq!(partial.strike_rate, 0.0);
        assert_eq!(partial.source, History::Observed);

        // Pair never seen (both names exist, just not together)
        assert_eq!(table.history("D", "C"), MatchupHistory::COLD_START);
        assert_eq!(table.history("Z", "B"), MatchupHistory::COLD_START);
    }

    #[test]
    fn test_lookup_is_exact_match() {
        let (table, _) = MatchupStatsTable::from_csv_reader(CSV.as_bytes()).unwrap();
        assert!(table.lookup("a", "B").is_none());
        assert!(table.lookup("A ", "B").is_none());
    }

    #[test]
    fn test_names_keep_whitespace_numbers_are_trimmed() {
        let csv = "batsman , bowler,dismissal_count,strike_rate_vs_bowler\nA ,B, 2 , 88.5 \n";
        let (table, stats) = MatchupStatsTable::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(stats.parsed, 1);
        assert_eq!(table.rows()[0], MatchupRow::new("A ", "B", 2, Some(88.5)));
        assert!(table.lookup("A", "B").is_none());
        assert_eq!(table.history("A ", "B").dismissal_count, 2);
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let csv = "\
batsman,bowler,dismissal_count,strike_rate_vs_bowler
A,B,-1,100
A,B,2.5,100
A,B,x,100
A,B,4,-3
A,B,5,80
";
        let (table, stats) = MatchupStatsTable::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(stats.total_rows, 5);
        assert_eq!(stats.parsed, 1);
        assert_eq!(stats.failed, 4);
        assert_eq!(table.lookup("A", "B").unwrap().dismissal_count, 5);
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let csv = "batsman,bowler,dismissal_count\nA,B,1\n";
        let err = MatchupStatsTable::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::MissingColumn { ref column } if column == "strike_rate_vs_bowler"
        ));
    }

    #[test]
    fn test_selection_lists_are_sorted_and_unique() {
        let (table, _) = MatchupStatsTable::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.batters(), vec!["A", "D"]);
        assert_eq!(table.bowlers(), vec!["B", "C"]);
    }

    #[test]
    fn test_rows_for_batter() {
        let (table, _) = MatchupStatsTable::from_csv_reader(CSV.as_bytes()).unwrap();
        let bowlers: Vec<&str> = table.rows_for_batter("A").map(|r| r.bowler.as_str()).collect();
        assert_eq!(bowlers, vec!["B", "C", "B"]);
        assert_eq!(table.rows_for_batter("nobody").count(), 0);
    }

    #[test]
    fn test_load_csv_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let (table, stats) = MatchupStatsTable::load_csv(file.path()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(stats.parsed, 4);
    }

    #[test]
    fn test_load_csv_without_valid_rows_fails() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"batsman,bowler,dismissal_count,strike_rate_vs_bowler\nA,B,x,1\n")
            .unwrap();

        let err = MatchupStatsTable::load_csv(file.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::EmptyTable { .. }));
    }
}
