//! Descriptive rankings over the statistics table.
//!
//! Ties keep table order: the bowler seen first ranks first.

use crate::stats::{MatchupRow, MatchupStatsTable};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

pub const TOP_DISMISSERS_LIMIT: usize = 10;
pub const FASTEST_SCORING_LIMIT: usize = 10;
pub const DEADLIEST_BOWLERS_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry<T> {
    pub name: String,
    pub value: T,
}

impl<T> RankedEntry<T> {
    fn new(name: &str, value: T) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// Sum dismissals per bowler, keeping first-seen order before sorting.
fn dismissals_by_bowler<'a>(
    rows: impl Iterator<Item = &'a MatchupRow>,
    limit: usize,
) -> Vec<RankedEntry<u64>> {
    let mut position: FxHashMap<&str, usize> = FxHashMap::default();
    let mut totals: Vec<(&str, u64)> = Vec::new();

    for row in rows {
        let idx = *position.entry(row.bowler.as_str()).or_insert_with(|| {
            totals.push((row.bowler.as_str(), 0));
            totals.len() - 1
        });
        totals[idx].1 += u64::from(row.dismissal_count);
    }

    // Stable sort keeps first-seen order on ties
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals
        .into_iter()
        .take(limit)
        .map(|(name, value)| RankedEntry::new(name, value))
        .collect()
}

/// Bowlers who dismissed `batter` most often.
pub fn top_dismissers(
    table: &MatchupStatsTable,
    batter: &str,
    limit: usize,
) -> Vec<RankedEntry<u64>> {
    dismissals_by_bowler(table.rows_for_batter(batter), limit)
}

/// Bowlers `batter` scores fastest against, one entry per bowler.
///
/// Rows without a strike rate are ignored; a bowler appearing several times
/// keeps its highest strike rate (first row on equal rates).
pub fn fastest_scoring(
    table: &MatchupStatsTable,
    batter: &str,
    limit: usize,
) -> Vec<RankedEntry<f64>> {
    let mut rated: Vec<(&str, f64)> = table
        .rows_for_batter(batter)
        .filter_map(|r| r.strike_rate_vs_bowler.map(|sr| (r.bowler.as_str(), sr)))
        .collect();
    rated.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    rated
        .into_iter()
        .filter(|(bowler, _)| seen.insert(*bowler))
        .take(limit)
        .map(|(name, value)| RankedEntry::new(name, value))
        .collect()
}

/// Bowlers with the most dismissals across the whole table.
pub fn deadliest_bowlers(table: &MatchupStatsTable, limit: usize) -> Vec<RankedEntry<u64>> {
    dismissals_by_bowler(table.rows().iter(), limit)
}

/// Statistics of the governing row for a pair, for display.
pub fn matchup_summary<'a>(
    table: &'a MatchupStatsTable,
    batter: &str,
    bowler: &str,
) -> Option<&'a MatchupRow> {
    table.lookup(batter, bowler)
}

/// Everything the report view shows for one batter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatterReport {
    pub batter: String,
    pub top_dismissers: Vec<RankedEntry<u64>>,
    pub fastest_scoring: Vec<RankedEntry<f64>>,
    pub deadliest_bowlers: Vec<RankedEntry<u64>>,
}

impl BatterReport {
    pub fn build(table: &MatchupStatsTable, batter: &str) -> Self {
        Self {
            batter: batter.to_string(),
            top_dismissers: top_dismissers(table, batter, TOP_DISMISSERS_LIMIT),
            fastest_scoring: fastest_scoring(table, batter, FASTEST_SCORING_LIMIT),
            deadliest_bowlers: deadliest_bowlers(table, DEADLIEST_BOWLERS_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry<T>(name: &str, value: T) -> RankedEntry<T> {
        RankedEntry::new(name, value)
    }

    #[test]
    fn test_deadliest_bowlers_example() {
        let table = MatchupStatsTable::from_rows(vec![
            MatchupRow::new("X", "B1", 5, None),
            MatchupRow::new("Y", "B2", 9, None),
            MatchupRow::new("Z", "B3", 2, None),
        ]);

        assert_eq!(
            deadliest_bowlers(&table, 3),
            vec![entry("B2", 9), entry("B1", 5), entry("B3", 2)]
        );
    }

    #[test]
    fn test_dismissals_are_summed_across_batters() {
        let table = MatchupStatsTable::from_rows(vec![
            MatchupRow::new("X", "B1", 5, None),
            MatchupRow::new("Y", "B2", 4, None),
            MatchupRow::new("Z", "B2", 4, None),
            MatchupRow::new("Z", "B3", 1, None),
        ]);

        assert_eq!(
            deadliest_bowlers(&table, 2),
            vec![entry("B2", 8), entry("B1", 5)]
        );
    }

    #[test]
    fn test_top_dismissers_truncates_to_ten() {
        let rows: Vec<MatchupRow> = (0..15)
            .map(|i| MatchupRow::new("A", format!("B{i:02}"), i, Some(100.0)))
            .chain(std::iter::once(MatchupRow::new("Other", "B00", 50, None)))
            .collect();
        let table = MatchupStatsTable::from_rows(rows);

        let top = top_dismissers(&table, "A", TOP_DISMISSERS_LIMIT);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0], entry("B14", 14));
        assert_eq!(top[9], entry("B05", 5));
        assert!(top.windows(2).all(|w| w[0].value >= w[1].value));

        let unique: FxHashSet<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(unique.len(), 10);
    }

    #[test]
    fn test_ties_keep_first_occurrence() {
        let table = MatchupStatsTable::from_rows(vec![
            MatchupRow::new("A", "Late", 2, None),
            MatchupRow::new("A", "Early", 1, None),
            MatchupRow::new("A", "Early", 1, None),
        ]);

        assert_eq!(
            top_dismissers(&table, "A", 10),
            vec![entry("Late", 2), entry("Early", 2)]
        );
    }

    #[test]
    fn test_fastest_scoring_dedupes_and_skips_missing() {
        let table = MatchupStatsTable::from_rows(vec![
            MatchupRow::new("A", "B1", 0, Some(90.0)),
            MatchupRow::new("A", "B2", 0, None),
            MatchupRow::new("A", "B3", 0, Some(150.0)),
            MatchupRow::new("A", "B1", 0, Some(200.0)),
            MatchupRow::new("A", "B4", 0, Some(150.0)),
            MatchupRow::new("C", "B9", 0, Some(999.0)),
        ]);

        assert_eq!(
            fastest_scoring(&table, "A", 10),
            vec![entry("B1", 200.0), entry("B3", 150.0), entry("B4", 150.0)]
        );
    }

    #[test]
    fn test_unknown_batter_yields_empty_lists() {
        let table = MatchupStatsTable::from_rows(vec![MatchupRow::new("A", "B", 1, Some(1.0))]);
        let report = BatterReport::build(&table, "Nobody");

        assert!(report.top_dismissers.is_empty());
        assert!(report.fastest_scoring.is_empty());
        assert_eq!(report.deadliest_bowlers, vec![entry("B", 1)]);
    }

    #[test]
    fn test_matchup_summary() {
        let table = MatchupStatsTable::from_rows(vec![
            MatchupRow::new("A", "B", 3, Some(120.5)),
            MatchupRow::new("A", "B", 1, Some(60.0)),
        ]);
        assert_eq!(matchup_summary(&table, "A", "B").unwrap().dismissal_count, 3);
        assert!(matchup_summary(&table, "B", "A").is_none());
    }
}
