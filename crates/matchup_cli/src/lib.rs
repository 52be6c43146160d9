//! Matchup CLI Library
//!
//! CSV (matchup statistics) → MessagePack → LZ4 → SHA256 checksum pipeline,
//! plus the text rendering used by the `matchup` binary.

use anyhow::{Context, Result};
use matchup_core::{
    BatterReport, MatchupStatsTable, Phase, PredictionResult, RankedEntry, StatsCachePayload,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Stats cache metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Schema version (e.g. "v1")
    pub schema_version: String,
    /// SHA256 of the compressed file (hex)
    pub checksum: String,
    /// RFC3339 creation time
    pub created_at: String,
    /// MessagePack size before compression (bytes)
    pub original_size: u64,
    /// Compressed size (bytes)
    pub compressed_size: u64,
    /// compressed / original
    pub compression_ratio: f64,
    /// Rows written to the cache
    pub rows: u64,
    /// CSV rows skipped as unparseable
    pub skipped_rows: u64,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Build the compressed stats cache from the statistics CSV
///
/// Pipeline: CSV → rows → MessagePack → LZ4 → Binary file
///
/// # Arguments
///
/// * `csv_path` - Input CSV (`data_with_features.csv`)
/// * `output_msgpack_lz4` - Output binary file
/// * `schema_version` - Schema version string
///
/// # Returns
///
/// Cache metadata including checksum, sizes, compression ratio
pub fn build_stats_cache(
    csv_path: &Path,
    output_msgpack_lz4: &Path,
    schema_version: &str,
) -> Result<CacheMetadata> {
    // 1. Parse CSV
    let (table, stats) = MatchupStatsTable::load_csv(csv_path)
        .with_context(|| format!("Failed to load stats CSV: {}", csv_path.display()))?;

    let payload = StatsCachePayload {
        schema_version: schema_version.to_string(),
        rows: table.into_rows(),
    };

    // 2. Serialize to MessagePack
    let msgpack_bytes =
        rmp_serde::to_vec(&payload).context("Failed to serialize stats rows to MessagePack")?;
    let original_size = msgpack_bytes.len() as u64;

    // 3. LZ4 compression (size-prepended)
    let compressed = lz4_flex::compress_prepend_size(&msgpack_bytes);
    let compressed_size = compressed.len() as u64;

    // 4. Checksum
    let checksum = sha256_hex(&compressed);

    // 5. Write
    if let Some(parent) = output_msgpack_lz4.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    fs::write(output_msgpack_lz4, &compressed).with_context(|| {
        format!(
            "Failed to write output file: {}",
            output_msgpack_lz4.display()
        )
    })?;

    let compression_ratio = compressed_size as f64 / original_size as f64;

    log::info!(
        "Stats cache built: {} → {} (ratio: {:.2}%)",
        human_bytes(original_size),
        human_bytes(compressed_size),
        compression_ratio * 100.0
    );

    Ok(CacheMetadata {
        schema_version: schema_version.to_string(),
        checksum,
        created_at: chrono::Utc::now().to_rfc3339(),
        original_size,
        compressed_size,
        compression_ratio,
        rows: payload.rows.len() as u64,
        skipped_rows: u64::from(stats.failed),
    })
}

/// Verify a cache file against its recorded SHA256 checksum
pub fn verify_stats_cache(cache_file: &Path, expected_checksum: &str) -> Result<bool> {
    let bytes = fs::read(cache_file)
        .with_context(|| format!("Failed to read cache file: {}", cache_file.display()))?;

    Ok(sha256_hex(&bytes).eq_ignore_ascii_case(expected_checksum.trim()))
}

/// Human-readable byte size formatting
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}

pub fn render_prediction(
    result: &PredictionResult,
    batter: &str,
    bowler: &str,
    phase: Phase,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{batter} vs {bowler} ({phase})");
    let _ = writeln!(out, "---");
    let _ = write!(out, "{}", result.verdict(batter, bowler));
    out
}

fn render_ranking<T: std::fmt::Display>(
    out: &mut String,
    title: &str,
    entries: &[RankedEntry<T>],
) {
    let _ = writeln!(out, "{title}");
    if entries.is_empty() {
        let _ = writeln!(out, "  (no data)");
        return;
    }
    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    for (rank, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {:<width$}  {}",
            rank + 1,
            entry.name,
            entry.value,
            width = width
        );
    }
}

pub fn render_report(report: &BatterReport) -> String {
    let mut out = String::new();
    render_ranking(
        &mut out,
        &format!("Most dismissals of {}", report.batter),
        &report.top_dismissers,
    );
    out.push('\n');
    render_ranking(
        &mut out,
        &format!("Highest strike rate of {}", report.batter),
        &report.fastest_scoring,
    );
    out.push('\n');
    render_ranking(&mut out, "Deadliest bowlers overall", &report.deadliest_bowlers);
    out
}

pub fn render_options(table: &MatchupStatsTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Batters ({}):", table.batters().len());
    for name in table.batters() {
        let _ = writeln!(out, "  {name}");
    }
    let _ = writeln!(out, "Bowlers ({}):", table.bowlers().len());
    for name in table.bowlers() {
        let _ = writeln!(out, "  {name}");
    }
    let phases: Vec<&str> = Phase::ALL.iter().map(Phase::as_str).collect();
    let _ = writeln!(out, "Phases: {}", phases.join(", "));
    out
}

/// One-line-per-field summary printed after `build-cache`.
pub fn render_cache_summary(meta: &CacheMetadata, out_path: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "stats cache {} written to {}",
        meta.schema_version,
        out_path.display()
    );
    let _ = writeln!(out, "  rows     {} ({} skipped)", meta.rows, meta.skipped_rows);
    let _ = writeln!(
        out,
        "  size     {} -> {} ({:.1}%)",
        human_bytes(meta.original_size),
        human_bytes(meta.compressed_size),
        meta.compression_ratio * 100.0
    );
    let _ = writeln!(out, "  sha256   {}", meta.checksum);
    let _ = writeln!(out, "  created  {}", meta.created_at);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchup_core::{load_stats_cache, History, MatchupRow};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn stats_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "batsman,bowler,dismissal_count,strike_rate_vs_bowler").unwrap();
        for i in 0..200 {
            writeln!(file, "Batter {},Bowler {},{},{}.5", i % 7, i % 11, i % 4, 100 + i).unwrap();
        }
        writeln!(file, "Broken,Row,not-a-number,1").unwrap();
        file
    }

    #[test]
    fn test_build_and_verify_cache() -> Result<()> {
        let csv = stats_csv();
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("nested/stats.v1.msgpack.lz4");

        let metadata = build_stats_cache(csv.path(), &output, "v1")?;

        assert_eq!(metadata.schema_version, "v1");
        assert_eq!(metadata.rows, 200);
        assert_eq!(metadata.skipped_rows, 1);
        assert!(metadata.compressed_size < metadata.original_size);
        assert!(verify_stats_cache(&output, &metadata.checksum)?);
        assert!(verify_stats_cache(&output, &metadata.checksum.to_uppercase())?);

        // Row order survives the round trip
        let (from_csv, _) = MatchupStatsTable::load_csv(csv.path())?;
        let from_cache = load_stats_cache(&output)?;
        assert_eq!(from_cache.rows(), from_csv.rows());

        Ok(())
    }

    #[test]
    fn test_verify_detects_tampering() -> Result<()> {
        let csv = stats_csv();
        let output = NamedTempFile::new()?;
        let metadata = build_stats_cache(csv.path(), output.path(), "v1")?;

        let mut bytes = fs::read(output.path())?;
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(output.path(), bytes)?;

        assert!(!verify_stats_cache(output.path(), &metadata.checksum)?);
        Ok(())
    }

    #[test]
    fn test_build_fails_on_missing_csv() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_stats_cache(
            &dir.path().join("absent.csv"),
            &dir.path().join("out.lz4"),
            "v1",
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("absent.csv"));
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(512), "512.00 B");
        assert_eq!(human_bytes(2048), "2.00 KB");
        assert_eq!(human_bytes(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_render_report() {
        let table = MatchupStatsTable::from_rows(vec![
            MatchupRow::new("A", "B1", 5, Some(80.0)),
            MatchupRow::new("A", "B2", 9, None),
        ]);
        let text = render_report(&BatterReport::build(&table, "A"));

        assert!(text.contains("Most dismissals of A"));
        assert!(text.contains(" 1. B2  9"));
        assert!(text.contains(" 1. B1  80"));
        assert!(text.contains("Deadliest bowlers overall"));
    }

    #[test]
    fn test_render_prediction_and_options() {
        let table = MatchupStatsTable::from_rows(vec![MatchupRow::new("A", "B", 1, None)]);
        let options = render_options(&table);
        assert!(options.contains("Batters (1):\n  A\n"));
        assert!(options.contains("Phases: Powerplay, Middle, Death"));

        let result = PredictionResult {
            label: 1,
            probability: 0.8,
            features: matchup_core::FeatureVector::new(0, 0, 0, 1, 0.0),
            history: History::Observed,
        };
        let text = render_prediction(&result, "A", "B", Phase::Death);
        assert!(text.starts_with("A vs B (Death)\n---\nLikely Wicket!"));
        assert!(text.ends_with("Chance: 80.00%"));
    }

    #[test]
    fn test_render_cache_summary() {
        let meta = CacheMetadata {
            schema_version: "v1".to_string(),
            checksum: "ab12".to_string(),
            created_at: "2024-04-01T00:00:00+00:00".to_string(),
            original_size: 2048,
            compressed_size: 512,
            compression_ratio: 0.25,
            rows: 40,
            skipped_rows: 2,
        };
        let text = render_cache_summary(&meta, Path::new("out/stats.lz4"));

        assert!(text.starts_with("stats cache v1 written to out/stats.lz4\n"));
        assert!(text.contains("  rows     40 (2 skipped)\n"));
        assert!(text.contains("  size     2.00 KB -> 512.00 B (25.0%)\n"));
        assert!(text.contains("  sha256   ab12\n"));
        assert!(text.is_ascii());
    }
}
