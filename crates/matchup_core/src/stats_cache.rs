//! Compressed statistics cache loader.
//!
//! Format: LZ4 (size-prepended) + MessagePack(serde) of `StatsCachePayload`.
//! The builder lives in `matchup_cli`.

use crate::error::ArtifactError;
use crate::stats::{MatchupRow, MatchupStatsTable};
use lz4_flex::decompress_size_prepended;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialized body of the stats cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsCachePayload {
    pub schema_version: String,
    pub rows: Vec<MatchupRow>,
}

pub fn decode_stats_cache(lz4_bytes: &[u8]) -> Result<StatsCachePayload, ArtifactError> {
    let msgpack_bytes = decompress_size_prepended(lz4_bytes)?;
    Ok(rmp_serde::from_slice(&msgpack_bytes)?)
}

pub fn load_stats_cache(path: &Path) -> Result<MatchupStatsTable, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|e| ArtifactError::io(path, e))?;
    let payload = decode_stats_cache(&bytes)?;

    if payload.rows.is_empty() {
        return Err(ArtifactError::EmptyTable {
            path: path.to_path_buf(),
        });
    }

    log::info!(
        "Loaded {} matchup rows from stats cache {} (schema {})",
        payload.rows.len(),
        path.display(),
        payload.schema_version
    );
    Ok(MatchupStatsTable::from_rows(payload.rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(payload: &StatsCachePayload) -> Vec<u8> {
        let msgpack = rmp_serde::to_vec(payload).unwrap();
        lz4_flex::compress_prepend_size(&msgpack)
    }

    #[test]
    fn test_decode_preserves_rows() {
        let payload = StatsCachePayload {
            schema_version: "v1".to_string(),
            rows: vec![
                MatchupRow::new("A", "B", 3, Some(120.5)),
                MatchupRow::new("A", "C", 0, None),
            ],
        };

        let decoded = decode_stats_cache(&encode(&payload)).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_garbage_is_a_cache_error() {
        let err = decode_stats_cache(&[0x01, 0x02]).unwrap_err();
        assert!(matches!(err, ArtifactError::Cache(_)));
    }

    #[test]
    fn test_load_from_file_builds_index() {
        let payload = StatsCachePayload {
            schema_version: "v1".to_string(),
            rows: vec![MatchupRow::new("A", "B", 3, Some(120.5))],
        };
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), encode(&payload)).unwrap();

        let table = load_stats_cache(file.path()).unwrap();
        assert_eq!(table.lookup("A", "B").unwrap().dismissal_count, 3);
    }
}
