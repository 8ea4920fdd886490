//! CSV candle loading.
//!
//! Expected columns: `time,open,high,low,close`. Timestamps accept
//! `%Y-%m-%d %H:%M:%S` or RFC 3339; rows must already be in ascending time
//! order — the window constructor rejects anything else.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use sigscan_core::{Candle, CandleError, CandleWindow};

/// Errors raised while loading a candle file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error in `{path}`: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("bad timestamp `{value}` in `{path}` (row {row})")]
    BadTimestamp {
        path: String,
        row: usize,
        value: String,
    },
    #[error("invalid candle series in `{path}`: {source}")]
    Window {
        path: String,
        #[source]
        source: CandleError,
    },
}

/// One symbol's loaded window plus a fingerprint of the source bytes.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub symbol: String,
    pub window: CandleWindow,
    /// blake3 of the raw file contents; ties a report back to its input.
    pub source_hash: String,
}

#[derive(Debug, Deserialize)]
struct CandleRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

fn parse_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// Load a candle CSV, keeping at most the last `max_candles` rows.
pub fn load_candles_csv(
    symbol: &str,
    path: &Path,
    max_candles: Option<usize>,
) -> Result<Dataset, LoadError> {
    let display = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;
    let source_hash = blake3::hash(&bytes).to_hex().to_string();

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let mut candles = Vec::new();
    for (row, record) in reader.deserialize::<CandleRow>().enumerate() {
        let record = record.map_err(|source| LoadError::Csv {
            path: display.clone(),
            source,
        })?;
        let time = parse_time(&record.time).ok_or_else(|| LoadError::BadTimestamp {
            path: display.clone(),
            row: row + 2, // 1-based, after the header
            value: record.time.clone(),
        })?;
        candles.push(Candle {
            time,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
        });
    }

    if let Some(max) = max_candles {
        if candles.len() > max {
            candles.drain(..candles.len() - max);
        }
    }

    let window = CandleWindow::new(candles).map_err(|source| LoadError::Window {
        path: display,
        source,
    })?;
    Ok(Dataset {
        symbol: symbol.to_string(),
        window,
        source_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
time,open,high,low,close
2024-01-02 09:00:00,100.0,101.0,99.5,100.5
2024-01-02 09:05:00,100.5,101.5,100.0,101.0
2024-01-02 09:10:00,101.0,102.0,100.5,101.5
";

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_well_formed_csv() {
        let file = write_csv(SAMPLE);
        let dataset = load_candles_csv("BTCUSD", file.path(), None).unwrap();
        assert_eq!(dataset.symbol, "BTCUSD");
        assert_eq!(dataset.window.len(), 3);
        assert_eq!(dataset.window.last().close, 101.5);
        assert_eq!(dataset.source_hash.len(), 64);
    }

    #[test]
    fn truncates_to_max_candles() {
        let file = write_csv(SAMPLE);
        let dataset = load_candles_csv("BTCUSD", file.path(), Some(2)).unwrap();
        assert_eq!(dataset.window.len(), 2);
        // Keeps the most recent rows.
        assert_eq!(dataset.window.candles()[0].close, 101.0);
    }

    #[test]
    fn rejects_bad_timestamp() {
        let file = write_csv("time,open,high,low,close\nnot-a-time,1,2,0.5,1\n");
        let err = load_candles_csv("X", file.path(), None).unwrap_err();
        assert!(matches!(err, LoadError::BadTimestamp { row: 2, .. }));
    }

    #[test]
    fn rejects_out_of_order_rows() {
        let file = write_csv(
            "time,open,high,low,close\n\
             2024-01-02 09:05:00,100,101,99,100\n\
             2024-01-02 09:00:00,100,101,99,100\n",
        );
        let err = load_candles_csv("X", file.path(), None).unwrap_err();
        assert!(matches!(err, LoadError::Window { .. }));
    }

    #[test]
    fn accepts_rfc3339_timestamps() {
        let file = write_csv(
            "time,open,high,low,close\n\
             2024-01-02T09:00:00Z,100,101,99,100\n",
        );
        let dataset = load_candles_csv("X", file.path(), None).unwrap();
        assert_eq!(dataset.window.len(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err =
            load_candles_csv("X", Path::new("/nonexistent/candles.csv"), None).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
