use std::cmp::Ordering;
use std::time::Duration;

use crate::error::{BenchError, ErrorCategory};

/// One benchmarked (codec, level, input) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub label: String,
    pub compress_time: Duration,
    pub decompress_time: Duration,
    pub compressed_size: u64,
    pub original_size: u64,
    pub file: String,
}

impl ResultRow {
    /// `compressed / original`; `None` for an empty input.
    pub fn ratio(&self) -> Option<f64> {
        (self.original_size != 0).then(|| self.compressed_size as f64 / self.original_size as f64)
    }

    /// Original bytes per second of compression time.
    pub fn compress_speed(&self) -> Option<f64> {
        speed(self.original_size, self.compress_time)
    }

    /// Original bytes per second of decompression time.
    pub fn decompress_speed(&self) -> Option<f64> {
        speed(self.original_size, self.decompress_time)
    }
}

fn speed(bytes: u64, time: Duration) -> Option<f64> {
    let secs = time.as_secs_f64();
    (secs > 0.0).then(|| bytes as f64 / secs)
}

/// Column a result table can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Algorithm label, ascending.
    Name,
    /// Compression time, slowest first.
    CompressTime,
    /// Decompression time, slowest first.
    DecompressTime,
    /// Compressed size, smallest first.
    CompressedSize,
    /// Original size, smallest first.
    OriginalSize,
}

impl SortKey {
    fn compare(self, a: &ResultRow, b: &ResultRow) -> Ordering {
        match self {
            SortKey::Name => a.label.cmp(&b.label),
            SortKey::CompressTime => b.compress_time.cmp(&a.compress_time),
            SortKey::DecompressTime => b.decompress_time.cmp(&a.decompress_time),
            SortKey::CompressedSize => a.compressed_size.cmp(&b.compressed_size),
            SortKey::OriginalSize => a.original_size.cmp(&b.original_size),
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    /// Accepts column names or their 1-based column numbers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "name" => Ok(SortKey::Name),
            "2" | "ctime" | "compress" => Ok(SortKey::CompressTime),
            "3" | "dtime" | "decompress" => Ok(SortKey::DecompressTime),
            "4" | "size" | "compressed" => Ok(SortKey::CompressedSize),
            "5" | "original" => Ok(SortKey::OriginalSize),
            other => Err(format!(
                "unknown sort key '{other}' (name, ctime, dtime, size, original or 1-5)"
            )),
        }
    }
}

/// An invocation that produced no row, kept so the report can show why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub category: ErrorCategory,
    pub message: String,
}

impl From<&BenchError> for Failure {
    fn from(err: &BenchError) -> Self {
        Self {
            category: err.category(),
            message: err.to_string(),
        }
    }
}

/// Owned accumulator for a run: rows in completion order plus failures.
#[derive(Debug, Default, Clone)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
    failures: Vec<Failure>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn record_failure(&mut self, err: &BenchError) {
        self.failures.push(Failure::from(err));
    }

    /// Stable sort: rows with equal keys keep their insertion order.
    pub fn sort_by(&mut self, key: SortKey) {
        self.rows.sort_by(|a, b| key.compare(a, b));
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, size: u64, ctime_ms: u64) -> ResultRow {
        ResultRow {
            label: label.to_string(),
            compress_time: Duration::from_millis(ctime_ms),
            decompress_time: Duration::from_millis(ctime_ms / 2),
            compressed_size: size,
            original_size: 1000,
            file: "f".to_string(),
        }
    }

    fn labels(t: &ResultTable) -> Vec<&str> {
        t.rows().iter().map(|r| r.label.as_str()).collect()
    }

    #[test]
    fn compressed_size_sorts_ascending() {
        let mut t = ResultTable::new();
        t.push(row("a", 500, 1));
        t.push(row("b", 100, 1));
        t.push(row("c", 300, 1));
        t.sort_by(SortKey::CompressedSize);
        let sizes: Vec<u64> = t.rows().iter().map(|r| r.compressed_size).collect();
        assert_eq!(sizes, vec![100, 300, 500]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut t = ResultTable::new();
        t.push(row("first", 200, 5));
        t.push(row("small", 100, 1));
        t.push(row("second", 200, 9));
        t.push(row("third", 200, 2));
        t.sort_by(SortKey::CompressedSize);
        assert_eq!(labels(&t), vec!["small", "first", "second", "third"]);
    }

    #[test]
    fn times_sort_slowest_first() {
        let mut t = ResultTable::new();
        t.push(row("fast", 1, 2));
        t.push(row("slow", 1, 20));
        t.push(row("mid", 1, 10));
        t.sort_by(SortKey::CompressTime);
        assert_eq!(labels(&t), vec!["slow", "mid", "fast"]);
        t.sort_by(SortKey::Name);
        assert_eq!(labels(&t), vec!["fast", "mid", "slow"]);
    }

    #[test]
    fn derived_fields() {
        let r = ResultRow {
            label: "x".into(),
            compress_time: Duration::from_millis(500),
            decompress_time: Duration::ZERO,
            compressed_size: 250,
            original_size: 1000,
            file: "f".into(),
        };
        assert_eq!(r.ratio(), Some(0.25));
        assert_eq!(r.compress_speed(), Some(2000.0));
        assert_eq!(r.decompress_speed(), None);

        let empty = ResultRow {
            original_size: 0,
            ..r
        };
        assert_eq!(empty.ratio(), None);
    }

    #[test]
    fn sort_key_parsing() {
        assert_eq!("4".parse::<SortKey>(), Ok(SortKey::CompressedSize));
        assert_eq!("dtime".parse::<SortKey>(), Ok(SortKey::DecompressTime));
        assert!("6".parse::<SortKey>().is_err());
    }
}
