//! Text renderings of a [`ResultTable`].
//!
//! Speeds are shown in MB/s (10^6 bytes) and ratios as percentages of the
//! original size; the underlying values stay unrounded in the table.

use std::io::{self, Write};

use crate::results::{ResultRow, ResultTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Markdown,
    #[default]
    Text,
    /// Text with raw byte counts and per-file labels.
    TextFull,
    Csv,
    /// Columns in the order turbobench prints them.
    Turbobench,
    /// Markdown with the file column first.
    Markdown2,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" | "1" => Ok(OutputFormat::Markdown),
            "text" | "2" => Ok(OutputFormat::Text),
            "textfull" | "text-full" | "full" | "3" => Ok(OutputFormat::TextFull),
            "csv" | "4" => Ok(OutputFormat::Csv),
            "turbobench" | "5" => Ok(OutputFormat::Turbobench),
            "markdown2" | "md2" | "6" => Ok(OutputFormat::Markdown2),
            other => Err(format!(
                "unknown output format '{other}' (markdown, text, textfull, csv, turbobench, markdown2 or 1-6)"
            )),
        }
    }
}

const MB_F: f64 = 1_000_000.0;

fn mb_s(v: Option<f64>) -> String {
    match v {
        Some(speed) => format!("{:.2}", speed / MB_F),
        None => "-".to_string(),
    }
}

fn percent(row: &ResultRow) -> String {
    match row.ratio() {
        Some(r) => format!("{:.2}", r * 100.0),
        None => "-".to_string(),
    }
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Write `table` to `out` in `format`, followed by a failure section when
/// any invocation failed.
pub fn render(table: &ResultTable, format: OutputFormat, out: &mut dyn Write) -> io::Result<()> {
    let rows = table.rows();
    match format {
        OutputFormat::Markdown => {
            writeln!(out, "| Compressor name | Compression | Decompress. | Compr. size | Ratio | Filename |")?;
            writeln!(out, "| --------------- | ----------- | ----------- | ----------- | ----- | -------- |")?;
            for r in rows {
                writeln!(
                    out,
                    "| {} | {} MB/s | {} MB/s | {} | {} | {} |",
                    r.label,
                    mb_s(r.compress_speed()),
                    mb_s(r.decompress_speed()),
                    r.compressed_size,
                    percent(r),
                    r.file
                )?;
            }
        }
        OutputFormat::Markdown2 => {
            writeln!(out, "| Filename | Compressor name | Ratio | Compression | Decompress. |")?;
            writeln!(out, "| -------- | --------------- | ----- | ----------- | ----------- |")?;
            for r in rows {
                writeln!(
                    out,
                    "| {} | {} | {} | {} MB/s | {} MB/s |",
                    r.file,
                    r.label,
                    percent(r),
                    mb_s(r.compress_speed()),
                    mb_s(r.decompress_speed())
                )?;
            }
        }
        OutputFormat::Text => {
            writeln!(
                out,
                "{:<28} {:>12} {:>12} {:>12} {:>8} {}",
                "Compressor name", "Compress.", "Decompress.", "Compr. size", "Ratio", "Filename"
            )?;
            for r in rows {
                writeln!(
                    out,
                    "{:<28} {:>7} MB/s {:>7} MB/s {:>12} {:>8} {}",
                    r.label,
                    mb_s(r.compress_speed()),
                    mb_s(r.decompress_speed()),
                    r.compressed_size,
                    percent(r),
                    r.file
                )?;
            }
        }
        OutputFormat::TextFull => {
            writeln!(
                out,
                "{:<28} {:>12} {:>12} {:>14} {:>14} {:>12} {:>8} {}",
                "Compressor name",
                "Compress.",
                "Decompress.",
                "Orig. size",
                "Compr. size",
                "C. time ns",
                "Ratio",
                "Filename"
            )?;
            for r in rows {
                writeln!(
                    out,
                    "{:<28} {:>7} MB/s {:>7} MB/s {:>14} {:>14} {:>12} {:>8} {}",
                    r.label,
                    mb_s(r.compress_speed()),
                    mb_s(r.decompress_speed()),
                    r.original_size,
                    r.compressed_size,
                    r.compress_time.as_nanos(),
                    percent(r),
                    r.file
                )?;
            }
        }
        OutputFormat::Csv => {
            writeln!(
                out,
                "Compressor name,Compression speed,Decompression speed,Original size,Compressed size,Ratio,Filename"
            )?;
            for r in rows {
                writeln!(
                    out,
                    "{},{},{},{},{},{},{}",
                    csv_field(&r.label),
                    mb_s(r.compress_speed()),
                    mb_s(r.decompress_speed()),
                    r.original_size,
                    r.compressed_size,
                    percent(r),
                    csv_field(&r.file)
                )?;
            }
        }
        OutputFormat::Turbobench => {
            writeln!(
                out,
                "{:>14} {:>8} {:>10} {:>10}   {:<28} {}",
                "C Size", "ratio%", "C MB/s", "D MB/s", "Name", "File"
            )?;
            for r in rows {
                writeln!(
                    out,
                    "{:>14} {:>8} {:>10} {:>10}   {:<28} {}",
                    r.compressed_size,
                    percent(r),
                    mb_s(r.compress_speed()),
                    mb_s(r.decompress_speed()),
                    r.label,
                    r.file
                )?;
            }
        }
    }

    let failures = table.failures();
    if !failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "Failed invocations ({}):", failures.len())?;
        for f in failures {
            writeln!(out, "  [{}] {}", f.category, f.message)?;
        }
    }
    Ok(())
}

/// Render into a `String`; convenient for tests and logging.
pub fn render_to_string(table: &ResultTable, format: OutputFormat) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = render(table, format, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::BenchError;

    fn table() -> ResultTable {
        let mut t = ResultTable::new();
        t.push(ResultRow {
            label: "zstd 1.5 -3".into(),
            compress_time: Duration::from_millis(10),
            decompress_time: Duration::from_millis(2),
            compressed_size: 250_000,
            original_size: 1_000_000,
            file: "data, v2.bin".into(),
        });
        t
    }

    #[test]
    fn csv_has_header_and_quoted_file() {
        let s = render_to_string(&table(), OutputFormat::Csv);
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Compressor name,"));
        assert_eq!(
            lines[1],
            "zstd 1.5 -3,100.00,500.00,1000000,250000,25.00,\"data, v2.bin\""
        );
    }

    #[test]
    fn every_format_renders_each_row() {
        for fmt in [
            OutputFormat::Markdown,
            OutputFormat::Markdown2,
            OutputFormat::Text,
            OutputFormat::TextFull,
            OutputFormat::Csv,
            OutputFormat::Turbobench,
        ] {
            let s = render_to_string(&table(), fmt);
            assert!(s.contains("zstd 1.5 -3"), "{fmt:?}: {s}");
            assert!(s.contains("25.00"), "{fmt:?}: {s}");
        }
    }

    #[test]
    fn failures_are_listed_after_the_table() {
        let mut t = table();
        t.record_failure(&BenchError::UnknownCodec("nope".into()));
        let s = render_to_string(&t, OutputFormat::Text);
        assert!(s.contains("Failed invocations (1):"));
        assert!(s.contains("[config] unrecognized codec 'nope'"));
    }

    #[test]
    fn zero_time_renders_placeholder() {
        let mut t = ResultTable::new();
        t.push(ResultRow {
            label: "memcpy".into(),
            compress_time: Duration::ZERO,
            decompress_time: Duration::ZERO,
            compressed_size: 0,
            original_size: 0,
            file: "empty".into(),
        });
        let s = render_to_string(&t, OutputFormat::Csv);
        assert!(s.lines().nth(1).is_some_and(|l| l.starts_with("memcpy,-,-,0,0,-,")));
    }

    #[test]
    fn format_parsing() {
        assert_eq!("csv".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert_eq!("6".parse::<OutputFormat>(), Ok(OutputFormat::Markdown2));
        for name in ["textfull", "text-full", "full", "3"] {
            assert_eq!(name.parse::<OutputFormat>(), Ok(OutputFormat::TextFull), "{name}");
        }
        assert!("html".parse::<OutputFormat>().is_err());
    }
}
