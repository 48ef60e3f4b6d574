//! Timestamped CSV rows.
//!
//! # Columns
//!
//! - `timestamp`: local time, `YYYY-MM-DD HH:MM:SS.mmm`
//! - `data`: the raw line as received
//!
//! The data column is written verbatim (no quoting) so a device that already
//! emits comma-separated values produces extra columns downstream.

use std::io::{self, Write};

use chrono::{DateTime, TimeZone};
use thiserror::Error;

/// Header row of every output file.
pub const CSV_HEADER: [&str; 2] = ["timestamp", "data"];

/// Millisecond-precision timestamp format.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Errors that can occur while writing rows.
#[derive(Debug, Error)]
pub enum SinkError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error from the CSV writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes the header and flushed rows to an output file.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    /// Wrap `inner` and write the header row.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the header cannot be written.
    pub fn create(inner: W) -> Result<Self, SinkError> {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        let mut sink = Self { writer };
        sink.writer.write_record(CSV_HEADER)?;
        sink.writer.flush()?;
        Ok(sink)
    }

    /// Append one row and flush it to the file immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] on write or flush failure.
    pub fn write_line<Tz>(&mut self, at: &DateTime<Tz>, line: &str) -> Result<(), SinkError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let timestamp = format_timestamp(at);
        self.writer.write_record([timestamp.as_str(), line])?;
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and hand back the inner writer.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the final flush fails.
    pub fn finish(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

/// Format a timestamp the way rows carry it.
#[must_use]
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}
