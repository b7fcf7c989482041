//! Report sinks — where daily reports go once a location emits them.
//!
//! The engine never holds reports itself; it forwards each one to the
//! injected sink. Persistence beyond JSON lines is out of this crate.

use crate::{error::SimResult, simulator::DailyLocationReport};
use std::io::Write;

pub trait ReportSink {
    fn record(&mut self, report: &DailyLocationReport) -> SimResult<()>;

    fn flush(&mut self) -> SimResult<()> {
        Ok(())
    }
}

/// Keeps every report in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub reports: Vec<DailyLocationReport>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_location<'a>(
        &'a self,
        location: &'a str,
    ) -> impl Iterator<Item = &'a DailyLocationReport> + 'a {
        self.reports.iter().filter(move |r| r.location_id == location)
    }
}

impl ReportSink for MemorySink {
    fn record(&mut self, report: &DailyLocationReport) -> SimResult<()> {
        self.reports.push(report.clone());
        Ok(())
    }
}

/// Drops every report. For runs where only the summaries matter.
#[derive(Debug, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn record(&mut self, _report: &DailyLocationReport) -> SimResult<()> {
        Ok(())
    }
}

/// One JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer:  W,
    written: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn record(&mut self, report: &DailyLocationReport) -> SimResult<()> {
        serde_json::to_writer(&mut self.writer, report)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> SimResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
