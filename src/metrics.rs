use std::{collections::HashMap, fs::File, io, path::Path};

use crate::{Error, Result};

/// A destination for scalar training observations
///
/// Observations are keyed by series name and step index and are only ever written,
/// never read back by the training loop.
pub trait MetricsSink {
    /// Record `value` for `series` at `step`
    fn record(&mut self, series: &str, value: f32, step: u64) -> Result<()>;

    /// Flush and release the sink at the end of a run
    fn close(&mut self) -> Result<()>;
}

/// A sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn record(&mut self, _series: &str, _value: f32, _step: u64) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A sink that keeps every observation in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    series: HashMap<String, Vec<(u64, f32)>>,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the recorded `(step, value)` pairs of a series in recording order
    pub fn series(&self, name: &str) -> &[(u64, f32)] {
        self.series.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Get the names of every recorded series
    pub fn keys(&self) -> Vec<&str> {
        self.series.keys().map(String::as_str).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl MetricsSink for MemorySink {
    fn record(&mut self, series: &str, value: f32, step: u64) -> Result<()> {
        self.series
            .entry(series.to_owned())
            .or_default()
            .push((step, value));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// A sink that writes `series,step,value` rows as CSV
pub struct CsvSink<W: io::Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    /// Create (or truncate) a CSV file at `path`, creating parent directories as needed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_writer(File::create(path)?)
    }
}

impl<W: io::Write> CsvSink<W> {
    /// Wrap any writer, writing the header row immediately
    pub fn from_writer(writer: W) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(["series", "step", "value"])?;
        Ok(Self { writer })
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

impl<W: io::Write> MetricsSink for CsvSink<W> {
    fn record(&mut self, series: &str, value: f32, step: u64) -> Result<()> {
        self.writer.write_record([
            series,
            step.to_string().as_str(),
            value.to_string().as_str(),
        ])?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
