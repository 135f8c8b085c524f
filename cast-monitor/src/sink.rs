//! Output sinks for device reports.

use parking_lot::Mutex;
use tracing::Level;

/// Write-only destination for report lines.
pub trait ReportSink: Send + Sync {
    fn emit(&self, level: Level, device: &str, line: &str);
}

/// Emits each line as a `tracing` event with a `device` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn emit(&self, level: Level, device: &str, line: &str) {
        // `tracing` macros need the level at compile time.
        match level {
            Level::ERROR => tracing::error!(target: "castwatch::report", device, "{}", line),
            Level::WARN => tracing::warn!(target: "castwatch::report", device, "{}", line),
            Level::INFO => tracing::info!(target: "castwatch::report", device, "{}", line),
            Level::DEBUG => tracing::debug!(target: "castwatch::report", device, "{}", line),
            _ => tracing::trace!(target: "castwatch::report", device, "{}", line),
        }
    }
}

/// A line captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub level: Level,
    pub device: String,
    pub line: String,
}

/// Keeps every emitted line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<Emitted>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<Emitted> {
        self.lines.lock().clone()
    }

    /// Number of captured lines containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines.lock().iter().filter(|e| e.line.contains(needle)).count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.count_containing(needle) > 0
    }

    /// Captured lines at `level`.
    pub fn at_level(&self, level: Level) -> Vec<Emitted> {
        self.lines.lock().iter().filter(|e| e.level == level).cloned().collect()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl ReportSink for MemorySink {
    fn emit(&self, level: Level, device: &str, line: &str) {
        self.lines.lock().push(Emitted {
            level,
            device: device.to_string(),
            line: line.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_captures_lines() {
        let sink = MemorySink::new();
        sink.emit(Level::INFO, "Kitchen", "Status");
        sink.emit(Level::ERROR, "Kitchen", "status fetch failed");

        assert_eq!(sink.lines().len(), 2);
        assert!(sink.contains("fetch failed"));
        assert_eq!(sink.at_level(Level::ERROR)[0].device, "Kitchen");

        sink.clear();
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_tracing_sink_accepts_every_level() {
        let sink = TracingSink;
        for level in [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE] {
            sink.emit(level, "Den", "line");
        }
    }
}
