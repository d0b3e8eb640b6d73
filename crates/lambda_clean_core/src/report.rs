use std::fmt;
use std::io::Write;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use tracing::warn;

use crate::model::{FunctionName, Retention, RetentionDecision, VersionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    pub retention: Retention,
    pub function: FunctionName,
    pub version: VersionId,
}

impl ReportLine {
    pub fn delete(function: &FunctionName, version: &VersionId) -> Self {
        Self {
            retention: Retention::Delete,
            function: function.clone(),
            version: version.clone(),
        }
    }

}

impl From<RetentionDecision> for ReportLine {
    fn from(decision: RetentionDecision) -> Self {
        Self {
            retention: decision.retention,
            function: decision.function,
            version: decision.version,
        }
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.retention {
            Retention::Delete => "[DELETE]",
            Retention::Keep => "[KEEP]  ",
        };
        write!(f, "{tag} {}:{}", self.function, self.version)
    }
}

/// Destination of report lines. Written to from every delete worker, so
/// implementations serialize whole lines.
pub trait ReportSink: Send + Sync {
    fn record(&self, line: ReportLine);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutReport;

impl ReportSink for StdoutReport {
    fn record(&self, line: ReportLine) {
        write_line(&mut std::io::stdout().lock(), &line);
    }
}

/// Writes one report line. A failed write is logged and the sweep goes on.
fn write_line(out: &mut impl Write, line: &ReportLine) -> bool {
    match writeln!(out, "{line}") {
        Ok(()) => true,
        Err(write_error) => {
            warn!(
                error = %write_error,
                function = %line.function,
                version = %line.version,
                "failed to write report line"
            );
            false
        }
    }
}

/// Keeps every line in memory, optionally echoing it to stdout.
#[derive(Debug, Default)]
pub struct BufferedReport {
    lines: Mutex<Vec<ReportLine>>,
    echo: bool,
}

impl BufferedReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn echoing() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            echo: true,
        }
    }

    pub fn lines(&self) -> Vec<ReportLine> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn rendered(&self) -> Vec<String> {
        self.lines().iter().map(ToString::to_string).collect()
    }
}

impl ReportSink for BufferedReport {
    fn record(&self, line: ReportLine) {
        if self.echo {
            StdoutReport.record(line.clone());
        }
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}
