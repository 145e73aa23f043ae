//! Result records, tally and verdict

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::diagnose;
use crate::error::{FailureKind, ProbeError};
use crate::output::{self, RunOutput};

/// Outcome of one executed check
#[derive(Debug, Clone, Serialize)]
pub struct TestRecord {
    pub test: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl TestRecord {
    pub fn passed(test: &str, status: u16, elapsed: Duration) -> Self {
        Self {
            test: test.to_string(),
            success: true,
            details: Some(format!("HTTP {} in {} ms", status, elapsed.as_millis())),
            error: None,
            kind: None,
            status: Some(status),
            elapsed_ms: elapsed.as_millis() as u64,
            hint: None,
        }
    }

    pub fn failed(test: &str, error: &ProbeError, elapsed: Duration) -> Self {
        Self {
            test: test.to_string(),
            success: false,
            details: error.response_text().map(str::to_string),
            error: Some(error.to_string()),
            kind: Some(error.kind()),
            status: error.status(),
            elapsed_ms: elapsed.as_millis() as u64,
            hint: diagnose::hint(error).map(str::to_string),
        }
    }

    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }
}

/// A step that was not executed
#[derive(Debug, Clone, Serialize)]
pub struct SkippedStep {
    pub test: String,
    pub reason: String,
}

impl fmt::Display for SkippedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "⏭️  {}: {}", self.test, self.reason)
    }
}

/// Qualitative grade of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    #[serde(rename = "EXCELLENT")]
    Excellent,
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "NEEDS WORK")]
    NeedsWork,
    #[serde(rename = "CRITICAL")]
    Critical,
    #[serde(rename = "NO DATA")]
    NoData,
}

impl Verdict {
    pub fn from_rate(total: usize, success_rate: f64) -> Self {
        if total == 0 {
            Verdict::NoData
        } else if success_rate >= 90.0 {
            Verdict::Excellent
        } else if success_rate >= 75.0 {
            Verdict::Good
        } else if success_rate >= 50.0 {
            Verdict::NeedsWork
        } else {
            Verdict::Critical
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Excellent => write!(f, "EXCELLENT"),
            Verdict::Good => write!(f, "GOOD"),
            Verdict::NeedsWork => write!(f, "NEEDS WORK"),
            Verdict::Critical => write!(f, "CRITICAL"),
            Verdict::NoData => write!(f, "NO DATA"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub success_rate: f64,
    pub verdict: Verdict,
}

impl Summary {
    pub fn from_records(records: &[TestRecord], skipped: usize) -> Self {
        let total = records.len();
        let passed = records.iter().filter(|r| r.success).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            passed as f64 * 100.0 / total as f64
        };

        Self {
            total,
            passed,
            failed: total - passed,
            skipped,
            success_rate,
            verdict: Verdict::from_rate(total, success_rate),
        }
    }

    /// Whether the run counts as passing at `threshold` percent
    pub fn meets(&self, threshold: f64) -> bool {
        self.total > 0 && self.success_rate >= threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

/// Collects records in execution order and prints them as they arrive
pub struct Reporter {
    mode: OutputMode,
    records: Vec<TestRecord>,
    skipped: Vec<SkippedStep>,
}

impl Reporter {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn section(&self, title: &str, description: &str) {
        if self.mode == OutputMode::Text {
            if description.is_empty() {
                println!("\n🔍 {}", title);
            } else {
                println!("\n🔍 {}: {}", title, description);
            }
        }
    }

    pub fn log_result(&mut self, record: TestRecord) {
        if self.mode == OutputMode::Text {
            print_record(&record);
        }
        self.records.push(record);
    }

    pub fn log_skip(&mut self, test: &str, reason: &str) {
        let skipped = SkippedStep {
            test: test.to_string(),
            reason: reason.to_string(),
        };
        if self.mode == OutputMode::Text {
            println!("{}", skipped);
        }
        self.skipped.push(skipped);
    }

    #[cfg(test)]
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    #[cfg(test)]
    pub fn skipped(&self) -> &[SkippedStep] {
        &self.skipped
    }

    pub fn summary(&self) -> Summary {
        Summary::from_records(&self.records, self.skipped.len())
    }

    /// Print the final tally and return whether the run passed
    pub fn finish(&self, threshold: f64) -> bool {
        let summary = self.summary();
        let passed = summary.meets(threshold);

        match self.mode {
            OutputMode::Json => output::print_json(&RunOutput {
                records: &self.records,
                skipped: &self.skipped,
                summary: &summary,
                threshold,
                passed,
            }),
            OutputMode::Text => self.print_summary(&summary, threshold, passed),
        }

        passed
    }

    fn print_summary(&self, summary: &Summary, threshold: f64, passed: bool) {
        println!("\n{}", "=".repeat(60));
        println!(
            "Summary: {}/{} checks passed ({:.1}%)",
            summary.passed, summary.total, summary.success_rate
        );
        if summary.skipped > 0 {
            println!("Skipped: {}", summary.skipped);
        }
        println!("Verdict: {}", summary.verdict);

        let failures: Vec<&TestRecord> = self.records.iter().filter(|r| !r.success).collect();
        if !failures.is_empty() {
            println!("\nFailed checks:");
            for record in failures {
                println!(
                    "  ❌ {}: {}",
                    record.test,
                    record.error.as_deref().unwrap_or("failed")
                );
            }
        }

        if passed {
            println!("\n✅ Run passed (threshold {:.0}%)", threshold);
        } else {
            println!("\n❌ Run failed (threshold {:.0}%)", threshold);
        }
    }
}

fn print_record(record: &TestRecord) {
    if record.success {
        match &record.details {
            Some(details) => println!("✅ {} ({})", record.test, details),
            None => println!("✅ {}", record.test),
        }
        return;
    }

    println!(
        "❌ {}: {}",
        record.test,
        record.error.as_deref().unwrap_or("failed")
    );
    if let Some(details) = &record.details {
        println!("   response: {}", details);
    }
    if let Some(hint) = &record.hint {
        println!("   hint: {}", hint);
    }
}
