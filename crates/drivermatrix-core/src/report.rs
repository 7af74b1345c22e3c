//! Run report
//!
//! The [`Report`] is append-only while the run is in progress. Its JSON form
//! is the contract consumed by CI:
//!
//! ```json
//! {"passed": 9, "failed": 1, "tests": [{"name": "ping", "status": "PASS"}, ...]}
//! ```

use crate::Result;
use serde::{Deserialize, Serialize};

/// Name of the synthetic entry recorded when the session cannot be opened
pub const CONNECT_ENTRY: &str = "connect";

/// Marker line printed right before the JSON report
pub const JSON_MARKER: &str = "JSON_OUTPUT:";

/// Result of one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail(String),
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    /// Failure detail, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            Outcome::Pass => None,
            Outcome::Fail(detail) => Some(detail),
        }
    }
}

/// Status as written to the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestEntry {
    pub name: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestEntry {
    fn new(name: impl Into<String>, outcome: Outcome) -> Self {
        let name = name.into();
        match outcome {
            Outcome::Pass => Self {
                name,
                status: Status::Pass,
                error: None,
            },
            Outcome::Fail(detail) => Self {
                name,
                status: Status::Fail,
                error: Some(detail),
            },
        }
    }

    pub fn passed(&self) -> bool {
        self.status == Status::Pass
    }
}

/// Aggregate outcome of a run.
///
/// Counts are only updated through [`Report::record`], which keeps
/// `tests.len() == passed + failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    passed: usize,
    failed: usize,
    tests: Vec<TestEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return it
    pub fn record(&mut self, name: impl Into<String>, outcome: Outcome) -> &TestEntry {
        if outcome.is_pass() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.tests.push(TestEntry::new(name, outcome));
        &self.tests[self.tests.len() - 1]
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn total(&self) -> usize {
        self.tests.len()
    }

    pub fn tests(&self) -> &[TestEntry] {
        &self.tests
    }

    /// Entry names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn entry(&self, name: &str) -> Option<&TestEntry> {
        self.tests.iter().find(|t| t.name == name)
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code for this report
    pub fn exit_code(&self) -> u8 {
        if self.all_passed() { 0 } else { 1 }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Extract the report that follows [`JSON_MARKER`] in a transcript
    pub fn from_transcript(transcript: &str) -> Result<Self> {
        let (_, json) = transcript.split_once(JSON_MARKER).ok_or_else(|| {
            crate::HarnessError::Configuration(format!("no {} marker in transcript", JSON_MARKER))
        })?;
        Self::from_json(json.trim())
    }
}
