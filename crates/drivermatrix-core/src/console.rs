//! Human-readable transcript followed by the machine-readable report
//!
//! The transcript goes to stdout; CI locates the report through the
//! [`JSON_MARKER`] line printed right before it.

use crate::{HarnessConfig, HarnessError, JSON_MARKER, Report, RunObserver, TestEntry};
use std::fmt;
use std::io::{self, Write};

const DEFAULT_RULE_WIDTH: usize = 50;

/// [`RunObserver`] that writes the run transcript to `W`.
///
/// Write errors do not interrupt the run; the first one is kept and returned
/// by [`ConsoleTranscript::finish`].
pub struct ConsoleTranscript<W: Write> {
    out: W,
    rule: String,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleTranscript<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            rule: "=".repeat(DEFAULT_RULE_WIDTH),
            error: None,
        }
    }

    /// Flush and hand back the writer, or the first write error
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.out.write_fmt(args).and_then(|()| self.out.write_all(b"\n")) {
            self.error = Some(e);
        }
    }
}

impl<W: Write + Send> RunObserver for ConsoleTranscript<W> {
    fn on_start(&mut self, driver: &str, config: &HarnessConfig) {
        let title = format!("Rust {} Driver Compatibility Test", driver);
        self.rule = "=".repeat(title.chars().count());
        self.line(format_args!("{}", title));
        let rule = self.rule.clone();
        self.line(format_args!("{}", rule));
        self.line(format_args!("Connecting to: {}", config.url));
        self.line(format_args!(""));
    }

    fn on_connected(&mut self) {
        self.line(format_args!("✓ Connected successfully"));
        self.line(format_args!(""));
    }

    fn on_connect_failed(&mut self, error: &HarnessError) {
        self.line(format_args!("Failed to connect: {}", error));
    }

    fn on_check(&mut self, index: usize, entry: &TestEntry) {
        match &entry.error {
            None => self.line(format_args!("✓ Test {}: {}", index, entry.name)),
            Some(detail) => self.line(format_args!("✗ Test {}: {} - {}", index, entry.name, detail)),
        }
    }

    fn on_finish(&mut self, report: &Report) {
        let rule = self.rule.clone();
        self.line(format_args!(""));
        self.line(format_args!("{}", rule));
        self.line(format_args!("Summary:"));
        self.line(format_args!("  Passed: {}", report.passed()));
        self.line(format_args!("  Failed: {}", report.failed()));
        self.line(format_args!("  Total:  {}", report.total()));
        self.line(format_args!("{}", rule));
        self.line(format_args!(""));
        self.line(format_args!("{}", JSON_MARKER));

        match report.to_json_pretty() {
            Ok(json) => self.line(format_args!("{}", json)),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(io::Error::other(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Outcome;
    use pretty_assertions::assert_eq;

    fn render(f: impl FnOnce(&mut ConsoleTranscript<Vec<u8>>)) -> String {
        let mut transcript = ConsoleTranscript::new(Vec::new());
        f(&mut transcript);
        String::from_utf8(transcript.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_banner_uses_driver_name() {
        let config = HarnessConfig::new("mongodb://localhost:27017");
        let output = render(|t| t.on_start("mongodb", &config));

        assert_eq!(
            output,
            "Rust mongodb Driver Compatibility Test\n\
             ======================================\n\
             Connecting to: mongodb://localhost:27017\n\n"
        );
    }

    #[test]
    fn test_check_lines() {
        let mut report = Report::new();
        report.record("ping", Outcome::Pass);
        report.record("update-one", Outcome::Fail("Expected 1 modified document, got 0".into()));

        let output = render(|t| {
            t.on_check(1, &report.tests()[0]);
            t.on_check(7, &report.tests()[1]);
        });

        assert_eq!(
            output,
            "✓ Test 1: ping\n✗ Test 7: update-one - Expected 1 modified document, got 0\n"
        );
    }

    #[test]
    fn test_summary_precedes_parseable_report() {
        let mut report = Report::new();
        report.record("connect", Outcome::Fail("Connection error: refused".into()));

        let output = render(|t| {
            t.on_connect_failed(&HarnessError::Connection("refused".into()));
            t.on_finish(&report);
        });

        assert!(output.starts_with("Failed to connect: Connection error: refused\n"));
        assert!(output.contains("Summary:\n  Passed: 0\n  Failed: 1\n  Total:  1\n"));
        assert_eq!(Report::from_transcript(&output).unwrap(), report);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_first_write_error_is_kept() {
        let mut transcript = ConsoleTranscript::new(BrokenPipe);
        transcript.on_connected();
        transcript.on_finish(&Report::new());

        let err = transcript.finish().err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
