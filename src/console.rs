//! Operator-facing I/O collaborators.
//!
//! The input stage reads the query through an [`InputSource`] and the output
//! stage hands the finished report to an [`OutputSink`]. Console versions are
//! used by the binary; the fixed/captured versions serve `--query` and tests.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Prompt shown to the operator by [`ConsoleInput`].
pub const QUERY_PROMPT: &str = "Enter your question or task: ";

/// Where the user's query comes from.
#[async_trait]
pub trait InputSource: Send + Sync {
    /// Show `prompt_text` (if interactive) and return one line, without the
    /// trailing newline.
    async fn read_query(&self, prompt_text: &str) -> Result<String>;
}

/// Where the finished report goes.
pub trait OutputSink: Send + Sync {
    fn emit(&self, report: &str) -> Result<()>;
}

/// Reads the query from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleInput;

#[async_trait]
impl InputSource for ConsoleInput {
    async fn read_query(&self, prompt_text: &str) -> Result<String> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt_text.as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        Ok(strip_newline(line))
    }
}

fn strip_newline(mut line: String) -> String {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}

/// Returns the same query every time, without prompting.
#[derive(Debug, Clone)]
pub struct FixedInput(pub String);

impl FixedInput {
    pub fn new(query: impl Into<String>) -> Self {
        Self(query.into())
    }
}

#[async_trait]
impl InputSource for FixedInput {
    async fn read_query(&self, _prompt_text: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Prints reports to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleOutput;

impl OutputSink for ConsoleOutput {
    fn emit(&self, report: &str) -> Result<()> {
        println!("{}", report);
        Ok(())
    }
}

/// Keeps every emitted report in memory.
#[derive(Debug, Default)]
pub struct CapturedOutput {
    reports: Mutex<Vec<String>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn reports(&self) -> Vec<String> {
        self.reports
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl OutputSink for CapturedOutput {
    fn emit(&self, report: &str) -> Result<()> {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(report.to_string());
        }
        Ok(())
    }
}
