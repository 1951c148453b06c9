//! Result aggregation and the final results table

use std::collections::BTreeMap;

use colored::Colorize;

/// Exit code per test target, across every profile and group of a run
///
/// A target recorded twice keeps its latest exit code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestOutcomes {
    codes: BTreeMap<String, i32>,
}

impl TestOutcomes {
    pub fn record(&mut self, target: &str, code: i32) {
        self.codes.insert(target.to_string(), code);
    }

    pub fn get(&self, target: &str) -> Option<i32> {
        self.codes.get(target).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.codes.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Decides whether a recorded exit code is a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Any non-zero code fails
    #[default]
    NonZero,
    /// Only this exact code fails
    Sentinel(i32),
}

impl FailurePolicy {
    pub fn from_config(failure_exit_code: Option<i32>) -> Self {
        failure_exit_code.map_or(Self::NonZero, Self::Sentinel)
    }

    pub fn is_failure(self, code: i32) -> bool {
        match self {
            Self::NonZero => code != 0,
            Self::Sentinel(sentinel) => code == sentinel,
        }
    }
}

/// Final aggregate of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcomes: TestOutcomes,
    pub failed: bool,
}

impl RunSummary {
    pub fn new(outcomes: TestOutcomes, policy: FailurePolicy) -> Self {
        let failed = outcomes.iter().any(|(_, code)| policy.is_failure(code));
        Self { outcomes, failed }
    }

    /// Process exit status communicating the verdict
    pub fn exit_code(&self) -> i32 {
        if self.failed {
            1
        } else {
            0
        }
    }

    /// Render the results table
    pub fn render(&self, policy: FailurePolicy) -> String {
        let width = self
            .outcomes
            .iter()
            .map(|(target, _)| target.len())
            .max()
            .unwrap_or(0)
            .max("Target".len());

        let mut out = format!("\n{}\n", "Results:".blue().bold());
        out.push_str(&format!("  {:<width$}  {}\n", "Target", "Exit", width = width));
        for (target, code) in self.outcomes.iter() {
            let code_str = code.to_string();
            let code_col = if policy.is_failure(code) {
                code_str.red().bold()
            } else {
                code_str.green()
            };
            out.push_str(&format!("  {:<width$}  {}\n", target, code_col, width = width));
        }

        let verdict = if self.failed {
            "FAILED".red().bold()
        } else {
            "OK".green().bold()
        };
        out.push_str(&format!("\n{} ({} targets)\n", verdict, self.outcomes.len()));
        out
    }

    pub fn print(&self, policy: FailurePolicy) {
        println!("{}", self.render(policy));
    }
}
