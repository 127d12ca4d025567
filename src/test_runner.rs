// File: src/test_runner.rs
//
// Golden-file test runner for Brewin scripts.
//
// Every `*.br` file in a directory is run with a fresh interpreter. Its
// transcript (printed lines, plus a final `error: <Kind>` line if the run
// failed) is compared with the sibling `*.out` file. An optional `*.in`
// file supplies input lines. Missing expectations, or `--update`, write the
// actual transcript instead.

use crate::interpreter::{CapturedOutput, Interpreter, ScriptedInput};
use colored::Colorize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const SCRIPT_EXTENSION: &str = "br";

/// One script with its expectation files
#[derive(Clone, Debug)]
pub struct TestCase {
    pub name: String,
    pub script: PathBuf,
}

impl TestCase {
    pub fn from_script(script: PathBuf) -> Self {
        let name = script
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| script.display().to_string());
        TestCase { name, script }
    }

    pub fn expected_path(&self) -> PathBuf {
        self.script.with_extension("out")
    }

    pub fn input_path(&self) -> PathBuf {
        self.script.with_extension("in")
    }
}

/// Result from executing a single script
#[derive(Clone, Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub message: Option<String>,
    pub duration_ms: u128,
}

/// Runs a program and renders what it did as text
///
/// Output lines come first; a failed run ends with `error: <Kind>`.
pub fn transcript(source: &str, input: &[String]) -> String {
    let output = CapturedOutput::new();
    let mut interp = Interpreter::with_io(output.clone(), ScriptedInput::new(input.to_vec()));
    let lines = match interp.run_source(source) {
        Ok(_) => output.lines(),
        Err(err) => {
            tracing::debug!(kind = ?err.kind, message = %err.message, "script failed");
            let mut lines = output.lines();
            lines.push(format!("error: {:?}", err.kind));
            lines
        }
    };
    lines.join("\n")
}

/// Test runner for a directory of golden scripts
pub struct TestRunner {
    pub update: bool,
    pub results: Vec<TestResult>,
}

impl TestRunner {
    pub fn new(update: bool) -> Self {
        TestRunner { update, results: Vec::new() }
    }

    /// Every script in `dir`, sorted by file name
    pub fn collect(dir: &Path) -> io::Result<Vec<TestCase>> {
        let mut scripts: Vec<PathBuf> = fs::read_dir(dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().map(|e| e == SCRIPT_EXTENSION).unwrap_or(false))
            .collect();
        scripts.sort();
        Ok(scripts.into_iter().map(TestCase::from_script).collect())
    }

    /// Run all scripts in `dir` and return a report
    pub fn run_dir(&mut self, dir: &Path) -> io::Result<TestReport> {
        let start_time = Instant::now();
        for case in Self::collect(dir)? {
            let result = self.run_case(&case)?;
            self.results.push(result);
        }

        Ok(TestReport {
            total: self.results.len(),
            passed: self.results.iter().filter(|r| r.passed).count(),
            failed: self.results.iter().filter(|r| !r.passed).count(),
            duration_ms: start_time.elapsed().as_millis(),
            results: self.results.clone(),
        })
    }

    /// Run a single script in isolation
    pub fn run_case(&self, case: &TestCase) -> io::Result<TestResult> {
        let start_time = Instant::now();
        let source = fs::read_to_string(&case.script)?;
        let input: Vec<String> = match fs::read_to_string(case.input_path()) {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err),
        };

        let actual = transcript(&source, &input);
        let expected_path = case.expected_path();

        let expected = if expected_path.exists() && !self.update {
            fs::read_to_string(&expected_path)?
        } else {
            fs::write(&expected_path, format!("{}\n", actual))?;
            actual.clone()
        };

        let passed = actual.trim_end() == expected.trim_end();
        let message = (!passed).then(|| {
            format!("Expected:\n{}\nGot:\n{}", expected.trim_end(), actual.trim_end())
        });

        Ok(TestResult {
            name: case.name.clone(),
            passed,
            message,
            duration_ms: start_time.elapsed().as_millis(),
        })
    }
}

/// Summary report of test execution
#[derive(Debug)]
pub struct TestReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u128,
    pub results: Vec<TestResult>,
}

impl TestReport {
    /// Print the test report to stdout with colored output
    pub fn print(&self, verbose: bool) {
        for result in &self.results {
            if result.passed {
                if verbose {
                    println!("  {} {} ({}ms)", "✓".green().bold(), result.name.green(), result.duration_ms);
                }
            } else {
                println!("  {} {} ({}ms)", "✗".red().bold(), result.name.red(), result.duration_ms);
                if let Some(msg) = &result.message {
                    println!("{}", msg.dimmed());
                }
            }
        }

        println!(
            "Tests: {} total, {} passed, {} failed",
            self.total,
            self.passed.to_string().green().bold(),
            self.failed.to_string().red().bold()
        );
        println!("Time:  {}ms", self.duration_ms);
    }

    /// Get exit code (0 for success, 1 for failure)
    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 {
            0
        } else {
            1
        }
    }
}
