// File: src/interpreter/io.rs
//
// Console collaborators used by the `print`, `inputi` and `inputs` built-ins.
//
// The interpreter only ever emits whole lines and reads whole lines, so the
// collaborators are two small traits. Stdio implementations back the CLI;
// the captured/scripted ones back tests and the golden test runner.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// Sink for lines produced by the program
pub trait OutputSink {
    fn emit(&mut self, line: &str);
}

/// Source of input lines, consumed synchronously one at a time
pub trait InputSource {
    /// Next line without its terminator, or `None` at end of input
    fn read_line(&mut self) -> Option<String>;
}

/// Writes every line to standard output
#[derive(Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, line: &str) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{}", line);
        let _ = handle.flush();
    }
}

/// Reads lines from standard input
#[derive(Default)]
pub struct StdinSource;

impl InputSource for StdinSource {
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
        }
    }
}

/// Collects emitted lines in a buffer shared with the caller
///
/// Clones share the same buffer, so a harness keeps one handle and gives the
/// other to the interpreter.
#[derive(Clone, Default)]
pub struct CapturedOutput {
    lines: Rc<RefCell<Vec<String>>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// All lines joined with `\n`
    pub fn text(&self) -> String {
        self.lines.borrow().join("\n")
    }
}

impl OutputSink for CapturedOutput {
    fn emit(&mut self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Replays a fixed list of input lines
#[derive(Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedInput { lines: lines.into_iter().map(Into::into).collect() }
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}
