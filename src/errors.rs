// File: src/errors.rs
//
// Error handling and reporting for the Brewin interpreter.
// Provides structured error types with optional source location information
// and pretty-printed error messages.

use colored::Colorize;
use std::fmt;

/// Source location information for tracking where code appears in a file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub file: Option<String>,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column, file: None }
    }

    pub fn unknown() -> Self {
        Self { line: 0, column: 0, file: None }
    }

    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}:{}:{}", file, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Kinds of errors a Brewin run can end with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source text could not be turned into an AST
    ParseError,
    /// Undefined variable or field, unknown or ambiguous function, arity mismatch
    NameError,
    /// Operand types not supported by an operator, bad condition, non-callable value
    TypeError,
    /// Runtime fault: division by zero, overflow, nil dereference, exhausted input
    FaultError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::ParseError => write!(f, "Parse Error"),
            ErrorKind::NameError => write!(f, "Name Error"),
            ErrorKind::TypeError => write!(f, "Type Error"),
            ErrorKind::FaultError => write!(f, "Fault Error"),
        }
    }
}

/// A structured error with optional location and call-stack context
#[derive(Debug, Clone)]
pub struct BrewinError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: SourceLocation,
    pub call_stack: Vec<String>,
    pub help: Option<String>,
}

impl BrewinError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: SourceLocation::unknown(),
            call_stack: Vec::new(),
            help: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn in_file(mut self, file: String) -> Self {
        self.location.file = Some(file);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_call_stack(mut self, call_stack: Vec<String>) -> Self {
        self.call_stack = call_stack;
        self
    }

    pub fn parse_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ErrorKind::ParseError, message).at(location)
    }

    pub fn name_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NameError, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FaultError, message)
    }

    /// Create an undefined variable error
    pub fn undefined_variable(name: &str) -> Self {
        Self::name_error(format!("Variable/Function {} not found", name))
    }

    /// Create an undefined function error
    pub fn undefined_function(name: &str, arity: usize) -> Self {
        Self::name_error(format!("Function {} taking {} params not found", name, arity))
    }
}

impl fmt::Display for BrewinError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind_str = format!("{}", self.kind);
        writeln!(f, "{}: {}", kind_str.red().bold(), self.message.bold())?;

        if self.location.is_known() || self.location.file.is_some() {
            let location_str = format!("  --> {}", self.location);
            writeln!(f, "{}", location_str.bright_blue())?;
        }

        // Innermost activation first
        for frame in self.call_stack.iter().rev() {
            writeln!(f, "   {} {}", "in".bright_blue(), frame)?;
        }

        if let Some(ref help) = self.help {
            writeln!(f, "   {} {}", "=".bright_yellow(), format!("help: {}", help).bright_yellow())?;
        }

        Ok(())
    }
}

impl std::error::Error for BrewinError {}

/// Result type used throughout the interpreter
pub type BrewinResult<T> = Result<T, Box<BrewinError>>;
