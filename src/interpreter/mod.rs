// File: src/interpreter/mod.rs
//
// Tree-walking interpreter for the Brewin language.
// Executes Brewin programs by traversing the Abstract Syntax Tree (AST).
//
// The interpreter owns the function table and the environment of the
// activation currently executing. Every call builds a fresh environment for
// the callee, swaps it in, runs the body and swaps the caller's back, so
// recursive activations never share locals. It supports:
// - Assignment with the nearest-binding fallback policy
// - Overloading by arity, functions and closures as values
// - Reference parameters that alias the caller's storage
// - Closures over a snapshot of the defining activation
// - Prototype objects with fields and methods
// - Int/Bool coercions before operator dispatch

mod control_flow;
mod environment;
mod functions;
mod io;
mod operators;
mod value;

pub use environment::{Binding, Environment, Scope, ScopeRef, Slot};
pub use functions::FunctionTable;
pub use io::{CapturedOutput, InputSource, OutputSink, ScriptedInput, StdinSource, StdoutSink};
pub use value::{chain_contains, Closure, Object, ObjectRef, Type, Value, PROTO_FIELD};

use control_flow::ExecStatus;

use crate::ast::{AssignTarget, Call, Callee, Expr, FuncDef, Param, Program, Stmt};
use crate::errors::{BrewinError, BrewinResult};
use crate::parser::parse_program;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

/// Name of the program entry point
pub const MAIN_FUNCTION: &str = "main";

/// Name bound to the receiver inside a method activation
pub const THIS: &str = "this";

/// Something that can be invoked with arguments
enum Callable {
    Function(Rc<FuncDef>),
    Closure(Closure),
}

impl Callable {
    fn def(&self) -> &Rc<FuncDef> {
        match self {
            Callable::Function(def) => def,
            Callable::Closure(closure) => &closure.def,
        }
    }
}

/// Main interpreter that executes Brewin programs
pub struct Interpreter {
    env: Environment,
    functions: FunctionTable,
    output: Box<dyn OutputSink>,
    input: Box<dyn InputSource>,
    call_stack: Vec<String>, // Track activations for error reports
    next_closure_id: u64,
}

impl Interpreter {
    /// Creates an interpreter that talks to stdin/stdout
    pub fn new() -> Self {
        Self::with_io(StdoutSink, StdinSource)
    }

    /// Creates an interpreter with explicit console collaborators
    pub fn with_io(output: impl OutputSink + 'static, input: impl InputSource + 'static) -> Self {
        Interpreter {
            env: Environment::new(),
            functions: FunctionTable::new(),
            output: Box::new(output),
            input: Box::new(input),
            call_stack: Vec::new(),
            next_closure_id: 0,
        }
    }

    /// Sets the output sink for print statements (used for testing)
    pub fn set_output(&mut self, output: impl OutputSink + 'static) {
        self.output = Box::new(output);
    }

    /// Sets the input source for `inputi`/`inputs`
    pub fn set_input(&mut self, input: impl InputSource + 'static) {
        self.input = Box::new(input);
    }

    /// Top-level environment; after a run it still holds `main`'s variables
    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Parses and runs a program given as source text
    pub fn run_source(&mut self, source: &str) -> BrewinResult<Value> {
        let program = parse_program(source)?;
        self.run(&program)
    }

    /// Loads the program's functions and runs `main` to completion
    ///
    /// Returns the value `main` returned (Nil if it never did). Any error is
    /// fatal to the run and carries the activations that were live when it
    /// was detected.
    pub fn run(&mut self, program: &Program) -> BrewinResult<Value> {
        self.functions = FunctionTable::from_program(program)?;
        self.env = Environment::new();
        self.call_stack.clear();
        debug!(functions = self.functions.len(), "program loaded");

        let main = self.functions.lookup(MAIN_FUNCTION, 0).ok_or_else(|| {
            Box::new(
                BrewinError::name_error("No main() function was found")
                    .with_help("add a `func main() { ... }` taking no parameters"),
            )
        })?;

        // `main` runs directly in the top-level scope
        self.call_stack.push(format!("{}/0", MAIN_FUNCTION));
        let status = self.run_statements(&main.body).map_err(|e| self.attach_frames(e))?;
        self.call_stack.pop();
        Ok(status.into_value())
    }

    fn attach_frames(&self, error: Box<BrewinError>) -> Box<BrewinError> {
        if error.call_stack.is_empty() {
            Box::new((*error).with_call_stack(self.call_stack.clone()))
        } else {
            error
        }
    }

    /// Runs a block in its own scope
    fn run_block(&mut self, stmts: &[Stmt]) -> BrewinResult<ExecStatus> {
        self.env.push();
        let status = self.run_statements(stmts);
        self.env.pop();
        status
    }

    /// Runs statements in the current scope, stopping at the first `return`
    fn run_statements(&mut self, stmts: &[Stmt]) -> BrewinResult<ExecStatus> {
        for stmt in stmts {
            if let ExecStatus::Return(value) = self.exec_stmt(stmt)? {
                return Ok(ExecStatus::Return(value));
            }
        }
        Ok(ExecStatus::Continue)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> BrewinResult<ExecStatus> {
        trace!(stmt = stmt.label(), depth = self.env.depth(), "exec");
        match stmt {
            Stmt::Assign { target: AssignTarget::Var(name), value } => {
                trace!(%name, "assign");
                let value = self.eval_expr(value)?;
                self.env.set(name, value);
                Ok(ExecStatus::Continue)
            }
            Stmt::Assign { target: AssignTarget::Field { object, field }, value } => {
                trace!(%field, "assign field");
                let target = self.eval_expr(object)?;
                let value = self.eval_expr(value)?;
                self.assign_field(&target, field, value)?;
                Ok(ExecStatus::Continue)
            }
            Stmt::Call(call) => {
                self.eval_call(call)?;
                Ok(ExecStatus::Continue)
            }
            Stmt::If { condition, then_branch, else_branch } => {
                let cond_val = self.eval_expr(condition)?;
                if operators::condition(&cond_val, "if")? {
                    self.run_block(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.run_block(else_branch)
                } else {
                    Ok(ExecStatus::Continue)
                }
            }
            Stmt::While { condition, body } => {
                loop {
                    let cond_val = self.eval_expr(condition)?;
                    if !operators::condition(&cond_val, "while")? {
                        break;
                    }
                    if let ExecStatus::Return(value) = self.run_block(body)? {
                        return Ok(ExecStatus::Return(value));
                    }
                }
                Ok(ExecStatus::Continue)
            }
            Stmt::Return(None) => Ok(ExecStatus::Return(Value::Nil)),
            Stmt::Return(Some(expr)) => {
                let value = match self.eval_expr(expr)? {
                    // A returned closure never keeps sharing state with this activation
                    Value::Closure(closure) => Value::Closure(closure.detached()),
                    other => other.deep_copy(),
                };
                Ok(ExecStatus::Return(value))
            }
        }
    }

    fn assign_field(&mut self, target: &Value, field: &str, value: Value) -> BrewinResult<()> {
        let object = expect_object(target, field)?;
        if field == PROTO_FIELD {
            let proto = match value {
                Value::Object(proto) => {
                    if chain_contains(&proto, &object) {
                        return Err(Box::new(BrewinError::type_error(
                            "Prototype assignment would create a cycle",
                        )));
                    }
                    Some(proto)
                }
                Value::Nil => None,
                other => {
                    return Err(Box::new(BrewinError::type_error(format!(
                        "Prototype must be an object or nil, got {}",
                        other.type_of()
                    ))));
                }
            };
            object.borrow_mut().set_proto(proto);
        } else {
            object.borrow_mut().add_or_update(field, value.deep_copy());
        }
        Ok(())
    }

    fn eval_expr(&mut self, expr: &Expr) -> BrewinResult<Value> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Str(s) => Ok(Value::str(s)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Nil => Ok(Value::Nil),
            Expr::Var(name) => self.read_variable(name),
            Expr::Field { object, field } => {
                let target = self.eval_expr(object)?;
                read_field(&target, field)
            }
            Expr::Call(call) => self.eval_call(call),
            Expr::Binary { op, left, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                operators::binary(*op, left, right)
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval_expr(operand)?;
                operators::unary(*op, operand)
            }
            Expr::Lambda(def) => Ok(Value::Closure(self.make_closure(def, false))),
            Expr::NewObject => Ok(Value::Object(Object::new_ref())),
        }
    }

    /// Variable read: environment first, then a bare function name
    fn read_variable(&self, name: &str) -> BrewinResult<Value> {
        if let Some(value) = self.env.get(name) {
            return Ok(match value {
                Value::Closure(closure) => Value::Closure(closure.copied()),
                other => other,
            });
        }
        match self.functions.unique(name)? {
            Some(def) => Ok(Value::Function(def)),
            None => Err(Box::new(BrewinError::undefined_variable(name))),
        }
    }

    /// Closure over a snapshot of everything visible right now
    fn make_closure(&mut self, def: &Rc<FuncDef>, by_ref: bool) -> Closure {
        self.next_closure_id += 1;
        let snapshot = self.env.snapshot();
        trace!(id = self.next_closure_id, captured = snapshot.len(), by_ref, "capture");
        Closure {
            id: self.next_closure_id,
            def: Rc::clone(def),
            captured: Rc::new(RefCell::new(snapshot)),
            by_ref,
        }
    }

    fn eval_call(&mut self, call: &Call) -> BrewinResult<Value> {
        match &call.callee {
            Callee::Name(name) => {
                if let Some(result) = self.call_builtin(name, &call.args)? {
                    return Ok(result);
                }
                let callable = self.resolve(name, call.args.len())?;
                self.invoke(name, callable, &call.args, None)
            }
            Callee::Method { object, method } => {
                let receiver = self.eval_expr(object)?;
                let object = expect_object(&receiver, method)?;
                let member = object.borrow().get_obj(method);
                let member = member.ok_or_else(|| {
                    Box::new(BrewinError::name_error(format!("Method {} not found", method)))
                })?;
                let callable = callable_from_value(method, member, call.args.len())?;
                self.invoke(method, callable, &call.args, Some(object))
            }
        }
    }

    /// Resolve a call by name: declared functions first, then callable variables
    fn resolve(&self, name: &str, arg_count: usize) -> BrewinResult<Callable> {
        if let Some(def) = self.functions.lookup(name, arg_count) {
            return Ok(Callable::Function(def));
        }
        match self.env.get(name) {
            Some(value) => callable_from_value(name, value, arg_count),
            None => Err(Box::new(BrewinError::undefined_function(name, arg_count))),
        }
    }

    /// Runs one activation of `callable`
    fn invoke(
        &mut self,
        label: &str,
        callable: Callable,
        args: &[Expr],
        this: Option<ObjectRef>,
    ) -> BrewinResult<Value> {
        let def = Rc::clone(callable.def());
        if def.params.len() != args.len() {
            return Err(Box::new(BrewinError::undefined_function(label, args.len())));
        }

        // Closures run on top of their captured snapshot, functions on nothing
        let mut activation = match callable {
            Callable::Closure(closure) => {
                let mut env = Environment::new();
                env.install(closure.captured);
                env.push();
                env
            }
            Callable::Function(_) => Environment::new(),
        };
        if let Some(object) = this {
            activation.create(THIS, Value::Object(object));
        }
        for (param, arg) in def.params.iter().zip(args) {
            self.bind_argument(&mut activation, param, arg)?;
        }

        let frame = format!("{}/{}", label, def.arity());
        debug!(function = %frame, depth = self.call_stack.len() + 1, "call");
        self.call_stack.push(frame);

        let saved = std::mem::replace(&mut self.env, activation);
        let status = self.run_statements(&def.body);
        self.env = saved;

        let status = status.map_err(|e| self.attach_frames(e));
        self.call_stack.pop();
        Ok(status?.into_value())
    }

    /// Binds one formal parameter in the callee's activation
    fn bind_argument(
        &mut self,
        activation: &mut Environment,
        param: &Param,
        arg: &Expr,
    ) -> BrewinResult<()> {
        match arg {
            // Lambda literals capture the caller's bindings at the call site
            Expr::Lambda(def) => {
                let closure = self.make_closure(def, param.by_ref);
                activation.create(&param.name, Value::Closure(closure));
            }
            Expr::Var(name) if param.by_ref => match self.env.slot(name) {
                Some(slot) => activation.bind_ref(&param.name, slot),
                None => {
                    let value = self.read_variable(name)?;
                    activation.create(&param.name, value);
                }
            },
            _ => {
                let value = self.eval_expr(arg)?;
                activation.create(&param.name, value.deep_copy());
            }
        }
        Ok(())
    }

    /// Built-ins take precedence over user functions of the same name
    fn call_builtin(&mut self, name: &str, args: &[Expr]) -> BrewinResult<Option<Value>> {
        match name {
            "print" => {
                let mut line = String::new();
                for arg in args {
                    line.push_str(&self.eval_expr(arg)?.printable());
                }
                self.output.emit(&line);
                Ok(Some(Value::Nil))
            }
            "inputi" | "inputs" => {
                if args.len() > 1 {
                    return Err(Box::new(BrewinError::type_error(format!(
                        "No {}() function that takes > 1 parameter",
                        name
                    ))));
                }
                if let Some(prompt) = args.first() {
                    let prompt = self.eval_expr(prompt)?.printable();
                    self.output.emit(&prompt);
                }
                let line = self.input.read_line().ok_or_else(|| {
                    Box::new(BrewinError::fault(format!("{}() reached end of input", name)))
                })?;
                if name == "inputs" {
                    return Ok(Some(Value::str(&line)));
                }
                let number = line.trim().parse::<i64>().map_err(|_| {
                    Box::new(BrewinError::type_error(format!(
                        "inputi() expected an integer, got \"{}\"",
                        line
                    )))
                })?;
                Ok(Some(Value::Int(number)))
            }
            _ => Ok(None),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a stored value into something callable with `arg_count` arguments
fn callable_from_value(name: &str, value: Value, arg_count: usize) -> BrewinResult<Callable> {
    let not_callable = |ty: Type| {
        Box::new(BrewinError::type_error(format!(
            "{} is not a callable function (it is a {})",
            name, ty
        )))
    };
    match value.callable_arity() {
        None => return Err(not_callable(value.type_of())),
        Some(arity) if arity != arg_count => {
            return Err(Box::new(BrewinError::undefined_function(name, arg_count)));
        }
        Some(_) => {}
    }
    match value {
        Value::Function(def) => Ok(Callable::Function(def)),
        Value::Closure(closure) => Ok(Callable::Closure(closure)),
        other => Err(not_callable(other.type_of())),
    }
}

/// The object behind `value`, for field and method access
fn expect_object(value: &Value, member: &str) -> BrewinResult<ObjectRef> {
    match value {
        Value::Object(object) => Ok(Rc::clone(object)),
        Value::Nil => Err(Box::new(BrewinError::fault(format!(
            "Cannot access member {} of nil",
            member
        )))),
        other => Err(Box::new(BrewinError::type_error(format!(
            "Cannot access member {} of a {} value",
            member,
            other.type_of()
        )))),
    }
}

fn read_field(target: &Value, field: &str) -> BrewinResult<Value> {
    let object = expect_object(target, field)?;
    let object = object.borrow();
    if field == PROTO_FIELD {
        return Ok(object.proto().map(Value::Object).unwrap_or(Value::Nil));
    }
    match object.get_obj(field) {
        Some(Value::Closure(closure)) => Ok(Value::Closure(closure.copied())),
        Some(value) => Ok(value),
        None => Err(Box::new(BrewinError::name_error(format!("Field {} not found", field)))),
    }
}
