// File: src/interpreter/environment.rs
//
// Lexical scoping environment for variable management in the Brewin interpreter.
// Implements a stack of scopes where inner scopes shadow outer scopes, plus
// the two aliasing mechanisms of the language: reference bindings and
// closure snapshots.

use super::value::Value;
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared, mutable storage cell behind a binding
pub type Slot = Rc<RefCell<Value>>;

/// Association of a name to a storage cell
///
/// An ordinary binding owns its slot and is rebound on assignment. A
/// reference binding aliases a slot owned elsewhere; assignment writes into
/// that slot so every alias observes the write.
#[derive(Clone)]
pub struct Binding {
    slot: Slot,
    is_ref: bool,
}

impl Binding {
    pub fn owned(value: Value) -> Self {
        Binding { slot: Rc::new(RefCell::new(value)), is_ref: false }
    }

    pub fn alias(slot: Slot) -> Self {
        Binding { slot, is_ref: true }
    }

    pub fn value(&self) -> Value {
        self.slot.borrow().clone()
    }
}

/// One level of the environment stack
#[derive(Clone, Default)]
pub struct Scope {
    bindings: AHashMap<String, Binding>,
}

pub type ScopeRef = Rc<RefCell<Scope>>;

impl Scope {
    /// Bind `name` in this scope, replacing any binding it already had here
    pub fn create(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), Binding::owned(value));
    }

    /// Bind `name` to an existing slot as a reference
    pub fn bind_ref(&mut self, name: &str, slot: Slot) {
        self.bindings.insert(name.to_string(), Binding::alias(slot));
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).map(Binding::value)
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Overwrite an existing binding; returns false if `name` is not bound here
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.bindings.get_mut(name) {
            Some(binding) if binding.is_ref => {
                *binding.slot.borrow_mut() = value;
                true
            }
            Some(binding) => {
                *binding = Binding::owned(value);
                true
            }
            None => false,
        }
    }

    /// Independent copy: values are value-copied into fresh slots, reference
    /// bindings keep sharing the slot they alias
    pub fn deep_copy(&self) -> Scope {
        let bindings = self
            .bindings
            .iter()
            .map(|(name, binding)| {
                let copy = if binding.is_ref {
                    binding.clone()
                } else {
                    Binding::owned(binding.slot.borrow().deep_copy())
                };
                (name.clone(), copy)
            })
            .collect();
        Scope { bindings }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Variable storage for one activation using lexical scoping
///
/// The Environment maintains a stack of scopes. When looking up a variable,
/// we search from the innermost scope (end of Vec) outward. Scopes are shared
/// cells so that a closure's captured snapshot can be installed as a scope
/// and keep the writes made during the call.
///
/// # Examples
///
/// ```
/// use brewin::interpreter::{Environment, Value};
///
/// let mut env = Environment::new();
/// env.create("x", Value::Int(10));
///
/// env.push();
/// env.create("x", Value::Int(20));
/// assert_eq!(env.get("x"), Some(Value::Int(20)));
///
/// env.pop();
/// assert_eq!(env.get("x"), Some(Value::Int(10)));
/// ```
#[derive(Clone)]
pub struct Environment {
    scopes: Vec<ScopeRef>,
}

impl Environment {
    /// Create a new environment with a single empty scope
    pub fn new() -> Self {
        Environment { scopes: vec![Rc::default()] }
    }

    /// Begin a new lexical scope
    pub fn push(&mut self) {
        self.scopes.push(Rc::default());
        tracing::trace!(depth = self.scopes.len(), "push scope");
    }

    /// Push an existing scope, e.g. a closure's captured snapshot
    pub fn install(&mut self, scope: ScopeRef) {
        self.scopes.push(scope);
        tracing::trace!(depth = self.scopes.len(), "install scope");
    }

    /// Discard the innermost scope and everything declared in it
    ///
    /// The outermost scope is never popped.
    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            tracing::trace!(depth = self.scopes.len(), "pop scope");
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn innermost(&self) -> &ScopeRef {
        // Invariant: the stack always holds at least one scope
        &self.scopes[self.scopes.len() - 1]
    }

    /// Bind `name` in the innermost scope, shadowing any outer binding
    pub fn create(&mut self, name: &str, value: Value) {
        self.innermost().borrow_mut().create(name, value);
    }

    /// Bind `name` in the innermost scope as an alias of `slot`
    pub fn bind_ref(&mut self, name: &str, slot: Slot) {
        self.innermost().borrow_mut().bind_ref(name, slot);
    }

    /// Get a variable, searching from inner to outer scopes
    pub fn get(&self, name: &str) -> Option<Value> {
        self.scopes.iter().rev().find_map(|scope| scope.borrow().get(name))
    }

    /// Storage cell currently bound to `name`, for reference passing
    pub fn slot(&self, name: &str) -> Option<Slot> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.borrow().binding(name).map(|b| Rc::clone(&b.slot)))
    }

    /// Set an existing variable, searching from inner to outer scopes.
    /// The write lands in the scope where the binding was found; if it is
    /// not found anywhere it is created in the innermost scope.
    pub fn set(&mut self, name: &str, value: Value) {
        for scope in self.scopes.iter().rev() {
            let mut scope = scope.borrow_mut();
            if scope.contains(name) {
                scope.set(name, value);
                return;
            }
        }
        self.create(name, value);
    }

    /// Flatten every visible binding into one independent scope
    ///
    /// Inner bindings shadow outer ones. Values are value-copied; reference
    /// bindings keep aliasing their slot.
    pub fn snapshot(&self) -> Scope {
        let mut flat = Scope::default();
        for scope in &self.scopes {
            let copy = scope.borrow().deep_copy();
            flat.bindings.extend(copy.bindings);
        }
        flat
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
