// File: src/interpreter/value.rs
//
// Runtime value types for the Brewin language.
// Defines every value that can be represented and manipulated at runtime,
// the type tags used by operator dispatch, and the copy rules applied when
// values are assigned, passed or returned.

use super::environment::ScopeRef;
use crate::ast::FuncDef;
use ahash::AHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Runtime type tag carried by every value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,
    String,
    Nil,
    Function,
    Closure,
    Object,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Int => "int",
            Type::Bool => "bool",
            Type::String => "string",
            Type::Nil => "nil",
            Type::Function => "function",
            Type::Closure => "closure",
            Type::Object => "object",
        };
        f.write_str(name)
    }
}

/// A lambda (or function) node paired with the bindings it captured
///
/// `id` identifies the creation event: copies of a closure keep the id of the
/// closure they were copied from, so equality is identity of origin.
#[derive(Clone)]
pub struct Closure {
    pub id: u64,
    pub def: Rc<FuncDef>,
    pub captured: ScopeRef,
    pub by_ref: bool,
}

impl Closure {
    /// Copy used whenever a closure value is read out of storage
    ///
    /// Reference captures share the snapshot; value captures get their own.
    pub fn copied(&self) -> Closure {
        if self.by_ref {
            self.clone()
        } else {
            self.detached()
        }
    }

    /// Copy with an independent snapshot, regardless of the reference flag
    pub fn detached(&self) -> Closure {
        let snapshot = self.captured.borrow().deep_copy();
        Closure {
            id: self.id,
            def: Rc::clone(&self.def),
            captured: Rc::new(RefCell::new(snapshot)),
            by_ref: self.by_ref,
        }
    }
}

/// Prototype-capable object: own fields plus an optional parent
#[derive(Default)]
pub struct Object {
    fields: AHashMap<String, Value>,
    proto: Option<ObjectRef>,
}

pub type ObjectRef = Rc<RefCell<Object>>;

/// Reserved field name that reads and writes the prototype link
pub const PROTO_FIELD: &str = "proto";

impl Object {
    pub fn new_ref() -> ObjectRef {
        Rc::new(RefCell::new(Object::default()))
    }

    pub fn proto(&self) -> Option<ObjectRef> {
        self.proto.clone()
    }

    pub fn set_proto(&mut self, proto: Option<ObjectRef>) {
        self.proto = proto;
    }

    /// Insert or overwrite a field on this object (never on the prototype)
    pub fn add_or_update(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    /// Field lookup: own fields first, then up the prototype chain
    pub fn get_obj(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.fields.get(name) {
            return Some(value.clone());
        }
        let mut next = self.proto.clone();
        while let Some(object) = next {
            let object = object.borrow();
            if let Some(value) = object.fields.get(name) {
                return Some(value.clone());
            }
            next = object.proto.clone();
        }
        None
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// True when `candidate` appears somewhere on the chain starting at `start`
pub fn chain_contains(start: &ObjectRef, candidate: &ObjectRef) -> bool {
    let mut next = Some(Rc::clone(start));
    while let Some(object) = next {
        if Rc::ptr_eq(&object, candidate) {
            return true;
        }
        next = object.borrow().proto.clone();
    }
    false
}

/// Runtime values in the Brewin interpreter
#[derive(Clone)]
pub enum Value {
    /// 64-bit signed integer
    Int(i64),
    Bool(bool),
    /// String value (reference-counted for cheap cloning)
    Str(Rc<str>),
    Nil,
    /// Reference to a declared function
    Function(Rc<FuncDef>),
    Closure(Closure),
    /// Objects alias on assignment; they are never implicitly copied
    Object(ObjectRef),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn type_of(&self) -> Type {
        match self {
            Value::Int(_) => Type::Int,
            Value::Bool(_) => Type::Bool,
            Value::Str(_) => Type::String,
            Value::Nil => Type::Nil,
            Value::Function(_) => Type::Function,
            Value::Closure(_) => Type::Closure,
            Value::Object(_) => Type::Object,
        }
    }

    /// Value-copy applied on assignment into a fresh binding, argument
    /// passing and return. Closures get an independent snapshot unless they
    /// are reference captures; objects keep their identity.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Closure(closure) => Value::Closure(closure.copied()),
            other => other.clone(),
        }
    }

    /// Number of parameters if this value can be called
    pub fn callable_arity(&self) -> Option<usize> {
        match self {
            Value::Function(def) => Some(def.arity()),
            Value::Closure(closure) => Some(closure.def.arity()),
            _ => None,
        }
    }

    /// Text emitted by `print` and input prompts
    pub fn printable(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => "false".to_string(),
            Value::Str(s) => s.to_string(),
            Value::Nil => String::new(),
            Value::Function(def) => format!("<function {}/{}>", def.name, def.arity()),
            Value::Closure(_) => "<closure>".to_string(),
            Value::Object(_) => "<object>".to_string(),
        }
    }

    /// Equality defined for every pair of values; differing types are unequal
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => a.id == b.id,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "Int({})", n),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Str(s) => write!(f, "Str({:?})", s.as_ref()),
            Value::Nil => write!(f, "Nil"),
            Value::Function(def) => write!(f, "Function({}/{})", def.name, def.arity()),
            Value::Closure(closure) => {
                let captured = closure.captured.borrow().len();
                let mode = if closure.by_ref { " ref" } else { "" };
                write!(f, "Closure(#{}, {} captured{})", closure.id, captured, mode)
            }
            Value::Object(object) => write!(f, "Object({} fields)", object.borrow().field_count()),
        }
    }
}

/// Structural comparison for primitives, identity for everything else
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}
