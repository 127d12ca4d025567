// File: src/interpreter/functions.rs
//
// Function table: maps (name, arity) to function definitions.
// Several arities of one name are overloads resolved by argument count.

use crate::ast::{FuncDef, Program};
use crate::errors::{BrewinError, BrewinResult};
use ahash::AHashMap;
use std::rc::Rc;

#[derive(Default)]
pub struct FunctionTable {
    by_name: AHashMap<String, AHashMap<usize, Rc<FuncDef>>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table for a program; a repeated (name, arity) pair is rejected
    pub fn from_program(program: &Program) -> BrewinResult<Self> {
        let mut table = FunctionTable::new();
        for def in &program.functions {
            table.define(Rc::clone(def))?;
        }
        Ok(table)
    }

    pub fn define(&mut self, def: Rc<FuncDef>) -> BrewinResult<()> {
        let arity = def.arity();
        let overloads = self.by_name.entry(def.name.clone()).or_default();
        if overloads.contains_key(&arity) {
            return Err(Box::new(BrewinError::name_error(format!(
                "Function {} taking {} params is defined more than once",
                def.name, arity
            ))));
        }
        overloads.insert(arity, def);
        Ok(())
    }

    /// Definition of `name` taking exactly `arity` parameters
    pub fn lookup(&self, name: &str, arity: usize) -> Option<Rc<FuncDef>> {
        self.by_name.get(name)?.get(&arity).cloned()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// The single definition of `name`, for using a function as a value
    ///
    /// `Ok(None)` when no function has that name; an error when the name has
    /// several overloads and cannot be disambiguated without a call.
    pub fn unique(&self, name: &str) -> BrewinResult<Option<Rc<FuncDef>>> {
        let Some(overloads) = self.by_name.get(name) else {
            return Ok(None);
        };
        if overloads.len() > 1 {
            return Err(Box::new(BrewinError::name_error(format!(
                "Ambiguous Function call for {}",
                name
            ))));
        }
        Ok(overloads.values().next().cloned())
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(|overloads| overloads.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
