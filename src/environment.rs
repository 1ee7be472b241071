use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Result, SableError};
use crate::value::Value;

/// One lexical scope: a name → value map with an optional link to the
/// enclosing scope, forming a chain from innermost out to the globals.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Unconditionally bind `name` in this scope.  Redefinition is allowed
    /// here; the resolver separately forbids it for locals.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Whether this scope itself binds `name`.  No chain walk.
    pub fn is_defined(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(SableError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Overwrite an existing binding, searching outward.  Never creates one.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(SableError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Read from the scope exactly `distance` hops up the chain, touching
    /// only that scope's local map.  The access is resolver-certified, so a
    /// miss here indicates a resolver defect rather than a user error.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Value> {
        let target = Environment::ancestor(env, distance, name, line)?;

        let value = target.borrow().values.get(name).cloned();

        value.ok_or_else(|| SableError::runtime(line, format!("Undefined variable '{}'.", name)))
    }

    /// Write into the scope exactly `distance` hops up the chain.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let target = Environment::ancestor(env, distance, name, line)?;

        target.borrow_mut().values.insert(name.to_string(), value);

        Ok(())
    }

    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Rc<RefCell<Environment>>> {
        let mut current = Rc::clone(env);

        for _ in 0..distance {
            let enclosing = current.borrow().enclosing.clone();

            current = enclosing.ok_or_else(|| {
                SableError::runtime(line, format!("Undefined variable '{}'.", name))
            })?;
        }

        Ok(current)
    }
}
