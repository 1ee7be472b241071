//! Runtime representations of user-declared callables: functions (and bound
//! methods), classes, and class instances.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::environment::Environment;
use crate::error::{Result, SableError};
use crate::interpreter::{EvalResult, Interpreter, Interrupt};
use crate::stmt::FunctionDecl;
use crate::token::Token;
use crate::value::Value;

/// A user function or bound method: the shared declaration, the environment
/// captured at declaration time, and whether it is an `init` method.
#[derive(Clone)]
pub struct SableFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl SableFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        SableFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Produce a copy whose closure is a fresh child environment binding
    /// `this` to the given instance.  The original function is untouched.
    pub fn bind(&self, instance: Rc<RefCell<SableInstance>>) -> SableFunction {
        let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &self.closure,
        ))));

        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        SableFunction {
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> EvalResult<Value> {
        debug!("Calling <function {}>", self.name());

        let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &self.closure,
        ))));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => {}

            Err(Interrupt::Return(value)) if !self.is_initializer => return Ok(value),

            // An initializer's return value is discarded; `this` wins below.
            Err(Interrupt::Return(_)) => {}

            Err(failure) => return Err(failure),
        }

        if self.is_initializer {
            let this = Environment::get_at(&self.closure, 0, "this", self.declaration.name.line)?;
            return Ok(this);
        }

        Ok(Value::Nil)
    }
}

impl fmt::Debug for SableFunction {
    // Manual: the closure chain can be cyclic through recursive functions.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name())
    }
}

/// A class: its name, optional superclass, and method table.
pub struct SableClass {
    name: String,
    superclass: Option<Rc<SableClass>>,
    methods: HashMap<String, SableFunction>,
}

impl SableClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<SableClass>>,
        methods: HashMap<String, SableFunction>,
    ) -> Self {
        SableClass {
            name,
            superclass,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Walk the superclass chain; the nearest definition wins.
    pub fn find_method(&self, name: &str) -> Option<&SableFunction> {
        if let Some(method) = self.methods.get(name) {
            return Some(method);
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// A class is called with its initializer's arity, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, SableFunction::arity)
    }

    /// Calling a class constructs an instance, runs `init` when declared,
    /// and always yields the new instance.
    pub fn instantiate(
        class: &Rc<SableClass>,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> EvalResult<Value> {
        debug!("Instantiating class {}", class.name);

        let instance = Rc::new(RefCell::new(SableInstance::new(Rc::clone(class))));

        if let Some(initializer) = class.find_method("init") {
            initializer
                .bind(Rc::clone(&instance))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for SableClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

/// An instance: a back-reference to its class and its own field map.
pub struct SableInstance {
    class: Rc<SableClass>,
    fields: HashMap<String, Value>,
}

impl SableInstance {
    pub fn new(class: Rc<SableClass>) -> Self {
        SableInstance {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// Property access: fields shadow methods; a method comes back bound to
    /// this instance.
    pub fn get(instance: &Rc<RefCell<SableInstance>>, name: &Token) -> Result<Value> {
        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = instance.borrow().class.find_method(&name.lexeme) {
            return Ok(Value::Function(Rc::new(method.bind(Rc::clone(instance)))));
        }

        Err(SableError::runtime(
            name.line,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    /// Fields are created on first set.
    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for SableInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}instance", self.class_name())
    }
}
