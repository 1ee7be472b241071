use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::callable::{SableClass, SableFunction, SableInstance};
use crate::environment::Environment;
use crate::error::{Result, SableError};
use crate::expr::{Expr, ExprId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Non-local control transfer during evaluation: a `return` on its way out
/// of the innermost user function, or a runtime failure unwinding to the
/// top-level `interpret` entry.  Reserved for exactly those two; ordinary
/// results flow through `Ok`.
#[derive(Debug)]
pub enum Interrupt {
    Return(Value),
    Failure(SableError),
}

impl From<SableError> for Interrupt {
    fn from(error: SableError) -> Self {
        Interrupt::Failure(error)
    }
}

/// Evaluator-internal result: every execute/evaluate signature threads the
/// `Interrupt` carrier so `?` propagates both returns and failures.
pub type EvalResult<T> = std::result::Result<T, Interrupt>;

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    /// Resolution side table: reference node identity → hop count.  Written
    /// by the resolver, read here.  No entry means the globals.
    locals: HashMap<ExprId, usize>,
    output: Rc<RefCell<dyn Write>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    /// Build an interpreter whose `print` statements write to the given
    /// sink instead of standard output.
    pub fn with_output(output: Rc<RefCell<dyn Write>>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: native_clock,
            },
        );

        info!("Interpreter initialised with native functions in globals");

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record the resolver's hop count for a reference node.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Run a top-level statement batch.  A runtime error abandons the rest
    /// of the batch but leaves the interpreter usable for the next one.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        for statement in statements {
            if let Err(interrupt) = self.execute(statement) {
                return Err(match interrupt {
                    Interrupt::Failure(error) => error,

                    // The resolver rejects top-level `return`, so a Return
                    // can only get this far after a skipped static pass.
                    Interrupt::Return(_) => {
                        SableError::runtime(0, "Cannot return from top-level code.")
                    }
                });
            }
        }

        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.output.borrow_mut(), "{}", value).map_err(SableError::from)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                // A fresh global is visible to its own initializer as nil;
                // local self-reference is rejected by the resolver instead.
                let at_global = Rc::ptr_eq(&self.environment, &self.globals);

                if at_global && !self.globals.borrow().is_defined(&name.lexeme) {
                    self.globals.borrow_mut().define(&name.lexeme, Value::Nil);
                }

                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                let function = SableFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Interrupt::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass, methods),
        }
    }

    /// Run `statements` with `environment` as the current scope, restoring
    /// the previous scope on every exit path, normal or interrupted.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> EvalResult<()> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let result = statements
            .iter()
            .try_for_each(|statement| self.execute(statement));

        self.environment = previous;

        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: &Option<Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> EvalResult<()> {
        debug!("Declaring class {}", name.lexeme);

        let superclass_value = match superclass {
            Some(expr) => {
                let line = match expr {
                    Expr::Variable { name, .. } => name.line,
                    _ => name.line,
                };

                match self.evaluate(expr)? {
                    Value::Class(class) => Some(class),

                    _ => {
                        return Err(
                            SableError::runtime(line, "Superclass must be a class.").into()
                        );
                    }
                }
            }

            None => None,
        };

        // Two-step definition so method bodies can refer to the class by
        // name before the class value exists.
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        // With a superclass, methods close over an extra environment that
        // binds `super`; `this` is bound one level nearer, at bind time.
        let method_closure = match &superclass_value {
            Some(class) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                environment
                    .borrow_mut()
                    .define("super", Value::Class(Rc::clone(class)));

                environment
            }

            None => Rc::clone(&self.environment),
        };

        let mut method_map: HashMap<String, SableFunction> = HashMap::new();

        for method in methods {
            let is_initializer = method.name.lexeme == "init";

            let function =
                SableFunction::new(Rc::clone(method), Rc::clone(&method_closure), is_initializer);

            method_map.insert(method.name.lexeme.clone(), function);
        }

        let class = SableClass::new(name.lexeme.clone(), superclass_value, method_map);

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, Value::Class(Rc::new(class)), name.line)?;

        Ok(())
    }

    pub fn evaluate(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Variable { id, name } => Ok(self.look_up_variable(name, *id)?),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => {
                        self.globals
                            .borrow_mut()
                            .assign(&name.lexeme, value.clone(), name.line)?
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Ok(SableInstance::get(&instance, name)?),

                _ => Err(SableError::runtime(name.line, "Only instances have properties.").into()),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value = self.evaluate(value)?;

                    instance.borrow_mut().set(name, value.clone());

                    Ok(value)
                }

                _ => Err(SableError::runtime(name.line, "Only instance have fields").into()),
            },

            Expr::This { id, keyword } => Ok(self.look_up_variable(keyword, *id)?),

            Expr::Super { id, keyword, method } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_literal(&self, token: &Token) -> EvalResult<Value> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),

            TokenType::STRING(s) => Ok(Value::String(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            _ => Err(SableError::runtime(token.line, "Invalid literal").into()),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> EvalResult<Value> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(SableError::runtime(operator.line, "Operand must be a number").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => Err(SableError::runtime(operator.line, "Invalid unary operator").into()),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> EvalResult<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(SableError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => {
                let (a, b) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Number(a * b))
            }

            // Division is IEEE-754; dividing by zero yields an infinity.
            TokenType::SLASH => {
                let (a, b) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left, &right))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left, &right))),

            _ => Err(SableError::runtime(operator.line, "Invalid binary operator").into()),
        }
    }

    /// Short-circuiting `and`/`or`; operands pass through uncoerced.
    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> EvalResult<Value> {
        let left: Value = self.evaluate(left)?;

        match operator.token_type {
            TokenType::OR if is_truthy(&left) => Ok(left),

            TokenType::AND if !is_truthy(&left) => Ok(left),

            _ => self.evaluate(right),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> EvalResult<Value> {
        let callee: Value = self.evaluate(callee)?;

        // Argument order is user-observable: strictly left to right.
        let mut evaluated: Vec<Value> = Vec::with_capacity(arguments.len());

        for argument in arguments {
            evaluated.push(self.evaluate(argument)?);
        }

        match callee {
            Value::NativeFunction { arity, func, .. } => {
                check_arity(arity, evaluated.len(), paren)?;

                Ok(func(&evaluated)?)
            }

            Value::Function(function) => {
                check_arity(function.arity(), evaluated.len(), paren)?;

                function.call(self, evaluated)
            }

            Value::Class(class) => {
                check_arity(class.arity(), evaluated.len(), paren)?;

                SableClass::instantiate(&class, self, evaluated)
            }

            _ => Err(SableError::runtime(paren.line, "Can only call functions and classes.").into()),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> EvalResult<Value> {
        let distance = match self.locals.get(&id) {
            Some(&distance) => distance,

            None => {
                return Err(SableError::runtime(
                    keyword.line,
                    "Cannot use 'super' outside of a class",
                )
                .into());
            }
        };

        let superclass = match Environment::get_at(&self.environment, distance, "super", keyword.line)? {
            Value::Class(class) => class,

            _ => return Err(SableError::runtime(keyword.line, "Superclass must be a class.").into()),
        };

        // `this` always sits one environment nearer than `super`.
        let instance =
            match Environment::get_at(&self.environment, distance - 1, "this", keyword.line)? {
                Value::Instance(instance) => instance,

                _ => {
                    return Err(SableError::runtime(
                        keyword.line,
                        "Cannot use 'super' outside of a class",
                    )
                    .into());
                }
            };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),

            None => Err(SableError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            )
            .into()),
        }
    }

    /// Resolver-certified lookup: a recorded distance means `get_at`; no
    /// entry falls back to the globals.
    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::get_at(&self.environment, distance, &name.lexeme, name.line)
            }

            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// `nil` and `false` are falsey; every other value is truthy, including `0`
/// and the empty string.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

/// Structural equality for nil/booleans/numbers/strings, identity for
/// callables and instances.
pub fn is_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,

        (Value::Number(a), Value::Number(b)) => a == b,

        (Value::String(a), Value::String(b)) => a == b,

        (Value::Bool(a), Value::Bool(b)) => a == b,

        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),

        (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),

        (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),

        (Value::NativeFunction { func: a, .. }, Value::NativeFunction { func: b, .. }) => a == b,

        _ => false,
    }
}

fn check_number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),

        _ => Err(SableError::runtime(operator.line, "Operands must be numbers")),
    }
}

fn check_arity(expected: usize, provided: usize, paren: &Token) -> Result<()> {
    if provided == expected {
        return Ok(());
    }

    Err(SableError::runtime(
        paren.line,
        format!("Expected {} arguments but got {}.", expected, provided),
    ))
}

/// Wall-clock seconds since the Unix epoch, millisecond resolution or
/// better.
fn native_clock(_arguments: &[Value]) -> Result<Value> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|error| SableError::runtime(0, format!("Clock error: {}", error)))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
