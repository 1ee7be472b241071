//! Static resolution pass.
//!
//! This module performs a single AST walk to:
//! 1. **Build lexical scopes**: maintains a stack of `HashMap<String,bool>`
//!    tracking declared (false) and fully defined (true) names in each
//!    nested block or function.
//! 2. **Enforce static rules**: reports errors such as redeclaration in the
//!    same scope, reading a variable in its own initializer, invalid
//!    `return` outside functions, and illegal use of `this`/`super` outside
//!    of class methods.
//! 3. **Record binding distances**: for every resolvable occurrence
//!    (`Variable`, `Assign`, `This`, `Super`), calls back into the
//!    interpreter to note whether it is a local (and at what depth) or a
//!    global.  This enables the runtime to climb exactly the right number
//!    of environment frames.
//!
//! Errors are *collected* rather than thrown, so one pass surfaces every
//! static problem it can find; the driver refuses to execute when any were
//! recorded.  The resolver never mutates the AST.
//!
//! # Usage
//!
//! After parsing, before interpretation:
//! ```ignore
//! let mut resolver = Resolver::new(&mut interpreter);
//! resolver.resolve(&statements);
//! if resolver.had_error() { /* report and bail */ }
//! ```

use std::collections::HashMap;

use log::{debug, info};

use crate::error::SableError;
use crate::expr::{Expr, ExprId};
use crate::interpreter::Interpreter;
use crate::stmt::Stmt;
use crate::token::Token;

/// What kind of function body are we inside?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    /// Not inside any class
    None,

    /// Inside a class declaration _without_ a superclass
    Class,

    /// Inside a class declaration _with_ a superclass
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'interp> {
    interpreter: &'interp mut Interpreter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<SableError>,
}

impl<'interp> Resolver<'interp> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    pub fn errors(&self) -> &[SableError] {
        &self.errors
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    fn error<S: Into<String>>(&mut self, line: usize, message: S) {
        self.errors.push(SableError::resolve(line, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                // 1. Save and enter the class context.
                let enclosing_class: ClassType = self.current_class;
                self.current_class = ClassType::Class;

                // 2. Declare & define the class name so methods can refer
                //    to it.
                self.declare(name);
                self.define(name);

                if let Some(superclass_expr) = superclass {
                    // 3. Self‑inheritance guard.
                    if let Expr::Variable {
                        name: super_name, ..
                    } = superclass_expr
                    {
                        if super_name.lexeme == name.lexeme {
                            self.error(super_name.line, "A class cannot inherit from itself");
                        }
                    }

                    // 4. Resolve the superclass variable and bind `super`
                    //    in its own scope around the methods.
                    self.current_class = ClassType::Subclass;
                    self.resolve_expr(superclass_expr);

                    self.begin_scope();
                    self.scopes
                        .last_mut()
                        .unwrap()
                        .insert("super".to_string(), true);
                }

                // 5. Open the implicit `this` scope for methods.
                self.begin_scope();
                self.scopes
                    .last_mut()
                    .unwrap()
                    .insert("this".to_string(), true);

                // 6. Resolve each method in its own function context;
                //    `init` gets the initializer context.
                for method in methods {
                    let kind = if method.name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };

                    self.resolve_function(kind, &method.params, &method.body);
                }

                // 7. Close the `this` scope, then the `super` scope if one
                //    was opened.
                self.end_scope();

                if superclass.is_some() {
                    self.end_scope();
                }

                // 8. Restore the outer class context.
                self.current_class = enclosing_class;
            }

            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // Declared first, defined only after the initializer has
                // been resolved, so `var a = a;` is caught in between.
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::Function(declaration) => {
                // Defined eagerly so the function can recurse.
                self.declare(&declaration.name);
                self.define(&declaration.name);

                self.resolve_function(
                    FunctionType::Function,
                    &declaration.params,
                    &declaration.body,
                );
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword.line, "Cannot return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword.line, "Cannot return a value from an initializer");
                    }

                    self.resolve_expr(expr);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {
                // Literals have no sub‑expressions.
            }

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                // Reading a local inside its own initializer is the one
                // case where a name is declared but not yet defined.
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(
                            name.line,
                            "Cannot read local variable in its own initializer.",
                        );
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => {
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword.line, "Cannot use 'this' outside a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                if self.current_class == ClassType::None {
                    self.error(keyword.line, "Cannot use 'super' outside of a class");
                } else if self.current_class != ClassType::Subclass {
                    self.error(
                        keyword.line,
                        "Cannot use 'super' inside a class with no superclass",
                    );
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, kind: FunctionType, params: &[Token], body: &[Stmt]) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();

        for param in params {
            self.declare(param);
            self.define(param);
        }

        for stmt in body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Mark the name as declared but not yet defined.  The global scope is
    /// the empty stack, where redeclaration is allowed.
    fn declare(&mut self, name: &Token) {
        if self.scopes.is_empty() {
            return;
        }

        if self.scopes.last().unwrap().contains_key(&name.lexeme) {
            self.error(
                name.line,
                "Variable with this name already declared in this scope.",
            );
        }

        self.scopes
            .last_mut()
            .unwrap()
            .insert(name.lexeme.clone(), false);
    }

    /// Mark the name as fully defined in the current scope.
    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at its depth, or fall through to
    /// the globals by recording nothing.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
