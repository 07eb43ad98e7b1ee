//! Tree‑walking evaluator.
//!
//! Variables are addressed by the scope distance the resolver recorded for
//! each expression node; expressions with no recorded distance are looked up
//! by name in the global frame. `return` travels as [`Flow::Return`] through
//! statement execution and is absorbed at the enclosing call boundary, so
//! runtime errors are the only thing carried on the `Err` path.

use std::cell::RefCell;
use std::collections::HashMap;
use std::mem;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::ast_printer::AstPrinter;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::output::{Output, Stdout};
use crate::token::{Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, NativeFunction, Value};

/// Deepest chain of active user calls before evaluation gives up with a
/// "Stack overflow." runtime error instead of exhausting the host stack.
pub const MAX_CALL_DEPTH: usize = 200;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Ran to completion; continue with the next statement.
    Normal,

    /// A `return` is unwinding to the nearest call boundary.
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Output>,
    depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(Stdout))
    }

    /// Creates an interpreter whose `print` writes to `output`, and defines
    /// the native functions `print`, `sleep` and `clock`.
    pub fn with_output(output: Box<dyn Output>) -> Self {
        info!("Initializing Interpreter");

        let natives: [NativeFunction; 3] = [
            NativeFunction {
                name: "print",
                arity: 1,
                func: native_print,
            },
            NativeFunction {
                name: "sleep",
                arity: 1,
                func: native_sleep,
            },
            NativeFunction {
                name: "clock",
                arity: 0,
                func: native_clock,
            },
        ];

        let builtins: HashMap<String, Value> = natives
            .into_iter()
            .map(|native| {
                debug!("Defining native function '{}'", native.name);
                (native.name.to_string(), Value::Native(Rc::new(native)))
            })
            .collect();

        let globals: EnvRef = Rc::new(RefCell::new(Environment::with_values(builtins)));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
            depth: 0,
        }
    }

    // ───────────────────────── resolver interface ─────────────────────────

    /// Names currently bound in the global frame.
    pub fn globals(&self) -> Vec<String> {
        self.globals.borrow().names()
    }

    /// Record that expression `id` refers to a binding `distance` frames up.
    pub fn record_distance(&mut self, id: ExprId, distance: usize) {
        debug!("Recording distance {} for expression {:?}", distance, id);

        self.locals.insert(id, distance);
    }

    /// The resolution side table (expression id → scope distance).
    pub fn locals(&self) -> &HashMap<ExprId, usize> {
        &self.locals
    }

    pub fn distance_of(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    // ─────────────────────────── execution ────────────────────────────────

    /// Interprets a list of statements (a "program").
    ///
    /// With `catch_runtime_errors` a runtime error is reported to the output
    /// sink as `[line] message` followed by `nil`, and `Ok(())` is returned;
    /// otherwise it propagates to the caller.
    pub fn interpret(&mut self, statements: &[Stmt], catch_runtime_errors: bool) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}

                Ok(Flow::Return(value)) => {
                    warn!("'return' escaped to top level with value {}", value);
                    break;
                }

                Err(e) if catch_runtime_errors && e.is_runtime() => {
                    debug!("Runtime error caught at top level: {}", e);
                    self.environment = Rc::clone(&self.globals);
                    self.output.write_line(&e.to_string());
                    self.output.write_line("nil");
                    return Ok(());
                }

                Err(e) => return Err(e),
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        debug!("Executing statement: {}", AstPrinter::print_stmt(stmt));

        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.define(name, value)?;
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let env: EnvRef = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, env)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = LoxFunction::new(Rc::clone(declaration), Rc::clone(&self.environment));
                self.define(&declaration.name, Value::Function(Rc::new(function)))?;
                Ok(Flow::Normal)
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.declare_class(name, superclass.as_ref(), methods)?;
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }
        }
    }

    /// Runs `statements` with `env` as the current frame, restoring the
    /// previous frame afterwards whether or not execution succeeded.
    pub fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> Result<Flow> {
        let previous: EnvRef = mem::replace(&mut self.environment, env);
        let result: Result<Flow> = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    fn define(&mut self, name: &Token, value: Value) -> Result<()> {
        self.environment
            .borrow_mut()
            .define(&name.lexeme, value)
            .map_err(|msg| LoxError::runtime(name.line, msg))
    }

    fn declare_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        debug!("Declaring class '{}'", name.lexeme);

        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                other => {
                    let line: usize = match expr {
                        Expr::Variable { name: parent, .. } => parent.line,
                        _ => name.line,
                    };

                    return Err(LoxError::runtime(
                        line,
                        format!("Superclass must be a class, got {}.", other.type_name()),
                    ))
                }
            },
            None => None,
        };

        // Methods of a subclass close over an extra frame holding `super`.
        let method_env: EnvRef = match &superclass {
            Some(class) => Environment::with_binding(
                Rc::clone(&self.environment),
                "super",
                Value::Class(Rc::clone(class)),
            ),
            None => Rc::clone(&self.environment),
        };

        let table: HashMap<String, Rc<LoxFunction>> = methods
            .iter()
            .map(|decl| {
                (
                    decl.name.lexeme.clone(),
                    Rc::new(LoxFunction::new(Rc::clone(decl), Rc::clone(&method_env))),
                )
            })
            .collect();

        let class = LoxClass::new(name.lexeme.clone(), superclass, table);

        info!(
            "Class '{}' defined (constructor arity {})",
            class.name,
            class.arity()
        );

        self.define(name, Value::Class(Rc::new(class)))
    }

    // ─────────────────────────── expressions ──────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;
                self.evaluate_unary(operator, right)
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;
                evaluate_binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit: bool = match operator.token_type {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                let assigned = match self.distance_of(*id) {
                    Some(distance) => self.environment.borrow_mut().assign_at(
                        distance,
                        &name.lexeme,
                        value.clone(),
                    ),
                    None => self.globals.borrow_mut().assign(&name.lexeme, value.clone()),
                };

                assigned.map_err(|msg| LoxError::runtime(name.line, msg))?;
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.call_value(&callee, args, paren)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),
                other => Err(LoxError::runtime(
                    name.line,
                    format!(
                        "Only instances have properties; '{}' is a {}.",
                        name.lexeme,
                        other.type_name()
                    ),
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name.line, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        let value = match self.distance_of(id) {
            Some(distance) => self.environment.borrow().get_at(distance, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        };

        value.map_err(|msg| LoxError::runtime(name.line, msg))
    }

    fn evaluate_super(&self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let distance: usize = self.distance_of(id).ok_or_else(|| {
            LoxError::runtime(keyword.line, "Unresolved 'super' expression.")
        })?;

        let env = self.environment.borrow();
        let in_scope = |name: &str, distance: usize| {
            env.get_at(distance, name)
                .map_err(|msg| LoxError::runtime(keyword.line, msg))
        };

        // `this` always sits in the frame just inside the one holding `super`.
        let (Value::Class(superclass), Value::Instance(instance)) =
            (in_scope("super", distance)?, in_scope("this", distance.saturating_sub(1))?)
        else {
            return Err(LoxError::runtime(
                keyword.line,
                "Malformed 'super' binding.",
            ));
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),
            None => Err(LoxError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn evaluate_unary(&self, operator: &Token, right: Value) -> Result<Value> {
        match (&operator.token_type, right) {
            (TokenType::MINUS, Value::Number(n)) => Ok(Value::Number(-n)),
            (TokenType::BANG, value) => Ok(Value::Bool(!value.is_truthy())),
            (_, value) => Err(LoxError::runtime(
                operator.line,
                format!(
                    "Operand of '{}' must be a number, got {}.",
                    operator.lexeme,
                    value.type_name()
                ),
            )),
        }
    }

    // ──────────────────────────── calls ───────────────────────────────────

    /// Invokes a callable (native, user function, or class constructor).
    fn call_value(&mut self, callee: &Value, args: Vec<Value>, paren: &Token) -> Result<Value> {
        match callee {
            Value::Native(native) => {
                check_arity(native.arity, args.len(), paren)?;
                debug!("Calling native function '{}'", native.name);
                (native.func)(self, &args, paren)
            }

            Value::Function(function) => {
                check_arity(function.arity(), args.len(), paren)?;
                self.call_function(function, args, paren)
            }

            Value::Class(class) => {
                check_arity(class.arity(), args.len(), paren)?;
                debug!("Constructing instance of '{}'", class.name);

                let instance: Rc<LoxInstance> = LoxInstance::new(Rc::clone(class));

                if let Some(init) = class.initializer() {
                    let bound: LoxFunction = init.bind(Rc::clone(&instance));
                    self.call_function(&bound, args, paren)?;
                }

                Ok(Value::Instance(instance))
            }

            other => Err(LoxError::runtime(
                paren.line,
                format!("Can only call functions and classes, got {}.", other.type_name()),
            )),
        }
    }

    /// Runs a user function in a new frame whose parent is its closure.
    fn call_function(&mut self, function: &LoxFunction, args: Vec<Value>, paren: &Token) -> Result<Value> {
        debug!("Calling user-defined function '{}'", function.name());

        if self.depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(paren.line, "Stack overflow."));
        }

        let mut frame = Environment::with_enclosing(Rc::clone(&function.closure));

        for (param, arg) in function.declaration.params.iter().zip(args) {
            frame
                .define(&param.lexeme, arg)
                .map_err(|msg| LoxError::runtime(paren.line, msg))?;
        }

        let declaration: Rc<FunctionDecl> = Rc::clone(&function.declaration);

        self.depth += 1;
        let flow: Result<Flow> = self.execute_block(&declaration.body, Rc::new(RefCell::new(frame)));
        self.depth -= 1;

        match flow? {
            Flow::Return(value) => {
                debug!("Function '{}' returned: {}", function.name(), value);
                Ok(value)
            }
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> Result<()> {
    if expected == got {
        return Ok(());
    }

    Err(LoxError::runtime(
        paren.line,
        format!("Expected {} arguments but got {}.", expected, got),
    ))
}

fn evaluate_binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    use Value::{Bool, Number};

    let value: Value = match (&operator.token_type, left, right) {
        (TokenType::EQUAL_EQUAL, l, r) => Bool(l == r),
        (TokenType::BANG_EQUAL, l, r) => Bool(l != r),

        (TokenType::PLUS, Number(a), Number(b)) => Number(a + b),
        (TokenType::PLUS, Value::String(a), Value::String(b)) => Value::String(a + &b),
        (TokenType::MINUS, Number(a), Number(b)) => Number(a - b),
        (TokenType::STAR, Number(a), Number(b)) => Number(a * b),
        (TokenType::SLASH, Number(a), Number(b)) => Number(a / b),
        (TokenType::GREATER, Number(a), Number(b)) => Bool(a > b),
        (TokenType::GREATER_EQUAL, Number(a), Number(b)) => Bool(a >= b),
        (TokenType::LESS, Number(a), Number(b)) => Bool(a < b),
        (TokenType::LESS_EQUAL, Number(a), Number(b)) => Bool(a <= b),

        (TokenType::PLUS, l, r) => {
            return Err(LoxError::runtime(
                operator.line,
                format!(
                    "Operands of '+' must be two numbers or two strings, got {} and {}.",
                    l.type_name(),
                    r.type_name()
                ),
            ))
        }

        (_, l, r) => {
            return Err(LoxError::runtime(
                operator.line,
                format!(
                    "Operands of '{}' must be numbers, got {} and {}.",
                    operator.lexeme,
                    l.type_name(),
                    r.type_name()
                ),
            ))
        }
    };

    Ok(value)
}

// ───────────────────────────── natives ────────────────────────────────────

fn native_print(interpreter: &mut Interpreter, args: &[Value], _paren: &Token) -> Result<Value> {
    let text: String = args[0].to_string();
    interpreter.output.write_line(&text);
    Ok(Value::String(text))
}

fn native_sleep(_interpreter: &mut Interpreter, args: &[Value], paren: &Token) -> Result<Value> {
    match &args[0] {
        Value::Number(seconds) if *seconds >= 0.0 => {
            let duration: Duration = Duration::try_from_secs_f64(*seconds).map_err(|_| {
                LoxError::runtime(
                    paren.line,
                    format!("sleep duration of {} seconds is out of range.", args[0]),
                )
            })?;

            debug!("Sleeping for {:?}", duration);
            thread::sleep(duration);
            Ok(args[0].clone())
        }
        other => Err(LoxError::runtime(
            paren.line,
            format!("sleep expects a non-negative number of seconds, got {}.", other),
        )),
    }
}

fn native_clock(_interpreter: &mut Interpreter, _args: &[Value], paren: &Token) -> Result<Value> {
    let seconds: f64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LoxError::runtime(paren.line, format!("Clock error: {}", e)))?
        .as_secs_f64();

    Ok(Value::Number(seconds))
}
