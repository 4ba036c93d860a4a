use crate::ast::{Operator, Statement, VariableValue};
use crate::closure::Closure;
use crate::object::{self, Context, Instance, Object, RuntimeError, ADD_METHOD, INIT_METHOD};
use std::io;
use std::rc::Rc;

/// Why evaluation stopped before the end of a statement.
///
/// `Return` is ordinary control flow: it originates in `Return` nodes, passes
/// transparently through every other node via `?`, and is intercepted only by
/// `MethodBody`. `Error` aborts the program.
#[derive(Debug)]
pub enum Unwind {
    Return(Object),
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(e: RuntimeError) -> Self {
        Self::Error(e)
    }
}

impl From<io::Error> for Unwind {
    fn from(e: io::Error) -> Self {
        Self::Error(e.into())
    }
}

pub type ExecResult = Result<Object, Unwind>;

/// Evaluates a statement against a frame and the ambient context. Evaluation
/// is strict and left-to-right wherever sub-expressions appear.
pub fn eval(stmt: &Statement, closure: &mut Closure, ctx: &mut Context) -> ExecResult {
    match stmt {
        Statement::NumericConst(n) => Ok(Object::Number(*n)),
        Statement::StringConst(s) => Ok(Object::String(s.clone())),
        Statement::BoolConst(b) => Ok(Object::Bool(*b)),
        Statement::NoneConst => Ok(Object::None),
        Statement::Variable(var) => eval_variable(var, closure),
        Statement::Assignment { name, value } => {
            let value = eval(value, closure, ctx)?;
            closure.set(name, value.clone());
            Ok(value)
        }
        Statement::FieldAssignment {
            object,
            field,
            value,
        } => match eval_variable(object, closure)? {
            Object::Instance(instance) => {
                let value = eval(value, closure, ctx)?;
                instance.set_field(field, value.clone());
                Ok(value)
            }
            other => Err(RuntimeError::NotAnInstance {
                action: "assign a field",
                type_name: other.type_name(),
            }
            .into()),
        },
        Statement::Print(args) => eval_print(args, closure, ctx),
        Statement::MethodCall {
            object,
            method,
            args,
        } => match eval(object, closure, ctx)? {
            Object::Instance(instance) => {
                let actual = eval_all(args, closure, ctx)?;
                instance.call(method, actual, ctx)
            }
            other => Err(RuntimeError::NotAnInstance {
                action: "call a method",
                type_name: other.type_name(),
            }
            .into()),
        },
        Statement::NewInstance { class, args } => {
            let instance = Instance::new(Rc::clone(class));
            // Arguments are only evaluated when a matching __init__ exists;
            // without one, construction succeeds bare.
            if instance.has_method(INIT_METHOD, args.len()) {
                let actual = eval_all(args, closure, ctx)?;
                instance.call(INIT_METHOD, actual, ctx)?;
            }
            Ok(Object::Instance(instance))
        }
        Statement::Stringify(arg) => {
            let value = eval(arg, closure, ctx)?;
            let mut repr = String::new();
            value.format_into(&mut repr, ctx)?;
            Ok(Object::String(repr))
        }
        Statement::Binary { op, lhs, rhs } => {
            // Both operands are always evaluated, so `and`/`or` are not
            // short-circuiting and operand side effects always happen.
            let lhs = eval(lhs, closure, ctx)?;
            let rhs = eval(rhs, closure, ctx)?;
            eval_binary(*op, lhs, rhs, ctx)
        }
        Statement::Not(arg) => {
            let value = eval(arg, closure, ctx)?;
            Ok(Object::Bool(!value.is_true()))
        }
        Statement::Compound(stmts) => {
            for stmt in stmts {
                eval(stmt, closure, ctx)?;
            }
            Ok(Object::None)
        }
        Statement::MethodBody(body) => match eval(body, closure, ctx) {
            Err(Unwind::Return(value)) => Ok(value),
            Err(err) => Err(err),
            Ok(_) => Ok(Object::None),
        },
        Statement::Return(value) => match eval(value, closure, ctx)? {
            // `return None` does not unwind; execution continues past it.
            Object::None => Ok(Object::None),
            value => Err(Unwind::Return(value)),
        },
        Statement::ClassDefinition(class) => {
            let value = Object::Class(Rc::clone(class));
            closure.set(class.name(), value.clone());
            Ok(value)
        }
        Statement::IfElse {
            condition,
            then_body,
            else_body,
        } => {
            if eval(condition, closure, ctx)?.is_true() {
                eval(then_body, closure, ctx)
            } else if let Some(else_body) = else_body {
                eval(else_body, closure, ctx)
            } else {
                Ok(Object::None)
            }
        }
    }
}

/// Resolves a dotted name: the head in the frame, every further segment as a
/// field of the instance reached so far.
fn eval_variable(var: &VariableValue, closure: &Closure) -> ExecResult {
    let mut current = closure
        .get(&var.head)
        .ok_or_else(|| RuntimeError::UndefinedName {
            name: var.head.clone(),
        })?;
    for field in &var.tail {
        match current {
            Object::Instance(instance) => {
                current = instance
                    .get_field(field)
                    .ok_or_else(|| RuntimeError::NoField {
                        name: field.clone(),
                    })?;
            }
            other => {
                return Err(RuntimeError::NotAnInstance {
                    action: "read a field",
                    type_name: other.type_name(),
                }
                .into())
            }
        }
    }
    Ok(current)
}

fn eval_all(args: &[Statement], closure: &mut Closure, ctx: &mut Context) -> Result<Vec<Object>, Unwind> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(eval(arg, closure, ctx)?);
    }
    Ok(values)
}

/// Each value is written to the sink as soon as it is formatted, so output
/// produced while evaluating or stringifying later arguments lands after the
/// reprs already printed.
fn eval_print(args: &[Statement], closure: &mut Closure, ctx: &mut Context) -> ExecResult {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(ctx.output(), " ")?;
        }
        let value = eval(arg, closure, ctx)?;
        let mut repr = String::new();
        value.format_into(&mut repr, ctx)?;
        write!(ctx.output(), "{}", repr)?;
    }
    writeln!(ctx.output())?;
    Ok(Object::None)
}

fn eval_binary(op: Operator, lhs: Object, rhs: Object, ctx: &mut Context) -> ExecResult {
    match op {
        Operator::Add => eval_add(lhs, rhs, ctx),
        Operator::Sub | Operator::Mult | Operator::Div => eval_numeric(op, lhs, rhs),
        Operator::And => Ok(Object::Bool(lhs.is_true() && rhs.is_true())),
        Operator::Or => Ok(Object::Bool(lhs.is_true() || rhs.is_true())),
        Operator::Eq => Ok(Object::Bool(object::equal(&lhs, &rhs, ctx)?)),
        Operator::NotEq => Ok(Object::Bool(object::not_equal(&lhs, &rhs, ctx)?)),
        Operator::Less => Ok(Object::Bool(object::less(&lhs, &rhs, ctx)?)),
        Operator::LessOrEq => Ok(Object::Bool(object::less_or_equal(&lhs, &rhs, ctx)?)),
        Operator::Greater => Ok(Object::Bool(object::greater(&lhs, &rhs, ctx)?)),
        Operator::GreaterOrEq => Ok(Object::Bool(object::greater_or_equal(&lhs, &rhs, ctx)?)),
    }
}

/// `+` over numbers, strings, or a left-hand instance with `__add__`.
/// Numeric arithmetic wraps on overflow.
fn eval_add(lhs: Object, rhs: Object, ctx: &mut Context) -> ExecResult {
    match (lhs, rhs) {
        (Object::Number(a), Object::Number(b)) => Ok(Object::Number(a.wrapping_add(b))),
        (Object::String(a), Object::String(b)) => Ok(Object::String(a + &b)),
        (Object::Instance(instance), rhs) if instance.has_method(ADD_METHOD, 1) => {
            instance.call(ADD_METHOD, vec![rhs], ctx)
        }
        _ => Err(RuntimeError::TypeMismatch { op: "+" }.into()),
    }
}

fn eval_numeric(op: Operator, lhs: Object, rhs: Object) -> ExecResult {
    let (a, b) = match (lhs, rhs) {
        (Object::Number(a), Object::Number(b)) => (a, b),
        _ => return Err(RuntimeError::TypeMismatch { op: op.symbol() }.into()),
    };
    match op {
        Operator::Sub => Ok(Object::Number(a.wrapping_sub(b))),
        Operator::Mult => Ok(Object::Number(a.wrapping_mul(b))),
        Operator::Div if b == 0 => Err(RuntimeError::DivisionByZero.into()),
        Operator::Div => Ok(Object::Number(a.wrapping_div(b))),
        _ => Err(RuntimeError::TypeMismatch { op: op.symbol() }.into()),
    }
}
