use crate::ast::Statement;
use crate::closure::Closure;
use crate::evaluator::{self, ExecResult, Unwind};
use std::cell::RefCell;
use std::io;
use std::rc::Rc;

mod error;
pub use error::RuntimeError;

pub const INIT_METHOD: &str = "__init__";
pub const STR_METHOD: &str = "__str__";
pub const EQ_METHOD: &str = "__eq__";
pub const LT_METHOD: &str = "__lt__";
pub const ADD_METHOD: &str = "__add__";

/// Ambient evaluation state: the sink `print` writes to.
pub struct Context<'a> {
    output: &'a mut dyn io::Write,
}

impl<'a> Context<'a> {
    pub fn new(output: &'a mut dyn io::Write) -> Self {
        Self { output }
    }

    pub fn output(&mut self) -> &mut (dyn io::Write + 'a) {
        &mut *self.output
    }
}

/// A runtime value. Class and instance payloads are shared by handle; the
/// rest are plain data cloned on assignment.
#[derive(Debug, Clone)]
pub enum Object {
    None,
    Number(i32),
    String(String),
    Bool(bool),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

// Structural for primitives, identity for classes and instances. Language
// equality (with `__eq__` dispatch) is `equal` below.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Class(a), Self::Class(b)) => Rc::ptr_eq(a, b),
            (Self::Instance(a), Self::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i32> for Object {
    fn from(n: i32) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<String> for Object {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Self {
        s.to_owned().into()
    }
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Class(_) => "class",
            Self::Instance(_) => "instance",
        }
    }

    /// Truthiness is total: defined for every value kind, never an error.
    pub fn is_true(&self) -> bool {
        match self {
            Self::None => false,
            Self::Number(n) => *n != 0,
            Self::String(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::Class(_) | Self::Instance(_) => false,
        }
    }

    /// Appends the value's canonical print form to `buf`.
    ///
    /// An instance with a zero-argument `__str__` delegates to it, which runs
    /// arbitrary code; printing therefore threads the ambient context. A
    /// `__str__` result that is not a number, string, class or instance
    /// contributes nothing. An instance without `__str__` prints an opaque
    /// address token.
    pub fn format_into(&self, buf: &mut String, ctx: &mut Context) -> Result<(), Unwind> {
        match self {
            Self::None => buf.push_str("None"),
            Self::Number(n) => buf.push_str(&n.to_string()),
            Self::String(s) => buf.push_str(s),
            Self::Bool(true) => buf.push_str("True"),
            Self::Bool(false) => buf.push_str("False"),
            Self::Class(class) => {
                buf.push_str("Class ");
                buf.push_str(class.name());
            }
            Self::Instance(instance) => {
                if instance.has_method(STR_METHOD, 0) {
                    match instance.call(STR_METHOD, Vec::new(), ctx)? {
                        Object::None | Object::Bool(_) => {}
                        repr => repr.format_into(buf, ctx)?,
                    }
                } else {
                    buf.push_str(&format!("{:p}", Rc::as_ptr(instance)));
                }
            }
        }
        Ok(())
    }
}

/// A class definition: a name, its own methods, and an optional parent.
#[derive(Debug)]
pub struct Class {
    name: String,
    methods: Vec<Method>,
    parent: Option<Rc<Class>>,
}

#[derive(Debug)]
pub struct Method {
    pub name: String,
    /// Formal parameter names, excluding `self`.
    pub formal_params: Vec<String>,
    pub body: Statement,
}

impl Class {
    pub fn new(name: String, methods: Vec<Method>, parent: Option<Rc<Class>>) -> Rc<Self> {
        Rc::new(Self {
            name,
            methods,
            parent,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nearest definition wins: own methods first, then the parent chain.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods
            .iter()
            .find(|m| m.name == name)
            .or_else(|| self.parent.as_ref().and_then(|p| p.method(name)))
    }
}

/// A class instance: its class and a field scope mutated by field assignment.
///
/// `self` is not stored in the field scope; each method call binds it in the
/// frame instead, so an instance never owns a handle to itself.
#[derive(Debug)]
pub struct Instance {
    class: Rc<Class>,
    fields: RefCell<Closure>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Rc<Self> {
        Rc::new(Self {
            class,
            fields: RefCell::new(Closure::new()),
        })
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    pub fn get_field(&self, name: &str) -> Option<Object> {
        self.fields.borrow().get(name)
    }

    pub fn set_field(&self, name: &str, value: Object) {
        self.fields.borrow_mut().set(name, value);
    }

    /// True iff the resolved method exists and takes exactly `argc`
    /// arguments. Arity is checked on the nearest definition only: an
    /// override shadows ancestors of any arity.
    pub fn has_method(&self, name: &str, argc: usize) -> bool {
        self.class
            .method(name)
            .map_or(false, |m| m.formal_params.len() == argc)
    }

    /// Invokes a method: a fresh frame binds `self` and the formals to the
    /// actuals, then the body runs against it. The frame is dropped on every
    /// exit path, the receiver handle with it.
    pub fn call(self: &Rc<Self>, name: &str, args: Vec<Object>, ctx: &mut Context) -> ExecResult {
        let method = match self.class.method(name) {
            Some(m) if m.formal_params.len() == args.len() => m,
            _ => {
                return Err(RuntimeError::UnknownMethod {
                    method: name.to_owned(),
                }
                .into())
            }
        };
        let mut frame = Closure::new();
        frame.set("self", Object::Instance(Rc::clone(self)));
        for (param, arg) in method.formal_params.iter().zip(args) {
            frame.set(param, arg);
        }
        evaluator::eval(&method.body, &mut frame, ctx)
    }
}

/// Language equality. Same-kind primitives compare by value, two `None`s are
/// equal, and a left-hand instance may define `__eq__`. Dispatch consults the
/// left operand only; there is no right-side fallback.
pub fn equal(lhs: &Object, rhs: &Object, ctx: &mut Context) -> Result<bool, Unwind> {
    if let (Object::None, Object::None) = (lhs, rhs) {
        return Ok(true);
    }
    if matches!(lhs, Object::None) || matches!(rhs, Object::None) {
        return Err(RuntimeError::NotComparable { op: "==" }.into());
    }
    match (lhs, rhs) {
        (Object::Number(a), Object::Number(b)) => Ok(a == b),
        (Object::String(a), Object::String(b)) => Ok(a == b),
        (Object::Bool(a), Object::Bool(b)) => Ok(a == b),
        (Object::Instance(instance), _) if instance.has_method(EQ_METHOD, 1) => {
            dunder_bool(instance.call(EQ_METHOD, vec![rhs.clone()], ctx)?, EQ_METHOD)
        }
        _ => Err(RuntimeError::NotComparable { op: "==" }.into()),
    }
}

/// Language ordering. Same-kind primitives use the natural order; a
/// left-hand instance may define `__lt__`.
pub fn less(lhs: &Object, rhs: &Object, ctx: &mut Context) -> Result<bool, Unwind> {
    if matches!(lhs, Object::None) || matches!(rhs, Object::None) {
        return Err(RuntimeError::NotComparable { op: "<" }.into());
    }
    match (lhs, rhs) {
        (Object::Number(a), Object::Number(b)) => Ok(a < b),
        (Object::String(a), Object::String(b)) => Ok(a < b),
        (Object::Bool(a), Object::Bool(b)) => Ok(a < b),
        (Object::Instance(instance), _) if instance.has_method(LT_METHOD, 1) => {
            dunder_bool(instance.call(LT_METHOD, vec![rhs.clone()], ctx)?, LT_METHOD)
        }
        _ => Err(RuntimeError::NotComparable { op: "<" }.into()),
    }
}

// The remaining relational operators are derived, so user-defined `__lt__`
// and `__eq__` induce all six.

pub fn not_equal(lhs: &Object, rhs: &Object, ctx: &mut Context) -> Result<bool, Unwind> {
    Ok(!equal(lhs, rhs, ctx)?)
}

pub fn greater(lhs: &Object, rhs: &Object, ctx: &mut Context) -> Result<bool, Unwind> {
    Ok(!less(lhs, rhs, ctx)? && !equal(lhs, rhs, ctx)?)
}

pub fn less_or_equal(lhs: &Object, rhs: &Object, ctx: &mut Context) -> Result<bool, Unwind> {
    Ok(!greater(lhs, rhs, ctx)?)
}

pub fn greater_or_equal(lhs: &Object, rhs: &Object, ctx: &mut Context) -> Result<bool, Unwind> {
    Ok(!less(lhs, rhs, ctx)?)
}

fn dunder_bool(result: Object, method: &'static str) -> Result<bool, Unwind> {
    match result {
        Object::Bool(b) => Ok(b),
        _ => Err(RuntimeError::BadDunderResult { method }.into()),
    }
}
