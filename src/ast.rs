use crate::object::Class;
use std::rc::Rc;

/// Executable nodes. Everything in the language is a statement yielding a
/// value when evaluated; an expression is a statement whose value is used by
/// its parent node.
#[derive(Debug)]
pub enum Statement {
    NumericConst(i32),
    StringConst(String),
    BoolConst(bool),
    NoneConst,
    Variable(VariableValue),
    Assignment {
        name: String,
        value: Box<Statement>,
    },
    FieldAssignment {
        object: VariableValue,
        field: String,
        value: Box<Statement>,
    },
    Print(Vec<Statement>),
    MethodCall {
        object: Box<Statement>,
        method: String,
        args: Vec<Statement>,
    },
    NewInstance {
        class: Rc<Class>,
        args: Vec<Statement>,
    },
    /// `str(...)`: the single-value print form, without the newline.
    Stringify(Box<Statement>),
    Binary {
        op: Operator,
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Not(Box<Statement>),
    Compound(Vec<Statement>),
    /// The only node that intercepts the non-local return signal.
    MethodBody(Box<Statement>),
    Return(Box<Statement>),
    ClassDefinition(Rc<Class>),
    IfElse {
        condition: Box<Statement>,
        then_body: Box<Statement>,
        else_body: Option<Box<Statement>>,
    },
}

/// A dotted name rooted at a scope variable: `head.f1.f2`.
#[derive(Debug, Clone)]
pub struct VariableValue {
    pub head: String,
    pub tail: Vec<String>,
}

impl VariableValue {
    pub fn new(name: &str) -> Self {
        Self {
            head: name.to_owned(),
            tail: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mult,
    Div,
    And,
    Or,
    Eq,
    NotEq,
    Less,
    LessOrEq,
    Greater,
    GreaterOrEq,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mult => "*",
            Self::Div => "/",
            Self::And => "and",
            Self::Or => "or",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Less => "<",
            Self::LessOrEq => "<=",
            Self::Greater => ">",
            Self::GreaterOrEq => ">=",
        }
    }
}
