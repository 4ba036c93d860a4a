use custom_error::custom_error;
use std::io;

custom_error! {
    pub RuntimeError

    UndefinedName{name: String} = "name \"{name}\" is not defined",
    NoField{name: String} = "no field named \"{name}\"",
    NotAnInstance{action: &'static str, type_name: &'static str} = "cannot {action} on a {type_name} value",
    UnknownMethod{method: String} = "no method \"{method}\" with that argument count",
    TypeMismatch{op: &'static str} = "unsupported operand types for {op}",
    DivisionByZero = "division by zero",
    NotComparable{op: &'static str} = "cannot compare these values with {op}",
    BadDunderResult{method: &'static str} = "{method} must return True or False",
    ReturnOutsideMethod = "return outside of a method",
    Io{source: io::Error} = "failed to write output: {source}",
}
