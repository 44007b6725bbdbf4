use std::{
    fmt::{self, Display, Formatter},
    ops::{Div, Mul, Sub},
};

use crate::{
    heap::{Heap, ObjRef},
    string::ObjString,
};

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Operand must be a number.")]
    Number,
    #[error("Operands must be numbers.")]
    Numbers,
    #[error("Operands must be two numbers or two strings.")]
    AddMismatch,
}

/// `PartialEq` compares objects by identity. Strings are interned, so for
/// them identity and content equality agree; [`values_equal`] is the
/// content comparison the `Equal` instruction uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Nil,
    Boolean(bool),
    Number(f64),
    Obj(ObjRef),
}

impl Default for Value {
    fn default() -> Value {
        Value::Nil
    }
}

pub fn values_equal(lhs: Value, rhs: Value, heap: &Heap) -> bool {
    use Value::*;
    match (lhs, rhs) {
        (Nil, Nil) => true,
        (Boolean(l), Boolean(r)) => l == r,
        (Number(l), Number(r)) => l == r,
        (Obj(l), Obj(r)) => {
            match (heap.get::<ObjString>(l), heap.get::<ObjString>(r)) {
                (Some(ls), Some(rs)) => ls == rs,
                (_, _) => l == r,
            }
        }
        _ => false,
    }
}

impl Value {
    pub fn add(self, other: Value, heap: &mut Heap) -> Result<Self, TypeError> {
        use Value::*;
        match (self, other) {
            (Number(l), Number(r)) => Ok(Number(l + r)),
            (Obj(l), Obj(r)) => {
                match (heap.get::<ObjString>(l), heap.get::<ObjString>(r)) {
                    (Some(l), Some(r)) => {
                        let buf = l.concatenate(r);
                        Ok(Obj(heap.take_string(buf)))
                    }
                    (_, _) => Err(TypeError::AddMismatch),
                }
            }
            _ => Err(TypeError::AddMismatch),
        }
    }

    pub fn negate(self) -> Result<Self, TypeError> {
        match self {
            Value::Number(n) => Ok(Value::Number(-n)),
            _ => Err(TypeError::Number),
        }
    }

    pub fn greater_than(self, other: Value) -> Result<Self, TypeError> {
        use Value::{Boolean, Number};

        if let (Number(l), Number(r)) = (self, other) {
            Ok(Boolean(l > r))
        } else {
            Err(TypeError::Numbers)
        }
    }

    pub fn less_than(self, other: Value) -> Result<Self, TypeError> {
        use Value::{Boolean, Number};

        if let (Number(l), Number(r)) = (self, other) {
            Ok(Boolean(l < r))
        } else {
            Err(TypeError::Numbers)
        }
    }
}

impl Sub for Value {
    type Output = Result<Self, TypeError>;
    fn sub(self, rhs: Self) -> Self::Output {
        use Value::*;
        match (self, rhs) {
            (Number(l), Number(r)) => Ok(Number(l - r)),
            _ => Err(TypeError::Numbers),
        }
    }
}

impl Mul for Value {
    type Output = Result<Self, TypeError>;
    fn mul(self, rhs: Self) -> Self::Output {
        use Value::*;
        match (self, rhs) {
            (Number(l), Number(r)) => Ok(Number(l * r)),
            _ => Err(TypeError::Numbers),
        }
    }
}

impl Div for Value {
    type Output = Result<Self, TypeError>;
    fn div(self, rhs: Self) -> Self::Output {
        use Value::*;
        match (self, rhs) {
            (Number(l), Number(r)) => Ok(Number(l / r)),
            _ => Err(TypeError::Numbers),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Number(f)
    }
}

impl From<ObjRef> for Value {
    fn from(obj: ObjRef) -> Self {
        Value::Obj(obj)
    }
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_falsey(&self) -> bool {
        self.is_nil() || matches!(self, Value::Boolean(false))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_obj(&self) -> Option<ObjRef> {
        match self {
            Value::Obj(o) => Some(*o),
            _ => None,
        }
    }

    /// Objects live in the heap, so printing a value needs it.
    pub fn display<'h>(&self, heap: &'h Heap) -> ValueDisplay<'h> {
        ValueDisplay { value: *self, heap }
    }
}

pub struct ValueDisplay<'h> {
    value: Value,
    heap: &'h Heap,
}

impl Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.value {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Obj(o) => write!(f, "{}", self.heap.object(o)),
        }
    }
}
