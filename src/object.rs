use std::fmt::{self, Display, Formatter};

use crate::string::ObjString;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ObjType {
    String,
}

/// Everything the heap can own. Strings are the only kind so far.
#[derive(Debug)]
pub enum Obj {
    String(ObjString),
}

impl Obj {
    pub fn obj_type(&self) -> ObjType {
        match self {
            Obj::String(_) => ObjType::String,
        }
    }

    pub fn as_a<T: Object>(&self) -> Option<&T> {
        if self.obj_type() == T::TAG {
            T::downcast(self)
        } else {
            None
        }
    }
}

impl Display for Obj {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Obj::String(s) => write!(f, "{}", s.as_str()),
        }
    }
}

pub trait Object: Sized {
    const TAG: ObjType;

    fn downcast(obj: &Obj) -> Option<&Self>;

    fn upcast(self) -> Obj;
}
