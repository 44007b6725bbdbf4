use crate::object::{Obj, ObjType, Object};

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a.
pub fn hash_str(s: &str) -> u32 {
    s.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ byte as u32).wrapping_mul(FNV_PRIME)
    })
}

#[derive(Debug)]
pub struct ObjString {
    hash: u32,
    buf: Box<str>,
}

impl Object for ObjString {
    const TAG: ObjType = ObjType::String;

    fn downcast(obj: &Obj) -> Option<&Self> {
        match obj {
            Obj::String(s) => Some(s),
        }
    }

    fn upcast(self) -> Obj {
        Obj::String(self)
    }
}

impl PartialEq for ObjString {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.buf == other.buf
    }
}

impl ObjString {
    /// Takes the buffer as is, the hash is computed here once.
    pub fn new(buf: String) -> ObjString {
        ObjString {
            hash: hash_str(&buf),
            buf: buf.into_boxed_str(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Left then right, in a fresh buffer the caller owns.
    pub fn concatenate(&self, other: &ObjString) -> String {
        let mut buf = String::with_capacity(self.len() + other.len());
        buf.push_str(self.as_str());
        buf.push_str(other.as_str());
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_known_values() {
        assert_eq!(hash_str(""), 2_166_136_261);
        assert_eq!(hash_str("a"), 0xE40C_292C);
        assert_eq!(hash_str("foobar"), 0xBF9C_F968);
    }

    #[test]
    fn new_precomputes_the_hash() {
        let s = ObjString::new(String::from("velo"));
        assert_eq!(s.hash(), hash_str("velo"));
        assert_eq!(s.len(), 4);
        assert_eq!(s.as_str(), "velo");
    }

    #[test]
    fn concatenate_keeps_operand_order() {
        let l = ObjString::new(String::from("ab"));
        let r = ObjString::new(String::from("cd"));
        assert_eq!(l.concatenate(&r), "abcd");
        assert_eq!(r.concatenate(&l), "cdab");
    }
}
