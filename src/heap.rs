use log::{debug, trace};

use crate::{
    object::{Obj, Object},
    string::{hash_str, ObjString},
    table::Table,
    value::Value,
};

/// Handle to an object owned by a [`Heap`]. Only meaningful for the heap
/// that handed it out, and only until that heap is freed.
///
/// Slots are reused after [`Heap::free`] (and so after [`VM::reset`]). A
/// handle kept across a free is dangling: it may name nothing, or a later
/// object that landed in the same slot.
///
/// [`VM::reset`]: crate::vm::VM::reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(pub(crate) usize);

impl ObjRef {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Owns every object the VM allocates, plus the string intern pool.
///
/// Nothing is collected while the heap is alive. Objects are released
/// together by [`Heap::free`] (or on drop), each exactly once.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Obj>,
    strings: Table,
}

impl Heap {
    pub fn new() -> Heap {
        Heap {
            objects: Vec::new(),
            strings: Table::new(),
        }
    }

    // Only `intern` calls this, so every string is in the intern table.
    fn allocate<T: Object>(&mut self, object: T) -> ObjRef {
        let obj = ObjRef(self.objects.len());
        self.objects.push(object.upcast());
        trace!("allocate {:?} as {:?}", T::TAG, obj);
        obj
    }

    /// # Panics
    ///
    /// If `obj` didn't come from this heap, or the heap has been freed since.
    pub fn object(&self, obj: ObjRef) -> &Obj {
        match self.objects.get(obj.index()) {
            Some(o) => o,
            None => panic!("dangling object handle {:?}", obj),
        }
    }

    pub fn get<T: Object>(&self, obj: ObjRef) -> Option<&T> {
        self.objects.get(obj.index()).and_then(|o| o.as_a::<T>())
    }

    /// Interns `chars`, copying them only if no equal string exists yet.
    pub fn copy_string(&mut self, chars: &str) -> ObjRef {
        let hash = hash_str(chars);
        if let Some(interned) = self.find(chars, hash) {
            return interned;
        }

        self.intern(ObjString::new(chars.to_owned()))
    }

    /// Interns `buf`, adopting it as the new string's storage. If an equal
    /// string already exists `buf` is dropped.
    pub fn take_string(&mut self, buf: String) -> ObjRef {
        let hash = hash_str(&buf);
        if let Some(interned) = self.find(&buf, hash) {
            return interned;
        }

        self.intern(ObjString::new(buf))
    }

    pub fn find_interned(&self, chars: &str) -> Option<ObjRef> {
        self.find(chars, hash_str(chars))
    }

    fn find(&self, chars: &str, hash: u32) -> Option<ObjRef> {
        let found = self.strings.find_string(chars, hash, &self.objects);
        if found.is_some() {
            trace!("interned hit for {:?}", chars);
        }
        found
    }

    fn intern(&mut self, string: ObjString) -> ObjRef {
        let hash = string.hash();
        let obj = self.allocate(string);
        self.strings.set(obj, hash, Value::Nil);
        obj
    }

    pub fn strings(&self) -> &Table {
        &self.strings
    }

    pub fn objects(&self) -> &[Obj] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn free_objects(&mut self) {
        if !self.objects.is_empty() {
            debug!("freeing {} objects", self.objects.len());
        }

        for object in self.objects.drain(..) {
            trace!("free {:?}", object.obj_type());
        }
    }

    pub fn free_strings(&mut self) {
        self.strings.free();
    }

    pub fn free(&mut self) {
        self.free_objects();
        self.free_strings();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_string_interns() {
        let mut heap = Heap::new();
        let a = heap.copy_string("hello");
        let b = heap.copy_string("hello");

        assert_eq!(a, b);
        assert_eq!(heap.len(), 1);
        assert_eq!(heap.strings().count(), 1);
    }

    #[test]
    fn take_string_reuses_existing_strings() {
        let mut heap = Heap::new();
        let a = heap.copy_string("abcd");
        let b = heap.take_string(String::from("abcd"));
        let c = heap.take_string(String::from("abce"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn distinct_strings_get_distinct_objects() {
        let mut heap = Heap::new();
        let refs: Vec<ObjRef> =
            (0..50).map(|i| heap.copy_string(&i.to_string())).collect();

        assert_eq!(heap.len(), 50);
        for (i, obj) in refs.iter().enumerate() {
            let s = heap.get::<ObjString>(*obj).unwrap();
            assert_eq!(s.as_str(), i.to_string());
            assert_eq!(heap.find_interned(&i.to_string()), Some(*obj));
        }
    }

    #[test]
    fn every_string_is_a_key_of_the_intern_table() {
        let mut heap = Heap::new();
        let obj = heap.copy_string("key");
        let hash = hash_str("key");

        assert_eq!(heap.strings().get(obj, hash), Some(Value::Nil));
    }

    #[test]
    fn strings_only_enter_through_the_intern_table() {
        let mut heap = Heap::new();
        heap.copy_string("dup");
        heap.take_string(String::from("dup"));
        heap.take_string(String::from("other"));
        heap.copy_string("other");

        assert_eq!(heap.len(), 2);
        assert_eq!(heap.strings().count(), heap.len());
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut heap = Heap::new();
        let old = heap.copy_string("old");
        heap.free();
        assert!(heap.get::<ObjString>(old).is_none());

        let new = heap.copy_string("new");
        assert_eq!(old, new);
        assert_eq!(heap.get::<ObjString>(old).unwrap().as_str(), "new");
    }

    #[test]
    #[should_panic(expected = "dangling object handle")]
    fn freed_handles_dangle() {
        let mut heap = Heap::new();
        let obj = heap.copy_string("gone");
        heap.free();
        heap.object(obj);
    }

    #[test]
    fn free_releases_everything() {
        let mut heap = Heap::new();
        heap.copy_string("one");
        heap.copy_string("two");
        heap.free();

        assert!(heap.is_empty());
        assert_eq!(heap.strings().capacity(), 0);
        assert_eq!(heap.find_interned("one"), None);
    }
}
