use crate::{heap::ObjRef, object::Obj, string::ObjString, value::Value};

#[derive(Debug, Clone, Copy)]
struct Entry {
    key: ObjRef,
    hash: u32,
    value: Value,
}

/// Open addressing with linear probing, keyed by interned string handles.
///
/// Keys carry their precomputed hash alongside the handle so the table never
/// has to reach back into the heap, except in [`Table::find_string`] which
/// compares contents.
#[derive(Debug, Default)]
pub struct Table {
    count: usize,
    entries: Vec<Option<Entry>>,
}

impl Table {
    pub const MAX_LOAD: f64 = 0.75;
    const MIN_CAPACITY: usize = 8;

    pub fn new() -> Self {
        Table {
            count: 0,
            entries: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if `key` wasn't in the table before.
    pub fn set(&mut self, key: ObjRef, hash: u32, value: Value) -> bool {
        if (self.count + 1) as f64 > self.capacity() as f64 * Table::MAX_LOAD {
            let capacity = if self.capacity() < Table::MIN_CAPACITY {
                Table::MIN_CAPACITY
            } else {
                self.capacity() * 2
            };
            self.adjust_capacity(capacity);
        }

        let index = find_entry(&self.entries, key, hash);
        let slot = &mut self.entries[index];
        let is_new_key = slot.is_none();
        if is_new_key {
            self.count += 1;
        }

        *slot = Some(Entry { key, hash, value });
        is_new_key
    }

    pub fn get(&self, key: ObjRef, hash: u32) -> Option<Value> {
        if self.count == 0 {
            return None;
        }

        self.entries[find_entry(&self.entries, key, hash)].map(|e| e.value)
    }

    /// Reports success without removing anything. Clearing the slot would
    /// cut the probe sequence of any key that collided past it; this needs
    /// tombstones before it can do real work.
    pub fn delete(&mut self, _key: ObjRef, _hash: u32) -> bool {
        true
    }

    pub fn add_all(&mut self, from: &Table) {
        for entry in from.entries.iter().flatten() {
            self.set(entry.key, entry.hash, entry.value);
        }
    }

    /// Looks a string up by content, for interning before an object exists.
    /// `objects` is the heap storage the keys index into.
    pub fn find_string(
        &self,
        chars: &str,
        hash: u32,
        objects: &[Obj],
    ) -> Option<ObjRef> {
        if self.count == 0 {
            return None;
        }

        let capacity = self.capacity();
        let mut index = hash as usize % capacity;
        loop {
            let entry = self.entries[index]?;

            if entry.hash == hash {
                let key = objects
                    .get(entry.key.index())
                    .and_then(|o| o.as_a::<ObjString>());
                if let Some(key) = key {
                    if key.len() == chars.len() && key.as_str() == chars {
                        return Some(entry.key);
                    }
                }
            }

            index = (index + 1) % capacity;
        }
    }

    /// Drops the table's own storage. The keys' objects belong to the heap.
    pub fn free(&mut self) {
        self.entries = Vec::new();
        self.count = 0;
    }

    fn adjust_capacity(&mut self, capacity: usize) {
        let mut entries = vec![None; capacity];

        for entry in self.entries.iter().flatten() {
            let index = find_entry(&entries, entry.key, entry.hash);
            entries[index] = Some(*entry);
        }

        self.entries = entries;
    }
}

fn find_entry(entries: &[Option<Entry>], key: ObjRef, hash: u32) -> usize {
    let capacity = entries.len();
    let mut index = hash as usize % capacity;
    loop {
        match &entries[index] {
            Some(entry) if entry.key != key => {
                index = (index + 1) % capacity;
            }
            _ => return index,
        }
    }
}
