// Test fixtures: a fake runtime heap with the same struct layouts the compiled runtime uses.
use crate::{types::*, memory::*, inspector::*, error::*};
use std::cell::RefCell;

pub const HEAP_BASE: usize = 0x5555_0000_0000;

pub const SLOT_EMPTY: u8 = 0;
pub const SLOT_FULL: u8 = 1;
pub const SLOT_DELETED: u8 = 2;

pub enum Slot {
    Empty,
    Deleted,
    Other(u8), // unexpected status value; must be skipped like empty
    Full(String, /*value bits*/ u64),
}
impl Slot {
    pub fn full(key: &str, value: i64) -> Self { Self::Full(key.to_string(), value as u64) }
    pub fn full_ptr(key: &str, addr: usize) -> Self { Self::Full(key.to_string(), addr as u64) }
}

pub struct FakeRuntime {
    pub types: Types,
    pub mem: SnapshotMemory,
    next: usize,

    pub i64_: TypeIdx,
    pub f64_: TypeIdx,
    pub bool_: TypeIdx,
    pub str_: TypeIdx,
    pub str_ptr: TypeIdx,
    pub list_i64: TypeIdx,
    pub list_i64_ptr: TypeIdx,
    pub list_str: TypeIdx,
    pub list_person: TypeIdx,
    pub person: TypeIdx,
    pub person_ptr: TypeIdx,
    pub dict_str_i64: TypeIdx,
    pub dict_str_i64_ptr: TypeIdx,
    pub dict_str_person: TypeIdx,
}

fn words(xs: &[u64]) -> Vec<u8> {
    xs.iter().flat_map(|x| x.to_le_bytes()).collect()
}

impl FakeRuntime {
    pub fn new() -> Self {
        let mut types = Types::new();
        let i64_ = types.add_primitive("int64_t", 8, PrimitiveFlags::SIGNED);
        let u8_ = types.add_primitive("uint8_t", 1, PrimitiveFlags::empty());
        let f64_ = types.add_primitive("double", 8, PrimitiveFlags::FLOAT | PrimitiveFlags::SIGNED);
        let bool_ = types.add_primitive("bool", 1, PrimitiveFlags::BOOL);
        let u8_ptr = types.add_pointer(u8_);
        let i64_ptr = types.add_pointer(i64_);

        // typedef struct __lang_rt_Str {...} __lang_rt_Str;
        let str_ = StructBuilder::new("__lang_rt_Str").field("len", i64_).field("data", u8_ptr).finish(&mut types);
        let str_typedef = types.add_typedef("__lang_rt_Str", str_);
        let str_ptr = types.add_pointer(str_typedef);
        let str_ptr_ptr = types.add_pointer(str_ptr);

        let list_i64 = StructBuilder::new("__lang_rt_List_I64").field("len", i64_).field("cap", i64_).field("data", i64_ptr).finish(&mut types);
        let list_i64_ptr = types.add_pointer(list_i64);
        types.add_typedef("List_I64_t", list_i64);
        let list_str = StructBuilder::new("__lang_rt_List_STR").field("len", i64_).field("cap", i64_).field("data", str_ptr_ptr).finish(&mut types);

        let person = types.declare_struct("Person");
        let person_ptr = types.add_pointer(person);
        let person_ptr_ptr = types.add_pointer(person_ptr);
        StructBuilder::new("Person").field("name", str_ptr).field("age", i64_).field("score", f64_).field("alive", bool_).field("best_friend", person_ptr)
            .finish_declared(&mut types, person).unwrap();
        let list_person = StructBuilder::new("__lang_rt_List_Person").field("len", i64_).field("cap", i64_).field("data", person_ptr_ptr).finish(&mut types);

        let slot_str_i64 = StructBuilder::new("__lang_rt_DictSlot_STR_I64").field("st", u8_).field("key", str_ptr).field("value", i64_).finish(&mut types);
        let slot_str_i64_ptr = types.add_pointer(slot_str_i64);
        let dict_str_i64 = StructBuilder::new("__lang_rt_Dict_STR_I64").field("len", i64_).field("cap", i64_).field("e", slot_str_i64_ptr).finish(&mut types);
        let dict_str_i64_ptr = types.add_pointer(dict_str_i64);

        let slot_str_person = StructBuilder::new("__lang_rt_DictSlot_STR_Person").field("st", u8_).field("key", str_ptr).field("value", person_ptr).finish(&mut types);
        let slot_str_person_ptr = types.add_pointer(slot_str_person);
        let dict_str_person = StructBuilder::new("__lang_rt_Dict_STR_Person").field("len", i64_).field("cap", i64_).field("e", slot_str_person_ptr).finish(&mut types);

        FakeRuntime {types, mem: SnapshotMemory::new(), next: HEAP_BASE, i64_, f64_, bool_, str_, str_ptr, list_i64, list_i64_ptr, list_str, list_person, person, person_ptr, dict_str_i64, dict_str_i64_ptr, dict_str_person}
    }

    pub fn inspector(self) -> Inspector<SnapshotMemory> { Inspector::new(self.types, self.mem) }

    // Leaves an unmapped gap after each allocation, so running off the end of an object is a read error.
    pub fn alloc(&mut self, bytes: Vec<u8>) -> usize {
        let addr = self.next;
        self.next = (addr + bytes.len()).div_ceil(16) * 16 + 32;
        self.mem.add_region(addr, bytes).unwrap();
        addr
    }

    pub fn str_raw(&mut self, len: i64, data: usize) -> usize {
        self.alloc(words(&[len as u64, data as u64]))
    }

    pub fn new_str(&mut self, s: &[u8]) -> usize {
        let data = if s.is_empty() {0} else {self.alloc(s.to_vec())};
        self.str_raw(s.len() as i64, data)
    }

    pub fn list_raw(&mut self, len: i64, data: usize) -> usize {
        self.alloc(words(&[len as u64, len.max(0) as u64, data as u64]))
    }

    pub fn new_list_i64(&mut self, items: &[i64]) -> usize {
        let data = if items.is_empty() {0} else {self.alloc(items.iter().flat_map(|x| x.to_le_bytes()).collect())};
        self.list_raw(items.len() as i64, data)
    }

    pub fn new_list_str(&mut self, items: &[&str]) -> usize {
        let ptrs: Vec<u64> = items.iter().map(|s| self.new_str(s.as_bytes()) as u64).collect();
        let data = if ptrs.is_empty() {0} else {self.alloc(words(&ptrs))};
        self.list_raw(items.len() as i64, data)
    }

    // List of pointers, e.g. List[Person].
    pub fn new_list_ptrs(&mut self, ptrs: &[usize]) -> usize {
        let ptrs: Vec<u64> = ptrs.iter().map(|&p| p as u64).collect();
        let data = if ptrs.is_empty() {0} else {self.alloc(words(&ptrs))};
        self.list_raw(ptrs.len() as i64, data)
    }

    pub fn new_person(&mut self, name: &str, age: i64, score: f64, alive: bool) -> usize {
        let name = self.new_str(name.as_bytes());
        self.alloc(words(&[name as u64, age as u64, score.to_bits(), alive as u64, 0]))
    }

    pub fn set_best_friend(&mut self, person: usize, friend: usize) {
        self.mem.write(person + 32, &(friend as u64).to_le_bytes()).unwrap();
    }

    pub fn dict_raw(&mut self, len: i64, cap: i64, slots: usize) -> usize {
        self.alloc(words(&[len as u64, cap as u64, slots as u64]))
    }

    // Works for any Dict_STR_* whose value is 8 bytes wide: slot is {uint8_t st; Str *key; <8 bytes> value;}.
    pub fn new_dict(&mut self, len: i64, slots: &[Slot]) -> usize {
        let mut table: Vec<u8> = Vec::with_capacity(slots.len() * 24);
        for slot in slots {
            let (st, key, value) = match slot {
                Slot::Empty => (SLOT_EMPTY, 0u64, 0u64),
                Slot::Deleted => (SLOT_DELETED, 0, 0),
                Slot::Other(st) => (*st, 0, 0),
                Slot::Full(k, v) => (SLOT_FULL, self.new_str(k.as_bytes()) as u64, *v),
            };
            table.push(st);
            table.extend_from_slice(&[0u8; 7]);
            table.extend_from_slice(&key.to_le_bytes());
            table.extend_from_slice(&value.to_le_bytes());
        }
        let e = self.alloc(table);
        self.dict_raw(len, slots.len() as i64, e)
    }

    pub fn new_dict_str_i64(&mut self, len: i64, slots: &[Slot]) -> usize { self.new_dict(len, slots) }

    pub fn set_dict_cap(&mut self, dict: usize, cap: i64) {
        self.mem.write(dict + 8, &cap.to_le_bytes()).unwrap();
    }
}

// Remembers every read, to check what the printers touch and when.
pub struct RecordingMemory<M: MemorySource> {
    pub inner: M,
    reads: RefCell<Vec<(/*addr*/ usize, /*len*/ usize)>>,
}
impl<M: MemorySource> RecordingMemory<M> {
    pub fn new(inner: M) -> Self { Self {inner, reads: RefCell::new(Vec::new())} }
    pub fn reads(&self) -> Vec<(usize, usize)> { self.reads.borrow().clone() }
}
impl<M: MemorySource> MemorySource for RecordingMemory<M> {
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<()> {
        self.reads.borrow_mut().push((addr, buf.len()));
        self.inner.read(addr, buf)
    }
}
