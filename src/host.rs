use crate::error::*;

// What the pretty-printers need from the debugger that hosts them. Values are opaque handles; every operation may fail
// (unreadable memory, missing field, wrong type) and the printers deal with that themselves.
// Inspector is the implementation for raw memory + C struct layouts, but anything that can answer these questions works.
pub trait Host {
    type Value: Clone;

    // Declared name of the value's type, possibly with a storage-class qualifier, e.g. "struct Foo" or "Foo *".
    fn type_name(&self, val: &Self::Value) -> Result<String>;
    // Same for the type the value points to. Error if the value is not a pointer.
    fn pointee_type_name(&self, val: &Self::Value) -> Result<String>;
    fn is_pointer(&self, val: &Self::Value) -> bool;
    // Struct, union or fixed array: shown through raw_children() even when it has none.
    fn is_aggregate(&self, val: &Self::Value) -> bool;

    // Error on null pointer; the pointee is not read.
    fn dereference(&self, val: &Self::Value) -> Result<Self::Value>;
    fn field(&self, val: &Self::Value, name: &str) -> Result<Self::Value>;
    // Element `idx` of the buffer `val` points to (or of the array `val` is). No length check for pointers.
    fn index(&self, val: &Self::Value, idx: usize) -> Result<Self::Value>;

    fn read_int(&self, val: &Self::Value) -> Result<i64>;
    fn read_pointer(&self, val: &Self::Value) -> Result<usize>;
    // `len` bytes starting where pointer `val` points.
    fn read_bytes(&self, val: &Self::Value, len: usize) -> Result<Vec<u8>>;

    // Used by front-ends for values no printer claimed.
    fn format_scalar(&self, val: &Self::Value) -> Result<String>;
    // Struct fields or array elements, with names. Empty for scalars and pointers.
    fn raw_children(&self, val: &Self::Value, limit: usize) -> Result<Vec<(String, Self::Value)>>;
}
