use crate::{*, error::*, types::*, memory::*, host::*};

// For values whose address is known, we defer reading until a field, element or scalar is actually requested.
// Blob is for values that don't live in inspected memory, e.g. a pointer held in a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrOrValueBlob {
    Addr(usize),
    Blob(u64),
}

#[derive(Debug, Clone)]
pub struct Value {
    pub val: AddrOrValueBlob,
    pub type_: TypeIdx,
}
impl Value {
    pub fn at(addr: usize, type_: TypeIdx) -> Self { Self {val: AddrOrValueBlob::Addr(addr), type_} }
    pub fn blob(x: u64, type_: TypeIdx) -> Self { Self {val: AddrOrValueBlob::Blob(x), type_} }

    pub fn addr(&self) -> Option<usize> { match self.val { AddrOrValueBlob::Addr(a) => Some(a), _ => None } }
}

// Host implementation over raw memory and C-style type layouts.
pub struct Inspector<M: MemorySource> {
    pub types: Types,
    pub memory: M,
}

impl<M: MemorySource> Inspector<M> {
    pub fn new(types: Types, memory: M) -> Self { Self {types, memory} }

    fn read_scalar(&self, val: &Value, size: usize) -> Result<u64> {
        match val.val {
            AddrOrValueBlob::Addr(a) => self.memory.read_uint(a, size),
            AddrOrValueBlob::Blob(x) if size >= 8 => Ok(x),
            AddrOrValueBlob::Blob(x) => Ok(x & ((1u64 << (size * 8) as u32) - 1)),
        }
    }

    fn resolved(&self, val: &Value) -> (TypeIdx, &TypeInfo) {
        let idx = self.types.strip_typedefs(val.type_);
        (idx, self.types.get(idx))
    }

    fn in_memory(&self, val: &Value, what: &str) -> Result<usize> {
        match val.addr() {
            Some(a) => Ok(a),
            None => err!(TypeMismatch, "can't take {} of a value that is not in memory ({})", what, self.types.display_name(val.type_)),
        }
    }
}

fn sign_extend(x: u64, size: usize) -> i64 {
    if size >= 8 {
        return x as i64;
    }
    let shift = (64 - size * 8) as u32;
    ((x << shift) as i64) >> shift
}

impl<M: MemorySource> Host for Inspector<M> {
    type Value = Value;

    fn type_name(&self, val: &Value) -> Result<String> {
        match &self.types.get(val.type_).t {
            Type::Unknown => err!(TypeMismatch, "unknown type"),
            _ => Ok(self.types.display_name(val.type_)),
        }
    }

    fn pointee_type_name(&self, val: &Value) -> Result<String> {
        match &self.resolved(val).1.t {
            Type::Pointer(p) => Ok(self.types.display_name(p.type_)),
            t => err!(TypeMismatch, "not a pointer: {}", t.kind_name()),
        }
    }

    fn is_pointer(&self, val: &Value) -> bool {
        match &self.resolved(val).1.t {
            Type::Pointer(_) => true,
            _ => false,
        }
    }

    fn is_aggregate(&self, val: &Value) -> bool {
        match &self.resolved(val).1.t {
            Type::Struct(_) | Type::Array(_) => true,
            _ => false,
        }
    }

    fn dereference(&self, val: &Value) -> Result<Value> {
        let target = match &self.resolved(val).1.t {
            Type::Pointer(p) => p.type_,
            t => return err!(TypeMismatch, "can't dereference {}", t.kind_name()),
        };
        let addr = self.read_pointer(val)?;
        if addr == 0 {
            return err!(ProcessState, "null pointer dereference");
        }
        Ok(Value::at(addr, target))
    }

    fn field(&self, val: &Value, name: &str) -> Result<Value> {
        let f = self.types.find_field(val.type_, name)?;
        let addr = self.in_memory(val, "field")?;
        match addr.checked_add(f.offset) {
            Some(a) => Ok(Value::at(a, f.type_)),
            None => err!(Sanity, "field address overflow: 0x{:x} + {}", addr, f.offset),
        }
    }

    fn index(&self, val: &Value, idx: usize) -> Result<Value> {
        let (base, elem) = match &self.resolved(val).1.t {
            Type::Pointer(p) => (self.read_pointer(val)?, p.type_),
            Type::Array(a) => {
                if idx >= a.len {
                    return err!(Sanity, "index {} out of bounds (array of {})", idx, a.len);
                }
                (self.in_memory(val, "element")?, a.type_)
            }
            t => return err!(NotContainer, "can't index {}", t.kind_name()),
        };
        if base == 0 {
            return err!(ProcessState, "null pointer dereference");
        }
        let stride = self.types.size_of(elem);
        if stride == 0 {
            return err!(Sanity, "element type {} has unknown size", self.types.display_name(elem));
        }
        match idx.checked_mul(stride).and_then(|off| base.checked_add(off)) {
            Some(a) => Ok(Value::at(a, elem)),
            None => err!(Sanity, "element address overflow: 0x{:x} + {}*{}", base, idx, stride),
        }
    }

    fn read_int(&self, val: &Value) -> Result<i64> {
        let t = self.resolved(val).1;
        match &t.t {
            Type::Primitive(p) if !p.contains(PrimitiveFlags::FLOAT) => {
                let x = self.read_scalar(val, t.size)?;
                Ok(if p.contains(PrimitiveFlags::SIGNED) {sign_extend(x, t.size)} else {x as i64})
            }
            Type::Pointer(_) => Ok(self.read_scalar(val, t.size)? as i64),
            _ => err!(TypeMismatch, "expected integer, got {}", self.types.display_name(val.type_)),
        }
    }

    fn read_pointer(&self, val: &Value) -> Result<usize> {
        let t = self.resolved(val).1;
        match &t.t {
            Type::Pointer(_) => Ok(self.read_scalar(val, t.size)? as usize),
            Type::Primitive(p) if !p.intersects(PrimitiveFlags::FLOAT | PrimitiveFlags::SIGNED) && t.size == POINTER_SIZE => Ok(self.read_scalar(val, t.size)? as usize),
            _ => err!(TypeMismatch, "expected pointer, got {}", self.types.display_name(val.type_)),
        }
    }

    fn read_bytes(&self, val: &Value, len: usize) -> Result<Vec<u8>> {
        let addr = self.read_pointer(val)?;
        if addr == 0 && len != 0 {
            return err!(ProcessState, "null pointer dereference");
        }
        let mut buf = vec![0u8; len];
        self.memory.read(addr, &mut buf)?;
        Ok(buf)
    }

    fn format_scalar(&self, val: &Value) -> Result<String> {
        let t = self.resolved(val).1;
        match &t.t {
            Type::Primitive(p) => {
                let x = self.read_scalar(val, t.size)?;
                Ok(if p.contains(PrimitiveFlags::BOOL) {
                    (if x != 0 {"true"} else {"false"}).to_string()
                } else if p.contains(PrimitiveFlags::FLOAT) {
                    match t.size {
                        4 => format!("{}", f32::from_bits(x as u32)),
                        8 => format!("{}", f64::from_bits(x)),
                        _ => return err!(NotImplemented, "{}-byte float", t.size),
                    }
                } else if p.contains(PrimitiveFlags::CHAR) && t.size == 1 {
                    match x as u8 {
                        c @ 32..=126 => format!("'{}'", c as char),
                        c => format!("'\\x{:02x}'", c),
                    }
                } else if p.contains(PrimitiveFlags::SIGNED) {
                    format!("{}", sign_extend(x, t.size))
                } else {
                    format!("{}", x)
                })
            }
            Type::Pointer(_) => Ok(format!("0x{:x}", self.read_scalar(val, t.size)?)),
            _ => err!(TypeMismatch, "not a scalar: {}", self.types.display_name(val.type_)),
        }
    }

    fn raw_children(&self, val: &Value, limit: usize) -> Result<Vec<(String, Value)>> {
        let t = self.resolved(val).1;
        let mut res: Vec<(String, Value)> = Vec::new();
        match &t.t {
            Type::Struct(s) => {
                let addr = self.in_memory(val, "field")?;
                for f in s.fields.iter().take(limit) {
                    res.push((f.name.clone(), Value::at(addr.wrapping_add(f.offset), f.type_)));
                }
            }
            Type::Array(a) => {
                for i in 0..a.len.min(limit) {
                    res.push((format!("[{}]", i), self.index(val, i)?));
                }
            }
            _ => (),
        }
        Ok(res)
    }
}
