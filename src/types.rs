use crate::{*, error::*};
use bitflags::*;
use std::fmt::Write;

// Types of the inspected program, as far as the pretty-printers need them: C-style structs, pointers, fixed arrays, typedefs and scalars.
// All types live in one Types arena and refer to each other by TypeIdx, so recursive structs (a struct containing a pointer to itself) are fine.
// A TypeIdx is only meaningful for the Types that produced it. Out-of-range indices resolve to the Unknown type instead of panicking.

pub const POINTER_SIZE: usize = 8;

bitflags! { pub struct PrimitiveFlags: u8 {
    const SIGNED = 0x1;
    const FLOAT = 0x2;
    const CHAR = 0x4;
    const BOOL = 0x10;
}}

bitflags! { pub struct PointerFlags: u8 {
    const REFERENCE = 0x1;
}}

bitflags! { pub struct StructFlags: u8 {
    const UNION = 0x1;
    // Forward declaration whose definition hasn't been seen (yet). Size is unknown, fields are empty.
    const DECLARATION = 0x2;
}}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeIdx(pub usize);

#[derive(Clone, Debug)]
pub struct PointerType {
    pub flags: PointerFlags,
    pub type_: TypeIdx,
}

#[derive(Clone, Debug)]
pub struct ArrayType {
    pub type_: TypeIdx,
    pub len: usize,
}

#[derive(Clone, Debug)]
pub struct StructField {
    pub name: String,
    pub offset: usize, // in bytes
    pub type_: TypeIdx,
}

#[derive(Clone, Debug)]
pub struct StructType {
    pub flags: StructFlags,
    pub fields: Vec<StructField>,
}

#[derive(Clone, Debug)]
pub enum Type {
    Unknown, // unresolved type reference or other errors
    Primitive(PrimitiveFlags),
    Pointer(PointerType),
    Array(ArrayType),
    // We don't distinguish structs from unions for field access, union fields just all have offset 0.
    Struct(StructType),
    Typedef(TypeIdx),
}
impl Type {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Primitive(_) => "primitive",
            Self::Pointer(_) => "pointer",
            Self::Array(_) => "array",
            Self::Struct(_) => "struct",
            Self::Typedef(_) => "typedef",
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> { match self { Self::Struct(s) => Some(s), _ => None } }
    pub fn as_pointer(&self) -> Option<&PointerType> { match self { Self::Pointer(p) => Some(p), _ => None } }
}

#[derive(Clone, Debug)]
pub struct TypeInfo {
    // As declared, without qualifiers. Empty for pointers, arrays and anonymous structs.
    pub name: String,
    pub size: usize, // for typedefs, use Types::size_of() instead
    pub align: usize,
    pub t: Type,
}

pub struct Types {
    types: Vec<TypeInfo>,
}

impl Types {
    pub const UNKNOWN: TypeIdx = TypeIdx(0);

    pub fn new() -> Self {
        Self {types: vec![TypeInfo {name: String::new(), size: 0, align: 1, t: Type::Unknown}]}
    }

    pub fn len(&self) -> usize { self.types.len() }

    pub fn add(&mut self, t: TypeInfo) -> TypeIdx {
        self.types.push(t);
        TypeIdx(self.types.len() - 1)
    }

    pub fn get(&self, idx: TypeIdx) -> &TypeInfo {
        match self.types.get(idx.0) {
            Some(t) => t,
            None => &self.types[0],
        }
    }

    pub fn add_primitive(&mut self, name: &str, size: usize, flags: PrimitiveFlags) -> TypeIdx {
        self.add(TypeInfo {name: name.to_string(), size, align: size.max(1), t: Type::Primitive(flags)})
    }

    pub fn add_pointer(&mut self, target: TypeIdx) -> TypeIdx {
        self.add(TypeInfo {name: String::new(), size: POINTER_SIZE, align: POINTER_SIZE, t: Type::Pointer(PointerType {flags: PointerFlags::empty(), type_: target})})
    }

    pub fn add_array(&mut self, elem: TypeIdx, len: usize) -> TypeIdx {
        let (size, align) = (self.size_of(elem), self.align_of(elem));
        self.add(TypeInfo {name: String::new(), size: size.saturating_mul(len), align, t: Type::Array(ArrayType {type_: elem, len})})
    }

    pub fn add_typedef(&mut self, name: &str, target: TypeIdx) -> TypeIdx {
        self.add(TypeInfo {name: name.to_string(), size: 0, align: 1, t: Type::Typedef(target)})
    }

    // Incomplete struct; use StructBuilder::finish_declared() to fill it in. Lets the struct's own fields point back to it.
    pub fn declare_struct(&mut self, name: &str) -> TypeIdx {
        self.add(TypeInfo {name: name.to_string(), size: 0, align: 1, t: Type::Struct(StructType {flags: StructFlags::DECLARATION, fields: Vec::new()})})
    }

    pub fn strip_typedefs(&self, mut idx: TypeIdx) -> TypeIdx {
        for _ in 0..100 {
            match &self.get(idx).t {
                Type::Typedef(t) => idx = *t,
                _ => return idx,
            }
        }
        Self::UNKNOWN
    }

    pub fn size_of(&self, idx: TypeIdx) -> usize { self.get(self.strip_typedefs(idx)).size }
    pub fn align_of(&self, idx: TypeIdx) -> usize { self.get(self.strip_typedefs(idx)).align }

    pub fn find_by_name(&self, name: &str) -> Option<TypeIdx> {
        self.types.iter().position(|t| !t.name.is_empty() && t.name == name).map(TypeIdx)
    }

    pub fn find_field(&self, struct_: TypeIdx, name: &str) -> Result<&StructField> {
        let idx = self.strip_typedefs(struct_);
        let t = self.get(idx);
        let s = match &t.t {
            Type::Struct(s) => s,
            _ => return err!(TypeMismatch, "can't get field '{}' of {} {}", name, t.t.kind_name(), self.display_name(struct_)),
        };
        if s.flags.contains(StructFlags::DECLARATION) {
            return err!(TypeMismatch, "{} is incomplete", self.display_name(struct_));
        }
        match s.fields.iter().find(|f| f.name == name) {
            Some(f) => Ok(f),
            None => err!(NoField, "no field '{}' in {}", name, self.display_name(struct_)),
        }
    }

    // The name a C debugger would show for the type, e.g. "struct Foo", "Foo_t *", "int[4]".
    pub fn display_name(&self, idx: TypeIdx) -> String {
        let mut out = String::new();
        self.write_display_name(idx, &mut out, 0);
        out
    }

    fn write_display_name(&self, idx: TypeIdx, out: &mut String, depth: usize) {
        if depth > 20 {
            out.push_str("…");
            return;
        }
        let t = self.get(idx);
        match &t.t {
            Type::Unknown => out.push_str("<unknown>"),
            Type::Primitive(_) | Type::Typedef(_) => out.push_str(&t.name),
            Type::Struct(s) => {
                out.push_str(if s.flags.contains(StructFlags::UNION) {"union "} else {"struct "});
                out.push_str(if t.name.is_empty() {"{...}"} else {&t.name});
            }
            Type::Pointer(p) => {
                self.write_display_name(p.type_, out, depth + 1);
                out.push_str(if p.flags.contains(PointerFlags::REFERENCE) {" &"} else {" *"});
            }
            Type::Array(a) => {
                self.write_display_name(a.type_, out, depth + 1);
                let _ = write!(out, "[{}]", a.len);
            }
        }
    }
}
impl Default for Types { fn default() -> Self { Self::new() } }

fn align_up(x: usize, align: usize) -> usize {
    let align = align.max(1);
    x.div_ceil(align) * align
}

// Lays out fields the way a C compiler would for the target ABI: each field at the next multiple of its alignment, struct size padded to the largest alignment.
pub struct StructBuilder {
    name: String,
    flags: StructFlags,
    fields: Vec<(String, TypeIdx)>,
}
impl StructBuilder {
    pub fn new(name: &str) -> Self { Self {name: name.to_string(), flags: StructFlags::empty(), fields: Vec::new()} }
    pub fn union(name: &str) -> Self { Self {name: name.to_string(), flags: StructFlags::UNION, fields: Vec::new()} }

    pub fn field(mut self, name: &str, type_: TypeIdx) -> Self {
        self.fields.push((name.to_string(), type_));
        self
    }

    pub fn finish(self, types: &mut Types) -> TypeIdx {
        let info = self.layout(types);
        types.add(info)
    }

    pub fn finish_declared(self, types: &mut Types, declared: TypeIdx) -> Result<TypeIdx> {
        match &types.get(declared).t {
            Type::Struct(s) if s.flags.contains(StructFlags::DECLARATION) => (),
            _ => return err!(Usage, "{} is not a struct declaration", types.display_name(declared)),
        }
        let info = self.layout(types);
        types.types[declared.0] = info;
        Ok(declared)
    }

    fn layout(self, types: &Types) -> TypeInfo {
        let mut fields: Vec<StructField> = Vec::with_capacity(self.fields.len());
        let (mut end, mut align) = (0usize, 1usize);
        for (name, type_) in self.fields {
            let (size, a) = (types.size_of(type_), types.align_of(type_));
            align = align.max(a);
            let offset = if self.flags.contains(StructFlags::UNION) { 0 } else { align_up(end, a) };
            end = end.max(offset + size);
            fields.push(StructField {name, offset, type_});
        }
        TypeInfo {name: self.name, size: align_up(end, align), align, t: Type::Struct(StructType {flags: self.flags, fields})}
    }
}
