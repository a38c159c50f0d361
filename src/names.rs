// Generic parameters appear in mangled struct names as tags: I64, STR, or the name of a user-defined type.
// Primitive tags map to the language's own spelling; anything else is a user type and is already spelled right.
const PRIMITIVE_TAGS: [(&str, &str); 12] = [
    ("I8", "i8"), ("I16", "i16"), ("I32", "i32"), ("I64", "i64"),
    ("U8", "u8"), ("U16", "u16"), ("U32", "u32"), ("U64", "u64"),
    ("F32", "f32"), ("F64", "f64"), ("BOOL", "bool"), ("STR", "str"),
];

pub fn resolve_name(tag: &str) -> &str {
    match PRIMITIVE_TAGS.iter().find(|(t, _)| *t == tag) {
        Some((_, name)) => *name,
        None => tag,
    }
}
