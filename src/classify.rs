use crate::{settings::*, host::*};

// Which runtime container a struct name denotes. The runtime generates one struct per instantiation, named
//   <string struct name>              e.g. __lang_rt_Str
//   <list prefix>_<elem tag>          e.g. __lang_rt_List_I64
//   <dict prefix>_<key tag>_<val tag> e.g. __lang_rt_Dict_STR_Person
// Tags are returned as written in the name; see names::resolve_name() for the surface spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    NotRecognized,
    IsString,
    IsList {elem_tag: String},
    IsDict {key_tag: String, value_tag: String},
}

pub fn strip_qualifier<'a>(name: &'a str, settings: &Settings) -> &'a str {
    if settings.storage_qualifier.is_empty() {
        return name;
    }
    name.strip_prefix(settings.storage_qualifier.as_str()).unwrap_or(name)
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn after_prefix<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix)?.strip_prefix('_')
}

// Shortest nonempty key tag such that a nonempty value tag remains: "A_B_C" -> ("A", "B_C"), "A__B" -> ("A", "_B").
fn split_dict_tags(s: &str) -> Option<(&str, &str)> {
    if !is_word(s) {
        return None;
    }
    for (i, c) in s.char_indices().skip(1) {
        if c == '_' && i + 1 < s.len() {
            return Some((&s[..i], &s[i+1..]));
        }
    }
    None
}

// Whole-name matches only. `name` may still carry the storage-class qualifier.
pub fn classify_name(name: &str, settings: &Settings) -> Classification {
    let name = strip_qualifier(name, settings);
    if name == settings.string_struct_name {
        return Classification::IsString;
    }
    if let Some(tag) = after_prefix(name, &settings.list_struct_prefix) {
        if is_word(tag) {
            return Classification::IsList {elem_tag: tag.to_string()};
        }
    }
    if let Some(rest) = after_prefix(name, &settings.dict_struct_prefix) {
        if let Some((k, v)) = split_dict_tags(rest) {
            return Classification::IsDict {key_tag: k.to_string(), value_tag: v.to_string()};
        }
    }
    Classification::NotRecognized
}

// Looks through one level of pointer. Failing to get the type name is just a miss.
pub fn classify_value<H: Host>(host: &H, val: &H::Value, settings: &Settings) -> Classification {
    let name = if host.is_pointer(val) {
        host.pointee_type_name(val)
    } else {
        host.type_name(val)
    };
    match name {
        Ok(n) => classify_name(&n, settings),
        Err(_) => Classification::NotRecognized,
    }
}
