use crate::{*, error::*, context::*, host::*, names::*, classify::*};

// Pretty-printers for the runtime's containers. Each one wraps a single inspected value for the duration of one display request.
// Nothing here returns an error to the front-end: a value that can't be decoded shows up as a placeholder,
// and a container that breaks halfway shows the children produced so far. The reason goes to the session log.

pub const STR_PLACEHOLDER: &str = "<str?>";
pub const LIST_PLACEHOLDER: &str = "<list?>";
pub const DICT_PLACEHOLDER: &str = "<dict?>";

// Layout of the runtime structs (field names are the same for every instantiation).
const LEN_FIELD: &str = "len";
const DATA_FIELD: &str = "data";
const CAP_FIELD: &str = "cap";
const SLOTS_FIELD: &str = "e";
const SLOT_STATUS_FIELD: &str = "st";
const SLOT_KEY_FIELD: &str = "key";
const SLOT_VALUE_FIELD: &str = "value";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayHint {
    None,
    String,
    Array,
    Map,
}
impl DisplayHint {
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::String => Some("string"),
            Self::Array => Some("array"),
            Self::Map => Some("map"),
        }
    }
}

// Containers are accessed either directly or through one pointer. Ok(None) means null pointer.
fn open_container<H: Host>(host: &H, val: &H::Value) -> Result<Option<H::Value>> {
    if !host.is_pointer(val) {
        return Ok(Some(val.clone()));
    }
    if host.read_pointer(val)? == 0 {
        return Ok(None);
    }
    Ok(Some(host.dereference(val)?))
}

fn is_null_pointer<H: Host>(host: &H, val: &H::Value) -> bool {
    host.is_pointer(val) && host.read_pointer(val).map_or(false, |p| p == 0)
}

// Negative lengths are garbage, treat them as empty.
fn clamp_count(x: i64, limit: usize) -> usize {
    if x <= 0 {
        0
    } else {
        (x as u64).min(limit as u64) as usize
    }
}

fn note_failure(context: &Context, what: &str, e: &Error) {
    if let Ok(mut log) = context.log.lock() {
        log!(log, "{}: {}", what, e);
    }
}

pub struct StrPrinter<'a, H: Host> {
    host: &'a H,
    context: &'a Context,
    val: H::Value,
}
impl<'a, H: Host> StrPrinter<'a, H> {
    pub fn new(host: &'a H, context: &'a Context, val: H::Value) -> Self { Self {host, context, val} }

    pub fn summary(&self) -> String {
        match self.decode() {
            Ok(s) => s,
            Err(e) => {
                note_failure(self.context, "Str", &e);
                STR_PLACEHOLDER.to_string()
            }
        }
    }

    fn decode(&self) -> Result<String> {
        let Some(v) = open_container(self.host, &self.val)? else { return Ok(self.context.settings.null_sentinel.clone()) };
        let len = self.host.read_int(&self.host.field(&v, LEN_FIELD)?)?;
        let data = self.host.field(&v, DATA_FIELD)?;
        if self.host.read_pointer(&data)? == 0 {
            return Ok(String::new());
        }
        if len < 0 {
            return err!(Sanity, "negative string length: {}", len);
        }
        let max = self.context.settings.max_string_bytes;
        if len as u64 > max as u64 {
            let bytes = self.host.read_bytes(&data, max)?;
            note_failure(self.context, "Str", &error!(TooLong, "{} bytes, showing the first {}", len, max));
            let mut s = String::from_utf8_lossy(&bytes).into_owned();
            s.push_str("...");
            return Ok(s);
        }
        let bytes = self.host.read_bytes(&data, len as usize)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    // A null Str is shown as the sentinel, which is not a string literal.
    pub fn display_hint(&self) -> DisplayHint {
        if is_null_pointer(self.host, &self.val) {
            DisplayHint::None
        } else {
            DisplayHint::String
        }
    }
}

pub struct ListPrinter<'a, H: Host> {
    host: &'a H,
    context: &'a Context,
    val: H::Value,
    elem_name: String,
}
impl<'a, H: Host> ListPrinter<'a, H> {
    pub fn new(host: &'a H, context: &'a Context, val: H::Value, elem_name: &str) -> Self { Self {host, context, val, elem_name: elem_name.to_string()} }

    pub fn elem_name(&self) -> &str { &self.elem_name }

    pub fn summary(&self) -> String {
        match self.decode_summary() {
            Ok(s) => s,
            Err(e) => {
                note_failure(self.context, &format!("List[{}]", self.elem_name), &e);
                LIST_PLACEHOLDER.to_string()
            }
        }
    }

    fn decode_summary(&self) -> Result<String> {
        let Some(v) = open_container(self.host, &self.val)? else { return Ok(self.context.settings.null_sentinel.clone()) };
        let len = self.host.read_int(&self.host.field(&v, LEN_FIELD)?)?;
        Ok(format!("List[{}]({})", self.elem_name, len))
    }

    pub fn children(&self) -> ListChildren<'a, H> {
        ListChildren {host: self.host, context: self.context, val: self.val.clone(), state: WalkState::Start, idx: 0}
    }

    pub fn display_hint(&self) -> DisplayHint { DisplayHint::Array }
}

pub struct DictPrinter<'a, H: Host> {
    host: &'a H,
    context: &'a Context,
    val: H::Value,
    key_name: String,
    value_name: String,
}
impl<'a, H: Host> DictPrinter<'a, H> {
    pub fn new(host: &'a H, context: &'a Context, val: H::Value, key_name: &str, value_name: &str) -> Self {
        Self {host, context, val, key_name: key_name.to_string(), value_name: value_name.to_string()}
    }

    pub fn key_name(&self) -> &str { &self.key_name }
    pub fn value_name(&self) -> &str { &self.value_name }

    pub fn summary(&self) -> String {
        match self.decode_summary() {
            Ok(s) => s,
            Err(e) => {
                note_failure(self.context, &format!("Dict[{}, {}]", self.key_name, self.value_name), &e);
                DICT_PLACEHOLDER.to_string()
            }
        }
    }

    fn decode_summary(&self) -> Result<String> {
        let Some(v) = open_container(self.host, &self.val)? else { return Ok(self.context.settings.null_sentinel.clone()) };
        let len = self.host.read_int(&self.host.field(&v, LEN_FIELD)?)?;
        Ok(format!("Dict[{}, {}]({})", self.key_name, self.value_name, len))
    }

    pub fn children(&self) -> DictChildren<'a, H> {
        DictChildren {host: self.host, context: self.context, val: self.val.clone(), state: WalkState::Start, slot: 0, emitted: 0, pending: None}
    }

    pub fn display_hint(&self) -> DisplayHint { DisplayHint::Map }
}

// Child iterators do nothing until the first next(). After that they walk forward only; dropping one early costs nothing.
enum WalkState<T> {
    Start,
    Walking(T),
    Done,
}

pub struct ListChildren<'a, H: Host> {
    host: &'a H,
    context: &'a Context,
    val: H::Value,
    state: WalkState<(/*data*/ H::Value, /*end*/ usize)>,
    idx: usize,
}
impl<'a, H: Host> ListChildren<'a, H> {
    fn open(&self) -> Result<Option<(H::Value, usize)>> {
        let Some(v) = open_container(self.host, &self.val)? else { return Ok(None) };
        let len = self.host.read_int(&self.host.field(&v, LEN_FIELD)?)?;
        let data = self.host.field(&v, DATA_FIELD)?;
        if self.host.read_pointer(&data)? == 0 {
            return Ok(None);
        }
        Ok(Some((data, clamp_count(len, self.context.settings.max_list_children))))
    }
}
impl<'a, H: Host> Iterator for ListChildren<'a, H> {
    type Item = (String, H::Value);

    fn next(&mut self) -> Option<Self::Item> {
        if let WalkState::Start = self.state {
            self.state = match self.open() {
                Ok(Some(x)) => WalkState::Walking(x),
                Ok(None) => WalkState::Done,
                Err(e) => {
                    note_failure(self.context, "List children", &e);
                    WalkState::Done
                }
            };
        }
        let item = match &self.state {
            WalkState::Walking((data, end)) if self.idx < *end => self.host.index(data, self.idx),
            _ => {
                self.state = WalkState::Done;
                return None;
            }
        };
        match item {
            Ok(v) => {
                let label = format!("[{}]", self.idx);
                self.idx += 1;
                Some((label, v))
            }
            Err(e) => {
                note_failure(self.context, &format!("List element [{}]", self.idx), &e);
                self.state = WalkState::Done;
                None
            }
        }
    }
}

pub struct DictChildren<'a, H: Host> {
    host: &'a H,
    context: &'a Context,
    val: H::Value,
    state: WalkState<(/*slots*/ H::Value, /*cap*/ usize)>,
    slot: usize,
    emitted: usize,
    // The value half of an entry whose key was just returned.
    pending: Option<(String, H::Value)>,
}
impl<'a, H: Host> DictChildren<'a, H> {
    fn open(&self) -> Result<Option<(H::Value, usize)>> {
        let Some(v) = open_container(self.host, &self.val)? else { return Ok(None) };
        let cap = self.host.read_int(&self.host.field(&v, CAP_FIELD)?)?;
        let slots = self.host.field(&v, SLOTS_FIELD)?;
        if self.host.read_pointer(&slots)? == 0 {
            return Ok(None);
        }
        Ok(Some((slots, clamp_count(cap, usize::MAX))))
    }

    // Key and value of an occupied slot, None for empty and deleted ones.
    fn read_slot(&self, slots: &H::Value, i: usize) -> Result<Option<(H::Value, H::Value)>> {
        let slot = self.host.index(slots, i)?;
        let status = self.host.read_int(&self.host.field(&slot, SLOT_STATUS_FIELD)?)?;
        if status != self.context.settings.occupied_slot_status {
            return Ok(None);
        }
        Ok(Some((self.host.field(&slot, SLOT_KEY_FIELD)?, self.host.field(&slot, SLOT_VALUE_FIELD)?)))
    }
}
impl<'a, H: Host> Iterator for DictChildren<'a, H> {
    type Item = (String, H::Value);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(p) = self.pending.take() {
            return Some(p);
        }
        if let WalkState::Start = self.state {
            self.state = match self.open() {
                Ok(Some(x)) => WalkState::Walking(x),
                Ok(None) => WalkState::Done,
                Err(e) => {
                    note_failure(self.context, "Dict children", &e);
                    WalkState::Done
                }
            };
        }
        loop {
            let entry = match &self.state {
                WalkState::Walking((slots, cap)) if self.slot < *cap => self.read_slot(slots, self.slot),
                _ => {
                    self.state = WalkState::Done;
                    return None;
                }
            };
            match entry {
                Ok(None) => self.slot += 1,
                Ok(Some((key, value))) => {
                    self.slot += 1;
                    let k = self.emitted;
                    self.emitted += 1;
                    self.pending = Some((format!("[{}].value", k), value));
                    return Some((format!("[{}].key", k), key));
                }
                Err(e) => {
                    note_failure(self.context, &format!("Dict slot {}", self.slot), &e);
                    self.state = WalkState::Done;
                    return None;
                }
            }
        }
    }
}

pub enum PrettyPrinter<'a, H: Host> {
    Str(StrPrinter<'a, H>),
    List(ListPrinter<'a, H>),
    Dict(DictPrinter<'a, H>),
}

impl<'a, H: Host> PrettyPrinter<'a, H> {
    pub fn from_classification(host: &'a H, context: &'a Context, val: &H::Value, class: &Classification) -> Option<Self> {
        Some(match class {
            Classification::NotRecognized => return None,
            Classification::IsString => Self::Str(StrPrinter::new(host, context, val.clone())),
            Classification::IsList {elem_tag} => Self::List(ListPrinter::new(host, context, val.clone(), resolve_name(elem_tag))),
            Classification::IsDict {key_tag, value_tag} => Self::Dict(DictPrinter::new(host, context, val.clone(), resolve_name(key_tag), resolve_name(value_tag))),
        })
    }

    pub fn summary(&self) -> String {
        match self {
            Self::Str(p) => p.summary(),
            Self::List(p) => p.summary(),
            Self::Dict(p) => p.summary(),
        }
    }

    pub fn display_hint(&self) -> DisplayHint {
        match self {
            Self::Str(p) => p.display_hint(),
            Self::List(p) => p.display_hint(),
            Self::Dict(p) => p.display_hint(),
        }
    }

    pub fn children(&self) -> Children<'a, H> {
        match self {
            Self::Str(_) => Children::None,
            Self::List(p) => Children::List(p.children()),
            Self::Dict(p) => Children::Dict(p.children()),
        }
    }
}

pub enum Children<'a, H: Host> {
    None,
    List(ListChildren<'a, H>),
    Dict(DictChildren<'a, H>),
}
impl<'a, H: Host> Iterator for Children<'a, H> {
    type Item = (String, H::Value);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::None => None,
            Self::List(c) => c.next(),
            Self::Dict(c) => c.next(),
        }
    }
}
