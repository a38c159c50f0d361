use crate::{context::*, host::*, printers::*, registry::*};
use std::fmt::Write;

// One-line rendering of a value, the way a debugger's print command shows it:
//   "hello"                               Str (string hint: quoted and escaped)
//   List[i64](3) = {1, 2, 3}              array hint
//   Dict[str, i64](2) = {["a"] = 1, ...}  map hint
//   {name = "ann", age = 30}              struct without a printer
//   *0x5555000000a0 {...}                 pointer to a struct, followed
// Nothing here fails: errors are rendered inline as <error: ...>.
pub fn format_value<H: Host>(host: &H, printers: &PrettyPrinters<H>, context: &Context, val: &H::Value) -> String {
    let mut state = FormatState {host, printers, context, out: String::new()};
    state.format_recurse(val, 0);
    state.out
}

struct FormatState<'a, H: Host> {
    host: &'a H,
    printers: &'a PrettyPrinters<H>,
    context: &'a Context,
    out: String,
}

impl<'a, H: Host> FormatState<'a, H> {
    fn max_children(&self) -> usize { self.context.settings.format_max_children }
    fn max_depth(&self) -> usize { self.context.settings.format_max_depth }

    fn write_error(&mut self, e: impl std::fmt::Display) {
        let _ = write!(self.out, "<error: {}>", e);
    }

    fn format_recurse(&mut self, val: &H::Value, depth: usize) {
        if let Some(p) = self.printers.lookup(self.host, val, self.context) {
            self.format_pretty(&p, depth);
            return;
        }
        if self.host.is_pointer(val) {
            self.format_pointer(val, depth);
            return;
        }
        let limit = self.max_children();
        let children = match self.host.raw_children(val, limit.saturating_add(1)) {
            Ok(c) => c,
            Err(e) => return self.write_error(e),
        };
        if children.is_empty() && !self.host.is_aggregate(val) {
            match self.host.format_scalar(val) {
                Ok(s) => self.out.push_str(&s),
                Err(e) => self.write_error(e),
            }
            return;
        }
        if depth >= self.max_depth() {
            self.out.push_str("{...}");
            return;
        }
        self.out.push('{');
        for (i, (name, child)) in children.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            if i == limit {
                self.out.push_str("...");
                break;
            }
            let _ = write!(self.out, "{} = ", name);
            self.format_recurse(child, depth + 1);
        }
        self.out.push('}');
    }

    // Non-null pointers to structs are followed, other pointers show just the address. The pointee is on the same level as the pointer.
    fn format_pointer(&mut self, val: &H::Value, depth: usize) {
        let addr = match self.host.read_pointer(val) {
            Ok(a) => a,
            Err(e) => return self.write_error(e),
        };
        if addr == 0 {
            self.out.push_str("0x0");
            return;
        }
        let _ = write!(self.out, "*0x{:x}", addr);
        let Ok(target) = self.host.dereference(val) else { return };
        if self.host.raw_children(&target, 1).map_or(false, |c| !c.is_empty()) {
            self.out.push(' ');
            self.format_recurse(&target, depth);
        }
    }

    fn format_pretty(&mut self, p: &PrettyPrinter<'_, H>, depth: usize) {
        let summary = p.summary();
        let hint = p.display_hint();
        match hint {
            DisplayHint::String => {
                let _ = write!(self.out, "{:?}", summary);
                return;
            }
            DisplayHint::None => {
                self.out.push_str(&summary);
                return;
            }
            DisplayHint::Array | DisplayHint::Map => self.out.push_str(&summary),
        }

        let mut children = p.children();
        let Some(first) = children.next() else { return };
        if depth >= self.max_depth() {
            self.out.push_str(" = {...}");
            return;
        }
        self.out.push_str(" = {");
        let limit = self.max_children();
        let mut next = Some(first);
        let mut n = 0usize;
        // Map children alternate key, value. Exactly one child past the limit is pulled, to know whether to write "...".
        while let Some((_, v)) = next {
            if n > 0 {
                self.out.push_str(", ");
            }
            if n == limit {
                self.out.push_str("...");
                break;
            }
            if hint == DisplayHint::Map {
                self.out.push('[');
                self.format_recurse(&v, depth + 1);
                self.out.push_str("] = ");
                match children.next() {
                    Some((_, value)) => self.format_recurse(&value, depth + 1),
                    None => self.out.push_str("<missing value>"),
                }
            } else {
                self.format_recurse(&v, depth + 1);
            }
            n += 1;
            next = children.next();
        }
        self.out.push('}');
    }
}
