use crate::{context::*, host::*, classify::*, printers::*};

// A named lookup hook. Returns None to let the next hook (or the debugger's default formatting) have the value.
// Declining must not read memory or log anything: hooks are asked about every value the user looks at.
pub trait Lookup<H: Host> {
    fn name(&self) -> &str;
    fn lookup<'a>(&self, host: &'a H, val: &H::Value, context: &'a Context) -> Option<PrettyPrinter<'a, H>>;
}

pub const RUNTIME_LOOKUP_NAME: &str = "lang_rt";

// Claims the runtime's Str, List_* and Dict_*_* structs, and pointers to them.
pub fn lookup_printer<'a, H: Host>(host: &'a H, val: &H::Value, context: &'a Context) -> Option<PrettyPrinter<'a, H>> {
    let class = classify_value(host, val, &context.settings);
    PrettyPrinter::from_classification(host, context, val, &class)
}

pub struct RuntimeLookup;
impl<H: Host> Lookup<H> for RuntimeLookup {
    fn name(&self) -> &str { RUNTIME_LOOKUP_NAME }
    fn lookup<'a>(&self, host: &'a H, val: &H::Value, context: &'a Context) -> Option<PrettyPrinter<'a, H>> { lookup_printer(host, val, context) }
}

// Hooks in registration order; the first one to claim a value wins.
pub struct PrettyPrinters<H: Host> {
    hooks: Vec<Box<dyn Lookup<H>>>,
}
impl<H: Host> PrettyPrinters<H> {
    pub fn new() -> Self { Self {hooks: Vec::new()} }

    pub fn len(&self) -> usize { self.hooks.len() }
    pub fn is_registered(&self, name: &str) -> bool { self.hooks.iter().any(|h| h.name() == name) }

    // Returns false (and drops the hook) if one with the same name is already there.
    pub fn register(&mut self, hook: Box<dyn Lookup<H>>) -> bool {
        if self.is_registered(hook.name()) {
            return false;
        }
        self.hooks.push(hook);
        true
    }

    pub fn lookup<'a>(&self, host: &'a H, val: &H::Value, context: &'a Context) -> Option<PrettyPrinter<'a, H>> {
        self.hooks.iter().find_map(|h| h.lookup(host, val, context))
    }
}
impl<H: Host> Default for PrettyPrinters<H> { fn default() -> Self { Self::new() } }

// Safe to call more than once per session: later calls return false and change nothing.
pub fn register_printers<H: Host>(printers: &mut PrettyPrinters<H>) -> bool {
    printers.register(Box::new(RuntimeLookup))
}
