#![allow(dead_code)]
#![allow(unused_variables)]
#![allow(unused_imports)]

// Debugger pretty-printers for the language runtime's Str, List[T] and Dict[K, V].
// The printers work against the Host trait; Inspector is a Host over raw memory (live process or snapshot) plus C struct layouts.

pub mod error;
pub mod log;
pub mod settings;
pub mod context;
pub mod types;
pub mod memory;
pub mod host;
pub mod inspector;
pub mod names;
pub mod classify;
pub mod printers;
pub mod registry;
pub mod format;

#[cfg(test)]
pub mod testing;
