//! Mapper registry for cartridge construction.
//!
//! Each bank controller self-registers via [`inventory::submit!`] with a
//! [`MapperEntry`] naming the header kinds it serves and a factory. The
//! cartridge loader resolves the controller at construction time without
//! a central list; the per-access dispatch afterwards is a dense `match`
//! on the mapper enum.

use crate::cartridge::header::Header;
use crate::cartridge::Mapper;

/// Describes one bank-controller implementation.
pub struct MapperEntry {
    /// Display name for logs (e.g., "MBC5").
    pub name: &'static str,
    /// Does this controller serve the parsed header?
    pub matches: fn(&Header) -> bool,
    /// Factory: build the controller state for this cartridge.
    pub build: fn(&Header) -> Mapper,
}

inventory::collect!(MapperEntry);

/// Return all registered controllers, sorted by name.
pub fn all() -> Vec<&'static MapperEntry> {
    let mut entries: Vec<_> = inventory::iter::<MapperEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Look up the controller for a parsed header.
pub fn find(header: &Header) -> Option<&'static MapperEntry> {
    inventory::iter::<MapperEntry>
        .into_iter()
        .find(|e| (e.matches)(header))
}
