//! Reference table for `#n`-style back references.
//!
//! Every referable unit of a query gets a strictly increasing positional id;
//! explicitly labeled units are additionally bound under their label. Both
//! kinds of ids share one lookup namespace. The table lives for exactly one
//! translation call, entries are only ever added.

use std::collections::HashMap;

use crate::errors::{KoralError, Result};
use crate::koral::KoralNode;

#[derive(Debug, Default)]
pub struct ReferenceTable {
    entries: HashMap<String, KoralNode>,
}

impl ReferenceTable {
    pub fn new() -> ReferenceTable {
        ReferenceTable::default()
    }

    /// Binds `id` to the given graph node.
    ///
    /// Fails with [`KoralError::DuplicateReference`] if `id` is already
    /// bound. Positional ids cannot collide by construction, but a malformed
    /// query may define the same explicit label twice; that is surfaced, not
    /// silently overwritten.
    pub fn define(&mut self, id: impl Into<String>, node: KoralNode) -> Result<()> {
        let id = id.into();
        match self.entries.entry(id) {
            std::collections::hash_map::Entry::Occupied(e) => {
                Err(KoralError::DuplicateReference(e.key().clone()))
            }
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(node);
                Ok(())
            }
        }
    }

    /// Resolves `id` to a copy of the node it denotes.
    pub fn resolve(&self, id: &str) -> Result<KoralNode> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| KoralError::UnresolvedReference(id.to_string()))
    }
}
