//! Material palette: tag -> display name, display color, filament slot.
//!
//! The table is ordered; slicer XML refers to materials by positional index,
//! so index assignment must be the insertion order of the palette definition.

use tracing::warn;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialEntry {
    pub tag: String,
    pub display_name: String,
    /// `#RRGGBBAA`
    pub display_color: String,
    /// Zero-based AMS filament slot. The per-object config documents write
    /// this as a one-based extruder number.
    pub filament_slot: usize,
}

/// Behavior for tags missing from the table.
///
/// Multi-color packages want a hard failure; the combined-plate conversion
/// path maps unresolved tags to the first entry instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialLookup {
    #[default]
    Strict,
    FallbackFirst,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialTable {
    entries: Vec<MaterialEntry>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The translucent-PETG palette used for the multi-color jewelry box
    /// parts, plus the opaque ASA-GF structural slot.
    pub fn petg_translucent() -> Self {
        let mut table = Self::new();
        table.push("red", "PETG-Red", "#CC2222CC", 1);
        table.push("yellow", "PETG-Yellow", "#CCAA22CC", 2);
        table.push("black", "PETG-Black", "#222222CC", 3);
        table.push("clear", "PETG-Clear", "#EEEEEEBB", 4);
        table.push("asagf", "ASA-GF-Black", "#333333FF", 0);
        table
    }

    pub fn push(&mut self, tag: &str, display_name: &str, display_color: &str, filament_slot: usize) {
        self.entries.push(MaterialEntry {
            tag: tag.to_owned(),
            display_name: display_name.to_owned(),
            display_color: display_color.to_owned(),
            filament_slot,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MaterialEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&MaterialEntry> {
        self.entries.get(index)
    }

    /// Resolve a tag to its positional index under the given lookup policy.
    ///
    /// `object` only labels the error message.
    pub fn resolve(&self, tag: &str, object: &str, lookup: MaterialLookup) -> Result<usize> {
        match self.entries.iter().position(|e| e.tag == tag) {
            Some(idx) => Ok(idx),
            None => match lookup {
                MaterialLookup::Strict => Err(Error::UnknownMaterial {
                    tag: tag.to_owned(),
                    object: object.to_owned(),
                }),
                MaterialLookup::FallbackFirst => {
                    warn!("material tag {:?} not in palette, using index 0", tag);
                    Ok(0)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_indices_follow_insertion_order() {
        let table = MaterialTable::petg_translucent();
        let tags: Vec<&str> = table.entries().iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, ["red", "yellow", "black", "clear", "asagf"]);
        assert_eq!(table.resolve("black", "lid", MaterialLookup::Strict).unwrap(), 2);
        assert_eq!(table.get(4).unwrap().filament_slot, 0);
    }

    #[test]
    fn strict_lookup_rejects_unknown_tags() {
        let table = MaterialTable::petg_translucent();
        let err = table.resolve("purple", "knob", MaterialLookup::Strict).unwrap_err();
        match err {
            Error::UnknownMaterial { tag, object } => {
                assert_eq!(tag, "purple");
                assert_eq!(object, "knob");
            }
            other => panic!("expected UnknownMaterial, got {other:?}"),
        }
    }

    #[test]
    fn fallback_lookup_maps_unknown_tags_to_first_entry() {
        let table = MaterialTable::petg_translucent();
        let idx = table
            .resolve("purple", "knob", MaterialLookup::FallbackFirst)
            .unwrap();
        assert_eq!(idx, 0);
    }
}
