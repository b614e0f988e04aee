//! Per-session object registry.
//!
//! Built fresh every time the picker opens from the manifest of printable
//! objects and the set of ids already excluded upstream. `toggle` is the
//! only way to change a record, so canvas clicks and list checkboxes always
//! agree.

use std::collections::{BTreeMap, BTreeSet};

use crate::raster::codec::{self, PackedColorId};

/// Printable objects on the plate: id → human-readable label.
pub type Manifest = BTreeMap<PackedColorId, String>;

/// State of one printable object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    pub id: PackedColorId,
    pub label: String,
    /// Excluded by an earlier submit; fixed for the session.
    pub already_excluded: bool,
    /// Will be part of the next commit.
    pub pending_exclusion: bool,
}

impl ObjectRecord {
    /// Locked records cannot be toggled.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.already_excluded
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectRegistry {
    records: BTreeMap<PackedColorId, ObjectRecord>,
}

impl ObjectRegistry {
    /// Create one record per manifest entry.
    ///
    /// The background id is reserved and is never registered.
    pub fn build(manifest: &Manifest, already_excluded: &BTreeSet<PackedColorId>) -> Self {
        let records = manifest
            .iter()
            .filter(|(&id, _)| !codec::is_background(id))
            .map(|(&id, label)| {
                let locked = already_excluded.contains(&id);
                (
                    id,
                    ObjectRecord {
                        id,
                        label: label.clone(),
                        already_excluded: locked,
                        pending_exclusion: locked,
                    },
                )
            })
            .collect();
        Self { records }
    }

    /// Drop entries whose id never appears in the pick raster.
    ///
    /// Locked records stay: an already-excluded object is committed again
    /// whether or not it is still drawn.
    pub fn retain_present(&mut self, present: &BTreeSet<PackedColorId>) {
        let before = self.records.len();
        self.records
            .retain(|id, record| record.is_locked() || present.contains(id));
        let dropped = before - self.records.len();
        if dropped > 0 {
            log::debug!("dropped {} manifest entries absent from the pick image", dropped);
        }
    }

    /// Flip `pending_exclusion` of an unlocked record.
    ///
    /// Returns the record's (possibly unchanged) pending flag, or `None`
    /// when the id is not registered.
    pub fn toggle(&mut self, id: PackedColorId) -> Option<bool> {
        let record = self.records.get_mut(&id)?;
        if !record.is_locked() {
            record.pending_exclusion = !record.pending_exclusion;
        }
        Some(record.pending_exclusion)
    }

    pub fn get(&self, id: PackedColorId) -> Option<&ObjectRecord> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: PackedColorId) -> bool {
        self.records.contains_key(&id)
    }

    #[inline]
    pub fn is_pending(&self, id: PackedColorId) -> bool {
        self.records.get(&id).is_some_and(|r| r.pending_exclusion)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.records.values()
    }

    /// Ids that the next commit will exclude, ascending.
    pub fn pending_ids(&self) -> Vec<PackedColorId> {
        self.iter()
            .filter(|r| r.pending_exclusion)
            .map(|r| r.id)
            .collect()
    }

    /// Pending ids as the comma-joined list the submit action expects.
    pub fn normalized_pending(&self) -> String {
        join_ids(&self.pending_ids())
    }
}

/// Join ids with commas, no spaces. Callers pass them already sorted.
pub fn join_ids(ids: &[PackedColorId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_and_cylinder() -> ObjectRegistry {
        let manifest: Manifest = [(1, "Cube".to_string()), (2, "Cylinder".to_string())]
            .into_iter()
            .collect();
        ObjectRegistry::build(&manifest, &BTreeSet::from([2]))
    }

    #[test]
    fn test_build_initializes_pending_from_exclusions() {
        let registry = cube_and_cylinder();
        let cube = registry.get(1).unwrap();
        assert!(!cube.already_excluded && !cube.pending_exclusion);
        let cylinder = registry.get(2).unwrap();
        assert!(cylinder.already_excluded && cylinder.pending_exclusion);
        assert_eq!(cylinder.label, "Cylinder");
    }

    #[test]
    fn test_toggle_is_an_involution() {
        let mut registry = cube_and_cylinder();
        assert_eq!(registry.toggle(1), Some(true));
        assert_eq!(registry.toggle(1), Some(false));
        assert!(!registry.get(1).unwrap().pending_exclusion);
    }

    #[test]
    fn test_locked_record_never_changes() {
        let mut registry = cube_and_cylinder();
        assert_eq!(registry.toggle(2), Some(true));
        assert_eq!(registry.toggle(2), Some(true));
        assert!(registry.get(2).unwrap().pending_exclusion);
    }

    #[test]
    fn test_unregistered_toggle_is_noop() {
        let mut registry = cube_and_cylinder();
        let before = registry.clone();
        assert_eq!(registry.toggle(99), None);
        assert_eq!(registry, before);
    }

    #[test]
    fn test_background_never_registered() {
        let manifest: Manifest = [(0, "ghost".to_string()), (5, "Benchy".to_string())]
            .into_iter()
            .collect();
        let registry = ObjectRegistry::build(&manifest, &BTreeSet::new());
        assert!(!registry.contains(0));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_normalized_pending_is_sorted() {
        let manifest: Manifest = [(300, "a"), (7, "b"), (42, "c")]
            .into_iter()
            .map(|(id, l)| (id, l.to_string()))
            .collect();
        let mut registry = ObjectRegistry::build(&manifest, &BTreeSet::from([300]));
        registry.toggle(42);
        registry.toggle(7);
        assert_eq!(registry.normalized_pending(), "7,42,300");
        assert_eq!(ObjectRegistry::default().normalized_pending(), "");
    }

    #[test]
    fn test_retain_present() {
        let mut registry = cube_and_cylinder();
        registry.retain_present(&BTreeSet::from([2, 3]));
        assert!(!registry.contains(1));
        assert!(registry.contains(2));
    }

    #[test]
    fn test_retain_present_keeps_locked_records() {
        let mut registry = cube_and_cylinder();
        registry.retain_present(&BTreeSet::from([1]));
        assert!(registry.contains(1));
        assert!(registry.get(2).unwrap().is_locked());
        registry.toggle(1);
        assert_eq!(registry.normalized_pending(), "1,2");
    }
}
