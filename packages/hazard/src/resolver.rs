//! Affected-student resolution.

use std::collections::{BTreeMap, BTreeSet};

use student_map_hazard_models::HazardType;
use student_map_student::StudentCatalog;
use student_map_student_models::StudentId;

use crate::HazardRegister;

/// Students inside each active hazard shape.
///
/// Every hazard type with an active shape has an entry, possibly empty.
/// A student may appear under several types when shapes overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedSet {
    by_type: BTreeMap<HazardType, BTreeSet<StudentId>>,
}

impl AffectedSet {
    /// Students inside the shape of `hazard_type`.
    #[must_use]
    pub fn get(&self, hazard_type: HazardType) -> Option<&BTreeSet<StudentId>> {
        self.by_type.get(&hazard_type)
    }

    /// Iterates `(type, students)` in hazard type order.
    pub fn iter(&self) -> impl Iterator<Item = (HazardType, &BTreeSet<StudentId>)> {
        self.by_type.iter().map(|(t, ids)| (*t, ids))
    }

    /// Returns `true` if `id` is inside any hazard shape.
    #[must_use]
    pub fn is_affected(&self, id: StudentId) -> bool {
        self.by_type.values().any(|ids| ids.contains(&id))
    }

    /// Hazard types whose shape contains `id`.
    #[must_use]
    pub fn types_for(&self, id: StudentId) -> Vec<HazardType> {
        self.by_type
            .iter()
            .filter(|(_, ids)| ids.contains(&id))
            .map(|(t, _)| *t)
            .collect()
    }

    /// Affected student count per active hazard type.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<HazardType, usize> {
        self.by_type.iter().map(|(t, ids)| (*t, ids.len())).collect()
    }

    /// Number of distinct affected students.
    #[must_use]
    pub fn total_affected(&self) -> usize {
        self.by_type
            .values()
            .flatten()
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Returns `true` if no student is affected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_type.values().all(BTreeSet::is_empty)
    }
}

/// Tests every located catalog student against every active shape.
#[must_use]
pub fn recompute(catalog: &StudentCatalog, register: &HazardRegister) -> AffectedSet {
    let mut by_type = BTreeMap::new();
    for shape in register.shapes() {
        let ids: BTreeSet<StudentId> = shape
            .polygons()
            .iter()
            .flat_map(|polygon| catalog.within_polygon(polygon))
            .map(|s| s.id)
            .collect();
        by_type.insert(shape.hazard_type(), ids);
    }
    AffectedSet { by_type }
}

/// Caches the [`AffectedSet`] and recomputes it on read once the
/// catalog or register has changed.
#[derive(Debug, Clone, Default)]
pub struct AffectedStudentsResolver {
    cached: Option<((u64, u64), AffectedSet)>,
}

impl AffectedStudentsResolver {
    /// Creates a resolver with nothing cached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The affected set for the current catalog and register.
    pub fn affected_set(
        &mut self,
        catalog: &StudentCatalog,
        register: &HazardRegister,
    ) -> &AffectedSet {
        let key = (catalog.revision(), register.revision());
        if self.cached.as_ref().is_some_and(|(k, _)| *k != key) {
            self.cached = None;
        }
        let (_, set) = self.cached.get_or_insert_with(|| {
            let set = recompute(catalog, register);
            log::debug!(
                "Recomputed affected students: {} across {} hazard types",
                set.total_affected(),
                set.by_type.len()
            );
            (key, set)
        });
        &*set
    }

    /// Returns `true` if the student with `id` is inside any hazard.
    pub fn is_affected(
        &mut self,
        catalog: &StudentCatalog,
        register: &HazardRegister,
        id: StudentId,
    ) -> bool {
        self.affected_set(catalog, register).is_affected(id)
    }

    /// Drops the cached set.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
