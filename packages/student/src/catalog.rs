//! The student catalog for the active cohort.

use std::collections::BTreeMap;

use geo::{Point, Polygon};
use student_map_spatial::PointIndex;
use student_map_student_models::{
    Campus, ClusterType, Cohort, Student, StudentId, StudentRecord,
};

use crate::campus::CampusRegistry;

/// Every fetched student of the active cohort plus derived campus
/// assignments.
///
/// Students are replaced wholesale on each load; there are no partial
/// updates. Students whose coordinates failed validation stay listed
/// but never match a spatial query. Every mutation bumps
/// [`Self::revision`] so derived state can detect staleness.
#[derive(Debug, Default)]
pub struct StudentCatalog {
    cohort: Option<Cohort>,
    cluster_type: ClusterType,
    students: Vec<Student>,
    positions: BTreeMap<StudentId, usize>,
    index: Option<PointIndex<usize>>,
    campuses: CampusRegistry,
    assignments: Vec<Option<usize>>,
    revision: u64,
}

impl StudentCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the student set with freshly fetched backend records.
    ///
    /// Returns the number of students with usable coordinates.
    pub fn load(
        &mut self,
        cohort: Cohort,
        cluster_type: ClusterType,
        records: Vec<StudentRecord>,
    ) -> usize {
        let students = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| record.into_student(cohort, cluster_type, i as u64))
            .collect();
        self.cluster_type = cluster_type;
        self.replace(cohort, students)
    }

    /// Replaces the student set with already-built students.
    ///
    /// Returns the number of students with usable coordinates.
    pub fn replace(&mut self, cohort: Cohort, students: Vec<Student>) -> usize {
        let mut positions = BTreeMap::new();
        for (i, student) in students.iter().enumerate() {
            if positions.insert(student.id, i).is_some() {
                log::warn!("Duplicate student id {} in {cohort} cohort", student.id);
            }
        }

        let index = PointIndex::new(
            students
                .iter()
                .enumerate()
                .filter_map(|(i, s)| s.point().map(|p| (p, i))),
        );
        let located = index.len();

        log::info!(
            "Loaded {} {cohort} students ({located} with valid coordinates, {} skipped for geometry)",
            students.len(),
            students.len() - located
        );

        self.cohort = Some(cohort);
        self.students = students;
        self.positions = positions;
        self.index = Some(index);
        self.reassign();
        located
    }

    /// Removes every student (e.g. when a cohort view is hidden).
    pub fn clear(&mut self) {
        self.cohort = None;
        self.students.clear();
        self.positions.clear();
        self.index = None;
        self.assignments.clear();
        self.revision += 1;
    }

    /// Installs the session's campuses and recomputes assignments.
    pub fn set_campuses(&mut self, campuses: Vec<Campus>) {
        log::info!("Registered {} campuses", campuses.len());
        self.campuses = CampusRegistry::new(campuses);
        self.reassign();
    }

    fn reassign(&mut self) {
        self.assignments = self
            .students
            .iter()
            .map(|s| self.campuses.assign_index(s))
            .collect();
        self.revision += 1;
    }

    /// The active cohort, if any students are loaded.
    #[must_use]
    pub const fn cohort(&self) -> Option<Cohort> {
        self.cohort
    }

    /// Cluster labelling used for the loaded students.
    #[must_use]
    pub const fn cluster_type(&self) -> ClusterType {
        self.cluster_type
    }

    /// Change counter, bumped on every load, clear, or campus change.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// The campus registry.
    #[must_use]
    pub const fn campuses(&self) -> &CampusRegistry {
        &self.campuses
    }

    /// All students in catalog order, including those without valid
    /// coordinates.
    #[must_use]
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// Number of students.
    #[must_use]
    pub fn len(&self) -> usize {
        self.students.len()
    }

    /// Returns `true` if no students are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Looks up a student by id.
    #[must_use]
    pub fn get(&self, id: StudentId) -> Option<&Student> {
        self.positions.get(&id).map(|&i| &self.students[i])
    }

    /// Students with valid coordinates, in catalog order.
    pub fn located(&self) -> impl Iterator<Item = &Student> {
        self.students.iter().filter(|s| s.location.is_some())
    }

    /// Students inside `polygon` (boundary inclusive), in catalog order.
    #[must_use]
    pub fn within_polygon(&self, polygon: &Polygon<f64>) -> Vec<&Student> {
        let Some(index) = &self.index else {
            return Vec::new();
        };
        let mut hits: Vec<usize> = index.within_polygon(polygon).into_iter().copied().collect();
        hits.sort_unstable();
        hits.into_iter().map(|i| &self.students[i]).collect()
    }

    /// Students within `radius_km` of `center`, in catalog order.
    #[must_use]
    pub fn students_within(&self, center: Point<f64>, radius_km: f64) -> Vec<&Student> {
        let Some(index) = &self.index else {
            return Vec::new();
        };
        let mut hits: Vec<usize> = index
            .within_radius_km(center, radius_km)
            .into_iter()
            .copied()
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|i| &self.students[i]).collect()
    }

    /// The campus `student` attends (see [`CampusRegistry::assign`]).
    ///
    /// Uses the cached assignment for catalog members and computes it
    /// on the fly otherwise, so both paths agree.
    #[must_use]
    pub fn assign_campus(&self, student: &Student) -> Option<&Campus> {
        match self.positions.get(&student.id) {
            Some(&i) if self.students[i] == *student => {
                self.assignments[i].and_then(|c| self.campuses.get(c))
            }
            _ => self.campuses.assign(student),
        }
    }

    /// The campus of the student with `id`.
    #[must_use]
    pub fn campus_of(&self, id: StudentId) -> Option<&Campus> {
        let &i = self.positions.get(&id)?;
        self.assignments[i].and_then(|c| self.campuses.get(c))
    }

    /// Number of located students within `radius_m` metres of `campus`.
    #[must_use]
    pub fn count_within_radius(&self, campus: &Campus, radius_m: f64) -> usize {
        self.students_within(campus.point(), radius_m / 1000.0).len()
    }

    /// Located-student counts around every campus ("near campus
    /// radius" layer).
    #[must_use]
    pub fn campus_proximity(&self, radius_m: f64) -> Vec<(&Campus, usize)> {
        self.campuses
            .campuses()
            .iter()
            .map(|c| (c, self.count_within_radius(c, radius_m)))
            .collect()
    }
}
