//! Conjunctive visibility filters over the student catalog.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use student_map_student_models::{Cohort, Student};

use crate::StudentCatalog;
use crate::departments::department_table;

/// Independent filter facets.
///
/// Set-valued facets accept any listed value and are disabled when
/// empty. Scalar facets require an exact match and are disabled when
/// `None`. A student is visible only if every enabled facet accepts it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Accepted college courses.
    #[serde(default)]
    pub courses: BTreeSet<String>,
    /// Accepted senior-high strands.
    #[serde(default)]
    pub strands: BTreeSet<String>,
    /// Accepted previous schools.
    #[serde(default)]
    pub previous_schools: BTreeSet<String>,
    /// Required year level.
    #[serde(default)]
    pub year_level: Option<u32>,
    /// Required age.
    #[serde(default)]
    pub age: Option<u32>,
}

impl FilterSpec {
    /// Returns `true` if every facet is disabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
            && self.strands.is_empty()
            && self.previous_schools.is_empty()
            && self.year_level.is_none()
            && self.age.is_none()
    }

    /// Returns `true` if `student` passes every enabled facet.
    #[must_use]
    pub fn test(&self, student: &Student) -> bool {
        accepts(&self.courses, student.course.as_deref())
            && accepts(&self.strands, student.strand.as_deref())
            && accepts(&self.previous_schools, student.previous_school.as_deref())
            && self.year_level.is_none_or(|y| student.year == Some(y))
            && self.age.is_none_or(|a| student.age == Some(a))
    }
}

fn accepts(set: &BTreeSet<String>, value: Option<&str>) -> bool {
    set.is_empty() || value.is_some_and(|v| set.contains(v))
}

/// Owns the session's current [`FilterSpec`].
///
/// The engine only gates visibility and never mutates the catalog.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    spec: FilterSpec,
}

impl FilterEngine {
    /// Creates an engine with every facet disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current filter spec.
    #[must_use]
    pub const fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    /// Replaces the current filter spec.
    pub fn set(&mut self, spec: FilterSpec) {
        log::debug!("Applying filters: {spec:?}");
        self.spec = spec;
    }

    /// Disables every facet.
    pub fn clear(&mut self) {
        self.spec = FilterSpec::default();
    }

    /// See [`FilterSpec::test`].
    #[must_use]
    pub fn test(&self, student: &Student) -> bool {
        self.spec.test(student)
    }

    /// Visible catalog students, in catalog order.
    ///
    /// Students without valid coordinates have no marker and are never
    /// returned.
    #[must_use]
    pub fn visible<'a>(&self, catalog: &'a StudentCatalog) -> Vec<&'a Student> {
        catalog.located().filter(|s| self.test(s)).collect()
    }
}

/// Values offered by the filter controls for the loaded cohort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Track groups: department codes with their courses for college,
    /// strand groups with their strands for senior high.
    pub tracks: Vec<(String, Vec<String>)>,
    /// Distinct year levels present in the catalog.
    pub years: Vec<u32>,
    /// Distinct previous schools present in the catalog.
    pub previous_schools: Vec<String>,
}

impl FilterOptions {
    /// Collects the options for the students currently in `catalog`.
    #[must_use]
    pub fn from_catalog(catalog: &StudentCatalog) -> Self {
        let table = department_table();
        let tracks = match catalog.cohort() {
            Some(Cohort::College) => table
                .college
                .iter()
                .map(|d| (d.code.clone(), d.courses.clone()))
                .collect(),
            Some(Cohort::SeniorHigh) => table
                .senior_high
                .iter()
                .map(|g| (g.code.clone(), g.strands.clone()))
                .collect(),
            None => Vec::new(),
        };

        let years: BTreeSet<u32> = catalog.students().iter().filter_map(|s| s.year).collect();
        let schools: BTreeSet<&str> = catalog
            .students()
            .iter()
            .filter_map(|s| s.previous_school.as_deref())
            .collect();

        Self {
            tracks,
            years: years.into_iter().collect(),
            previous_schools: schools.into_iter().map(str::to_string).collect(),
        }
    }
}
