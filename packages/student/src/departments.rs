//! Compile-time department table.
//!
//! The table in `departments.toml` maps college courses to their
//! department and to the campus the department attends, and groups
//! senior-high strands for filter listings. It is embedded with
//! `include_str!` and parsed once on first use.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::StudentError;

const DEPARTMENTS_TOML: &str = include_str!("../departments.toml");

static DEPARTMENTS: LazyLock<DepartmentTable> = LazyLock::new(|| {
    parse_department_table(DEPARTMENTS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded department table: {e}"))
});

/// Which configured campus a college department attends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampusAssignment {
    /// The main campus.
    Main,
    /// The designated secondary campus.
    Secondary,
}

/// A college department and its courses.
#[derive(Debug, Clone, Deserialize)]
pub struct CollegeDepartment {
    /// Department code (e.g. `"SCS"`).
    pub code: String,
    /// Campus attended by every course in the department.
    pub campus: CampusAssignment,
    /// Course codes.
    pub courses: Vec<String>,
}

/// A senior-high strand group.
#[derive(Debug, Clone, Deserialize)]
pub struct StrandGroup {
    /// Group code (e.g. `"S.T.E.M."`).
    pub code: String,
    /// Strand codes in the group.
    pub strands: Vec<String>,
}

/// The parsed department table.
#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentTable {
    /// Name of the main campus in the campus registry.
    pub main_campus: String,
    /// Name of the secondary campus in the campus registry.
    pub secondary_campus: String,
    /// College departments.
    #[serde(default)]
    pub college: Vec<CollegeDepartment>,
    /// Senior-high strand groups.
    #[serde(default)]
    pub senior_high: Vec<StrandGroup>,
}

impl DepartmentTable {
    /// Returns the department offering `course`, if any.
    #[must_use]
    pub fn department_of(&self, course: &str) -> Option<&CollegeDepartment> {
        self.college
            .iter()
            .find(|d| d.courses.iter().any(|c| c == course))
    }

    /// Name of the campus a college student taking `course` attends.
    ///
    /// Courses outside every secondary-campus department (including
    /// unknown courses) attend the main campus.
    #[must_use]
    pub fn campus_name_for_course(&self, course: Option<&str>) -> &str {
        match course.and_then(|c| self.department_of(c)).map(|d| d.campus) {
            Some(CampusAssignment::Secondary) => &self.secondary_campus,
            Some(CampusAssignment::Main) | None => &self.main_campus,
        }
    }
}

/// Parses a department table from TOML and validates it.
///
/// # Errors
///
/// Returns [`StudentError`] if the TOML is malformed, the campus names
/// are empty, or a course is listed under more than one department.
pub fn parse_department_table(toml_str: &str) -> Result<DepartmentTable, StudentError> {
    let table: DepartmentTable = toml::de::from_str(toml_str)?;

    if table.main_campus.trim().is_empty() || table.secondary_campus.trim().is_empty() {
        return Err(StudentError::InvalidTable {
            message: "campus names must not be empty".to_string(),
        });
    }

    let mut seen = BTreeSet::new();
    for department in &table.college {
        for course in &department.courses {
            if !seen.insert(course.as_str()) {
                return Err(StudentError::InvalidTable {
                    message: format!("course {course} is listed in more than one department"),
                });
            }
        }
    }

    Ok(table)
}

/// The embedded department table.
///
/// # Panics
///
/// Panics on first use if the embedded TOML is malformed (a development
/// error caught by the tests below).
#[must_use]
pub fn department_table() -> &'static DepartmentTable {
    &DEPARTMENTS
}
