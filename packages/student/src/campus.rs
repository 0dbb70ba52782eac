//! Campus registry and campus assignment.

use geo::Point;
use student_map_spatial::haversine_distance_km;
use student_map_student_models::{Campus, Cohort, Student};

use crate::departments::{DepartmentTable, department_table};

/// Campuses of the session, in registration order.
///
/// Populated once from the backend and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct CampusRegistry {
    campuses: Vec<Campus>,
}

impl CampusRegistry {
    /// Creates a registry preserving the given order.
    #[must_use]
    pub fn new(campuses: Vec<Campus>) -> Self {
        Self { campuses }
    }

    /// All campuses in registration order.
    #[must_use]
    pub fn campuses(&self) -> &[Campus] {
        &self.campuses
    }

    /// Number of registered campuses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.campuses.len()
    }

    /// Returns `true` if no campus is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.campuses.is_empty()
    }

    /// Looks up a campus by exact name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Campus> {
        self.campuses.iter().find(|c| c.name == name)
    }

    /// Position of the campus nearest to `point` by haversine distance.
    ///
    /// Ties go to the campus registered first.
    #[must_use]
    pub fn nearest_index(&self, point: Point<f64>) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, campus) in self.campuses.iter().enumerate() {
            let distance = haversine_distance_km(point, campus.point());
            if distance.is_nan() {
                continue;
            }
            match best {
                Some((_, current)) if distance >= current => {}
                _ => best = Some((i, distance)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// The campus nearest to `point`.
    #[must_use]
    pub fn nearest(&self, point: Point<f64>) -> Option<&Campus> {
        self.nearest_index(point).map(|i| &self.campuses[i])
    }

    /// Position of the campus `student` attends.
    ///
    /// College students follow the department table (secondary-campus
    /// departments first, main campus otherwise) regardless of where
    /// they live. Senior-high students attend their nearest campus and
    /// have none when their coordinates are invalid.
    #[must_use]
    pub fn assign_index(&self, student: &Student) -> Option<usize> {
        self.assign_index_with(student, department_table())
    }

    fn assign_index_with(&self, student: &Student, table: &DepartmentTable) -> Option<usize> {
        match student.level {
            Cohort::College => {
                let name = table.campus_name_for_course(student.course.as_deref());
                let index = self.campuses.iter().position(|c| c.name == name);
                if index.is_none() {
                    log::warn!("Campus {name:?} for course {:?} is not registered", student.course);
                }
                index
            }
            Cohort::SeniorHigh => student.point().and_then(|p| self.nearest_index(p)),
        }
    }

    /// The campus `student` attends. See [`Self::assign_index`].
    #[must_use]
    pub fn assign(&self, student: &Student) -> Option<&Campus> {
        self.assign_index(student).map(|i| &self.campuses[i])
    }

    /// Campus at a registration position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Campus> {
        self.campuses.get(index)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use student_map_student_models::{LatLng, StudentId};

    pub(crate) fn campuses() -> Vec<Campus> {
        vec![
            Campus {
                id: 1,
                name: "USJ-R Main Campus".to_string(),
                latitude: 10.2936,
                longitude: 123.8977,
            },
            Campus {
                id: 2,
                name: "USJ-R Basak Campus".to_string(),
                latitude: 10.2891,
                longitude: 123.8616,
            },
        ]
    }

    pub(crate) fn student(id: u64, level: Cohort, lat: f64, lng: f64) -> Student {
        Student {
            id: StudentId(id),
            name: None,
            level,
            location: LatLng::new(Some(lat), Some(lng)),
            course: None,
            strand: None,
            previous_school: None,
            year: None,
            age: None,
            cluster: 0,
        }
    }

    #[test]
    fn college_course_table_overrides_distance() {
        let registry = CampusRegistry::new(campuses());
        // Lives right next to the main campus.
        let mut s = student(1, Cohort::College, 10.2936, 123.8977);
        s.course = Some("B.S.C.S.".to_string());
        assert_eq!(registry.assign(&s).unwrap().name, "USJ-R Basak Campus");
    }

    #[test]
    fn other_college_courses_attend_main_campus() {
        let registry = CampusRegistry::new(campuses());
        let mut s = student(1, Cohort::College, 10.2891, 123.8616);
        s.course = Some("B.S.N.".to_string());
        assert_eq!(registry.assign(&s).unwrap().name, "USJ-R Main Campus");
    }

    #[test]
    fn college_student_without_coordinates_still_assigned() {
        let registry = CampusRegistry::new(campuses());
        let mut s = student(1, Cohort::College, f64::NAN, 0.0);
        s.course = Some("BSEd-Math".to_string());
        assert!(s.location.is_none());
        assert_eq!(registry.assign(&s).unwrap().name, "USJ-R Basak Campus");
    }

    #[test]
    fn senior_high_uses_nearest_campus() {
        let registry = CampusRegistry::new(campuses());
        let near_basak = student(1, Cohort::SeniorHigh, 10.288, 123.855);
        let near_main = student(2, Cohort::SeniorHigh, 10.300, 123.900);
        assert_eq!(registry.assign(&near_basak).unwrap().id, 2);
        assert_eq!(registry.assign(&near_main).unwrap().id, 1);
    }

    #[test]
    fn senior_high_tie_goes_to_first_registered() {
        let mut list = campuses();
        list[1].latitude = list[0].latitude;
        list[1].longitude = list[0].longitude;
        let registry = CampusRegistry::new(list);
        let s = student(1, Cohort::SeniorHigh, 10.31, 123.91);
        assert_eq!(registry.assign(&s).unwrap().id, 1);
    }

    #[test]
    fn senior_high_without_coordinates_has_no_campus() {
        let registry = CampusRegistry::new(campuses());
        let s = student(1, Cohort::SeniorHigh, 200.0, 0.0);
        assert!(registry.assign(&s).is_none());
    }

    #[test]
    fn missing_named_campus_yields_none() {
        let registry = CampusRegistry::new(vec![campuses().remove(0)]);
        let mut s = student(1, Cohort::College, 10.3, 123.9);
        s.course = Some("B.S.C.S.".to_string());
        assert!(registry.assign(&s).is_none());
    }

    #[test]
    fn empty_registry_has_no_nearest() {
        assert!(CampusRegistry::default().nearest(Point::new(123.9, 10.3)).is_none());
    }
}
