#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Student, campus, and cohort types.
//!
//! Backend responses are loosely typed: coordinates may arrive as
//! numbers, numeric strings, `null`, or not at all. The `*Record` types
//! accept all of these and the conversion into [`Student`] validates
//! coordinates once, so downstream code only ever sees either a valid
//! [`LatLng`] or `None`.

use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Academic level of a student, which also identifies a cohort (the
/// population fetched and clustered together).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Cohort {
    /// Senior-high students (grouped by strand).
    SeniorHigh,
    /// College students (grouped by course).
    College,
}

/// Which clustering label the backend should return with each student.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClusterType {
    /// Default clustering run.
    #[default]
    Cluster,
    /// Clusters computed from address components.
    Address,
    /// Clusters computed from proximity to campuses.
    Proximity,
}

/// Cluster label meaning "outside the region of interest".
pub const UNCLUSTERED: i32 = -1;

/// A validated geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees, within `[-90, 90]`.
    pub lat: f64,
    /// Longitude in degrees, within `[-180, 180]`.
    pub lng: f64,
}

impl LatLng {
    /// Validates a coordinate pair.
    ///
    /// Returns `None` if either value is missing, non-finite, or out of
    /// range.
    #[must_use]
    pub fn new(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        let (lat, lng) = (lat?, lng?);
        if lat.is_finite() && lng.is_finite() && lat.abs() <= 90.0 && lng.abs() <= 180.0 {
            Some(Self { lat, lng })
        } else {
            None
        }
    }

    /// Converts to a [`geo::Point`] (`x` = longitude, `y` = latitude).
    #[must_use]
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lng, self.lat)
    }
}

impl From<geo::Point<f64>> for LatLng {
    fn from(point: geo::Point<f64>) -> Self {
        Self {
            lat: point.y(),
            lng: point.x(),
        }
    }
}

/// Stable identifier of a student within a loaded cohort.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StudentId(pub u64);

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A student residence as held by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    /// Identifier (backend id, or registration index when absent).
    pub id: StudentId,
    /// Display name, when the backend provides one.
    pub name: Option<String>,
    /// Senior-high or college.
    pub level: Cohort,
    /// Residence location; `None` when the record had unusable
    /// coordinates.
    pub location: Option<LatLng>,
    /// College course code (e.g. `"B.S.C.S."`).
    pub course: Option<String>,
    /// Senior-high strand (college students may carry their former
    /// strand too).
    pub strand: Option<String>,
    /// School attended before enrolling.
    pub previous_school: Option<String>,
    /// Year level.
    pub year: Option<u32>,
    /// Age in years.
    pub age: Option<u32>,
    /// Cluster label; [`UNCLUSTERED`] for students outside the region.
    pub cluster: i32,
}

impl Student {
    /// The academic track: the course for college students, the strand
    /// for senior-high students.
    #[must_use]
    pub fn track(&self) -> Option<&str> {
        match self.level {
            Cohort::College => self.course.as_deref(),
            Cohort::SeniorHigh => self.strand.as_deref(),
        }
    }

    /// Residence as a [`geo::Point`], if the coordinates were valid.
    #[must_use]
    pub fn point(&self) -> Option<geo::Point<f64>> {
        self.location.map(LatLng::to_point)
    }

    /// Returns `true` if the clustering process placed this student
    /// outside the region of interest.
    #[must_use]
    pub const fn is_unclustered(&self) -> bool {
        self.cluster == UNCLUSTERED
    }
}

/// Raw student record as returned by `GET /students`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentRecord {
    /// Backend identifier.
    #[serde(default, alias = "stud_id", deserialize_with = "loose_u64")]
    pub id: Option<u64>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Latitude (number, numeric string, or null).
    #[serde(default, deserialize_with = "loose_f64")]
    pub latitude: Option<f64>,
    /// Longitude (number, numeric string, or null).
    #[serde(default, deserialize_with = "loose_f64")]
    pub longitude: Option<f64>,
    /// College course.
    #[serde(default)]
    pub course: Option<String>,
    /// Senior-high strand.
    #[serde(default)]
    pub strand: Option<String>,
    /// Previous school name.
    #[serde(default)]
    pub previous_school: Option<String>,
    /// Year level.
    #[serde(default, deserialize_with = "loose_u32")]
    pub year: Option<u32>,
    /// Age.
    #[serde(default, deserialize_with = "loose_u32")]
    pub age: Option<u32>,
    /// Generic cluster label.
    #[serde(default, deserialize_with = "loose_i32")]
    pub cluster: Option<i32>,
    /// Address-based cluster label.
    #[serde(default, deserialize_with = "loose_i32")]
    pub cluster_address: Option<i32>,
    /// Proximity-based cluster label.
    #[serde(default, deserialize_with = "loose_i32")]
    pub cluster_proximity: Option<i32>,
}

impl StudentRecord {
    /// Picks the cluster label matching `cluster_type`, falling back to
    /// the generic `cluster` field and then to [`UNCLUSTERED`].
    #[must_use]
    pub fn cluster_label(&self, cluster_type: ClusterType) -> i32 {
        let specific = match cluster_type {
            ClusterType::Address => self.cluster_address,
            ClusterType::Proximity => self.cluster_proximity,
            ClusterType::Cluster => None,
        };
        specific.or(self.cluster).unwrap_or(UNCLUSTERED)
    }

    /// Converts into a [`Student`], validating coordinates.
    ///
    /// `fallback_id` is used when the record carries no identifier.
    #[must_use]
    pub fn into_student(self, level: Cohort, cluster_type: ClusterType, fallback_id: u64) -> Student {
        let cluster = self.cluster_label(cluster_type);
        Student {
            id: StudentId(self.id.unwrap_or(fallback_id)),
            name: self.name,
            level,
            location: LatLng::new(self.latitude, self.longitude),
            course: non_empty(self.course),
            strand: non_empty(self.strand),
            previous_school: non_empty(self.previous_school),
            year: self.year,
            age: self.age,
            cluster,
        }
    }
}

/// A university campus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campus {
    /// Backend identifier.
    #[serde(default, alias = "campus_id")]
    pub id: u64,
    /// Campus name (e.g. `"USJ-R Main Campus"`).
    pub name: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

impl Campus {
    /// Campus location as a [`geo::Point`].
    #[must_use]
    pub fn point(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

/// Aggregated previous-school entry from `GET /previous-schools`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousSchool {
    /// School name.
    pub name: String,
    /// Latitude (may be missing or non-numeric).
    #[serde(default, deserialize_with = "loose_f64")]
    pub latitude: Option<f64>,
    /// Longitude (may be missing or non-numeric).
    #[serde(default, deserialize_with = "loose_f64")]
    pub longitude: Option<f64>,
    /// Number of senior-high students from this school.
    #[serde(default)]
    pub senior_high_count: u64,
    /// Number of college students from this school.
    #[serde(default)]
    pub college_count: u64,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn loose_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }))
}

fn loose_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_number(deserializer)?.filter(|v| v.is_finite()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn loose_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_number(deserializer)?
        .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
        .map(|v| v as u64))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn loose_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_number(deserializer)?
        .filter(|v| v.is_finite() && *v >= 0.0 && *v <= f64::from(u32::MAX) && v.fract() == 0.0)
        .map(|v| v as u32))
}

#[allow(clippy::cast_possible_truncation)]
fn loose_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_number(deserializer)?
        .filter(|v| {
            v.is_finite()
                && *v >= f64::from(i32::MIN)
                && *v <= f64::from(i32::MAX)
                && v.fract() == 0.0
        })
        .map(|v| v as i32))
}
