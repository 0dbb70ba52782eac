#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Student catalog, campus assignment, and visibility filters.
//!
//! The [`StudentCatalog`] holds the fetched students of the active
//! cohort together with the campus registry and each student's derived
//! campus. The [`FilterEngine`] gates which catalog entries are visible
//! without ever mutating the catalog.

pub mod campus;
pub mod catalog;
pub mod departments;
pub mod filter;
pub mod schools;

pub use campus::CampusRegistry;
pub use catalog::StudentCatalog;
pub use filter::{FilterEngine, FilterOptions, FilterSpec};

use thiserror::Error;

/// Errors from student domain configuration.
#[derive(Debug, Error)]
pub enum StudentError {
    /// The department table TOML could not be parsed.
    #[error("Department table error: {0}")]
    Config(#[from] toml::de::Error),

    /// The department table parsed but is inconsistent.
    #[error("Invalid department table: {message}")]
    InvalidTable {
        /// What is wrong with the table.
        message: String,
    },
}
