#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the student map.
//!
//! Each subcommand builds a [`MapSession`] against the configured
//! backend (`STUDENT_MAP_API_URL`) and OSRM server (`OSRM_URL`), runs
//! one map operation, and prints the result as JSON.

mod shapes;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use student_map_backend::HttpBackend;
use student_map_hazard_models::HazardType;
use student_map_routing::OsrmClient;
use student_map_session::{MapSession, SessionConfig};
use student_map_student_models::{ClusterType, Cohort, StudentId};

use crate::shapes::{CircleArg, read_geometry};

#[derive(Parser)]
#[command(name = "student_map", about = "Student residence and hazard map tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CohortArgs {
    /// Cohort to load (`senior_high` or `college`)
    #[arg(long, default_value = "senior_high")]
    cohort: Cohort,
    /// Cluster labels to load (`cluster`, `address`, or `proximity`)
    #[arg(long, default_value = "cluster")]
    cluster_type: ClusterType,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered campuses
    Campuses,
    /// Load a cohort and print the filter options it offers
    Students {
        #[command(flatten)]
        cohort: CohortArgs,
    },
    /// Draw a hazard shape and report the affected students
    Affected {
        #[command(flatten)]
        cohort: CohortArgs,
        /// Hazard type (flood, strike, restricted, fire)
        hazard: HazardType,
        /// GeoJSON file holding the shape
        #[arg(long, conflicts_with = "circle", required_unless_present = "circle")]
        geojson: Option<PathBuf>,
        /// Circle shape as `lat,lng,radius_km`
        #[arg(long)]
        circle: Option<CircleArg>,
        /// Do not store the affected-area report
        #[arg(long)]
        no_persist: bool,
    },
    /// Route a student to their campus
    Route {
        #[command(flatten)]
        cohort: CohortArgs,
        /// Student id
        student: u64,
        /// Incident zone to avoid, as `lat,lng,radius_km`
        #[arg(long)]
        zone: Option<CircleArg>,
        /// Also print metrics comparing the route with its alternatives
        #[arg(long)]
        evaluate: bool,
    },
    /// Route from the nearest campus to the center of an incident zone
    CampusToAffected {
        /// Incident zone as `lat,lng,radius_km`
        zone: CircleArg,
    },
    /// Count students living near each campus
    Proximity {
        #[command(flatten)]
        cohort: CohortArgs,
        /// Radius in meters
        #[arg(long, default_value = "2000")]
        radius: f64,
    },
    /// List previous schools grouped by location
    PreviousSchools,
    /// Restore a stored event report and report the affected students
    Restore {
        #[command(flatten)]
        cohort: CohortArgs,
        /// Event report id
        id: u64,
    },
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn open_session(
    config: SessionConfig,
    cohort: Option<&CohortArgs>,
) -> Result<MapSession, Box<dyn std::error::Error>> {
    let mut session = MapSession::new(
        Box::new(HttpBackend::from_env()),
        Box::new(OsrmClient::from_env()),
        config,
    );
    let campuses = session.load_campuses().await?;
    log::info!("Loaded {campuses} campuses");
    if let Some(args) = cohort {
        let located = session.load_cohort(args.cohort, args.cluster_type).await?;
        log::info!(
            "Loaded {} {} students ({located} with valid coordinates)",
            session.catalog().len(),
            args.cohort
        );
    }
    Ok(session)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let config = SessionConfig::from_env();

    match cli.command {
        Commands::Campuses => {
            let session = open_session(config, None).await?;
            println!("{:<6} {:<32} LOCATION", "ID", "NAME");
            println!("{}", "-".repeat(60));
            for campus in session.campuses() {
                println!(
                    "{:<6} {:<32} {:.5}, {:.5}",
                    campus.id, campus.name, campus.latitude, campus.longitude
                );
            }
        }
        Commands::Students { cohort } => {
            let session = open_session(config, Some(&cohort)).await?;
            print_json(&session.filter_options())?;
        }
        Commands::Affected {
            cohort,
            hazard,
            geojson,
            circle,
            no_persist,
        } => {
            let config = SessionConfig {
                persist_reports: config.persist_reports && !no_persist,
            };
            let mut session = open_session(config, Some(&cohort)).await?;
            let summary = match (geojson, circle) {
                (Some(path), _) => {
                    let geometry = read_geometry(&path)?;
                    session.on_hazard_drawn(hazard, geometry).await?
                }
                (None, Some(circle)) => {
                    session
                        .on_circle_drawn(hazard, circle.center, circle.radius_km)
                        .await?
                }
                (None, None) => return Err("Either --geojson or --circle is required".into()),
            };
            print_json(&summary)?;
        }
        Commands::Route {
            cohort,
            student,
            zone,
            evaluate,
        } => {
            let mut session = open_session(config, Some(&cohort)).await?;
            if let Some(zone) = zone {
                session.set_hazard_zone(zone.center, zone.radius_km)?;
            }
            let state = session.request_student_route(StudentId(student)).await?;
            print_json(&state)?;
            if evaluate {
                if let Some(evaluation) = session.evaluate_active_route() {
                    print_json(&evaluation)?;
                }
            }
        }
        Commands::CampusToAffected { zone } => {
            let mut session = open_session(config, None).await?;
            session.set_hazard_zone(zone.center, zone.radius_km)?;
            let state = session.route_campus_to_affected(zone.center).await?;
            print_json(&state)?;
        }
        Commands::Proximity { cohort, radius } => {
            let session = open_session(config, Some(&cohort)).await?;
            print_json(&session.campus_proximity(radius))?;
        }
        Commands::PreviousSchools => {
            let session = open_session(config, None).await?;
            print_json(&session.previous_schools().await?)?;
        }
        Commands::Restore { cohort, id } => {
            let mut session = open_session(config, Some(&cohort)).await?;
            print_json(&session.restore_event_report(id).await?)?;
        }
    }

    Ok(())
}
