use geo::{Geometry, Point};
use student_map_backend::BackendApi;
use student_map_hazard::{AffectedSet, AffectedStudentsResolver, HazardRegister};
use student_map_hazard_models::{AffectedAreaReport, HazardType};
use student_map_routing::evaluation::evaluate_route;
use student_map_routing::{RoutePlanner, RoutingService};
use student_map_routing_models::{RouteEvaluation, RouteState, RouteUpdate};
use student_map_student::schools::{SchoolMarker, group_previous_schools};
use student_map_student::{FilterEngine, FilterOptions, FilterSpec, StudentCatalog};
use student_map_student_models::{Campus, ClusterType, Cohort, StudentId};
use tokio::sync::watch;

use crate::{CampusProximity, HazardSummary, MarkerView, SessionConfig, SessionError};

/// State of one map session.
pub struct MapSession {
    backend: Box<dyn BackendApi>,
    router: Box<dyn RoutingService>,
    config: SessionConfig,
    catalog: StudentCatalog,
    filters: FilterEngine,
    register: HazardRegister,
    resolver: AffectedStudentsResolver,
    planner: RoutePlanner,
}

impl std::fmt::Debug for MapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSession")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .field("filters", &self.filters)
            .field("register", &self.register)
            .field("planner", &self.planner)
            .finish_non_exhaustive()
    }
}

impl MapSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new(
        backend: Box<dyn BackendApi>,
        router: Box<dyn RoutingService>,
        config: SessionConfig,
    ) -> Self {
        Self {
            backend,
            router,
            config,
            catalog: StudentCatalog::new(),
            filters: FilterEngine::new(),
            register: HazardRegister::new(),
            resolver: AffectedStudentsResolver::new(),
            planner: RoutePlanner::new(),
        }
    }

    /// The student catalog.
    #[must_use]
    pub const fn catalog(&self) -> &StudentCatalog {
        &self.catalog
    }

    /// The hazard register.
    #[must_use]
    pub const fn hazards(&self) -> &HazardRegister {
        &self.register
    }

    /// Registered campuses.
    #[must_use]
    pub fn campuses(&self) -> &[Campus] {
        self.catalog.campuses().campuses()
    }

    /// Fetches a cohort and replaces the catalog with it.
    ///
    /// Clears the active route. Returns the number of students with
    /// valid coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Backend`] if the fetch fails; the catalog
    /// is left unchanged.
    pub async fn load_cohort(
        &mut self,
        cohort: Cohort,
        cluster_type: ClusterType,
    ) -> Result<usize, SessionError> {
        let records = self.backend.fetch_students(cohort, cluster_type).await?;
        self.planner.clear();
        Ok(self.catalog.load(cohort, cluster_type, records))
    }

    /// Fetches the campus registry.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Backend`] if the fetch fails; the registry
    /// is left unchanged.
    pub async fn load_campuses(&mut self) -> Result<usize, SessionError> {
        let campuses = self.backend.fetch_campuses().await?;
        let count = campuses.len();
        self.catalog.set_campuses(campuses);
        Ok(count)
    }

    /// Markers for every visible student with valid coordinates, in
    /// catalog order.
    pub fn get_visible_markers(&mut self) -> Vec<MarkerView> {
        let active = self.planner.active_student();
        let affected = self.resolver.affected_set(&self.catalog, &self.register);
        self.filters
            .visible(&self.catalog)
            .into_iter()
            .filter_map(|student| {
                let location = student.location?;
                let hazards = affected.types_for(student.id);
                Some(MarkerView {
                    id: student.id,
                    location,
                    cluster: student.cluster,
                    track: student.track().map(String::from),
                    campus: self.catalog.campus_of(student.id).map(|c| c.name.clone()),
                    affected: !hazards.is_empty(),
                    hazards,
                    has_active_route: active == Some(student.id),
                })
            })
            .collect()
    }

    /// The current affected set, recomputed if stale.
    pub fn get_affected_set(&mut self) -> &AffectedSet {
        self.resolver.affected_set(&self.catalog, &self.register)
    }

    /// Replaces the filter spec.
    pub fn set_filters(&mut self, spec: FilterSpec) {
        self.filters.set(spec);
    }

    /// Disables every filter facet.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Values offered by the filter controls.
    #[must_use]
    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions::from_catalog(&self.catalog)
    }

    /// Confirms a drawn shape as the active shape for `hazard_type`.
    ///
    /// When persistence is enabled and some active hazard affects a
    /// student, posts an affected-area report carrying this shape's
    /// area, provided the shape affects a student or has a positive
    /// area.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Backend`] if the report could not be
    /// stored. The shape stays active either way.
    pub async fn on_hazard_drawn(
        &mut self,
        hazard_type: HazardType,
        geometry: Geometry<f64>,
    ) -> Result<HazardSummary, SessionError> {
        let area = self.register.set_shape(hazard_type, geometry);
        self.confirm_hazard(hazard_type, area).await
    }

    /// Confirms a drawn circle as the active shape for `hazard_type`.
    ///
    /// # Errors
    ///
    /// See [`Self::on_hazard_drawn`].
    pub async fn on_circle_drawn(
        &mut self,
        hazard_type: HazardType,
        center: Point<f64>,
        radius_km: f64,
    ) -> Result<HazardSummary, SessionError> {
        let area = self
            .register
            .set_circle_shape(hazard_type, center, radius_km);
        self.confirm_hazard(hazard_type, area).await
    }

    async fn confirm_hazard(
        &mut self,
        hazard_type: HazardType,
        area_km2: f64,
    ) -> Result<HazardSummary, SessionError> {
        self.planner.invalidate();
        let summary = self.summarize(hazard_type, area_km2);
        log_diagnostics(&summary);

        if !self.config.persist_reports {
            return Ok(summary);
        }
        if summary.counts.values().all(|count| *count == 0) {
            log::debug!("No students affected by any hazard; not storing a {hazard_type} report");
            return Ok(summary);
        }
        if summary.affected_students == 0 && summary.area_km2 <= 0.0 {
            log::debug!("Nothing affected by {hazard_type}; not storing a report");
            return Ok(summary);
        }
        let Some(shape) = self.register.shape(hazard_type) else {
            return Ok(summary);
        };

        let report = AffectedAreaReport {
            hazard_type,
            number_of_students_affected: summary.affected_students,
            total_area: summary.area_km2,
            geojson_data: shape.to_feature(),
            clustering_type: self.catalog.cohort().map(|_| self.catalog.cluster_type()),
            education_level: self.catalog.cohort(),
            created_at: chrono::Utc::now(),
        };
        match self.backend.store_affected_area(&report).await {
            Ok(ack) => {
                log::info!("Stored {hazard_type} report: {ack}");
                Ok(summary)
            }
            Err(e) => {
                log::error!("Error storing {hazard_type} report: {e}");
                Err(e.into())
            }
        }
    }

    fn summarize(&mut self, hazard_type: HazardType, area_km2: f64) -> HazardSummary {
        let total_area_km2 = self.register.total_area_km2();
        let affected = self.resolver.affected_set(&self.catalog, &self.register);
        HazardSummary {
            hazard_type,
            area_km2,
            affected_students: affected.get(hazard_type).map_or(0, |ids| ids.len()),
            total_area_km2,
            counts: affected.counts(),
        }
    }

    /// Removes the shape for `hazard_type`. Returns whether one existed.
    pub fn remove_hazard(&mut self, hazard_type: HazardType) -> bool {
        let removed = self.register.remove_shape(hazard_type);
        if removed {
            self.planner.invalidate();
        }
        removed
    }

    /// Sets the incident zone used for detours and campus-to-affected
    /// routing.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Hazard`] for an invalid center or radius.
    pub fn set_hazard_zone(
        &mut self,
        center: Point<f64>,
        radius_km: f64,
    ) -> Result<(), SessionError> {
        self.register.set_zone(center, radius_km)?;
        self.planner.invalidate();
        Ok(())
    }

    /// Removes the incident zone.
    pub fn clear_hazard_zone(&mut self) {
        self.register.clear_zone();
        self.planner.invalidate();
    }

    /// Requests (or toggles off) the route from a student to their
    /// campus, detouring around the incident zone when needed.
    ///
    /// Returns the resulting route state. If the returned future is
    /// dropped before it completes, the planner goes back to `Idle`.
    ///
    /// # Errors
    ///
    /// * [`SessionError::UnknownStudent`] if `id` is not loaded.
    /// * [`SessionError::Routing`] if the route could not be computed.
    pub async fn request_student_route(
        &mut self,
        id: StudentId,
    ) -> Result<RouteState, SessionError> {
        let student = self
            .catalog
            .get(id)
            .ok_or(SessionError::UnknownStudent { id })?;
        let campus = self.catalog.assign_campus(student);
        let ticket = self
            .planner
            .begin_student_route(student, campus, self.register.zone())?;

        if let Some(ticket) = ticket {
            ticket.run(self.router.as_ref()).await?;
        }
        Ok(self.planner.state())
    }

    /// Routes from the campus nearest to `target` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Routing`] if no incident zone is active,
    /// no campus is registered, or the route could not be computed.
    pub async fn route_campus_to_affected(
        &mut self,
        target: Point<f64>,
    ) -> Result<RouteState, SessionError> {
        let ticket = self.planner.begin_campus_to_affected(
            target,
            self.catalog.campuses(),
            self.register.zone(),
        )?;
        ticket.run(self.router.as_ref()).await?;
        Ok(self.planner.state())
    }

    /// Hides the route and cancels any in-flight search.
    pub fn clear_route(&mut self) {
        self.planner.clear();
    }

    /// The current route state.
    #[must_use]
    pub fn route_state(&self) -> RouteState {
        self.planner.state()
    }

    /// Subscribes to route state changes.
    #[must_use]
    pub fn subscribe_routes(&self) -> watch::Receiver<RouteUpdate> {
        self.planner.subscribe()
    }

    /// Restores a stored event report as the active shape for its type.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the report cannot be fetched, has no
    /// geometry, or its geometry is not valid GeoJSON.
    pub async fn restore_event_report(&mut self, id: u64) -> Result<HazardSummary, SessionError> {
        let report = self.backend.fetch_event_report(id).await?;
        let geometry = report.geometry().ok_or(SessionError::EmptyReport { id })?;
        let area = self.register.set_shape_geojson(report.hazard_type, geometry)?;
        self.planner.invalidate();
        log::info!("Restored {} report {id}", report.hazard_type);
        let summary = self.summarize(report.hazard_type, area);
        log_diagnostics(&summary);
        Ok(summary)
    }

    /// Fetches previous schools grouped into map markers.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Backend`] if the fetch fails.
    pub async fn previous_schools(&self) -> Result<Vec<SchoolMarker>, SessionError> {
        let schools = self.backend.fetch_previous_schools().await?;
        Ok(group_previous_schools(&schools))
    }

    /// Located students of the loaded cohort within `radius_m` metres of
    /// each campus.
    #[must_use]
    pub fn campus_proximity(&self, radius_m: f64) -> Vec<CampusProximity> {
        self.catalog
            .campus_proximity(radius_m)
            .into_iter()
            .map(|(campus, students)| CampusProximity {
                campus: campus.clone(),
                radius_m,
                students,
            })
            .collect()
    }

    /// Compares the shown route with its alternatives.
    #[must_use]
    pub fn evaluate_active_route(&self) -> Option<RouteEvaluation> {
        self.planner.state().route().map(evaluate_route)
    }

    /// Removes every hazard shape, the incident zone, the route, and
    /// all filters. Loaded students and campuses stay.
    pub fn reset(&mut self) {
        self.register.reset();
        self.filters.clear();
        self.planner.clear();
        self.resolver.invalidate();
        log::info!("Session reset");
    }
}

fn log_diagnostics(summary: &HazardSummary) {
    for (hazard_type, count) in &summary.counts {
        log::info!("{}: {count} students", hazard_type.label());
    }
    log::info!(
        "Last added area ({}): {:.2} square kilometers",
        summary.hazard_type,
        summary.area_km2
    );
    log::info!(
        "Total affected area: {:.2} square kilometers",
        summary.total_area_km2
    );
}
