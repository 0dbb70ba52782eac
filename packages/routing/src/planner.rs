//! The route planner state machine.
//!
//! `Idle -> RouteRequested -> (RouteFound | DetourSearch | RouteFailed)`,
//! and back to `Idle` on clear. Every request bumps the generation
//! published with the state; a [`RouteTicket`] only applies results
//! while its generation is still the published one, so a newer request,
//! a clear, or a hazard edit silently discards older searches.

use std::sync::Arc;

use geo::Point;
use student_map_hazard::HazardZone;
use student_map_routing_models::{
    Route, RouteKind, RouteRequest, RouteResult, RouteState, RouteUpdate,
};
use student_map_spatial::route_intersects_polygon;
use student_map_student::CampusRegistry;
use student_map_student_models::{Campus, LatLng, Student, StudentId};
use tokio::sync::watch;

use crate::detour::detour_candidates;
use crate::{RoutingError, RoutingService};

/// Owns the route state and hands out [`RouteTicket`]s.
#[derive(Debug)]
pub struct RoutePlanner {
    updates: Arc<watch::Sender<RouteUpdate>>,
}

impl Default for RoutePlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutePlanner {
    /// Creates an idle planner.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RouteUpdate::default());
        Self {
            updates: Arc::new(tx),
        }
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RouteUpdate> {
        self.updates.subscribe()
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> RouteState {
        self.updates.borrow().state.clone()
    }

    /// The current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.updates.borrow().generation
    }

    /// The student whose route is pending or shown.
    #[must_use]
    pub fn active_student(&self) -> Option<StudentId> {
        self.updates
            .borrow()
            .state
            .request()
            .and_then(RouteRequest::student)
    }

    /// The student whose route (or route failure) is shown. Unlike
    /// [`Self::active_student`], a pending search does not count.
    fn shown_student(&self) -> Option<StudentId> {
        let update = self.updates.borrow();
        if update.state.is_pending() {
            return None;
        }
        update.state.request().and_then(RouteRequest::student)
    }

    fn advance(&self, state: RouteState) -> u64 {
        let mut generation = 0;
        self.updates.send_modify(|update| {
            update.generation += 1;
            update.state = state;
            generation = update.generation;
        });
        generation
    }

    /// Starts a route from `student` to `campus`.
    ///
    /// Requesting the student whose route is already shown clears it
    /// instead and returns `Ok(None)`. Requesting a student whose search
    /// is still in flight starts a new search that supersedes it.
    ///
    /// # Errors
    ///
    /// * [`RoutingError::InvalidCoordinates`] if the student has no valid
    ///   location; the state is left unchanged.
    /// * [`RoutingError::NoCampus`] if `campus` is `None`; any previous
    ///   route is cleared.
    pub fn begin_student_route(
        &mut self,
        student: &Student,
        campus: Option<&Campus>,
        zone: Option<&HazardZone>,
    ) -> Result<Option<RouteTicket>, RoutingError> {
        let Some(origin) = student.location else {
            log::warn!("Student {} has no valid coordinates; not routing", student.id);
            return Err(RoutingError::InvalidCoordinates);
        };

        if self.shown_student() == Some(student.id) {
            log::info!("Hiding route for student {}", student.id);
            self.clear();
            return Ok(None);
        }

        let Some(campus) = campus else {
            self.clear();
            return Err(RoutingError::NoCampus);
        };

        log::info!("Routing student {} to {}", student.id, campus.name);
        let request = RouteRequest::Student {
            student: student.id,
            origin,
            campus: campus.clone(),
        };
        Ok(Some(self.issue(request, zone.cloned())))
    }

    /// Starts a route from the campus nearest to `target` to `target`.
    ///
    /// The route is never detoured.
    ///
    /// # Errors
    ///
    /// * [`RoutingError::NoHazardZone`] if no hazard zone is active.
    /// * [`RoutingError::InvalidCoordinates`] if `target` is not a valid
    ///   coordinate.
    /// * [`RoutingError::NoCampus`] if no campus is registered.
    pub fn begin_campus_to_affected(
        &mut self,
        target: Point<f64>,
        campuses: &CampusRegistry,
        zone: Option<&HazardZone>,
    ) -> Result<RouteTicket, RoutingError> {
        if zone.is_none() {
            return Err(RoutingError::NoHazardZone);
        }
        let target = LatLng::new(Some(target.y()), Some(target.x()))
            .ok_or(RoutingError::InvalidCoordinates)?;
        let campus = campuses
            .nearest(target.to_point())
            .ok_or(RoutingError::NoCampus)?;

        log::info!(
            "Routing from {} to affected point ({}, {})",
            campus.name,
            target.lat,
            target.lng
        );
        let request = RouteRequest::CampusToAffected {
            campus: campus.clone(),
            target,
        };
        Ok(self.issue(request, None))
    }

    fn issue(&self, request: RouteRequest, zone: Option<HazardZone>) -> RouteTicket {
        let generation = self.advance(RouteState::RouteRequested {
            request: request.clone(),
        });
        RouteTicket {
            generation,
            request,
            zone,
            updates: Arc::clone(&self.updates),
        }
    }

    /// Cancels any in-flight search and hides the route.
    pub fn clear(&mut self) {
        let generation = self.advance(RouteState::Idle);
        log::debug!("Route cleared (generation {generation})");
    }

    /// Invalidates in-flight searches after a hazard edit.
    ///
    /// A pending request returns to `Idle`; a route already shown stays.
    pub fn invalidate(&mut self) {
        self.updates.send_modify(|update| {
            update.generation += 1;
            if update.state.is_pending() {
                log::info!("Hazard changed; abandoning in-flight route search");
                update.state = RouteState::Idle;
            }
        });
    }
}

/// One route request, valid until the planner moves on.
///
/// Dropping a current ticket before it completes (e.g. when the future
/// running it is cancelled) returns the planner to `Idle`.
#[derive(Debug)]
pub struct RouteTicket {
    generation: u64,
    request: RouteRequest,
    zone: Option<HazardZone>,
    updates: Arc<watch::Sender<RouteUpdate>>,
}

impl RouteTicket {
    /// The generation this ticket was issued for.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// What was requested.
    #[must_use]
    pub const fn request(&self) -> &RouteRequest {
        &self.request
    }

    /// Returns `true` while no newer request, clear, or hazard edit has
    /// happened.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.updates.borrow().generation == self.generation
    }

    fn ensure_current(&self) -> Result<(), RoutingError> {
        if self.is_current() {
            Ok(())
        } else {
            Err(RoutingError::Superseded)
        }
    }

    fn publish(&self, state: RouteState) -> bool {
        self.updates.send_if_modified(|update| {
            if update.generation != self.generation {
                return false;
            }
            update.state = state;
            true
        })
    }

    fn result(
        &self,
        waypoints: Vec<LatLng>,
        route: Route,
        alternatives: Vec<Route>,
        kind: RouteKind,
    ) -> RouteResult {
        RouteResult {
            request: self.request.clone(),
            waypoints,
            route,
            alternatives,
            kind,
        }
    }

    /// Runs the search without touching the published state (except
    /// for entering `DetourSearch`).
    ///
    /// Tries the direct route first. If it crosses the ticket's hazard
    /// zone, tries detour candidates one at a time and accepts the first
    /// whose route stays clear. If none does, re-requests the direct
    /// route and flags it [`RouteKind::HazardFallback`].
    ///
    /// # Errors
    ///
    /// * [`RoutingError::Superseded`] once the ticket is stale.
    /// * Any transport or parse error from `router`. A candidate with no
    ///   route is skipped rather than treated as an error.
    pub async fn resolve(&self, router: &dyn RoutingService) -> Result<RouteResult, RoutingError> {
        self.ensure_current()?;
        let direct = vec![self.request.origin(), self.request.destination()];
        let (route, alternatives) = split_primary(router.route(&direct, true).await?)?;
        self.ensure_current()?;

        let zone = match &self.zone {
            Some(zone) if route_intersects_polygon(&route.line_string(), &zone.polygon) => zone,
            _ => return Ok(self.result(direct, route, alternatives, RouteKind::Direct)),
        };

        let candidates = detour_candidates(zone.center, zone.radius_km);
        log::info!(
            "Direct route crosses the hazard zone; trying {} detour candidates",
            candidates.len()
        );
        self.publish(RouteState::DetourSearch {
            request: self.request.clone(),
            candidates: candidates.len(),
        });

        for (i, candidate) in candidates.into_iter().enumerate() {
            self.ensure_current()?;
            let via = LatLng::from(candidate);
            let waypoints = vec![self.request.origin(), via, self.request.destination()];
            match router.route(&waypoints, false).await.and_then(split_primary) {
                Ok((route, alternatives)) => {
                    if !route_intersects_polygon(&route.line_string(), &zone.polygon) {
                        log::info!("Detour candidate {} avoids the hazard zone", i + 1);
                        self.ensure_current()?;
                        return Ok(self.result(
                            waypoints,
                            route,
                            alternatives,
                            RouteKind::Detour { via },
                        ));
                    }
                    log::debug!("Detour candidate {} still crosses the hazard zone", i + 1);
                }
                Err(RoutingError::NoRoute) => {
                    log::debug!("No route through detour candidate {}", i + 1);
                }
                Err(e) => return Err(e),
            }
        }

        self.ensure_current()?;
        log::warn!("No detour avoids the hazard zone; showing the direct route with a warning");
        let (route, alternatives) = split_primary(router.route(&direct, true).await?)?;
        self.ensure_current()?;
        Ok(self.result(direct, route, alternatives, RouteKind::HazardFallback))
    }

    /// Publishes the outcome of [`Self::resolve`] if the ticket is still
    /// current. Returns whether it was applied.
    pub fn complete(&self, outcome: &Result<RouteResult, RoutingError>) -> bool {
        let state = match outcome {
            Ok(result) if result.is_hazard_warning() => RouteState::RouteFailed {
                request: self.request.clone(),
                fallback: Some(result.clone()),
                message: "No detour avoids the hazard zone; the shown route crosses it"
                    .to_string(),
            },
            Ok(result) => RouteState::RouteFound {
                result: result.clone(),
            },
            Err(RoutingError::Superseded) => {
                log::debug!("Discarding superseded route search (generation {})", self.generation);
                return false;
            }
            Err(e) => {
                log::error!("Could not calculate route: {e}");
                RouteState::RouteFailed {
                    request: self.request.clone(),
                    fallback: None,
                    message: format!("Could not calculate route: {e}"),
                }
            }
        };

        let applied = self.publish(state);
        if !applied {
            log::debug!("Discarding stale route result (generation {})", self.generation);
        }
        applied
    }

    /// Resolves and completes the ticket.
    ///
    /// # Errors
    ///
    /// Returns the search error, or [`RoutingError::Superseded`] if the
    /// result arrived after the ticket went stale.
    pub async fn run(&self, router: &dyn RoutingService) -> Result<RouteResult, RoutingError> {
        let outcome = self.resolve(router).await;
        if !self.complete(&outcome) && outcome.is_ok() {
            return Err(RoutingError::Superseded);
        }
        outcome
    }
}

impl Drop for RouteTicket {
    fn drop(&mut self) {
        let abandoned = self.updates.send_if_modified(|update| {
            if update.generation != self.generation || !update.state.is_pending() {
                return false;
            }
            update.generation += 1;
            update.state = RouteState::Idle;
            true
        });
        if abandoned {
            log::debug!("Route search abandoned (generation {})", self.generation);
        }
    }
}

fn split_primary(mut routes: Vec<Route>) -> Result<(Route, Vec<Route>), RoutingError> {
    if routes.is_empty() {
        return Err(RoutingError::NoRoute);
    }
    let primary = routes.remove(0);
    Ok((primary, routes))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::testing::{FailingRouter, StraightLineRouter};
    use student_map_student_models::Cohort;

    fn student(id: u64, lat: f64, lng: f64) -> Student {
        Student {
            id: StudentId(id),
            name: None,
            level: Cohort::SeniorHigh,
            location: LatLng::new(Some(lat), Some(lng)),
            course: None,
            strand: None,
            previous_school: None,
            year: None,
            age: None,
            cluster: 0,
        }
    }

    fn campus(lat: f64, lng: f64) -> Campus {
        Campus {
            id: 1,
            name: "USJ-R Main Campus".to_string(),
            latitude: lat,
            longitude: lng,
        }
    }

    fn blocking_zone() -> HazardZone {
        HazardZone::new(Point::new(123.85, 10.0), 1.0).unwrap()
    }

    #[tokio::test]
    async fn direct_route_without_zone() {
        let mut planner = RoutePlanner::new();
        let router = StraightLineRouter::default();
        let ticket = planner
            .begin_student_route(&student(1, 10.30, 123.88), Some(&campus(10.29, 123.89)), None)
            .unwrap()
            .unwrap();
        assert_eq!(planner.state().name(), "route_requested");

        let result = ticket.run(&router).await.unwrap();
        assert_eq!(result.kind, RouteKind::Direct);
        assert_eq!(result.route.coordinates.len(), 2);
        assert_eq!(result.alternatives.len(), 1);
        assert_eq!(planner.state(), RouteState::RouteFound { result });
        assert!(router.requests.lock().unwrap()[0].1, "direct requests ask for alternatives");
    }

    #[tokio::test]
    async fn requesting_same_student_twice_toggles_off() {
        let mut planner = RoutePlanner::new();
        let router = StraightLineRouter::default();
        let s = student(1, 10.30, 123.88);
        let c = campus(10.29, 123.89);

        let ticket = planner.begin_student_route(&s, Some(&c), None).unwrap().unwrap();
        ticket.run(&router).await.unwrap();
        assert!(planner.begin_student_route(&s, Some(&c), None).unwrap().is_none());
        assert_eq!(planner.state(), RouteState::Idle);
        assert!(planner.state().route().is_none());
    }

    #[test]
    fn dropped_ticket_returns_to_idle() {
        let mut planner = RoutePlanner::new();
        let s = student(1, 10.30, 123.88);
        let c = campus(10.29, 123.89);

        let ticket = planner.begin_student_route(&s, Some(&c), None).unwrap().unwrap();
        assert_eq!(planner.active_student(), Some(StudentId(1)));
        drop(ticket);
        assert!(planner.state().is_idle());
        assert!(planner.active_student().is_none());

        let retry = planner.begin_student_route(&s, Some(&c), None).unwrap();
        assert!(retry.is_some());
        assert_eq!(planner.state().name(), "route_requested");
    }

    #[tokio::test]
    async fn requesting_pending_student_again_supersedes() {
        let mut planner = RoutePlanner::new();
        let router = StraightLineRouter::default();
        let s = student(1, 10.30, 123.88);
        let c = campus(10.29, 123.89);

        let first = planner.begin_student_route(&s, Some(&c), None).unwrap().unwrap();
        let second = planner.begin_student_route(&s, Some(&c), None).unwrap().unwrap();
        assert!(!first.is_current());
        drop(first);
        assert_eq!(planner.state().name(), "route_requested");

        second.run(&router).await.unwrap();
        assert_eq!(planner.state().name(), "route_found");
        drop(second);
        assert_eq!(planner.state().name(), "route_found");
    }

    #[tokio::test]
    async fn detour_avoids_zone() {
        let mut planner = RoutePlanner::new();
        let router = StraightLineRouter::default();
        let zone = blocking_zone();
        let ticket = planner
            .begin_student_route(
                &student(1, 10.0, 123.80),
                Some(&campus(10.0, 123.90)),
                Some(&zone),
            )
            .unwrap()
            .unwrap();

        let result = ticket.run(&router).await.unwrap();
        assert!(matches!(result.kind, RouteKind::Detour { .. }));
        assert!(!route_intersects_polygon(&result.route.line_string(), &zone.polygon));
        // The first candidate (due north, inner ring) already works.
        assert_eq!(router.request_count(), 2);
        assert!(!router.requests.lock().unwrap()[1].1);
        assert_eq!(result.waypoints.len(), 3);
        assert_eq!(planner.state().name(), "route_found");
    }

    #[tokio::test]
    async fn exhausted_candidates_fall_back_with_warning() {
        let mut planner = RoutePlanner::new();
        let router = StraightLineRouter {
            direct_only: true,
            ..StraightLineRouter::default()
        };
        let zone = blocking_zone();
        let ticket = planner
            .begin_student_route(
                &student(1, 10.0, 123.80),
                Some(&campus(10.0, 123.90)),
                Some(&zone),
            )
            .unwrap()
            .unwrap();

        let result = ticket.run(&router).await.unwrap();
        assert_eq!(result.kind, RouteKind::HazardFallback);
        assert!(route_intersects_polygon(&result.route.line_string(), &zone.polygon));
        // Direct + 48 candidates + re-requested direct route.
        assert_eq!(router.request_count(), 50);
        match planner.state() {
            RouteState::RouteFailed { fallback, .. } => {
                assert!(fallback.unwrap().is_hazard_warning());
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn candidates_without_route_are_skipped() {
        let mut planner = RoutePlanner::new();
        let router = StraightLineRouter {
            direct_only: true,
            fail_with_no_route_after: Some(1),
            ..StraightLineRouter::default()
        };
        let zone = blocking_zone();
        let ticket = planner
            .begin_student_route(
                &student(1, 10.0, 123.80),
                Some(&campus(10.0, 123.90)),
                Some(&zone),
            )
            .unwrap()
            .unwrap();

        let outcome = ticket.run(&router).await;
        assert!(matches!(outcome, Err(RoutingError::NoRoute)));
        assert_eq!(router.request_count(), 50);
        assert!(matches!(
            planner.state(),
            RouteState::RouteFailed { fallback: None, .. }
        ));
    }

    /// Returns no routes for the first detour candidate.
    struct EmptyCandidateRouter {
        inner: StraightLineRouter,
    }

    #[async_trait::async_trait]
    impl RoutingService for EmptyCandidateRouter {
        async fn route(
            &self,
            waypoints: &[LatLng],
            alternatives: bool,
        ) -> Result<Vec<Route>, RoutingError> {
            let routes = self.inner.route(waypoints, alternatives).await?;
            if self.inner.request_count() == 2 {
                return Ok(vec![]);
            }
            Ok(routes)
        }
    }

    #[tokio::test]
    async fn candidate_with_empty_routes_is_skipped() {
        let mut planner = RoutePlanner::new();
        let zone = blocking_zone();
        let router = EmptyCandidateRouter {
            inner: StraightLineRouter::default(),
        };
        let ticket = planner
            .begin_student_route(
                &student(1, 10.0, 123.80),
                Some(&campus(10.0, 123.90)),
                Some(&zone),
            )
            .unwrap()
            .unwrap();

        let result = ticket.run(&router).await.unwrap();
        let second_candidate = LatLng::from(detour_candidates(zone.center, zone.radius_km)[1]);
        assert_eq!(result.kind, RouteKind::Detour { via: second_candidate });
        assert!(!route_intersects_polygon(&result.route.line_string(), &zone.polygon));
        assert_eq!(router.inner.request_count(), 3);
    }

    #[tokio::test]
    async fn network_failure_is_reported_once() {
        let mut planner = RoutePlanner::new();
        let ticket = planner
            .begin_student_route(&student(1, 10.30, 123.88), Some(&campus(10.29, 123.89)), None)
            .unwrap()
            .unwrap();
        let outcome = ticket.run(&FailingRouter).await;
        assert!(matches!(outcome, Err(RoutingError::Status { status: 503, .. })));
        match planner.state() {
            RouteState::RouteFailed { fallback, message, .. } => {
                assert!(fallback.is_none());
                assert!(message.starts_with("Could not calculate route"));
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn newer_request_supersedes_older() {
        let mut planner = RoutePlanner::new();
        let router = StraightLineRouter::default();
        let c = campus(10.29, 123.89);
        let first = planner
            .begin_student_route(&student(1, 10.30, 123.88), Some(&c), None)
            .unwrap()
            .unwrap();
        let second = planner
            .begin_student_route(&student(2, 10.31, 123.87), Some(&c), None)
            .unwrap()
            .unwrap();

        assert!(matches!(first.run(&router).await, Err(RoutingError::Superseded)));
        assert_eq!(router.request_count(), 0);
        second.run(&router).await.unwrap();
        assert_eq!(planner.active_student(), Some(StudentId(2)));
    }

    #[tokio::test]
    async fn stale_result_is_discarded() {
        let mut planner = RoutePlanner::new();
        let router = StraightLineRouter::default();
        let ticket = planner
            .begin_student_route(&student(1, 10.30, 123.88), Some(&campus(10.29, 123.89)), None)
            .unwrap()
            .unwrap();
        let outcome = ticket.resolve(&router).await;
        assert!(outcome.is_ok());

        planner.clear();
        assert!(!ticket.complete(&outcome));
        assert_eq!(planner.state(), RouteState::Idle);
    }

    struct HookRouter {
        inner: StraightLineRouter,
        on_second_request: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    }

    #[async_trait::async_trait]
    impl RoutingService for HookRouter {
        async fn route(
            &self,
            waypoints: &[LatLng],
            alternatives: bool,
        ) -> Result<Vec<Route>, RoutingError> {
            let routes = self.inner.route(waypoints, alternatives).await;
            if self.inner.request_count() == 2 {
                if let Some(hook) = self.on_second_request.lock().unwrap().take() {
                    hook();
                }
            }
            routes
        }
    }

    #[tokio::test]
    async fn hazard_edit_stops_detour_search() {
        let planner = Arc::new(Mutex::new(RoutePlanner::new()));
        let zone = blocking_zone();
        let ticket = planner
            .lock()
            .unwrap()
            .begin_student_route(
                &student(1, 10.0, 123.80),
                Some(&campus(10.0, 123.90)),
                Some(&zone),
            )
            .unwrap()
            .unwrap();

        let hooked = Arc::clone(&planner);
        let router = HookRouter {
            inner: StraightLineRouter {
                direct_only: true,
                ..StraightLineRouter::default()
            },
            on_second_request: Mutex::new(Some(Box::new(move || {
                hooked.lock().unwrap().invalidate();
            }))),
        };

        let outcome = ticket.run(&router).await;
        assert!(matches!(outcome, Err(RoutingError::Superseded)));
        assert_eq!(router.inner.request_count(), 2);
        assert_eq!(planner.lock().unwrap().state(), RouteState::Idle);
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let mut planner = RoutePlanner::new();
        let mut rx = planner.subscribe();
        let ticket = planner
            .begin_student_route(&student(1, 10.30, 123.88), Some(&campus(10.29, 123.89)), None)
            .unwrap()
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state.name(), "route_requested");

        ticket.run(&StraightLineRouter::default()).await.unwrap();
        let update = rx.borrow_and_update().clone();
        assert_eq!(update.generation, ticket.generation());
        assert!(update.state.route().is_some());
    }

    #[test]
    fn invalid_coordinates_short_circuit() {
        let mut planner = RoutePlanner::new();
        let generation = planner.generation();
        let result =
            planner.begin_student_route(
                &student(1, f64::NAN, 123.88),
                Some(&campus(10.29, 123.89)),
                None,
            );
        assert!(matches!(result, Err(RoutingError::InvalidCoordinates)));
        assert_eq!(planner.generation(), generation);
    }

    #[test]
    fn missing_campus_clears_previous_route() {
        let mut planner = RoutePlanner::new();
        planner
            .begin_student_route(&student(1, 10.30, 123.88), Some(&campus(10.29, 123.89)), None)
            .unwrap();
        let result = planner.begin_student_route(&student(2, 10.30, 123.88), None, None);
        assert!(matches!(result, Err(RoutingError::NoCampus)));
        assert!(planner.state().is_idle());
    }

    #[tokio::test]
    async fn campus_to_affected_requires_zone_and_never_detours() {
        let mut planner = RoutePlanner::new();
        let campuses = CampusRegistry::new(vec![campus(10.0, 123.90)]);
        assert!(matches!(
            planner.begin_campus_to_affected(Point::new(123.80, 10.0), &campuses, None),
            Err(RoutingError::NoHazardZone)
        ));

        let zone = blocking_zone();
        let router = StraightLineRouter::default();
        let ticket = planner
            .begin_campus_to_affected(Point::new(123.80, 10.0), &campuses, Some(&zone))
            .unwrap();
        let result = ticket.run(&router).await.unwrap();
        assert_eq!(result.kind, RouteKind::Direct);
        assert!(route_intersects_polygon(&result.route.line_string(), &zone.polygon));
        assert_eq!(router.request_count(), 1);
        assert!((result.request.origin().lng - 123.90).abs() < f64::EPSILON);
        assert!(planner.active_student().is_none());
    }

    #[test]
    fn invalidate_keeps_shown_route() {
        let mut planner = RoutePlanner::new();
        let shown = RouteState::RouteFailed {
            request: RouteRequest::CampusToAffected {
                campus: campus(10.0, 123.9),
                target: LatLng { lat: 10.0, lng: 123.8 },
            },
            fallback: None,
            message: "x".to_string(),
        };
        planner.advance(shown.clone());
        let generation = planner.generation();
        planner.invalidate();
        assert_eq!(planner.state(), shown);
        assert!(planner.generation() > generation);
    }
}
