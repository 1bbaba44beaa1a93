use axum::{
    http::{header, Method, StatusCode},
    routing::{get, post, put},
    Router,
};
use doctrips_auth::auth_routes;
use doctrips_core::record::RecordKind;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{
        applications, crud, emails, gear, grading,
        health::{healthz, livez},
        incoming, portal, raids, reports, timetable, trainings, transport, trips, users, years,
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let mut db_routes = Router::new()
        .route("/db/", get(years::current))
        .route("/db/years", get(years::list).post(years::create_initial))
        .route("/db/{year}/", get(years::summary))
        .route("/db/{year}", get(years::summary))
        .route("/db/{year}/forward", post(years::forward))
        // Trips
        .route("/db/{year}/trips/matrix", get(trips::matrix))
        .route("/db/{year}/trips/{id}/detail", get(trips::detail))
        .route(
            "/db/{year}/trips/{id}/assign-trippee",
            post(trips::assign_trippee).delete(trips::unassign_trippee),
        )
        .route(
            "/db/{year}/trips/{id}/available-trippees",
            get(trips::available_trippees),
        )
        .route(
            "/db/{year}/templates/{id}/sections",
            get(trips::template_sections),
        )
        .route(
            "/db/{year}/campsites/{id}/occupancy",
            get(trips::campsite_nights),
        )
        // Transport
        .route("/db/{year}/transport/internal", get(transport::internal))
        .route("/db/{year}/transport/external", get(transport::external))
        .route(
            "/db/{year}/scheduled-transports/{id}/stops",
            get(transport::internal_stops),
        )
        .route(
            "/db/{year}/scheduled-transports/{id}/directions",
            get(transport::internal_directions),
        )
        .route(
            "/db/{year}/external-buses/{id}/stops",
            get(transport::external_stops),
        )
        .route(
            "/db/{year}/external-buses/{id}/directions",
            get(transport::external_directions),
        )
        // Applications
        .route(
            "/db/{year}/applications/{id}/trips",
            get(applications::leader_trips),
        )
        .route(
            "/db/{year}/applications/{id}/assign-trip",
            put(applications::assign_trip),
        )
        .route(
            "/db/{year}/applications/{id}/assign-croo",
            put(applications::assign_croo),
        )
        // Incoming students
        .route("/db/{year}/incoming/import", post(incoming::import))
        .route(
            "/db/{year}/incoming/hinman-boxes",
            post(incoming::import_hinman_boxes),
        )
        .route(
            "/db/{year}/incoming/unregistered",
            get(incoming::unregistered_students),
        )
        .route("/db/{year}/incoming/{id}/charges", get(incoming::charges))
        .route(
            "/db/{year}/registrations/financial-aid",
            get(incoming::financial_aid),
        )
        .route(
            "/db/{year}/registrations/bus-requests",
            get(incoming::bus_requests),
        )
        .route(
            "/db/{year}/registrations/unmatched",
            get(incoming::unmatched_registrations),
        )
        .route(
            "/db/{year}/registrations/{id}/trip-choices",
            get(incoming::registration_trip_choices),
        )
        // Volunteers and safety
        .route(
            "/db/{year}/sessions/{id}/attendance",
            get(trainings::attendance).put(trainings::update_attendance),
        )
        .route("/db/{year}/gear-requests/totals", get(gear::totals))
        .route("/db/{year}/raids/trips", get(raids::trips))
        .route("/db/{year}/raids/{id}/comments", get(raids::comments))
        .route("/db/{year}/emails/{list}", get(emails::show))
        // Reports
        .route(
            "/db/{year}/reports/statistics",
            get(reports::year_statistics),
        )
        .route("/db/{year}/reports/tshirts", get(reports::tshirts))
        .route("/db/{year}/reports/{report}", get(reports::download));

    for kind in RecordKind::ALL {
        db_routes = db_routes.merge(crud::kind_routes(kind));
    }

    let grade_routes = Router::new()
        .route("/grade/{kind}/next", get(grading::next))
        .route("/grade/{kind}/next-for/{croo}", get(grading::next_for_croo))
        .route("/grade/{kind}/progress", get(grading::progress))
        .route(
            "/grade/{kind}/{id}",
            get(grading::show).post(grading::submit),
        );

    let portal_routes = Router::new()
        .route("/register", post(portal::register))
        .route(
            "/register/continue",
            get(portal::show_registration).put(portal::update_registration),
        )
        .route("/apply", post(portal::apply))
        .route("/apply/status", get(portal::application_status))
        .route(
            "/apply/trainings",
            get(trainings::show_signup).put(trainings::update_signup),
        )
        .route("/gear", get(gear::show_request).put(gear::request))
        .route(
            "/apply/continue",
            get(portal::show_application).put(portal::update_application),
        );

    let admin_routes = Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/lookup", get(users::lookup))
        .route("/users/{id}/groups", put(users::set_groups))
        .route("/timetable", get(timetable::show).put(timetable::update));

    let auth_state = state.auth.clone();
    let request_timeout = state.request_timeout;

    Router::new()
        .route("/livez", get(livez))
        .route("/healthz", get(healthz))
        .merge(db_routes)
        .merge(grade_routes)
        .merge(portal_routes)
        .merge(admin_routes)
        .with_state(state)
        .merge(auth_routes().with_state(auth_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use chrono::{Duration, NaiveDate, Utc};
    use doctrips_core::applications::{ApplicationStatus, GeneralApplication, PortalContent, TshirtSize};
    use doctrips_core::auth::{Session, SessionId};
    use doctrips_core::incoming::IncomingStudent;
    use doctrips_core::permissions::{Group, User};
    use doctrips_core::timetable::Timetable;
    use doctrips_core::transport::{
        Route, RouteCategory, ScheduledTransport, Stop, TransportConfig, Vehicle,
    };
    use doctrips_core::trips::{Campsite, Section, Trip, TripTemplate, TripType};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn sign_in(state: &AppState, netid: &str, groups: Vec<Group>) -> String {
        let user = User::new(netid, netid, format!("{netid}@dartmouth.edu")).with_groups(groups);
        state.users.create_user(&user).await.unwrap();
        let now = Utc::now();
        let session = Session {
            id: SessionId::new(Uuid::new_v4().to_string()),
            user_id: user.id,
            netid: user.netid.clone(),
            created_at: now,
            expires_at: now + Duration::hours(1),
        };
        state.auth.sessions.create_session(&session).await.unwrap();
        session.id.to_string()
    }

    async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                request = request.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        create_app(state.clone())
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    async fn director_with_year(state: &AppState) -> String {
        let token = sign_in(state, "director", vec![Group::Directors]).await;
        let response = send(state, "POST", "/db/years", Some(&token), Some(json!({"year": 2024}))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        token
    }

    #[tokio::test]
    async fn test_livez() {
        let state = AppState::default();
        let response = send(&state, "GET", "/livez", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_database_requires_sign_in_and_permission() {
        let state = AppState::default();
        let response = send(&state, "GET", "/db/years", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let grader = sign_in(&state, "grader", vec![Group::Graders]).await;
        let response = send(&state, "GET", "/db/years", Some(&grader), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_current_year_redirect() {
        let state = AppState::default();
        let token = director_with_year(&state).await;

        let response = send(&state, "GET", "/db/", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/db/2024/");

        let response = send(&state, "POST", "/db/years", Some(&token), Some(json!({"year": 2030}))).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_create_section_and_reject_duplicate_name() {
        let state = AppState::default();
        let token = director_with_year(&state).await;
        let section = json!({"name": "A", "leaders_arrive": "2024-09-01"});

        let response = send(&state, "POST", "/db/2024/sections", Some(&token), Some(section.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(&state, "POST", "/db/2024/sections", Some(&token), Some(section)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = send(&state, "GET", "/db/2024/sections", Some(&token), None).await;
        let sections = json_body(response).await;
        assert_eq!(sections.as_array().unwrap().len(), 1);
        assert_eq!(sections[0]["label"], "A");

        let response = send(&state, "GET", "/db/2023/sections", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_protected_delete() {
        let state = AppState::default();
        let token = director_with_year(&state).await;

        let response = send(
            &state,
            "POST",
            "/db/2024/vehicles",
            Some(&token),
            Some(json!({"name": "Van", "capacity": 12})),
        )
        .await;
        let vehicle = json_body(response).await["id"].as_str().unwrap().to_string();
        let response = send(
            &state,
            "POST",
            "/db/2024/routes",
            Some(&token),
            Some(json!({"name": "Green", "category": "INTERNAL", "vehicle": vehicle})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let route = json_body(response).await["id"].as_str().unwrap().to_string();

        let uri = format!("/db/2024/vehicles/{vehicle}");
        let response = send(&state, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(response.headers().contains_key("set-cookie"));
        let message = json_body(response).await["message"].as_str().unwrap().to_string();
        assert!(message.contains("Green"));

        let response = send(&state, "DELETE", &format!("/db/2024/routes/{route}"), Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&state, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_forward_makes_next_year_current() {
        let state = AppState::default();
        let token = director_with_year(&state).await;
        send(
            &state,
            "POST",
            "/db/2024/sections",
            Some(&token),
            Some(json!({"name": "A", "leaders_arrive": "2024-09-01"})),
        )
        .await;

        let response = send(&state, "POST", "/db/2024/forward", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(&state, "GET", "/db/", Some(&token), None).await;
        assert_eq!(response.headers()["location"], "/db/2025/");

        let response = send(&state, "POST", "/db/2024/forward", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_timetable_is_public_but_edits_need_permission() {
        let state = AppState::default();
        let response = send(&state, "GET", "/timetable", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let timetable: Timetable = serde_json::from_value(json_body(response).await).unwrap();

        let tlt = sign_in(&state, "tlt", vec![Group::Tlts]).await;
        let body = serde_json::to_value(&timetable).unwrap();
        let response = send(&state, "PUT", "/timetable", Some(&tlt), Some(body)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_grading_closed_before_deadline() {
        let state = AppState::default();
        director_with_year(&state).await;
        let mut timetable = Timetable::starting_at(Utc::now());
        timetable.applications_close = Utc::now() + Duration::days(1);
        state.timetable.update_timetable(&timetable).await.unwrap();

        let grader = sign_in(&state, "grader", vec![Group::Graders]).await;
        let response = send(&state, "GET", "/grade/leaders/next", Some(&grader), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&state, "GET", "/grade/croos/next", Some(&grader), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_grading_hands_out_each_application_once() {
        let state = AppState::default();
        let director = director_with_year(&state).await;
        let mut timetable = Timetable::starting_at(Utc::now());
        timetable.applications_close = Utc::now() - Duration::days(1);
        state.timetable.update_timetable(&timetable).await.unwrap();

        let applicant = Uuid::new_v4();
        let response = send(
            &state,
            "POST",
            "/db/2024/applications",
            Some(&director),
            Some(json!({
                "applicant": applicant,
                "name": "Applicant",
                "tshirt_size": "M",
                "leader_supplement": {"document": "answers"},
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let app_id = json_body(response).await["id"].as_str().unwrap().to_string();

        let grader = sign_in(&state, "grader", vec![Group::Graders]).await;
        let response = send(&state, "GET", "/grade/leaders/next", Some(&grader), None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let uri = format!("/grade/leaders/{app_id}");
        assert_eq!(response.headers()["location"], uri.as_str());

        let response = send(&state, "POST", &uri, Some(&grader), Some(json!({"grade": 4}))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let response = send(&state, "POST", &uri, Some(&grader), Some(json!({"grade": 5}))).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = send(&state, "GET", "/grade/leaders/next", Some(&grader), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["done"], true);

        let response = send(&state, "GET", "/grade/leaders/progress", Some(&grader), None).await;
        let progress = json_body(response).await;
        assert_eq!(progress["complete"], 1);
        assert_eq!(progress["total"], 2);
        assert_eq!(progress["percentage"], 50);
    }

    #[tokio::test]
    async fn test_apply_twice_redirects_to_continue() {
        let state = AppState::default();
        director_with_year(&state).await;
        let mut timetable = Timetable::starting_at(Utc::now());
        timetable.applications_open = Utc::now() - Duration::days(1);
        timetable.applications_close = Utc::now() + Duration::days(1);
        state.timetable.update_timetable(&timetable).await.unwrap();

        let student = sign_in(&state, "d12345a", vec![]).await;
        let form = json!({"tshirt_size": "S", "status": "LEADER"});
        let response = send(&state, "POST", "/apply", Some(&student), Some(form.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["data"]["status"], "PENDING");
        assert_eq!(created["data"]["netid"], "d12345a");

        let response = send(&state, "POST", "/apply", Some(&student), Some(form)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/apply/continue");

        let response = send(&state, "GET", "/apply/continue", Some(&student), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_user_resolves_email() {
        let state = AppState::default();
        let director = sign_in(&state, "director", vec![Group::Directors]).await;

        let response = send(
            &state,
            "POST",
            "/users",
            Some(&director),
            Some(json!({"netid": "F00ABCD", "groups": ["graders"]})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let user = json_body(response).await;
        assert_eq!(user["netid"], "f00abcd");
        assert_eq!(user["email"], "sam.smith@dartmouth.edu");

        let response = send(
            &state,
            "POST",
            "/users",
            Some(&director),
            Some(json!({"netid": "f00abcd"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_report_download_headers() {
        let state = AppState::default();
        let token = director_with_year(&state).await;

        let response = send(&state, "GET", "/db/2024/reports/volunteers.csv", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/csv");
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=\"TL-and-Croo-applicants-2024.csv\""
        );

        let response = send(&state, "GET", "/db/2024/reports/nope.csv", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    async fn send_bytes(state: &AppState, uri: &str, token: &str, body: &'static [u8]) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "text/csv")
            .body(Body::from(body))
            .unwrap();
        create_app(state.clone()).oneshot(request).await.unwrap()
    }

    async fn create(state: &AppState, token: &str, path: &str, body: Value) -> String {
        let response = send(state, "POST", &format!("/db/2024/{path}"), Some(token), Some(body)).await;
        assert_eq!(response.status(), StatusCode::CREATED, "creating {path}");
        json_body(response).await["id"].as_str().unwrap().to_string()
    }

    async fn user_id(state: &AppState, netid: &str) -> Uuid {
        state.users.get_user_by_netid(netid).await.unwrap().unwrap().id
    }

    fn open_everything() -> Timetable {
        let mut timetable = Timetable::starting_at(Utc::now());
        timetable.applications_open = Utc::now() - Duration::days(1);
        timetable.applications_close = Utc::now() + Duration::days(1);
        timetable.trippee_registrations_open = Utc::now() - Duration::days(1);
        timetable.trippee_registrations_close = Utc::now() + Duration::days(1);
        timetable
    }

    /// One section A trip dropped off at a trailhead on the Green route.
    struct Seeded {
        trip: Trip,
        trailhead: Stop,
        transport: ScheduledTransport,
    }

    async fn seed_trip(state: &AppState) -> Seeded {
        let day = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let section = Section::new(2024, "A", day);
        let triptype = TripType::new(2024, "Hiking");
        let vehicle = Vehicle::new(2024, "Bus", 20);
        let route = Route::new(2024, "Green", RouteCategory::Internal, vehicle.id);
        let mut hanover = Stop::new(2024, "Hanover", 0);
        hanover.address = "Hanover, NH".to_string();
        let mut lodge = Stop::new(2024, "Lodge", 30);
        lodge.address = "Moosilauke Ravine Lodge".to_string();
        let mut trailhead = Stop::new(2024, "Trailhead", 10);
        trailhead.address = "Lyme, NH".to_string();
        trailhead.route = Some(route.id);
        let campsite = Campsite::new(2024, "Shelter");
        let template = TripTemplate::new(2024, 101, triptype.id, 10)
            .with_stops(trailhead.id, trailhead.id)
            .with_campsites(campsite.id, campsite.id);
        let trip = Trip::new(2024, template.id, section.id);
        let config = TransportConfig {
            id: Uuid::new_v4(),
            trips_year: 2024,
            hanover: hanover.id,
            lodge: lodge.id,
        };
        let transport = ScheduledTransport::new(2024, route.id, section.at_campsite1());

        state.table().insert(&section).await.unwrap();
        state.table().insert(&triptype).await.unwrap();
        state.table().insert(&vehicle).await.unwrap();
        state.table().insert(&route).await.unwrap();
        state.table().insert_all(&[hanover, lodge, trailhead.clone()]).await.unwrap();
        state.table().insert(&campsite).await.unwrap();
        state.table().insert(&template).await.unwrap();
        state.table().insert(&trip).await.unwrap();
        state.table().insert(&config).await.unwrap();
        state.table().insert(&transport).await.unwrap();
        Seeded {
            trip,
            trailhead,
            transport,
        }
    }

    #[tokio::test]
    async fn test_records_are_scoped_to_their_year() {
        let state = AppState::default();
        let token = director_with_year(&state).await;
        let section = create(&state, &token, "sections", json!({"name": "A", "leaders_arrive": "2024-09-01"})).await;
        let vehicle = create(&state, &token, "vehicles", json!({"name": "Van", "capacity": 12})).await;
        let response = send(&state, "POST", "/db/2024/forward", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(&state, "GET", &format!("/db/2025/sections/{section}"), Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &state,
            "POST",
            "/db/2025/routes",
            Some(&token),
            Some(json!({"name": "Green", "category": "INTERNAL", "vehicle": vehicle})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_clears_references() {
        let state = AppState::default();
        let token = director_with_year(&state).await;

        let application = create(
            &state,
            &token,
            "applications",
            json!({"applicant": Uuid::new_v4(), "name": "Applicant", "tshirt_size": "M"}),
        )
        .await;
        create(
            &state,
            &token,
            "leader-grades",
            json!({"application": application, "grader": Uuid::new_v4(), "grade": 4}),
        )
        .await;
        let uri = format!("/db/2024/applications/{application}");
        let response = send(&state, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&state, "GET", "/db/2024/leader-grades", Some(&token), None).await;
        assert_eq!(json_body(response).await, json!([]));

        let vehicle = create(&state, &token, "vehicles", json!({"name": "Van", "capacity": 12})).await;
        let route = create(
            &state,
            &token,
            "routes",
            json!({"name": "Green", "category": "INTERNAL", "vehicle": vehicle}),
        )
        .await;
        let stop = create(&state, &token, "stops", json!({"name": "Lyme", "distance": 5, "route": route})).await;
        let response = send(&state, "DELETE", &format!("/db/2024/routes/{route}"), Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&state, "GET", &format!("/db/2024/stops/{stop}"), Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"]["route"], Value::Null);
    }

    #[tokio::test]
    async fn test_route_create_racing_vehicle_delete_never_dangles() {
        let state = AppState::default();
        let token = director_with_year(&state).await;

        for _ in 0..20 {
            let vehicle = create(&state, &token, "vehicles", json!({"name": "Van", "capacity": 12})).await;
            let route = json!({"name": "Green", "category": "INTERNAL", "vehicle": vehicle});
            let delete_uri = format!("/db/2024/vehicles/{vehicle}");
            let (created, deleted) = tokio::join!(
                send(&state, "POST", "/db/2024/routes", Some(&token), Some(route)),
                send(&state, "DELETE", &delete_uri, Some(&token), None),
            );
            assert!(
                !(created.status() == StatusCode::CREATED && deleted.status() == StatusCode::OK),
                "route created against a deleted vehicle"
            );
        }

        let vehicles: Vec<String> = json_body(send(&state, "GET", "/db/2024/vehicles", Some(&token), None).await)
            .await
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_str().unwrap().to_string())
            .collect();
        let routes = json_body(send(&state, "GET", "/db/2024/routes", Some(&token), None).await).await;
        for route in routes.as_array().unwrap() {
            let vehicle = route["data"]["vehicle"].as_str().unwrap();
            assert!(vehicles.iter().any(|v| v == vehicle));
        }
    }

    #[tokio::test]
    async fn test_import_incoming_students_from_csv() {
        let state = AppState::default();
        let token = director_with_year(&state).await;
        let csv: &'static [u8] = b"Id,Formatted Fml Name,Class Year,EMail,Blitz,PR Street 1,PR City,PR State,PR Zip\n\
d11111a,Jane Doe,2028,jane@x.edu,jane@dartmouth.edu,1 Main St,Hanover,NH,03755\n";

        let response = send_bytes(&state, "/db/2024/incoming/import", &token, csv).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["created"], json!(["d11111a"]));

        let response = send_bytes(&state, "/db/2024/incoming/import", &token, csv).await;
        assert_eq!(json_body(response).await["ignored"], json!(["d11111a"]));

        let response = send(&state, "GET", "/db/2024/incoming", Some(&token), None).await;
        let students = json_body(response).await;
        assert_eq!(students.as_array().unwrap().len(), 1);
        assert_eq!(students[0]["data"]["address"], "1 Main St\nHanover, NH 03755");

        let boxes: &'static [u8] = b"netid,hinman box\nD11111A,HB 1234\nd99999z,HB 9\n";
        let response = send_bytes(&state, "/db/2024/incoming/hinman-boxes", &token, boxes).await;
        assert_eq!(response.status(), StatusCode::OK);
        let summary = json_body(response).await;
        assert_eq!(summary["updated"], json!(["d11111a"]));
        assert_eq!(summary["not_found"], json!(["d99999z"]));

        let response = send(&state, "GET", "/db/2024/incoming", Some(&token), None).await;
        assert_eq!(json_body(response).await[0]["data"]["hinman_box"], "HB 1234");
    }

    #[tokio::test]
    async fn test_assign_leader_trip_and_croo() {
        let state = AppState::default();
        let token = director_with_year(&state).await;
        let seeded = seed_trip(&state).await;
        let application = create(
            &state,
            &token,
            "applications",
            json!({"applicant": Uuid::new_v4(), "name": "Applicant", "tshirt_size": "M"}),
        )
        .await;

        let uri = format!("/db/2024/applications/{application}/assign-trip");
        let response = send(&state, "PUT", &uri, Some(&token), Some(json!({"trip": seeded.trip.id}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let assigned = json_body(response).await;
        assert_eq!(assigned["status"], "LEADER");
        assert_eq!(assigned["leader_supplement"]["assigned_trip"], json!(seeded.trip.id));

        let response = send(&state, "PUT", &uri, Some(&token), Some(json!({"trip": Uuid::new_v4()}))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let croo = create(&state, &token, "croos", json!({"name": "Lodge"})).await;
        let uri = format!("/db/2024/applications/{application}/assign-croo");
        let response = send(&state, "PUT", &uri, Some(&token), Some(json!({"croo": croo}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let assigned = json_body(response).await;
        assert_eq!(assigned["status"], "CROO");
        assert_eq!(assigned["croo_supplement"]["assigned_croo"], json!(croo));
    }

    #[tokio::test]
    async fn test_assign_and_unassign_trippee() {
        let state = AppState::default();
        let token = director_with_year(&state).await;
        let seeded = seed_trip(&state).await;
        let student = create(&state, &token, "incoming", json!({"name": "Jane Doe", "netid": "d11111a"})).await;

        let uri = format!("/db/2024/trips/{}/assign-trippee", seeded.trip.id);
        let body = json!({"incoming": student});
        let response = send(&state, "POST", &uri, Some(&token), Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["trip_assignment"], json!(seeded.trip.id));

        let response = send(&state, "DELETE", &uri, Some(&token), Some(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["trip_assignment"], Value::Null);
    }

    #[tokio::test]
    async fn test_register_twice_redirects_and_continue_updates() {
        let state = AppState::default();
        director_with_year(&state).await;
        state.timetable.update_timetable(&open_everything()).await.unwrap();

        let student = sign_in(&state, "d12345a", vec![]).await;
        let form = json!({"tshirt_size": "M", "waiver": "YES"});
        let response = send(&state, "POST", "/register", Some(&student), Some(form.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(&state, "POST", "/register", Some(&student), Some(form)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/register/continue");

        let update = json!({"tshirt_size": "L", "waiver": "YES"});
        let response = send(&state, "PUT", "/register/continue", Some(&student), Some(update)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated = json_body(response).await;
        assert_eq!(updated["data"]["tshirt_size"], "L");
        assert_eq!(updated["data"]["netid"], "d12345a");

        let response = send(&state, "PUT", "/register/continue", Some(&student), Some(json!({"tshirt_size": "L"}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_internal_transport_views() {
        let state = AppState::default();
        let token = director_with_year(&state).await;
        let seeded = seed_trip(&state).await;

        let response = send(&state, "GET", "/db/2024/transport/internal", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["routes"].as_array().unwrap().len(), 1);

        let uri = format!("/db/2024/scheduled-transports/{}/stops", seeded.transport.id);
        let response = send(&state, "GET", &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let schedule = json_body(response).await;
        let names: Vec<&str> = schedule["stops"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["stop"]["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Hanover", "Trailhead"]);
        assert_eq!(schedule["stops"][1]["stop"]["id"], json!(seeded.trailhead.id));

        let uri = format!("/db/2024/scheduled-transports/{}/directions", seeded.transport.id);
        let response = send(&state, "GET", &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["legs"].as_array().unwrap().len(), 1);

        let uri = format!("/db/2024/scheduled-transports/{}/stops", Uuid::new_v4());
        let response = send(&state, "GET", &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_forward_erases_old_medical_info_and_copies_portal_content() {
        let state = AppState::default();
        let token = director_with_year(&state).await;
        state.timetable.update_timetable(&open_everything()).await.unwrap();

        let student = sign_in(&state, "d12345a", vec![]).await;
        let form = json!({"tshirt_size": "M", "waiver": "YES", "medical_conditions": "asthma"});
        let response = send(&state, "POST", "/register", Some(&student), Some(form)).await;
        let registration = json_body(response).await["id"].as_str().unwrap().to_string();
        let incoming = create(
            &state,
            &token,
            "incoming",
            json!({"name": "Jane Doe", "netid": "d12345a", "med_info": "asthma", "notes": "keep"}),
        )
        .await;
        let application = create(
            &state,
            &token,
            "applications",
            json!({
                "applicant": Uuid::new_v4(),
                "name": "Applicant",
                "tshirt_size": "M",
                "dietary_restrictions": "vegan",
            }),
        )
        .await;
        create(&state, &token, "portal-content", json!({"LEADER_description": "Welcome"})).await;

        let response = send(&state, "POST", "/db/2024/forward", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let get = |path: String| {
            let state = state.clone();
            let token = token.clone();
            async move { json_body(send(&state, "GET", &path, Some(&token), None).await).await }
        };
        let registration = get(format!("/db/2024/registrations/{registration}")).await;
        assert_eq!(registration["data"]["medical_conditions"], "");
        let incoming = get(format!("/db/2024/incoming/{incoming}")).await;
        assert_eq!(incoming["data"]["med_info"], "");
        assert_eq!(incoming["data"]["notes"], "keep");
        let application = get(format!("/db/2024/applications/{application}")).await;
        assert_eq!(application["data"]["dietary_restrictions"], "");

        let content = get("/db/2025/portal-content".to_string()).await;
        assert_eq!(content[0]["data"]["LEADER_description"], "Welcome");
    }

    #[tokio::test]
    async fn test_training_signup_and_attendance() {
        let state = AppState::default();
        let director = director_with_year(&state).await;
        let volunteer = sign_in(&state, "vol", vec![]).await;
        let application = GeneralApplication::new(2024, user_id(&state, "vol").await, "Val", "vol", TshirtSize::M);
        state.table().insert(&application).await.unwrap();

        let training = create(&state, &director, "trainings", json!({"name": "First Aid"})).await;
        let response = send(
            &state,
            "POST",
            "/db/2024/sessions",
            Some(&director),
            Some(json!({"training": training, "date": "2024-05-01", "start_time": "14:00:00", "end_time": "16:00:00"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let session = json_body(response).await;
        assert_eq!(session["label"], "First Aid: 05/01 14:00");
        let session = session["id"].as_str().unwrap().to_string();

        let response = send(
            &state,
            "PUT",
            "/apply/trainings",
            Some(&volunteer),
            Some(json!({"registered_sessions": [session]})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let attendee = json_body(response).await["id"].as_str().unwrap().to_string();

        let uri = format!("/db/2024/sessions/{session}/attendance");
        let response = send(&state, "PUT", &uri, Some(&volunteer), Some(json!({"completed": [attendee]}))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let tlt = sign_in(&state, "tlt", vec![Group::Tlts]).await;
        let response = send(&state, "PUT", &uri, Some(&tlt), Some(json!({"completed": [attendee]}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["completed"], json!([attendee]));

        let response = send(&state, "PUT", &uri, Some(&tlt), Some(json!({"completed": [Uuid::new_v4()]}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&state, "DELETE", &format!("/db/2024/trainings/{training}"), Some(&director), None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_safety_log_is_limited_to_incident_reporters() {
        let state = AppState::default();
        director_with_year(&state).await;
        let lead = sign_in(&state, "lead", vec![Group::SafetyLeads]).await;
        let directorate = sign_in(&state, "staff", vec![Group::Directorate]).await;
        let report = json!({
            "caller": "Sam",
            "caller_role": "TRIP_LEADER",
            "caller_number": "603-555-0100",
            "where": "Moose Mountain",
            "when": "2024-09-04T14:00:00Z",
            "desc": "Rolled ankle",
        });

        let response = send(&state, "POST", "/db/2024/incidents", Some(&lead), Some(report.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["data"]["netid"], "lead");
        assert_eq!(created["data"]["status"], "OPEN");
        let id = created["id"].as_str().unwrap().to_string();

        let response = send(&state, "GET", "/db/2024/incidents", Some(&directorate), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let director = sign_in(&state, "boss", vec![Group::Directors]).await;
        let mut resolved = report;
        resolved["status"] = json!("RESOLVED");
        let uri = format!("/db/2024/incidents/{id}");
        let response = send(&state, "PUT", &uri, Some(&director), Some(resolved)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated = json_body(response).await;
        assert_eq!(updated["data"]["netid"], "lead");
        assert_eq!(updated["data"]["created"], created["data"]["created"]);

        let response = send(&state, "GET", "/db/2024/incidents?status=open", Some(&lead), None).await;
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_raids_need_a_target_and_list_by_trip() {
        let state = AppState::default();
        director_with_year(&state).await;
        let seeded = seed_trip(&state).await;
        let staff = sign_in(&state, "staff", vec![Group::Directorate]).await;

        let response = send(&state, "POST", "/db/2024/raids", Some(&staff), Some(json!({"date": "2024-09-04"}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let raid = json!({"trip": seeded.trip.id, "date": "2024-09-04", "plan": "pirates"});
        let response = send(&state, "POST", "/db/2024/raids", Some(&staff), Some(raid)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let raid = json_body(response).await;
        assert_eq!(raid["label"], "staff 09/04");
        let raid_id = raid["id"].as_str().unwrap().to_string();

        let response = send(&state, "GET", "/db/2024/raids/trips", Some(&staff), None).await;
        let trips = json_body(response).await;
        assert_eq!(trips[0]["trip"], json!(seeded.trip.id));
        assert_eq!(trips[0]["raids"][0]["plan"], "pirates");

        let response = send(&state, "DELETE", &format!("/db/2024/raids/{raid_id}"), Some(&staff), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_gear_request_belongs_to_the_signed_in_trippee() {
        let state = AppState::default();
        let director = director_with_year(&state).await;
        let boots = create(&state, &director, "gear", json!({"name": "Boots"})).await;
        create(&state, &director, "incoming", json!({"name": "Jane Doe", "netid": "D12345A"})).await;

        let outsider = sign_in(&state, "nobody", vec![]).await;
        let response = send(&state, "PUT", "/gear", Some(&outsider), Some(json!({"gear": [boots]}))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let trippee = sign_in(&state, "d12345a", vec![]).await;
        let response = send(&state, "PUT", "/gear", Some(&trippee), Some(json!({"gear": [boots]}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["name"], "Jane Doe");
        let response = send(
            &state,
            "PUT",
            "/gear",
            Some(&trippee),
            Some(json!({"gear": [boots], "additional": "size 9"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&state, "GET", "/db/2024/gear-requests", Some(&director), None).await;
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
        let response = send(&state, "GET", "/db/2024/gear-requests/totals", Some(&director), None).await;
        let totals = json_body(response).await;
        assert_eq!(totals[0]["requested"], 1);
        assert_eq!(totals[0]["provided"], 0);
    }

    #[tokio::test]
    async fn test_email_lists() {
        let state = AppState::default();
        let token = director_with_year(&state).await;
        let seeded = seed_trip(&state).await;
        let mut student = IncomingStudent::new(2024, "Jane Doe", "d11111a");
        student.email = "jane@gmail.com".to_string();
        student.trip_assignment = Some(seeded.trip.id);
        state.table().insert(&student).await.unwrap();

        let response = send(&state, "GET", "/db/2024/emails/trippees", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let lists = json_body(response).await;
        assert_eq!(lists[0]["emails"], json!(["jane@gmail.com"]));
        assert_eq!(lists[2]["name"], "Section A trippees");

        let response = send(&state, "GET", "/db/2024/emails/applicants", Some(&token), None).await;
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 9);

        let response = send(&state, "GET", "/db/2024/emails/nope", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_application_status_uses_portal_content() {
        let state = AppState::default();
        director_with_year(&state).await;
        let volunteer = sign_in(&state, "vol", vec![]).await;
        let mut application = GeneralApplication::new(2024, user_id(&state, "vol").await, "Val", "vol", TshirtSize::M);
        application.status = ApplicationStatus::LeaderWaitlist;
        state.table().insert(&application).await.unwrap();
        let mut content = PortalContent::new(2024);
        content.leader_waitlist_description = "Hang tight".to_string();
        state.table().insert(&content).await.unwrap();

        let response = send(&state, "GET", "/apply/status", Some(&volunteer), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let status = json_body(response).await;
        assert_eq!(status["status"], "LEADER_WAITLIST");
        assert_eq!(status["description"], "Hang tight");
        assert_eq!(status["application_header"], "");
    }
}
