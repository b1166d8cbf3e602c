// Presentation layer - HTTP routing
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::*;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

// Compression is handled in the response builders, so no CompressionLayer here
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/locations", get(list_locations))
        .route("/locations/nearby", get(nearby_locations))
        .route("/locations/region", get(location_region))
        .route("/shared", get(shared_with_viewer))
        .route("/drones", get(list_drones).post(register_drone))
        .route("/drones/:id", put(update_drone))
        .route("/drones/:id/shares", post(share_drone))
        .route("/drones/:id/flights", get(drone_flights))
        .route("/flights", post(record_flight))
        .route("/flights/:id", put(edit_flight))
        .route("/weather", get(weather_at))
        .route("/stopwatches", post(start_stopwatch))
        .route("/stopwatches/:id", get(stopwatch_status).delete(discard_stopwatch))
        .route("/stopwatches/:id/ticks", get(stream_stopwatch))
        .route("/stopwatches/:id/stop", post(stop_stopwatch))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::drone_service::DroneRegistry;
    use crate::application::fakes::{FakeGeocoder, FixedWeather, InMemoryRepository};
    use crate::application::flight_service::FlightRecordAssembler;
    use crate::application::location_service::LocationAggregator;
    use crate::application::sharing_service::SharedAccessResolver;
    use crate::domain::drone::{AccessType, DroneRecord, ShareGrant};
    use crate::domain::flight::Weather;
    use crate::domain::geo::{equator_point_at, Coordinates};
    use crate::domain::location::LocationCandidate;
    use crate::presentation::app_state::StopwatchSessions;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn repository() -> InMemoryRepository {
        InMemoryRepository {
            locations: Some(vec![
                LocationCandidate::new("l1", "Mojave Field", "Desert Hwy"),
                LocationCandidate::new("l2", "Black Rock", "Gerlach, NV"),
                LocationCandidate::new("l3", "Far Away", "Nowhere")
                    .with_coordinates(equator_point_at(200_000.0)),
            ]),
            ..InMemoryRepository::default()
        }
        .with_drone(
            "d1",
            DroneRecord {
                drone_name: Some("Comet".to_string()),
                user_id: Some("u1".to_string()),
                ..DroneRecord::default()
            },
        )
        .with_user("u1", "Ada")
        .with_grants(vec![ShareGrant::new("d1", "a@x.com", "u1", AccessType::View)])
    }

    fn app_with(repository: InMemoryRepository) -> Router {
        let repository = Arc::new(repository);
        let geocoder = Arc::new(
            FakeGeocoder::default()
                .with("Mojave Field Desert Hwy", equator_point_at(10_000.0))
                .with("Black Rock", Coordinates::new(40.8, -119.2)),
        );
        let weather = Weather {
            temperature_c: Some(21.0),
            ..Weather::default()
        };

        let state = Arc::new(AppState {
            locations: LocationAggregator::new(repository.clone(), geocoder.clone(), 90_000.0),
            sharing: SharedAccessResolver::new(repository.clone()),
            drones: DroneRegistry::new(repository.clone()),
            flights: FlightRecordAssembler::new(repository, geocoder, Arc::new(FixedWeather(Some(weather)))),
            stopwatches: Arc::new(StopwatchSessions::new(Duration::from_secs(1), Duration::from_secs(3_600))),
        });
        router(state)
    }

    fn app() -> Router {
        app_with(repository())
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_location_search() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/locations?q=black", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], "l2");

        let (_, all) = send(&app, Method::GET, "/locations", None).await;
        assert_eq!(all.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_nearby_needs_device_position() {
        let app = app();
        let (_, nearby) = send(&app, Method::GET, "/locations/nearby?lat=0&lon=0", None).await;
        let ids: Vec<&str> = nearby.as_array().unwrap().iter().map(|l| l["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["l1"]);

        let (status, none) = send(&app, Method::GET, "/locations/nearby", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(none, json!([]));
    }

    #[tokio::test]
    async fn test_region_without_catalog_or_device() {
        let app = app_with(InMemoryRepository::default());
        let (status, _) = send(&app, Method::GET, "/locations/region", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, region) = send(&app, Method::GET, "/locations/region?lat=1&lon=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(region["latitude"], 1.0);
    }

    #[tokio::test]
    async fn test_shared_with_viewer() {
        let app = app();
        let (_, views) = send(&app, Method::GET, "/shared?viewer=a@x.com", None).await;
        assert_eq!(views[0]["ownerName"], "Ada");
        assert_eq!(views[0]["displayId"], "#01");
        assert_eq!(views[0]["droneName"], "Comet");

        let (_, others) = send(&app, Method::GET, "/shared?viewer=b@x.com", None).await;
        assert_eq!(others, json!([]));
    }

    #[tokio::test]
    async fn test_share_status_codes() {
        let app = app();
        let share = |email: &str| json!({"ownerId": "u1", "email": email, "accessType": "Edit"});

        let (status, grant) = send(&app, Method::POST, "/drones/d1/shares", Some(share("b@x.com"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(grant["accessType"], "Edit");

        let (status, _) = send(&app, Method::POST, "/drones/d1/shares", Some(share("b@x.com"))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&app, Method::POST, "/drones/d1/shares", Some(share("  "))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_record_flight_then_list() {
        let app = app();
        let flight = json!({
            "draft": {"date": "04/05/2024", "time": "03:45", "location": "Black Rock", "droneId": "d1"},
            "measurements": {"flightTime": 42, "altitude": 300, "angle": 85}
        });

        let (status, created) = send(&app, Method::POST, "/flights", Some(flight)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["flightTime"], 42);

        let (_, flights) = send(&app, Method::GET, "/drones/d1/flights", None).await;
        assert_eq!(flights[0]["id"], created["id"]);
        assert_eq!(flights[0]["altitude"], 300.0);
    }

    #[tokio::test]
    async fn test_invalid_flight_is_rejected() {
        let app = app();
        let flight = json!({
            "draft": {"date": "04/05/2024", "time": "03:45", "location": "Black Rock", "droneId": "d1"},
            "measurements": {"flightTime": 0, "altitude": 300, "angle": 85}
        });
        let (status, body) = send(&app, Method::POST, "/flights", Some(flight)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("flight time"));

        let unknown = json!({"draft": {"date": "d", "time": "t", "location": "l", "droneId": "d1"}, "stopwatchId": 99});
        let (status, _) = send(&app, Method::POST, "/flights", Some(unknown)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_weather_lookup() {
        let app = app();
        let (status, weather) = send(&app, Method::GET, "/weather?location=Black%20Rock", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(weather["temperatureC"], 21.0);

        let (status, _) = send(&app, Method::GET, "/weather?location=Atlantis", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopwatch_lifecycle() {
        let app = app();
        let (status, started) = send(&app, Method::POST, "/stopwatches", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = started["id"].as_u64().unwrap();

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let (_, running) = send(&app, Method::GET, &format!("/stopwatches/{}", id), None).await;
        assert_eq!(running["elapsedSeconds"], 3);
        assert_eq!(running["state"], "running");

        let (_, stopped) = send(&app, Method::POST, &format!("/stopwatches/{}/stop", id), None).await;
        assert_eq!(stopped["elapsedSeconds"], 3);
        assert_eq!(stopped["display"], "0:00:03");

        let (status, _) = send(&app, Method::GET, &format!("/stopwatches/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopwatch_time_feeds_flight() {
        let app = app();
        let (_, started) = send(&app, Method::POST, "/stopwatches", None).await;
        tokio::time::sleep(Duration::from_millis(5_200)).await;

        let flight = json!({
            "draft": {"date": "04/05/2024", "time": "03:45", "location": "Black Rock", "droneId": "d1"},
            "measurements": {"altitude": 120, "angle": 80},
            "stopwatchId": started["id"]
        });
        let (status, created) = send(&app, Method::POST, "/flights", Some(flight)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["flightTime"], 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_flight_keeps_stopwatch_time() {
        let app = app();
        let (_, started) = send(&app, Method::POST, "/stopwatches", None).await;
        let session = format!("/stopwatches/{}", started["id"]);
        tokio::time::sleep(Duration::from_millis(5_200)).await;

        let flight = |measurements: Value| {
            json!({
                "draft": {"date": "04/05/2024", "time": "03:45", "location": "Black Rock", "droneId": "d1"},
                "measurements": measurements,
                "stopwatchId": started["id"]
            })
        };

        let (status, _) = send(&app, Method::POST, "/flights", Some(flight(json!({"angle": 80})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // stopped, not lost: the clock no longer moves but the session is still there
        tokio::time::sleep(Duration::from_secs(2)).await;
        let (status, kept) = send(&app, Method::GET, &session, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(kept["state"], "stopped");
        assert_eq!(kept["elapsedSeconds"], 5);

        let retry = flight(json!({"altitude": 120, "angle": 80}));
        let (status, created) = send(&app, Method::POST, "/flights", Some(retry)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["flightTime"], 5);

        let (status, _) = send(&app, Method::GET, &session, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failure_keeps_stopwatch_time() {
        let app = app_with(InMemoryRepository {
            fail_writes: true,
            ..repository()
        });
        let (_, started) = send(&app, Method::POST, "/stopwatches", None).await;
        tokio::time::sleep(Duration::from_millis(3_200)).await;

        let flight = json!({
            "draft": {"date": "04/05/2024", "time": "03:45", "location": "Black Rock", "droneId": "d1"},
            "measurements": {"altitude": 120, "angle": 80},
            "stopwatchId": started["id"]
        });
        let (status, _) = send(&app, Method::POST, "/flights", Some(flight)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, kept) = send(&app, Method::GET, &format!("/stopwatches/{}", started["id"]), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(kept["elapsedSeconds"], 3);
    }

    fn rocket(name: &str) -> Value {
        json!({
            "droneName": name, "droneType": "Rocket", "motorType": "C6-5",
            "altitude": 120, "altitudeUnit": "m", "flightTime": 9,
            "mass": 450, "massUnit": "g", "launchAngle": 85
        })
    }

    #[tokio::test]
    async fn test_register_and_list_rockets() {
        let app = app_with(InMemoryRepository::default());
        let (status, created) = send(
            &app,
            Method::POST,
            "/drones",
            Some(json!({"ownerId": "u7", "drone": rocket("Comet")})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        send(&app, Method::POST, "/drones", Some(json!({"ownerId": "u7", "drone": rocket("Falcon")}))).await;

        let (status, mine) = send(&app, Method::GET, "/drones?owner=u7", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().unwrap().len(), 2);
        assert_eq!(mine[0]["id"], created["id"]);
        assert_eq!(mine[0]["displayId"], "#01");
        assert_eq!(mine[1]["droneName"], "Falcon");
        assert_eq!(mine[1]["userId"], "u7");

        let (_, none) = send(&app, Method::GET, "/drones?owner=u8", None).await;
        assert_eq!(none, json!([]));
    }

    #[tokio::test]
    async fn test_register_incomplete_rocket() {
        let app = app_with(InMemoryRepository::default());
        let mut drone = rocket("Comet");
        drone["motorType"] = json!("");

        let (status, body) = send(&app, Method::POST, "/drones", Some(json!({"ownerId": "u7", "drone": drone}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("motorType"));
    }

    #[tokio::test]
    async fn test_update_rocket_status_codes() {
        let app = app_with(InMemoryRepository::default());
        let (_, created) = send(&app, Method::POST, "/drones", Some(json!({"ownerId": "u7", "drone": rocket("Comet")}))).await;
        let uri = format!("/drones/{}", created["id"].as_str().unwrap());

        let edit = json!({"ownerId": "u7", "drone": rocket("Comet II")});
        let (status, _) = send(&app, Method::PUT, &uri, Some(edit)).await;
        assert_eq!(status, StatusCode::OK);
        let (_, mine) = send(&app, Method::GET, "/drones?owner=u7", None).await;
        assert_eq!(mine[0]["droneName"], "Comet II");

        let stranger = json!({"ownerId": "u8", "drone": rocket("Stolen")});
        let (status, _) = send(&app, Method::PUT, &uri, Some(stranger)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let missing = json!({"ownerId": "u7", "drone": rocket("Ghost")});
        let (status, _) = send(&app, Method::PUT, "/drones/-D99", Some(missing)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_edit_flight() {
        let app = app();
        let flight = json!({
            "draft": {"date": "04/05/2024", "time": "03:45", "location": "Black Rock", "droneId": "d1"},
            "measurements": {"flightTime": 42, "altitude": 300, "angle": 85}
        });
        let (_, created) = send(&app, Method::POST, "/flights", Some(flight)).await;
        let uri = format!("/flights/{}", created["id"].as_str().unwrap());

        let edited = json!({
            "draft": {"date": "04/05/2024", "time": "04:10", "location": "Black Rock", "droneId": "d1"},
            "measurements": {"flightTime": 40, "altitude": 280, "altitudeUnit": "", "angle": 85}
        });
        let (status, body) = send(&app, Method::PUT, &uri, Some(edited)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["flightTime"], 40);

        let (_, flights) = send(&app, Method::GET, "/drones/d1/flights", None).await;
        assert_eq!(flights.as_array().unwrap().len(), 1);
        assert_eq!(flights[0]["time"], "04:10");
        assert_eq!(flights[0]["altitude"], 280.0);
        assert_eq!(flights[0]["altitudeUnit"], "m");

        let invalid = json!({"draft": {"date": "d", "time": "t", "location": "l", "droneId": "d1"}});
        let (status, _) = send(&app, Method::PUT, &uri, Some(invalid)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let unknown = json!({
            "draft": {"date": "d", "time": "t", "location": "l", "droneId": "d1"},
            "measurements": {"flightTime": 1, "altitude": 1, "angle": 1}
        });
        let (status, _) = send(&app, Method::PUT, "/flights/-F99", Some(unknown)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_discard_unknown_stopwatch() {
        let app = app();
        let (status, _) = send(&app, Method::DELETE, "/stopwatches/7", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, started) = send(&app, Method::POST, "/stopwatches", None).await;
        let uri = format!("/stopwatches/{}", started["id"]);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
