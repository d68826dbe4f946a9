use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use availability_cell::{
    schedule_routes, AvailabilityState, HorizonConfig, HorizonScheduler, ScheduleService,
    SupabaseAvailabilityStore,
};
use shared_database::SupabaseClient;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

fn create_test_app(server: &MockServer) -> Router {
    let config = TestConfig::with_url(&server.uri()).to_app_config();
    let store = Arc::new(SupabaseAvailabilityStore::with_client(Arc::new(
        SupabaseClient::new(&config),
    )));

    let horizon = Arc::new(HorizonScheduler::new(
        store.clone(),
        store.clone(),
        store.clone(),
        HorizonConfig::default(),
    ));

    schedule_routes(Arc::new(AvailabilityState {
        schedules: ScheduleService::new(store.clone(), store.clone()),
        horizon,
        holidays: store,
    }))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn mount_user(server: &MockServer, user: &TestUser) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([MockSupabaseResponses::user_response(user)])),
        )
        .mount(server)
        .await;
}

fn monday_schedule() -> Value {
    json!({ "day_of_week": "Monday", "start_time": "09:00:00", "end_time": "10:00:00" })
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_create_schedule() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor();
    let doctor_id = doctor.id;

    mount_user(&server, &doctor).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_schedules"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::schedule_response(doctor_id, "Monday", "09:00", "12:00")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = create_test_app(&server)
        .oneshot(json_request(
            "POST",
            &format!("/doctors/{}", doctor_id),
            json!({ "day_of_week": "monday", "start_time": "09:00:00", "end_time": "12:00:00" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["schedule"]["day_of_week"], "Monday");
}

#[tokio::test]
async fn test_create_schedule_rejects_inverted_window() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_schedules"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let response = create_test_app(&server)
        .oneshot(json_request(
            "POST",
            &format!("/doctors/{}", Uuid::new_v4()),
            json!({ "day_of_week": "Monday", "start_time": "12:00:00", "end_time": "09:00:00" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("before end time"));
}

#[tokio::test]
async fn test_create_schedule_rejects_unknown_day() {
    let server = MockServer::start().await;

    let response = create_test_app(&server)
        .oneshot(json_request(
            "POST",
            &format!("/doctors/{}", Uuid::new_v4()),
            json!({ "day_of_week": "Someday", "start_time": "09:00:00", "end_time": "10:00:00" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_schedule_for_unknown_doctor_returns_404() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_schedules"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let response = create_test_app(&server)
        .oneshot(json_request("POST", &format!("/doctors/{}", Uuid::new_v4()), monday_schedule()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["error"], "Doctor not found");
}

#[tokio::test]
async fn test_create_schedule_for_non_doctor_returns_400() {
    let server = MockServer::start().await;
    let patient = TestUser::patient();
    let admin = TestUser::admin();

    mount_user(&server, &patient).await;
    mount_user(&server, &admin).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_schedules"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let app = create_test_app(&server);
    for user in [&patient, &admin] {
        let response = app
            .clone()
            .oneshot(json_request("POST", &format!("/doctors/{}", user.id), monday_schedule()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["error"], "User is not a doctor");
    }
}

#[tokio::test]
async fn test_get_missing_schedule_returns_404() {
    let server = MockServer::start().await;
    let schedule_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_schedules"))
        .and(query_param("id", format!("eq.{}", schedule_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri(format!("/{}", schedule_id))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_schedule_returns_404() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/doctor_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/{}", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_slots_rejects_inverted_range() {
    let server = MockServer::start().await;

    let response = create_test_app(&server)
        .oneshot(json_request(
            "POST",
            "/slots/generate",
            json!({ "start_date": "2030-01-31", "end_date": "2030-01-01" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_slots_rejects_oversized_range() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let app = create_test_app(&server);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/slots/generate",
            json!({ "start_date": "0001-01-01", "end_date": "9999-12-31" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(read_json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("366 day generation limit"));

    let response = app
        .oneshot(json_request(
            "POST",
            "/slots/generate",
            json!({ "start_date": "2030-01-01", "end_date": "2031-01-03" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_slots_reports_counts() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::schedule_response(doctor_id, "Monday", "09:00", "10:00")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/holidays"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/available_slots"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::slot_response(Uuid::new_v4(), doctor_id, "2030-01-07", "09:00", "09:30", false),
            MockSupabaseResponses::slot_response(Uuid::new_v4(), doctor_id, "2030-01-07", "09:30", "10:00", false)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = create_test_app(&server)
        .oneshot(json_request(
            "POST",
            "/slots/generate",
            json!({ "start_date": "2030-01-07", "end_date": "2030-01-13" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["report"]["doctors_processed"], 1);
    assert_eq!(body["report"]["slots_generated"], 2);
    assert_eq!(body["report"]["slots_inserted"], 2);
    assert_eq!(body["report"]["window"]["start"], "2030-01-07");
}

#[tokio::test]
async fn test_add_holiday() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/holidays"))
        .and(query_param("on_conflict", "date"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "date": "2030-12-25", "description": "Christmas" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = create_test_app(&server)
        .oneshot(json_request(
            "POST",
            "/holidays",
            json!({ "date": "2030-12-25", "description": "Christmas" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["holiday"]["date"], "2030-12-25");
}
