//! Route table

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use super::handlers_auth::{
    add_doctor, add_patient, chatbot, create_emergency_contact, doctor_dashboard, is_patient,
    list_all_patients, list_doctors, list_patients, logout, patient_dashboard,
    predict_heart_disease, update_doctor, update_emergency_contact, update_patient,
};
use super::handlers_unauth::{login, signup_doctor, signup_patient};
use super::SharedState;

pub fn get_router(state: SharedState) -> Router {
    let router = Router::new()
        .merge(unauth_routes())
        .merge(auth_routes())
        .with_state(state);

    // Any origin, debug builds only
    if cfg!(debug_assertions) {
        let cors = CorsLayer::new()
            .allow_methods(tower_http::cors::AllowMethods::any())
            .allow_headers(Any)
            .allow_origin(Any);
        router.layer(cors)
    } else {
        router
    }
}

fn unauth_routes() -> Router<SharedState> {
    Router::new()
        .route("/signup/doctor", post(signup_doctor))
        .route("/signup/patient", post(signup_patient))
        .route("/login/", post(login))
}

/// Each handler's extractor rejects callers without the right token or role
fn auth_routes() -> Router<SharedState> {
    Router::new()
        .route("/logout/", post(logout))
        .route("/is-patient/", get(is_patient))
        .route("/doctor/dashboard/", get(doctor_dashboard))
        .route("/doctor/add-patient/", put(add_patient))
        .route("/doctor/list-patients/", get(list_patients))
        .route("/doctor/list-all-patients/", get(list_all_patients))
        .route("/doctor/update", put(update_doctor))
        .route("/patient/dashboard/", get(patient_dashboard))
        .route("/patient/add-doctor/", put(add_doctor))
        .route("/patient/list-doctors/", get(list_doctors))
        .route("/patient/update", put(update_patient))
        .route(
            "/patient/emergency-contact/",
            post(create_emergency_contact).put(update_emergency_contact),
        )
        .route("/predict-heart-disease/", get(predict_heart_disease))
        .route("/chatbot/", post(chatbot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AppState;
    use crate::testing;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app() -> Router {
        get_router(Arc::new(AppState {
            service: testing::service().await,
            chatbot: testing::echo_chatbot(),
        }))
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Token {token}"));
        }
        let request = match body {
            Some(body) => request
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn signup(app: &Router, role: &str, name: &str) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            &format!("/signup/{role}"),
            None,
            Some(json!({
                "username": name,
                "email": format!("{name}@clinic.ro"),
                "password": testing::PASSWORD,
                "password2": testing::PASSWORD,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "Sign-up failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_signup_and_login() {
        let app = app().await;
        let token = signup(&app, "patient", "ana_pop").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/login/",
            None,
            Some(json!({"username": "ana_pop", "password": testing::PASSWORD})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"], token.as_str());
        assert_eq!(body["is_patient"], true);
        assert_eq!(body["is_doctor"], false);
        assert_eq!(body["email"], "ana_pop@clinic.ro");

        let (status, body) = call(
            &app,
            Method::POST,
            "/login/",
            None,
            Some(json!({"username": "ana_pop", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_wrong_role_is_forbidden() {
        let app = app().await;
        let patient = signup(&app, "patient", "ana_pop").await;
        let doctor = signup(&app, "doctor", "dr_house").await;

        let cases = [
            (Method::GET, "/doctor/dashboard/", &patient),
            (Method::GET, "/doctor/list-all-patients/", &patient),
            (Method::GET, "/patient/dashboard/", &doctor),
            (Method::GET, "/predict-heart-disease/", &doctor),
        ];
        for (method, uri, token) in cases {
            let (status, body) = call(&app, method, uri, Some(token), None).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri} must be refused");
            assert_eq!(body["error"], "You do not have permission to perform this action.");
        }

        let (status, _) = call(
            &app,
            Method::PUT,
            "/doctor/update",
            Some(&patient),
            Some(json!({"speciality": "Surgery"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_or_unknown_token_is_unauthorized() {
        let app = app().await;

        let (status, _) = call(&app, Method::GET, "/is-patient/", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, Method::GET, "/is-patient/", Some("deadbeef"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let app = app().await;
        let token = signup(&app, "doctor", "dr_house").await;

        let (status, body) = call(&app, Method::GET, "/is-patient/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"is_patient": false}));

        let (status, _) = call(&app, Method::POST, "/logout/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&app, Method::GET, "/is-patient/", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_association_flow() {
        let app = app().await;
        let patient = signup(&app, "patient", "ana_pop").await;
        let doctor = signup(&app, "doctor", "dr_house").await;

        let (status, body) = call(
            &app,
            Method::PUT,
            "/patient/add-doctor/",
            Some(&patient),
            Some(json!({"doctor_username": "dr_nobody"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

        let (status, body) = call(
            &app,
            Method::PUT,
            "/patient/add-doctor/",
            Some(&patient),
            Some(json!({"doctor_username": "dr_house"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert!(body["doctor_id"].is_string());

        let (_, doctors) = call(&app, Method::GET, "/patient/list-doctors/", Some(&patient), None).await;
        assert_eq!(doctors[0]["user"]["username"], "dr_house");

        let (_, patients) = call(&app, Method::GET, "/doctor/list-patients/", Some(&doctor), None).await;
        assert_eq!(patients[0]["user"]["username"], "ana_pop");

        let (_, dashboard) = call(&app, Method::GET, "/doctor/dashboard/", Some(&doctor), None).await;
        assert_eq!(dashboard["patients"], json!([body["patient_id"]]));
    }

    #[tokio::test]
    async fn test_update_and_predict() {
        let app = app().await;
        let patient = signup(&app, "patient", "ana_pop").await;

        let (status, _) = call(&app, Method::GET, "/predict-heart-disease/", Some(&patient), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "An empty profile cannot be scored");

        let (status, body) = call(
            &app,
            Method::PUT,
            "/patient/update",
            Some(&patient),
            Some(json!({
                "general_health": "Fair",
                "checkup": "Never",
                "exercise": false,
                "sex": "Male",
                "age": 70,
                "bmi": 31.2,
                "height": 175,
                "weight": 96,
                "alcohol_consumption": 8.0,
                "fruit_consumption": 4.0,
                "green_vegetable_consumption": 2.0,
                "fried_potato_consumption": 12.0,
                "is_doctor": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["message"], "Patient 'ana_pop' updated successfully.");
        assert_eq!(body["details"]["general_health"], "Fair");
        assert_eq!(body["details"]["user"]["is_doctor"], false);

        let (status, body) = call(&app, Method::GET, "/predict-heart-disease/", Some(&patient), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"probability": testing::STUB_PROBABILITY}));
    }

    #[tokio::test]
    async fn test_chatbot() {
        let app = app().await;
        let token = signup(&app, "patient", "ana_pop").await;

        let (status, _) = call(&app, Method::POST, "/chatbot/", Some(&token), Some(json!({"message": " "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::POST, "/chatbot/", Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            Method::POST,
            "/chatbot/",
            Some(&token),
            Some(json!({"message": "Salut"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "[en>ro][ro>en]Salut");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = app().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/signup/doctor")
            .header("Content-Type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());
    }
}
