mod common;

use actix_web::{
    http::StatusCode,
    test,
    web::{scope, Data},
    App,
};
use schooldesk::{routes, AppState};
use serde_json::{json, Value};

/// Spins up the auth and schools scopes the way the binary wires them.
macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .service(
                    scope("/api/auth")
                        .service(routes::auth::register_handler)
                        .service(routes::auth::login_handler)
                        .service(routes::auth::admins_handler),
                )
                .service(
                    scope("/api/schools")
                        .service(routes::schools::login_handler)
                        .service(routes::schools::add_handler)
                        .service(routes::schools::list_handler),
                )
                .app_data(Data::new($state.clone())),
        )
        .await
    };
}

async fn state() -> (AppState, tempfile::TempDir) {
    let uploads = tempfile::tempdir().expect("uploads dir");
    let state = AppState {
        db_pool: common::test_pool().await,
        config: common::test_config(uploads.path()),
    };
    (state, uploads)
}

#[actix_web::test]
async fn login_issues_token_that_opens_protected_routes() {
    let (state, _uploads) = state().await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": "admin@platform.test", "password": "hunter22" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "admin@platform.test", "password": "hunter22" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], json!(true));
    let token = body["token"].as_str().expect("token issued").to_string();

    // No token, garbage token, then the real one.
    let req = test::TestRequest::get().uri("/api/schools").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/schools")
        .insert_header(("Authorization", "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/schools")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn wrong_password_and_unknown_email_answer_identically() {
    let (state, _uploads) = state().await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": "admin@platform.test", "password": "hunter22" }))
        .to_request();
    test::call_service(&app, req).await;

    let mut bodies = Vec::new();
    for creds in [
        json!({ "email": "admin@platform.test", "password": "wrong" }),
        json!({ "email": "nobody@platform.test", "password": "hunter22" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(creds)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        bodies.push(test::read_body(resp).await);
    }
    assert_eq!(bodies[0], bodies[1]);
}

#[actix_web::test]
async fn school_token_cannot_reach_company_admin_routes() {
    let (state, _uploads) = state().await;
    let app = test_app!(state);

    // Bootstrap an admin and a school through the API.
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": "admin@platform.test", "password": "hunter22" }))
        .to_request();
    test::call_service(&app, req).await;
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "admin@platform.test", "password": "hunter22" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let admin_token = body["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/schools")
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .set_json(json!({
            "school_name": "Hill Valley High",
            "school_code": "SCH001",
            "email": "office@hillvalley.test",
            "password": "flux-capacitor",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/schools/login")
        .set_json(json!({
            "email": "office@hillvalley.test",
            "password": "flux-capacitor",
            "school_code": "SCH001",
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], json!(true));
    let school_token = body["token"].as_str().unwrap().to_string();

    // A school principal is not a company admin.
    let req = test::TestRequest::get()
        .uri("/api/auth/admins")
        .insert_header(("Authorization", format!("Bearer {school_token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/auth/admins")
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
