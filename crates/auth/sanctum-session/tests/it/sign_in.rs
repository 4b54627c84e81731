use crate::common::*;
use sanctum_auth::{CredentialStore, MemoryStore};
use sanctum_session::{AuthenticationStatus, CredentialOutcome, SessionError, SessionUser};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_login(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("x-xsrf-token", XSRF_DECODED))
        .and(body_json(credentials()))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn good_credentials_persist_token_without_confirming() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    mount_login(&server, ResponseTemplate::new(200).set_body_string(TOKEN)).await;
    mount_user(&server).await;

    let store = MemoryStore::new();
    let manager = manager_with(config(&server), store.clone());

    let outcome = manager.sign_in(&credentials()).await.unwrap();
    assert_eq!(outcome, CredentialOutcome::Established);
    assert_eq!(
        CredentialStore::open(store).unwrap().get().unwrap().unwrap().expose(),
        TOKEN
    );
    assert_eq!(manager.session().status(), AuthenticationStatus::Unknown);

    let user = manager.confirm_session().await.unwrap().unwrap();
    assert_eq!(user.as_value(), &user_record());
    assert!(manager.session().is_authenticated());
}

#[tokio::test]
async fn csrf_is_primed_before_credentials_are_posted() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    mount_login(&server, ResponseTemplate::new(200).set_body_string(TOKEN)).await;

    let manager = manager(&server);
    let _ = manager.sign_in(&credentials()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url.path(), "/sanctum/csrf-cookie");
    assert_eq!(requests[1].url.path(), "/login");
    assert_eq!(manager.csrf().xsrf_token().as_deref(), Some(XSRF_DECODED));
}

#[tokio::test]
async fn bad_credentials_then_confirmation_leave_session_unauthenticated() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    mount_login(
        &server,
        ResponseTemplate::new(401).set_body_json(json!({ "message": "These credentials do not match our records." })),
    )
    .await;
    mount_unauthorized_user(&server).await;

    let manager = manager(&server);
    let outcome = manager.sign_in(&credentials()).await.unwrap();
    assert_eq!(outcome, CredentialOutcome::Rejected);
    assert_eq!(manager.session().status(), AuthenticationStatus::Unauthenticated);
    assert!(!manager.credentials().has_token());

    assert!(manager.confirm_session().await.unwrap().is_none());
    let session = manager.session();
    assert_eq!(session.status(), AuthenticationStatus::Unauthenticated);
    assert_eq!(session.user(), &SessionUser::None);
}

#[tokio::test]
async fn token_survives_reload() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    mount_login(&server, ResponseTemplate::new(200).set_body_json(json!({ "token": TOKEN }))).await;
    mount_user(&server).await;

    let store = MemoryStore::new();
    {
        let manager = manager_with(config(&server), store.clone());
        let _ = manager.sign_in(&credentials()).await.unwrap();
    }

    let reloaded = manager_with(config(&server), store);
    assert!(reloaded.check_authentication().await.unwrap());
    assert_eq!(
        reloaded.session().user().known().unwrap().get("email"),
        Some(&json!("taylor@example.com"))
    );
}

#[tokio::test]
async fn csrf_failure_aborts_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sanctum/csrf-cookie"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TOKEN))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager(&server);
    let err = manager.sign_in(&credentials()).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(manager.session().status(), AuthenticationStatus::Unknown);
    assert!(!manager.credentials().has_token());
}

#[tokio::test]
async fn sign_up_validation_error_propagates() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "The email has already been taken.",
            "errors": { "email": ["The email has already been taken."] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager(&server);
    let err = manager
        .sign_up(&json!({ "name": "Taylor", "email": "taylor@example.com", "password": "password" }))
        .await
        .unwrap_err();

    let SessionError::Api(obj) = err else {
        panic!("expected Api error");
    };
    assert_eq!(obj.status_code, 422);
    assert!(obj.errors.unwrap().get("email").is_some());
    assert_eq!(manager.session().status(), AuthenticationStatus::Unknown);
}

#[tokio::test]
async fn sign_up_persists_token() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(header("x-xsrf-token", XSRF_DECODED))
        .respond_with(ResponseTemplate::new(201).set_body_string(format!("\"{TOKEN}\"")))
        .mount(&server)
        .await;

    let manager = manager(&server);
    assert!(manager.sign_up(&credentials()).await.unwrap().is_established());
    assert!(manager.credentials().has_token());
}

#[tokio::test]
async fn cookie_login_without_token_is_established() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    mount_login(
        &server,
        ResponseTemplate::new(204).insert_header("set-cookie", "laravel_session=abc; Path=/"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .and(header_regex("cookie", "laravel_session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_record()))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager(&server);
    let outcome = manager.sign_in(&credentials()).await.unwrap();
    assert_eq!(outcome, CredentialOutcome::Established);
    assert!(!manager.credentials().has_token());
    assert_eq!(manager.session().status(), AuthenticationStatus::Unknown);

    let user = manager.confirm_session().await.unwrap().unwrap();
    assert_eq!(user.as_value(), &user_record());
    assert!(manager.session().is_authenticated());
}

#[tokio::test]
async fn tokenless_json_response_is_established() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    mount_login(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "two_factor": false })),
    )
    .await;

    let manager = manager(&server);
    assert!(manager.sign_in(&credentials()).await.unwrap().is_established());
    assert!(!manager.credentials().has_token());
}

#[tokio::test]
async fn unauthorized_csrf_preflight_rejects_without_posting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sanctum/csrf-cookie"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthenticated." })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TOKEN))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager(&server);
    let outcome = manager.sign_in(&credentials()).await.unwrap();
    assert_eq!(outcome, CredentialOutcome::Rejected);

    let session = manager.session();
    assert_eq!(session.status(), AuthenticationStatus::Unauthenticated);
    assert_eq!(session.user(), &SessionUser::None);
    assert!(!manager.credentials().has_token());
}
