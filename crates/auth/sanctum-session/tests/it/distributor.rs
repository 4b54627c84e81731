use std::sync::{Arc, Mutex};

use crate::common::*;
use sanctum_session::{ContextDistributor, SessionContext, SessionError, SessionUser};
use sanctum_auth::MemoryStore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Seen = Arc<Mutex<Vec<(Option<bool>, SessionUser)>>>;

fn recorder(seen: &Seen) -> impl FnMut(&SessionContext<MemoryStore>) + Send + 'static {
    let seen = Arc::clone(seen);
    move |ctx: &SessionContext<MemoryStore>| {
        seen.lock().unwrap().push((ctx.authenticated(), ctx.user().clone()));
    }
}

#[tokio::test]
async fn subscriber_renders_immediately_and_on_change() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    let distributor = ContextDistributor::new(manager_with(config(&server), store_with_token()));

    let seen = Seen::default();
    distributor.subscribe(recorder(&seen));
    assert_eq!(seen.lock().unwrap().as_slice(), &[(None, SessionUser::None)]);

    assert_eq!(distributor.mount().await.unwrap(), Some(true));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].0, Some(true));
    assert_eq!(seen[1].1.known().unwrap().as_value(), &user_record());
}

#[tokio::test]
async fn unsubscribed_consumers_stop_rendering() {
    let server = MockServer::start().await;
    mount_unauthorized_user(&server).await;
    let distributor = ContextDistributor::new(manager(&server));

    let seen = Seen::default();
    let id = distributor.subscribe(recorder(&seen));
    assert!(distributor.unsubscribe(id));

    distributor.context().check_authentication().await.unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(distributor.context().authenticated(), Some(false));
}

#[tokio::test]
async fn mount_checks_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let distributor = ContextDistributor::new(manager(&server));

    assert_eq!(distributor.mount().await.unwrap(), Some(false));
    assert_eq!(distributor.mount().await.unwrap(), None);
}

#[tokio::test]
async fn mount_skips_check_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let distributor = ContextDistributor::new(manager_with(
        config(&server).with_check_on_init(false),
        Default::default(),
    ));

    assert_eq!(distributor.mount().await.unwrap(), None);
    assert_eq!(distributor.context().authenticated(), None);
}

#[tokio::test]
async fn context_actions_drive_the_manager() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TOKEN))
        .mount(&server)
        .await;
    mount_user(&server).await;
    let distributor = ContextDistributor::new(manager(&server));

    let ctx = distributor.context();
    assert!(ctx.sign_in(&credentials()).await.unwrap().is_established());
    assert!(ctx.confirm_session().await.unwrap().is_some());
    assert_eq!(distributor.context().authenticated(), Some(true));

    ctx.set_user(SessionUser::SignedOut, false).unwrap();
    assert_eq!(distributor.context().user(), &SessionUser::SignedOut);
}

#[tokio::test]
async fn watch_receiver_sees_published_sessions() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    let distributor = ContextDistributor::new(manager_with(config(&server), store_with_token()));
    let mut rx = distributor.watch();

    distributor.mount().await.unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_authenticated());
}

#[tokio::test]
async fn context_outliving_manager_reports_error() {
    let distributor = ContextDistributor::new(manager_with(
        sanctum_session::RouteConfig::new("http://localhost:8000"),
        Default::default(),
    ));
    let ctx = distributor.context();
    drop(distributor);

    let err = ctx.check_authentication().await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidSession(_)));
}
