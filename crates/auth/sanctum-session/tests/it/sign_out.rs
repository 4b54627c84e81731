use crate::common::*;
use sanctum_auth::{AuthError, MemoryStore, SecureStore};
use sanctum_session::{AuthenticationStatus, SessionManager, SessionUser, SignOutTokenPolicy};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_logout(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/logout"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(status))
        .expect(1)
        .mount(server)
        .await;
}

/// Memory-backed store whose deletes always fail
#[derive(Clone, Debug)]
struct UndeletableStore(MemoryStore);

impl SecureStore for UndeletableStore {
    fn set_secret(&self, name: &str, value: &[u8]) -> Result<(), AuthError> {
        self.0.set_secret(name, value)
    }
    fn get_secret(&self, name: &str) -> Result<Option<Vec<u8>>, AuthError> {
        self.0.get_secret(name)
    }
    fn delete_secret(&self, _: &str) -> Result<(), AuthError> {
        Err(AuthError::Storage("keychain is read-only".into()))
    }
}

async fn signed_in(server: &MockServer, policy: SignOutTokenPolicy) -> SessionManager<MemoryStore> {
    mount_user(server).await;
    let manager = manager_with(
        config(server).with_sign_out_token_policy(policy),
        store_with_token(),
    );
    assert!(manager.check_authentication().await.unwrap());
    manager
}

#[tokio::test]
async fn success_marks_signed_out_and_clears_token() {
    let server = MockServer::start().await;
    mount_logout(&server, 204).await;
    let manager = signed_in(&server, SignOutTokenPolicy::default()).await;

    assert!(manager.sign_out().await.unwrap());

    let session = manager.session();
    assert_eq!(session.status(), AuthenticationStatus::Unauthenticated);
    assert_eq!(session.user(), &SessionUser::SignedOut);
    assert!(!manager.credentials().has_token());
}

#[tokio::test]
async fn keep_policy_leaves_token_in_place() {
    let server = MockServer::start().await;
    mount_logout(&server, 204).await;
    let manager = signed_in(&server, SignOutTokenPolicy::Keep).await;

    assert!(manager.sign_out().await.unwrap());
    assert_eq!(manager.session().user(), &SessionUser::SignedOut);
    assert!(manager.credentials().has_token());
}

#[tokio::test]
async fn transport_failure_keeps_session_and_token() {
    let server = MockServer::start().await;
    mount_logout(&server, 500).await;
    let manager = signed_in(&server, SignOutTokenPolicy::ClearOnSuccess).await;
    let before = manager.session();

    let err = manager.sign_out().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(manager.session(), before);
    assert!(manager.credentials().has_token());
}

#[tokio::test]
async fn clear_always_drops_token_even_on_failure() {
    let server = MockServer::start().await;
    mount_logout(&server, 500).await;
    let manager = signed_in(&server, SignOutTokenPolicy::ClearAlways).await;

    assert!(manager.sign_out().await.is_err());
    assert!(manager.session().is_authenticated());
    assert!(!manager.credentials().has_token());
}

#[tokio::test]
async fn already_signed_out_demotes() {
    let server = MockServer::start().await;
    mount_logout(&server, 401).await;
    let manager = signed_in(&server, SignOutTokenPolicy::ClearOnSuccess).await;

    assert!(!manager.sign_out().await.unwrap());
    let session = manager.session();
    assert_eq!(session.status(), AuthenticationStatus::Unauthenticated);
    assert_eq!(session.user(), &SessionUser::None);
    assert!(manager.credentials().has_token());
}

#[tokio::test]
async fn clear_failure_after_success_still_signs_out() {
    let server = MockServer::start().await;
    mount_logout(&server, 204).await;
    mount_user(&server).await;
    let manager =
        SessionManager::new(config(&server), UndeletableStore(store_with_token())).unwrap();
    assert!(manager.check_authentication().await.unwrap());

    assert!(manager.sign_out().await.unwrap());

    let session = manager.session();
    assert_eq!(session.status(), AuthenticationStatus::Unauthenticated);
    assert_eq!(session.user(), &SessionUser::SignedOut);
    assert!(manager.credentials().has_token());
}
