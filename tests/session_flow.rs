use std::sync::{Arc, Mutex};

use tourney_board::{
    config::PublicBucketConfig,
    feedback::{Feedback, Impact, Notification},
    session::{validate_token, LoginError, MemorySecureStorage, SecureStorage, Session, ADMIN_TOKEN_KEY},
    storage::MemoryStorage,
    StoreError,
};

const TOKEN: &str = "AKID:secret:storage.example.net:ru-central1:cups";

#[derive(Debug, Clone, Default)]
struct RecordingFeedback {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingFeedback {
    fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

impl Feedback for RecordingFeedback {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }

    fn impact(&self, _impact: Impact) {}

    fn selection_changed(&self) {}
}

fn public_config() -> PublicBucketConfig {
    PublicBucketConfig::new("storage.example.net", "ru-central1", "public-cups")
}

#[tokio::test]
async fn login_saves_the_token_and_unlocks_writes() {
    let backend = MemoryStorage::with_bucket("cups");
    backend.create_bucket("public-cups");
    let secure = MemorySecureStorage::new();
    let feedback = RecordingFeedback::default();
    let mut session = Session::new(secure.clone(), feedback.clone());

    let guest = session.handle(&backend, &public_config()).unwrap();
    assert!(matches!(guest.admin(), Err(StoreError::Unauthorized)));

    session.login(&format!("  {}\n", TOKEN), &backend).await.unwrap();

    assert!(session.is_admin());
    assert_eq!(
        secure.get_item(ADMIN_TOKEN_KEY).await.unwrap().as_deref(),
        Some(TOKEN)
    );
    assert_eq!(feedback.notifications(), vec![Notification::Success]);

    let admin = session.handle(&backend, &public_config()).unwrap();
    assert_eq!(admin.admin().unwrap().bucket(), "cups");
}

#[tokio::test]
async fn blank_tokens_are_rejected_without_a_network_call() {
    let backend = MemoryStorage::with_bucket("cups");
    let feedback = RecordingFeedback::default();
    let mut session = Session::new(MemorySecureStorage::new(), feedback.clone());

    assert!(matches!(
        session.login("   ", &backend).await,
        Err(LoginError::EmptyToken)
    ));
    assert_eq!(backend.calls().total(), 0);
    assert!(feedback.notifications().is_empty());
}

#[tokio::test]
async fn invalid_tokens_keep_the_session_as_guest() {
    let backend = MemoryStorage::with_bucket("cups");
    let secure = MemorySecureStorage::new();
    let feedback = RecordingFeedback::default();
    let mut session = Session::new(secure.clone(), feedback.clone());

    // Wrong bucket: the existence check fails.
    assert!(matches!(
        session
            .login("AKID:secret:storage.example.net:eu:other", &backend)
            .await,
        Err(LoginError::InvalidToken)
    ));
    // Wrong shape: never reaches the backend.
    assert!(matches!(
        session.login("not-a-token", &backend).await,
        Err(LoginError::InvalidToken)
    ));

    assert!(!session.is_admin());
    assert_eq!(secure.get_item(ADMIN_TOKEN_KEY).await.unwrap(), None);
    assert_eq!(
        feedback.notifications(),
        vec![Notification::Error, Notification::Error]
    );
    assert_eq!(backend.calls().head_bucket, 1);
}

#[tokio::test]
async fn storage_failures_abort_the_login() {
    let backend = MemoryStorage::with_bucket("cups");
    let feedback = RecordingFeedback::default();
    let mut session = Session::new(MemorySecureStorage::unavailable(), feedback.clone());

    assert!(matches!(
        session.login(TOKEN, &backend).await,
        Err(LoginError::Storage(_))
    ));
    assert!(!session.is_admin());
    assert_eq!(feedback.notifications(), vec![Notification::Error]);
}

#[tokio::test]
async fn logout_forgets_the_token() {
    let backend = MemoryStorage::with_bucket("cups");
    let secure = MemorySecureStorage::new();
    let feedback = RecordingFeedback::default();
    let mut session = Session::new(secure.clone(), feedback.clone());
    session.login(TOKEN, &backend).await.unwrap();

    session.logout().await.unwrap();

    assert!(!session.is_admin());
    assert_eq!(secure.get_item(ADMIN_TOKEN_KEY).await.unwrap(), None);
    assert_eq!(
        feedback.notifications(),
        vec![Notification::Success, Notification::Success]
    );

    let mut restarted = Session::new(secure, RecordingFeedback::default());
    restarted.restore().await;
    assert!(!restarted.is_admin());
}

#[tokio::test]
async fn failed_logout_keeps_the_admin_signed_in() {
    let backend = MemoryStorage::with_bucket("cups");
    let secure = MemorySecureStorage::new();
    let mut session = Session::new(secure.clone(), RecordingFeedback::default());
    session.login(TOKEN, &backend).await.unwrap();

    secure.set_available(false);
    assert!(session.logout().await.is_err());
    assert!(session.is_admin());
}

#[tokio::test]
async fn saved_sessions_survive_a_restart() {
    let backend = MemoryStorage::with_bucket("cups");
    let secure = MemorySecureStorage::new();
    let mut session = Session::new(secure.clone(), RecordingFeedback::default());
    session.login(TOKEN, &backend).await.unwrap();

    let mut restarted = Session::new(secure, RecordingFeedback::default());
    restarted.restore().await;
    assert!(restarted.is_admin());
    assert_eq!(restarted.credential(), session.credential());
}

#[tokio::test]
async fn token_validation_never_fails() {
    let backend = MemoryStorage::with_bucket("cups");
    assert!(validate_token(TOKEN, &backend).await);
    assert!(!validate_token("a:b:c", &backend).await);
    assert!(!validate_token("AKID:secret:host:eu:missing", &backend).await);

    backend.set_offline(true);
    assert!(!validate_token(TOKEN, &backend).await);
}
