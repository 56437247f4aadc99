//! Integration tests: admission and registry used together the way the
//! gate uses them, behind one lock.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gatekeep_protocol::IdentityKey;
use gatekeep_session::{
    Admission, AdmissionConfig, Arrival, JoinAdmissionController, SessionConfig,
    SessionRegistry,
};
use gatekeep_transport::ConnectionId;
use tokio::sync::Mutex;

struct Lobby {
    admission: JoinAdmissionController,
    sessions: SessionRegistry,
}

fn lobby(max_joins: u32) -> Lobby {
    Lobby {
        admission: JoinAdmissionController::new(AdmissionConfig {
            max_joins_per_second: max_joins,
        }),
        sessions: SessionRegistry::new(SessionConfig::default()),
    }
}

fn key(name: &str) -> IdentityKey {
    IdentityKey::new(name).unwrap()
}

fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Admit-then-create under one lock, the unit the gate makes atomic.
async fn join(lobby: &Mutex<Lobby>, name: &str, conn: u64, now: SystemTime) -> Admission {
    let mut guard = lobby.lock().await;
    let Lobby { admission, sessions } = &mut *guard;
    let identity = key(name);
    let outcome = admission.try_admit(sessions, &identity, now);
    if outcome.is_admitted() {
        sessions
            .create(identity, now, Arrival::new(ConnectionId::new(conn)))
            .expect("admission guarantees no session exists");
    }
    outcome
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_for_same_identity_leave_one_session() {
    let lobby = Arc::new(Mutex::new(lobby(u32::MAX)));

    let mut tasks = Vec::new();
    for conn in 1..=16 {
        let lobby = Arc::clone(&lobby);
        tasks.push(tokio::spawn(async move {
            join(&lobby, "Eve", conn, at(42)).await
        }));
    }
    for task in tasks {
        task.await.expect("join task panicked");
    }

    let guard = lobby.lock().await;
    assert_eq!(guard.sessions.len(), 1);
    assert!(guard.sessions.get(&key("eve")).is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_never_exceed_rate_limit() {
    let lobby = Arc::new(Mutex::new(lobby(3)));

    let mut tasks = Vec::new();
    for conn in 0..10u64 {
        let lobby = Arc::clone(&lobby);
        tasks.push(tokio::spawn(async move {
            join(&lobby, &format!("player{conn}"), conn, at(10)).await
        }));
    }

    let mut admitted = 0;
    for task in tasks {
        if task.await.expect("join task panicked").is_admitted() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 3);
    assert_eq!(lobby.lock().await.sessions.len(), 3);
}

#[tokio::test]
async fn test_pending_session_is_replaced_but_authenticated_one_is_kept() {
    let lobby = Mutex::new(lobby(3));

    assert!(join(&lobby, "bob", 1, at(1)).await.is_admitted());
    let second = join(&lobby, "BOB", 2, at(2)).await;
    assert!(matches!(second, Admission::Admit { evicted: Some(ref old) } if old.conn == ConnectionId::new(1)));

    lobby.lock().await.sessions.authenticate(&key("bob")).unwrap();

    let third = join(&lobby, "bob", 3, at(3)).await;
    assert!(matches!(third, Admission::RejectDuplicateOnline));
    let guard = lobby.lock().await;
    assert_eq!(guard.sessions.get(&key("bob")).unwrap().conn, ConnectionId::new(2));
}
