//! Cookie-keyed sessions holding the per-session request counter

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "H2CSESSIONID";

#[derive(Debug)]
struct SessionEntry {
    counter: Arc<AtomicU64>,
    last_access: Instant,
}

/// A live session as seen by one request.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session identifier carried in the cookie.
    pub id: Uuid,
    /// `true` when this request created the session.
    pub is_new: bool,
    counter: Arc<AtomicU64>,
}

impl Session {
    /// Atomically increment the counter and return the new value.
    pub fn next_request_number(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// `Set-Cookie` value binding the client to this session.
    pub fn cookie(&self, path: &str) -> String {
        let path = if path.is_empty() { "/" } else { path };
        format!("{SESSION_COOKIE}={}; Path={path}; HttpOnly", self.id)
    }
}

/// Sessions by id, expiring after a period of inactivity.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    /// Empty store whose sessions expire after `ttl` without requests
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Look up the session for `id`, or start a new one.
    ///
    /// Unknown and expired ids both get a fresh session with a zero counter.
    pub async fn touch(&self, id: Option<Uuid>) -> Session {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        if let Some(id) = id {
            match sessions.get_mut(&id) {
                Some(entry) if now.duration_since(entry.last_access) <= self.ttl => {
                    entry.last_access = now;
                    return Session {
                        id,
                        is_new: false,
                        counter: Arc::clone(&entry.counter),
                    };
                }
                Some(_) => {
                    tracing::debug!(session = %id, "Session expired");
                    sessions.remove(&id);
                }
                None => {}
            }
        }

        let id = Uuid::new_v4();
        let counter = Arc::new(AtomicU64::new(0));
        sessions.insert(
            id,
            SessionEntry {
                counter: Arc::clone(&counter),
                last_access: now,
            },
        );
        tracing::debug!(session = %id, "Session created");

        Session {
            id,
            is_new: true,
            counter,
        }
    }

    /// Drop every session idle for longer than the TTL.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_access) <= self.ttl);
        before - sessions.len()
    }

    /// Number of stored sessions, expired ones included until purged
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are stored
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Purge expired sessions every `interval` until the task is aborted.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let purged = store.purge_expired().await;
                if purged > 0 {
                    tracing::debug!(purged, "Swept expired sessions");
                }
            }
        })
    }
}

/// Session id from the request's cookies, if present and well-formed.
///
/// HTTP/2 clients may split cookies across several `cookie` fields.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim().trim_matches('"')).ok())
}
