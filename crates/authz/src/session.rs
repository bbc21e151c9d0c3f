//! Server-side sessions keyed by a random id carried in a cookie.
//!
//! A session record only comes into existence the first time a handler writes
//! to it; the cookie is issued on that response. Reading from a session that
//! was never written is cheap and leaves no trace in the store.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use catalog_kernel::settings::AuthSettings;
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::permission::Principal;

/// Ten years; keeps expiry arithmetic far away from overflow.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
struct SessionRecord {
    data: HashMap<String, Value>,
    principal: Option<Principal>,
    expires_at: DateTime<Utc>,
}

impl SessionRecord {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// In-memory session store shared by every request.
#[derive(Clone)]
pub struct SessionStore {
    records: Arc<RwLock<HashMap<Uuid, SessionRecord>>>,
    cookie_name: Arc<str>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(settings: &AuthSettings) -> Self {
        let ttl_secs = settings.session_ttl_secs.min(MAX_TTL_SECS);
        Self {
            records: Arc::default(),
            cookie_name: Arc::from(settings.session_cookie.as_str()),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Number of records currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every expired record and report how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.is_live(now));
        before - records.len()
    }

    async fn is_live(&self, id: Uuid) -> bool {
        let now = Utc::now();
        self.records
            .read()
            .await
            .get(&id)
            .is_some_and(|record| record.is_live(now))
    }

    async fn read<R>(&self, id: Uuid, f: impl FnOnce(&SessionRecord) -> R) -> Option<R> {
        let now = Utc::now();
        self.records
            .read()
            .await
            .get(&id)
            .filter(|record| record.is_live(now))
            .map(f)
    }

    async fn write<R>(&self, id: Uuid, f: impl FnOnce(&mut SessionRecord) -> R) -> R {
        let now = Utc::now();
        let mut records = self.records.write().await;
        let record = records
            .entry(id)
            .and_modify(|record| {
                if !record.is_live(now) {
                    record.data.clear();
                    record.principal = None;
                    record.expires_at = now + self.ttl;
                }
            })
            .or_insert_with(|| SessionRecord {
                data: HashMap::new(),
                principal: None,
                expires_at: now + self.ttl,
            });
        f(record)
    }

    fn cookie(&self, id: Uuid) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name,
            id,
            self.ttl.num_seconds()
        ))
        .ok()
    }

    fn removal_cookie(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            self.cookie_name
        ))
        .ok()
    }
}

/// Handle to the current request's session.
#[derive(Clone)]
pub struct Session {
    id: Arc<RwLock<Uuid>>,
    store: SessionStore,
}

impl Session {
    fn new(id: Uuid, store: SessionStore) -> Self {
        Self {
            id: Arc::new(RwLock::new(id)),
            store,
        }
    }

    pub async fn id(&self) -> Uuid {
        *self.id.read().await
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let id = self.id().await;
        let value = self
            .store
            .read(id, |record| record.data.get(key).cloned())
            .await
            .flatten();
        match value {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn insert<T: Serialize>(&self, key: &str, value: T) -> anyhow::Result<()> {
        let value = serde_json::to_value(value)?;
        let id = self.id().await;
        self.store
            .write(id, |record| {
                record.data.insert(key.to_string(), value);
            })
            .await;
        Ok(())
    }

    pub async fn principal(&self) -> Option<Principal> {
        let id = self.id().await;
        self.store
            .read(id, |record| record.principal.clone())
            .await
            .flatten()
    }

    /// Attach `principal` to the session under a fresh id, keeping its data.
    pub async fn login(&self, principal: Principal) {
        let mut id = self.id.write().await;
        let fresh = Uuid::new_v4();
        let now = Utc::now();
        let mut records = self.store.records.write().await;
        let data = records
            .remove(&id)
            .filter(|record| record.is_live(now))
            .map(|record| record.data)
            .unwrap_or_default();
        records.insert(
            fresh,
            SessionRecord {
                data,
                principal: Some(principal),
                expires_at: now + self.store.ttl,
            },
        );
        *id = fresh;
    }

    /// Discard the session and everything in it.
    pub async fn flush(&self) {
        let mut id = self.id.write().await;
        self.store.records.write().await.remove(&id);
        *id = Uuid::new_v4();
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Middleware installing a [`Session`] into the request extensions and
/// issuing or clearing the session cookie on the way out.
pub async fn session_middleware(
    State(store): State<SessionStore>,
    mut request: Request,
    next: Next,
) -> Response {
    let incoming = cookie_value(request.headers(), store.cookie_name())
        .and_then(|value| Uuid::parse_str(&value).ok());

    let id = match incoming {
        Some(id) if store.is_live(id).await => id,
        _ => Uuid::new_v4(),
    };
    let session = Session::new(id, store.clone());
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    let current = session.id().await;
    let live = store.is_live(current).await;
    let header_value = if live && incoming != Some(current) {
        store.cookie(current)
    } else if !live && incoming.is_some() {
        store.removal_cookie()
    } else {
        None
    };
    if let Some(value) = header_value {
        response.headers_mut().append(header::SET_COOKIE, value);
    }

    response
}
