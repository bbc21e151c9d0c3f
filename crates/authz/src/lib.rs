//! Authorization primitives: permissions, the authenticated principal, and
//! the cookie-keyed server-side session store.

pub mod permission;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use catalog_kernel::{InitCtx, Module};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub use permission::{AuthError, Permission, Principal};
pub use session::{session_middleware, Session, SessionStore};

/// Core module that keeps the session store tidy.
pub struct AuthzModule {
    sessions: SessionStore,
    purge_task: Mutex<Option<JoinHandle<()>>>,
}

impl AuthzModule {
    pub fn new(sessions: SessionStore) -> Self {
        Self {
            sessions,
            purge_task: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Module for AuthzModule {
    fn name(&self) -> &'static str {
        "authz"
    }

    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let every = Duration::from_secs(ctx.settings.auth.purge_interval_secs.max(1));
        let sessions = self.sessions.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = sessions.purge_expired().await;
                if purged > 0 {
                    tracing::debug!(target: "catalog-authz", purged, "expired sessions purged");
                }
            }
        });

        *self.purge_task.lock().await = Some(handle);
        tracing::info!(module = self.name(), interval_secs = every.as_secs(), "session purge task started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        if let Some(handle) = self.purge_task.lock().await.take() {
            handle.abort();
        }
        tracing::info!(module = self.name(), "session purge task stopped");
        Ok(())
    }
}

/// Create the core authorization module
pub fn create_module(sessions: SessionStore) -> Arc<dyn Module> {
    Arc::new(AuthzModule::new(sessions))
}
