use std::sync::Arc;

use sqlx::SqlitePool;

use crate::clock::Clock;
use crate::settings::Settings;

/// Shared application handles passed to modules when they build their routes.
#[derive(Clone)]
pub struct AppContext {
    pub db: SqlitePool,
    pub settings: Arc<Settings>,
    pub clock: Arc<dyn Clock>,
}

impl AppContext {
    pub fn new(db: SqlitePool, settings: Settings, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            settings: Arc::new(settings),
            clock,
        }
    }

    /// Borrow the context as the narrower lifecycle context.
    pub fn init_ctx(&self) -> crate::module::InitCtx<'_> {
        crate::module::InitCtx {
            settings: &self.settings,
            db: &self.db,
        }
    }
}
