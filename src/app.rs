//! Application assembly: module registration, lifecycle and serving.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use catalog_authz::SessionStore;
use catalog_kernel::settings::Settings;
use catalog_kernel::{AppContext, ModuleRegistry, SystemClock};

use crate::modules;

pub struct Application {
    registry: ModuleRegistry,
    ctx: AppContext,
    sessions: SessionStore,
}

impl Application {
    /// Register the core and custom modules against an existing context.
    pub fn new(ctx: AppContext) -> anyhow::Result<Self> {
        let sessions = SessionStore::new(&ctx.settings.auth);

        let mut registry = ModuleRegistry::new();
        registry.register_core(catalog_db::create_module(ctx.db.clone()))?;
        registry.register_core(catalog_authz::create_module(sessions.clone()))?;
        modules::register_all(&mut registry)?;

        Ok(Self {
            registry,
            ctx,
            sessions,
        })
    }

    /// Open the configured database and use the system clock.
    pub async fn build(settings: Settings) -> anyhow::Result<Self> {
        let db = catalog_db::connect(&settings.database).await?;
        Self::new(AppContext::new(db, settings, Arc::new(SystemClock)))
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Apply pending migrations from every module.
    pub async fn migrate(&self) -> anyhow::Result<usize> {
        let migrations = self.registry.collect_migrations();
        catalog_db::migrate(&self.ctx.db, &migrations).await
    }

    pub fn router(&self) -> Router {
        catalog_http::build_router(&self.registry, &self.ctx, self.sessions.clone())
    }

    /// Init, migrate, start, serve until a shutdown signal, then stop.
    pub async fn run(self) -> anyhow::Result<()> {
        let init_ctx = self.ctx.init_ctx();

        self.registry.init_core_modules(&init_ctx).await?;
        self.registry.init_custom_modules(&init_ctx).await?;

        let applied = self.migrate().await.context("failed to apply migrations")?;
        tracing::info!(applied, "migrations complete");

        self.registry.start_core_modules(&init_ctx).await?;
        self.registry.start_custom_modules(&init_ctx).await?;

        let served = catalog_http::start_server(self.router(), &self.ctx.settings.server).await;

        self.registry.stop_custom_modules().await?;
        self.registry.stop_core_modules().await?;

        served
    }
}
