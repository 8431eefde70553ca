//! Lifecycle hook interface
//!
//! One method per bootstrap phase, each taking a typed context. The
//! mechanism that actually runs plugin code lives behind this trait and is
//! not part of kiln; hook implementations are trusted to either complete or
//! return an error that aborts the bootstrap.

use crate::bootstrap::Program;
use crate::cache::SiteLayout;
use crate::error::KilnResult;
use crate::plugin::PluginRecord;
use async_trait::async_trait;
use tracing::debug;

/// Context for the pre-init hook, before any cache work
#[derive(Debug, Clone, Copy)]
pub struct PreInitContext<'a> {
    pub program: &'a Program,
    pub plugins: &'a [PluginRecord],
}

/// Context for the pre-bootstrap hook, after dispatch tables are written
#[derive(Debug, Clone, Copy)]
pub struct PreBootstrapContext<'a> {
    pub program: &'a Program,
    pub plugins: &'a [PluginRecord],
    pub layout: &'a SiteLayout,
}

/// Context for collecting resolvable file extensions
#[derive(Debug, Clone, Copy)]
pub struct ExtensionsContext<'a> {
    pub plugins: &'a [PluginRecord],
    /// Built-in extensions already accepted
    pub builtin: &'a [&'static str],
}

/// Dispatches lifecycle phases to plugins
#[async_trait]
pub trait LifecycleHooks: Send + Sync {
    /// Runs once before the cache is examined
    async fn on_pre_init(&self, ctx: &PreInitContext<'_>) -> KilnResult<()>;

    /// Runs once after directories and dispatch tables are ready
    async fn on_pre_bootstrap(&self, ctx: &PreBootstrapContext<'_>) -> KilnResult<()>;

    /// Extra file extensions contributed by plugins
    async fn resolvable_extensions(&self, ctx: &ExtensionsContext<'_>) -> KilnResult<Vec<String>>;
}

/// Hooks that do nothing, for sites without executable plugin code
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLifecycle;

#[async_trait]
impl LifecycleHooks for NoopLifecycle {
    async fn on_pre_init(&self, ctx: &PreInitContext<'_>) -> KilnResult<()> {
        debug!("pre-init: {} plugins", ctx.plugins.len());
        Ok(())
    }

    async fn on_pre_bootstrap(&self, ctx: &PreBootstrapContext<'_>) -> KilnResult<()> {
        debug!("pre-bootstrap: {} plugins", ctx.plugins.len());
        Ok(())
    }

    async fn resolvable_extensions(&self, _ctx: &ExtensionsContext<'_>) -> KilnResult<Vec<String>> {
        Ok(vec![])
    }
}
