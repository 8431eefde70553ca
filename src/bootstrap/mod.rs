//! Bootstrap orchestration
//!
//! Runs the fixed phase sequence that gets a site ready to build:
//!
//! | # | Phase                 | Effect                                          |
//! |---|-----------------------|-------------------------------------------------|
//! | 1 | load program          | validate inputs, resolve flags                  |
//! | 2 | pre-init hooks        | `LifecycleHooks::on_pre_init`                   |
//! | 3 | delete stale output   | production builds only                          |
//! | 4 | initialize cache      | fingerprint, decide, purge, persist, scaffold   |
//! | 5 | stage templates       | copy runtime templates into the cache           |
//! | 6 | write plugin tables   | client and server dispatch modules              |
//! | 7 | pre-bootstrap hooks   | `LifecycleHooks::on_pre_bootstrap`              |
//! | 8 | resolve extensions    | built-ins plus plugin contributions             |
//! | 9 | create worker pool    | handed back to the caller                       |
//!
//! Phases never overlap. A failure stops the run where it is; nothing done
//! by earlier phases is rolled back.

mod program;

pub use program::{ExecutionMode, Program};

use crate::cache::{
    CacheDecision, CacheDirManager, FileStatusStore, PurgeOutcome, SiteLayout, StatusStore,
};
use crate::config::{Config, EnvToggles, ResolvedFlags};
use crate::error::KilnResult;
use crate::fingerprint::{self, Fingerprint};
use crate::lifecycle::{
    ExtensionsContext, LifecycleHooks, NoopLifecycle, PreBootstrapContext, PreInitContext,
};
use crate::materialize::{self, MaterializedArtifacts};
use crate::output;
use crate::plugin::{self, PluginRecord};
use crate::report::{Phase, Reporter, TracingReporter};
use crate::state::{EventSink, StateEvent, StateHub};
use crate::templates;
use crate::workers::{TaskPoolFactory, WorkerPool, WorkerPoolFactory};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extensions the module resolver always accepts
pub const BUILTIN_EXTENSIONS: &[&str] = &[".mjs", ".js", ".jsx", ".wasm", ".json"];

/// Everything a caller needs after a successful bootstrap
pub struct BootstrapHandle {
    pub state: StateHub,
    pub workers: Arc<dyn WorkerPool>,
    pub fingerprint: Fingerprint,
    pub decision: CacheDecision,
    pub purge: PurgeOutcome,
    pub artifacts: MaterializedArtifacts,
    pub layout: SiteLayout,
    pub flags: ResolvedFlags,
    pub production: bool,
}

impl std::fmt::Debug for BootstrapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapHandle")
            .field("fingerprint", &self.fingerprint)
            .field("decision", &self.decision)
            .field("purge", &self.purge)
            .field("artifacts", &self.artifacts)
            .field("workers", &self.workers.size())
            .finish()
    }
}

/// Sequences a single bootstrap run
pub struct Bootstrap {
    program: Program,
    config: Config,
    plugins: Vec<PluginRecord>,
    env: EnvToggles,
    status_store: Option<Arc<dyn StatusStore>>,
    lifecycle: Arc<dyn LifecycleHooks>,
    reporter: Arc<dyn Reporter>,
    worker_factory: Arc<dyn WorkerPoolFactory>,
    state: StateHub,
}

impl Bootstrap {
    pub fn new(program: Program, config: Config, plugins: Vec<PluginRecord>) -> Self {
        Self {
            program,
            config,
            plugins,
            env: EnvToggles::default(),
            status_store: None,
            lifecycle: Arc::new(NoopLifecycle),
            reporter: Arc::new(TracingReporter),
            worker_factory: Arc::new(TaskPoolFactory::new()),
            state: StateHub::new(),
        }
    }

    /// Build from a program and config, taking plugins from `[[plugins]]`
    pub fn from_config(program: Program, config: Config) -> KilnResult<Self> {
        let plugins = plugin::records_from_entries(&config.plugins, program.site_dir())?;
        Ok(Self::new(program, config, plugins))
    }

    pub fn with_env(mut self, env: EnvToggles) -> Self {
        self.env = env;
        self
    }

    pub fn with_status_store(mut self, store: Arc<dyn StatusStore>) -> Self {
        self.status_store = Some(store);
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn LifecycleHooks>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_worker_factory(mut self, factory: Arc<dyn WorkerPoolFactory>) -> Self {
        self.worker_factory = factory;
        self
    }

    pub fn with_state(mut self, state: StateHub) -> Self {
        self.state = state;
        self
    }

    pub fn layout(&self) -> SiteLayout {
        SiteLayout::from_config(self.program.site_dir(), &self.config)
    }

    /// Run every phase in order
    pub async fn run(self) -> KilnResult<BootstrapHandle> {
        let reporter = Arc::clone(&self.reporter);
        match self.run_phases().await {
            Ok(handle) => Ok(handle),
            Err(e) => {
                reporter.error(&e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn begin(&self, phase: Phase) -> Instant {
        self.reporter.phase_started(phase).await;
        Instant::now()
    }

    async fn finish(&self, phase: Phase, started: Instant) {
        self.reporter.phase_finished(phase, started.elapsed()).await;
    }

    async fn run_phases(self) -> KilnResult<BootstrapHandle> {
        // 1. program and flags
        let started = self.begin(Phase::LoadProgram).await;
        let layout = self.layout();
        let (flags, warnings) = ResolvedFlags::resolve(&self.config.flags, &self.env);
        for warning in self.config.deprecations.iter().chain(&warnings) {
            self.reporter.warn(warning).await;
        }
        let production = self.program.is_production(&self.env);
        debug!(
            "Site {} ({}, production: {}, {} plugins)",
            self.program.site_dir().display(),
            self.program.mode(),
            production,
            self.plugins.len()
        );
        self.finish(Phase::LoadProgram, started).await;

        // 2. pre-init
        let started = self.begin(Phase::PreInit).await;
        self.lifecycle
            .on_pre_init(&PreInitContext {
                program: &self.program,
                plugins: &self.plugins,
            })
            .await?;
        self.finish(Phase::PreInit, started).await;

        // 3. stale output
        let started = self.begin(Phase::DeleteStaleOutput).await;
        if production && !flags.page_build_on_data_changes {
            let removed = output::delete_stale(layout.output_dir()).await?;
            info!("Removed {} stale output files", removed);
        } else {
            debug!("Keeping previous output");
        }
        self.finish(Phase::DeleteStaleOutput, started).await;

        // 4. cache
        let started = self.begin(Phase::InitializeCache).await;
        let (fingerprint, decision, purge) = self.initialize_cache(&layout, &flags).await?;
        self.finish(Phase::InitializeCache, started).await;

        // 5. templates
        let started = self.begin(Phase::StageTemplates).await;
        let templates_dir = self
            .config
            .paths
            .templates_dir
            .as_deref()
            .map(|dir| layout.site_path(dir));
        templates::stage(templates_dir.as_deref(), layout.cache_dir()).await?;
        self.finish(Phase::StageTemplates, started).await;

        // 6. dispatch tables
        let started = self.begin(Phase::WritePluginApis).await;
        let artifacts = materialize::materialize(&self.plugins, &layout).await?;
        self.finish(Phase::WritePluginApis, started).await;

        // 7. pre-bootstrap
        let started = self.begin(Phase::PreBootstrap).await;
        self.lifecycle
            .on_pre_bootstrap(&PreBootstrapContext {
                program: &self.program,
                plugins: &self.plugins,
                layout: &layout,
            })
            .await?;
        self.finish(Phase::PreBootstrap, started).await;

        // 8. extensions
        let started = self.begin(Phase::ResolveExtensions).await;
        let contributed = self
            .lifecycle
            .resolvable_extensions(&ExtensionsContext {
                plugins: &self.plugins,
                builtin: BUILTIN_EXTENSIONS,
            })
            .await?;
        let extensions = merge_extensions(contributed);
        debug!("Resolvable extensions: {}", extensions.join(", "));
        self.state
            .dispatch(StateEvent::ResolvableExtensions(extensions));
        self.finish(Phase::ResolveExtensions, started).await;

        // 9. workers
        let started = self.begin(Phase::CreateWorkers).await;
        let workers = self.worker_factory.create()?;
        self.finish(Phase::CreateWorkers, started).await;

        Ok(BootstrapHandle {
            state: self.state.clone(),
            workers,
            fingerprint,
            decision,
            purge,
            artifacts,
            layout,
            flags,
            production,
        })
    }

    async fn initialize_cache(
        &self,
        layout: &SiteLayout,
        flags: &ResolvedFlags,
    ) -> KilnResult<(Fingerprint, CacheDecision, PurgeOutcome)> {
        let sentinels: Vec<PathBuf> = self
            .config
            .fingerprint
            .sentinel_files
            .iter()
            .map(|p| layout.site_path(p))
            .collect();
        let fingerprint =
            fingerprint::compute(&plugin::version_pairs(&self.plugins), &sentinels).await?;

        let store: Arc<dyn StatusStore> = match &self.status_store {
            Some(store) => Arc::clone(store),
            None => Arc::new(FileStatusStore::new(layout.status_file())),
        };

        let manager = CacheDirManager::new(layout.clone());
        let mut status = store.load().await?;
        status.corrupted = manager.is_corrupt();

        let decision = manager.decide(&status, &fingerprint);
        if decision.is_corruption() {
            self.reporter
                .warn("Found cache artifacts without build output; the last run was interrupted")
                .await;
        }

        let purge = manager
            .apply(&decision, &self.preserved_subtrees(flags))
            .await?;
        if decision.purge {
            self.state.dispatch(StateEvent::DeleteCache {
                corrupted: decision.is_corruption(),
            });
        }

        store.save(&fingerprint).await?;
        self.state
            .dispatch(StateEvent::FingerprintUpdated(fingerprint.clone()));

        manager.scaffold().await?;

        info!(
            "Cache {} ({}, fingerprint {})",
            if decision.purge { "cleared" } else { "kept" },
            decision.reason,
            fingerprint.short()
        );
        Ok((fingerprint, decision, purge))
    }

    /// Cache-relative subtrees spared by a purge
    fn preserved_subtrees(&self, flags: &ResolvedFlags) -> Vec<PathBuf> {
        let mut preserve = Vec::new();
        if flags.preserve_download_cache {
            preserve.push(self.config.cache.download_cache_dir.clone());
        }
        if flags.preserve_compiler_cache {
            preserve.push(self.config.cache.compiler_cache_dir.clone());
        }
        preserve
    }
}

/// Built-ins first, then plugin contributions; duplicates dropped
fn merge_extensions(contributed: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = BUILTIN_EXTENSIONS.iter().map(|e| e.to_string()).collect();
    for ext in contributed {
        let ext = ext.trim();
        if ext.is_empty() {
            continue;
        }
        let ext = if ext.starts_with('.') {
            ext.to_string()
        } else {
            format!(".{}", ext)
        };
        if !merged.contains(&ext) {
            merged.push(ext);
        }
    }
    merged
}
