use crate::core::interfaces::{BundlerRunner, ScriptRebuilder, StagingCompiler};
use crate::core::models::{
    AssetKind, BuildContext, BuildMode, EntryReferences, H5BuildConfig, Target, WalkStats,
};
use crate::infrastructure::processors::classifier::classify_path;
use crate::infrastructure::processors::reference_extractor::extract_entry_references;
use crate::infrastructure::processors::transformer::OxcTransformer;
use crate::infrastructure::{
    file_system, CommandBundlerRunner, DependencyWalker, MirrorStagingCompiler, PathResolver,
};
use crate::utils::{DuplexError, Logger, ProcessType, Result, Timer};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the generated module that picks a target at runtime
pub const DISPATCHER_FILE: &str = "index.js";

/// Environment flag the dispatcher reads at runtime
pub const RUNTIME_ENV_FLAG: &str = "TARO_ENV";

/// Rebuilds the H5 bundle through the external bundler
pub struct H5ScriptBuilder {
    ctx: Arc<BuildContext>,
    runner: Arc<dyn BundlerRunner>,
}

impl H5ScriptBuilder {
    pub fn new(ctx: Arc<BuildContext>, runner: Arc<dyn BundlerRunner>) -> Self {
        Self { ctx, runner }
    }
}

#[async_trait]
impl ScriptRebuilder for H5ScriptBuilder {
    async fn rebuild_h5_script(&self) -> Result<()> {
        let config = H5BuildConfig::from_context(&self.ctx);
        Logger::info("Bundling H5 component library");
        self.runner.run(&self.ctx.app_root, &config).await
    }
}

/// Outcome of a full build; a `None` target failed and was logged
#[derive(Debug, Default)]
pub struct BuildReport {
    pub dispatcher: Option<PathBuf>,
    pub weapp: Option<WalkStats>,
    pub h5: Option<WalkStats>,
}

/// Builds the component library for both targets and keeps the outputs in sync
pub struct LibraryBuildService {
    ctx: Arc<BuildContext>,
    stager: Arc<dyn StagingCompiler>,
    script_builder: Arc<H5ScriptBuilder>,
    transformer: OxcTransformer,
}

impl LibraryBuildService {
    pub fn new(
        ctx: BuildContext,
        stager: Arc<dyn StagingCompiler>,
        runner: Arc<dyn BundlerRunner>,
    ) -> Self {
        let ctx = Arc::new(ctx);
        Self {
            script_builder: Arc::new(H5ScriptBuilder::new(ctx.clone(), runner)),
            ctx,
            stager,
            transformer: OxcTransformer::new(),
        }
    }

    /// Mirror staging and the configured `h5.runner` command
    pub fn with_defaults(ctx: BuildContext) -> Self {
        let stager = Arc::new(MirrorStagingCompiler::new(&ctx.source_dir, &ctx.temp_dir));
        let runner = Arc::new(CommandBundlerRunner::new(
            ctx.project_config.h5.runner.clone(),
            &ctx.temp_dir,
        ));
        Self::new(ctx, stager, runner)
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    /// Capability handed to extra-watch handlers
    pub fn script_rebuilder(&self) -> Arc<dyn ScriptRebuilder> {
        self.script_builder.clone()
    }

    /// Full build: dispatcher module, then the mini-program and H5 targets.
    ///
    /// A failing target is logged and does not stop the other one.
    pub async fn build(&self) -> BuildReport {
        let _timer = Timer::start("Library build");
        let mut report = BuildReport::default();

        match self.write_dispatcher() {
            Ok(path) => report.dispatcher = Some(path),
            Err(e) => Logger::error(&format!("Failed to write dispatcher module: {}", e)),
        }

        report.weapp = Self::finish_target(Target::Weapp, self.build_weapp());
        report.h5 = Self::finish_target(Target::H5, self.build_h5().await);
        report
    }

    fn finish_target(target: Target, result: Result<WalkStats>) -> Option<WalkStats> {
        match result {
            Ok(stats) => {
                Logger::walk_summary(
                    target.display_name(),
                    stats.processed,
                    stats.copied,
                    stats.failed.len(),
                );
                Some(stats)
            }
            Err(DuplexError::MissingEntry(path)) => {
                Logger::error(&format!(
                    "Entry file {} does not exist, skipping {} build",
                    path.display(),
                    target.display_name()
                ));
                None
            }
            Err(e) => {
                Logger::error(&format!("{} build failed: {}", target.display_name(), e));
                None
            }
        }
    }

    /// Write `<output>/index.js`, which re-exports one target based on the runtime env
    pub fn write_dispatcher(&self) -> Result<PathBuf> {
        let index_name = self.ctx.index_name();
        let h5 = Target::H5.output_name();
        let weapp = Target::Weapp.output_name();
        let content = format!(
            "if (process.env.{flag} === '{h5}') {{\n  module.exports = require('./{h5}/{index}')\n  module.exports.default = module.exports\n}} else {{\n  module.exports = require('./{weapp}/{index}')\n  module.exports.default = module.exports\n}}\n",
            flag = RUNTIME_ENV_FLAG,
            h5 = h5,
            weapp = weapp,
            index = index_name,
        );

        let path = self.ctx.output_dir.join(DISPATCHER_FILE);
        file_system::write_file(&path, &content)?;
        Logger::process(ProcessType::Generate, "dispatcher", &self.ctx.relative_to_app(&path));
        Ok(path)
    }

    /// Mini-program target: copy the entry verbatim and walk everything it exposes
    pub fn build_weapp(&self) -> Result<WalkStats> {
        Logger::target_start(Target::Weapp.display_name());
        let ctx = &self.ctx;
        if !ctx.entry_path.is_file() {
            return Err(DuplexError::MissingEntry(ctx.entry_path.clone()));
        }

        let output_dir = ctx.target_output_dir(Target::Weapp);
        let mut walker = DependencyWalker::new(&ctx.app_root, Target::Weapp);
        let entry = extract_entry_references(&self.transformer, &ctx.entry_path, walker.resolver())?;

        Logger::process(ProcessType::Copy, "found", &ctx.relative_to_app(&ctx.entry_path));
        file_system::copy_file(&ctx.entry_path, &output_dir.join(&ctx.entry_file_name))?;

        Self::walk_components(&mut walker, &entry, &ctx.source_dir, &output_dir)?;
        Self::walk_entry_styles(&mut walker, &entry, &ctx.source_dir, &output_dir)?;
        Ok(walker.into_stats())
    }

    /// H5 target: stage the sources, then either bundle or copy the component graph
    pub async fn build_h5(&self) -> Result<WalkStats> {
        Logger::target_start(Target::H5.display_name());
        self.stager.build_temp().await?;

        match self.ctx.mode {
            BuildMode::Script => {
                self.script_builder.rebuild_h5_script().await?;
                Ok(WalkStats::default())
            }
            BuildMode::Lib => self.build_h5_lib(),
        }
    }

    fn build_h5_lib(&self) -> Result<WalkStats> {
        let ctx = &self.ctx;
        let resolver = PathResolver::new(Some(Target::H5.output_name()));
        let temp_entry = resolver.resolve_script(&ctx.temp_dir, ctx.index_specifier());
        if !temp_entry.is_file() {
            return Err(DuplexError::MissingEntry(temp_entry));
        }

        let output_dir = ctx.target_output_dir(Target::H5);
        let mut walker = DependencyWalker::with_resolver(&ctx.app_root, resolver.clone());
        let entry = extract_entry_references(&self.transformer, &temp_entry, walker.resolver())?;

        // The dispatcher requires `./h5/<index>`, whichever platform variant was picked
        let file_name = match temp_entry.extension() {
            Some(ext) => format!("{}.{}", ctx.index_name(), ext.to_string_lossy()),
            None => ctx.index_name(),
        };
        Logger::process(ProcessType::Generate, "entry", &ctx.relative_to_app(&temp_entry));
        file_system::write_file(&output_dir.join(file_name), &entry.code)?;

        Self::walk_components(&mut walker, &entry, &ctx.temp_dir, &output_dir)?;

        // Entry stylesheets are published next to the dispatcher, not below h5/
        let mut style_walker = DependencyWalker::with_resolver(&ctx.app_root, resolver);
        Self::walk_entry_styles(&mut style_walker, &entry, &ctx.temp_dir, &ctx.output_dir)?;

        let mut stats = walker.into_stats();
        stats.absorb(style_walker.into_stats());
        Ok(stats)
    }

    /// Copy and walk the components an entry file exposes
    fn walk_components(
        walker: &mut DependencyWalker,
        entry: &EntryReferences,
        source_root: &Path,
        output_root: &Path,
    ) -> Result<()> {
        let components = existing(entry.component_paths(), "component");
        for component in &components {
            walker.materialize(component, source_root, output_root)?;
        }
        walker.walk(&components, source_root, output_root);
        Ok(())
    }

    fn walk_entry_styles(
        walker: &mut DependencyWalker,
        entry: &EntryReferences,
        source_root: &Path,
        output_root: &Path,
    ) -> Result<()> {
        let styles = existing(entry.style_files.clone(), "stylesheet");
        for style in &styles {
            walker.materialize(style, source_root, output_root)?;
        }
        walker.walk_styles(&styles, source_root, output_root);
        Ok(())
    }

    /// Whether `path` is the library entry of either target
    fn is_entry(&self, path: &Path) -> bool {
        let ctx = &self.ctx;
        path == ctx.entry_path
            || PathResolver::new(Some(Target::H5.output_name()))
                .resolve_script(&ctx.source_dir, ctx.index_specifier())
                == path
    }

    /// Bring both targets up to date after `path` was added or changed
    pub async fn sync_file(&self, path: &Path) -> Result<()> {
        let is_entry = self.is_entry(path);

        let weapp = if is_entry {
            self.build_weapp().map(|_| ())
        } else {
            self.sync_target(Target::Weapp, path).map(|_| ())
        };
        if let Err(e) = &weapp {
            Logger::error(&format!("mini-program sync failed for {}: {}", path.display(), e));
        }

        let h5 = self.sync_h5(path, is_entry).await;
        weapp.and(h5)
    }

    async fn sync_h5(&self, path: &Path, is_entry: bool) -> Result<()> {
        self.stager.process_file(path)?;

        match self.ctx.mode {
            BuildMode::Script => self.script_builder.rebuild_h5_script().await,
            BuildMode::Lib if is_entry => self.build_h5_lib().map(|_| ()),
            BuildMode::Lib => match self.ctx.rebase_source_path(path, &self.ctx.temp_dir) {
                Some(staged) => self.sync_target(Target::H5, &staged).map(|_| ()),
                None => Ok(()),
            },
        }
    }

    /// Copy one file into a target's output and walk whatever it references.
    ///
    /// `file` lives in the target's source tree (the temp tree for H5). Each
    /// call is its own pass, so imports added by the change are discovered.
    pub fn sync_target(&self, target: Target, file: &Path) -> Result<WalkStats> {
        let source_root = self.ctx.target_source_dir(target);
        let output_root = self.ctx.target_output_dir(target);
        let mut walker = DependencyWalker::new(&self.ctx.app_root, target);

        walker.materialize(file, source_root, &output_root)?;
        let seed = [file.to_path_buf()];
        match classify_path(file) {
            AssetKind::Script => walker.walk(&seed, source_root, &output_root),
            AssetKind::Stylesheet => walker.walk_styles(&seed, source_root, &output_root),
            _ => {}
        }
        Ok(walker.into_stats())
    }

    /// Delete the staged and both output copies of a removed source file
    pub fn remove_file(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let ctx = &self.ctx;
        let Some(staged) = ctx.rebase_source_path(path, &ctx.temp_dir) else {
            return Ok(Vec::new());
        };
        Logger::process(ProcessType::Unlink, "removed", &ctx.relative_to_app(path));

        let mut candidates = vec![staged];
        for target in Target::ALL {
            candidates.extend(ctx.rebase_source_path(path, &ctx.target_output_dir(target)));
        }

        let mut removed = Vec::new();
        for candidate in candidates {
            if file_system::remove_if_exists(&candidate)? {
                Logger::process(ProcessType::Remove, "output", &ctx.relative_to_app(&candidate));
                removed.push(candidate);
            }
        }
        Ok(removed)
    }
}

fn existing(paths: Vec<PathBuf>, what: &str) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|p| {
            let found = p.is_file();
            if !found {
                Logger::warn(&format!("Entry {} {} not found, skipping", what, p.display()));
            }
            found
        })
        .collect()
}
