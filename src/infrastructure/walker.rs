use crate::core::models::{Target, WalkStats};
use crate::infrastructure::file_system;
use crate::infrastructure::materializer::OutputMaterializer;
use crate::infrastructure::processors::reference_extractor::extract_references;
use crate::infrastructure::processors::style_processor::{css_imports, relative_url_references};
use crate::infrastructure::processors::transformer::OxcTransformer;
use crate::infrastructure::resolver::{normalize_path, PathResolver};
use crate::utils::{Logger, Result};
use oxc_allocator::Allocator;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Recursively discovers and copies everything reachable from a set of seed files.
///
/// One walker is one build pass: every script and stylesheet is analyzed at most
/// once and every file is copied at most once, which also bounds recursion on
/// import cycles. The walk is depth-first and sequential.
pub struct DependencyWalker {
    resolver: PathResolver,
    materializer: OutputMaterializer,
    transformer: OxcTransformer,
    processed: HashSet<PathBuf>,
    processed_styles: HashSet<PathBuf>,
    materialized: HashSet<PathBuf>,
    stats: WalkStats,
}

impl DependencyWalker {
    pub fn new(app_root: &Path, target: Target) -> Self {
        Self::with_resolver(app_root, PathResolver::new(Some(target.output_name())))
    }

    pub fn with_resolver(app_root: &Path, resolver: PathResolver) -> Self {
        Self {
            resolver,
            materializer: OutputMaterializer::new(app_root),
            transformer: OxcTransformer::new(),
            processed: HashSet::new(),
            processed_styles: HashSet::new(),
            materialized: HashSet::new(),
            stats: WalkStats::default(),
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    pub fn into_stats(self) -> WalkStats {
        self.stats
    }

    #[cfg(test)]
    fn is_processed(&self, path: &Path) -> bool {
        self.processed.contains(path)
    }

    /// Copy one file into the output tree unless this pass already did
    pub fn materialize(&mut self, file: &Path, source_root: &Path, output_root: &Path) -> Result<()> {
        if self.materialized.contains(file) {
            return Ok(());
        }
        if self.materializer.materialize(file, source_root, output_root)?.is_some() {
            self.materialized.insert(file.to_path_buf());
            self.stats.copied += 1;
        }
        Ok(())
    }

    /// Walk script files. A file that fails is logged and recorded; its siblings
    /// are still walked.
    pub fn walk(&mut self, files: &[PathBuf], source_root: &Path, output_root: &Path) {
        for file in files {
            if let Err(e) = self.walk_script(file, source_root, output_root) {
                Logger::error(&format!("Failed to analyze {}: {}", file.display(), e));
                self.stats.failed.push(file.clone());
            }
        }
    }

    fn walk_script(&mut self, file: &Path, source_root: &Path, output_root: &Path) -> Result<()> {
        if !file.is_file() || !self.processed.insert(file.to_path_buf()) {
            return Ok(());
        }
        self.stats.processed += 1;

        let code = file_system::read_to_string(file)?;
        let refs = {
            let allocator = Allocator::default();
            let program = self.transformer.parse(&allocator, &code, file)?;
            extract_references(&program, file, &self.resolver)
        };

        for path in refs.all() {
            self.materialize(path, source_root, output_root)?;
        }
        if !refs.scripts.is_empty() {
            self.walk(&refs.scripts, source_root, output_root);
        }
        if !refs.styles.is_empty() {
            self.walk_styles(&refs.styles, source_root, output_root);
        }
        Ok(())
    }

    /// Follow `url()` assets and `@import` chains of stylesheets
    pub fn walk_styles(&mut self, files: &[PathBuf], source_root: &Path, output_root: &Path) {
        for file in files {
            if let Err(e) = self.walk_style(file, source_root, output_root) {
                Logger::error(&format!("Failed to analyze {}: {}", file.display(), e));
                self.stats.failed.push(file.clone());
            }
        }
    }

    fn walk_style(&mut self, file: &Path, source_root: &Path, output_root: &Path) -> Result<()> {
        if !file.is_file() || !self.processed_styles.insert(file.to_path_buf()) {
            return Ok(());
        }
        self.stats.processed += 1;

        let content = file_system::read_to_string(file)?;
        let base_dir = file.parent().unwrap_or_else(|| Path::new(""));

        for url in relative_url_references(&content) {
            let asset = normalize_path(&base_dir.join(url.split(['?', '#']).next().unwrap_or(&url)));
            if asset.is_file() {
                self.materialize(&asset, source_root, output_root)?;
            } else {
                Logger::debug(&format!("Unresolved url({}) in {}", url, file.display()));
            }
        }

        let mut imports = Vec::new();
        for specifier in css_imports(&content) {
            let path = self.resolver.resolve_style(base_dir, &specifier);
            if !path.is_file() {
                Logger::debug(&format!("Unresolved @import '{}' in {}", specifier, file.display()));
                continue;
            }
            self.materialize(&path, source_root, output_root)?;
            imports.push(path);
        }
        if !imports.is_empty() {
            self.walk_styles(&imports, source_root, output_root);
        }
        Ok(())
    }
}
