//! Discovery of the files a parsed script references.
//!
//! [`extract_references`] categorizes the relative imports of any script.
//! [`analyze_entry`] handles the library entry file: it works out which imports
//! are re-exported components and which statements must be dropped (stylesheet
//! imports) without mutating the tree; [`apply_exclusions`] then removes those
//! statements before code generation.

use crate::core::models::{AssetKind, ComponentReference, EntryReferences, ReferenceSet};
use crate::infrastructure::file_system;
use crate::infrastructure::processors::classifier::{classify, strip_query};
use crate::infrastructure::processors::transformer::OxcTransformer;
use crate::infrastructure::resolver::{normalize_path, PathResolver};
use crate::utils::Result;
use oxc_allocator::Allocator;
use oxc_ast::ast::{ExportDefaultDeclarationKind, ImportDeclarationSpecifier, Program, Statement};
use oxc_span::{GetSpan, Span};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Collect the relative imports of `source_file`, grouped by kind.
///
/// Bare specifiers (packages) are skipped. Script imports that already carry a
/// script extension are kept even when missing on disk, as the raw specifier;
/// every other kind is kept only if the file exists.
pub fn extract_references(
    program: &Program<'_>,
    source_file: &Path,
    resolver: &PathResolver,
) -> ReferenceSet {
    let mut refs = ReferenceSet::new();
    let base_dir = source_file.parent().unwrap_or_else(|| Path::new(""));

    for stmt in &program.body {
        let Statement::ImportDeclaration(decl) = stmt else {
            continue;
        };
        let value = decl.source.value.as_str();
        if !value.starts_with('.') {
            continue;
        }

        let specifier = strip_query(value);
        let joined = normalize_path(&base_dir.join(specifier));

        match classify(specifier) {
            AssetKind::Script => {
                let path = if joined.is_file() && joined != source_file {
                    joined
                } else {
                    PathBuf::from(value)
                };
                refs.push(AssetKind::Script, path);
            }
            kind @ (AssetKind::Json | AssetKind::Media | AssetKind::Stylesheet) => {
                if joined.is_file() {
                    refs.push(kind, joined);
                }
            }
            AssetKind::Unknown => {
                if let Some(resolved) = resolver.probe_script(&joined) {
                    refs.push(AssetKind::Script, resolved);
                } else if joined.is_file() {
                    refs.push(AssetKind::Script, joined);
                }
            }
        }
    }

    refs
}

/// What the entry file exposes, plus the statements to drop from it
#[derive(Debug, Clone, Default)]
pub struct EntryAnalysis {
    pub style_files: Vec<PathBuf>,
    pub components: Vec<ComponentReference>,
    pub excluded: Vec<Span>,
}

/// Find the components an entry file re-exports and the stylesheets it imports.
///
/// Components are either re-exported straight from a source
/// (`export { Button } from './button'`) or imported and then exported by name
/// or as the default export.
pub fn analyze_entry(
    program: &Program<'_>,
    entry_file: &Path,
    resolver: &PathResolver,
) -> EntryAnalysis {
    let mut analysis = EntryAnalysis::default();
    let base_dir = entry_file.parent().unwrap_or_else(|| Path::new(""));

    let mut pending_names: HashSet<String> = HashSet::new();
    let mut default_name: Option<String> = None;

    for stmt in &program.body {
        match stmt {
            Statement::ExportNamedDeclaration(decl) => match &decl.source {
                Some(source) => {
                    let path = resolver.resolve_script(base_dir, source.value.as_str());
                    for specifier in &decl.specifiers {
                        push_component(
                            &mut analysis.components,
                            Some(specifier.exported.name().to_string()),
                            path.clone(),
                        );
                    }
                }
                None => {
                    for specifier in &decl.specifiers {
                        pending_names.insert(specifier.local.name().to_string());
                    }
                }
            },
            Statement::ExportDefaultDeclaration(decl) => {
                if let ExportDefaultDeclarationKind::Identifier(ident) = &decl.declaration {
                    default_name = Some(ident.name.to_string());
                }
            }
            _ => {}
        }
    }

    for stmt in &program.body {
        let Statement::ImportDeclaration(decl) = stmt else {
            continue;
        };
        let value = decl.source.value.as_str();

        if classify(value) == AssetKind::Stylesheet {
            let style_path = normalize_path(&base_dir.join(strip_query(value)));
            if !analysis.style_files.contains(&style_path) {
                analysis.style_files.push(style_path);
            }
            analysis.excluded.push(stmt.span());
            continue;
        }

        let Some(specifiers) = &decl.specifiers else {
            continue;
        };
        for specifier in specifiers {
            let local = local_name(specifier);
            let exported = pending_names.contains(local)
                || default_name.as_deref() == Some(local);
            if exported {
                push_component(
                    &mut analysis.components,
                    Some(local.to_string()),
                    resolver.resolve_script(base_dir, value),
                );
            }
        }
    }

    analysis
}

/// Drop every top-level statement whose span was excluded
pub fn apply_exclusions(program: &mut Program<'_>, excluded: &[Span]) {
    if excluded.is_empty() {
        return;
    }
    program.body.retain(|stmt| !excluded.contains(&stmt.span()));
}

/// Parse an entry file, strip its stylesheet imports and regenerate its code
pub fn extract_entry_references(
    transformer: &OxcTransformer,
    entry_file: &Path,
    resolver: &PathResolver,
) -> Result<EntryReferences> {
    let code = file_system::read_to_string(entry_file)?;
    let allocator = Allocator::default();
    let mut program = transformer.parse(&allocator, &code, entry_file)?;

    let analysis = analyze_entry(&program, entry_file, resolver);
    apply_exclusions(&mut program, &analysis.excluded);

    Ok(EntryReferences {
        code: transformer.generate(&program),
        style_files: analysis.style_files,
        components: analysis.components,
    })
}

fn local_name<'a>(specifier: &'a ImportDeclarationSpecifier<'_>) -> &'a str {
    match specifier {
        ImportDeclarationSpecifier::ImportSpecifier(s) => s.local.name.as_str(),
        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => s.local.name.as_str(),
        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => s.local.name.as_str(),
    }
}

fn push_component(components: &mut Vec<ComponentReference>, name: Option<String>, path: PathBuf) {
    let component = ComponentReference { name, path };
    if !components.contains(&component) {
        components.push(component);
    }
}
