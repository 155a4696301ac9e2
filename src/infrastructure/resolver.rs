use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Script extensions in probing order
pub const SCRIPT_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx"];

/// Stylesheet extensions in probing order
pub const STYLE_EXTENSIONS: &[&str] = &[".css", ".scss", ".sass", ".less", ".styl", ".wxss", ".acss"];

/// Maps import specifiers onto files on disk by probing extensions.
///
/// Resolution is fail-soft: when no candidate exists the joined path is returned
/// unchanged, so callers must check existence before relying on it. Bare package
/// specifiers pass through this way.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    platform: Option<String>,
}

impl PathResolver {
    /// `platform` enables `<name>.<platform>.<ext>` variants, probed before the generic file
    pub fn new(platform: Option<&str>) -> Self {
        Self {
            platform: platform.map(str::to_string),
        }
    }

    /// Resolve a script specifier against `base_dir`
    pub fn resolve_script(&self, base_dir: &Path, specifier: &str) -> PathBuf {
        let path = normalize_path(&base_dir.join(specifier));
        self.probe_script(&path).unwrap_or(path)
    }

    /// Resolve a stylesheet specifier against `base_dir`
    pub fn resolve_style(&self, base_dir: &Path, specifier: &str) -> PathBuf {
        let path = normalize_path(&base_dir.join(specifier));
        self.probe_style(&path).unwrap_or(path)
    }

    /// First existing script candidate for an extension-less path
    pub fn probe_script(&self, path: &Path) -> Option<PathBuf> {
        for ext in SCRIPT_EXTENSIONS {
            if let Some(platform) = &self.platform {
                let candidates = [
                    append(path, &format!(".{}{}", platform, ext)),
                    path.join(format!("index.{}{}", platform, ext)),
                ];
                if let Some(found) = candidates.into_iter().find(|c| c.is_file()) {
                    return Some(found);
                }
            }

            let file = append(path, ext);
            if file.is_file() {
                return Some(file);
            }
            let index = path.join(format!("index{}", ext));
            if index.is_file() {
                return Some(index);
            }
        }
        None
    }

    /// First existing stylesheet candidate.
    ///
    /// `path` may already carry an extension; the platform variant replaces it.
    pub fn probe_style(&self, path: &Path) -> Option<PathBuf> {
        let without_ext = path.with_extension("");
        for ext in STYLE_EXTENSIONS {
            if let Some(platform) = &self.platform {
                let variant = append(&without_ext, &format!(".{}{}", platform, ext));
                if variant.is_file() {
                    return Some(variant);
                }
            }
            let file = append(path, ext);
            if file.is_file() {
                return Some(file);
            }
        }
        None
    }
}

/// `foo/bar` + `.js` -> `foo/bar.js`, keeping any dots already in the name
fn append(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Remove `.` and resolve `..` components without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            other => result.push(other),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/app/src/./button/../icon/index")),
            PathBuf::from("/app/src/icon/index")
        );
    }

    #[test]
    fn test_script_extension_order() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("button.js"));
        touch(&dir.path().join("button.tsx"));

        let resolver = PathResolver::new(None);
        assert_eq!(
            resolver.resolve_script(dir.path(), "./button"),
            dir.path().join("button.tsx")
        );
    }

    #[test]
    fn test_extensionless_matches_explicit_extension() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("list/item.jsx"));

        let resolver = PathResolver::new(None);
        let implicit = resolver.resolve_script(dir.path(), "./list/item");
        let explicit = resolver.resolve_script(dir.path(), "./list/item.jsx");
        assert_eq!(implicit, explicit);
        assert!(implicit.is_file());
    }

    #[test]
    fn test_directory_index() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("tabs/index.ts"));

        let resolver = PathResolver::new(None);
        assert_eq!(
            resolver.resolve_script(dir.path(), "./tabs"),
            dir.path().join("tabs/index.ts")
        );
    }

    #[test]
    fn test_platform_variant_wins() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("modal.js"));
        touch(&dir.path().join("modal.h5.js"));

        let h5 = PathResolver::new(Some("h5"));
        assert_eq!(h5.resolve_script(dir.path(), "./modal"), dir.path().join("modal.h5.js"));

        let weapp = PathResolver::new(Some("weapp"));
        assert_eq!(weapp.resolve_script(dir.path(), "./modal"), dir.path().join("modal.js"));
    }

    #[test]
    fn test_unresolved_script_fails_soft() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(None);
        let resolved = resolver.resolve_script(dir.path(), "./missing");
        assert_eq!(resolved, dir.path().join("missing"));
        assert!(!resolved.exists());
    }

    #[test]
    fn test_style_probing() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("theme/vars.scss"));
        touch(&dir.path().join("theme/mixins.weapp.less"));

        let resolver = PathResolver::new(Some("weapp"));
        assert_eq!(
            resolver.resolve_style(dir.path(), "./theme/vars"),
            dir.path().join("theme/vars.scss")
        );
        assert_eq!(
            resolver.resolve_style(dir.path(), "./theme/mixins"),
            dir.path().join("theme/mixins.weapp.less")
        );
        // An existing file with its extension stays as is
        assert_eq!(
            resolver.resolve_style(dir.path(), "./theme/vars.scss"),
            dir.path().join("theme/vars.scss")
        );
    }
}
