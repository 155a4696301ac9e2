use crate::core::models::AssetKind;
use std::path::Path;

/// Extension table in precedence order. The first row containing the
/// extension decides the kind.
const EXTENSION_TABLE: &[(AssetKind, &[&str])] = &[
    (AssetKind::Script, &["js", "jsx", "ts", "tsx"]),
    (AssetKind::Json, &["json"]),
    (
        AssetKind::Media,
        &[
            // fonts
            "woff", "woff2", "eot", "ttf", "otf",
            // images
            "png", "jpg", "jpeg", "gif", "bpm", "svg", "webp",
            // audio / video
            "mp4", "webm", "ogg", "mp3", "wav", "flac", "aac",
        ],
    ),
    (
        AssetKind::Stylesheet,
        &["css", "scss", "sass", "less", "styl", "wxss", "acss"],
    ),
];

/// Drop a `?query` suffix from a specifier
pub fn strip_query(specifier: &str) -> &str {
    specifier.split('?').next().unwrap_or(specifier)
}

/// Classify a specifier or path by its extension
pub fn classify(specifier: &str) -> AssetKind {
    let path = Path::new(strip_query(specifier));
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return AssetKind::Unknown;
    };
    let ext = ext.to_ascii_lowercase();

    EXTENSION_TABLE
        .iter()
        .find(|(_, extensions)| extensions.contains(&ext.as_str()))
        .map(|(kind, _)| *kind)
        .unwrap_or(AssetKind::Unknown)
}

pub fn classify_path(path: &Path) -> AssetKind {
    classify(&path.to_string_lossy())
}

/// Typed scripts are parsed with TypeScript syntax
pub fn is_typed_script(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts") | Some("tsx")
    )
}
