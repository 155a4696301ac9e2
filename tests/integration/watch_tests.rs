use duplex::core::models::{BuildContext, BuildOptions};
use duplex::core::services::LibraryBuildService;
use duplex::utils::config_loader::ConfigLoader;
use duplex::utils::watch::{build_watch_entries, FileEvent, WatchCoordinator};
use std::fs;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

fn write_app(files: &[(&str, &str)]) -> TempDir {
    let app = tempdir().unwrap();
    for (name, content) in files {
        let path = app.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    app
}

async fn built_coordinator(app: &TempDir) -> WatchCoordinator {
    let config = ConfigLoader::load(app.path()).unwrap();
    let ctx = BuildContext::new(app.path(), config, &BuildOptions::default());
    let service = Arc::new(LibraryBuildService::with_defaults(ctx));
    service.build().await;
    let entries = build_watch_entries(service.context(), service.script_rebuilder());
    WatchCoordinator::new(service, entries)
}

#[tokio::test]
async fn test_added_asset_reaches_both_targets() {
    let app = write_app(&[
        ("src/index.js", "export { Icon } from './icon'\n"),
        ("src/icon/index.js", "import './index.css'\n"),
        ("src/icon/index.css", ".icon {}\n"),
    ]);
    let watcher = built_coordinator(&app).await;

    let png = app.path().join("src/icon/star.png");
    fs::write(&png, "png").unwrap();
    watcher.handle_event(FileEvent::Add, &png).await;

    let css = app.path().join("src/icon/index.css");
    fs::write(&css, ".icon { background: url(\"./star.png\"); }\n").unwrap();
    watcher.handle_event(FileEvent::Change, &css).await;

    for target in ["weapp", "h5"] {
        let out = app.path().join("dist").join(target).join("icon");
        assert!(out.join("star.png").is_file(), "{} should contain the new asset", target);
        assert!(fs::read_to_string(out.join("index.css")).unwrap().contains("star.png"));
    }
}

#[tokio::test]
async fn test_unlink_keeps_siblings() {
    let app = write_app(&[
        ("src/index.js", "export { Button } from './button'\n"),
        ("src/button/index.js", "import './index.scss'\n"),
        ("src/button/index.scss", ".btn {}\n"),
    ]);
    let watcher = built_coordinator(&app).await;

    let scss = app.path().join("src/button/index.scss");
    fs::remove_file(&scss).unwrap();
    watcher.handle_event(FileEvent::Unlink, &scss).await;

    for dir in [".temp", "dist/weapp", "dist/h5"] {
        let base = app.path().join(dir).join("button");
        assert!(!base.join("index.scss").exists(), "{} copy should be gone", dir);
        assert!(base.join("index.js").is_file(), "{} sibling should stay", dir);
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_handler_receives_changed_path() {
    let app = write_app(&[
        ("src/index.js", "export {}\n"),
        ("docs/demo.md", "# demo\n"),
        (
            "duplex.config.json",
            r#"{
                "ui": {
                    "extraWatchFiles": [
                        { "path": "docs", "handler": { "command": ["sh", "-c", "echo \"$DUPLEX_CHANGED_FILE\" > changed.txt"] } }
                    ]
                }
            }"#,
        ),
    ]);
    let watcher = built_coordinator(&app).await;
    assert!(watcher.watch_paths().contains(&app.path().join("docs")));

    let demo = app.path().join("docs/demo.md");
    watcher.handle_event(FileEvent::Change, &demo).await;

    let changed = fs::read_to_string(app.path().join("changed.txt")).unwrap();
    assert_eq!(changed.trim(), demo.display().to_string());
}
