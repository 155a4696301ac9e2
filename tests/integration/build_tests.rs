use async_trait::async_trait;
use duplex::core::interfaces::{BundlerRunner, StagingCompiler};
use duplex::core::models::{BuildContext, BuildMode, BuildOptions, H5BuildConfig};
use duplex::core::services::LibraryBuildService;
use duplex::infrastructure::MirrorStagingCompiler;
use duplex::utils::config_loader::ProjectConfig;
use duplex::utils::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};

/// Records every configuration handed to the bundler
#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<(PathBuf, H5BuildConfig)>>,
}

#[async_trait]
impl BundlerRunner for RecordingRunner {
    async fn run(&self, app_root: &Path, config: &H5BuildConfig) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((app_root.to_path_buf(), config.clone()));
        Ok(())
    }
}

fn write_app(files: &[(&str, &str)]) -> TempDir {
    let app = tempdir().unwrap();
    for (name, content) in files {
        let path = app.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    app
}

fn build_service(app: &TempDir, options: BuildOptions, runner: Arc<RecordingRunner>) -> LibraryBuildService {
    let ctx = BuildContext::new(app.path(), ProjectConfig::default(), &options);
    let stager = Arc::new(MirrorStagingCompiler::new(&ctx.source_dir, &ctx.temp_dir));
    LibraryBuildService::new(ctx, stager, runner)
}

fn component_library() -> TempDir {
    write_app(&[
        (
            "src/index.js",
            "import './style/index.scss'\nimport Icon from './icon'\nexport { Button } from './button'\nexport { Icon }\n",
        ),
        ("src/style/index.scss", "@import './theme.scss';\n"),
        ("src/style/theme.scss", "$primary: #6190e8;\n"),
        ("src/button/index.js", "import './index.scss'\nimport { noop } from '../utils'\nexport function Button() { return noop() }\n"),
        ("src/button/index.scss", ".btn { color: red; }\n"),
        ("src/utils/index.ts", "export const noop = () => null\n"),
        ("src/icon/index.js", "import './index.wxss'\nexport default function Icon() {}\n"),
        ("src/icon/index.wxss", ".icon { background: url('./icon.png?v=1'); }\n"),
        ("src/icon/icon.png", "png"),
        ("src/unused/index.js", "export default 1\n"),
    ])
}

#[tokio::test]
async fn test_full_build_produces_both_targets() {
    let app = component_library();
    let runner = Arc::new(RecordingRunner::default());
    let service = build_service(&app, BuildOptions::default(), runner.clone());

    let report = service.build().await;
    assert!(report.dispatcher.is_some());
    assert!(report.weapp.as_ref().unwrap().failed.is_empty());
    assert!(report.h5.as_ref().unwrap().failed.is_empty());
    assert!(runner.calls.lock().unwrap().is_empty(), "lib mode never runs the bundler");

    let dist = app.path().join("dist");
    let dispatcher = fs::read_to_string(dist.join("index.js")).unwrap();
    assert!(dispatcher.contains("process.env.TARO_ENV === 'h5'"));
    assert!(dispatcher.contains("require('./h5/index')"));
    assert!(dispatcher.contains("require('./weapp/index')"));

    for target in ["weapp", "h5"] {
        let out = dist.join(target);
        for name in [
            "index.js",
            "button/index.js",
            "button/index.scss",
            "utils/index.ts",
            "icon/index.js",
            "icon/index.wxss",
            "icon/icon.png",
        ] {
            assert!(out.join(name).is_file(), "{}/{} should exist", target, name);
        }
        assert!(!out.join("unused/index.js").exists(), "unreferenced files are not copied");
    }

    // Mini-program entry styles stay below weapp/, H5 entry styles sit at the output root
    assert!(dist.join("weapp/style/index.scss").is_file());
    assert!(dist.join("weapp/style/theme.scss").is_file());
    assert!(dist.join("style/index.scss").is_file());
    assert!(dist.join("style/theme.scss").is_file());
    assert!(!dist.join("h5/style/index.scss").exists());

    let weapp_entry = fs::read_to_string(dist.join("weapp/index.js")).unwrap();
    assert!(weapp_entry.contains("./style/index.scss"));
    let h5_entry = fs::read_to_string(dist.join("h5/index.js")).unwrap();
    assert!(!h5_entry.contains("index.scss"), "stylesheet imports are stripped for H5");
    assert!(h5_entry.contains("./button"));
}

#[tokio::test]
async fn test_missing_entry_skips_targets() {
    let app = write_app(&[("src/button/index.js", "export default 1\n")]);
    let service = build_service(&app, BuildOptions::default(), Arc::new(RecordingRunner::default()));

    let report = service.build().await;
    assert!(report.weapp.is_none());
    assert!(report.h5.is_none());
    assert!(!app.path().join("dist/weapp/button/index.js").exists());
}

#[tokio::test]
async fn test_custom_ui_index() {
    let app = write_app(&[
        ("src/lib/main.ts", "export { Tabs } from '../tabs'\n"),
        ("src/tabs/index.tsx", "export const Tabs = () => null\n"),
    ]);
    let options = BuildOptions {
        ui_index: Some("lib/main".to_string()),
        ..Default::default()
    };
    let service = build_service(&app, options, Arc::new(RecordingRunner::default()));
    service.build().await;

    let dist = app.path().join("dist");
    assert!(fs::read_to_string(dist.join("index.js"))
        .unwrap()
        .contains("require('./weapp/main')"));
    assert!(dist.join("weapp/main.ts").is_file());
    assert!(dist.join("weapp/tabs/index.tsx").is_file());
    assert!(dist.join("h5/main.ts").is_file());
    assert!(dist.join("h5/tabs/index.tsx").is_file());
}

#[tokio::test]
async fn test_platform_specific_files() {
    let app = write_app(&[
        ("src/index.js", "export { Modal } from './modal'\n"),
        ("src/modal/index.js", "export const Modal = 'shared'\n"),
        ("src/modal/index.h5.js", "export const Modal = 'h5'\n"),
    ]);
    let service = build_service(&app, BuildOptions::default(), Arc::new(RecordingRunner::default()));
    service.build().await;

    let dist = app.path().join("dist");
    assert!(dist.join("weapp/modal/index.js").is_file());
    assert!(!dist.join("weapp/modal/index.h5.js").exists());
    assert!(dist.join("h5/modal/index.h5.js").is_file());
    assert!(!dist.join("h5/modal/index.js").exists());
}

#[tokio::test]
async fn test_h5_platform_entry_keeps_dispatcher_name() {
    let app = write_app(&[
        ("src/index.js", "export { Button } from './button'\n"),
        ("src/index.h5.js", "import './style/h5.scss'\nexport { Button } from './button'\n"),
        ("src/style/h5.scss", ".h5 {}\n"),
        ("src/button/index.js", "export const Button = 1\n"),
    ]);
    let service = build_service(&app, BuildOptions::default(), Arc::new(RecordingRunner::default()));
    service.build().await;

    let dist = app.path().join("dist");
    let h5_entry = fs::read_to_string(dist.join("h5/index.js")).unwrap();
    assert!(!h5_entry.contains("h5.scss"));
    assert!(!dist.join("h5/index.h5.js").exists());
    assert!(dist.join("style/h5.scss").is_file());
    assert!(dist.join("weapp/index.js").is_file());

    let h5_source = app.path().join("src/index.h5.js");
    fs::write(
        &h5_source,
        "import './style/h5.scss'\nexport { Button } from './button'\nexport { Card } from './card'\n",
    )
    .unwrap();
    fs::write(app.path().join("src/card.js"), "export const Card = 2\n").unwrap();
    // The new component is staged by its own add event first
    service.sync_file(&app.path().join("src/card.js")).await.unwrap();
    service.sync_file(&h5_source).await.unwrap();

    let h5_entry = fs::read_to_string(dist.join("h5/index.js")).unwrap();
    assert!(h5_entry.contains("./card"), "entry edits regenerate the H5 entry");
    assert!(!h5_entry.contains("h5.scss"), "stylesheet imports stay stripped");
    assert!(!dist.join("h5/index.h5.js").exists());
    assert!(dist.join("h5/card.js").is_file());
}

#[tokio::test]
async fn test_script_mode_runs_bundler() {
    let app = component_library();
    let runner = Arc::new(RecordingRunner::default());
    let options = BuildOptions {
        mode: Some(BuildMode::Script),
        ..Default::default()
    };
    let service = build_service(&app, options, runner.clone());

    let report = service.build().await;
    assert!(report.h5.is_some());

    let calls = runner.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (root, config) = &calls[0];
    assert_eq!(root, app.path());
    assert_eq!(config.entry["app"], vec![app.path().join(".temp/index.js")]);
    assert_eq!(config.output_root, "dist/h5");
    assert!(!config.is_watch);

    assert!(app.path().join(".temp/button/index.js").is_file(), "sources are staged first");
    assert!(!app.path().join("dist/h5/button/index.js").exists());
    assert!(app.path().join("dist/weapp/button/index.js").is_file());
}

#[tokio::test]
async fn test_sync_file_updates_both_targets() {
    let app = component_library();
    let service = build_service(&app, BuildOptions::default(), Arc::new(RecordingRunner::default()));
    service.build().await;

    let button = app.path().join("src/button/index.js");
    fs::write(&button, "import './extra.css'\nexport function Button() {}\n").unwrap();
    let extra = app.path().join("src/button/extra.css");
    fs::write(&extra, ".x {}").unwrap();
    // The watcher reports the new stylesheet before the script change
    service.sync_file(&extra).await.unwrap();
    service.sync_file(&button).await.unwrap();

    for target in ["weapp", "h5"] {
        let out = app.path().join("dist").join(target).join("button");
        assert!(fs::read_to_string(out.join("index.js")).unwrap().contains("extra.css"));
        assert!(out.join("extra.css").is_file(), "{} should pick up the new import", target);
    }
    assert!(fs::read_to_string(app.path().join(".temp/button/index.js"))
        .unwrap()
        .contains("extra.css"));
}

#[tokio::test]
async fn test_sync_entry_rebuilds_component_graph() {
    let app = component_library();
    let service = build_service(&app, BuildOptions::default(), Arc::new(RecordingRunner::default()));
    service.build().await;

    let entry = app.path().join("src/index.js");
    fs::write(&entry, "export { Button } from './button'\nexport { Unused } from './unused'\n").unwrap();
    service.sync_file(&entry).await.unwrap();

    for target in ["weapp", "h5"] {
        let out = app.path().join("dist").join(target);
        assert!(out.join("unused/index.js").is_file(), "{} entry change adds components", target);
    }
}

#[tokio::test]
async fn test_staging_is_used_for_h5_sources() {
    struct EmptyStager;

    #[async_trait]
    impl StagingCompiler for EmptyStager {
        async fn build_temp(&self) -> Result<()> {
            Ok(())
        }
        fn process_file(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    let app = component_library();
    let ctx = BuildContext::new(app.path(), ProjectConfig::default(), &BuildOptions::default());
    let service = LibraryBuildService::new(ctx, Arc::new(EmptyStager), Arc::new(RecordingRunner::default()));

    let report = service.build().await;
    assert!(report.weapp.is_some());
    assert!(report.h5.is_none(), "nothing staged means no H5 entry");
}
