//! End-to-end bootstrap tests: cold scan, warm rehydrate and live updates.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aliasmap::source::OneOrMany;
use aliasmap::{
    BootstrapError, BootstrapMode, Bootstrapper, IgnoreRule, MatcherSet, PersistError,
    PersistedFile, ProcessFlag, RegistryEvent, SourceInput, bootstrap,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::broadcast;

/// Canonical temp root so watcher paths and configured roots agree.
fn workspace() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    (temp_dir, root)
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "export {};\n").unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

async fn wait_for<F>(rx: &mut broadcast::Receiver<RegistryEvent>, mut pred: F) -> RegistryEvent
where
    F: FnMut(&RegistryEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event stream closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for registry event")
}

#[tokio::test]
async fn test_cold_start_over_empty_root() {
    let (_guard, root) = workspace();
    fs::create_dir_all(root.join("src")).unwrap();
    let file = PersistedFile::new(root.join("tsconfig.paths.json"), &root);

    let outcome = bootstrap(&[SourceInput::new("src")], file, BootstrapMode::Cold)
        .await
        .unwrap();

    assert_eq!(outcome.mode, BootstrapMode::Cold);
    assert!(outcome.aliases.is_empty());
    assert!(outcome.watcher.is_some());
    assert_eq!(
        read_json(&root.join("tsconfig.paths.json")),
        json!({"compilerOptions": {"paths": {}}})
    );
    assert!(ProcessFlag::is_set());
    assert_eq!(BootstrapMode::for_process(), BootstrapMode::Warm);
}

#[tokio::test]
async fn test_cold_start_over_missing_root_is_not_an_error() {
    let (_guard, root) = workspace();
    let file = PersistedFile::new(root.join("paths.json"), &root);

    let outcome = bootstrap(&[SourceInput::new("does-not-exist")], file, BootstrapMode::Cold)
        .await
        .unwrap();

    assert!(outcome.aliases.is_empty());
    assert!(outcome.watcher.unwrap().watched_roots().is_empty());
    assert!(root.join("paths.json").exists());
}

#[tokio::test]
async fn test_cold_start_persists_sorted_relative_paths() {
    let (_guard, root) = workspace();
    touch(&root.join("src/Zeta.ts"));
    touch(&root.join("src/alpha.ts"));
    touch(&root.join("src/nested/Beta.tsx"));
    touch(&root.join("src/readme.md"));
    let file = PersistedFile::new(root.join("tsconfig.paths.json"), &root);

    let outcome = bootstrap(
        &[SourceInput::new("src").with_prefix("@app")],
        file,
        BootstrapMode::Cold,
    )
    .await
    .unwrap();

    assert_eq!(outcome.aliases.len(), 3);
    let beta = outcome
        .aliases
        .iter()
        .find(|entry| entry.find == "@app/Beta")
        .unwrap();
    assert_eq!(beta.replacement, root.join("src/nested/Beta.tsx"));

    let content = fs::read_to_string(root.join("tsconfig.paths.json")).unwrap();
    assert!(content.ends_with('\n'));
    let persisted = read_json(&root.join("tsconfig.paths.json"));
    let paths = persisted["compilerOptions"]["paths"].as_object().unwrap();
    let keys: Vec<&str> = paths.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["@app/alpha", "@app/Beta", "@app/Zeta"]);
    assert_eq!(paths["@app/Beta"], json!(["./src/nested/Beta.tsx"]));
}

#[tokio::test]
async fn test_duplicate_keys_keep_first_candidate() {
    let (_guard, root) = workspace();
    touch(&root.join("a/App.tsx"));
    touch(&root.join("b/App.tsx"));
    let file = PersistedFile::new(root.join("paths.json"), &root);

    let outcome = bootstrap(
        &[
            SourceInput::new("a").with_prefix("@components"),
            SourceInput::new("b").with_prefix("@components"),
        ],
        file,
        BootstrapMode::Cold,
    )
    .await
    .unwrap();

    assert_eq!(outcome.aliases.len(), 1);
    assert_eq!(outcome.aliases[0].find, "@components/App");
    assert_eq!(outcome.aliases[0].replacement, root.join("a/App.tsx"));

    assert_eq!(outcome.duplicates.len(), 1);
    let report = &outcome.duplicates[0];
    assert_eq!(report.candidates, vec![root.join("a/App.tsx"), root.join("b/App.tsx")]);
    assert_eq!(report.in_use(), &root.join("a/App.tsx"));
    let text = report.to_string();
    assert!(text.contains(&format!("{} (in use)", root.join("a/App.tsx").display())));

    let persisted = read_json(&root.join("paths.json"));
    assert_eq!(
        persisted["compilerOptions"]["paths"]["@components/App"],
        json!(["./a/App.tsx", "./b/App.tsx"])
    );
}

#[tokio::test]
async fn test_ignore_rules_exclude_files() {
    let (_guard, root) = workspace();
    touch(&root.join("src/App.tsx"));
    touch(&root.join("src/vite-env.d.ts"));
    touch(&root.join("src/node_modules/lib/index.ts"));
    touch(&root.join("src/App.test.tsx"));
    touch(&root.join("src/stories/Button.tsx"));
    let file = PersistedFile::new(root.join("paths.json"), &root);

    let input = SourceInput::new("src").with_ignored(OneOrMany::Many(vec![
        IgnoreRule::from("node_modules"),
        IgnoreRule::from("**/*.test.tsx"),
        IgnoreRule::from("/stories/"),
    ]));
    let outcome = bootstrap(&[input], file, BootstrapMode::Cold).await.unwrap();

    let keys: Vec<&str> = outcome.aliases.iter().map(|a| a.find.as_str()).collect();
    assert_eq!(keys, vec!["App"]);
}

#[tokio::test]
async fn test_warm_start_reads_file_without_scanning() {
    let (_guard, root) = workspace();
    // The file on disk names a path the filesystem does not have; warm start trusts it.
    let content = "{\n  \"compilerOptions\": {\n    \"paths\": {\n      \"b\": [\"./src/b.ts\"],\n      \"A\": [\"./src/A.ts\", \"./lib/A.ts\"]\n    }\n  }\n}\n";
    let path = root.join("tsconfig.paths.json");
    fs::write(&path, content).unwrap();
    touch(&root.join("src/unscanned.ts"));

    let file = PersistedFile::new(&path, &root);
    let outcome = bootstrap(&[SourceInput::new("src")], file, BootstrapMode::Warm)
        .await
        .unwrap();

    assert_eq!(outcome.mode, BootstrapMode::Warm);
    assert!(outcome.watcher.is_none());
    let keys: Vec<&str> = outcome.aliases.iter().map(|a| a.find.as_str()).collect();
    assert_eq!(keys, vec!["b", "A"]);
    assert_eq!(outcome.aliases[1].replacement, root.join("src/A.ts"));
    assert_eq!(outcome.duplicates.len(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[tokio::test]
async fn test_warm_start_with_malformed_file_is_fatal() {
    let (_guard, root) = workspace();
    let path = root.join("tsconfig.paths.json");
    fs::write(&path, "{ not json").unwrap();

    let matchers = MatcherSet::build(&[SourceInput::new("src")], &[], &root).unwrap();
    let mut bootstrapper = Bootstrapper::new(matchers, PersistedFile::new(&path, &root));
    let err = bootstrapper.run(BootstrapMode::Warm).await.unwrap_err();

    assert!(matches!(
        err,
        BootstrapError::Persist(PersistError::Malformed { .. })
    ));
    // No fallback: nothing was scanned or rewritten.
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
}

#[tokio::test]
async fn test_live_add_and_remove_after_ready() {
    let (_guard, root) = workspace();
    fs::create_dir_all(root.join("src")).unwrap();
    let persisted = root.join("tsconfig.paths.json");
    let file = PersistedFile::new(&persisted, &root);

    let outcome = bootstrap(&[SourceInput::new("src")], file, BootstrapMode::Cold)
        .await
        .unwrap();
    let watcher = outcome.watcher.unwrap();
    let mut events = watcher.subscribe();

    let created = root.join("src/Widget.tsx");
    touch(&created);
    wait_for(&mut events, |event| {
        matches!(event, RegistryEvent::Synced { key, .. } if key == "Widget")
    })
    .await;

    assert_eq!(
        outcome.registry.read().await.winner("Widget"),
        Some(created.as_path())
    );
    assert_eq!(
        read_json(&persisted)["compilerOptions"]["paths"]["Widget"],
        json!(["./src/Widget.tsx"])
    );

    fs::remove_file(&created).unwrap();
    wait_for(&mut events, |event| {
        matches!(event, RegistryEvent::AliasRemoved { key, .. } if key == "Widget")
    })
    .await;
    // Every write is acknowledged with Synced; wait for the one that emptied the file.
    wait_for(&mut events, |event| {
        matches!(event, RegistryEvent::Synced { key, .. } if key == "Widget")
            && read_json(&persisted) == json!({"compilerOptions": {"paths": {}}})
    })
    .await;

    assert!(!outcome.registry.read().await.contains_key("Widget"));
}

/// Create a fresh marker file and wait until it is persisted.
///
/// Events are applied in order and writes are serial, so once the marker is
/// synced every earlier filesystem change has reached the registry and disk.
async fn settle(root: &Path, events: &mut broadcast::Receiver<RegistryEvent>, n: usize) {
    let marker = format!("Settle{n}");
    touch(&root.join(format!("src/{marker}.ts")));
    wait_for(events, |event| {
        matches!(event, RegistryEvent::Synced { key, .. } if *key == marker)
    })
    .await;
}

#[tokio::test]
async fn test_live_rename_moves_the_alias() {
    let (_guard, root) = workspace();
    touch(&root.join("src/Old.tsx"));
    let persisted = root.join("tsconfig.paths.json");
    let file = PersistedFile::new(&persisted, &root);

    let outcome = bootstrap(&[SourceInput::new("src")], file, BootstrapMode::Cold)
        .await
        .unwrap();
    let watcher = outcome.watcher.unwrap();
    let mut events = watcher.subscribe();

    fs::rename(root.join("src/Old.tsx"), root.join("src/New.tsx")).unwrap();
    settle(&root, &mut events, 0).await;

    {
        let map = outcome.registry.read().await;
        assert!(!map.contains_key("Old"));
        assert_eq!(map.get("New"), Some(&[root.join("src/New.tsx")][..]));
    }
    let paths = &read_json(&persisted)["compilerOptions"]["paths"];
    assert!(paths.get("Old").is_none());
    assert_eq!(paths["New"], json!(["./src/New.tsx"]));
}

#[tokio::test]
async fn test_live_atomic_save_keeps_one_candidate() {
    let (_guard, root) = workspace();
    let target = root.join("src/App.tsx");
    touch(&target);
    let persisted = root.join("tsconfig.paths.json");
    let file = PersistedFile::new(&persisted, &root);

    let outcome = bootstrap(&[SourceInput::new("src")], file, BootstrapMode::Cold)
        .await
        .unwrap();
    let watcher = outcome.watcher.unwrap();
    let mut events = watcher.subscribe();

    // Editors write a sibling temp file and rename it over the original.
    for round in 0..3 {
        let swap = root.join("src/.App.tsx.swp");
        fs::write(&swap, format!("export const round = {round};\n")).unwrap();
        fs::rename(&swap, &target).unwrap();
    }
    settle(&root, &mut events, 0).await;

    assert_eq!(
        outcome.registry.read().await.get("App"),
        Some(&[target.clone()][..])
    );
    assert_eq!(
        read_json(&persisted)["compilerOptions"]["paths"]["App"],
        json!(["./src/App.tsx"])
    );
}

#[tokio::test]
async fn test_live_directory_moved_into_root_is_registered() {
    let (_guard, root) = workspace();
    fs::create_dir_all(root.join("src")).unwrap();
    touch(&root.join("outside/pkg/Moved.tsx"));
    touch(&root.join("outside/pkg/deep/Inner.ts"));
    let persisted = root.join("tsconfig.paths.json");
    let file = PersistedFile::new(&persisted, &root);

    let outcome = bootstrap(&[SourceInput::new("src")], file, BootstrapMode::Cold)
        .await
        .unwrap();
    let watcher = outcome.watcher.unwrap();
    let mut events = watcher.subscribe();

    fs::rename(root.join("outside/pkg"), root.join("src/pkg")).unwrap();
    settle(&root, &mut events, 0).await;

    {
        let map = outcome.registry.read().await;
        assert_eq!(map.winner("Moved"), Some(root.join("src/pkg/Moved.tsx").as_path()));
        assert_eq!(map.winner("Inner"), Some(root.join("src/pkg/deep/Inner.ts").as_path()));
    }
    let paths = &read_json(&persisted)["compilerOptions"]["paths"];
    assert_eq!(paths["Moved"], json!(["./src/pkg/Moved.tsx"]));
    assert_eq!(paths["Inner"], json!(["./src/pkg/deep/Inner.ts"]));
}

#[tokio::test]
async fn test_live_directory_moved_out_of_root_is_dropped() {
    let (_guard, root) = workspace();
    touch(&root.join("src/Stays.tsx"));
    touch(&root.join("src/gone/Leaving.tsx"));
    touch(&root.join("src/gone/deeper/AlsoLeaving.ts"));
    fs::create_dir_all(root.join("outside")).unwrap();
    let persisted = root.join("tsconfig.paths.json");
    let file = PersistedFile::new(&persisted, &root);

    let outcome = bootstrap(&[SourceInput::new("src")], file, BootstrapMode::Cold)
        .await
        .unwrap();
    assert_eq!(outcome.aliases.len(), 3);
    let watcher = outcome.watcher.unwrap();
    let mut events = watcher.subscribe();

    fs::rename(root.join("src/gone"), root.join("outside/gone")).unwrap();
    settle(&root, &mut events, 0).await;

    {
        let map = outcome.registry.read().await;
        assert!(!map.contains_key("Leaving"));
        assert!(!map.contains_key("AlsoLeaving"));
        assert!(map.contains_key("Stays"));
    }
    let paths = &read_json(&persisted)["compilerOptions"]["paths"];
    assert!(paths.get("Leaving").is_none());
    assert!(paths.get("AlsoLeaving").is_none());
    assert_eq!(paths["Stays"], json!(["./src/Stays.tsx"]));
}
