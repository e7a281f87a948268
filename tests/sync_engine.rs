use ddmsync_lib::core::scanner::ScanConfig;
use ddmsync_lib::remote::ApiCall;
use ddmsync_lib::{MemoryApi, NotifyStatus, Reporter, SyncConfig, SyncEngine, SyncError, SyncReport};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn declaration(id: &str) -> String {
    format!(
        r#"{{"Type":"com.apple.management.properties","Payload":{{"id":"{}"}},"Identifier":"{}"}}"#,
        id, id
    )
}

async fn sync(api: &Arc<MemoryApi>, root: &Path) -> SyncReport {
    sync_with(api, root, 1).await
}

async fn sync_with(api: &Arc<MemoryApi>, root: &Path, concurrency: usize) -> SyncReport {
    let engine = SyncEngine::with_config(
        api.clone(),
        SyncConfig {
            scan_config: ScanConfig::default(),
            max_concurrent_uploads: concurrency,
        },
    );
    engine.run_sync(root, Reporter::quiet()).await.unwrap()
}

fn rendered(report: &SyncReport) -> Vec<String> {
    report.lines.iter().map(|l| l.to_string()).collect()
}

#[tokio::test]
async fn test_only_ignorable_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "README.md", "hello");
    write(dir.path(), "notes/set.txt", "id1");
    write(dir.path(), "notes/a.json.bak", "{}");

    let api = Arc::new(MemoryApi::new());
    let report = sync(&api, dir.path()).await;

    assert!(api.calls().is_empty());
    assert_eq!(report.files_ignored, 3);
    assert_eq!(report.notify, NotifyStatus::NotNeeded);
    assert_eq!(rendered(&report), vec!["no changed declarations or sets"]);
}

#[tokio::test]
async fn test_single_declaration_and_set() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a/x.json", r#"{"Identifier":"id1"}"#);
    write(dir.path(), "b/set.default.txt", "id1\n");

    let api = Arc::new(MemoryApi::new());
    let report = sync(&api, dir.path()).await;

    assert_eq!(
        api.calls(),
        vec![
            ApiCall::UpsertDeclaration {
                identifier: "id1".to_string()
            },
            ApiCall::Associate {
                set: "default".to_string(),
                declaration: "id1".to_string()
            },
            ApiCall::Notify {
                declarations: vec!["id1".to_string()],
                sets: vec!["default".to_string()]
            },
        ]
    );
    assert_eq!(
        rendered(&report),
        vec![
            "changed declaration id1",
            "associated declaration id1 with set default",
            "changed declarations (1): id1",
            "changed sets (1): default",
            "sent notify",
        ]
    );
    assert_eq!(report.notify, NotifyStatus::Sent);
    assert_eq!(api.set_members("default"), vec!["id1"]);
}

#[tokio::test]
async fn test_second_run_is_unchanged() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.json", &declaration("a"));
    write(dir.path(), "b.json", &declaration("b"));
    write(dir.path(), "set.default.txt", "a\nb\n");

    let api = Arc::new(MemoryApi::new());
    sync(&api, dir.path()).await;
    assert_eq!(api.notify_calls().len(), 1);

    let second = sync(&api, dir.path()).await;
    assert_eq!(api.notify_calls().len(), 1);
    assert!(second.changed_declarations.is_empty());
    assert!(second.changed_sets.is_empty());
    assert_eq!(second.unchanged_declarations.len(), 2);
    assert_eq!(second.unchanged_sets, vec!["default"]);
    assert_eq!(
        rendered(&second),
        vec![
            "unchanged declarations: 2",
            "unchanged sets: 1",
            "no changed declarations or sets",
        ]
    );
}

#[tokio::test]
async fn test_declarations_precede_sets() {
    let dir = TempDir::new().unwrap();
    // 集合文件排在声明文件之前
    write(dir.path(), "0/set.first.txt", "z\n");
    write(dir.path(), "1/set.second.txt", "y\n");
    for id in ["y", "z", "w", "v"] {
        write(dir.path(), &format!("9/{}.json", id), &declaration(id));
    }

    let api = Arc::new(MemoryApi::new());
    let report = sync_with(&api, dir.path(), 3).await;

    let calls = api.calls();
    let last_upsert = calls
        .iter()
        .rposition(|c| matches!(c, ApiCall::UpsertDeclaration { .. }))
        .unwrap();
    let first_set_call = calls
        .iter()
        .position(|c| matches!(c, ApiCall::Associate { .. } | ApiCall::Dissociate { .. }))
        .unwrap();
    assert!(last_upsert < first_set_call);
    assert!(matches!(calls.last(), Some(ApiCall::Notify { .. })));
    assert_eq!(report.changed_sets.len(), 2);
    assert_eq!(report.failures, 0);
}

#[tokio::test]
async fn test_set_directives() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.json", &declaration("a"));
    write(dir.path(), "b.json", &declaration("b"));
    write(dir.path(), "set.s1.txt", "# comment\n\na\n   \nb\n");

    let api = Arc::new(MemoryApi::new());
    sync(&api, dir.path()).await;
    assert_eq!(api.set_members("s1"), vec!["a", "b"]);

    // 移除 b：集合视为已变更
    write(dir.path(), "set.s1.txt", "a\n-b\n");
    let report = sync(&api, dir.path()).await;
    assert_eq!(api.set_members("s1"), vec!["a"]);
    assert_eq!(report.changed_sets, vec!["s1"]);
    assert!(rendered(&report).contains(&"dissociated declaration b from set s1".to_string()));

    let set_calls: Vec<ApiCall> = api
        .calls()
        .into_iter()
        .filter(|c| matches!(c, ApiCall::Associate { .. } | ApiCall::Dissociate { .. }))
        .collect();
    assert_eq!(set_calls.len(), 4);
    assert_eq!(
        set_calls[3],
        ApiCall::Dissociate {
            set: "s1".to_string(),
            declaration: "b".to_string()
        }
    );
}

#[tokio::test]
async fn test_comment_only_set_is_unchanged() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "set.empty.txt", "# nothing yet\n\n");

    let api = Arc::new(MemoryApi::new());
    let report = sync(&api, dir.path()).await;

    assert!(api.calls().is_empty());
    assert_eq!(report.unchanged_sets, vec!["empty"]);
    assert_eq!(report.notify, NotifyStatus::NotNeeded);
}

#[tokio::test]
async fn test_malformed_declaration_is_isolated() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "bad.json", "{not json");
    write(dir.path(), "noid.json", r#"{"Type":"com.apple.management.properties"}"#);
    write(dir.path(), "good.json", &declaration("good"));

    let api = Arc::new(MemoryApi::new());
    let report = sync(&api, dir.path()).await;

    assert_eq!(
        api.calls().first(),
        Some(&ApiCall::UpsertDeclaration {
            identifier: "good".to_string()
        })
    );
    assert_eq!(report.changed_declarations, vec!["good"]);
    assert_eq!(report.failures, 2);
    let errors: Vec<String> = rendered(&report)
        .into_iter()
        .filter(|l| l.starts_with("ERROR parsing "))
        .collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(report.notify, NotifyStatus::Sent);
}

#[tokio::test]
async fn test_failed_association_keeps_going() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.json", &declaration("a"));
    write(dir.path(), "set.default.txt", "missing\na\n");

    let api = Arc::new(MemoryApi::new());
    let report = sync(&api, dir.path()).await;

    assert_eq!(api.set_members("default"), vec!["a"]);
    assert_eq!(report.changed_sets, vec!["default"]);
    assert_eq!(report.failures, 1);
    assert!(rendered(&report).iter().any(|l| l.starts_with(
        "ERROR associating missing with default (set.default.txt): HTTP Error 400"
    )));
}

#[tokio::test]
async fn test_transport_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.json", &declaration("a"));
    write(dir.path(), "b.json", &declaration("b"));

    let api = Arc::new(MemoryApi::new());
    api.fail_transport_for("a");
    let report = sync(&api, dir.path()).await;

    assert_eq!(report.changed_declarations, vec!["b"]);
    assert_eq!(report.failures, 1);
    assert!(rendered(&report)
        .iter()
        .any(|l| l.starts_with("ERROR uploading a.json: ")));
}

#[tokio::test]
async fn test_unexpected_upload_status_is_neither() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.json", &declaration("a"));

    let api = Arc::new(MemoryApi::new());
    api.set_write_status(200);
    let report = sync(&api, dir.path()).await;

    assert!(report.changed_declarations.is_empty());
    assert!(report.unchanged_declarations.is_empty());
    assert_eq!(report.failures, 0);
    assert_eq!(report.notify, NotifyStatus::NotNeeded);
    assert_eq!(
        rendered(&report),
        vec![
            "WARNING: unknown status code declaration: 200",
            "no changed declarations or sets",
        ]
    );
}

#[tokio::test]
async fn test_unexpected_set_status_is_not_a_change() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "set.s1.txt", "a\n-b\n");

    let api = Arc::new(MemoryApi::new());
    api.set_write_status(200);
    let report = sync(&api, dir.path()).await;

    assert_eq!(api.calls().len(), 2);
    assert!(report.changed_sets.is_empty());
    assert_eq!(report.unchanged_sets, vec!["s1"]);
    assert_eq!(report.failures, 0);
    assert_eq!(
        rendered(&report),
        vec![
            "WARNING: unknown status code sets: 200",
            "WARNING: unknown status code sets: 200",
            "unchanged sets: 1",
            "no changed declarations or sets",
        ]
    );
}

#[tokio::test]
async fn test_notify_failure_status() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.json", &declaration("a"));

    let api = Arc::new(MemoryApi::new());
    api.set_notify_status(500);
    let report = sync(&api, dir.path()).await;

    assert_eq!(report.notify, NotifyStatus::Failed("HTTP Error 500".to_string()));
    assert_eq!(
        rendered(&report).last().map(String::as_str),
        Some("ERROR notifying to memory:///notify?declaration=a: HTTP Error 500")
    );
}

#[tokio::test]
async fn test_concurrent_uploads_match_sequential() {
    let dir = TempDir::new().unwrap();
    let ids: Vec<String> = (0..20).map(|i| format!("decl-{:02}", i)).collect();
    for id in &ids {
        write(dir.path(), &format!("d/{}.json", id), &declaration(id));
    }
    write(dir.path(), "set.all.txt", &ids.join("\n"));

    let sequential_api = Arc::new(MemoryApi::new());
    let sequential = sync_with(&sequential_api, dir.path(), 1).await;
    let parallel_api = Arc::new(MemoryApi::new());
    let parallel = sync_with(&parallel_api, dir.path(), 8).await;

    let mut a = sequential.changed_declarations.clone();
    let mut b = parallel.changed_declarations.clone();
    a.sort();
    b.sort();
    assert_eq!(a, ids);
    assert_eq!(a, b);
    assert_eq!(sequential.changed_sets, parallel.changed_sets);
    assert_eq!(parallel_api.notify_calls().len(), 1);
    assert_eq!(parallel_api.set_members("all"), ids);
}

#[tokio::test]
async fn test_missing_root_makes_no_calls() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(MemoryApi::new());
    let engine = SyncEngine::new(api.clone());

    let err = engine
        .run_sync(&dir.path().join("nope"), Reporter::quiet())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::RootNotFound(_)));

    write(dir.path(), "file.json", "{}");
    let err = engine
        .run_sync(&dir.path().join("file.json"), Reporter::quiet())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::RootNotDirectory(_)));

    assert!(api.calls().is_empty());
}
