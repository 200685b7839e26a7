use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::tempdir;
use wikipath_page_store::{
    CacheBackend, PageRepository, PageStoreError, RepositoryConfig, StaticSource,
};

fn source() -> Arc<StaticSource> {
    Arc::new(
        StaticSource::new()
            .with_page("Love", "Love is a feeling of strong affection.", &["Affection", "Apple"])
            .with_page("Apple", "An apple is a round, edible fruit.", &["Fruit"])
            .with_page("AC/DC", "Australian rock band formed in 1973.", &["Rock music"]),
    )
}

fn repo_at(
    path: std::path::PathBuf,
    backend: CacheBackend,
    source: Arc<StaticSource>,
) -> PageRepository {
    PageRepository::new(
        source,
        RepositoryConfig {
            path,
            backend,
            ..RepositoryConfig::default()
        },
    )
}

#[tokio::test]
async fn missing_snapshot_loads_as_empty_cache() {
    let dir = tempdir().unwrap();
    let mut repo = repo_at(dir.path().join("absent.json"), CacheBackend::File, source());
    assert_eq!(repo.load().await.unwrap(), 0);
    assert!(repo.is_empty());
}

#[tokio::test]
async fn file_snapshot_round_trips_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pagecache.json");

    let mut repo = repo_at(path.clone(), CacheBackend::File, source());
    repo.get("Love").await.unwrap();
    repo.get("Apple").await.unwrap();
    repo.get("Apple").await.unwrap();
    repo.get("AC/DC").await.unwrap();
    let report = repo.save().await.unwrap();
    assert_eq!(report.written, 3);
    assert!(report.failed.is_empty());

    let fresh_source = source();
    let mut restored = repo_at(path, CacheBackend::File, fresh_source.clone());
    assert_eq!(restored.load().await.unwrap(), 3);
    assert_eq!(restored.names(), repo.names());
    for name in repo.names() {
        let before = repo.entry(&name).unwrap();
        let after = restored.entry(&name).unwrap();
        assert_eq!(after.page, before.page);
        assert_eq!(after.times_used, before.times_used);
        assert!((after.last_used - before.last_used).abs() < 1e-3);
    }

    restored.get("Apple").await.unwrap();
    assert_eq!(restored.entry("Apple").unwrap().times_used, 3);
    assert_eq!(fresh_source.total_fetches(), 0);
}

#[tokio::test]
async fn file_snapshot_uses_documented_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pagecache.json");

    let mut repo = repo_at(path.clone(), CacheBackend::File, source());
    repo.get("Love").await.unwrap();
    repo.save().await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let love = &raw["Love"];
    assert_eq!(love["data"]["name"], "Love");
    assert_eq!(love["data"]["text"], "love feeling strong affection");
    assert_eq!(love["data"]["links"], serde_json::json!(["Affection", "Apple"]));
    assert_eq!(love["admin"]["timesUsed"], 1);
    assert!(love["admin"]["lastUsed"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn corrupt_snapshot_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pagecache.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut repo = repo_at(path, CacheBackend::File, source());
    let err = repo.load().await.unwrap_err();
    assert!(matches!(err, PageStoreError::SerializationError(_)));
}

#[tokio::test]
async fn sharded_backend_evicts_unstorable_names() {
    let dir = tempdir().unwrap();
    let shard_dir = dir.path().join("pages");

    let mut repo = repo_at(shard_dir.clone(), CacheBackend::Sharded, source());
    repo.get("Love").await.unwrap();
    repo.get("AC/DC").await.unwrap();
    assert_eq!(repo.len(), 2);

    let report = repo.save().await.unwrap();
    assert_eq!(report.written, 1);
    assert_eq!(report.failed, vec!["AC/DC".to_string()]);
    assert!(!repo.contains("AC/DC"));
    assert!(repo.contains("Love"));

    // Evicted entries stay out of later snapshots.
    let report = repo.save().await.unwrap();
    assert_eq!(report.written, 1);
    assert!(report.failed.is_empty());

    let mut restored = repo_at(shard_dir, CacheBackend::Sharded, source());
    assert_eq!(restored.load().await.unwrap(), 1);
    assert_eq!(restored.names(), vec!["Love".to_string()]);
}

#[tokio::test]
async fn sharded_backend_drops_files_with_wrong_identity() {
    let dir = tempdir().unwrap();
    let shard_dir = dir.path().join("pages");

    let mut repo = repo_at(shard_dir.clone(), CacheBackend::Sharded, source());
    repo.get("Love").await.unwrap();
    repo.get("Apple").await.unwrap();
    repo.save().await.unwrap();

    std::fs::rename(shard_dir.join("Apple.json"), shard_dir.join("Pear.json")).unwrap();

    let mut restored = repo_at(shard_dir, CacheBackend::Sharded, source());
    assert_eq!(restored.load().await.unwrap(), 1);
    assert!(restored.contains("Love"));
    assert!(!restored.contains("Apple"));
    assert!(!restored.contains("Pear"));
}

#[tokio::test]
async fn sharded_save_overwrites_previous_snapshot() {
    let dir = tempdir().unwrap();
    let shard_dir = dir.path().join("pages");

    let mut first = repo_at(shard_dir.clone(), CacheBackend::Sharded, source());
    first.get("Love").await.unwrap();
    first.get("Apple").await.unwrap();
    first.save().await.unwrap();

    let mut second = repo_at(shard_dir.clone(), CacheBackend::Sharded, source());
    second.get("Apple").await.unwrap();
    second.save().await.unwrap();

    let mut restored = repo_at(shard_dir, CacheBackend::Sharded, source());
    restored.load().await.unwrap();
    assert_eq!(restored.names(), vec!["Apple".to_string()]);
}

#[tokio::test]
async fn memory_backend_persists_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pagecache.json");

    let mut repo = repo_at(path.clone(), CacheBackend::Memory, source());
    repo.get("Love").await.unwrap();
    let report = repo.save().await.unwrap();
    assert_eq!(report.written, 0);
    assert!(!path.exists());
}
