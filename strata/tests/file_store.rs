//! Migration files from disk applied to a directory-backed store.

use std::path::{Path, PathBuf};

use strata::{
    CollectionRules, CollectionSchema, FieldDef, FileStore, MigrationLedger, MigrationRunner, SchemaStore, load_dir,
};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/migrations")
}

fn playlists() -> CollectionSchema {
    CollectionSchema::new("pbc_976091127", "playlists")
        .with_field(FieldDef::text("title").with_id("text724990059"))
        .with_field(FieldDef::relation("user_id", "_pb_users_auth_").with_id("relation2809058197"))
}

fn listenings() -> CollectionSchema {
    CollectionSchema::new("pbc_2234858796", "listenings")
        .with_field(FieldDef::relation("user_id", "_pb_users_auth_").with_id("relation2809058197"))
        .with_field(FieldDef::relation("favorites_id", "pbc_2151843437").with_id("relation2229126836"))
        .with_field(FieldDef::relation("playlists_id", "pbc_976091127").with_id("relation2674970454"))
        .with_field(FieldDef::number("duration").with_id("number2254405824"))
}

fn song_playlists() -> CollectionSchema {
    CollectionSchema::new("pbc_3450146347", "song_playlists")
        .with_field(FieldDef::relation("song_id", "pbc_2396105558").with_id("relation1940373413"))
        .with_field(FieldDef::relation("playlist_id", "pbc_976091127").with_id("relation1182498364"))
}

async fn seeded_store(root: &Path) -> FileStore {
    let mut store = FileStore::open(root).await.unwrap();
    for collection in [playlists(), listenings(), song_playlists()] {
        store.save_collection(&collection).await.unwrap();
    }
    store
}

fn copy_fixtures(to: &Path) {
    std::fs::create_dir_all(to).unwrap();
    for entry in std::fs::read_dir(fixtures()).unwrap() {
        let path = entry.unwrap().path();
        std::fs::copy(&path, to.join(path.file_name().unwrap())).unwrap();
    }
}

#[test]
fn fixtures_load_in_order() {
    let set = load_dir(&fixtures()).unwrap();
    let ids: Vec<&str> = set.iter().map(|unit| unit.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "1747732722_updated_playlists",
            "1749448280_updated_listenings",
            "1749660000_update_song_playlists_permissions",
        ]
    );
    assert!(set.iter().all(|unit| unit.description.is_some()));
}

#[tokio::test]
async fn applies_fixtures_and_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let runner = MigrationRunner::new(load_dir(&fixtures()).unwrap());

    {
        let mut store = seeded_store(dir.path()).await;
        let report = runner.up(&mut store).await.unwrap();
        assert_eq!(report.processed.len(), 3);
    }

    assert!(dir.path().join("collections/pbc_976091127.json").is_file());
    assert!(dir.path().join("_migrations.json").is_file());

    let mut store = FileStore::open(dir.path()).await.unwrap();
    let status = runner.status(&mut store).await.unwrap();
    assert_eq!(status.applied_count(), 3);
    assert_eq!(status.pending_count(), 0);

    let playlists = store.find_collection("playlists").await.unwrap();
    assert_eq!(playlists.fields.position("json3136074139"), Some(2));

    let recent_plays = store.find_collection("recent_plays").await.unwrap();
    assert_eq!(recent_plays.id, "pbc_2234858796");
    let ids: Vec<&str> = recent_plays.fields.iter().map(|field| field.id.as_str()).collect();
    assert_eq!(ids, ["relation2809058197", "number2254405824"]);
    assert!(store.find_collection("listenings").await.unwrap_err().is_not_found());

    let rule = Some("@request.auth.id != \"\"".to_string());
    let song_playlists_rules = store.find_collection("song_playlists").await.unwrap().rules;
    assert_eq!(
        song_playlists_rules,
        CollectionRules {
            list_rule: rule.clone(),
            view_rule: rule.clone(),
            create_rule: rule.clone(),
            update_rule: rule.clone(),
            delete_rule: rule,
        }
    );
}

#[tokio::test]
async fn full_down_restores_seeded_collections() {
    let dir = TempDir::new().unwrap();
    let runner = MigrationRunner::new(load_dir(&fixtures()).unwrap());
    let mut store = seeded_store(dir.path()).await;

    runner.up(&mut store).await.unwrap();
    let report = runner.down(&mut store, 3).await.unwrap();
    assert_eq!(
        report.processed,
        [
            "1749660000_update_song_playlists_permissions",
            "1749448280_updated_listenings",
            "1747732722_updated_playlists",
        ]
    );

    let mut store = FileStore::open(dir.path()).await.unwrap();
    assert_eq!(store.find_collection("pbc_976091127").await.unwrap(), playlists());
    assert_eq!(store.find_collection("pbc_2234858796").await.unwrap(), listenings());
    assert_eq!(store.find_collection("pbc_3450146347").await.unwrap(), song_playlists());
    assert!(store.applied().await.unwrap().is_empty());
}

#[tokio::test]
async fn edited_file_is_reported_as_drift() {
    let dir = TempDir::new().unwrap();
    let migrations = dir.path().join("migrations");
    copy_fixtures(&migrations);

    let mut store = seeded_store(&dir.path().join("data")).await;
    MigrationRunner::new(load_dir(&migrations).unwrap())
        .up(&mut store)
        .await
        .unwrap();

    let edited = migrations.join("1747732722_updated_playlists.json");
    let source = std::fs::read_to_string(&edited).unwrap();
    std::fs::write(&edited, source.replace("Add a songs json field", "Add songs")).unwrap();

    let status = MigrationRunner::new(load_dir(&migrations).unwrap())
        .status(&mut store)
        .await
        .unwrap();
    let drifted: Vec<&str> = status
        .migrations
        .iter()
        .filter(|migration| migration.checksum_mismatch)
        .map(|migration| migration.id.as_str())
        .collect();
    assert_eq!(drifted, ["1747732722_updated_playlists"]);
}

#[tokio::test]
async fn removed_file_shows_up_as_orphan() {
    let dir = TempDir::new().unwrap();
    let migrations = dir.path().join("migrations");
    copy_fixtures(&migrations);

    let mut store = seeded_store(&dir.path().join("data")).await;
    MigrationRunner::new(load_dir(&migrations).unwrap())
        .up(&mut store)
        .await
        .unwrap();

    std::fs::remove_file(migrations.join("1749660000_update_song_playlists_permissions.json")).unwrap();
    let runner = MigrationRunner::new(load_dir(&migrations).unwrap());

    let status = runner.status(&mut store).await.unwrap();
    assert_eq!(status.orphaned.len(), 1);
    assert_eq!(status.orphaned[0].id, "1749660000_update_song_playlists_permissions");

    // the newest record has no unit to revert with
    assert!(runner.down(&mut store, 1).await.is_err());
    assert_eq!(store.applied().await.unwrap().len(), 3);
}
