//! Integration tests for BandService
//!
//! Tests cover:
//! - Case-insensitive name uniqueness on create and rename
//! - Idempotent link / unconditional unlink
//! - Cascade of links on band delete
//! - Paging and sort direction
//! - Change events published after commit, publish failures swallowed

use artistalbum_bandas::db::{artists, band_artists};
use artistalbum_bandas::pagination::{PageRequest, SortDirection};
use artistalbum_bandas::services::BandService;
use artistalbum_common::db::init_in_memory;
use artistalbum_common::events::{
    ChangeAction, ChangeEvent, ChangePublisher, PublishError, UPDATES_TOPIC,
};
use artistalbum_common::Error;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};

/// Publisher double that records every event
#[derive(Default)]
struct RecordingPublisher {
    published: Mutex<Vec<(String, ChangeEvent)>>,
}

impl RecordingPublisher {
    fn events(&self) -> Vec<(String, ChangeEvent)> {
        self.published.lock().unwrap().clone()
    }

    fn actions(&self) -> Vec<ChangeAction> {
        self.events().into_iter().map(|(_, e)| e.action).collect()
    }
}

impl ChangePublisher for RecordingPublisher {
    fn publish(&self, topic: &str, event: &ChangeEvent) -> Result<(), PublishError> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), event.clone()));
        Ok(())
    }
}

/// Publisher double whose broker is always down
struct FailingPublisher;

impl ChangePublisher for FailingPublisher {
    fn publish(&self, _topic: &str, _event: &ChangeEvent) -> Result<(), PublishError> {
        Err(PublishError::Failed("broker unreachable".to_string()))
    }
}

async fn setup() -> (BandService, Arc<RecordingPublisher>, SqlitePool) {
    let pool = init_in_memory().await.expect("in-memory database");
    let publisher = Arc::new(RecordingPublisher::default());
    let service = BandService::new(pool.clone(), publisher.clone());
    (service, publisher, pool)
}

async fn seed_artist(pool: &SqlitePool, name: &str) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    artists::insert_artist(&mut conn, name).await.unwrap()
}

async fn link_exists(pool: &SqlitePool, band_id: i64, artist_id: i64) -> bool {
    let mut conn = pool.acquire().await.unwrap();
    band_artists::link_exists(&mut conn, band_id, artist_id)
        .await
        .unwrap()
}

// =============================================================================
// Create / update
// =============================================================================

#[tokio::test]
async fn test_create_distinct_names_then_duplicate_ignoring_case() {
    let (service, publisher, _pool) = setup().await;

    let first = service.create("Aerosmith").await.unwrap();
    let second = service.create("Metallica").await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.name, "Aerosmith");
    assert_eq!(first.created_at, first.updated_at);
    assert!(first.artists.is_empty());

    let dup = service.create("aerosmith").await;
    assert!(matches!(dup, Err(Error::Conflict(_))));

    let dup = service.create("AEROSMITH").await;
    assert!(matches!(dup, Err(Error::Conflict(_))));

    // Only the successful creates were announced
    assert_eq!(
        publisher.events(),
        vec![
            (UPDATES_TOPIC.to_string(), ChangeEvent::band(ChangeAction::Created, first.id)),
            (UPDATES_TOPIC.to_string(), ChangeEvent::band(ChangeAction::Created, second.id)),
        ]
    );
}

#[tokio::test]
async fn test_store_unique_violation_maps_to_conflict() {
    let (service, publisher, pool) = setup().await;

    // Simulate a concurrent create landing between the pre-check and the insert
    sqlx::query(
        r#"
        CREATE TRIGGER racing_create BEFORE INSERT ON bands
        WHEN NEW.name = 'Racer'
        BEGIN
            INSERT INTO bands (name, name_key, created_at, updated_at)
            VALUES ('RACER', 'racer', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z');
        END
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let result = service.create("Racer").await;
    assert!(
        matches!(result, Err(Error::Conflict(_))),
        "expected Conflict, got {:?}",
        result
    );
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn test_rename_to_own_name_any_case_never_conflicts() {
    let (service, publisher, _pool) = setup().await;

    let band = service.create("Kiss").await.unwrap();

    let same = service.update(band.id, "Kiss").await.unwrap();
    assert_eq!(same.name, "Kiss");

    let recased = service.update(band.id, "KISS").await.unwrap();
    assert_eq!(recased.name, "KISS");
    assert_eq!(recased.created_at, band.created_at);
    assert!(recased.updated_at >= band.updated_at);

    assert_eq!(
        publisher.actions(),
        vec![ChangeAction::Created, ChangeAction::Updated, ChangeAction::Updated]
    );
}

#[tokio::test]
async fn test_rename_onto_other_band_conflicts() {
    let (service, _publisher, _pool) = setup().await;

    let _rush = service.create("Rush").await.unwrap();
    let yes = service.create("Yes").await.unwrap();

    let result = service.update(yes.id, "rush").await;
    assert!(matches!(result, Err(Error::Conflict(_))));

    // Unchanged after the rejected rename
    assert_eq!(service.get_by_id(yes.id).await.unwrap().name, "Yes");
}

#[tokio::test]
async fn test_update_missing_band_is_not_found() {
    let (service, publisher, _pool) = setup().await;

    let result = service.update(404, "Anything").await;
    match result {
        Err(Error::NotFound(msg)) => assert!(msg.contains("404"), "message was {}", msg),
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn test_update_returns_linked_artists() {
    let (service, _publisher, pool) = setup().await;

    let band = service.create("The Police").await.unwrap();
    let sting = seed_artist(&pool, "Sting").await;
    service.link_artist(band.id, sting).await.unwrap();

    let updated = service.update(band.id, "Police").await.unwrap();
    assert_eq!(updated.artists.len(), 1);
    assert_eq!(updated.artists[0].id, sting);
}

// =============================================================================
// Link / unlink
// =============================================================================

#[tokio::test]
async fn test_link_artist_is_idempotent() {
    let (service, publisher, pool) = setup().await;

    let band = service.create("Aerosmith").await.unwrap();
    let steven = seed_artist(&pool, "Steven Tyler").await;

    assert!(service.link_artist(band.id, steven).await.unwrap());
    assert!(!service.link_artist(band.id, steven).await.unwrap());

    let artists = service.list_artists_of_band(band.id).await.unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0].id, steven);
    assert_eq!(artists[0].name, "Steven Tyler");

    // The second call published nothing
    assert_eq!(
        publisher.actions(),
        vec![ChangeAction::Created, ChangeAction::Linked]
    );
}

#[tokio::test]
async fn test_link_requires_band_and_artist() {
    let (service, publisher, pool) = setup().await;

    let band = service.create("Genesis").await.unwrap();
    let phil = seed_artist(&pool, "Phil Collins").await;

    match service.link_artist(band.id + 1, phil).await {
        Err(Error::NotFound(msg)) => assert!(msg.contains("Band")),
        other => panic!("expected NotFound, got {:?}", other),
    }
    match service.link_artist(band.id, phil + 1).await {
        Err(Error::NotFound(msg)) => assert!(msg.contains("Artist")),
        other => panic!("expected NotFound, got {:?}", other),
    }

    assert_eq!(publisher.actions(), vec![ChangeAction::Created]);
}

#[tokio::test]
async fn test_unlink_missing_link_succeeds() {
    let (service, publisher, pool) = setup().await;

    let band = service.create("Pink Floyd").await.unwrap();
    let roger = seed_artist(&pool, "Roger Waters").await;
    let david = seed_artist(&pool, "David Gilmour").await;
    service.link_artist(band.id, david).await.unwrap();

    service.unlink_artist(band.id, roger).await.unwrap();

    let artists = service.list_artists_of_band(band.id).await.unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0].id, david);

    // Unlink always announces, even when nothing was removed
    assert_eq!(
        publisher.actions(),
        vec![ChangeAction::Created, ChangeAction::Linked, ChangeAction::Unlinked]
    );
}

#[tokio::test]
async fn test_unlink_removes_link() {
    let (service, _publisher, pool) = setup().await;

    let band = service.create("Nirvana").await.unwrap();
    let kurt = seed_artist(&pool, "Kurt Cobain").await;
    service.link_artist(band.id, kurt).await.unwrap();

    service.unlink_artist(band.id, kurt).await.unwrap();

    assert!(!link_exists(&pool, band.id, kurt).await);
    assert!(service.list_artists_of_band(band.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unlink_requires_band_and_artist() {
    let (service, _publisher, pool) = setup().await;

    let band = service.create("Blur").await.unwrap();
    let damon = seed_artist(&pool, "Damon Albarn").await;

    assert!(matches!(
        service.unlink_artist(band.id + 1, damon).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        service.unlink_artist(band.id, damon + 1).await,
        Err(Error::NotFound(_))
    ));
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_cascades_links() {
    let (service, publisher, pool) = setup().await;

    let band = service.create("The Beatles").await.unwrap();
    let john = seed_artist(&pool, "John Lennon").await;
    let paul = seed_artist(&pool, "Paul McCartney").await;
    service.link_artist(band.id, john).await.unwrap();
    service.link_artist(band.id, paul).await.unwrap();

    service.delete(band.id).await.unwrap();

    assert!(matches!(
        service.list_artists_of_band(band.id).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(service.get_by_id(band.id).await, Err(Error::NotFound(_))));
    assert!(!link_exists(&pool, band.id, john).await);
    assert!(!link_exists(&pool, band.id, paul).await);

    // Artists themselves are untouched
    let mut conn = pool.acquire().await.unwrap();
    assert!(artists::exists_by_id(&mut conn, john).await.unwrap());

    assert_eq!(publisher.actions().last(), Some(&ChangeAction::Deleted));
}

#[tokio::test]
async fn test_delete_missing_band_is_not_found() {
    let (service, publisher, _pool) = setup().await;

    assert!(matches!(service.delete(1).await, Err(Error::NotFound(_))));
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn test_deleted_name_can_be_reused() {
    let (service, _publisher, _pool) = setup().await;

    let band = service.create("Oasis").await.unwrap();
    service.delete(band.id).await.unwrap();

    let again = service.create("OASIS").await.unwrap();
    assert_ne!(again.id, band.id);
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_list_all_sorted_with_artists() {
    let (service, _publisher, pool) = setup().await;

    let zz = service.create("ZZ Top").await.unwrap();
    service.create("abba").await.unwrap();
    service.create("Blondie").await.unwrap();
    let billy = seed_artist(&pool, "Billy Gibbons").await;
    service.link_artist(zz.id, billy).await.unwrap();

    let all = service.list_all().await.unwrap();
    let names: Vec<&str> = all.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["abba", "Blondie", "ZZ Top"]);
    assert_eq!(all[2].artists.len(), 1);
    assert_eq!(all[2].artists[0].name, "Billy Gibbons");
}

#[tokio::test]
async fn test_list_artists_of_missing_band_is_not_found() {
    let (service, _publisher, _pool) = setup().await;

    match service.list_artists_of_band(77).await {
        Err(Error::NotFound(msg)) => assert!(msg.contains("77")),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_paging_and_sort_direction() {
    let (service, _publisher, pool) = setup().await;

    for name in ["C", "E", "A", "D", "B"] {
        service.create(name).await.unwrap();
    }
    let band_b = service.list_all().await.unwrap()[1].id;
    let artist = seed_artist(&pool, "Member").await;
    service.link_artist(band_b, artist).await.unwrap();

    let asc = service
        .list_paged(PageRequest::new(0, 2, SortDirection::Asc).unwrap())
        .await
        .unwrap();
    let names: Vec<&str> = asc.content.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(asc.total_elements, 5);
    assert_eq!(asc.total_pages, 3);
    assert_eq!(asc.content[1].artists.len(), 1, "page items carry their artists");

    let desc = service
        .list_paged(PageRequest::new(0, 2, SortDirection::Desc).unwrap())
        .await
        .unwrap();
    let names: Vec<&str> = desc.content.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["E", "D"]);

    let unknown = service
        .list_paged(PageRequest::new(0, 2, SortDirection::parse_lenient("sideways")).unwrap())
        .await
        .unwrap();
    let names: Vec<&str> = unknown.content.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);

    let last = service
        .list_paged(PageRequest::new(2, 2, SortDirection::Asc).unwrap())
        .await
        .unwrap();
    assert_eq!(last.content.len(), 1);
    assert!(last.last);

    let beyond = service
        .list_paged(PageRequest::new(9, 2, SortDirection::Asc).unwrap())
        .await
        .unwrap();
    assert!(beyond.content.is_empty());
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_publish_failure_does_not_fail_or_roll_back() {
    let pool = init_in_memory().await.unwrap();
    let service = BandService::new(pool.clone(), Arc::new(FailingPublisher));

    let band = service.create("Ramones").await.expect("create must succeed");
    let joey = seed_artist(&pool, "Joey Ramone").await;

    assert!(service.link_artist(band.id, joey).await.unwrap());
    let renamed = service.update(band.id, "The Ramones").await.unwrap();
    assert_eq!(renamed.name, "The Ramones");

    // Everything was committed despite every publish failing
    let loaded = service.get_by_id(band.id).await.unwrap();
    assert_eq!(loaded.name, "The Ramones");
    assert_eq!(loaded.artists.len(), 1);

    service.unlink_artist(band.id, joey).await.unwrap();
    service.delete(band.id).await.unwrap();
    assert!(matches!(service.get_by_id(band.id).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_events_carry_band_id_for_every_mutation() {
    let (service, publisher, pool) = setup().await;

    let band = service.create("Muse").await.unwrap();
    let matt = seed_artist(&pool, "Matt Bellamy").await;
    service.update(band.id, "MUSE").await.unwrap();
    service.link_artist(band.id, matt).await.unwrap();
    service.unlink_artist(band.id, matt).await.unwrap();
    service.delete(band.id).await.unwrap();

    let events = publisher.events();
    assert_eq!(events.len(), 5);
    for (topic, event) in &events {
        assert_eq!(topic, UPDATES_TOPIC);
        assert_eq!(event.entity_type, "banda");
        assert_eq!(event.entity_id, band.id);
    }
    assert_eq!(
        publisher.actions(),
        vec![
            ChangeAction::Created,
            ChangeAction::Updated,
            ChangeAction::Linked,
            ChangeAction::Unlinked,
            ChangeAction::Deleted,
        ]
    );
}
