//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use serde_json::{Map, json};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    MarathonFilter, MarathonId, MarathonStore, NewMarathon, NewRegistration, PostgresStore,
    RegistrationFilter, RegistrationStore, SortOrder,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            // Run migrations using raw_sql to execute multiple statements
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_marathon_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    // Create a fresh pool for each test to avoid connection issues
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE marathons, registrations")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn new_marathon(title: &str, creator: &str) -> NewMarathon {
    let mut fields = Map::new();
    fields.insert("title".to_string(), json!(title));
    fields.insert("location".to_string(), json!("Springfield"));
    NewMarathon {
        creator_email: creator.to_string(),
        fields,
    }
}

fn new_registration(marathon_id: MarathonId, email: &str, title: &str) -> NewRegistration {
    let mut fields = Map::new();
    fields.insert("shirtSize".to_string(), json!("M"));
    NewRegistration {
        marathon_id,
        email: email.to_string(),
        marathon_title: title.to_string(),
        fields,
    }
}

#[tokio::test]
#[serial]
async fn insert_and_get_marathon() {
    let store = get_test_store().await;

    let id = store
        .insert_marathon(new_marathon("City Run", "organizer@example.com"))
        .await
        .unwrap();

    let marathon = store.get_marathon(id).await.unwrap().unwrap();
    assert_eq!(marathon.id, id);
    assert_eq!(marathon.creator_email, "organizer@example.com");
    assert_eq!(marathon.total_registration_count, 0);
    assert_eq!(marathon.fields["title"], json!("City Run"));
    assert_eq!(marathon.fields["location"], json!("Springfield"));
}

#[tokio::test]
#[serial]
async fn insert_strips_protected_fields_from_submission() {
    let store = get_test_store().await;

    let mut new = new_marathon("City Run", "organizer@example.com");
    new.fields
        .insert("totalRegistrationCount".to_string(), json!(0));
    new.fields.insert("id".to_string(), json!("bogus"));
    let id = store.insert_marathon(new).await.unwrap();

    // The echoed counter must not shadow the typed one
    store.adjust_registration_count(id, 1).await.unwrap();
    let marathon = store.get_marathon(id).await.unwrap().unwrap();
    assert!(!marathon.fields.contains_key("totalRegistrationCount"));
    assert!(!marathon.fields.contains_key("id"));
    let value = serde_json::to_value(&marathon).unwrap();
    assert_eq!(value["totalRegistrationCount"], 1);

    let mut new = new_registration(MarathonId::new(), "runner@example.com", "City Run");
    new.fields.insert("id".to_string(), json!("bogus"));
    let id = store.insert_registration(new).await.unwrap();
    let registration = store.get_registration(id).await.unwrap().unwrap();
    assert!(!registration.fields.contains_key("id"));
}

#[tokio::test]
#[serial]
async fn update_drops_non_string_value_for_typed_column() {
    let store = get_test_store().await;
    let id = store
        .insert_marathon(new_marathon("City Run", "organizer@example.com"))
        .await
        .unwrap();

    let mut patch = Map::new();
    patch.insert("creatorEmail".to_string(), json!(42));
    patch.insert("location".to_string(), json!("Shelbyville"));
    let matched = store.update_marathon_fields(id, patch).await.unwrap();
    assert_eq!(matched, 1);

    let marathon = store.get_marathon(id).await.unwrap().unwrap();
    assert_eq!(marathon.creator_email, "organizer@example.com");
    assert_eq!(marathon.fields["location"], json!("Shelbyville"));
    assert!(!marathon.fields.contains_key("creatorEmail"));
}

#[tokio::test]
#[serial]
async fn get_missing_marathon_returns_none() {
    let store = get_test_store().await;

    let result = store.get_marathon(MarathonId::new()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
#[serial]
async fn list_marathons_filters_by_creator() {
    let store = get_test_store().await;

    store
        .insert_marathon(new_marathon("One", "a@example.com"))
        .await
        .unwrap();
    store
        .insert_marathon(new_marathon("Two", "b@example.com"))
        .await
        .unwrap();
    store
        .insert_marathon(new_marathon("Three", "a@example.com"))
        .await
        .unwrap();

    let mine = store
        .list_marathons(MarathonFilter::new().by_creator("a@example.com"))
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|m| m.creator_email == "a@example.com"));
}

#[tokio::test]
#[serial]
async fn list_marathons_sorts_and_limits() {
    let store = get_test_store().await;

    for title in ["First", "Second", "Third"] {
        store
            .insert_marathon(new_marathon(title, "organizer@example.com"))
            .await
            .unwrap();
    }

    let ascending = store.list_marathons(MarathonFilter::new()).await.unwrap();
    assert_eq!(ascending.len(), 3);
    assert!(
        ascending
            .windows(2)
            .all(|w| w[0].created_at <= w[1].created_at)
    );

    let descending = store
        .list_marathons(MarathonFilter::new().sorted(SortOrder::Descending))
        .await
        .unwrap();
    assert!(
        descending
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at)
    );

    let capped = store
        .list_marathons(MarathonFilter::new().with_limit(2))
        .await
        .unwrap();
    assert_eq!(capped.len(), 2);
}

#[tokio::test]
#[serial]
async fn update_marathon_merges_fields() {
    let store = get_test_store().await;
    let id = store
        .insert_marathon(new_marathon("City Run", "organizer@example.com"))
        .await
        .unwrap();

    let mut patch = Map::new();
    patch.insert("location".to_string(), json!("Shelbyville"));
    patch.insert("totalRegistrationCount".to_string(), json!(99));

    let matched = store.update_marathon_fields(id, patch).await.unwrap();
    assert_eq!(matched, 1);

    let marathon = store.get_marathon(id).await.unwrap().unwrap();
    assert_eq!(marathon.fields["title"], json!("City Run"));
    assert_eq!(marathon.fields["location"], json!("Shelbyville"));
    // Protected field untouched
    assert_eq!(marathon.total_registration_count, 0);
}

#[tokio::test]
#[serial]
async fn update_missing_marathon_matches_nothing() {
    let store = get_test_store().await;

    let mut patch = Map::new();
    patch.insert("location".to_string(), json!("Nowhere"));

    let matched = store
        .update_marathon_fields(MarathonId::new(), patch)
        .await
        .unwrap();
    assert_eq!(matched, 0);
}

#[tokio::test]
#[serial]
async fn delete_marathon_is_idempotent() {
    let store = get_test_store().await;
    let id = store
        .insert_marathon(new_marathon("City Run", "organizer@example.com"))
        .await
        .unwrap();

    assert_eq!(store.delete_marathon(id).await.unwrap(), 1);
    assert_eq!(store.delete_marathon(id).await.unwrap(), 0);
    assert!(store.get_marathon(id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn adjust_and_set_registration_count() {
    let store = get_test_store().await;
    let id = store
        .insert_marathon(new_marathon("City Run", "organizer@example.com"))
        .await
        .unwrap();

    assert_eq!(store.adjust_registration_count(id, 1).await.unwrap(), 1);
    assert_eq!(store.adjust_registration_count(id, 1).await.unwrap(), 1);
    assert_eq!(store.adjust_registration_count(id, -1).await.unwrap(), 1);

    let marathon = store.get_marathon(id).await.unwrap().unwrap();
    assert_eq!(marathon.total_registration_count, 1);

    assert_eq!(store.set_registration_count(id, 5).await.unwrap(), 1);
    let marathon = store.get_marathon(id).await.unwrap().unwrap();
    assert_eq!(marathon.total_registration_count, 5);

    // Missing marathon: no match, no error
    assert_eq!(
        store
            .adjust_registration_count(MarathonId::new(), 1)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
#[serial]
async fn insert_and_list_registrations() {
    let store = get_test_store().await;
    let marathon_id = MarathonId::new();

    let id = store
        .insert_registration(new_registration(
            marathon_id,
            "runner@example.com",
            "City Run",
        ))
        .await
        .unwrap();

    let registration = store.get_registration(id).await.unwrap().unwrap();
    assert_eq!(registration.marathon_id, marathon_id);
    assert_eq!(registration.email, "runner@example.com");
    assert_eq!(registration.fields["shirtSize"], json!("M"));

    let listed = store
        .list_registrations(RegistrationFilter::new().by_email("runner@example.com"))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
}

#[tokio::test]
#[serial]
async fn registration_title_search_is_case_insensitive() {
    let store = get_test_store().await;
    let marathon_id = MarathonId::new();

    for title in ["City Run", "Desert Dash"] {
        store
            .insert_registration(new_registration(marathon_id, "runner@example.com", title))
            .await
            .unwrap();
    }

    let hits = store
        .list_registrations(
            RegistrationFilter::new()
                .by_email("runner@example.com")
                .with_title_search("city"),
        )
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].marathon_title, "City Run");
}

#[tokio::test]
#[serial]
async fn registration_title_search_escapes_wildcards() {
    let store = get_test_store().await;
    let marathon_id = MarathonId::new();

    store
        .insert_registration(new_registration(
            marathon_id,
            "runner@example.com",
            "100% Trail",
        ))
        .await
        .unwrap();
    store
        .insert_registration(new_registration(
            marathon_id,
            "runner@example.com",
            "City Run",
        ))
        .await
        .unwrap();

    // A literal % must not match everything
    let hits = store
        .list_registrations(RegistrationFilter::new().with_title_search("100%"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].marathon_title, "100% Trail");
}

#[tokio::test]
#[serial]
async fn update_registration_keeps_protected_fields() {
    let store = get_test_store().await;
    let marathon_id = MarathonId::new();
    let id = store
        .insert_registration(new_registration(
            marathon_id,
            "runner@example.com",
            "City Run",
        ))
        .await
        .unwrap();

    let mut patch = Map::new();
    patch.insert("shirtSize".to_string(), json!("L"));
    patch.insert("marathonId".to_string(), json!(MarathonId::new()));

    let matched = store.update_registration_fields(id, patch).await.unwrap();
    assert_eq!(matched, 1);

    let registration = store.get_registration(id).await.unwrap().unwrap();
    assert_eq!(registration.fields["shirtSize"], json!("L"));
    assert_eq!(registration.marathon_id, marathon_id);
}

#[tokio::test]
#[serial]
async fn delete_registration_and_count() {
    let store = get_test_store().await;
    let marathon_id = MarathonId::new();

    let first = store
        .insert_registration(new_registration(marathon_id, "a@example.com", "City Run"))
        .await
        .unwrap();
    store
        .insert_registration(new_registration(marathon_id, "b@example.com", "City Run"))
        .await
        .unwrap();

    assert_eq!(store.count_for_marathon(marathon_id).await.unwrap(), 2);

    assert_eq!(store.delete_registration(first).await.unwrap(), 1);
    assert_eq!(store.delete_registration(first).await.unwrap(), 0);

    assert_eq!(store.count_for_marathon(marathon_id).await.unwrap(), 1);
}
