//! Database integration tests.
//!
//! All tests require TEST_DATABASE_URL to be set.
//! Run with: TEST_DATABASE_URL=postgres://... cargo test --test db_integration
//!
//! Tests should be run single-threaded to avoid conflicts:
//!   cargo test --test db_integration -- --test-threads=1

mod common;

use researches::db::Database;
use researches::dto::{
    AuthorRequest, IdRef, NamedRequest, ResearchAuthorRef, ResearchFieldRef, ResearchRequest,
    ResearchTagRef,
};
use researches::models::{ResearchStatus, UserType};
use researches::StoreError;

/// Skip the test if TEST_DATABASE_URL is not set.
macro_rules! require_db {
    () => {
        if !common::has_test_db() {
            eprintln!("Skipping: TEST_DATABASE_URL not set");
            return;
        }
    };
}

async fn setup() -> Database {
    common::setup_test_db().await
}

fn request(title: &str, fields: &[i64], tags: &[i64], authors: &[i64]) -> ResearchRequest {
    ResearchRequest {
        title: title.to_string(),
        fields: fields
            .iter()
            .map(|&id| ResearchFieldRef { field: IdRef { id } })
            .collect(),
        tags: tags
            .iter()
            .map(|&id| ResearchTagRef { tag: IdRef { id } })
            .collect(),
        authors: authors
            .iter()
            .map(|&id| ResearchAuthorRef { author: IdRef { id } })
            .collect(),
        ..Default::default()
    }
}

// --- Connectivity ---

#[tokio::test]
async fn connect_and_health_check() {
    require_db!();
    let db = setup().await;
    db.health_check().await.unwrap();
}

#[tokio::test]
async fn migrate_is_idempotent() {
    require_db!();
    let db = setup().await;
    db.migrate().await.unwrap();
    db.migrate().await.unwrap();
    assert_eq!(db.list_fields(10).await.unwrap().len(), 2);
}

// --- Research CRUD ---

#[tokio::test]
async fn create_research_applies_defaults() {
    require_db!();
    let db = setup().await;

    let research = db.create_research(&request("Defaults", &[], &[], &[])).await.unwrap();
    assert_eq!(research.id, 1);
    assert_eq!(research.title, "Defaults");
    assert_eq!(research.summary, "");
    assert_eq!(research.status, ResearchStatus::Ongoing);
    assert_eq!(research.publication_date, "");
    assert_eq!(research.thumbnail, "");
    assert!(research.fields.is_empty());
    assert!(research.tags.is_empty());
    assert!(research.authors.is_empty());
}

#[tokio::test]
async fn create_research_resolves_associations_in_request_order() {
    require_db!();
    let db = setup().await;

    let research = db
        .create_research(&request("Ordered", &[2, 1], &[2, 1], &[2, 1]))
        .await
        .unwrap();
    let field_names: Vec<&str> = research.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(field_names, vec!["Biology", "Computer Science"]);
    assert_eq!(research.tags[0].name, "databases");
    assert_eq!(research.authors[0].name, "Alan Turing");
    assert_eq!(research.authors[0].user_type, UserType::Publicator);
    assert_eq!(research.authors[1].email, "ada@example.org");
}

#[tokio::test]
async fn create_research_with_missing_reference_writes_nothing() {
    require_db!();
    let db = setup().await;

    let err = db
        .create_research(&request("Broken", &[1], &[9], &[1]))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "tag", id: 9 }));
    assert!(db.list_researches(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_research_rejects_invalid_ids_before_writing() {
    require_db!();
    let db = setup().await;

    let err = db
        .create_research(&request("Dup", &[1, 1], &[], &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(db.list_researches(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn get_research_roundtrip_and_missing() {
    require_db!();
    let db = setup().await;

    let created = db.create_research(&request("Roundtrip", &[1], &[1, 2], &[1])).await.unwrap();
    let fetched = db.get_research(created.id).await.unwrap();
    assert_eq!(fetched.title, created.title);
    assert_eq!(fetched.last_updated, created.last_updated);
    assert_eq!(fetched.tags.len(), 2);

    let err = db.get_research(created.id + 100).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "research", .. }));
}

#[tokio::test]
async fn list_researches_orders_by_id_and_limits() {
    require_db!();
    let db = setup().await;

    for title in ["a", "b", "c", "d"] {
        db.create_research(&request(title, &[1], &[], &[])).await.unwrap();
    }
    let all = db.list_researches(100).await.unwrap();
    let titles: Vec<&str> = all.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "b", "c", "d"]);
    assert!(all.iter().all(|r| r.fields.len() == 1));

    let page = db.list_researches(2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[1].title, "b");
}

#[tokio::test]
async fn update_research_replaces_content_and_associations() {
    require_db!();
    let db = setup().await;

    let mut create = request("Before", &[1, 2], &[1], &[1, 2]);
    create.status = Some(ResearchStatus::Ongoing);
    create.publication_date = Some("2023-05-01".to_string());
    create.thumbnail = Some("before.png".to_string());
    let created = db.create_research(&create).await.unwrap();

    let mut update = request("After", &[2], &[], &[2]);
    update.summary = "now with a summary".to_string();
    update.status = Some(ResearchStatus::Finished);
    let updated = db.update_research(created.id, &update).await.unwrap();

    assert_eq!(updated.title, "After");
    assert_eq!(updated.summary, "now with a summary");
    assert_eq!(updated.status, ResearchStatus::Finished);
    // Omitted optional columns keep their stored values.
    assert_eq!(updated.publication_date, "2023-05-01");
    assert_eq!(updated.thumbnail, "before.png");
    assert_eq!(updated.fields.iter().map(|f| f.id).collect::<Vec<_>>(), vec![2]);
    assert!(updated.tags.is_empty());
    assert_eq!(updated.authors.iter().map(|a| a.id).collect::<Vec<_>>(), vec![2]);
    assert!(updated.last_updated > created.last_updated);
}

#[tokio::test]
async fn update_research_missing_id_is_not_found() {
    require_db!();
    let db = setup().await;

    let err = db
        .update_research(55, &request("Nobody", &[], &[], &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "research", id: 55 }));
}

#[tokio::test]
async fn update_research_with_missing_reference_rolls_back() {
    require_db!();
    let db = setup().await;

    let created = db.create_research(&request("Stable", &[1], &[1], &[1])).await.unwrap();
    let err = db
        .update_research(created.id, &request("Changed", &[1], &[1], &[42]))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "author", id: 42 }));

    let fetched = db.get_research(created.id).await.unwrap();
    assert_eq!(fetched.title, "Stable");
    assert_eq!(fetched.authors.len(), 1);
    assert_eq!(fetched.last_updated, created.last_updated);
}

#[tokio::test]
async fn delete_research_removes_row_and_links() {
    require_db!();
    let db = setup().await;

    let created = db.create_research(&request("Gone", &[1, 2], &[1], &[1])).await.unwrap();
    db.delete_research(created.id).await.unwrap();

    let err = db.get_research(created.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM research_fields")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(links, 0);

    let err = db.delete_research(created.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "research", .. }));
}

#[tokio::test]
async fn deleting_research_keeps_catalog_rows() {
    require_db!();
    let db = setup().await;

    let created = db.create_research(&request("Linked", &[1], &[1], &[1])).await.unwrap();
    db.delete_research(created.id).await.unwrap();
    assert_eq!(db.get_field(1).await.unwrap().name, "Computer Science");
    assert_eq!(db.get_tag(1).await.unwrap().name, "rust");
    assert_eq!(db.get_author(1).await.unwrap().name, "Ada Lovelace");
}

// --- Catalogs ---

#[tokio::test]
async fn create_field_trims_and_rejects_duplicates() {
    require_db!();
    let db = setup().await;

    let field = db
        .create_field(&NamedRequest { name: "  Chemistry ".to_string() })
        .await
        .unwrap();
    assert_eq!(field.id, 3);
    assert_eq!(field.name, "Chemistry");

    let err = db
        .create_field(&NamedRequest { name: "Chemistry".to_string() })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "field 'Chemistry' already exists");
}

#[tokio::test]
async fn create_tag_and_list() {
    require_db!();
    let db = setup().await;

    db.create_tag(&NamedRequest { name: "ml".to_string() }).await.unwrap();
    let tags = db.list_tags(100).await.unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["rust", "databases", "ml"]);
    assert_eq!(db.list_tags(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_author_roundtrip() {
    require_db!();
    let db = setup().await;

    let author = db
        .create_author(&AuthorRequest {
            name: "Grace Hopper".to_string(),
            email: " grace@example.org ".to_string(),
            user_type: UserType::Publicator,
        })
        .await
        .unwrap();
    let fetched = db.get_author(author.id).await.unwrap();
    assert_eq!(fetched.email, "grace@example.org");
    assert_eq!(fetched.user_type, UserType::Publicator);
    assert_eq!(db.list_authors(100).await.unwrap().len(), 3);
}

#[tokio::test]
async fn catalog_missing_ids_are_not_found() {
    require_db!();
    let db = setup().await;

    assert!(matches!(
        db.get_field(99).await.unwrap_err(),
        StoreError::NotFound { entity: "field", id: 99 }
    ));
    assert!(matches!(
        db.get_tag(99).await.unwrap_err(),
        StoreError::NotFound { entity: "tag", id: 99 }
    ));
    assert!(matches!(
        db.get_author(99).await.unwrap_err(),
        StoreError::NotFound { entity: "author", id: 99 }
    ));
}
