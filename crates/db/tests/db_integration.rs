//! Repository tests against a real database.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p quill-db --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `quill_test`)
//!   `TEST_DB_PASSWORD` (default: `quill_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use quill_db::entities::{comment, post::PostStatus, post_attachment};
use quill_db::repositories::{
    AttachmentRepository, CategoryRepository, CommentRepository, LikeRepository, PostQuery,
    PostRepository, PostSearchScope, UserFilter, UserRepository,
};
use quill_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::{ActiveModelTrait, Set};

async fn fresh_db() -> TestDatabase {
    TestDatabase::create_unique()
        .await
        .expect("Failed to create test database")
}

async fn seed_comment(db: &TestDatabase, id: &str, post_id: &str, parent_id: Option<&str>) {
    let now = chrono::Utc::now();
    comment::ActiveModel {
        id: Set(id.to_string()),
        post_id: Set(post_id.to_string()),
        author_id: Set("u1".to_string()),
        parent_id: Set(parent_id.map(ToString::to_string)),
        content: Set("hi".to_string()),
        status: Set(comment::CommentStatus::Pending),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db.conn.as_ref())
    .await
    .unwrap();
}

async fn seed_attachment(db: &TestDatabase, id: &str, post_id: &str) {
    post_attachment::ActiveModel {
        id: Set(id.to_string()),
        post_id: Set(post_id.to_string()),
        file_key: Set(format!("blog_attachments/{id}.pdf")),
        url: Set(format!("/media/blog_attachments/{id}.pdf")),
        title: Set(format!("{id}.pdf")),
        description: Set(String::new()),
        content_type: Set("application/pdf".to_string()),
        size: Set(3),
        uploaded_at: Set(chrono::Utc::now().into()),
    }
    .insert(db.conn.as_ref())
    .await
    .unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_like_toggle_round_trip() {
    let db = fresh_db().await;
    db.seed_user("u1", "alice", false).await.unwrap();
    db.seed_post("p1", "u1", None, PostStatus::Published)
        .await
        .unwrap();

    let likes = LikeRepository::new(db.connection());

    let first = likes.toggle("l1".to_string(), "u1", "p1").await.unwrap();
    assert!(first.liked);
    assert_eq!(first.like_count, 1);
    assert!(likes.exists("u1", "p1").await.unwrap());

    let second = likes.toggle("l2".to_string(), "u1", "p1").await.unwrap();
    assert!(!second.liked);
    assert_eq!(second.like_count, 0);
    assert_eq!(likes.count_for_post("p1").await.unwrap(), 0);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_post_delete_cascades_to_its_own_rows() {
    let db = fresh_db().await;
    db.seed_user("u1", "alice", false).await.unwrap();
    db.seed_user("u2", "bob", false).await.unwrap();
    for id in ["p1", "p2"] {
        db.seed_post(id, "u1", None, PostStatus::Published)
            .await
            .unwrap();
    }

    seed_attachment(&db, "a1", "p1").await;
    seed_attachment(&db, "a2", "p2").await;
    seed_comment(&db, "c1", "p1", None).await;
    seed_comment(&db, "c2", "p1", Some("c1")).await;
    seed_comment(&db, "c3", "p2", None).await;

    let likes = LikeRepository::new(db.connection());
    likes.toggle("l1".to_string(), "u1", "p1").await.unwrap();
    likes.toggle("l2".to_string(), "u2", "p1").await.unwrap();
    likes.toggle("l3".to_string(), "u2", "p2").await.unwrap();

    let posts = PostRepository::new(db.connection());
    let attachments = AttachmentRepository::new(db.connection());
    let comments = CommentRepository::new(db.connection());

    posts.delete("p1").await.unwrap();

    assert!(posts.find_by_id("p1").await.unwrap().is_none());
    assert!(attachments.find_by_post("p1").await.unwrap().is_empty());
    assert!(comments.find_by_id("c1").await.unwrap().is_none());
    assert!(comments.find_by_id("c2").await.unwrap().is_none());
    assert_eq!(likes.count_for_post("p1").await.unwrap(), 0);

    // The other post keeps everything
    let other = posts.get_by_id("p2").await.unwrap();
    assert_eq!(other.like_count, 1);
    assert_eq!(likes.count_for_post("p2").await.unwrap(), 1);
    assert_eq!(attachments.find_by_post("p2").await.unwrap().len(), 1);
    assert_eq!(comments.find_by_post("p2").await.unwrap().len(), 1);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_post_search_is_case_insensitive() {
    let db = fresh_db().await;
    db.seed_user("u1", "Alice", false).await.unwrap();
    db.seed_category("c1", "Rust").await.unwrap();
    db.seed_post("p1", "u1", Some("c1"), PostStatus::Published)
        .await
        .unwrap();
    db.seed_post("p2", "u1", None, PostStatus::Draft)
        .await
        .unwrap();

    let posts = PostRepository::new(db.connection());

    let query = PostQuery {
        search: Some("LOREM".to_string()),
        ..PostQuery::published()
    };
    assert_eq!(posts.count(&query).await.unwrap(), 1);

    let by_author = PostQuery {
        search: Some("alice".to_string()),
        scope: PostSearchScope::TitleContentAuthor,
        ..Default::default()
    };
    assert_eq!(posts.count(&by_author).await.unwrap(), 2);

    let by_category = PostQuery {
        category_slug: Some("rust".to_string()),
        ..PostQuery::published()
    };
    assert_eq!(posts.count(&by_category).await.unwrap(), 1);

    let counts = CategoryRepository::new(db.connection())
        .post_counts(true)
        .await
        .unwrap();
    assert_eq!(counts.get("c1"), Some(&1));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_view_count_increment() {
    let db = fresh_db().await;
    db.seed_user("u1", "alice", false).await.unwrap();
    db.seed_post("p1", "u1", None, PostStatus::Published)
        .await
        .unwrap();

    let posts = PostRepository::new(db.connection());
    posts.increment_view_count("p1").await.unwrap();
    posts.increment_view_count("p1").await.unwrap();

    assert_eq!(posts.get_by_id("p1").await.unwrap().view_count, 2);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_bulk_moderation_skips_unknown_ids() {
    let db = fresh_db().await;
    db.seed_user("u1", "alice", false).await.unwrap();
    db.seed_post("p1", "u1", None, PostStatus::Published)
        .await
        .unwrap();

    seed_comment(&db, "c1", "p1", None).await;
    seed_comment(&db, "c2", "p1", None).await;

    let comments = CommentRepository::new(db.connection());
    let ids = vec!["c1".to_string(), "c2".to_string(), "nope".to_string()];
    let updated = comments
        .set_status_many(&ids, comment::CommentStatus::Approved)
        .await
        .unwrap();
    assert_eq!(updated, 2);
    assert_eq!(comments.approved_top_level("p1").await.unwrap().len(), 2);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_user_filters() {
    let db = fresh_db().await;
    db.seed_user("u1", "alice", true).await.unwrap();
    db.seed_user("u2", "bob", false).await.unwrap();

    let users = UserRepository::new(db.connection());
    users.set_active("u2", false).await.unwrap();

    assert_eq!(users.count_search(None, UserFilter::Staff).await.unwrap(), 1);
    assert_eq!(
        users.count_search(None, UserFilter::Inactive).await.unwrap(),
        1
    );
    assert_eq!(
        users
            .count_search(Some("BOB@"), UserFilter::All)
            .await
            .unwrap(),
        1
    );

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_defaults_are_usable() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(config.database_url().starts_with("postgres://"));
}
