//! Service-level flows against a real database.
//!
//! These tests require a running `PostgreSQL` instance, configured through
//! the same `TEST_DB_*` variables as the quill-db integration tests.
//! Run with: `cargo test -p quill-core --test blog_flow -- --ignored`

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use bytes::Bytes;
use quill_common::{AppError, LocalStorage};
use quill_core::{
    CategoryInput, CategoryService, CreatePostInput, FileUpload, LikeService, PostService,
};
use quill_db::repositories::{
    AttachmentRepository, CategoryRepository, LikeRepository, PostRepository, UserRepository,
};
use quill_db::test_utils::TestDatabase;

struct Services {
    categories: CategoryService,
    posts: PostService,
    likes: LikeService,
}

fn services(db: &TestDatabase, media_root: std::path::PathBuf) -> Services {
    let category_repo = CategoryRepository::new(db.connection());
    let post_repo = PostRepository::new(db.connection());
    let storage = Arc::new(LocalStorage::new(media_root, "/media".to_string()));

    Services {
        categories: CategoryService::new(category_repo.clone(), post_repo.clone()),
        posts: PostService::new(
            post_repo,
            category_repo,
            UserRepository::new(db.connection()),
            AttachmentRepository::new(db.connection()),
            storage,
        ),
        likes: LikeService::new(LikeRepository::new(db.connection())),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_category_in_use_until_its_post_is_deleted() {
    let db = TestDatabase::create_unique()
        .await
        .expect("Failed to create test database");
    let media = std::env::temp_dir().join(format!("quill-flow-{}", ulid_suffix()));
    let svc = services(&db, media.clone());

    db.seed_user("u1", "alice", true).await.unwrap();

    let tech = svc
        .categories
        .create(CategoryInput {
            name: "Tech".to_string(),
            description: None,
        })
        .await
        .unwrap();
    assert_eq!(tech.slug, "tech");

    let post = svc
        .posts
        .create(
            "u1",
            CreatePostInput {
                title: "Hello World".to_string(),
                content: "Body".to_string(),
                category_id: Some(tech.id.clone()),
                status: Some("published".to_string()),
                attachments: vec![FileUpload {
                    file_name: "slides.pdf".to_string(),
                    content_type: "application/pdf".to_string(),
                    data: Bytes::from_static(b"pdf"),
                }],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(post.slug, "hello-world");
    assert_eq!(svc.posts.attachments(&post.id).await.unwrap().len(), 1);

    let liked = svc.likes.toggle("u1", &post.id).await.unwrap();
    assert!(liked.liked);
    assert_eq!(liked.like_count, 1);

    let unliked = svc.likes.toggle("u1", &post.id).await.unwrap();
    assert!(!unliked.liked);
    assert_eq!(unliked.like_count, 0);

    let err = svc.categories.delete(&tech.id).await.unwrap_err();
    assert!(matches!(err, AppError::CategoryInUse(ref name) if name == "Tech"));

    svc.posts.delete(&post.id).await.unwrap();
    svc.categories.delete(&tech.id).await.unwrap();
    assert!(svc.categories.list().await.unwrap().is_empty());

    let _ = tokio::fs::remove_dir_all(media).await;
    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_titles_get_suffixed_slugs() {
    let db = TestDatabase::create_unique()
        .await
        .expect("Failed to create test database");
    let media = std::env::temp_dir().join(format!("quill-flow-{}", ulid_suffix()));
    let svc = services(&db, media.clone());

    db.seed_user("u1", "alice", true).await.unwrap();

    let title = "x".repeat(200);
    let mut slugs = Vec::new();
    for _ in 0..2 {
        let post = svc
            .posts
            .create(
                "u1",
                CreatePostInput {
                    title: title.clone(),
                    content: "Body".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        slugs.push(post.slug);
    }

    assert_eq!(slugs[0].len(), 200);
    assert_eq!(slugs[1].len(), 200);
    assert!(slugs[1].ends_with("-2"));

    let _ = tokio::fs::remove_dir_all(media).await;
    db.drop_database().await.unwrap();
}

fn ulid_suffix() -> String {
    quill_common::IdGenerator::new().generate()
}
