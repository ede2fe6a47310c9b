//! Post service: authoring, attachments, listings and view counting.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use quill_common::{
    AppError, AppResult, IdGenerator, SessionData, StorageBackend, UploadedFile,
    generate_storage_key,
};
use quill_db::{
    entities::{category, post, post::PostStatus, post_attachment},
    repositories::{
        AttachmentRepository, CategoryRepository, PostQuery, PostRepository, PostSearchScope,
        UserRepository,
    },
};
use sea_orm::Set;
use serde::Serialize;
use tracing::{info, warn};

use crate::query::{PageRequest, Paginated};
use crate::text::{
    check_length, derive_excerpt, limits, non_blank, slugify, suffixed_slug, truncate_slug,
};

/// Featured and related post strips show at most this many posts.
pub const STRIP_SIZE: u64 = 3;

const IMAGE_FOLDER: &str = "blog_images";
const ATTACHMENT_FOLDER: &str = "blog_attachments";

/// Filter value meaning "no filter" in admin listings.
pub const ANY: &str = "all";

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    category_repo: CategoryRepository,
    user_repo: UserRepository,
    attachment_repo: AttachmentRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

/// A file received from a form.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Input for creating a post.
#[derive(Debug, Clone, Default)]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub category_id: Option<String>,
    /// `draft` or `published`; drafts when absent.
    pub status: Option<String>,
    pub is_featured: bool,
    pub featured_image: Option<FileUpload>,
    pub attachments: Vec<FileUpload>,
}

/// Input for editing a post. Absent fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    /// A blank excerpt is derived again from the content.
    pub excerpt: Option<String>,
    /// An empty id clears the category.
    pub category_id: Option<String>,
    pub status: Option<String>,
    pub is_featured: Option<bool>,
    /// Replaces the current image.
    pub featured_image: Option<FileUpload>,
    /// Appended to the existing attachments.
    pub attachments: Vec<FileUpload>,
}

/// Listing filters coming from a query string.
#[derive(Debug, Clone, Default)]
pub struct PostFilters {
    pub search: Option<String>,
    pub category_slug: Option<String>,
}

/// Category fields shown next to a post.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl From<category::Model> for CategoryRef {
    fn from(category: category::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
        }
    }
}

/// A post with its author's username and its category.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: post::Model,
    pub author: String,
    pub category: Option<CategoryRef>,
}

fn parse_status(value: Option<&str>) -> AppResult<Option<PostStatus>> {
    match non_blank(value) {
        None => Ok(None),
        Some(raw) => PostStatus::parse(raw)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Invalid status: {raw}"))),
    }
}

fn attachment_title(file_name: &str) -> String {
    file_name.chars().take(limits::ATTACHMENT_TITLE).collect()
}

/// Refuse uploads whose metadata would not fit the attachment columns.
fn check_uploads<'a>(uploads: impl IntoIterator<Item = &'a FileUpload>) -> AppResult<()> {
    for upload in uploads {
        check_length("Content type", &upload.content_type, limits::CONTENT_TYPE)?;
    }
    Ok(())
}

/// Files written to storage ahead of the rows that reference them.
#[derive(Default)]
struct StagedFiles {
    image: Option<UploadedFile>,
    attachments: Vec<post_attachment::ActiveModel>,
    keys: Vec<String>,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        category_repo: CategoryRepository,
        user_repo: UserRepository,
        attachment_repo: AttachmentRepository,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            post_repo,
            category_repo,
            user_repo,
            attachment_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    async fn check_category(&self, category_id: &str) -> AppResult<()> {
        if self.category_repo.find_by_id(category_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Category does not exist: {category_id}"
            )));
        }
        Ok(())
    }

    async fn unique_slug(
        &self,
        title: &str,
        fallback: &str,
        except_id: Option<&str>,
    ) -> AppResult<String> {
        let base = match slugify(title) {
            slug if slug.is_empty() => fallback.to_string(),
            slug => truncate_slug(&slug, limits::POST_SLUG),
        };

        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.post_repo.slug_exists(&candidate, except_id).await? {
            candidate = suffixed_slug(&base, suffix, limits::POST_SLUG);
            suffix += 1;
        }
        Ok(candidate)
    }

    /// Remove blobs, logging instead of failing.
    async fn discard_blobs(&self, keys: Vec<String>) {
        let deletions = keys.iter().map(|key| self.storage.delete(key));
        for (key, result) in keys.iter().zip(futures::future::join_all(deletions).await) {
            if let Err(e) = result {
                warn!(key = %key, error = %e, "Failed to remove stored file");
            }
        }
    }

    /// Store the image and attachments of `post_id`.
    ///
    /// Nothing stays in storage when one of the uploads fails.
    async fn stage_files(
        &self,
        post_id: &str,
        image: Option<&FileUpload>,
        attachments: &[FileUpload],
    ) -> AppResult<StagedFiles> {
        let mut staged = StagedFiles::default();

        if let Some(upload) = image {
            let key = generate_storage_key(IMAGE_FOLDER, &upload.file_name);
            let file = self
                .storage
                .upload(&key, &upload.data, &upload.content_type)
                .await?;
            staged.keys.push(file.key.clone());
            staged.image = Some(file);
        }

        for upload in attachments {
            let key = generate_storage_key(ATTACHMENT_FOLDER, &upload.file_name);
            let file = match self
                .storage
                .upload(&key, &upload.data, &upload.content_type)
                .await
            {
                Ok(file) => file,
                Err(e) => {
                    self.discard_blobs(staged.keys).await;
                    return Err(e);
                }
            };
            staged.keys.push(file.key.clone());

            staged.attachments.push(post_attachment::ActiveModel {
                id: Set(self.id_gen.generate()),
                post_id: Set(post_id.to_string()),
                file_key: Set(file.key),
                url: Set(file.url),
                title: Set(attachment_title(&upload.file_name)),
                description: Set(String::new()),
                content_type: Set(file.content_type),
                size: Set(i64::try_from(file.size).unwrap_or(i64::MAX)),
                uploaded_at: Set(chrono::Utc::now().into()),
            });
        }

        Ok(staged)
    }

    /// Create a post authored by `author_id`.
    ///
    /// Everything is validated before the first file is stored, and the post
    /// and its attachment rows are written together.
    pub async fn create(&self, author_id: &str, input: CreatePostInput) -> AppResult<post::Model> {
        let title = input.title.trim();
        let content = input.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(AppError::Validation(
                "Title and content are required.".to_string(),
            ));
        }
        check_length("Title", title, limits::POST_TITLE)?;
        check_uploads(input.featured_image.iter().chain(&input.attachments))?;

        let category_id = non_blank(input.category_id.as_deref()).map(ToString::to_string);
        if let Some(id) = &category_id {
            self.check_category(id).await?;
        }
        let status = parse_status(input.status.as_deref())?.unwrap_or_default();

        let id = self.id_gen.generate();
        let slug = self.unique_slug(title, &id, None).await?;
        let excerpt = non_blank(input.excerpt.as_deref())
            .map_or_else(|| derive_excerpt(&input.content), ToString::to_string);

        let staged = self
            .stage_files(&id, input.featured_image.as_ref(), &input.attachments)
            .await?;

        let now = chrono::Utc::now();
        let model = post::ActiveModel {
            id: Set(id),
            title: Set(title.to_string()),
            slug: Set(slug),
            author_id: Set(author_id.to_string()),
            category_id: Set(category_id),
            content: Set(input.content.clone()),
            excerpt: Set(excerpt),
            featured_image_key: Set(staged.image.as_ref().map(|f| f.key.clone())),
            featured_image_url: Set(staged.image.as_ref().map(|f| f.url.clone())),
            status: Set(status),
            is_featured: Set(input.is_featured),
            view_count: Set(0),
            like_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let (post, attachments) = match self.post_repo.create(model, staged.attachments).await {
            Ok(saved) => saved,
            Err(e) => {
                self.discard_blobs(staged.keys).await;
                return Err(e);
            }
        };

        info!(
            post_id = %post.id,
            author_id = %author_id,
            status = post.status.as_str(),
            attachments = attachments.len(),
            "Post created"
        );

        Ok(post)
    }

    /// Edit a post.
    ///
    /// A replaced image is removed from storage only once the edit is saved.
    pub async fn update(&self, id: &str, input: UpdatePostInput) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(id).await?;

        let title = input.title.as_deref().map(str::trim);
        let content = input.content.as_deref();
        if title.is_some_and(str::is_empty) || content.is_some_and(|c| c.trim().is_empty()) {
            return Err(AppError::Validation(
                "Title and content are required.".to_string(),
            ));
        }
        if let Some(title) = title {
            check_length("Title", title, limits::POST_TITLE)?;
        }
        check_uploads(input.featured_image.iter().chain(&input.attachments))?;

        let category_id = match input.category_id.as_deref().map(str::trim) {
            None => None,
            Some("") => Some(None),
            Some(id) => {
                self.check_category(id).await?;
                Some(Some(id.to_string()))
            }
        };
        let status = parse_status(input.status.as_deref())?;

        let slug = if post.slug.is_empty() {
            let slug_title = title.unwrap_or(&post.title);
            Some(self.unique_slug(slug_title, id, Some(id)).await?)
        } else {
            None
        };

        let staged = self
            .stage_files(id, input.featured_image.as_ref(), &input.attachments)
            .await?;
        let replaced_image = staged
            .image
            .as_ref()
            .and(post.featured_image_key.clone());

        let new_content = content.map_or_else(|| post.content.clone(), ToString::to_string);
        let mut active: post::ActiveModel = post.into();

        if let Some(title) = title {
            active.title = Set(title.to_string());
        }
        if let Some(content) = content {
            active.content = Set(content.to_string());
        }
        if let Some(excerpt) = &input.excerpt {
            active.excerpt = Set(non_blank(Some(excerpt))
                .map_or_else(|| derive_excerpt(&new_content), ToString::to_string));
        }
        if let Some(category_id) = category_id {
            active.category_id = Set(category_id);
        }
        if let Some(status) = status {
            active.status = Set(status);
        }
        if let Some(is_featured) = input.is_featured {
            active.is_featured = Set(is_featured);
        }
        if let Some(file) = &staged.image {
            active.featured_image_key = Set(Some(file.key.clone()));
            active.featured_image_url = Set(Some(file.url.clone()));
        }
        if let Some(slug) = slug {
            active.slug = Set(slug);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        let (updated, _) = match self.post_repo.update(active, staged.attachments).await {
            Ok(saved) => saved,
            Err(e) => {
                self.discard_blobs(staged.keys).await;
                return Err(e);
            }
        };

        if let Some(old_key) = replaced_image {
            self.discard_blobs(vec![old_key]).await;
        }

        info!(post_id = %updated.id, "Post updated");

        Ok(updated)
    }

    /// Delete a post with its attachments, comments and likes.
    pub async fn delete(&self, id: &str) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(id).await?;
        let attachments = self.attachment_repo.find_by_post(id).await?;

        self.post_repo.delete(id).await?;

        let mut keys: Vec<String> = attachments.into_iter().map(|a| a.file_key).collect();
        keys.extend(post.featured_image_key.clone());
        self.discard_blobs(keys).await;

        info!(post_id = %id, "Post deleted");
        Ok(post)
    }

    /// Attach more files to a post, all or none.
    pub async fn add_attachments(
        &self,
        post_id: &str,
        uploads: Vec<FileUpload>,
    ) -> AppResult<Vec<post_attachment::Model>> {
        self.post_repo.get_by_id(post_id).await?;
        check_uploads(&uploads)?;

        let staged = self.stage_files(post_id, None, &uploads).await?;
        match self.attachment_repo.create_many(staged.attachments).await {
            Ok(attachments) => Ok(attachments),
            Err(e) => {
                self.discard_blobs(staged.keys).await;
                Err(e)
            }
        }
    }

    /// Remove one of a post's attachments.
    pub async fn delete_attachment(&self, post_id: &str, attachment_id: &str) -> AppResult<()> {
        let attachment = self
            .attachment_repo
            .find_for_post(post_id, attachment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attachment: {attachment_id}")))?;

        self.attachment_repo.delete(&attachment.id).await?;
        self.discard_blobs(vec![attachment.file_key]).await;

        info!(post_id = %post_id, attachment_id = %attachment_id, "Attachment deleted");
        Ok(())
    }

    /// Attachments of a post.
    pub async fn attachments(&self, post_id: &str) -> AppResult<Vec<post_attachment::Model>> {
        self.attachment_repo.find_by_post(post_id).await
    }

    /// Count a view unless this session already did.
    ///
    /// Returns whether the counter moved. The caller persists `session`.
    pub async fn record_view(&self, post_id: &str, session: &mut SessionData) -> AppResult<bool> {
        if session.has_viewed(post_id) {
            return Ok(false);
        }

        self.post_repo.increment_view_count(post_id).await?;
        session.mark_viewed(post_id);
        Ok(true)
    }

    /// Get any post by ID.
    pub async fn get(&self, id: &str) -> AppResult<post::Model> {
        self.post_repo.get_by_id(id).await
    }

    /// Get a published post by slug; drafts are not found.
    pub async fn get_published_by_slug(&self, slug: &str) -> AppResult<post::Model> {
        self.post_repo
            .find_published_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post: {slug}")))
    }

    /// Attach author usernames and categories to posts, batched.
    pub async fn summarize(&self, posts: Vec<post::Model>) -> AppResult<Vec<PostSummary>> {
        let mut author_ids: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();

        let mut category_ids: Vec<String> =
            posts.iter().filter_map(|p| p.category_id.clone()).collect();
        category_ids.sort();
        category_ids.dedup();

        let authors: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let categories: HashMap<String, category::Model> = self
            .category_repo
            .find_by_ids(&category_ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        Ok(posts
            .into_iter()
            .map(|post| PostSummary {
                author: authors.get(&post.author_id).cloned().unwrap_or_default(),
                category: post
                    .category_id
                    .as_ref()
                    .and_then(|id| categories.get(id).cloned())
                    .map(CategoryRef::from),
                post,
            })
            .collect())
    }

    async fn page(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> AppResult<Paginated<PostSummary>> {
        let total = self.post_repo.count(query).await?;
        let posts = self
            .post_repo
            .list(query, page.per_page, page.offset(total))
            .await?;
        let items = self.summarize(posts).await?;
        Ok(page.paginate(items, total))
    }

    fn public_query(filters: &PostFilters, scope: PostSearchScope) -> PostQuery {
        PostQuery {
            search: filters.search.clone(),
            scope,
            category_slug: non_blank(filters.category_slug.as_deref()).map(ToString::to_string),
            ..PostQuery::published()
        }
    }

    /// Published posts, newest first.
    ///
    /// `scope` picks the searched fields: the page listing also searches
    /// excerpts, the JSON listing does not.
    pub async fn list_published(
        &self,
        filters: &PostFilters,
        scope: PostSearchScope,
        page: PageRequest,
    ) -> AppResult<Paginated<PostSummary>> {
        self.page(&Self::public_query(filters, scope), page).await
    }

    /// Published posts of one category.
    pub async fn list_by_category(
        &self,
        category_id: &str,
        page: PageRequest,
    ) -> AppResult<Paginated<PostSummary>> {
        let query = PostQuery {
            category_id: Some(category_id.to_string()),
            ..PostQuery::published()
        };
        self.page(&query, page).await
    }

    /// First featured posts of the filtered public listing.
    pub async fn featured(&self, filters: &PostFilters) -> AppResult<Vec<PostSummary>> {
        let query = PostQuery {
            featured_only: true,
            ..Self::public_query(filters, PostSearchScope::TitleContentExcerpt)
        };
        let posts = self.post_repo.list(&query, STRIP_SIZE, 0).await?;
        self.summarize(posts).await
    }

    /// Other published posts in the same category.
    pub async fn related(&self, post: &post::Model) -> AppResult<Vec<PostSummary>> {
        let Some(category_id) = &post.category_id else {
            return Ok(vec![]);
        };

        let posts = self
            .post_repo
            .related(category_id, &post.id, STRIP_SIZE)
            .await?;
        self.summarize(posts).await
    }

    /// Admin listing across all statuses.
    ///
    /// Search covers title, content and author username.
    pub async fn admin_list(
        &self,
        search: Option<&str>,
        status: Option<&str>,
        category_id: Option<&str>,
        page: PageRequest,
    ) -> AppResult<Paginated<PostSummary>> {
        let query = PostQuery {
            search: search.map(ToString::to_string),
            scope: PostSearchScope::TitleContentAuthor,
            status: parse_status(status.filter(|s| *s != ANY))?,
            category_id: non_blank(category_id)
                .filter(|c| *c != ANY)
                .map(ToString::to_string),
            ..Default::default()
        };
        self.page(&query, page).await
    }

    /// Most recent posts of any status, for filter menus.
    pub async fn recent(&self, limit: u64) -> AppResult<Vec<post::Model>> {
        self.post_repo.list(&PostQuery::default(), limit, 0).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::services::user::tests::count_row;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult};
    use std::sync::Mutex;

    /// Records uploads and deletions without touching disk.
    #[derive(Default)]
    pub(crate) struct RecordingStorage {
        pub uploaded: Mutex<Vec<String>>,
        pub deleted: Mutex<Vec<String>>,
        /// 1-based index of the upload that fails.
        pub fail_on_upload: Option<usize>,
    }

    #[async_trait::async_trait]
    impl StorageBackend for RecordingStorage {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            content_type: &str,
        ) -> AppResult<UploadedFile> {
            let mut uploaded = self.uploaded.lock().unwrap();
            if self.fail_on_upload == Some(uploaded.len() + 1) {
                return Err(AppError::Storage("disk full".to_string()));
            }
            uploaded.push(key.to_string());
            Ok(UploadedFile {
                key: key.to_string(),
                url: self.public_url(key),
                size: data.len() as u64,
                content_type: content_type.to_string(),
            })
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.deleted.lock().unwrap().push(key.to_string());
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("/media/{key}")
        }
    }

    fn upload(file_name: &str, content_type: &str) -> FileUpload {
        FileUpload {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            data: Bytes::from_static(b"data"),
        }
    }

    fn create_test_attachment(id: &str, post_id: &str) -> post_attachment::Model {
        post_attachment::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            file_key: format!("blog_attachments/{id}.pdf"),
            url: format!("/media/blog_attachments/{id}.pdf"),
            title: format!("{id}.pdf"),
            description: String::new(),
            content_type: "application/pdf".to_string(),
            size: 3,
            uploaded_at: Utc::now().into(),
        }
    }

    pub(crate) fn create_test_post(id: &str, status: PostStatus) -> post::Model {
        post::Model {
            id: id.to_string(),
            title: "Hello".to_string(),
            slug: format!("hello-{id}"),
            author_id: "u1".to_string(),
            category_id: None,
            content: "Body".to_string(),
            excerpt: "Body".to_string(),
            featured_image_key: None,
            featured_image_url: None,
            status,
            is_featured: false,
            view_count: 0,
            like_count: 0,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn mock() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    fn service(
        post_db: DatabaseConnection,
        category_db: DatabaseConnection,
        attachment_db: DatabaseConnection,
        storage: Arc<RecordingStorage>,
    ) -> PostService {
        PostService::new(
            PostRepository::new(Arc::new(post_db)),
            CategoryRepository::new(Arc::new(category_db)),
            UserRepository::new(Arc::new(mock().into_connection())),
            AttachmentRepository::new(Arc::new(attachment_db)),
            storage,
        )
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(None).unwrap(), None);
        assert_eq!(parse_status(Some("")).unwrap(), None);
        assert_eq!(
            parse_status(Some("published")).unwrap(),
            Some(PostStatus::Published)
        );
        assert!(matches!(
            parse_status(Some("archived")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_attachment_title_truncates() {
        let long = "x".repeat(150);
        assert_eq!(attachment_title(&long).len(), limits::ATTACHMENT_TITLE);
        assert_eq!(attachment_title("notes.pdf"), "notes.pdf");
    }

    #[tokio::test]
    async fn test_create_requires_title_and_content() {
        let storage = Arc::new(RecordingStorage::default());
        let svc = service(
            mock().into_connection(),
            mock().into_connection(),
            mock().into_connection(),
            storage.clone(),
        );

        let input = CreatePostInput {
            title: "  ".to_string(),
            content: "Body".to_string(),
            ..Default::default()
        };
        let err = svc.create("u1", input).await.unwrap_err();

        assert_eq!(err.to_string(), "Title and content are required.");
        assert!(storage.uploaded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_unknown_category_saves_nothing() {
        let storage = Arc::new(RecordingStorage::default());
        let svc = service(
            mock().into_connection(),
            mock()
                .append_query_results([Vec::<category::Model>::new()])
                .into_connection(),
            mock().into_connection(),
            storage.clone(),
        );

        let input = CreatePostInput {
            title: "Hello".to_string(),
            content: "Body".to_string(),
            category_id: Some("missing".to_string()),
            featured_image: Some(upload("cover.png", "image/png")),
            ..Default::default()
        };
        let err = svc.create("u1", input).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(storage.uploaded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_attachment() {
        let storage = Arc::new(RecordingStorage::default());
        let created = create_test_post("p1", PostStatus::Published);

        let svc = service(
            mock()
                .append_query_results([[count_row(0)]])
                .append_query_results([[created]])
                .append_query_results([[create_test_attachment("a1", "p1")]])
                .into_connection(),
            mock().into_connection(),
            mock().into_connection(),
            storage.clone(),
        );

        let input = CreatePostInput {
            title: "Hello".to_string(),
            content: "Body".to_string(),
            status: Some("published".to_string()),
            attachments: vec![upload("slides.pdf", "application/pdf")],
            ..Default::default()
        };
        let post = svc.create("u1", input).await.unwrap();

        assert_eq!(post.id, "p1");
        let uploaded = storage.uploaded.lock().unwrap();
        assert_eq!(uploaded.len(), 1);
        assert!(uploaded[0].starts_with("blog_attachments/"));
        assert!(storage.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_failed_attachment_row_discards_all_blobs() {
        let storage = Arc::new(RecordingStorage::default());

        let svc = service(
            mock()
                .append_query_results([[count_row(0)]])
                .append_query_results([[create_test_post("p1", PostStatus::Draft)]])
                .append_query_errors([DbErr::Custom("value too long".to_string())])
                .into_connection(),
            mock().into_connection(),
            mock().into_connection(),
            storage.clone(),
        );

        let input = CreatePostInput {
            title: "Hello".to_string(),
            content: "Body".to_string(),
            featured_image: Some(upload("cover.png", "image/png")),
            attachments: vec![upload("slides.pdf", "application/pdf")],
            ..Default::default()
        };
        let err = svc.create("u1", input).await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        let uploaded = storage.uploaded.lock().unwrap().clone();
        let mut deleted = storage.deleted.lock().unwrap().clone();
        deleted.sort();
        let mut expected = uploaded;
        expected.sort();
        assert_eq!(expected.len(), 2);
        assert_eq!(deleted, expected);
    }

    #[tokio::test]
    async fn test_create_failed_upload_writes_no_rows() {
        let storage = Arc::new(RecordingStorage {
            fail_on_upload: Some(2),
            ..Default::default()
        });

        // Only the slug lookup is answered; any insert would fail the mock.
        let svc = service(
            mock().append_query_results([[count_row(0)]]).into_connection(),
            mock().into_connection(),
            mock().into_connection(),
            storage.clone(),
        );

        let input = CreatePostInput {
            title: "Hello".to_string(),
            content: "Body".to_string(),
            attachments: vec![
                upload("one.pdf", "application/pdf"),
                upload("two.pdf", "application/pdf"),
            ],
            ..Default::default()
        };
        let err = svc.create("u1", input).await.unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        let uploaded = storage.uploaded.lock().unwrap().clone();
        assert_eq!(uploaded.len(), 1);
        assert_eq!(*storage.deleted.lock().unwrap(), uploaded);
    }

    #[tokio::test]
    async fn test_create_rejects_overlong_fields() {
        let storage = Arc::new(RecordingStorage::default());
        let svc = service(
            mock().into_connection(),
            mock().into_connection(),
            mock().into_connection(),
            storage.clone(),
        );

        let input = CreatePostInput {
            title: "t".repeat(limits::POST_TITLE + 1),
            content: "Body".to_string(),
            ..Default::default()
        };
        let err = svc.create("u1", input).await.unwrap_err();
        assert_eq!(err.to_string(), "Title must be at most 200 characters.");

        let input = CreatePostInput {
            title: "Hello".to_string(),
            content: "Body".to_string(),
            attachments: vec![upload("a.bin", &"x".repeat(limits::CONTENT_TYPE + 1))],
            ..Default::default()
        };
        let err = svc.create("u1", input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(storage.uploaded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unique_slug_suffix_fits_column() {
        let svc = service(
            mock()
                .append_query_results([[count_row(1)]])
                .append_query_results([[count_row(0)]])
                .into_connection(),
            mock().into_connection(),
            mock().into_connection(),
            Arc::new(RecordingStorage::default()),
        );

        let title = "a".repeat(limits::POST_TITLE);
        let slug = svc.unique_slug(&title, "fallback", None).await.unwrap();

        assert_eq!(slug.len(), limits::POST_SLUG);
        assert!(slug.ends_with("-2"));
    }

    #[tokio::test]
    async fn test_update_failure_keeps_current_image() {
        let storage = Arc::new(RecordingStorage::default());
        let mut existing = create_test_post("p1", PostStatus::Published);
        existing.featured_image_key = Some("blog_images/old.png".to_string());

        let svc = service(
            mock()
                .append_query_results([[existing]])
                .append_query_errors([DbErr::Custom("connection reset".to_string())])
                .into_connection(),
            mock().into_connection(),
            mock().into_connection(),
            storage.clone(),
        );

        let input = UpdatePostInput {
            featured_image: Some(upload("new.png", "image/png")),
            ..Default::default()
        };
        let err = svc.update("p1", input).await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        let deleted = storage.deleted.lock().unwrap();
        assert_eq!(deleted.len(), 1);
        assert!(deleted[0].starts_with("blog_images/"));
        assert_ne!(deleted[0], "blog_images/old.png");
    }

    #[tokio::test]
    async fn test_add_attachments_failed_rows_discard_blobs() {
        let storage = Arc::new(RecordingStorage::default());

        let svc = service(
            mock()
                .append_query_results([[create_test_post("p1", PostStatus::Published)]])
                .into_connection(),
            mock().into_connection(),
            mock()
                .append_query_results([[create_test_attachment("a1", "p1")]])
                .append_query_errors([DbErr::Custom("value too long".to_string())])
                .into_connection(),
            storage.clone(),
        );

        let uploads = vec![
            upload("one.pdf", "application/pdf"),
            upload("two.pdf", "application/pdf"),
        ];
        let err = svc.add_attachments("p1", uploads).await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(storage.deleted.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_blobs() {
        let storage = Arc::new(RecordingStorage::default());
        let mut existing = create_test_post("p1", PostStatus::Published);
        existing.featured_image_key = Some("blog_images/cover.png".to_string());

        let attachment = create_test_attachment("a1", "p1");

        let svc = service(
            mock()
                .append_query_results([[existing]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
            mock().into_connection(),
            mock().append_query_results([[attachment]]).into_connection(),
            storage.clone(),
        );

        svc.delete("p1").await.unwrap();

        let deleted = storage.deleted.lock().unwrap();
        assert!(deleted.contains(&"blog_attachments/a1.pdf".to_string()));
        assert!(deleted.contains(&"blog_images/cover.png".to_string()));
    }

    #[tokio::test]
    async fn test_delete_attachment_of_other_post() {
        let svc = service(
            mock().into_connection(),
            mock().into_connection(),
            mock()
                .append_query_results([Vec::<post_attachment::Model>::new()])
                .into_connection(),
            Arc::new(RecordingStorage::default()),
        );

        let err = svc.delete_attachment("p2", "a1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_record_view_once_per_session() {
        let svc = service(
            mock()
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
            mock().into_connection(),
            mock().into_connection(),
            Arc::new(RecordingStorage::default()),
        );

        let mut session = SessionData::default();
        assert!(svc.record_view("p1", &mut session).await.unwrap());
        // Second call must not hit the database at all
        assert!(!svc.record_view("p1", &mut session).await.unwrap());
        assert_eq!(session.viewed_posts, vec!["p1"]);
    }

    #[tokio::test]
    async fn test_get_published_by_slug_hides_drafts() {
        let svc = service(
            mock()
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
            mock().into_connection(),
            mock().into_connection(),
            Arc::new(RecordingStorage::default()),
        );

        let err = svc.get_published_by_slug("draft-post").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_related_without_category() {
        let svc = service(
            mock().into_connection(),
            mock().into_connection(),
            mock().into_connection(),
            Arc::new(RecordingStorage::default()),
        );

        let post = create_test_post("p1", PostStatus::Published);
        assert!(svc.related(&post).await.unwrap().is_empty());
    }
}
