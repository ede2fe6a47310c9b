//! Category service.

use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::{
    entities::category,
    repositories::{CategoryRepository, PostRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::text::{check_length, limits, slugify, suffixed_slug, truncate_slug};

/// Category service for business logic.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

/// Input for creating or editing a category.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A category with the number of posts filed under it.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: category::Model,
    pub post_count: u64,
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository, post_repo: PostRepository) -> Self {
        Self {
            category_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    fn required_name(input: &CategoryInput) -> AppResult<&str> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Category name is required.".to_string()));
        }
        check_length("Category name", name, limits::CATEGORY_NAME)?;
        Ok(name)
    }

    async fn unique_slug(&self, name: &str, fallback: &str) -> AppResult<String> {
        let base = match slugify(name) {
            slug if slug.is_empty() => fallback.to_string(),
            slug => truncate_slug(&slug, limits::CATEGORY_SLUG),
        };

        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.category_repo.slug_exists(&candidate, None).await? {
            candidate = suffixed_slug(&base, suffix, limits::CATEGORY_SLUG);
            suffix += 1;
        }
        Ok(candidate)
    }

    /// Create a category. Names are unique, compared exactly.
    pub async fn create(&self, input: CategoryInput) -> AppResult<category::Model> {
        let name = Self::required_name(&input)?;

        if self.category_repo.name_exists(name, None).await? {
            return Err(AppError::Duplicate(
                "Category with this name already exists.".to_string(),
            ));
        }

        let id = self.id_gen.generate();
        let slug = self.unique_slug(name, &id).await?;

        let model = category::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            slug: Set(slug),
            description: Set(input.description.unwrap_or_default()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let category = self.category_repo.create(model).await?;
        info!(category_id = %category.id, name = %category.name, "Category created");

        Ok(category)
    }

    /// Rename a category or change its description. The slug stays put.
    pub async fn update(&self, id: &str, input: CategoryInput) -> AppResult<category::Model> {
        let category = self.category_repo.get_by_id(id).await?;
        let name = Self::required_name(&input)?;

        if self.category_repo.name_exists(name, Some(id)).await? {
            return Err(AppError::Duplicate(
                "Category with this name already exists.".to_string(),
            ));
        }

        let mut active: category::ActiveModel = category.into();
        active.name = Set(name.to_string());
        if let Some(description) = input.description {
            active.description = Set(description);
        }

        self.category_repo.update(active).await
    }

    /// Delete a category that no post references.
    pub async fn delete(&self, id: &str) -> AppResult<category::Model> {
        let category = self.category_repo.get_by_id(id).await?;

        if self.post_repo.count_by_category(id).await? > 0 {
            return Err(AppError::CategoryInUse(category.name));
        }

        self.category_repo.delete(id).await?;
        info!(category_id = %id, "Category deleted");

        Ok(category)
    }

    /// Get a category by ID.
    pub async fn get(&self, id: &str) -> AppResult<category::Model> {
        self.category_repo.get_by_id(id).await
    }

    /// Get a category by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<category::Model> {
        self.category_repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category: {slug}")))
    }

    /// All categories by name.
    pub async fn list(&self) -> AppResult<Vec<category::Model>> {
        self.category_repo.list_all().await
    }

    /// Public listing: every category with its published post count.
    pub async fn list_with_counts(&self) -> AppResult<Vec<CategoryWithCount>> {
        let categories = self.category_repo.list_all().await?;
        let counts = self.category_repo.post_counts(true).await?;
        Ok(attach_counts(categories, &counts))
    }

    /// Admin listing: search name and description, counting posts of any status.
    pub async fn admin_list(&self, search: Option<&str>) -> AppResult<Vec<CategoryWithCount>> {
        let categories = self.category_repo.search(search).await?;
        let counts = self.category_repo.post_counts(false).await?;
        Ok(attach_counts(categories, &counts))
    }
}

fn attach_counts(
    categories: Vec<category::Model>,
    counts: &std::collections::HashMap<String, u64>,
) -> Vec<CategoryWithCount> {
    categories
        .into_iter()
        .map(|category| CategoryWithCount {
            post_count: counts.get(&category.id).copied().unwrap_or(0),
            category,
        })
        .collect()
}
