//! Multipart post forms.

use std::collections::HashMap;

use axum::extract::Multipart;
use quill_common::{AppError, AppResult};
use quill_core::{CreatePostInput, FileUpload, UpdatePostInput};

const FEATURED_IMAGE_FIELD: &str = "featured_image";
const ATTACHMENTS_FIELD: &str = "attachments";

/// Text fields and files of a post create/edit form.
#[derive(Debug, Default)]
pub struct PostForm {
    fields: HashMap<String, String>,
    featured_image: Option<FileUpload>,
    attachments: Vec<FileUpload>,
}

fn is_checked(value: &str) -> bool {
    matches!(value, "on" | "true" | "1" | "yes")
}

impl PostForm {
    /// Read every part of the form.
    ///
    /// File inputs left empty by the browser (no file name, no bytes) are
    /// skipped.
    pub async fn parse(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(ToString::to_string);

            match file_name {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }

                    let upload = FileUpload {
                        file_name,
                        content_type,
                        data,
                    };
                    match name.as_str() {
                        FEATURED_IMAGE_FIELD => form.featured_image = Some(upload),
                        ATTACHMENTS_FIELD => form.attachments.push(upload),
                        _ => {}
                    }
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    fn flag(&self, name: &str) -> Option<bool> {
        self.fields.get(name).map(|v| is_checked(v))
    }

    /// Whether any file was attached to the `attachments` input.
    #[must_use]
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// The uploaded attachments alone.
    #[must_use]
    pub fn into_attachments(self) -> Vec<FileUpload> {
        self.attachments
    }

    /// Fields for a new post. Missing text fields count as empty.
    #[must_use]
    pub fn into_create(self) -> CreatePostInput {
        CreatePostInput {
            title: self.text("title").unwrap_or_default(),
            content: self.text("content").unwrap_or_default(),
            excerpt: self.text("excerpt"),
            category_id: self.text("category"),
            status: self.text("status"),
            is_featured: self.flag("is_featured").unwrap_or(false),
            featured_image: self.featured_image,
            attachments: self.attachments,
        }
    }

    /// Fields for an edit. Fields missing from the form are left alone.
    #[must_use]
    pub fn into_update(self) -> UpdatePostInput {
        UpdatePostInput {
            title: self.text("title"),
            content: self.text("content"),
            excerpt: self.text("excerpt"),
            category_id: self.text("category"),
            status: self.text("status"),
            is_featured: self.flag("is_featured"),
            featured_image: self.featured_image,
            attachments: self.attachments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkbox_values() {
        assert!(is_checked("on"));
        assert!(is_checked("true"));
        assert!(!is_checked("off"));
        assert!(!is_checked(""));
    }

    #[test]
    fn test_into_update_keeps_missing_fields_absent() {
        let mut form = PostForm::default();
        form.fields.insert("title".to_string(), "New".to_string());

        let input = form.into_update();
        assert_eq!(input.title.as_deref(), Some("New"));
        assert!(input.content.is_none());
        assert!(input.is_featured.is_none());
        assert!(input.category_id.is_none());
    }

    #[test]
    fn test_into_create_defaults() {
        let mut form = PostForm::default();
        form.fields.insert("is_featured".to_string(), "on".to_string());
        form.fields.insert("category".to_string(), String::new());

        let input = form.into_create();
        assert!(input.title.is_empty());
        assert!(input.is_featured);
        assert_eq!(input.category_id.as_deref(), Some(""));
    }
}
