//! Create post and post_attachment tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Post::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Post::Title).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Post::Slug)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Post::AuthorId).string().not_null())
                    .col(ColumnDef::new(Post::CategoryId).string().null())
                    .col(ColumnDef::new(Post::Content).text().not_null())
                    .col(
                        ColumnDef::new(Post::Excerpt)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Post::FeaturedImageKey).string().null())
                    .col(ColumnDef::new(Post::FeaturedImageUrl).string().null())
                    .col(
                        ColumnDef::new(Post::Status)
                            .string_len(16)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Post::IsFeatured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Post::ViewCount)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Post::ViewCount).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Post::LikeCount)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Post::LikeCount).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Post::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Post::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_author")
                            .from(Post::Table, Post::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_category")
                            .from(Post::Table, Post::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_author_id")
                    .table(Post::Table)
                    .col(Post::AuthorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_category_id")
                    .table(Post::Table)
                    .col(Post::CategoryId)
                    .to_owned(),
            )
            .await?;

        // Public listings filter on status and sort by created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_post_status_created_at")
                    .table(Post::Table)
                    .col(Post::Status)
                    .col(Post::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PostAttachment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostAttachment::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostAttachment::PostId).string().not_null())
                    .col(ColumnDef::new(PostAttachment::FileKey).string().not_null())
                    .col(ColumnDef::new(PostAttachment::Url).string().not_null())
                    .col(
                        ColumnDef::new(PostAttachment::Title)
                            .string_len(100)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(PostAttachment::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(PostAttachment::ContentType)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PostAttachment::Size)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PostAttachment::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_attachment_post")
                            .from(PostAttachment::Table, PostAttachment::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_attachment_post_id")
                    .table(PostAttachment::Table)
                    .col(PostAttachment::PostId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostAttachment::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
    Title,
    Slug,
    AuthorId,
    CategoryId,
    Content,
    Excerpt,
    FeaturedImageKey,
    FeaturedImageUrl,
    Status,
    IsFeatured,
    ViewCount,
    LikeCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PostAttachment {
    Table,
    Id,
    PostId,
    FileKey,
    Url,
    Title,
    Description,
    ContentType,
    Size,
    UploadedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
}
