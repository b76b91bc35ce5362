use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ForumPosts {
    Table,
    Id,
    AuthorId,
    Title,
    Content,
    Category,
    UpvoteCount,
    CommentCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ForumPosts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ForumPosts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ForumPosts::AuthorId).string_len(64).not_null())
                    .col(ColumnDef::new(ForumPosts::Title).string_len(200).not_null())
                    .col(ColumnDef::new(ForumPosts::Content).text().not_null())
                    .col(ColumnDef::new(ForumPosts::Category).string_len(50).not_null())
                    .col(
                        ColumnDef::new(ForumPosts::UpvoteCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ForumPosts::CommentCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ForumPosts::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ForumPosts::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_posts_author_id")
                            .from(ForumPosts::Table, ForumPosts::AuthorId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forum_posts_created_at")
                    .table(ForumPosts::Table)
                    .col(ForumPosts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forum_posts_category")
                    .table(ForumPosts::Table)
                    .col(ForumPosts::Category)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ForumPosts::Table).to_owned())
            .await
    }
}
