use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ForumComments {
    Table,
    Id,
    PostId,
    ParentId,
    AuthorId,
    Content,
    UpvoteCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ForumPosts {
    Table,
    Id,
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
                    .table(ForumComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumComments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ForumComments::PostId).uuid().not_null())
                    // no foreign key: orphaned replies stay readable
                    .col(ColumnDef::new(ForumComments::ParentId).uuid().null())
                    .col(
                        ColumnDef::new(ForumComments::AuthorId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ForumComments::Content).text().not_null())
                    .col(
                        ColumnDef::new(ForumComments::UpvoteCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ForumComments::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ForumComments::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_comments_post_id")
                            .from(ForumComments::Table, ForumComments::PostId)
                            .to(ForumPosts::Table, ForumPosts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_comments_author_id")
                            .from(ForumComments::Table, ForumComments::AuthorId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forum_comments_post_created")
                    .table(ForumComments::Table)
                    .col(ForumComments::PostId)
                    .col(ForumComments::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ForumComments::Table).to_owned())
            .await
    }
}
