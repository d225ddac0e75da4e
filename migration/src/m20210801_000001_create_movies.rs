use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(integer(Movies::Id).primary_key())
                    .col(string(Movies::Title))
                    .col(string(Movies::TitleSearch))
                    .col(string(Movies::Description))
                    .col(string(Movies::StartDate))
                    .col(string(Movies::EndDate))
                    .col(json(Movies::Schedules))
                    .col(string(Movies::CreatedAt))
                    .col(string(Movies::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_title_search")
                    .table(Movies::Table)
                    .col(Movies::TitleSearch)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    TitleSearch,
    Description,
    StartDate,
    EndDate,
    Schedules,
    CreatedAt,
    UpdatedAt,
}
