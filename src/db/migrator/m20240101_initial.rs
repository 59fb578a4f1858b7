use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Animes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Animes::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Animes::TitleRomaji).string())
                    .col(ColumnDef::new(Animes::TitleEnglish).string())
                    .col(ColumnDef::new(Animes::TitleNative).string())
                    .col(ColumnDef::new(Animes::Description).text())
                    .col(ColumnDef::new(Animes::Genres).string())
                    .col(ColumnDef::new(Animes::CoverImage).string())
                    .col(ColumnDef::new(Animes::BannerImage).string())
                    .col(
                        ColumnDef::new(Animes::Episodes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Animes::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AnimeEpisodes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AnimeEpisodes::AnimeId).integer().not_null())
                    .col(
                        ColumnDef::new(AnimeEpisodes::EpisodeNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AnimeEpisodes::TitleRomaji).string())
                    .col(
                        ColumnDef::new(AnimeEpisodes::TitleTranslated)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AnimeEpisodes::ThumbnailImage).string())
                    .primary_key(
                        Index::create()
                            .col(AnimeEpisodes::AnimeId)
                            .col(AnimeEpisodes::EpisodeNumber),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_anime_episodes_anime_id")
                            .from(AnimeEpisodes::Table, AnimeEpisodes::AnimeId)
                            .to(Animes::Table, Animes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_animes_title_romaji")
                    .table(Animes::Table)
                    .col(Animes::TitleRomaji)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AnimeEpisodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Animes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Animes {
    Table,
    Id,
    TitleRomaji,
    TitleEnglish,
    TitleNative,
    Description,
    Genres,
    CoverImage,
    BannerImage,
    Episodes,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AnimeEpisodes {
    Table,
    AnimeId,
    EpisodeNumber,
    TitleRomaji,
    TitleTranslated,
    ThumbnailImage,
}
