//! Initial migration for principal and proxy log tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Principal::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Principal::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Principal::Email)
                            .string_len(254)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Principal::AccessToken).text())
                    .col(
                        ColumnDef::new(Principal::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Principal::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Principal::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProxyLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProxyLog::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProxyLog::CoreMethod).string_len(16).not_null())
                    .col(ColumnDef::new(ProxyLog::CoreUrl).text().not_null())
                    .col(ColumnDef::new(ProxyLog::CoreRequestHeaders).text().not_null())
                    .col(ColumnDef::new(ProxyLog::CoreRequestBody).text().not_null())
                    .col(ColumnDef::new(ProxyLog::ProxyMethod).string_len(16).not_null())
                    .col(ColumnDef::new(ProxyLog::ProxyUrl).text().not_null())
                    .col(ColumnDef::new(ProxyLog::ProxyRequestHeaders).text().not_null())
                    .col(ColumnDef::new(ProxyLog::ProxyRequestBody).text().not_null())
                    .col(ColumnDef::new(ProxyLog::CoreStatus).integer().not_null())
                    .col(ColumnDef::new(ProxyLog::CoreResponseHeaders).text().not_null())
                    .col(ColumnDef::new(ProxyLog::CoreResponseBody).text().not_null())
                    .col(ColumnDef::new(ProxyLog::ProxyStatus).integer().not_null())
                    .col(ColumnDef::new(ProxyLog::ProxyResponseHeaders).text().not_null())
                    .col(ColumnDef::new(ProxyLog::ProxyResponseBody).text().not_null())
                    .col(
                        ColumnDef::new(ProxyLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_proxy_log_created_at")
                    .table(ProxyLog::Table)
                    .col(ProxyLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProxyLog::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Principal::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Principal {
    Table,
    Id,
    Email,
    AccessToken,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ProxyLog {
    Table,
    Id,
    CoreMethod,
    CoreUrl,
    CoreRequestHeaders,
    CoreRequestBody,
    ProxyMethod,
    ProxyUrl,
    ProxyRequestHeaders,
    ProxyRequestBody,
    CoreStatus,
    CoreResponseHeaders,
    CoreResponseBody,
    ProxyStatus,
    ProxyResponseHeaders,
    ProxyResponseBody,
    CreatedAt,
}
