//! Create `chat_room` and `chat_message` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChatRoom::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChatRoom::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ChatRoom::ReportId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ChatRoom::CitizenId).string_len(32))
                    .col(ColumnDef::new(ChatRoom::AuthorityId).string_len(32))
                    .col(ColumnDef::new(ChatRoom::ComplaintId).string_len(20))
                    .col(
                        ColumnDef::new(ChatRoom::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_room_report")
                            .from(ChatRoom::Table, ChatRoom::ReportId)
                            .to(CrimeReport::Table, CrimeReport::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chat_room_citizen_id")
                    .table(ChatRoom::Table)
                    .col(ChatRoom::CitizenId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chat_room_authority_id")
                    .table(ChatRoom::Table)
                    .col(ChatRoom::AuthorityId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChatMessage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChatMessage::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChatMessage::RoomId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ChatMessage::SenderId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChatMessage::SenderRole)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChatMessage::Body).text().not_null())
                    .col(
                        ColumnDef::new(ChatMessage::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ChatMessage::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_message_room")
                            .from(ChatMessage::Table, ChatMessage::RoomId)
                            .to(ChatRoom::Table, ChatRoom::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_message_sender")
                            .from(ChatMessage::Table, ChatMessage::SenderId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite index for ordered polling within a room
        manager
            .create_index(
                Index::create()
                    .name("idx_chat_message_room_created_at")
                    .table(ChatMessage::Table)
                    .col(ChatMessage::RoomId)
                    .col(ChatMessage::CreatedAt)
                    .col(ChatMessage::Id)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChatMessage::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChatRoom::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ChatRoom {
    Table,
    Id,
    ReportId,
    CitizenId,
    AuthorityId,
    ComplaintId,
    CreatedAt,
}

#[derive(Iden)]
enum ChatMessage {
    Table,
    Id,
    RoomId,
    SenderId,
    SenderRole,
    Body,
    IsRead,
    CreatedAt,
}

#[derive(Iden)]
enum CrimeReport {
    Table,
    Id,
}

#[derive(Iden)]
enum Account {
    Table,
    Id,
}
