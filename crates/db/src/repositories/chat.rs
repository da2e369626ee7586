//! Chat repository for report chat rooms and their messages.

use std::sync::Arc;

use crate::entities::{ChatMessage, ChatRoom, chat_message, chat_room};
use crimewatch_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, OnConflict},
};

/// Chat repository for database operations.
#[derive(Clone)]
pub struct ChatRepository {
    db: Arc<DatabaseConnection>,
}

impl ChatRepository {
    /// Create a new chat repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ========== Rooms ==========

    /// Find a room by ID.
    pub async fn find_room(&self, id: &str) -> AppResult<Option<chat_room::Model>> {
        ChatRoom::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a room by ID, returning an error if not found.
    pub async fn get_room(&self, id: &str) -> AppResult<chat_room::Model> {
        self.find_room(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Chat room {id} not found")))
    }

    /// Find the room for a report.
    pub async fn find_room_by_report(&self, report_id: &str) -> AppResult<Option<chat_room::Model>> {
        ChatRoom::find()
            .filter(chat_room::Column::ReportId.eq(report_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a room unless the report already has one, then return the
    /// stored room. Two concurrent openers end up with the same row.
    pub async fn insert_room_if_absent(
        &self,
        room: chat_room::Model,
    ) -> AppResult<chat_room::Model> {
        let report_id = room.report_id.clone();

        ChatRoom::insert(room.into_active_model())
            .on_conflict(
                OnConflict::column(chat_room::Column::ReportId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_room_by_report(&report_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Chat room for {report_id} vanished")))
    }

    /// Record the authority currently holding the room's report.
    pub async fn set_room_authority(&self, room_id: &str, authority_id: &str) -> AppResult<u64> {
        let result = ChatRoom::update_many()
            .col_expr(
                chat_room::Column::AuthorityId,
                Expr::value(authority_id.to_string()),
            )
            .filter(chat_room::Column::Id.eq(room_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Rooms an account takes part in, newest first.
    pub async fn find_rooms_for_participant(
        &self,
        account_id: &str,
    ) -> AppResult<Vec<chat_room::Model>> {
        ChatRoom::find()
            .filter(
                Condition::any()
                    .add(chat_room::Column::CitizenId.eq(account_id))
                    .add(chat_room::Column::AuthorityId.eq(account_id)),
            )
            .order_by_desc(chat_room::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ========== Messages ==========

    /// Append a message.
    pub async fn insert_message(
        &self,
        message: chat_message::Model,
    ) -> AppResult<chat_message::Model> {
        ChatMessage::insert(message.clone().into_active_model())
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(message)
    }

    /// Find a message inside a room.
    pub async fn find_message_in_room(
        &self,
        room_id: &str,
        message_id: &str,
    ) -> AppResult<Option<chat_message::Model>> {
        ChatMessage::find_by_id(message_id)
            .filter(chat_message::Column::RoomId.eq(room_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Messages in `(created_at, id)` order, strictly after `after` when given.
    pub async fn find_messages(
        &self,
        room_id: &str,
        after: Option<&chat_message::Model>,
        limit: u64,
    ) -> AppResult<Vec<chat_message::Model>> {
        let mut query = ChatMessage::find()
            .filter(chat_message::Column::RoomId.eq(room_id))
            .order_by_asc(chat_message::Column::CreatedAt)
            .order_by_asc(chat_message::Column::Id);

        if let Some(cursor) = after {
            query = query.filter(
                Condition::any()
                    .add(chat_message::Column::CreatedAt.gt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(chat_message::Column::CreatedAt.eq(cursor.created_at))
                            .add(chat_message::Column::Id.gt(cursor.id.clone())),
                    ),
            );
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Latest message in a room.
    pub async fn find_last_message(&self, room_id: &str) -> AppResult<Option<chat_message::Model>> {
        ChatMessage::find()
            .filter(chat_message::Column::RoomId.eq(room_id))
            .order_by_desc(chat_message::Column::CreatedAt)
            .order_by_desc(chat_message::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Unread messages in a room that `reader_id` did not send.
    pub async fn count_unread(&self, room_id: &str, reader_id: &str) -> AppResult<u64> {
        ChatMessage::find()
            .filter(chat_message::Column::RoomId.eq(room_id))
            .filter(chat_message::Column::SenderId.ne(reader_id))
            .filter(chat_message::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark the other party's messages as read (single UPDATE query).
    pub async fn mark_read(&self, room_id: &str, reader_id: &str) -> AppResult<u64> {
        let result = ChatMessage::update_many()
            .col_expr(chat_message::Column::IsRead, Expr::value(true))
            .filter(chat_message::Column::RoomId.eq(room_id))
            .filter(chat_message::Column::SenderId.ne(reader_id))
            .filter(chat_message::Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::account::AccountRole;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_room(id: &str) -> chat_room::Model {
        chat_room::Model {
            id: id.to_string(),
            report_id: "r1".to_string(),
            citizen_id: Some("citizen1".to_string()),
            authority_id: None,
            complaint_id: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_message(id: &str) -> chat_message::Model {
        chat_message::Model {
            id: id.to_string(),
            room_id: "room1".to_string(),
            sender_id: "citizen1".to_string(),
            sender_role: AccountRole::Citizen,
            body: "Any update?".to_string(),
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_room_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<chat_room::Model>::new()])
                .into_connection(),
        );

        let repo = ChatRepository::new(db);
        let result = repo.get_room("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_insert_room_if_absent_returns_stored_row() {
        let stored = create_test_room("room-existing");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([[stored.clone()]])
                .into_connection(),
        );

        let repo = ChatRepository::new(db);
        let room = repo
            .insert_room_if_absent(create_test_room("room-new"))
            .await
            .unwrap();

        assert_eq!(room.id, "room-existing");
    }

    #[tokio::test]
    async fn test_find_messages_after_cursor() {
        let cursor = create_test_message("m1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_message("m2")]])
                .into_connection(),
        );

        let repo = ChatRepository::new(db);
        let result = repo
            .find_messages("room1", Some(&cursor), 50)
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "m2");
    }

    #[tokio::test]
    async fn test_mark_read() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = ChatRepository::new(db);
        assert_eq!(repo.mark_read("room1", "auth1").await.unwrap(), 3);
    }
}
