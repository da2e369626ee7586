//! Chat service: one room per report between the citizen and the
//! authority handling it.

use chrono::Utc;
use crimewatch_common::{AppError, AppResult, IdGenerator};
use crimewatch_db::{
    entities::{
        account::{self, AccountRole},
        chat_message, chat_room,
    },
    repositories::{ChatRepository, ComplaintRepository, CrimeReportRepository},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MAX_MESSAGE_LEN: usize = 2000;
pub const DEFAULT_MESSAGE_LIMIT: u64 = 50;
pub const MAX_MESSAGE_LIMIT: u64 = 200;

/// Input for sending a message.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageInput {
    pub message: String,
}

/// Room listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    #[serde(flatten)]
    pub room: chat_room::Model,
    pub last_message: Option<chat_message::Model>,
    pub unread_count: u64,
}

/// Chat service.
#[derive(Clone)]
pub struct ChatService {
    chat_repo: ChatRepository,
    report_repo: CrimeReportRepository,
    complaint_repo: ComplaintRepository,
    id_gen: IdGenerator,
}

fn is_participant(actor: &account::Model, room: &chat_room::Model) -> bool {
    let id = Some(actor.id.as_str());
    room.citizen_id.as_deref() == id || room.authority_id.as_deref() == id
}

impl ChatService {
    /// Create a new chat service.
    #[must_use]
    pub const fn new(
        chat_repo: ChatRepository,
        report_repo: CrimeReportRepository,
        complaint_repo: ComplaintRepository,
    ) -> Self {
        Self {
            chat_repo,
            report_repo,
            complaint_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get or create the room for a report.
    pub async fn open_room_for_report(
        &self,
        actor: &account::Model,
        report_id: &str,
    ) -> AppResult<chat_room::Model> {
        let report = self.report_repo.get_by_id(report_id).await?;

        let allowed = match actor.role {
            AccountRole::Citizen => report.reporter_id.as_deref() == Some(actor.id.as_str()),
            AccountRole::Authority => self
                .complaint_repo
                .find_active_for_report(report_id)
                .await?
                .is_some_and(|a| a.authority_id == actor.id),
            AccountRole::Admin => false,
        };
        if !allowed {
            return Err(AppError::Forbidden(
                "Only the reporter or the assigned authority may chat about this report"
                    .to_string(),
            ));
        }

        let is_authority = actor.role == AccountRole::Authority;

        let room = match self.chat_repo.find_room_by_report(report_id).await? {
            Some(room) => room,
            None => {
                self.chat_repo
                    .insert_room_if_absent(chat_room::Model {
                        id: self.id_gen.generate(),
                        report_id: report.id.clone(),
                        citizen_id: report.reporter_id.clone(),
                        authority_id: is_authority.then(|| actor.id.clone()),
                        complaint_id: report.complaint_id.clone(),
                        created_at: Utc::now().into(),
                    })
                    .await?
            }
        };

        if is_authority && room.authority_id.as_deref() != Some(actor.id.as_str()) {
            self.chat_repo.set_room_authority(&room.id, &actor.id).await?;
            debug!(room = %room.id, authority = %actor.id, "Authority joined chat room");
            return Ok(chat_room::Model {
                authority_id: Some(actor.id.clone()),
                ..room
            });
        }

        Ok(room)
    }

    /// Post a message to a room the actor takes part in.
    pub async fn send_message(
        &self,
        actor: &account::Model,
        room_id: &str,
        body: &str,
    ) -> AppResult<chat_message::Model> {
        let room = self.chat_repo.get_room(room_id).await?;

        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::Validation("message: must not be empty".to_string()));
        }
        if body.chars().count() > MAX_MESSAGE_LEN {
            return Err(AppError::Validation(format!(
                "message: at most {MAX_MESSAGE_LEN} characters"
            )));
        }

        if !is_participant(actor, &room) {
            return Err(AppError::Forbidden(
                "You are not a participant of this chat room".to_string(),
            ));
        }

        let message = self
            .chat_repo
            .insert_message(chat_message::Model {
                id: self.id_gen.generate(),
                room_id: room.id,
                sender_id: actor.id.clone(),
                sender_role: actor.role,
                body: body.to_string(),
                is_read: false,
                created_at: Utc::now().into(),
            })
            .await?;

        debug!(room = %room_id, message = %message.id, "Chat message sent");

        Ok(message)
    }

    /// Messages in a room, oldest first, strictly after `since_id` when given.
    ///
    /// Reading marks the other party's messages as read.
    pub async fn get_messages(
        &self,
        actor: &account::Model,
        room_id: &str,
        since_id: Option<&str>,
        limit: Option<u64>,
    ) -> AppResult<Vec<chat_message::Model>> {
        let room = self.chat_repo.get_room(room_id).await?;
        if !is_participant(actor, &room) {
            return Err(AppError::Forbidden(
                "You are not a participant of this chat room".to_string(),
            ));
        }

        let cursor = match since_id {
            Some(id) => Some(
                self.chat_repo
                    .find_message_in_room(room_id, id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Message {id} not found in room {room_id}"))
                    })?,
            ),
            None => None,
        };

        let limit = limit
            .unwrap_or(DEFAULT_MESSAGE_LIMIT)
            .clamp(1, MAX_MESSAGE_LIMIT);
        let messages = self
            .chat_repo
            .find_messages(room_id, cursor.as_ref(), limit)
            .await?;

        if messages.iter().any(|m| m.sender_id != actor.id && !m.is_read) {
            self.chat_repo.mark_read(room_id, &actor.id).await?;
        }

        Ok(messages)
    }

    /// The actor's rooms with their latest message and unread count.
    pub async fn list_rooms(&self, actor: &account::Model) -> AppResult<Vec<RoomSummary>> {
        let rooms = self.chat_repo.find_rooms_for_participant(&actor.id).await?;

        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            let last_message = self.chat_repo.find_last_message(&room.id).await?;
            let unread_count = self.chat_repo.count_unread(&room.id, &actor.id).await?;
            summaries.push(RoomSummary {
                room,
                last_message,
                unread_count,
            });
        }

        Ok(summaries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::fixtures::{account, assignment, authority, report, rows};
    use crimewatch_db::entities::{complaint_assignment::AssignmentStatus, crime_report::ReportStatus};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service(db: DatabaseConnection) -> ChatService {
        let db = Arc::new(db);
        ChatService::new(
            ChatRepository::new(db.clone()),
            CrimeReportRepository::new(db.clone()),
            ComplaintRepository::new(db),
        )
    }

    fn room(authority_id: Option<&str>) -> chat_room::Model {
        chat_room::Model {
            id: "room1".to_string(),
            report_id: "r1".to_string(),
            citizen_id: Some("citizen1".to_string()),
            authority_id: authority_id.map(str::to_string),
            complaint_id: Some("CR-2026-ABC123".to_string()),
            created_at: Utc::now().into(),
        }
    }

    fn message(id: &str, sender: &str, is_read: bool) -> chat_message::Model {
        chat_message::Model {
            id: id.to_string(),
            room_id: "room1".to_string(),
            sender_id: sender.to_string(),
            sender_role: AccountRole::Authority,
            body: "We are looking into it".to_string(),
            is_read,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_send_to_missing_room_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<chat_room::Model>::new()])
            .into_connection();

        let result = service(db)
            .send_message(&account("citizen1", AccountRole::Citizen), "nope", "hello")
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_send_blank_message_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[room(None)]])
            .into_connection();

        let result = service(db)
            .send_message(&account("citizen1", AccountRole::Citizen), "room1", "  \n ")
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_send_by_outsider_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[room(Some("auth1"))]])
            .into_connection();

        let result = service(db)
            .send_message(&account("citizen2", AccountRole::Citizen), "room1", "hello")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_send_trims_and_tags_role() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[room(Some("auth1"))]])
            .append_exec_results([rows(1)])
            .into_connection();

        let sent = service(db)
            .send_message(&authority("auth1"), "room1", "  Officer on the way  ")
            .await
            .unwrap();

        assert_eq!(sent.body, "Officer on the way");
        assert_eq!(sent.sender_role, AccountRole::Authority);
        assert!(!sent.is_read);
    }

    #[tokio::test]
    async fn test_citizen_opens_new_room() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[report("r1", ReportStatus::Pending)]])
            .append_query_results([Vec::<chat_room::Model>::new()])
            .append_exec_results([rows(1)])
            .append_query_results([[room(None)]])
            .into_connection();

        let opened = service(db)
            .open_room_for_report(&account("citizen1", AccountRole::Citizen), "r1")
            .await
            .unwrap();

        assert_eq!(opened.report_id, "r1");
        assert_eq!(opened.citizen_id.as_deref(), Some("citizen1"));
    }

    #[tokio::test]
    async fn test_assigned_authority_joins_existing_room() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[report("r1", ReportStatus::Investigating)]])
            .append_query_results([[assignment("a1", "auth1", AssignmentStatus::Accepted)]])
            .append_query_results([[room(None)]])
            .append_exec_results([rows(1)])
            .into_connection();

        let opened = service(db)
            .open_room_for_report(&authority("auth1"), "r1")
            .await
            .unwrap();

        assert_eq!(opened.authority_id.as_deref(), Some("auth1"));
    }

    #[tokio::test]
    async fn test_unassigned_authority_cannot_open_room() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[report("r1", ReportStatus::Investigating)]])
            .append_query_results([[assignment("a1", "auth1", AssignmentStatus::Accepted)]])
            .into_connection();

        let result = service(db)
            .open_room_for_report(&authority("auth2"), "r1")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_get_messages_marks_incoming_read() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[room(Some("auth1"))]])
            .append_query_results([[message("m1", "auth1", false), message("m2", "auth1", false)]])
            .append_exec_results([rows(2)])
            .into_connection();

        let messages = service(db)
            .get_messages(&account("citizen1", AccountRole::Citizen), "room1", None, None)
            .await
            .unwrap();

        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_get_messages_unknown_cursor_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[room(Some("auth1"))]])
            .append_query_results([Vec::<chat_message::Model>::new()])
            .into_connection();

        let result = service(db)
            .get_messages(
                &account("citizen1", AccountRole::Citizen),
                "room1",
                Some("gone"),
                Some(10),
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_rooms_with_unread_counts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[room(Some("auth1"))]])
            .append_query_results([[message("m2", "auth1", false)]])
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(1))
            }]])
            .into_connection();

        let rooms = service(db)
            .list_rooms(&account("citizen1", AccountRole::Citizen))
            .await
            .unwrap();

        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].unread_count, 1);
        assert_eq!(
            rooms[0].last_message.as_ref().map(|m| m.id.as_str()),
            Some("m2")
        );
    }
}
