use crate::domain::room::{Room, RoomDetail, RoomMessage, RoomOverview};
use crate::storage::records::timestamp_ms;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub participant_ids: Vec<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostRoomMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub id: i64,
    pub name: String,
    pub admin_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            name: room.name,
            admin_id: room.admin_id,
            avatar: room.avatar,
            description: room.description,
            is_active: room.is_active,
            created_at: timestamp_ms(room.created_at),
            updated_at: timestamp_ms(room.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoomMessageResponse {
    pub id: i64,
    pub room_id: i64,
    pub sender_id: i64,
    pub body: String,
    pub created_at: i64,
    pub is_read: bool,
}

impl From<RoomMessage> for RoomMessageResponse {
    fn from(message: RoomMessage) -> Self {
        Self {
            id: message.id,
            room_id: message.room_id,
            sender_id: message.sender_id,
            body: message.body,
            created_at: timestamp_ms(message.created_at),
            is_read: message.is_read,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoomOverviewResponse {
    #[serde(flatten)]
    pub room: RoomResponse,
    pub last_message: Option<RoomMessageResponse>,
}

impl From<RoomOverview> for RoomOverviewResponse {
    fn from(overview: RoomOverview) -> Self {
        Self { room: overview.room.into(), last_message: overview.last_message.map(Into::into) }
    }
}

#[derive(Debug, Serialize)]
pub struct RoomDetailResponse {
    pub room: RoomResponse,
    pub participant_ids: Vec<i64>,
    pub messages: Vec<RoomMessageResponse>,
}

impl From<RoomDetail> for RoomDetailResponse {
    fn from(detail: RoomDetail) -> Self {
        Self {
            room: detail.room.into(),
            participant_ids: detail.participant_ids,
            messages: detail.messages.into_iter().map(Into::into).collect(),
        }
    }
}
