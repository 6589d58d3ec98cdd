use crate::domain::room::{Room, RoomDetail, RoomMessage, RoomOverview};
use crate::domain::user::UserId;
use crate::error::{AppError, Result};
use crate::storage::room_repo::RoomRepository;
use std::collections::BTreeSet;

const MIN_ROOM_NAME_LEN: usize = 3;

#[derive(Debug, Clone)]
pub struct CreateRoom {
    pub name: String,
    pub participant_ids: Vec<UserId>,
    pub description: Option<String>,
    pub avatar: Option<String>,
}

/// The group-room half of the message store.
#[derive(Clone, Debug)]
pub struct RoomService {
    repo: RoomRepository,
}

impl RoomService {
    #[must_use]
    pub const fn new(repo: RoomRepository) -> Self {
        Self { repo }
    }

    /// Creates a room with the caller as admin. The caller is always a
    /// participant, whether or not the request listed them.
    ///
    /// # Errors
    /// Returns `AppError::Validation` for a short name, an empty participant
    /// set, or a name the caller already uses (ignoring case). Other admins
    /// may reuse the name freely.
    #[tracing::instrument(err(level = "debug"), skip(self, request), fields(creator_id = %creator_id))]
    pub async fn create_room(&self, creator_id: UserId, request: CreateRoom) -> Result<RoomDetail> {
        let name = request.name.trim();
        if name.chars().count() < MIN_ROOM_NAME_LEN {
            return Err(AppError::Validation("Room name must be at least 3 characters long".to_owned()));
        }

        if request.participant_ids.is_empty() {
            return Err(AppError::Validation("At least one participant is required".to_owned()));
        }

        if self.repo.name_taken(creator_id, name).await? {
            return Err(AppError::Validation(format!(
                "You already have a room named '{name}'. Please choose a different name"
            )));
        }

        let mut participant_ids: BTreeSet<UserId> = request.participant_ids.iter().copied().collect();
        participant_ids.insert(creator_id);

        let room = self
            .repo
            .create(name, creator_id, &participant_ids, request.description.as_deref(), request.avatar.as_deref())
            .await?;

        tracing::info!(room_id = %room.id, "Room created");

        Ok(RoomDetail { room, participant_ids: participant_ids.into_iter().collect(), messages: Vec::new() })
    }

    /// Rooms the user belongs to, newest first, each with its latest message.
    pub async fn list_rooms(&self, user_id: UserId, filter: Option<&str>) -> Result<Vec<RoomOverview>> {
        let fragment = filter.map(str::trim).filter(|f| !f.is_empty());
        let rooms = self.repo.rooms_for_user(user_id, fragment).await?;

        let mut overviews = Vec::with_capacity(rooms.len());
        for room in rooms {
            let last_message = self.repo.latest_message(room.id).await?;
            overviews.push(RoomOverview { room, last_message });
        }

        Ok(overviews)
    }

    /// Room detail plus full history, for participants only.
    ///
    /// # Errors
    /// `AppError::NotFound` for a missing room, `AppError::NotAParticipant`
    /// for an outsider.
    pub async fn get_room(&self, user_id: UserId, room_id: i64) -> Result<RoomDetail> {
        let room = self.repo.find(room_id).await?.ok_or(AppError::NotFound)?;

        let participant_ids = self.repo.participants(room_id).await?;
        if !participant_ids.contains(&user_id) {
            return Err(AppError::NotAParticipant);
        }

        let messages = self.repo.messages(room_id).await?;

        Ok(RoomDetail { room, participant_ids, messages })
    }

    /// Membership is checked at write time; leaving a room retroactively
    /// invalidates nothing.
    ///
    /// # Errors
    /// `AppError::NotFound` for a missing room, `AppError::NotAParticipant`
    /// when the sender is not currently a member.
    #[tracing::instrument(err(level = "debug"), skip(self, body), fields(room_id = %room_id, sender_id = %sender_id))]
    pub async fn post_message(&self, room_id: i64, sender_id: UserId, body: &str) -> Result<RoomMessage> {
        let room = self.repo.find(room_id).await?.ok_or(AppError::NotFound)?;

        if !self.repo.is_participant(room.id, sender_id).await? {
            return Err(AppError::NotAParticipant);
        }

        self.repo.insert_message(room.id, sender_id, body).await
    }

    pub async fn is_participant(&self, room_id: i64, user_id: UserId) -> Result<bool> {
        self.repo.is_participant(room_id, user_id).await
    }

    /// Deletes a room and everything in it. Admin only.
    ///
    /// # Errors
    /// `AppError::NotFound` / `AppError::Forbidden`.
    #[tracing::instrument(err(level = "debug"), skip(self), fields(room_id = %room_id, requester_id = %requester_id))]
    pub async fn delete_room(&self, room_id: i64, requester_id: UserId) -> Result<u64> {
        let room = self.repo.find(room_id).await?.ok_or(AppError::NotFound)?;

        if room.admin_id != Some(requester_id) {
            return Err(AppError::Forbidden);
        }

        let deleted_messages = self.repo.delete_room(room.id).await?;
        tracing::info!(room_id = %room.id, deleted_messages, "Room deleted");

        Ok(deleted_messages)
    }

    /// Deletes a single room message. Sender only; the admin gets no
    /// override here.
    ///
    /// # Errors
    /// `AppError::NotFound` / `AppError::Forbidden`.
    pub async fn delete_message(&self, room_id: i64, message_id: i64, requester_id: UserId) -> Result<()> {
        let message = self.repo.find_message(room_id, message_id).await?.ok_or(AppError::NotFound)?;

        if message.sender_id != requester_id {
            return Err(AppError::Forbidden);
        }

        self.repo.delete_message(message.id).await?;
        Ok(())
    }
}
