use crate::domain::message::{Conversation, ConversationDetail, DirectMessage};
use crate::domain::user::{User, UserId};
use crate::error::{AppError, Result};
use crate::storage::message_repo::MessageRepository;
use crate::storage::user_repo::UserRepository;
use opentelemetry::{
    KeyValue, global,
    metrics::Counter,
};

#[derive(Clone, Debug)]
pub(crate) struct Metrics {
    pub(crate) sent_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("parley-server");
        Self {
            sent_total: meter
                .u64_counter("parley_direct_messages_sent_total")
                .with_description("Total direct messages stored")
                .build(),
        }
    }
}

/// The direct-message half of the message store: dual-copy sends,
/// conversation listing, the read-marking detail view, owner-scoped deletes.
#[derive(Clone, Debug)]
pub struct ChatService {
    repo: MessageRepository,
    users: UserRepository,
    metrics: Metrics,
}

impl ChatService {
    #[must_use]
    pub fn new(repo: MessageRepository, users: UserRepository) -> Self {
        Self { repo, users, metrics: Metrics::new() }
    }

    /// Stores a direct message as an atomic pair of owner copies. Empty
    /// bodies and self-messages are the caller's business, not this layer's.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the pair cannot be committed; no
    /// partial pair is left behind.
    #[tracing::instrument(err(level = "warn"), skip(self, body), fields(sender_id = %sender_id, recipient_id = %recipient_id))]
    pub async fn send_direct(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        body: &str,
    ) -> Result<(DirectMessage, DirectMessage)> {
        match self.repo.create_pair(sender_id, recipient_id, body).await {
            Ok(pair) => {
                tracing::debug!("Direct message stored");
                self.metrics.sent_total.add(1, &[KeyValue::new("status", "success")]);
                Ok(pair)
            }
            Err(e) => {
                self.metrics.sent_total.add(1, &[KeyValue::new("status", "failure")]);
                Err(e)
            }
        }
    }

    /// Resolves a recipient handle through the directory, then sends.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` for an unknown handle.
    pub async fn send_to_username(
        &self,
        sender_id: UserId,
        to_username: &str,
        body: &str,
    ) -> Result<(User, DirectMessage, DirectMessage)> {
        let recipient = self.users.find_by_username(to_username).await?.ok_or(AppError::NotFound)?;
        let (sender_copy, recipient_copy) = self.send_direct(sender_id, recipient.id, body).await?;
        Ok((recipient, sender_copy, recipient_copy))
    }

    /// Conversations for a user, newest activity first. With a filter, the
    /// list collapses to the first username match — the reference behavior,
    /// not a general search.
    #[tracing::instrument(err, skip(self, filter), fields(user_id = %user_id))]
    pub async fn list_conversations(&self, user_id: UserId, filter: Option<&str>) -> Result<Vec<Conversation>> {
        if let Some(fragment) = filter.map(str::trim).filter(|f| !f.is_empty()) {
            let Some(partner) = self.users.first_match(fragment, user_id).await? else {
                return Ok(Vec::new());
            };
            let Some(last_message) = self.repo.latest_with_partner(user_id, partner.id).await? else {
                return Ok(Vec::new());
            };
            let unread_count = self.repo.unread_from(user_id, partner.id).await?;
            let is_sent_last = last_message.sender_id == user_id;
            return Ok(vec![Conversation { partner, last_message, unread_count, is_sent_last }]);
        }

        let latest = self.repo.latest_per_partner(user_id).await?;
        let unread: std::collections::HashMap<UserId, i64> =
            self.repo.unread_counts(user_id).await?.into_iter().collect();

        let mut conversations = Vec::with_capacity(latest.len());
        for last_message in latest {
            let partner_id =
                if last_message.sender_id == user_id { last_message.recipient_id } else { last_message.sender_id };

            let Some(partner) = self.users.find_by_id(partner_id).await? else {
                tracing::debug!(%partner_id, "Skipping conversation with partner missing from directory");
                continue;
            };

            let is_sent_last = last_message.sender_id == user_id;
            conversations.push(Conversation {
                partner,
                unread_count: unread.get(&partner_id).copied().unwrap_or(0),
                last_message,
                is_sent_last,
            });
        }

        Ok(conversations)
    }

    /// Fetches a conversation for viewing. Viewing is the read receipt: all
    /// of the viewer's unread copies from this partner flip to read before
    /// the list is loaded, so the returned rows already reflect it. Sent
    /// messages get annotated with whether the partner's copy has been read.
    #[tracing::instrument(err, skip(self), fields(user_id = %user_id, partner_id = %partner_id))]
    pub async fn get_conversation(&self, user_id: UserId, partner_id: UserId) -> Result<ConversationDetail> {
        let partner = self.users.find_by_id(partner_id).await?.ok_or(AppError::NotFound)?;

        self.repo.mark_read(user_id, partner_id).await?;

        let mut messages = self.repo.conversation(user_id, partner_id).await?;
        for message in &mut messages {
            if message.sender_id == user_id {
                let read = self
                    .repo
                    .recipient_copy_read(partner_id, user_id, &message.body, message.created_at)
                    .await?
                    .unwrap_or(false);
                message.recipient_has_read = Some(read);
            }
        }

        Ok(ConversationDetail { partner, messages })
    }

    /// # Errors
    /// Returns `AppError::NotFound` when the caller owns no such message.
    pub async fn delete_message(&self, user_id: UserId, message_id: i64) -> Result<u64> {
        let deleted = self.repo.delete_owned(user_id, message_id).await?;
        if deleted == 0 {
            return Err(AppError::NotFound);
        }
        Ok(deleted)
    }

    /// Deletes the caller's copies of a conversation and reports how many
    /// rows went away. Deleting an empty conversation is not an error.
    pub async fn delete_conversation(&self, user_id: UserId, partner_id: UserId) -> Result<u64> {
        self.repo.delete_conversation(user_id, partner_id).await
    }
}
