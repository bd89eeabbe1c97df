//! Passive listener: deletes messages from censored users as they arrive.

use tracing::{debug, warn};

use super::Moderator;
use crate::client::ChatClient;
use crate::core::StateStore;
use crate::error::Result;
use crate::message::Message;

impl<C: ChatClient, S: StateStore> Moderator<C, S> {
    /// Inspects an incoming message and deletes it if its author is censored.
    ///
    /// Edit events, anonymous messages and the bot's own messages are never
    /// touched. Returns `true` if the message was deleted; a refused delete is
    /// logged and reported as `false`.
    pub async fn on_message(&self, msg: &Message) -> Result<bool> {
        if msg.is_edit() {
            return Ok(false);
        }
        let Some(sender) = msg.sender else {
            return Ok(false);
        };
        if sender == self.my_id().await? {
            return Ok(false);
        }

        if !self.lock_state().await.is_censored(msg.chat, sender) {
            return Ok(false);
        }

        if let Err(e) = self.client.delete_message(msg.chat, msg.id).await {
            warn!(chat = %msg.chat, message = %msg.id, error = %e, "could not delete censored message");
            return Ok(false);
        }
        debug!(chat = %msg.chat, user = %sender, "deleted censored message");
        self.mark_offline().await;
        Ok(true)
    }
}
