use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sender ID used for messages the desk writes itself (acknowledgements,
/// reopen and assignment notices).
pub const SYSTEM_SENDER_ID: &str = "system";
pub const SYSTEM_SENDER_NAME: &str = "System";

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub ticket_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_automated: bool,
    #[serde(default)]
    pub is_internal: bool,
}

impl Message {
    pub fn is_system(&self) -> bool {
        self.sender_id == SYSTEM_SENDER_ID
    }
}

/// The fields a caller supplies; ID, ticket and timestamp are assigned on
/// append.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub is_automated: bool,
    pub is_internal: bool,
}

impl NewMessage {
    pub fn from_actor(
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            content: content.into(),
            is_automated: false,
            is_internal: false,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::from_actor(SYSTEM_SENDER_ID, SYSTEM_SENDER_NAME, content)
    }

    pub fn internal(mut self) -> Self {
        self.is_internal = true;
        self
    }

    pub fn automated(mut self) -> Self {
        self.is_automated = true;
        self
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Append a message to a ticket's timeline and return its ID.
///
/// `seq` is the monotonic counter stored on the owning ticket, so IDs stay
/// unique and ordered for the life of the ticket.
pub fn append(
    messages: &mut Vec<Message>,
    seq: &mut u32,
    ticket_id: &str,
    new: NewMessage,
) -> String {
    *seq += 1;
    let id = format!("{ticket_id}-M{}", *seq);
    messages.push(Message {
        id: id.clone(),
        ticket_id: ticket_id.to_string(),
        sender_id: new.sender_id,
        sender_name: new.sender_name,
        content: new.content,
        created_at: Utc::now(),
        is_automated: new.is_automated,
        is_internal: new.is_internal,
    });
    id
}

/// Messages a requester may see: everything except internal notes.
pub fn public_only(messages: &[Message]) -> Vec<Message> {
    messages.iter().filter(|m| !m.is_internal).cloned().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
