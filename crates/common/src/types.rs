use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Diagnostic written to `contacts.message` when no candidate identifier could
/// be validated and sent to.
pub const FAILURE_MESSAGE: &str = "Erro: número inválido ou não encontrado no WhatsApp";

/// One row of the `contacts` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Contact {
    pub id: Uuid,
    /// Raw phone number as entered upstream, arbitrary formatting.
    pub phone: String,
    /// Eligibility gate set by the upstream process.
    pub status: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl Contact {
    /// A contact is pending iff it is enabled and has never been marked.
    pub fn is_pending(&self) -> bool {
        self.status && self.sent_at.is_none()
    }
}

/// Terminal result of processing one contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Delivered to `identifier` with the given caption.
    Sent { identifier: String, caption: String },
    /// Every candidate was rejected or errored.
    Failed,
}

impl Outcome {
    /// Text persisted to `contacts.message` for this outcome.
    pub fn message(&self) -> &str {
        match self {
            Outcome::Sent { caption, .. } => caption,
            Outcome::Failed => FAILURE_MESSAGE,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Sent { .. } => write!(f, "sent"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(status: bool, sent_at: Option<DateTime<Utc>>) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            phone: "(11) 98765-4321".to_string(),
            status,
            sent_at,
            message: None,
        }
    }

    #[test]
    fn test_pending_requires_status_and_no_sent_at() {
        assert!(contact(true, None).is_pending());
        assert!(!contact(false, None).is_pending());
        assert!(!contact(true, Some(Utc::now())).is_pending());
    }

    #[test]
    fn test_outcome_message() {
        let sent = Outcome::Sent {
            identifier: "5511987654321@c.us".to_string(),
            caption: "Olá!".to_string(),
        };
        assert_eq!(sent.message(), "Olá!");
        assert_eq!(sent.to_string(), "sent");
        assert_eq!(Outcome::Failed.message(), FAILURE_MESSAGE);
    }
}
