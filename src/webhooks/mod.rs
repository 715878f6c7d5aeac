pub mod document;
pub mod notifications;

pub use document::{
    DocumentValidator, DocumentVerdict, EchoDocumentValidator, IdentityPhoto, WebhookDocumentValidator,
};
pub use notifications::{
    FieldChange, GuestContact, MemoryNotifier, NoopNotifier, Notification, Notifier, StaySummary, VisitTier,
    WebhookNotifier,
};

/// notification delivery failures, logged and never surfaced to the operation
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("no webhook configured for {event}")]
    NotConfigured { event: &'static str },

    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook answered with status {status}")]
    Status { status: u16 },

    #[error("failed to start delivery thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// document validation failures
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error("no document validation webhook configured")]
    NotConfigured,

    #[error("document validation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("document validation answered with status {status}")]
    Status { status: u16 },

    #[error("unreadable document validation response: {message}")]
    InvalidResponse { message: String },
}
