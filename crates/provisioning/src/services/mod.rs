//! External service traits and their in-memory implementations.

pub mod code_image;
pub mod notifier;
pub mod object_storage;
pub mod smtp;

pub use code_image::{CodeImageGenerator, ImagePayload, InMemoryCodeImageGenerator};
pub use notifier::{InMemoryNotifier, LogNotifier, Notification, Notifier};
pub use object_storage::{
    DeleteOutcome, HostedObject, InMemoryObjectStorage, ObjectStorage, UploadOptions,
};
pub use smtp::{SmtpConfig, SmtpNotifier};
