pub mod mailbox_client;
pub mod mailbox_errors;
pub mod mailbox_model;
pub mod mailbox_traits;
pub mod mime;

pub use mailbox_client::GmailMailboxClient;
pub use mailbox_errors::MailboxError;
pub use mailbox_model::MailMessage;
pub use mailbox_traits::MailboxClientTrait;
