//! Application ports
//!
//! Outbound ports are the contracts application services use to reach
//! collaborators outside the process (mail delivery).

pub mod outbound;

pub use outbound::{EmailMessage, EmailSender, MailError};
