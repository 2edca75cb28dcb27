//! Notification fan-out
//!
//! [`NotificationDispatcher`] persists notifications and hands them to the
//! [`SubscriptionRegistry`] for live delivery and to an [`EmailSender`].

mod dispatcher;
mod email;
mod registry;

pub use dispatcher::NotificationDispatcher;
pub use email::{EmailMessage, EmailRenderer, EmailSender, LogMailer};
pub use registry::{ConnectionId, LiveConnection, Subscription, SubscriptionRegistry};
