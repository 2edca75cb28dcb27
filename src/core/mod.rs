//! Domain model for the service desk
//!
//! Tickets are the aggregate root. History entries and notifications
//! reference a ticket and are removed with it.

mod builders;
mod history;
mod notification;
mod ticket;
pub mod transition;
mod user;

pub use builders::TicketBuilder;
pub use history::{HistoryEntry, sort_newest_first};
pub use notification::{Notification, NotificationId, NotificationPayload};
pub use ticket::{Priority, Status, Ticket, TicketDraft, TicketId};
pub use transition::{TicketChange, Transition};
pub use user::{Role, User, UserId};
