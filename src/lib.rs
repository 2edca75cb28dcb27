//! service-desk - Helpdesk ticket lifecycle and live notification service
//!
//! Staff open tickets, admins assign them to technicians, technicians work
//! them to completion. Every change leaves a history entry and notifies the
//! people involved, both as a persisted inbox entry and as a live push to
//! any WebSocket the recipient holds open.
//!
//! The pieces, leaves first:
//! - [`core`]: domain model and the pure transition planner
//! - [`policy`]: who may do what
//! - [`storage`]: repository traits with in-memory and YAML file backends
//! - [`audit`]: history writer
//! - [`notify`]: notification dispatcher, live connection registry, email
//! - [`lifecycle`]: the ticket service that ties them together
//! - [`reports`]: read-only aggregations
//! - [`api`]: axum HTTP and WebSocket surface (feature `api`)
//!
//! # Example
//!
//! ```rust,ignore
//! use service_desk::context::AppContext;
//! use service_desk::core::{Role, TicketDraft, User};
//! use service_desk::storage::UserRepository;
//!
//! let ctx = AppContext::in_memory()?;
//! let staff = User::new("nimal", Role::Staff);
//! ctx.storage.save_user(&staff)?;
//!
//! let ticket = ctx.service.create(
//!     TicketDraft {
//!         title: "Printer broken".into(),
//!         branch: Some("Colombo".into()),
//!         category: Some("Hardware".into()),
//!         ..TicketDraft::default()
//!     },
//!     &staff,
//! )?;
//! ```

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::single_match_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::fn_params_excessive_bools)]
#![allow(clippy::map_unwrap_or)]

pub mod audit;
pub mod auth;
pub mod cli;
pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod policy;
pub mod reports;
pub mod storage;

#[cfg(feature = "api")]
pub mod api;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{Result, ServiceDeskError};
