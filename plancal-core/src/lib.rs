//! Core types and the state engine for the plancal ecosystem.
//!
//! This crate provides everything the plancal CLI (or any other frontend)
//! needs to manage content-planning calendars:
//! - entity types (`Account`, `Project`, `ProjectDocument`, `Calendar`, `Post`)
//! - `migrate` for upcasting stored documents across schema generations
//! - the `DocumentStore` contract plus in-memory and file-backed stores
//! - the `Engine`: canonical in-memory state with optimistic local edits
//!   and transactional saves
//! - the change log, the post filter view and the `.ccpro` exchange format

pub mod calendar;
pub mod config;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod filter;
pub mod log;
pub mod migrate;
pub mod post;
pub mod project;
pub mod store;

pub use calendar::Calendar;
pub use engine::Engine;
pub use error::{PlancalError, PlancalResult};
pub use post::{Post, PostStatus, PostType, ThemeColor};
pub use project::{Account, Project, ProjectDocument};
