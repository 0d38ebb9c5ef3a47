//! Host-agnostic logic for the 4Max Pro touch panel
//!
//! This crate contains everything between the panel's line protocol and
//! the printer host that does not touch a socket or a serial device:
//!
//! - Collaborator traits (machine status, storage listing, script runner)
//! - Menu catalog and page builder
//! - Print-state notifier
//! - Script dispatch queue
//! - Link state machine and session controller
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod notifier;
pub mod paging;
pub mod session;
pub mod state;
pub mod traits;

pub use catalog::{CatalogError, MenuCatalog, MenuEntry, Navigation};
pub use dispatch::{DispatchQueue, Drained};
pub use notifier::StateNotifier;
pub use paging::{Page, PageBuilder, PageRow, PAGE_SIZE};
pub use session::{SelectionContext, Session, SessionError};
pub use state::{LinkEvent, LinkState};
