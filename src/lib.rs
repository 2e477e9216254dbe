//! Capture the state of a page's forms as named snapshots and write it back
//! later, locating fields by name, id or a synthesized CSS selector.

pub mod capture;
pub mod cli;
pub mod dom;
pub mod error;
pub mod fill;
pub mod snapshot;
pub mod store;
pub mod workflow;
