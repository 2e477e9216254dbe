pub mod context;
pub mod dialog;
pub mod message;
pub mod save;
