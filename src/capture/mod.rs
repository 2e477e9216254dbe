pub mod capture;
pub mod key;
pub mod selector;
