pub mod fill;
pub mod fill_model;
pub mod schedule;
