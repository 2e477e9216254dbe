pub mod field_kind;
pub mod snapshot_model;
