pub mod classify;
pub mod evaluate;
pub mod policy;
pub mod summary;
pub mod validate;
