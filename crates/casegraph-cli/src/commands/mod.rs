pub mod detect;
pub mod export;
pub mod flatten;
pub mod import;
pub mod list;
pub mod validate;
