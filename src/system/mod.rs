//! External collaborators the steps drive: process control, file editing,
//! scripted queries and directory creation

pub mod files;
pub mod filesystem;
pub mod script;
pub mod service;

pub use files::{edit_file, Substitution};
pub use filesystem::make_owned_dir;
pub use script::run_sql;
pub use service::{classify, Accepted, Service, Transition};
