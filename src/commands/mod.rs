pub mod delete;
pub mod key;
pub mod list;
pub mod run;
pub mod service;
