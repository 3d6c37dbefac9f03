pub mod document;
pub mod subtask;
pub mod task;
pub mod user;
