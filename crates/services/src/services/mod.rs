pub mod progress;
pub mod subtask;
pub mod task;
pub mod validate;

#[cfg(test)]
pub mod test_support;
