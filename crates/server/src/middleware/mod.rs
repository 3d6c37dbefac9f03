pub mod model_loaders;

pub use model_loaders::{load_subtask_middleware, load_task_middleware};
