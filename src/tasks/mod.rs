pub mod model;
pub mod service;

pub use model::{NewTask, Priority, TaskPage, TaskPatch, TaskRow};
pub use service::{FieldError, Mutation, TaskError, TaskService};
