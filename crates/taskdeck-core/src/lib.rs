pub mod access;
pub mod actor;
pub mod document;
pub mod task;
pub mod user;

pub use actor::Actor;
pub use document::Document;
pub use task::{Priority, Status, Task};
pub use user::{Role, User};
