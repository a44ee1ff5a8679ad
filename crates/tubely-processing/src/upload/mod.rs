pub mod publisher;

pub use publisher::{ObjectPublisher, PublishError};
