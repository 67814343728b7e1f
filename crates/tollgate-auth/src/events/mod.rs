//! Event publisher implementations.

pub mod publisher;

pub use publisher::{BroadcastPublisher, FanoutPublisher, RecordingPublisher, TracingPublisher};
