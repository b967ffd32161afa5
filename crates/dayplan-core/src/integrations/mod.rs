//! File-based imports: fixed calendar events and external to-do items.

pub mod events;
pub mod todos;

pub use events::{events_to_blocks, parse_events, FixedEventRecord};
pub use todos::{parse_due, parse_duration_text, parse_todos, todos_to_tasks, TodoRecord};
