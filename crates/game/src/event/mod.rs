mod queue;
mod types;

pub use queue::{Schedule, ScheduledEvent};
pub use types::{GameEvent, TimedEvent};
