mod queue;

pub use queue::{Fired, TimerHandle, TimerQueue, TimerSlot};
