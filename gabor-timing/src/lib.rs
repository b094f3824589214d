pub mod pacer;
pub mod schedule;
pub mod timer;

pub use pacer::{FramePacer, PacerError, StopFlag};
pub use schedule::{TimerHandle, TimerQueue};
pub use timer::{HighPrecisionTimer, RefreshStats, Timer};
