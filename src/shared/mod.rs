pub mod clock;
pub mod errors;
pub mod locks;
pub mod shutdown;

pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use errors::*;
pub use locks::{LockKey, ScheduleGuard, ScheduleLocks};
pub use shutdown::{listen_for_shutdown_signals, ShutdownSignal};
