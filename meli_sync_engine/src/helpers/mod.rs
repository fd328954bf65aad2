mod locks;

pub use locks::{Clock, ProcessingLocks, SystemClock, DEFAULT_LOCK_TIMEOUT};
