pub mod monitor;
pub mod scheduler;

pub use monitor::{CompletedDownload, DownloadMonitor};
pub use scheduler::{IntervalScheduler, LoopScheduler, RepeatingScheduler, ScheduleHandle};
