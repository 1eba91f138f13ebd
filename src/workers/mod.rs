pub mod scanner;
pub mod scheduler;

pub use scanner::{CycleReport, MarketScanner, ScanSettings};
pub use scheduler::Scheduler;
