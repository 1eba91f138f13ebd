pub mod kline;
pub mod record;
pub mod signal;
pub mod ticker;

pub use kline::{PriceBar, PriceHistory};
pub use record::SymbolRecord;
pub use signal::{Signal, SignalSet};
pub use ticker::{TickerMap, TickerStats};
