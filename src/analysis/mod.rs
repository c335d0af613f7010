mod drop_list;
mod format;
mod net_inflow;
mod view;

pub use drop_list::top_losers;
pub use format::{format_number, format_optional};
pub use net_inflow::{estimate, fallback_basis, native_interval, net_inflow};
pub use view::{CoinView, IntervalChange};
