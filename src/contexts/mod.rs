mod dead_link_sweep;
mod expiring_cache;
mod favorite_picker;

pub use dead_link_sweep::{DEFAULT_WORKERS, DeadLinkSweep, SweepError, SweepReport};
pub use expiring_cache::{Clock, ExpiringCache, SystemClock};
pub use favorite_picker::{FavoritePicker, PickError};
