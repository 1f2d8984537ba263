mod dry_run;
mod http_probe;
mod memory_store;
mod pocket_api;

pub use dry_run::DryRun;
pub use http_probe::{BROWSER_USER_AGENT, DEFAULT_PROBE_TIMEOUT, HttpProbe};
pub use memory_store::{DEFAULT_LIFE_WINDOW, DEFAULT_MAX_ENTRY_SIZE, MemoryStore};
pub use pocket_api::{DEFAULT_BASE_URL, PocketApi};
