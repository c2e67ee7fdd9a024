pub mod key_manager;
pub mod logger;
pub mod proxy_manager;
pub mod retry;
pub mod run_control;

pub use key_manager::KeyManager;
pub use logger::setup_logger;
pub use proxy_manager::ProxyManager;
pub use run_control::{RunContext, RunState};
