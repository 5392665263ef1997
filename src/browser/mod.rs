//! Headless browser management: executable discovery, launch, the shared
//! page pool, and the browser-backed page source.

pub mod js_scripts;
pub mod pool;
pub mod setup;
pub mod source;

pub use pool::{BrowserPool, PageGuard};
pub use setup::{find_browser_executable, launch_browser};
pub use source::BrowserPageSource;
