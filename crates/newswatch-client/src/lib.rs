pub mod adapters;
pub mod browser;
pub mod fetcher;

pub use adapters::{TechCrunchAdapter, VergeAdapter, adapter_by_name, known_adapters};
pub use browser::{BrowserPool, RenderSlots};
pub use fetcher::{HttpFetcher, SiteFetcher};
