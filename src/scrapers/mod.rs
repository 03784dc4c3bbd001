//! Site-specific result extractors.
//!
//! Each supported timing site gets one [`Scraper`] implementation:
//! - Finishtime (`FinishtimeScraper`): paged tables behind a CId/RId pair
//! - Bouttime (`BouttimeScraper`): one ASP.NET page per distance
//! - Ultimate (`UltimateDkScraper`): one oversized data page per distance
//! - MobiiElite (`MobiiEliteScraper`): JSON results API
//!
//! [`scraper_for_url`] picks the implementation from the URL's hostname.

mod bouttime;
mod finishtime;
mod mobiielite;
mod select;
pub mod table;
mod ultimate_dk;

use std::fmt;

use crate::models::ResultRow;

pub use bouttime::BouttimeScraper;
pub use finishtime::FinishtimeScraper;
pub use mobiielite::MobiiEliteScraper;
pub use select::{Site, scraper_for_url};
pub use ultimate_dk::UltimateDkScraper;

/// A results extractor bound to one input URL.
pub trait Scraper {
    /// Which site this scraper handles.
    fn site(&self) -> Site;

    /// Produce every result row for the bound URL.
    ///
    /// Never fails: problems are logged and yield fewer (or no) rows.
    fn get_results(&self) -> Vec<ResultRow>;
}

impl<'a> fmt::Debug for dyn Scraper + 'a {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scraper").field("site", &self.site()).finish()
    }
}
