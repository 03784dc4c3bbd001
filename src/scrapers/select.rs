//! Hostname-based scraper selection.

use std::fmt;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::utils::http::HttpFetch;
use crate::utils::url::site_host;

use super::{BouttimeScraper, FinishtimeScraper, MobiiEliteScraper, Scraper, UltimateDkScraper};

/// Supported timing sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    Finishtime,
    Bouttime,
    UltimateDk,
    MobiiElite,
}

/// Exact hostnames, without `www.`, mapped to their site.
const SITES: &[(&str, Site)] = &[
    ("results.finishtime.co.za", Site::Finishtime),
    ("bouttime.co.za", Site::Bouttime),
    ("live.ultimate.dk", Site::UltimateDk),
    ("mobiielite.com", Site::MobiiElite),
];

impl Site {
    /// Look up the site for a URL by exact hostname.
    pub fn from_url(url: &str) -> Option<Self> {
        let host = site_host(url)?;
        SITES
            .iter()
            .find(|(name, _)| *name == host)
            .map(|(_, site)| *site)
    }

    /// Build this site's scraper for `url`.
    pub fn scraper<'a>(
        self,
        url: &str,
        client: &'a dyn HttpFetch,
        config: &Config,
    ) -> Box<dyn Scraper + 'a> {
        match self {
            Site::Finishtime => Box::new(FinishtimeScraper::new(url, client)),
            Site::Bouttime => Box::new(BouttimeScraper::new(url, client)),
            Site::UltimateDk => Box::new(UltimateDkScraper::new(url, client)),
            Site::MobiiElite => Box::new(MobiiEliteScraper::new(
                url,
                client,
                config.mobiielite.clone(),
            )),
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Site::Finishtime => "Finishtime",
            Site::Bouttime => "Bouttime",
            Site::UltimateDk => "Ultimate.dk",
            Site::MobiiElite => "MobiiElite",
        };
        f.write_str(name)
    }
}

/// Return the scraper for the given URL.
pub fn scraper_for_url<'a>(
    url: &str,
    client: &'a dyn HttpFetch,
    config: &Config,
) -> Result<Box<dyn Scraper + 'a>> {
    let site = Site::from_url(url).ok_or_else(|| AppError::unrecognized(url))?;
    log::debug!("Selected {} scraper for {}", site, url);
    Ok(site.scraper(url, client, config))
}
