//! Channel identity resolution.
//!
//! The watch page does not expose the channel directly, so it is scraped from links
//! that point at the channel page. The popup additionally accepts the tab URL when
//! the user is on the channel page itself.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::{PageHost, Settings};

/// `/channel/<id>`, `/c/<id>`, `/user/<id>` and `/@/<id>`, plus the bare `/@<handle>`
/// form the site uses for handles. The id stops at the next `/` or `?`.
static CHANNEL_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:(?:channel|c|user)/|@/?)([^/?]+)").expect("channel pattern is valid")
});

/// Extract a channel id from a URL, if it points at a channel.
pub fn channel_id_from_url(url: &str) -> Option<String> {
    CHANNEL_PATH
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Candidate URLs gathered from a page, in priority order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSources {
    pub channel_link: Option<String>,
    pub meta_link: Option<String>,
    pub page_url: Option<String>,
}

impl ChannelSources {
    /// Read the link-based sources from a live page. The page URL is left out: the
    /// content script only trusts links that name the video's channel.
    pub fn from_page<H: PageHost>(host: &H, settings: &Settings) -> Self {
        Self {
            channel_link: host.query_href(&settings.channel_link_selector),
            meta_link: host.query_href(&settings.channel_meta_selector),
            page_url: None,
        }
    }

    /// First source that yields an id wins.
    pub fn resolve(&self) -> Option<String> {
        [&self.channel_link, &self.meta_link, &self.page_url]
            .into_iter()
            .flatten()
            .find_map(|url| channel_id_from_url(url))
    }
}
