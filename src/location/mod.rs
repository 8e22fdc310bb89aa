//! URL state adapter
//!
//! The `q` parameter of the page URL is the only durable state of a search
//! session. Reads degrade to an empty string, writes replace the current
//! history entry and never navigate.

mod memory;

pub use memory::MemoryLocation;

use tracing::{debug, warn};
use url::Url;

/// Name of the query parameter shared by the search bar and the panels
pub const QUERY_PARAM: &str = "q";

/// The current page location, as a browser exposes it
pub trait Location: Send + Sync {
    /// Full current URL
    fn href(&self) -> String;

    /// Replace the current history entry without reloading
    fn replace(&self, href: &str);

    /// Navigate to `href`, leaving the current page.
    ///
    /// Relative targets resolve against the current URL.
    fn assign(&self, href: &str);

    /// Path component of the current URL, empty when unparsable
    fn pathname(&self) -> String {
        Url::parse(&self.href())
            .map(|url| url.path().to_string())
            .unwrap_or_default()
    }
}

/// Read a query parameter, returning an empty string when absent
pub fn read_param(location: &dyn Location, name: &str) -> String {
    let Ok(url) = Url::parse(&location.href()) else {
        return String::new();
    };

    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

/// Set a query parameter in place.
///
/// An existing value is overwritten where it stands; otherwise the parameter
/// is appended. No history entry is added.
pub fn write_param(location: &dyn Location, name: &str, value: &str) {
    let href = location.href();
    let mut url = match Url::parse(&href) {
        Ok(url) => url,
        Err(e) => {
            warn!("Cannot write '{}' into unparsable URL {}: {}", name, href, e);
            return;
        }
    };

    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let mut found = false;
    pairs.retain_mut(|(key, current)| {
        if key != name {
            return true;
        }
        if found {
            return false;
        }
        found = true;
        *current = value.to_string();
        true
    });
    if !found {
        pairs.push((name.to_string(), value.to_string()));
    }

    url.query_pairs_mut().clear().extend_pairs(pairs.iter());
    debug!("Replacing URL state: {}", url);
    location.replace(url.as_str());
}

/// Link to a results page carrying `query` as the `q` parameter
pub fn search_page_href(path: &str, query: &str) -> String {
    format!("{}?{}={}", path, QUERY_PARAM, urlencoding::encode(query))
}

/// Resolve `target` against `base`, keeping `target` as-is when either fails
pub(crate) fn resolve(base: &str, target: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(target))
        .map(String::from)
        .unwrap_or_else(|_| target.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_param() {
        let location = MemoryLocation::new("https://shop.example/search/");
        assert_eq!(read_param(&location, "q"), "");
    }

    #[test]
    fn test_read_decodes_value() {
        let location = MemoryLocation::new("https://shop.example/search/?q=red+shoes&page=2");
        assert_eq!(read_param(&location, "q"), "red shoes");
        assert_eq!(read_param(&location, "page"), "2");
    }

    #[test]
    fn test_unparsable_url_reads_empty() {
        let location = MemoryLocation::new("not a url ?q=foo");
        assert_eq!(read_param(&location, "q"), "");
        assert_eq!(location.pathname(), "");
    }

    #[test]
    fn test_write_then_read_without_history_entry() {
        let location = MemoryLocation::new("https://shop.example/search/");
        let before = location.history_len();

        write_param(&location, "q", "abc");

        assert_eq!(read_param(&location, "q"), "abc");
        assert_eq!(location.history_len(), before);
        assert!(location.take_navigation().is_none());
    }

    #[test]
    fn test_write_overwrites_in_place() {
        let location =
            MemoryLocation::new("https://shop.example/search/?brand=acme&q=old&q=dup&page=2");

        write_param(&location, "q", "new value");

        assert_eq!(
            location.href(),
            "https://shop.example/search/?brand=acme&q=new+value&page=2"
        );
    }

    #[test]
    fn test_write_appends_missing_param() {
        let location = MemoryLocation::new("https://shop.example/search/?page=2");
        write_param(&location, "q", "bag");
        assert_eq!(location.href(), "https://shop.example/search/?page=2&q=bag");
    }

    #[test]
    fn test_write_on_unparsable_url_is_noop() {
        let location = MemoryLocation::new("::garbage::");
        write_param(&location, "q", "abc");
        assert_eq!(location.href(), "::garbage::");
    }

    #[test]
    fn test_search_page_href_round_trip() {
        let href = search_page_href("/search/", "red shoes & bags");
        assert_eq!(href, "/search/?q=red%20shoes%20%26%20bags");

        let location = MemoryLocation::new("https://shop.example/");
        location.assign(&href);
        assert_eq!(read_param(&location, "q"), "red shoes & bags");
        assert_eq!(location.pathname(), "/search/");
    }
}
