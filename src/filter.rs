use regex::Regex;
use std::collections::BTreeSet;
use url::Url;

/// Decides which anchors on a page become outbound links
#[derive(Debug)]
pub struct LinkFilter {
    exclude_regexes: Vec<Regex>,
}

impl Default for LinkFilter {
    fn default() -> Self {
        Self::new(&[r"(?i)/(login|signup|register|forgot|password)".to_string()])
            .expect("Default regex patterns should be valid")
    }
}

impl LinkFilter {
    /// Create a filter that drops URLs matching any of `exclude_patterns`
    pub fn new(exclude_patterns: &[String]) -> Result<Self, regex::Error> {
        let mut exclude_regexes = Vec::with_capacity(exclude_patterns.len());
        for pattern in exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }
        Ok(Self { exclude_regexes })
    }

    /// Resolve `hrefs` against `base` and keep the same-origin, query-free,
    /// non-excluded ones. Fragments are stripped and duplicates collapse.
    pub fn clean_links<S: AsRef<str>>(&self, base: &Url, hrefs: &[S]) -> BTreeSet<String> {
        let mut cleaned = BTreeSet::new();

        for href in hrefs {
            let href = href.as_ref().trim();
            if href.is_empty() || href.starts_with('#') || is_javascript(href) {
                continue;
            }

            let Ok(resolved) = base.join(href) else {
                ::log::trace!("Unresolvable link {} on {}", href, base);
                continue;
            };

            if !self.should_follow(&resolved, base) {
                continue;
            }

            cleaned.insert(strip_fragment(resolved).to_string());
        }

        cleaned
    }

    /// Determine if a resolved URL is kept as an outbound link of `base`
    pub fn should_follow(&self, url: &Url, base: &Url) -> bool {
        if !is_same_origin(url, base) {
            return false;
        }

        if url.query().is_some() {
            return false;
        }

        let url_str = url.as_str();
        !self.exclude_regexes.iter().any(|re| re.is_match(url_str))
    }
}

fn is_javascript(href: &str) -> bool {
    href.get(..11)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("javascript:"))
}

/// Host and port must match
fn is_same_origin(url: &Url, base: &Url) -> bool {
    url.host_str() == base.host_str() && url.port_or_known_default() == base.port_or_known_default()
}

fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

/// Canonical string form used for dedup and graph keys. Strings that do not
/// parse as URLs are returned unchanged.
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) => strip_fragment(url).to_string(),
        Err(_) => raw.to_string(),
    }
}
