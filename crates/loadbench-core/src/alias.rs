//! Endpoint alias resolution: opaque tokens in the raw `url` tag are
//! rewritten through a small, configured mapping. Unknown tokens pass
//! through unchanged.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct EndpointAliasMap {
    aliases: HashMap<String, String>,
}

impl EndpointAliasMap {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    /// The sample mapping k6's own test site uses; a reasonable default
    /// for local runs, overridable by configuration.
    pub fn with_defaults() -> Self {
        let aliases = [
            ("home", "https://test.k6.io/"),
            ("news", "https://test.k6.io/news.php"),
            ("contact", "https://test.k6.io/contact.php"),
            ("login", "https://test.k6.io/login.php"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { aliases }
    }

    /// Resolve a raw url tag. Tokens absent from the map pass through
    /// unchanged — this is NOT the same behavior as a dict lookup that
    /// maps misses to null.
    pub fn resolve(&self, token: &str) -> String {
        self.aliases
            .get(token)
            .cloned()
            .unwrap_or_else(|| token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_token_is_rewritten() {
        let map = EndpointAliasMap::with_defaults();
        assert_eq!(map.resolve("home"), "https://test.k6.io/");
    }

    #[test]
    fn unknown_token_passes_through_unchanged() {
        let map = EndpointAliasMap::with_defaults();
        assert_eq!(map.resolve("checkout"), "checkout");
    }

    #[test]
    fn empty_map_passes_everything_through() {
        let map = EndpointAliasMap::new(HashMap::new());
        assert_eq!(map.resolve("home"), "home");
    }
}
