//! Site adapters.
//!
//! A site adapter is a [`SiteDescriptor`] plus the generic extraction logic
//! in [`crate::extract`]. The built-in catalog below is the default when the
//! config file declares no `[[sites]]`.

mod types;

pub use types::*;

/// Built-in site catalog, in registration order.
pub fn builtin_sites() -> Vec<SiteDescriptor> {
    vec![
        SiteDescriptor::new(
            "animefire",
            "AnimeFire",
            "https://animefire.plus/em-lancamento",
            "https://animefire.plus/pesquisar/{query}",
        ),
        SiteDescriptor::new(
            "goyabu",
            "Goyabu",
            "https://goyabu.io/lista-de-animes",
            "https://goyabu.io/?s={query}",
        ),
        SiteDescriptor::new(
            "animesonlinecc",
            "Animes Online CC",
            "https://animesonlinecc.to/anime/",
            "https://animesonlinecc.to/search/{query}",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_sites_have_unique_ids() {
        let sites = builtin_sites();
        let ids: HashSet<_> = sites.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), sites.len());
    }

    #[test]
    fn test_builtin_search_templates_take_query() {
        for site in builtin_sites() {
            assert!(site.search_url.contains("{query}"), "{}", site.id);
        }
    }
}
