//! Shared User-Agent string for catalog requests.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/catalog-ingest";

/// Default User-Agent for catalog fetches (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("catalog-ingest/{version} (metadata-harvester; +{PROJECT_UA_URL})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_contains_version_and_project_url() {
        let ua = default_user_agent();
        assert!(ua.contains(PROJECT_UA_URL));
        assert_eq!(
            ua.strip_prefix("catalog-ingest/")
                .and_then(|s| s.split(' ').next()),
            Some(env!("CARGO_PKG_VERSION"))
        );
    }

    #[test]
    fn test_user_agent_identifies_harvester() {
        assert!(default_user_agent().contains("metadata-harvester"));
    }
}
