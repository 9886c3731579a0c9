use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::error::HelyxError;

/// An egress-capped HTTP client that only allows requests to approved hosts.
/// Helyx talks to exactly two remote collaborators (the genome-browser
/// sequence API and the model inference endpoint), so anything else is a bug.
#[derive(Debug, Clone)]
pub struct EgressClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl EgressClient {
    /// Creates a new EgressClient with the default allowlist.
    pub fn new() -> Result<Self, HelyxError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a new EgressClient with the default allowlist and a custom
    /// request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HelyxError> {
        let mut allowlist = HashSet::new();
        let domains = vec![
            "api.genome.ucsc.edu", // UCSC genome browser sequence API
            "localhost",           // local inference / test servers
            "127.0.0.1",           // localhost alt
        ];

        for d in domains {
            allowlist.insert(d.to_string());
        }

        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| HelyxError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Appends the host of `url` to the allowlist, ignoring unparseable input.
    pub fn allow_url(&mut self, url: &str) {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                self.allowlist.insert(host.to_string());
            }
        }
    }

    /// Validates if a URL is permitted under the current egress policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Exact match or a subdomain of an allowed domain
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Exposes the inner `reqwest::Client` builder pattern safely for GET requests.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, HelyxError> {
        if !self.is_allowed(url) {
            return Err(HelyxError::Egress(format!(
                "host not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.get(url))
    }

    /// Exposes the inner `reqwest::Client` builder pattern safely for POST requests.
    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, HelyxError> {
        if !self.is_allowed(url) {
            return Err(HelyxError::Egress(format!(
                "host not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.post(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allowlist_covers_sequence_api() {
        let client = EgressClient::new().unwrap();
        assert!(client.is_allowed(
            "https://api.genome.ucsc.edu/getData/sequence?genome=hg38&chrom=chr17&start=0&end=10"
        ));
    }

    #[test]
    fn test_unlisted_host_is_blocked() {
        let client = EgressClient::new().unwrap();
        assert!(!client.is_allowed("https://example.com/anything"));
        assert!(client.get("https://example.com/anything").is_err());
    }

    #[test]
    fn test_allow_url_adds_host() {
        let mut client = EgressClient::new().unwrap();
        assert!(!client.is_allowed("https://inference.internal/score"));
        client.allow_url("https://inference.internal/score");
        assert!(client.is_allowed("https://inference.internal/other"));
    }

    #[test]
    fn test_subdomain_of_allowed_domain() {
        let mut client = EgressClient::new().unwrap();
        client.allow_domain("genome.ucsc.edu");
        assert!(client.is_allowed("https://hgdownload.genome.ucsc.edu/some/path"));
    }
}
