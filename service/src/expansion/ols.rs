//! EBI Ontology Lookup Service (OLS4) client

use async_trait::async_trait;
use cas_linkml_core::{
    error::{LinkMLError, Result},
    settings::ExpansionSettings,
};
use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use super::{Direction, OntologyService, OntologyTerm, TraversalQuery};

#[derive(Debug, Deserialize)]
struct TermsPage {
    #[serde(rename = "_embedded", default)]
    embedded: Option<EmbeddedTerms>,
    #[serde(default)]
    page: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedTerms {
    #[serde(default)]
    terms: Vec<OlsTerm>,
}

#[derive(Debug, Deserialize)]
struct OlsTerm {
    iri: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    obo_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(default)]
    number: usize,
    #[serde(rename = "totalPages", default)]
    total_pages: usize,
}

impl From<OlsTerm> for OntologyTerm {
    fn from(term: OlsTerm) -> Self {
        Self {
            iri: term.iri,
            curie: term.obo_id,
            label: term.label,
        }
    }
}

/// OLS4 REST client with a response cache
///
/// Complete listings are cached by URL, so a traversal repeated within one
/// run is only fetched once.
pub struct OlsClient {
    client: Client,
    base_url: String,
    page_size: usize,
    cache: Arc<DashMap<String, Vec<OntologyTerm>>>,
}

impl OlsClient {
    /// Create a client from the `expansion` settings section
    ///
    /// # Errors
    ///
    /// Returns a service error if the HTTP client cannot be built.
    pub fn from_settings(settings: &ExpansionSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| LinkMLError::service(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            page_size: settings.page_size.max(1),
            cache: Arc::new(DashMap::new()),
        })
    }

    /// Number of cached listings
    #[must_use]
    pub fn cached_listings(&self) -> usize {
        self.cache.len()
    }

    /// URL of a term resource, or of one of its traversal listings
    fn term_url(&self, ontology: &str, iri: &str, listing: Option<&str>) -> String {
        let url = format!(
            "{}/ontologies/{}/terms/{}",
            self.base_url,
            ols_ontology_id(ontology),
            double_encode(iri)
        );
        match listing {
            Some(listing) => format!("{url}/{listing}"),
            None => url,
        }
    }

    fn page_url(&self, listing_url: &str, page: usize) -> String {
        format!("{listing_url}?size={}&page={page}", self.page_size)
    }

    async fn fetch_page(&self, url: &str) -> Result<Option<TermsPage>> {
        tracing::debug!(url, "querying OLS");
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| LinkMLError::service(format!("OLS request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LinkMLError::service(format!(
                "OLS returned HTTP {} for {url}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LinkMLError::service(format!("Failed to read OLS response: {e}")))?;
        parse_terms_page(&body).map(Some)
    }
}

#[async_trait]
impl OntologyService for OlsClient {
    async fn traverse(&self, query: &TraversalQuery) -> Result<Vec<OntologyTerm>> {
        let listing = listing_for(query);
        let listing_url = self.term_url(&query.ontology, &query.node_iri, Some(listing));
        if let Some(cached) = self.cache.get(&listing_url) {
            return Ok(cached.value().clone());
        }

        let mut terms = Vec::new();
        let mut page = 0;
        loop {
            let Some(body) = self.fetch_page(&self.page_url(&listing_url, page)).await? else {
                tracing::warn!(node = %query.node, ontology = %query.ontology, "term not found in OLS");
                break;
            };
            let last_page = body
                .page
                .is_none_or(|info| info.number + 1 >= info.total_pages);
            let page_terms = body.embedded.map(|e| e.terms).unwrap_or_default();
            let empty = page_terms.is_empty();
            terms.extend(page_terms.into_iter().map(OntologyTerm::from));
            if last_page || empty {
                break;
            }
            page += 1;
        }

        tracing::debug!(node = %query.node, listing, found = terms.len(), "OLS traversal");
        self.cache.insert(listing_url, terms.clone());
        Ok(terms)
    }

    async fn lookup(&self, ontology: &str, iri: &str) -> Result<Option<OntologyTerm>> {
        let url = self.term_url(ontology, iri, None);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| LinkMLError::service(format!("OLS request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LinkMLError::service(format!(
                "OLS returned HTTP {} for {url}",
                response.status()
            )));
        }
        let term: OlsTerm = response
            .json()
            .await
            .map_err(|e| LinkMLError::service(format!("Malformed OLS term: {e}")))?;
        Ok(Some(term.into()))
    }
}

/// OLS listing endpoint for a traversal
fn listing_for(query: &TraversalQuery) -> &'static str {
    match (query.direction, query.direct_only, query.hierarchical) {
        (Direction::Descendants, false, false) => "descendants",
        (Direction::Descendants, true, false) => "children",
        (Direction::Descendants, false, true) => "hierarchicalDescendants",
        (Direction::Descendants, true, true) => "hierarchicalChildren",
        (Direction::Ancestors, false, false) => "ancestors",
        (Direction::Ancestors, true, false) => "parents",
        (Direction::Ancestors, false, true) => "hierarchicalAncestors",
        (Direction::Ancestors, true, true) => "hierarchicalParents",
    }
}

/// OLS ontology id from a `source_ontology` value such as `obo:cl`
fn ols_ontology_id(source_ontology: &str) -> String {
    source_ontology
        .rsplit(':')
        .next()
        .unwrap_or(source_ontology)
        .to_lowercase()
}

/// OLS expects term IRIs URL-encoded twice in the path
fn double_encode(iri: &str) -> String {
    let once: String = url::form_urlencoded::byte_serialize(iri.as_bytes()).collect();
    url::form_urlencoded::byte_serialize(once.as_bytes()).collect()
}

fn parse_terms_page(body: &str) -> Result<TermsPage> {
    serde_json::from_str(body)
        .map_err(|e| LinkMLError::service(format!("Malformed OLS response: {e}")))
}
