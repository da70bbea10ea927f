//! Search result pages returned by the remote FHIR store.
//!
//! Only the parts the repository adapter reads are modelled: the entries'
//! resources and the `next` link used to walk a paginated searchset.

use serde::Deserialize;
use serde_json::Value as JsonValue;

const NEXT: &str = "next";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    /// `searchset` for everything this service asks for
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub total: Option<u64>,

    #[serde(default)]
    pub link: Vec<BundleLink>,

    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BundleLink {
    pub relation: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(default)]
    pub full_url: Option<String>,
    #[serde(default)]
    pub resource: Option<JsonValue>,
}

impl Bundle {
    pub fn next_link(&self) -> Option<&str> {
        self.link
            .iter()
            .find_map(|link| (link.relation == NEXT).then_some(link.url.as_str()))
    }

    /// Resources of this page. Entries without one (deleted history
    /// entries, bare `fullUrl`s) are dropped.
    pub fn into_resources(self) -> Vec<JsonValue> {
        self.entry.into_iter().filter_map(|entry| entry.resource).collect()
    }
}
