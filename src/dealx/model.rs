//! Typed view of the DealX ad search payload.
//!
//! The server echoes upstream JSON verbatim and never deserialises into these
//! types on the request path. They exist for clients that want to render the
//! listing, such as the `search_ads` demo.

use serde::{Deserialize, Serialize};

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Ads on this page.
    pub items: Vec<SanitizedAd>,
    /// 1-based page number.
    pub page: u32,
    /// Page size requested.
    pub per_page: u32,
    /// Matches across all pages.
    pub total_items: u64,
    /// Number of pages at this page size.
    pub total_pages: u64,
}

/// An ad with private fields removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedAd {
    /// Record id.
    pub id: String,
    /// Creation timestamp as sent by the API.
    pub created: String,
    /// Last update timestamp as sent by the API.
    pub updated: String,
    /// Ad title.
    pub title: String,
    /// Ad body; may contain HTML.
    pub description: String,
    /// Asking price.
    pub price: f64,
    /// Quantity on offer.
    pub quantity: f64,
    /// Unit for `quantity`, e.g. `pcs`.
    pub quantity_qualifier: String,
    /// Publication status, e.g. `active`.
    pub status: String,
    /// Whether the ad is pinned to the top of listings.
    pub pinned: bool,
    /// Image URLs, in display order.
    #[serde(default)]
    pub attached_image_urls: Vec<String>,
    /// Author record id; the record itself is under `expand.author`.
    pub author: String,
    /// Inline relations, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<AdExpand>,
}

/// Relations expanded inline by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdExpand {
    /// The ad's author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<SanitizedAuthor>,
    /// Tags attached to the ad.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<SanitizedTag>>,
}

/// Public profile of an ad's author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizedAuthor {
    /// Record id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Avatar URL, if set.
    pub image: Option<String>,
    /// Account creation timestamp.
    pub created: String,
    /// Seller rank.
    pub rank: i64,
}

/// A category tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedTag {
    /// Record id.
    pub id: String,
    /// Tag name.
    pub name: String,
}

impl SanitizedAd {
    /// Author display name, when the relation was expanded.
    #[must_use]
    pub fn author_name(&self) -> Option<&str> {
        self.expand
            .as_ref()
            .and_then(|e| e.author.as_ref())
            .map(|a| a.name.as_str())
    }

    /// Comma-separated tag names, when the relation was expanded.
    #[must_use]
    pub fn tag_names(&self) -> Option<String> {
        self.expand.as_ref().and_then(|e| e.tags.as_ref()).map(|tags| {
            tags.iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
    }
}
