// Functions to interact with the PriceRunner search-compare gateway
// (EAN search and per-product offer listings).

use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client, StatusCode,
};
use serde::de::DeserializeOwned;

use crate::{
    color::ColorClassifier,
    config::Settings,
    error::{FetchError, FetchResult, OfferSkip},
    models::{DetailResponse, Merchant, Offer, Price, RawOffer, SearchResponse, NO_OFFER_ID, UNKNOWN_MERCHANT},
};

pub struct PriceRunnerClient {
    client: Client,
    search_url: String,
    detail_url: String,
}

impl PriceRunnerClient {
    // One client for the whole run; headers and timeout come from settings
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&settings.accept).context("Invalid accept header in configuration")?,
        );

        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .timeout(settings.request_timeout())
            .build()
            .context("Failed to build reqwest client")?;

        Ok(Self {
            client,
            search_url: settings.search_url.clone(),
            detail_url: settings.detail_url.clone(),
        })
    }

    /// Resolves an EAN to the first matching product id, `None` when the search is empty.
    pub async fn fetch_product_id(&self, ean: &str) -> FetchResult<Option<String>> {
        let url = self.search_url.replace("{ean}", &encode_component(ean.trim()));
        let search: SearchResponse = self.get_json(&url).await?;

        let product_id = search.products.first().map(|p| p.id.to_string());
        tracing::debug!(ean, product_id = ?product_id, hits = search.products.len(), "Search finished");
        Ok(product_id)
    }

    /// Lists the in-stock offers for a product, in the order the API returns them.
    pub async fn fetch_offers(
        &self,
        product_id: &str,
        classifier: &ColorClassifier,
        expected_color: Option<&str>,
    ) -> FetchResult<Vec<Offer>> {
        let url = self.detail_url.replace("{id}", &encode_component(product_id));
        let detail: DetailResponse = self.get_json(&url).await?;
        Ok(extract_offers(product_id, detail, classifier, expected_color))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> FetchResult<T> {
        tracing::debug!(url, "GET");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        // Buffer first so a bad body surfaces as a decode error, not a transport one
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::debug!(url, response_body = %String::from_utf8_lossy(&body), "JSON decode failed");
            FetchError::Decode(e)
        })
    }
}

/// Percent-encodes a value for a query parameter or a path segment.
fn encode_component(value: &str) -> String {
    // byte_serialize writes a literal '+' as %2B, so any '+' left is a space
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Keeps AVAILABLE/IN_STOCK offers and turns them into report offers.
/// Offers with no usable price or merchant are logged and dropped.
pub fn extract_offers(
    product_id: &str,
    detail: DetailResponse,
    classifier: &ColorClassifier,
    expected_color: Option<&str>,
) -> Vec<Offer> {
    let total = detail.offers.len();
    let offers: Vec<Offer> = detail
        .offers
        .iter()
        .filter(|raw| raw.is_in_stock())
        .filter_map(|raw| match extract_offer(raw, &detail.merchants, classifier, expected_color) {
            Ok(offer) => Some(offer),
            Err(skip) => {
                tracing::warn!(product_id, offer_id = ?raw.id, reason = %skip, "Skipping offer");
                None
            }
        })
        .collect();

    tracing::debug!(product_id, total, kept = offers.len(), "Filtered offers");
    offers
}

fn extract_offer(
    raw: &RawOffer,
    merchants: &HashMap<String, Merchant>,
    classifier: &ColorClassifier,
    expected_color: Option<&str>,
) -> Result<Offer, OfferSkip> {
    let price = raw
        .price
        .as_ref()
        .and_then(|p| p.amount.as_ref())
        .and_then(Price::from_json)
        .ok_or(OfferSkip::InvalidPrice)?;

    let merchant_id = raw
        .merchant_id
        .as_ref()
        .map(|id| id.to_string())
        .ok_or(OfferSkip::MissingMerchantId)?;
    let merchant = merchants
        .get(&merchant_id)
        .ok_or_else(|| OfferSkip::UnknownMerchant(merchant_id.clone()))?;
    let merchant_name = merchant
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_MERCHANT.to_string());

    let offer_id = raw
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_else(|| NO_OFFER_ID.to_string());

    let color = classifier.classify(
        raw.name.as_deref().unwrap_or_default(),
        raw.attribute_labels(),
        expected_color,
    );

    Ok(Offer {
        price,
        merchant_name,
        color,
        offer_id,
    })
}
