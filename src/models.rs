// Data structures for the PriceRunner API and the offers we keep from it.

use std::{collections::HashMap, fmt};

use serde::Deserialize;
use serde_json::Value;

pub const UNKNOWN_MERCHANT: &str = "Unknown Merchant";
pub const NO_OFFER_ID: &str = "No Offer ID";
pub const NO_PRODUCT_FOUND: &str = "No Product Found";
pub const NOT_SURE: &str = "Not Sure";

// --- API response shapes ---

/// Ids show up as strings or bare numbers depending on the endpoint.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum JsonId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for JsonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonId::Text(s) => f.write_str(s),
            JsonId::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub products: Vec<SearchProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SearchProduct {
    pub id: JsonId,
}

#[derive(Debug, Deserialize)]
pub struct DetailResponse {
    #[serde(default)]
    pub offers: Vec<RawOffer>,
    #[serde(default)]
    pub merchants: HashMap<String, Merchant>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawOffer {
    pub id: Option<JsonId>,
    pub price: Option<RawPrice>,
    pub merchant_id: Option<JsonId>,
    pub availability: Option<String>,
    pub stock_status: Option<String>,
    pub name: Option<String>,
    pub labels: Option<OfferLabels>,
}

impl RawOffer {
    /// Only AVAILABLE + IN_STOCK offers make it into the report.
    pub fn is_in_stock(&self) -> bool {
        self.availability.as_deref() == Some("AVAILABLE")
            && self.stock_status.as_deref() == Some("IN_STOCK")
    }

    pub fn attribute_labels(&self) -> &[AttributeLabel] {
        self.labels
            .as_ref()
            .map(|l| l.attribute_labels.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawPrice {
    // Number or numeric string
    pub amount: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OfferLabels {
    #[serde(default)]
    pub attribute_labels: Vec<AttributeLabel>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AttributeLabel {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct Merchant {
    pub name: Option<String>,
}

// --- Extracted offer ---

/// A sell price, written without a fractional part when it is a whole number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Price {
    Whole(i64),
    Decimal(f64),
}

impl Price {
    pub fn from_amount(amount: f64) -> Self {
        if amount.fract() == 0.0 && amount.abs() < i64::MAX as f64 {
            Price::Whole(amount as i64)
        } else {
            Price::Decimal(amount)
        }
    }

    /// Accepts `149`, `149.0` and `"149.00"`; anything else is `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let amount = match value {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        amount.is_finite().then(|| Price::from_amount(amount))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Whole(n) => write!(f, "{}", n),
            Price::Decimal(d) => write!(f, "{}", d),
        }
    }
}

/// An in-stock merchant offer as it ends up in the report.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub price: Price,
    pub merchant_name: String,
    pub color: String,
    pub offer_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_prices_drop_the_fraction() {
        assert_eq!(Price::from_amount(100.0).to_string(), "100");
        assert_eq!(Price::from_amount(99.5).to_string(), "99.5");
        assert_eq!(Price::from_json(&json!("149.00")), Some(Price::Whole(149)));
        assert_eq!(Price::from_json(&json!(12.25)), Some(Price::Decimal(12.25)));
    }

    #[test]
    fn non_numeric_prices_are_rejected() {
        assert_eq!(Price::from_json(&json!("call us")), None);
        assert_eq!(Price::from_json(&json!(null)), None);
        assert_eq!(Price::from_json(&json!({ "amount": 1 })), None);
    }

    #[test]
    fn detail_response_tolerates_numeric_ids_and_missing_fields() {
        let body = json!({
            "offers": [
                {
                    "id": 981,
                    "price": { "amount": "59.90" },
                    "merchantId": 7,
                    "availability": "AVAILABLE",
                    "stockStatus": "IN_STOCK",
                    "name": "Keps",
                    "labels": { "attributeLabels": [{ "name": "Färg", "value": "Blå" }] }
                },
                { "availability": "OUT_OF_STOCK" }
            ],
            "merchants": { "7": { "name": "ShopX" } }
        });
        let detail: DetailResponse = serde_json::from_value(body).unwrap();
        assert_eq!(detail.offers.len(), 2);
        assert_eq!(detail.offers[0].id.as_ref().unwrap().to_string(), "981");
        assert!(detail.offers[0].is_in_stock());
        assert_eq!(detail.offers[0].attribute_labels()[0].value, "Blå");
        assert!(!detail.offers[1].is_in_stock());
        assert!(detail.offers[1].attribute_labels().is_empty());
        assert_eq!(detail.merchants["7"].name.as_deref(), Some("ShopX"));
    }
}
