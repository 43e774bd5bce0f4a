// Runtime settings for the offer export.
// Layered with the 'config' crate: built-in defaults, optional config.toml, APP_* env vars.

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::color::{ColorLanguage, ColorPolicy};

const DEFAULT_SEARCH_URL: &str =
    "https://www.pricerunner.se/se/api/search-compare-gateway/public/search/v5/SE?q={ean}";
const DEFAULT_DETAIL_URL: &str = "https://www.pricerunner.se/se/api/search-compare-gateway/public/product-detail/v0/offers/SE/{id}?af_ORIGIN=NATIONAL&af_ITEM_CONDITION=NEW,UNKNOWN&sortByPreset=PRICE";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.159 Safari/537.36";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Search endpoint, `{ean}` is substituted per row.
    pub search_url: String,
    /// Offer detail endpoint, `{id}` is substituted with the resolved product id.
    pub detail_url: String,
    pub accept: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,

    // Politeness delay between input rows, inclusive range in seconds
    pub throttle_min_secs: u64,
    pub throttle_max_secs: u64,

    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    /// Asked for on stdin when not configured.
    pub brand_name: Option<String>,

    pub color_policy: ColorPolicy,
    pub color_language: ColorLanguage,
    pub match_english_names: bool,

    pub notify: bool,
    pub publish: bool,
    pub git_remote: String,
    pub git_branch: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            detail_url: DEFAULT_DETAIL_URL.to_string(),
            accept: "application/json".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 30,
            throttle_min_secs: 1,
            throttle_max_secs: 6,
            input_path: PathBuf::from("PriceRunner - Input.csv"),
            output_dir: PathBuf::from("."),
            brand_name: None,
            color_policy: ColorPolicy::LabelFirst,
            color_language: ColorLanguage::Swedish,
            match_english_names: false,
            notify: true,
            publish: false,
            git_remote: "origin".to_string(),
            git_branch: "main".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Config::builder()
            // Defaults come from the Default impl so there is one source of truth
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name("config").required(false))
            // e.g. APP_SEARCH_URL, APP_THROTTLE_MAX_SECS
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1, a zero timeout fails every request");
        }
        if self.throttle_min_secs > self.throttle_max_secs {
            bail!(
                "throttle_min_secs ({}) is greater than throttle_max_secs ({})",
                self.throttle_min_secs,
                self.throttle_max_secs
            );
        }
        if !self.search_url.contains("{ean}") {
            bail!("search_url must contain an {{ean}} placeholder: {}", self.search_url);
        }
        if !self.detail_url.contains("{id}") {
            bail!("detail_url must contain an {{id}} placeholder: {}", self.detail_url);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
