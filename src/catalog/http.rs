//! HTTP-backed catalog gateway, grounded on `Provider::call_chat_completion`:
//! a `reqwest::Client` built once, a bearer token pulled from the
//! environment via `dotenv`, and the same success/error response split.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dotenv::dotenv;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::catalog::CatalogGateway;
use crate::error::EngineError;
use crate::model::{CatalogEntry, EntryForm, Source};

const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    foods: Vec<FdcFood>,
}

#[derive(Debug, Deserialize)]
struct FdcFood {
    #[serde(rename = "fdcId")]
    fdc_id: u64,
    description: String,
    #[serde(rename = "dataType")]
    data_type: String,
    #[serde(rename = "foodNutrients", default)]
    food_nutrients: Vec<FdcNutrient>,
    #[serde(rename = "ingredients", default)]
    ingredients: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FdcNutrient {
    #[serde(rename = "nutrientName")]
    nutrient_name: String,
    value: f64,
}

fn extract(nutrients: &[FdcNutrient], name: &str) -> Option<f64> {
    nutrients
        .iter()
        .find(|n| n.nutrient_name.eq_ignore_ascii_case(name))
        .map(|n| n.value)
}

fn source_for(data_type: &str) -> Source {
    match data_type {
        "Foundation" => Source::Foundation,
        "SR Legacy" => Source::SrLegacy,
        _ => Source::Branded,
    }
}

fn form_for(description: &str) -> EntryForm {
    let lower = description.to_lowercase();
    if lower.contains(", raw") || lower.ends_with("raw") {
        EntryForm::Raw
    } else if let Some(idx) = lower.find("cooked") {
        EntryForm::Cooked(lower[idx..].to_string())
    } else {
        EntryForm::Raw
    }
}

fn to_entry(food: FdcFood) -> CatalogEntry {
    let ingredients = food
        .ingredients
        .map(|s| s.split(',').map(|p| p.trim().to_lowercase()).collect())
        .unwrap_or_default();
    CatalogEntry {
        fdc_id: food.fdc_id,
        source: source_for(&food.data_type),
        form: form_for(&food.description),
        kcal_100g: extract(&food.food_nutrients, "Energy").unwrap_or(0.0),
        protein_100g: extract(&food.food_nutrients, "Protein"),
        carbs_100g: extract(&food.food_nutrients, "Carbohydrate, by difference"),
        fat_100g: extract(&food.food_nutrients, "Total lipid (fat)"),
        sodium_mg_100g: extract(&food.food_nutrients, "Sodium, Na"),
        sugar_g_100g: extract(&food.food_nutrients, "Sugars, total including NLEA"),
        name: food.description,
        ingredients,
    }
}

/// Talks to the real FDC REST API. One client, reused across calls, parked
/// behind an `RwLock` so `reconnect` can rebuild it in place.
pub struct HttpCatalogGateway {
    client: RwLock<Client>,
    base_url: String,
    api_key_env_var: String,
    connected: AtomicBool,
}

impl HttpCatalogGateway {
    pub fn new(api_key_env_var: &str) -> Self {
        dotenv().ok();
        HttpCatalogGateway {
            client: RwLock::new(Client::new()),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env_var: api_key_env_var.to_string(),
            connected: AtomicBool::new(true),
        }
    }

    pub fn with_base_url(api_key_env_var: &str, base_url: impl Into<String>) -> Self {
        let mut gateway = Self::new(api_key_env_var);
        gateway.base_url = base_url.into();
        gateway
    }

    fn api_key(&self) -> Result<String, EngineError> {
        dotenv().ok();
        std::env::var(&self.api_key_env_var)
            .map_err(|_| EngineError::CatalogUnavailable(format!("missing env var {}", self.api_key_env_var)))
    }
}

#[async_trait]
impl CatalogGateway for HttpCatalogGateway {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogEntry>, EngineError> {
        let api_key = self.api_key()?;
        let url = format!("{}/foods/search", self.base_url);
        let response = self
            .client
            .read()
            .await
            .get(&url)
            .query(&[
                ("api_key", api_key.as_str()),
                ("query", query),
                ("pageSize", &limit.to_string()),
            ])
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| EngineError::CatalogUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            self.connected.store(false, Ordering::SeqCst);
            return Err(EngineError::CatalogUnavailable(format!(
                "catalog search returned {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| EngineError::CatalogUnavailable(e.to_string()))?;
        Ok(parsed.foods.into_iter().map(to_entry).collect())
    }

    async fn fetch_by_id(&self, fdc_id: u64) -> Result<Option<CatalogEntry>, EngineError> {
        let api_key = self.api_key()?;
        let url = format!("{}/food/{}", self.base_url, fdc_id);
        let response = self
            .client
            .read()
            .await
            .get(&url)
            .query(&[("api_key", api_key.as_str())])
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| EngineError::CatalogUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            self.connected.store(false, Ordering::SeqCst);
            return Err(EngineError::CatalogUnavailable(format!(
                "catalog fetch returned {}",
                response.status()
            )));
        }

        let food: FdcFood = response
            .json()
            .await
            .map_err(|e| EngineError::CatalogUnavailable(e.to_string()))?;
        Ok(Some(to_entry(food)))
    }

    async fn reconnect(&self) -> Result<(), EngineError> {
        *self.client.write().await = Client::new();
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
