use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use crate::api::traits::ListingSource;
use crate::api::types::{PageRequest, PageResult};
use crate::form::ListingDraft;
use crate::models::Listing;

const DEFAULT_BASE_URL: &str = "http://localhost:3004/api/V1";

/// REST client for the property backend
pub struct PropertyApi {
    client: Client,
    base_url: String,
}

impl PropertyApi {
    /// Create a client against the given API base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Create a client from `LISTING_API_URL`, falling back to localhost
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("LISTING_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        info!("Using API base URL: {}", base_url);
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch a single listing by id
    pub async fn get_listing(&self, id: &str) -> Result<Listing> {
        let url = self.url(&format!("/properties/{id}"));
        debug!("Fetching listing: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch listing")?;
        let response = check(response, "get listing").await?;

        response
            .json::<Listing>()
            .await
            .context("Failed to parse listing response")
    }

    /// Submit a new listing as a multipart form with attached images
    ///
    /// The draft is validated client-side first; an invalid draft never
    /// reaches the network.
    pub async fn create_listing(&self, draft: &ListingDraft) -> Result<Listing> {
        draft.validate()?;
        let (price_ars, price_usd, monthly_fee) = draft.resolved_prices()?;

        let mut form = Form::new()
            .text("titulo", draft.title.clone())
            .text("descripcion", draft.description.clone())
            .text("direccion", draft.address.clone())
            .text("ubicacion", draft.location.clone())
            .text("tipoOperacion", draft.operation.as_param())
            .text("aceptaMascotas", draft.accepts_pets.to_string())
            .text("precioARS", price_ars.to_string())
            .text("precioUSD", price_usd.to_string())
            .text("expensas", monthly_fee.to_string())
            .text("habitaciones", draft.bedrooms.to_string())
            .text("banos", draft.bathrooms.to_string())
            .text("ambientes", draft.rooms.to_string());
        if let Some(requirements) = &draft.requirements {
            form = form.text("requisitos", requirements.clone());
        }

        for image in &draft.images {
            let bytes = tokio::fs::read(&image.path)
                .await
                .with_context(|| format!("Failed to read image {}", image.path.display()))?;
            let part = Part::bytes(bytes)
                .file_name(image.file_name())
                .mime_str(mime_for(&image.path))
                .context("Failed to build image part")?;
            form = form.part("images", part);
        }

        let url = self.url("/properties");
        info!("Submitting new listing: {}", draft.title);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Failed to submit listing")?;
        let response = check(response, "create listing").await?;

        response
            .json::<Listing>()
            .await
            .context("Failed to parse created listing")
    }

    /// Fetch the set of listing ids the user has marked as favorites
    pub async fn favorites(&self, user_id: &str) -> Result<Vec<String>> {
        let url = self.url(&format!("/users/{user_id}/favorites"));
        debug!("Fetching favorites: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch favorites")?;
        let response = check(response, "get favorites").await?;

        response
            .json::<Vec<String>>()
            .await
            .context("Failed to parse favorites response")
    }

    /// Add a listing to the user's favorites
    pub async fn add_favorite(&self, user_id: &str, property_id: &str) -> Result<()> {
        let url = self.url(&format!("/users/{user_id}/favorites/{property_id}"));
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .context("Failed to add favorite")?;
        check(response, "add favorite").await?;
        Ok(())
    }

    /// Remove a listing from the user's favorites
    pub async fn remove_favorite(&self, user_id: &str, property_id: &str) -> Result<()> {
        let url = self.url(&format!("/users/{user_id}/favorites/{property_id}"));
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .context("Failed to remove favorite")?;
        check(response, "remove favorite").await?;
        Ok(())
    }
}

#[async_trait]
impl ListingSource for PropertyApi {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult> {
        let url = self.url("/properties");
        let pairs = request.query_pairs();
        debug!("Fetching page {} from {} ({:?})", request.page, url, pairs);

        let response = self
            .client
            .get(&url)
            .query(&pairs)
            .send()
            .await
            .context("Failed to fetch listings page")?;
        let response = check(response, "fetch page").await?;

        let result = response
            .json::<PageResult>()
            .await
            .context("Failed to parse listings page")?;
        debug!(
            "Received {} of {} listings (page {})",
            result.items.len(),
            result.total,
            result.page
        );
        Ok(result)
    }

    async fn locations(&self) -> Result<Vec<String>> {
        let url = self.url("/properties/ubicaciones/list");
        debug!("Fetching location vocabulary: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch locations")?;
        let response = check(response, "get locations").await?;

        response
            .json::<Vec<String>>()
            .await
            .context("Failed to parse locations response")
    }

    fn source_name(&self) -> &'static str {
        "property-api"
    }
}

/// All backend errors are treated uniformly; status and body are only
/// captured for diagnostics
async fn check(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("{} returned status {}: {}", what, status, body);
        anyhow::bail!("Request failed ({what}): {status}");
    }
    Ok(response)
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}
