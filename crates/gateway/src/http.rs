//! reqwest implementation of [`EntityGateway`].

use crate::{endpoints, EntityGateway, GatewayConfig, GatewayError, GatewayResult, TokenSupplier};
use async_trait::async_trait;
use careplan_wire::{
    parse_json, CarePlan, CarePlanPayload, Collection, Created, EntityId, EntityKind, Envelope,
    GoalPayload, Intervention, InterventionPayload, Review, ReviewPayload, StaffMember, WireError,
};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Upper bound on pages followed for one list call.
const MAX_PAGES: u32 = 1_000;

/// Gateway speaking JSON over HTTP with a bearer token on every call.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    tokens: Arc<dyn TokenSupplier>,
}

impl HttpGateway {
    /// Builds the HTTP client for `cfg`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the underlying client cannot be constructed.
    pub fn new(cfg: &GatewayConfig, tokens: Arc<dyn TokenSupplier>) -> GatewayResult<Self> {
        let client = Client::builder().timeout(cfg.timeout()).build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url().clone(),
            tokens,
        })
    }

    fn url(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidConfig("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.tokens.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn post<B>(&self, segments: &[&str], body: &B) -> GatewayResult<Created>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        tracing::debug!("POST {}", url.path());
        let response = self.request(Method::POST, url).json(body).send().await?;
        read_envelope(response).await
    }

    async fn get<T>(&self, segments: &[&str], page: Option<u32>) -> GatewayResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(segments)?;
        tracing::debug!("GET {} (page {:?})", url.path(), page);
        let mut request = self.request(Method::GET, url);
        if let Some(page) = page {
            request = request.query(&[("page", page)]);
        }
        let response = request.send().await?;
        read_envelope(response).await
    }

    /// Fetches every page of a collection, starting at page 1.
    async fn get_all<T>(&self, segments: &[&str]) -> GatewayResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let collection: Collection<T> = self.get(segments, Some(page)).await?;
            let last_page = collection.last_page().min(MAX_PAGES);
            items.extend(collection.into_items());
            if page >= last_page {
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

/// The parts of an envelope needed to decide success, whatever `data` holds.
#[derive(Deserialize)]
struct Outcome {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

async fn read_envelope<T>(response: Response) -> GatewayResult<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let path = response.url().path().to_string();
    let text = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<Outcome>(&text)
            .ok()
            .and_then(|o| o.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        tracing::warn!("{} returned {}: {}", path, status.as_u16(), message);
        return Err(GatewayError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let outcome: Outcome = parse_json(&text)?;
    if !outcome.success {
        let message = outcome
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "request was not successful".to_string());
        tracing::warn!("{} reported failure: {}", path, message);
        return Err(GatewayError::Rejected { message });
    }

    let envelope: Envelope<T> = parse_json(&text)?;
    envelope.into_data().ok_or_else(|| {
        GatewayError::Decode(WireError::Translation(
            "response envelope has no data".into(),
        ))
    })
}

#[async_trait]
impl EntityGateway for HttpGateway {
    async fn create_care_plan(&self, payload: &CarePlanPayload) -> GatewayResult<Created> {
        self.post(endpoints::create_path(EntityKind::CarePlan), payload).await
    }

    async fn create_goal(&self, payload: &GoalPayload) -> GatewayResult<Created> {
        self.post(endpoints::create_path(EntityKind::Goal), payload).await
    }

    async fn create_intervention(&self, payload: &InterventionPayload) -> GatewayResult<Created> {
        self.post(endpoints::create_path(EntityKind::Intervention), payload).await
    }

    async fn create_review(&self, payload: &ReviewPayload) -> GatewayResult<Created> {
        self.post(endpoints::create_path(EntityKind::Review), payload).await
    }

    async fn list_care_plans(&self) -> GatewayResult<Vec<CarePlan>> {
        self.get_all(endpoints::CARE_PLANS).await
    }

    async fn get_care_plan(&self, id: &EntityId) -> GatewayResult<CarePlan> {
        self.get(&endpoints::care_plan_path(id), None).await
    }

    async fn list_interventions(&self, goal_id: &EntityId) -> GatewayResult<Vec<Intervention>> {
        self.get_all(&endpoints::interventions_for_goal(goal_id))
            .await
    }

    async fn list_reviews(&self, goal_id: &EntityId) -> GatewayResult<Vec<Review>> {
        self.get_all(&endpoints::reviews_for_goal(goal_id)).await
    }

    async fn list_staff(&self) -> GatewayResult<Vec<StaffMember>> {
        self.get_all(endpoints::STAFF).await
    }
}
