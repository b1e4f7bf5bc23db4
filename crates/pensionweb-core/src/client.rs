//! Typed HTTP client for the pension backend
//!
//! One `Resource` per backend collection gives the shared CRUD verbs;
//! relationship-scoped queries live in inherent impls per entity.
//! Every call sends JSON, reuses session cookies, and validates what comes
//! back before handing it to the caller.

use std::fmt::Display;
use std::marker::PhantomData;
use std::time::Duration;

use pensionweb_config::BackendConfig;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Affilie, Allocataire, BankingInfo, CompanyGroup, DashboardStats, Demande, Group, Operation,
    OperationType, Pensioner,
};
use crate::session::UserRecord;
use crate::validate::Validate;

/// Client for the external REST backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    session_check_timeout: Duration,
}

impl BackendClient {
    /// Build a client from backend settings
    pub fn new(config: &BackendConfig) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if config.request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.request_timeout_ms));
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::from_transport(&config.base_url, e))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_check_timeout: Duration::from_millis(config.session_check_timeout_ms),
        })
    }

    /// Base URL every path is resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issue a request and return the raw body of a successful response
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        timeout: Option<Duration>,
    ) -> ApiResult<String> {
        let url = self.url(path);
        log::debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            let error = ApiError::from_transport(&url, e);
            log::warn!("{} {} failed: {}", method, url, error);
            error
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(&url, e))?;

        if !status.is_success() {
            if status.as_u16() == 401 || status.as_u16() == 403 {
                log::warn!("Backend refused {} {} with {}: session missing or expired", method, url, status);
            } else {
                log::warn!("{} {} returned {}", method, url, status);
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                url,
                body: text.chars().take(200).collect(),
            });
        }

        Ok(text)
    }

    /// Decode and validate a response body
    fn decode<T: DeserializeOwned + Validate>(&self, path: &str, text: &str) -> ApiResult<T> {
        let value: T = serde_json::from_str(text).map_err(|e| ApiError::Decode {
            url: self.url(path),
            message: e.to_string(),
        })?;
        value.validate().map_err(|message| ApiError::Validation {
            entity: T::entity().to_string(),
            message,
        })?;
        Ok(value)
    }

    fn encode_body<B: Serialize>(body: &B) -> ApiResult<serde_json::Value> {
        serde_json::to_value(body).map_err(|e| ApiError::Validation {
            entity: "request body".to_string(),
            message: e.to_string(),
        })
    }

    async fn fetch<T: DeserializeOwned + Validate>(&self, path: &str) -> ApiResult<T> {
        let text = self.send(Method::GET, path, None, None).await?;
        self.decode(path, &text)
    }

    async fn submit<B: Serialize, T: DeserializeOwned + Validate>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let body = Self::encode_body(body)?;
        let text = self.send(method, path, Some(body), None).await?;
        self.decode(path, &text)
    }

    /// Issue a request whose response body is irrelevant (DELETE, link/unlink)
    async fn execute(&self, method: Method, path: &str) -> ApiResult<()> {
        self.send(method, path, None, None).await.map(|_| ())
    }

    fn resource<T>(&self, path: &'static str) -> Resource<'_, T> {
        Resource {
            client: self,
            path,
            _entity: PhantomData,
        }
    }

    pub fn pensioners(&self) -> Resource<'_, Pensioner> {
        self.resource("pensioners")
    }

    pub fn operations(&self) -> Resource<'_, Operation> {
        self.resource("operations")
    }

    pub fn groups(&self) -> Resource<'_, Group> {
        self.resource("groups")
    }

    pub fn demandes(&self) -> Resource<'_, Demande> {
        self.resource("demandes")
    }

    pub fn banking(&self) -> Resource<'_, BankingInfo> {
        self.resource("banking")
    }

    pub fn company_groups(&self) -> Resource<'_, CompanyGroup> {
        self.resource("company-groups")
    }

    pub fn affilies(&self) -> Resource<'_, Affilie> {
        self.resource("affilies")
    }

    pub fn allocataires(&self) -> Resource<'_, Allocataire> {
        self.resource("allocataires")
    }

    /// Aggregates for the dashboard
    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        self.fetch("dashboard/stats").await
    }

    /// Ask the backend who the current session belongs to
    ///
    /// This is the only call with its own short timeout.
    pub async fn check_session(&self) -> ApiResult<UserRecord> {
        let path = "auth/me";
        let text = self
            .send(Method::GET, path, None, Some(self.session_check_timeout))
            .await?;
        self.decode(path, &text)
    }
}

/// CRUD access to one backend collection
pub struct Resource<'a, T> {
    client: &'a BackendClient,
    path: &'static str,
    _entity: PhantomData<T>,
}

impl<'a, T> Resource<'a, T>
where
    T: Serialize + DeserializeOwned + Validate,
{
    fn item_path(&self, id: impl Display) -> String {
        format!("{}/{}", self.path, urlencoding::encode(&id.to_string()))
    }

    fn scoped_path(&self, scope: &str, key: impl Display) -> String {
        format!(
            "{}/{}/{}",
            self.path,
            scope,
            urlencoding::encode(&key.to_string())
        )
    }

    pub async fn list(&self) -> ApiResult<Vec<T>> {
        self.client.fetch(self.path).await
    }

    pub async fn get(&self, id: impl Display) -> ApiResult<T> {
        self.client.fetch(&self.item_path(id)).await
    }

    pub async fn create(&self, item: &T) -> ApiResult<T> {
        self.client.submit(Method::POST, self.path, item).await
    }

    pub async fn update(&self, id: impl Display, item: &T) -> ApiResult<T> {
        self.client
            .submit(Method::PUT, &self.item_path(id), item)
            .await
    }

    pub async fn delete(&self, id: impl Display) -> ApiResult<()> {
        self.client
            .execute(Method::DELETE, &self.item_path(id))
            .await
    }
}

impl Resource<'_, Pensioner> {
    pub async fn by_city(&self, city: &str) -> ApiResult<Vec<Pensioner>> {
        self.client.fetch(&self.scoped_path("city", city)).await
    }
}

impl Resource<'_, Operation> {
    pub async fn by_pensioner(&self, pensioner_id: i64) -> ApiResult<Vec<Operation>> {
        self.client
            .fetch(&self.scoped_path("pensioner", pensioner_id))
            .await
    }

    pub async fn by_type(&self, operation_type: OperationType) -> ApiResult<Vec<Operation>> {
        self.client
            .fetch(&self.scoped_path("type", operation_type))
            .await
    }

    pub async fn recent(&self, limit: usize) -> ApiResult<Vec<Operation>> {
        self.client
            .fetch(&format!("{}/recent?limit={}", self.path, limit))
            .await
    }
}

impl Resource<'_, Group> {
    fn membership_path(&self, group_id: i64, pensioner_id: i64) -> String {
        format!("{}/{}/pensioners/{}", self.path, group_id, pensioner_id)
    }

    pub async fn add_pensioner(&self, group_id: i64, pensioner_id: i64) -> ApiResult<()> {
        self.client
            .execute(Method::POST, &self.membership_path(group_id, pensioner_id))
            .await
    }

    pub async fn remove_pensioner(&self, group_id: i64, pensioner_id: i64) -> ApiResult<()> {
        self.client
            .execute(Method::DELETE, &self.membership_path(group_id, pensioner_id))
            .await
    }
}

impl Resource<'_, Demande> {
    pub async fn by_pensioner(&self, pensioner_id: i64) -> ApiResult<Vec<Demande>> {
        self.client
            .fetch(&self.scoped_path("pensioner", pensioner_id))
            .await
    }
}

impl Resource<'_, BankingInfo> {
    pub async fn by_pensioner(&self, pensioner_id: i64) -> ApiResult<BankingInfo> {
        self.client
            .fetch(&self.scoped_path("pensioner", pensioner_id))
            .await
    }
}

impl Resource<'_, CompanyGroup> {
    pub async fn by_city(&self, city: &str) -> ApiResult<Vec<CompanyGroup>> {
        self.client.fetch(&self.scoped_path("city", city)).await
    }

    pub async fn by_sector(&self, sector: &str) -> ApiResult<Vec<CompanyGroup>> {
        self.client.fetch(&self.scoped_path("sector", sector)).await
    }
}

impl Resource<'_, Allocataire> {
    pub async fn by_affilie(&self, affilie_id: i64) -> ApiResult<Vec<Allocataire>> {
        self.client
            .fetch(&self.scoped_path("affilie", affilie_id))
            .await
    }
}

// ==================== Tests ====================
