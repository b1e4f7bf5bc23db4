//! Data access for pages
//!
//! Features:
//! - Fallback-capable widgets (dashboard stats, recent activity, monthly
//!   payments, pensioner by id) routed through `FallbackPolicy`
//! - Pensioner detail fan-out: pensioner, operations, demandes and banking
//!   fetched concurrently
//!
//! List pages talk to `client()` directly and render failures as errors.

use std::sync::Arc;

use pensionweb_config::SourceMode;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::client::BackendClient;
use crate::error::{ApiError, ApiResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::mock::FallbackDataset;
use crate::models::{BankingInfo, DashboardStats, Demande, MonthlyPayment, Operation, Pensioner, PensionerRecord};
use crate::source::{DataSource, FallbackPolicy, Sourced};
use crate::stats;

/// Everything shown on a pensioner's detail page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionerDetail {
    pub pensioner: Pensioner,
    pub operations: Vec<Operation>,
    pub demandes: Vec<Demande>,
    pub banking: Option<BankingInfo>,
    pub net_total: Decimal,
}

impl PensionerDetail {
    fn new(
        pensioner: Pensioner,
        operations: Vec<Operation>,
        demandes: Vec<Demande>,
        banking: Option<BankingInfo>,
    ) -> Self {
        let net_total = stats::net_total(&operations);
        Self {
            pensioner,
            operations,
            demandes,
            banking,
            net_total,
        }
    }

    /// The record fed to the summary flow
    pub fn record(&self) -> PensionerRecord {
        PensionerRecord {
            pensioner: self.pensioner.clone(),
            operations: self.operations.clone(),
            banking: self.banking.clone(),
        }
    }
}

/// Backend client, fallback policy and fallback dataset together
#[derive(Debug, Clone)]
pub struct PortalData {
    client: BackendClient,
    policy: FallbackPolicy,
    dataset: Arc<FallbackDataset>,
}

impl PortalData {
    pub fn new(client: BackendClient, policy: FallbackPolicy) -> Self {
        Self::with_dataset(client, policy, FallbackDataset::new())
    }

    pub fn with_dataset(client: BackendClient, policy: FallbackPolicy, dataset: FallbackDataset) -> Self {
        Self {
            client,
            policy,
            dataset: Arc::new(dataset),
        }
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    pub fn dataset(&self) -> &FallbackDataset {
        &self.dataset
    }

    /// Run a live call under the policy; `fallback` answers when the policy or the failure says so
    async fn guarded<T, F>(
        &self,
        what: &str,
        live: F,
        fallback: impl FnOnce(&FallbackDataset) -> Option<T>,
    ) -> ApiResult<Sourced<T>>
    where
        F: std::future::Future<Output = ApiResult<T>>,
    {
        if self.policy.select() == DataSource::Fallback {
            log::debug!("Serving {} from fallback data", what);
            return fallback(&self.dataset)
                .map(Sourced::fallback)
                .ok_or_else(|| self.not_found(what));
        }

        let result = live.await;
        self.policy.record(&result);
        match result {
            Ok(data) => Ok(Sourced::live(data)),
            Err(error) if self.policy.mode() == SourceMode::Auto && error.is_unavailable() => {
                match fallback(&self.dataset) {
                    Some(data) => {
                        DefaultErrorLogger.log_warning(
                            &format!("Backend unavailable, showing demonstration data: {}", error),
                            &ErrorContext::new(what),
                        );
                        Ok(Sourced::fallback(data))
                    }
                    None => Err(error),
                }
            }
            Err(error) => Err(error),
        }
    }

    fn not_found(&self, what: &str) -> ApiError {
        ApiError::Status {
            status: 404,
            url: format!("{}/{}", self.client.base_url(), what),
            body: String::new(),
        }
    }

    pub async fn dashboard_stats(&self) -> ApiResult<Sourced<DashboardStats>> {
        self.guarded(
            "dashboard/stats",
            self.client.dashboard_stats(),
            |dataset| Some(dataset.stats().clone()),
        )
        .await
    }

    pub async fn recent_operations(&self, limit: usize) -> ApiResult<Sourced<Vec<Operation>>> {
        self.guarded(
            "operations/recent",
            self.client.operations().recent(limit),
            |dataset| Some(dataset.recent_operations(limit)),
        )
        .await
    }

    /// Monthly totals; the backend has no endpoint for them
    pub fn monthly_payments(&self) -> Sourced<Vec<MonthlyPayment>> {
        Sourced::fallback(self.dataset.monthly_payments().to_vec())
    }

    pub async fn pensioner(&self, id: i64) -> ApiResult<Sourced<Pensioner>> {
        self.guarded(
            &format!("pensioners/{}", id),
            self.client.pensioners().get(id),
            |dataset| dataset.pensioner(id).cloned(),
        )
        .await
    }

    /// Fetch the detail view of one pensioner
    ///
    /// Pensioner or operations failure fails the view; demandes degrade to
    /// empty and banking to none.
    pub async fn pensioner_detail(&self, id: i64) -> ApiResult<Sourced<PensionerDetail>> {
        if self.policy.select() == DataSource::Fallback {
            return self.fallback_detail(id);
        }

        let pensioners = self.client.pensioners();
        let operations = self.client.operations();
        let demandes = self.client.demandes();
        let banking = self.client.banking();

        let (pensioner, operations, demandes, banking) = tokio::join!(
            pensioners.get(id),
            operations.by_pensioner(id),
            demandes.by_pensioner(id),
            banking.by_pensioner(id),
        );
        let unavailable = [pensioner.as_ref().err(), operations.as_ref().err()]
            .into_iter()
            .flatten()
            .any(ApiError::is_unavailable);
        if unavailable {
            self.policy.record_failure();
        } else {
            self.policy.record_success();
        }

        let pensioner = match pensioner {
            Ok(pensioner) => pensioner,
            Err(error) if self.policy.mode() == SourceMode::Auto && error.is_unavailable() => {
                log::warn!("Backend unavailable for pensioner {}, trying demonstration data", id);
                return self.fallback_detail(id).map_err(|_| error);
            }
            Err(error) => return Err(error),
        };
        let operations = operations?;
        let demandes = demandes.unwrap_or_else(|e| {
            log::warn!("Demandes for pensioner {} unavailable: {}", id, e);
            Vec::new()
        });
        let banking = banking
            .map_err(|e| log::debug!("No banking info for pensioner {}: {}", id, e))
            .ok();

        Ok(Sourced::live(PensionerDetail::new(pensioner, operations, demandes, banking)))
    }

    fn fallback_detail(&self, id: i64) -> ApiResult<Sourced<PensionerDetail>> {
        let pensioner = self
            .dataset
            .pensioner(id)
            .cloned()
            .ok_or_else(|| self.not_found(&format!("pensioners/{}", id)))?;
        let operations = self.dataset.operations_for(id);
        Ok(Sourced::fallback(PensionerDetail::new(pensioner, operations, Vec::new(), None)))
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorKind;
    use crate::source::CircuitState;
    use crate::models::PaymentMethod;
    use crate::testing::{client_for, spawn_backend, unreachable_client};
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use pensionweb_config::FallbackConfig;
    use serde_json::{json, Value};

    fn pensioner_json(id: i64) -> Value {
        json!({
            "id": id, "name": "Salma Idrissi", "city": "Agadir",
            "monthlyPayment": 2500, "paymentMethod": "CASH"
        })
    }

    fn detail_stub() -> Router {
        Router::new()
            .route(
                "/api/pensioners/:id",
                get(|Path(id): Path<i64>| async move {
                    if id == 404 {
                        Err(StatusCode::NOT_FOUND)
                    } else {
                        Ok(Json(pensioner_json(id)))
                    }
                }),
            )
            .route(
                "/api/operations/pensioner/:id",
                get(|Path(id): Path<i64>| async move {
                    if id == 13 {
                        return Err(StatusCode::INTERNAL_SERVER_ERROR);
                    }
                    Ok(Json(json!([
                        { "id": 1, "pensionerId": id, "amount": 2500, "type": "PAYMENT", "timestamp": "2024-01-31T09:00:00" },
                        { "id": 2, "pensionerId": id, "amount": 100, "type": "DEDUCTION", "timestamp": "2024-02-01T09:00:00" }
                    ])))
                }),
            )
            .route(
                "/api/demandes/pensioner/:id",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .route(
                "/api/banking/pensioner/:id",
                get(|| async { StatusCode::NOT_FOUND }),
            )
    }

    #[tokio::test]
    async fn test_pinned_fallback_serves_pensioner_1001() {
        let portal = PortalData::new(unreachable_client().await, FallbackPolicy::pinned(SourceMode::Fallback));
        let ahmed = portal.pensioner(1001).await.unwrap();
        assert!(ahmed.is_fallback());
        assert_eq!(ahmed.data.name, "Ahmed Benali");
        assert_eq!(ahmed.data.city, "Casablanca");
        assert_eq!(ahmed.data.payment_method, PaymentMethod::BankTransfer);
        assert_eq!(ahmed.data.monthly_payment, Decimal::from(3500));

        let missing = portal.pensioner(77).await.unwrap_err();
        assert_eq!(missing.kind(), ApiErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_unreachable_backend_falls_back_for_stats() {
        let portal = PortalData::new(unreachable_client().await, FallbackPolicy::new(&FallbackConfig::default()));
        let stats = portal.dashboard_stats().await.unwrap();
        assert!(stats.is_fallback());
        assert_eq!(stats.data.total_pensioners, 1247);
        let sum: u64 = stats.data.pensioners_by_city.iter().map(|(_, n)| n).sum();
        assert_eq!(sum, 1247);

        let recent = portal.recent_operations(5).await.unwrap();
        assert!(recent.is_fallback());
        assert_eq!(recent.data.len(), 5);
    }

    #[tokio::test]
    async fn test_pinned_live_surfaces_errors() {
        let portal = PortalData::new(unreachable_client().await, FallbackPolicy::pinned(SourceMode::Live));
        let err = portal.dashboard_stats().await.unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Network);
    }

    #[tokio::test]
    async fn test_monthly_payments_are_demonstration_data() {
        let portal = PortalData::new(unreachable_client().await, FallbackPolicy::pinned(SourceMode::Live));
        let months = portal.monthly_payments();
        assert!(months.is_fallback());
        assert_eq!(months.data.len(), 12);
    }

    #[tokio::test]
    async fn test_detail_tolerates_optional_failures() {
        let client = client_for(&spawn_backend(detail_stub()).await);
        let portal = PortalData::new(client, FallbackPolicy::pinned(SourceMode::Live));
        let detail = portal.pensioner_detail(21).await.unwrap();
        assert_eq!(detail.source, DataSource::Live);
        assert_eq!(detail.data.pensioner.name, "Salma Idrissi");
        assert_eq!(detail.data.operations.len(), 2);
        assert!(detail.data.demandes.is_empty());
        assert!(detail.data.banking.is_none());
        assert_eq!(detail.data.net_total, Decimal::from(2400));

        let record = detail.data.record();
        assert_eq!(record.operations.len(), 2);
    }

    #[tokio::test]
    async fn test_detail_fails_on_core_failures() {
        let client = client_for(&spawn_backend(detail_stub()).await);
        let portal = PortalData::new(client, FallbackPolicy::pinned(SourceMode::Live));

        let missing = portal.pensioner_detail(404).await.unwrap_err();
        assert_eq!(missing.kind(), ApiErrorKind::NotFound);

        let broken = portal.pensioner_detail(13).await.unwrap_err();
        assert_eq!(broken.kind(), ApiErrorKind::Server);
    }

    #[tokio::test]
    async fn test_detail_operations_outage_counts_as_failure() {
        let client = client_for(&spawn_backend(detail_stub()).await);
        let config = FallbackConfig {
            mode: SourceMode::Auto,
            failure_threshold: 2,
            cooldown_secs: 30,
        };
        let portal = PortalData::new(client, FallbackPolicy::new(&config));

        portal.policy().record_failure();
        assert!(portal.pensioner_detail(13).await.is_err());
        assert_eq!(portal.policy().state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_cancelled_half_open_attempt_does_not_pin_fallback() {
        let slow = Router::new().route(
            "/api/dashboard/stats",
            get(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        );
        let client = client_for(&spawn_backend(slow).await);
        let config = FallbackConfig {
            mode: SourceMode::Auto,
            failure_threshold: 1,
            cooldown_secs: 0,
        };
        let portal = PortalData::new(client, FallbackPolicy::new(&config));
        portal.policy().record_failure();
        assert_eq!(portal.policy().state(), CircuitState::Open);

        let dropped = tokio::time::timeout(std::time::Duration::from_millis(100), portal.dashboard_stats()).await;
        assert!(dropped.is_err());
        assert_eq!(portal.policy().state(), CircuitState::HalfOpen);

        assert_eq!(portal.policy().select(), DataSource::Live);
    }

    #[tokio::test]
    async fn test_detail_falls_back_when_backend_down() {
        let portal = PortalData::new(unreachable_client().await, FallbackPolicy::new(&FallbackConfig::default()));
        let detail = portal.pensioner_detail(1003).await.unwrap();
        assert!(detail.is_fallback());
        assert_eq!(detail.data.operations.len(), 1);
        assert_eq!(detail.data.net_total, Decimal::from(500));

        let err = portal.pensioner_detail(9).await.unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Network);
    }
}
