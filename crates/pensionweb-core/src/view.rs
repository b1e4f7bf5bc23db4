//! View state and list filtering shared by every data page
//!
//! Features:
//! - `ViewState`: loading, then exactly one of data or error
//! - `ListFilter`: free-text search AND-ed with categorical filters
//! - `Searchable`: what each entity exposes to the filter
//!
//! An empty or `all` filter value never excludes anything.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{ApiError, ApiErrorKind};
use crate::models::{Affilie, Allocataire, CompanyGroup, Demande, Operation, Pensioner};

/// Message telling the operator where the backend is expected
pub fn backend_hint(base_url: &str) -> String {
    format!(
        "Assurez-vous que le backend Spring Boot fonctionne sur {}",
        base_url
    )
}

// ==================== View state ====================

/// A failed fetch as shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct ViewError {
    pub kind: ApiErrorKind,
    pub message: String,
    /// Static remediation text pointing at the backend
    pub remediation: String,
}

impl ViewError {
    pub fn from_api(error: &ApiError, base_url: &str) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            remediation: backend_hint(base_url),
        }
    }

    /// Short title for the error panel
    pub fn title(&self) -> &'static str {
        match self.kind {
            ApiErrorKind::Network | ApiErrorKind::Timeout => "Backend injoignable",
            ApiErrorKind::Server => "Erreur du serveur",
            ApiErrorKind::NotFound => "Ressource introuvable",
            ApiErrorKind::Unauthorized => "Accès refusé",
            ApiErrorKind::Validation | ApiErrorKind::Decode => "Données invalides",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }
}

/// Tri-state of a page's data
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    Failed(ViewError),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Loading
    }
}

impl<T> ViewState<T> {
    pub fn new() -> Self {
        ViewState::Loading
    }

    /// Build the settled state for a finished fetch
    pub fn settled(result: Result<T, ApiError>, base_url: &str) -> Self {
        let mut state = ViewState::Loading;
        state.resolve(result, base_url);
        state
    }

    /// Settle a loading state; returns false (and changes nothing) if already settled
    pub fn resolve(&mut self, result: Result<T, ApiError>, base_url: &str) -> bool {
        if !self.is_loading() {
            return false;
        }
        *self = match result {
            Ok(data) => ViewState::Ready(data),
            Err(error) => ViewState::Failed(ViewError::from_api(&error, base_url)),
        };
        true
    }

    /// Explicit refetch: the only way back to loading
    pub fn refetch(&mut self) {
        *self = ViewState::Loading;
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ViewError> {
        match self {
            ViewState::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ViewState<U> {
        match self {
            ViewState::Loading => ViewState::Loading,
            ViewState::Ready(data) => ViewState::Ready(f(data)),
            ViewState::Failed(error) => ViewState::Failed(error),
        }
    }
}

// ==================== Filtering ====================

/// Categorical filter dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKey {
    City,
    PaymentMethod,
    Status,
    Sector,
    OperationType,
}

impl FilterKey {
    pub const ALL: [FilterKey; 5] = [
        FilterKey::City,
        FilterKey::PaymentMethod,
        FilterKey::Status,
        FilterKey::Sector,
        FilterKey::OperationType,
    ];

    /// Query parameter name
    pub fn param(&self) -> &'static str {
        match self {
            FilterKey::City => "city",
            FilterKey::PaymentMethod => "method",
            FilterKey::Status => "status",
            FilterKey::Sector => "sector",
            FilterKey::OperationType => "type",
        }
    }
}

impl std::str::FromStr for FilterKey {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "city" => Ok(FilterKey::City),
            "method" | "paymentmethod" | "payment_method" => Ok(FilterKey::PaymentMethod),
            "status" => Ok(FilterKey::Status),
            "sector" => Ok(FilterKey::Sector),
            "type" | "operation_type" => Ok(FilterKey::OperationType),
            _ => Err(format!("Invalid filter key: {}", s)),
        }
    }
}

impl std::fmt::Display for FilterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.param())
    }
}

/// What an entity exposes to list filtering
pub trait Searchable {
    /// Text fields matched by the free-text search
    fn search_fields(&self) -> Vec<String>;
    /// Value of a categorical dimension, if the entity has it
    fn category(&self, key: FilterKey) -> Option<String>;
}

/// Search term plus categorical filters, all AND-ed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub search: String,
    pub categories: BTreeMap<FilterKey, String>,
}

fn is_identity(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("all")
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: &str) -> Self {
        self.search = term.to_string();
        self
    }

    pub fn with_category(mut self, key: FilterKey, value: &str) -> Self {
        self.categories.insert(key, value.to_string());
        self
    }

    /// Read `q` and the category parameters from a query string map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let mut filter = Self::new();
        if let Some(q) = params.get("q") {
            filter.search = q.clone();
        }
        for key in FilterKey::ALL {
            if let Some(value) = params.get(key.param()) {
                filter.categories.insert(key, value.clone());
            }
        }
        filter
    }

    /// Value of a category, or "all" when unset
    pub fn category_value(&self, key: FilterKey) -> &str {
        self.categories
            .get(&key)
            .map(String::as_str)
            .filter(|v| !is_identity(v))
            .unwrap_or("all")
    }

    /// Whether any predicate is active
    pub fn is_active(&self) -> bool {
        !is_identity(&self.search) || self.categories.values().any(|v| !is_identity(v))
    }

    pub fn matches<T: Searchable>(&self, item: &T) -> bool {
        let term = self.search.trim().to_lowercase();
        if !term.is_empty()
            && !item
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
        {
            return false;
        }

        self.categories
            .iter()
            .filter(|(_, wanted)| !is_identity(wanted))
            .all(|(key, wanted)| item.category(*key).as_deref() == Some(wanted.as_str()))
    }

    /// The visible subset, in original order
    pub fn apply<'a, T: Searchable>(&self, items: &'a [T]) -> Vec<&'a T> {
        items.iter().filter(|item| self.matches(*item)).collect()
    }
}

/// Sorted distinct values of a category, for filter dropdowns
pub fn distinct_values<T: Searchable>(items: &[T], key: FilterKey) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.category(key))
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ==================== Searchable entities ====================

impl Searchable for Pensioner {
    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![self.name.clone(), self.id_text()];
        if let Some(phone) = &self.phone_number {
            fields.push(phone.clone());
        }
        fields
    }

    fn category(&self, key: FilterKey) -> Option<String> {
        match key {
            FilterKey::City => Some(self.city.clone()),
            FilterKey::PaymentMethod => Some(self.payment_method.to_string()),
            _ => None,
        }
    }
}

impl Searchable for Operation {
    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![self.id.map(|id| id.to_string()).unwrap_or_default()];
        if let Some(description) = &self.description {
            fields.push(description.clone());
        }
        if let Some(pensioner) = &self.pensioner {
            fields.push(pensioner.name.clone());
        }
        fields
    }

    fn category(&self, key: FilterKey) -> Option<String> {
        match key {
            FilterKey::OperationType => Some(self.operation_type.to_string()),
            FilterKey::City => self.pensioner.as_ref().map(|p| p.city.clone()),
            FilterKey::PaymentMethod => self
                .pensioner
                .as_ref()
                .map(|p| p.payment_method.to_string()),
            _ => None,
        }
    }
}

impl Searchable for Demande {
    fn search_fields(&self) -> Vec<String> {
        vec![self.id.clone(), self.demande_type.clone()]
    }

    fn category(&self, key: FilterKey) -> Option<String> {
        match key {
            FilterKey::Status => Some(self.status.to_string()),
            _ => None,
        }
    }
}

impl Searchable for CompanyGroup {
    fn search_fields(&self) -> Vec<String> {
        vec![self.company_name.clone()]
    }

    fn category(&self, key: FilterKey) -> Option<String> {
        match key {
            FilterKey::Sector => Some(self.sector.clone()),
            FilterKey::City => Some(self.city.clone()),
            _ => None,
        }
    }
}

impl Searchable for Affilie {
    fn search_fields(&self) -> Vec<String> {
        vec![
            self.matricule.clone(),
            self.full_name(),
            self.id_affilie.map(|id| id.to_string()).unwrap_or_default(),
        ]
    }

    fn category(&self, key: FilterKey) -> Option<String> {
        match key {
            FilterKey::Status => Some(if self.actif { "actif" } else { "inactif" }.to_string()),
            _ => None,
        }
    }
}

impl Searchable for Allocataire {
    fn search_fields(&self) -> Vec<String> {
        vec![self.numero_dossier.clone(), self.full_name()]
    }

    fn category(&self, _key: FilterKey) -> Option<String> {
        None
    }
}

// ==================== Tests ====================
