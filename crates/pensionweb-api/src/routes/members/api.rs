//! Member list partials

use std::collections::HashMap;

use axum::extract::Query;
use pensionweb_core::models::{Affilie, Allocataire};
use pensionweb_core::{ListFilter, ViewState};
use pensionweb_utils::escape_html;

use crate::components::{empty_state, render_view, truncation_note};
use crate::AppState;

/// Filtered affilié table (HTMX partial)
pub async fn htmx_affilies_list(
    state: axum::extract::State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Html<String> {
    let filter = ListFilter::from_params(&params);
    let view = ViewState::settled(
        state.portal.client().affilies().list().await,
        &state.config.backend.base_url,
    );
    let page_size = state.config.pagination.records_per_page;
    axum::response::Html(render_view(&view, |affilies| render_affilies(affilies, &filter, page_size)))
}

pub fn render_affilies(affilies: &[Affilie], filter: &ListFilter, page_size: usize) -> String {
    let visible = filter.apply(affilies);
    if visible.is_empty() {
        return empty_state("Aucun affilié trouvé");
    }

    let rows: String = visible
        .iter()
        .take(page_size)
        .map(|a| {
            let status = if a.actif {
                "<span class='px-2 py-0.5 text-xs rounded-full bg-green-100 text-green-800'>Actif</span>"
            } else {
                "<span class='px-2 py-0.5 text-xs rounded-full bg-gray-100 text-gray-600'>Inactif</span>"
            };
            format!(
                "<tr class='border-b'><td class='py-2 px-3 font-mono'>{}</td><td class='py-2 px-3'>{}</td><td class='py-2 px-3'>{}</td><td class='py-2 px-3'>{}</td><td class='py-2 px-3 text-gray-500'>{}</td></tr>",
                escape_html(&a.matricule),
                escape_html(&a.full_name()),
                status,
                if a.ayant_droit { "Oui" } else { "Non" },
                a.adherent_id
            )
        })
        .collect();

    format!(
        "<table class='w-full text-sm'><thead><tr class='text-left text-gray-500 border-b'><th class='py-2 px-3'>Matricule</th><th class='py-2 px-3'>Nom</th><th class='py-2 px-3'>Statut</th><th class='py-2 px-3'>Ayant droit</th><th class='py-2 px-3'>Adhérent</th></tr></thead><tbody>{}</tbody></table>{}",
        rows,
        truncation_note(visible.len().min(page_size), visible.len())
    )
}

/// Filtered allocataire table (HTMX partial)
pub async fn htmx_allocataires_list(
    state: axum::extract::State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Html<String> {
    let filter = ListFilter::from_params(&params);
    let view = ViewState::settled(
        state.portal.client().allocataires().list().await,
        &state.config.backend.base_url,
    );
    let page_size = state.config.pagination.records_per_page;
    axum::response::Html(render_view(&view, |allocataires| render_allocataires(allocataires, &filter, page_size)))
}

pub fn render_allocataires(allocataires: &[Allocataire], filter: &ListFilter, page_size: usize) -> String {
    let visible = filter.apply(allocataires);
    if visible.is_empty() {
        return empty_state("Aucun allocataire trouvé");
    }

    let rows: String = visible
        .iter()
        .take(page_size)
        .map(|a| {
            format!(
                "<tr class='border-b'><td class='py-2 px-3 font-mono'>{}</td><td class='py-2 px-3'>{}</td><td class='py-2 px-3 text-gray-500'>{}</td></tr>",
                escape_html(&a.numero_dossier),
                escape_html(&a.full_name()),
                a.affilie_id
            )
        })
        .collect();

    format!(
        "<table class='w-full text-sm'><thead><tr class='text-left text-gray-500 border-b'><th class='py-2 px-3'>Dossier</th><th class='py-2 px-3'>Nom</th><th class='py-2 px-3'>Affilié</th></tr></thead><tbody>{}</tbody></table>{}",
        rows,
        truncation_note(visible.len().min(page_size), visible.len())
    )
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_router;
    use crate::testing::{admin_cookie, get_with_cookie, send, spawn_backend, state_for};
    use axum::routing::get;
    use axum::{Json, Router};
    use pensionweb_config::SourceMode;
    use pensionweb_core::FilterKey;
    use serde_json::json;

    fn affilie(matricule: &str, nom: &str, actif: bool) -> Affilie {
        Affilie {
            id_affilie: Some(1),
            matricule: matricule.to_string(),
            nom: nom.to_string(),
            prenom: "Sara".to_string(),
            actif,
            ayant_droit: false,
            adherent_id: 10,
        }
    }

    #[test]
    fn test_status_filter() {
        let affilies = vec![affilie("M-001", "Bennani", true), affilie("M-002", "Kettani", false)];
        let filter = ListFilter::new().with_category(FilterKey::Status, "inactif");
        let html = render_affilies(&affilies, &filter, 50);
        assert!(html.contains("M-002"));
        assert!(!html.contains("M-001"));
    }

    #[test]
    fn test_allocataire_search_by_dossier() {
        let allocataires = vec![
            Allocataire { id_allocataire: Some(1), numero_dossier: "D-2024-17".to_string(), nom: "Amrani".to_string(), prenom: "Leila".to_string(), affilie_id: 3 },
            Allocataire { id_allocataire: Some(2), numero_dossier: "D-2023-02".to_string(), nom: "Berrada".to_string(), prenom: "Omar".to_string(), affilie_id: 4 },
        ];
        let html = render_allocataires(&allocataires, &ListFilter::new().with_search("2024"), 50);
        assert!(html.contains("Leila Amrani"));
        assert!(!html.contains("Omar Berrada"));
    }

    #[tokio::test]
    async fn test_affilies_partial_surfaces_backend_error() {
        let backend = Router::new()
            .route("/api/affilies", get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
            .route("/api/allocataires", get(|| async { Json(json!([])) }));
        let state = state_for(&spawn_backend(backend).await, SourceMode::Auto);
        let cookie = admin_cookie(&state).await;
        let router = create_router(state);

        let (_, _, body) = send(router.clone(), get_with_cookie("/affilies/list", &cookie)).await;
        assert!(body.contains("Erreur du serveur"));
        assert!(body.contains("Assurez-vous que le backend Spring Boot fonctionne"));

        let (_, _, body) = send(router, get_with_cookie("/allocataires/list", &cookie)).await;
        assert!(body.contains("Aucun allocataire trouvé"));
    }
}
