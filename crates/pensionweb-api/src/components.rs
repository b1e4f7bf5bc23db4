//! Shared HTML fragments: placeholders, error panels, badges, form parsing

use std::collections::HashMap;

use pensionweb_core::flows::FlowError;
use pensionweb_core::models::PaymentMethod;
use pensionweb_core::{DataSource, ViewError, ViewState};
use pensionweb_utils::escape_html;
use rust_decimal::Decimal;

/// Parse an `application/x-www-form-urlencoded` body
pub fn parse_form(body: &str) -> HashMap<String, String> {
    let mut params: HashMap<String, String> = HashMap::new();
    for pair in body.split('&') {
        let parts: Vec<&str> = pair.splitn(2, '=').collect();
        if parts.len() == 2 {
            let raw_key = parts[0].replace('+', " ");
            let raw_value = parts[1].replace('+', " ");
            let key = urlencoding::decode(&raw_key);
            let value = urlencoding::decode(&raw_value);
            match (key, value) {
                (Ok(key), Ok(value)) => {
                    params.insert(key.into_owned(), value.into_owned());
                }
                _ => log::debug!("Skipping form field with malformed encoding: {}", pair),
            }
        }
    }
    params
}

/// Amount in dirhams
pub fn money(amount: Decimal) -> String {
    pensionweb_utils::format_currency(amount, "MAD")
}

/// Backend timestamp as `dd/mm/yyyy hh:mm`; unparseable values are shown as-is
pub fn display_time(timestamp: &str) -> String {
    match pensionweb_core::models::parse_timestamp(timestamp) {
        Some(t) => t.format("%d/%m/%Y %H:%M").to_string(),
        None => escape_html(timestamp),
    }
}

/// French label of a payment method code, falling back to the code
pub fn method_label(code: &str) -> String {
    code.parse::<PaymentMethod>()
        .map(|m| m.label().to_string())
        .unwrap_or_else(|_| escape_html(code))
}

/// Section that fetches its content once mounted
pub fn lazy_section(id: &str, url: &str) -> String {
    format!(
        r#"<div id='{}' hx-get='{}' hx-trigger='load' hx-swap='innerHTML'>{}</div>"#,
        id,
        url,
        loading_panel()
    )
}

pub fn loading_panel() -> String {
    "<div class='bg-white rounded-xl shadow-sm p-6 text-center text-gray-500'><span class='animate-pulse'>⏳ Chargement des données...</span></div>".to_string()
}

/// Static panel shown when a fetch failed
pub fn error_panel(error: &ViewError) -> String {
    format!(
        r#"<div class='bg-red-50 border border-red-200 rounded-xl p-6'>
    <h3 class='text-lg font-semibold text-red-700 mb-2'>⚠️ {}</h3>
    <p class='text-sm text-red-600 mb-2'>{}</p>
    <p class='text-sm text-gray-600'>{}</p>
</div>"#,
        error.title(),
        escape_html(&error.message),
        escape_html(&error.remediation)
    )
}

/// Render each state of a view: placeholder, data, or error panel
pub fn render_view<T>(state: &ViewState<T>, render: impl FnOnce(&T) -> String) -> String {
    match state {
        ViewState::Loading => loading_panel(),
        ViewState::Ready(data) => render(data),
        ViewState::Failed(error) => error_panel(error),
    }
}

/// Marks numbers that come from the demonstration dataset
pub fn source_badge(source: DataSource) -> String {
    match source {
        DataSource::Live => String::new(),
        DataSource::Fallback => "<span class='ml-2 px-2 py-0.5 text-xs rounded-full bg-yellow-100 text-yellow-800'>Données de démonstration</span>".to_string(),
    }
}

pub fn empty_state(message: &str) -> String {
    format!("<p class='text-center text-gray-500 py-8'>{}</p>", message)
}

pub fn not_found_panel(message: &str) -> String {
    format!(
        "<div class='bg-white rounded-xl shadow-sm p-6 text-center'><p class='text-4xl mb-2'>🔍</p><p class='text-gray-600'>{}</p></div>",
        message
    )
}

/// Toast-style notice for a failed flow call
pub fn flow_error_panel(error: &FlowError) -> String {
    let title = match error {
        FlowError::InvalidInput { .. } => "Données d'entrée invalides",
        FlowError::Disabled(_) => "Assistant IA indisponible",
        FlowError::InvalidOutput(_) | FlowError::Generation(_) => "La génération a échoué",
    };
    format!(
        "<div class='bg-red-50 border border-red-200 rounded-lg p-4 text-sm'><p class='font-semibold text-red-700'>❌ {}</p><p class='text-red-600'>{}</p></div>",
        title,
        escape_html(&error.to_string())
    )
}

/// `<select>` with an "all" entry first
pub fn filter_select(name: &str, all_label: &str, options: &[(String, String)], selected: &str, target: &str, url: &str) -> String {
    let mut html = format!(
        r#"<select name='{}' hx-get='{}' hx-target='{}' hx-trigger='change' hx-include='closest form' class='px-3 py-2 border rounded-lg text-sm'><option value='all'>{}</option>"#,
        name, url, target, all_label
    );
    for (value, label) in options {
        html.push_str(&format!(
            "<option value='{}'{}>{}</option>",
            escape_html(value),
            if value == selected { " selected" } else { "" },
            escape_html(label)
        ));
    }
    html.push_str("</select>");
    html
}

/// Note shown when a list is cut at the page size
pub fn truncation_note(shown: usize, total: usize) -> String {
    if shown < total {
        format!("<p class='text-xs text-gray-500 mt-3'>{} affichés sur {} résultats. Affinez la recherche pour voir les autres.</p>", shown, total)
    } else {
        format!("<p class='text-xs text-gray-500 mt-3'>{} résultat(s)</p>", total)
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use pensionweb_core::ApiError;
    use std::str::FromStr;

    #[test]
    fn test_parse_form_decodes_plus_and_percent() {
        let params = parse_form("name=Ahmed+Benali&city=F%C3%A8s&note=a%3Db");
        assert_eq!(params["name"], "Ahmed Benali");
        assert_eq!(params["city"], "Fès");
        assert_eq!(params["note"], "a=b");
    }

    #[test]
    fn test_parse_form_skips_malformed_encoding() {
        let params = parse_form("name=%E0%A4&city=Rabat");
        assert!(!params.contains_key("name"));
        assert_eq!(params["city"], "Rabat");
    }

    #[test]
    fn test_render_view_states() {
        let loading: ViewState<u32> = ViewState::new();
        assert!(render_view(&loading, |n| n.to_string()).contains("Chargement"));

        let ready = ViewState::settled(Ok(7u32), "http://localhost:8080/api");
        assert_eq!(render_view(&ready, |n| n.to_string()), "7");

        let failed: ViewState<u32> = ViewState::settled(
            Err(ApiError::Timeout { url: "http://localhost:8080/api/pensioners".to_string() }),
            "http://localhost:8080/api",
        );
        let html = render_view(&failed, |n| n.to_string());
        assert!(html.contains("Backend injoignable"));
        assert!(html.contains("Assurez-vous que le backend Spring Boot fonctionne sur http://localhost:8080/api"));
    }

    #[test]
    fn test_error_panel_escapes_message() {
        let error = ViewError {
            kind: pensionweb_core::ApiErrorKind::Server,
            message: "<script>x</script>".to_string(),
            remediation: "check".to_string(),
        };
        assert!(error_panel(&error).contains("&lt;script&gt;"));
    }

    #[test]
    fn test_badge_only_for_fallback() {
        assert!(source_badge(DataSource::Live).is_empty());
        assert!(source_badge(DataSource::Fallback).contains("démonstration"));
    }

    #[test]
    fn test_filter_select_marks_selection() {
        let options = vec![("Rabat".to_string(), "Rabat".to_string()), ("Fès".to_string(), "Fès".to_string())];
        let html = filter_select("city", "Toutes les villes", &options, "Rabat", "#list", "/pensioners/list");
        assert!(html.contains("<option value='Rabat' selected>Rabat</option>"));
        assert!(html.contains("<option value='Fès'>Fès</option>"));
    }

    #[test]
    fn test_display_helpers() {
        assert_eq!(display_time("2024-03-05T14:30:00"), "05/03/2024 14:30");
        assert_eq!(display_time("hier"), "hier");
        assert_eq!(method_label("BANK_TRANSFER"), "Virement Bancaire");
        assert_eq!(method_label("CRYPTO"), "CRYPTO");
    }

    #[test]
    fn test_money() {
        assert_eq!(money(Decimal::from_str("3500").unwrap()), "3 500,00 MAD");
    }
}
