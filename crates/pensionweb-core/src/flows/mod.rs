//! Prompt flows over pension data
//!
//! Features:
//! - Record summary: one pensioner's full record
//! - Data analysis: trend identification, comparison, liability projection
//! - Chat: free conversation grounded in a JSON data slice
//!
//! Structure:
//! - `backend.rs`: `GenerativeBackend` trait and providers
//! - this module: input/output contracts, prompt templates, the flows
//!
//! Every flow checks its input before calling the model and checks the
//! model's answer against the output shape before returning it.

mod backend;

pub use backend::{from_config, DisabledBackend, GeminiBackend, GenerativeBackend};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::CoreError;
use crate::models::{PensionerRecord, PensionerWithOperations};
use crate::validate::Validate;

pub const CHAT_GREETING: &str = "👋 Bonjour ! Je suis votre assistant IA pour les données de pension. Je peux vous aider à analyser, comprendre et explorer vos données. Que souhaitez-vous savoir ?";

pub const CHAT_SUGGESTIONS: [&str; 4] = [
    "Combien de pensionnaires avons-nous au total ?",
    "Quelles sont les tendances de paiement ?",
    "Y a-t-il des anomalies dans les données ?",
    "Quel est le montant moyen des pensions ?",
];

pub const CHAT_FAILURE_REPLY: &str = "❌ Désolé, une erreur s'est produite. Veuillez réessayer.";

/// Flow failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Model answer rejected: {0}")]
    InvalidOutput(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Flows unavailable: {0}")]
    Disabled(String),
}

impl FlowError {
    fn input(field: &str, message: impl Into<String>) -> Self {
        FlowError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn is_input_error(&self) -> bool {
        matches!(self, FlowError::InvalidInput { .. })
    }
}

impl From<FlowError> for CoreError {
    fn from(error: FlowError) -> Self {
        match error {
            FlowError::InvalidInput { .. } => CoreError::InvalidData {
                message: error.to_string(),
            },
            other => CoreError::GenerationFailed {
                message: other.to_string(),
            },
        }
    }
}

pub type FlowResult<T> = Result<T, FlowError>;

// ==================== Contracts ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummaryInput {
    /// JSON of a `PensionerRecord`
    pub pensioner_record: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummaryOutput {
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisType {
    TrendIdentification,
    DataComparison,
    LiabilityProjection,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 3] = [
        AnalysisType::TrendIdentification,
        AnalysisType::DataComparison,
        AnalysisType::LiabilityProjection,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AnalysisType::TrendIdentification => "Identification des tendances",
            AnalysisType::DataComparison => "Comparaison des données",
            AnalysisType::LiabilityProjection => "Projection des engagements",
        }
    }
}

impl std::str::FromStr for AnalysisType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trend identification" => Ok(AnalysisType::TrendIdentification),
            "data comparison" => Ok(AnalysisType::DataComparison),
            "liability projection" => Ok(AnalysisType::LiabilityProjection),
            _ => Err(format!("Invalid analysis type: {}", s)),
        }
    }
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisType::TrendIdentification => write!(f, "trend identification"),
            AnalysisType::DataComparison => write!(f, "data comparison"),
            AnalysisType::LiabilityProjection => write!(f, "liability projection"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 3] = [ReportFormat::Text, ReportFormat::Json, ReportFormat::Csv];
}

impl std::str::FromStr for ReportFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "texte" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            _ => Err(format!("Invalid report format: {}", s)),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "JSON"),
            ReportFormat::Csv => write!(f, "CSV"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInput {
    /// JSON array of pensioners, each optionally carrying `operations`
    pub pension_data: String,
    pub analysis_type: String,
    pub report_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub report: String,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInput {
    pub pension_data: String,
    pub user_message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOutput {
    pub reply: String,
    #[serde(default)]
    pub suggested_questions: Vec<String>,
}

/// Parse a conversation history sent back by the chat form
pub fn parse_history(raw: &str) -> FlowResult<Vec<ChatMessage>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| FlowError::input("conversationHistory", e.to_string()))
}

// ==================== Input checks ====================

fn parse_record(raw: &str) -> FlowResult<PensionerRecord> {
    let record: PensionerRecord =
        serde_json::from_str(raw).map_err(|e| FlowError::input("pensionerRecord", e.to_string()))?;
    record
        .pensioner
        .validate()
        .and_then(|_| record.operations.validate())
        .and_then(|_| record.banking.validate())
        .map_err(|message| FlowError::input("pensionerRecord", message))?;
    Ok(record)
}

fn parse_pension_data(raw: &str) -> FlowResult<Vec<PensionerWithOperations>> {
    let entries: Vec<PensionerWithOperations> =
        serde_json::from_str(raw).map_err(|e| FlowError::input("pensionData", e.to_string()))?;
    for (index, entry) in entries.iter().enumerate() {
        entry
            .pensioner
            .validate()
            .and_then(|_| entry.operations.validate())
            .map_err(|message| FlowError::input("pensionData", format!("item {}: {}", index, message)))?;
    }
    Ok(entries)
}

impl RecordSummaryInput {
    pub fn check(&self) -> FlowResult<PensionerRecord> {
        parse_record(&self.pensioner_record)
    }
}

impl AnalysisInput {
    pub fn check(&self) -> FlowResult<(AnalysisType, ReportFormat)> {
        parse_pension_data(&self.pension_data)?;
        let analysis_type = self
            .analysis_type
            .parse()
            .map_err(|e: String| FlowError::input("analysisType", e))?;
        let report_format = self
            .report_format
            .parse()
            .map_err(|e: String| FlowError::input("reportFormat", e))?;
        Ok((analysis_type, report_format))
    }
}

impl ChatInput {
    pub fn check(&self) -> FlowResult<()> {
        serde_json::from_str::<Value>(&self.pension_data)
            .map_err(|e| FlowError::input("pensionData", e.to_string()))?;
        if self.user_message.trim().is_empty() {
            return Err(FlowError::input("userMessage", "message is empty"));
        }
        Ok(())
    }
}

// ==================== Prompts ====================

pub fn record_summary_prompt(input: &RecordSummaryInput) -> String {
    format!(
        r#"You are an AI assistant that summarizes pensioner records.

Given the following pensioner record:
{record}

Generate a concise summary highlighting key information such as total benefits paid, notable changes in payment history, and any potential discrepancies.
The summary should be easy to understand and should quickly provide insights into the pensioner's financial status.

Respond only with a JSON object of the form {{"summary": "..."}}."#,
        record = input.pensioner_record
    )
}

pub fn analysis_prompt(input: &AnalysisInput) -> String {
    format!(
        r#"Vous êtes un analyste expert en données de pension. Votre tâche est d'analyser les données de pension fournies en fonction du type d'analyse demandé et de générer un rapport dans le format spécifié. La réponse DOIT être en français.

Vous devez fournir un rapport détaillé et bien structuré ainsi qu'un résumé concis et perspicace de vos conclusions.

**Données de Pension :**
```json
{data}
```

**Type d'Analyse :** {kind}
**Format du Rapport :** {format}

Commencez l'analyse maintenant. Structurez clairement votre réponse.

Répondez uniquement avec un objet JSON de la forme {{"report": "...", "summary": "..."}}."#,
        data = input.pension_data,
        kind = input.analysis_type,
        format = input.report_format
    )
}

pub fn chat_prompt(input: &ChatInput) -> String {
    let mut history = String::new();
    if !input.conversation_history.is_empty() {
        history.push_str("**Historique de la conversation :**\n");
        for message in &input.conversation_history {
            history.push_str(&format!("{}: {}\n", message.role, message.content));
        }
        history.push('\n');
    }

    format!(
        r#"Vous êtes un assistant IA spécialisé dans l'analyse de données de pensions. Vous aidez les utilisateurs à comprendre et explorer leurs données de pension de manière conversationnelle.

**Données de pension disponibles :**
```json
{data}
```

{history}**Question actuelle de l'utilisateur :**
"{message}"

**Instructions :**
- Répondez en français de manière claire et conversationnelle
- Basez-vous uniquement sur les données fournies
- Si une information n'est pas disponible, indiquez-le poliment
- Utilisez des exemples concrets tirés des données quand c'est pertinent
- Maintenez le contexte de la conversation précédente
- Proposez des questions de suivi intéressantes si approprié
- Soyez précis avec les chiffres et les statistiques

Répondez uniquement avec un objet JSON de la forme {{"reply": "...", "suggestedQuestions": ["..."]}}."#,
        data = input.pension_data,
        history = history,
        message = input.user_message
    )
}

// ==================== Flows ====================

fn parse_output<T: DeserializeOwned>(value: Value) -> FlowResult<T> {
    serde_json::from_value(value).map_err(|e| FlowError::InvalidOutput(e.to_string()))
}

fn require_text(value: &str, field: &str) -> FlowResult<()> {
    if value.trim().is_empty() {
        Err(FlowError::InvalidOutput(format!("{} is empty", field)))
    } else {
        Ok(())
    }
}

pub async fn generate_record_summary(
    backend: &dyn GenerativeBackend,
    input: &RecordSummaryInput,
) -> FlowResult<RecordSummaryOutput> {
    let record = input.check()?;
    log::info!(
        "Summarizing record of pensioner {} via {}",
        record.pensioner.id_text(),
        backend.name()
    );

    let output: RecordSummaryOutput = parse_output(backend.generate(&record_summary_prompt(input)).await?)?;
    require_text(&output.summary, "summary")?;
    Ok(output)
}

pub async fn analyze_pension_data(
    backend: &dyn GenerativeBackend,
    input: &AnalysisInput,
) -> FlowResult<AnalysisOutput> {
    let (analysis_type, report_format) = input.check()?;
    log::info!("Running {} analysis ({}) via {}", analysis_type, report_format, backend.name());

    let output: AnalysisOutput = parse_output(backend.generate(&analysis_prompt(input)).await?)?;
    require_text(&output.report, "report")?;
    require_text(&output.summary, "summary")?;
    Ok(output)
}

pub async fn chat_about_pensions(
    backend: &dyn GenerativeBackend,
    input: &ChatInput,
) -> FlowResult<ChatOutput> {
    input.check()?;
    log::debug!(
        "Chat turn with {} prior message(s) via {}",
        input.conversation_history.len(),
        backend.name()
    );

    let output: ChatOutput = parse_output(backend.generate(&chat_prompt(input)).await?)?;
    require_text(&output.reply, "reply")?;
    Ok(output)
}

// ==================== Tests ====================
