//! Error taxonomy for extraction, and its mapping onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// What went wrong talking to the external model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Missing, invalid or unauthorised credential.
    Authentication,
    /// Network error, quota, upstream outage or any other non-credential failure.
    Unavailable,
}

#[derive(Debug, Clone, Error)]
#[error("model service failure ({kind:?}, status {status:?}): {message}")]
pub struct ServiceFailure {
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ServiceFailure {
    /// Classify a failure from its HTTP status (if any) and message text.
    pub fn classify(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = if matches!(status, Some(401 | 403)) || mentions_credentials(&message) {
            FailureKind::Authentication
        } else {
            FailureKind::Unavailable
        };
        Self {
            kind,
            status,
            message,
        }
    }

    pub fn missing_key() -> Self {
        Self {
            kind: FailureKind::Authentication,
            status: None,
            message: "no API key configured".to_string(),
        }
    }

    pub fn is_authentication(&self) -> bool {
        self.kind == FailureKind::Authentication
    }
}

fn mentions_credentials(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["api key", "api_key", "apikey", "permission_denied", "unauthenticated", "401", "403"]
        .iter()
        .any(|marker| lower.contains(marker))
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("unsupported document type: {filename}")]
    UnsupportedDocument { filename: String },

    #[error(transparent)]
    ServiceFailure(#[from] ServiceFailure),

    #[error("model response has no recognisable sections")]
    MalformedResponse { raw: String },
}

impl ExtractionError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "missing_input",
            Self::UnsupportedDocument { .. } => "unsupported_document",
            Self::ServiceFailure(f) if f.is_authentication() => "authentication",
            Self::ServiceFailure(_) => "service_failure",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::MissingInput(_) | Self::UnsupportedDocument { .. } => StatusCode::BAD_REQUEST,
            Self::ServiceFailure(f) if f.is_authentication() => StatusCode::UNAUTHORIZED,
            Self::ServiceFailure(_) => StatusCode::BAD_GATEWAY,
            Self::MalformedResponse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Short message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingInput(msg) => msg.clone(),
            Self::UnsupportedDocument { filename } => format!(
                "Formato não suportado: {}. Utilize PDF, DOCX ou TXT.",
                filename
            ),
            Self::ServiceFailure(f) if f.is_authentication() => {
                "Chave de API inválida ou sem permissões. Verifique a chave configurada.".to_string()
            }
            Self::ServiceFailure(_) => "Ocorreu um erro ao processar. Tente novamente.".to_string(),
            Self::MalformedResponse { .. } => "O modelo gerou uma resposta, mas não foi possível \
                identificar as seções esperadas. (Falha nas tags delimitadoras)"
                .to_string(),
        }
    }
}

impl IntoResponse for ExtractionError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "message": self.user_message(),
        });
        (self.status(), Json(body)).into_response()
    }
}
