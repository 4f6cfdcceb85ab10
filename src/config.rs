//! Service and prompt configuration.
//!
//! Service settings come from the environment (`.env` is honoured). Prompt
//! texts have built-in defaults and can be overridden from a JSON file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 65536;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_UPLOAD_MB: usize = 100;

/// Runtime settings for the HTTP service and the model client.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Default credential. Requests may bring their own in `x-api-key`.
    pub api_key: Option<String>,
    pub model: String,
    pub max_output_tokens: u32,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    pub prompts: PromptConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_output_tokens: u32 = match non_empty("MAX_OUTPUT_TOKENS") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("MAX_OUTPUT_TOKENS is not a number: {:?}", v))?,
            None => DEFAULT_MAX_OUTPUT_TOKENS,
        };

        let max_upload_mb: usize = match non_empty("MAX_UPLOAD_MB") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("MAX_UPLOAD_MB is not a number: {:?}", v))?,
            None => DEFAULT_MAX_UPLOAD_MB,
        };

        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .with_context(|| format!("MAX_UPLOAD_MB is too large: {}", max_upload_mb))?;

        let prompts = match non_empty("PROMPTS_PATH") {
            Some(path) => PromptConfig::load_from_file(Path::new(&path))?,
            None => PromptConfig::default(),
        };

        Ok(Self {
            api_key: non_empty("GEMINI_API_KEY"),
            model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_output_tokens,
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            max_upload_bytes,
            prompts,
        })
    }
}

/// Texts sent to the model alongside the documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// System instruction mandating the tagged response format.
    pub system_instruction: String,
    /// Follows the first-instance judgment.
    pub sentence_label: String,
    /// Follows each appeal.
    pub appeal_label: String,
    /// Follows each response to an appeal.
    pub response_label: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            sentence_label: "O documento acima é a Sentença de Primeira Instância. Identifique-a como tal."
                .to_string(),
            appeal_label: "O documento acima é um Recurso (Alegações). Extraia as Conclusões."
                .to_string(),
            response_label: "O documento acima é uma Resposta ao Recurso (Contra-alegações)."
                .to_string(),
        }
    }
}

impl PromptConfig {
    /// Load prompt overrides from a JSON file. Absent fields keep their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompts: {:?}", path))?;
        let prompts: PromptConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse prompts: {:?}", path))?;
        info!("Loaded prompt overrides from {:?}", path);
        Ok(prompts)
    }
}

const DEFAULT_SYSTEM_INSTRUCTION: &str = r#"Você é um Assistente Jurídico de alto nível em um Tribunal Superior.
Sua tarefa é analisar os documentos fornecidos (Sentença, Recursos e Respostas) e estruturar um projeto de Acórdão.

IMPORTANTE:
Não responda em JSON. Responda em TEXTO ESTRUTURADO usando EXATAMENTE as tags abaixo como separadores.
Copie os textos com fidelidade total.

ESTRUTURA DA RESPOSTA:

<<<RELATORIO>>>
(Sintetize o histórico do processo. Separe os parágrafos claramente com quebras de linha duplas.)

<<<FACTOS_PROVADOS>>>
(Copie integralmente os factos provados da sentença. Mantenha a numeração original.)
(SE HOUVER TABELAS: Converta-as para tabelas Markdown visualmente alinhadas. Ex: | Col1 | Col2 |)

<<<FACTOS_NAO_PROVADOS>>>
(Copie integralmente os factos não provados, se houver.)

<<<DECISAO_PRIMEIRA_INSTANCIA>>>
(O segmento decisório/dispositivo da sentença da primeira instância.)

<<<CONCLUSOES_RECURSOS>>>
(Liste as conclusões. Mantenha a ordem cronológica dos recursos.)
(IMPORTANTE: Para cada recurso identificado, extraia PRIMEIRO as conclusões do recurso e, IMEDIATAMENTE DEPOIS, as conclusões da resposta/contra-alegações correspondente, se houver.)

(Utilize este formato exato para CADA item:)
TIPO: (Escreva apenas "RECURSO" ou "RESPOSTA")
FONTE: (Ex: "Recorrente: Autor João" ou "Recorrido: Réu Empresa X")
CONTEUDO: (Copie as conclusões numeradas)
---SEPARADOR_ITEM---"#;
