//! Extraction pipeline: documents in, reviewed-ready case data out.

use tracing::{debug, error, info, warn};

use crate::config::PromptConfig;
use crate::documents::{AppealPair, SourceDocument};
use crate::error::ExtractionError;
use crate::model::{ModelRequest, ModelService, RequestPart};
use crate::response_parser::{self, ParsedResponse};
use crate::schema::{
    CaseData, ConclusionItem, DECISION_PLACEHOLDER, PROVEN_FACTS_PLACEHOLDER, REPORT_PLACEHOLDER,
    UNPROVEN_FACTS_PLACEHOLDER,
};

/// Extraction pipeline orchestrator.
pub struct Extractor<'a> {
    model: &'a dyn ModelService,
    prompts: &'a PromptConfig,
    max_output_tokens: u32,
}

impl<'a> Extractor<'a> {
    pub fn new(model: &'a dyn ModelService, prompts: &'a PromptConfig, max_output_tokens: u32) -> Self {
        Self {
            model,
            prompts,
            max_output_tokens,
        }
    }

    /// Send the documents to the model and turn its tagged answer into [`CaseData`].
    ///
    /// Input presence is checked by the caller (see `documents::validate_inputs`).
    pub async fn extract(
        &self,
        sentence: &SourceDocument,
        pairs: &[AppealPair],
    ) -> Result<CaseData, ExtractionError> {
        let request = self.build_request(sentence, pairs);

        info!(
            "Starting extraction: {} appeal pair(s), {} request part(s), model={}",
            pairs.len(),
            request.parts.len(),
            self.model.name()
        );

        let raw = self.model.generate(&request).await.map_err(|e| {
            error!("Model call failed: {}", e);
            ExtractionError::from(e)
        })?;

        debug!("Raw model response length: {} chars", raw.len());

        let parsed = response_parser::parse(&raw);
        if !parsed.is_usable() {
            error!("Model response has no usable sections. Full text received:\n{}", raw);
            return Err(ExtractionError::MalformedResponse { raw });
        }

        debug!(
            "Parsed sections: report={} proven={} unproven={} decision={} conclusions={}",
            parsed.report.len(),
            parsed.proven_facts.len(),
            parsed.unproven_facts.len(),
            parsed.decision_first_instance.len(),
            parsed.conclusions.len()
        );

        let data = apply_defaults(parsed);
        info!(
            "Extraction complete: {} conclusion item(s)",
            data.appeal_conclusions.len()
        );
        Ok(data)
    }

    /// Judgment first, then each pair in order: appeal, then response. Every
    /// document is followed by the instruction that labels it.
    pub fn build_request(&self, sentence: &SourceDocument, pairs: &[AppealPair]) -> ModelRequest {
        let mut parts = Vec::new();
        push_document(&mut parts, sentence, &self.prompts.sentence_label);

        for pair in pairs {
            if let Some(appeal) = &pair.appeal {
                push_document(&mut parts, appeal, &self.prompts.appeal_label);
            }
            if let Some(response) = &pair.response {
                push_document(&mut parts, response, &self.prompts.response_label);
            }
        }

        ModelRequest {
            system_instruction: self.prompts.system_instruction.clone(),
            parts,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

fn push_document(parts: &mut Vec<RequestPart>, document: &SourceDocument, label: &str) {
    parts.push(RequestPart::Document {
        mime_type: document.mime_type.clone(),
        data: document.data.clone(),
    });
    parts.push(RequestPart::Instruction(label.to_string()));
}

/// Fill individually missing sections with placeholders so every field has content.
pub fn apply_defaults(parsed: ParsedResponse) -> CaseData {
    let or_placeholder = |value: String, field: &str, placeholder: &str| {
        if value.is_empty() {
            warn!("Section {} missing from model response, using placeholder", field);
            placeholder.to_string()
        } else {
            value
        }
    };

    let appeal_conclusions = if parsed.conclusions.is_empty() {
        warn!("No conclusion items found, inserting placeholder item");
        vec![ConclusionItem::placeholder()]
    } else {
        parsed.conclusions
    };

    CaseData {
        report: or_placeholder(parsed.report, "report", REPORT_PLACEHOLDER),
        proven_facts: or_placeholder(parsed.proven_facts, "proven_facts", PROVEN_FACTS_PLACEHOLDER),
        unproven_facts: or_placeholder(
            parsed.unproven_facts,
            "unproven_facts",
            UNPROVEN_FACTS_PLACEHOLDER,
        ),
        decision_first_instance: or_placeholder(
            parsed.decision_first_instance,
            "decision_first_instance",
            DECISION_PLACEHOLDER,
        ),
        appeal_conclusions,
    }
}
