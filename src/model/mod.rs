//! External language model abstraction.
//!
//! Defines the [`ModelService`] trait so the orchestrator can be driven by the
//! Gemini client in production and by a canned responder in tests.

pub mod gemini;

use crate::error::ServiceFailure;

/// One element of the request body, in the order the model should read it.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPart {
    /// Raw document bytes, sent inline.
    Document { mime_type: String, data: Vec<u8> },
    /// Plain instruction text.
    Instruction(String),
}

/// A complete text-generation request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system_instruction: String,
    pub parts: Vec<RequestPart>,
    pub max_output_tokens: u32,
}

/// Async trait implemented by each model backend.
#[async_trait::async_trait]
pub trait ModelService: Send + Sync {
    fn name(&self) -> &str;

    /// Run the request and return the model's full text output.
    async fn generate(&self, request: &ModelRequest) -> Result<String, ServiceFailure>;
}
