//! Uploaded documents: type detection and appeal/response grouping.

use sha2::{Digest, Sha256};

use crate::error::ExtractionError;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";

const ACCEPTED_MIME_TYPES: [&str; 3] = [MIME_PDF, MIME_DOCX, MIME_TEXT];

/// One uploaded file, held in memory until it is sent to the model.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl SourceDocument {
    /// Build a document, resolving its MIME type and rejecting unsupported formats.
    pub fn new(
        filename: impl Into<String>,
        declared_type: Option<&str>,
        data: Vec<u8>,
    ) -> Result<Self, ExtractionError> {
        let filename = filename.into();
        let mime_type = resolve_mime_type(&filename, declared_type)
            .ok_or_else(|| ExtractionError::UnsupportedDocument {
                filename: filename.clone(),
            })?;
        Ok(Self {
            filename,
            mime_type,
            data,
        })
    }

    /// Hex SHA-256 of the file contents, for diagnostics.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.data);
        format!("{:x}", hasher.finalize())
    }
}

/// MIME type implied by the file extension, if it is one we accept.
pub fn mime_from_extension(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    match ext.to_lowercase().as_str() {
        "pdf" => Some(MIME_PDF),
        "docx" => Some(MIME_DOCX),
        "txt" => Some(MIME_TEXT),
        _ => None,
    }
}

/// Pick the MIME type for an upload.
///
/// A declared type wins when it is one we accept. Generic or missing
/// declarations fall back to the extension, and to PDF when nothing at all
/// can be determined. Returns `None` for formats we do not accept.
pub fn resolve_mime_type(filename: &str, declared_type: Option<&str>) -> Option<String> {
    let declared = declared_type
        .map(|t| t.split(';').next().unwrap_or(t).trim().to_lowercase())
        .filter(|t| !t.is_empty() && t != "application/octet-stream");

    if let Some(declared) = &declared {
        if ACCEPTED_MIME_TYPES.contains(&declared.as_str()) {
            return Some(declared.clone());
        }
    }

    if let Some(mime) = mime_from_extension(filename) {
        return Some(mime.to_string());
    }

    let has_extension = filename
        .rsplit_once('.')
        .map(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
        .unwrap_or(false);

    if declared.is_none() && !has_extension {
        return Some(MIME_PDF.to_string());
    }

    None
}

/// An appeal with its optional response, as grouped by the client.
#[derive(Debug, Clone)]
pub struct AppealPair {
    pub id: String,
    pub appeal: Option<SourceDocument>,
    pub response: Option<SourceDocument>,
}

impl AppealPair {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            appeal: None,
            response: None,
        }
    }
}

/// Which half of an appeal pair a multipart field carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSlot {
    Appeal,
    Response,
}

/// Parse multipart field names of the form `appeal_<id>` / `response_<id>`.
/// A bare `appeal` or `response` uses the empty id.
pub fn parse_pair_field(name: &str) -> Option<(PairSlot, &str)> {
    let (slot, rest) = if let Some(rest) = name.strip_prefix("appeal") {
        (PairSlot::Appeal, rest)
    } else if let Some(rest) = name.strip_prefix("response") {
        (PairSlot::Response, rest)
    } else {
        return None;
    };

    if rest.is_empty() {
        return Some((slot, ""));
    }
    rest.strip_prefix('_').map(|id| (slot, id))
}

/// Inputs for one extraction, collected from an upload.
#[derive(Debug, Clone, Default)]
pub struct CaseUpload {
    pub sentence: Option<SourceDocument>,
    pairs: Vec<AppealPair>,
}

impl CaseUpload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a document into its pair. Pairs keep the order their id first appeared.
    /// A later document for the same slot replaces the earlier one.
    pub fn insert(&mut self, slot: PairSlot, pair_id: &str, document: SourceDocument) {
        let index = match self.pairs.iter().position(|p| p.id == pair_id) {
            Some(index) => index,
            None => {
                self.pairs.push(AppealPair::new(pair_id));
                self.pairs.len() - 1
            }
        };

        let pair = &mut self.pairs[index];
        match slot {
            PairSlot::Appeal => pair.appeal = Some(document),
            PairSlot::Response => pair.response = Some(document),
        }
    }

    pub fn pairs(&self) -> &[AppealPair] {
        &self.pairs
    }

    pub fn filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sentence.iter().map(|d| d.filename.clone()).collect();
        for pair in &self.pairs {
            names.extend(pair.appeal.iter().map(|d| d.filename.clone()));
            names.extend(pair.response.iter().map(|d| d.filename.clone()));
        }
        names
    }

    /// Check the inputs an extraction needs before any network activity.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        validate_inputs(self.sentence.as_ref(), &self.pairs)
    }
}

/// A first-instance judgment and at least one appeal are required.
pub fn validate_inputs(
    sentence: Option<&SourceDocument>,
    pairs: &[AppealPair],
) -> Result<(), ExtractionError> {
    if sentence.is_none() {
        return Err(ExtractionError::MissingInput(
            "A Sentença de 1ª Instância é obrigatória.".to_string(),
        ));
    }
    if !pairs.iter().any(|p| p.appeal.is_some()) {
        return Err(ExtractionError::MissingInput(
            "É necessário carregar pelo menos um Recurso.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> SourceDocument {
        SourceDocument::new(name, None, b"data".to_vec()).unwrap()
    }

    #[test]
    fn test_mime_from_declared_type() {
        assert_eq!(resolve_mime_type("x.bin", Some("application/pdf")).as_deref(), Some(MIME_PDF));
        assert_eq!(
            resolve_mime_type("notas", Some("text/plain; charset=utf-8")).as_deref(),
            Some(MIME_TEXT)
        );
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(resolve_mime_type("Sentenca.PDF", None).as_deref(), Some(MIME_PDF));
        assert_eq!(resolve_mime_type("recurso.docx", Some("")).as_deref(), Some(MIME_DOCX));
        assert_eq!(
            resolve_mime_type("resposta.txt", Some("application/octet-stream")).as_deref(),
            Some(MIME_TEXT)
        );
    }

    #[test]
    fn test_mime_defaults_to_pdf() {
        assert_eq!(resolve_mime_type("documento", None).as_deref(), Some(MIME_PDF));
        assert_eq!(
            resolve_mime_type("documento", Some("application/octet-stream")).as_deref(),
            Some(MIME_PDF)
        );
    }

    #[test]
    fn test_unsupported_rejected() {
        assert!(resolve_mime_type("folha.xlsx", None).is_none());
        assert!(resolve_mime_type("antigo.doc", Some("application/msword")).is_none());
        let err = SourceDocument::new("foto.png", Some("image/png"), vec![]).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedDocument { filename } if filename == "foto.png"));
    }

    #[test]
    fn test_parse_pair_field() {
        assert_eq!(parse_pair_field("appeal_1"), Some((PairSlot::Appeal, "1")));
        assert_eq!(parse_pair_field("response_abc"), Some((PairSlot::Response, "abc")));
        assert_eq!(parse_pair_field("appeal"), Some((PairSlot::Appeal, "")));
        assert_eq!(parse_pair_field("appeals"), None);
        assert_eq!(parse_pair_field("sentence"), None);
    }

    #[test]
    fn test_pairs_keep_first_seen_order() {
        let mut upload = CaseUpload::new();
        upload.insert(PairSlot::Response, "b", doc("resp_b.pdf"));
        upload.insert(PairSlot::Appeal, "a", doc("rec_a.pdf"));
        upload.insert(PairSlot::Appeal, "b", doc("rec_b.pdf"));

        let pairs = upload.pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].id, "b");
        assert_eq!(pairs[0].appeal.as_ref().unwrap().filename, "rec_b.pdf");
        assert_eq!(pairs[0].response.as_ref().unwrap().filename, "resp_b.pdf");
        assert_eq!(pairs[1].id, "a");
        assert!(pairs[1].response.is_none());
    }

    #[test]
    fn test_validate_inputs() {
        let mut upload = CaseUpload::new();
        upload.insert(PairSlot::Appeal, "1", doc("rec.pdf"));
        assert!(matches!(upload.validate(), Err(ExtractionError::MissingInput(_))));

        upload.sentence = Some(doc("sentenca.pdf"));
        assert!(upload.validate().is_ok());

        let mut only_response = CaseUpload::new();
        only_response.sentence = Some(doc("sentenca.pdf"));
        only_response.insert(PairSlot::Response, "1", doc("resp.pdf"));
        assert!(matches!(only_response.validate(), Err(ExtractionError::MissingInput(_))));
    }

    #[test]
    fn test_filenames_in_request_order() {
        let mut upload = CaseUpload::new();
        upload.sentence = Some(doc("sentenca.pdf"));
        upload.insert(PairSlot::Response, "1", doc("resp.pdf"));
        upload.insert(PairSlot::Appeal, "1", doc("rec.pdf"));
        assert_eq!(upload.filenames(), vec!["sentenca.pdf", "rec.pdf", "resp.pdf"]);
    }

    #[test]
    fn test_digest_is_stable() {
        let a = doc("a.pdf");
        assert_eq!(a.digest().len(), 64);
        assert_eq!(a.digest(), doc("b.pdf").digest());
    }
}
