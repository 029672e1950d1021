use async_trait::async_trait;
use mantis_types::{
    CreateDocumentRequest, DocumentStatusReport, ProjectDocument, ProjectScope, UpdateDocumentRequest,
};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::envelope;
use crate::error::{ApiError, ErrorContext, Result};
use crate::http::ApiClient;
use crate::traits::DocumentsApi;
use crate::upload::{ProgressCallback, UploadFile};

const DOCUMENT_UPLOAD_ERRORS: ErrorContext = ErrorContext {
    operation: "upload document",
    bad_request: None,
    unauthorized: None,
    forbidden: "You do not have permission to upload documents to this project",
    not_found: "Project not found or you do not have access to it",
};

fn documents_path(scope: &ProjectScope) -> String {
    format!("/Teams/{}/Projects/{}/Documents", scope.team_id, scope.project_id)
}

fn document_path(scope: &ProjectScope, document_id: &str) -> String {
    format!("{}/{}", documents_path(scope), document_id)
}

/// Reads `status` (or `processingStatus`) and an optional message
pub(crate) fn parse_status(body: &Value) -> Result<DocumentStatusReport> {
    let raw = envelope::locate(body, "status")
        .or_else(|| envelope::locate(body, "processingStatus"))
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::invalid_format("missing status"))?;
    let message = envelope::locate(body, "message")
        .or_else(|| envelope::locate(body, "error"))
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(DocumentStatusReport::from_backend(raw, message))
}

impl ApiClient {
    pub async fn list_documents(&self, scope: &ProjectScope) -> Result<Vec<ProjectDocument>> {
        envelope::data(&self.get(&documents_path(scope)).await?)
    }

    pub async fn list_documents_by_type(&self, scope: &ProjectScope, content_type: &str) -> Result<Vec<ProjectDocument>> {
        let body = self
            .get_with_query(&documents_path(scope), &[("type", content_type.to_string())])
            .await?;
        envelope::data(&body)
    }

    pub async fn search_documents(&self, scope: &ProjectScope, query: &str) -> Result<Vec<ProjectDocument>> {
        let path = format!("{}/search", documents_path(scope));
        envelope::data(&self.get_with_query(&path, &[("q", query.to_string())]).await?)
    }

    pub async fn get_document(&self, scope: &ProjectScope, document_id: &str) -> Result<ProjectDocument> {
        envelope::data(&self.get(&document_path(scope, document_id)).await?)
    }

    pub async fn create_document(&self, scope: &ProjectScope, request: &CreateDocumentRequest) -> Result<ProjectDocument> {
        envelope::data(&self.post(&documents_path(scope), request).await?)
    }

    pub async fn update_document(
        &self,
        scope: &ProjectScope,
        document_id: &str,
        request: &UpdateDocumentRequest,
    ) -> Result<ProjectDocument> {
        envelope::data(&self.put(&document_path(scope, document_id), request).await?)
    }

    pub async fn delete_document(&self, scope: &ProjectScope, document_id: &str) -> Result<()> {
        self.delete(&document_path(scope, document_id)).await?;
        info!("Deleted document {}", document_id);
        Ok(())
    }

    pub async fn get_document_content(&self, scope: &ProjectScope, document_id: &str) -> Result<String> {
        let path = format!("{}/content", document_path(scope, document_id));
        let body = self.get(&path).await?;
        envelope::locate(&body, "content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::invalid_format("missing content"))
    }

    pub async fn update_document_content(
        &self,
        scope: &ProjectScope,
        document_id: &str,
        content: &str,
    ) -> Result<ProjectDocument> {
        let path = format!("{}/content", document_path(scope, document_id));
        envelope::data(&self.put(&path, &serde_json::json!({ "content": content })).await?)
    }

    pub async fn download_document(&self, scope: &ProjectScope, document_id: &str) -> Result<Vec<u8>> {
        let path = format!("{}/download", document_path(scope, document_id));
        self.get_bytes(&path).await
    }
}

#[async_trait]
impl DocumentsApi for ApiClient {
    async fn upload_document(
        &self,
        scope: &ProjectScope,
        file: UploadFile,
        metadata: Option<Value>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<ProjectDocument> {
        info!("Uploading {} ({} bytes) to project {}", file.file_name, file.len(), scope.project_id);
        let body = self
            .upload(&documents_path(scope), file, metadata.as_ref(), on_progress)
            .await
            .map_err(|e| {
                error!("Error uploading document: {}", e);
                DOCUMENT_UPLOAD_ERRORS.apply(e)
            })?;

        match envelope::locate(&body, "document") {
            Some(document) => envelope::decode(document),
            None => envelope::data(&body),
        }
    }

    async fn get_document_status(&self, scope: &ProjectScope, document_id: &str) -> Result<DocumentStatusReport> {
        let path = format!("{}/status", document_path(scope, document_id));
        let report = parse_status(&self.get(&path).await?)?;
        debug!("Document {} status: {}", document_id, report.status);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mantis_types::DocumentStatus;
    use serde_json::json;

    #[test]
    fn test_status_vocabulary_is_normalized() {
        let report = parse_status(&json!({ "data": { "status": "processed" } })).unwrap();
        assert_eq!(report.status, DocumentStatus::Completed);

        let report = parse_status(&json!({ "processingStatus": "error", "message": "bad pdf" })).unwrap();
        assert_eq!(report.status, DocumentStatus::Failed);
        assert_eq!(report.message.as_deref(), Some("bad pdf"));
    }

    #[test]
    fn test_missing_status_is_invalid_format() {
        assert!(matches!(
            parse_status(&json!({ "id": "d1" })),
            Err(ApiError::InvalidResponseFormat { .. })
        ));
    }
}
