use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Document, DocumentFields, DocumentShare, Visibility};

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub visibility: Visibility,
}

/// Full replacement of a document's fields. A missing `visibility` means
/// private, the same default `CreateDocumentRequest` applies.
#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub visibility: Visibility,
}

impl CreateDocumentRequest {
    pub fn into_fields(self) -> DocumentFields {
        DocumentFields {
            title: self.title,
            content: self.content,
            visibility: self.visibility,
        }
    }
}

impl UpdateDocumentRequest {
    pub fn into_fields(self) -> DocumentFields {
        DocumentFields {
            title: self.title,
            content: self.content,
            visibility: self.visibility,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub username: String,
    #[serde(default)]
    pub can_edit: bool,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub can_edit: bool,
}

impl From<DocumentShare> for ShareResponse {
    fn from(s: DocumentShare) -> Self {
        Self {
            id: s.id,
            document_id: s.document_id,
            user_id: s.user_id,
            can_edit: s.can_edit,
        }
    }
}

/// A share as listed to the document's author.
#[derive(Debug, Serialize)]
pub struct SharedWith {
    pub user_id: Uuid,
    pub username: String,
    pub can_edit: bool,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub visibility: Visibility,
    pub author_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<Vec<ShareResponse>>,
}

impl DocumentResponse {
    pub fn with_shares(doc: Document, shares: Vec<DocumentShare>) -> Self {
        Self {
            shares: Some(shares.into_iter().map(ShareResponse::from).collect()),
            ..Self::from(doc)
        }
    }
}

impl From<Document> for DocumentResponse {
    fn from(d: Document) -> Self {
        Self {
            id: d.id,
            title: d.title,
            content: d.content,
            visibility: d.visibility,
            author_id: d.author_id,
            created_at: d.created_at,
            updated_at: d.updated_at,
            shares: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub detail: String,
}
