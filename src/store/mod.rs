use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    documents::repo_types::{Document, DocumentFields, DocumentShare},
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Persistence for users, documents and shares.
///
/// Every `query` argument is an optional case-insensitive substring filter on
/// title or content; `None` disables filtering.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> anyhow::Result<User>;

    async fn insert_document(
        &self,
        author_id: Uuid,
        fields: &DocumentFields,
    ) -> anyhow::Result<Document>;
    async fn find_document(&self, id: Uuid) -> anyhow::Result<Option<Document>>;
    /// Overwrites the editable fields and stamps `updated_at`.
    async fn update_document(
        &self,
        id: Uuid,
        fields: &DocumentFields,
    ) -> anyhow::Result<Option<Document>>;
    /// Removes the document and all of its shares. Returns false if it did not exist.
    async fn delete_document(&self, id: Uuid) -> anyhow::Result<bool>;

    async fn documents_by_author(
        &self,
        author_id: Uuid,
        query: Option<&str>,
    ) -> anyhow::Result<Vec<Document>>;
    async fn documents_shared_with(
        &self,
        user_id: Uuid,
        query: Option<&str>,
    ) -> anyhow::Result<Vec<Document>>;
    async fn public_documents(&self, query: Option<&str>) -> anyhow::Result<Vec<Document>>;

    async fn find_share(
        &self,
        document_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<DocumentShare>>;
    /// Returns `None` when a share for the pair already exists.
    async fn insert_share(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        can_edit: bool,
    ) -> anyhow::Result<Option<DocumentShare>>;
    async fn shares_for_document(&self, document_id: Uuid) -> anyhow::Result<Vec<DocumentShare>>;
}
