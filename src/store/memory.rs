use std::sync::Mutex;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::Store;
use crate::{
    auth::repo_types::User,
    documents::repo_types::{Document, DocumentFields, DocumentShare, Visibility},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    documents: Vec<Document>,
    shares: Vec<DocumentShare>,
    last_stamp: Option<OffsetDateTime>,
}

impl Tables {
    // Strictly increasing so insertion order is recoverable from timestamps.
    fn stamp(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let next = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(next);
        next
    }
}

/// Case-insensitive substring match on title or content, as `ILIKE '%q%'` does.
fn matches_query(doc: &Document, query: &str) -> bool {
    let needle = query.to_lowercase();
    doc.title.to_lowercase().contains(&needle) || doc.content.to_lowercase().contains(&needle)
}

fn filtered<'a>(
    docs: impl Iterator<Item = &'a Document>,
    query: Option<&str>,
) -> Vec<Document> {
    docs.filter(|d| query.map_or(true, |q| matches_query(d, q)))
        .cloned()
        .collect()
}

/// In-memory store mirroring the Postgres schema constraints.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn share_count(&self, document_id: Uuid) -> usize {
        let t = self.tables.lock().unwrap();
        t.shares.iter().filter(|s| s.document_id == document_id).count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|u| u.email == email || u.username == username) {
            anyhow::bail!("duplicate key value violates unique constraint on users");
        }
        let created_at = t.stamp();
        let user = User {
            id: Uuid::new_v4(),
            email: email.into(),
            username: username.into(),
            password_hash: password_hash.into(),
            created_at,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn insert_document(
        &self,
        author_id: Uuid,
        fields: &DocumentFields,
    ) -> anyhow::Result<Document> {
        let mut t = self.tables.lock().unwrap();
        if !t.users.iter().any(|u| u.id == author_id) {
            anyhow::bail!("documents.author_id references a missing user");
        }
        let created_at = t.stamp();
        let doc = Document {
            id: Uuid::new_v4(),
            title: fields.title.clone(),
            content: fields.content.clone(),
            author_id,
            visibility: fields.visibility,
            created_at,
            updated_at: None,
        };
        t.documents.push(doc.clone());
        Ok(doc)
    }

    async fn find_document(&self, id: Uuid) -> anyhow::Result<Option<Document>> {
        let t = self.tables.lock().unwrap();
        Ok(t.documents.iter().find(|d| d.id == id).cloned())
    }

    async fn update_document(
        &self,
        id: Uuid,
        fields: &DocumentFields,
    ) -> anyhow::Result<Option<Document>> {
        let mut t = self.tables.lock().unwrap();
        let stamp = t.stamp();
        let Some(doc) = t.documents.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        doc.title = fields.title.clone();
        doc.content = fields.content.clone();
        doc.visibility = fields.visibility;
        doc.updated_at = Some(stamp);
        Ok(Some(doc.clone()))
    }

    async fn delete_document(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.documents.len();
        t.documents.retain(|d| d.id != id);
        t.shares.retain(|s| s.document_id != id);
        Ok(t.documents.len() < before)
    }

    async fn documents_by_author(
        &self,
        author_id: Uuid,
        query: Option<&str>,
    ) -> anyhow::Result<Vec<Document>> {
        let t = self.tables.lock().unwrap();
        Ok(filtered(
            t.documents.iter().filter(|d| d.author_id == author_id),
            query,
        ))
    }

    async fn documents_shared_with(
        &self,
        user_id: Uuid,
        query: Option<&str>,
    ) -> anyhow::Result<Vec<Document>> {
        let t = self.tables.lock().unwrap();
        let shared = t.documents.iter().filter(|d| {
            t.shares
                .iter()
                .any(|s| s.document_id == d.id && s.user_id == user_id)
        });
        Ok(filtered(shared, query))
    }

    async fn public_documents(&self, query: Option<&str>) -> anyhow::Result<Vec<Document>> {
        let t = self.tables.lock().unwrap();
        Ok(filtered(
            t.documents
                .iter()
                .filter(|d| d.visibility == Visibility::Public),
            query,
        ))
    }

    async fn find_share(
        &self,
        document_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<DocumentShare>> {
        let t = self.tables.lock().unwrap();
        Ok(t.shares
            .iter()
            .find(|s| s.document_id == document_id && s.user_id == user_id)
            .cloned())
    }

    async fn insert_share(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        can_edit: bool,
    ) -> anyhow::Result<Option<DocumentShare>> {
        let mut t = self.tables.lock().unwrap();
        if !t.documents.iter().any(|d| d.id == document_id) {
            anyhow::bail!("document_shares.document_id references a missing document");
        }
        if !t.users.iter().any(|u| u.id == user_id) {
            anyhow::bail!("document_shares.user_id references a missing user");
        }
        if t
            .shares
            .iter()
            .any(|s| s.document_id == document_id && s.user_id == user_id)
        {
            return Ok(None);
        }
        let share = DocumentShare {
            id: Uuid::new_v4(),
            document_id,
            user_id,
            can_edit,
        };
        t.shares.push(share.clone());
        Ok(Some(share))
    }

    async fn shares_for_document(&self, document_id: Uuid) -> anyhow::Result<Vec<DocumentShare>> {
        let t = self.tables.lock().unwrap();
        Ok(t.shares
            .iter()
            .filter(|s| s.document_id == document_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_query_is_case_insensitive_on_title_and_content() {
        let doc = Document {
            id: Uuid::new_v4(),
            title: "Weekly Notes".into(),
            content: "say hello to the team".into(),
            author_id: Uuid::new_v4(),
            visibility: Visibility::Private,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        };
        assert!(matches_query(&doc, "HELLO"));
        assert!(matches_query(&doc, "weekly"));
        assert!(matches_query(&doc, ""));
        assert!(!matches_query(&doc, "goodbye"));
    }
}
