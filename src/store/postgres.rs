use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::Store;
use crate::{
    auth::repo_types::User,
    documents::repo_types::{Document, DocumentFields, DocumentRow, DocumentShare},
};

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pub db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Builds an ILIKE pattern matching `query` anywhere, with wildcards escaped.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 2);
    out.push('%');
    for ch in query.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

fn into_documents(rows: Vec<DocumentRow>) -> anyhow::Result<Vec<Document>> {
    rows.into_iter().map(Document::try_from).collect()
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, username, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, username, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn insert_document(
        &self,
        author_id: Uuid,
        fields: &DocumentFields,
    ) -> anyhow::Result<Document> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (id, title, content, author_id, visibility)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, content, author_id, visibility, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&fields.title)
        .bind(&fields.content)
        .bind(author_id)
        .bind(fields.visibility.as_str())
        .fetch_one(&self.db)
        .await
        .context("insert document")?;
        row.try_into()
    }

    async fn find_document(&self, id: Uuid) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, title, content, author_id, visibility, created_at, updated_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find document")?;
        row.map(Document::try_from).transpose()
    }

    async fn update_document(
        &self,
        id: Uuid,
        fields: &DocumentFields,
    ) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            UPDATE documents
               SET title = $2, content = $3, visibility = $4, updated_at = now()
             WHERE id = $1
            RETURNING id, title, content, author_id, visibility, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.content)
        .bind(fields.visibility.as_str())
        .fetch_optional(&self.db)
        .await
        .context("update document")?;
        row.map(Document::try_from).transpose()
    }

    async fn delete_document(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut tx = self.db.begin().await.context("begin delete document")?;

        sqlx::query("DELETE FROM document_shares WHERE document_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("delete document shares")?;

        let deleted = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("delete document")?
            .rows_affected();

        tx.commit().await.context("commit delete document")?;
        Ok(deleted > 0)
    }

    async fn documents_by_author(
        &self,
        author_id: Uuid,
        query: Option<&str>,
    ) -> anyhow::Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, title, content, author_id, visibility, created_at, updated_at
              FROM documents
             WHERE author_id = $1
               AND ($2::text IS NULL
                    OR title ILIKE $2 ESCAPE '\'
                    OR content ILIKE $2 ESCAPE '\')
             ORDER BY created_at DESC
            "#,
        )
        .bind(author_id)
        .bind(query.map(like_pattern))
        .fetch_all(&self.db)
        .await
        .context("list documents by author")?;
        into_documents(rows)
    }

    async fn documents_shared_with(
        &self,
        user_id: Uuid,
        query: Option<&str>,
    ) -> anyhow::Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT d.id, d.title, d.content, d.author_id, d.visibility, d.created_at, d.updated_at
              FROM documents d
              JOIN document_shares s ON s.document_id = d.id
             WHERE s.user_id = $1
               AND ($2::text IS NULL
                    OR d.title ILIKE $2 ESCAPE '\'
                    OR d.content ILIKE $2 ESCAPE '\')
             ORDER BY d.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(query.map(like_pattern))
        .fetch_all(&self.db)
        .await
        .context("list documents shared with user")?;
        into_documents(rows)
    }

    async fn public_documents(&self, query: Option<&str>) -> anyhow::Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, title, content, author_id, visibility, created_at, updated_at
              FROM documents
             WHERE visibility = 'public'
               AND ($1::text IS NULL
                    OR title ILIKE $1 ESCAPE '\'
                    OR content ILIKE $1 ESCAPE '\')
             ORDER BY created_at DESC
            "#,
        )
        .bind(query.map(like_pattern))
        .fetch_all(&self.db)
        .await
        .context("list public documents")?;
        into_documents(rows)
    }

    async fn find_share(
        &self,
        document_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<DocumentShare>> {
        let share = sqlx::query_as::<_, DocumentShare>(
            r#"
            SELECT id, document_id, user_id, can_edit
              FROM document_shares
             WHERE document_id = $1 AND user_id = $2
            "#,
        )
        .bind(document_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find share")?;
        Ok(share)
    }

    async fn insert_share(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        can_edit: bool,
    ) -> anyhow::Result<Option<DocumentShare>> {
        // The unique (document_id, user_id) constraint settles concurrent inserts.
        let share = sqlx::query_as::<_, DocumentShare>(
            r#"
            INSERT INTO document_shares (id, document_id, user_id, can_edit)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (document_id, user_id) DO NOTHING
            RETURNING id, document_id, user_id, can_edit
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(document_id)
        .bind(user_id)
        .bind(can_edit)
        .fetch_optional(&self.db)
        .await
        .context("insert share")?;
        Ok(share)
    }

    async fn shares_for_document(&self, document_id: Uuid) -> anyhow::Result<Vec<DocumentShare>> {
        let shares = sqlx::query_as::<_, DocumentShare>(
            r#"
            SELECT id, document_id, user_id, can_edit
              FROM document_shares
             WHERE document_id = $1
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.db)
        .await
        .context("list shares for document")?;
        Ok(shares)
    }
}
