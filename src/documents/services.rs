//! Document access control: ownership checks, @mention auto-sharing and the
//! owned ∪ shared ∪ public visibility set.

use std::collections::HashMap;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    mentions::extract_mentions,
    repo_types::{Document, DocumentFields, DocumentShare, Visibility},
};
use crate::{auth::repo_types::User, error::AppError, store::Store};

#[derive(Debug)]
pub struct DocumentWithShares {
    pub document: Document,
    pub shares: Vec<DocumentShare>,
}

fn validate(fields: &DocumentFields) -> Result<(), AppError> {
    if fields.title.trim().is_empty() {
        return Err(AppError::Validation("Title must not be empty".into()));
    }
    Ok(())
}

/// Deduplicates by id and orders newest first.
pub(crate) fn merge_newest_first(sets: impl IntoIterator<Item = Vec<Document>>) -> Vec<Document> {
    let mut by_id: HashMap<Uuid, Document> = HashMap::new();
    for doc in sets.into_iter().flatten() {
        by_id.entry(doc.id).or_insert(doc);
    }
    let mut docs: Vec<Document> = by_id.into_values().collect();
    docs.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    docs
}

async fn visible(
    store: &dyn Store,
    user: &User,
    query: Option<&str>,
) -> Result<Vec<Document>, AppError> {
    let owned = store.documents_by_author(user.id, query).await?;
    let shared = store.documents_shared_with(user.id, query).await?;
    let public = store.public_documents(query).await?;
    Ok(merge_newest_first([owned, shared, public]))
}

/// Loads a document the user owns, or fails with `NotFound` / `Forbidden`.
async fn owned_document(
    store: &dyn Store,
    user: &User,
    doc_id: Uuid,
) -> Result<Document, AppError> {
    let doc = store
        .find_document(doc_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))?;
    // Shares with can_edit do not grant ownership rights.
    if doc.author_id != user.id {
        warn!(user_id = %user.id, document_id = %doc_id, "not the document author");
        return Err(AppError::Forbidden("Not authorized".into()));
    }
    Ok(doc)
}

/// Shares `doc` read-only with every existing user mentioned in its content.
async fn share_with_mentioned(store: &dyn Store, doc: &Document) -> Result<(), AppError> {
    for username in extract_mentions(&doc.content) {
        let Some(user) = store.find_user_by_username(&username).await? else {
            debug!(%username, "mention of unknown user ignored");
            continue;
        };
        if user.id == doc.author_id {
            continue;
        }
        if store.find_share(doc.id, user.id).await?.is_some() {
            continue;
        }
        if store.insert_share(doc.id, user.id, false).await?.is_some() {
            info!(document_id = %doc.id, user_id = %user.id, "shared via mention");
        }
    }
    Ok(())
}

pub async fn create(
    store: &dyn Store,
    author: &User,
    fields: DocumentFields,
) -> Result<DocumentWithShares, AppError> {
    validate(&fields)?;
    let document = store.insert_document(author.id, &fields).await?;
    info!(document_id = %document.id, author_id = %author.id, "document created");

    share_with_mentioned(store, &document).await?;
    let shares = store.shares_for_document(document.id).await?;
    Ok(DocumentWithShares { document, shares })
}

pub async fn list_visible(store: &dyn Store, user: &User) -> Result<Vec<Document>, AppError> {
    visible(store, user, None).await
}

pub async fn search(
    store: &dyn Store,
    user: &User,
    query: &str,
) -> Result<Vec<Document>, AppError> {
    visible(store, user, Some(query)).await
}

/// The only unauthenticated read; private documents look like missing ones.
pub async fn get_public(store: &dyn Store, doc_id: Uuid) -> Result<DocumentWithShares, AppError> {
    let document = store
        .find_document(doc_id)
        .await?
        .filter(|d| d.visibility == Visibility::Public)
        .ok_or_else(|| AppError::NotFound("Document not found or not public".into()))?;
    let shares = store.shares_for_document(document.id).await?;
    Ok(DocumentWithShares { document, shares })
}

/// Overwrites title, content and visibility; only the author may do this.
pub async fn update(
    store: &dyn Store,
    user: &User,
    doc_id: Uuid,
    fields: DocumentFields,
) -> Result<DocumentWithShares, AppError> {
    owned_document(store, user, doc_id).await?;
    validate(&fields)?;

    let document = store
        .update_document(doc_id, &fields)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))?;
    info!(document_id = %doc_id, "document updated");

    let shares = store.shares_for_document(doc_id).await?;
    Ok(DocumentWithShares { document, shares })
}

pub async fn delete(store: &dyn Store, user: &User, doc_id: Uuid) -> Result<(), AppError> {
    owned_document(store, user, doc_id).await?;
    if !store.delete_document(doc_id).await? {
        return Err(AppError::NotFound("Document not found".into()));
    }
    info!(document_id = %doc_id, "document deleted");
    Ok(())
}

/// Explicitly shares a document the caller owns with `username`.
pub async fn share(
    store: &dyn Store,
    owner: &User,
    doc_id: Uuid,
    username: &str,
    can_edit: bool,
) -> Result<DocumentShare, AppError> {
    let doc = owned_document(store, owner, doc_id).await?;
    let target = store
        .find_user_by_username(username.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if target.id == owner.id {
        return Err(AppError::Validation("Cannot share a document with its author".into()));
    }
    if store.find_share(doc.id, target.id).await?.is_some() {
        return Err(AppError::Conflict("Document already shared with this user".into()));
    }
    let share = store
        .insert_share(doc.id, target.id, can_edit)
        .await?
        .ok_or_else(|| AppError::Conflict("Document already shared with this user".into()))?;
    info!(document_id = %doc.id, user_id = %target.id, can_edit, "document shared");
    Ok(share)
}

/// Shares on a document the caller owns, paired with the recipients.
pub async fn list_shares(
    store: &dyn Store,
    owner: &User,
    doc_id: Uuid,
) -> Result<Vec<(DocumentShare, User)>, AppError> {
    owned_document(store, owner, doc_id).await?;
    let mut out = Vec::new();
    for share in store.shares_for_document(doc_id).await? {
        if let Some(user) = store.find_user_by_id(share.user_id).await? {
            out.push((share, user));
        }
    }
    Ok(out)
}
