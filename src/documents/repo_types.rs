use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Access class of a document.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            other => anyhow::bail!("unknown visibility {other:?}"),
        }
    }
}

/// Raw `documents` row; visibility is stored as text.
#[derive(Debug, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub visibility: String,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub visibility: Visibility,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = anyhow::Error;

    fn try_from(r: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            title: r.title,
            content: r.content,
            author_id: r.author_id,
            visibility: r.visibility.parse()?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Editable fields of a document, used for both insert and update.
#[derive(Debug, Clone)]
pub struct DocumentFields {
    pub title: String,
    pub content: String,
    pub visibility: Visibility,
}

/// Grants one user visibility (and optionally edit rights) on one document.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DocumentShare {
    pub id: Uuid,
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub can_edit: bool,
}
