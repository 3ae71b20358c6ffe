//! Listing order and paging.

use std::fmt;
use std::str::FromStr;

/// Column a dataset listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Title,
    FileIdentifier,
    PublicationDate,
    MetadataDate,
    #[default]
    CreatedAt,
}

impl SortField {
    /// Returns the user-facing name, also accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::FileIdentifier => "file_identifier",
            Self::PublicationDate => "publication_date",
            Self::MetadataDate => "metadata_date",
            Self::CreatedAt => "created_at",
        }
    }

    /// Column name in the `datasets` table.
    pub(crate) fn column(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "file_identifier" => Ok(Self::FileIdentifier),
            "publication_date" => Ok(Self::PublicationDate),
            "metadata_date" => Ok(Self::MetadataDate),
            "created_at" => Ok(Self::CreatedAt),
            other => Err(format!(
                "unknown sort field: {other} (expected title, file_identifier, publication_date, metadata_date or created_at)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("unknown sort order: {s} (expected asc or desc)")),
        }
    }
}

/// Default page size for dataset listings.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Paging and ordering for [`super::DatasetRepository::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub sort: SortField,
    pub order: SortOrder,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            sort: SortField::default(),
            order: SortOrder::default(),
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}
