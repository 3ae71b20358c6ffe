//! `SQLite`-backed persistence for canonical datasets.
//!
//! A dataset and its child rows (contacts, keywords, relationships, online
//! resources and archived source documents) are always written together in
//! one transaction. Reprocessing an identifier goes through
//! [`DatasetRepository::replace`], which deletes the previous record by file
//! identifier and inserts the new one; child rows follow via cascade.
//!
//! # Example
//!
//! ```ignore
//! use catalog_ingest_core::{Database, DatasetRepository};
//!
//! let db = Database::new(Path::new("catalog.db")).await?;
//! let repo = DatasetRepository::new(db);
//! let id = repo.replace(&dataset).await?;
//! let stored = repo.get_by_id(id).await?;
//! ```

mod error;
mod rows;
mod sort;

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{Row, SqliteConnection};
use tracing::{debug, instrument};
use uuid::Uuid;

pub use error::{DbErrorKind, RepositoryError};
pub use sort::{DEFAULT_LIST_LIMIT, ListQuery, SortField, SortOrder};

use crate::db::Database;
use crate::model::{Dataset, SourceFormat};
use rows::{
    ContactRow, DatasetRow, DocumentRow, KeywordRow, OnlineResourceRow, RelationshipRow,
    StoredDataset, from_storage, to_storage,
};

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

const DATASET_COLUMNS: &str = r"id, file_identifier, title, abstract, description, lineage,
    publication_date, metadata_date, updated_date, metadata_standard,
    metadata_standard_version, language, resource_status, resource_type,
    bbox_west, bbox_east, bbox_south, bbox_north, temporal_start, temporal_end,
    credit_text, is_accessible_for_free, additional_metadata, created_at, updated_at";

/// Data-access contract used by the pipeline.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Stores `dataset`, replacing any record with the same file identifier.
    async fn replace(&self, dataset: &Dataset) -> Result<Uuid>;

    /// Loads a dataset by its natural key.
    async fn get_by_file_identifier(&self, file_identifier: &str) -> Result<Option<Dataset>>;

    /// Number of stored datasets.
    async fn count(&self) -> Result<i64>;
}

/// Dataset persistence over a [`Database`] pool.
#[derive(Debug, Clone)]
pub struct DatasetRepository {
    db: Database,
}

impl DatasetRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns the underlying database handle.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Inserts a new dataset and all child rows.
    ///
    /// A fresh UUID is assigned when `dataset.id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Invalid`] when the dataset breaks a record
    /// invariant, and [`RepositoryError::Database`] (constraint violation)
    /// when the file identifier is already stored.
    #[instrument(skip(self, dataset), fields(file_identifier = %dataset.file_identifier))]
    pub async fn insert(&self, dataset: &Dataset) -> Result<Uuid> {
        dataset.validate()?;
        let id = dataset.id.unwrap_or_else(Uuid::new_v4);
        let stored = to_storage(dataset, id);

        let mut tx = self.db.pool().begin().await?;
        write_stored(&mut tx, &stored).await?;
        tx.commit().await?;

        debug!(%id, "dataset inserted");
        Ok(id)
    }

    /// Deletes any dataset with the same file identifier, then inserts.
    ///
    /// The previous record's id and creation time carry over unless the
    /// incoming dataset sets its own.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Invalid`] for invalid datasets and
    /// [`RepositoryError::Database`] on storage failure; nothing is changed
    /// in either case.
    #[instrument(skip(self, dataset), fields(file_identifier = %dataset.file_identifier))]
    pub async fn replace(&self, dataset: &Dataset) -> Result<Uuid> {
        dataset.validate()?;
        let file_identifier = dataset.file_identifier.trim();

        let mut tx = self.db.pool().begin().await?;

        let existing = sqlx::query(r"SELECT id, created_at FROM datasets WHERE file_identifier = ?")
            .bind(file_identifier)
            .fetch_optional(&mut *tx)
            .await?;
        let (existing_id, existing_created_at) = match existing {
            Some(row) => {
                sqlx::query(r"DELETE FROM datasets WHERE file_identifier = ?")
                    .bind(file_identifier)
                    .execute(&mut *tx)
                    .await?;
                let id: String = row.get("id");
                let created_at: String = row.get("created_at");
                (Uuid::parse_str(&id).ok(), Some(created_at))
            }
            None => (None, None),
        };

        let id = dataset.id.or(existing_id).unwrap_or_else(Uuid::new_v4);
        let mut stored = to_storage(dataset, id);
        if stored.dataset.created_at.is_none() {
            stored.dataset.created_at = existing_created_at;
        }
        write_stored(&mut tx, &stored).await?;
        tx.commit().await?;

        debug!(%id, replaced = existing_id.is_some(), "dataset stored");
        Ok(id)
    }

    /// Loads a dataset with all child rows by surrogate id.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if a query fails and
    /// [`RepositoryError::Corrupt`] if a stored value cannot be mapped back.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Dataset>> {
        let row = sqlx::query_as::<_, DatasetRow>(&format!(
            "SELECT {DATASET_COLUMNS} FROM datasets WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    /// Loads a dataset with all child rows by file identifier.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_by_id`].
    #[instrument(skip(self))]
    pub async fn get_by_file_identifier(&self, file_identifier: &str) -> Result<Option<Dataset>> {
        let row = sqlx::query_as::<_, DatasetRow>(&format!(
            "SELECT {DATASET_COLUMNS} FROM datasets WHERE file_identifier = ?"
        ))
        .bind(file_identifier.trim())
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    /// Lists datasets in the requested order, one page at a time.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_by_id`].
    #[instrument(skip(self))]
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Dataset>> {
        let sql = format!(
            "SELECT {DATASET_COLUMNS} FROM datasets ORDER BY {} {}, file_identifier ASC LIMIT ? OFFSET ?",
            query.sort.column(),
            query.order.keyword(),
        );
        let rows = sqlx::query_as::<_, DatasetRow>(&sql)
            .bind(i64::from(query.limit))
            .bind(i64::from(query.offset))
            .fetch_all(self.db.pool())
            .await?;

        let mut datasets = Vec::with_capacity(rows.len());
        for row in rows {
            datasets.push(self.load(row).await?);
        }
        Ok(datasets)
    }

    /// Deletes a dataset and its child rows. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(r"DELETE FROM datasets WHERE id = ?")
            .bind(id.to_string())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts stored datasets.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<i64> {
        let result = sqlx::query(r"SELECT COUNT(*) as count FROM datasets")
            .fetch_one(self.db.pool())
            .await?;

        Ok(result.get("count"))
    }

    /// Counts archived source documents per format.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails and
    /// [`RepositoryError::Corrupt`] for an unknown stored format.
    #[instrument(skip(self))]
    pub async fn format_counts(&self) -> Result<BTreeMap<SourceFormat, i64>> {
        let rows = sqlx::query(
            r"SELECT format, COUNT(*) as count FROM metadata_documents GROUP BY format",
        )
        .fetch_all(self.db.pool())
        .await?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let label: String = row.get("format");
            let format = label
                .parse::<SourceFormat>()
                .map_err(|_| RepositoryError::corrupt("format", &label))?;
            counts.insert(format, row.get::<i64, _>("count"));
        }
        Ok(counts)
    }

    async fn load(&self, row: DatasetRow) -> Result<Dataset> {
        let pool = self.db.pool();
        let id = row.id.clone();

        let contacts = sqlx::query_as::<_, ContactRow>(
            r"SELECT role, family_name, given_name, full_name, honorific_prefix,
                     organization_name, organization_identifier, email, name_identifier, address
              FROM contacts WHERE dataset_id = ? ORDER BY position",
        )
        .bind(&id)
        .fetch_all(pool)
        .await?;

        let keywords = sqlx::query_as::<_, KeywordRow>(
            r"SELECT keyword, keyword_type, uri, in_defined_term_set
              FROM keywords WHERE dataset_id = ? ORDER BY position",
        )
        .bind(&id)
        .fetch_all(pool)
        .await?;

        let relationships = sqlx::query_as::<_, RelationshipRow>(
            r"SELECT relation_type, target_dataset_id
              FROM relationships WHERE source_dataset_id = ? ORDER BY position",
        )
        .bind(&id)
        .fetch_all(pool)
        .await?;

        let online_resources = sqlx::query_as::<_, OnlineResourceRow>(
            r"SELECT url, name, description, function, resource_type
              FROM online_resources WHERE dataset_id = ? ORDER BY position",
        )
        .bind(&id)
        .fetch_all(pool)
        .await?;

        let documents = sqlx::query_as::<_, DocumentRow>(
            r"SELECT format, content, file_size, downloaded_at
              FROM metadata_documents WHERE dataset_id = ?
              ORDER BY CASE format WHEN 'xml' THEN 0 WHEN 'json' THEN 1 WHEN 'jsonld' THEN 2 ELSE 3 END",
        )
        .bind(&id)
        .fetch_all(pool)
        .await?;

        from_storage(StoredDataset {
            dataset: row,
            contacts,
            keywords,
            relationships,
            online_resources,
            documents,
        })
    }
}

#[async_trait]
impl DatasetStore for DatasetRepository {
    async fn replace(&self, dataset: &Dataset) -> Result<Uuid> {
        DatasetRepository::replace(self, dataset).await
    }

    async fn get_by_file_identifier(&self, file_identifier: &str) -> Result<Option<Dataset>> {
        DatasetRepository::get_by_file_identifier(self, file_identifier).await
    }

    async fn count(&self) -> Result<i64> {
        DatasetRepository::count(self).await
    }
}

fn position(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

/// Writes a dataset row and all child rows on one connection.
async fn write_stored(conn: &mut SqliteConnection, stored: &StoredDataset) -> Result<()> {
    let d = &stored.dataset;
    sqlx::query(
        r"INSERT INTO datasets (
              id, file_identifier, title, abstract, description, lineage,
              publication_date, metadata_date, updated_date, metadata_standard,
              metadata_standard_version, language, resource_status, resource_type,
              bbox_west, bbox_east, bbox_south, bbox_north, temporal_start, temporal_end,
              credit_text, is_accessible_for_free, additional_metadata, created_at, updated_at
          ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                    COALESCE(?, datetime('now')), datetime('now'))",
    )
    .bind(&d.id)
    .bind(&d.file_identifier)
    .bind(&d.title)
    .bind(&d.abstract_text)
    .bind(&d.description)
    .bind(&d.lineage)
    .bind(&d.publication_date)
    .bind(&d.metadata_date)
    .bind(&d.updated_date)
    .bind(&d.metadata_standard)
    .bind(&d.metadata_standard_version)
    .bind(&d.language)
    .bind(&d.resource_status)
    .bind(&d.resource_type)
    .bind(&d.bbox_west)
    .bind(&d.bbox_east)
    .bind(&d.bbox_south)
    .bind(&d.bbox_north)
    .bind(&d.temporal_start)
    .bind(&d.temporal_end)
    .bind(&d.credit_text)
    .bind(d.is_accessible_for_free)
    .bind(&d.additional_metadata)
    .bind(&d.created_at)
    .execute(&mut *conn)
    .await?;

    for (i, c) in stored.contacts.iter().enumerate() {
        sqlx::query(
            r"INSERT INTO contacts (
                  dataset_id, position, role, family_name, given_name, full_name,
                  honorific_prefix, organization_name, organization_identifier,
                  email, name_identifier, address
              ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&d.id)
        .bind(position(i))
        .bind(&c.role)
        .bind(&c.family_name)
        .bind(&c.given_name)
        .bind(&c.full_name)
        .bind(&c.honorific_prefix)
        .bind(&c.organization_name)
        .bind(&c.organization_identifier)
        .bind(&c.email)
        .bind(&c.name_identifier)
        .bind(&c.address)
        .execute(&mut *conn)
        .await?;
    }

    for (i, k) in stored.keywords.iter().enumerate() {
        sqlx::query(
            r"INSERT INTO keywords (dataset_id, position, keyword, keyword_type, uri, in_defined_term_set)
              VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&d.id)
        .bind(position(i))
        .bind(&k.keyword)
        .bind(&k.keyword_type)
        .bind(&k.uri)
        .bind(&k.in_defined_term_set)
        .execute(&mut *conn)
        .await?;
    }

    for (i, r) in stored.relationships.iter().enumerate() {
        sqlx::query(
            r"INSERT INTO relationships (source_dataset_id, position, relation_type, target_dataset_id)
              VALUES (?, ?, ?, ?)",
        )
        .bind(&d.id)
        .bind(position(i))
        .bind(&r.relation_type)
        .bind(&r.target_dataset_id)
        .execute(&mut *conn)
        .await?;
    }

    for (i, r) in stored.online_resources.iter().enumerate() {
        sqlx::query(
            r"INSERT INTO online_resources (dataset_id, position, url, name, description, function, resource_type)
              VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&d.id)
        .bind(position(i))
        .bind(&r.url)
        .bind(&r.name)
        .bind(&r.description)
        .bind(&r.function)
        .bind(&r.resource_type)
        .execute(&mut *conn)
        .await?;
    }

    for doc in &stored.documents {
        sqlx::query(
            r"INSERT INTO metadata_documents (dataset_id, format, content, file_size, downloaded_at)
              VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&d.id)
        .bind(&doc.format)
        .bind(&doc.content)
        .bind(doc.file_size)
        .bind(&doc.downloaded_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{
        Contact, Keyword, KeywordType, OnlineResource, RawDocument, Relationship, SpatialExtent,
        TemporalExtent,
    };
    use chrono::NaiveDate;
    use serde_json::json;

    async fn repo() -> DatasetRepository {
        DatasetRepository::new(Database::new_in_memory().await.unwrap())
    }

    fn minimal(file_identifier: &str, title: &str) -> Dataset {
        Dataset {
            file_identifier: file_identifier.to_string(),
            title: title.to_string(),
            ..Dataset::default()
        }
    }

    fn full() -> Dataset {
        let at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(12, 30, 0, 125)
            .unwrap();
        let mut extra = serde_json::Map::new();
        extra.insert("funding".into(), json!([{"funderName": "NERC"}]));

        Dataset {
            file_identifier: "eidc-001".into(),
            title: "Soil Carbon 2020".into(),
            abstract_text: Some("Carbon stocks".into()),
            description: Some("Carbon stocks".into()),
            lineage: Some("Surveyed".into()),
            publication_date: NaiveDate::from_ymd_opt(2020, 6, 1),
            metadata_date: Some(at),
            updated_date: NaiveDate::from_ymd_opt(2023, 2, 1),
            metadata_standard: Some("ISO 19115".into()),
            metadata_standard_version: Some("2003".into()),
            language: Some("eng".into()),
            resource_status: Some("Current".into()),
            resource_type: Some("dataset".into()),
            spatial_extent: Some(SpatialExtent {
                west: -5.0,
                east: 2.0,
                south: 50.0,
                north: 55.0,
            }),
            temporal_extent: TemporalExtent::new(NaiveDate::from_ymd_opt(2000, 1, 1), None),
            credit_text: Some("Doe (2020)".into()),
            is_accessible_for_free: Some(true),
            additional_metadata: Some(extra),
            contacts: vec![
                Contact {
                    role: "author".into(),
                    full_name: Some("Doe, Jane".into()),
                    name_identifier: Some("https://orcid.org/0000-0001".into()),
                    address: Some(json!({"city": "Lancaster"})),
                    ..Contact::default()
                },
                Contact {
                    role: "publisher".into(),
                    organization_name: Some("EIDC".into()),
                    ..Contact::default()
                },
            ],
            keywords: vec![
                Keyword {
                    in_defined_term_set: Some("http://vocab/gemet".into()),
                    ..Keyword::new("soil", KeywordType::Theme, Some("http://v/soil".into()))
                },
                Keyword::new("Wales", KeywordType::Place, None),
            ],
            relationships: vec![Relationship {
                relation_type: "memberOf".into(),
                target_dataset_id: "eidc-999".into(),
            }],
            online_resources: vec![OnlineResource {
                url: "https://data/x.zip".into(),
                name: Some("Data".into()),
                function: Some("download".into()),
                ..OnlineResource::default()
            }],
            raw_documents: vec![
                RawDocument::new(SourceFormat::Xml, "<x/>".into(), at),
                RawDocument::new(SourceFormat::Json, "{}".into(), at),
            ],
            ..Dataset::default()
        }
    }

    // ==================== Insert / Load ====================

    #[tokio::test]
    async fn test_round_trip_reproduces_stored_fields() {
        let repo = repo().await;
        let mut input = full();
        input.purpose = Some("legacy purpose".into());
        input.contacts[0].position_name = Some("Lead".into());

        let id = repo.insert(&input).await.unwrap();
        let loaded = repo.get_by_id(id).await.unwrap().unwrap();

        let mut expected = full();
        expected.id = Some(id);
        expected.created_at = loaded.created_at;
        expected.updated_at = loaded.updated_at;
        assert!(loaded.created_at.is_some());
        assert_eq!(loaded, expected);
        assert!(loaded.purpose.is_none());
        assert!(loaded.contacts[0].position_name.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = repo().await;
        assert!(repo.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(
            repo.get_by_file_identifier("eidc-404")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_insert_duplicate_file_identifier_is_constraint_violation() {
        let repo = repo().await;
        repo.insert(&minimal("eidc-001", "A")).await.unwrap();
        let err = repo.insert(&minimal("eidc-001", "B")).await.unwrap_err();
        assert!(err.is_constraint_violation(), "got {err}");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_invalid_dataset_writes_nothing() {
        let repo = repo().await;
        let err = repo.insert(&minimal("eidc-001", " ")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Invalid(_)));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    // ==================== Replace ====================

    #[tokio::test]
    async fn test_replace_keeps_one_row_per_file_identifier() {
        let repo = repo().await;
        let first = repo.replace(&full()).await.unwrap();
        let before = repo.get_by_id(first).await.unwrap().unwrap();

        let mut updated = minimal("eidc-001", "Soil Carbon 2021");
        updated.keywords.push(Keyword::new("peat", KeywordType::Other, None));
        let second = repo.replace(&updated).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.count().await.unwrap(), 1);
        let after = repo.get_by_file_identifier("eidc-001").await.unwrap().unwrap();
        assert_eq!(after.title, "Soil Carbon 2021");
        assert_eq!(after.keywords.len(), 1);
        assert!(after.contacts.is_empty());
        assert!(after.raw_documents.is_empty());
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_failed_replace_leaves_previous_record() {
        let repo = repo().await;
        repo.insert(&minimal("eidc-001", "Original")).await.unwrap();
        let other = repo.insert(&minimal("eidc-002", "Other")).await.unwrap();

        let mut clash = minimal("eidc-001", "Replacement");
        clash.id = Some(other);
        let err = repo.replace(&clash).await.unwrap_err();

        assert!(err.is_constraint_violation(), "got {err}");
        assert_eq!(repo.count().await.unwrap(), 2);
        let kept = repo
            .get_by_file_identifier("eidc-001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.title, "Original");
    }

    #[tokio::test]
    async fn test_replace_inserts_when_absent() {
        let repo = repo().await;
        repo.replace(&minimal("eidc-002", "B")).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    // ==================== Listing / Counting ====================

    #[tokio::test]
    async fn test_list_orders_and_pages() {
        let repo = repo().await;
        for (id, title) in [("eidc-1", "Charlie"), ("eidc-2", "Alpha"), ("eidc-3", "Bravo")] {
            repo.insert(&minimal(id, title)).await.unwrap();
        }

        let query = ListQuery {
            sort: SortField::Title,
            order: SortOrder::Asc,
            limit: 2,
            offset: 0,
        };
        let titles: Vec<_> = repo
            .list(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.title)
            .collect();
        assert_eq!(titles, vec!["Alpha", "Bravo"]);

        let next = ListQuery { offset: 2, ..query };
        let titles: Vec<_> = repo
            .list(&next)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.title)
            .collect();
        assert_eq!(titles, vec!["Charlie"]);

        let desc = ListQuery {
            sort: SortField::FileIdentifier,
            order: SortOrder::Desc,
            ..ListQuery::default()
        };
        let first = repo.list(&desc).await.unwrap().remove(0);
        assert_eq!(first.file_identifier, "eidc-3");
    }

    #[tokio::test]
    async fn test_delete_cascades_children() {
        let repo = repo().await;
        let id = repo.insert(&full()).await.unwrap();

        assert!(repo.delete(id).await.unwrap());
        assert!(!repo.delete(id).await.unwrap());

        let orphans = sqlx::query(r"SELECT COUNT(*) as count FROM contacts")
            .fetch_one(repo.database().pool())
            .await
            .unwrap();
        assert_eq!(orphans.get::<i64, _>("count"), 0);
        assert!(repo.format_counts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_format_counts_per_format() {
        let repo = repo().await;
        repo.insert(&full()).await.unwrap();
        let mut other = minimal("eidc-002", "B");
        other.raw_documents = vec![RawDocument::new(
            SourceFormat::Json,
            "{}".into(),
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )];
        repo.insert(&other).await.unwrap();

        let counts = repo.format_counts().await.unwrap();
        assert_eq!(counts.get(&SourceFormat::Json), Some(&2));
        assert_eq!(counts.get(&SourceFormat::Xml), Some(&1));
        assert_eq!(counts.get(&SourceFormat::Rdf), None);
    }

    // ==================== Trait Seam ====================

    #[tokio::test]
    async fn test_dataset_store_trait_object_delegates() {
        let store: Box<dyn DatasetStore> = Box::new(repo().await);
        store.replace(&minimal("eidc-001", "A")).await.unwrap();
        store.replace(&minimal("eidc-001", "B")).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let stored = store
            .get_by_file_identifier("eidc-001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, "B");
    }
}
