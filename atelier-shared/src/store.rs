/// Typed document store
///
/// Every content collection (services, blog posts, portfolio projects, ...)
/// shares one generic operation set (list/get/create/update/remove)
/// instantiated per entity through the [`Document`] trait. Adding a new
/// entity means writing a struct and wiring routes; no new storage logic.
///
/// Collections are persisted as document-shaped tables: a DB-generated
/// UUID, a JSONB `doc` column holding the domain fields, and timestamps.
/// Write-time derivations (slug from the title field, category name/id
/// denormalization) run inside `create`/`update` so every write path gets
/// them.
///
/// # Example
///
/// ```no_run
/// use atelier_shared::models::service::Service;
/// use atelier_shared::store::{Collection, ListQuery};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let services = Collection::<Service>::new(pool);
/// let page = services.list(&ListQuery::default()).await?;
/// println!("{} services ({} total)", page.items.len(), page.total);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::marker::PhantomData;
use tracing::warn;
use uuid::Uuid;

use crate::slug::slugify;

/// Default page size for `list`.
pub const DEFAULT_LIMIT: i64 = 20;

/// Hard ceiling on page size, to prevent excessive data requests.
pub const MAX_LIMIT: i64 = 100;

/// Link from a document to the category collection it denormalizes.
///
/// The document carries both a `category` display name and a `categoryId`
/// reference; whichever side is missing on write is resolved from the
/// linked collection.
#[derive(Debug, Clone, Copy)]
pub struct CategoryLink {
    /// Table name of the category collection
    pub collection: &'static str,
}

/// A storable content entity.
///
/// Implementors are plain serde structs (camelCase JSON). The associated
/// constants describe how the generic operations treat the entity; the
/// defaults mean "no search fields, no slug, no category link".
pub trait Document:
    Serialize + DeserializeOwned + Send + Sync + Unpin + 'static
{
    /// Backing table name
    const COLLECTION: &'static str;

    /// Human-readable entity name used in the activity log
    const ENTITY: &'static str;

    /// Fields matched (case-insensitively, OR-combined) by the `q` filter
    const SEARCHABLE: &'static [&'static str] = &[];

    /// Field from which the slug is derived, if the entity is sluggable
    const SLUG_SOURCE: Option<&'static str> = None;

    /// Denormalized category link, if any
    const CATEGORY: Option<CategoryLink> = None;

    /// Entity-specific write fixups, applied to the merged document just
    /// before validation and persistence.
    fn prepare(doc: &mut Map<String, Value>) {
        let _ = doc;
    }
}

/// A persisted document with its generated envelope fields.
#[derive(Debug, Clone, Serialize)]
pub struct Stored<T> {
    /// Immutable, globally unique per collection
    pub id: Uuid,

    #[serde(flatten)]
    pub doc: T,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// One page of list results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<Stored<T>>,

    /// Filtered count across all pages, not the page's item count
    pub total: i64,

    pub page: i64,
    pub limit: i64,

    /// `ceil(total / limit)`
    pub pages: i64,
}

/// Query parameters accepted by `list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub q: Option<String>,
    pub status: Option<String>,
    pub resolved: Option<bool>,
}

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record with the given id
    #[error("Not found")]
    NotFound,

    /// Duplicate unique field (slug, subscriber email)
    #[error("{0}")]
    Conflict(String),

    /// Body did not deserialize into the entity's shape
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Underlying driver failure
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Normalizes the requested page/limit: page >= 1, limit clamped to
/// [1, MAX_LIMIT] with a default of DEFAULT_LIMIT.
pub fn page_and_limit(query: &ListQuery) -> (i64, i64) {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    (page, limit)
}

/// Page count for a filtered total: `ceil(total / limit)`.
pub fn pages_for(total: i64, limit: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

/// Escapes LIKE metacharacters so `q` is matched literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Resolves a `sort` parameter against the whitelist of sortable fields.
///
/// A leading `-` means descending. Unknown fields fall back to the
/// default `-createdAt` ordering.
fn parse_sort(sort: Option<&str>) -> (&'static str, bool) {
    let sort = sort.unwrap_or("-createdAt");
    let (field, desc) = match sort.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (sort, false),
    };

    let column = match field {
        "createdAt" => "created_at",
        "updatedAt" => "updated_at",
        "publishedAt" => "doc->>'publishedAt'",
        "order" => "(doc->>'order')::numeric",
        "name" => "doc->>'name'",
        "title" => "doc->>'title'",
        _ => return ("created_at", true),
    };

    (column, desc)
}

fn to_map<T: Serialize>(doc: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(doc) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::InvalidDocument(
            "expected a JSON object".to_string(),
        )),
        Err(e) => Err(StoreError::InvalidDocument(e.to_string())),
    }
}

fn from_row<T: Document>(row: PgRow) -> Result<Stored<T>, StoreError> {
    let id: Uuid = row.try_get("id")?;
    let doc: Value = row.try_get("doc")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    let doc: T =
        serde_json::from_value(doc).map_err(|e| StoreError::InvalidDocument(e.to_string()))?;

    Ok(Stored {
        id,
        doc,
        created_at,
        updated_at,
    })
}

/// Maps driver errors, surfacing unique-index violations as conflicts.
fn map_db_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.kind() == sqlx::error::ErrorKind::UniqueViolation {
            let field = db_err
                .constraint()
                .map(|c| {
                    if c.contains("slug") {
                        "slug"
                    } else if c.contains("email") {
                        "email"
                    } else {
                        "field"
                    }
                })
                .unwrap_or("field");
            return StoreError::Conflict(format!("Duplicate {field}"));
        }
    }
    StoreError::Database(err)
}

/// Recomputes the slug from the entity's slug-source field, when present
/// and non-empty. Empty titles leave any existing slug untouched.
fn derive_slug<T: Document>(doc: &mut Map<String, Value>) {
    let Some(source) = T::SLUG_SOURCE else {
        return;
    };
    if let Some(Value::String(title)) = doc.get(source) {
        let slug = slugify(title);
        if !slug.is_empty() {
            doc.insert("slug".to_string(), Value::String(slug));
        }
    }
}

/// A typed handle on one collection's table.
#[derive(Debug, Clone)]
pub struct Collection<T: Document> {
    pool: PgPool,
    _marker: PhantomData<T>,
}

impl<T: Document> Collection<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Lists records matching the query with pagination metadata.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<T>, StoreError> {
        self.list_filtered(query, None).await
    }

    /// Lists records with an additional exact-match condition on one doc
    /// field (used for e.g. applications scoped to a job).
    pub async fn list_by_field(
        &self,
        field: &'static str,
        value: &str,
        query: &ListQuery,
    ) -> Result<Page<T>, StoreError> {
        self.list_filtered(query, Some((field, value))).await
    }

    async fn list_filtered(
        &self,
        query: &ListQuery,
        extra: Option<(&'static str, &str)>,
    ) -> Result<Page<T>, StoreError> {
        let (page, limit) = page_and_limit(query);
        let offset = (page - 1) * limit;

        let mut conditions: Vec<String> = Vec::new();
        let mut bind = 0usize;

        let q_pattern = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty() && !T::SEARCHABLE.is_empty())
            .map(|q| format!("%{}%", escape_like(q)));
        if q_pattern.is_some() {
            bind += 1;
            let ors: Vec<String> = T::SEARCHABLE
                .iter()
                .map(|field| format!("doc->>'{field}' ILIKE ${bind}"))
                .collect();
            conditions.push(format!("({})", ors.join(" OR ")));
        }
        if query.status.is_some() {
            bind += 1;
            conditions.push(format!("doc->>'status' = ${bind}"));
        }
        if query.resolved.is_some() {
            bind += 1;
            conditions.push(format!(
                "COALESCE((doc->>'resolved')::boolean, FALSE) = ${bind}"
            ));
        }
        if let Some((field, _)) = extra {
            bind += 1;
            conditions.push(format!("doc->>'{field}' = ${bind}"));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let (order_column, desc) = parse_sort(query.sort.as_deref());
        let direction = if desc { "DESC" } else { "ASC" };

        let select_sql = format!(
            "SELECT id, doc, created_at, updated_at FROM {table}{where_clause} \
             ORDER BY {order_column} {direction} LIMIT {limit} OFFSET {offset}",
            table = T::COLLECTION,
        );
        let count_sql = format!(
            "SELECT COUNT(*) FROM {table}{where_clause}",
            table = T::COLLECTION,
        );

        let mut select = sqlx::query(&select_sql);
        let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(ref pattern) = q_pattern {
            select = select.bind(pattern);
            count = count.bind(pattern);
        }
        if let Some(ref status) = query.status {
            select = select.bind(status);
            count = count.bind(status);
        }
        if let Some(resolved) = query.resolved {
            select = select.bind(resolved);
            count = count.bind(resolved);
        }
        if let Some((_, value)) = extra {
            select = select.bind(value.to_string());
            count = count.bind(value.to_string());
        }

        let rows = select.fetch_all(&self.pool).await?;
        let total = count.fetch_one(&self.pool).await?;

        let items = rows
            .into_iter()
            .map(from_row::<T>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            page,
            limit,
            pages: pages_for(total, limit),
        })
    }

    /// Fetches one record by id.
    pub async fn get(&self, id: Uuid) -> Result<Stored<T>, StoreError> {
        let sql = format!(
            "SELECT id, doc, created_at, updated_at FROM {} WHERE id = $1",
            T::COLLECTION
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(from_row::<T>).transpose()?.ok_or(StoreError::NotFound)
    }

    /// Inserts a new record, running slug derivation, category resolution,
    /// and the entity's `prepare` hook first.
    pub async fn create(&self, doc: T) -> Result<Stored<T>, StoreError> {
        let mut json = to_map(&doc)?;
        derive_slug::<T>(&mut json);
        self.resolve_category(&mut json).await;
        T::prepare(&mut json);

        // Round-trip through the entity type so only schema fields persist.
        let doc: T = serde_json::from_value(Value::Object(json))
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
        let json = to_map(&doc)?;

        let sql = format!(
            "INSERT INTO {} (doc) VALUES ($1) RETURNING id, doc, created_at, updated_at",
            T::COLLECTION
        );
        let row = sqlx::query(&sql)
            .bind(Value::Object(json))
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;

        from_row(row)
    }

    /// Applies a partial JSON patch to a record.
    ///
    /// The patch is shallow-merged over the current document; the slug is
    /// recomputed only when the patch touches the slug-source field, and
    /// category resolution runs only when the patch touches either side of
    /// the link. Envelope fields (`id`, timestamps) in the patch are
    /// ignored.
    pub async fn update(&self, id: Uuid, patch: Value) -> Result<Stored<T>, StoreError> {
        let Value::Object(mut patch) = patch else {
            return Err(StoreError::InvalidDocument(
                "expected a JSON object".to_string(),
            ));
        };
        patch.remove("id");
        patch.remove("createdAt");
        patch.remove("updatedAt");

        if T::SLUG_SOURCE.is_some_and(|source| patch.contains_key(source)) {
            derive_slug::<T>(&mut patch);
        }
        if T::CATEGORY.is_some()
            && (patch.contains_key("category") || patch.contains_key("categoryId"))
        {
            self.resolve_category(&mut patch).await;
        }

        let current = self.get(id).await?;
        let mut merged = to_map(&current.doc)?;
        for (key, value) in patch {
            merged.insert(key, value);
        }
        T::prepare(&mut merged);

        let doc: T = serde_json::from_value(Value::Object(merged))
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
        let json = to_map(&doc)?;

        let sql = format!(
            "UPDATE {} SET doc = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING id, doc, created_at, updated_at",
            T::COLLECTION
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(Value::Object(json))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;

        row.map(from_row::<T>).transpose()?.ok_or(StoreError::NotFound)
    }

    /// Deletes a record by id.
    pub async fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", T::COLLECTION);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Counts records, optionally restricted to one status.
    pub async fn count(&self, status: Option<&str>) -> Result<i64, StoreError> {
        let sql = match status {
            Some(_) => format!(
                "SELECT COUNT(*) FROM {} WHERE doc->>'status' = $1",
                T::COLLECTION
            ),
            None => format!("SELECT COUNT(*) FROM {}", T::COLLECTION),
        };

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(status) = status {
            query = query.bind(status);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    /// Counts records created since the start of the current day.
    pub async fn count_created_today(&self) -> Result<i64, StoreError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE created_at >= date_trunc('day', NOW())",
            T::COLLECTION
        );
        Ok(sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await?)
    }

    /// Fetches up to `limit` records with the given status, newest first.
    /// Used by the sitemap generator, which needs more than a list page.
    pub async fn all_with_status(
        &self,
        status: &str,
        limit: i64,
    ) -> Result<Vec<Stored<T>>, StoreError> {
        let sql = format!(
            "SELECT id, doc, created_at, updated_at FROM {} \
             WHERE doc->>'status' = $1 ORDER BY updated_at DESC LIMIT $2",
            T::COLLECTION
        );
        let rows = sqlx::query(&sql)
            .bind(status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(from_row::<T>).collect()
    }

    /// Fetches the most recently updated record, if any (SEO settings keep
    /// a single logical row this way).
    pub async fn latest(&self) -> Result<Option<Stored<T>>, StoreError> {
        let sql = format!(
            "SELECT id, doc, created_at, updated_at FROM {} \
             ORDER BY updated_at DESC LIMIT 1",
            T::COLLECTION
        );
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
        row.map(from_row::<T>).transpose()
    }

    /// Fetches every record, newest first. Used by the CSV exports.
    pub async fn all(&self) -> Result<Vec<Stored<T>>, StoreError> {
        let sql = format!(
            "SELECT id, doc, created_at, updated_at FROM {} ORDER BY created_at DESC",
            T::COLLECTION
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(from_row::<T>).collect()
    }

    /// Fills in whichever side of the category link is missing.
    ///
    /// Resolution failure is logged and never blocks the write: the
    /// name-only reference stays usable for display, and the lookup+write
    /// pair is deliberately not transactional.
    async fn resolve_category(&self, doc: &mut Map<String, Value>) {
        let Some(link) = T::CATEGORY else {
            return;
        };

        let has_id = doc.get("categoryId").is_some_and(|v| !v.is_null());
        let has_name = doc.get("category").is_some_and(|v| !v.is_null());

        if has_id && !has_name {
            let id = doc
                .get("categoryId")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok());
            let Some(id) = id else {
                warn!(collection = link.collection, "malformed categoryId; skipping resolution");
                return;
            };

            let sql = format!(
                "SELECT doc->>'name' FROM {} WHERE id = $1",
                link.collection
            );
            match sqlx::query_scalar::<_, Option<String>>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
            {
                Ok(Some(Some(name))) => {
                    doc.insert("category".to_string(), Value::String(name));
                }
                Ok(_) => warn!(
                    collection = link.collection,
                    category_id = %id,
                    "category id did not resolve to a name"
                ),
                Err(e) => warn!(
                    collection = link.collection,
                    error = %e,
                    "category name lookup failed"
                ),
            }
        } else if has_name && !has_id {
            let Some(name) = doc.get("category").and_then(Value::as_str).map(String::from)
            else {
                return;
            };

            let sql = format!(
                "SELECT id FROM {} WHERE doc->>'name' = $1 LIMIT 1",
                link.collection
            );
            match sqlx::query_scalar::<_, Uuid>(&sql)
                .bind(&name)
                .fetch_optional(&self.pool)
                .await
            {
                Ok(Some(id)) => {
                    doc.insert("categoryId".to_string(), Value::String(id.to_string()));
                }
                Ok(None) => warn!(
                    collection = link.collection,
                    name = %name,
                    "category name did not resolve; keeping name-only reference"
                ),
                Err(e) => warn!(
                    collection = link.collection,
                    error = %e,
                    "category id lookup failed"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_and_limit_defaults() {
        let query = ListQuery::default();
        assert_eq!(page_and_limit(&query), (1, DEFAULT_LIMIT));
    }

    #[test]
    fn test_limit_clamped_to_max() {
        let query = ListQuery {
            limit: Some(5000),
            ..Default::default()
        };
        assert_eq!(page_and_limit(&query).1, MAX_LIMIT);
    }

    #[test]
    fn test_limit_clamped_to_min() {
        let query = ListQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(page_and_limit(&query).1, 1);

        let query = ListQuery {
            limit: Some(-7),
            ..Default::default()
        };
        assert_eq!(page_and_limit(&query).1, 1);
    }

    #[test]
    fn test_page_floor_is_one() {
        let query = ListQuery {
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(page_and_limit(&query).0, 1);

        let query = ListQuery {
            page: Some(-3),
            ..Default::default()
        };
        assert_eq!(page_and_limit(&query).0, 1);
    }

    #[test]
    fn test_pages_is_ceiling_of_total_over_limit() {
        assert_eq!(pages_for(0, 20), 0);
        assert_eq!(pages_for(1, 20), 1);
        assert_eq!(pages_for(20, 20), 1);
        assert_eq!(pages_for(21, 20), 2);
        assert_eq!(pages_for(250, 100), 3);
    }

    #[test]
    fn test_escape_like_metacharacters() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_parse_sort_known_fields() {
        assert_eq!(parse_sort(Some("-createdAt")), ("created_at", true));
        assert_eq!(parse_sort(Some("createdAt")), ("created_at", false));
        assert_eq!(parse_sort(Some("order")), ("(doc->>'order')::numeric", false));
        assert_eq!(parse_sort(Some("name")), ("doc->>'name'", false));
    }

    #[test]
    fn test_parse_sort_unknown_field_falls_back_to_default() {
        assert_eq!(parse_sort(Some("passwordHash")), ("created_at", true));
        assert_eq!(parse_sort(Some("doc; DROP TABLE users")), ("created_at", true));
        assert_eq!(parse_sort(None), ("created_at", true));
    }
}
