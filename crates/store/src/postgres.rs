use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    FieldPatch, Marathon, MarathonFilter, MarathonId, NewMarathon, NewRegistration, Registration,
    RegistrationFilter, RegistrationId, Result, SortOrder,
    document::{MARATHON_PROTECTED_FIELDS, REGISTRATION_PROTECTED_FIELDS},
    store::{MarathonStore, RegistrationStore},
};

/// PostgreSQL-backed store for both collections.
///
/// Typed fields live in columns; the opaque descriptive fields live in a
/// `doc` JSONB column. Counter adjustment is a single UPDATE, so individual
/// increments are atomic at the field level. There is deliberately no
/// foreign key from registrations to marathons: the coordinator owns the
/// cross-collection relationship and tolerates orphans.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_marathon(row: PgRow) -> Result<Marathon> {
        let doc: Value = row.try_get("doc")?;
        let fields: Map<String, Value> = serde_json::from_value(doc)?;

        Ok(Marathon {
            id: MarathonId::from_uuid(row.try_get::<Uuid, _>("id")?),
            creator_email: row.try_get("creator_email")?,
            created_at: row.try_get("created_at")?,
            total_registration_count: row.try_get("total_registration_count")?,
            fields,
        })
    }

    fn row_to_registration(row: PgRow) -> Result<Registration> {
        let doc: Value = row.try_get("doc")?;
        let fields: Map<String, Value> = serde_json::from_value(doc)?;

        Ok(Registration {
            id: RegistrationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            marathon_id: MarathonId::from_uuid(row.try_get::<Uuid, _>("marathon_id")?),
            email: row.try_get("email")?,
            marathon_title: row.try_get("marathon_title")?,
            fields,
        })
    }
}

/// Escapes LIKE metacharacters and wraps the term for substring matching.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Removes protected keys, then splits off a typed column value by key.
/// Non-string values for typed string columns are dropped.
fn take_string_field(patch: &mut FieldPatch, key: &str) -> Option<String> {
    patch
        .remove(key)
        .and_then(|v| v.as_str().map(String::from))
}

#[async_trait]
impl MarathonStore for PostgresStore {
    async fn list_marathons(&self, filter: MarathonFilter) -> Result<Vec<Marathon>> {
        let mut sql = String::from(
            "SELECT id, creator_email, created_at, total_registration_count, doc FROM marathons",
        );
        let mut param_count = 0;

        if filter.creator_email.is_some() {
            param_count += 1;
            sql.push_str(&format!(" WHERE creator_email = ${param_count}"));
        }

        sql.push_str(match filter.sort {
            SortOrder::Ascending => " ORDER BY created_at ASC, id ASC",
            SortOrder::Descending => " ORDER BY created_at DESC, id DESC",
        });

        if filter.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        let mut query = sqlx::query(&sql);
        if let Some(email) = filter.creator_email {
            query = query.bind(email);
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit as i64);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_marathon).collect()
    }

    async fn get_marathon(&self, id: MarathonId) -> Result<Option<Marathon>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, creator_email, created_at, total_registration_count, doc
            FROM marathons
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_marathon).transpose()
    }

    async fn insert_marathon(&self, new: NewMarathon) -> Result<MarathonId> {
        let new = new.sanitized();
        let id = MarathonId::new();
        sqlx::query(
            r#"
            INSERT INTO marathons (id, creator_email, created_at, total_registration_count, doc)
            VALUES ($1, $2, $3, 0, $4)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&new.creator_email)
        .bind(Utc::now())
        .bind(Value::Object(new.fields))
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_marathon_fields(&self, id: MarathonId, patch: FieldPatch) -> Result<u64> {
        let mut patch = patch;
        for key in MARATHON_PROTECTED_FIELDS {
            patch.remove(*key);
        }
        let creator_email = take_string_field(&mut patch, "creatorEmail");

        let result = sqlx::query(
            r#"
            UPDATE marathons
            SET creator_email = COALESCE($2, creator_email),
                doc = doc || $3
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(creator_email)
        .bind(Value::Object(patch))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_marathon(&self, id: MarathonId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM marathons WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn adjust_registration_count(&self, id: MarathonId, delta: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE marathons
            SET total_registration_count = total_registration_count + $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(delta)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn set_registration_count(&self, id: MarathonId, value: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE marathons SET total_registration_count = $2 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl RegistrationStore for PostgresStore {
    async fn list_registrations(&self, filter: RegistrationFilter) -> Result<Vec<Registration>> {
        let mut sql = String::from(
            "SELECT id, marathon_id, email, marathon_title, doc FROM registrations WHERE 1=1",
        );
        let mut param_count = 0;

        if filter.email.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND email = ${param_count}"));
        }
        if filter.title_search.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND marathon_title ILIKE ${param_count}"));
        }

        let mut query = sqlx::query(&sql);
        if let Some(email) = filter.email {
            query = query.bind(email);
        }
        if let Some(term) = filter.title_search {
            query = query.bind(like_pattern(&term));
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_registration).collect()
    }

    async fn get_registration(&self, id: RegistrationId) -> Result<Option<Registration>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, marathon_id, email, marathon_title, doc
            FROM registrations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_registration).transpose()
    }

    async fn insert_registration(&self, new: NewRegistration) -> Result<RegistrationId> {
        let new = new.sanitized();
        let id = RegistrationId::new();
        sqlx::query(
            r#"
            INSERT INTO registrations (id, marathon_id, email, marathon_title, doc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.as_uuid())
        .bind(new.marathon_id.as_uuid())
        .bind(&new.email)
        .bind(&new.marathon_title)
        .bind(Value::Object(new.fields))
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_registration_fields(
        &self,
        id: RegistrationId,
        patch: FieldPatch,
    ) -> Result<u64> {
        let mut patch = patch;
        for key in REGISTRATION_PROTECTED_FIELDS {
            patch.remove(*key);
        }
        let email = take_string_field(&mut patch, "email");
        let marathon_title = take_string_field(&mut patch, "marathonTitle");

        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET email = COALESCE($2, email),
                marathon_title = COALESCE($3, marathon_title),
                doc = doc || $4
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(email)
        .bind(marathon_title)
        .bind(Value::Object(patch))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_registration(&self, id: RegistrationId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count_for_marathon(&self, marathon_id: MarathonId) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE marathon_id = $1")
                .bind(marathon_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }
}
