//! SQLite implementation of the lockbox [`Store`].
//!
//! Timestamps are stored as integer microseconds since the epoch; identifiers as text.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lockbox_storage::{
    CategoryShare, CategoryShareFilter, CategoryShareId, CreateCategoryShareParams,
    CreateCredentialParams, CreateGroupParams, Credential, CredentialId, Group, GroupId,
    GroupMember, HistoryAction, HistoryEntry, MemberRole, NewGroupMember, Store, StoreError,
    UserId, WriteOutcome, HISTORY_LIMIT,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool, Transaction};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (and migrate) a database, e.g. `sqlite://lockbox.db?mode=rwc`.
    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(backend)?
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        Self::connect(options, 5).await
    }

    /// Private in-memory database; a single connection keeps it alive.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(backend)?
            .foreign_keys(true);
        Self::connect(options, 1).await
    }

    async fn connect(options: SqliteConnectOptions, max_connections: u32) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(backend)?;

        MIGRATOR.run(&pool).await.map_err(backend)?;
        tracing::debug!(max_connections, "sqlite store ready");

        Ok(Self { pool })
    }

    /// Close the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Start a transaction holding the write lock, so concurrent writers wait out
    /// `busy_timeout` instead of failing to upgrade a read lock.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(backend)
    }

    async fn load_members(&self, group_id: &str) -> Result<Vec<GroupMember>, StoreError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT user_id, role, added_at, added_by FROM group_members
             WHERE group_id = ? ORDER BY added_at, user_id",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(MemberRow::into_member).collect()
    }

    async fn hydrate_group(&self, row: GroupRow) -> Result<Group, StoreError> {
        let members = self.load_members(&row.id).await?;
        Ok(Group {
            id: parse_id(&row.id)?,
            name: row.name,
            owner_id: UserId(row.owner_id),
            members,
            created_at: from_micros(row.created_at)?,
            updated_at: from_micros(row.updated_at)?,
        })
    }

    async fn hydrate_credential(&self, row: CredentialRow) -> Result<Credential, StoreError> {
        let group_ids = sqlx::query_scalar::<_, String>(
            "SELECT group_id FROM credential_group_shares
             WHERE credential_id = ? ORDER BY added_at, group_id",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?
        .iter()
        .map(|s| parse_id(s))
        .collect::<Result<Vec<GroupId>, _>>()?;

        let history = sqlx::query_as::<_, HistoryRow>(
            "SELECT action, user_id, group_id, group_name, recorded_at FROM credential_history
             WHERE credential_id = ? ORDER BY seq DESC LIMIT ?",
        )
        .bind(&row.id)
        .bind(HISTORY_LIMIT as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?
        .into_iter()
        .map(HistoryRow::into_entry)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Credential {
            id: parse_id(&row.id)?,
            owner_id: row.owner_id.map(UserId),
            user_id: row.user_id.map(UserId),
            title: row.title,
            username: row.username,
            password: row.password,
            url: row.url,
            notes: row.notes,
            category: row.category,
            is_deleted: row.is_deleted != 0,
            shared_with_group_ids: group_ids,
            history,
            last_modified_by: row.last_modified_by.map(UserId),
            created_at: from_micros(row.created_at)?,
            updated_at: from_micros(row.updated_at)?,
        })
    }

    async fn hydrate_credentials(
        &self,
        rows: Vec<CredentialRow>,
    ) -> Result<Vec<Credential>, StoreError> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(self.hydrate_credential(row).await?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    // ───────────────────────────── Groups ─────────────────────────────

    async fn create_group(&self, params: &CreateGroupParams) -> Result<Group, StoreError> {
        let group_id = GroupId::generate();
        let now = now_micros();

        let mut tx = self.begin_write().await?;

        sqlx::query(
            "INSERT INTO groups(id, name, owner_id, created_at, updated_at) VALUES(?, ?, ?, ?, ?)",
        )
        .bind(group_id.to_string())
        .bind(&params.name)
        .bind(params.owner_id.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_insert_err)?;

        sqlx::query(
            "INSERT INTO group_members(group_id, user_id, role, added_at, added_by)
             VALUES(?, ?, ?, ?, ?)",
        )
        .bind(group_id.to_string())
        .bind(params.owner_id.as_str())
        .bind(MemberRole::Admin.as_str())
        .bind(now)
        .bind(params.owner_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_insert_err)?;

        tx.commit().await.map_err(backend)?;

        self.get_group(&group_id).await
    }

    async fn get_group(&self, group_id: &GroupId) -> Result<Group, StoreError> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, name, owner_id, created_at, updated_at FROM groups WHERE id = ?",
        )
        .bind(group_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)?;

        self.hydrate_group(row).await
    }

    async fn list_user_groups(&self, user_id: &UserId) -> Result<Vec<Group>, StoreError> {
        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT g.id, g.name, g.owner_id, g.created_at, g.updated_at
             FROM groups g
             INNER JOIN group_members gm ON g.id = gm.group_id
             WHERE gm.user_id = ?
             ORDER BY g.name, g.id",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut groups = Vec::with_capacity(rows.len());
        for row in rows {
            groups.push(self.hydrate_group(row).await?);
        }
        Ok(groups)
    }

    async fn rename_group(
        &self,
        group_id: &GroupId,
        name: &str,
    ) -> Result<WriteOutcome, StoreError> {
        let result = sqlx::query("UPDATE groups SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(now_micros())
            .bind(group_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        let n = result.rows_affected();
        Ok(WriteOutcome {
            matched: n,
            modified: n,
        })
    }

    async fn delete_group(&self, group_id: &GroupId) -> Result<u64, StoreError> {
        let mut tx = self.begin_write().await?;

        sqlx::query("DELETE FROM group_members WHERE group_id = ?")
            .bind(group_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        let result = sqlx::query("DELETE FROM groups WHERE id = ?")
            .bind(group_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        Ok(result.rows_affected())
    }

    async fn add_group_member(
        &self,
        group_id: &GroupId,
        member: &NewGroupMember,
    ) -> Result<WriteOutcome, StoreError> {
        let now = now_micros();
        let mut tx = self.begin_write().await?;

        if !group_exists(&mut tx, group_id).await? {
            return Ok(WriteOutcome::unmatched());
        }

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO group_members(group_id, user_id, role, added_at, added_by)
             VALUES(?, ?, ?, ?, ?)",
        )
        .bind(group_id.to_string())
        .bind(member.user_id.as_str())
        .bind(member.role.as_str())
        .bind(now)
        .bind(member.added_by.as_str())
        .execute(&mut *tx)
        .await
        .map_err(backend)?
        .rows_affected();

        if inserted > 0 {
            touch_group(&mut tx, group_id, now).await?;
        }

        tx.commit().await.map_err(backend)?;

        Ok(WriteOutcome {
            matched: 1,
            modified: inserted,
        })
    }

    async fn remove_group_member(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<WriteOutcome, StoreError> {
        let now = now_micros();
        let mut tx = self.begin_write().await?;

        if !group_exists(&mut tx, group_id).await? {
            return Ok(WriteOutcome::unmatched());
        }

        let removed = sqlx::query("DELETE FROM group_members WHERE group_id = ? AND user_id = ?")
            .bind(group_id.to_string())
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(backend)?
            .rows_affected();

        if removed > 0 {
            touch_group(&mut tx, group_id, now).await?;
        }

        tx.commit().await.map_err(backend)?;

        Ok(WriteOutcome {
            matched: 1,
            modified: removed,
        })
    }

    async fn set_group_member_role(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
        role: MemberRole,
    ) -> Result<WriteOutcome, StoreError> {
        let now = now_micros();
        let mut tx = self.begin_write().await?;

        let current = sqlx::query_scalar::<_, String>(
            "SELECT role FROM group_members WHERE group_id = ? AND user_id = ?",
        )
        .bind(group_id.to_string())
        .bind(user_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        if current.is_none() {
            return Ok(WriteOutcome::unmatched());
        }

        let changed = sqlx::query(
            "UPDATE group_members SET role = ? WHERE group_id = ? AND user_id = ? AND role <> ?",
        )
        .bind(role.as_str())
        .bind(group_id.to_string())
        .bind(user_id.as_str())
        .bind(role.as_str())
        .execute(&mut *tx)
        .await
        .map_err(backend)?
        .rows_affected();

        if changed > 0 {
            touch_group(&mut tx, group_id, now).await?;
        }

        tx.commit().await.map_err(backend)?;

        Ok(WriteOutcome {
            matched: 1,
            modified: changed,
        })
    }

    // ───────────────────────────── Category shares ─────────────────────────────

    async fn create_category_share(
        &self,
        params: &CreateCategoryShareParams,
    ) -> Result<CategoryShare, StoreError> {
        let id = CategoryShareId::generate();
        let now = now_micros();

        sqlx::query(
            "INSERT INTO category_shares(id, owner_id, category_name, group_id, shared_at, shared_by)
             VALUES(?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(params.owner_id.as_str())
        .bind(&params.category_name)
        .bind(params.group_id.to_string())
        .bind(now)
        .bind(params.shared_by.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;

        Ok(CategoryShare {
            id,
            owner_id: params.owner_id.clone(),
            category_name: params.category_name.clone(),
            group_id: params.group_id,
            shared_at: from_micros(now)?,
            shared_by: params.shared_by.clone(),
        })
    }

    async fn list_category_shares(
        &self,
        filter: &CategoryShareFilter,
    ) -> Result<Vec<CategoryShare>, StoreError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, owner_id, category_name, group_id, shared_at, shared_by
             FROM category_shares WHERE 1 = 1",
        );
        push_share_filter(&mut qb, filter);
        qb.push(" ORDER BY shared_at, id");

        let rows = qb
            .build_query_as::<ShareRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.into_iter().map(ShareRow::into_share).collect()
    }

    async fn list_visible_category_shares(
        &self,
        user_id: &UserId,
        filter: &CategoryShareFilter,
    ) -> Result<Vec<CategoryShare>, StoreError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, owner_id, category_name, group_id, shared_at, shared_by
             FROM category_shares WHERE (owner_id = ",
        );
        qb.push_bind(user_id.0.clone());
        qb.push(" OR group_id IN (SELECT group_id FROM group_members WHERE user_id = ");
        qb.push_bind(user_id.0.clone());
        qb.push("))");
        push_share_filter(&mut qb, filter);
        qb.push(" ORDER BY shared_at, id");

        let rows = qb
            .build_query_as::<ShareRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.into_iter().map(ShareRow::into_share).collect()
    }

    async fn delete_category_shares(
        &self,
        filter: &CategoryShareFilter,
    ) -> Result<u64, StoreError> {
        if filter.is_empty() {
            return Err(StoreError::Backend(
                "refusing to delete category shares without a filter".to_string(),
            ));
        }

        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM category_shares WHERE 1 = 1");
        push_share_filter(&mut qb, filter);

        let result = qb.build().execute(&self.pool).await.map_err(backend)?;
        Ok(result.rows_affected())
    }

    async fn delete_orphaned_category_shares(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM category_shares WHERE group_id NOT IN (SELECT id FROM groups)",
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected())
    }

    // ───────────────────────────── Credentials ─────────────────────────────

    async fn create_credential(
        &self,
        params: &CreateCredentialParams,
    ) -> Result<Credential, StoreError> {
        let id = CredentialId::generate();
        let now = now_micros();

        let mut tx = self.begin_write().await?;

        sqlx::query(
            "INSERT INTO credentials(id, owner_id, title, username, password, url, notes, category,
                                     is_deleted, last_modified_by, created_at, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(params.owner_id.as_str())
        .bind(&params.title)
        .bind(&params.username)
        .bind(&params.password)
        .bind(&params.url)
        .bind(&params.notes)
        .bind(params.category.as_deref())
        .bind(params.owner_id.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_insert_err)?;

        let entry = HistoryEntry::new(HistoryAction::Created, &params.owner_id);
        record_history(&mut tx, &id, &entry).await?;

        tx.commit().await.map_err(backend)?;

        self.get_credential(&id).await
    }

    async fn get_credential(&self, credential_id: &CredentialId) -> Result<Credential, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials c WHERE c.id = ?"
        ))
        .bind(credential_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)?;

        self.hydrate_credential(row).await
    }

    async fn list_owned_credentials(&self, user_id: &UserId) -> Result<Vec<Credential>, StoreError> {
        let rows = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials c
             WHERE c.is_deleted = 0 AND COALESCE(c.owner_id, c.user_id) = ?
             ORDER BY c.created_at, c.id"
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        self.hydrate_credentials(rows).await
    }

    async fn list_credentials_shared_with(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Credential>, StoreError> {
        let rows = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials c
             WHERE c.is_deleted = 0
               AND COALESCE(c.owner_id, c.user_id, '') <> ?
               AND (
                   EXISTS (SELECT 1 FROM category_shares s
                           INNER JOIN group_members m ON m.group_id = s.group_id
                           WHERE m.user_id = ?
                             AND s.owner_id = COALESCE(c.owner_id, c.user_id)
                             AND s.category_name = c.category)
                   OR EXISTS (SELECT 1 FROM credential_group_shares g
                              INNER JOIN group_members m ON m.group_id = g.group_id
                              WHERE m.user_id = ? AND g.credential_id = c.id)
               )
             ORDER BY c.created_at, c.id"
        ))
        .bind(user_id.as_str())
        .bind(user_id.as_str())
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        self.hydrate_credentials(rows).await
    }

    async fn add_credential_group(
        &self,
        credential_id: &CredentialId,
        group_id: &GroupId,
        entry: &HistoryEntry,
    ) -> Result<WriteOutcome, StoreError> {
        let mut tx = self.begin_write().await?;

        if !credential_is_live(&mut tx, credential_id).await? {
            return Ok(WriteOutcome::unmatched());
        }

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO credential_group_shares(credential_id, group_id, added_at)
             VALUES(?, ?, ?)",
        )
        .bind(credential_id.to_string())
        .bind(group_id.to_string())
        .bind(entry.timestamp.timestamp_micros())
        .execute(&mut *tx)
        .await
        .map_err(backend)?
        .rows_affected();

        if inserted > 0 {
            record_history(&mut tx, credential_id, entry).await?;
            mark_modified(&mut tx, credential_id, entry).await?;
        }

        tx.commit().await.map_err(backend)?;

        Ok(WriteOutcome {
            matched: 1,
            modified: inserted,
        })
    }

    async fn remove_credential_group(
        &self,
        credential_id: &CredentialId,
        group_id: &GroupId,
        entry: &HistoryEntry,
    ) -> Result<WriteOutcome, StoreError> {
        let mut tx = self.begin_write().await?;

        if !credential_is_live(&mut tx, credential_id).await? {
            return Ok(WriteOutcome::unmatched());
        }

        let removed = sqlx::query(
            "DELETE FROM credential_group_shares WHERE credential_id = ? AND group_id = ?",
        )
        .bind(credential_id.to_string())
        .bind(group_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(backend)?
        .rows_affected();

        if removed > 0 {
            record_history(&mut tx, credential_id, entry).await?;
            mark_modified(&mut tx, credential_id, entry).await?;
        }

        tx.commit().await.map_err(backend)?;

        Ok(WriteOutcome {
            matched: 1,
            modified: removed,
        })
    }

    async fn remove_group_from_credentials(&self, group_id: &GroupId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM credential_group_shares WHERE group_id = ?")
            .bind(group_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected())
    }

    async fn soft_delete_credential(
        &self,
        credential_id: &CredentialId,
        entry: &HistoryEntry,
    ) -> Result<WriteOutcome, StoreError> {
        let mut tx = self.begin_write().await?;

        let deleted = sqlx::query(
            "UPDATE credentials SET is_deleted = 1, last_modified_by = ?, updated_at = ?
             WHERE id = ? AND is_deleted = 0",
        )
        .bind(entry.user_id.as_str())
        .bind(entry.timestamp.timestamp_micros())
        .bind(credential_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(backend)?
        .rows_affected();

        if deleted > 0 {
            record_history(&mut tx, credential_id, entry).await?;
        }

        tx.commit().await.map_err(backend)?;

        Ok(WriteOutcome {
            matched: deleted,
            modified: deleted,
        })
    }
}

// ───────────────────────────── Helpers ─────────────────────────────

const CREDENTIAL_COLUMNS: &str = "c.id, c.owner_id, c.user_id, c.title, c.username, c.password, \
     c.url, c.notes, c.category, c.is_deleted, c.last_modified_by, c.created_at, c.updated_at";

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn map_insert_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::AlreadyExists,
        _ => backend(e),
    }
}

fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::Backend(format!("invalid timestamp: {}", micros)))
}

fn parse_id<T>(s: &str) -> Result<T, StoreError>
where
    T: FromStr<Err = uuid::Error>,
{
    s.parse::<T>().map_err(backend)
}

fn push_share_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &CategoryShareFilter) {
    if let Some(owner_id) = &filter.owner_id {
        qb.push(" AND owner_id = ");
        qb.push_bind(owner_id.0.clone());
    }
    if let Some(group_id) = &filter.group_id {
        qb.push(" AND group_id = ");
        qb.push_bind(group_id.to_string());
    }
    if let Some(category_name) = &filter.category_name {
        qb.push(" AND category_name = ");
        qb.push_bind(category_name.clone());
    }
}

async fn group_exists(conn: &mut SqliteConnection, group_id: &GroupId) -> Result<bool, StoreError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM groups WHERE id = ?")
        .bind(group_id.to_string())
        .fetch_one(conn)
        .await
        .map_err(backend)?;
    Ok(count > 0)
}

async fn touch_group(
    conn: &mut SqliteConnection,
    group_id: &GroupId,
    now: i64,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE groups SET updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(group_id.to_string())
        .execute(conn)
        .await
        .map_err(backend)?;
    Ok(())
}

async fn credential_is_live(
    conn: &mut SqliteConnection,
    credential_id: &CredentialId,
) -> Result<bool, StoreError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM credentials WHERE id = ? AND is_deleted = 0",
    )
    .bind(credential_id.to_string())
    .fetch_one(conn)
    .await
    .map_err(backend)?;
    Ok(count > 0)
}

/// Prepend a history entry, keeping only the most recent [`HISTORY_LIMIT`].
async fn record_history(
    conn: &mut SqliteConnection,
    credential_id: &CredentialId,
    entry: &HistoryEntry,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO credential_history(credential_id, action, user_id, group_id, group_name, recorded_at)
         VALUES(?, ?, ?, ?, ?, ?)",
    )
    .bind(credential_id.to_string())
    .bind(entry.action.as_str())
    .bind(entry.user_id.as_str())
    .bind(entry.group_id.map(|g| g.to_string()))
    .bind(entry.group_name.as_deref())
    .bind(entry.timestamp.timestamp_micros())
    .execute(&mut *conn)
    .await
    .map_err(backend)?;

    sqlx::query(
        "DELETE FROM credential_history
         WHERE credential_id = ?
           AND seq NOT IN (SELECT seq FROM credential_history
                           WHERE credential_id = ?
                           ORDER BY seq DESC LIMIT ?)",
    )
    .bind(credential_id.to_string())
    .bind(credential_id.to_string())
    .bind(HISTORY_LIMIT as i64)
    .execute(&mut *conn)
    .await
    .map_err(backend)?;

    Ok(())
}

async fn mark_modified(
    conn: &mut SqliteConnection,
    credential_id: &CredentialId,
    entry: &HistoryEntry,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE credentials SET last_modified_by = ?, updated_at = ? WHERE id = ?")
        .bind(entry.user_id.as_str())
        .bind(entry.timestamp.timestamp_micros())
        .bind(credential_id.to_string())
        .execute(conn)
        .await
        .map_err(backend)?;
    Ok(())
}

// ───────────────────────────── Rows ─────────────────────────────

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: String,
    name: String,
    owner_id: String,
    created_at: i64,
    updated_at: i64,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    user_id: String,
    role: String,
    added_at: i64,
    added_by: String,
}

impl MemberRow {
    fn into_member(self) -> Result<GroupMember, StoreError> {
        Ok(GroupMember {
            user_id: UserId(self.user_id),
            role: self.role.parse::<MemberRole>().map_err(backend)?,
            added_at: from_micros(self.added_at)?,
            added_by: UserId(self.added_by),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ShareRow {
    id: String,
    owner_id: String,
    category_name: String,
    group_id: String,
    shared_at: i64,
    shared_by: String,
}

impl ShareRow {
    fn into_share(self) -> Result<CategoryShare, StoreError> {
        Ok(CategoryShare {
            id: parse_id(&self.id)?,
            owner_id: UserId(self.owner_id),
            category_name: self.category_name,
            group_id: parse_id(&self.group_id)?,
            shared_at: from_micros(self.shared_at)?,
            shared_by: UserId(self.shared_by),
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: String,
    owner_id: Option<String>,
    user_id: Option<String>,
    title: String,
    username: String,
    password: String,
    url: String,
    notes: String,
    category: Option<String>,
    is_deleted: i64,
    last_modified_by: Option<String>,
    created_at: i64,
    updated_at: i64,
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    action: String,
    user_id: String,
    group_id: Option<String>,
    group_name: Option<String>,
    recorded_at: i64,
}

impl HistoryRow {
    fn into_entry(self) -> Result<HistoryEntry, StoreError> {
        Ok(HistoryEntry {
            action: self.action.parse::<HistoryAction>().map_err(StoreError::Backend)?,
            user_id: UserId(self.user_id),
            timestamp: from_micros(self.recorded_at)?,
            group_id: self.group_id.as_deref().map(parse_id).transpose()?,
            group_name: self.group_name,
        })
    }
}
