//! PostgreSQL work package store
//!
//! Expected schema (abridged):
//!
//! ```sql
//! CREATE TABLE work_packages (
//!     id BIGSERIAL PRIMARY KEY,
//!     sti_type TEXT NOT NULL,            -- 'Issue' | 'PlanningElement'
//!     project_id BIGINT NOT NULL REFERENCES projects,
//!     type_id BIGINT, subject TEXT NOT NULL, description TEXT,
//!     author_id BIGINT, status_id BIGINT, priority_id BIGINT,
//!     assigned_to_id BIGINT, responsible_id BIGINT, fixed_version_id BIGINT,
//!     category_id BIGINT, parent_id BIGINT REFERENCES work_packages,
//!     start_date DATE, due_date DATE, estimated_hours DOUBLE PRECISION,
//!     done_ratio INTEGER NOT NULL DEFAULT 0,
//!     created_at TIMESTAMPTZ, updated_at TIMESTAMPTZ, deleted_at TIMESTAMPTZ,
//!     lock_version INTEGER NOT NULL DEFAULT 0
//! );
//! CREATE TABLE watchers (watchable_id BIGINT, user_id BIGINT);
//! CREATE TABLE enabled_modules (project_id BIGINT, name TEXT);
//! CREATE TABLE projects_types (project_id BIGINT, type_id BIGINT);
//! CREATE TABLE relations (id BIGSERIAL, from_id BIGINT, to_id BIGINT,
//!                         relation_type TEXT, delay INTEGER);
//! CREATE TABLE journals (id BIGSERIAL, journable_id BIGINT, version INTEGER,
//!                        user_id BIGINT, notes TEXT, details JSONB,
//!                        created_at TIMESTAMPTZ);
//! ```
//!
//! Priorities live in `enumerations` with `type = 'IssuePriority'`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use op_core::traits::Id;
use op_journals::{Journal, JournalVersion};
use op_models::user::UserStatus;
use op_models::{
    Priority, Project, Relation, RelationKind, Status, Type, User, Version, VersionStatus, WorkPackage,
    WorkPackageKind,
};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;

use crate::repository::{RepositoryError, RepositoryResult};
use crate::store::{PlanningElementScope, WorkPackageStore};

const WORK_PACKAGE_COLUMNS: &str = r#"
    wp.id, wp.sti_type, wp.project_id, wp.type_id, wp.subject, wp.description,
    wp.author_id, wp.status_id, wp.priority_id, wp.assigned_to_id,
    wp.responsible_id, wp.fixed_version_id, wp.category_id, wp.parent_id,
    wp.start_date, wp.due_date, wp.estimated_hours, wp.done_ratio,
    ARRAY(SELECT w.user_id FROM watchers w WHERE w.watchable_id = wp.id ORDER BY w.user_id)
        AS watcher_user_ids,
    wp.created_at, wp.updated_at, wp.deleted_at, wp.lock_version
"#;

const PROJECT_COLUMNS: &str = r#"
    p.id, p.identifier, p.name, p.description, p.is_public, p.active,
    ARRAY(SELECT m.name FROM enabled_modules m WHERE m.project_id = p.id ORDER BY m.name)
        AS enabled_modules,
    ARRAY(SELECT t.type_id FROM projects_types t WHERE t.project_id = p.id ORDER BY t.type_id)
        AS type_ids,
    p.created_at, p.updated_at
"#;

/// Work package database row
#[derive(Debug, Clone, FromRow)]
struct WorkPackageRow {
    id: i64,
    sti_type: String,
    project_id: i64,
    type_id: Option<i64>,
    subject: String,
    description: Option<String>,
    author_id: Option<i64>,
    status_id: Option<i64>,
    priority_id: Option<i64>,
    assigned_to_id: Option<i64>,
    responsible_id: Option<i64>,
    fixed_version_id: Option<i64>,
    category_id: Option<i64>,
    parent_id: Option<i64>,
    start_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    estimated_hours: Option<f64>,
    done_ratio: i32,
    watcher_user_ids: Vec<i64>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    lock_version: i32,
}

impl TryFrom<WorkPackageRow> for WorkPackage {
    type Error = RepositoryError;

    fn try_from(row: WorkPackageRow) -> Result<Self, Self::Error> {
        let kind: WorkPackageKind = row
            .sti_type
            .parse()
            .map_err(|_| RepositoryError::Corrupt(format!("work package {} has sti_type {:?}", row.id, row.sti_type)))?;

        Ok(WorkPackage {
            id: Some(row.id),
            kind,
            project_id: row.project_id,
            type_id: row.type_id,
            subject: row.subject,
            description: row.description,
            author_id: row.author_id,
            status_id: row.status_id,
            priority_id: row.priority_id,
            assigned_to_id: row.assigned_to_id,
            responsible_id: row.responsible_id,
            fixed_version_id: row.fixed_version_id,
            category_id: row.category_id,
            parent_id: row.parent_id,
            start_date: row.start_date,
            due_date: row.due_date,
            estimated_hours: row.estimated_hours,
            done_ratio: row.done_ratio,
            watcher_user_ids: row.watcher_user_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
            lock_version: row.lock_version,
        })
    }
}

fn work_packages(rows: Vec<WorkPackageRow>) -> RepositoryResult<Vec<WorkPackage>> {
    rows.into_iter().map(WorkPackage::try_from).collect()
}

#[derive(Debug, Clone, FromRow)]
struct ProjectRow {
    id: i64,
    identifier: String,
    name: String,
    description: Option<String>,
    is_public: bool,
    active: bool,
    enabled_modules: Vec<String>,
    type_ids: Vec<i64>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: Some(row.id),
            identifier: row.identifier,
            name: row.name,
            description: row.description,
            public: row.is_public,
            active: row.active,
            enabled_modules: row.enabled_modules,
            type_ids: row.type_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct RelationRow {
    id: i64,
    from_id: i64,
    to_id: i64,
    relation_type: String,
    delay: Option<i32>,
}

impl TryFrom<RelationRow> for Relation {
    type Error = RepositoryError;

    fn try_from(row: RelationRow) -> Result<Self, Self::Error> {
        let kind: RelationKind = row
            .relation_type
            .parse()
            .map_err(|_| RepositoryError::Corrupt(format!("relation {} has type {:?}", row.id, row.relation_type)))?;
        Ok(Relation {
            id: Some(row.id),
            from_id: row.from_id,
            to_id: row.to_id,
            kind,
            lag: row.delay,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct JournalRow {
    id: i64,
    journable_id: i64,
    version: i32,
    user_id: i64,
    notes: Option<String>,
    details: Option<Json<Value>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<JournalRow> for Journal {
    type Error = RepositoryError;

    fn try_from(row: JournalRow) -> Result<Self, Self::Error> {
        let details = match row.details {
            Some(Json(value)) => serde_json::from_value(value)
                .map_err(|e| RepositoryError::Corrupt(format!("journal {} details: {e}", row.id)))?,
            None => Default::default(),
        };
        Ok(Journal {
            id: Some(row.id),
            journable_id: row.journable_id,
            version: JournalVersion(row.version),
            user_id: row.user_id,
            notes: row.notes,
            details,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct PriorityRow {
    id: i64,
    name: String,
    position: i32,
    is_default: bool,
    active: bool,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<PriorityRow> for Priority {
    fn from(row: PriorityRow) -> Self {
        Priority {
            id: Some(row.id),
            name: row.name,
            position: row.position,
            is_default: row.is_default,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct StatusRow {
    id: i64,
    name: String,
    is_closed: bool,
    is_default: bool,
    position: i32,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<StatusRow> for Status {
    fn from(row: StatusRow) -> Self {
        Status {
            id: Some(row.id),
            name: row.name,
            is_closed: row.is_closed,
            is_default: row.is_default,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct TypeRow {
    id: i64,
    name: String,
    position: i32,
    is_default: bool,
    is_milestone: bool,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<TypeRow> for Type {
    fn from(row: TypeRow) -> Self {
        Type {
            id: Some(row.id),
            name: row.name,
            position: row.position,
            is_default: row.is_default,
            is_milestone: row.is_milestone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: i64,
    login: String,
    firstname: String,
    lastname: String,
    mail: String,
    admin: bool,
    status: i32,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let status = match row.status {
            2 => UserStatus::Registered,
            3 => UserStatus::Locked,
            _ => UserStatus::Active,
        };
        User {
            id: Some(row.id),
            login: row.login,
            firstname: row.firstname,
            lastname: row.lastname,
            mail: row.mail,
            admin: row.admin,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct VersionRow {
    id: i64,
    name: String,
    project_id: i64,
    effective_date: Option<NaiveDate>,
    status: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<VersionRow> for Version {
    fn from(row: VersionRow) -> Self {
        let status = match row.status.as_str() {
            "locked" => VersionStatus::Locked,
            "closed" => VersionStatus::Closed,
            _ => VersionStatus::Open,
        };
        Version {
            id: Some(row.id),
            name: row.name,
            project_id: row.project_id,
            effective_date: row.effective_date,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Work package store backed by PostgreSQL
pub struct PgWorkPackageStore {
    pool: PgPool,
}

impl PgWorkPackageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn replace_watchers(
        tx: &mut Transaction<'_, Postgres>,
        work_package_id: Id,
        user_ids: &[Id],
    ) -> RepositoryResult<()> {
        sqlx::query("DELETE FROM watchers WHERE watchable_id = $1")
            .bind(work_package_id)
            .execute(&mut **tx)
            .await?;

        if !user_ids.is_empty() {
            sqlx::query("INSERT INTO watchers (watchable_id, user_id) SELECT $1, UNNEST($2::BIGINT[])")
                .bind(work_package_id)
                .bind(user_ids)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    async fn insert(&self, wp: WorkPackage, user_id: Id) -> RepositoryResult<WorkPackage> {
        let mut tx = self.pool.begin().await?;

        let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO work_packages (
                sti_type, project_id, type_id, subject, description, author_id,
                status_id, priority_id, assigned_to_id, responsible_id,
                fixed_version_id, category_id, parent_id, start_date, due_date,
                estimated_hours, done_ratio, created_at, updated_at, lock_version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, NOW(), NOW(), 0)
            RETURNING id, created_at
            "#,
        )
        .bind(wp.kind.as_str())
        .bind(wp.project_id)
        .bind(wp.type_id)
        .bind(&wp.subject)
        .bind(&wp.description)
        .bind(wp.author_id)
        .bind(wp.status_id)
        .bind(wp.priority_id)
        .bind(wp.assigned_to_id)
        .bind(wp.responsible_id)
        .bind(wp.fixed_version_id)
        .bind(wp.category_id)
        .bind(wp.parent_id)
        .bind(wp.start_date)
        .bind(wp.due_date)
        .bind(wp.estimated_hours)
        .bind(wp.done_ratio)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_watchers(&mut tx, id, &wp.watcher_user_ids).await?;

        let mut saved = wp;
        saved.id = Some(id);
        saved.created_at = Some(created_at);
        saved.updated_at = Some(created_at);
        saved.lock_version = 0;

        let journal = Journal::for_creation(&saved, id, user_id);
        let details = serde_json::to_value(&journal.details)
            .map_err(|e| RepositoryError::Corrupt(format!("journal details: {e}")))?;
        sqlx::query(
            r#"
            INSERT INTO journals (journable_id, version, user_id, notes, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(journal.version.0)
        .bind(user_id)
        .bind(&journal.notes)
        .bind(Json(details))
        .bind(journal.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(id, kind = %saved.kind, "Work package inserted");
        Ok(saved)
    }

    async fn update(&self, id: Id, wp: WorkPackage) -> RepositoryResult<WorkPackage> {
        let mut tx = self.pool.begin().await?;

        let stored: Option<(String, i32)> =
            sqlx::query_as("SELECT sti_type, lock_version FROM work_packages WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (sti_type, lock_version) =
            stored.ok_or_else(|| RepositoryError::NotFound(format!("work package {id}")))?;

        if sti_type != wp.kind.as_str() {
            return Err(RepositoryError::Conflict(format!(
                "work package {id} cannot change from {sti_type} to {}",
                wp.kind
            )));
        }
        if lock_version != wp.lock_version {
            return Err(RepositoryError::Conflict(
                "Work package was modified by another user".to_string(),
            ));
        }

        let (updated_at, new_lock_version): (DateTime<Utc>, i32) = sqlx::query_as(
            r#"
            UPDATE work_packages SET
                type_id = $1, subject = $2, description = $3, author_id = $4,
                status_id = $5, priority_id = $6, assigned_to_id = $7,
                responsible_id = $8, fixed_version_id = $9, category_id = $10,
                parent_id = $11, start_date = $12, due_date = $13,
                estimated_hours = $14, done_ratio = $15, deleted_at = $16,
                lock_version = lock_version + 1,
                updated_at = NOW()
            WHERE id = $17
            RETURNING updated_at, lock_version
            "#,
        )
        .bind(wp.type_id)
        .bind(&wp.subject)
        .bind(&wp.description)
        .bind(wp.author_id)
        .bind(wp.status_id)
        .bind(wp.priority_id)
        .bind(wp.assigned_to_id)
        .bind(wp.responsible_id)
        .bind(wp.fixed_version_id)
        .bind(wp.category_id)
        .bind(wp.parent_id)
        .bind(wp.start_date)
        .bind(wp.due_date)
        .bind(wp.estimated_hours)
        .bind(wp.done_ratio)
        .bind(wp.deleted_at)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_watchers(&mut tx, id, &wp.watcher_user_ids).await?;
        tx.commit().await?;

        let mut saved = wp;
        saved.updated_at = Some(updated_at);
        saved.lock_version = new_lock_version;
        debug!(id, "Work package updated");
        Ok(saved)
    }
}

#[async_trait]
impl WorkPackageStore for PgWorkPackageStore {
    async fn find_work_package(&self, id: Id) -> RepositoryResult<Option<WorkPackage>> {
        let sql = format!("SELECT {WORK_PACKAGE_COLUMNS} FROM work_packages wp WHERE wp.id = $1");
        let row = sqlx::query_as::<_, WorkPackageRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(WorkPackage::try_from).transpose()
    }

    async fn find_work_packages(&self, ids: Vec<Id>) -> RepositoryResult<Vec<WorkPackage>> {
        let sql = format!("SELECT {WORK_PACKAGE_COLUMNS} FROM work_packages wp WHERE wp.id = ANY($1) ORDER BY wp.id");
        let rows = sqlx::query_as::<_, WorkPackageRow>(&sql)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
        work_packages(rows)
    }

    async fn find_project(&self, id: Id) -> RepositoryResult<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Project::from))
    }

    async fn find_project_by_identifier(&self, identifier: String) -> RepositoryResult<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.identifier = $1");
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Project::from))
    }

    async fn find_projects(&self, ids: Vec<Id>) -> RepositoryResult<Vec<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ANY($1) ORDER BY p.id");
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn save_work_package(&self, wp: WorkPackage, user_id: Id) -> RepositoryResult<WorkPackage> {
        match wp.id {
            None => self.insert(wp, user_id).await,
            Some(id) => self.update(id, wp).await,
        }
    }

    async fn ancestors(&self, id: Id) -> RepositoryResult<Vec<WorkPackage>> {
        let sql = format!(
            r#"
            WITH RECURSIVE chain(id, depth) AS (
                SELECT parent_id, 1 FROM work_packages WHERE id = $1 AND parent_id IS NOT NULL
                UNION ALL
                SELECT p.parent_id, c.depth + 1
                FROM chain c JOIN work_packages p ON p.id = c.id
                WHERE p.parent_id IS NOT NULL AND c.depth < 100
            )
            SELECT {WORK_PACKAGE_COLUMNS}
            FROM chain c JOIN work_packages wp ON wp.id = c.id
            ORDER BY c.depth DESC
            "#
        );
        let rows = sqlx::query_as::<_, WorkPackageRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        work_packages(rows)
    }

    async fn descendants(&self, id: Id) -> RepositoryResult<Vec<WorkPackage>> {
        let sql = format!(
            r#"
            WITH RECURSIVE subtree(id) AS (
                SELECT id FROM work_packages WHERE parent_id = $1
                UNION
                SELECT child.id FROM work_packages child JOIN subtree s ON child.parent_id = s.id
            )
            SELECT {WORK_PACKAGE_COLUMNS}
            FROM subtree s JOIN work_packages wp ON wp.id = s.id
            ORDER BY wp.id
            "#
        );
        let rows = sqlx::query_as::<_, WorkPackageRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        work_packages(rows)
    }

    async fn relations_of(&self, id: Id) -> RepositoryResult<Vec<Relation>> {
        let rows = sqlx::query_as::<_, RelationRow>(
            r#"
            SELECT id, from_id, to_id, relation_type, delay
            FROM relations
            WHERE from_id = $1 OR to_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Relation::try_from).collect()
    }

    async fn journals_of(&self, id: Id) -> RepositoryResult<Vec<Journal>> {
        let rows = sqlx::query_as::<_, JournalRow>(
            r#"
            SELECT id, journable_id, version, user_id, notes, details, created_at
            FROM journals
            WHERE journable_id = $1
            ORDER BY version
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Journal::try_from).collect()
    }

    async fn priorities(&self) -> RepositoryResult<Vec<Priority>> {
        let rows = sqlx::query_as::<_, PriorityRow>(
            r#"
            SELECT id, name, position, is_default, active, created_at, updated_at
            FROM enumerations
            WHERE type = 'IssuePriority'
            ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Priority::from).collect())
    }

    async fn statuses(&self) -> RepositoryResult<Vec<Status>> {
        let rows = sqlx::query_as::<_, StatusRow>(
            "SELECT id, name, is_closed, is_default, position, created_at, updated_at FROM statuses ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Status::from).collect())
    }

    async fn types(&self) -> RepositoryResult<Vec<Type>> {
        let rows = sqlx::query_as::<_, TypeRow>(
            "SELECT id, name, position, is_default, is_milestone, created_at, updated_at FROM types ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Type::from).collect())
    }

    async fn find_users(&self, ids: Vec<Id>) -> RepositoryResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, login, firstname, lastname, mail, admin, status, created_at, updated_at
            FROM users
            WHERE id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_versions(&self, ids: Vec<Id>) -> RepositoryResult<Vec<Version>> {
        let rows = sqlx::query_as::<_, VersionRow>(
            r#"
            SELECT id, name, project_id, effective_date, status, created_at, updated_at
            FROM versions
            WHERE id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Version::from).collect())
    }

    async fn planning_elements(
        &self,
        project_id: Id,
        scope: PlanningElementScope,
    ) -> RepositoryResult<Vec<WorkPackage>> {
        let (filter, at) = match scope {
            PlanningElementScope::WithoutDeleted => ("wp.deleted_at IS NULL", None),
            PlanningElementScope::AtTime(at) => (
                "(wp.created_at IS NULL OR wp.created_at <= $2) AND (wp.deleted_at IS NULL OR wp.deleted_at > $2)",
                Some(at),
            ),
        };
        let sql = format!(
            r#"
            SELECT {WORK_PACKAGE_COLUMNS}
            FROM work_packages wp
            WHERE wp.project_id = $1 AND wp.sti_type = 'PlanningElement' AND {filter}
            ORDER BY wp.id
            "#
        );

        let mut query = sqlx::query_as::<_, WorkPackageRow>(&sql).bind(project_id);
        if let Some(at) = at {
            query = query.bind(at);
        }
        let rows = query.fetch_all(&self.pool).await?;
        work_packages(rows)
    }
}
