//! Connection-pooled SQLite backend, grounded in the teacher's
//! `SqlitePoolConfig` / `SqliteConnectionPool` / `AsyncSqliteMemoryStore`
//! trio: a bounded pool of `tokio_rusqlite` connections, each handed a
//! closure via `conn.call(...)` to run blocking `rusqlite` work off the
//! async executor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use tokio::sync::{OnceCell, RwLock};
use tokio_rusqlite::Connection as AsyncConnection;
use tracing::warn;

use weft_core::error::PersistenceError;

use crate::backend::{PersistenceBackend, StorageResult};
use crate::schema::{ExecutionRow, ExecutionStatusRow, JobType, PipelineRow, ScheduledJobRow};

#[derive(Debug, Clone)]
pub struct SqlitePoolConfig {
    pub max_connections: usize,
    pub min_connections: usize,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl Default for SqlitePoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(3600)),
        }
    }
}

struct PooledConnection {
    id: u64,
    connection: AsyncConnection,
    created_at: SystemTime,
    last_used: SystemTime,
    in_use: bool,
}

#[derive(Clone)]
struct SqliteConnectionPool {
    connections: Arc<RwLock<Vec<PooledConnection>>>,
    config: SqlitePoolConfig,
    database_path: String,
    next_id: Arc<AtomicU64>,
    // `:memory:` pools must all address the same database, since each
    // connection otherwise opens its own independent in-memory instance — a
    // write on one pooled connection would be invisible on another. Every
    // `PooledConnection` for a `:memory:` pool is a clone of this single
    // underlying connection rather than a distinct database.
    shared_memory_connection: Arc<OnceCell<AsyncConnection>>,
}

impl SqliteConnectionPool {
    async fn new(database_path: &str, config: SqlitePoolConfig) -> StorageResult<Self> {
        let pool = Self {
            connections: Arc::new(RwLock::new(Vec::new())),
            config,
            database_path: database_path.to_string(),
            next_id: Arc::new(AtomicU64::new(0)),
            shared_memory_connection: Arc::new(OnceCell::new()),
        };
        pool.initialize_connections().await?;
        Ok(pool)
    }

    async fn initialize_connections(&self) -> StorageResult<()> {
        let mut connections = self.connections.write().await;
        for _ in 0..self.config.min_connections {
            let conn = self.create_connection().await?;
            connections.push(PooledConnection {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                connection: conn,
                created_at: SystemTime::now(),
                last_used: SystemTime::now(),
                in_use: false,
            });
        }
        Ok(())
    }

    async fn create_connection(&self) -> StorageResult<AsyncConnection> {
        if self.database_path == ":memory:" {
            return self
                .shared_memory_connection
                .get_or_try_init(|| async {
                    let conn = AsyncConnection::open_in_memory()
                        .await
                        .map_err(|e| PersistenceError::Backend(e.to_string()))?;
                    Self::init_schema(&conn).await?;
                    Ok::<_, PersistenceError>(conn)
                })
                .await
                .map(|conn| conn.clone());
        }

        let conn = AsyncConnection::open(&self.database_path)
            .await
            .map_err(|e| PersistenceError::Backend(e.to_string()))?;
        Self::init_schema(&conn).await?;
        Ok(conn)
    }

    async fn init_schema(conn: &AsyncConnection) -> StorageResult<()> {
        conn.call(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS scheduled_jobs (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    job_type TEXT NOT NULL,
                    pipeline_ref TEXT,
                    monitoring_job_id TEXT,
                    cron_expr TEXT NOT NULL,
                    enabled INTEGER NOT NULL,
                    next_run TEXT,
                    last_run TEXT,
                    last_result TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_scheduled_jobs_enabled ON scheduled_jobs(enabled);
                CREATE INDEX IF NOT EXISTS idx_scheduled_jobs_next_run ON scheduled_jobs(next_run);

                CREATE TABLE IF NOT EXISTS pipelines (
                    name TEXT PRIMARY KEY,
                    description TEXT,
                    config_blob TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS job_executions (
                    id TEXT PRIMARY KEY,
                    job_id TEXT,
                    pipeline_ref TEXT NOT NULL,
                    start_time TEXT NOT NULL,
                    end_time TEXT,
                    duration_ns INTEGER,
                    status TEXT NOT NULL,
                    error TEXT,
                    context_blob TEXT,
                    steps_blob TEXT NOT NULL,
                    triggered_by TEXT NOT NULL,
                    FOREIGN KEY (job_id) REFERENCES scheduled_jobs(id) ON DELETE CASCADE
                );
                CREATE INDEX IF NOT EXISTS idx_job_executions_job_id ON job_executions(job_id);
                CREATE INDEX IF NOT EXISTS idx_job_executions_start_time ON job_executions(start_time DESC);
                CREATE INDEX IF NOT EXISTS idx_job_executions_status ON job_executions(status);
                "#,
            )?;
            Ok(())
        })
        .await
        .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))
    }

    async fn acquire(&self) -> StorageResult<PooledConnectionGuard> {
        let start_time = SystemTime::now();
        let timeout = self.config.acquire_timeout;

        loop {
            if let Some(guard) = self.try_acquire().await {
                return Ok(guard);
            }

            if self.connections.read().await.len() < self.config.max_connections {
                let conn = self.create_connection().await?;
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let mut connections = self.connections.write().await;
                connections.push(PooledConnection {
                    id,
                    connection: conn,
                    created_at: SystemTime::now(),
                    last_used: SystemTime::now(),
                    in_use: true,
                });
                return Ok(PooledConnectionGuard {
                    pool: self.clone(),
                    connection_id: id,
                });
            }

            if start_time.elapsed().unwrap_or(Duration::ZERO) >= timeout {
                return Err(PersistenceError::Backend(
                    "timed out acquiring a pooled sqlite connection".to_string(),
                ));
            }

            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn try_acquire(&self) -> Option<PooledConnectionGuard> {
        let mut connections = self.connections.write().await;
        self.evict_expired(&mut connections);

        for pooled in connections.iter_mut() {
            if !pooled.in_use {
                pooled.in_use = true;
                pooled.last_used = SystemTime::now();
                return Some(PooledConnectionGuard {
                    pool: self.clone(),
                    connection_id: pooled.id,
                });
            }
        }
        None
    }

    /// Evicts idle connections past their lifetime/idle budget. Identity is
    /// tracked by each connection's stable `id`, not its position in
    /// `connections` — a `PooledConnectionGuard` holds an id, and removing an
    /// idle entry here must never shift another (possibly in-use) entry out
    /// from under an outstanding guard.
    fn evict_expired(&self, connections: &mut Vec<PooledConnection>) {
        if let Some(max_lifetime) = self.config.max_lifetime {
            connections.retain(|c| {
                c.in_use || c.created_at.elapsed().unwrap_or(Duration::ZERO) < max_lifetime
            });
        }
        if let Some(idle_timeout) = self.config.idle_timeout {
            connections.retain(|c| {
                c.in_use || c.last_used.elapsed().unwrap_or(Duration::ZERO) < idle_timeout
            });
        }
    }

    async fn release(&self, connection_id: u64) {
        let mut connections = self.connections.write().await;
        if let Some(pooled) = connections.iter_mut().find(|c| c.id == connection_id) {
            pooled.in_use = false;
            pooled.last_used = SystemTime::now();
        }
    }
}

struct PooledConnectionGuard {
    pool: SqliteConnectionPool,
    connection_id: u64,
}

impl PooledConnectionGuard {
    async fn connection(&self) -> StorageResult<AsyncConnection> {
        let connections = self.pool.connections.read().await;
        connections
            .iter()
            .find(|c| c.id == self.connection_id)
            .map(|c| c.connection.clone())
            .ok_or_else(|| PersistenceError::Backend("pooled connection no longer available".to_string()))
    }
}

impl Drop for PooledConnectionGuard {
    fn drop(&mut self) {
        let pool = self.pool.clone();
        let id = self.connection_id;
        tokio::spawn(async move {
            pool.release(id).await;
        });
    }
}

/// SQLite-backed [`PersistenceBackend`].
pub struct SqliteBackend {
    pool: SqliteConnectionPool,
}

impl SqliteBackend {
    pub async fn open(database_path: &str) -> StorageResult<Self> {
        Self::with_pool_config(database_path, SqlitePoolConfig::default()).await
    }

    pub async fn with_pool_config(
        database_path: &str,
        config: SqlitePoolConfig,
    ) -> StorageResult<Self> {
        let pool = SqliteConnectionPool::new(database_path, config).await?;
        Ok(Self { pool })
    }
}

fn job_type_str(job_type: JobType) -> &'static str {
    match job_type {
        JobType::Pipeline => "pipeline",
        JobType::Monitoring => "monitoring",
    }
}

fn parse_job_type(raw: &str) -> StorageResult<JobType> {
    match raw {
        "pipeline" => Ok(JobType::Pipeline),
        "monitoring" => Ok(JobType::Monitoring),
        other => Err(PersistenceError::Deserialization(format!(
            "unknown job_type '{other}'"
        ))),
    }
}

fn status_str(status: ExecutionStatusRow) -> &'static str {
    match status {
        ExecutionStatusRow::Running => "running",
        ExecutionStatusRow::Success => "success",
        ExecutionStatusRow::Failed => "failed",
        ExecutionStatusRow::Cancelled => "cancelled",
    }
}

fn parse_status(raw: &str) -> StorageResult<ExecutionStatusRow> {
    match raw {
        "running" => Ok(ExecutionStatusRow::Running),
        "success" => Ok(ExecutionStatusRow::Success),
        "failed" => Ok(ExecutionStatusRow::Failed),
        "cancelled" => Ok(ExecutionStatusRow::Cancelled),
        other => Err(PersistenceError::Deserialization(format!(
            "unknown execution status '{other}'"
        ))),
    }
}

fn parse_rfc3339(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistenceError::Deserialization(e.to_string()))
}

fn job_row_from_sqlite(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduledJobRowRaw> {
    Ok(ScheduledJobRowRaw {
        id: row.get(0)?,
        name: row.get(1)?,
        job_type: row.get(2)?,
        pipeline_ref: row.get(3)?,
        monitoring_job_id: row.get(4)?,
        cron_expr: row.get(5)?,
        enabled: row.get(6)?,
        next_run: row.get(7)?,
        last_run: row.get(8)?,
        last_result: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Intermediate representation holding raw column values before the
/// timestamp/enum parsing that can fail is applied outside the
/// `rusqlite` callback (whose error type cannot carry our own error enum).
struct ScheduledJobRowRaw {
    id: String,
    name: String,
    job_type: String,
    pipeline_ref: Option<String>,
    monitoring_job_id: Option<String>,
    cron_expr: String,
    enabled: bool,
    next_run: Option<String>,
    last_run: Option<String>,
    last_result: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ScheduledJobRowRaw {
    fn into_row(self) -> StorageResult<ScheduledJobRow> {
        Ok(ScheduledJobRow {
            id: self.id,
            name: self.name,
            job_type: parse_job_type(&self.job_type)?,
            pipeline_ref: self.pipeline_ref,
            monitoring_job_id: self.monitoring_job_id,
            cron_expr: self.cron_expr,
            enabled: self.enabled,
            next_run: self.next_run.map(|s| parse_rfc3339(&s)).transpose()?,
            last_run: self.last_run.map(|s| parse_rfc3339(&s)).transpose()?,
            last_result: self.last_result,
            created_at: parse_rfc3339(&self.created_at)?,
            updated_at: parse_rfc3339(&self.updated_at)?,
        })
    }
}

struct ExecutionRowRaw {
    id: String,
    job_id: Option<String>,
    pipeline_ref: String,
    start_time: String,
    end_time: Option<String>,
    duration_ns: Option<i64>,
    status: String,
    error: Option<String>,
    context_blob: Option<String>,
    steps_blob: String,
    triggered_by: String,
}

fn execution_row_from_sqlite(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExecutionRowRaw> {
    Ok(ExecutionRowRaw {
        id: row.get(0)?,
        job_id: row.get(1)?,
        pipeline_ref: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        duration_ns: row.get(5)?,
        status: row.get(6)?,
        error: row.get(7)?,
        context_blob: row.get(8)?,
        steps_blob: row.get(9)?,
        triggered_by: row.get(10)?,
    })
}

impl ExecutionRowRaw {
    fn into_row(self) -> StorageResult<ExecutionRow> {
        Ok(ExecutionRow {
            id: self.id,
            job_id: self.job_id,
            pipeline_ref: self.pipeline_ref,
            start_time: parse_rfc3339(&self.start_time)?,
            end_time: self.end_time.map(|s| parse_rfc3339(&s)).transpose()?,
            duration_ns: self.duration_ns,
            status: parse_status(&self.status)?,
            error: self.error,
            context_blob: self.context_blob,
            steps_blob: self.steps_blob,
            triggered_by: self.triggered_by,
        })
    }
}

#[async_trait]
impl PersistenceBackend for SqliteBackend {
    async fn save_job(&self, job: &ScheduledJobRow) -> StorageResult<()> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let job = job.clone();
        conn.call(move |conn| {
            conn.execute(
                "INSERT INTO scheduled_jobs (
                    id, name, job_type, pipeline_ref, monitoring_job_id, cron_expr,
                    enabled, next_run, last_run, last_result, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                rusqlite::params![
                    job.id,
                    job.name,
                    job_type_str(job.job_type),
                    job.pipeline_ref,
                    job.monitoring_job_id,
                    job.cron_expr,
                    job.enabled,
                    job.next_run.map(|t| t.to_rfc3339()),
                    job.last_run.map(|t| t.to_rfc3339()),
                    job.last_result,
                    job.created_at.to_rfc3339(),
                    job.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))
    }

    async fn get_job(&self, id: &str) -> StorageResult<Option<ScheduledJobRow>> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let id = id.to_string();
        let raw: Option<ScheduledJobRowRaw> = conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT id, name, job_type, pipeline_ref, monitoring_job_id, cron_expr,
                            enabled, next_run, last_run, last_result, created_at, updated_at
                     FROM scheduled_jobs WHERE id = ?1",
                    rusqlite::params![id],
                    job_row_from_sqlite,
                )
                .optional()
            })
            .await
            .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))?;

        raw.map(|r| r.into_row()).transpose()
    }

    async fn list_jobs(&self) -> StorageResult<Vec<ScheduledJobRow>> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let raw: Vec<ScheduledJobRowRaw> = conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, job_type, pipeline_ref, monitoring_job_id, cron_expr,
                            enabled, next_run, last_run, last_result, created_at, updated_at
                     FROM scheduled_jobs",
                )?;
                let rows = stmt
                    .query_map([], job_row_from_sqlite)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
            .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))?;

        raw.into_iter().map(|r| r.into_row()).collect()
    }

    async fn update_job(&self, job: &ScheduledJobRow) -> StorageResult<()> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let job = job.clone();
        conn.call(move |conn| {
            conn.execute(
                "UPDATE scheduled_jobs SET
                    name = ?2, job_type = ?3, pipeline_ref = ?4, monitoring_job_id = ?5,
                    cron_expr = ?6, enabled = ?7, next_run = ?8, last_run = ?9,
                    last_result = ?10, updated_at = ?11
                 WHERE id = ?1",
                rusqlite::params![
                    job.id,
                    job.name,
                    job_type_str(job.job_type),
                    job.pipeline_ref,
                    job.monitoring_job_id,
                    job.cron_expr,
                    job.enabled,
                    job.next_run.map(|t| t.to_rfc3339()),
                    job.last_run.map(|t| t.to_rfc3339()),
                    job.last_result,
                    job.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))
    }

    async fn delete_job(&self, id: &str) -> StorageResult<()> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let id = id.to_string();
        conn.call(move |conn| {
            conn.execute("DELETE FROM scheduled_jobs WHERE id = ?1", rusqlite::params![id])?;
            Ok(())
        })
        .await
        .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))
    }

    async fn save_pipeline(&self, pipeline: &PipelineRow) -> StorageResult<()> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let pipeline = pipeline.clone();
        conn.call(move |conn| {
            conn.execute(
                "INSERT INTO pipelines (name, description, config_blob, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    pipeline.name,
                    pipeline.description,
                    pipeline.config_blob,
                    pipeline.created_at.to_rfc3339(),
                    pipeline.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))
    }

    async fn get_pipeline(&self, name: &str) -> StorageResult<Option<PipelineRow>> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let name = name.to_string();
        conn.call(move |conn| {
            conn.query_row(
                "SELECT name, description, config_blob, created_at, updated_at
                 FROM pipelines WHERE name = ?1",
                rusqlite::params![name],
                |row| {
                    Ok(PipelineRowStrings {
                        name: row.get(0)?,
                        description: row.get(1)?,
                        config_blob: row.get(2)?,
                        created_at: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))?
        .map(|r| r.into_row())
        .transpose()
    }

    async fn list_pipelines(&self) -> StorageResult<Vec<PipelineRow>> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let raw: Vec<PipelineRowStrings> = conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name, description, config_blob, created_at, updated_at FROM pipelines",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(PipelineRowStrings {
                            name: row.get(0)?,
                            description: row.get(1)?,
                            config_blob: row.get(2)?,
                            created_at: row.get(3)?,
                            updated_at: row.get(4)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
            .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))?;

        raw.into_iter().map(|r| r.into_row()).collect()
    }

    async fn update_pipeline(&self, pipeline: &PipelineRow) -> StorageResult<()> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let pipeline = pipeline.clone();
        conn.call(move |conn| {
            conn.execute(
                "UPDATE pipelines SET description = ?2, config_blob = ?3, updated_at = ?4
                 WHERE name = ?1",
                rusqlite::params![
                    pipeline.name,
                    pipeline.description,
                    pipeline.config_blob,
                    pipeline.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))
    }

    async fn delete_pipeline(&self, name: &str) -> StorageResult<()> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let name = name.to_string();
        conn.call(move |conn| {
            conn.execute("DELETE FROM pipelines WHERE name = ?1", rusqlite::params![name])?;
            Ok(())
        })
        .await
        .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))
    }

    async fn save_execution(&self, execution: &ExecutionRow) -> StorageResult<()> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let execution = execution.clone();
        conn.call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO job_executions (
                    id, job_id, pipeline_ref, start_time, end_time, duration_ns,
                    status, error, context_blob, steps_blob, triggered_by
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    execution.id,
                    execution.job_id,
                    execution.pipeline_ref,
                    execution.start_time.to_rfc3339(),
                    execution.end_time.map(|t| t.to_rfc3339()),
                    execution.duration_ns,
                    status_str(execution.status),
                    execution.error,
                    execution.context_blob,
                    execution.steps_blob,
                    execution.triggered_by,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))
    }

    async fn get_execution(&self, id: &str) -> StorageResult<Option<ExecutionRow>> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let id = id.to_string();
        let raw: Option<ExecutionRowRaw> = conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT id, job_id, pipeline_ref, start_time, end_time, duration_ns,
                            status, error, context_blob, steps_blob, triggered_by
                     FROM job_executions WHERE id = ?1",
                    rusqlite::params![id],
                    execution_row_from_sqlite,
                )
                .optional()
            })
            .await
            .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))?;

        raw.map(|r| r.into_row()).transpose()
    }

    async fn list_executions_by_job(
        &self,
        job_id: &str,
        limit: usize,
    ) -> StorageResult<Vec<ExecutionRow>> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let job_id = job_id.to_string();
        let raw: Vec<ExecutionRowRaw> = conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, job_id, pipeline_ref, start_time, end_time, duration_ns,
                            status, error, context_blob, steps_blob, triggered_by
                     FROM job_executions WHERE job_id = ?1
                     ORDER BY start_time DESC LIMIT ?2",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![job_id, limit as i64], execution_row_from_sqlite)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
            .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))?;

        raw.into_iter().map(|r| r.into_row()).collect()
    }

    async fn delete_executions_older_than(&self, cutoff: DateTime<Utc>) -> StorageResult<usize> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        let cutoff = cutoff.to_rfc3339();
        conn.call(move |conn| {
            let count = conn.execute(
                "DELETE FROM job_executions WHERE start_time < ?1",
                rusqlite::params![cutoff],
            )?;
            Ok(count)
        })
        .await
        .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))
    }

    async fn health(&self) -> StorageResult<()> {
        let guard = self.pool.acquire().await?;
        let conn = guard.connection().await?;
        conn.call(|conn| conn.query_row("SELECT 1", [], |_| Ok(())).map_err(Into::into))
            .await
            .map_err(|e: tokio_rusqlite::Error| PersistenceError::Backend(e.to_string()))
    }

    async fn close(&self) -> StorageResult<()> {
        warn!("sqlite backend close is a no-op; pooled connections drop with the backend");
        Ok(())
    }
}

struct PipelineRowStrings {
    name: String,
    description: Option<String>,
    config_blob: String,
    created_at: String,
    updated_at: String,
}

impl PipelineRowStrings {
    fn into_row(self) -> StorageResult<PipelineRow> {
        Ok(PipelineRow {
            name: self.name,
            description: self.description,
            config_blob: self.config_blob,
            created_at: parse_rfc3339(&self.created_at)?,
            updated_at: parse_rfc3339(&self.updated_at)?,
        })
    }
}
