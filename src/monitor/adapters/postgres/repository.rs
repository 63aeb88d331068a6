//! `PostgreSQL` implementation of the monitor's storage ports.

use super::{
    models::{
        CredentialRow, NewServerHistoryRow, NewToolHistoryRow, NewToolRow, ServerHistoryRow,
        ServerRow, ToolHistoryRow, ToolRow,
    },
    schema::{mcp_tools, monitored_servers, server_credentials, server_history, tool_history},
};
use crate::monitor::{
    domain::{
        BaseUrl, Credential, MonitoredServer, OAuthClientMetadata, OwnerId, PersistedServerData,
        PersistedToolData, ServerId, ServerSnapshot, SnapshotTally, ToolDescriptor, ToolId,
        ToolRecord, ToolRequestStats, ToolSnapshot, next_checked_at,
    },
    ports::{
        CredentialStore, CredentialStoreError, CredentialStoreResult, HistoryError,
        HistoryRepository, HistoryResult, ServerRegistry, ServerRegistryError,
        ServerRegistryResult, ToolCatalogError, ToolCatalogRepository, ToolCatalogResult,
        ToolUpsert, UpsertKind,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{max, not};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use diesel::result::Error as DieselError;
use mockable::{Clock, DefaultClock};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// `PostgreSQL` connection pool type for monitor adapters.
pub type MonitorPgPool = Pool<ConnectionManager<PgConnection>>;

/// Builds a connection pool for `database_url`.
///
/// # Errors
///
/// Returns the pool error when the initial connections cannot be opened.
pub fn connect_pool(database_url: &str, max_size: u32) -> Result<MonitorPgPool, PoolError> {
    Pool::builder()
        .max_size(max_size)
        .build(ConnectionManager::<PgConnection>::new(database_url))
}

/// Port errors that can wrap a storage-layer failure.
trait StorageFailure: Sized {
    fn from_storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static;
}

macro_rules! storage_failure {
    ($($error:ty),+ $(,)?) => {
        $(
            impl StorageFailure for $error {
                fn from_storage<E>(err: E) -> Self
                where
                    E: std::error::Error + Send + Sync + 'static,
                {
                    Self::persistence(err)
                }
            }
        )+
    };
}

storage_failure!(
    ServerRegistryError,
    CredentialStoreError,
    ToolCatalogError,
    HistoryError,
);

/// `PostgreSQL`-backed store implementing every monitor storage port.
///
/// History timestamps come from the injected clock and are bumped past the
/// subject's latest row inside the insert transaction.
pub struct PostgresMonitorStore<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    pool: MonitorPgPool,
    clock: Arc<C>,
}

impl PostgresMonitorStore<DefaultClock> {
    /// Creates a store stamped by the system clock.
    #[must_use]
    pub fn new(pool: MonitorPgPool) -> Self {
        Self::with_clock(pool, Arc::new(DefaultClock))
    }
}

impl<C> PostgresMonitorStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a store stamped by `clock`.
    #[must_use]
    pub const fn with_clock(pool: MonitorPgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &MonitorPgPool {
        &self.pool
    }

    async fn run_blocking<F, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: StorageFailure + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(E::from_storage)?;
            operation(&mut connection)
        })
        .await
        .map_err(E::from_storage)?
    }
}

#[async_trait]
impl<C> ServerRegistry for PostgresMonitorStore<C>
where
    C: Clock + Send + Sync,
{
    async fn list_servers(&self) -> ServerRegistryResult<Vec<MonitoredServer>> {
        self.run_blocking(move |connection| {
            let rows = monitored_servers::table
                .order(monitored_servers::id.asc())
                .select(ServerRow::as_select())
                .load::<ServerRow>(connection)
                .map_err(ServerRegistryError::persistence)?;
            rows.into_iter().map(row_to_server).collect()
        })
        .await
    }

    async fn get_server(&self, server_id: ServerId) -> ServerRegistryResult<Option<MonitoredServer>> {
        self.run_blocking(move |connection| {
            let row = monitored_servers::table
                .find(server_id.value())
                .select(ServerRow::as_select())
                .first::<ServerRow>(connection)
                .optional()
                .map_err(ServerRegistryError::persistence)?;
            row.map(row_to_server).transpose()
        })
        .await
    }
}

#[async_trait]
impl<C> CredentialStore for PostgresMonitorStore<C>
where
    C: Clock + Send + Sync,
{
    async fn get_credential(&self, server_id: ServerId) -> CredentialStoreResult<Option<Credential>> {
        self.run_blocking(move |connection| {
            let row = server_credentials::table
                .find(server_id.value())
                .select(CredentialRow::as_select())
                .first::<CredentialRow>(connection)
                .optional()
                .map_err(CredentialStoreError::persistence)?;
            row.map(row_to_credential).transpose()
        })
        .await
    }
}

#[async_trait]
impl<C> ToolCatalogRepository for PostgresMonitorStore<C>
where
    C: Clock + Send + Sync,
{
    async fn upsert_tool(
        &self,
        server_id: ServerId,
        descriptor: &ToolDescriptor,
        at: DateTime<Utc>,
    ) -> ToolCatalogResult<ToolUpsert> {
        let new_row = NewToolRow {
            server_id: server_id.value(),
            name: descriptor.name().to_owned(),
            description: descriptor.description().to_owned(),
            tool_type: descriptor.tool_type().map(str::to_owned),
            input_schema: descriptor.input_schema().cloned(),
            output_schema: descriptor.output_schema().cloned(),
            is_available: true,
            created_at: at,
            modified_at: at,
        };

        let (row, kind) = self
            .run_blocking(move |connection| {
                connection
                    .transaction::<_, DieselError, _>(|tx| upsert_tool_row(tx, &new_row))
                    .map_err(ToolCatalogError::persistence)
            })
            .await?;

        Ok(ToolUpsert {
            record: row_to_tool(row)?,
            kind,
        })
    }

    async fn disable_tools_not_in(
        &self,
        server_id: ServerId,
        keep_names: &BTreeSet<String>,
        at: DateTime<Utc>,
    ) -> ToolCatalogResult<u64> {
        let keep: Vec<String> = keep_names.iter().cloned().collect();
        self.run_blocking(move |connection| {
            let disabled = diesel::update(
                mcp_tools::table
                    .filter(mcp_tools::server_id.eq(server_id.value()))
                    .filter(mcp_tools::is_available.eq(true))
                    .filter(not(mcp_tools::name.eq_any(&keep))),
            )
            .set((
                mcp_tools::is_available.eq(false),
                mcp_tools::modified_at.eq(at),
            ))
            .execute(connection)
            .map_err(ToolCatalogError::persistence)?;
            u64::try_from(disabled).map_err(ToolCatalogError::persistence)
        })
        .await
    }

    async fn list_tools(&self, server_id: ServerId) -> ToolCatalogResult<Vec<ToolRecord>> {
        self.run_blocking(move |connection| {
            let rows = mcp_tools::table
                .filter(mcp_tools::server_id.eq(server_id.value()))
                .order(mcp_tools::name.asc())
                .select(ToolRow::as_select())
                .load::<ToolRow>(connection)
                .map_err(ToolCatalogError::persistence)?;
            rows.into_iter().map(row_to_tool).collect()
        })
        .await
    }
}

#[async_trait]
impl<C> HistoryRepository for PostgresMonitorStore<C>
where
    C: Clock + Send + Sync,
{
    async fn append_server_snapshot(
        &self,
        server_id: ServerId,
        observed_up: bool,
        tool_count: u32,
    ) -> HistoryResult<ServerSnapshot> {
        let stored_count = i32::try_from(tool_count).map_err(HistoryError::persistence)?;
        let candidate = self.clock.utc();

        let row = self
            .run_blocking(move |connection| {
                connection
                    .transaction::<_, DieselError, _>(|tx| {
                        let latest = server_history::table
                            .filter(server_history::server_id.eq(server_id.value()))
                            .select(max(server_history::checked_at))
                            .first::<Option<DateTime<Utc>>>(tx)?;
                        diesel::insert_into(server_history::table)
                            .values(&NewServerHistoryRow {
                                server_id: server_id.value(),
                                observed_up,
                                tool_count: stored_count,
                                checked_at: next_checked_at(candidate, latest),
                            })
                            .returning(ServerHistoryRow::as_returning())
                            .get_result(tx)
                    })
                    .map_err(HistoryError::persistence)
            })
            .await?;

        row_to_server_snapshot(row)
    }

    async fn append_tool_snapshot(
        &self,
        tool_id: ToolId,
        is_available: bool,
    ) -> HistoryResult<ToolSnapshot> {
        let candidate = self.clock.utc();

        let row = self
            .run_blocking(move |connection| {
                connection
                    .transaction::<_, DieselError, _>(|tx| {
                        let latest = tool_history::table
                            .filter(tool_history::tool_id.eq(tool_id.value()))
                            .select(max(tool_history::checked_at))
                            .first::<Option<DateTime<Utc>>>(tx)?;
                        diesel::insert_into(tool_history::table)
                            .values(&NewToolHistoryRow {
                                tool_id: tool_id.value(),
                                is_available,
                                checked_at: next_checked_at(candidate, latest),
                            })
                            .returning(ToolHistoryRow::as_returning())
                            .get_result(tx)
                    })
                    .map_err(HistoryError::persistence)
            })
            .await?;

        Ok(ToolSnapshot {
            tool_id: ToolId::new(row.tool_id),
            is_available: row.is_available,
            checked_at: row.checked_at,
        })
    }

    async fn server_tally(&self, server_id: ServerId) -> HistoryResult<SnapshotTally> {
        self.run_blocking(move |connection| {
            let total: i64 = server_history::table
                .filter(server_history::server_id.eq(server_id.value()))
                .count()
                .get_result(connection)
                .map_err(HistoryError::persistence)?;
            let positive: i64 = server_history::table
                .filter(server_history::server_id.eq(server_id.value()))
                .filter(server_history::observed_up.eq(true))
                .count()
                .get_result(connection)
                .map_err(HistoryError::persistence)?;
            tally_from_counts(positive, total)
        })
        .await
    }

    async fn tool_tally(&self, tool_id: ToolId) -> HistoryResult<SnapshotTally> {
        self.run_blocking(move |connection| {
            let total: i64 = tool_history::table
                .filter(tool_history::tool_id.eq(tool_id.value()))
                .count()
                .get_result(connection)
                .map_err(HistoryError::persistence)?;
            let positive: i64 = tool_history::table
                .filter(tool_history::tool_id.eq(tool_id.value()))
                .filter(tool_history::is_available.eq(true))
                .count()
                .get_result(connection)
                .map_err(HistoryError::persistence)?;
            tally_from_counts(positive, total)
        })
        .await
    }

    async fn recent_server_snapshots(
        &self,
        server_id: ServerId,
        limit: usize,
    ) -> HistoryResult<Vec<ServerSnapshot>> {
        let row_limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run_blocking(move |connection| {
            let rows = server_history::table
                .filter(server_history::server_id.eq(server_id.value()))
                .order((server_history::checked_at.desc(), server_history::id.desc()))
                .limit(row_limit)
                .select(ServerHistoryRow::as_select())
                .load::<ServerHistoryRow>(connection)
                .map_err(HistoryError::persistence)?;
            rows.into_iter().map(row_to_server_snapshot).collect()
        })
        .await
    }
}

fn upsert_tool_row(
    connection: &mut PgConnection,
    new_row: &NewToolRow,
) -> Result<(ToolRow, UpsertKind), DieselError> {
    let existing_id = mcp_tools::table
        .filter(mcp_tools::server_id.eq(new_row.server_id))
        .filter(mcp_tools::name.eq(&new_row.name))
        .select(mcp_tools::id)
        .for_update()
        .first::<i64>(connection)
        .optional()?;

    let Some(tool_id) = existing_id else {
        let row = diesel::insert_into(mcp_tools::table)
            .values(new_row)
            .returning(ToolRow::as_returning())
            .get_result(connection)?;
        return Ok((row, UpsertKind::Inserted));
    };

    let row = diesel::update(mcp_tools::table.find(tool_id))
        .set((
            mcp_tools::description.eq(&new_row.description),
            mcp_tools::tool_type.eq(&new_row.tool_type),
            mcp_tools::input_schema.eq(&new_row.input_schema),
            mcp_tools::output_schema.eq(&new_row.output_schema),
            mcp_tools::is_available.eq(true),
            mcp_tools::modified_at.eq(new_row.modified_at),
        ))
        .returning(ToolRow::as_returning())
        .get_result(connection)?;
    Ok((row, UpsertKind::Updated))
}

fn row_to_server(row: ServerRow) -> ServerRegistryResult<MonitoredServer> {
    let ServerRow {
        id,
        name,
        base_url,
        owner,
        monitor_interval_secs,
        created_at,
        updated_at,
    } = row;

    let parsed_url = BaseUrl::parse(&base_url).map_err(ServerRegistryError::invalid_persisted_data)?;
    let parsed_owner = OwnerId::new(owner).map_err(ServerRegistryError::invalid_persisted_data)?;
    let interval_secs =
        u64::try_from(monitor_interval_secs).map_err(ServerRegistryError::invalid_persisted_data)?;

    MonitoredServer::from_persisted(PersistedServerData {
        id: ServerId::new(id),
        name,
        base_url: parsed_url,
        owner: parsed_owner,
        monitor_interval: Duration::from_secs(interval_secs),
        created_at,
        updated_at,
    })
    .map_err(ServerRegistryError::invalid_persisted_data)
}

fn row_to_credential(row: CredentialRow) -> CredentialStoreResult<Credential> {
    let CredentialRow {
        server_id,
        header_scheme,
        access_token,
        refresh_token,
        expires_at,
        oauth_client,
    } = row;

    let mut credential = Credential::new(ServerId::new(server_id), header_scheme, access_token)
        .map_err(CredentialStoreError::invalid_persisted_data)?;
    if let Some(token) = refresh_token {
        credential = credential.with_refresh_token(token);
    }
    if let Some(expiry) = expires_at {
        credential = credential.with_expires_at(expiry);
    }
    if let Some(client) = oauth_client {
        let metadata: OAuthClientMetadata = serde_json::from_value(client)
            .map_err(CredentialStoreError::invalid_persisted_data)?;
        credential = credential.with_oauth_client(metadata);
    }
    Ok(credential)
}

fn row_to_tool(row: ToolRow) -> ToolCatalogResult<ToolRecord> {
    let ToolRow {
        id,
        server_id,
        name,
        description,
        tool_type,
        input_schema,
        output_schema,
        is_available,
        total_requests,
        successful_requests,
        failed_requests,
        last_status_code,
        last_latency_ms,
        created_at,
        modified_at,
    } = row;

    let mut descriptor =
        ToolDescriptor::new(name, description).map_err(ToolCatalogError::invalid_persisted_data)?;
    if let Some(kind) = tool_type {
        descriptor = descriptor.with_tool_type(kind);
    }
    if let Some(schema) = input_schema {
        descriptor = descriptor.with_input_schema(schema);
    }
    if let Some(schema) = output_schema {
        descriptor = descriptor.with_output_schema(schema);
    }

    let stats = ToolRequestStats {
        total_requests: u64::try_from(total_requests)
            .map_err(ToolCatalogError::invalid_persisted_data)?,
        successful_requests: u64::try_from(successful_requests)
            .map_err(ToolCatalogError::invalid_persisted_data)?,
        failed_requests: u64::try_from(failed_requests)
            .map_err(ToolCatalogError::invalid_persisted_data)?,
        last_status_code: last_status_code
            .map(u16::try_from)
            .transpose()
            .map_err(ToolCatalogError::invalid_persisted_data)?,
        last_latency_ms: last_latency_ms
            .map(u64::try_from)
            .transpose()
            .map_err(ToolCatalogError::invalid_persisted_data)?,
    };

    Ok(ToolRecord::from_persisted(PersistedToolData {
        id: ToolId::new(id),
        server_id: ServerId::new(server_id),
        descriptor,
        is_available,
        stats,
        created_at,
        modified_at,
    }))
}

fn row_to_server_snapshot(row: ServerHistoryRow) -> HistoryResult<ServerSnapshot> {
    Ok(ServerSnapshot {
        server_id: ServerId::new(row.server_id),
        observed_up: row.observed_up,
        tool_count: u32::try_from(row.tool_count).map_err(HistoryError::invalid_persisted_data)?,
        checked_at: row.checked_at,
    })
}

fn tally_from_counts(positive: i64, total: i64) -> HistoryResult<SnapshotTally> {
    Ok(SnapshotTally::new(
        u64::try_from(positive).map_err(HistoryError::invalid_persisted_data)?,
        u64::try_from(total).map_err(HistoryError::invalid_persisted_data)?,
    ))
}
