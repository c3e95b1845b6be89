//! `PostgreSQL`-backed client store.

use atendimentos_core::store::{ClientCriteria, ClientStore, StoreError, StoreFuture};
use atendimentos_core::{ClientChanges, ClientId, ClientRecord, Cpf, NewClient};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

const COLUMNS: &str =
    "id, nome, cpf, email, cidade, estado_uf, uso_plataforma, area_atuacao, unidade, created_at";

/// Client store on a `PostgreSQL` connection pool.
///
/// CPF uniqueness is backed by the `clients_cpf_unique` index, so concurrent
/// creates with the same CPF cannot both succeed: the loser gets
/// [`StoreError::DuplicateCpf`].
///
/// # Example
///
/// ```no_run
/// use atendimentos_postgres::PostgresClientStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresClientStore::connect("postgres://localhost/atendimentos", 10, 30).await?;
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PostgresClientStore {
    pool: PgPool,
}

impl PostgresClientStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the database cannot be reached.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| unavailable("connect", &e))?;
        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if migrations fail.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find(&self, criteria: ClientCriteria) -> Result<Vec<ClientRecord>, StoreError> {
        let predicate = match &criteria {
            ClientCriteria::Id(_) => "id = $1",
            ClientCriteria::Cpf(_) => "cpf = $1",
            ClientCriteria::Email(_) => "email = $1",
            ClientCriteria::Name(_) => "lower(btrim(nome)) = lower(btrim($1))",
        };
        let sql = format!("SELECT {COLUMNS} FROM clients WHERE {predicate} ORDER BY created_at");

        let query = sqlx::query(&sql);
        let query = match criteria {
            ClientCriteria::Id(id) => query.bind(*id.as_uuid()),
            ClientCriteria::Cpf(cpf) => query.bind(cpf.as_str().to_string()),
            ClientCriteria::Email(text) | ClientCriteria::Name(text) => query.bind(text),
        };

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| unavailable("find_clients", &e))?;

        rows.iter().map(row_to_client).collect()
    }

    async fn create(&self, fields: NewClient) -> Result<ClientRecord, StoreError> {
        let cpf = fields.cpf.clone();
        let row = sqlx::query(&format!(
            "INSERT INTO clients \
                 (id, nome, cpf, email, cidade, estado_uf, uso_plataforma, area_atuacao, unidade) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(fields.nome)
        .bind(fields.cpf.map(|c| c.as_str().to_string()))
        .bind(fields.email)
        .bind(fields.cidade)
        .bind(fields.estado_uf)
        .bind(fields.uso_plataforma)
        .bind(fields.area_atuacao)
        .bind(fields.unidade)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("create_client", &e, cpf))?;

        metrics::counter!("client_store.writes", "operation" => "create").increment(1);
        row_to_client(&row)
    }

    async fn update(&self, id: ClientId, changes: ClientChanges) -> Result<ClientRecord, StoreError> {
        let cpf = changes.cpf.clone();
        let row = sqlx::query(&format!(
            "UPDATE clients SET \
                 nome = COALESCE($2, nome), \
                 cpf = COALESCE($3, cpf), \
                 email = COALESCE($4, email), \
                 cidade = COALESCE($5, cidade), \
                 estado_uf = COALESCE($6, estado_uf), \
                 uso_plataforma = COALESCE($7, uso_plataforma), \
                 area_atuacao = COALESCE($8, area_atuacao), \
                 unidade = COALESCE($9, unidade) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(changes.nome)
        .bind(changes.cpf.map(|c| c.as_str().to_string()))
        .bind(changes.email)
        .bind(changes.cidade)
        .bind(changes.estado_uf)
        .bind(changes.uso_plataforma)
        .bind(changes.area_atuacao)
        .bind(changes.unidade)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error("update_client", &e, cpf))?
        .ok_or(StoreError::NotFound(id))?;

        metrics::counter!("client_store.writes", "operation" => "update").increment(1);
        row_to_client(&row)
    }
}

impl ClientStore for PostgresClientStore {
    fn find_clients(&self, criteria: ClientCriteria) -> StoreFuture<'_, Vec<ClientRecord>> {
        Box::pin(self.find(criteria))
    }

    fn create_client(&self, fields: NewClient) -> StoreFuture<'_, ClientRecord> {
        Box::pin(self.create(fields))
    }

    fn update_client(&self, id: ClientId, changes: ClientChanges) -> StoreFuture<'_, ClientRecord> {
        Box::pin(self.update(id, changes))
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(|e| unavailable("ping", &e))?;
            Ok(())
        })
    }
}

fn row_to_client(row: &PgRow) -> Result<ClientRecord, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Unavailable(format!("Failed to decode client row: {e}"));

    let cpf = row
        .try_get::<Option<String>, _>("cpf")
        .map_err(decode)?
        .map(|raw| Cpf::parse(&raw))
        .transpose()
        .map_err(|e| StoreError::Unavailable(format!("Stored CPF is invalid: {e}")))?;

    Ok(ClientRecord {
        id: ClientId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        nome: row.try_get("nome").map_err(decode)?,
        cpf,
        email: row.try_get("email").map_err(decode)?,
        cidade: row.try_get("cidade").map_err(decode)?,
        estado_uf: row.try_get("estado_uf").map_err(decode)?,
        uso_plataforma: row.try_get("uso_plataforma").map_err(decode)?,
        area_atuacao: row.try_get("area_atuacao").map_err(decode)?,
        unidade: row.try_get("unidade").map_err(decode)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
    })
}

fn unavailable(operation: &'static str, error: &sqlx::Error) -> StoreError {
    tracing::error!(operation, error = %error, "Client store query failed");
    metrics::counter!("client_store.errors", "operation" => operation).increment(1);
    StoreError::Unavailable(format!("{operation} failed: {error}"))
}

fn write_error(operation: &'static str, error: &sqlx::Error, cpf: Option<Cpf>) -> StoreError {
    if let sqlx::Error::Database(db_err) = error {
        if db_err.is_unique_violation() {
            if let Some(cpf) = cpf {
                tracing::warn!(operation, "CPF uniqueness constraint rejected write");
                metrics::counter!("client_store.cpf_conflicts", "operation" => operation)
                    .increment(1);
                return StoreError::DuplicateCpf(cpf);
            }
        }
    }
    unavailable(operation, error)
}
