//! Store selection and service wiring.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use stockroom_auth::{Hs256SessionKeys, TokenDenylist};
use stockroom_infra::{
    ensure_schema, seed_demo_data, AuditRecorder, AuditStore, CredentialVerifier, InMemoryStore,
    InventoryStore, PartCatalog, PostgresStore, StockMutationCoordinator, StoreError, UserStore,
};

use crate::config::{AppConfig, Storage};

/// Everything a handler can reach, shared behind one `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<dyn UserStore>,
    pub credentials: CredentialVerifier,
    pub catalog: PartCatalog,
    pub coordinator: StockMutationCoordinator,
    pub audit: AuditRecorder,
    pub session_keys: Arc<Hs256SessionKeys>,
    pub denylist: Arc<TokenDenylist>,
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    match &config.storage {
        Storage::InMemory => {
            tracing::info!("using in-memory stores");
            assemble(Arc::new(InMemoryStore::new()), config).await
        }
        Storage::Postgres { database_url } => {
            tracing::info!("using postgres stores");
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await?;
            ensure_schema(&pool).await?;
            assemble(Arc::new(PostgresStore::new(pool)), config).await
        }
    }
}

async fn assemble<S>(store: Arc<S>, config: &AppConfig) -> anyhow::Result<AppServices>
where
    S: UserStore + InventoryStore + AuditStore + 'static,
{
    let users: Arc<dyn UserStore> = store.clone();
    let inventory: Arc<dyn InventoryStore> = store.clone();
    let audit_store: Arc<dyn AuditStore> = store;

    if config.seed_demo_data {
        seed(users.as_ref(), inventory.as_ref(), config.bcrypt_cost).await?;
    }

    let audit = AuditRecorder::new(audit_store);
    Ok(AppServices {
        credentials: CredentialVerifier::new(users.clone(), config.bcrypt_cost),
        catalog: PartCatalog::new(inventory.clone(), audit.clone()),
        coordinator: StockMutationCoordinator::new(inventory, audit.clone()),
        audit,
        users,
        session_keys: Arc::new(Hs256SessionKeys::with_ttl(
            config.jwt_secret.as_bytes(),
            config.token_ttl,
        )),
        denylist: Arc::new(TokenDenylist::new()),
    })
}

async fn seed(
    users: &dyn UserStore,
    inventory: &dyn InventoryStore,
    bcrypt_cost: u32,
) -> Result<(), StoreError> {
    if seed_demo_data(users, inventory, bcrypt_cost).await? {
        tracing::info!("demo users and parts seeded");
    }
    Ok(())
}
