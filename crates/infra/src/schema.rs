//! Schema bootstrap and demo data.

use sqlx::PgPool;
use tracing::{info, instrument};

use stockroom_auth::{hash_password, Role};
use stockroom_inventory::demo_parts;

use crate::store::{InventoryStore, NewUser, StoreError, UserStore};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username VARCHAR(50) UNIQUE NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        name VARCHAR(100) NOT NULL,
        role VARCHAR(20) NOT NULL CHECK (role IN ('Admin', 'Stock Controller', 'Viewer'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS parts (
        id BIGSERIAL PRIMARY KEY,
        part_number VARCHAR(50) NOT NULL,
        description TEXT NOT NULL,
        category VARCHAR(50) NOT NULL,
        manufacturer VARCHAR(100) NOT NULL,
        serial_number VARCHAR(100),
        batch_number VARCHAR(100),
        quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
        reorder_point INTEGER NOT NULL DEFAULT 0 CHECK (reorder_point >= 0),
        location VARCHAR(100) NOT NULL,
        condition VARCHAR(50) NOT NULL,
        cert_of_conformance VARCHAR(100),
        shelf_life DATE,
        unit_cost NUMERIC(10, 2) NOT NULL DEFAULT 0.00 CHECK (unit_cost >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id BIGSERIAL PRIMARY KEY,
        part_id BIGINT NOT NULL REFERENCES parts(id),
        type VARCHAR(10) NOT NULL CHECK (type IN ('IN', 'OUT')),
        quantity INTEGER NOT NULL CHECK (quantity >= 1),
        date TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
        reference VARCHAR(100),
        note TEXT,
        user_id BIGINT NOT NULL REFERENCES users(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id BIGSERIAL PRIMARY KEY,
        action VARCHAR(255) NOT NULL,
        date TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
        user_id BIGINT NOT NULL REFERENCES users(id)
    )
    "#,
];

/// Create the four tables if they are missing, in one transaction.
#[instrument(skip(pool), err)]
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    sqlx::query("CREATE INDEX IF NOT EXISTS transactions_part_id_idx ON transactions (part_id)")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    info!("database schema verified");
    Ok(())
}

/// A provisioned demo account.
#[derive(Debug, Clone, Copy)]
pub struct DemoUser {
    pub username: &'static str,
    pub password: &'static str,
    pub name: &'static str,
    pub role: Role,
}

pub const DEMO_USERS: [DemoUser; 3] = [
    DemoUser {
        username: "admin",
        password: "admin",
        name: "Admin User",
        role: Role::Admin,
    },
    DemoUser {
        username: "controller",
        password: "ctrl1",
        name: "Jane Martinez",
        role: Role::StockController,
    },
    DemoUser {
        username: "viewer",
        password: "view1",
        name: "Tom Chen",
        role: Role::Viewer,
    },
];

/// Seed demo users and parts when the user table is empty.
///
/// Parts go through the regular create path, so each opening quantity is
/// ledgered as an IN movement booked by the stock controller. Returns whether
/// anything was seeded.
#[instrument(skip(users, inventory), err)]
pub async fn seed_demo_data(
    users: &dyn UserStore,
    inventory: &dyn InventoryStore,
    bcrypt_cost: u32,
) -> Result<bool, StoreError> {
    if users.count_users().await? > 0 {
        return Ok(false);
    }
    info!("seeding demo data");

    let mut controller = None;
    for demo in DEMO_USERS {
        let password_hash = tokio::task::spawn_blocking(move || {
            hash_password(demo.password, bcrypt_cost)
        })
        .await
        .map_err(|e| StoreError::backend(format!("hashing task failed: {e}")))?
        .map_err(|e| StoreError::backend(e.to_string()))?;

        let user = users
            .insert_user(NewUser {
                username: demo.username.to_string(),
                password_hash,
                name: demo.name.to_string(),
                role: demo.role,
            })
            .await?;
        if user.role == Role::StockController {
            controller = Some(user.id);
        }
    }

    let actor = controller.ok_or_else(|| StoreError::backend("no stock controller seeded"))?;
    for part in demo_parts() {
        inventory.create_part(part.normalized()?, actor).await?;
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::SCHEMA;

    #[test]
    fn timestamp_defaults_use_wall_clock() {
        for statement in SCHEMA {
            assert!(!statement.contains("NOW()"), "{statement}");
        }
        assert_eq!(SCHEMA.iter().filter(|s| s.contains("DEFAULT clock_timestamp()")).count(), 2);
    }
}
