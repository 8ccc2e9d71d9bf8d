//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate username |
//! | Database (foreign key violation) | `23503` | `Conflict` | Movement or audit line for a missing user/part |
//! | Database (check constraint violation) | `23514` | `Conflict` | Negative quantity slipped past the domain check |
//! | Database (other) | Any other | `Backend` | Other database errors |
//! | PoolClosed / Other | N/A | `Backend` | Network errors, connection failures, etc. |
//!
//! ## Locking
//!
//! Every write that touches `parts.quantity` first takes the row lock with
//! `SELECT ... FOR UPDATE` inside the same transaction that appends to
//! `transactions`. A dropped future drops the transaction, which rolls back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use stockroom_audit::AuditEntry;
use stockroom_auth::{Role, User};
use stockroom_core::{AuditEntryId, DomainError, MovementId, PartId, UserId};
use stockroom_inventory::{
    plan_movement, Condition, MovementEntry, MovementType, NewPart, Part, PartAttributes,
    RecordMovement,
};

use super::{AuditStore, InventoryStore, NewUser, StoreError, UserStore};

const PART_COLUMNS: &str = "id, part_number, description, category, manufacturer, \
    serial_number, batch_number, quantity, reorder_point, location, condition, \
    cert_of_conformance, shelf_life, unit_cost";

const MOVEMENT_SELECT: &str = "SELECT t.id, t.part_id, t.type, t.quantity, t.date, \
    t.reference, t.note, t.user_id, u.name AS user_name \
    FROM transactions t LEFT JOIN users u ON u.id = t.user_id";

const AUDIT_SELECT: &str = "SELECT a.id, a.action, a.date, a.user_id, \
    u.name AS user_name, u.role AS user_role \
    FROM audit_logs a LEFT JOIN users u ON u.id = a.user_id";

// `date` is stamped with `clock_timestamp()` because `now()` is frozen at
// BEGIN, and the row lock may have been awaited since then.
const INSERT_MOVEMENT: &str = r#"
    WITH inserted AS (
        INSERT INTO transactions (part_id, type, quantity, date, reference, note, user_id)
        VALUES ($1, $2, $3, clock_timestamp(), $4, $5, $6)
        RETURNING id, part_id, type, quantity, date, reference, note, user_id
    )
    SELECT t.id, t.part_id, t.type, t.quantity, t.date, t.reference, t.note, t.user_id,
           u.name AS user_name
    FROM inserted t LEFT JOIN users u ON u.id = t.user_id
"#;

const INSERT_AUDIT: &str = r#"
    WITH inserted AS (
        INSERT INTO audit_logs (action, date, user_id) VALUES ($1, clock_timestamp(), $2)
        RETURNING id, action, date, user_id
    )
    SELECT a.id, a.action, a.date, a.user_id, u.name AS user_name, u.role AS user_role
    FROM inserted a LEFT JOIN users u ON u.id = a.user_id
"#;

/// Postgres implementation of every store port.
///
/// Cheap to clone; all clones share the pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, name, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_username", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT id, username, password_hash, name, role FROM users WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn count_users(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_users", e))?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self, user), fields(username = %user.username, role = %user.role), err)]
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, name, role
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        user_from_row(&row)
    }
}

#[async_trait]
impl InventoryStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list_parts(&self) -> Result<Vec<Part>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {PART_COLUMNS} FROM parts ORDER BY id ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_parts", e))?;

        rows.iter().map(part_from_row).collect()
    }

    #[instrument(skip(self), fields(part_id = %id), err)]
    async fn get_part(&self, id: PartId) -> Result<Option<Part>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PART_COLUMNS} FROM parts WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_part", e))?;

        row.as_ref().map(part_from_row).transpose()
    }

    #[instrument(
        skip(self, new_part),
        fields(
            part_number = %new_part.attributes.part_number,
            opening_quantity = new_part.opening_quantity
        ),
        err
    )]
    async fn create_part(&self, new_part: NewPart, actor: UserId) -> Result<Part, StoreError> {
        let mut tx = self.begin().await?;

        let attrs = &new_part.attributes;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO parts (
                part_number, description, category, manufacturer, serial_number,
                batch_number, quantity, reorder_point, location, condition,
                cert_of_conformance, shelf_life, unit_cost
            )
            VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8, $9, $10, $11, $12)
            RETURNING {PART_COLUMNS}
            "#
        ))
        .bind(&attrs.part_number)
        .bind(&attrs.description)
        .bind(&attrs.category)
        .bind(&attrs.manufacturer)
        .bind(&attrs.serial_number)
        .bind(&attrs.batch_number)
        .bind(to_int("reorderPoint", attrs.reorder_point)?)
        .bind(&attrs.location)
        .bind(attrs.condition.as_str())
        .bind(&attrs.cert_of_conformance)
        .bind(attrs.shelf_life)
        .bind(attrs.unit_cost)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_part", e))?;

        let mut part = part_from_row(&row)?;

        // The freshly inserted row is already locked by this transaction.
        if new_part.opening_quantity > 0 {
            let opening = RecordMovement::opening_balance(part.id, new_part.opening_quantity);
            let (_, adjusted) = append_movement(&mut tx, &part, &opening, actor).await?;
            part = adjusted;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(part)
    }

    #[instrument(skip(self, attributes), fields(part_id = %id), err)]
    async fn update_part(
        &self,
        id: PartId,
        attributes: PartAttributes,
        requested_quantity: Option<i64>,
    ) -> Result<Part, StoreError> {
        let mut tx = self.begin().await?;

        let current = lock_part(&mut tx, id).await?.ok_or(DomainError::NotFound)?;
        current.ensure_quantity_unchanged(requested_quantity)?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE parts SET
                part_number = $1, description = $2, category = $3, manufacturer = $4,
                serial_number = $5, batch_number = $6, reorder_point = $7, location = $8,
                condition = $9, cert_of_conformance = $10, shelf_life = $11, unit_cost = $12
            WHERE id = $13
            RETURNING {PART_COLUMNS}
            "#
        ))
        .bind(&attributes.part_number)
        .bind(&attributes.description)
        .bind(&attributes.category)
        .bind(&attributes.manufacturer)
        .bind(&attributes.serial_number)
        .bind(&attributes.batch_number)
        .bind(to_int("reorderPoint", attributes.reorder_point)?)
        .bind(&attributes.location)
        .bind(attributes.condition.as_str())
        .bind(&attributes.cert_of_conformance)
        .bind(attributes.shelf_life)
        .bind(attributes.unit_cost)
        .bind(id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_part", e))?;

        let part = part_from_row(&row)?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(part)
    }

    #[instrument(
        skip(self, cmd),
        fields(
            part_id = %cmd.part_id,
            movement_type = %cmd.movement_type,
            quantity = cmd.quantity
        ),
        err
    )]
    async fn apply_movement(
        &self,
        cmd: RecordMovement,
        actor: UserId,
    ) -> Result<(MovementEntry, Part), StoreError> {
        let mut tx = self.begin().await?;

        let part = lock_part(&mut tx, cmd.part_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        let committed = append_movement(&mut tx, &part, &cmd, actor).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(committed)
    }

    #[instrument(skip(self), err)]
    async fn list_movements(&self, part_id: Option<PartId>) -> Result<Vec<MovementEntry>, StoreError> {
        let rows = match part_id {
            Some(id) => {
                sqlx::query(&format!(
                    "{MOVEMENT_SELECT} WHERE t.part_id = $1 ORDER BY t.date DESC, t.id DESC"
                ))
                .bind(id.get())
                .fetch_all(&*self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("{MOVEMENT_SELECT} ORDER BY t.date DESC, t.id DESC"))
                    .fetch_all(&*self.pool)
                    .await
            }
        }
        .map_err(|e| map_sqlx_error("list_movements", e))?;

        rows.iter().map(movement_from_row).collect()
    }
}

#[async_trait]
impl AuditStore for PostgresStore {
    #[instrument(skip(self, action), err)]
    async fn append_audit(&self, action: String, actor: UserId) -> Result<AuditEntry, StoreError> {
        let row = sqlx::query(INSERT_AUDIT)
            .bind(&action)
            .bind(actor.get())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("append_audit", e))?;

        audit_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn list_audit(&self) -> Result<Vec<AuditEntry>, StoreError> {
        let rows = sqlx::query(&format!("{AUDIT_SELECT} ORDER BY a.date DESC, a.id DESC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_audit", e))?;

        rows.iter().map(audit_from_row).collect()
    }
}

/// Load a part and hold its row lock until the transaction ends.
async fn lock_part(
    tx: &mut Transaction<'static, Postgres>,
    id: PartId,
) -> Result<Option<Part>, StoreError> {
    let row = sqlx::query(&format!(
        "SELECT {PART_COLUMNS} FROM parts WHERE id = $1 FOR UPDATE"
    ))
    .bind(id.get())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_part", e))?;

    row.as_ref().map(part_from_row).transpose()
}

/// Append a ledger line and adjust the locked part in the same transaction.
async fn append_movement(
    tx: &mut Transaction<'static, Postgres>,
    part: &Part,
    cmd: &RecordMovement,
    actor: UserId,
) -> Result<(MovementEntry, Part), StoreError> {
    plan_movement(part, cmd)?;

    let row = sqlx::query(INSERT_MOVEMENT)
        .bind(cmd.part_id.get())
        .bind(cmd.movement_type.as_str())
        .bind(to_int("quantity", cmd.quantity)?)
        .bind(&cmd.reference)
        .bind(&cmd.note)
        .bind(actor.get())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert_movement", e))?;
    let entry = movement_from_row(&row)?;

    let part = adjust_quantity(tx, part.id, cmd.signed_delta()).await?;
    Ok((entry, part))
}

/// Only ever called after `lock_part` (or an insert) in the same transaction.
async fn adjust_quantity(
    tx: &mut Transaction<'static, Postgres>,
    id: PartId,
    delta: i64,
) -> Result<Part, StoreError> {
    let row = sqlx::query(&format!(
        "UPDATE parts SET quantity = quantity + $1 WHERE id = $2 RETURNING {PART_COLUMNS}"
    ))
    .bind(to_int("quantity", delta)?)
    .bind(id.get())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("adjust_quantity", e))?
    .ok_or(DomainError::NotFound)?;

    part_from_row(&row)
}

fn to_int(field: &str, value: i64) -> Result<i32, StoreError> {
    i32::try_from(value)
        .map_err(|_| DomainError::validation(field, "out of range").into())
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    decode::<UserRow>(row)?.try_into()
}

fn part_from_row(row: &PgRow) -> Result<Part, StoreError> {
    decode::<PartRow>(row)?.try_into()
}

fn movement_from_row(row: &PgRow) -> Result<MovementEntry, StoreError> {
    decode::<MovementRow>(row)?.try_into()
}

fn audit_from_row(row: &PgRow) -> Result<AuditEntry, StoreError> {
    decode::<AuditRow>(row)?.try_into()
}

fn decode<'r, T: FromRow<'r, PgRow>>(row: &'r PgRow) -> Result<T, StoreError> {
    T::from_row(row).map_err(|e| StoreError::backend(format!("failed to decode row: {e}")))
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23503") | Some("23514") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    name: String,
    role: String,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            name: row.try_get("name")?,
            role: row.try_get("role")?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| StoreError::backend(format!("users.role: {e}")))?;
        Ok(User {
            id: UserId::new(row.id),
            username: row.username,
            password_hash: row.password_hash,
            name: row.name,
            role,
        })
    }
}

struct PartRow {
    id: i64,
    part_number: String,
    description: String,
    category: String,
    manufacturer: String,
    serial_number: Option<String>,
    batch_number: Option<String>,
    quantity: i32,
    reorder_point: i32,
    location: String,
    condition: String,
    cert_of_conformance: Option<String>,
    shelf_life: Option<NaiveDate>,
    unit_cost: Decimal,
}

impl<'r> FromRow<'r, PgRow> for PartRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(PartRow {
            id: row.try_get("id")?,
            part_number: row.try_get("part_number")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            manufacturer: row.try_get("manufacturer")?,
            serial_number: row.try_get("serial_number")?,
            batch_number: row.try_get("batch_number")?,
            quantity: row.try_get("quantity")?,
            reorder_point: row.try_get("reorder_point")?,
            location: row.try_get("location")?,
            condition: row.try_get("condition")?,
            cert_of_conformance: row.try_get("cert_of_conformance")?,
            shelf_life: row.try_get("shelf_life")?,
            unit_cost: row.try_get("unit_cost")?,
        })
    }
}

impl TryFrom<PartRow> for Part {
    type Error = StoreError;

    fn try_from(row: PartRow) -> Result<Self, Self::Error> {
        let condition: Condition = row
            .condition
            .parse()
            .map_err(|e| StoreError::backend(format!("parts.condition: {e}")))?;
        Ok(Part {
            id: PartId::new(row.id),
            attributes: PartAttributes {
                part_number: row.part_number,
                description: row.description,
                category: row.category,
                manufacturer: row.manufacturer,
                serial_number: row.serial_number,
                batch_number: row.batch_number,
                reorder_point: i64::from(row.reorder_point),
                location: row.location,
                condition,
                cert_of_conformance: row.cert_of_conformance,
                shelf_life: row.shelf_life,
                unit_cost: row.unit_cost,
            },
            quantity: i64::from(row.quantity),
        })
    }
}

struct MovementRow {
    id: i64,
    part_id: i64,
    movement_type: String,
    quantity: i32,
    date: DateTime<Utc>,
    reference: Option<String>,
    note: Option<String>,
    user_id: i64,
    user_name: Option<String>,
}

impl<'r> FromRow<'r, PgRow> for MovementRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(MovementRow {
            id: row.try_get("id")?,
            part_id: row.try_get("part_id")?,
            movement_type: row.try_get("type")?,
            quantity: row.try_get("quantity")?,
            date: row.try_get("date")?,
            reference: row.try_get("reference")?,
            note: row.try_get("note")?,
            user_id: row.try_get("user_id")?,
            user_name: row.try_get("user_name")?,
        })
    }
}

impl TryFrom<MovementRow> for MovementEntry {
    type Error = StoreError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let movement_type: MovementType = row
            .movement_type
            .parse()
            .map_err(|e| StoreError::backend(format!("transactions.type: {e}")))?;
        Ok(MovementEntry {
            id: MovementId::new(row.id),
            part_id: PartId::new(row.part_id),
            movement_type,
            quantity: i64::from(row.quantity),
            date: row.date,
            reference: row.reference.unwrap_or_default(),
            note: row.note.unwrap_or_default(),
            user_id: UserId::new(row.user_id),
            user_name: row.user_name,
        })
    }
}

struct AuditRow {
    id: i64,
    action: String,
    date: DateTime<Utc>,
    user_id: i64,
    user_name: Option<String>,
    user_role: Option<String>,
}

impl<'r> FromRow<'r, PgRow> for AuditRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AuditRow {
            id: row.try_get("id")?,
            action: row.try_get("action")?,
            date: row.try_get("date")?,
            user_id: row.try_get("user_id")?,
            user_name: row.try_get("user_name")?,
            user_role: row.try_get("user_role")?,
        })
    }
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = StoreError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let user_role = row
            .user_role
            .map(|r| r.parse::<Role>())
            .transpose()
            .map_err(|e| StoreError::backend(format!("users.role: {e}")))?;
        Ok(AuditEntry {
            id: AuditEntryId::new(row.id),
            action: row.action,
            date: row.date,
            user_id: UserId::new(row.user_id),
            user_name: row.user_name,
            user_role,
        })
    }
}
