//! redb-based storage layer for orders, tables, payments and catalog records
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `OrderSnapshot` | Header and lines as one record |
//! | `kitchen_index` | `(restaurant_id, order_seq)` | `order_id` | Active orders, oldest first |
//! | `table_orders` | `(table_id, order_id)` | `()` | Open orders holding a table |
//! | `dining_tables` | `table_id` | `DiningTable` | Table state |
//! | `payments` | `(order_id, attempt)` | `PaymentRecord` | Payment attempts |
//! | `catalog_products` | `product_id` | `CatalogProduct` | Catalog pushed by inventory |
//! | `counters` | `name` | `u64` | Per-restaurant order numbers |
//!
//! Every mutation runs in one redb write transaction. redb allows a single
//! writer at a time and transactions are serializable, so a status check and
//! the write that depends on it cannot interleave with another writer.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::models::{CatalogProduct, DiningTable, DiningTableUpsert, TableStatus};
use shared::order::{
    ItemChange, OrderChange, OrderChangeKind, OrderItemInput, OrderSnapshot, OrderType,
    PaymentInput, PaymentMethod, PaymentRecord, PaymentState, format_order_number,
};
use shared::util::now_millis;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

use super::error::{Entity, OrderError, OrderResult};
use super::money::{price_line, recalculate_totals, resolve_item, validate_item_change};
use crate::auth::CurrentUser;
use crate::core::RestaurantScope;
use crate::services::CatalogLookup;

/// key = order_id, value = JSON-serialized OrderSnapshot
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// key = (restaurant_id, order_seq), value = order_id
const KITCHEN_INDEX_TABLE: TableDefinition<(&str, u64), &str> =
    TableDefinition::new("kitchen_index");

/// key = (table_id, order_id), value = empty (existence check)
const TABLE_ORDERS_TABLE: TableDefinition<(&str, &str), ()> = TableDefinition::new("table_orders");

/// key = table_id, value = JSON-serialized DiningTable
const DINING_TABLES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("dining_tables");

/// key = (order_id, attempt), value = JSON-serialized PaymentRecord
const PAYMENTS_TABLE: TableDefinition<(&str, u32), &[u8]> = TableDefinition::new("payments");

/// key = product_id, value = JSON-serialized CatalogProduct
const CATALOG_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("catalog_products");

/// key = counter name, value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Capacity of the change channel; slow subscribers lag instead of blocking writers
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// New order as accepted by [`OrderStore::create`]
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_type: OrderType,
    pub table_id: Option<String>,
    pub customer_id: Option<String>,
    pub items: Vec<OrderItemInput>,
    /// Explicitly created without items
    pub draft: bool,
}

/// Outcome written by [`OrderStore::resolve_payment`]
#[derive(Debug, Clone)]
pub struct PaymentResolution {
    pub state: PaymentState,
    pub change: Option<rust_decimal::Decimal>,
    pub reference: Option<String>,
    pub failure_reason: Option<String>,
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageStats {
    pub order_count: u64,
    pub kitchen_active_count: u64,
    pub table_count: u64,
    pub payment_count: u64,
}

/// Order store backed by redb
///
/// Cheap to clone; clones share the database and the change channel.
#[derive(Clone)]
pub struct OrderStore {
    db: Arc<Database>,
    changes: broadcast::Sender<OrderChange>,
}

impl std::fmt::Debug for OrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStore")
            .field("subscribers", &self.changes.receiver_count())
            .finish_non_exhaustive()
    }
}

impl OrderStore {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once `commit()`
    /// returns the write survives power loss.
    pub fn open(path: impl AsRef<Path>) -> OrderResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> OrderResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> OrderResult<Self> {
        // Create all tables so read transactions never see a missing table
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(KITCHEN_INDEX_TABLE)?;
            let _ = write_txn.open_table(TABLE_ORDERS_TABLE)?;
            let _ = write_txn.open_table(DINING_TABLES_TABLE)?;
            let _ = write_txn.open_table(PAYMENTS_TABLE)?;
            let _ = write_txn.open_table(CATALOG_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            db: Arc::new(db),
            changes,
        })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> OrderResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Change Notification ==========

    /// Subscribe to committed order changes
    pub fn subscribe(&self) -> broadcast::Receiver<OrderChange> {
        self.changes.subscribe()
    }

    /// Publish a committed change (no-op without subscribers)
    pub fn publish(&self, kind: OrderChangeKind, snapshot: &OrderSnapshot) {
        let _ = self.changes.send(OrderChange::new(kind, snapshot.clone()));
    }

    // ========== Counters ==========

    /// Increment and return the order number of a restaurant
    fn next_order_seq(&self, txn: &WriteTransaction, scope: &RestaurantScope) -> OrderResult<u64> {
        let key = format!("order_seq:{}", scope);
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table.get(key.as_str())?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(key.as_str(), next)?;
        Ok(next)
    }

    // ========== Order Records (within transaction) ==========

    /// Load an order visible in `scope`
    pub fn load_order_txn(
        &self,
        txn: &WriteTransaction,
        scope: &RestaurantScope,
        order_id: &str,
    ) -> OrderResult<OrderSnapshot> {
        let table = txn.open_table(ORDERS_TABLE)?;
        let snapshot = match table.get(order_id)? {
            Some(value) => serde_json::from_slice::<OrderSnapshot>(value.value())?,
            None => return Err(OrderError::NotFound(Entity::Order, order_id.to_string())),
        };
        if !scope.contains(&snapshot.restaurant_id) {
            return Err(OrderError::NotFound(Entity::Order, order_id.to_string()));
        }
        Ok(snapshot)
    }

    pub fn save_order_txn(&self, txn: &WriteTransaction, snapshot: &OrderSnapshot) -> OrderResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(snapshot)?;
        table.insert(snapshot.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    fn add_to_kitchen_txn(&self, txn: &WriteTransaction, snapshot: &OrderSnapshot) -> OrderResult<()> {
        let mut table = txn.open_table(KITCHEN_INDEX_TABLE)?;
        table.insert(
            (snapshot.restaurant_id.as_str(), snapshot.order_seq),
            snapshot.order_id.as_str(),
        )?;
        Ok(())
    }

    /// Drop an order from the kitchen display
    pub fn remove_from_kitchen_txn(
        &self,
        txn: &WriteTransaction,
        snapshot: &OrderSnapshot,
    ) -> OrderResult<()> {
        let mut table = txn.open_table(KITCHEN_INDEX_TABLE)?;
        table.remove((snapshot.restaurant_id.as_str(), snapshot.order_seq))?;
        Ok(())
    }

    /// Release the table held by `snapshot`
    ///
    /// The order's hold is always dropped. The table itself only goes back to
    /// `available` when no other open order holds it and it is still
    /// `occupied`; tables staff moved to maintenance or cleaning stay as they are.
    pub fn release_table_txn(
        &self,
        txn: &WriteTransaction,
        snapshot: &OrderSnapshot,
    ) -> OrderResult<Option<DiningTable>> {
        let Some(table_id) = snapshot.table_id.as_deref() else {
            return Ok(None);
        };

        let still_held = {
            let mut index = txn.open_table(TABLE_ORDERS_TABLE)?;
            index.remove((table_id, snapshot.order_id.as_str()))?;
            table_is_held(&index, table_id)?
        };
        if still_held {
            tracing::debug!(table_id, order_id = %snapshot.order_id, "Table still held by another order");
            return Ok(None);
        }

        let mut tables = txn.open_table(DINING_TABLES_TABLE)?;
        let mut table = match tables.get(table_id)? {
            Some(value) => serde_json::from_slice::<DiningTable>(value.value())?,
            None => return Ok(None),
        };
        if table.status != TableStatus::Occupied {
            return Ok(None);
        }
        table.status = TableStatus::Available;
        let value = serde_json::to_vec(&table)?;
        tables.insert(table_id, value.as_slice())?;
        tracing::info!(table_id, order_id = %snapshot.order_id, "Table released");
        Ok(Some(table))
    }

    /// Sum of the accepted payment attempts of the order
    pub fn accepted_payment_total_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> OrderResult<rust_decimal::Decimal> {
        let table = txn.open_table(PAYMENTS_TABLE)?;
        let mut total = rust_decimal::Decimal::ZERO;
        for result in table.range((order_id, 0u32)..=(order_id, u32::MAX))? {
            let (_key, value) = result?;
            let record: PaymentRecord = serde_json::from_slice(value.value())?;
            if record.state == PaymentState::Accepted {
                total += record.amount;
            }
        }
        Ok(total)
    }

    // ========== Orders ==========

    /// Create an order with its lines in one transaction
    pub fn create(
        &self,
        scope: &RestaurantScope,
        actor: &CurrentUser,
        new: NewOrder,
        catalog: &dyn CatalogLookup,
    ) -> OrderResult<OrderSnapshot> {
        if new.items.is_empty() && !new.draft {
            return Err(OrderError::Validation(
                "an order needs at least one item unless it is a draft".into(),
            ));
        }
        if new.draft && !new.items.is_empty() {
            return Err(OrderError::Validation("a draft cannot carry items".into()));
        }
        match (new.order_type.requires_table(), new.table_id.as_deref()) {
            (true, None) => {
                return Err(OrderError::Validation("dine-in orders require a table".into()));
            }
            (false, Some(_)) => {
                return Err(OrderError::Validation(
                    "only dine-in orders can hold a table".into(),
                ));
            }
            _ => {}
        }

        let items = new
            .items
            .iter()
            .map(|input| resolve_item(scope, input, catalog))
            .collect::<OrderResult<Vec<_>>>()?;

        let txn = self.begin_write()?;

        if let Some(table_id) = new.table_id.as_deref() {
            self.seat_table_txn(&txn, scope, table_id)?;
        }

        let order_seq = self.next_order_seq(&txn, scope)?;
        let now = now_millis();
        let mut snapshot = OrderSnapshot {
            order_id: uuid::Uuid::new_v4().to_string(),
            restaurant_id: scope.as_str().to_string(),
            created_by: actor.id.clone(),
            customer_id: new.customer_id,
            table_id: new.table_id,
            order_number: format_order_number(order_seq),
            order_seq,
            order_type: new.order_type,
            status: Default::default(),
            kitchen_status: Default::default(),
            is_draft: new.draft,
            items,
            subtotal: Default::default(),
            tax: Default::default(),
            total: Default::default(),
            cancel_reason: None,
            created_at: now,
            updated_at: now,
            kitchen_updated_at: now,
            status_updated_at: now,
        };
        recalculate_totals(&mut snapshot);

        self.save_order_txn(&txn, &snapshot)?;
        if !snapshot.is_draft {
            self.add_to_kitchen_txn(&txn, &snapshot)?;
        }
        if let Some(table_id) = snapshot.table_id.as_deref() {
            let mut index = txn.open_table(TABLE_ORDERS_TABLE)?;
            index.insert((table_id, snapshot.order_id.as_str()), ())?;
        }
        txn.commit()?;

        tracing::info!(
            order_id = %snapshot.order_id,
            order_number = %snapshot.order_number,
            restaurant_id = %snapshot.restaurant_id,
            actor = %actor.id,
            items = snapshot.items.len(),
            draft = snapshot.is_draft,
            "Order created"
        );
        self.publish(OrderChangeKind::Created, &snapshot);
        Ok(snapshot)
    }

    /// Check a table can take a new order and mark it occupied
    fn seat_table_txn(
        &self,
        txn: &WriteTransaction,
        scope: &RestaurantScope,
        table_id: &str,
    ) -> OrderResult<()> {
        let held = {
            let index = txn.open_table(TABLE_ORDERS_TABLE)?;
            table_is_held(&index, table_id)?
        };

        let mut tables = txn.open_table(DINING_TABLES_TABLE)?;
        let mut table = match tables.get(table_id)? {
            Some(value) => serde_json::from_slice::<DiningTable>(value.value())?,
            None => return Err(OrderError::NotFound(Entity::Table, table_id.to_string())),
        };
        if !scope.contains(&table.restaurant_id) {
            return Err(OrderError::Validation(format!(
                "table {} belongs to another restaurant",
                table_id
            )));
        }
        if held || !table.status.is_seatable() {
            return Err(OrderError::TableUnavailable(table_id.to_string()));
        }

        table.status = TableStatus::Occupied;
        let value = serde_json::to_vec(&table)?;
        tables.insert(table_id, value.as_slice())?;
        Ok(())
    }

    /// Get an order visible in `scope`
    pub fn get(&self, scope: &RestaurantScope, order_id: &str) -> OrderResult<OrderSnapshot> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let snapshot = match table.get(order_id)? {
            Some(value) => serde_json::from_slice::<OrderSnapshot>(value.value())?,
            None => return Err(OrderError::NotFound(Entity::Order, order_id.to_string())),
        };
        if !scope.contains(&snapshot.restaurant_id) {
            return Err(OrderError::NotFound(Entity::Order, order_id.to_string()));
        }
        Ok(snapshot)
    }

    /// Orders the kitchen still has to finish, oldest first
    ///
    /// Index and records are read in one read transaction, so the result is a
    /// consistent point-in-time view.
    pub fn list_active_for_kitchen(&self, scope: &RestaurantScope) -> OrderResult<Vec<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(KITCHEN_INDEX_TABLE)?;
        let orders = read_txn.open_table(ORDERS_TABLE)?;

        let restaurant_id = scope.as_str();
        let mut snapshots = Vec::new();
        for result in index.range((restaurant_id, 0u64)..=(restaurant_id, u64::MAX))? {
            let (_key, order_id) = result?;
            let Some(value) = orders.get(order_id.value())? else {
                tracing::warn!(
                    restaurant_id,
                    order_id = order_id.value(),
                    "Kitchen index points at a missing order"
                );
                continue;
            };
            let snapshot: OrderSnapshot = serde_json::from_slice(value.value())?;
            if snapshot.is_kitchen_active() {
                snapshots.push(snapshot);
            }
        }
        Ok(snapshots)
    }

    /// Append lines to an open order
    pub fn append_items(
        &self,
        scope: &RestaurantScope,
        order_id: &str,
        items: &[OrderItemInput],
        catalog: &dyn CatalogLookup,
    ) -> OrderResult<OrderSnapshot> {
        if items.is_empty() {
            return Err(OrderError::Validation("no items to append".into()));
        }
        let lines = items
            .iter()
            .map(|input| resolve_item(scope, input, catalog))
            .collect::<OrderResult<Vec<_>>>()?;

        let txn = self.begin_write()?;
        let mut snapshot = self.load_order_txn(&txn, scope, order_id)?;
        if !snapshot.is_open() {
            return Err(OrderError::Immutable(order_id.to_string()));
        }
        if !snapshot.kitchen_status.is_active() {
            // The kitchen would never see these lines
            return Err(OrderError::invalid_transition(
                snapshot.kitchen_status,
                "append items",
            ));
        }

        snapshot.items.extend(lines);
        let was_draft = snapshot.is_draft;
        snapshot.is_draft = false;
        snapshot.updated_at = now_millis();
        recalculate_totals(&mut snapshot);

        self.save_order_txn(&txn, &snapshot)?;
        if was_draft {
            self.add_to_kitchen_txn(&txn, &snapshot)?;
        }
        txn.commit()?;

        tracing::info!(order_id, added = items.len(), "Items appended");
        self.publish(OrderChangeKind::ItemsChanged, &snapshot);
        Ok(snapshot)
    }

    /// Modify lines of an open order
    ///
    /// All changes apply atomically; any failing change rejects the batch.
    pub fn update_items(
        &self,
        scope: &RestaurantScope,
        order_id: &str,
        changes: &[ItemChange],
    ) -> OrderResult<OrderSnapshot> {
        if changes.is_empty() {
            return Err(OrderError::Validation("no item changes".into()));
        }
        for change in changes {
            validate_item_change(change)?;
        }

        let txn = self.begin_write()?;
        let mut snapshot = self.load_order_txn(&txn, scope, order_id)?;
        if !snapshot.is_open() {
            return Err(OrderError::Immutable(order_id.to_string()));
        }

        for change in changes {
            let position = snapshot
                .items
                .iter()
                .position(|i| i.item_id == change.item_id())
                .ok_or_else(|| OrderError::NotFound(Entity::OrderItem, change.item_id().to_string()))?;
            match change {
                ItemChange::SetQuantity { quantity, .. } => {
                    let item = &mut snapshot.items[position];
                    item.quantity = *quantity;
                    price_line(item);
                }
                ItemChange::SetNotes { notes, .. } => {
                    snapshot.items[position].notes = notes.clone().filter(|n| !n.is_empty());
                }
                ItemChange::Remove { .. } => {
                    snapshot.items.remove(position);
                }
            }
        }

        if snapshot.items.is_empty() && !snapshot.is_draft {
            return Err(OrderError::Validation(
                "cannot remove the last item; cancel the order instead".into(),
            ));
        }

        snapshot.updated_at = now_millis();
        recalculate_totals(&mut snapshot);
        self.save_order_txn(&txn, &snapshot)?;
        txn.commit()?;

        tracing::info!(order_id, changes = changes.len(), "Items updated");
        self.publish(OrderChangeKind::ItemsChanged, &snapshot);
        Ok(snapshot)
    }

    // ========== Dining Tables ==========

    /// Insert or update a table pushed by the table/area collaborator
    ///
    /// Status of an existing table is kept; it belongs to the order lifecycle.
    pub fn upsert_table(
        &self,
        scope: &RestaurantScope,
        table_id: &str,
        upsert: DiningTableUpsert,
    ) -> OrderResult<DiningTable> {
        let txn = self.begin_write()?;
        let table = {
            let mut tables = txn.open_table(DINING_TABLES_TABLE)?;
            let existing = match tables.get(table_id)? {
                Some(value) => Some(serde_json::from_slice::<DiningTable>(value.value())?),
                None => None,
            };
            let status = match &existing {
                Some(t) if !scope.contains(&t.restaurant_id) => {
                    return Err(OrderError::NotFound(Entity::Table, table_id.to_string()));
                }
                Some(t) => t.status,
                None => upsert.status.unwrap_or_default(),
            };
            let table = DiningTable {
                id: table_id.to_string(),
                restaurant_id: scope.as_str().to_string(),
                area_id: upsert.area_id,
                name: upsert.name,
                capacity: upsert.capacity,
                status,
            };
            let value = serde_json::to_vec(&table)?;
            tables.insert(table_id, value.as_slice())?;
            table
        };
        txn.commit()?;
        Ok(table)
    }

    pub fn get_table(&self, scope: &RestaurantScope, table_id: &str) -> OrderResult<DiningTable> {
        let read_txn = self.db.begin_read()?;
        let tables = read_txn.open_table(DINING_TABLES_TABLE)?;
        match tables.get(table_id)? {
            Some(value) => {
                let table: DiningTable = serde_json::from_slice(value.value())?;
                if scope.contains(&table.restaurant_id) {
                    Ok(table)
                } else {
                    Err(OrderError::NotFound(Entity::Table, table_id.to_string()))
                }
            }
            None => Err(OrderError::NotFound(Entity::Table, table_id.to_string())),
        }
    }

    /// All tables of a restaurant, by name
    pub fn list_tables(&self, scope: &RestaurantScope) -> OrderResult<Vec<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let tables = read_txn.open_table(DINING_TABLES_TABLE)?;
        let mut result = Vec::new();
        for entry in tables.iter()? {
            let (_key, value) = entry?;
            let table: DiningTable = serde_json::from_slice(value.value())?;
            if scope.contains(&table.restaurant_id) {
                result.push(table);
            }
        }
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    /// Conditional status change by staff
    ///
    /// A table cannot be made `available` while an open order holds it.
    pub fn set_table_status(
        &self,
        scope: &RestaurantScope,
        table_id: &str,
        expected: TableStatus,
        target: TableStatus,
    ) -> OrderResult<DiningTable> {
        let txn = self.begin_write()?;
        let held = {
            let index = txn.open_table(TABLE_ORDERS_TABLE)?;
            table_is_held(&index, table_id)?
        };
        let table = {
            let mut tables = txn.open_table(DINING_TABLES_TABLE)?;
            let mut table = match tables.get(table_id)? {
                Some(value) => serde_json::from_slice::<DiningTable>(value.value())?,
                None => return Err(OrderError::NotFound(Entity::Table, table_id.to_string())),
            };
            if !scope.contains(&table.restaurant_id) {
                return Err(OrderError::NotFound(Entity::Table, table_id.to_string()));
            }
            if table.status != expected {
                return Err(OrderError::conflict(table_id, expected, table.status));
            }
            if target == TableStatus::Available && held {
                return Err(OrderError::TableUnavailable(table_id.to_string()));
            }
            table.status = target;
            let value = serde_json::to_vec(&table)?;
            tables.insert(table_id, value.as_slice())?;
            table
        };
        txn.commit()?;

        tracing::info!(table_id, from = %expected, to = %target, "Table status changed");
        Ok(table)
    }

    // ========== Payments ==========

    /// Record a new `pending` payment attempt
    pub fn record_payment_attempt(
        &self,
        scope: &RestaurantScope,
        order_id: &str,
        actor: &CurrentUser,
        input: &PaymentInput,
    ) -> OrderResult<PaymentRecord> {
        let txn = self.begin_write()?;
        let snapshot = self.load_order_txn(&txn, scope, order_id)?;
        let record = {
            let mut payments = txn.open_table(PAYMENTS_TABLE)?;
            let last_attempt = match payments
                .range((order_id, 0u32)..=(order_id, u32::MAX))?
                .next_back()
            {
                Some(entry) => entry?.0.value().1,
                None => 0,
            };
            let record = PaymentRecord {
                payment_id: uuid::Uuid::new_v4().to_string(),
                order_id: order_id.to_string(),
                restaurant_id: snapshot.restaurant_id.clone(),
                attempt: last_attempt + 1,
                method: input.method,
                amount: input.amount,
                tendered: match input.method {
                    PaymentMethod::Cash => Some(input.tendered.unwrap_or(input.amount)),
                    _ => None,
                },
                change: None,
                reference: input.reference.clone(),
                state: PaymentState::Pending,
                failure_reason: None,
                recorded_by: actor.id.clone(),
                created_at: now_millis(),
                resolved_at: None,
            };
            let value = serde_json::to_vec(&record)?;
            payments.insert((order_id, record.attempt), value.as_slice())?;
            record
        };
        txn.commit()?;
        Ok(record)
    }

    /// Write the outcome of a payment attempt
    ///
    /// `pending -> accepted | rejected` and `accepted -> voided` only.
    pub fn resolve_payment(
        &self,
        scope: &RestaurantScope,
        order_id: &str,
        attempt: u32,
        resolution: PaymentResolution,
    ) -> OrderResult<PaymentRecord> {
        let txn = self.begin_write()?;
        self.load_order_txn(&txn, scope, order_id)?;
        let record = {
            let mut payments = txn.open_table(PAYMENTS_TABLE)?;
            let mut record = match payments.get((order_id, attempt))? {
                Some(value) => serde_json::from_slice::<PaymentRecord>(value.value())?,
                None => {
                    return Err(OrderError::NotFound(
                        Entity::Payment,
                        format!("{}#{}", order_id, attempt),
                    ));
                }
            };
            let allowed = matches!(
                (record.state, resolution.state),
                (PaymentState::Pending, PaymentState::Accepted)
                    | (PaymentState::Pending, PaymentState::Rejected)
                    | (PaymentState::Accepted, PaymentState::Voided)
            );
            if !allowed {
                return Err(OrderError::invalid_transition(
                    record.state,
                    resolution.state,
                ));
            }
            record.state = resolution.state;
            if resolution.change.is_some() {
                record.change = resolution.change;
            }
            if resolution.reference.is_some() {
                record.reference = resolution.reference;
            }
            record.failure_reason = resolution.failure_reason;
            record.resolved_at = Some(now_millis());
            let value = serde_json::to_vec(&record)?;
            payments.insert((order_id, attempt), value.as_slice())?;
            record
        };
        txn.commit()?;
        Ok(record)
    }

    /// Payment attempts of an order, oldest first
    pub fn list_payments(&self, scope: &RestaurantScope, order_id: &str) -> OrderResult<Vec<PaymentRecord>> {
        // Scope check on the order itself
        self.get(scope, order_id)?;

        let read_txn = self.db.begin_read()?;
        let payments = read_txn.open_table(PAYMENTS_TABLE)?;
        let mut records = Vec::new();
        for result in payments.range((order_id, 0u32)..=(order_id, u32::MAX))? {
            let (_key, value) = result?;
            records.push(serde_json::from_slice::<PaymentRecord>(value.value())?);
        }
        Ok(records)
    }

    // ========== Catalog ==========

    pub fn put_product(&self, product: &CatalogProduct) -> OrderResult<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(CATALOG_TABLE)?;
            let value = serde_json::to_vec(product)?;
            table.insert(product.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// All persisted catalog products (cache warmup)
    pub fn load_products(&self) -> OrderResult<Vec<CatalogProduct>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CATALOG_TABLE)?;
        let mut products = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            products.push(serde_json::from_slice::<CatalogProduct>(value.value())?);
        }
        Ok(products)
    }

    // ========== Statistics ==========

    pub fn get_stats(&self) -> OrderResult<StorageStats> {
        let read_txn = self.db.begin_read()?;
        Ok(StorageStats {
            order_count: read_txn.open_table(ORDERS_TABLE)?.len()?,
            kitchen_active_count: read_txn.open_table(KITCHEN_INDEX_TABLE)?.len()?,
            table_count: read_txn.open_table(DINING_TABLES_TABLE)?.len()?,
            payment_count: read_txn.open_table(PAYMENTS_TABLE)?.len()?,
        })
    }
}

/// Whether any open order still holds `table_id`
fn table_is_held(
    index: &redb::Table<'_, (&'static str, &'static str), ()>,
    table_id: &str,
) -> OrderResult<bool> {
    match index.range((table_id, "")..)?.next() {
        Some(entry) => {
            let (key, _) = entry?;
            Ok(key.value().0 == table_id)
        }
        None => Ok(false),
    }
}
