//! Orders and scheduled orders
//!
//! `orders` holds the live orders; `orders_closed` holds the ones placed
//! while the restaurant was closed, each with a `scheduled_date`.

use super::{AdminContext, require_min_chars};
use crate::store::{Query, Table, field, to_record};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use shared::models::{
    MenuItem, Order, OrderCreate, OrderLine, OrderStatus, OrderTotals, UNNAMED_ITEM,
};
use shared::util::day_window;
use shared::{AppError, AppResult, ErrorCode};
use tracing::{debug, info, instrument, warn};

const INVALID_ITEMS: &str = "Formato JSON inválido. Deve ser um array de itens.";
const NO_ITEMS: &str = "Nenhum item";
const TOTAL_TOO_LARGE: &str = "O total excede o valor máximo permitido";

/// Order listing filters; `None` means "any"
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Calendar day of `created_at`
    pub date: Option<NaiveDate>,
}

impl OrderFilter {
    fn query(&self) -> Query {
        let mut query = Query::table(Table::Orders);
        if let Some(status) = self.status {
            query = query.eq("status", status.as_str());
        }
        if let Some(date) = self.date {
            let (start, end) = day_window(date);
            query = query.gte("created_at", start).lte("created_at", end);
        }
        query.order_desc("created_at")
    }
}

// =============================================================================
// Receipt lines and totals
// =============================================================================

/// Item entry as stored inside an order, every field optional
#[derive(Debug, Default)]
struct StoredItem {
    id: Option<String>,
    name: Option<String>,
    price: Option<Decimal>,
    quantity: Option<u32>,
}

impl StoredItem {
    fn parse(value: &Value) -> Self {
        let id = match value.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let quantity = value
            .get("quantity")
            .and_then(Value::as_u64)
            .and_then(|q| u32::try_from(q).ok());
        Self {
            id,
            name,
            price: value.get("price").and_then(decimal_of),
            quantity,
        }
    }
}

fn decimal_of(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Item entries of an order
///
/// `items` is either a JSON array or the same array as JSON text.
/// Anything else yields no entries.
fn stored_items(items: &Value) -> Vec<StoredItem> {
    let parsed;
    let items = match items {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) => {
                parsed = value;
                &parsed
            }
            Err(e) => {
                warn!(error = %e, "Order items are not valid JSON");
                return Vec::new();
            }
        },
        other => other,
    };
    match items.as_array() {
        Some(entries) => entries.iter().map(StoredItem::parse).collect(),
        None => Vec::new(),
    }
}

/// Ids referenced by an order's items
pub fn parse_item_refs(items: &Value) -> Vec<String> {
    stored_items(items)
        .into_iter()
        .filter_map(|item| item.id)
        .collect()
}

/// Receipt lines from stored items and the menu rows they reference
///
/// The menu row wins over the copy stored in the order; zero prices and
/// quantities count as missing. Orders whose items carry no id at all
/// have no lines.
pub fn build_lines(items: &Value, menu: &[MenuItem]) -> Vec<OrderLine> {
    let stored = stored_items(items);
    if stored.iter().all(|item| item.id.is_none()) {
        return Vec::new();
    }

    stored
        .into_iter()
        .map(|item| {
            let menu_item = item
                .id
                .as_deref()
                .and_then(|id| menu.iter().find(|m| m.id == id));
            let name = menu_item
                .map(|m| m.name.clone())
                .filter(|n| !n.is_empty())
                .or(item.name)
                .unwrap_or_else(|| UNNAMED_ITEM.to_string());
            let price = menu_item
                .map(|m| m.price)
                .filter(|p| !p.is_zero())
                .or(item.price.filter(|p| !p.is_zero()))
                .unwrap_or(Decimal::ZERO);
            let quantity = item.quantity.filter(|&q| q > 0).unwrap_or(1);
            let subtotal = price
                .checked_mul(Decimal::from(quantity))
                .unwrap_or_else(|| {
                    warn!(item = ?item.id, %price, quantity, "Line subtotal overflows, shown as zero");
                    Decimal::ZERO
                });
            OrderLine {
                id: item.id,
                name,
                price,
                quantity,
                subtotal,
            }
        })
        .collect()
}

/// One-line summary of an order's items, e.g. `2x Pizza, 1x Suco`
///
/// Uses the names stored in the order itself; a missing quantity counts
/// as one.
pub fn format_items(items: &Value) -> String {
    let stored = stored_items(items);
    if stored.is_empty() {
        return NO_ITEMS.to_string();
    }
    stored
        .iter()
        .map(|item| {
            format!(
                "{}x {}",
                item.quantity.unwrap_or(1),
                item.name.as_deref().unwrap_or(UNNAMED_ITEM)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Amounts of an order; the total stands in for a missing order amount
pub fn order_totals(order: &Order) -> OrderTotals {
    let mut order_amount = order.order_amount.unwrap_or_default();
    let delivery_fee = order.delivery_fee.unwrap_or_default();
    let total_amount = order.total_amount.unwrap_or_default();
    if order_amount.is_zero() && total_amount > Decimal::ZERO {
        order_amount = total_amount;
    }
    OrderTotals {
        order_amount,
        delivery_fee,
        total_amount,
    }
}

// =============================================================================
// OrderService
// =============================================================================

#[derive(Clone)]
pub struct OrderService {
    ctx: AdminContext,
}

impl OrderService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    /// Live orders, newest first
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &OrderFilter) -> Vec<Order> {
        let result = self.ctx.fetch(&filter.query()).await;
        self.ctx
            .settle(result, "Não foi possível carregar os pedidos.")
            .unwrap_or_default()
    }

    /// Scheduled orders by scheduled date, optionally for one day
    #[instrument(skip(self))]
    pub async fn scheduled(&self, date: Option<NaiveDate>) -> Vec<Order> {
        let mut query = Query::table(Table::OrdersClosed).not_null("scheduled_date");
        if let Some(date) = date {
            query = query.eq("scheduled_date", date.format("%Y-%m-%d").to_string());
        }
        let result = self.ctx.fetch(&query.order_asc("scheduled_date")).await;
        self.ctx
            .settle(result, "Não foi possível carregar os pedidos agendados.")
            .unwrap_or_default()
    }

    /// Order by id, live or scheduled
    pub async fn get(&self, id: &str) -> Option<Order> {
        let result = self.try_get(id).await;
        self.ctx
            .settle(result, "Não foi possível carregar o pedido.")
    }

    async fn try_get(&self, id: &str) -> AppResult<Order> {
        for table in [Table::Orders, Table::OrdersClosed] {
            if let Some(order) = self.ctx.find(table, id).await? {
                return Ok(order);
            }
        }
        Err(AppError::new(ErrorCode::OrderNotFound).with_detail("id", id))
    }

    /// Register an order; orders with a scheduled date go to `orders_closed`
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: OrderCreate) -> Option<Order> {
        let result = self.try_create(input).await;
        let order = self
            .ctx
            .settle(result, "Não foi possível salvar o pedido.")?;
        self.ctx
            .success("Pedido criado", "O pedido foi criado com sucesso para testes.");
        Some(order)
    }

    async fn try_create(&self, input: OrderCreate) -> AppResult<Order> {
        let customer_name = require_min_chars(
            &input.customer_name,
            3,
            "Nome precisa ter no mínimo 3 caracteres",
        )?;
        let customer_phone = require_min_chars(&input.customer_phone, 8, "Telefone inválido")?;
        if input.items.is_empty() || input.items.iter().any(|i| i.id.is_empty() || i.quantity == 0) {
            return Err(AppError::with_message(ErrorCode::OrderItemsInvalid, INVALID_ITEMS));
        }
        let total_amount = input
            .order_amount
            .checked_add(input.delivery_fee)
            .ok_or_else(|| AppError::with_message(ErrorCode::ValueOutOfRange, TOTAL_TOO_LARGE))?;
        if total_amount <= Decimal::ZERO {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                "O total deve ser um valor positivo",
            ));
        }

        let scheduled_date = input.scheduled_date.filter(|d| !d.trim().is_empty());
        let table = if scheduled_date.is_some() {
            Table::OrdersClosed
        } else {
            Table::Orders
        };
        let order = Order {
            id: shared::util::new_id(),
            customer_name: Some(customer_name),
            customer_phone: Some(customer_phone),
            items: serde_json::to_value(&input.items).map_err(crate::store::StoreError::from)?,
            order_amount: Some(input.order_amount),
            delivery_fee: Some(input.delivery_fee),
            total_amount: Some(total_amount),
            status: Some(input.status.unwrap_or(OrderStatus::Pending).as_str().to_string()),
            created_at: Some(shared::util::now_rfc3339()),
            delivery_address: input.delivery_address,
            bairro: input.bairro,
            scheduled_date,
        };
        self.ctx.store.insert(table, to_record(&order)?).await?;
        info!(id = %order.id, %table, total = %total_amount, "Order created");
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> bool {
        let result = self
            .ctx
            .store
            .update(Table::Orders, id, field("status", status.as_str()))
            .await
            .map_err(AppError::from);
        if self
            .ctx
            .settle(result, "Não foi possível atualizar o status do pedido.")
            .is_none()
        {
            return false;
        }
        self.ctx.success(
            "Pedido atualizado",
            "O status do pedido foi atualizado com sucesso.",
        );
        true
    }

    /// Receipt lines of an order, names and prices taken from the menu
    ///
    /// A failed menu lookup is logged and yields no lines.
    pub async fn resolve_lines(&self, order: &Order) -> Vec<OrderLine> {
        let ids = parse_item_refs(&order.items);
        if ids.is_empty() {
            return Vec::new();
        }
        let query = Query::table(Table::MenuItems).in_list("id", ids.into_iter().map(Value::String).collect());
        match self.ctx.fetch::<MenuItem>(&query).await {
            Ok(menu) => {
                let lines = build_lines(&order.items, &menu);
                debug!(order = %order.id, lines = lines.len(), "Order lines resolved");
                lines
            }
            Err(e) => {
                warn!(order = %order.id, error = %e, "Menu lookup for order lines failed");
                Vec::new()
            }
        }
    }

    pub fn totals(&self, order: &Order) -> OrderTotals {
        order_totals(order)
    }
}
