//! Menu items

use super::{AdminContext, require_min_chars};
use crate::sequencer::{Direction, MoveOutcome, next_display_order};
use crate::store::{Query, Table, field, to_record};
use rust_decimal::Decimal;
use serde_json::Value;
use shared::models::{MenuCategory, MenuItem, MenuItemCreate, MenuItemUpdate};
use shared::{AppError, AppResult, ErrorCode};
use tracing::{info, instrument};

const NAME_MIN_LEN: usize = 3;
const DESCRIPTION_MIN_LEN: usize = 5;

const NAME_TOO_SHORT: &str = "Nome precisa ter no mínimo 3 caracteres";
const DESCRIPTION_TOO_SHORT: &str = "Descrição precisa ter no mínimo 5 caracteres";
const PRICE_NOT_POSITIVE: &str = "O preço deve ser um valor positivo";

/// Menu listing filters; `None` means "any"
#[derive(Debug, Clone, Default)]
pub struct MenuFilter {
    /// Matched against name and description
    pub search: Option<String>,
    pub is_available: Option<bool>,
    pub category_id: Option<String>,
}

impl MenuFilter {
    fn query(&self) -> Query {
        let mut query = Query::table(Table::MenuItems);
        if let Some(available) = self.is_available {
            query = query.eq("is_available", available);
        }
        if let Some(category_id) = &self.category_id {
            query = query.eq("category_id", category_id.as_str());
        }
        if let Some(term) = &self.search {
            query = query.search(&["name", "description"], term);
        }
        query.order_asc("display_order")
    }
}

#[derive(Clone)]
pub struct MenuService {
    ctx: AdminContext,
}

impl MenuService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    /// Items in display order
    ///
    /// This is the list `move_item` expects.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &MenuFilter) -> Vec<MenuItem> {
        let result = self.ctx.fetch(&filter.query()).await;
        self.ctx
            .settle(result, "Não foi possível carregar os itens do cardápio.")
            .unwrap_or_default()
    }

    pub async fn get(&self, id: &str) -> Option<MenuItem> {
        let result = self.ctx.get(Table::MenuItems, id).await;
        self.ctx.settle(result, "Não foi possível carregar o item do cardápio.")
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: MenuItemCreate) -> Option<MenuItem> {
        let result = self.try_create(input).await;
        let item = self
            .ctx
            .settle(result, "Não foi possível salvar o item do cardápio.")?;
        self.ctx
            .success("Item criado", "O item do cardápio foi criado com sucesso.");
        Some(item)
    }

    async fn try_create(&self, input: MenuItemCreate) -> AppResult<MenuItem> {
        let name = require_min_chars(&input.name, NAME_MIN_LEN, NAME_TOO_SHORT)?;
        let description = input
            .description
            .as_deref()
            .map(|d| require_min_chars(d, DESCRIPTION_MIN_LEN, DESCRIPTION_TOO_SHORT))
            .transpose()?;
        check_price(input.price)?;
        let category_id = self.check_category(input.category_id.as_deref()).await?;

        let display_order = match input.display_order {
            Some(order) => order,
            None => {
                let all: Vec<MenuItem> = self.ctx.fetch(&MenuFilter::default().query()).await?;
                next_display_order(&all)
            }
        };

        let item = MenuItem {
            id: shared::util::new_id(),
            name,
            description,
            price: input.price,
            is_available: Some(input.is_available),
            category_id,
            display_order: Some(display_order),
        };
        self.ctx
            .store
            .insert(Table::MenuItems, to_record(&item)?)
            .await?;
        info!(id = %item.id, display_order, "Menu item created");
        Ok(item)
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: MenuItemUpdate) -> Option<MenuItem> {
        let result = self.try_update(id, update).await;
        let item = self
            .ctx
            .settle(result, "Não foi possível salvar o item do cardápio.")?;
        self.ctx
            .success("Item atualizado", "O item do cardápio foi atualizado com sucesso.");
        Some(item)
    }

    async fn try_update(&self, id: &str, mut update: MenuItemUpdate) -> AppResult<MenuItem> {
        if let Some(name) = &update.name {
            update.name = Some(require_min_chars(name, NAME_MIN_LEN, NAME_TOO_SHORT)?);
        }
        if let Some(description) = &update.description {
            update.description = Some(require_min_chars(
                description,
                DESCRIPTION_MIN_LEN,
                DESCRIPTION_TOO_SHORT,
            )?);
        }
        if let Some(price) = update.price {
            check_price(price)?;
        }

        let mut fields = to_record(&update)?;
        // an empty category id detaches the item from its category
        if let Some(category_id) = update.category_id.as_deref() {
            let checked = self.check_category(Some(category_id)).await?;
            fields.insert("category_id".into(), checked.map_or(Value::Null, Value::String));
        }

        self.ctx.store.update(Table::MenuItems, id, fields).await?;
        self.ctx.get(Table::MenuItems, id).await
    }

    /// Flip `is_available`; returns the new value
    #[instrument(skip(self, item), fields(id = %item.id))]
    pub async fn toggle_availability(&self, item: &MenuItem) -> Option<bool> {
        let available = !item.is_available.unwrap_or(false);
        let result = self
            .ctx
            .store
            .update(Table::MenuItems, &item.id, field("is_available", available))
            .await
            .map_err(AppError::from);
        self.ctx.settle(
            result,
            "Não foi possível alterar a disponibilidade do item.",
        )?;

        let (title, verb) = if available {
            ("Item ativado", "ativado")
        } else {
            ("Item desativado", "desativado")
        };
        self.ctx
            .success(title, format!("O item foi {verb} com sucesso."));
        Some(available)
    }

    /// Swap with the neighbor in `list` (as returned by [`Self::list`])
    pub async fn move_item(&self, list: &[MenuItem], id: &str, direction: Direction) -> MoveOutcome {
        self.ctx
            .sequencer
            .move_item(Table::MenuItems, list, id, direction)
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> bool {
        let result = self
            .ctx
            .store
            .delete(Table::MenuItems, id)
            .await
            .map_err(AppError::from);
        if self
            .ctx
            .settle(result, "Não foi possível excluir o item do cardápio.")
            .is_none()
        {
            return false;
        }
        self.ctx
            .success("Item excluído", "O item do cardápio foi excluído com sucesso.");
        true
    }

    /// Blank ids mean "no category"; others must exist
    async fn check_category(&self, category_id: Option<&str>) -> AppResult<Option<String>> {
        let Some(id) = category_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        let found: Option<MenuCategory> = self.ctx.find(Table::MenuCategories, id).await?;
        match found {
            Some(category) => Ok(Some(category.id)),
            None => Err(AppError::with_message(ErrorCode::CategoryNotFound, "Categoria não encontrada.")
                .with_detail("category_id", id)),
        }
    }
}

fn check_price(price: Decimal) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            PRICE_NOT_POSITIVE,
        ));
    }
    Ok(())
}
