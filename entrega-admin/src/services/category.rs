//! Menu categories

use super::{AdminContext, require_min_chars};
use crate::notify::Notification;
use crate::sequencer::{Direction, MoveOutcome, next_display_order};
use crate::store::{Query, Table, to_record};
use shared::models::{CATEGORY_NAME_MIN_LEN, MenuCategory, MenuCategoryCreate, MenuCategoryUpdate};
use shared::{AppError, AppResult, ErrorCode};
use tracing::{info, instrument, warn};

const NAME_TOO_SHORT: &str = "Nome precisa ter no mínimo 2 caracteres";

#[derive(Clone)]
pub struct CategoryService {
    ctx: AdminContext,
}

impl CategoryService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    /// Categories in display order
    pub async fn list(&self) -> Vec<MenuCategory> {
        let result = self.ctx.fetch(&list_query()).await;
        self.ctx
            .settle(result, "Não foi possível carregar as categorias.")
            .unwrap_or_default()
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: MenuCategoryCreate) -> Option<MenuCategory> {
        let result = self.try_create(input).await;
        let category = self
            .ctx
            .settle(result, "Não foi possível salvar a categoria.")?;
        self.ctx
            .success("Categoria criada", "A categoria foi criada com sucesso.");
        Some(category)
    }

    async fn try_create(&self, input: MenuCategoryCreate) -> AppResult<MenuCategory> {
        let name = require_min_chars(&input.name, CATEGORY_NAME_MIN_LEN, NAME_TOO_SHORT)?;
        let display_order = match input.display_order {
            Some(order) => order,
            None => {
                let all: Vec<MenuCategory> = self.ctx.fetch(&list_query()).await?;
                next_display_order(&all)
            }
        };

        let category = MenuCategory {
            id: shared::util::new_id(),
            name,
            description: input.description.filter(|d| !d.trim().is_empty()),
            display_order,
        };
        self.ctx
            .store
            .insert(Table::MenuCategories, to_record(&category)?)
            .await?;
        info!(id = %category.id, display_order, "Category created");
        Ok(category)
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: MenuCategoryUpdate) -> Option<MenuCategory> {
        let result = self.try_update(id, update).await;
        let category = self
            .ctx
            .settle(result, "Não foi possível salvar a categoria.")?;
        self.ctx
            .success("Categoria atualizada", "A categoria foi atualizada com sucesso.");
        Some(category)
    }

    async fn try_update(&self, id: &str, mut update: MenuCategoryUpdate) -> AppResult<MenuCategory> {
        if let Some(name) = &update.name {
            update.name = Some(require_min_chars(name, CATEGORY_NAME_MIN_LEN, NAME_TOO_SHORT)?);
        }
        self.ctx
            .store
            .update(Table::MenuCategories, id, to_record(&update)?)
            .await?;
        self.ctx.get(Table::MenuCategories, id).await
    }

    pub async fn move_category(
        &self,
        list: &[MenuCategory],
        id: &str,
        direction: Direction,
    ) -> MoveOutcome {
        self.ctx
            .sequencer
            .move_item(Table::MenuCategories, list, id, direction)
            .await
    }

    /// Delete a category that no menu item references
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> bool {
        let result = self.try_delete(id).await;
        match result {
            Err(err) if err.code == ErrorCode::CategoryHasItems => {
                warn!(id, "Category still referenced by menu items");
                self.ctx.notifier.notify(Notification::error_titled(
                    "Não é possível excluir",
                    "Existem itens associados a esta categoria. Remova ou altere a categoria dos itens primeiro.",
                ));
                false
            }
            other => {
                if self
                    .ctx
                    .settle(other, "Não foi possível excluir a categoria.")
                    .is_none()
                {
                    return false;
                }
                self.ctx
                    .success("Categoria excluída", "A categoria foi excluída com sucesso.");
                true
            }
        }
    }

    async fn try_delete(&self, id: &str) -> AppResult<()> {
        let items = self
            .ctx
            .store
            .count(&Query::table(Table::MenuItems).eq("category_id", id))
            .await?;
        if items > 0 {
            return Err(AppError::new(ErrorCode::CategoryHasItems).with_detail("items", items));
        }
        self.ctx.store.delete(Table::MenuCategories, id).await?;
        Ok(())
    }
}

fn list_query() -> Query {
    Query::table(Table::MenuCategories).order_asc("display_order")
}
