//! Neighborhoods (bairros) with a flat delivery fee

use super::{AdminContext, require_min_chars};
use crate::store::{Query, Table, to_record};
use rust_decimal::Decimal;
use shared::models::{Neighborhood, NeighborhoodCreate, NeighborhoodUpdate, normalize_bairro};
use shared::{AppError, AppResult, ErrorCode};
use tracing::{info, instrument};

const NAME_MIN_LEN: usize = 3;
const NAME_TOO_SHORT: &str = "Nome precisa ter no mínimo 3 caracteres";
const ALREADY_EXISTS: &str = "Este bairro já existe.";

#[derive(Clone)]
pub struct NeighborhoodService {
    ctx: AdminContext,
}

impl NeighborhoodService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    /// Neighborhoods by name
    pub async fn list(&self) -> Vec<Neighborhood> {
        let result = self.ctx.fetch(&list_query()).await;
        self.ctx
            .settle(result, "Não foi possível carregar os bairros.")
            .unwrap_or_default()
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NeighborhoodCreate) -> Option<Neighborhood> {
        let result = self.try_create(input).await;
        let neighborhood = self
            .ctx
            .settle(result, "Não foi possível salvar o bairro.")?;
        self.ctx
            .success("Bairro criado", "O bairro foi criado com sucesso.");
        Some(neighborhood)
    }

    async fn try_create(&self, input: NeighborhoodCreate) -> AppResult<Neighborhood> {
        let name = require_min_chars(&input.name, NAME_MIN_LEN, NAME_TOO_SHORT)?;
        check_fee(input.fee)?;
        self.ensure_unique(&name, None).await?;

        let neighborhood = Neighborhood {
            id: shared::util::new_id(),
            name,
            fee: input.fee,
        };
        self.ctx
            .store
            .insert(Table::Neighborhoods, to_record(&neighborhood)?)
            .await?;
        info!(id = %neighborhood.id, "Neighborhood created");
        Ok(neighborhood)
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: NeighborhoodUpdate) -> Option<Neighborhood> {
        let result = self.try_update(id, update).await;
        let neighborhood = self
            .ctx
            .settle(result, "Não foi possível salvar o bairro.")?;
        self.ctx
            .success("Bairro atualizado", "O bairro foi atualizado com sucesso.");
        Some(neighborhood)
    }

    async fn try_update(&self, id: &str, mut update: NeighborhoodUpdate) -> AppResult<Neighborhood> {
        if let Some(name) = &update.name {
            let name = require_min_chars(name, NAME_MIN_LEN, NAME_TOO_SHORT)?;
            self.ensure_unique(&name, Some(id)).await?;
            update.name = Some(name);
        }
        if let Some(fee) = update.fee {
            check_fee(fee)?;
        }
        self.ctx
            .store
            .update(Table::Neighborhoods, id, to_record(&update)?)
            .await?;
        self.ctx.get(Table::Neighborhoods, id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> bool {
        let result = self
            .ctx
            .store
            .delete(Table::Neighborhoods, id)
            .await
            .map_err(AppError::from);
        if self
            .ctx
            .settle(result, "Não foi possível excluir o bairro.")
            .is_none()
        {
            return false;
        }
        self.ctx
            .success("Bairro excluído", "O bairro foi excluído com sucesso.");
        true
    }

    /// Fee of a neighborhood, ignoring case and extra spaces
    pub async fn fee_for(&self, bairro: &str) -> Option<Decimal> {
        let wanted = normalize_bairro(bairro);
        if wanted.is_empty() {
            return None;
        }
        self.list()
            .await
            .into_iter()
            .find(|n| normalize_bairro(&n.name) == wanted)
            .map(|n| n.fee)
    }

    /// Names are compared in normalized form; `except` skips the row being edited
    async fn ensure_unique(&self, name: &str, except: Option<&str>) -> AppResult<()> {
        let wanted = normalize_bairro(name);
        let all: Vec<Neighborhood> = self.ctx.fetch(&list_query()).await?;
        let taken = all
            .iter()
            .any(|n| Some(n.id.as_str()) != except && normalize_bairro(&n.name) == wanted);
        if taken {
            return Err(AppError::with_message(ErrorCode::NeighborhoodNameExists, ALREADY_EXISTS)
                .with_detail("name", name));
        }
        Ok(())
    }
}

fn check_fee(fee: Decimal) -> AppResult<()> {
    if fee < Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "A taxa de entrega não pode ser negativa",
        ));
    }
    Ok(())
}

fn list_query() -> Query {
    Query::table(Table::Neighborhoods).order_asc("name")
}
