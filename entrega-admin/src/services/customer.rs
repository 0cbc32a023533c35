//! Customer records

use super::{AdminContext, require_min_chars};
use crate::store::{Query, Record, Table, to_record};
use serde_json::Value;
use shared::address::parse_address_input;
use shared::models::{Customer, CustomerInput};
use shared::{AppError, AppResult, format_address};
use tracing::{info, instrument};

const PHONE_MIN_LEN: usize = 8;
const NAME_MIN_LEN: usize = 3;

#[derive(Clone)]
pub struct CustomerService {
    ctx: AdminContext,
}

impl CustomerService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    /// Customers by name, optionally matching `search` in phone or name
    pub async fn list(&self, search: Option<&str>) -> Vec<Customer> {
        let mut query = Query::table(Table::Customers);
        if let Some(term) = search {
            query = query.search(&["phone", "name"], term);
        }
        let result = self.ctx.fetch(&query.order_asc("name")).await;
        self.ctx
            .settle(result, "Não foi possível carregar os clientes.")
            .unwrap_or_default()
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CustomerInput) -> Option<Customer> {
        let result = self.try_create(input).await;
        let customer = self
            .ctx
            .settle(result, "Não foi possível salvar o cliente.")?;
        self.ctx
            .success("Cliente criado", "O cliente foi criado com sucesso.");
        Some(customer)
    }

    async fn try_create(&self, input: CustomerInput) -> AppResult<Customer> {
        let mut record = validate(&input)?;
        record.insert("created_at".into(), shared::util::now_rfc3339().into());
        let stored = self.ctx.store.insert(Table::Customers, record).await?;
        let customer: Customer = crate::store::from_record(stored)?;
        info!(id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Replace phone, name and address
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: CustomerInput) -> Option<Customer> {
        let result = self.try_update(id, input).await;
        let customer = self
            .ctx
            .settle(result, "Não foi possível salvar o cliente.")?;
        self.ctx
            .success("Cliente atualizado", "O cliente foi atualizado com sucesso.");
        Some(customer)
    }

    async fn try_update(&self, id: &str, input: CustomerInput) -> AppResult<Customer> {
        let record = validate(&input)?;
        self.ctx.store.update(Table::Customers, id, record).await?;
        self.ctx.get(Table::Customers, id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> bool {
        let result = self
            .ctx
            .store
            .delete(Table::Customers, id)
            .await
            .map_err(AppError::from);
        if self
            .ctx
            .settle(result, "Não foi possível excluir o cliente.")
            .is_none()
        {
            return false;
        }
        self.ctx
            .success("Cliente excluído", "O cliente foi excluído com sucesso.");
        true
    }

    /// One-line address for listings
    pub fn display_address(customer: &Customer) -> String {
        format_address(Some(&customer.address))
    }
}

/// Form values as the stored fields
fn validate(input: &CustomerInput) -> AppResult<Record> {
    let phone = require_min_chars(&input.phone, PHONE_MIN_LEN, "Telefone inválido")?;
    let name = require_min_chars(
        &input.name,
        NAME_MIN_LEN,
        "Nome precisa ter no mínimo 3 caracteres",
    )?;
    if input.address.trim().is_empty() {
        return Err(AppError::validation("Endereço é obrigatório"));
    }

    #[derive(serde::Serialize)]
    struct Fields {
        phone: String,
        name: String,
        address: Value,
    }
    Ok(to_record(&Fields {
        phone,
        name,
        address: parse_address_input(&input.address),
    })?)
}
