//! Restaurant settings: vacation mode and default printer

use super::{AdminContext, BusinessHoursService};
use crate::notify::Notification;
use crate::store::{Query, Record, Table, field, to_record};
use entrega_printer::NetworkPrinter;
use shared::models::{RestaurantSettings, VACATION_MESSAGE_MAX_LEN};
use shared::{AppError, AppResult, ErrorCode};
use tracing::{info, instrument};

/// Id given to the settings row when this service creates it
pub const SETTINGS_ID: &str = "default";

#[derive(Clone)]
pub struct SettingsService {
    ctx: AdminContext,
}

impl SettingsService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    /// The settings row, or defaults when none exists yet
    pub async fn load(&self) -> RestaurantSettings {
        let result = self.current().await;
        self.ctx
            .settle(result, "Não foi possível carregar as configurações de férias.")
            .flatten()
            .unwrap_or_default()
    }

    /// Save vacation mode; turning it on also closes every day
    ///
    /// A failure closing the days is reported on its own and does not
    /// undo the saved settings.
    #[instrument(skip(self, message))]
    pub async fn save_vacation(&self, is_on_vacation: bool, message: &str) -> bool {
        let result = self.try_save_vacation(is_on_vacation, message).await;
        if self
            .ctx
            .settle(result, "Não foi possível salvar as configurações de férias.")
            .is_none()
        {
            return false;
        }

        if is_on_vacation {
            let hours = BusinessHoursService::new(self.ctx.clone());
            let closed = hours.close_all().await;
            if let Some(count) = self.ctx.settle(
                closed,
                "Não foi possível atualizar os horários de funcionamento.",
            ) {
                info!(count, "Business hours closed for vacation");
                self.ctx.success(
                    "Horários atualizados",
                    "Todos os dias foram marcados como fechados.",
                );
            }
        }

        self.ctx.success(
            "Configurações atualizadas",
            "As configurações de férias foram atualizadas com sucesso.",
        );
        true
    }

    /// Remember the receipt printer (`ip:port` or a bare IP)
    #[instrument(skip(self))]
    pub async fn set_default_printer(&self, addr: &str) -> bool {
        let addr = addr.trim();
        if addr.is_empty() {
            self.ctx.notifier.notify(Notification::error_titled(
                "Atenção",
                "Por favor, selecione uma impressora.",
            ));
            return false;
        }

        let result = match NetworkPrinter::from_addr(addr) {
            Ok(printer) => {
                let normalized = printer.addr().to_string();
                self.upsert(field("default_printer", normalized.clone()))
                    .await
                    .map(|()| normalized)
            }
            Err(e) => Err(AppError::validation(format!(
                "Endereço de impressora inválido: {addr}"
            ))
            .with_detail("reason", e.to_string())),
        };
        let Some(saved) = self
            .ctx
            .settle(result, "Não foi possível salvar a impressora padrão.")
        else {
            return false;
        };
        self.ctx.success(
            "Configuração Salva",
            format!("Impressora padrão definida como: {saved}"),
        );
        true
    }

    async fn try_save_vacation(&self, is_on_vacation: bool, message: &str) -> AppResult<()> {
        if message.chars().count() > VACATION_MESSAGE_MAX_LEN {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                "A mensagem de férias não pode ter mais de 500 caracteres",
            ));
        }
        let mut fields = field("is_on_vacation", is_on_vacation);
        fields.insert("vacation_message".into(), message.into());
        self.upsert(fields).await
    }

    async fn current(&self) -> AppResult<Option<RestaurantSettings>> {
        let rows: Vec<RestaurantSettings> = self
            .ctx
            .fetch(&Query::table(Table::RestaurantSettings).limit(1))
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Update the single settings row, creating it when missing
    async fn upsert(&self, fields: Record) -> AppResult<()> {
        match self.current().await? {
            Some(existing) if !existing.id.is_empty() => {
                self.ctx
                    .store
                    .update(Table::RestaurantSettings, &existing.id, fields)
                    .await?;
            }
            _ => {
                let mut record = to_record(&RestaurantSettings {
                    id: SETTINGS_ID.to_string(),
                    ..Default::default()
                })?;
                record.extend(fields);
                self.ctx
                    .store
                    .insert(Table::RestaurantSettings, record)
                    .await?;
                info!("Settings row created");
            }
        }
        Ok(())
    }
}
