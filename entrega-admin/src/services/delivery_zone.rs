//! Distance-based delivery fees

use super::AdminContext;
use crate::store::{Query, Table, to_record};
use rust_decimal::Decimal;
use shared::models::{DeliveryZone, DeliveryZoneCreate, DeliveryZoneUpdate};
use shared::{AppError, AppResult, ErrorCode};
use tracing::{debug, info, instrument};

/// Zone covering `km`
///
/// `zones` must be sorted by `min_distance`. Bands are half-open
/// (`min <= km < max`) except the outermost one, whose maximum is
/// inclusive.
pub fn zone_for_distance(zones: &[DeliveryZone], km: Decimal) -> Option<&DeliveryZone> {
    if let Some(zone) = zones.iter().find(|z| z.contains(km)) {
        return Some(zone);
    }
    zones
        .iter()
        .max_by_key(|z| z.max_distance)
        .filter(|z| km == z.max_distance && km >= z.min_distance)
}

fn validate(min_distance: Decimal, max_distance: Decimal, delivery_fee: Decimal) -> AppResult<()> {
    let invalid = |message: &str| AppError::with_message(ErrorCode::DeliveryZoneInvalidRange, message);
    if min_distance < Decimal::ZERO {
        return Err(invalid("A distância mínima não pode ser negativa"));
    }
    if max_distance < Decimal::ZERO {
        return Err(invalid("A distância máxima não pode ser negativa"));
    }
    if delivery_fee < Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "A taxa de entrega não pode ser negativa",
        ));
    }
    if max_distance <= min_distance {
        return Err(invalid("A distância máxima deve ser maior que a distância mínima"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct DeliveryZoneService {
    ctx: AdminContext,
}

impl DeliveryZoneService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    /// Zones by increasing minimum distance
    pub async fn list(&self) -> Vec<DeliveryZone> {
        let result = self.ctx.fetch(&list_query()).await;
        self.ctx
            .settle(result, "Não foi possível carregar as zonas de entrega.")
            .unwrap_or_default()
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: DeliveryZoneCreate) -> Option<DeliveryZone> {
        let result = self.try_create(input).await;
        let zone = self
            .ctx
            .settle(result, "Não foi possível salvar a zona de entrega.")?;
        self.ctx
            .success("Zona criada", "A zona de entrega foi criada com sucesso.");
        Some(zone)
    }

    async fn try_create(&self, input: DeliveryZoneCreate) -> AppResult<DeliveryZone> {
        validate(input.min_distance, input.max_distance, input.delivery_fee)?;
        let zone = DeliveryZone {
            id: shared::util::new_id(),
            min_distance: input.min_distance,
            max_distance: input.max_distance,
            delivery_fee: input.delivery_fee,
        };
        self.ctx
            .store
            .insert(Table::DeliveryZones, to_record(&zone)?)
            .await?;
        info!(id = %zone.id, min = %zone.min_distance, max = %zone.max_distance, "Delivery zone created");
        Ok(zone)
    }

    /// Partial update, validated against the stored values
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: DeliveryZoneUpdate) -> Option<DeliveryZone> {
        let result = self.try_update(id, update).await;
        let zone = self
            .ctx
            .settle(result, "Não foi possível salvar a zona de entrega.")?;
        self.ctx
            .success("Zona atualizada", "A zona de entrega foi atualizada com sucesso.");
        Some(zone)
    }

    async fn try_update(&self, id: &str, update: DeliveryZoneUpdate) -> AppResult<DeliveryZone> {
        let current: DeliveryZone = self.ctx.get(Table::DeliveryZones, id).await?;
        validate(
            update.min_distance.unwrap_or(current.min_distance),
            update.max_distance.unwrap_or(current.max_distance),
            update.delivery_fee.unwrap_or(current.delivery_fee),
        )?;
        self.ctx
            .store
            .update(Table::DeliveryZones, id, to_record(&update)?)
            .await?;
        self.ctx.get(Table::DeliveryZones, id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> bool {
        let result = self
            .ctx
            .store
            .delete(Table::DeliveryZones, id)
            .await
            .map_err(AppError::from);
        if self
            .ctx
            .settle(result, "Não foi possível excluir a zona de entrega.")
            .is_none()
        {
            return false;
        }
        self.ctx
            .success("Zona excluída", "A zona de entrega foi excluída com sucesso.");
        true
    }

    /// Delivery fee for a distance in km, `None` outside every zone
    pub async fn fee_for_distance(&self, km: Decimal) -> Option<Decimal> {
        let zones = self.list().await;
        let fee = zone_for_distance(&zones, km).map(|z| z.delivery_fee);
        debug!(%km, ?fee, "Fee lookup by distance");
        fee
    }
}

fn list_query() -> Query {
    Query::table(Table::DeliveryZones).order_asc("min_distance")
}
