//! Dashboard counters

use super::AdminContext;
use crate::store::{Query, Table};
use serde::Serialize;
use shared::AppResult;
use shared::models::OrderStatus;
use tracing::debug;

/// Summary shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub available_items: usize,
    pub pending_orders: usize,
    pub closed_days: usize,
    pub neighborhoods: usize,
}

#[derive(Clone)]
pub struct DashboardService {
    ctx: AdminContext,
}

impl DashboardService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    /// All four counters, or zeros when any count fails
    pub async fn stats(&self) -> DashboardStats {
        let result = self.try_stats().await;
        self.ctx
            .settle(result, "Não foi possível carregar as estatísticas.")
            .unwrap_or_default()
    }

    async fn try_stats(&self) -> AppResult<DashboardStats> {
        let store = &self.ctx.store;
        let available = Query::table(Table::MenuItems).eq("is_available", true);
        let pending = Query::table(Table::Orders).eq("status", OrderStatus::Pending.as_str());
        let closed = Query::table(Table::OperatingHours).eq("is_open", false);
        let neighborhoods = Query::table(Table::Neighborhoods);

        let (available_items, pending_orders, closed_days, neighborhoods) = futures::try_join!(
            store.count(&available),
            store.count(&pending),
            store.count(&closed),
            store.count(&neighborhoods),
        )?;

        let stats = DashboardStats {
            available_items,
            pending_orders,
            closed_days,
            neighborhoods,
        };
        debug!(?stats, "Dashboard stats loaded");
        Ok(stats)
    }
}
