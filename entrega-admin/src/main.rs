use anyhow::Context;
use entrega_admin::services::{DashboardService, SettingsService};
use entrega_admin::{AdminContext, Config, ReceiptPrinter, SqliteStore, TracingNotifier, init_logger_with_file};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, config, logging)
    dotenv::dotenv().ok();
    let config = Config::from_env().context("Invalid configuration")?;
    let _log_guard = init_logger_with_file(&config.log_level, config.log_dir.as_deref());

    tracing::info!(
        environment = %config.environment,
        database = %config.database_path,
        strategy = %config.reorder_strategy,
        "Entrega admin starting"
    );

    // 2. Database (migrations included)
    let store = SqliteStore::open(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path))?;

    let ctx = AdminContext::new(Arc::new(store), Arc::new(TracingNotifier))
        .with_strategy(config.reorder_strategy);

    // 3. Overview
    let stats = DashboardService::new(ctx.clone()).stats().await;
    tracing::info!(
        available_items = stats.available_items,
        pending_orders = stats.pending_orders,
        closed_days = stats.closed_days,
        neighborhoods = stats.neighborhoods,
        "Dashboard"
    );

    let settings = SettingsService::new(ctx.clone()).load().await;
    if settings.is_on_vacation {
        tracing::warn!(message = %settings.vacation_message, "Restaurant is on vacation");
    }

    // 4. Printer (environment wins over the stored default)
    let printer_addr = config.printer_addr.clone().or(settings.default_printer);
    match printer_addr {
        Some(addr) => {
            let printer = ReceiptPrinter::connect(ctx, &addr, config.receipt_width)
                .with_context(|| format!("Invalid printer address {addr}"))?;
            let online = printer.check().await;
            tracing::info!(%addr, online, "Receipt printer");
        }
        None => tracing::info!("No receipt printer configured"),
    }

    Ok(())
}
