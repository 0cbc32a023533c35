//! Order receipts
//!
//! [`ReceiptRenderer`] lays an order out as ESC/POS text;
//! [`ReceiptPrinter`] resolves the lines, encodes and sends the result.

use crate::notify::Notification;
use crate::services::{AdminContext, OrderService, order_totals};
use entrega_printer::{EscPosBuilder, EscPosTextBuilder, NetworkPrinter, PrintError, PrintResult, Printer, pad_text};
use shared::models::{Order, OrderLine};
use shared::util::{format_currency, format_order_date};
use shared::{AppError, ErrorCode, format_address, resolve_bairro};
use std::time::Duration;
use tracing::{info, instrument};

const QTY_WIDTH: usize = 5;
const VALUE_WIDTH: usize = 12;
const NOT_AVAILABLE: &str = "N/A";

pub struct ReceiptRenderer<'a> {
    order: &'a Order,
    lines: &'a [OrderLine],
    width: usize,
}

impl<'a> ReceiptRenderer<'a> {
    pub fn new(order: &'a Order, lines: &'a [OrderLine], width: usize) -> Self {
        Self { order, lines, width }
    }

    pub fn render(&self) -> String {
        let order = self.order;
        let mut b = EscPosTextBuilder::new(self.width);

        // Header
        b.align_center();
        b.size_double();
        b.bold_on();
        b.write_line(&format!("PEDIDO #{}", order.order_number()));
        b.bold_off();
        b.size_reset();
        let issued = order.created_at.as_deref().map(format_order_date).unwrap_or_default();
        if !issued.is_empty() {
            b.write_line(&format!("Emitido em: {issued}"));
        }
        b.align_left();
        b.eq_sep();

        // Customer
        let address = order.delivery_address.as_ref();
        b.labeled("Nome:", text_or_na(order.customer_name.as_deref()));
        b.labeled("Telefone:", text_or_na(order.customer_phone.as_deref()));
        b.labeled("Endereço:", &format_address(address));
        b.labeled("Bairro:", &resolve_bairro(order.bairro.as_deref(), address));
        b.labeled("Status:", order.status_label());
        if let Some(scheduled) = order.scheduled_date.as_deref().filter(|s| !s.trim().is_empty()) {
            let formatted = format_order_date(scheduled);
            let shown = if formatted.is_empty() { scheduled } else { formatted.as_str() };
            b.bold_on();
            b.write_line(&format!("Agendado para: {shown}"));
            b.bold_off();
        }
        b.dash_sep();

        self.render_items(&mut b);

        // Totals
        let totals = order_totals(order);
        b.line_lr("Subtotal:", &format_currency(Some(totals.order_amount)));
        b.line_lr("Taxa de Entrega:", &format_currency(Some(totals.delivery_fee)));
        b.bold_on();
        b.size_double_height();
        b.line_lr("Total:", &format_currency(Some(totals.total_amount)));
        b.size_reset();
        b.bold_off();
        b.eq_sep();

        b.text_center("Obrigado pela preferência!");
        b.write("\n");
        b.finalize()
    }

    fn render_items(&self, b: &mut EscPosTextBuilder) {
        let name_width = self.width.saturating_sub(QTY_WIDTH + VALUE_WIDTH + 2);
        b.bold_on();
        b.write_line(&format!(
            "{} {} {}",
            pad_text("Item", name_width, false),
            pad_text("Qtd", QTY_WIDTH, true),
            pad_text("Valor", VALUE_WIDTH, true)
        ));
        b.bold_off();
        b.dash_sep();

        for line in self.lines {
            b.write_line(&format!(
                "{} {} {}",
                pad_text(&line.name, name_width, false),
                pad_text(&format!("{}x", line.quantity), QTY_WIDTH, true),
                pad_text(&format_currency(Some(line.subtotal)), VALUE_WIDTH, true)
            ));
        }
        b.dash_sep();
    }
}

fn text_or_na(value: Option<&str>) -> &str {
    value.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(NOT_AVAILABLE)
}

// =============================================================================
// Printing
// =============================================================================

/// Sends order receipts to a printer and reports the outcome to the operator
pub struct ReceiptPrinter<P: Printer = NetworkPrinter> {
    ctx: AdminContext,
    orders: OrderService,
    printer: P,
    width: usize,
}

impl ReceiptPrinter<NetworkPrinter> {
    /// Network printer at `addr` (`ip:port` or a bare IP)
    pub fn connect(ctx: AdminContext, addr: &str, width: usize) -> PrintResult<Self> {
        Ok(Self::new(ctx, NetworkPrinter::from_addr(addr)?, width))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.printer = self.printer.with_timeout(timeout);
        self
    }
}

impl<P: Printer> ReceiptPrinter<P> {
    pub fn new(ctx: AdminContext, printer: P, width: usize) -> Self {
        let orders = OrderService::new(ctx.clone());
        Self {
            ctx,
            orders,
            printer,
            width,
        }
    }

    /// Receipt bytes as sent to the printer
    pub async fn encode(&self, order: &Order) -> Vec<u8> {
        let lines = self.orders.resolve_lines(order).await;
        let text = ReceiptRenderer::new(order, &lines, self.width).render();
        let mut builder = EscPosBuilder::new(self.width);
        builder.raw(text.as_bytes()).cut_feed(3);
        builder.build()
    }

    #[instrument(skip(self, order), fields(order = %order.id))]
    pub async fn print(&self, order: &Order) -> bool {
        let data = self.encode(order).await;
        match self.printer.print(&data).await {
            Ok(()) => {
                info!(bytes = data.len(), "Receipt printed");
                self.ctx.success(
                    "Impressão enviada",
                    format!("Pedido #{} enviado para a impressora.", order.order_number()),
                );
                true
            }
            Err(e) => {
                let (code, failure) = if e.is_unreachable() {
                    (
                        ErrorCode::PrinterNotAvailable,
                        "Impressora indisponível. Verifique a conexão.",
                    )
                } else {
                    (ErrorCode::PrintFailed, "Não foi possível imprimir o pedido.")
                };
                let _: Option<()> = self.ctx.settle(Err(print_error(code, e)), failure);
                false
            }
        }
    }

    /// Probe the printer, notifying when it cannot be reached
    pub async fn check(&self) -> bool {
        let online = self.printer.is_online().await;
        if !online {
            self.ctx.notifier.notify(Notification::error_titled(
                "Impressora offline",
                "Impressora indisponível. Verifique a conexão.",
            ));
        }
        online
    }
}

fn print_error(code: ErrorCode, err: PrintError) -> AppError {
    AppError::with_message(code, err.to_string())
}
