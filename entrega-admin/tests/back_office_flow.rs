//! A day in the back office, end to end on SQLite

mod common;

use common::{context, menu_item};
use entrega_admin::services::{
    BusinessHoursService, CategoryService, DashboardService, MenuFilter, MenuService,
    NeighborhoodService, OrderFilter, OrderService, SettingsService,
};
use entrega_admin::{LocalAuthProvider, ReceiptPrinter, SessionManager, SqliteStore};
use rust_decimal::Decimal;
use serde_json::json;
use shared::models::{
    BusinessHourCreate, MenuCategoryCreate, NeighborhoodCreate, OrderCreate, OrderItemRef,
    OrderStatus,
};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

#[tokio::test]
async fn operator_session() {
    let store = Arc::new(SqliteStore::open(":memory:").await.unwrap());
    let provider = Arc::new(LocalAuthProvider::new(store.clone()));
    provider
        .register("gerente@restaurante.com", "segredo123", None)
        .await
        .unwrap();

    let sessions = SessionManager::new(provider);
    assert!(sessions.require().is_err());
    let session = sessions
        .login("GERENTE@restaurante.com", "segredo123")
        .await
        .unwrap();
    assert_eq!(session.email, "gerente@restaurante.com");
    assert!(sessions.is_authenticated());

    sessions.logout().await.unwrap();
    assert!(sessions.current_session().is_none());
}

#[tokio::test]
async fn menu_orders_and_receipt() {
    let store = Arc::new(SqliteStore::open(":memory:").await.unwrap());
    let (ctx, notifier) = context(store);

    // Menu
    let categories = CategoryService::new(ctx.clone());
    let pizzas = categories
        .create(MenuCategoryCreate {
            name: "Pizzas".into(),
            description: None,
            display_order: None,
        })
        .await
        .unwrap();

    let menu = MenuService::new(ctx.clone());
    let mut calabresa = menu_item("Calabresa", 0);
    calabresa.category_id = Some(pizzas.id.clone());
    calabresa.price = Decimal::new(4500, 2);
    let calabresa = menu.create(calabresa).await.unwrap();
    menu.create(menu_item("Refrigerante", 1)).await.unwrap();

    let in_category = menu
        .list(&MenuFilter {
            category_id: Some(pizzas.id.clone()),
            ..Default::default()
        })
        .await;
    assert_eq!(in_category.len(), 1);

    assert!(!categories.delete(&pizzas.id).await);
    assert_eq!(notifier.last().unwrap().title, "Não é possível excluir");

    // Orders
    let orders = OrderService::new(ctx.clone());
    let order = orders
        .create(OrderCreate {
            customer_name: "Ana Souza".into(),
            customer_phone: "11999990000".into(),
            items: vec![OrderItemRef {
                id: calabresa.id.clone(),
                quantity: 2,
            }],
            order_amount: Decimal::new(9000, 2),
            delivery_fee: Decimal::new(800, 2),
            delivery_address: Some(json!([{
                "endereco": "Rua das Flores",
                "numero": "10",
                "bairro": "Centro"
            }])),
            bairro: None,
            scheduled_date: None,
            status: None,
        })
        .await
        .unwrap();

    let pending = orders
        .list(&OrderFilter {
            status: Some(OrderStatus::Pending),
            date: None,
        })
        .await;
    assert_eq!(pending.len(), 1);
    assert!(orders.update_status(&order.id, OrderStatus::Confirmed).await);

    let order = orders.get(&order.id).await.unwrap();
    let lines = orders.resolve_lines(&order).await;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].name, "Calabresa");
    assert_eq!(lines[0].subtotal, Decimal::new(9000, 2));

    // Receipt
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.unwrap();
        received
    });

    let settings = SettingsService::new(ctx.clone());
    assert!(settings.set_default_printer(&addr.to_string()).await);
    let printer_addr = settings.load().await.default_printer.unwrap();

    let printer = ReceiptPrinter::connect(ctx.clone(), &printer_addr, 32).unwrap();
    assert!(printer.print(&order).await);
    let received = server.await.unwrap();
    assert!(received.windows(9).any(|w| w == b"Calabresa"));
    assert!(received.windows(8).any(|w| w == b"R$ 98,00"));
    // "Endereço" in Windows-1252
    assert!(received.windows(8).any(|w| w == b"Endere\xE7o"));
}

#[tokio::test]
async fn vacation_closes_the_week() {
    let store = Arc::new(SqliteStore::open(":memory:").await.unwrap());
    let (ctx, notifier) = context(store);

    let hours = BusinessHoursService::new(ctx.clone());
    for weekday in 0..7 {
        hours
            .create(BusinessHourCreate {
                weekday,
                open_time: "18:00".into(),
                close_time: "23:30".into(),
                is_open: weekday != 1,
                display_order: None,
            })
            .await
            .unwrap();
    }
    NeighborhoodService::new(ctx.clone())
        .create(NeighborhoodCreate {
            name: "Centro".into(),
            fee: Decimal::new(500, 2),
        })
        .await
        .unwrap();

    let dashboard = DashboardService::new(ctx.clone());
    let before = dashboard.stats().await;
    assert_eq!(before.closed_days, 1);
    assert_eq!(before.neighborhoods, 1);

    notifier.clear();
    let settings = SettingsService::new(ctx.clone());
    assert!(settings.save_vacation(true, "Voltamos em breve!").await);
    assert!(notifier.errors().is_empty());

    assert_eq!(dashboard.stats().await.closed_days, 7);
    let saved = settings.load().await;
    assert!(saved.is_on_vacation);
    assert_eq!(saved.vacation_message, "Voltamos em breve!");
}
