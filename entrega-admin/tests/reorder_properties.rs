//! display_order swaps against both store backends

mod common;

use common::{FailingStore, backends, context, menu_item};
use entrega_admin::services::{MenuFilter, MenuService};
use entrega_admin::{Direction, MoveOutcome, ReorderStrategy};
use shared::models::MenuItem;
use std::collections::HashMap;
use std::sync::Arc;

fn orders_by_name(items: &[MenuItem]) -> HashMap<String, Option<i32>> {
    items
        .iter()
        .map(|i| (i.name.clone(), i.display_order))
        .collect()
}

async fn seeded(svc: &MenuService, orders: &[(&str, i32)]) -> Vec<MenuItem> {
    for (name, order) in orders {
        svc.create(menu_item(name, *order)).await.unwrap();
    }
    svc.list(&MenuFilter::default()).await
}

#[tokio::test]
async fn boundary_moves_write_nothing() {
    for (backend, store) in backends().await {
        let (ctx, _) = context(store.clone());
        let svc = MenuService::new(ctx);
        seeded(&svc, &[("Pizza", 1), ("Lasanha", 2), ("Suco", 3)]).await;

        // every update is refused, so any write attempt would show up
        let guarded = Arc::new(FailingStore::failing_after(store, 0));
        let (ctx, notifier) = context(guarded.clone());
        let svc = MenuService::new(ctx);
        let list = svc.list(&MenuFilter::default()).await;

        let first = svc.move_item(&list, &list[0].id, Direction::Up).await;
        let last = svc.move_item(&list, &list[2].id, Direction::Down).await;
        assert_eq!(first, MoveOutcome::AtBoundary, "{backend}");
        assert_eq!(last, MoveOutcome::AtBoundary, "{backend}");
        assert_eq!(guarded.attempted(), 0, "{backend}");
        assert!(notifier.all().is_empty(), "{backend}");
    }
}

#[tokio::test]
async fn middle_up_swaps_values_by_id() {
    for (backend, store) in backends().await {
        let (ctx, _) = context(store);
        let svc = MenuService::new(ctx);
        let list = seeded(&svc, &[("Pizza", 5), ("Lasanha", 10), ("Suco", 20)]).await;

        let outcome = svc.move_item(&list, &list[1].id, Direction::Up).await;
        assert!(outcome.is_swapped(), "{backend}");

        let after = orders_by_name(&svc.list(&MenuFilter::default()).await);
        assert_eq!(after["Lasanha"], Some(5), "{backend}");
        assert_eq!(after["Pizza"], Some(10), "{backend}");
        assert_eq!(after["Suco"], Some(20), "{backend}");
    }
}

#[tokio::test]
async fn down_then_up_restores_orders() {
    for strategy in [ReorderStrategy::Sequential, ReorderStrategy::Atomic] {
        for (backend, store) in backends().await {
            let (ctx, _) = context(store);
            let svc = MenuService::new(ctx.with_strategy(strategy));
            let list = seeded(&svc, &[("Pizza", 5), ("Lasanha", 10), ("Suco", 20)]).await;
            let before = orders_by_name(&list);
            let pizza = list[0].id.clone();

            assert!(svc.move_item(&list, &pizza, Direction::Down).await.is_swapped());
            let moved = svc.list(&MenuFilter::default()).await;
            assert_eq!(moved[1].id, pizza, "{backend}/{strategy}");
            assert!(svc.move_item(&moved, &pizza, Direction::Up).await.is_swapped());

            let after = orders_by_name(&svc.list(&MenuFilter::default()).await);
            assert_eq!(after, before, "{backend}/{strategy}");
        }
    }
}

#[tokio::test]
async fn second_write_failure_is_not_rolled_back() {
    for (backend, store) in backends().await {
        let (ctx, _) = context(store.clone());
        let setup = MenuService::new(ctx);
        let list = seeded(&setup, &[("Pizza", 5), ("Lasanha", 10), ("Suco", 20)]).await;

        let (ctx, notifier) = context(Arc::new(FailingStore::failing_after(store, 1)));
        let svc = MenuService::new(ctx);
        let outcome = svc.move_item(&list, &list[1].id, Direction::Up).await;
        assert_eq!(
            outcome,
            MoveOutcome::WriteFailed {
                first_write_applied: true
            },
            "{backend}"
        );

        // the target took the neighbour's value, the neighbour kept its own
        let after = orders_by_name(&setup.list(&MenuFilter::default()).await);
        assert_eq!(after["Lasanha"], Some(5), "{backend}");
        assert_eq!(after["Pizza"], Some(5), "{backend}");

        let errors = notifier.errors();
        assert_eq!(errors.len(), 1, "{backend}");
        assert_eq!(errors[0].description, "Não foi possível reordenar os itens.");
    }
}
