use perfume_shop_api::{
    db::{create_orm_conn, run_migrations},
    dto::orders::{CreateOrderRequest, OrderItemInput, UpdateOrderItemRequest, UpdateOrderRequest},
    entity::{products::ActiveModel as ProductActive, users::ActiveModel as UserActive},
    error::AppError,
    routes::params::Pagination,
    services::{order_item_service, order_service},
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use std::str::FromStr;

// Integration flow: create an order with items, mutate it, and verify that
// deletion removes the order and its items together.
#[tokio::test]
async fn order_crud_and_item_lifecycle_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let user_id = create_user(&state, "order-flow@example.com").await?;
    let product_id = create_product(&state, "Amber Noir 50ml", "79.50").await?;

    // Create with items: both inserts happen in one transaction.
    let order = order_service::create_order(
        &state,
        CreateOrderRequest {
            user_id: Some(user_id),
            total_price: Some(Decimal::from_str("159.00")?),
            status: None,
            items: Some(vec![OrderItemInput {
                product_id,
                quantity: 2,
                price: Decimal::from_str("79.50")?,
            }]),
        },
    )
    .await?;
    assert_eq!(order.status, "Pending");
    assert_eq!(order.payment_status, "pending");
    assert!(order.payment_intent_id.is_none());

    // Missing required fields surface as a validation failure.
    let err = order_service::create_order(
        &state,
        CreateOrderRequest {
            user_id: Some(user_id),
            total_price: None,
            status: None,
            items: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let fetched = order_service::get_order(&state, order.id).await?;
    assert_eq!(fetched.items.len(), 1);
    assert_eq!(fetched.items[0].quantity, 2);

    // Appending items to an unknown order is refused.
    let err = order_item_service::add_items(
        &state,
        order.id + 999,
        vec![OrderItemInput {
            product_id,
            quantity: 1,
            price: Decimal::from_str("79.50")?,
        }],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Listing items is total: unknown order ids yield an empty vec.
    let items = order_item_service::list_items(&state, order.id + 999).await?;
    assert!(items.is_empty());

    // Append, update, and remove an individual item.
    let appended = order_item_service::add_items(
        &state,
        order.id,
        vec![OrderItemInput {
            product_id,
            quantity: 1,
            price: Decimal::from_str("59.00")?,
        }],
    )
    .await?;
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0].order_id, order.id);

    let updated_item = order_item_service::update_item(
        &state,
        appended[0].id,
        UpdateOrderItemRequest {
            quantity: Some(3),
            price: None,
        },
    )
    .await?;
    assert_eq!(updated_item.quantity, 3);
    assert_eq!(updated_item.price, Decimal::from_str("59.00")?);

    order_item_service::remove_item(&state, appended[0].id).await?;
    let err = order_item_service::update_item(
        &state,
        appended[0].id,
        UpdateOrderItemRequest {
            quantity: Some(1),
            price: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Partial order update.
    let updated = order_service::update_order(
        &state,
        order.id,
        UpdateOrderRequest {
            status: Some("Completed".into()),
            total_price: None,
            payment_status: None,
            payment_method: None,
        },
    )
    .await?;
    assert_eq!(updated.status, "Completed");
    assert_eq!(updated.total_price, Decimal::from_str("159.00")?);

    // Admin paginated listing, newest first.
    let page = order_service::list_orders_paginated(
        &state,
        Pagination {
            page: Some(1),
            limit: Some(10),
        },
    )
    .await?;
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, 10);
    assert!(page.total >= 1);
    assert!(page.data.iter().any(|o| o.id == order.id));

    // Deleting the order removes its remaining items with it.
    order_service::delete_order(&state, order.id).await?;
    let items = order_item_service::list_items(&state, order.id).await?;
    assert!(items.is_empty());
    let err = order_service::get_order(&state, order.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, products, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState { orm, gateway: None })
}

async fn create_user(state: &AppState, email: &str) -> anyhow::Result<i32> {
    let user = UserActive {
        id: NotSet,
        name: Set("Test User".into()),
        email: Set(email.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_product(state: &AppState, name: &str, price: &str) -> anyhow::Result<i32> {
    let product = ProductActive {
        id: NotSet,
        name: Set(name.to_string()),
        price: Set(Decimal::from_str(price)?),
        stock: Set(10),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}
