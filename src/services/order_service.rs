use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, OrderList, UpdateOrderStatusRequest},
    entity::{
        Categories, Users,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, OrderItemIds},
        products::{Column as ProductCol, Entity as Products},
    },
    error::{AppError, AppResult},
    models::{Order, OrderDetail, OrderItemDetail, Product},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// All orders, newest first, with the owning user's id and name inlined.
pub async fn list_orders(state: &AppState) -> AppResult<ApiResponse<OrderList>> {
    let items: Vec<Order> = Orders::find()
        .find_also_related(Users)
        .order_by_desc(OrderCol::DateOrdered)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(order, user)| Order::from_entity(order, user))
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Deep expansion: items, each item's product, that product's category.
pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderDetail>> {
    let (order, user) = Orders::find_by_id(id)
        .find_also_related(Users)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let item_ids = order.order_item_ids.0.clone();

    let items_by_id: HashMap<Uuid, _> = OrderItems::find()
        .filter(OrderItemCol::Id.is_in(item_ids.clone()))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    let product_ids: Vec<Uuid> = items_by_id.values().map(|item| item.product_id).collect();
    let products_by_id: HashMap<Uuid, Product> = Products::find()
        .filter(ProductCol::Id.is_in(product_ids))
        .find_also_related(Categories)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(product, category)| (product.id, Product::from_entity(product, category)))
        .collect();

    // Reassemble in stored reference order; dangling item ids are skipped.
    let order_items: Vec<OrderItemDetail> = item_ids
        .iter()
        .filter_map(|item_id| items_by_id.get(item_id))
        .map(|item| OrderItemDetail {
            id: item.id,
            quantity: item.quantity,
            product: products_by_id.get(&item.product_id).cloned(),
        })
        .collect();

    let detail = OrderDetail {
        id: order.id,
        order_items,
        shipping_address1: order.shipping_address1,
        shipping_address2: order.shipping_address2,
        city: order.city,
        zip: order.zip,
        country: order.country,
        phone: order.phone,
        status: order.status,
        total_price: order.total_price,
        user: user.map(Into::into),
        date_ordered: order.date_ordered.with_timezone(&chrono::Utc),
    };

    Ok(ApiResponse::success("Order", detail, None))
}

/// Items are inserted first so the order can reference their generated ids;
/// one transaction covers both phases, so a failure leaves no orphaned items.
pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    for input in &payload.order_items {
        if input.quantity <= 0 {
            return Err(AppError::BadRequest(
                "Order item quantity must be positive".into(),
            ));
        }
    }

    let txn = state.orm.begin().await?;

    let mut item_ids = Vec::with_capacity(payload.order_items.len());
    for input in &payload.order_items {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product),
            quantity: Set(input.quantity),
        }
        .insert(&txn)
        .await?;
        item_ids.push(item.id);
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_item_ids: Set(OrderItemIds(item_ids)),
        shipping_address1: Set(payload.shipping_address1),
        shipping_address2: Set(payload.shipping_address2),
        city: Set(payload.city),
        zip: Set(payload.zip),
        country: Set(payload.country),
        phone: Set(payload.phone),
        status: Set(payload.status.unwrap_or_else(|| "Pending".to_string())),
        total_price: Set(payload.total_price),
        user_id: Set(payload.user),
        date_ordered: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    let user = Users::find_by_id(order.user_id).one(&state.orm).await?;
    Ok(ApiResponse::success(
        "Order created",
        Order::from_entity(order, user),
        Some(Meta::empty()),
    ))
}

/// Status is the only mutable field after creation.
pub async fn update_order_status(
    state: &AppState,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    let order = active.update(&state.orm).await?;

    let user = Users::find_by_id(order.user_id).one(&state.orm).await?;
    Ok(ApiResponse::success(
        "Order status updated",
        Order::from_entity(order, user),
        Some(Meta::empty()),
    ))
}

/// Cascade delete: the order and every referenced item go in one transaction.
pub async fn delete_order(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    Orders::delete_by_id(id).exec(&txn).await?;

    if !order.order_item_ids.0.is_empty() {
        OrderItems::delete_many()
            .filter(OrderItemCol::Id.is_in(order.order_item_ids.0.clone()))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Order deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
