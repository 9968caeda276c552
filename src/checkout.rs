//! Checkout workflow: derived pricing, payload validation and the atomic
//! order + order-items write.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::cart::{CartLine, MAX_LINE_QUANTITY};
use crate::entities::{
    customer, customer::Entity as CustomerEntity, order, order::PaymentMethod, order::Status,
    order_item, order_item::Entity as OrderItemEntity,
};

/// Shipping is waived strictly above this subtotal.
pub const FREE_SHIPPING_THRESHOLD: f32 = 10_000.0;
pub const FLAT_SHIPPING_FEE: f32 = 500.0;
/// Flat percentage, no jurisdiction logic.
pub const TAX_RATE: f32 = 0.08;

pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct Quote {
    pub subtotal: f32,
    pub shipping: f32,
    pub tax: f32,
    pub total: f32,
}

pub fn quote(subtotal: f32) -> Quote {
    let subtotal = round2(subtotal);
    let shipping = if subtotal > FREE_SHIPPING_THRESHOLD {
        0.0
    } else {
        FLAT_SHIPPING_FEE
    };
    let tax = round2(subtotal * TAX_RATE);
    Quote {
        subtotal,
        shipping,
        tax,
        total: round2(subtotal + shipping + tax),
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CheckoutPayload {
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "street address is required"))]
    pub address_line1: String,
    pub address_line2: Option<String>,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "state is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "postal code is required"))]
    pub postal_code: String,
    #[validate(length(min = 1, message = "country is required"))]
    pub country: String,
    pub payment_method: PaymentMethod,
    // Required only for credit card payments; validated, never persisted.
    pub card_number: Option<String>,
    pub card_expiry: Option<String>,
    pub card_cvc: Option<String>,
}

impl CheckoutPayload {
    /// Field-level checks plus the payment-method-conditional card fields,
    /// flattened into one list of human-readable messages.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut messages: Vec<String> = Vec::new();

        if let Err(errors) = self.validate() {
            for (field, field_errors) in errors.field_errors() {
                for error in field_errors {
                    match &error.message {
                        Some(message) => messages.push(message.to_string()),
                        None => messages.push(format!("{} is invalid", field)),
                    }
                }
            }
        }

        if self.payment_method == PaymentMethod::CreditCard {
            let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
            if blank(&self.card_number) {
                messages.push("card number is required".to_owned());
            }
            if blank(&self.card_expiry) {
                messages.push("card expiry is required".to_owned());
            }
            if blank(&self.card_cvc) {
                messages.push("card cvc is required".to_owned());
            }
        }

        messages.sort();
        messages
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Checkout validation failed")]
    Validation(Vec<String>),
    #[error("Order could not be persisted")]
    Db(#[from] DbErr),
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderReceipt {
    pub order_id: i32,
    pub order_number: String,
    pub email: String,
    pub total: f32,
}

/// Persists the order header and one item per cart line inside a single
/// transaction: either the whole order lands or none of it does. Items carry
/// the line's captured unit price, not the live product price. The caller
/// clears the session cart only after this returns Ok.
pub async fn submit_order(
    db: &DatabaseConnection,
    payload: &CheckoutPayload,
    lines: &[CartLine],
    customer_id: Option<i32>,
) -> Result<OrderReceipt, CheckoutError> {
    let errors = payload.validation_errors();
    if !errors.is_empty() {
        return Err(CheckoutError::Validation(errors));
    }
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let subtotal: f32 = lines
        .iter()
        .map(|line| line.unit_price * line.quantity as f32)
        .sum();
    let pricing = quote(subtotal);
    let now = Utc::now();

    let txn = db.begin().await.map_err(CheckoutError::Db)?;

    let header = order::ActiveModel {
        customer_id: Set(customer_id),
        status: Set(Status::Pending),
        total_amount: Set(pricing.total),
        shipping_address: Set(payload.address_line1.clone()),
        shipping_city: Set(payload.city.clone()),
        shipping_state: Set(payload.state.clone()),
        shipping_postal_code: Set(payload.postal_code.clone()),
        shipping_country: Set(payload.country.clone()),
        payment_method: Set(payload.payment_method),
        contact_email: Set(payload.email.clone()),
        contact_phone: Set(payload.phone.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let header = match header.insert(&txn).await {
        Ok(model) => model,
        Err(err) => {
            let _ = txn.rollback().await;
            return Err(CheckoutError::Db(err));
        }
    };

    let items: Vec<order_item::ActiveModel> = lines
        .iter()
        .map(|line| order_item::ActiveModel {
            order_id: Set(header.id),
            product_id: Set(line.product_id),
            variant_id: Set(None),
            quantity: Set(line.quantity.min(MAX_LINE_QUANTITY) as i32),
            price: Set(line.unit_price),
            created_at: Set(now),
            ..Default::default()
        })
        .collect();

    if let Err(err) = OrderItemEntity::insert_many(items).exec(&txn).await {
        let _ = txn.rollback().await;
        return Err(CheckoutError::Db(err));
    }

    txn.commit().await.map_err(CheckoutError::Db)?;

    Ok(OrderReceipt {
        order_id: header.id,
        order_number: format!("ORD-{:06}", header.id),
        email: payload.email.clone(),
        total: pricing.total,
    })
}

/// Copies the submitted contact/address fields onto an authenticated
/// customer's profile after a successful order. Callers swallow a failure
/// here; it must never block the confirmation.
pub async fn upsert_customer_profile(
    db: &DatabaseConnection,
    customer_id: i32,
    payload: &CheckoutPayload,
) -> Result<(), DbErr> {
    let Some(existing) = CustomerEntity::find_by_id(customer_id).one(db).await? else {
        return Ok(());
    };

    let mut profile: customer::ActiveModel = existing.into();
    profile.first_name = Set(Some(payload.first_name.clone()));
    profile.last_name = Set(Some(payload.last_name.clone()));
    profile.phone = Set(Some(payload.phone.clone()));
    profile.address_line1 = Set(Some(payload.address_line1.clone()));
    profile.address_line2 = Set(payload.address_line2.clone());
    profile.city = Set(Some(payload.city.clone()));
    profile.state = Set(Some(payload.state.clone()));
    profile.postal_code = Set(Some(payload.postal_code.clone()));
    profile.country = Set(Some(payload.country.clone()));
    profile.update(db).await.map(|_| ())
}
