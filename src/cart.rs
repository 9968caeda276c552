//! Session cart: an in-memory line list with merge-on-identical-variant
//! semantics, plus the process-wide registry that keys carts by the opaque
//! `X-Cart-Session` value a client presents.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Upper bound on a single line's quantity; adds and updates clamp to it.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// The slice of a product a cart line snapshots at add time.
#[derive(Clone, Debug)]
pub struct ProductSnapshot {
    pub product_id: i32,
    pub name: String,
    pub price: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct CartLine {
    pub product_id: i32,
    pub product_name: String,
    pub size: String,
    pub color_name: String,
    pub color_hex: String,
    pub quantity: u32,
    /// Captured when the line was created; later price edits do not touch it.
    pub unit_price: f32,
}

/// A single session's cart. All mutation funnels through these methods;
/// (product_id, size, color_name) is the merge key.
#[derive(Clone, Debug, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Adds `quantity` of a variant, merging into an existing line when the
    /// merge key matches. Quantity is clamped to 1..=MAX_LINE_QUANTITY.
    /// Returns the notification text the HTTP layer surfaces to the shopper.
    pub fn add_item(
        &mut self,
        product: &ProductSnapshot,
        quantity: u32,
        size: &str,
        color_name: &str,
        color_hex: &str,
    ) -> String {
        let quantity = quantity.clamp(1, MAX_LINE_QUANTITY);

        let existing = self.lines.iter_mut().find(|line| {
            line.product_id == product.product_id
                && line.size == size
                && line.color_name == color_name
        });

        match existing {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY)
            }
            None => self.lines.push(CartLine {
                product_id: product.product_id,
                product_name: product.name.clone(),
                size: size.to_owned(),
                color_name: color_name.to_owned(),
                color_hex: color_hex.to_owned(),
                quantity,
                unit_price: product.price,
            }),
        }

        format!("Added {} {} to cart", quantity, product.name)
    }

    /// Removes every line for the product, regardless of size and color.
    pub fn remove_item(&mut self, product_id: i32) -> usize {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        before - self.lines.len()
    }

    /// Sets the quantity on every line of the product, capped at
    /// MAX_LINE_QUANTITY. A quantity of 0 is accepted and leaves zero-quantity
    /// lines in place rather than removing them; callers wanting removal use
    /// `remove_item`.
    pub fn update_quantity(&mut self, product_id: i32, quantity: u32) -> usize {
        let quantity = quantity.min(MAX_LINE_QUANTITY);
        let mut touched = 0;
        for line in &mut self.lines {
            if line.product_id == product_id {
                line.quantity = quantity;
                touched += 1;
            }
        }
        touched
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn total(&self) -> f32 {
        self.lines
            .iter()
            .map(|line| line.unit_price * line.quantity as f32)
            .sum()
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Process-wide map of session key -> cart, plus the set of sessions with a
/// checkout submission in flight (the duplicate-submission guard).
#[derive(Clone, Default)]
pub struct CartRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    carts: HashMap<String, Cart>,
    in_flight: HashSet<String>,
}

impl CartRegistry {
    /// Runs `f` against the session's cart, creating an empty cart on first use.
    pub fn with_cart<T>(&self, session: &str, f: impl FnOnce(&mut Cart) -> T) -> T {
        let mut inner = self.inner.lock().expect("cart registry lock poisoned");
        let cart = inner.carts.entry(session.to_owned()).or_default();
        f(cart)
    }

    pub fn snapshot(&self, session: &str) -> Cart {
        let mut inner = self.inner.lock().expect("cart registry lock poisoned");
        inner.carts.entry(session.to_owned()).or_default().clone()
    }

    /// Marks a checkout submission as in flight for the session. Returns false
    /// when one is already pending, in which case the caller must refuse the
    /// duplicate submission.
    pub fn begin_submission(&self, session: &str) -> bool {
        let mut inner = self.inner.lock().expect("cart registry lock poisoned");
        inner.in_flight.insert(session.to_owned())
    }

    pub fn end_submission(&self, session: &str) {
        let mut inner = self.inner.lock().expect("cart registry lock poisoned");
        inner.in_flight.remove(session);
    }

    /// Empties the session's cart and lifts the in-flight flag under one lock,
    /// so no other caller can observe the purchased lines with the flag down.
    pub fn complete_submission(&self, session: &str) {
        let mut inner = self.inner.lock().expect("cart registry lock poisoned");
        if let Some(cart) = inner.carts.get_mut(session) {
            cart.clear();
        }
        inner.in_flight.remove(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tee(id: i32, price: f32) -> ProductSnapshot {
        ProductSnapshot {
            product_id: id,
            name: format!("Tee {}", id),
            price,
        }
    }

    #[test]
    fn identical_variants_merge_into_one_line() {
        let mut cart = Cart::default();
        cart.add_item(&tee(1, 2999.0), 2, "M", "Black", "#000000");
        cart.add_item(&tee(1, 2999.0), 3, "M", "Black", "#000000");

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn different_sizes_stay_distinct() {
        let mut cart = Cart::default();
        cart.add_item(&tee(1, 2999.0), 1, "M", "Black", "#000000");
        cart.add_item(&tee(1, 2999.0), 1, "L", "Black", "#000000");

        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn different_colors_stay_distinct() {
        let mut cart = Cart::default();
        cart.add_item(&tee(1, 2999.0), 1, "M", "Black", "#000000");
        cart.add_item(&tee(1, 2999.0), 1, "M", "White", "#FFFFFF");

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn zero_quantity_add_is_clamped_to_one() {
        let mut cart = Cart::default();
        cart.add_item(&tee(1, 2999.0), 0, "M", "Black", "#000000");

        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn add_returns_the_notification_text() {
        let mut cart = Cart::default();
        let note = cart.add_item(&tee(7, 1000.0), 2, "S", "White", "#FFFFFF");

        assert_eq!(note, "Added 2 Tee 7 to cart");
    }

    #[test]
    fn unit_price_is_captured_at_add_time() {
        let mut cart = Cart::default();
        cart.add_item(&tee(1, 2999.0), 1, "M", "Black", "#000000");
        // A price edit after the add must not leak into the existing line.
        cart.add_item(&tee(1, 9999.0), 1, "L", "Black", "#000000");

        assert_eq!(cart.lines()[0].unit_price, 2999.0);
        assert_eq!(cart.lines()[1].unit_price, 9999.0);
    }

    #[test]
    fn remove_drops_every_variant_of_the_product() {
        let mut cart = Cart::default();
        cart.add_item(&tee(1, 2999.0), 1, "M", "Black", "#000000");
        cart.add_item(&tee(1, 2999.0), 1, "L", "White", "#FFFFFF");
        cart.add_item(&tee(2, 3499.0), 1, "M", "Black", "#000000");

        let removed = cart.remove_item(1);

        assert_eq!(removed, 2);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product_id, 2);
    }

    #[test]
    fn update_to_zero_keeps_the_line() {
        let mut cart = Cart::default();
        cart.add_item(&tee(1, 2999.0), 2, "M", "Black", "#000000");
        cart.update_quantity(1, 0);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 0);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn totals_track_updates_and_removes() {
        let mut cart = Cart::default();
        cart.add_item(&tee(1, 3000.0), 2, "M", "Black", "#000000");
        cart.add_item(&tee(2, 2000.0), 1, "L", "White", "#FFFFFF");
        assert_eq!(cart.total(), 8000.0);
        assert_eq!(cart.item_count(), 3);

        cart.update_quantity(1, 1);
        assert_eq!(cart.total(), 5000.0);

        cart.remove_item(2);
        assert_eq!(cart.total(), 3000.0);

        cart.clear();
        assert_eq!(cart.total(), 0.0);
        assert!(cart.is_empty());
    }

    #[test]
    fn registry_keeps_sessions_independent() {
        let registry = CartRegistry::default();
        registry.with_cart("a", |cart| {
            cart.add_item(&tee(1, 1000.0), 1, "M", "Black", "#000000");
        });

        assert_eq!(registry.snapshot("a").item_count(), 1);
        assert_eq!(registry.snapshot("b").item_count(), 0);
    }

    #[test]
    fn quantities_cap_at_the_line_maximum() {
        let mut cart = Cart::default();
        cart.add_item(&tee(1, 1000.0), u32::MAX, "M", "Black", "#000000");
        assert_eq!(cart.lines()[0].quantity, MAX_LINE_QUANTITY);

        // Merging into a full line must not overflow past the cap either.
        cart.add_item(&tee(1, 1000.0), 5, "M", "Black", "#000000");
        assert_eq!(cart.lines()[0].quantity, MAX_LINE_QUANTITY);

        cart.update_quantity(1, u32::MAX);
        assert_eq!(cart.lines()[0].quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn completing_a_submission_empties_the_cart_and_lifts_the_guard() {
        let registry = CartRegistry::default();
        registry.with_cart("a", |cart| {
            cart.add_item(&tee(1, 1000.0), 2, "M", "Black", "#000000");
        });
        assert!(registry.begin_submission("a"));

        registry.complete_submission("a");

        // A follow-up submission starts from an already-empty cart; there is
        // no window where the flag is down but the lines are still present.
        assert!(registry.begin_submission("a"));
        assert!(registry.snapshot("a").is_empty());
    }

    #[test]
    fn submission_guard_refuses_a_second_submit() {
        let registry = CartRegistry::default();
        assert!(registry.begin_submission("a"));
        assert!(!registry.begin_submission("a"));
        assert!(registry.begin_submission("b"));

        registry.end_submission("a");
        assert!(registry.begin_submission("a"));
    }
}
