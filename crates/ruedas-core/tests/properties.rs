//! Property tests for sale totals, stock plans and folios.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ruedas_core::money::Money;
use ruedas_core::sale::{compute_totals, generate_folio, is_valid_folio, SaleItemRequest, SaleRequest};
use ruedas_core::stock::{plan_adjustment, plan_inbound, plan_outbound};
use ruedas_core::types::{StockDirection, TaxRate};
use ruedas_core::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY};

fn item_strategy() -> impl Strategy<Value = SaleItemRequest> {
    (1i64..500, 1i64..50, 0i64..500_000, 0u32..=100).prop_map(
        |(product_id, quantity, unit_price_cents, pct)| SaleItemRequest {
            product_id,
            quantity,
            unit_price_cents,
            discount_percent: pct as f64,
        },
    )
}

fn extreme_item_strategy() -> impl Strategy<Value = SaleItemRequest> {
    (1i64..=MAX_ITEM_QUANTITY, 0i64..=MAX_AMOUNT_CENTS, 0u32..=100).prop_map(
        |(quantity, unit_price_cents, pct)| SaleItemRequest {
            product_id: 1,
            quantity,
            unit_price_cents,
            discount_percent: pct as f64,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn totals_reconcile_with_lines(
        items in prop::collection::vec(item_strategy(), 1..12),
        general_discount in 0i64..100_000,
    ) {
        let computed = compute_totals(&items, Money::from_cents(general_discount), TaxRate::IVA).unwrap();
        let totals = computed.totals;

        let line_sum: i64 = computed.lines.iter().map(|l| l.line_total.cents()).sum();
        prop_assert_eq!(totals.subtotal_cents, line_sum);
        prop_assert_eq!(
            totals.total_cents,
            totals.subtotal_cents + totals.tax_cents - totals.discount_cents
        );
        prop_assert_eq!(totals.discount_cents, general_discount);
    }

    #[test]
    fn line_discount_never_increases_the_line(item in item_strategy()) {
        let computed = compute_totals(std::slice::from_ref(&item), Money::zero(), TaxRate::IVA).unwrap();
        let gross = item.unit_price_cents * item.quantity;
        let net = computed.lines[0].line_total.cents();
        prop_assert!(net >= 0 && net <= gross, "net {} gross {}", net, gross);
    }

    #[test]
    fn tax_is_sixteen_percent_within_a_centavo(subtotal in 0i64..100_000_000) {
        let tax = Money::from_cents(subtotal).calculate_tax(TaxRate::IVA).cents();
        let exact = subtotal as f64 * 0.16;
        prop_assert!((tax as f64 - exact).abs() <= 0.5 + f64::EPSILON);
    }

    #[test]
    fn stock_plans_balance(current in 0i64..10_000, qty in 1i64..10_000) {
        let inbound = plan_inbound(current, qty);
        prop_assert_eq!(inbound.after, inbound.before + inbound.quantity);

        let outbound = plan_outbound(current, qty);
        prop_assert_eq!(outbound.after, outbound.before - outbound.quantity);
    }

    #[test]
    fn adjustment_lands_on_target(current in 0i64..10_000, target in 0i64..10_000) {
        match plan_adjustment(current, target).unwrap() {
            None => prop_assert_eq!(current, target),
            Some(change) => {
                prop_assert_eq!(change.after, target);
                prop_assert!(change.quantity > 0);
                prop_assert_eq!(change.direction.apply(current, change.quantity), target);
                let expected = if target > current { StockDirection::In } else { StockDirection::Out };
                prop_assert_eq!(change.direction, expected);
            }
        }
    }

    #[test]
    fn validated_requests_always_price(
        items in prop::collection::vec(extreme_item_strategy(), 1..12),
        general_discount in 0i64..=MAX_AMOUNT_CENTS,
        down_payment in 0i64..=MAX_AMOUNT_CENTS,
    ) {
        let request = SaleRequest {
            customer_id: None,
            employee_id: 1,
            payment_method_id: 1,
            sale_type_id: 2,
            items,
            general_discount_cents: general_discount,
            down_payment_cents: down_payment,
            cash_received_cents: None,
            change_cents: None,
        };
        prop_assert!(request.validate().is_ok());

        let computed = compute_totals(&request.items, Money::from_cents(general_discount), TaxRate::IVA);
        prop_assert!(computed.is_ok(), "{:?}", computed);
    }

    #[test]
    fn folios_are_always_well_formed(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let folio = generate_folio(&mut rng);
        prop_assert!(is_valid_folio(&folio), "bad folio {}", folio);
    }
}
