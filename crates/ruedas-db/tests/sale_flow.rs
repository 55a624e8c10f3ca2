//! End-to-end sale scenarios against a migrated database: in-memory for
//! the single-register flows, a temporary file with a multi-connection
//! pool for concurrent registers.

use chrono::Utc;
use ruedas_core::entities::{NewContact, NewCustomer, NewEmployee, NewProduct};
use ruedas_core::report::DateRange;
use ruedas_core::sale::{is_valid_folio, SaleItemRequest, SaleRequest};
use ruedas_core::stock::EntryRequest;
use ruedas_core::{CoreError, GeneralStatus, SaleTerms, SaleType};
use ruedas_db::{Database, DbConfig, DbError};
use tempfile::TempDir;

struct Shop {
    db: Database,
    employee_id: i64,
    // keeps the database file alive for file-backed shops
    _dir: Option<TempDir>,
}

impl Shop {
    async fn open() -> Shop {
        Shop::with_config(DbConfig::in_memory(), None).await
    }

    /// A file database behind a five-connection pool, like production.
    async fn open_file() -> Shop {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("pos_refaccionaria.db")).max_connections(5);
        Shop::with_config(config, Some(dir)).await
    }

    async fn with_config(config: DbConfig, dir: Option<TempDir>) -> Shop {
        let db = Database::new(config).await.unwrap();
        let employee = db
            .employees()
            .create(&NewEmployee {
                first_name: "Ana".to_string(),
                last_name_1: "Ruiz".to_string(),
                last_name_2: None,
                rfc: "RUAA800101AB1".to_string(),
                curp: None,
                nss: None,
                contact: NewContact {
                    phone: Some("4430001122".to_string()),
                    ..Default::default()
                },
                account: None,
            })
            .await
            .unwrap();

        Shop {
            db,
            employee_id: employee.id,
            _dir: dir,
        }
    }

    async fn product(&self, name: &str, price_cents: i64, stock: i64) -> i64 {
        let product = self
            .db
            .products()
            .create(&NewProduct {
                name: name.to_string(),
                barcode: None,
                description: None,
                purchase_price_cents: price_cents / 2,
                sale_price_cents: price_cents,
                stock_min: 1,
                stock_max: 100,
                brand_id: None,
                category_id: None,
                unit_id: None,
            })
            .await
            .unwrap();

        if stock > 0 {
            self.db
                .inventory()
                .entry(&EntryRequest {
                    product_id: product.id,
                    employee_id: self.employee_id,
                    quantity: stock,
                    concept: None,
                })
                .await
                .unwrap();
        }

        product.id
    }

    async fn stock(&self, product_id: i64) -> i64 {
        self.db.inventory().stock(product_id).await.unwrap().current_stock
    }

    fn request(&self, items: Vec<SaleItemRequest>) -> SaleRequest {
        SaleRequest {
            customer_id: None,
            employee_id: self.employee_id,
            payment_method_id: 1,
            sale_type_id: SaleType::Cash.id(),
            items,
            general_discount_cents: 0,
            down_payment_cents: 0,
            cash_received_cents: None,
            change_cents: None,
        }
    }
}

fn item(product_id: i64, quantity: i64, unit_price_cents: i64, discount_percent: f64) -> SaleItemRequest {
    SaleItemRequest {
        product_id,
        quantity,
        unit_price_cents,
        discount_percent,
    }
}

async fn count(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn two_discounted_units_total_208_80() {
    let shop = Shop::open().await;
    let product_id = shop.product("Cadena KMC X11", 10_000, 5).await;

    let outcome = shop
        .db
        .sales()
        .process_sale(&shop.request(vec![item(product_id, 2, 10_000, 10.0)]), SaleTerms::default())
        .await
        .unwrap();

    let totals = outcome.receipt.totals;
    assert_eq!(totals.subtotal_cents, 18_000);
    assert_eq!(totals.tax_cents, 2_880);
    assert_eq!(totals.total_cents, 20_880);
    assert!(is_valid_folio(&outcome.receipt.folio));
    assert_eq!(outcome.receipt.pending_balance_cents, 0);
    assert!(outcome.receipt.credit_due_date.is_none());

    let detail = shop.db.sales().get(outcome.receipt.sale_id).await.unwrap();
    assert_eq!(detail.sale.employee_name, "Ana Ruiz");
    assert_eq!(detail.sale.payment_method_name, "Efectivo");
    assert_eq!(detail.lines.len(), 1);
    assert_eq!(detail.lines[0].discount_bps, 1_000);
    assert_eq!(detail.lines[0].line_total_cents, 18_000);
}

#[tokio::test]
async fn cash_sale_decreases_stock_by_quantity() {
    let shop = Shop::open().await;
    let product_id = shop.product("Balatas Shimano B01S", 19_500, 10).await;

    let outcome = shop
        .db
        .sales()
        .process_sale(&shop.request(vec![item(product_id, 3, 19_500, 0.0)]), SaleTerms::default())
        .await
        .unwrap();

    assert_eq!(shop.stock(product_id).await, 7);
    assert_eq!(outcome.stock.len(), 1);
    assert_eq!(outcome.stock[0].current_stock, 7);

    let audit = shop.db.inventory().audit(product_id).await.unwrap();
    assert!(audit.consistent);
    assert_eq!(audit.derived, 7);

    let history = shop.db.inventory().movements(product_id, None).await.unwrap();
    assert_eq!(history[0].stock_before, 10);
    assert_eq!(history[0].stock_after, 7);
    assert_eq!(history[0].kind_name, "Salida por venta");
}

#[tokio::test]
async fn insufficient_stock_lists_every_product_and_writes_nothing() {
    let shop = Shop::open().await;
    let chain = shop.product("Cadena KMC X11", 45_000, 1).await;
    let tube = shop.product("Cámara 26x1.95", 8_500, 0).await;
    let grips = shop.product("Puños de silicón", 11_000, 10).await;

    let movements_before = count(&shop.db, "movement_details").await;

    let request = shop.request(vec![
        item(chain, 2, 45_000, 0.0),
        item(grips, 1, 11_000, 0.0),
        item(tube, 1, 8_500, 0.0),
    ]);
    let err = shop
        .db
        .sales()
        .process_sale(&request, SaleTerms::default())
        .await
        .unwrap_err();

    match err {
        DbError::Domain(CoreError::InsufficientStock { products }) => {
            assert_eq!(
                products,
                vec!["Cadena KMC X11".to_string(), "Cámara 26x1.95".to_string()]
            );
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(count(&shop.db, "sales").await, 0);
    assert_eq!(count(&shop.db, "sale_items").await, 0);
    assert_eq!(count(&shop.db, "movement_details").await, movements_before);
    assert_eq!(shop.stock(chain).await, 1);
    assert_eq!(shop.stock(grips).await, 10);
}

#[tokio::test]
async fn repeated_product_lines_are_checked_together() {
    let shop = Shop::open().await;
    let chain = shop.product("Cadena KMC X11", 45_000, 3).await;

    let request = shop.request(vec![item(chain, 2, 45_000, 0.0), item(chain, 2, 45_000, 0.0)]);
    let err = shop
        .db
        .sales()
        .process_sale(&request, SaleTerms::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));
    assert_eq!(shop.stock(chain).await, 3);
}

#[tokio::test]
async fn credit_sale_books_receivable_and_balance() {
    let shop = Shop::open().await;
    let product_id = shop.product("Desviador Shimano Deore", 100_000, 4).await;
    let customer = shop
        .db
        .customers()
        .create(&NewCustomer {
            name: "Taller El Pedal".to_string(),
            rfc: None,
            credit_limit_cents: 1_000_000,
            contact: NewContact::default(),
        })
        .await
        .unwrap();

    let mut request = shop.request(vec![item(product_id, 1, 100_000, 0.0)]);
    request.sale_type_id = SaleType::Credit.id();
    request.customer_id = Some(customer.id);
    request.down_payment_cents = 16_000;

    let outcome = shop
        .db
        .sales()
        .process_sale(&request, SaleTerms::default())
        .await
        .unwrap();

    let total = outcome.receipt.totals.total_cents;
    assert_eq!(total, 116_000);
    assert_eq!(outcome.receipt.pending_balance_cents, total - 16_000);

    let due = outcome.receipt.credit_due_date.unwrap();
    assert_eq!((due - outcome.receipt.sold_at).num_days(), 30);

    let receivable: i64 = sqlx::query_scalar("SELECT amount_cents FROM receivables WHERE sale_id = ?1")
        .bind(outcome.receipt.sale_id)
        .fetch_one(shop.db.pool())
        .await
        .unwrap();
    assert_eq!(receivable, total - 16_000);

    let credit = shop.db.customers().credit(customer.id).await.unwrap();
    assert_eq!(credit.balance_cents, total - 16_000);

    let sales = shop.db.sales().by_customer(customer.id).await.unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].sale_type, SaleType::Credit);
    assert_eq!(sales[0].customer_name.as_deref(), Some("Taller El Pedal"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_of_last_unit_yield_one_success() {
    let shop = Shop::open_file().await;
    let product_id = shop.product("Casco urbano talla M", 59_000, 1).await;
    let request = shop.request(vec![item(product_id, 1, 59_000, 0.0)]);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let sales = shop.db.sales();
            let request = request.clone();
            tokio::spawn(async move { sales.process_sale(&request, SaleTerms::default()).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(DbError::Domain(CoreError::InsufficientStock { products })) => {
                assert_eq!(products, vec!["Casco urbano talla M".to_string()]);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 1);

    assert_eq!(shop.stock(product_id).await, 0);
    assert_eq!(count(&shop.db, "sales").await, 1);
    assert!(shop.db.inventory().audit(product_id).await.unwrap().consistent);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_of_distinct_products_all_succeed() {
    let shop = Shop::open_file().await;
    let mut products = Vec::new();
    for n in 0..8 {
        products.push(shop.product(&format!("Cámara 700x{}c", 23 + n), 8_950, 100).await);
    }

    let handles: Vec<_> = (0..40)
        .map(|i| {
            let sales = shop.db.sales();
            let request = shop.request(vec![item(products[i % products.len()], 1, 8_950, 0.0)]);
            tokio::spawn(async move { sales.process_sale(&request, SaleTerms::default()).await })
        })
        .collect();

    for handle in handles {
        if let Err(err) = handle.await.unwrap() {
            panic!("sale failed under concurrency: {err}");
        }
    }

    assert_eq!(count(&shop.db, "sales").await, 40);
    for product_id in products {
        assert_eq!(shop.stock(product_id).await, 95);
        assert!(shop.db.inventory().audit(product_id).await.unwrap().consistent);
    }
}

#[tokio::test]
async fn cancel_restores_stock_and_credit() {
    let shop = Shop::open().await;
    let product_id = shop.product("Llanta Maxxis Ardent", 98_000, 5).await;
    let customer = shop
        .db
        .customers()
        .create(&NewCustomer {
            name: "Club Ciclista Morelia".to_string(),
            rfc: None,
            credit_limit_cents: 1_000_000,
            contact: NewContact::default(),
        })
        .await
        .unwrap();

    let mut request = shop.request(vec![item(product_id, 2, 98_000, 0.0)]);
    request.sale_type_id = SaleType::Credit.id();
    request.customer_id = Some(customer.id);
    let outcome = shop
        .db
        .sales()
        .process_sale(&request, SaleTerms::default())
        .await
        .unwrap();
    assert_eq!(shop.stock(product_id).await, 3);

    let cancelled = shop.db.sales().cancel(outcome.receipt.sale_id).await.unwrap();
    assert_eq!(cancelled.folio, outcome.receipt.folio);
    assert_eq!(cancelled.restocked[0].current_stock, 5);
    assert_eq!(shop.stock(product_id).await, 5);

    let credit = shop.db.customers().credit(customer.id).await.unwrap();
    assert_eq!(credit.balance_cents, 0);

    let detail = shop.db.sales().get(outcome.receipt.sale_id).await.unwrap();
    assert_eq!(detail.sale.status, GeneralStatus::Cancelled);
    assert!(detail.sale.cancelled_at.is_some());
    assert!(shop.db.inventory().audit(product_id).await.unwrap().consistent);

    let again = shop.db.sales().cancel(outcome.receipt.sale_id).await.unwrap_err();
    assert!(matches!(again, DbError::Domain(CoreError::InvalidSaleStatus { .. })));
}

#[tokio::test]
async fn reports_count_only_active_sales() {
    let shop = Shop::open().await;
    let chain = shop.product("Cadena KMC X11", 10_000, 10).await;
    let tube = shop.product("Cámara 29x2.10", 5_000, 10).await;
    let sales = shop.db.sales();

    sales
        .process_sale(&shop.request(vec![item(chain, 3, 10_000, 0.0)]), SaleTerms::default())
        .await
        .unwrap();
    sales
        .process_sale(&shop.request(vec![item(tube, 1, 5_000, 0.0)]), SaleTerms::default())
        .await
        .unwrap();
    let cancelled = sales
        .process_sale(&shop.request(vec![item(tube, 5, 5_000, 0.0)]), SaleTerms::default())
        .await
        .unwrap();
    sales.cancel(cancelled.receipt.sale_id).await.unwrap();

    let range = DateRange::last_days(Utc::now().date_naive(), 30);
    let reports = shop.db.reports();

    let period = reports.period(&range).await.unwrap();
    assert_eq!(period.sale_count, 2);
    assert_eq!(period.revenue_cents, 34_800 + 5_800);
    assert_eq!(period.cash_count, 2);
    assert_eq!(period.credit_count, 0);

    let top = reports.top_products(&range, 10).await.unwrap();
    assert_eq!(top[0].product_id, chain);
    assert_eq!(top[0].units_sold, 3);
    assert_eq!(top[1].units_sold, 1);

    let by_employee = reports.by_employee(&range).await.unwrap();
    assert_eq!(by_employee[0].sale_count, 2);

    let by_method = reports.by_payment_method(&range).await.unwrap();
    assert_eq!(by_method[0].payment_method_name, "Efectivo");

    let stats = reports.inventory_stats().await.unwrap();
    assert_eq!(stats.active_products, 2);
    assert_eq!(stats.inventory_value_cents, 7 * 10_000 + 9 * 5_000);

    assert_eq!(sales.list(None).await.unwrap().len(), 3);
    assert_eq!(sales.list(Some(&range)).await.unwrap().len(), 3);
    assert_eq!(sales.by_employee(shop.employee_id, None).await.unwrap().len(), 3);
}
