//! # Seed Data Generator
//!
//! Populates a database with a demo bicycle-parts catalog.
//!
//! ## Usage
//! ```bash
//! # Default path (./pos_refaccionaria.db)
//! cargo run -p ruedas-db --bin seed
//!
//! # Custom path
//! cargo run -p ruedas-db --bin seed -- ./data/demo.db
//! ```
//!
//! ## Generated Data
//! - Employee "Administrador General" with the `admin` / `admin123` login
//! - A cash customer and a credit customer
//! - One supplier
//! - Bicycle parts, each with an initial inbound movement

use std::env;

use ruedas_core::entities::{NewContact, NewCustomer, NewEmployee, NewProduct, NewSupplier, NewUserAccount};
use ruedas_core::stock::EntryRequest;
use ruedas_db::{Database, DbConfig};

/// (name, barcode, purchase cents, sale cents, min, max, initial stock)
const PARTS: &[(&str, &str, i64, i64, i64, i64, i64)] = &[
    ("Cadena KMC X11", "4715575890011", 30_000, 45_000, 3, 30, 12),
    ("Cámara 26x1.95 válvula Presta", "7501000000011", 4_000, 8_500, 10, 100, 40),
    ("Cámara 29x2.10 válvula Schrader", "7501000000028", 4_500, 9_500, 10, 100, 35),
    ("Llanta Maxxis Ardent 29x2.25", "4717784027312", 65_000, 98_000, 2, 20, 6),
    ("Balatas Shimano B01S", "4524667363418", 12_000, 19_500, 5, 40, 18),
    ("Desviador trasero Shimano Deore", "4550170442915", 95_000, 145_000, 1, 10, 3),
    ("Pedales de plataforma aluminio", "7501000000035", 18_000, 32_000, 2, 20, 8),
    ("Manubrio MTB 760mm", "7501000000042", 22_000, 39_000, 1, 10, 4),
    ("Puños de silicón", "7501000000059", 5_000, 11_000, 5, 50, 20),
    ("Casco urbano talla M", "7501000000066", 35_000, 59_000, 2, 15, 5),
    ("Luz trasera LED USB", "7501000000073", 8_000, 15_500, 5, 40, 2),
    ("Bomba de piso con manómetro", "7501000000080", 28_000, 45_000, 1, 10, 3),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Ruedas POS Seed Data Generator");
        println!();
        println!("Usage: seed [DATABASE_PATH]");
        println!();
        println!("  DATABASE_PATH    SQLite file to create (default: ./pos_refaccionaria.db)");
        return Ok(());
    }

    let db_path = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| String::from("./pos_refaccionaria.db"));

    println!("🌱 Ruedas POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().list().await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let admin = db
        .employees()
        .create(&NewEmployee {
            first_name: "Administrador".to_string(),
            last_name_1: "General".to_string(),
            last_name_2: None,
            rfc: "XAXX010101000".to_string(),
            curp: None,
            nss: None,
            contact: NewContact {
                phone: Some("4430000000".to_string()),
                email: Some("admin@ruedas.mx".to_string()),
                ..Default::default()
            },
            account: Some(NewUserAccount {
                username: "admin".to_string(),
                password: "admin123".to_string(),
                user_type: 1,
            }),
        })
        .await?;
    println!("✓ Employee {} (login: admin / admin123)", admin.full_name);

    db.customers()
        .create(&NewCustomer {
            name: "Público en General".to_string(),
            rfc: Some("XAXX010101000".to_string()),
            credit_limit_cents: 0,
            contact: NewContact::default(),
        })
        .await?;
    db.customers()
        .create(&NewCustomer {
            name: "Taller El Pedal".to_string(),
            rfc: Some("TEP990101AB1".to_string()),
            credit_limit_cents: 500_000,
            contact: NewContact {
                phone: Some("4431112233".to_string()),
                street: Some("Av. Madero 120".to_string()),
                city: Some("Morelia".to_string()),
                state: Some("Michoacán".to_string()),
                postal_code: Some("58000".to_string()),
                ..Default::default()
            },
        })
        .await?;
    println!("✓ 2 customers");

    db.suppliers()
        .create(&NewSupplier {
            name: "Distribuidora Ciclista del Bajío".to_string(),
            rfc: Some("DCB050505XY1".to_string()),
            category_id: None,
            contact: NewContact {
                email: Some("ventas@dcb.mx".to_string()),
                ..Default::default()
            },
        })
        .await?;
    println!("✓ 1 supplier");

    println!();
    println!("Generating parts...");

    let mut generated = 0;
    for (name, barcode, purchase, sale, min, max, stock) in PARTS {
        let product = NewProduct {
            name: name.to_string(),
            barcode: Some(barcode.to_string()),
            description: None,
            purchase_price_cents: *purchase,
            sale_price_cents: *sale,
            stock_min: *min,
            stock_max: *max,
            brand_id: None,
            category_id: None,
            unit_id: None,
        };

        let created = match db.products().create(&product).await {
            Ok(created) => created,
            Err(e) => {
                eprintln!("Failed to insert {}: {}", name, e);
                continue;
            }
        };

        db.inventory()
            .entry(&EntryRequest {
                product_id: created.id,
                employee_id: admin.id,
                quantity: *stock,
                concept: Some("Inventario inicial".to_string()),
            })
            .await?;

        generated += 1;
    }

    println!("✓ Generated {} parts", generated);

    let low = db.inventory().low_stock().await?;
    println!("  Low stock: {} products", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
