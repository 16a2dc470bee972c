//! # Seed Data Generator
//!
//! Populates a development database with one company, its staff, a few
//! suppliers and a product catalog, plus a purchase, some sales and a
//! closed register shift so every endpoint has something to return.
//!
//! ## Usage
//! ```bash
//! # Default database ./bodega.db
//! cargo run -p bodega-db --bin seed
//!
//! # Specify database path and products per category
//! cargo run -p bodega-db --bin seed -- --db ./data/bodega.db --count 20
//! ```
//!
//! Staff log in with password `bodega` (argon2id hashed).

use anyhow::{bail, Context};
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use bodega_core::{
    InflowLine, Money, NewCashReconciliation, NewCompany, NewProduct, NewPurchaseInvoice,
    NewSalesDocument, NewSupplier, NewUser, OutflowLine, PaymentMethod, TaxRate,
    DEFAULT_VAT_RATE_BPS,
};
use bodega_db::{Database, DbConfig};
use chrono::{Duration, NaiveDate, Utc};
use std::env;
use tracing::info;

const DEMO_PASSWORD: &str = "bodega";

/// Catalog: category name, SKU prefix and (description, unit, price) rows.
const CATALOG: &[(&str, &str, &[(&str, &str, i64)])] = &[
    (
        "Beverages",
        "BEV",
        &[
            ("Sparkling water 500ml", "unit", 890),
            ("Cola 1.5L", "unit", 1790),
            ("Orange juice 1L", "unit", 1490),
            ("Iced tea 500ml", "unit", 990),
            ("Ground coffee 250g", "bag", 4290),
        ],
    ),
    (
        "Snacks",
        "SNK",
        &[
            ("Potato chips 150g", "bag", 1590),
            ("Salted peanuts 200g", "bag", 1290),
            ("Chocolate bar 90g", "unit", 1090),
            ("Oat cookies 300g", "box", 1390),
        ],
    ),
    (
        "Dairy",
        "DAI",
        &[
            ("Whole milk 1L", "unit", 1050),
            ("Natural yogurt 1kg", "unit", 2190),
            ("Gouda cheese 250g", "pack", 3490),
        ],
    ),
    (
        "Grocery",
        "GRO",
        &[
            ("Long grain rice 1kg", "bag", 1690),
            ("Spaghetti 400g", "pack", 890),
            ("Sunflower oil 1L", "bottle", 2590),
            ("Canned tomatoes 400g", "can", 790),
            ("Sugar 1kg", "bag", 1190),
        ],
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bodega.db");
    let mut per_category: usize = usize::MAX;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    per_category = args[i + 1]
                        .parse()
                        .with_context(|| format!("invalid --count value: {}", args[i + 1]))?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bodega Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bodega.db)");
                println!("  -c, --count <N>    Products per category (default: all)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    info!(path = %db_path, "Connected, migrations applied");

    if !db.companies().list().await?.is_empty() {
        info!("Database already has data, skipping seed. Delete the file to regenerate.");
        return Ok(());
    }

    let vat = TaxRate::from_bps(DEFAULT_VAT_RATE_BPS);

    // Company and staff
    let company = db
        .companies()
        .insert(&NewCompany {
            name: "Bodega Central".to_string(),
            tax_id: "76123456-7".to_string(),
            legal_name: "Comercial Bodega Central SpA".to_string(),
            industry: "Retail".to_string(),
        })
        .await?;

    let password_hash = hash(DEMO_PASSWORD)?;
    let admin = db
        .users()
        .insert(&NewUser {
            name: "Ana".to_string(),
            surname: "Rojas".to_string(),
            tax_id: "11111111-1".to_string(),
            role: "Admin".to_string(),
            email: "ana@bodega.test".to_string(),
            password_hash: password_hash.clone(),
            active: true,
            photo: None,
            company_id: company.id,
        })
        .await?;
    let cashier = db
        .users()
        .insert(&NewUser {
            name: "Luis".to_string(),
            surname: "Soto".to_string(),
            tax_id: "12345678-5".to_string(),
            role: "Cashier".to_string(),
            email: "luis@bodega.test".to_string(),
            password_hash,
            active: true,
            photo: None,
            company_id: company.id,
        })
        .await?;
    info!(admin = admin.id, cashier = cashier.id, "Staff created");

    // Suppliers
    let supplier = db
        .suppliers()
        .insert(&NewSupplier {
            name: "Distribuidora Sur".to_string(),
            tax_id: "77654321-0".to_string(),
            legal_name: "Distribuidora Sur Ltda".to_string(),
            industry: "Wholesale".to_string(),
            address: "Av. Matta 1200, Santiago".to_string(),
            bank_account: Some("000123456789".to_string()),
            bank_name: Some("Banco Estado".to_string()),
        })
        .await?;
    db.suppliers()
        .insert(&NewSupplier {
            name: "Lácteos del Valle".to_string(),
            tax_id: "78111222-3".to_string(),
            legal_name: "Lácteos del Valle SpA".to_string(),
            industry: "Dairy".to_string(),
            address: "Camino Lo Boza 45, Pudahuel".to_string(),
            bank_account: None,
            bank_name: None,
        })
        .await?;

    // Catalog
    let mut products = Vec::new();
    for (category_idx, (category_name, prefix, items)) in CATALOG.iter().enumerate() {
        let category = db.categories().insert(category_name).await?;
        for (item_idx, (description, unit, price)) in items.iter().take(per_category).enumerate() {
            let product = db
                .products()
                .insert(&NewProduct {
                    sku: format!("{prefix}-{:03}", item_idx + 1),
                    description: description.to_string(),
                    barcode: format!("780{:02}{:08}", category_idx, item_idx + 1),
                    delivery_unit: unit.to_string(),
                    unit_sale_price: Some(Money::from_minor(*price)),
                    contribution_margin: Some(30.0),
                    category_id: category.id,
                })
                .await?;
            products.push(product);
        }
    }
    info!(count = products.len(), "Catalog created");

    // One purchase covering the whole catalog at 70% of shelf price
    let inflow_lines: Vec<InflowLine> = products
        .iter()
        .map(|p| InflowLine {
            user_id: admin.id,
            product_id: p.id,
            quantity: 24.0,
            unit_cost: Money::from_minor(p.unit_sale_price.map_or(100, |m| m.minor()) * 70 / 100),
        })
        .collect();
    let net: Money = inflow_lines.iter().map(InflowLine::total_cost).sum::<Result<Money, _>>()?;
    let issued = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .context("invalid seed date")?;
    let (invoice, inflows) = db
        .purchase_invoices()
        .insert(
            &NewPurchaseInvoice {
                folio: 1001,
                issued_at: issued,
                received_at: issued + Duration::days(1),
                net_amount: net,
                vat_amount: net.calculate_tax(vat),
                other_taxes_amount: Money::zero(),
                supplier_id: supplier.id,
            },
            &inflow_lines,
        )
        .await?;
    info!(invoice = invoice.id, inflows = inflows.len(), total = invoice.total_amount.minor(), "Purchase recorded");

    // A few sales
    let mut cash_sales = Money::zero();
    for (n, method) in [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Cash]
        .into_iter()
        .enumerate()
    {
        let lines: Vec<OutflowLine> = products
            .iter()
            .skip(n)
            .step_by(3)
            .map(|p| OutflowLine {
                user_id: cashier.id,
                product_id: p.id,
                quantity: 2.0,
                unit_cost: Money::from_minor(p.unit_sale_price.map_or(100, |m| m.minor()) * 70 / 100),
                unit_sale_price: p.unit_sale_price,
            })
            .collect();
        let (document, _) = db
            .sales_documents()
            .insert(
                &NewSalesDocument {
                    document_type: "receipt".to_string(),
                    document_number: 5001 + n as i64,
                    issued_at: issued + Duration::days(2),
                    other_taxes_amount: Money::zero(),
                    payment_method: method,
                },
                &lines,
                vat,
            )
            .await?;
        if method == PaymentMethod::Cash {
            cash_sales += document.total_amount;
        }
    }

    // Closed shift with an exact count
    let opened_at = Utc::now() - Duration::hours(8);
    let opening = Money::from_minor(50000);
    db.cash_reconciliations()
        .insert(&NewCashReconciliation {
            operator_id: cashier.id,
            administrator_id: admin.id,
            opened_at,
            closed_at: opened_at + Duration::hours(8),
            opening_amount: opening,
            transfer_amount: Money::zero(),
            cash_amount: cash_sales,
            card_amount: Money::zero(),
            closing_amount: opening + cash_sales,
        })
        .await?;

    info!(products = db.products().count().await?, "Seed complete");
    db.close().await;
    Ok(())
}

fn hash(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}
