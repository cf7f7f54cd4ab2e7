//! # Seed Data Generator
//!
//! Populates the database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Default database path (./kasa_dev.json)
//! cargo run -p kasa-store --bin seed
//!
//! # Custom path and product count
//! cargo run -p kasa-store --bin seed -- --db ./data/kasa.json --count 200
//! ```
//!
//! Generates Turkish corner-shop inventory (prices in kuruş), a handful of
//! customers with birthdays and purchase-worthy profiles, the four stock
//! message templates, and one automation rule per trigger.

use std::env;

use chrono::NaiveDate;
use kasa_core::{TemplateChannel, Trigger, TriggerSettings};
use kasa_store::{
    CrmRepository, CustomerInput, CustomerRepository, ProductInput, ProductRepository, Store,
    TemplateInput,
};

/// (barcode suffix, name, gross price in kuruş, stock, category, VAT %)
const PRODUCTS: &[(&str, &str, i64, i64, &str, u8)] = &[
    ("001", "Çay 500g", 4500, 24, "İçecek", 1),
    ("002", "Süt 1L", 3000, 36, "Süt Ürünleri", 1),
    ("003", "Yoğurt 1kg", 5500, 18, "Süt Ürünleri", 1),
    ("004", "Beyaz Peynir 500g", 12000, 12, "Süt Ürünleri", 1),
    ("005", "Ekmek", 1000, 50, "Fırın", 1),
    ("006", "Makarna 500g", 1800, 40, "Bakliyat", 1),
    ("007", "Pirinç 1kg", 6500, 30, "Bakliyat", 1),
    ("008", "Ayçiçek Yağı 1L", 8500, 20, "Temel Gıda", 1),
    ("009", "Kola 1L", 3500, 48, "İçecek", 20),
    ("010", "Gazoz 250ml", 1500, 60, "İçecek", 20),
    ("011", "Çikolata 80g", 2500, 45, "Atıştırmalık", 20),
    ("012", "Cips 150g", 3000, 35, "Atıştırmalık", 20),
    ("013", "Deterjan 4kg", 18000, 15, "Temizlik", 20),
    ("014", "Bulaşık Süngeri 3lü", 1200, 25, "Temizlik", 20),
    ("015", "Şampuan 400ml", 9500, 14, "Kişisel Bakım", 20),
    ("016", "Diş Macunu", 4200, 22, "Kişisel Bakım", 10),
    ("017", "Kolonya 200ml", 5000, 16, "Kişisel Bakım", 20),
    ("018", "Kitap - Roman", 15000, 8, "Kırtasiye", 0),
    ("019", "Defter A4", 2800, 30, "Kırtasiye", 10),
    ("020", "Su 5L", 2200, 40, "İçecek", 1),
];

/// (name, phone, email, birth year, month, day)
const CUSTOMERS: &[(&str, &str, &str, i32, u32, u32)] = &[
    ("Ayşe Yılmaz", "+905551112233", "ayse@example.com", 1990, 6, 15),
    ("Mehmet Demir", "+905554445566", "mehmet@example.com", 1985, 1, 3),
    ("Fatma Kaya", "+905557778899", "fatma@example.com", 1978, 11, 22),
    ("Ali Çelik", "+905550001122", "ali@example.com", 1995, 3, 8),
    ("Zeynep Arslan", "+905553334455", "zeynep@example.com", 2000, 9, 30),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kasa_dev.json");
    let mut count = PRODUCTS.len();

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
                    count = args[i + 1].parse().unwrap_or(PRODUCTS.len());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kasa POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kasa_dev.json)");
                println!("  -c, --count <N>    Max products to generate (default: all)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Kasa POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let store = Store::open(&db_path).await?;
    let products = ProductRepository::new(store.clone());
    let customers = CustomerRepository::new(store.clone());
    let crm = CrmRepository::new(store);

    if !products.list().await.is_empty() {
        println!("⚠ Database already has products");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut generated = 0;
    for (suffix, name, price, stock, category, vat) in PRODUCTS.iter().take(count) {
        let input = ProductInput {
            barcode: format!("8690000000{suffix}"),
            name: name.to_string(),
            price_minor: *price,
            stock: *stock,
            category: Some(category.to_string()),
            vat_rate_percent: Some(*vat),
        };
        if let Err(e) = products.insert(input).await {
            eprintln!("Failed to insert {name}: {e}");
            continue;
        }
        generated += 1;
    }
    println!("✓ {generated} products");

    for (name, phone, email, year, month, day) in CUSTOMERS {
        let input = CustomerInput {
            name: name.to_string(),
            phone: Some(phone.to_string()),
            email: Some(email.to_string()),
            address: None,
            birth_date: NaiveDate::from_ymd_opt(*year, *month, *day),
        };
        if let Err(e) = customers.insert(input).await {
            eprintln!("Failed to insert {name}: {e}");
        }
    }
    println!("✓ {} customers", CUSTOMERS.len());

    let templates = [
        (
            Trigger::Birthday,
            "Doğum Günü Kutlaması",
            "Kutlama",
            "İyi ki doğdun {customer_name}! 🎂 Sana özel indirim kodun: {discount_code}",
        ),
        (
            Trigger::Inactive,
            "Sizi Özledik",
            "Geri Kazanım",
            "Merhaba {customer_name}, sizi özledik! {discount_code} koduyla %15 indirim sizi bekliyor.",
        ),
        (
            Trigger::Welcome,
            "Hoş Geldiniz",
            "Karşılama",
            "Merhaba {customer_name}, {store_name} ailesine hoş geldiniz!",
        ),
        (
            Trigger::Thankyou,
            "Teşekkürler",
            "Satış Sonrası",
            "Alışverişiniz için teşekkürler {customer_name}! Tekrar bekleriz.",
        ),
    ];

    for (trigger, name, category, content) in templates {
        let template = crm
            .add_template(TemplateInput {
                name: name.to_string(),
                category: category.to_string(),
                channel: TemplateChannel::Whatsapp,
                content: content.to_string(),
                active: true,
            })
            .await?;
        crm.upsert_rule(trigger, Some(template.id), true, TriggerSettings::default())
            .await?;
    }
    println!("✓ 4 templates + automation rules");

    println!();
    println!("Done. Database written to {}", db_path);
    Ok(())
}
