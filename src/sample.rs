//! Demo tables for trying dashboards against a fresh database.
//!
//! Each dataset recreates its table contents on every run, so running the
//! same dataset twice leaves the same row counts behind.

use crate::db::DatabaseClient;
use crate::error::Result;
use tracing::{debug, info};

/// A demo table (or all of them) that can be written into the open database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDataset {
    Users,
    Products,
    Orders,
    All,
}

const USERS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        name TEXT,
        email TEXT,
        age INTEGER,
        city TEXT,
        created_at TEXT
    )",
    "DELETE FROM users",
    "WITH RECURSIVE seq(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM seq WHERE i < 100)
     INSERT INTO users (id, name, email, age, city, created_at)
     SELECT
         i,
         'User ' || i,
         'user' || i || '@example.com',
         20 + (i % 50),
         CASE i % 5
             WHEN 0 THEN 'Tokyo'
             WHEN 1 THEN 'Osaka'
             WHEN 2 THEN 'Nagoya'
             WHEN 3 THEN 'Fukuoka'
             ELSE 'Sapporo'
         END,
         datetime('now', '-' || (i * 24) || ' hours')
     FROM seq",
];

// `abs(random()) % 1000000 / 1000000.0` is a uniform value in [0, 1).
const PRODUCTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY,
        name TEXT,
        category TEXT,
        price REAL,
        stock INTEGER,
        rating REAL
    )",
    "DELETE FROM products",
    "WITH RECURSIVE seq(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM seq WHERE i < 50)
     INSERT INTO products (id, name, category, price, stock, rating)
     SELECT
         i,
         'Product ' || i,
         CASE i % 5
             WHEN 0 THEN 'Electronics'
             WHEN 1 THEN 'Clothing'
             WHEN 2 THEN 'Food'
             WHEN 3 THEN 'Books'
             ELSE 'Home'
         END,
         round(10 + (abs(random()) % 1000000) / 1000000.0 * 990, 2),
         abs(random()) % 1000,
         round(1 + (abs(random()) % 1000000) / 1000000.0 * 4, 1)
     FROM seq",
];

const ORDERS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY,
        user_id INTEGER,
        product_id INTEGER,
        quantity INTEGER,
        total_price REAL,
        status TEXT,
        order_date TEXT
    )",
    "DELETE FROM orders",
    "WITH RECURSIVE seq(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM seq WHERE i < 500)
     INSERT INTO orders (id, user_id, product_id, quantity, total_price, status, order_date)
     SELECT
         i,
         1 + (i % 100),
         1 + (i % 50),
         1 + (i % 10),
         round(100 + (abs(random()) % 1000000) / 1000000.0 * 900, 2),
         CASE i % 4
             WHEN 0 THEN 'pending'
             WHEN 1 THEN 'processing'
             WHEN 2 THEN 'shipped'
             ELSE 'delivered'
         END,
         date('now', '-' || (i % 365) || ' days')
     FROM seq",
];

impl SampleDataset {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "users" => Some(Self::Users),
            "products" => Some(Self::Products),
            "orders" => Some(Self::Orders),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Tables this dataset writes, in creation order.
    pub fn tables(self) -> &'static [&'static str] {
        match self {
            Self::Users => &["users"],
            Self::Products => &["products"],
            Self::Orders => &["orders"],
            Self::All => &["users", "products", "orders"],
        }
    }

    fn statements(self) -> Vec<&'static str> {
        match self {
            Self::Users => USERS.to_vec(),
            Self::Products => PRODUCTS.to_vec(),
            Self::Orders => ORDERS.to_vec(),
            Self::All => [USERS, PRODUCTS, ORDERS].concat(),
        }
    }
}

/// Writes the dataset's tables, one statement at a time.
///
/// Stops at the first failing statement; tables written before it stay.
pub async fn create_sample_data(db: &dyn DatabaseClient, dataset: SampleDataset) -> Result<()> {
    for sql in dataset.statements() {
        debug!("Sample data: {}", sql.lines().next().unwrap_or(sql));
        db.execute_query(sql).await?;
    }
    info!("Created sample data: {}", dataset.tables().join(", "));
    Ok(())
}
