use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewProduct, Product};

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Missing rows are `Ok(None)`, not an error.
    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Product>>;
    async fn get_all(&self) -> anyhow::Result<Vec<Product>>;
    async fn add(&self, product: NewProduct) -> anyhow::Result<Product>;
    /// Fails when the row is gone; callers check existence first.
    async fn update(&self, product: &Product) -> anyhow::Result<Product>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgProductRepository {
    db: PgPool,
}

impl PgProductRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, stock, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("select product by id")?;
        Ok(product)
    }

    async fn get_all(&self) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, stock, created_at, updated_at
            FROM products
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("select products")?;
        Ok(rows)
    }

    async fn add(&self, product: NewProduct) -> anyhow::Result<Product> {
        // now() is fixed per statement, so both timestamps start out equal
        let created = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price, stock, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            RETURNING id, name, description, price, stock, created_at, updated_at
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .fetch_one(&self.db)
        .await
        .context("insert product")?;
        Ok(created)
    }

    async fn update(&self, product: &Product) -> anyhow::Result<Product> {
        // updated_at must move forward even if two updates share a transaction timestamp
        let updated = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
               SET name = $2,
                   description = $3,
                   price = $4,
                   stock = $5,
                   updated_at = GREATEST(now(), updated_at + INTERVAL '1 microsecond')
             WHERE id = $1
            RETURNING id, name, description, price, stock, created_at, updated_at
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .fetch_optional(&self.db)
        .await
        .context("update product")?;

        updated.with_context(|| format!("product {} no longer exists", product.id))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete product")?;
        Ok(res.rows_affected() > 0)
    }
}
