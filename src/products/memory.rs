use std::collections::BTreeMap;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;

use super::repo::ProductRepository;
use super::repo_types::{NewProduct, Product};

/// In-process stand-in for the Postgres repository, used by handler tests.
#[derive(Default)]
pub struct MemoryProductRepository {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, Product>,
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Product>> {
        Ok(self.inner.lock().await.rows.get(&id).cloned())
    }

    async fn get_all(&self) -> anyhow::Result<Vec<Product>> {
        Ok(self.inner.lock().await.rows.values().cloned().collect())
    }

    async fn add(&self, product: NewProduct) -> anyhow::Result<Product> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let stored = Product {
            id: inner.next_id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };
        inner.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, product: &Product) -> anyhow::Result<Product> {
        let mut inner = self.inner.lock().await;
        let Some(row) = inner.rows.get_mut(&product.id) else {
            anyhow::bail!("product {} no longer exists", product.id);
        };
        row.name = product.name.clone();
        row.description = product.description.clone();
        row.price = product.price;
        row.stock = product.stock;
        row.updated_at = OffsetDateTime::now_utc().max(row.updated_at + Duration::microseconds(1));
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.inner.lock().await.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Decimal;

    fn widget(stock: i64) -> NewProduct {
        NewProduct {
            name: "Widget".into(),
            description: "A widget".into(),
            price: Decimal::new(999, 2),
            stock,
        }
    }

    #[tokio::test]
    async fn add_assigns_increasing_ids_and_equal_timestamps() {
        let repo = MemoryProductRepository::default();
        let a = repo.add(widget(1)).await.unwrap();
        let b = repo.add(widget(2)).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.created_at, a.updated_at);
    }

    #[tokio::test]
    async fn update_moves_updated_at_forward_only() {
        let repo = MemoryProductRepository::default();
        let created = repo.add(widget(1)).await.unwrap();
        let mut changed = created.clone();
        changed.stock = 7;
        let updated = repo.update(&changed).await.unwrap();
        assert_eq!(updated.stock, 7);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn update_of_removed_row_fails() {
        let repo = MemoryProductRepository::default();
        let created = repo.add(widget(1)).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        let err = repo.update(&created).await.unwrap_err();
        assert!(err.to_string().contains("no longer exists"));
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let repo = MemoryProductRepository::default();
        let created = repo.add(widget(1)).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
