//! Per-request batch loading for nested fields
//!
//! `Student.courses` and `Course.students` first collect ids from the
//! enrollment collection, then resolve them through a [`DataLoader`] so a
//! record fetched for one parent is reused for every other parent in the
//! same request.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::enrollment::Enrollments;
use crate::error::Result;
use crate::model::{Course, Student};

/// Batch loader trait for loading multiple items at once
#[async_trait]
pub trait BatchLoader<K, V>: Send + Sync
where
    K: Send + Sync + Clone + Eq + Hash,
    V: Send + Sync + Clone,
{
    /// Fetch every key in one store call. Keys with no record are absent
    /// from the map.
    async fn load_batch(&self, keys: &[K]) -> Result<HashMap<K, V>>;
}

/// Caching batch loader, one per request.
pub struct DataLoader<K, V, L>
where
    K: Send + Sync + Clone + Eq + Hash + 'static,
    V: Send + Sync + Clone + 'static,
    L: BatchLoader<K, V> + 'static,
{
    loader: Arc<L>,
    cache: Arc<Mutex<HashMap<K, V>>>,
}

impl<K, V, L> DataLoader<K, V, L>
where
    K: Send + Sync + Clone + Eq + Hash + 'static,
    V: Send + Sync + Clone + 'static,
    L: BatchLoader<K, V> + 'static,
{
    pub fn new(loader: L) -> Self {
        Self {
            loader: Arc::new(loader),
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Load several keys, returning found values in key order.
    ///
    /// Only keys missing from the cache reach the batch loader.
    pub async fn load_many(&self, keys: Vec<K>) -> Result<Vec<V>> {
        let uncached: Vec<K> = {
            let cache = self.cache.lock().await;
            keys.iter()
                .filter(|k| !cache.contains_key(k))
                .cloned()
                .collect()
        };

        if !uncached.is_empty() {
            let batch = self.loader.load_batch(&uncached).await?;
            let mut cache = self.cache.lock().await;
            cache.extend(batch);
        }

        let cache = self.cache.lock().await;
        Ok(keys.iter().filter_map(|k| cache.get(k).cloned()).collect())
    }

    /// Prime the cache with a value
    ///
    /// Replaces whatever was cached for `key`.
    pub async fn prime(&self, key: K, value: V) {
        let mut cache = self.cache.lock().await;
        cache.insert(key, value);
    }

    /// Drop one key so the next load goes back to the store.
    pub async fn evict(&self, key: &K) {
        let mut cache = self.cache.lock().await;
        cache.remove(key);
    }
}

impl<K, V, L> Clone for DataLoader<K, V, L>
where
    K: Send + Sync + Clone + Eq + Hash + 'static,
    V: Send + Sync + Clone + 'static,
    L: BatchLoader<K, V> + 'static,
{
    fn clone(&self) -> Self {
        Self {
            loader: self.loader.clone(),
            cache: self.cache.clone(),
        }
    }
}

pub struct CourseBatch(Catalog);

#[async_trait]
impl BatchLoader<Uuid, Course> for CourseBatch {
    async fn load_batch(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Course>> {
        let rows = self.0.find_courses_by_ids(keys).await?;
        Ok(rows.into_iter().map(|c| (c.id, c)).collect())
    }
}

pub struct StudentBatch(Catalog);

#[async_trait]
impl BatchLoader<Uuid, Student> for StudentBatch {
    async fn load_batch(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Student>> {
        let rows = self.0.find_students_by_ids(keys).await?;
        Ok(rows.into_iter().map(|s| (s.id, s)).collect())
    }
}

/// Loaders attached to a single GraphQL request.
#[derive(Clone)]
pub struct Loaders {
    enrollments: Enrollments,
    courses: DataLoader<Uuid, Course, CourseBatch>,
    students: DataLoader<Uuid, Student, StudentBatch>,
}

impl Loaders {
    pub fn new(catalog: Catalog, enrollments: Enrollments) -> Self {
        Self {
            enrollments,
            courses: DataLoader::new(CourseBatch(catalog.clone())),
            students: DataLoader::new(StudentBatch(catalog)),
        }
    }

    pub async fn courses_of(&self, student_id: Uuid) -> Result<Vec<Course>> {
        let ids = self.enrollments.course_ids_of(student_id).await?;
        self.courses.load_many(ids).await
    }

    pub async fn students_of(&self, course_id: Uuid) -> Result<Vec<Student>> {
        let ids = self.enrollments.student_ids_of(course_id).await?;
        self.students.load_many(ids).await
    }

    /// Mutations earlier in a document must be visible to nested fields
    /// resolved later in the same request.
    pub async fn prime_course(&self, course: &Course) {
        self.courses.prime(course.id, course.clone()).await;
    }

    pub async fn prime_student(&self, student: &Student) {
        self.students.prime(student.id, student.clone()).await;
    }

    pub async fn evict_course(&self, id: Uuid) {
        self.courses.evict(&id).await;
    }

    pub async fn evict_student(&self, id: Uuid) {
        self.students.evict(&id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingLoader {
        calls: AtomicUsize,
        keys_seen: AtomicUsize,
    }

    #[async_trait]
    impl BatchLoader<u32, String> for Arc<CountingLoader> {
        async fn load_batch(&self, keys: &[u32]) -> Result<HashMap<u32, String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.keys_seen.fetch_add(keys.len(), Ordering::SeqCst);
            Ok(keys
                .iter()
                .filter(|k| **k != 0)
                .map(|k| (*k, format!("row-{k}")))
                .collect())
        }
    }

    #[tokio::test]
    async fn batches_and_keeps_key_order() {
        let counter = Arc::new(CountingLoader::default());
        let loader = DataLoader::new(counter.clone());

        let rows = loader.load_many(vec![3, 1, 2]).await.unwrap();
        assert_eq!(rows, ["row-3", "row-1", "row-2"]);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cached_keys_are_not_refetched() {
        let counter = Arc::new(CountingLoader::default());
        let loader = DataLoader::new(counter.clone());

        loader.load_many(vec![1, 2]).await.unwrap();
        loader.load_many(vec![2, 3]).await.unwrap();
        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
        assert_eq!(counter.keys_seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn missing_keys_are_skipped() {
        let loader = DataLoader::new(Arc::new(CountingLoader::default()));
        assert!(loader.load_many(vec![0]).await.unwrap().is_empty());
        assert_eq!(loader.load_many(vec![0, 4]).await.unwrap(), ["row-4"]);
    }

    #[tokio::test]
    async fn primed_value_replaces_cached_one() {
        let counter = Arc::new(CountingLoader::default());
        let loader = DataLoader::new(counter.clone());

        loader.load_many(vec![1]).await.unwrap();
        loader.prime(1, "renamed".to_string()).await;
        assert_eq!(loader.load_many(vec![1]).await.unwrap(), ["renamed"]);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn evicted_key_is_refetched() {
        let counter = Arc::new(CountingLoader::default());
        let loader = DataLoader::new(counter.clone());

        loader.prime(7, "stale".to_string()).await;
        loader.evict(&7).await;
        assert_eq!(loader.load_many(vec![7]).await.unwrap(), ["row-7"]);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeated_keys_resolve_once() {
        let counter = Arc::new(CountingLoader::default());
        let loader = DataLoader::new(counter.clone());

        let rows = loader.load_many(vec![5, 5]).await.unwrap();
        assert_eq!(rows, ["row-5", "row-5"]);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }
}
