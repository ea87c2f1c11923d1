//! Process-wide compilation cache: source text → parsed AST.
//!
//! Reads are lock-free (sharded map); eviction runs under a single mutex
//! so at most one caller pays the cleanup cost. Two concurrent misses on
//! the same key may both parse; the later insert wins and the loser's work
//! is discarded.

use dashmap::DashMap;
use formulet_parse::AstNode;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const DEFAULT_MAX_CACHE_SIZE: usize = 1_000;

pub struct CompileCache {
    entries: DashMap<String, Arc<AstNode>>,
    /// Insertion order, for FIFO eviction.
    order: Mutex<VecDeque<String>>,
    max_size: AtomicUsize,
}

impl Default for CompileCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHE_SIZE)
    }
}

impl CompileCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            max_size: AtomicUsize::new(max_size.max(1)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<AstNode>> {
        self.entries.get(key).map(|v| Arc::clone(v.value()))
    }

    pub fn insert(&self, key: String, ast: Arc<AstNode>) {
        let fresh = self.entries.insert(key.clone(), ast).is_none();
        if !fresh {
            return;
        }
        let mut order = self.order.lock().expect("cache order mutex");
        order.push_back(key);
        let max = self.max_size.load(Ordering::Relaxed);
        if self.entries.len() > max {
            // Coarse eviction: drop ~20% of capacity in one pass.
            let evict = (max / 5).max(1);
            tracing::debug!(evict, max, "compile cache over capacity, evicting oldest entries");
            for _ in 0..evict {
                match order.pop_front() {
                    Some(k) => {
                        self.entries.remove(&k);
                    }
                    None => break,
                }
            }
        }
    }

    pub fn clear(&self) {
        let mut order = self.order.lock().expect("cache order mutex");
        self.entries.clear();
        order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size.load(Ordering::Relaxed)
    }

    pub fn set_max_size(&self, max_size: usize) {
        self.max_size.store(max_size.max(1), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulet_common::Value;

    fn ast(n: f64) -> Arc<AstNode> {
        Arc::new(AstNode::Literal(Value::Number(n)))
    }

    #[test]
    fn get_after_insert() {
        let cache = CompileCache::new(10);
        cache.insert("1+1".into(), ast(2.0));
        assert!(cache.get("1+1").is_some());
        assert!(cache.get("2+2").is_none());
    }

    #[test]
    fn reinserting_the_same_key_does_not_grow() {
        let cache = CompileCache::new(10);
        cache.insert("k".into(), ast(1.0));
        cache.insert("k".into(), ast(2.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn fifo_eviction_drops_about_a_fifth() {
        let cache = CompileCache::new(10);
        for i in 0..11 {
            cache.insert(format!("expr{i}"), ast(i as f64));
        }
        // 11 entries exceeded the bound of 10: two (10/5) oldest evicted.
        assert_eq!(cache.len(), 9);
        assert!(cache.get("expr0").is_none());
        assert!(cache.get("expr1").is_none());
        assert!(cache.get("expr10").is_some());
    }

    #[test]
    fn clear_empties() {
        let cache = CompileCache::new(10);
        cache.insert("a".into(), ast(1.0));
        cache.clear();
        assert!(cache.is_empty());
    }
}
