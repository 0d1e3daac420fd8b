use crate::animation::AnimatorDescription;
use crate::error::Result;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::trace;

/// Parsed animators kept between loads.
pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    reference: String,
    // Motion paths are sampled per pixel size, so it is part of the key.
    pixel_size_bits: u32,
}

/// Least-recently-used cache of parsed animator descriptions.
#[derive(Debug)]
pub struct DescriptionCache {
    entries: HashMap<CacheKey, Arc<AnimatorDescription>>,
    lru: VecDeque<CacheKey>,
    capacity: usize,
}

impl Default for DescriptionCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl DescriptionCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, reference: &str, pixel_size: f32) -> bool {
        self.entries.contains_key(&Self::key(reference, pixel_size))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    /// Returns the cached description, or runs `parse` and caches its
    /// result. Failed parses are not cached.
    pub fn get_or_parse(
        &mut self,
        reference: &str,
        pixel_size: f32,
        parse: impl FnOnce() -> Result<AnimatorDescription>,
    ) -> Result<Arc<AnimatorDescription>> {
        let key = Self::key(reference, pixel_size);
        if let Some(found) = self.entries.get(&key).cloned() {
            trace!(reference, "Animator cache hit");
            self.touch(&key);
            return Ok(found);
        }
        let parsed = Arc::new(parse()?);
        self.insert(key, parsed.clone());
        Ok(parsed)
    }

    fn key(reference: &str, pixel_size: f32) -> CacheKey {
        CacheKey {
            reference: reference.to_string(),
            pixel_size_bits: pixel_size.to_bits(),
        }
    }

    fn insert(&mut self, key: CacheKey, description: Arc<AnimatorDescription>) {
        self.entries.insert(key.clone(), description);
        self.touch(&key);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                self.entries.remove(&old);
            }
        }
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.lru.iter().position(|k| k == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key.clone());
    }
}
