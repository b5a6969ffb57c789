//! Image cache keyed by protocol image ids
//!
//! Entries are replaced wholesale on redefinition and only leave the cache
//! on an explicit delete. There is no eviction.

use std::collections::HashMap;
use std::sync::Arc;

use super::image::Image;

#[derive(Debug, Clone, Default)]
pub struct GraphicsCache {
    images: HashMap<u32, Arc<Image>>,
}

impl GraphicsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `image` under `id`, returning the entry it replaced
    pub fn put(&mut self, id: u32, image: Arc<Image>) -> Option<Arc<Image>> {
        self.images.insert(id, image)
    }

    pub fn get(&self, id: u32) -> Option<Arc<Image>> {
        self.images.get(&id).cloned()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.images.contains_key(&id)
    }

    /// Drop the entry for `id`; false when there was none
    pub fn remove(&mut self, id: u32) -> bool {
        self.images.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Smallest id not currently in use
    pub fn free_id(&self) -> u32 {
        (0..=u32::MAX)
            .find(|id| !self.images.contains_key(id))
            .unwrap_or(u32::MAX)
    }
}
