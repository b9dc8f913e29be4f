//! Bounded cache for rendered reference pages.
//!
//! Rendering a reference page is the most expensive pure computation in the
//! pipeline, and hosts typically process many scans against the same
//! template. The cache is the only process-wide mutable state; it is
//! mutex-guarded and bounded with least-recently-used eviction.

use image::RgbaImage;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::config::{CharacterSet, TemplateConfig};

const CACHE_CAPACITY: usize = 8;

/// Exact identity of a rendered reference page.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    page_size: crate::config::PageSize,
    cells_per_row: u32,
    rows_per_page: u32,
    dpi: u32,
    /// Guide fractions, bit-exact.
    guides: [u64; 5],
    page_number: usize,
    character_set: CharacterSet,
    font_fingerprint: Option<u64>,
}

impl CacheKey {
    fn new(
        config: &TemplateConfig,
        page_number: usize,
        character_set: CharacterSet,
        font_fingerprint: Option<u64>,
    ) -> Self {
        let g = &config.guides;
        Self {
            page_size: config.page_size,
            cells_per_row: config.cells_per_row,
            rows_per_page: config.rows_per_page,
            dpi: config.dpi,
            guides: [
                g.label_top.to_bits(),
                g.cap_height.to_bits(),
                g.x_height.to_bits(),
                g.baseline.to_bits(),
                g.descender.to_bits(),
            ],
            page_number,
            character_set,
            font_fingerprint,
        }
    }
}

struct CacheState {
    entries: HashMap<CacheKey, RgbaImage>,
    /// Access order, most recent last.
    order: Vec<CacheKey>,
}

pub struct TemplateCache {
    state: Mutex<CacheState>,
}

static GLOBAL: OnceLock<TemplateCache> = OnceLock::new();

impl TemplateCache {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }

    /// The process-wide cache shared by all pipeline invocations.
    pub fn global() -> &'static TemplateCache {
        GLOBAL.get_or_init(TemplateCache::new)
    }

    /// Fetch a rendered page, rendering and inserting on miss.
    pub fn get_or_render(
        &self,
        config: &TemplateConfig,
        page_number: usize,
        character_set: CharacterSet,
        font_fingerprint: Option<u64>,
        render: impl FnOnce() -> RgbaImage,
    ) -> RgbaImage {
        let key = CacheKey::new(config, page_number, character_set, font_fingerprint);

        if let Ok(mut state) = self.state.lock()
            && let Some(image) = state.entries.get(&key).cloned()
        {
            state.order.retain(|k| k != &key);
            state.order.push(key);
            return image;
        }

        let image = render();

        if let Ok(mut state) = self.state.lock() {
            if state.entries.len() >= CACHE_CAPACITY
                && !state.entries.contains_key(&key)
                && !state.order.is_empty()
            {
                let evict = state.order.remove(0);
                state.entries.remove(&evict);
            }
            state.order.retain(|k| k != &key);
            state.order.push(key.clone());
            state.entries.insert(key, image.clone());
        }

        image
    }

    /// Drop all cached pages.
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.entries.clear();
            state.order.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new()
    }
}
