use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

const PROGRESS_EVERY: usize = 32;

/// Turns an asset name into a loaded texture handle.
pub trait TextureLoader {
    type Handle;
    type Error: fmt::Display;

    fn load(&mut self, name: &str) -> Result<Self::Handle, Self::Error>;
}

#[derive(Debug)]
pub enum CacheEntry<H> {
    Loaded(H),
    NotFound,
}

/// Memoizes loads by name for the life of the cache, misses included.
pub struct TextureCache<L: TextureLoader> {
    loader: L,
    entries: HashMap<String, CacheEntry<L::Handle>>,
}

impl<L: TextureLoader> TextureCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            entries: HashMap::new(),
        }
    }

    pub fn get(&mut self, name: &str) -> Option<&L::Handle> {
        if !self.entries.contains_key(name) {
            let entry = match self.loader.load(name) {
                Ok(handle) => {
                    tracing::debug!(texture = %name, "loaded texture");
                    CacheEntry::Loaded(handle)
                }
                Err(err) => {
                    tracing::warn!(texture = %name, error = %err, "texture unavailable");
                    CacheEntry::NotFound
                }
            };
            self.entries.insert(name.to_string(), entry);
        }
        match self.entries.get(name) {
            Some(CacheEntry::Loaded(handle)) => Some(handle),
            _ => None,
        }
    }

    /// Cached lookup only; never touches the loader.
    pub fn peek(&self, name: &str) -> Option<&L::Handle> {
        match self.entries.get(name) {
            Some(CacheEntry::Loaded(handle)) => Some(handle),
            _ => None,
        }
    }

    pub fn preload<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> PreloadStats {
        self.preload_until(names, None)
    }

    /// Preloads until `deadline`. Names left over are recorded as
    /// `NotFound` so later lookups never reach the loader.
    pub fn preload_until<'a>(
        &mut self,
        names: impl IntoIterator<Item = &'a str>,
        deadline: Option<Instant>,
    ) -> PreloadStats {
        let mut stats = PreloadStats::default();
        for name in names {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                if !self.entries.contains_key(name) {
                    self.entries.insert(name.to_string(), CacheEntry::NotFound);
                    stats.skipped += 1;
                }
                continue;
            }
            if self.get(name).is_some() {
                stats.loaded += 1;
            } else {
                stats.missing += 1;
            }
            let done = stats.loaded + stats.missing;
            if done % PROGRESS_EVERY == 0 {
                tracing::info!(
                    done,
                    loaded = stats.loaded,
                    missing = stats.missing,
                    "preloading textures"
                );
            }
        }
        if stats.skipped > 0 {
            tracing::warn!(skipped = stats.skipped, "texture preload ran out of time");
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadStats {
    pub loaded: usize,
    pub missing: usize,
    /// Never attempted because the deadline passed.
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingLoader {
        calls: Vec<String>,
    }

    impl TextureLoader for CountingLoader {
        type Handle = usize;
        type Error = String;

        fn load(&mut self, name: &str) -> Result<usize, String> {
            self.calls.push(name.to_string());
            if name.starts_with("missing") {
                Err(format!("{name} not found"))
            } else {
                Ok(name.len())
            }
        }
    }

    #[test]
    fn hits_and_misses_load_once() {
        let mut cache = TextureCache::new(CountingLoader::default());
        assert_eq!(cache.get("0-0-0_rect.png"), Some(&14));
        assert_eq!(cache.get("0-0-0_rect.png"), Some(&14));
        assert_eq!(cache.get("missing.png"), None);
        assert_eq!(cache.get("missing.png"), None);
        assert_eq!(cache.loader.calls, vec!["0-0-0_rect.png", "missing.png"]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn preload_counts_and_peek_is_read_only() {
        let mut cache = TextureCache::new(CountingLoader::default());
        assert_eq!(cache.peek("a.png"), None);
        let stats = cache.preload(["a.png", "missing-1.png", "b.png"]);
        assert_eq!(
            stats,
            PreloadStats {
                loaded: 2,
                missing: 1,
                skipped: 0
            }
        );
        assert_eq!(cache.peek("a.png"), Some(&5));
        assert_eq!(cache.peek("missing-1.png"), None);
        assert_eq!(cache.loader.calls.len(), 3);
    }

    #[test]
    fn expired_deadline_skips_loads_for_good() {
        let mut cache = TextureCache::new(CountingLoader::default());
        cache.get("a.png");
        let stats = cache.preload_until(["a.png", "b.png", "c.png"], Some(Instant::now()));
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.loaded + stats.missing, 0);
        assert_eq!(cache.get("b.png"), None);
        assert_eq!(cache.peek("a.png"), Some(&5));
        assert_eq!(cache.loader.calls, vec!["a.png"]);
    }
}
