//! Thread-shared, lazily-populated cache of contig sequences pulled from an
//! indexed FASTA reference.

use std::collections::HashMap;
use std::io::{Read as IoRead, Seek};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use bio::io::fasta;

use crate::errors::Error;

#[derive(Debug)]
pub struct Fasta {
    pub name: String,
    pub seq: Vec<u8>,
}

/// Keyed by contig name; each bucket normally holds exactly one entry, but is
/// a `Vec` rather than a bare value so a fetch race (two workers missing the
/// cache for the same contig at once) converges on a set of equivalent
/// entries rather than a panic.
#[derive(Default)]
pub struct RefCache {
    inner: Mutex<HashMap<String, Vec<Arc<Fasta>>>>,
}

impl RefCache {
    pub fn new() -> Self {
        RefCache { inner: Mutex::new(HashMap::new()) }
    }

    /// Returns the cached sequence for `name`, fetching and inserting it via
    /// `reader` if this is the first request for that contig. Holds the
    /// cache lock for the duration of a cold fetch, same as the hot path, so
    /// callers only ever see one in-flight fetch per cache instance.
    pub fn fetch<R: IoRead + Seek>(&self, name: &str, reader: &mut fasta::IndexedReader<R>) -> Result<Arc<Fasta>> {
        let mut cache = self.inner.lock().unwrap();
        if let Some(bucket) = cache.get(name) {
            if let Some(fasta) = bucket.first() {
                return Ok(Arc::clone(fasta));
            }
        }

        reader
            .fetch_all(name)
            .map_err(|_| Error::ContigNotPresent { name: name.to_owned() })?;
        let mut seq = Vec::new();
        reader
            .read(&mut seq)
            .with_context(|| format!("failed to read contig {} from reference", name))?;
        seq.make_ascii_uppercase();

        let fasta = Arc::new(Fasta { name: name.to_owned(), seq });
        cache.entry(name.to_owned()).or_insert_with(Vec::new).push(Arc::clone(&fasta));
        Ok(fasta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cache_has_no_bucket() {
        let cache = RefCache::new();
        assert!(cache.inner.lock().unwrap().is_empty());
    }
}
