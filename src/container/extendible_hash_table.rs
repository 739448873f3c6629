use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use parking_lot::Mutex;

/// A bucket holds up to `bucket_size` entries that agree on the low
/// `depth` bits of their hash.
struct Bucket<K, V> {
    depth: usize,
    items: Vec<(K, V)>,
}

impl<K: Eq, V> Bucket<K, V> {
    fn new(depth: usize, capacity: usize) -> Self {
        Self {
            depth,
            items: Vec::with_capacity(capacity),
        }
    }

    fn find(&self, key: &K) -> Option<&V> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn remove(&mut self, key: &K) -> bool {
        match self.items.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }
}

/// Directory state: `2^global_depth` slots, each a refcounted handle to a
/// bucket. Slots whose indices agree on a bucket's low `depth` bits share
/// that bucket.
struct Directory<K, V> {
    global_depth: usize,
    num_buckets: usize,
    slots: Vec<Arc<Mutex<Bucket<K, V>>>>,
}

/// An extendible hash table: a dynamically growing hash index over
/// arbitrary key/value pairs.
///
/// The directory addresses buckets by the low `global_depth` bits of the
/// key's hash. A full bucket splits into two buckets of one greater local
/// depth, doubling the directory only when the splitting bucket's depth
/// already equals the global depth. Lookup, insert, and removal are
/// expected O(1).
///
/// The hasher is pluggable so callers (and tests) can pin hash values; the
/// default is `std`'s `RandomState`.
///
/// A single mutex guards the directory for the whole extent of every public
/// operation.
pub struct ExtendibleHashTable<K, V, S = RandomState> {
    bucket_size: usize,
    hash_builder: S,
    dir: Mutex<Directory<K, V>>,
}

impl<K: Hash + Eq, V: Clone> ExtendibleHashTable<K, V> {
    /// Creates a table with the given bucket capacity and a randomly seeded
    /// hasher.
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, RandomState::new())
    }
}

impl<K: Hash + Eq, V: Clone, S: BuildHasher> ExtendibleHashTable<K, V, S> {
    /// Creates a table with the given bucket capacity and hasher.
    pub fn with_hasher(bucket_size: usize, hash_builder: S) -> Self {
        assert!(bucket_size >= 1, "bucket size must be at least 1");
        Self {
            bucket_size,
            hash_builder,
            dir: Mutex::new(Directory {
                global_depth: 0,
                num_buckets: 1,
                slots: vec![Arc::new(Mutex::new(Bucket::new(0, bucket_size)))],
            }),
        }
    }

    fn hash_of(&self, key: &K) -> usize {
        self.hash_builder.hash_one(key) as usize
    }

    fn index_of(&self, key: &K, global_depth: usize) -> usize {
        self.hash_of(key) & ((1 << global_depth) - 1)
    }

    /// Looks up the value for `key`.
    pub fn find(&self, key: &K) -> Option<V> {
        let dir = self.dir.lock();
        let bucket = dir.slots[self.index_of(key, dir.global_depth)].lock();
        bucket.find(key).cloned()
    }

    /// Removes `key` from the table. Returns whether it was present.
    pub fn remove(&self, key: &K) -> bool {
        let dir = self.dir.lock();
        let mut bucket = dir.slots[self.index_of(key, dir.global_depth)].lock();
        bucket.remove(key)
    }

    /// Inserts `key` → `value`, overwriting any previous value for the key.
    ///
    /// A full bucket is split - possibly repeatedly, when every entry lands
    /// on the same side - until the insertion succeeds.
    pub fn insert(&self, key: K, value: V) {
        let mut dir = self.dir.lock();
        loop {
            let target = Arc::clone(&dir.slots[self.index_of(&key, dir.global_depth)]);
            let mut bucket = target.lock();

            if let Some(slot) = bucket.items.iter_mut().find(|(k, _)| *k == key) {
                slot.1 = value;
                return;
            }
            if bucket.items.len() < self.bucket_size {
                bucket.items.push((key, value));
                return;
            }

            drop(bucket);
            self.split_bucket(&mut dir, &target);
        }
    }

    /// Splits a full bucket, redirecting the directory slots that now name
    /// the split-off half.
    fn split_bucket(&self, dir: &mut Directory<K, V>, bucket: &Arc<Mutex<Bucket<K, V>>>) {
        let mut old = bucket.lock();
        debug_assert!(!old.items.is_empty());

        let depth = old.depth;
        let high_bit = 1usize << depth;
        // Every entry shares its low `depth` hash bits; any of them names
        // the coordinate this bucket occupies.
        let low_bits = self.hash_of(&old.items[0].0) & (high_bit - 1);

        // Partition by the next hash bit: set moves out, clear stays.
        let mut new_bucket = Bucket::new(depth + 1, self.bucket_size);
        let items = std::mem::take(&mut old.items);
        for (k, v) in items {
            if self.hash_of(&k) & high_bit != 0 {
                new_bucket.items.push((k, v));
            } else {
                old.items.push((k, v));
            }
        }

        if depth == dir.global_depth {
            let size = dir.slots.len();
            dir.slots.extend_from_within(0..size);
            dir.global_depth += 1;
        }
        old.depth = depth + 1;
        drop(old);

        // Slots whose low depth+1 bits equal low_bits + high_bit point at
        // the new bucket; the stride between them is 2 * high_bit.
        let new_bucket = Arc::new(Mutex::new(new_bucket));
        let mut i = low_bits + high_bit;
        while i < dir.slots.len() {
            dir.slots[i] = Arc::clone(&new_bucket);
            i += high_bit * 2;
        }
        dir.num_buckets += 1;
    }

    /// Returns the number of hash bits the directory consumes.
    pub fn global_depth(&self) -> usize {
        self.dir.lock().global_depth
    }

    /// Returns the local depth of the bucket at the given directory slot.
    pub fn local_depth(&self, dir_index: usize) -> usize {
        self.dir.lock().slots[dir_index].lock().depth
    }

    /// Returns the number of distinct buckets.
    pub fn num_buckets(&self) -> usize {
        self.dir.lock().num_buckets
    }

    /// Returns the number of directory slots (`2^global_depth`).
    pub fn dir_size(&self) -> usize {
        self.dir.lock().slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_table_new() {
        let table: ExtendibleHashTable<i32, i32> = ExtendibleHashTable::new(4);
        assert_eq!(table.global_depth(), 0);
        assert_eq!(table.num_buckets(), 1);
        assert_eq!(table.dir_size(), 1);
    }

    #[test]
    fn test_hash_table_insert_find() {
        let table = ExtendibleHashTable::new(4);

        table.insert(1, "a");
        table.insert(2, "b");
        table.insert(3, "c");

        assert_eq!(table.find(&1), Some("a"));
        assert_eq!(table.find(&2), Some("b"));
        assert_eq!(table.find(&3), Some("c"));
        assert_eq!(table.find(&4), None);
    }

    #[test]
    fn test_hash_table_overwrite() {
        let table = ExtendibleHashTable::new(4);

        table.insert(7, 100);
        table.insert(7, 200);

        assert_eq!(table.find(&7), Some(200));
    }

    #[test]
    fn test_hash_table_remove() {
        let table = ExtendibleHashTable::new(4);

        table.insert(1, 10);
        assert!(table.remove(&1));
        assert_eq!(table.find(&1), None);
        assert!(!table.remove(&1));
    }

    #[test]
    fn test_hash_table_grows_under_load() {
        let table = ExtendibleHashTable::new(2);

        for i in 0..256 {
            table.insert(i, i * 2);
        }

        for i in 0..256 {
            assert_eq!(table.find(&i), Some(i * 2), "key {i} lost");
        }

        assert!(table.global_depth() > 0);
        assert_eq!(table.dir_size(), 1 << table.global_depth());
        for slot in 0..table.dir_size() {
            assert!(table.local_depth(slot) <= table.global_depth());
        }
    }

    #[test]
    fn test_hash_table_remove_after_growth() {
        let table = ExtendibleHashTable::new(2);

        for i in 0..64 {
            table.insert(i, i);
        }
        for i in (0..64).step_by(2) {
            assert!(table.remove(&i));
        }
        for i in 0..64 {
            assert_eq!(table.find(&i), (i % 2 == 1).then_some(i));
        }
    }

    #[test]
    fn test_hash_table_concurrent_insert() {
        use std::thread;

        let table = Arc::new(ExtendibleHashTable::new(4));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    for i in 0..100 {
                        table.insert(t * 100 + i, i);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for t in 0..4 {
            for i in 0..100 {
                assert_eq!(table.find(&(t * 100 + i)), Some(i));
            }
        }
    }
}
