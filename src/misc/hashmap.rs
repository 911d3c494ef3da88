use std::collections::HashMap as OriginalHashMap;
use std::hash::BuildHasherDefault;
use twox_hash::XxHash64;
use nohash_hasher::IntSet;

/// HashMap keyed by column pattern hashes
pub type FullHashMap<K, V> = OriginalHashMap<K, V, BuildHasherDefault<XxHash64>>;

/// Set of pool indices, keys are used as their own hash
pub type IndexSet<K> = IntSet<K>;
