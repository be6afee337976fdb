//! Thread-safe bounded in-memory [`StateCache`] for single-process deployments and tests.

// self
use crate::{
	_prelude::*,
	cache::{CacheError, CacheFuture, CompareAndSwapOutcome, StateCache},
};

#[derive(Debug)]
struct Entry {
	value: String,
	written: u64,
}

#[derive(Debug, Default)]
struct Slots {
	entries: HashMap<String, Entry>,
	sequence: u64,
}
impl Slots {
	fn put(&mut self, key: &str, value: String) {
		self.sequence += 1;
		self.entries.insert(key.to_owned(), Entry { value, written: self.sequence });
	}
}

/// Capacity-bounded cache evicting its oldest writes in batches.
///
/// Once an insertion pushes the entry count past the capacity, the oldest half (by last
/// write) is dropped in one pass. The order is an approximation of recency, not strict LRU.
#[derive(Clone, Debug)]
pub struct MemoryCache {
	slots: Arc<RwLock<Slots>>,
	capacity: usize,
}
impl MemoryCache {
	/// Capacity used by [`Default`].
	pub const DEFAULT_CAPACITY: usize = 4096;

	/// Creates a cache holding at most `capacity` entries (minimum one).
	pub fn new(capacity: usize) -> Self {
		Self { slots: Default::default(), capacity: capacity.max(1) }
	}

	/// Maximum number of retained entries.
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Current number of entries.
	pub fn len(&self) -> usize {
		self.slots.read().entries.len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn get_now(&self, key: &str) -> Option<String> {
		self.slots.read().entries.get(key).map(|entry| entry.value.clone())
	}

	fn set_now(&self, key: &str, value: String) {
		let mut slots = self.slots.write();

		slots.put(key, value);
		Self::evict(&mut slots, self.capacity);
	}

	fn cas_now(&self, key: &str, expected: &str, replacement: String) -> CompareAndSwapOutcome {
		let mut slots = self.slots.write();
		let outcome = match slots.entries.get(key) {
			Some(entry) if entry.value == expected => CompareAndSwapOutcome::Updated,
			Some(_) => CompareAndSwapOutcome::Mismatch,
			None => CompareAndSwapOutcome::Missing,
		};

		if matches!(outcome, CompareAndSwapOutcome::Updated) {
			slots.put(key, replacement);
		}

		outcome
	}

	fn evict(slots: &mut Slots, capacity: usize) {
		let len = slots.entries.len();

		if len <= capacity {
			return;
		}

		let count = (capacity / 2).max(len - capacity);
		let mut order =
			slots.entries.iter().map(|(key, entry)| (entry.written, key.clone())).collect::<Vec<_>>();

		order.sort_unstable();

		for (_, key) in order.into_iter().take(count) {
			slots.entries.remove(&key);
		}

		#[cfg(feature = "tracing")]
		tracing::debug!(evicted = count, remaining = slots.entries.len(), "correlation cache evicted");
	}
}
impl Default for MemoryCache {
	fn default() -> Self {
		Self::new(Self::DEFAULT_CAPACITY)
	}
}
impl StateCache for MemoryCache {
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>> {
		Box::pin(async move { Ok::<_, CacheError>(self.get_now(key)) })
	}

	fn set<'a>(&'a self, key: &'a str, value: String) -> CacheFuture<'a, ()> {
		Box::pin(async move {
			self.set_now(key, value);

			Ok(())
		})
	}

	fn compare_and_swap<'a>(
		&'a self,
		key: &'a str,
		expected: &'a str,
		replacement: String,
	) -> CacheFuture<'a, CompareAndSwapOutcome> {
		Box::pin(async move { Ok(self.cas_now(key, expected, replacement)) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn block_on<F: Future>(future: F) -> F::Output {
		tokio::runtime::Builder::new_current_thread()
			.build()
			.expect("Test runtime should build.")
			.block_on(future)
	}

	#[test]
	fn compare_and_swap_reports_each_outcome() {
		let cache = MemoryCache::new(8);

		block_on(async {
			assert_eq!(
				cache.compare_and_swap("k", "a", "b".into()).await.expect("CAS should run."),
				CompareAndSwapOutcome::Missing
			);

			cache.set("k", "a".into()).await.expect("Set should succeed.");

			assert_eq!(
				cache.compare_and_swap("k", "x", "b".into()).await.expect("CAS should run."),
				CompareAndSwapOutcome::Mismatch
			);
			assert_eq!(
				cache.compare_and_swap("k", "a", "b".into()).await.expect("CAS should run."),
				CompareAndSwapOutcome::Updated
			);
			assert_eq!(cache.get("k").await.expect("Get should succeed."), Some("b".into()));
		});
	}

	#[test]
	fn overflow_evicts_oldest_half_in_one_batch() {
		let cache = MemoryCache::new(4);

		for i in 0..4 {
			cache.set_now(&format!("k{i}"), i.to_string());
		}

		// Rewriting k0 makes it the newest entry.
		cache.set_now("k0", "again".into());
		cache.set_now("k4", "4".into());

		assert_eq!(cache.len(), 3);
		assert!(cache.get_now("k1").is_none());
		assert!(cache.get_now("k2").is_none());
		assert_eq!(cache.get_now("k0").as_deref(), Some("again"));
		assert!(cache.get_now("k3").is_some());
		assert!(cache.get_now("k4").is_some());
	}

	#[test]
	fn tiny_capacities_stay_bounded() {
		let cache = MemoryCache::new(0);

		cache.set_now("a", "1".into());
		cache.set_now("b", "2".into());

		assert_eq!(cache.capacity(), 1);
		assert_eq!(cache.len(), 1);
		assert_eq!(cache.get_now("b").as_deref(), Some("2"));
	}
}
