//! Type-keyed storage attached to a request.
//!
//! Middleware uses it to hand values such as the session nonce or the request
//! id to the stages further down the chain.

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-request extension storage.
///
/// Clones share the same underlying map, so a value inserted through one clone
/// is visible through every other.
#[derive(Clone, Default)]
pub struct Extensions {
	map: Arc<RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
}

impl Extensions {
	/// Create an empty extension map
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Extensions;
	///
	/// let extensions = Extensions::new();
	/// assert!(!extensions.contains::<String>());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a value, replacing any previous value of the same type
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Extensions;
	///
	/// #[derive(Clone)]
	/// struct RequestId(String);
	///
	/// let extensions = Extensions::new();
	/// extensions.insert(RequestId("abc".into()));
	/// assert!(extensions.contains::<RequestId>());
	/// ```
	pub fn insert<T: Send + Sync + 'static>(&self, value: T) {
		self.map.write().insert(TypeId::of::<T>(), Box::new(value));
	}

	/// Get a clone of the stored value of type `T`
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Extensions;
	///
	/// let extensions = Extensions::new();
	/// extensions.insert(7u16);
	///
	/// assert_eq!(extensions.get::<u16>(), Some(7));
	/// assert_eq!(extensions.get::<String>(), None);
	/// ```
	pub fn get<T>(&self) -> Option<T>
	where
		T: Clone + Send + Sync + 'static,
	{
		self.map
			.read()
			.get(&TypeId::of::<T>())
			.and_then(|boxed| boxed.downcast_ref::<T>())
			.cloned()
	}

	/// Check whether a value of type `T` is stored
	pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
		self.map.read().contains_key(&TypeId::of::<T>())
	}

	/// Remove the stored value of type `T` and return it
	pub fn remove<T>(&self) -> Option<T>
	where
		T: Send + Sync + 'static,
	{
		let boxed = self.map.write().remove(&TypeId::of::<T>())?;
		boxed.downcast::<T>().ok().map(|value| *value)
	}
}

impl std::fmt::Debug for Extensions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Extensions")
			.field("len", &self.map.read().len())
			.finish()
	}
}
