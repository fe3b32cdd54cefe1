//! Results gathered from one trigger.

/// Return values of the listeners that ran, in execution order.
///
/// `stopped` is true when the trigger ended early, either because a listener
/// stopped propagation or because the stop predicate accepted a result. In
/// both cases the result that caused the stop is [`last`](Self::last).
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCollection<V> {
	responses: Vec<V>,
	stopped: bool,
}

impl<V> ResponseCollection<V> {
	pub(crate) fn new() -> Self {
		Self {
			responses: Vec::new(),
			stopped: false,
		}
	}

	pub(crate) fn push(&mut self, value: V) {
		self.responses.push(value);
	}

	pub(crate) fn set_stopped(&mut self, stopped: bool) {
		self.stopped = stopped;
	}

	pub fn stopped(&self) -> bool {
		self.stopped
	}

	pub fn first(&self) -> Option<&V> {
		self.responses.first()
	}

	pub fn last(&self) -> Option<&V> {
		self.responses.last()
	}

	pub fn len(&self) -> usize {
		self.responses.len()
	}

	pub fn is_empty(&self) -> bool {
		self.responses.is_empty()
	}

	/// Whether any listener returned a value accepted by `predicate`.
	pub fn contains(&self, predicate: impl Fn(&V) -> bool) -> bool {
		self.responses.iter().any(predicate)
	}

	pub fn iter(&self) -> std::slice::Iter<'_, V> {
		self.responses.iter()
	}

	pub fn into_last(self) -> Option<V> {
		self.responses.into_iter().last()
	}

	pub fn into_vec(self) -> Vec<V> {
		self.responses
	}
}

impl<V> Default for ResponseCollection<V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<V> IntoIterator for ResponseCollection<V> {
	type Item = V;
	type IntoIter = std::vec::IntoIter<V>;

	fn into_iter(self) -> Self::IntoIter {
		self.responses.into_iter()
	}
}

impl<'a, V> IntoIterator for &'a ResponseCollection<V> {
	type Item = &'a V;
	type IntoIter = std::slice::Iter<'a, V>;

	fn into_iter(self) -> Self::IntoIter {
		self.responses.iter()
	}
}
