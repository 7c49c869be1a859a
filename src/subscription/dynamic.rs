use smallvec::SmallVec;

/// A container for managing multiple items with ID-based tracking.
///
/// - Add new items and get a unique ID
/// - Remove specific items by ID (e.g., when an observer unsubscribes)
/// - Drop every item that no longer qualifies in one pass
///
/// IDs are never reused within one container.
///
/// # Examples
///
/// ```rust
/// use rxreplay::subscription::DynamicSubscriptions;
///
/// let mut subs: DynamicSubscriptions<&str> = DynamicSubscriptions::default();
///
/// let id1 = subs.add("a");
/// let _id2 = subs.add("b");
/// assert_eq!(subs.len(), 2);
///
/// assert_eq!(subs.remove(id1), Some("a"));
/// assert_eq!(subs.len(), 1);
/// ```
pub struct DynamicSubscriptions<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for DynamicSubscriptions<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> DynamicSubscriptions<U> {
  /// Create an empty container.
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Add an item and return its unique ID.
  #[inline]
  pub fn add(&mut self, item: U) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.items.push((id, item));
    id
  }

  /// Remove an item by ID.
  pub fn remove(&mut self, id: usize) -> Option<U> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  /// Keep only the items for which `f` returns `true`.
  #[inline]
  pub fn retain(&mut self, mut f: impl FnMut(&U) -> bool) {
    self.items.retain(|(_, item)| f(item));
  }

  /// Check if an ID exists in the container.
  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.items.iter().any(|(i, _)| *i == id) }

  /// Get the number of items.
  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  /// Check if empty.
  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Drain all items.
  #[inline]
  pub fn drain(&mut self) -> impl Iterator<Item = U> + '_ {
    self.items.drain(..).map(|(_, item)| item)
  }

  /// Iterate over all items in insertion order.
  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = &U> { self.items.iter().map(|(_, item)| item) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ids_are_not_reused() {
    let mut subs = DynamicSubscriptions::new();
    let a = subs.add(1);
    subs.remove(a);
    let b = subs.add(2);
    assert_ne!(a, b);
    assert!(!subs.contains(a));
    assert!(subs.contains(b));
  }

  #[test]
  fn retain_keeps_order() {
    let mut subs = DynamicSubscriptions::new();
    for v in 0..5 {
      subs.add(v);
    }
    subs.retain(|v| v % 2 == 0);
    assert_eq!(subs.iter().copied().collect::<Vec<_>>(), vec![0, 2, 4]);
  }

  #[test]
  fn drain_empties() {
    let mut subs = DynamicSubscriptions::new();
    subs.add("x");
    subs.add("y");
    assert_eq!(subs.drain().collect::<Vec<_>>(), vec!["x", "y"]);
    assert!(subs.is_empty());
  }
}
