use std::{collections::VecDeque, rc::Rc};

use super::capacity::BufferCapacity;

/// Immutable point-in-time copy of a [`ReplayBuffer`].
///
/// Cloning is cheap and a snapshot never changes after it is taken, so it can
/// be iterated while the buffer keeps growing underneath.
pub struct Snapshot<Item> {
  values: Rc<[Item]>,
  /// Sequence number one past the newest value in `values`.
  end: u64,
}

impl<Item> Snapshot<Item> {
  #[inline]
  pub fn len(&self) -> usize { self.values.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.values.is_empty() }

  #[inline]
  pub fn as_slice(&self) -> &[Item] { &self.values }

  #[inline]
  pub fn iter(&self) -> std::slice::Iter<'_, Item> { self.values.iter() }

  /// Sequence number of the oldest value held.
  #[inline]
  pub fn start(&self) -> u64 { self.end - self.values.len() as u64 }

  /// Sequence number one past the newest value held.
  #[inline]
  pub fn end(&self) -> u64 { self.end }

  /// The values numbered `seq` and later.
  pub fn values_from(&self, seq: u64) -> &[Item] {
    let skip = seq.saturating_sub(self.start()).min(self.values.len() as u64) as usize;
    &self.values[skip..]
  }

  /// `true` if both snapshots share the same storage.
  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.values, &other.values) }
}

impl<Item> Clone for Snapshot<Item> {
  fn clone(&self) -> Self { Self { values: self.values.clone(), end: self.end } }
}

impl<'s, Item> IntoIterator for &'s Snapshot<Item> {
  type Item = &'s Item;
  type IntoIter = std::slice::Iter<'s, Item>;

  fn into_iter(self) -> Self::IntoIter { self.iter() }
}

/// Bounded backlog of the most recent values, oldest first.
///
/// Appending past capacity evicts the oldest value. Every append is numbered,
/// starting at 0, so snapshots can tell which values they cover.
pub struct ReplayBuffer<Item> {
  capacity: BufferCapacity,
  values: VecDeque<Item>,
  appended: u64,
  frozen: bool,
  snapshot: Option<Snapshot<Item>>,
}

impl<Item> ReplayBuffer<Item> {
  pub fn new(capacity: BufferCapacity) -> Self {
    Self { capacity, values: VecDeque::new(), appended: 0, frozen: false, snapshot: None }
  }

  #[inline]
  pub fn capacity(&self) -> BufferCapacity { self.capacity }

  #[inline]
  pub fn len(&self) -> usize { self.values.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.values.is_empty() }

  /// Number of values appended over the buffer's lifetime, evicted ones
  /// included.
  #[inline]
  pub fn appended(&self) -> u64 { self.appended }

  #[inline]
  pub fn is_frozen(&self) -> bool { self.frozen }

  /// Adds `value` as the newest entry. Does nothing once frozen.
  pub fn append(&mut self, value: Item) {
    if self.frozen {
      return;
    }
    self.values.push_back(value);
    if self.values.len() > self.capacity.get() {
      self.values.pop_front();
    }
    self.appended += 1;
    self.snapshot = None;
  }

  /// Stops accepting values. Buffered values stay available.
  pub fn freeze(&mut self) { self.frozen = true; }
}

impl<Item: Clone> ReplayBuffer<Item> {
  /// Current contents as an immutable snapshot.
  ///
  /// Reuses the previous snapshot if nothing was appended since it was taken.
  pub fn snapshot(&mut self) -> Snapshot<Item> {
    let (values, end) = (&self.values, self.appended);
    self
      .snapshot
      .get_or_insert_with(|| Snapshot { values: values.iter().cloned().collect(), end })
      .clone()
  }
}
