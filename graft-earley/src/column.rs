//! Columns: the ordered, deduplicated item sets anchored at one input
//! position.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use fnv::FnvHashMap;

use crate::item::{Item, ItemKey, ParentSet};
use crate::local_prelude::*;

/// The set of Earley items at one input position.
///
/// Insertion is O(1) with duplicate rejection; iteration is FIFO by index
/// and tolerates insertion while it runs, so the driver can use a column
/// as its own worklist. Two indices are maintained: completed items and
/// items expecting a given symbol. The latter lists are handed out by
/// reference as [`ParentSet`]s, which is what lets predictions made later
/// in the column reach completions routed through the same symbol.
pub struct Column<V> {
    items: Vec<Rc<Item<V>>>,
    buckets: FnvHashMap<ItemKey, Vec<usize>>,
    expecting: FnvHashMap<Symbol, ParentSet<V>>,
    complete: Vec<usize>,
}

impl<V: ParseValue> Column<V> {
    pub fn new() -> Self {
        Column {
            items: Vec::new(),
            buckets: FnvHashMap::default(),
            expecting: FnvHashMap::default(),
            complete: Vec::new(),
        }
    }

    /// Inserts an item unless an equal one is already present. Returns
    /// whether the item was inserted.
    pub fn push(&mut self, item: Item<V>) -> bool {
        let key = item.dedup_key();
        let bucket = self.buckets.entry(key).or_default();
        if bucket
            .iter()
            .any(|&index| *self.items[index] == item)
        {
            return false;
        }
        let index = self.items.len();
        let item = Rc::new(item);
        bucket.push(index);
        if item.is_complete() {
            self.complete.push(index);
        } else if let Some(expected) = item.expected() {
            self.expecting
                .entry(expected.clone())
                .or_default()
                .borrow_mut()
                .push(Rc::clone(&item));
        }
        self.items.push(item);
        true
    }

    /// The item at the given insertion index.
    pub fn get(&self, index: usize) -> Option<Rc<Item<V>>> {
        self.items.get(index).cloned()
    }

    /// The number of items inserted so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The live list of items expecting the given symbol. The list is
    /// created on first use so that predicted items can hook onto it
    /// before any parent shows up.
    pub fn items_expecting(&mut self, symbol: &Symbol) -> ParentSet<V> {
        Rc::clone(
            self.expecting
                .entry(symbol.clone())
                .or_insert_with(|| Rc::new(RefCell::new(Vec::new()))),
        )
    }

    /// The symbols some item of this column is waiting for, sorted.
    pub fn expected_symbols(&self) -> BTreeSet<Symbol> {
        self.expecting
            .iter()
            .filter(|(_, items)| !items.borrow().is_empty())
            .map(|(symbol, _)| symbol.clone())
            .collect()
    }

    /// The complete items, in insertion order.
    pub fn completions(&self) -> impl Iterator<Item = Rc<Item<V>>> + '_ {
        self.complete.iter().map(|&index| Rc::clone(&self.items[index]))
    }
}

impl<V: ParseValue> Default for Column<V> {
    fn default() -> Self {
        Self::new()
    }
}
