use crate::remote::{compare_items, Item, Module};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Finished, owned view of one course's content tree
///
/// Modules are kept in position order and each module's items are in
/// position order, so the writer can walk it front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseIndex {
    modules: Vec<(Module, Vec<Item>)>,
    details: HashMap<u64, String>,
}

impl CourseIndex {
    /// Modules with their items, in position order
    pub fn modules(&self) -> &[(Module, Vec<Item>)] {
        &self.modules
    }

    /// Rendered content for a fetchable item, if it was fetched
    pub fn detail(&self, item_id: u64) -> Option<&str> {
        self.details.get(&item_id).map(String::as_str)
    }

    /// Number of items with rendered content
    pub fn detail_count(&self) -> usize {
        self.details.len()
    }

    pub fn item_count(&self) -> usize {
        self.modules.iter().map(|(_, items)| items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Course index written concurrently by scan and fetch tasks
///
/// Every method takes the lock for the duration of a copy or an insert and
/// nothing else; no lock is ever held across an `.await`.
#[derive(Debug, Default)]
pub struct SharedCourseIndex {
    inner: Mutex<CourseIndex>,
}

impl SharedCourseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CourseIndex> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a scanned module and its items
    ///
    /// Items are sorted by position before the lock is taken, so arrival
    /// order never leaks into the final document.
    pub fn add_module(&self, module: Module, mut items: Vec<Item>) {
        items.sort_by(compare_items);
        self.lock().modules.push((module, items));
    }

    /// Modules with their items, ordered by module position
    pub fn ordered_structure(&self) -> Vec<(Module, Vec<Item>)> {
        let mut modules = self.lock().modules.clone();
        modules.sort_by_key(|(module, _)| module.sort_key());
        modules
    }

    /// Items whose content needs a separate fetch, keyed by identifier
    ///
    /// Taken from a single consistent view of the structure.
    pub fn fetchable_items(&self) -> BTreeMap<u64, Item> {
        self.lock()
            .modules
            .iter()
            .flat_map(|(_, items)| items.iter())
            .filter(|item| item.kind.is_fetchable())
            .map(|item| (item.id, item.clone()))
            .collect()
    }

    /// Stores rendered content (or inline error text) for an item
    pub fn save_detail(&self, item_id: u64, content: String) {
        self.lock().details.insert(item_id, content);
    }

    pub fn detail(&self, item_id: u64) -> Option<String> {
        self.lock().details.get(&item_id).cloned()
    }

    /// Owned, position-ordered copy for the document writer
    pub fn snapshot(&self) -> CourseIndex {
        let details = self.lock().details.clone();
        CourseIndex {
            modules: self.ordered_structure(),
            details,
        }
    }
}
