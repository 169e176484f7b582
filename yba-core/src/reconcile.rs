//! Reconcile - Merge a declared list of named sub-entities with the persisted one
//!
//! Entries present in both lists keep their remote identity, entries only in
//! the persisted list are marked inactive (never dropped, because other
//! objects may still reference their UUID), and entries only in the declared
//! list are appended as new.

/// An entry of a declarative list that can be reconciled
pub trait Reconcile: Clone {
    /// Stable identity key (e.g. region or zone code)
    fn key(&self) -> &str;

    /// Take over the remote identity and liveness of the persisted entry.
    ///
    /// Implementations with nested lists reconcile them here as well.
    fn adopt(&mut self, persisted: &Self);

    /// Mark the entry inactive (soft delete)
    fn deactivate(&mut self);
}

/// Build the edit request list from the persisted (`old`) and declared (`new`) lists
///
/// Output order is the persisted order followed by new entries in their
/// declared order.
pub fn reconcile<T: Reconcile>(old: &[T], new: &[T]) -> Vec<T> {
    let mut remaining: Vec<&T> = new.iter().collect();
    let mut merged = Vec::with_capacity(old.len() + new.len());

    for persisted in old {
        match remaining.iter().position(|d| d.key() == persisted.key()) {
            Some(pos) => {
                let mut entry = remaining.remove(pos).clone();
                entry.adopt(persisted);
                merged.push(entry);
            }
            None => {
                let mut entry = persisted.clone();
                entry.deactivate();
                merged.push(entry);
            }
        }
    }

    merged.extend(remaining.into_iter().cloned());
    merged
}
