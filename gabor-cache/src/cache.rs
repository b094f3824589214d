use lazy_static::lazy_static;
use std::sync::RwLock;
pub use string_cache::DefaultAtom as Atom;

lazy_static! {
    static ref SOURCE_INTERNER: RwLock<Vec<Atom>> = RwLock::new(Vec::new());
}

/// Intern an asset source (path or data URI) and return its ID. The same
/// source always maps to the same ID for the life of the process.
pub fn intern_source(source: &str) -> usize {
    let atom = Atom::from(source);
    if let Some(idx) = SOURCE_INTERNER
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .position(|a| *a == atom)
    {
        return idx;
    }
    let mut v = SOURCE_INTERNER.write().unwrap_or_else(|e| e.into_inner());
    match v.iter().position(|a| *a == atom) {
        Some(idx) => idx,
        None => {
            v.push(atom);
            v.len() - 1
        }
    }
}

/// Current count of unique sources
pub fn source_count() -> usize {
    SOURCE_INTERNER.read().unwrap_or_else(|e| e.into_inner()).len()
}

pub fn get_source(id: usize) -> Option<Atom> {
    SOURCE_INTERNER
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(id)
        .cloned()
}
