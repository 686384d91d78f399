use crate::{errors::MergeError, Item, TableAttribute};

pub const MAX_MERGE_DEPTH: usize = 1000;

/// Recursively merge `src` into `dest`.
///
/// Maps are merged key by key. Every other value, lists and sets included, replaces what
/// was there. Inputs nested deeper than [`MAX_MERGE_DEPTH`] fail with
/// [`MergeError::TooDeep`] before `dest` is touched.
pub fn merge(dest: &mut Item, src: &Item) -> Result<(), MergeError> {
    if too_deep(src, 0) {
        return Err(MergeError::TooDeep(MAX_MERGE_DEPTH));
    }

    merge_level(dest, src);
    Ok(())
}

fn too_deep(src: &Item, depth: usize) -> bool {
    if depth >= MAX_MERGE_DEPTH {
        return true;
    }

    src.values().any(|value| match value {
        TableAttribute::Map(inner) => too_deep(inner, depth + 1),
        _ => false,
    })
}

fn merge_level(dest: &mut Item, src: &Item) {
    for (name, value) in src {
        match value {
            TableAttribute::Map(inner) => {
                let slot = dest
                    .entry(name.clone())
                    .or_insert_with(|| TableAttribute::Map(Item::new()));

                if !matches!(slot, TableAttribute::Map(_)) {
                    *slot = TableAttribute::Map(Item::new());
                }

                if let TableAttribute::Map(slot) = slot {
                    merge_level(slot, inner);
                }
            }
            other => {
                dest.insert(name.clone(), other.clone());
            }
        }
    }
}
