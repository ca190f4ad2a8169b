//! Category taxonomy helpers.
//!
//! Categories form a forest through `parent_id`. The server does not guard
//! against loops, so parent assignments are checked here before they are
//! sent.

use std::collections::{HashMap, HashSet};

use api_types::category::Category;

use crate::{EngineError, ResultEngine};

/// Returns `true` if giving `category_id` the parent `parent_id` would make
/// the category its own ancestor.
///
/// `category_id` is `None` for a category that does not exist yet, which can
/// never close a loop.
pub fn would_create_cycle(
    categories: &[Category],
    category_id: Option<i64>,
    parent_id: Option<i64>,
) -> bool {
    let (Some(id), Some(parent)) = (category_id, parent_id) else {
        return false;
    };

    let parents: HashMap<i64, Option<i64>> = flatten(categories)
        .into_iter()
        .map(|c| (c.id, c.parent_id))
        .collect();
    let mut seen = HashSet::new();
    let mut cursor = Some(parent);
    while let Some(current) = cursor {
        if current == id {
            return true;
        }
        // An existing loop that does not pass through `id` is not ours to
        // report; stop walking it.
        if !seen.insert(current) {
            return false;
        }
        cursor = parents.get(&current).copied().flatten();
    }
    false
}

/// Fails with [`EngineError::CategoryCycle`] when the assignment would loop.
pub fn ensure_acyclic(
    categories: &[Category],
    category_id: Option<i64>,
    parent_id: Option<i64>,
) -> ResultEngine<()> {
    if would_create_cycle(categories, category_id, parent_id) {
        return Err(EngineError::CategoryCycle(format!(
            "category {} cannot be placed under {}",
            category_id.unwrap_or_default(),
            parent_id.unwrap_or_default()
        )));
    }
    Ok(())
}

/// Flattens a list that may already be nested through `children`.
///
/// Nested entries without a `parent_id` take the enclosing category as
/// parent. The first occurrence of an id wins. Returned categories carry no
/// `children`.
pub fn flatten(categories: &[Category]) -> Vec<Category> {
    fn walk(
        nodes: &[Category],
        parent: Option<i64>,
        seen: &mut HashSet<i64>,
        out: &mut Vec<Category>,
    ) {
        for node in nodes {
            if !seen.insert(node.id) {
                continue;
            }
            let mut flat = node.clone();
            flat.children = None;
            if flat.parent_id.is_none() {
                flat.parent_id = parent;
            }
            out.push(flat);
            if let Some(children) = &node.children {
                walk(children, Some(node.id), seen, out);
            }
        }
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    walk(categories, None, &mut seen, &mut out);
    out
}

/// Nests a list by `parent_id`. Input may be flat or already nested.
///
/// Categories whose parent is missing become roots. Children are ordered by
/// name. Members of a parent loop are dropped, since none of them can be
/// reached from a root.
pub fn build_tree(categories: &[Category]) -> Vec<Category> {
    let flat = flatten(categories);
    let categories = flat.as_slice();
    let ids: HashSet<i64> = categories.iter().map(|c| c.id).collect();
    let mut children: HashMap<i64, Vec<&Category>> = HashMap::new();
    let mut roots = Vec::new();
    for category in categories {
        match category.parent_id {
            Some(parent) if parent != category.id && ids.contains(&parent) => {
                children.entry(parent).or_default().push(category);
            }
            _ => roots.push(category),
        }
    }

    // Every node has a single parent, so a walk down from a root can never
    // enter a loop.
    fn attach(node: &Category, children: &HashMap<i64, Vec<&Category>>) -> Category {
        let mut out = node.clone();
        let mut kids: Vec<Category> = children
            .get(&node.id)
            .map(|list| list.iter().map(|child| attach(child, children)).collect())
            .unwrap_or_default();
        kids.sort_by(|a, b| a.name.cmp(&b.name));
        out.children = Some(kids);
        out
    }

    let mut tree: Vec<Category> = roots
        .into_iter()
        .map(|root| attach(root, &children))
        .collect();
    tree.sort_by(|a, b| a.name.cmp(&b.name));
    tree
}
