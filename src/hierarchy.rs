//! Single-inheritance trees over named nodes
//!
//! Sprite sheet entries may name a `parent` whose attributes they inherit.
//! [`Hierarchy`] validates those links (no unknown parents, no duplicate
//! names, no cycles) independently of the order nodes are listed in, and
//! answers attribute lookups by walking from a node up its parent chain.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

/// Error when building a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum HierarchyError {
    /// Linking the node to its parent would close a loop
    #[error("Detected a circular parent dependency between nodes '{node}' and '{parent}'")]
    CircularDependency { node: String, parent: String },
    /// A node names a parent that does not exist
    #[error("Node '{node}' names unknown parent '{parent}'")]
    UnknownParent { node: String, parent: String },
    /// Two nodes share a name
    #[error("Duplicate node name '{0}'")]
    DuplicateName(String),
}

/// A named node that may inherit from a parent.
pub trait HierarchyNode {
    fn name(&self) -> &str;
    fn parent(&self) -> Option<&str>;
}

#[derive(Debug, Default, Clone)]
struct Links {
    ancestors: BTreeSet<usize>,
    children: Vec<usize>,
}

/// Nodes with validated parent links.
#[derive(Debug, Clone)]
pub struct Hierarchy<T> {
    nodes: Vec<T>,
    index: HashMap<String, usize>,
    parents: Vec<Option<usize>>,
}

impl<T: HierarchyNode> Hierarchy<T> {
    /// Validate and link `nodes`, keeping their original order.
    pub fn build(nodes: Vec<T>) -> Result<Self, HierarchyError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.name().to_string(), i).is_some() {
                return Err(HierarchyError::DuplicateName(node.name().to_string()));
            }
        }

        let mut links = vec![Links::default(); nodes.len()];
        let mut parents = vec![None; nodes.len()];

        for (id, node) in nodes.iter().enumerate() {
            let Some(parent_name) = node.parent() else {
                continue;
            };
            let parent = *index.get(parent_name).ok_or_else(|| HierarchyError::UnknownParent {
                node: node.name().to_string(),
                parent: parent_name.to_string(),
            })?;

            let cycle = parent == id
                || links[parent].ancestors.contains(&id)
                || descendants(&links, id).contains(&parent);
            if cycle {
                return Err(HierarchyError::CircularDependency {
                    node: node.name().to_string(),
                    parent: parent_name.to_string(),
                });
            }

            parents[id] = Some(parent);
            links[parent].children.push(id);

            let mut inherited = links[parent].ancestors.clone();
            inherited.insert(parent);
            for d in std::iter::once(id).chain(descendants(&links, id)) {
                links[d].ancestors.extend(inherited.iter().copied());
            }
        }

        Ok(Self { nodes, index, parents })
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in their original order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter()
    }

    /// The linked parent of a node.
    pub fn parent_of(&self, name: &str) -> Option<&T> {
        let i = *self.index.get(name)?;
        self.parents[i].map(|p| &self.nodes[p])
    }

    /// The node itself followed by its ancestors, nearest first.
    pub fn chain(&self, name: &str) -> Vec<&T> {
        let mut chain = Vec::new();
        let mut current = self.index.get(name).copied();
        while let Some(i) = current {
            chain.push(&self.nodes[i]);
            current = self.parents[i];
        }
        chain
    }

    /// Names of the ancestors of a node, nearest first.
    pub fn ancestors(&self, name: &str) -> Vec<&str> {
        self.chain(name).into_iter().skip(1).map(|n| n.name()).collect()
    }

    /// The first value `attr` yields along the node's chain.
    ///
    /// `None` when no node on the chain defines it.
    pub fn lookup<'a, V>(&'a self, name: &str, attr: impl Fn(&'a T) -> Option<V>) -> Option<V> {
        self.chain(name).into_iter().find_map(attr)
    }
}

fn descendants(links: &[Links], root: usize) -> Vec<usize> {
    let mut found = Vec::new();
    let mut stack = links[root].children.clone();
    while let Some(child) = stack.pop() {
        found.push(child);
        stack.extend(links[child].children.iter().copied());
    }
    found
}
