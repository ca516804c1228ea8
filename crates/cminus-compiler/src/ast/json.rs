//! JSON interchange for parser-produced trees.
//!
//! Sibling lists are written as JSON arrays, so a program is an array of
//! top-level declarations and every child slot is an array holding the
//! slot's head followed by its siblings.

use super::nodes::{chain, sibling_list, Node};

/// Read a program (a JSON array of top-level declarations).
pub fn from_json(source: &str) -> serde_json::Result<Option<Box<Node>>> {
    let decls: Vec<Node> = serde_json::from_str(source)?;
    Ok(chain(decls))
}

/// Write the program rooted at `root` and its siblings.
pub fn to_json(root: Option<&Node>) -> serde_json::Result<String> {
    let decls: Vec<&Node> = sibling_list(root).collect();
    serde_json::to_string_pretty(&decls)
}

pub(crate) mod slots {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::ast::nodes::{chain, sibling_list, Node, MAX_CHILDREN};

    pub fn serialize<S>(
        slots: &[Option<Box<Node>>; MAX_CHILDREN],
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let lists: Vec<Vec<&Node>> = slots
            .iter()
            .map(|slot| sibling_list(slot.as_deref()).collect())
            .collect();
        lists.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[Option<Box<Node>>; MAX_CHILDREN], D::Error>
    where
        D: Deserializer<'de>,
    {
        let lists = <[Vec<Node>; MAX_CHILDREN]>::deserialize(deserializer)?;
        Ok(lists.map(chain))
    }
}
