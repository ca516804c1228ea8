use super::nodes::{sibling_list, Node};

/// Hooks invoked by [`traverse`].
///
/// `enter` runs before a node's children, `leave` after them and before the
/// node's next sibling. Both default to doing nothing.
pub trait Walker<'a> {
    fn enter(&mut self, _node: &'a Node) {}

    fn leave(&mut self, _node: &'a Node) {}
}

/// Walk the sibling list starting at `head`, visiting every child slot of
/// each node in order. Absent slots are skipped.
pub fn traverse<'a, W>(head: Option<&'a Node>, walker: &mut W)
where
    W: Walker<'a> + ?Sized,
{
    for node in sibling_list(head) {
        walker.enter(node);
        for child in &node.children {
            traverse(child.as_deref(), walker);
        }
        walker.leave(node);
    }
}
