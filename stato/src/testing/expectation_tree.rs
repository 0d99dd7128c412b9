use crate::ActionType;

use super::ActionValidator;

/// Index of a node in an [`ExpectationTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

/// How an expectation treats the observed payload.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PayloadCheck<P> {
    Unchecked,
    Absent,
    Equals(P),
}

impl<P: PartialEq> PayloadCheck<P> {
    pub(crate) fn accepts(&self, observed: Option<&P>) -> bool {
        match self {
            PayloadCheck::Unchecked => true,
            PayloadCheck::Absent => observed.is_none(),
            PayloadCheck::Equals(expected) => observed == Some(expected),
        }
    }
}

pub(crate) struct ExpectationNode<S, P> {
    pub(crate) action_type: ActionType,
    pub(crate) payload: PayloadCheck<P>,
    pub(crate) validator: Option<ActionValidator<S, P>>,
    seen: bool,
    pruned: bool,
    children: Vec<NodeId>,
}

impl<S, P> ExpectationNode<S, P> {
    pub(crate) fn new(action_type: ActionType) -> Self {
        Self {
            action_type,
            payload: PayloadCheck::Unchecked,
            validator: None,
            seen: false,
            pruned: false,
            children: Vec::new(),
        }
    }
}

/// Arena of expected actions.
///
/// Roots are independent expectations. Children are follow-ups (generic,
/// success or error) that only become matchable once their parent was seen.
/// A seen node whose whole subtree is seen gets pruned; pruned nodes stay in
/// the arena so handles remain valid, but are no longer reachable.
pub(crate) struct ExpectationTree<S, P> {
    nodes: Vec<ExpectationNode<S, P>>,
    roots: Vec<NodeId>,
}

impl<S, P> ExpectationTree<S, P> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub(crate) fn add_root(&mut self, node: ExpectationNode<S, P>) -> NodeId {
        let id = self.push(node);
        self.roots.push(id);
        id
    }

    /// Attach a follow-up. Returns `false` when the parent was already pruned:
    /// the node is stored but can never match.
    pub(crate) fn add_child(&mut self, parent: NodeId, node: ExpectationNode<S, P>) -> (NodeId, bool) {
        let id = self.push(node);
        if self.nodes[parent.0].pruned {
            self.nodes[id.0].pruned = true;
            return (id, false);
        }
        self.nodes[parent.0].children.push(id);
        (id, true)
    }

    pub(crate) fn node(&self, id: NodeId) -> &ExpectationNode<S, P> {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ExpectationNode<S, P> {
        &mut self.nodes[id.0]
    }

    pub(crate) fn is_seen(&self, id: NodeId) -> bool {
        self.nodes[id.0].seen
    }

    pub(crate) fn mark_seen(&mut self, id: NodeId) {
        self.nodes[id.0].seen = true;
    }

    /// First unseen node matching `action_type`, in declaration order.
    ///
    /// Unseen roots match on type alone. Inside a seen node, an unseen child
    /// matches when its type equals `action_type` and, if the observed action
    /// names a related action, that related type equals the seen node's type.
    pub(crate) fn find(&self, action_type: &ActionType, related: Option<&ActionType>) -> Option<NodeId> {
        self.roots
            .iter()
            .find_map(|&root| self.find_from(root, action_type, related))
    }

    fn find_from(&self, id: NodeId, action_type: &ActionType, related: Option<&ActionType>) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        if !node.seen {
            return (node.action_type == *action_type).then_some(id);
        }
        node.children.iter().find_map(|&child| {
            let candidate = &self.nodes[child.0];
            if candidate.seen {
                return self.find_from(child, action_type, related);
            }
            let accepted = candidate.action_type == *action_type
                && related.is_none_or(|related| *related == node.action_type);
            accepted.then_some(child)
        })
    }

    /// Remove every seen node whose subtree is fully seen. Returns how many
    /// nodes became unreachable.
    pub(crate) fn prune(&mut self) -> usize {
        let before = self.len();
        let roots = std::mem::take(&mut self.roots);
        let kept: Vec<NodeId> = roots.into_iter().filter(|&root| !self.prune_from(root)).collect();
        self.roots = kept;
        before - self.len()
    }

    fn prune_from(&mut self, id: NodeId) -> bool {
        if !self.nodes[id.0].seen {
            return false;
        }
        let children = std::mem::take(&mut self.nodes[id.0].children);
        let kept: Vec<NodeId> = children
            .into_iter()
            .filter(|&child| !self.prune_from(child))
            .collect();
        let exhausted = kept.is_empty();
        self.nodes[id.0].children = kept;
        self.nodes[id.0].pruned = exhausted;
        exhausted
    }

    /// Number of reachable nodes, seen or not.
    pub(crate) fn len(&self) -> usize {
        self.roots.iter().map(|&root| self.subtree_len(root)).sum()
    }

    fn subtree_len(&self, id: NodeId) -> usize {
        1 + self.nodes[id.0]
            .children
            .iter()
            .map(|&child| self.subtree_len(child))
            .sum::<usize>()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Types of reachable nodes not yet seen, in depth-first order.
    pub(crate) fn outstanding(&self) -> Vec<ActionType> {
        let mut out = Vec::new();
        for &root in &self.roots {
            self.collect_outstanding(root, &mut out);
        }
        out
    }

    fn collect_outstanding(&self, id: NodeId, out: &mut Vec<ActionType>) {
        let node = &self.nodes[id.0];
        if !node.seen {
            out.push(node.action_type.clone());
        }
        for &child in &node.children {
            self.collect_outstanding(child, out);
        }
    }

    fn push(&mut self, node: ExpectationNode<S, P>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Tree = ExpectationTree<(), ()>;

    fn node(action_type: &'static str) -> ExpectationNode<(), ()> {
        ExpectationNode::new(ActionType::from(action_type))
    }

    fn t(action_type: &'static str) -> ActionType {
        ActionType::from(action_type)
    }

    #[test]
    fn roots_match_in_declaration_order() {
        let mut tree = Tree::new();
        let first = tree.add_root(node("PING"));
        let second = tree.add_root(node("PING"));

        assert_eq!(tree.find(&t("PING"), None), Some(first));
        tree.mark_seen(first);
        assert_eq!(tree.find(&t("PING"), None), Some(second));
        assert_eq!(tree.find(&t("PONG"), None), None);
    }

    #[test]
    fn children_only_match_after_parent_seen() {
        let mut tree = Tree::new();
        let login = tree.add_root(node("LOGIN"));
        let (success, attached) = tree.add_child(login, node("SUCCESS"));
        assert!(attached);

        assert_eq!(tree.find(&t("SUCCESS"), Some(&t("LOGIN"))), None);
        tree.mark_seen(login);
        assert_eq!(tree.find(&t("SUCCESS"), Some(&t("LOGIN"))), Some(success));
    }

    #[test]
    fn related_type_must_name_the_parent() {
        let mut tree = Tree::new();
        let login = tree.add_root(node("LOGIN"));
        let fetch = tree.add_root(node("FETCH"));
        tree.add_child(login, node("SUCCESS"));
        let (fetch_success, _) = tree.add_child(fetch, node("SUCCESS"));
        tree.mark_seen(login);
        tree.mark_seen(fetch);

        assert_eq!(tree.find(&t("SUCCESS"), Some(&t("FETCH"))), Some(fetch_success));
        assert_eq!(tree.find(&t("SUCCESS"), Some(&t("OTHER"))), None);
    }

    #[test]
    fn search_descends_through_seen_children() {
        let mut tree = Tree::new();
        let login = tree.add_root(node("LOGIN"));
        let (success, _) = tree.add_child(login, node("SUCCESS"));
        let (profile, _) = tree.add_child(success, node("FETCH_PROFILE"));
        tree.mark_seen(login);
        tree.mark_seen(success);

        assert_eq!(tree.find(&t("FETCH_PROFILE"), None), Some(profile));
        assert_eq!(tree.find(&t("FETCH_PROFILE"), Some(&t("SUCCESS"))), Some(profile));
        assert_eq!(tree.find(&t("FETCH_PROFILE"), Some(&t("LOGIN"))), None);
    }

    #[test]
    fn prune_removes_fully_seen_subtrees_only() {
        let mut tree = Tree::new();
        let login = tree.add_root(node("LOGIN"));
        let (success, _) = tree.add_child(login, node("SUCCESS"));
        let other = tree.add_root(node("OTHER"));
        assert_eq!(tree.len(), 3);

        tree.mark_seen(login);
        assert_eq!(tree.prune(), 0);
        assert_eq!(tree.outstanding(), vec![t("SUCCESS"), t("OTHER")]);

        tree.mark_seen(success);
        assert_eq!(tree.prune(), 2);
        assert_eq!(tree.len(), 1);

        tree.mark_seen(other);
        tree.prune();
        assert!(tree.is_empty());
    }

    #[test]
    fn children_of_pruned_nodes_are_detached() {
        let mut tree = Tree::new();
        let login = tree.add_root(node("LOGIN"));
        tree.mark_seen(login);
        tree.prune();

        let (late, attached) = tree.add_child(login, node("SUCCESS"));
        assert!(!attached);
        assert!(tree.is_empty());
        assert_eq!(tree.node(late).action_type, t("SUCCESS"));
    }

    #[test]
    fn payload_check_modes() {
        assert!(PayloadCheck::<u8>::Unchecked.accepts(Some(&1)));
        assert!(PayloadCheck::<u8>::Unchecked.accepts(None));
        assert!(PayloadCheck::<u8>::Absent.accepts(None));
        assert!(!PayloadCheck::<u8>::Absent.accepts(Some(&1)));
        assert!(PayloadCheck::Equals(1u8).accepts(Some(&1)));
        assert!(!PayloadCheck::Equals(1u8).accepts(Some(&2)));
        assert!(!PayloadCheck::Equals(1u8).accepts(None));
    }
}
