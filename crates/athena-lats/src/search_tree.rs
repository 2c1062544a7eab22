// ABOUTME: Arena-backed search tree for the LATS engine
// ABOUTME: Implements UCB1 scoring and leaf-to-root backpropagation over integer node ids

use thiserror::Error;

pub type NodeId = usize;

/// Score at or above which a node is considered promising.
///
/// Independent of `LatsConfig::quality_threshold`.
pub const PROMISING_SCORE: f64 = 0.65;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchTreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid node operation: {0}")]
    InvalidOperation(String),
}

/// A single node of the search tree.
///
/// Statistics (`visits`, `value`) only change through
/// [`SearchTree::backpropagate`]; the score is fixed at creation.
#[derive(Debug, Clone)]
pub struct TreeNode<S> {
    id: NodeId,
    parent_id: Option<NodeId>,
    children: Vec<NodeId>,
    state: Option<S>,
    visits: u32,
    value: f64,
    score: f64,
    reflection: String,
    depth: usize,
    is_terminal: bool,
}

impl<S> TreeNode<S> {
    fn new_root() -> Self {
        Self {
            id: 0,
            parent_id: None,
            children: Vec::new(),
            state: None,
            visits: 0,
            value: 0.0,
            score: 0.0,
            reflection: String::new(),
            depth: 0,
            is_terminal: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Candidate payload. `None` for the root, or once taken out of the tree.
    pub fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }

    pub fn visits(&self) -> u32 {
        self.visits
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn reflection(&self) -> &str {
        &self.reflection
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    /// Mean observed value, 0.0 for unvisited nodes.
    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value / self.visits as f64
        }
    }

    pub fn is_promising(&self) -> bool {
        self.score >= PROMISING_SCORE
    }
}

/// Rooted tree stored as an arena; the stateless root always lives at id 0.
#[derive(Debug, Clone)]
pub struct SearchTree<S> {
    nodes: Vec<TreeNode<S>>,
}

impl<S> SearchTree<S> {
    /// Create a tree holding only the stateless root (depth 0).
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::new_root()],
        }
    }

    pub fn root_id(&self) -> NodeId {
        0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a freshly scored candidate under `parent_id`.
    ///
    /// The node starts with one visit carrying its own score, matching the
    /// single evaluation that produced it.
    pub fn add_scored_child(
        &mut self,
        parent_id: NodeId,
        state: S,
        score: f64,
    ) -> Result<NodeId, SearchTreeError> {
        if !(0.0..=1.0).contains(&score) {
            return Err(SearchTreeError::InvalidOperation(format!(
                "score {} outside [0, 1]",
                score
            )));
        }

        let parent_depth = self.get_node(parent_id)?.depth;
        let node_id = self.nodes.len();

        self.nodes.push(TreeNode {
            id: node_id,
            parent_id: Some(parent_id),
            children: Vec::new(),
            state: Some(state),
            visits: 1,
            value: score,
            score,
            reflection: String::new(),
            depth: parent_depth + 1,
            is_terminal: false,
        });
        self.get_node_mut(parent_id)?.children.push(node_id);

        Ok(node_id)
    }

    pub fn get_node(&self, id: NodeId) -> Result<&TreeNode<S>, SearchTreeError> {
        self.nodes.get(id).ok_or(SearchTreeError::NodeNotFound(id))
    }

    fn get_node_mut(&mut self, id: NodeId) -> Result<&mut TreeNode<S>, SearchTreeError> {
        self.nodes
            .get_mut(id)
            .ok_or(SearchTreeError::NodeNotFound(id))
    }

    pub fn get_parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent_id)
    }

    /// Attach critique text produced by a reflection pass.
    pub fn set_reflection(
        &mut self,
        id: NodeId,
        reflection: impl Into<String>,
    ) -> Result<(), SearchTreeError> {
        self.get_node_mut(id)?.reflection = reflection.into();
        Ok(())
    }

    /// Move the candidate payload out of a node.
    pub fn take_state(&mut self, id: NodeId) -> Option<S> {
        self.nodes.get_mut(id).and_then(|node| node.state.take())
    }

    /// Walk from `id` to the root adding one visit and `value` at every node,
    /// the node itself included.
    pub fn backpropagate(&mut self, id: NodeId, value: f64) -> Result<(), SearchTreeError> {
        if value < 0.0 {
            return Err(SearchTreeError::InvalidOperation(format!(
                "cannot backpropagate negative value {}",
                value
            )));
        }

        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get_node_mut(node_id)?;
            node.visits += 1;
            node.value += value;
            current = node.parent_id;
        }
        Ok(())
    }

    /// UCB1 score: `value/visits + c * sqrt(ln(N_parent) / visits)`.
    ///
    /// Unvisited nodes, and nodes whose parent is unvisited, return
    /// `f64::INFINITY` so they are explored first. The root uses its own visit
    /// count in place of a parent's.
    pub fn ucb1(&self, id: NodeId, exploration_weight: f64) -> Result<f64, SearchTreeError> {
        let node = self.get_node(id)?;
        if node.visits == 0 {
            return Ok(f64::INFINITY);
        }

        let parent_visits = match node.parent_id {
            Some(parent_id) => self.get_node(parent_id)?.visits,
            None => node.visits,
        };
        if parent_visits == 0 {
            return Ok(f64::INFINITY);
        }

        let exploit = node.value / node.visits as f64;
        let explore =
            exploration_weight * ((parent_visits as f64).ln() / node.visits as f64).sqrt();

        Ok(exploit + explore)
    }
}

impl<S> Default for SearchTree<S> {
    fn default() -> Self {
        Self::new()
    }
}
