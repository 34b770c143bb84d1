//! Per-session checkpoint trees

use crate::checkpoint::Checkpoint;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Checkpoint tree of one session
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub session_id: String,
    pub total_checkpoints: usize,
    /// Distinct non-empty branch labels, sorted
    pub branches: Vec<String>,
    /// Root nodes, oldest first
    pub tree: Vec<TimelineNode>,
}

/// A checkpoint and its descendants
#[derive(Debug, Clone, Serialize)]
pub struct TimelineNode {
    pub checkpoint: Checkpoint,
    /// Direct children, oldest first
    pub children: Vec<TimelineNode>,
}

impl Timeline {
    /// Build the tree of `session_id` from a list of checkpoints
    ///
    /// A checkpoint is a root when it has no parent or its parent is not in
    /// this session (forks point at a checkpoint of another session). Siblings
    /// are ordered by timestamp, then ID.
    pub fn build(session_id: &str, checkpoints: &[Checkpoint]) -> Self {
        let mut arena: Vec<&Checkpoint> = checkpoints
            .iter()
            .filter(|c| c.session_id == session_id)
            .collect();
        arena.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.checkpoint_id.cmp(&b.checkpoint_id))
        });

        let by_id: HashMap<&str, usize> = arena
            .iter()
            .enumerate()
            .map(|(idx, cp)| (cp.checkpoint_id.as_str(), idx))
            .collect();

        // Arena is sorted, so child lists and roots come out sorted too
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); arena.len()];
        let mut roots = Vec::new();
        for (idx, cp) in arena.iter().enumerate() {
            let parent = cp
                .parent_checkpoint_id
                .as_deref()
                .and_then(|p| by_id.get(p).copied());
            match parent {
                Some(p) if p != idx => children[p].push(idx),
                _ => roots.push(idx),
            }
        }

        let mut visited = vec![false; arena.len()];
        let mut tree: Vec<TimelineNode> = roots
            .iter()
            .map(|&idx| build_node(idx, &arena, &children, &mut visited))
            .collect();

        // Only a hand-edited index can contain a parent cycle; surface those
        // checkpoints as roots instead of dropping them
        for idx in 0..arena.len() {
            if !visited[idx] {
                tree.push(build_node(idx, &arena, &children, &mut visited));
            }
        }
        tree.sort_by(|a, b| {
            a.checkpoint
                .timestamp
                .cmp(&b.checkpoint.timestamp)
                .then_with(|| a.checkpoint.checkpoint_id.cmp(&b.checkpoint.checkpoint_id))
        });

        let branches: BTreeSet<String> = arena
            .iter()
            .filter_map(|cp| cp.branch_name.as_deref())
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            session_id: session_id.to_string(),
            total_checkpoints: arena.len(),
            branches: branches.into_iter().collect(),
            tree,
        }
    }

    /// Number of nodes in the forest
    pub fn len(&self) -> usize {
        self.walk().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Pre-order traversal as `(depth, checkpoint)` pairs
    pub fn walk(&self) -> Vec<(usize, &Checkpoint)> {
        let mut out = Vec::with_capacity(self.total_checkpoints);
        let mut stack: Vec<(usize, &TimelineNode)> =
            self.tree.iter().rev().map(|node| (0, node)).collect();

        while let Some((depth, node)) = stack.pop() {
            out.push((depth, &node.checkpoint));
            stack.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        }
        out
    }

    /// Checkpoints on `branch` plus unlabeled (main line) checkpoints
    pub fn on_branch(&self, branch: &str) -> Vec<&Checkpoint> {
        self.walk()
            .into_iter()
            .map(|(_, cp)| cp)
            .filter(|cp| match cp.branch_name.as_deref() {
                None | Some("") => true,
                Some(name) => name == branch,
            })
            .collect()
    }
}

fn build_node(
    idx: usize,
    arena: &[&Checkpoint],
    children: &[Vec<usize>],
    visited: &mut [bool],
) -> TimelineNode {
    visited[idx] = true;
    let mut node = TimelineNode {
        checkpoint: arena[idx].clone(),
        children: Vec::with_capacity(children[idx].len()),
    };
    for &child in &children[idx] {
        if !visited[child] {
            node.children.push(build_node(child, arena, children, visited));
        }
    }
    node
}
