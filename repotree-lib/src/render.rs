//! Tree snapshots and plain-text rendering

use std::fmt::Write;
use std::sync::Arc;

use crate::cache::LoadState;
use crate::model::format_key;
use crate::model::format_value;
use crate::model::AnalysisRecord;
use crate::model::Node;
use crate::model::RepoRef;

/// An immutable copy of the visible part of a [`RepoTree`](crate::RepoTree).
///
/// Only expanded nodes carry children or analysis. Taking a snapshot never
/// triggers a load.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    pub repo: RepoRef,
    pub root_state: LoadState,
    pub roots: Vec<SnapshotNode>,
}

/// One node of a [`TreeSnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotNode {
    pub node: Node,
    pub expanded: bool,
    pub state: LoadState,
    pub children: Vec<SnapshotNode>,
    pub analysis: Option<Arc<AnalysisRecord>>,
}

impl SnapshotNode {
    /// Returns `true` if the node is open but its content has not arrived.
    pub fn is_pending(&self) -> bool {
        self.expanded && self.state.is_loading()
    }
}

const INDENT: &str = "  ";

/// Renders a snapshot as an indented text tree.
///
/// ```text
/// acme/widgets
/// ▼ src
///   ► bin
///   main.rs
///     Lines Of Code: 120
/// ```
pub fn render_text(snapshot: &TreeSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", snapshot.repo);

    if snapshot.roots.is_empty() {
        match snapshot.root_state {
            LoadState::Unloaded | LoadState::Loading => out.push_str("Loading file tree...\n"),
            LoadState::Loaded => out.push_str("(empty)\n"),
            LoadState::Failed => out.push_str("(unavailable)\n"),
        }
        return out;
    }

    for node in &snapshot.roots {
        render_node(&mut out, node, 0);
    }
    out
}

fn render_node(out: &mut String, node: &SnapshotNode, depth: usize) {
    let indent = INDENT.repeat(depth);
    if node.node.is_dir() {
        let arrow = if node.expanded { '▼' } else { '►' };
        let _ = writeln!(out, "{}{} {}", indent, arrow, node.node.name);
    } else {
        let _ = writeln!(out, "{}{}", indent, node.node.name);
    }

    if !node.expanded {
        return;
    }

    if node.is_pending() {
        let _ = writeln!(out, "{}{}loading...", indent, INDENT);
        return;
    }

    for child in &node.children {
        render_node(out, child, depth + 1);
    }

    if let Some(analysis) = &node.analysis {
        for (key, value) in analysis.entries() {
            let _ = writeln!(
                out,
                "{}{}{}: {}",
                indent,
                INDENT,
                format_key(key),
                format_value(value)
            );
        }
    }
}
