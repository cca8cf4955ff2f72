//! Repository tree nodes

use serde::Deserialize;
use serde::Serialize;

/// Kind of a tree entry, as reported by the listing endpoint's `type` field.
///
/// `"dir"` and `"folder"` are both directories. Any other value is kept
/// verbatim and treated as inert (not expandable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Dir,
    File,
    Other(String),
}

impl NodeKind {
    /// Returns `true` if nodes of this kind can be expanded.
    pub fn is_expandable(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Dir => "dir",
            Self::File => "file",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for NodeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "dir" | "folder" => Self::Dir,
            "file" => Self::File,
            _ => Self::Other(value),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One file or directory entry in the repository tree.
///
/// The `path` is slash-delimited and unique within a tree. The root
/// directory is the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Display name (last path segment).
    pub name: String,
    /// Full path from the repository root.
    pub path: String,
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

impl Node {
    /// Creates a new node.
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
        }
    }

    /// Creates a directory node.
    pub fn dir(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, NodeKind::Dir)
    }

    /// Creates a file node.
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, NodeKind::File)
    }

    /// Returns `true` for dot-prefixed entries, which are never shown.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }
}

/// Drops hidden entries from a listing, keeping backend order.
pub fn visible(nodes: Vec<Node>) -> Vec<Node> {
    nodes.into_iter().filter(|node| !node.is_hidden()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_wire() {
        let nodes: Vec<Node> = serde_json::from_str(
            r#"[
                {"name": "src", "path": "src", "type": "dir"},
                {"name": "docs", "path": "docs", "type": "folder"},
                {"name": "main.rs", "path": "src/main.rs", "type": "file"},
                {"name": "vendor", "path": "vendor", "type": "submodule"}
            ]"#,
        )
        .unwrap();

        assert_eq!(nodes[0].kind, NodeKind::Dir);
        assert_eq!(nodes[1].kind, NodeKind::Dir);
        assert_eq!(nodes[2].kind, NodeKind::File);
        assert_eq!(nodes[3].kind, NodeKind::Other("submodule".to_string()));
        assert!(!nodes[3].kind.is_expandable());
    }

    #[test]
    fn test_kind_serializes_as_type() {
        let json = serde_json::to_value(Node::dir("src", "src")).unwrap();
        assert_eq!(json["type"], "dir");
    }

    #[test]
    fn test_visible_drops_dot_entries_of_any_kind() {
        let nodes = vec![
            Node::dir(".git", ".git"),
            Node::file("README.md", "README.md"),
            Node::file(".env", ".env"),
            Node::new(".gitmodules", ".gitmodules", NodeKind::Other("x".into())),
            Node::dir("src", "src"),
        ];

        let names: Vec<_> = visible(nodes).into_iter().map(|n| n.name).collect();
        assert_eq!(names, ["README.md", "src"]);
    }
}
