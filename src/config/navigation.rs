//! Navigation tree for UI menus: root -> groups -> modules.

use crate::config::{EntityKind, ModuleGraph};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NavNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavNode>,
}

impl NavNode {
    fn leaf(id: &str, name: &str, kind: EntityKind) -> Self {
        NavNode {
            id: id.to_string(),
            name: name.to_string(),
            kind: kind.as_str().to_string(),
            children: Vec::new(),
        }
    }
}

/// Build the tree from the root module's group links and each group's submodule links.
/// Without a root module a synthetic `app_root` node is returned. Links to missing
/// modules are logged and left out.
pub fn build_navigation(graph: &ModuleGraph) -> NavNode {
    let root = graph.modules().iter().find(|m| m.kind == EntityKind::Root);
    let mut node = match root {
        Some(r) => NavNode::leaf(&r.id, &r.name, r.kind),
        None => NavNode::leaf("app_root", "Application", EntityKind::Root),
    };
    let Some(root) = root else {
        return node;
    };

    for link in &root.group_links {
        let Some(group) = graph.get(&link.target_group_id).filter(|g| g.kind == EntityKind::Group) else {
            tracing::warn!(group = %link.target_group_id, display_name = %link.display_name, "navigation group not found");
            continue;
        };
        let mut group_node = NavNode::leaf(&group.id, &group.name, group.kind);
        for sub in &group.child_links {
            match graph
                .get(&sub.target_entity_id)
                .filter(|m| !matches!(m.kind, EntityKind::Group | EntityKind::Root))
            {
                Some(m) => group_node.children.push(NavNode::leaf(&m.id, &m.name, m.kind)),
                None => tracing::warn!(
                    module = %sub.target_entity_id,
                    group = %group.id,
                    "navigation module not found"
                ),
            }
        }
        node.children.push(group_node);
    }
    node
}
