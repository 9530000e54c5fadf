use crate::domain::DirectoryStat;
use crate::paths;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-session record of which directories are open in the tree view.
///
/// Entries are created the first time a directory shows up in a tree build
/// and are never removed, so collapsing a parent keeps the state of
/// everything below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionMemory {
    states: BTreeMap<String, bool>,
}

impl ExpansionMemory {
    pub fn get(&self, path: &str) -> Option<bool> {
        self.states.get(path).copied()
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.get(path).unwrap_or(false)
    }

    pub fn set(&mut self, path: &str, expanded: bool) {
        self.states.insert(path.to_string(), expanded);
    }

    pub fn toggle(&mut self, path: &str) -> bool {
        let next = !self.is_expanded(path);
        self.set(path, next);
        next
    }

    fn remember_default(&mut self, path: &str, default: bool) -> bool {
        *self.states.entry(path.to_string()).or_insert(default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTreeNode {
    pub stat: DirectoryStat,
    pub level: usize,
    pub expanded: bool,
    pub children: Vec<DirectoryTreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub stat: DirectoryStat,
    pub level: usize,
    pub expanded: bool,
    pub has_children: bool,
}

pub fn build_tree(
    stats: &[DirectoryStat],
    expansion: &mut ExpansionMemory,
    current_dir: &str,
) -> Vec<TreeRow> {
    let roots = build_hierarchy(stats, expansion, current_dir);
    let mut rows = Vec::new();
    for root in &roots {
        flatten_into(root, &mut rows);
    }
    rows
}

pub fn build_hierarchy(
    stats: &[DirectoryStat],
    expansion: &mut ExpansionMemory,
    current_dir: &str,
) -> Vec<DirectoryTreeNode> {
    let mut sorted: Vec<&DirectoryStat> = stats.iter().collect();
    sorted.sort_by(|a, b| {
        a.path
            .len()
            .cmp(&b.path.len())
            .then_with(|| a.path.cmp(&b.path))
    });

    let mut seen = HashSet::new();
    sorted.retain(|stat| seen.insert(paths::normalize(&stat.path)));

    let index: HashMap<String, usize> = sorted
        .iter()
        .enumerate()
        .map(|(idx, stat)| (paths::normalize(&stat.path), idx))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); sorted.len()];
    let mut roots = Vec::new();
    let mut expanded = Vec::with_capacity(sorted.len());

    for (idx, stat) in sorted.iter().enumerate() {
        let default = paths::is_strict_ancestor(&stat.path, current_dir);
        expanded.push(expansion.remember_default(&stat.path, default));

        let parent = paths::parent(&stat.path);
        match index.get(&paths::normalize(&parent)) {
            Some(&parent_idx) if !parent.is_empty() && parent_idx != idx => {
                children[parent_idx].push(idx)
            }
            _ => roots.push(idx),
        }
    }

    roots
        .into_iter()
        .map(|idx| build_node(idx, 0, &sorted, &children, &expanded))
        .collect()
}

fn build_node(
    idx: usize,
    level: usize,
    stats: &[&DirectoryStat],
    children: &[Vec<usize>],
    expanded: &[bool],
) -> DirectoryTreeNode {
    DirectoryTreeNode {
        stat: stats[idx].clone(),
        level,
        expanded: expanded[idx],
        children: children[idx]
            .iter()
            .map(|&child| build_node(child, level + 1, stats, children, expanded))
            .collect(),
    }
}

fn flatten_into(node: &DirectoryTreeNode, out: &mut Vec<TreeRow>) {
    out.push(TreeRow {
        stat: node.stat.clone(),
        level: node.level,
        expanded: node.expanded,
        has_children: !node.children.is_empty(),
    });

    if !node.expanded || node.children.is_empty() {
        return;
    }
    for child in &node.children {
        flatten_into(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use pretty_assertions::assert_eq;

    fn stat(path: &str) -> DirectoryStat {
        DirectoryStat {
            path: path.to_string(),
            command_count: 1,
            last_used: Local
                .with_ymd_and_hms(2024, 6, 12, 18, 0, 0)
                .single()
                .expect("valid time"),
            active: true,
        }
    }

    fn shape(rows: &[TreeRow]) -> Vec<(String, usize)> {
        rows.iter()
            .map(|row| (row.stat.path.clone(), row.level))
            .collect()
    }

    #[test]
    fn empty_input_gives_empty_tree() {
        let mut memory = ExpansionMemory::default();
        assert!(build_tree(&[], &mut memory, "/home").is_empty());
        assert_eq!(memory, ExpansionMemory::default());
    }

    #[test]
    fn ancestors_of_current_dir_open_by_default() {
        let stats = vec![
            stat("/home/user/project"),
            stat("/home"),
            stat("/home/user"),
        ];
        let mut memory = ExpansionMemory::default();

        let rows = build_tree(&stats, &mut memory, "/home/user/project");

        assert_eq!(
            shape(&rows),
            vec![
                ("/home".to_string(), 0),
                ("/home/user".to_string(), 1),
                ("/home/user/project".to_string(), 2),
            ]
        );
        assert_eq!(memory.get("/home"), Some(true));
        assert_eq!(memory.get("/home/user"), Some(true));
        assert_eq!(memory.get("/home/user/project"), Some(false));
    }

    #[test]
    fn collapsed_node_hides_descendants_even_if_they_are_open() {
        let stats = vec![stat("/a"), stat("/a/b"), stat("/a/b/c"), stat("/z")];
        let mut memory = ExpansionMemory::default();
        memory.set("/a", false);
        memory.set("/a/b", true);

        let rows = build_tree(&stats, &mut memory, "/");

        assert_eq!(
            shape(&rows),
            vec![("/a".to_string(), 0), ("/z".to_string(), 0)]
        );
        assert!(rows[0].has_children);
        assert!(!rows[0].expanded);
        assert_eq!(memory.get("/a/b"), Some(true));
    }

    #[test]
    fn reopening_parent_restores_child_state() {
        let stats = vec![stat("/a"), stat("/a/b"), stat("/a/b/c")];
        let mut memory = ExpansionMemory::default();
        memory.set("/a", true);
        memory.set("/a/b", true);
        assert_eq!(build_tree(&stats, &mut memory, "/").len(), 3);

        memory.toggle("/a");
        assert_eq!(build_tree(&stats, &mut memory, "/").len(), 1);

        memory.toggle("/a");
        assert_eq!(build_tree(&stats, &mut memory, "/").len(), 3);
    }

    #[test]
    fn stat_with_unknown_parent_is_promoted_to_root() {
        let stats = vec![stat("/srv"), stat("/home/user/project")];
        let mut memory = ExpansionMemory::default();

        let rows = build_tree(&stats, &mut memory, "/tmp");

        assert_eq!(
            shape(&rows),
            vec![
                ("/srv".to_string(), 0),
                ("/home/user/project".to_string(), 0),
            ]
        );
    }

    #[test]
    fn children_never_precede_parents_and_levels_step_by_one() {
        let stats = vec![
            stat("/w/x/y"),
            stat("/w"),
            stat("/w/x"),
            stat("/w/a"),
            stat("/w/x/b"),
            stat("/v"),
        ];
        let mut memory = ExpansionMemory::default();
        for s in &stats {
            memory.set(&s.path, true);
        }

        let rows = build_tree(&stats, &mut memory, "/");

        for (pos, row) in rows.iter().enumerate() {
            let parent = paths::parent(&row.stat.path);
            if let Some(parent_pos) = rows.iter().position(|r| r.stat.path == parent) {
                assert!(parent_pos < pos);
                assert_eq!(rows[parent_pos].level + 1, row.level);
            } else {
                assert_eq!(row.level, 0);
            }
        }
        assert_eq!(rows.len(), stats.len());
    }

    #[test]
    fn output_is_independent_of_input_order() {
        let forward = vec![stat("/a"), stat("/a/b"), stat("/a/c"), stat("/b")];
        let mut reversed = forward.clone();
        reversed.reverse();

        let mut m1 = ExpansionMemory::default();
        let mut m2 = ExpansionMemory::default();
        m1.set("/a", true);
        m2.set("/a", true);

        assert_eq!(
            build_tree(&forward, &mut m1, "/"),
            build_tree(&reversed, &mut m2, "/")
        );
        assert_eq!(m1, m2);
    }

    #[test]
    fn stored_choice_overrides_ancestor_default() {
        let stats = vec![stat("/home"), stat("/home/user")];
        let mut memory = ExpansionMemory::default();
        memory.set("/home", false);

        let rows = build_tree(&stats, &mut memory, "/home/user");

        assert_eq!(shape(&rows), vec![("/home".to_string(), 0)]);
    }

    #[test]
    fn hierarchy_nodes_own_their_children() {
        let stats = vec![stat("/a"), stat("/a/b"), stat("/a/c")];
        let mut memory = ExpansionMemory::default();

        let roots = build_hierarchy(&stats, &mut memory, "/");

        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].children.len(), 2);
        assert!(roots[0].children.iter().all(|child| child.level == 1));
    }

    #[test]
    fn duplicate_paths_collapse_to_one_node() {
        let stats = vec![stat("/a"), stat("/a/"), stat("/a")];
        let mut memory = ExpansionMemory::default();
        assert_eq!(build_tree(&stats, &mut memory, "/").len(), 1);
    }
}
