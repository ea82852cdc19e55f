//! Text import and export.
//!
//! One line per node, in position order starting at 1:
//! ```text
//! n A0 K1 A1 K2 A2 ... Kn An
//! ```
//! `n` is the key count, `A0..An` child positions (0 = none) and `K1..Kn`
//! strictly increasing keys. Blank lines are skipped and do not take a
//! position.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::common::config::{check_order, Durability};
use crate::common::{Error, Key, NodeId, Result};
use crate::storage::block::{Block, Node, TreeHeader};
use crate::storage::PageStore;

use super::MWayTree;

/// Text written for an abandoned position.
const ABANDONED_LINE: &str = "0 0";

/// A parsed node and the 1-based source line it came from.
struct Parsed {
    line: usize,
    node: Node,
}

/// Parse and validate a whole text description.
///
/// The first node is taken as the root. Checks, in order: per-line shape
/// (`0 <= n <= order - 1`, exactly `2n + 2` integer tokens, strictly
/// increasing keys), child positions within `[0, total]`, and that every
/// node is reachable from position 1 through exactly one parent.
///
/// # Errors
/// Returns `Error::Format` naming the offending source line.
pub(crate) fn parse_nodes(text: &str, order: usize) -> Result<Vec<Node>> {
    let mut parsed = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let line = index + 1;
        parsed.push(Parsed {
            line,
            node: parse_line(raw, line, order)?,
        });
    }

    let total = parsed.len();
    for entry in &parsed {
        if let Some(child) = entry.node.children().iter().find(|c| c.0 as usize > total) {
            return Err(Error::format(
                entry.line,
                format!("child position {} exceeds node count {}", child.0, total),
            ));
        }
    }

    check_reachability(&parsed)?;
    Ok(parsed.into_iter().map(|entry| entry.node).collect())
}

fn parse_line(raw: &str, line: usize, order: usize) -> Result<Node> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();

    let count: i64 = parse_token(tokens[0], line)?;
    if count < 0 || count as usize > order - 1 {
        return Err(Error::format(
            line,
            format!("key count {} outside [0, {}]", count, order - 1),
        ));
    }
    let count = count as usize;

    let expected = 2 * count + 2;
    if tokens.len() != expected {
        return Err(Error::format(
            line,
            format!("expected {} tokens, found {}", expected, tokens.len()),
        ));
    }

    let mut keys: Vec<Key> = Vec::with_capacity(count);
    let mut children = Vec::with_capacity(count + 1);
    children.push(NodeId(parse_token(tokens[1], line)?));
    for pair in tokens[2..].chunks(2) {
        let key: Key = parse_token(pair[0], line)?;
        if keys.last().is_some_and(|&prev| prev >= key) {
            return Err(Error::format(line, "keys not strictly increasing"));
        }
        keys.push(key);
        children.push(NodeId(parse_token(pair[1], line)?));
    }

    Ok(Node::from_parts(keys, children))
}

fn parse_token<T: std::str::FromStr>(token: &str, line: usize) -> Result<T> {
    token
        .parse()
        .map_err(|_| Error::format(line, format!("invalid integer '{}'", token)))
}

/// Breadth-first walk from position 1; every node must be visited once.
fn check_reachability(parsed: &[Parsed]) -> Result<()> {
    if parsed.is_empty() {
        return Ok(());
    }

    let mut visited = vec![false; parsed.len() + 1];
    let mut queue = VecDeque::from([1usize]);
    visited[1] = true;

    while let Some(pos) = queue.pop_front() {
        let entry = &parsed[pos - 1];
        for child in entry.node.children().iter().filter(|c| !c.is_null()) {
            let child = child.0 as usize;
            if visited[child] {
                return Err(Error::format(
                    entry.line,
                    format!("node {} referenced more than once", child),
                ));
            }
            visited[child] = true;
            queue.push_back(child);
        }
    }

    match (1..=parsed.len()).find(|&pos| !visited[pos]) {
        Some(pos) => Err(Error::format(
            parsed[pos - 1].line,
            format!("node {} not reachable from the root", pos),
        )),
        None => Ok(()),
    }
}

impl MWayTree {
    /// Build an index file from a text description.
    ///
    /// The whole input is validated before `bin_path` is touched; if writing
    /// fails part way the partial file is removed.
    ///
    /// # Errors
    /// - `Error::InvalidOrder` for an unsupported order
    /// - `Error::Io` if either file cannot be read or written
    /// - `Error::Format` if the text is malformed
    pub fn create_from_text<P, Q>(text_path: P, bin_path: Q, order: usize) -> Result<()>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let order = check_order(order)?;
        let text = fs::read_to_string(text_path.as_ref())?;
        let nodes = parse_nodes(&text, order)?;

        if let Err(e) = write_index(bin_path.as_ref(), order, &nodes) {
            let _ = fs::remove_file(bin_path.as_ref());
            return Err(e);
        }

        info!(
            source = %text_path.as_ref().display(),
            path = %bin_path.as_ref().display(),
            order,
            nodes = nodes.len(),
            "imported index"
        );
        Ok(())
    }

    /// Write every position as one text line, abandoned slots as `0 0`.
    ///
    /// Lines follow file positions, not tree shape. Import takes line 1 as
    /// the root and rejects unreachable lines, so the output re-imports only
    /// while the root is still at position 1 and no slot has been abandoned.
    /// A root split appends the new root at the end instead of moving it to
    /// position 1.
    pub fn export_to_text<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.store.reset_stats();
        let mut out = BufWriter::new(File::create(path.as_ref())?);

        for pos in 1..=self.store.node_count() {
            let id = NodeId::new(pos);
            match self.store.read_block(id)? {
                Block::Node(node) => writeln!(out, "{}", node)?,
                Block::Abandoned => writeln!(out, "{}", ABANDONED_LINE)?,
                Block::Header(_) => {
                    return Err(Error::corrupt(pos, "header sentinel inside the tree"))
                }
            }
        }

        out.flush()?;
        Ok(())
    }
}

fn write_index(path: &Path, order: usize, nodes: &[Node]) -> Result<()> {
    let root = if nodes.is_empty() {
        NodeId::NULL
    } else {
        NodeId::new(1)
    };

    let mut store = PageStore::create(path, Durability::Flush)?;
    store.write_header(&TreeHeader::new(order, root))?;
    for node in nodes {
        store.append_node(node)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::TreeConfig;
    use tempfile::tempdir;

    fn format_line(result: Result<Vec<Node>>) -> usize {
        match result {
            Err(Error::Format { line, .. }) => line,
            other => panic!("expected a format error, got {:?}", other.map(|n| n.len())),
        }
    }

    #[test]
    fn test_parse_valid_tree() {
        let nodes = parse_nodes("1 2 20 3\n1 0 10 0\n1 0 30 0\n", 3).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].keys(), &[20]);
        assert_eq!(nodes[0].children(), &[NodeId::new(2), NodeId::new(3)]);
        assert!(nodes[1].is_leaf());
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let nodes = parse_nodes("\n1 2 20 3\n\n1 0 10 0\n   \n1 0 30 0", 3).unwrap();
        assert_eq!(nodes.len(), 3);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_nodes("", 3).unwrap().is_empty());
    }

    #[test]
    fn test_child_beyond_total_is_rejected() {
        assert_eq!(format_line(parse_nodes("2 5 10 6 20 7", 5)), 1);
    }

    #[test]
    fn test_too_many_keys_is_rejected() {
        assert_eq!(format_line(parse_nodes("3 0 1 0 2 0 3 0", 3)), 1);
        assert_eq!(format_line(parse_nodes("-1 0", 3)), 1);
    }

    #[test]
    fn test_token_count_must_match() {
        assert_eq!(format_line(parse_nodes("1 0 10 0 99", 3)), 1);
        assert_eq!(format_line(parse_nodes("2 0 10 0", 5)), 1);
    }

    #[test]
    fn test_keys_must_increase() {
        assert_eq!(format_line(parse_nodes("1 0 5 0\n\n2 0 9 0 9 0", 5)), 3);
    }

    #[test]
    fn test_non_integer_token() {
        assert_eq!(format_line(parse_nodes("1 0 ten 0", 3)), 1);
        assert_eq!(format_line(parse_nodes("1 -2 10 0", 3)), 1);
    }

    #[test]
    fn test_unreachable_node() {
        // node 3 is never referenced
        assert_eq!(format_line(parse_nodes("1 0 10 2\n1 0 20 0\n1 0 30 0", 3)), 3);
    }

    #[test]
    fn test_shared_child() {
        assert_eq!(format_line(parse_nodes("2 2 10 2 20 0\n1 0 5 0", 5)), 1);
    }

    #[test]
    fn test_root_cannot_be_a_child() {
        assert_eq!(format_line(parse_nodes("1 0 10 1", 3)), 1);
    }

    #[test]
    fn test_import_then_open() {
        let dir = tempdir().unwrap();
        let text = dir.path().join("tree.txt");
        let bin = dir.path().join("tree.bin");
        fs::write(&text, "1 2 20 3\n1 0 10 0\n1 0 30 0\n").unwrap();

        MWayTree::create_from_text(&text, &bin, 3).unwrap();
        let mut tree = MWayTree::open(&bin, TreeConfig::new(3).unwrap()).unwrap();
        assert_eq!(tree.root(), NodeId::new(1));
        assert_eq!(tree.node_count(), 3);
        assert!(tree.search(30).unwrap().found);
        assert!(tree.verify());
    }

    #[test]
    fn test_failed_import_writes_nothing() {
        let dir = tempdir().unwrap();
        let text = dir.path().join("tree.txt");
        let bin = dir.path().join("tree.bin");
        fs::write(&text, "2 5 10 6 20 7\n").unwrap();

        assert!(matches!(
            MWayTree::create_from_text(&text, &bin, 5),
            Err(Error::Format { line: 1, .. })
        ));
        assert!(!bin.exists());
    }

    #[test]
    fn test_import_missing_text_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            MWayTree::create_from_text(dir.path().join("none.txt"), dir.path().join("t.bin"), 3),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_empty_text_gives_empty_tree() {
        let dir = tempdir().unwrap();
        let text = dir.path().join("tree.txt");
        let bin = dir.path().join("tree.bin");
        fs::write(&text, "\n").unwrap();

        MWayTree::create_from_text(&text, &bin, 4).unwrap();
        let tree = MWayTree::open(&bin, TreeConfig::new(4).unwrap()).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_export_after_root_split_follows_positions() {
        let dir = tempdir().unwrap();
        let text = dir.path().join("tree.txt");
        let bin = dir.path().join("tree.bin");
        let out = dir.path().join("out.txt");
        fs::write(&text, "1 0 10 0\n").unwrap();
        MWayTree::create_from_text(&text, &bin, 3).unwrap();

        let mut tree = MWayTree::open(&bin, TreeConfig::new(3).unwrap()).unwrap();
        tree.insert(20).unwrap();
        tree.insert(30).unwrap();
        tree.export_to_text(&out).unwrap();
        assert_eq!(tree.root(), NodeId::new(3));

        let exported = fs::read_to_string(&out).unwrap();
        assert_eq!(exported, "1 0 10 0\n1 0 30 0\n1 1 20 2\n");

        // line 1 is no longer the root, so the export does not re-import
        assert!(matches!(
            MWayTree::create_from_text(&out, dir.path().join("again.bin"), 3),
            Err(Error::Format { line: 2, .. })
        ));
    }

    #[test]
    fn test_export_writes_abandoned_slots() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("tree.bin");
        let out = dir.path().join("out.txt");

        let mut tree = MWayTree::create(&bin, TreeConfig::new(3).unwrap()).unwrap();
        for key in [10, 20, 30] {
            tree.insert(key).unwrap();
        }
        tree.delete(20).unwrap();
        tree.export_to_text(&out).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        assert_eq!(text, "2 0 10 0 30 0\n0 0\n0 0\n");
        assert_eq!(tree.io_stats().reads, 3);
        assert_eq!(tree.io_stats().writes, 0);
    }
}
