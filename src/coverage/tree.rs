//! Nested test containers

use serde::Deserialize;

/// A single test or a suite of further nodes
///
/// Deserializes from JSON where a string is a test id and an array is a
/// suite: `["a.T.test_1", ["a.U.test_2", "a.U.test_3"]]`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TestNode {
    Case(String),
    Suite(Vec<TestNode>),
}

impl TestNode {
    /// Leaf test ids in depth-first order
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TestNode::Case(id) => out.push(id),
            TestNode::Suite(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaves_depth_first() {
        let tree: TestNode =
            serde_json::from_str(r#"["a", ["b", ["c"]], [], "d"]"#).unwrap();
        assert_eq!(tree.leaves(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_single_case() {
        let tree = TestNode::Case("only".to_string());
        assert_eq!(tree.leaves(), vec!["only"]);
    }
}
