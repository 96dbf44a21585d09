use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error type for parsing a path from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid task path {0:?}: expected `/` or dotted indices like 0.2.1")]
pub struct PathParseError(String);

/// Zero-based indices locating a task by descending from the forest root
/// through `children`. The empty path is the forest root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskPath(Vec<usize>);

impl TaskPath {
    pub fn root() -> Self {
        TaskPath(Vec::new())
    }

    pub fn new(indices: Vec<usize>) -> Self {
        TaskPath(indices)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Nesting depth (0 = forest root, 1 = top-level task)
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Index within the parent's children; `None` for the root.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn parent(&self) -> Option<TaskPath> {
        self.0
            .split_last()
            .map(|(_, parent)| TaskPath(parent.to_vec()))
    }

    pub fn child(&self, index: usize) -> TaskPath {
        let mut indices = self.0.clone();
        indices.push(index);
        TaskPath(indices)
    }

    /// The path of the sibling at `index` under the same parent.
    pub fn with_last(&self, index: usize) -> TaskPath {
        let mut indices = self.0.clone();
        match indices.last_mut() {
            Some(last) => *last = index,
            None => indices.push(index),
        }
        TaskPath(indices)
    }

    /// True when `self` is `prefix` or lies inside its subtree.
    pub fn starts_with(&self, prefix: &TaskPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl From<Vec<usize>> for TaskPath {
    fn from(indices: Vec<usize>) -> Self {
        TaskPath(indices)
    }
}

impl<const N: usize> From<[usize; N]> for TaskPath {
    fn from(indices: [usize; N]) -> Self {
        TaskPath(indices.to_vec())
    }
}

impl fmt::Display for TaskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}

impl FromStr for TaskPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "/" {
            return Ok(TaskPath::root());
        }
        s.split('.')
            .map(|part| part.parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map(TaskPath)
            .map_err(|_| PathParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse() {
        assert_eq!(TaskPath::from([0, 2, 1]).to_string(), "0.2.1");
        assert_eq!(TaskPath::root().to_string(), "/");
        assert_eq!("0.2.1".parse::<TaskPath>().unwrap(), TaskPath::from([0, 2, 1]));
        assert_eq!("/".parse::<TaskPath>().unwrap(), TaskPath::root());
        assert!("0..1".parse::<TaskPath>().is_err());
        assert!("a.b".parse::<TaskPath>().is_err());
        assert!("-1".parse::<TaskPath>().is_err());
    }

    #[test]
    fn parent_child_and_siblings() {
        let path = TaskPath::from([3, 1]);
        assert_eq!(path.parent(), Some(TaskPath::from([3])));
        assert_eq!(TaskPath::from([3]).parent(), Some(TaskPath::root()));
        assert_eq!(TaskPath::root().parent(), None);
        assert_eq!(path.child(4), TaskPath::from([3, 1, 4]));
        assert_eq!(path.with_last(2), TaskPath::from([3, 2]));
        assert_eq!(path.last(), Some(1));
        assert_eq!(path.depth(), 2);
    }

    #[test]
    fn prefix_detection() {
        let a = TaskPath::from([1]);
        assert!(TaskPath::from([1]).starts_with(&a));
        assert!(TaskPath::from([1, 0, 3]).starts_with(&a));
        assert!(!TaskPath::from([10]).starts_with(&a));
        assert!(!TaskPath::from([0, 1]).starts_with(&a));
        assert!(a.starts_with(&TaskPath::root()));
    }

    #[test]
    fn serializes_as_index_array() {
        let json = serde_json::to_string(&TaskPath::from([0, 2])).unwrap();
        assert_eq!(json, "[0,2]");
    }
}
