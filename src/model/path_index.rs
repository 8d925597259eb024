//! 路径键索引：`祖先分组名.….叶子名` → 叶子，导出与导入共用

use std::collections::HashMap;

use crate::model::shadow_tree::{GroupNode, LeafNode};

/// 保持插入顺序的路径键映射；重复键覆盖叶子但保留首次出现的位置
#[derive(Debug, Default)]
pub struct PathKeyIndex<'a> {
    entries: Vec<(String, &'a LeafNode)>,
    positions: HashMap<String, usize>,
}

impl<'a> PathKeyIndex<'a> {
    /// 从根分组构建索引
    pub fn build(root: &'a GroupNode) -> Self {
        let mut index = Self::default();
        index.fill("", root);
        index
    }

    fn fill(&mut self, prefix: &str, group: &'a GroupNode) {
        let name = if prefix.is_empty() {
            group.name().to_string()
        } else {
            format!("{}.{}", prefix, group.name())
        };
        for leaf in group.leaves() {
            self.insert(format!("{}.{}", name, leaf.name()), leaf);
        }
        for child in group.groups() {
            self.fill(&name, child);
        }
    }

    fn insert(&mut self, key: String, leaf: &'a LeafNode) {
        if let Some(&pos) = self.positions.get(&key) {
            tracing::debug!("路径键重复，后者覆盖前者: {}", key);
            self.entries[pos].1 = leaf;
            return;
        }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, leaf));
    }

    pub fn get(&self, key: &str) -> Option<&'a LeafNode> {
        self.positions.get(key).map(|&pos| self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &'a LeafNode)> + '_ {
        self.entries.iter().map(|(key, leaf)| (key.as_str(), *leaf))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
