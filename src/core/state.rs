//! 单次运行内累积的变更状态

use std::collections::HashSet;

/// 保持插入顺序的去重列表
#[derive(Debug, Clone, Default)]
pub struct OrderedSet {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl OrderedSet {
    /// 返回是否为新插入
    pub fn insert(&mut self, item: &str) -> bool {
        if !self.seen.insert(item.to_string()) {
            return false;
        }
        self.items.push(item.to_string());
        true
    }

    pub fn remove(&mut self, item: &str) -> bool {
        if !self.seen.remove(item) {
            return false;
        }
        self.items.retain(|i| i != item);
        true
    }

    pub fn contains(&self, item: &str) -> bool {
        self.seen.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.items.clone()
    }
}

/// 运行状态：每个声明 ID / 集合名至多出现在 changed 与 unchanged 之一。
/// 同一标识多次出现时，Changed 优先。
#[derive(Debug, Clone, Default)]
pub struct RunState {
    changed_declarations: OrderedSet,
    unchanged_declarations: OrderedSet,
    changed_sets: OrderedSet,
    unchanged_sets: OrderedSet,
    failures: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_declaration(&mut self, id: &str, changed: bool) {
        record(
            &mut self.changed_declarations,
            &mut self.unchanged_declarations,
            id,
            changed,
        );
    }

    pub fn record_set(&mut self, name: &str, changed: bool) {
        record(&mut self.changed_sets, &mut self.unchanged_sets, name, changed);
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn changed_declarations(&self) -> &[String] {
        self.changed_declarations.as_slice()
    }

    pub fn unchanged_declarations(&self) -> &[String] {
        self.unchanged_declarations.as_slice()
    }

    pub fn changed_sets(&self) -> &[String] {
        self.changed_sets.as_slice()
    }

    pub fn unchanged_sets(&self) -> &[String] {
        self.unchanged_sets.as_slice()
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    /// 是否需要发送通知
    pub fn has_changes(&self) -> bool {
        !self.changed_declarations.is_empty() || !self.changed_sets.is_empty()
    }
}

fn record(changed: &mut OrderedSet, unchanged: &mut OrderedSet, key: &str, is_changed: bool) {
    if is_changed {
        unchanged.remove(key);
        changed.insert(key);
    } else if !changed.contains(key) {
        unchanged.insert(key);
    }
}
