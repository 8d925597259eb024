//! 影子树（Shadow Tree）：从宿主对象图派生的可翻译叶子/分组视图
//!
//! 树只保存字段句柄与结构，不复制文本；每次范围或过滤条件变化时整体重建。

use std::{cmp::Ordering, collections::HashMap, fmt};

use crate::model::field::{FieldHandle, DEFAULT_LOCALE, DEFAULT_LOCALE_LABEL};
use crate::model::host::{
    as_choice_list, HostObject, HostRef, PropertyDescriptor, SchemaReflector, CHOICE_TEXT_PROPERTY,
};

/// 构建树所需的上下文
#[derive(Clone, Copy)]
pub struct TreeContext<'a> {
    pub reflector: &'a dyn SchemaReflector,
    /// 属性名 → 显示名
    pub labels: &'a HashMap<String, String>,
    pub show_all_strings: bool,
    pub read_only: bool,
    pub sort_by_name: bool,
}

impl<'a> TreeContext<'a> {
    pub fn new(reflector: &'a dyn SchemaReflector, labels: &'a HashMap<String, String>) -> Self {
        Self {
            reflector,
            labels,
            show_all_strings: false,
            read_only: false,
            sort_by_name: false,
        }
    }

    /// 属性名的显示文本，未配置时就是属性名本身
    pub fn property_label(&self, name: &str) -> String {
        self.labels.get(name).cloned().unwrap_or_else(|| name.to_string())
    }
}

/// 叶子：包装一个可本地化字段
#[derive(Clone)]
pub struct LeafNode {
    name: String,
    field: FieldHandle,
    default_value: String,
    custom_text: Option<String>,
    label: String,
    read_only: bool,
}

impl LeafNode {
    pub fn new(name: impl Into<String>, field: FieldHandle, default_value: impl Into<String>, ctx: &TreeContext<'_>) -> Self {
        let name = name.into();
        Self {
            label: ctx.property_label(&name),
            name,
            field,
            default_value: default_value.into(),
            custom_text: None,
            read_only: ctx.read_only,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    pub fn custom_text(&self) -> Option<&str> {
        self.custom_text.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// 显示文本：自定义文本优先，否则为名称的显示名
    pub fn display_text(&self) -> &str {
        self.custom_text.as_deref().unwrap_or(&self.label)
    }

    /// 底层字段句柄（共享，不复制）
    pub fn field(&self) -> &FieldHandle {
        &self.field
    }

    pub fn text(&self, locale: &str) -> String {
        self.field.borrow().text(locale)
    }

    /// 写穿到底层字段
    pub fn set_text(&self, locale: &str, value: Option<&str>) {
        self.field.borrow_mut().set_text(locale, value);
    }

    /// 收集字段当前持有的语言键（跳过默认语言与重复项）
    pub fn fill_locales(&self, locales: &mut Vec<String>) {
        for key in self.locale_keys() {
            if key.is_empty() || key == DEFAULT_LOCALE_LABEL || locales.contains(&key) {
                continue;
            }
            locales.push(key);
        }
    }

    fn locale_keys(&self) -> Vec<String> {
        let field = self.field.borrow();
        if let Some(keys) = field.known_locales() {
            return keys;
        }
        match field.raw_json() {
            serde_json::Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// 将某语言文本提升为默认文本并清除该语言
    pub fn merge_locale_with_default(&self, locale: &str) {
        let text = self.text(locale);
        if text.is_empty() {
            return;
        }
        let mut field = self.field.borrow_mut();
        field.set_text(DEFAULT_LOCALE, Some(&text));
        field.set_text(locale, None);
    }
}

impl fmt::Debug for LeafNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafNode")
            .field("name", &self.name)
            .field("default_value", &self.default_value)
            .field("custom_text", &self.custom_text)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

/// 分组背后的宿主
#[derive(Clone)]
pub enum GroupHost {
    /// 普通对象：反射属性
    Object(HostRef),
    /// 选项列表：每个元素一个叶子
    Choices(Vec<HostRef>),
}

/// 分组的子项（封闭和类型）
#[derive(Debug, Clone)]
pub enum TreeItem {
    Leaf(LeafNode),
    Group(GroupNode),
}

impl TreeItem {
    pub fn name(&self) -> &str {
        match self {
            TreeItem::Leaf(leaf) => leaf.name(),
            TreeItem::Group(group) => group.name(),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, TreeItem::Group(_))
    }

    fn fill_locales(&self, locales: &mut Vec<String>) {
        match self {
            TreeItem::Leaf(leaf) => leaf.fill_locales(locales),
            TreeItem::Group(group) => group.fill_locales(locales),
        }
    }

    fn merge_locale_with_default(&self, locale: &str) {
        match self {
            TreeItem::Leaf(leaf) => leaf.merge_locale_with_default(locale),
            TreeItem::Group(group) => group.merge_locale_with_default(locale),
        }
    }
}

/// 分组：包装一个宿主对象，递归派生叶子和子分组
#[derive(Clone)]
pub struct GroupNode {
    name: String,
    text: String,
    host: GroupHost,
    items: Vec<TreeItem>,
    is_root: bool,
    pub expanded: bool,
    pub show_header: bool,
}

impl GroupNode {
    /// 构建分组及其整个子树；`text` 为空时使用名称
    pub fn new(name: impl Into<String>, host: GroupHost, ctx: &TreeContext<'_>, text: Option<String>) -> Self {
        let name = name.into();
        let mut group = Self {
            text: text.filter(|t| !t.is_empty()).unwrap_or_else(|| name.clone()),
            name,
            host,
            items: Vec::new(),
            is_root: false,
            expanded: false,
            show_header: true,
        };
        group.fill_items(ctx);
        group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn host(&self) -> &GroupHost {
        &self.host
    }

    pub fn items(&self) -> &[TreeItem] {
        &self.items
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn set_as_root(&mut self) {
        self.is_root = true;
        self.expanded = true;
    }

    /// 直接子叶子
    pub fn leaves(&self) -> impl Iterator<Item = &LeafNode> {
        self.items.iter().filter_map(|item| match item {
            TreeItem::Leaf(leaf) => Some(leaf),
            TreeItem::Group(_) => None,
        })
    }

    /// 直接子分组
    pub fn groups(&self) -> impl Iterator<Item = &GroupNode> {
        self.items.iter().filter_map(|item| match item {
            TreeItem::Group(group) => Some(group),
            TreeItem::Leaf(_) => None,
        })
    }

    pub fn item_by_name(&self, name: &str) -> Option<&TreeItem> {
        self.items.iter().find(|item| item.name() == name)
    }

    /// 子树中是否存在任何叶子
    pub fn has_items(&self) -> bool {
        self.leaves().next().is_some() || self.groups().any(GroupNode::has_items)
    }

    pub fn fill_locales(&self, locales: &mut Vec<String>) {
        for item in &self.items {
            item.fill_locales(locales);
        }
    }

    /// 深度优先地对整棵子树执行默认语言合并
    pub fn merge_locale_with_default(&self, locale: &str) {
        for item in &self.items {
            item.merge_locale_with_default(locale);
        }
    }

    pub fn expand_all(&mut self) {
        self.expand_collapse_all(true);
    }

    pub fn collapse_all(&mut self) {
        self.expand_collapse_all(false);
    }

    fn expand_collapse_all(&mut self, is_expand: bool) {
        if !self.is_root {
            self.expanded = is_expand;
        }
        for item in &mut self.items {
            if let TreeItem::Group(group) = item {
                group.expand_collapse_all(is_expand);
            }
        }
        self.keep_on_group_expanded();
    }

    fn fill_items(&mut self, ctx: &TreeContext<'_>) {
        match self.host.clone() {
            GroupHost::Choices(choices) => self.fill_choice_items(&choices, ctx),
            GroupHost::Object(obj) => self.fill_object_items(obj.as_ref(), ctx),
        }
        if ctx.sort_by_name {
            self.sort_items();
        }
        self.keep_on_group_expanded();
    }

    fn fill_object_items(&mut self, obj: &dyn HostObject, ctx: &TreeContext<'_>) {
        for property in ctx.reflector.localizable_properties(obj) {
            if let Some(leaf) = Self::create_leaf(obj, &property, ctx) {
                self.items.push(TreeItem::Leaf(leaf));
            }
        }
        for (property, items) in ctx.reflector.array_properties(obj) {
            if let Some(choices) = as_choice_list(&items) {
                let objs = choices.into_iter().map(|(obj, _)| obj).collect();
                let label = ctx.property_label(&property);
                let group = GroupNode::new(property, GroupHost::Choices(objs), ctx, Some(label));
                self.push_group(group);
            } else {
                self.create_groups(&property, &items, ctx);
            }
        }
    }

    fn create_groups(&mut self, property: &str, items: &[Option<HostRef>], ctx: &TreeContext<'_>) {
        for (index, item) in items.iter().enumerate() {
            let Some(obj) = item else { continue };
            let (name, text) = match obj.name().filter(|n| !n.is_empty()) {
                Some(name) => (name.to_string(), ctx.property_label(name)),
                None => (
                    format!("{}[{}]", property, index),
                    format!("{}[{}]", ctx.property_label(property), index),
                ),
            };
            let group = GroupNode::new(name, GroupHost::Object(obj.clone()), ctx, Some(text));
            self.push_group(group);
        }
    }

    fn push_group(&mut self, group: GroupNode) {
        if group.has_items() {
            self.items.push(TreeItem::Group(group));
        } else {
            tracing::debug!("分组 {} 无可翻译字段，已剪枝", group.name);
        }
    }

    fn fill_choice_items(&mut self, choices: &[HostRef], ctx: &TreeContext<'_>) {
        for obj in choices {
            let Some(parts) = obj.choice() else { continue };
            let can_add = ctx.show_all_strings || !parts.text.borrow().is_empty() || !looks_numeric(&parts.value);
            if !can_add {
                continue;
            }
            let text_leaf = LeafNode::new(parts.value.clone(), parts.text, parts.value.clone(), ctx);
            let extras = Self::choice_extra_leaves(obj.as_ref(), &parts.value, &text_leaf, ctx);
            self.items.push(TreeItem::Leaf(text_leaf));
            self.items.extend(extras.into_iter().map(TreeItem::Leaf));
        }
    }

    /// 选项元素自身的其他可本地化属性，名称为 `值.属性名`
    fn choice_extra_leaves(obj: &dyn HostObject, value: &str, text_leaf: &LeafNode, ctx: &TreeContext<'_>) -> Vec<LeafNode> {
        ctx.reflector
            .localizable_properties(obj)
            .iter()
            .filter(|p| p.name != CHOICE_TEXT_PROPERTY)
            .filter_map(|p| {
                let mut leaf = Self::create_leaf(obj, p, ctx)?;
                leaf.custom_text = Some(format!("{} ({})", text_leaf.display_text(), leaf.label));
                leaf.name = format!("{}.{}", value, leaf.name);
                Some(leaf)
            })
            .collect()
    }

    fn create_leaf(obj: &dyn HostObject, property: &PropertyDescriptor, ctx: &TreeContext<'_>) -> Option<LeafNode> {
        let Some(field) = obj.localizable(&property.name) else {
            tracing::warn!("{} 的可本地化属性 {} 没有字段实例", obj.type_name(), property.name);
            return None;
        };
        let default_value = Self::default_value(obj, property, &field);
        if !ctx.show_all_strings && default_value.is_empty() && field.borrow().is_empty() {
            return None;
        }
        Some(LeafNode::new(property.name.clone(), field, default_value, ctx))
    }

    /// 非页面对象的标题若有计算文本覆盖，默认值为对象名
    fn default_value(obj: &dyn HostObject, property: &PropertyDescriptor, field: &FieldHandle) -> String {
        if property.name == "title"
            && property.is_localizable
            && obj.type_name() != "page"
            && field.borrow().has_text_override()
        {
            return obj.name().unwrap_or_default().to_string();
        }
        String::new()
    }

    fn sort_items(&mut self) {
        self.items.sort_by(|a, b| match (a.name().is_empty(), b.name().is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => compare_names(a.name(), b.name()),
        });
    }

    /// 唯一子项是分组时自动展开；若它包装的是页面则隐藏其标题
    fn keep_on_group_expanded(&mut self) {
        if self.items.len() != 1 {
            return;
        }
        if let Some(TreeItem::Group(group)) = self.items.first_mut() {
            group.expanded = true;
            if let GroupHost::Object(obj) = &group.host {
                if obj.type_name() == "page" {
                    group.show_header = false;
                }
            }
        }
    }
}

impl fmt::Debug for GroupNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupNode")
            .field("name", &self.name)
            .field("text", &self.text)
            .field("is_root", &self.is_root)
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

/// 不区分大小写的字母序，仅大小写不同时按原始字节序
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// 选项值是否可表示为数字（空值也视为数字）
pub fn looks_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() || matches!(trimmed, "Infinity" | "+Infinity" | "-Infinity") {
        return true;
    }
    // 0x / 0o / 0b 前缀的无符号整数
    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if trimmed.get(..2).is_some_and(|p| p.eq_ignore_ascii_case(prefix)) {
            let digits = &trimmed[2..];
            return !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
        }
    }
    // inf / nan 等字面量不算数字；溢出到无穷大的十进制数仍算
    let unsigned = trimmed.trim_start_matches(['+', '-']);
    if unsigned.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return false;
    }
    trimmed.parse::<f64>().is_ok()
}
