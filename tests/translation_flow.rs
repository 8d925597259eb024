//! 端到端测试：JSON 文档 → 翻译树 → CSV 导出/导入 → 回写

use std::{cell::RefCell, collections::BTreeSet, rc::Rc};

use fanyi_shu::{
    FieldHandle, HostObject, HostRef, JsonDocument, LocalizableField, PathKeyIndex, PropertyDescriptor,
    SchemaDefinition, SchemaReflector, TranslationConfig, TranslationTree,
};
use serde_json::{json, Value};
use tempfile::TempDir;

// ==================== 辅助函数 ====================

fn survey(value: Value) -> JsonDocument {
    JsonDocument::from_value(&value, Rc::new(SchemaDefinition::survey())).expect("物化文档失败")
}

fn tree(document: &JsonDocument, config: TranslationConfig) -> TranslationTree {
    TranslationTree::new(document.root(), document.schema(), config)
}

fn keys(tree: &TranslationTree) -> Vec<String> {
    PathKeyIndex::build(tree.root()).keys().map(str::to_string).collect()
}

fn rows(table: &[&[&str]]) -> Vec<Vec<String>> {
    table
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

fn sample_survey() -> Value {
    json!({
        "title": {"default": "Customer survey", "fr": "Enquête client"},
        "pages": [
            {
                "name": "page1",
                "title": "Start",
                "elements": [
                    {"type": "text", "name": "q1", "title": "Your name?"},
                    {
                        "type": "radiogroup",
                        "name": "q2",
                        "title": {"default": "Pick one", "de": "Wähle"},
                        "choices": [1, 2, {"value": "yes", "text": "Yes"}, "maybe"]
                    },
                    {"type": "comment", "name": "q3"}
                ]
            },
            {"name": "page2", "elements": [{"type": "boolean", "name": "q4"}]}
        ]
    })
}

// ==================== 树构建 ====================

#[test]
fn test_title_only_document() {
    let document = survey(json!({"title": "Hello"}));
    let tree = tree(&document, TranslationConfig::default());
    let leaves: Vec<&str> = tree.root().leaves().map(|l| l.name()).collect();
    assert_eq!(leaves, vec!["title"]);
    assert_eq!(tree.root().groups().count(), 0);
    assert_eq!(
        tree.export_to_csv().unwrap(),
        "description ↓ - language →,default\nroot.title,Hello\n"
    );
}

#[test]
fn test_sample_survey_keys() {
    let document = survey(sample_survey());
    let tree = tree(&document, TranslationConfig::default());
    assert_eq!(
        keys(&tree),
        vec![
            "root.title",
            "root.page1.title",
            "root.page1.q1.title",
            "root.page1.q2.title",
            "root.page1.q2.choices.yes",
            "root.page1.q2.choices.maybe",
            "root.page1.q3.title",
            "root.page2.q4.title",
        ]
    );
    // 问题标题的默认值为问题名
    let csv = tree.export_to_csv().unwrap();
    assert!(csv.contains("root.page1.q3.title,q3,,"), "空标题以问题名兜底: {}", csv);
    assert!(csv.contains("root.page1.q2.choices.maybe,maybe,,"));
}

#[test]
fn test_show_all_strings_adds_empty_fields() {
    let document = survey(sample_survey());
    let mut tree = tree(&document, TranslationConfig::default());
    let filtered = keys(&tree).len();
    tree.set_show_all_strings(true);
    let all = keys(&tree);
    assert!(all.len() > filtered);
    assert!(all.contains(&"root.description".to_string()));
    assert!(all.contains(&"root.page1.q2.choices.1".to_string()), "显示全部时包含数字选项");
}

#[test]
fn test_unnamed_array_element_uses_index() {
    let schema: SchemaDefinition = serde_json::from_value(json!({
        "root_class": "list",
        "classes": {
            "list": {"properties": [{"name": "items", "array_of": "entry"}]},
            "entry": {"properties": [{"name": "name"}, {"name": "label", "localizable": true}]}
        }
    }))
    .expect("模式解析失败");
    let value = json!({"items": [{"name": "a"}, {"name": "b"}, {"label": "third"}]});
    let document = JsonDocument::from_value(&value, Rc::new(schema)).unwrap();
    let tree = tree(&document, TranslationConfig::default());
    let groups: Vec<&str> = tree.root().groups().map(|g| g.name()).collect();
    assert_eq!(groups, vec!["items[2]"], "无叶子的命名元素被剪枝");
    assert_eq!(keys(&tree), vec!["root.items[2].label"]);
}

#[test]
fn test_sorting_changes_order_not_keys() {
    let document = survey(sample_survey());
    let plain = tree(&document, TranslationConfig::default());
    let sorted = tree(
        &document,
        TranslationConfig {
            sort_by_name: true,
            ..Default::default()
        },
    );
    let plain_keys: BTreeSet<String> = keys(&plain).into_iter().collect();
    let sorted_keys: BTreeSet<String> = keys(&sorted).into_iter().collect();
    assert_eq!(plain_keys, sorted_keys);

    let page = sorted.root().groups().next().unwrap();
    let order: Vec<&str> = page.items().iter().map(|i| i.name()).collect();
    assert_eq!(order, vec!["q1", "q2", "q3", "title"]);
}

#[test]
fn test_duplicate_names_overwrite_path_key() {
    let document = survey(json!({
        "pages": [
            {"name": "same", "title": "First"},
            {"name": "same", "title": "Second"}
        ]
    }));
    let tree = tree(&document, TranslationConfig::default());
    let index = PathKeyIndex::build(tree.root());
    assert_eq!(index.len(), 1, "同名分组产生相同路径键");
    assert_eq!(index.get("root.same.title").unwrap().text(""), "Second");
}

// ==================== 导入/导出 ====================

#[test]
fn test_import_french_keeps_default() {
    let document = survey(json!({"title": "Hello"}));
    let mut tree = tree(&document, TranslationConfig::default());
    let report = tree.import_from_rows(&rows(&[
        &["description", "default", "fr"],
        &["root.title", "Hello", "Bonjour"],
    ]));
    assert_eq!(report.applied, 1);
    assert_eq!(document.to_value(), json!({"title": {"default": "Hello", "fr": "Bonjour"}}));
}

#[test]
fn test_import_skips_blank_and_unknown_rows() {
    let document = survey(json!({"title": "Hello", "description": "Desc"}));
    let mut tree = tree(&document, TranslationConfig::default());
    let report = tree.import_from_rows(&rows(&[
        &["description", "default"],
        &["", "ignored"],
        &["root.unknown", "ignored"],
        &["root.description", "Changed"],
    ]));
    assert_eq!(report.rows, 3);
    assert_eq!(report.blank_keys, 1);
    assert_eq!(report.unknown_keys, vec!["root.unknown".to_string()]);
    assert_eq!(document.to_value(), json!({"title": "Hello", "description": "Changed"}));
}

#[test]
fn test_import_short_and_long_rows() {
    let document = survey(json!({"title": "Hello", "description": "Desc"}));
    let mut tree = tree(&document, TranslationConfig::default());
    let report = tree.import_from_rows(&rows(&[
        &["description", "default", "fr"],
        &["root.title", "Hi"],
        &["root.description", "D", "Déf", "extra"],
    ]));
    assert_eq!(report.mismatched_rows, 2);
    assert_eq!(report.cells_written, 3);
    assert_eq!(
        document.to_value(),
        json!({"title": "Hi", "description": {"default": "D", "fr": "Déf"}})
    );
}

#[test]
fn test_export_import_round_trip_between_documents() {
    let source = survey(sample_survey());
    let source_tree = tree(&source, TranslationConfig::default());
    let csv = source_tree.export_to_csv().unwrap();

    // 目标文档只有结构，没有译文
    let target = survey(json!({
        "pages": [
            {"name": "page1", "elements": [
                {"type": "text", "name": "q1"},
                {"type": "radiogroup", "name": "q2", "choices": [1, 2, "yes", "maybe"]},
                {"type": "comment", "name": "q3"}
            ]},
            {"name": "page2", "elements": [{"type": "boolean", "name": "q4"}]}
        ]
    }));
    let mut target_tree = tree(&target, TranslationConfig::default());
    let report = target_tree.import_from_csv(&csv).unwrap();
    assert!(report.unknown_keys.is_empty(), "所有路径键都应匹配: {:?}", report.unknown_keys);
    assert_eq!(target_tree.export_to_csv().unwrap(), csv);
}

#[test]
fn test_csv_file_round_trip_with_crlf_and_semicolon() {
    let dir = TempDir::new().expect("创建临时目录失败");
    let csv_path = dir.path().join("strings.csv");
    let doc_path = dir.path().join("survey.json");
    let config: TranslationConfig =
        serde_json::from_value(json!({"csv_delimiter": ";", "line_terminator": "crlf"})).unwrap();

    let document = survey(json!({"title": "Hello; world"}));
    let exporter = tree(&document, config.clone());
    exporter.export_to_file(&csv_path).unwrap();
    let written = std::fs::read_to_string(&csv_path).unwrap();
    assert!(written.ends_with("root.title;\"Hello; world\"\r\n"));

    std::fs::write(
        &csv_path,
        "description;default;fr\r\nroot.title;\"Hello; world\";Bonjour\r\n",
    )
    .unwrap();
    let mut importer = tree(&document, config);
    importer.import_from_file(&csv_path).unwrap();
    document.save(&doc_path).unwrap();

    let reloaded = JsonDocument::load(&doc_path, Rc::new(SchemaDefinition::survey())).unwrap();
    assert_eq!(reloaded.to_value(), json!({"title": {"default": "Hello; world", "fr": "Bonjour"}}));
}

// ==================== 语言与合并 ====================

#[test]
fn test_locale_discovery_across_tree() {
    let document = survey(sample_survey());
    let tree = tree(&document, TranslationConfig::default());
    assert_eq!(tree.locales().locales(), vec!["", "fr", "de"]);
}

#[test]
fn test_merge_french_into_default() {
    let document = survey(json!({"title": {"fr": "Bonjour"}}));
    let mut tree = tree(&document, TranslationConfig::default());
    assert!(tree.merge_locale_into_default("fr"));
    assert_eq!(document.to_value(), json!({"title": "Bonjour"}));
    assert_eq!(tree.locales().locales(), vec![""]);
}

#[test]
fn test_merge_twice_equals_once() {
    let value = json!({"title": {"default": "A", "en": "B"}, "description": {"en": "C", "fr": "D"}});
    let once = survey(value.clone());
    let twice = survey(value);
    tree(&once, TranslationConfig::default()).merge_locale_with_default();
    let mut t = tree(&twice, TranslationConfig::default());
    t.merge_locale_with_default();
    t.merge_locale_with_default();
    assert_eq!(once.to_value(), twice.to_value());
    assert_eq!(
        once.to_value(),
        json!({"title": "B", "description": {"default": "C", "fr": "D"}})
    );
}

// ==================== 自定义宿主 ====================

/// 只提供原始 JSON 表示、不支持直接枚举语言的字段
struct RawField(Value);

impl LocalizableField for RawField {
    fn text(&self, locale: &str) -> String {
        let key = if locale.is_empty() { "default" } else { locale };
        match &self.0 {
            Value::String(s) if locale.is_empty() => s.clone(),
            Value::Object(map) => map.get(key).and_then(Value::as_str).unwrap_or_default().to_string(),
            _ => String::new(),
        }
    }
    fn set_text(&mut self, locale: &str, value: Option<&str>) {
        let key = if locale.is_empty() { "default" } else { locale };
        if !self.0.is_object() {
            let old = self.0.take();
            self.0 = json!({});
            if let Value::String(s) = old {
                self.0["default"] = Value::String(s);
            }
        }
        match value {
            Some(v) => self.0[key] = Value::String(v.to_string()),
            None => {
                if let Some(map) = self.0.as_object_mut() {
                    map.remove(key);
                }
            }
        }
    }
    fn is_empty(&self) -> bool {
        match &self.0 {
            Value::String(s) => s.is_empty(),
            Value::Object(map) => map.is_empty(),
            _ => true,
        }
    }
    fn raw_json(&self) -> Value {
        self.0.clone()
    }
}

struct Node {
    fields: Vec<(&'static str, FieldHandle)>,
}

impl HostObject for Node {
    fn type_name(&self) -> &str {
        "node"
    }
    fn name(&self) -> Option<&str> {
        None
    }
    fn localizable(&self, property: &str) -> Option<FieldHandle> {
        self.fields.iter().find(|(n, _)| *n == property).map(|(_, f)| f.clone())
    }
    fn array(&self, _property: &str) -> Option<Vec<Option<HostRef>>> {
        None
    }
}

struct NodeReflector;

impl SchemaReflector for NodeReflector {
    fn properties(&self, obj: &dyn HostObject) -> Vec<PropertyDescriptor> {
        ["a", "b", "ghost"]
            .into_iter()
            .map(|name| PropertyDescriptor {
                name: name.to_string(),
                is_localizable: true,
                is_serializable: true,
                read_only: false,
                visible: obj.type_name() == "node",
            })
            .collect()
    }
}

#[test]
fn test_raw_json_fallback_for_locale_discovery() {
    let a: FieldHandle = Rc::new(RefCell::new(RawField(json!({"default": "x", "it": "y"}))));
    let b: FieldHandle = Rc::new(RefCell::new(RawField(json!("plain"))));
    let root: HostRef = Rc::new(Node {
        fields: vec![("a", a.clone()), ("b", b)],
    });
    let mut tree = TranslationTree::new(root, Rc::new(NodeReflector), TranslationConfig::default());
    // ghost 没有字段实例，被静默忽略
    assert_eq!(keys(&tree), vec!["root.a", "root.b"]);
    assert_eq!(tree.locales().locales(), vec!["", "it"]);

    tree.import_from_csv("h,default,it,es\nroot.a,,z,w\n").unwrap();
    assert_eq!(a.borrow().text("it"), "z");
    assert_eq!(a.borrow().text("es"), "w");
    assert_eq!(tree.locales().locales(), vec!["", "it", "es"]);
}
