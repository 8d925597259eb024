//! JSON 宿主对象图：按模式把 JSON 文档物化为可反射的宿主对象，并支持回写
//!
//! 可本地化属性的 JSON 值为纯字符串（仅默认语言）或以语言为键的对象（`default` 为默认语言）。

use std::{cell::RefCell, collections::HashMap, path::Path, rc::Rc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::data_core::{Result, TranslationError};
use crate::model::field::{FieldHandle, LocalizedText};
use crate::model::host::{ChoiceParts, HostObject, HostRef, PropertyDescriptor, SchemaReflector, CHOICE_TEXT_PROPERTY};
use crate::utils::fs::{read_json_file, write_json_file};

fn default_true() -> bool {
    true
}

/// 单个属性的模式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub name: String,
    #[serde(default)]
    pub localizable: bool,
    #[serde(default = "default_true")]
    pub serializable: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// 字段带计算文本覆盖（如问题标题回退到 name）
    #[serde(default)]
    pub computed_text: bool,
    /// 数组属性的元素类
    #[serde(default)]
    pub array_of: Option<String>,
}

impl PropertySchema {
    pub fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            localizable: false,
            serializable: true,
            read_only: false,
            visible: true,
            computed_text: false,
            array_of: None,
        }
    }

    pub fn localizable(name: &str) -> Self {
        Self {
            localizable: true,
            ..Self::plain(name)
        }
    }

    pub fn array(name: &str, of: &str) -> Self {
        Self {
            array_of: Some(of.to_string()),
            ..Self::plain(name)
        }
    }

    fn descriptor(&self) -> PropertyDescriptor {
        PropertyDescriptor {
            name: self.name.clone(),
            is_localizable: self.localizable,
            is_serializable: self.serializable,
            read_only: self.read_only,
            visible: self.visible,
        }
    }
}

/// 类模式：单继承 + 属性列表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSchema {
    #[serde(default)]
    pub parent: Option<String>,
    /// 选项元素类（值 + 文本）
    #[serde(default)]
    pub choice: bool,
    #[serde(default)]
    pub properties: Vec<PropertySchema>,
}

/// 文档模式，同时充当模式反射器
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub root_class: String,
    /// 未知元素类型回退到的类
    #[serde(default)]
    pub fallback_class: Option<String>,
    pub classes: HashMap<String, ClassSchema>,
}

impl SchemaDefinition {
    /// 内置的问卷文档模式
    pub fn survey() -> Self {
        use PropertySchema as P;
        let mut classes = HashMap::new();
        let class = |parent: Option<&str>, properties: Vec<PropertySchema>| ClassSchema {
            parent: parent.map(str::to_string),
            choice: false,
            properties,
        };
        classes.insert(
            "survey".to_string(),
            class(
                None,
                vec![
                    P::localizable("title"),
                    P::localizable("description"),
                    P::localizable("completedHtml"),
                    P::array("pages", "page"),
                ],
            ),
        );
        let container = vec![
            P::plain("name"),
            P::localizable("title"),
            P::localizable("description"),
            P::array("elements", "question"),
        ];
        classes.insert("page".to_string(), class(None, container.clone()));
        classes.insert("panel".to_string(), class(None, container));
        classes.insert(
            "question".to_string(),
            class(
                None,
                vec![
                    P::plain("name"),
                    P {
                        computed_text: true,
                        ..P::localizable("title")
                    },
                    P::localizable("description"),
                    P::localizable("requiredErrorText"),
                ],
            ),
        );
        for text_like in ["text", "comment"] {
            classes.insert(
                text_like.to_string(),
                class(Some("question"), vec![P::localizable("placeholder")]),
            );
        }
        classes.insert(
            "selectbase".to_string(),
            class(
                Some("question"),
                vec![P::array("choices", "itemvalue"), P::localizable("otherText")],
            ),
        );
        for select in ["checkbox", "radiogroup", "dropdown"] {
            classes.insert(select.to_string(), class(Some("selectbase"), Vec::new()));
        }
        classes.insert(
            "itemvalue".to_string(),
            ClassSchema {
                parent: None,
                choice: true,
                properties: vec![P::plain("value"), P::localizable(CHOICE_TEXT_PROPERTY)],
            },
        );
        Self {
            root_class: "survey".to_string(),
            fallback_class: Some("question".to_string()),
            classes,
        }
    }

    /// 从 JSON 文件加载模式
    pub fn load(path: &Path) -> Result<Self> {
        let value = read_json_file(path)?;
        Ok(serde_json::from_value(value)?)
    }

    /// 已知类名原样返回，否则回退
    pub fn resolve_class<'a>(&'a self, class: &'a str) -> &'a str {
        if self.classes.contains_key(class) {
            return class;
        }
        self.fallback_class.as_deref().unwrap_or(class)
    }

    pub fn is_choice_class(&self, class: &str) -> bool {
        self.classes
            .get(self.resolve_class(class))
            .map(|c| c.choice)
            .unwrap_or(false)
    }

    /// 含继承链的属性（父类在前，子类同名属性覆盖父类）
    pub fn class_properties(&self, class: &str) -> Vec<&PropertySchema> {
        let mut chain = Vec::new();
        let mut current = Some(self.resolve_class(class));
        while let Some(name) = current {
            // 继承环保护
            if chain.len() > self.classes.len() {
                tracing::warn!("类 {} 的继承链存在环", class);
                break;
            }
            let Some(schema) = self.classes.get(name) else { break };
            chain.push(schema);
            current = schema.parent.as_deref();
        }
        let mut properties: Vec<&PropertySchema> = Vec::new();
        for schema in chain.into_iter().rev() {
            for property in &schema.properties {
                if let Some(slot) = properties.iter_mut().find(|p| p.name == property.name) {
                    *slot = property;
                } else {
                    properties.push(property);
                }
            }
        }
        properties
    }
}

impl SchemaReflector for SchemaDefinition {
    fn properties(&self, obj: &dyn HostObject) -> Vec<PropertyDescriptor> {
        self.class_properties(obj.type_name())
            .into_iter()
            .map(PropertySchema::descriptor)
            .collect()
    }
}

/// 选项元素的原始值
#[derive(Debug, Clone)]
struct ChoiceValue {
    value: Value,
    /// 原始 JSON 为标量
    scalar: bool,
}

/// 可本地化属性：共享的文本 + 物化时的快照
#[derive(Debug)]
struct JsonField {
    name: String,
    text: Rc<RefCell<LocalizedText>>,
    loaded: LocalizedText,
}

impl JsonField {
    /// 未被编辑过的字段按原始 JSON 回写，不做规范化
    fn is_dirty(&self) -> bool {
        *self.text.borrow() != self.loaded
    }
}

/// 由 JSON 物化出的宿主对象
#[derive(Debug)]
pub struct JsonObject {
    type_name: String,
    name: Option<String>,
    raw: Map<String, Value>,
    fields: Vec<JsonField>,
    arrays: Vec<(String, Vec<Option<Rc<JsonObject>>>)>,
    choice: Option<ChoiceValue>,
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl JsonObject {
    fn materialize(schema: &SchemaDefinition, class: &str, value: &Value) -> Option<Rc<Self>> {
        match value {
            Value::Object(map) => {
                let type_name = map
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or(class)
                    .to_string();
                let choice = schema.is_choice_class(&type_name).then(|| ChoiceValue {
                    value: map.get("value").cloned().unwrap_or(Value::Null),
                    scalar: false,
                });
                Some(Rc::new(Self::from_map(schema, type_name, map.clone(), choice)))
            }
            Value::Array(_) => None,
            scalar if schema.is_choice_class(class) => {
                let choice = ChoiceValue {
                    value: scalar.clone(),
                    scalar: true,
                };
                Some(Rc::new(Self::from_map(schema, class.to_string(), Map::new(), Some(choice))))
            }
            _ => None,
        }
    }

    fn from_map(schema: &SchemaDefinition, type_name: String, raw: Map<String, Value>, choice: Option<ChoiceValue>) -> Self {
        let mut fields = Vec::new();
        let mut arrays = Vec::new();
        for property in schema.class_properties(&type_name) {
            if let Some(of) = &property.array_of {
                let Some(Value::Array(items)) = raw.get(&property.name) else { continue };
                let elements: Vec<Option<Rc<Self>>> = items
                    .iter()
                    .map(|item| Self::materialize(schema, of, item))
                    .collect();
                arrays.push((property.name.clone(), elements));
            } else if property.localizable {
                let text = LocalizedText::from_json(raw.get(&property.name)).with_text_override(property.computed_text);
                fields.push(JsonField {
                    name: property.name.clone(),
                    loaded: text.clone(),
                    text: Rc::new(RefCell::new(text)),
                });
            }
        }
        let name = raw.get("name").map(scalar_string).filter(|n| !n.is_empty());
        Self {
            type_name,
            name,
            raw,
            fields,
            arrays,
            choice,
        }
    }

    fn fields_empty(&self) -> bool {
        self.fields.iter().all(|f| f.text.borrow().to_json().is_none())
    }

    /// 回写为 JSON，保持原始键顺序
    pub fn to_json(&self) -> Value {
        if let Some(choice) = &self.choice {
            if choice.scalar && self.fields_empty() {
                return choice.value.clone();
            }
        }
        let mut map = self.raw.clone();
        if let Some(choice) = self.choice.as_ref().filter(|c| c.scalar) {
            map.insert("value".to_string(), choice.value.clone());
        }
        for field in self.fields.iter().filter(|f| f.is_dirty()) {
            match field.text.borrow().to_json() {
                Some(value) => {
                    map.insert(field.name.clone(), value);
                }
                None => {
                    map.shift_remove(&field.name);
                }
            }
        }
        for (name, elements) in &self.arrays {
            let originals = match self.raw.get(name) {
                Some(Value::Array(items)) => items.as_slice(),
                _ => &[],
            };
            let items = elements
                .iter()
                .enumerate()
                .map(|(i, element)| match element {
                    Some(obj) => obj.to_json(),
                    None => originals.get(i).cloned().unwrap_or(Value::Null),
                })
                .collect();
            map.insert(name.clone(), Value::Array(items));
        }
        Value::Object(map)
    }
}

impl HostObject for JsonObject {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn localizable(&self, property: &str) -> Option<FieldHandle> {
        self.fields
            .iter()
            .find(|f| f.name == property)
            .map(|f| -> FieldHandle { f.text.clone() })
    }

    fn array(&self, property: &str) -> Option<Vec<Option<HostRef>>> {
        let (_, elements) = self.arrays.iter().find(|(name, _)| name == property)?;
        Some(
            elements
                .iter()
                .map(|e| e.clone().map(|obj| -> HostRef { obj }))
                .collect(),
        )
    }

    fn choice(&self) -> Option<ChoiceParts> {
        let choice = self.choice.as_ref()?;
        Some(ChoiceParts {
            value: scalar_string(&choice.value),
            text: self.localizable(CHOICE_TEXT_PROPERTY)?,
        })
    }
}

/// JSON 文档：根宿主对象 + 模式
#[derive(Debug, Clone)]
pub struct JsonDocument {
    root: Rc<JsonObject>,
    schema: Rc<SchemaDefinition>,
}

impl JsonDocument {
    pub fn from_value(value: &Value, schema: Rc<SchemaDefinition>) -> Result<Self> {
        if !value.is_object() {
            return Err(TranslationError::State("文档根节点必须是JSON对象".into()));
        }
        let root = JsonObject::materialize(&schema, &schema.root_class, value)
            .ok_or_else(|| TranslationError::State("无法物化文档根节点".into()))?;
        Ok(Self { root, schema })
    }

    /// 加载JSON文档
    pub fn load(path: &Path, schema: Rc<SchemaDefinition>) -> Result<Self> {
        let value = read_json_file(path)?;
        Self::from_value(&value, schema)
    }

    pub fn root(&self) -> HostRef {
        self.root.clone()
    }

    pub fn schema(&self) -> Rc<SchemaDefinition> {
        self.schema.clone()
    }

    pub fn to_value(&self) -> Value {
        self.root.to_json()
    }

    /// 保存到文件（格式化输出）
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_file(path, &self.to_value())
    }

    /// 文档中的页面（用于按页过滤）
    pub fn pages(&self) -> Vec<HostRef> {
        self.root
            .array("pages")
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn find_page(&self, name: &str) -> Option<HostRef> {
        self.pages().into_iter().find(|p| p.name() == Some(name))
    }
}
