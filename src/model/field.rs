//! 可本地化字段：按语言存取文本的能力接口与默认实现

use std::{cell::RefCell, rc::Rc};

use serde_json::{Map, Value};

/// 默认（中性）语言的键
pub const DEFAULT_LOCALE: &str = "";
/// 默认语言在 JSON 与 CSV 表头中的字面名称
pub const DEFAULT_LOCALE_LABEL: &str = "default";

/// 多语言文本持有者（由宿主对象图拥有，树只持有共享句柄）
pub trait LocalizableField {
    /// 读取某语言的文本，不存在时返回空串（不回退到默认语言）
    fn text(&self, locale: &str) -> String;
    /// 写入某语言的文本；`None` 或空串表示清除该语言
    fn set_text(&mut self, locale: &str, value: Option<&str>);
    /// 所有语言均为空
    fn is_empty(&self) -> bool;
    /// 当前持有的语言键（尽力而为），不支持时返回 `None`
    fn known_locales(&self) -> Option<Vec<String>> {
        None
    }
    /// 原始多语言表示，`known_locales` 不可用时用于推断语言
    fn raw_json(&self) -> Value {
        Value::Null
    }
    /// 是否存在计算/渲染文本覆盖（例如标题回退到对象名）
    fn has_text_override(&self) -> bool {
        false
    }
}

/// 共享字段句柄：不同树快照中的叶子别名到同一个字段实例
pub type FieldHandle = Rc<RefCell<dyn LocalizableField>>;

/// 默认的多语言文本存储，保持语言首次写入的顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedText {
    values: Vec<(String, String)>,
    text_override: bool,
}

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记该字段带有计算文本覆盖
    pub fn with_text_override(mut self, text_override: bool) -> Self {
        self.text_override = text_override;
        self
    }

    /// 从 JSON 表示构建：字符串即默认语言，对象按语言键展开（`default` 映射为空键）
    pub fn from_json(value: Option<&Value>) -> Self {
        let mut text = Self::new();
        match value {
            Some(Value::String(s)) => text.set_text(DEFAULT_LOCALE, Some(s)),
            Some(Value::Number(n)) => text.set_text(DEFAULT_LOCALE, Some(&n.to_string())),
            Some(Value::Object(map)) => {
                for (key, v) in map {
                    let locale = if key == DEFAULT_LOCALE_LABEL { DEFAULT_LOCALE } else { key.as_str() };
                    match v {
                        Value::String(s) => text.set_text(locale, Some(s)),
                        Value::Number(n) => text.set_text(locale, Some(&n.to_string())),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        text
    }

    /// 序列化回 JSON：空则为 `None`，仅有默认语言时为纯字符串
    pub fn to_json(&self) -> Option<Value> {
        match self.values.as_slice() {
            [] => None,
            [(locale, text)] if locale.is_empty() => Some(Value::String(text.clone())),
            _ => {
                let mut map = Map::new();
                // 默认语言总是写在最前
                if let Some((_, text)) = self.values.iter().find(|(l, _)| l.is_empty()) {
                    map.insert(DEFAULT_LOCALE_LABEL.to_string(), Value::String(text.clone()));
                }
                for (locale, text) in self.values.iter().filter(|(l, _)| !l.is_empty()) {
                    map.insert(locale.clone(), Value::String(text.clone()));
                }
                Some(Value::Object(map))
            }
        }
    }

    /// 包装为共享句柄
    pub fn into_handle(self) -> FieldHandle {
        Rc::new(RefCell::new(self))
    }
}

impl LocalizableField for LocalizedText {
    fn text(&self, locale: &str) -> String {
        self.values
            .iter()
            .find(|(l, _)| l == locale)
            .map(|(_, t)| t.clone())
            .unwrap_or_default()
    }

    fn set_text(&mut self, locale: &str, value: Option<&str>) {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => {
                if let Some(slot) = self.values.iter_mut().find(|(l, _)| l == locale) {
                    slot.1 = v.to_string();
                } else {
                    self.values.push((locale.to_string(), v.to_string()));
                }
            }
            None => self.values.retain(|(l, _)| l != locale),
        }
    }

    fn is_empty(&self) -> bool {
        self.values.iter().all(|(_, t)| t.is_empty())
    }

    fn known_locales(&self) -> Option<Vec<String>> {
        Some(self.values.iter().map(|(l, _)| l.clone()).collect())
    }

    fn raw_json(&self) -> Value {
        self.to_json().unwrap_or(Value::Null)
    }

    fn has_text_override(&self) -> bool {
        self.text_override
    }
}
