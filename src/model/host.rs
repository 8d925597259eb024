//! 宿主对象图与模式反射接口（树构建只依赖这些能力，不依赖具体宿主类型）

use std::rc::Rc;

use crate::model::field::FieldHandle;

/// 宿主对象共享引用
pub type HostRef = Rc<dyn HostObject>;

/// 宿主对象：只读身份访问 + 按属性名取字段/数组
pub trait HostObject {
    /// 对象类型名（如 `page`、`question`、`itemvalue`）
    fn type_name(&self) -> &str;
    /// 对象自身的 name（可能没有）
    fn name(&self) -> Option<&str>;
    /// 某个可本地化属性背后的字段实例
    fn localizable(&self, property: &str) -> Option<FieldHandle>;
    /// 某个数组属性的元素；`None` 元素表示不具备身份的值（如纯标量）
    fn array(&self, property: &str) -> Option<Vec<Option<HostRef>>>;
    /// 选项列表元素视图（值 + 主文本字段）
    fn choice(&self) -> Option<ChoiceParts> {
        None
    }
}

/// 选项元素的值与主文本字段
#[derive(Clone)]
pub struct ChoiceParts {
    pub value: String,
    pub text: FieldHandle,
}

/// 选项元素主文本字段的属性名，派生额外叶子时跳过
pub const CHOICE_TEXT_PROPERTY: &str = "text";

/// 属性描述符（按对象一次性解析）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub is_localizable: bool,
    pub is_serializable: bool,
    pub read_only: bool,
    pub visible: bool,
}

impl PropertyDescriptor {
    /// 可翻译：可序列化、可本地化、可写且可见
    pub fn is_translatable(&self) -> bool {
        self.is_serializable && self.is_localizable && !self.read_only && self.visible
    }
}

/// 模式反射器：枚举对象的属性描述符
pub trait SchemaReflector {
    fn properties(&self, obj: &dyn HostObject) -> Vec<PropertyDescriptor>;

    /// 可翻译属性（保持声明顺序）
    fn localizable_properties(&self, obj: &dyn HostObject) -> Vec<PropertyDescriptor> {
        self.properties(obj)
            .into_iter()
            .filter(PropertyDescriptor::is_translatable)
            .collect()
    }

    /// 非空数组属性（属性名 + 元素）
    fn array_properties(&self, obj: &dyn HostObject) -> Vec<(String, Vec<Option<HostRef>>)> {
        self.properties(obj)
            .into_iter()
            .filter(|p| p.is_serializable)
            .filter_map(|p| {
                let items = obj.array(&p.name)?;
                (!items.is_empty()).then_some((p.name, items))
            })
            .collect()
    }
}

/// 选项列表判定：非空且每个元素都具备身份并暴露值与文本字段
pub fn as_choice_list(items: &[Option<HostRef>]) -> Option<Vec<(HostRef, ChoiceParts)>> {
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| {
            let obj = item.as_ref()?;
            let parts = obj.choice()?;
            Some((obj.clone(), parts))
        })
        .collect()
}
