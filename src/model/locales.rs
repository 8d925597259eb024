//! 语言登记表：已知语言的有序集合及其可见/可用标记

use crate::model::field::DEFAULT_LOCALE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleEntry {
    /// 空串表示默认语言
    pub locale: String,
    pub visible: bool,
    /// 不在允许列表中的语言为 false
    pub enabled: bool,
}

impl LocaleEntry {
    fn new(locale: &str, enabled: bool) -> Self {
        Self {
            locale: locale.to_string(),
            visible: enabled,
            enabled,
        }
    }
}

/// 有序语言集合；默认语言条目始终存在且可用
#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    entries: Vec<LocaleEntry>,
    supported: Vec<String>,
}

impl Default for LocaleRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl LocaleRegistry {
    /// `supported` 为允许列表，空表示全部允许
    pub fn new(supported: Vec<String>) -> Self {
        Self {
            entries: vec![LocaleEntry::new(DEFAULT_LOCALE, true)],
            supported,
        }
    }

    pub fn entries(&self) -> &[LocaleEntry] {
        &self.entries
    }

    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    /// 替换允许列表并重新计算每个条目的可用性
    pub fn set_supported(&mut self, supported: Vec<String>) {
        self.supported = supported;
        for i in 0..self.entries.len() {
            let enabled = self.is_locale_enabled(&self.entries[i].locale);
            self.entries[i].enabled = enabled;
        }
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.entries.iter().any(|e| e.locale == locale)
    }

    pub fn get(&self, locale: &str) -> Option<&LocaleEntry> {
        self.entries.iter().find(|e| e.locale == locale)
    }

    /// 全部语言（含默认的空串）
    pub fn locales(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.locale.clone()).collect()
    }

    pub fn visible_locales(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.visible)
            .map(|e| e.locale.clone())
            .collect()
    }

    pub fn is_locale_enabled(&self, locale: &str) -> bool {
        locale.is_empty() || self.supported.is_empty() || self.supported.iter().any(|s| s == locale)
    }

    /// 合并语言：新条目 visible = enabled，已有条目保持原状
    pub fn set_locales<S: AsRef<str>>(&mut self, locales: &[S]) {
        for locale in locales {
            let locale = locale.as_ref();
            if self.has_locale(locale) {
                continue;
            }
            let enabled = self.is_locale_enabled(locale);
            self.entries.push(LocaleEntry::new(locale, enabled));
        }
    }

    /// 添加单个语言，已存在时无操作；返回是否新增
    pub fn add_locale(&mut self, locale: &str) -> bool {
        if self.has_locale(locale) {
            return false;
        }
        self.set_locales(&[locale]);
        true
    }

    /// 选中指定语言：缺失的先添加，然后 visible = enabled && 被选中
    pub fn set_selected_locales<S: AsRef<str>>(&mut self, selected: &[S]) {
        self.set_locales(selected);
        for i in 0..self.entries.len() {
            let enabled = self.is_locale_enabled(&self.entries[i].locale);
            let entry = &mut self.entries[i];
            entry.visible = enabled && selected.iter().any(|s| s.as_ref() == entry.locale);
            entry.enabled = enabled;
        }
    }

    /// 收缩回只含默认语言
    pub fn reset_to_default(&mut self) {
        self.entries.clear();
        self.entries.push(LocaleEntry::new(DEFAULT_LOCALE, true));
    }

    /// 目录中尚未登记、可供添加的语言（排除空串与文档默认语言）
    pub fn available_locales<S: AsRef<str>>(&self, catalog: &[S], default_locale: &str) -> Vec<String> {
        let mut available = Vec::new();
        for loc in catalog {
            let loc = loc.as_ref();
            if loc.is_empty() || loc == default_locale || self.has_locale(loc) {
                continue;
            }
            available.push(loc.to_string());
        }
        available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entry_always_present() {
        let registry = LocaleRegistry::new(vec!["fr".into()]);
        assert_eq!(registry.locales(), vec![""]);
        let entry = registry.get("").unwrap();
        assert!(entry.enabled && entry.visible);
    }

    #[test]
    fn test_set_locales_keeps_existing_visibility() {
        let mut registry = LocaleRegistry::default();
        registry.set_locales(&["", "fr", "de"]);
        registry.set_selected_locales(&["", "de"]);
        assert_eq!(registry.visible_locales(), vec!["", "de"]);

        // 重新合并不会重置可见性
        registry.set_locales(&["", "fr", "de", "es"]);
        assert_eq!(registry.visible_locales(), vec!["", "de", "es"]);
    }

    #[test]
    fn test_allow_list_disables_unknown_locales() {
        let mut registry = LocaleRegistry::new(vec!["fr".into()]);
        registry.set_locales(&["fr", "xx"]);
        let xx = registry.get("xx").unwrap();
        assert!(!xx.enabled);
        assert!(!xx.visible);
        assert!(registry.get("fr").unwrap().enabled);
    }

    #[test]
    fn test_set_supported_recomputes_enabled() {
        let mut registry = LocaleRegistry::default();
        registry.set_locales(&["fr", "de"]);
        assert!(registry.entries().iter().all(|e| e.enabled));

        registry.set_supported(vec!["de".into()]);
        assert!(registry.get("").unwrap().enabled, "默认语言始终可用");
        assert!(!registry.get("fr").unwrap().enabled);
        assert!(registry.get("de").unwrap().enabled);

        // 清空允许列表后全部恢复可用
        registry.set_supported(Vec::new());
        assert!(registry.get("fr").unwrap().enabled);
        assert!(registry.supported().is_empty());
    }

    #[test]
    fn test_add_locale_is_noop_when_present() {
        let mut registry = LocaleRegistry::default();
        assert!(registry.add_locale("fr"));
        assert!(!registry.add_locale("fr"));
        assert!(!registry.add_locale(""));
        assert_eq!(registry.locales(), vec!["", "fr"]);
    }

    #[test]
    fn test_available_locales_excludes_known_and_default() {
        let mut registry = LocaleRegistry::default();
        registry.add_locale("fr");
        let available = registry.available_locales(&["", "en", "fr", "de"], "en");
        assert_eq!(available, vec!["de"]);
    }

    #[test]
    fn test_reset_to_default() {
        let mut registry = LocaleRegistry::default();
        registry.set_locales(&["fr", "de"]);
        registry.reset_to_default();
        assert_eq!(registry.locales(), vec![""]);
    }
}
