//! Validator configuration.
//!
//! [`OptionOverrides`] is what callers hand in: every field optional, loadable
//! from JSON. [`Options`] is the resolved view the engine reads, produced by
//! merging overrides over the defaults.

use crate::result::ResultNode;
use crate::rule::RuleTree;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Post-processing applied to the aggregated result before it is handed out.
pub type Transform = Arc<dyn Fn(&ResultNode, &Value, &RuleTree, &Options) -> Value + Send + Sync>;

/// Resolved configuration.
#[derive(Clone, Default)]
pub struct Options {
    /// Skip evaluating leaves that are neither changed nor touched.
    pub lazy: bool,
    /// Stop evaluating a leaf at its first failing rule.
    pub first_error: bool,
    /// Test a leaf whenever its data value changes.
    pub auto_test: bool,
    /// Touch a leaf whenever its data value changes.
    pub auto_touch: bool,
    /// Mark a leaf dirty whenever it is tested.
    pub touch_on_test: bool,
    pub transform: Option<Transform>,
}

impl Options {
    /// Merges `overrides` over the defaults.
    pub fn resolve(overrides: &OptionOverrides) -> Self {
        let defaults = Self::default();
        Self {
            lazy: overrides.lazy.unwrap_or(defaults.lazy),
            first_error: overrides.first_error.unwrap_or(defaults.first_error),
            auto_test: overrides.auto_test.unwrap_or(defaults.auto_test),
            auto_touch: overrides.auto_touch.unwrap_or(defaults.auto_touch),
            touch_on_test: overrides.touch_on_test.unwrap_or(defaults.touch_on_test),
            transform: overrides.transform.clone().or(defaults.transform),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("lazy", &self.lazy)
            .field("first_error", &self.first_error)
            .field("auto_test", &self.auto_test)
            .field("auto_touch", &self.auto_touch)
            .field("touch_on_test", &self.touch_on_test)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// User-supplied configuration. Unset fields fall back to [`Options::default`].
///
/// Deserializes from JSON using snake_case keys; the camelCase spellings are
/// accepted as aliases and unknown keys are ignored.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct OptionOverrides {
    pub lazy: Option<bool>,
    #[serde(alias = "firstError")]
    pub first_error: Option<bool>,
    #[serde(alias = "autoTest")]
    pub auto_test: Option<bool>,
    #[serde(alias = "autoTouch")]
    pub auto_touch: Option<bool>,
    #[serde(alias = "touchOnTest")]
    pub touch_on_test: Option<bool>,
    #[serde(skip)]
    pub transform: Option<Transform>,
}

impl OptionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses overrides from a JSON object.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn lazy(mut self, on: bool) -> Self {
        self.lazy = Some(on);
        self
    }

    #[must_use]
    pub fn first_error(mut self, on: bool) -> Self {
        self.first_error = Some(on);
        self
    }

    #[must_use]
    pub fn auto_test(mut self, on: bool) -> Self {
        self.auto_test = Some(on);
        self
    }

    #[must_use]
    pub fn auto_touch(mut self, on: bool) -> Self {
        self.auto_touch = Some(on);
        self
    }

    #[must_use]
    pub fn touch_on_test(mut self, on: bool) -> Self {
        self.touch_on_test = Some(on);
        self
    }

    #[must_use]
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&ResultNode, &Value, &RuleTree, &Options) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }
}

impl fmt::Debug for OptionOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionOverrides")
            .field("lazy", &self.lazy)
            .field("first_error", &self.first_error)
            .field("auto_test", &self.auto_test)
            .field("auto_touch", &self.auto_touch)
            .field("touch_on_test", &self.touch_on_test)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}
