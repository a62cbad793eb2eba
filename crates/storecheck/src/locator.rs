//! Element selectors.
//!
//! A [`Selector`] is a small tree: a CSS base, optionally filtered by text,
//! narrowed to the n-th match, or scoped to descendants of another selector.
//! It compiles to a JavaScript expression yielding an `Element[]`, which every
//! query (count, texts, visibility, click target) wraps. The mock driver
//! evaluates the same tree against static HTML.

use std::fmt;

/// Selector for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector (e.g., ".product-thumb")
    Css(String),
    /// CSS selector whose text content contains `text`
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Substring the text content must contain
        text: String,
    },
    /// CSS selector whose trimmed text content matches a regex
    CssMatching {
        /// Base CSS selector
        css: String,
        /// Regular expression, JavaScript and Rust compatible
        pattern: String,
    },
    /// The `index`-th match of `base`, zero-based
    Nth {
        /// Selector to narrow
        base: Box<Selector>,
        /// Position among the matches
        index: usize,
    },
    /// Elements matching `child` inside any match of `base`
    Descendant {
        /// Scope
        base: Box<Selector>,
        /// Selector evaluated inside each scope element
        child: Box<Selector>,
    },
}

/// Quote a string as a JavaScript literal
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// CSS selector filtered by a text substring
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// CSS selector filtered by a regex over the trimmed text
    #[must_use]
    pub fn css_matching(css: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::CssMatching {
            css: css.into(),
            pattern: pattern.into(),
        }
    }

    /// CSS selector whose trimmed text equals `text` exactly
    #[must_use]
    pub fn css_with_exact_text(css: impl Into<String>, text: &str) -> Self {
        Self::css_matching(css, format!("^{}$", regex::escape(text)))
    }

    /// Narrow to the `index`-th match
    #[must_use]
    pub fn nth(self, index: usize) -> Self {
        Self::Nth {
            base: Box::new(self),
            index,
        }
    }

    /// Narrow to the first match
    #[must_use]
    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Scope `child` to descendants of this selector's matches
    #[must_use]
    pub fn descendant(self, child: Selector) -> Self {
        Self::Descendant {
            base: Box::new(self),
            child: Box::new(child),
        }
    }

    /// JavaScript expression evaluating to the matched `Element[]`
    #[must_use]
    pub fn to_elements_query(&self) -> String {
        self.elements_in("document")
    }

    fn elements_in(&self, root: &str) -> String {
        match self {
            Self::Css(css) => format!("Array.from({root}.querySelectorAll({}))", js_string(css)),
            Self::CssWithText { css, text } => format!(
                "Array.from({root}.querySelectorAll({})).filter(el => (el.textContent || '').includes({}))",
                js_string(css),
                js_string(text)
            ),
            Self::CssMatching { css, pattern } => format!(
                "Array.from({root}.querySelectorAll({})).filter(el => new RegExp({}).test((el.textContent || '').trim()))",
                js_string(css),
                js_string(pattern)
            ),
            Self::Nth { base, index } => format!(
                "((els) => els.length > {index} ? [els[{index}]] : [])({})",
                base.elements_in(root)
            ),
            Self::Descendant { base, child } => format!(
                "({}).flatMap(scope => {})",
                base.elements_in(root),
                child.elements_in("scope")
            ),
        }
    }

    /// Expression counting matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("({}).length", self.to_elements_query())
    }

    /// Expression returning every match's `textContent`
    #[must_use]
    pub fn to_texts_query(&self) -> String {
        format!(
            "({}).map(el => el.textContent || '')",
            self.to_elements_query()
        )
    }

    /// Expression returning whether any match is rendered and not hidden
    #[must_use]
    pub fn to_visible_query(&self) -> String {
        format!(
            "({}).some(el => {{ const s = getComputedStyle(el); \
             return s.visibility !== 'hidden' && s.display !== 'none' \
             && !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length); }})",
            self.to_elements_query()
        )
    }

    /// Expression scrolling the first match into view and returning its
    /// centre point as `{x, y}`, or `null` when nothing matches
    #[must_use]
    pub fn to_center_query(&self) -> String {
        format!(
            "((els) => {{ const el = els[0]; if (!el) return null; \
             el.scrollIntoView({{block: 'center', inline: 'center'}}); \
             const r = el.getBoundingClientRect(); \
             return {{x: r.left + r.width / 2, y: r.top + r.height / 2}}; }})({})",
            self.to_elements_query()
        )
    }

    /// Expression calling `click()` on the first match; false when nothing
    /// matches
    #[must_use]
    pub fn to_dom_click_query(&self) -> String {
        format!(
            "((els) => {{ const el = els[0]; if (!el) return false; el.click(); return true; }})({})",
            self.to_elements_query()
        )
    }

    /// Expression selecting `value` on the first match (a `<select>`)
    #[must_use]
    pub fn to_select_query(&self, value: &str) -> String {
        format!(
            "((els) => {{ const el = els[0]; if (!el) return false; el.value = {}; \
             el.dispatchEvent(new Event('change', {{bubbles: true}})); return true; }})({})",
            js_string(value),
            self.to_elements_query()
        )
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "{css}"),
            Self::CssWithText { css, text } => write!(f, "{css}:has-text({text:?})"),
            Self::CssMatching { css, pattern } => write!(f, "{css}:text-matches(/{pattern}/)"),
            Self::Nth { base, index } => write!(f, "{base} >> nth={index}"),
            Self::Descendant { base, child } => write!(f, "{base} >> {child}"),
        }
    }
}
