//! Semantic element roles and the storefront markup they resolve to.
//!
//! Page objects never hold CSS strings of their own; they ask a
//! [`SelectorTable`] for a [`Role`]. Defaults target stock OpenCart 3 markup
//! and any role can be overridden for a themed store.

use crate::catalog::Category;
use crate::locator::Selector;
use std::collections::HashMap;

/// Element role on the storefront
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Store logo in the header
    Logo,
    /// Listing page heading for a category
    CategoryHeading(Category),
    /// Top-menu entry for a category
    MenuTrigger(Category),
    /// "Show All ..." link inside the category dropdown
    ShowAllLink(Category),
    /// Product card on a listing page
    ProductCard,
    /// Product name links across the whole listing
    ProductName,
    /// Name link, relative to a card
    CardName,
    /// Price block, relative to a card
    CardPrice,
    /// Struck-through price, relative to a price block
    PriceOld,
    /// Sale price, relative to a price block
    PriceNew,
    /// Any pagination link
    PaginationLink,
    /// The "next page" link
    NextPage,
    /// The link to page 1
    FirstPage,
    /// Currency picker toggle
    CurrencyControl,
    /// Any currency option in the picker
    CurrencyOption,
}

impl Role {
    /// OpenCart 3 default for this role
    #[must_use]
    pub fn default_selector(self) -> Selector {
        match self {
            Self::Logo => Selector::css("#logo"),
            Self::CategoryHeading(category) => Selector::css_with_text("h2", category.heading()),
            Self::MenuTrigger(Category::Phone) => {
                Selector::css_with_text("#menu a", Category::Phone.heading()).first()
            }
            Self::MenuTrigger(category) => {
                Selector::css_with_text("#menu a.dropdown-toggle", category.heading()).first()
            }
            Self::ShowAllLink(category) => match category.show_all_label() {
                Some(label) => Selector::css_with_text("#menu a", label).first(),
                None => Self::MenuTrigger(category).default_selector(),
            },
            Self::ProductCard => Selector::css(".product-thumb"),
            Self::ProductName => Selector::css(".product-thumb h4 a"),
            Self::CardName => Selector::css("h4 a"),
            Self::CardPrice => Selector::css(".price"),
            Self::PriceOld => Selector::css(".price-old"),
            Self::PriceNew => Selector::css(".price-new"),
            Self::PaginationLink => Selector::css(".pagination li a"),
            Self::NextPage => Selector::css_with_exact_text(".pagination li a", ">"),
            Self::FirstPage => Selector::css_with_exact_text(".pagination li a", "1"),
            Self::CurrencyControl => Selector::css("#form-currency"),
            Self::CurrencyOption => Selector::css("button.currency-select"),
        }
    }
}

/// Role → selector mapping with per-role overrides
#[derive(Debug, Clone, Default)]
pub struct SelectorTable {
    overrides: HashMap<Role, Selector>,
}

impl SelectorTable {
    /// Table using stock OpenCart markup
    #[must_use]
    pub fn opencart() -> Self {
        Self::default()
    }

    /// Override the selector for one role
    #[must_use]
    pub fn with(mut self, role: Role, selector: Selector) -> Self {
        self.overrides.insert(role, selector);
        self
    }

    /// Selector for `role`
    #[must_use]
    pub fn get(&self, role: Role) -> Selector {
        self.overrides
            .get(&role)
            .cloned()
            .unwrap_or_else(|| role.default_selector())
    }

    /// Whether `role` has been overridden
    #[must_use]
    pub fn is_overridden(&self, role: Role) -> bool {
        self.overrides.contains_key(&role)
    }
}
