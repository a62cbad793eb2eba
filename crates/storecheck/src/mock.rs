//! Offline driver over static HTML.
//!
//! [`MockDriver`] renders pages through a site function `(url, cookies) ->
//! html` and evaluates [`Selector`]s with `scraper`, so page objects run
//! unchanged against it. Clicking follows `href`, applies `data-cookie="k=v"`
//! (then reloads), and fails on `data-mock-fail`, which stands in for an
//! overlay intercepting the pointer. DOM clicks ignore it. Elements inside a
//! `data-mock-broken` subtree fail when addressed by index, which stands in
//! for a card detaching mid-read.
//!
//! [`MockStorefront`] renders OpenCart-like markup for that site function.

use crate::catalog::Category;
use crate::driver::{LoadState, ScrollPosition, StoreDriver};
use crate::locator::Selector;
use crate::result::{StoreError, StoreResult};
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// PNG signature returned by mock screenshots
pub const MOCK_SCREENSHOT: &[u8] = b"\x89PNG\r\n\x1a\nmock";

/// A page request made to a mock site
#[derive(Debug, Clone, Copy)]
pub struct MockRequest<'a> {
    /// Requested URL
    pub url: &'a str,
    /// Cookies set so far
    pub cookies: &'a BTreeMap<String, String>,
}

type SiteFn = dyn Fn(&MockRequest<'_>) -> Option<String> + Send + Sync;

#[derive(Debug, Default)]
struct MockState {
    url: String,
    html: String,
    back_stack: Vec<String>,
    cookies: BTreeMap<String, String>,
    call_history: Vec<String>,
    closed: bool,
}

/// Mock driver for unit testing
pub struct MockDriver {
    site: Arc<SiteFn>,
    state: Mutex<MockState>,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDriver")
            .field("url", &self.state().url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum ClickAction {
    Fail(String),
    Follow {
        cookie: Option<(String, String)>,
        href: Option<String>,
    },
}

impl MockDriver {
    /// Create a driver over a site function
    #[must_use]
    pub fn new<F>(site: F) -> Self
    where
        F: Fn(&MockRequest<'_>) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            site: Arc::new(site),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Create a driver already showing `html`; navigation elsewhere fails
    #[must_use]
    pub fn from_html(html: impl Into<String>) -> Self {
        let html = html.into();
        let page = html.clone();
        let driver = Self::new(move |req| (req.url == "mock://page").then(|| page.clone()));
        {
            let mut state = driver.state();
            state.url = "mock://page".to_string();
            state.html = html;
        }
        driver
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }

    /// Number of calls starting with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.state()
            .call_history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Cookie value, if set
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.state().cookies.get(name).cloned()
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self, state: &mut MockState, url: &str) -> StoreResult<()> {
        let request = MockRequest {
            url,
            cookies: &state.cookies,
        };
        let html = (self.site)(&request).ok_or_else(|| StoreError::NavigationError {
            url: url.to_string(),
            message: "mock site has no such page".to_string(),
        })?;
        state.url = url.to_string();
        state.html = html;
        Ok(())
    }

    fn navigate(&self, state: &mut MockState, url: &str) -> StoreResult<()> {
        let previous = state.url.clone();
        self.load(state, url)?;
        if !previous.is_empty() {
            state.back_stack.push(previous);
        }
        Ok(())
    }

    fn activate(&self, selector: &Selector, pointer: bool) -> StoreResult<()> {
        let action = self
            .with_matches(selector, |els| els.first().map(|el| click_action(*el, pointer)))?
            .ok_or_else(|| StoreError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        let mut state = self.state();
        match action {
            ClickAction::Fail(reason) => Err(StoreError::page(reason)),
            ClickAction::Follow { cookie, href } => {
                let had_cookie = cookie.is_some();
                if let Some((name, value)) = cookie {
                    state.cookies.insert(name, value);
                }
                match href {
                    Some(href) => self.navigate(&mut state, &href),
                    None if had_cookie => {
                        let url = state.url.clone();
                        self.load(&mut state, &url)
                    }
                    None => Ok(()),
                }
            }
        }
    }

    fn with_matches<T>(
        &self,
        selector: &Selector,
        f: impl FnOnce(&[ElementRef<'_>]) -> T,
    ) -> StoreResult<T> {
        let html = self.state().html.clone();
        let doc = Html::parse_document(&html);
        let matches = resolve(Scope::Document(&doc), selector)?;
        Ok(f(&matches))
    }
}

#[derive(Clone, Copy)]
enum Scope<'a> {
    Document(&'a Html),
    Element(ElementRef<'a>),
}

fn select_css<'a>(scope: Scope<'a>, css: &str) -> StoreResult<Vec<ElementRef<'a>>> {
    let parsed = scraper::Selector::parse(css)
        .map_err(|e| StoreError::page(format!("invalid selector {css}: {e:?}")))?;
    Ok(match scope {
        Scope::Document(doc) => doc.select(&parsed).collect(),
        Scope::Element(el) => el.select(&parsed).collect(),
    })
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

fn lineage(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    std::iter::once(el).chain(el.ancestors().filter_map(ElementRef::wrap))
}

fn is_detached(el: ElementRef<'_>) -> bool {
    lineage(el).any(|node| node.value().attr("data-mock-broken").is_some())
}

fn is_rendered(el: ElementRef<'_>) -> bool {
    lineage(el).all(|node| {
        let value = node.value();
        value.attr("hidden").is_none()
            && !value
                .attr("style")
                .is_some_and(|s| s.replace(' ', "").contains("display:none"))
    })
}

fn resolve<'a>(scope: Scope<'a>, selector: &Selector) -> StoreResult<Vec<ElementRef<'a>>> {
    match selector {
        Selector::Css(css) => select_css(scope, css),
        Selector::CssWithText { css, text } => Ok(select_css(scope, css)?
            .into_iter()
            .filter(|el| text_of(*el).contains(text.as_str()))
            .collect()),
        Selector::CssMatching { css, pattern } => {
            let re = Regex::new(pattern)
                .map_err(|e| StoreError::page(format!("invalid text pattern {pattern}: {e}")))?;
            Ok(select_css(scope, css)?
                .into_iter()
                .filter(|el| re.is_match(text_of(*el).trim()))
                .collect())
        }
        Selector::Nth { base, index } => match resolve(scope, base)?.get(*index) {
            Some(el) if is_detached(*el) => Err(StoreError::page(format!(
                "element {selector} is detached from the document"
            ))),
            Some(el) => Ok(vec![*el]),
            None => Ok(Vec::new()),
        },
        Selector::Descendant { base, child } => {
            let mut found = Vec::new();
            for el in resolve(scope, base)? {
                found.extend(resolve(Scope::Element(el), child)?);
            }
            Ok(found)
        }
    }
}

fn click_action(el: ElementRef<'_>, pointer: bool) -> ClickAction {
    let value = el.value();
    if let Some(reason) = value.attr("data-mock-fail").filter(|_| pointer) {
        return ClickAction::Fail(reason.to_string());
    }
    let cookie = value.attr("data-cookie").and_then(|raw| {
        raw.split_once('=')
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
    });
    ClickAction::Follow {
        cookie,
        href: value.attr("href").map(str::to_string),
    }
}

#[async_trait]
impl StoreDriver for MockDriver {
    async fn goto(&self, url: &str) -> StoreResult<()> {
        let mut state = self.state();
        state.call_history.push(format!("goto:{url}"));
        self.navigate(&mut state, url)
    }

    async fn wait_for_load(
        &self,
        load_state: LoadState,
        _timeout: std::time::Duration,
    ) -> StoreResult<()> {
        self.state()
            .call_history
            .push(format!("wait_for_load:{load_state:?}"));
        Ok(())
    }

    async fn reload(&self) -> StoreResult<()> {
        let mut state = self.state();
        state.call_history.push("reload".to_string());
        let url = state.url.clone();
        self.load(&mut state, &url)
    }

    async fn go_back(&self) -> StoreResult<()> {
        let mut state = self.state();
        state.call_history.push("go_back".to_string());
        match state.back_stack.pop() {
            Some(url) => self.load(&mut state, &url),
            None => Ok(()),
        }
    }

    async fn current_url(&self) -> StoreResult<String> {
        Ok(self.state().url.clone())
    }

    async fn title(&self) -> StoreResult<String> {
        self.with_matches(&Selector::css("title"), |els| {
            els.first()
                .map(|el| text_of(*el).trim().to_string())
                .unwrap_or_default()
        })
    }

    async fn count(&self, selector: &Selector) -> StoreResult<usize> {
        self.with_matches(selector, |els| els.len())
    }

    async fn text_contents(&self, selector: &Selector) -> StoreResult<Vec<String>> {
        self.with_matches(selector, |els| els.iter().map(|el| text_of(*el)).collect())
    }

    async fn is_visible(&self, selector: &Selector) -> StoreResult<bool> {
        self.with_matches(selector, |els| els.iter().any(|el| is_rendered(*el)))
    }

    async fn click(&self, selector: &Selector) -> StoreResult<()> {
        self.state().call_history.push(format!("click:{selector}"));
        self.activate(selector, true)
    }

    async fn dom_click(&self, selector: &Selector) -> StoreResult<()> {
        self.state().call_history.push(format!("dom_click:{selector}"));
        self.activate(selector, false)
    }

    async fn hover(&self, selector: &Selector) -> StoreResult<()> {
        self.state().call_history.push(format!("hover:{selector}"));
        if self.count(selector).await? == 0 {
            return Err(StoreError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        Ok(())
    }

    async fn select_option(&self, selector: &Selector, value: &str) -> StoreResult<()> {
        self.state()
            .call_history
            .push(format!("select:{selector}={value}"));
        if self.count(selector).await? == 0 {
            return Err(StoreError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        Ok(())
    }

    async fn scroll_to(&self, position: ScrollPosition) -> StoreResult<()> {
        self.state()
            .call_history
            .push(format!("scroll:{position:?}"));
        Ok(())
    }

    async fn screenshot(&self) -> StoreResult<Vec<u8>> {
        let mut state = self.state();
        state.call_history.push("screenshot".to_string());
        if state.closed {
            return Err(StoreError::ScreenshotError {
                message: "page is closed".to_string(),
            });
        }
        Ok(MOCK_SCREENSHOT.to_vec())
    }

    async fn close(&self) -> StoreResult<()> {
        let mut state = self.state();
        state.call_history.push("close".to_string());
        state.closed = true;
        Ok(())
    }
}

/// Price shown on a mock product card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockPrice {
    /// Single price with the tax line under it
    Regular(String),
    /// Sale price next to the struck-through original
    Sale {
        /// Original price
        old: String,
        /// Sale price
        new: String,
    },
}

/// Product rendered by [`MockStorefront`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockProduct {
    name: String,
    prices: BTreeMap<String, MockPrice>,
    broken: bool,
}

impl MockProduct {
    /// Product without prices
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prices: BTreeMap::new(),
            broken: false,
        }
    }

    /// Regular price in `code`
    #[must_use]
    pub fn price(mut self, code: &str, price: impl Into<String>) -> Self {
        self.prices
            .insert(code.to_ascii_uppercase(), MockPrice::Regular(price.into()));
        self
    }

    /// Sale price in `code`
    #[must_use]
    pub fn sale(mut self, code: &str, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.prices.insert(
            code.to_ascii_uppercase(),
            MockPrice::Sale {
                old: old.into(),
                new: new.into(),
            },
        );
        self
    }

    /// Make the card fail when read by index
    #[must_use]
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

/// OpenCart-like storefront rendered from in-memory listings
#[derive(Debug, Clone)]
pub struct MockStorefront {
    base_url: String,
    listings: HashMap<Category, Vec<Vec<MockProduct>>>,
    currencies: Vec<(String, String)>,
    endless_pagination: bool,
    stray_currency_redirect: Option<String>,
}

const fn category_path(category: Category) -> u32 {
    match category {
        Category::Desktop => 20,
        Category::Laptop => 18,
        Category::Phone => 24,
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn query_param<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

impl MockStorefront {
    /// Storefront at `base_url` offering EUR, GBP and USD
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            listings: HashMap::new(),
            currencies: vec![
                ("EUR".to_string(), "€ Euro".to_string()),
                ("GBP".to_string(), "£ Pound Sterling".to_string()),
                ("USD".to_string(), "$ US Dollar".to_string()),
            ],
            endless_pagination: false,
            stray_currency_redirect: None,
        }
    }

    /// Replace the currency options as `(code, label)` pairs
    #[must_use]
    pub fn with_currencies(mut self, currencies: &[(&str, &str)]) -> Self {
        self.currencies = currencies
            .iter()
            .map(|(code, label)| ((*code).to_string(), (*label).to_string()))
            .collect();
        self
    }

    /// Listing pages of a category, in page order
    #[must_use]
    pub fn with_listing(mut self, category: Category, pages: Vec<Vec<MockProduct>>) -> Self {
        self.listings.insert(category, pages);
        self
    }

    /// Always render a "next" link, repeating the last page past the end
    #[must_use]
    pub const fn with_endless_pagination(mut self) -> Self {
        self.endless_pagination = true;
        self
    }

    /// Make currency options navigate to `url` after switching
    #[must_use]
    pub fn with_stray_currency_redirect(mut self, url: impl Into<String>) -> Self {
        self.stray_currency_redirect = Some(url.into());
        self
    }

    /// Storefront root
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Home page URL
    #[must_use]
    pub fn home_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    /// Listing URL for `page` (1-based)
    #[must_use]
    pub fn category_url(&self, category: Category, page: usize) -> String {
        let mut url = format!(
            "{}/index.php?route=product/category&path={}",
            self.base_url,
            category_path(category)
        );
        if page > 1 {
            url.push_str(&format!("&page={page}"));
        }
        url
    }

    /// Build a driver serving this storefront
    #[must_use]
    pub fn into_driver(self) -> MockDriver {
        MockDriver::new(move |req| self.render(req))
    }

    /// Render the page at `request.url`
    #[must_use]
    pub fn render(&self, request: &MockRequest<'_>) -> Option<String> {
        let rest = request.url.strip_prefix(&self.base_url)?;
        let currency = request
            .cookies
            .get("currency")
            .map_or("USD", String::as_str);
        if rest.is_empty() || rest == "/" || rest.contains("route=common/home") {
            return Some(self.page("Your Store", currency, "<h3>Featured</h3>"));
        }
        if rest.contains("route=product/category") {
            let path: u32 = query_param(rest, "path")?.parse().ok()?;
            let category = Category::ALL
                .into_iter()
                .find(|c| category_path(*c) == path)?;
            let page = query_param(rest, "page")
                .and_then(|p| p.parse().ok())
                .unwrap_or(1);
            let body = self.listing_body(category, page, currency);
            return Some(self.page(category.heading(), currency, &body));
        }
        if self.stray_currency_redirect.as_deref() == Some(request.url) {
            return Some(self.page("Account", currency, "<h2>Account</h2>"));
        }
        None
    }

    fn page(&self, title: &str, currency: &str, body: &str) -> String {
        format!(
            "<!DOCTYPE html><html><head><title>{}</title></head><body>{}<div id=\"content\">{}</div></body></html>",
            escape_html(title),
            self.header(currency),
            body
        )
    }

    fn header(&self, currency: &str) -> String {
        let stray = self
            .stray_currency_redirect
            .as_deref()
            .map(|url| format!(" href=\"{}\"", escape_html(url)))
            .unwrap_or_default();
        let options: String = self
            .currencies
            .iter()
            .map(|(code, label)| {
                format!(
                    "<li><button class=\"currency-select btn btn-link btn-block\" type=\"button\" name=\"{code}\" data-cookie=\"currency={code}\"{stray}>{}</button></li>",
                    escape_html(label)
                )
            })
            .collect();
        let mut menu = String::new();
        for category in Category::ALL {
            let url = escape_html(&self.category_url(category, 1));
            let heading = escape_html(category.heading());
            match category.show_all_label() {
                Some(label) => menu.push_str(&format!(
                    "<li class=\"dropdown\"><a href=\"{url}\" class=\"dropdown-toggle\" data-toggle=\"dropdown\">{heading}</a><div class=\"dropdown-menu\"><a href=\"{url}\" class=\"see-all\">{}</a></div></li>",
                    escape_html(label)
                )),
                None => menu.push_str(&format!("<li><a href=\"{url}\">{heading}</a></li>")),
            }
        }
        format!(
            "<header><div id=\"logo\"><a href=\"{}\"><img src=\"logo.png\" alt=\"Your Store\"></a></div><form id=\"form-currency\"><div class=\"btn-group\"><button class=\"btn btn-link dropdown-toggle\" data-toggle=\"dropdown\"><strong>{}</strong> Currency</button><ul class=\"dropdown-menu\" hidden>{options}</ul></div></form><nav id=\"menu\"><ul class=\"nav navbar-nav\">{menu}</ul></nav></header>",
            escape_html(&self.home_url()),
            escape_html(currency)
        )
    }

    fn listing_body(&self, category: Category, page: usize, currency: &str) -> String {
        let pages = self.listings.get(&category).map_or(&[][..], Vec::as_slice);
        let total = pages.len();
        let products: &[MockProduct] = match pages.get(page.saturating_sub(1)) {
            Some(products) => products,
            None if self.endless_pagination => pages.last().map_or(&[][..], Vec::as_slice),
            None => &[],
        };
        let cards: String = products
            .iter()
            .map(|product| self.card(product, currency))
            .collect();
        format!(
            "<h2>{}</h2><div class=\"row\">{cards}</div>{}",
            escape_html(category.heading()),
            self.pagination(category, page, total)
        )
    }

    fn card(&self, product: &MockProduct, currency: &str) -> String {
        let price = match product.prices.get(currency) {
            Some(MockPrice::Regular(price)) => format!(
                "\n  {}\n  <span class=\"price-tax\">Ex Tax: {}</span>\n",
                escape_html(price),
                escape_html(price)
            ),
            Some(MockPrice::Sale { old, new }) => format!(
                "<span class=\"price-new\">{}</span> <span class=\"price-old\">{}</span><span class=\"price-tax\">Ex Tax: {}</span>",
                escape_html(new),
                escape_html(old),
                escape_html(new)
            ),
            None => String::new(),
        };
        let broken = if product.broken { " data-mock-broken" } else { "" };
        format!(
            "<div class=\"product-layout\"><div class=\"product-thumb\"{broken}><div class=\"caption\"><h4><a href=\"#\">{}</a></h4><p class=\"price\">{price}</p></div></div></div>",
            escape_html(&product.name)
        )
    }

    fn pagination(&self, category: Category, page: usize, total: usize) -> String {
        if total <= 1 && !self.endless_pagination {
            return String::new();
        }
        let link = |target: usize, label: &str| {
            format!(
                "<li><a href=\"{}\">{}</a></li>",
                escape_html(&self.category_url(category, target)),
                escape_html(label)
            )
        };
        let mut items = String::new();
        if page > 1 {
            items.push_str(&link(1, "|<"));
            items.push_str(&link(page - 1, "<"));
        }
        for i in 1..=total {
            if i == page {
                items.push_str(&format!("<li class=\"active\"><span>{i}</span></li>"));
            } else {
                items.push_str(&link(i, &i.to_string()));
            }
        }
        if page < total || self.endless_pagination {
            items.push_str(&link(page + 1, ">"));
            items.push_str(&link(total.max(page + 1), ">|"));
        }
        format!("<ul class=\"pagination\">{items}</ul>")
    }
}
