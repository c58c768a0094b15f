//! Layout module - named templates that wrap rendered content
//!
//! A [`LayoutCollection`] maps layout names to [`Layout`]s. Each layout owns
//! a [`Template`] and may name a parent layout, so resolving an item's layout
//! yields a chain that is applied innermost first.

pub mod filters;
mod loader;

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{Result, SiteError};

pub use loader::{load_layouts, TeraTemplate};

/// Variables handed to a layout while it renders
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LayoutContext<'a> {
    /// Output of the previous step (converted body or inner layout)
    pub content: &'a str,
    pub page: &'a Value,
    /// Front-matter variables declared by the layout itself
    pub layout: &'a Value,
    pub site: &'a Value,
}

/// A rendering capability for one named layout
pub trait Template: Send + Sync {
    fn render(&self, context: &LayoutContext<'_>) -> std::result::Result<String, tera::Error>;
}

impl<F> Template for F
where
    F: Fn(&LayoutContext<'_>) -> std::result::Result<String, tera::Error> + Send + Sync,
{
    fn render(&self, context: &LayoutContext<'_>) -> std::result::Result<String, tera::Error> {
        self(context)
    }
}

/// A named template, optionally nested inside a parent layout
pub struct Layout {
    name: String,
    parent: Option<String>,
    variables: Value,
    template: Box<dyn Template>,
}

impl Layout {
    pub fn new(name: impl Into<String>, parent: Option<&str>, template: impl Template + 'static) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
            variables: Value::Object(serde_json::Map::new()),
            template: Box::new(template),
        }
    }

    /// Build a layout from a rendering closure
    pub fn from_fn<F>(name: impl Into<String>, parent: Option<&str>, render: F) -> Self
    where
        F: Fn(&LayoutContext<'_>) -> std::result::Result<String, tera::Error> + Send + Sync + 'static,
    {
        Self::new(name, parent, render)
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn variables(&self) -> &Value {
        &self.variables
    }

    pub fn render(&self, context: &LayoutContext<'_>) -> Result<String> {
        self.template
            .render(context)
            .map_err(|source| SiteError::Template {
                layout: self.name.clone(),
                source,
            })
    }
}

impl std::fmt::Debug for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

/// All layouts of a site, keyed by name. Read-only once a build starts.
#[derive(Default, Debug)]
pub struct LayoutCollection {
    layouts: HashMap<String, Layout>,
}

impl LayoutCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layout, returning any layout it replaced
    pub fn insert(&mut self, layout: Layout) -> Option<Layout> {
        self.layouts.insert(layout.name.clone(), layout)
    }

    pub fn get(&self, name: &str) -> Option<&Layout> {
        self.layouts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    /// Layout names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.layouts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Resolve `name` and every parent it declares, innermost first.
    ///
    /// Fails if a name in the chain is missing, or if a name repeats.
    pub fn resolve_chain(&self, name: &str) -> Result<Vec<&Layout>> {
        let mut chain: Vec<&Layout> = Vec::new();
        let mut next = Some(name);

        while let Some(current) = next {
            if chain.iter().any(|layout| layout.name == current) {
                let mut names: Vec<String> = chain.iter().map(|l| l.name.clone()).collect();
                names.push(current.to_string());
                return Err(SiteError::CyclicLayout { chain: names });
            }

            let layout = self
                .layouts
                .get(current)
                .ok_or_else(|| SiteError::UnresolvedLayout {
                    name: current.to_string(),
                    referenced_by: chain.last().map(|l| l.name.clone()),
                })?;

            next = layout.parent.as_deref();
            chain.push(layout);
        }

        Ok(chain)
    }
}
