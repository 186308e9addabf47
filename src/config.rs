use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::html::DEFAULT_AUTOCLOSE;

/// Output markup flavour. Only changes how boolean attributes render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Html4,
    Html5,
    #[default]
    Xhtml,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Html4 => "html4",
            Format::Html5 => "html5",
            Format::Xhtml => "xhtml",
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, Format::Html4 | Format::Html5)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html4" => Ok(Format::Html4),
            "html5" => Ok(Format::Html5),
            "xhtml" => Ok(Format::Xhtml),
            other => Err(format!("unknown format '{}' (expected html4, html5 or xhtml)", other)),
        }
    }
}

/// Processes the body of a `:name` block. The returned text is spliced into
/// the output as-is.
pub trait Filter: Send + Sync {
    fn process(&self, text: &str) -> String;
}

impl<F> Filter for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn process(&self, text: &str) -> String {
        self(text)
    }
}

/// Read-only compilation settings, shareable across threads.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub format: Format,
    /// Tags that self-close when they have no content
    pub autoclose: BTreeSet<String>,
    #[serde(skip)]
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: Format::default(),
            autoclose: DEFAULT_AUTOCLOSE.iter().map(|tag| tag.to_string()).collect(),
            filters: HashMap::new(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut filters: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        filters.sort_unstable();
        f.debug_struct("Config")
            .field("format", &self.format)
            .field("autoclose", &self.autoclose)
            .field("filters", &filters)
            .finish()
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON form: `{"format": "html5", "autoclose": ["br"]}`.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_autoclose<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.autoclose = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, filter: impl Filter + 'static) -> Self {
        self.filters.insert(name.into(), Arc::new(filter));
        self
    }

    pub fn is_autoclose(&self, tag: &str) -> bool {
        self.autoclose.contains(tag)
    }

    pub fn filter(&self, name: &str) -> Option<&dyn Filter> {
        self.filters.get(name).map(|filter| filter.as_ref())
    }
}
