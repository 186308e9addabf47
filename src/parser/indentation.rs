use tracing::debug;

/// Why a line's indentation was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndentationError {
    /// The first indented line mixes tabs and spaces
    MixedInitial,
    /// The line uses the other indentation character than the document
    WrongCharacter { tabs: bool },
    /// Not a whole multiple of the indentation unit
    NotMultiple { width: usize, unit: usize },
    /// More than one level deeper than the previous line
    TooDeep { levels: usize },
}

impl IndentationError {
    pub fn message(&self, unit: usize, with_tabs: bool) -> String {
        let established = describe(unit, with_tabs);
        match self {
            IndentationError::MixedInitial => "indentation can't use both tabs and spaces".to_string(),
            IndentationError::WrongCharacter { tabs } => format!(
                "the line is indented with {}, but the rest of the document was indented using {}",
                if *tabs { "tabs" } else { "spaces" },
                established
            ),
            IndentationError::NotMultiple { width, unit } => format!(
                "the line is indented {} characters, which is not a multiple of the {}-character indentation unit",
                width, unit
            ),
            IndentationError::TooDeep { levels } => {
                format!("the line was indented {} levels deeper than the previous line", levels)
            }
        }
    }
}

fn describe(unit: usize, with_tabs: bool) -> String {
    let noun = match (with_tabs, unit) {
        (true, 1) => "tab",
        (true, _) => "tabs",
        (false, 1) => "space",
        (false, _) => "spaces",
    };
    format!("{} {}", unit, noun)
}

/// Tracks indentation across one document.
///
/// The first indented line fixes the unit width and whether the document
/// indents with tabs; every later line is checked against both. One value
/// per document parse.
#[derive(Debug, Default)]
pub struct IndentationValidator {
    current_indentation: usize,
    unit_size: Option<usize>,
    indent_with_tabs: bool,
}

impl IndentationValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit_size(&self) -> Option<usize> {
        self.unit_size
    }

    pub fn indent_with_tabs(&self) -> bool {
        self.indent_with_tabs
    }

    pub fn current_indentation(&self) -> usize {
        self.current_indentation
    }

    /// Validate the indentation of one line.
    ///
    /// Returns the effective indentation width. Inside a filter block the
    /// width is capped one unit below the filter line and whatever lies
    /// beyond belongs to the filter body; the tracked indentation stays put.
    pub fn observe(&mut self, indentation: &str, within_filter: bool) -> Result<usize, IndentationError> {
        if indentation.is_empty() {
            if !within_filter {
                self.current_indentation = 0;
            }
            return Ok(0);
        }

        let unit = match self.unit_size {
            Some(unit) => unit,
            None => {
                let all_tabs = indentation.chars().all(|c| c == '\t');
                let all_spaces = indentation.chars().all(|c| c == ' ');
                if !all_tabs && !all_spaces {
                    return Err(IndentationError::MixedInitial);
                }
                let unit = indentation.len();
                self.unit_size = Some(unit);
                self.indent_with_tabs = all_tabs;
                debug!(unit, tabs = all_tabs, "indentation unit established");
                unit
            }
        };

        let next_level = self.current_indentation + unit;
        let effective = if within_filter && indentation.len() > next_level {
            &indentation[..next_level]
        } else {
            indentation
        };

        let expected = if self.indent_with_tabs { '\t' } else { ' ' };
        if let Some(wrong) = effective.chars().find(|c| *c != expected) {
            return Err(IndentationError::WrongCharacter { tabs: wrong == '\t' });
        }
        if effective.len() % unit != 0 {
            return Err(IndentationError::NotMultiple {
                width: effective.len(),
                unit,
            });
        }
        if effective.len() > next_level {
            return Err(IndentationError::TooDeep {
                levels: (effective.len() - self.current_indentation) / unit,
            });
        }

        if !within_filter {
            self.current_indentation = effective.len();
        }
        Ok(effective.len())
    }

    /// Depth in units for an effective width returned by [`observe`](Self::observe).
    pub fn depth_of(&self, width: usize) -> usize {
        match self.unit_size {
            Some(unit) if unit > 0 => width / unit,
            _ => 0,
        }
    }
}
