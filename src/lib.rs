//! Compiles Haml-style templates to HTML with embedded JSP expressions
//! (`<%= %>`) and scriptlets (`<% %>`).
//!
//! ```
//! use haml_jsp::{compile, Config};
//!
//! let html = compile("%p{:a => foo(\"'<>&\")}", &Config::default()).unwrap();
//! assert_eq!(html, "<p a='<%= foo(\"'<>&\") %>'></p>");
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod generate;
pub mod html;
pub mod parser;

pub use ast::{AttributeMap, AttributeValue, Document, Line, LineKind};
pub use config::{Config, Filter, Format};
pub use error::{CompileError, ErrorKind};
pub use generate::{FreeformKind, Generator, JspGenerator};
pub use parser::{HamlParser, Parser, Position, Span};

/// Compiles documents with one shared, read-only configuration.
///
/// Holds no per-document state: every call scans with a fresh parser, so one
/// `Compiler` may be used from several threads at once.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'a> {
    config: &'a Config,
}

impl<'a> Compiler<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Parse `source` without rendering it
    pub fn parse(&self, source: &str) -> Result<Document, CompileError> {
        HamlParser::new().parse(source)
    }

    pub fn compile(&self, source: &str) -> Result<String, CompileError> {
        let document = self.parse(source)?;
        JspGenerator::new(self.config).generate(&document)
    }
}

/// Compile one document
pub fn compile(source: &str, config: &Config) -> Result<String, CompileError> {
    Compiler::new(config).compile(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_compile_document() {
        let source = "!!!\n%html\n  %body\n    %h1#title.big Hello\n    - if user != null\n      %p= user.getName()\n";
        let expected = concat!(
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd\">\n",
            "<html>\n",
            "  <body>\n",
            "    <h1 class='big' id='title'>Hello</h1>\n",
            "    <% if (user != null) { %>\n",
            "      <p><%= user.getName() %></p>\n",
            "    <% } %>\n",
            "  </body>\n",
            "</html>"
        );
        assert_eq!(compile(source, &Config::default()).unwrap(), expected);
    }

    #[test]
    fn test_failure_produces_no_output() {
        let err = compile("%p\n  %q\n   %r", &Config::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InconsistentIndentation);
    }

    #[test]
    fn test_shared_config_across_threads() {
        let config = Config::new().with_filter("plain", |text: &str| text.to_string());
        let compiler = Compiler::new(&config);

        thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    scope.spawn(move || {
                        // every other document uses a different indentation unit
                        let source = if i % 2 == 0 {
                            format!("%div\n  %p {}\n  :plain\n    raw", i)
                        } else {
                            format!("%div\n    %p {}\n    :plain\n        raw", i)
                        };
                        compiler.compile(&source)
                    })
                })
                .collect();

            for (i, handle) in handles.into_iter().enumerate() {
                let output = handle.join().unwrap().unwrap();
                assert_eq!(output, format!("<div>\n  <p>{}</p>\n  raw\n</div>", i));
            }
        });
    }
}
