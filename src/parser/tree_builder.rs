use std::iter::Peekable;
use std::vec::IntoIter;

use crate::ast::{Content, Line, LineKind};
use crate::error::{CompileError, ErrorKind, Result};

/// Builds the line tree from the scanner's flat line list
pub struct TreeBuilder {
    lines: Peekable<IntoIter<Line>>,
}

impl TreeBuilder {
    pub fn new(lines: Vec<Line>) -> Self {
        Self {
            lines: lines.into_iter().peekable(),
        }
    }

    pub fn build(mut self) -> Result<Vec<Line>> {
        self.build_level(0)
    }

    /// Collect the lines at `depth`, each with its deeper lines attached.
    /// Stops at the first line shallower than `depth`.
    fn build_level(&mut self, depth: usize) -> Result<Vec<Line>> {
        let mut siblings: Vec<Line> = Vec::new();

        while let Some(next) = self.lines.peek() {
            if next.kind != LineKind::Blank {
                if next.depth < depth {
                    break;
                }
                if next.depth > depth {
                    // Only reachable for an indented first line: every other
                    // deeper line is consumed as a child of its predecessor.
                    return Err(CompileError::new(
                        ErrorKind::InconsistentIndentation,
                        "indenting at the beginning of the document is illegal",
                        next.span,
                    ));
                }
            }

            let Some(mut line) = self.lines.next() else {
                break;
            };
            if line.kind == LineKind::Blank {
                line.depth = depth;
                siblings.push(line);
                continue;
            }
            let children = self.build_level(depth + 1)?;
            attach(&mut line, children)?;
            siblings.push(line);
        }

        Ok(siblings)
    }
}

/// Give `children` to `line`. Blank-only child lists are dropped.
fn attach(line: &mut Line, children: Vec<Line>) -> Result<()> {
    if children.iter().all(|child| child.kind == LineKind::Blank) {
        return Ok(());
    }

    let content = match &mut line.kind {
        LineKind::Element(element) => &mut element.content,
        LineKind::Freeform(freeform) => &mut freeform.content,
        LineKind::Blank => return Ok(()),
    };

    match content {
        Content::Empty => {
            *content = Content::Nested(children);
            Ok(())
        }
        Content::Inline(_) => Err(CompileError::new(
            ErrorKind::IllegalNesting,
            "content can't be both given on the same line and nested",
            line.span,
        )
        .with_help("move the inline content into the nested block")),
        // Filter bodies swallow every deeper line, so nothing else can nest here.
        Content::Nested(_) | Content::Raw(_) => Err(CompileError::new(
            ErrorKind::IllegalNesting,
            "illegal nesting",
            line.span,
        )),
    }
}
