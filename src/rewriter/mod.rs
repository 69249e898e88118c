use anyhow::{Result, anyhow};
use roxmltree::{Document, Node};
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::config::RewriterOptions;
use crate::error::SetVersionError;
use crate::report::Reporter;

pub mod fallback;
pub mod path;
pub mod source;

use path::{Namespaces, PathExpression};
use source::PomSource;

/// Where the POM's own version lives.
pub const PROJECT_VERSION_PATH: &str = "/p:project/p:version";
/// Where the version of the POM's parent lives.
pub const PARENT_VERSION_PATH: &str = "/p:project/p:parent/p:version";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Written { matches: usize },
    /// An optional path matched nothing; the file was not touched.
    Skipped,
}

pub(crate) fn parse_document(text: &str) -> Result<Document<'_>, roxmltree::Error> {
    let mut options = roxmltree::ParsingOptions::default();
    options.allow_dtd = true;
    Document::parse_with_options(text, options)
}

/// Rewrites the text content of elements selected by a path expression,
/// leaving every byte outside those elements as it was.
#[derive(Debug, Clone, Default)]
pub struct PomRewriter {
    options: RewriterOptions,
}

impl PomRewriter {
    pub fn new(options: RewriterOptions) -> Self {
        PomRewriter { options }
    }

    pub fn backup_path(&self, file: &Path) -> PathBuf {
        file.with_file_name(&self.options.backup_file_name)
    }

    pub fn apply_update(
        &self,
        file: impl AsRef<Path>,
        expression: &str,
        new_value: &str,
        required: bool,
        reporter: &dyn Reporter,
    ) -> Result<UpdateOutcome> {
        let file = file.as_ref();
        let path_expression = PathExpression::parse(expression)?;
        let source = PomSource::read(file)?;
        let text = &source.text;

        let (contents, matches) = {
            let document = parse_document(text).map_err(|source| SetVersionError::Parse {
                path: file.to_path_buf(),
                source,
            })?;
            let namespaces = Namespaces::for_document(&document, &self.options.default_namespace);
            let elements = path_expression.select(&document, &namespaces)?;

            if elements.is_empty() {
                if !required {
                    reporter.info(&format!("Nothing to do for POM: {}", file.display()));
                    return Ok(UpdateOutcome::Skipped);
                }

                reporter.debug(text);
                let trace = fallback::trace(&document, expression, reporter);
                return Err(SetVersionError::Unresolved {
                    expression: expression.to_string(),
                    path: file.to_path_buf(),
                    reached: trace.reached_path(),
                }
                .into());
            }

            reporter.debug(&format!(
                "Path {} matched {} element(s) in {}",
                path_expression.as_str(),
                elements.len(),
                file.display()
            ));
            replace_contents(text, &elements, new_value)?
        };

        self.persist(file, &source.encode(&contents), reporter)?;
        Ok(UpdateOutcome::Written { matches })
    }

    /// Moves the original aside, then writes the new contents in its place.
    /// If the write fails the original only survives as the backup.
    fn persist(&self, file: &Path, contents: &[u8], reporter: &dyn Reporter) -> Result<()> {
        let backup = self.backup_path(file);
        std::fs::rename(file, &backup).map_err(|source| SetVersionError::Backup {
            path: file.to_path_buf(),
            backup: backup.clone(),
            source,
        })?;
        reporter.debug(&format!("Backed up {} to {}", file.display(), backup.display()));

        std::fs::write(file, contents).map_err(|source| SetVersionError::Write {
            path: file.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

struct Splice {
    range: Range<usize>,
    replacement: String,
}

/// Replaces the whole content of every element with `value`. When matches
/// nest, only the outermost is rewritten since it swallows the others.
/// Returns the new text and how many elements were rewritten.
fn replace_contents(text: &str, elements: &[Node], value: &str) -> Result<(String, usize)> {
    let escaped = escape_text(value);
    let mut splices: Vec<Splice> = vec![];
    for element in elements {
        let element_range = element.range();
        if splices
            .last()
            .is_some_and(|last| element_range.start < last.range.end)
        {
            continue;
        }
        splices.push(content_splice(text, element_range, &escaped)?);
    }

    let mut output = String::with_capacity(text.len() + splices.len() * escaped.len());
    let mut cursor = 0;
    for splice in &splices {
        output.push_str(&text[cursor..splice.range.start]);
        output.push_str(&splice.replacement);
        cursor = splice.range.end;
    }
    output.push_str(&text[cursor..]);
    Ok((output, splices.len()))
}

fn content_splice(text: &str, element: Range<usize>, escaped: &str) -> Result<Splice> {
    let raw = &text[element.clone()];
    let open_end = start_tag_end(raw)
        .ok_or_else(|| anyhow!("Unterminated start tag at byte {}", element.start))?;

    if raw[..open_end].ends_with('/') {
        let name_end = raw[1..]
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .map_or(raw.len(), |index| index + 1);
        return Ok(Splice {
            range: element.start + open_end - 1..element.start + open_end + 1,
            replacement: format!(">{}</{}>", escaped, &raw[1..name_end]),
        });
    }

    let close_start = raw
        .rfind("</")
        .ok_or_else(|| anyhow!("Missing end tag for element at byte {}", element.start))?;
    Ok(Splice {
        range: element.start + open_end + 1..element.start + close_start,
        replacement: escaped.to_string(),
    })
}

/// Index of the `>` closing the start tag, skipping quoted attribute values.
fn start_tag_end(raw: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (index, byte) in raw.bytes().enumerate() {
        match (quote, byte) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(byte),
            (None, b'>') => return Some(index),
            _ => {}
        }
    }
    None
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
