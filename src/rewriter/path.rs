//! A small structural path language for picking elements out of a POM.
//!
//! Supported: absolute (`/project/version`) and relative (`project/version`)
//! paths, descendant steps (`//plugin`), prefixed or bare names (`p:version`),
//! the `*` wildcard, and the predicates `[n]` (1-based) and `[child='value']`.
//! Relative paths are evaluated from the document node, like absolute ones.

use anyhow::Result;
use regex::Regex;
use roxmltree::{Document, Node};

use crate::error::SetVersionError;

/// Prefix always bound to the document's default namespace.
pub const DEFAULT_PREFIX: &str = "p";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    Any,
    Name {
        prefix: Option<String>,
        local: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Position(usize),
    ChildEquals { name: NameTest, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub test: NameTest,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    source: String,
    steps: Vec<Step>,
}

/// Prefix bindings for one document.
#[derive(Debug, Clone)]
pub struct Namespaces {
    default: String,
    fallback: String,
    declared: Vec<(String, String)>,
}

impl Namespaces {
    /// The default namespace is the root element's, or `fallback` when the
    /// document has none. Elements without a namespace are treated as living
    /// in `fallback`, so bare expressions work on either kind of POM.
    pub fn for_document(document: &Document, fallback: &str) -> Self {
        let root = document.root_element();
        Namespaces {
            default: root.tag_name().namespace().unwrap_or(fallback).to_string(),
            fallback: fallback.to_string(),
            declared: root
                .namespaces()
                .filter_map(|ns| ns.name().map(|name| (name.to_string(), ns.uri().to_string())))
                .collect(),
        }
    }

    #[cfg(test)]
    pub(crate) fn default_uri(&self) -> &str {
        &self.default
    }

    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            None | Some("") | Some(DEFAULT_PREFIX) => Some(&self.default),
            Some(prefix) => self
                .declared
                .iter()
                .find(|(name, _)| name == prefix)
                .map(|(_, uri)| uri.as_str()),
        }
    }

    fn effective<'a>(&'a self, namespace: Option<&'a str>) -> &'a str {
        namespace.unwrap_or(&self.fallback)
    }
}

impl NameTest {
    fn matches(&self, node: &Node, namespaces: &Namespaces) -> bool {
        if !node.is_element() {
            return false;
        }
        match self {
            NameTest::Any => true,
            NameTest::Name { prefix, local } => {
                let tag = node.tag_name();
                tag.name() == local
                    && namespaces.resolve(prefix.as_deref())
                        == Some(namespaces.effective(tag.namespace()))
            }
        }
    }

    fn prefix(&self) -> Option<&str> {
        match self {
            NameTest::Any => None,
            NameTest::Name { prefix, .. } => prefix.as_deref(),
        }
    }
}

fn name_regex() -> Result<Regex> {
    Ok(Regex::new(
        r"^(?:([A-Za-z_][\w.\-]*):)?([A-Za-z_][\w.\-]*|\*)$",
    )?)
}

fn position_regex() -> Result<Regex> {
    Ok(Regex::new(r"^\s*(\d+)\s*$")?)
}

fn child_equals_regex() -> Result<Regex> {
    Ok(Regex::new(
        r#"^\s*((?:[A-Za-z_][\w.\-]*:)?[A-Za-z_][\w.\-]*)\s*=\s*(?:'([^']*)'|"([^"]*)")\s*$"#,
    )?)
}

impl PathExpression {
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |reason: &str| SetVersionError::invalid_expression(source, reason);
        let name_regex = name_regex()?;

        let mut rest = source.trim();
        if rest.is_empty() {
            return Err(invalid("expression is empty").into());
        }

        let mut axis = Axis::Child;
        if let Some(stripped) = rest.strip_prefix("//") {
            axis = Axis::Descendant;
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        }

        let mut steps = vec![];
        loop {
            let (step_text, remainder) = split_step(rest).ok_or_else(|| invalid("unbalanced brackets or quotes"))?;
            if step_text.trim().is_empty() {
                return Err(invalid("empty step").into());
            }
            steps.push(parse_step(axis, step_text.trim(), &name_regex, source)?);

            if remainder.is_empty() {
                break;
            }
            if let Some(stripped) = remainder.strip_prefix("//") {
                axis = Axis::Descendant;
                rest = stripped;
            } else {
                axis = Axis::Child;
                rest = &remainder[1..];
            }
            if rest.is_empty() {
                return Err(invalid("trailing '/'").into());
            }
        }

        Ok(PathExpression {
            source: source.to_string(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[cfg(test)]
    pub(crate) fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Evaluates the expression and returns matching elements in document order.
    pub fn select<'a, 'input>(
        &self,
        document: &'a Document<'input>,
        namespaces: &Namespaces,
    ) -> Result<Vec<Node<'a, 'input>>> {
        self.check_prefixes(namespaces)?;

        let mut context = vec![document.root()];
        for step in &self.steps {
            let mut next = vec![];
            for node in &context {
                match step.axis {
                    Axis::Child => next.extend(select_children(*node, step, namespaces)),
                    Axis::Descendant => {
                        for parent in node.descendants() {
                            next.extend(select_children(parent, step, namespaces));
                        }
                    }
                }
            }
            next.sort_by_key(|node| node.range().start);
            next.dedup_by_key(|node| node.range().start);
            context = next;
        }
        Ok(context)
    }

    fn check_prefixes(&self, namespaces: &Namespaces) -> Result<()> {
        let tests = self.steps.iter().flat_map(|step| {
            std::iter::once(&step.test).chain(step.predicates.iter().filter_map(|predicate| {
                match predicate {
                    Predicate::ChildEquals { name, .. } => Some(name),
                    Predicate::Position(_) => None,
                }
            }))
        });
        for test in tests {
            if let Some(prefix) = test.prefix() {
                if namespaces.resolve(Some(prefix)).is_none() {
                    return Err(SetVersionError::invalid_expression(
                        &self.source,
                        format!("unknown namespace prefix '{prefix}'"),
                    )
                    .into());
                }
            }
        }
        Ok(())
    }
}

fn select_children<'a, 'input>(
    parent: Node<'a, 'input>,
    step: &Step,
    namespaces: &Namespaces,
) -> Vec<Node<'a, 'input>> {
    let mut matched: Vec<Node> = parent
        .children()
        .filter(|child| step.test.matches(child, namespaces))
        .collect();

    for predicate in &step.predicates {
        matched = match predicate {
            Predicate::Position(position) => {
                matched.get(position - 1).copied().into_iter().collect()
            }
            Predicate::ChildEquals { name, value } => matched
                .into_iter()
                .filter(|node| {
                    node.children().any(|child| {
                        name.matches(&child, namespaces)
                            && child.text().unwrap_or_default().trim() == value
                    })
                })
                .collect(),
        };
    }
    matched
}

/// Splits off the next step, ignoring `/` inside brackets and quotes.
fn split_step(input: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (index, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.checked_sub(1)?,
            (None, '/') if depth == 0 => return Some((&input[..index], &input[index..])),
            _ => {}
        }
    }
    (depth == 0 && quote.is_none()).then_some((input, ""))
}

fn parse_step(axis: Axis, text: &str, name_regex: &Regex, source: &str) -> Result<Step> {
    let invalid = |reason: String| SetVersionError::invalid_expression(source, reason);

    let (name, mut predicates_text) = match text.find('[') {
        Some(index) => (&text[..index], &text[index..]),
        None => (text, ""),
    };
    let test = parse_name_test(name.trim(), name_regex)
        .ok_or_else(|| invalid(format!("'{}' is not a valid element name", name.trim())))?;

    let position_regex = position_regex()?;
    let child_equals_regex = child_equals_regex()?;
    let mut predicates = vec![];
    while !predicates_text.is_empty() {
        let body_end = predicate_end(predicates_text)
            .ok_or_else(|| invalid(format!("malformed predicate in '{text}'")))?;
        let body = &predicates_text[1..body_end];

        if let Some(captures) = position_regex.captures(body) {
            let position: usize = captures[1]
                .parse()
                .map_err(|_| invalid(format!("position '{}' is too large", &captures[1])))?;
            if position == 0 {
                return Err(invalid("positions start at 1".to_string()).into());
            }
            predicates.push(Predicate::Position(position));
        } else if let Some(captures) = child_equals_regex.captures(body) {
            let name = parse_name_test(&captures[1], name_regex)
                .ok_or_else(|| invalid(format!("'{}' is not a valid element name", &captures[1])))?;
            let value = captures
                .get(2)
                .or_else(|| captures.get(3))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            predicates.push(Predicate::ChildEquals { name, value });
        } else {
            return Err(invalid(format!("unsupported predicate '[{body}]'")).into());
        }

        predicates_text = predicates_text[body_end + 1..].trim_start();
    }

    Ok(Step {
        axis,
        test,
        predicates,
    })
}

fn parse_name_test(name: &str, name_regex: &Regex) -> Option<NameTest> {
    let captures = name_regex.captures(name)?;
    let local = captures.get(2)?.as_str();
    let prefix = captures.get(1).map(|m| m.as_str().to_string());
    if local == "*" {
        return prefix.is_none().then_some(NameTest::Any);
    }
    Some(NameTest::Name {
        prefix,
        local: local.to_string(),
    })
}

/// Index of the `]` closing the predicate that starts at `input[0]`.
fn predicate_end(input: &str) -> Option<usize> {
    if !input.starts_with('[') {
        return None;
    }
    let mut quote: Option<char> = None;
    for (index, c) in input.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Some(index),
            _ => {}
        }
    }
    None
}
