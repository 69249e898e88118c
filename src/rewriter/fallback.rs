//! Literal, segment-by-segment descent used only to explain a required
//! path that matched nothing. It does not share code with the evaluator in
//! [`super::path`] and makes no promise to agree with it.

use roxmltree::{Document, Node};

use crate::report::Reporter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub root: String,
    /// Local names matched after the root, in order.
    pub matched: Vec<String>,
    /// First segment with no matching child, if the descent stopped early.
    pub missing: Option<String>,
    /// Source text of the deepest element reached, `None` when the root itself did not match.
    pub deepest: Option<String>,
}

impl Trace {
    /// `/root/child/...` down to the deepest element reached, or `none`.
    pub fn reached_path(&self) -> String {
        if self.deepest.is_none() {
            return "none".to_string();
        }
        std::iter::once(self.root.as_str())
            .chain(self.matched.iter().map(String::as_str))
            .fold(String::new(), |path, name| format!("{path}/{name}"))
    }
}

/// Bare local name of a segment: prefix and predicates removed.
fn local_name(segment: &str) -> &str {
    let name = segment.split('[').next().unwrap_or(segment).trim();
    name.rsplit(':').next().unwrap_or(name)
}

fn first_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && (name == "*" || child.tag_name().name() == name))
}

pub fn trace(document: &Document, expression: &str, reporter: &dyn Reporter) -> Trace {
    let root = document.root_element();
    let root_name = root.tag_name().name().to_string();
    reporter.info(&format!("Root element is: <{}>", root_name));

    let mut segments = expression
        .split('/')
        .map(local_name)
        .filter(|segment| !segment.is_empty());

    let mut trace = Trace {
        root: root_name,
        matched: vec![],
        missing: None,
        deepest: None,
    };

    match segments.next() {
        Some(first) if first == "*" || first == trace.root => {}
        _ => {
            reporter.info(&format!("Cannot traverse manually to path: {}", expression));
            return trace;
        }
    }

    let mut current = root;
    for segment in segments {
        match first_child(current, segment) {
            Some(child) => {
                reporter.info(&format!(
                    "Element for path segment: {} is: <{}>",
                    segment,
                    child.tag_name().name()
                ));
                trace.matched.push(child.tag_name().name().to_string());
                current = child;
            }
            None => {
                reporter.info(&format!(
                    "Element for path segment: {} is: none under <{}>",
                    segment,
                    current.tag_name().name()
                ));
                trace.missing = Some(segment.to_string());
                break;
            }
        }
    }

    let snippet = document.input_text()[current.range()].to_string();
    reporter.info(&format!(
        "Manually traversed path: {} to: {}",
        expression, snippet
    ));
    trace.deepest = Some(snippet);
    trace
}
