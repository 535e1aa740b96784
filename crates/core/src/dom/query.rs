//! Selector matching for the subset the strategy tables use: tag, `.class`,
//! `#id`, `[attr*="sub"]`, compounds of those, descendant chains, and
//! comma-separated alternatives.

use super::{DomNode, NodeKind};

/// A parsed selector: one or more descendant chains (comma alternatives).
#[derive(Debug, Clone)]
pub struct Selector {
    chains: Vec<Chain>,
}

#[derive(Debug, Clone)]
struct Chain {
    steps: Vec<Step>,
}

/// One whitespace-separated compound: every part must match the same node.
#[derive(Debug, Clone)]
struct Step {
    parts: Vec<Part>,
}

#[derive(Debug, Clone)]
enum Part {
    Tag(String),
    Class(String),
    Id(String),
    /// `[attr*="value"]` substring match.
    AttrContains(String, String),
}

impl Selector {
    /// Parse a selector string. Returns None for empty or malformed input;
    /// callers treat that as "matches nothing".
    pub fn parse(input: &str) -> Option<Selector> {
        let mut chains = Vec::new();
        for alt in input.split(',') {
            let alt = alt.trim();
            if alt.is_empty() {
                continue;
            }
            let mut steps = Vec::new();
            for token in alt.split_whitespace() {
                steps.push(parse_step(token)?);
            }
            if !steps.is_empty() {
                chains.push(Chain { steps });
            }
        }
        if chains.is_empty() {
            None
        } else {
            Some(Selector { chains })
        }
    }
}

fn parse_step(token: &str) -> Option<Step> {
    let mut parts = Vec::new();
    let mut chars = token.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '.' => {
                chars.next();
                let name = read_ident(&mut chars);
                if name.is_empty() {
                    return None;
                }
                parts.push(Part::Class(name));
            }
            '#' => {
                chars.next();
                let name = read_ident(&mut chars);
                if name.is_empty() {
                    return None;
                }
                parts.push(Part::Id(name));
            }
            '[' => {
                chars.next();
                let inner: String = chars.by_ref().take_while(|&c| c != ']').collect();
                let (attr, value) = inner.split_once("*=")?;
                let value = value.trim().trim_matches('"').trim_matches('\'');
                parts.push(Part::AttrContains(
                    attr.trim().to_string(),
                    value.to_string(),
                ));
            }
            '*' => {
                chars.next();
                // Universal: matches any element, no part needed.
            }
            _ => {
                let name = read_ident(&mut chars);
                if name.is_empty() {
                    return None;
                }
                parts.push(Part::Tag(name.to_ascii_lowercase()));
            }
        }
    }

    Some(Step { parts })
}

fn read_ident(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
            chars.next();
        } else {
            break;
        }
    }
    out
}

fn step_matches(node: &DomNode, step: &Step) -> bool {
    if node.kind != NodeKind::Element {
        return false;
    }
    step.parts.iter().all(|part| match part {
        Part::Tag(tag) => node.tag == *tag,
        Part::Class(class) => node.has_class(class),
        Part::Id(id) => node.attr("id") == Some(id.as_str()),
        Part::AttrContains(attr, value) => node
            .attr(attr)
            .map(|v| v.contains(value.as_str()))
            .unwrap_or(false),
    })
}

/// Collect matches in document order. A node matches a chain when it
/// satisfies the final step and its ancestor path covers the earlier steps
/// in order (descendant combinator only).
pub fn select<'a>(root: &'a DomNode, selector: &Selector) -> Vec<&'a DomNode> {
    let mut out = Vec::new();
    let mut ancestors: Vec<&DomNode> = Vec::new();
    walk(root, selector, &mut ancestors, &mut out);
    out
}

fn walk<'a>(
    node: &'a DomNode,
    selector: &Selector,
    ancestors: &mut Vec<&'a DomNode>,
    out: &mut Vec<&'a DomNode>,
) {
    if node.kind == NodeKind::Element {
        for chain in &selector.chains {
            if chain_matches(node, ancestors, &chain.steps) {
                out.push(node);
                break;
            }
        }
    }
    ancestors.push(node);
    for child in &node.children {
        walk(child, selector, ancestors, out);
    }
    ancestors.pop();
}

fn chain_matches(node: &DomNode, ancestors: &[&DomNode], steps: &[Step]) -> bool {
    let (last, prefix) = match steps.split_last() {
        Some(split) => split,
        None => return false,
    };
    if !step_matches(node, last) {
        return false;
    }
    // Greedy subsequence match over the ancestor path.
    let mut idx = 0;
    for ancestor in ancestors {
        if idx == prefix.len() {
            break;
        }
        if step_matches(ancestor, &prefix[idx]) {
            idx += 1;
        }
    }
    idx == prefix.len()
}
