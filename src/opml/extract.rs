use std::collections::HashSet;

use super::document::{Document, NodeId};

/// Attribute names that may carry a feed URL, in priority order.
///
/// Only the first name present on an outline is consulted, even when its
/// value is blank.
pub const URL_ATTRIBUTES: [&str; 4] = ["xmlUrl", "xmlurl", "url", "href"];

/// Collects the feed URLs of every `<outline>` in the document.
///
/// Each outline below the root is walked depth-first, pre-order, through its
/// directly nested outlines. URLs are trimmed; blank values and repeats are
/// skipped, so the result holds unique values in first-seen order.
///
/// An outline already reached from an enclosing walk is not walked again:
/// every URL in its subtree has been seen by then.
pub fn extract_feed_urls(doc: &Document) -> Vec<String> {
    let mut urls = Vec::new();
    let mut seen = HashSet::new();
    let mut walked = vec![false; doc.len()];

    for start in doc.descendants() {
        if walked[start] || !doc.node(start).is_outline() {
            continue;
        }

        let mut stack: Vec<NodeId> = vec![start];
        while let Some(id) = stack.pop() {
            walked[id] = true;
            let node = doc.node(id);

            if let Some(url) = outline_url(doc, id) {
                if seen.insert(url.to_string()) {
                    urls.push(url.to_string());
                } else {
                    tracing::debug!(url = %url, "Skipping duplicate feed URL");
                }
            }

            // Reversed so the first child is popped first.
            stack.extend(
                node.children()
                    .iter()
                    .rev()
                    .copied()
                    .filter(|&child| doc.node(child).is_outline()),
            );
        }
    }

    urls
}

/// Trimmed URL of a single outline, or `None` when it has none or it is blank.
fn outline_url(doc: &Document, id: NodeId) -> Option<&str> {
    let node = doc.node(id);
    let (name, value) = URL_ATTRIBUTES
        .iter()
        .find_map(|&name| node.attribute(name).map(|value| (name, value)))?;

    let url = value.trim();
    if url.is_empty() {
        tracing::debug!(attribute = name, "Skipping outline with blank feed URL");
        return None;
    }
    Some(url)
}
