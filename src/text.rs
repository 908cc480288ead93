use scraper::{Html, Node};

const INVISIBLE_ELEMENTS: [&str; 5] = ["head", "script", "style", "noscript", "template"];

/// Text a reader would see in `html`, one space between words.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut words = Vec::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| INVISIBLE_ELEMENTS.contains(&element.name()))
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }
    words.join(" ")
}

/// Lowercases and collapses whitespace runs into single spaces.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
