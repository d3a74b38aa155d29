//! Reduce rendered HTML to the readable text handed to the model.

use scraper::{Html, Node};

/// Subtrees that never carry product information.
const SKIPPED_TAGS: [&str; 5] = ["header", "nav", "footer", "script", "style"];

/// Strip page chrome and return the remaining text, one block per text node.
pub fn readable_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let blocks: Vec<&str> = document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = match node.value() {
                Node::Text(text) => text.trim(),
                _ => return None,
            };
            if text.is_empty() {
                return None;
            }
            let skipped = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| SKIPPED_TAGS.contains(&el.name()))
            });
            (!skipped).then_some(text)
        })
        .collect();

    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_chrome() {
        let html = r#"
            <html>
              <head><title>Widget</title><style>body { color: red }</style></head>
              <body>
                <header><a href="/">Shop</a></header>
                <nav><ul><li>Home</li><li>Deals</li></ul></nav>
                <main>
                  <h1>Widget</h1>
                  <p>  Price: <b>$9.99</b> </p>
                </main>
                <script>track("view")</script>
                <footer>© Shop Inc</footer>
              </body>
            </html>
        "#;

        let text = readable_text(html);
        assert_eq!(text, "Widget\n\nWidget\n\nPrice:\n\n$9.99");
    }

    #[test]
    fn test_only_chrome_yields_empty() {
        let html = "<html><body><nav>Menu</nav><script>x()</script></body></html>";
        assert_eq!(readable_text(html), "");
    }

    #[test]
    fn test_fragment() {
        assert_eq!(readable_text("<html>Widget $9.99</html>"), "Widget $9.99");
    }
}
