use crate::extract::collapse_whitespace;
use scraper::{ElementRef, Html};

/// Subtrees that never count as visible text
pub const STRIPPED_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

/// Visible text with chrome and scripts removed, whitespace collapsed
pub fn extract_text_content(document: &Html) -> String {
    let mut fragments = Vec::new();
    collect_text(document.root_element(), STRIPPED_TAGS, &mut fragments);
    collapse_whitespace(fragments.into_iter())
}

/// All text in the document, stripped of markup only
///
/// Used for contact detection, which also looks inside headers and footers.
pub fn extract_full_text(document: &Html) -> String {
    let mut fragments = Vec::new();
    collect_text(document.root_element(), &["script", "style"], &mut fragments);
    collapse_whitespace(fragments.into_iter())
}

fn collect_text<'a>(element: ElementRef<'a>, skip: &[&str], out: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !skip.contains(&child_element.value().name()) {
                collect_text(child_element, skip, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_layout_and_scripts() {
        let document = Html::parse_document(
            r#"<html><head><style>p { color: red }</style></head><body>
            <nav>Menu</nav><header>Logo</header>
            <p>First   paragraph.</p>
            <aside>Sidebar</aside>
            <div>Second<br>line</div>
            <script>track()</script>
            <footer>Legal</footer>
            </body></html>"#,
        );
        assert_eq!(
            extract_text_content(&document),
            "First paragraph. Second line"
        );
    }

    #[test]
    fn test_full_text_keeps_footer() {
        let document = Html::parse_document(
            "<body><p>Body</p><footer>Call 555-123-4567</footer><script>x()</script></body>",
        );
        assert_eq!(extract_full_text(&document), "Body Call 555-123-4567");
    }

    #[test]
    fn test_nested_stripped_tags() {
        let document =
            Html::parse_document("<body><div><nav><p>hidden</p></nav><span>shown</span></div></body>");
        assert_eq!(extract_text_content(&document), "shown");
    }
}
