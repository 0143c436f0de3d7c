//! Markup parser for template output.
//!
//! Parses the markup subset templates emit into inert [`NodeRef`] trees:
//! elements with quoted or bare attributes, self-closing and void
//! elements, text, comments (dropped) and the five basic entities.
//!
//! The parser is strict: a mismatched or unclosed tag is a
//! [`Error::MalformedRender`], never a best-effort recovery. Template
//! markup is produced by code, so a parse failure is a template bug that
//! must surface.

use crate::error::Error;

use super::NodeRef;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub(super) fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

// =============================================================================
// Public API
// =============================================================================

/// Parse markup into its top-level nodes, in document order.
///
/// Text nodes (including whitespace-only ones) are preserved; comments
/// are dropped.
pub fn parse(input: &str) -> Result<Vec<NodeRef>, Error> {
    Parser::new(input).run()
}

/// Reduce parsed top-level nodes to the single root element a render
/// pass requires.
///
/// Whitespace-only text between elements is ignored; anything else -
/// zero roots, several roots, or a bare text root - is
/// [`Error::MalformedRender`].
pub fn single_root(nodes: Vec<NodeRef>) -> Result<NodeRef, Error> {
    let mut significant = nodes.into_iter().filter(|node| {
        node.is_element() || !node.text_content().chars().all(char::is_whitespace)
    });

    match (significant.next(), significant.next()) {
        (Some(root), None) if root.is_element() => Ok(root),
        (Some(_), None) => Err(Error::MalformedRender(
            "root node is text, expected an element".to_string(),
        )),
        (None, _) => Err(Error::MalformedRender(
            "expected exactly one root element, found none".to_string(),
        )),
        (Some(_), Some(_)) => Err(Error::MalformedRender(
            "expected exactly one root element, found several".to_string(),
        )),
    }
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn run(mut self) -> Result<Vec<NodeRef>, Error> {
        let mut roots: Vec<NodeRef> = Vec::new();
        // Stack of currently open elements.
        let mut open: Vec<NodeRef> = Vec::new();

        while !self.at_end() {
            if self.eat("<!--") {
                self.skip_comment()?;
            } else if self.eat("</") {
                let tag = self.parse_tag_name()?;
                self.skip_whitespace();
                if !self.eat(">") {
                    return Err(self.err(&format!("malformed closing tag `</{tag}`")));
                }
                match open.pop() {
                    Some(node) if node.tag().as_deref() == Some(tag.as_str()) => {}
                    Some(node) => {
                        return Err(self.err(&format!(
                            "closing tag `</{tag}>` does not match open `<{}>`",
                            node.tag().unwrap_or_default()
                        )));
                    }
                    None => {
                        return Err(self.err(&format!("closing tag `</{tag}>` with nothing open")));
                    }
                }
            } else if self.peek() == Some('<') {
                self.pos += 1;
                let element = self.parse_element(&mut open)?;
                Self::attach(&mut roots, &open, element);
            } else {
                let text = self.parse_text();
                Self::attach(&mut roots, &open, NodeRef::text(&text));
            }
        }

        if let Some(node) = open.last() {
            return Err(self.err(&format!(
                "unclosed tag `<{}>`",
                node.tag().unwrap_or_default()
            )));
        }
        Ok(roots)
    }

    /// Attach a finished node either to the innermost open element or to
    /// the top level.
    fn attach(roots: &mut Vec<NodeRef>, open: &[NodeRef], node: NodeRef) {
        match open.last() {
            // The node's own entry may be on top of the stack; its
            // parent is the entry below it.
            Some(top) if top.ptr_eq(&node) => {
                if open.len() >= 2 {
                    open[open.len() - 2].append_child(&node);
                } else {
                    roots.push(node);
                }
            }
            Some(top) => top.append_child(&node),
            None => roots.push(node),
        }
    }

    /// Parse an element after the opening `<` has been consumed. Pushes
    /// the element onto `open` unless it is self-closing or void.
    fn parse_element(&mut self, open: &mut Vec<NodeRef>) -> Result<NodeRef, Error> {
        let tag = self.parse_tag_name()?;
        let element = NodeRef::element(&tag);

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    if !is_void_element(&tag) {
                        open.push(element.clone());
                    }
                    return Ok(element);
                }
                Some('/') => {
                    self.pos += 1;
                    if !self.eat(">") {
                        return Err(self.err("expected `>` after `/`"));
                    }
                    return Ok(element);
                }
                Some(_) => {
                    let (name, value) = self.parse_attribute()?;
                    element.set_attr(&name, &value);
                }
                None => return Err(self.err(&format!("unterminated tag `<{tag}`"))),
            }
        }
    }

    fn parse_attribute(&mut self) -> Result<(String, String), Error> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '=' || c == '>' || c == '/' {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(self.err("expected attribute name"));
        }
        let name = self.src[start..self.pos].to_string();

        self.skip_whitespace();
        if !self.eat("=") {
            // Bare attribute: present with an empty value.
            return Ok((name, String::new()));
        }
        self.skip_whitespace();

        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c == quote {
                        break;
                    }
                    self.pos += c.len_utf8();
                }
                if self.at_end() {
                    return Err(self.err(&format!("unterminated value for attribute `{name}`")));
                }
                let raw = &self.src[start..self.pos];
                self.pos += 1;
                unescape(raw)
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == '>' || c == '/' {
                        break;
                    }
                    self.pos += c.len_utf8();
                }
                unescape(&self.src[start..self.pos])
            }
        };
        Ok((name, value))
    }

    fn parse_tag_name(&mut self) -> Result<String, Error> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '-' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.err("expected tag name"));
        }
        Ok(self.src[start..self.pos].to_ascii_lowercase())
    }

    fn parse_text(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '<' {
                break;
            }
            self.pos += c.len_utf8();
        }
        unescape(&self.src[start..self.pos])
    }

    fn skip_comment(&mut self) -> Result<(), Error> {
        match self.src[self.pos..].find("-->") {
            Some(offset) => {
                self.pos += offset + 3;
                Ok(())
            }
            None => Err(self.err("unterminated comment")),
        }
    }

    // =========================================================================
    // Cursor Helpers
    // =========================================================================

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.src[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn err(&self, message: &str) -> Error {
        Error::MalformedRender(format!("{message} (at byte {})", self.pos))
    }
}

/// Decode the five basic entities.
fn unescape(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_element() {
        let nodes = parse("<button type=\"submit\">Save</button>").unwrap();
        assert_eq!(nodes.len(), 1);
        let button = &nodes[0];
        assert_eq!(button.tag().as_deref(), Some("button"));
        assert_eq!(button.attr("type").as_deref(), Some("submit"));
        assert_eq!(button.text_content(), "Save");
    }

    #[test]
    fn test_parse_nested_structure() {
        let nodes = parse("<div class=\"card\"><h1>Title</h1><p>Body <em>text</em></p></div>")
            .unwrap();
        let div = single_root(nodes).unwrap();
        let children = div.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].tag().as_deref(), Some("h1"));
        assert_eq!(children[1].text_content(), "Body text");
    }

    #[test]
    fn test_parse_attribute_styles() {
        let nodes = parse("<input disabled value='a b' data-id=c1>").unwrap();
        let input = &nodes[0];
        assert_eq!(input.attr("disabled").as_deref(), Some(""));
        assert_eq!(input.attr("value").as_deref(), Some("a b"));
        assert_eq!(input.attr("data-id").as_deref(), Some("c1"));
    }

    #[test]
    fn test_parse_void_and_self_closing() {
        let nodes = parse("<div><br><img src=\"x.png\"/><span/></div>").unwrap();
        let div = single_root(nodes).unwrap();
        let children = div.children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].tag().as_deref(), Some("br"));
        assert_eq!(children[1].attr("src").as_deref(), Some("x.png"));
        assert_eq!(children[2].tag().as_deref(), Some("span"));
        assert!(children[2].children().is_empty());
    }

    #[test]
    fn test_parse_entities() {
        let nodes = parse("<p title=\"&quot;q&quot;\">1 &lt; 2 &amp;&amp; 3 &gt; 2</p>").unwrap();
        let p = &nodes[0];
        assert_eq!(p.attr("title").as_deref(), Some("\"q\""));
        assert_eq!(p.text_content(), "1 < 2 && 3 > 2");
    }

    #[test]
    fn test_parse_drops_comments() {
        let nodes = parse("<div><!-- note -->kept</div>").unwrap();
        assert_eq!(nodes[0].text_content(), "kept");
    }

    #[test]
    fn test_parse_rejects_mismatched_close() {
        let err = parse("<div><span></div>").unwrap_err();
        assert!(matches!(err, Error::MalformedRender(_)));
    }

    #[test]
    fn test_parse_rejects_unclosed_tag() {
        assert!(parse("<div><p>text</p>").is_err());
        assert!(parse("<div").is_err());
    }

    #[test]
    fn test_parse_rejects_stray_close() {
        assert!(parse("</div>").is_err());
    }

    #[test]
    fn test_single_root_accepts_surrounding_whitespace() {
        let nodes = parse("\n  <div></div>\n").unwrap();
        let root = single_root(nodes).unwrap();
        assert_eq!(root.tag().as_deref(), Some("div"));
    }

    #[test]
    fn test_single_root_rejects_zero_and_multiple() {
        assert!(matches!(
            single_root(parse("").unwrap()),
            Err(Error::MalformedRender(_))
        ));
        assert!(matches!(
            single_root(parse("<a></a><b></b>").unwrap()),
            Err(Error::MalformedRender(_))
        ));
        assert!(matches!(
            single_root(parse("just text").unwrap()),
            Err(Error::MalformedRender(_))
        ));
    }

    #[test]
    fn test_tag_names_lowercased() {
        let nodes = parse("<DIV></DIV>").unwrap();
        assert_eq!(nodes[0].tag().as_deref(), Some("div"));
    }
}
