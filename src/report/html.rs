//! Minimal HTML builder with escaping built in.
//!
//! Tag names, class names and attribute names are `&'static str`, so only
//! markup written in source can reach the output unescaped. All runtime text
//! and attribute values go through [`escape_html`].

/// Escape text for use in HTML content or double/single quoted attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Streaming HTML writer that tracks open elements
#[derive(Debug, Default)]
pub struct HtmlWriter {
    buf: String,
    open: Vec<&'static str>,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a document with a doctype
    pub fn document() -> Self {
        let mut w = Self::new();
        w.buf.push_str("<!DOCTYPE html>\n");
        w
    }

    /// Open an element with an optional class
    pub fn open(&mut self, tag: &'static str, class: Option<&'static str>) -> &mut Self {
        match class {
            Some(class) if !class.is_empty() => self.open_attrs(tag, &[("class", class)]),
            _ => self.open_attrs(tag, &[]),
        }
    }

    /// Open an element with attributes; values are escaped
    pub fn open_attrs(&mut self, tag: &'static str, attrs: &[(&'static str, &str)]) -> &mut Self {
        self.start_tag(tag, attrs);
        self.open.push(tag);
        self
    }

    /// Write a void element (`<meta>`, `<img>`)
    pub fn void(&mut self, tag: &'static str, attrs: &[(&'static str, &str)]) -> &mut Self {
        self.start_tag(tag, attrs);
        self.buf.push('\n');
        self
    }

    fn start_tag(&mut self, tag: &'static str, attrs: &[(&'static str, &str)]) {
        self.buf.push('<');
        self.buf.push_str(tag);
        for (name, value) in attrs {
            self.buf.push(' ');
            self.buf.push_str(name);
            self.buf.push_str("=\"");
            self.buf.push_str(&escape_html(value));
            self.buf.push('"');
        }
        self.buf.push('>');
    }

    /// Close the most recently opened element
    pub fn close(&mut self) -> &mut Self {
        if let Some(tag) = self.open.pop() {
            self.buf.push_str("</");
            self.buf.push_str(tag);
            self.buf.push_str(">\n");
        }
        self
    }

    /// Escaped text content
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.buf.push_str(&escape_html(text));
        self
    }

    /// `<tag class="..">text</tag>` in one call
    pub fn element(&mut self, tag: &'static str, class: Option<&'static str>, text: &str) -> &mut Self {
        self.open(tag, class).text(text).close()
    }

    /// `<p><strong>label:</strong> value</p>`
    pub fn field(&mut self, label: &'static str, value: &str) -> &mut Self {
        self.open("p", None)
            .element("strong", None, label)
            .text(" ")
            .text(value)
            .close()
    }

    /// Static markup such as a stylesheet
    pub fn markup(&mut self, markup: &'static str) -> &mut Self {
        self.buf.push_str(markup);
        self
    }

    /// Close everything still open and return the document
    pub fn finish(mut self) -> String {
        while !self.open.is_empty() {
            self.close();
        }
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_html_all_delimiters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_writer_escapes_text_and_attributes() {
        let mut w = HtmlWriter::new();
        w.open_attrs("a", &[("href", "x\" onclick=\"alert(1)")]).text("<b>").close();
        assert_eq!(
            w.finish(),
            "<a href=\"x&quot; onclick=&quot;alert(1)\">&lt;b&gt;</a>\n"
        );
    }

    #[test]
    fn test_finish_closes_open_elements() {
        let mut w = HtmlWriter::new();
        w.open("div", Some("container")).open("p", None).text("hi");
        assert_eq!(w.finish(), "<div class=\"container\"><p>hi</p>\n</div>\n");
    }
}
