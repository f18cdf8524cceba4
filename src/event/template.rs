use std::fmt;

/// A named hole in a message or output template, e.g. `{Timestamp:%H:%M}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyToken {
    pub name: String,
    pub format: Option<String>,
    /// Exact source text of the token, braces included
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateToken {
    Text(String),
    Property(PropertyToken),
}

/// A parsed template: literal text interleaved with property tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageTemplate {
    text: String,
    tokens: Vec<TemplateToken>,
}

impl MessageTemplate {
    /// Parse a template string.
    ///
    /// `{{` and `}}` are literal braces. A brace group that does not hold a
    /// valid property name, or that is never closed, is kept as literal text.
    pub fn parse(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c == '{' && chars.get(i + 1) == Some(&'{') {
                literal.push('{');
                i += 2;
            } else if c == '}' && chars.get(i + 1) == Some(&'}') {
                literal.push('}');
                i += 2;
            } else if c == '{' {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != '}' && chars[end] != '{' {
                    end += 1;
                }

                if end >= chars.len() || chars[end] == '{' {
                    // Unterminated: keep the brace as text and carry on scanning
                    literal.push('{');
                    i += 1;
                    continue;
                }

                let content: String = chars[start..end].iter().collect();
                let raw: String = chars[i..=end].iter().collect();
                match parse_property(&content, raw.clone()) {
                    Some(property) => {
                        if !literal.is_empty() {
                            tokens.push(TemplateToken::Text(std::mem::take(&mut literal)));
                        }
                        tokens.push(TemplateToken::Property(property));
                    }
                    None => literal.push_str(&raw),
                }
                i = end + 1;
            } else {
                literal.push(c);
                i += 1;
            }
        }

        if !literal.is_empty() {
            tokens.push(TemplateToken::Text(literal));
        }

        Self {
            text: text.to_string(),
            tokens,
        }
    }

    /// The unparsed template text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[TemplateToken] {
        &self.tokens
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn parse_property(content: &str, raw: String) -> Option<PropertyToken> {
    let content = content
        .strip_prefix('@')
        .or_else(|| content.strip_prefix('$'))
        .unwrap_or(content);

    let (name, format) = match content.split_once(':') {
        Some((name, format)) => (name, Some(format)),
        None => (content, None),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    Some(PropertyToken {
        name: name.to_string(),
        format: format.filter(|f| !f.is_empty()).map(|f| f.to_string()),
        raw,
    })
}
