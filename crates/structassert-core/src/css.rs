//! CSS selector subset translated to XPath 1.0.
//!
//! Supported:
//!
//! - type selectors (`item`, `*`), `#id`, `.class`;
//! - attribute selectors `[a]`, `[a=v]`, `[a~=v]`, `[a^=v]`, `[a$=v]`,
//!   `[a*=v]`, `[a|=v]` with quoted or bare values;
//! - `:first-child`, `:last-child`, `:only-child`, `:empty`;
//! - descendant, `>`, `+` and `~` combinators, and `,` groups.

use crate::error::MatchError;

/// Translate `selector` into an XPath expression evaluated from the
/// document root.
pub fn to_xpath(selector: &str) -> Result<String, MatchError> {
    let mut parser = Parser::new(selector);
    let mut groups = Vec::new();

    loop {
        groups.push(parser.selector()?);
        parser.skip_whitespace();
        match parser.peek() {
            None => break,
            Some(',') => {
                parser.bump();
            }
            Some(c) => return Err(parser.error(format!("unexpected '{c}'"))),
        }
    }

    Ok(groups.join(" | "))
}

/// Quote `value` as an XPath string literal.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{part}'"))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    Adjacent,
    Sibling,
}

impl Combinator {
    fn axis(self) -> &'static str {
        match self {
            Combinator::Descendant => "/descendant-or-self::*/",
            Combinator::Child => "/",
            Combinator::Adjacent => "/following-sibling::*[1]/self::",
            Combinator::Sibling => "/following-sibling::",
        }
    }
}

struct Parser<'s> {
    source: &'s str,
    chars: Vec<char>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> MatchError {
        MatchError::InvalidSelector {
            selector: self.source.to_string(),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, expected: char) -> Result<(), MatchError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    /// One comma-free selector: compounds joined by combinators.
    fn selector(&mut self) -> Result<String, MatchError> {
        self.skip_whitespace();
        let mut xpath = format!("descendant-or-self::{}", self.compound()?);

        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                Some('>') => Combinator::Child,
                Some('+') => Combinator::Adjacent,
                Some('~') => Combinator::Sibling,
                None | Some(',') => break,
                Some(_) if had_space => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{c}'"))),
            };
            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_whitespace();
            }
            if matches!(self.peek(), None | Some(',')) {
                return Err(self.error("selector ends with a combinator"));
            }
            xpath.push_str(combinator.axis());
            xpath.push_str(&self.compound()?);
        }

        Ok(xpath)
    }

    /// Tag followed by conditions, e.g. `item.new[lang|=en]:first-child`.
    fn compound(&mut self) -> Result<String, MatchError> {
        let tag = match self.peek() {
            Some('*') => {
                self.bump();
                Some("*".to_string())
            }
            Some(c) if is_ident_start(c) => Some(self.ident()?),
            _ => None,
        };

        let mut conditions = Vec::new();
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    let id = self.ident()?;
                    conditions.push(format!("@id = {}", xpath_literal(&id)));
                }
                Some('.') => {
                    self.bump();
                    let class = self.ident()?;
                    conditions.push(word_condition("@class", &class));
                }
                Some('[') => {
                    self.bump();
                    conditions.push(self.attribute()?);
                }
                Some(':') => {
                    self.bump();
                    conditions.push(self.pseudo_class()?);
                }
                _ => break,
            }
        }

        if tag.is_none() && conditions.is_empty() {
            return Err(match self.peek() {
                Some(c) => self.error(format!("unexpected '{c}'")),
                None => self.error("empty selector"),
            });
        }

        let mut out = tag.unwrap_or_else(|| "*".to_string());
        for condition in conditions {
            out.push('[');
            out.push_str(&condition);
            out.push(']');
        }
        Ok(out)
    }

    fn attribute(&mut self) -> Result<String, MatchError> {
        self.skip_whitespace();
        let name = format!("@{}", self.ident()?);
        self.skip_whitespace();

        let operator: String = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(name);
            }
            Some('=') => {
                self.bump();
                "=".to_string()
            }
            Some(c @ ('~' | '^' | '$' | '*' | '|')) => {
                self.bump();
                self.expect('=')?;
                format!("{c}=")
            }
            Some(c) => return Err(self.error(format!("unexpected '{c}' in attribute selector"))),
            None => return Err(self.error("unterminated attribute selector")),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('\'' | '"')) => self.quoted(quote)?,
            _ => self.ident()?,
        };
        self.skip_whitespace();
        self.expect(']')?;

        let literal = xpath_literal(&value);
        Ok(match operator.as_str() {
            "=" => format!("{name} = {literal}"),
            "~=" => word_condition(&name, &value),
            "^=" => format!("starts-with({name}, {literal})"),
            "$=" => format!(
                "substring({name}, string-length({name}) - string-length({literal}) + 1) = {literal}"
            ),
            "*=" => format!("contains({name}, {literal})"),
            _ => format!(
                "({name} = {literal} or starts-with({name}, {}))",
                xpath_literal(&format!("{value}-"))
            ),
        })
    }

    fn pseudo_class(&mut self) -> Result<String, MatchError> {
        let name = self.ident()?;
        match name.as_str() {
            "first-child" => Ok("not(preceding-sibling::*)".to_string()),
            "last-child" => Ok("not(following-sibling::*)".to_string()),
            "only-child" => {
                Ok("not(preceding-sibling::*) and not(following-sibling::*)".to_string())
            }
            "empty" => Ok("not(*) and not(text())".to_string()),
            other => Err(self.error(format!("unsupported pseudo-class ':{other}'"))),
        }
    }

    fn ident(&mut self) -> Result<String, MatchError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '-' | '_'))
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected identifier, found '{c}'")),
                None => self.error("expected identifier, found end of input"),
            });
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn quoted(&mut self, quote: char) -> Result<String, MatchError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) => value.push(c),
                    None => break,
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
                None => break,
            }
        }
        Err(self.error("unterminated string"))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// `attr` contains `word` as a whitespace-separated token.
fn word_condition(attr: &str, word: &str) -> String {
    format!(
        "contains(concat(' ', normalize-space({attr}), ' '), {})",
        xpath_literal(&format!(" {word} "))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_selector() {
        assert_eq!(to_xpath("item").unwrap(), "descendant-or-self::item");
        assert_eq!(to_xpath(" * ").unwrap(), "descendant-or-self::*");
    }

    #[test]
    fn test_id_and_class() {
        assert_eq!(
            to_xpath("user#main").unwrap(),
            "descendant-or-self::user[@id = 'main']"
        );
        assert_eq!(
            to_xpath(".active").unwrap(),
            "descendant-or-self::*[contains(concat(' ', normalize-space(@class), ' '), ' active ')]"
        );
    }

    #[test]
    fn test_combinators() {
        assert_eq!(
            to_xpath("a b").unwrap(),
            "descendant-or-self::a/descendant-or-self::*/b"
        );
        assert_eq!(to_xpath("a > b").unwrap(), "descendant-or-self::a/b");
        assert_eq!(to_xpath("a>b").unwrap(), "descendant-or-self::a/b");
        assert_eq!(
            to_xpath("a + b").unwrap(),
            "descendant-or-self::a/following-sibling::*[1]/self::b"
        );
        assert_eq!(
            to_xpath("a ~ b").unwrap(),
            "descendant-or-self::a/following-sibling::b"
        );
    }

    #[test]
    fn test_groups() {
        assert_eq!(
            to_xpath("a, b").unwrap(),
            "descendant-or-self::a | descendant-or-self::b"
        );
    }

    #[test]
    fn test_attribute_operators() {
        assert_eq!(to_xpath("[lang]").unwrap(), "descendant-or-self::*[@lang]");
        assert_eq!(
            to_xpath("[lang=\"en\"]").unwrap(),
            "descendant-or-self::*[@lang = 'en']"
        );
        assert_eq!(
            to_xpath("[href^='https']").unwrap(),
            "descendant-or-self::*[starts-with(@href, 'https')]"
        );
        assert_eq!(
            to_xpath("[lang|=en]").unwrap(),
            "descendant-or-self::*[(@lang = 'en' or starts-with(@lang, 'en-'))]"
        );
    }

    #[test]
    fn test_pseudo_classes() {
        assert_eq!(
            to_xpath("li:first-child").unwrap(),
            "descendant-or-self::li[not(preceding-sibling::*)]"
        );
        assert!(matches!(
            to_xpath("li:hover"),
            Err(MatchError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_rejects_xpath_syntax() {
        assert!(to_xpath("//user").is_err());
        assert!(to_xpath("a >").is_err());
        assert!(to_xpath("").is_err());
        assert!(to_xpath("[a='x").is_err());
    }

    #[test]
    fn test_xpath_literal_quoting() {
        assert_eq!(xpath_literal("plain"), "'plain'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(
            xpath_literal("it's \"x\""),
            "concat('it', \"'\", 's \"x\"')"
        );
    }
}
