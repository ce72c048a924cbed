//! Reading and writing the ASCII (OpenStep) property list dialect used by
//! Glyphs.app.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Error;

#[derive(Clone, Debug, PartialEq)]
pub enum Plist {
    Dictionary(BTreeMap<String, Plist>),
    Array(Vec<Plist>),
    String(String),
    Integer(i64),
    Float(f64),
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Eof,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Equals,
    Comma,
    Semicolon,
    Atom(&'a str),
    String(String),
}

fn is_atom_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+' | '$' | '/' | ':')
}

/// Characters that may be written without quotes.
fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_'
}

/// Numbers are only recognized when they print back to the same text. Glyphs
/// writes Unicode values as unquoted hex like `0627`, and those must stay
/// strings.
fn parse_atom(atom: &str) -> Plist {
    if let Ok(i) = atom.parse::<i64>() {
        if i.to_string() == atom {
            return Plist::Integer(i);
        }
    }
    if let Ok(f) = atom.parse::<f64>() {
        if f.is_finite() && f.to_string() == atom {
            return Plist::Float(f);
        }
    }
    Plist::String(atom.to_string())
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser { text, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            line: self.text[..self.pos].matches('\n').count() + 1,
            message: message.into(),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn next_token(&mut self) -> Result<Token<'a>, Error> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(c) = self.next_char() else {
            return Ok(Token::Eof);
        };
        let token = match c {
            '{' => Token::OpenBrace,
            '}' => Token::CloseBrace,
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            '=' => Token::Equals,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '"' => Token::String(self.quoted_string()?),
            c if is_atom_char(c) => {
                while self.peek_char().map_or(false, is_atom_char) {
                    self.next_char();
                }
                Token::Atom(&self.text[start..self.pos])
            }
            c => {
                self.pos = start;
                return Err(self.error(format!("unexpected character '{}'", c)));
            }
        };
        Ok(token)
    }

    fn quoted_string(&mut self) -> Result<String, Error> {
        let mut result = String::new();
        loop {
            match self.next_char() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(result),
                Some('\\') => self.escape(&mut result)?,
                Some(c) => result.push(c),
            }
        }
    }

    fn escape(&mut self, result: &mut String) -> Result<(), Error> {
        let Some(c) = self.next_char() else {
            return Err(self.error("unterminated escape"));
        };
        match c {
            'n' => result.push('\n'),
            't' => result.push('\t'),
            'r' => result.push('\r'),
            '0'..='7' => {
                let mut value = c.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match self.peek_char().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            self.next_char();
                        }
                        None => break,
                    }
                }
                let c = char::from_u32(value)
                    .ok_or_else(|| self.error(format!("invalid octal escape {:o}", value)))?;
                result.push(c);
            }
            'U' | 'u' => {
                let unit = self.hex_unit()?;
                let mut units = vec![unit];
                if (0xD800..0xDC00).contains(&unit) {
                    let rest = &self.text[self.pos..];
                    if rest.starts_with("\\U") || rest.starts_with("\\u") {
                        self.pos += 2;
                        units.push(self.hex_unit()?);
                    }
                }
                for decoded in char::decode_utf16(units) {
                    result.push(decoded.map_err(|_| self.error("invalid UTF-16 escape"))?);
                }
            }
            c => result.push(c),
        }
        Ok(())
    }

    fn hex_unit(&mut self) -> Result<u16, Error> {
        let start = self.pos;
        while self.pos - start < 4 && self.peek_char().map_or(false, |c| c.is_ascii_hexdigit()) {
            self.next_char();
        }
        u16::from_str_radix(&self.text[start..self.pos], 16)
            .map_err(|_| self.error("invalid unicode escape"))
    }

    fn parse_value(&mut self) -> Result<Plist, Error> {
        let token = self.next_token()?;
        self.value_from(token)
    }

    fn value_from(&mut self, token: Token<'a>) -> Result<Plist, Error> {
        match token {
            Token::OpenBrace => self.dictionary(),
            Token::OpenParen => self.array(),
            Token::Atom(atom) => Ok(parse_atom(atom)),
            Token::String(s) => Ok(Plist::String(s)),
            other => Err(self.error(format!("unexpected {:?}", other))),
        }
    }

    fn dictionary(&mut self) -> Result<Plist, Error> {
        let mut dict = BTreeMap::new();
        loop {
            let key = match self.next_token()? {
                Token::CloseBrace => return Ok(Plist::Dictionary(dict)),
                Token::Atom(atom) => atom.to_string(),
                Token::String(s) => s,
                other => return Err(self.error(format!("expected key, got {:?}", other))),
            };
            if self.next_token()? != Token::Equals {
                return Err(self.error(format!("expected '=' after key '{}'", key)));
            }
            let value = self.parse_value()?;
            if self.next_token()? != Token::Semicolon {
                return Err(self.error(format!("expected ';' after value of '{}'", key)));
            }
            dict.insert(key, value);
        }
    }

    fn array(&mut self) -> Result<Plist, Error> {
        let mut items = Vec::new();
        let token = self.next_token()?;
        if token == Token::CloseParen {
            return Ok(Plist::Array(items));
        }
        items.push(self.value_from(token)?);
        loop {
            match self.next_token()? {
                Token::CloseParen => return Ok(Plist::Array(items)),
                Token::Comma => {
                    // Trailing commas are tolerated.
                    let token = self.next_token()?;
                    if token == Token::CloseParen {
                        return Ok(Plist::Array(items));
                    }
                    items.push(self.value_from(token)?);
                }
                other => return Err(self.error(format!("expected ',' or ')', got {:?}", other))),
            }
        }
    }
}

impl Plist {
    pub fn parse(text: &str) -> Result<Plist, Error> {
        let mut parser = Parser::new(text);
        let plist = parser.parse_value()?;
        match parser.next_token()? {
            Token::Eof => Ok(plist),
            other => Err(parser.error(format!("trailing content {:?}", other))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Plist> {
        self.as_dict().and_then(|dict| dict.get(key))
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, Plist>> {
        match self {
            Plist::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn into_dict(self) -> Option<BTreeMap<String, Plist>> {
        match self {
            Plist::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Plist]> {
        match self {
            Plist::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Plist::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Plist::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Plist::Integer(i) => Some(*i as f64),
            Plist::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn write(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Plist::Dictionary(dict) => {
                writeln!(f, "{{")?;
                for (key, value) in dict {
                    write_string(f, key)?;
                    write!(f, " = ")?;
                    value.write(f)?;
                    writeln!(f, ";")?;
                }
                write!(f, "}}")
            }
            Plist::Array(items) => {
                writeln!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f, ",")?;
                    }
                    item.write(f)?;
                }
                if !items.is_empty() {
                    writeln!(f)?;
                }
                write!(f, ")")
            }
            Plist::String(s) => write_string(f, s),
            Plist::Integer(i) => write!(f, "{}", i),
            Plist::Float(x) => write!(f, "{}", x),
        }
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty() || !s.chars().all(is_bare_char) || !matches!(parse_atom(s), Plist::String(_))
}

fn write_string(f: &mut fmt::Formatter, s: &str) -> fmt::Result {
    if !needs_quotes(s) {
        return write!(f, "{}", s);
    }
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\012")?,
            '\t' => write!(f, "\\011")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

impl fmt::Display for Plist {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write(f)
    }
}

impl From<String> for Plist {
    fn from(s: String) -> Plist {
        Plist::String(s)
    }
}

impl From<&str> for Plist {
    fn from(s: &str) -> Plist {
        Plist::String(s.to_string())
    }
}

impl From<i64> for Plist {
    fn from(i: i64) -> Plist {
        Plist::Integer(i)
    }
}

impl From<f64> for Plist {
    fn from(x: f64) -> Plist {
        Plist::Float(x)
    }
}

impl From<bool> for Plist {
    fn from(b: bool) -> Plist {
        Plist::Integer(b as i64)
    }
}

impl From<Vec<Plist>> for Plist {
    fn from(items: Vec<Plist>) -> Plist {
        Plist::Array(items)
    }
}

impl From<BTreeMap<String, Plist>> for Plist {
    fn from(dict: BTreeMap<String, Plist>) -> Plist {
        Plist::Dictionary(dict)
    }
}

#[cfg(test)]
mod tests {
    use maplit::btreemap;

    use super::*;

    #[test]
    fn parse_nested() {
        let plist = Plist::parse(
            r#"{
.appVersion = "895";
familyName = "Reem Kufi";
fontMaster = (
{
id = UUID01;
xHeight = 480;
italicAngle = 7.5;
}
);
versionMajor = 1;
}"#,
        )
        .unwrap();
        assert_eq!(plist.get(".appVersion"), Some(&Plist::from("895")));
        assert_eq!(plist.get("familyName"), Some(&Plist::from("Reem Kufi")));
        assert_eq!(plist.get("versionMajor"), Some(&Plist::Integer(1)));
        let master = &plist.get("fontMaster").unwrap().as_array().unwrap()[0];
        assert_eq!(master.get("xHeight").and_then(Plist::as_f64), Some(480.0));
        assert_eq!(master.get("italicAngle"), Some(&Plist::Float(7.5)));
    }

    #[test]
    fn hex_and_words_stay_strings() {
        assert_eq!(Plist::parse("0627").unwrap(), Plist::from("0627"));
        assert_eq!(Plist::parse("062A").unwrap(), Plist::from("062A"));
        assert_eq!(Plist::parse("infinity").unwrap(), Plist::from("infinity"));
        assert_eq!(Plist::parse("1.50").unwrap(), Plist::from("1.50"));
        assert_eq!(Plist::parse("-120").unwrap(), Plist::Integer(-120));
    }

    #[test]
    fn escapes() {
        let plist = Plist::parse(r#""a\012b \"q\" \\ \U00A9 \UD83D\UDE00""#).unwrap();
        assert_eq!(plist, Plist::from("a\nb \"q\" \\ \u{a9} \u{1F600}"));
    }

    #[test]
    fn tolerates_trailing_comma() {
        let plist = Plist::parse("(a, b,)").unwrap();
        assert_eq!(plist, Plist::Array(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn reports_line_of_error() {
        let err = Plist::parse("{\na = 1;\nb = ;\n}").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }), "{:?}", err);
    }

    #[test]
    fn rejects_trailing_content() {
        assert!(Plist::parse("{} }").is_err());
    }

    #[test]
    fn writes_glyphs_layout() {
        let plist = Plist::Dictionary(btreemap! {
            "code".to_string() => "languagesystem DFLT dflt;\nlanguagesystem arab dflt;".into(),
            "name".to_string() => "Languagesystems".into(),
            "list".to_string() => Plist::Array(vec![Plist::Integer(1), "0041".into(), "10000".into()]),
            "empty".to_string() => Plist::Array(vec![]),
        });
        assert_eq!(
            plist.to_string(),
            "{\n\
             code = \"languagesystem DFLT dflt;\\012languagesystem arab dflt;\";\n\
             empty = (\n);\n\
             list = (\n1,\n0041,\n\"10000\"\n);\n\
             name = Languagesystems;\n\
             }"
        );
    }

    #[test]
    fn written_text_parses_back() {
        let plist = Plist::Dictionary(btreemap! {
            "copyright".to_string() => "Copyright \u{a9} 2015-2026 \"Reem\"".into(),
            "layerId".to_string() => "A1B2-C3".into(),
            "width".to_string() => Plist::Float(612.5),
            "kern".to_string() => Plist::Integer(-40),
            "blank".to_string() => "".into(),
        });
        assert_eq!(Plist::parse(&plist.to_string()).unwrap(), plist);
    }
}
