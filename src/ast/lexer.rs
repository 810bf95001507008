use logos::{Lexer, Logos};

/// Extra state for the lexer, used to allocate strings with escape sequences into the arena.
#[derive(Clone)]
pub(crate) struct Extras<'a> {
    pub(crate) arena: &'a bumpalo::Bump,
}

/// Tokens of the GraphQL language, shared by executable documents and SDL.
#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(extras = Extras<'s>)]
pub(crate) enum Token<'a> {
    #[token("...")]
    Ellipsis,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token("{")]
    BraceOpen,

    #[token("}")]
    BraceClose,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token(":")]
    Colon,

    #[token("=")]
    Equal,

    #[token("!")]
    Exclam,

    #[token("&")]
    Ampersand,

    #[token("|")]
    Pipe,

    #[regex(r"\$[_a-zA-Z][_0-9a-zA-Z]*", |lex| &lex.slice()[1..])]
    VariableName(&'a str),

    #[regex(r"@[_a-zA-Z][_0-9a-zA-Z]*", |lex| &lex.slice()[1..])]
    DirectiveName(&'a str),

    #[regex(r"[_a-zA-Z][_0-9a-zA-Z]*", |lex| lex.slice())]
    Name(&'a str),

    #[regex(r"-?([1-9][0-9]*|0)[.][0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"-?([1-9][0-9]*|0)[eE][+-]?[0-9]+", |lex| lex.slice())]
    Float(&'a str),

    #[regex(r"-?([1-9][0-9]*|0)", |lex| lex.slice())]
    Integer(&'a str),

    #[regex(r#""("")?"#, lex_string)]
    String(&'a str),

    #[error]
    #[regex(r"([ ,\t\n\r\f]+|#[^\n\r]*)+", logos::skip)]
    Error,

    /// Token indicates the end of the input
    End,
}

/// Parts of a single-line string that may need unescaping.
#[derive(Logos, Debug, PartialEq)]
enum StringPart {
    #[regex(r#"[^\n\r\\"]+"#)]
    Text,

    #[regex(r"\\u[0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F]")]
    EscapedCodepoint,

    #[regex(r#"\\["\\/bfnrt]"#)]
    Escaped,

    #[token("\"")]
    EndString,

    #[error]
    Error,
}

fn lex_string<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Option<&'a str> {
    if lex.slice().len() > 1 {
        return lex_block_string(lex);
    }
    let remainder = lex.remainder();
    // Strings without escape sequences are borrowed from the source directly
    for (index, char) in remainder.char_indices() {
        match char {
            '\n' | '\r' => return None,
            '"' => {
                lex.bump(index + 1);
                return Some(&remainder[..index]);
            }
            '\\' => break,
            _ => {}
        }
    }

    let mut output = String::new();
    let mut sublex = StringPart::lexer(remainder);
    while let Some(part) = sublex.next() {
        match part {
            StringPart::Text => output.push_str(sublex.slice()),
            StringPart::Escaped => output.push(match &sublex.slice()[1..] {
                "b" => '\u{8}',
                "f" => '\u{c}',
                "n" => '\n',
                "r" => '\r',
                "t" => '\t',
                other => other.chars().next()?,
            }),
            StringPart::EscapedCodepoint => {
                use lexical_core::{parse_with_options, NumberFormatBuilder, ParseIntegerOptions};
                const FORMAT: u128 = NumberFormatBuilder::hexadecimal();
                const OPTIONS: ParseIntegerOptions = ParseIntegerOptions::new();
                let codepoint: u32 =
                    parse_with_options::<_, FORMAT>(sublex.slice()[2..].as_bytes(), &OPTIONS)
                        .ok()?;
                output.push(char::from_u32(codepoint)?);
            }
            StringPart::EndString => {
                lex.bump(sublex.span().end);
                return Some(lex.extras.arena.alloc_str(&output));
            }
            StringPart::Error => return None,
        }
    }
    None
}

fn lex_block_string<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Option<&'a str> {
    let remainder = lex.remainder();
    let mut raw = String::new();
    let mut rest = remainder;
    loop {
        let index = rest.find("\"\"\"")?;
        if rest[..index].ends_with('\\') {
            raw.push_str(&rest[..index - 1]);
            raw.push_str("\"\"\"");
            rest = &rest[index + 3..];
        } else {
            raw.push_str(&rest[..index]);
            rest = &rest[index + 3..];
            break;
        }
    }
    lex.bump(remainder.len() - rest.len());

    let lines: std::vec::Vec<&str> = raw.lines().collect();
    let indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);
    let mut dedented = lines
        .iter()
        .enumerate()
        .map(|(index, line)| match index {
            0 => *line,
            _ => line.get(indent..).unwrap_or(""),
        })
        .skip_while(|line| line.trim().is_empty())
        .collect::<std::vec::Vec<&str>>();
    while dedented.last().map_or(false, |line| line.trim().is_empty()) {
        dedented.pop();
    }
    Some(lex.extras.arena.alloc_str(&dedented.join("\n")))
}
