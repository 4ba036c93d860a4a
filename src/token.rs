use lazy_static::lazy_static;
use std::collections::HashMap;
use strum_macros::{Display, EnumDiscriminants};

#[derive(Debug, Display, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(derive(Hash, Display))]
#[strum_discriminants(name(TokenType))]
pub enum Token {
    // Literals and names
    Number(i32),
    String(String),
    Id(String),
    // Single-byte punctuation the grammar does not give a name of its own
    Char(u8),

    // Keywords
    Class,
    Return,
    If,
    Else,
    Def,
    Print,
    And,
    Or,
    Not,
    None,
    True,
    False,

    // Line and block structure
    Newline,
    Indent,
    Dedent,
    Eof,

    // Relational digraphs
    Eq,
    NotEq,
    LessOrEq,
    GreaterOrEq,
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, Token> = vec![
        ("class", Token::Class),
        ("return", Token::Return),
        ("if", Token::If),
        ("else", Token::Else),
        ("def", Token::Def),
        ("print", Token::Print),
        ("and", Token::And),
        ("or", Token::Or),
        ("not", Token::Not),
        ("None", Token::None),
        ("True", Token::True),
        ("False", Token::False),
    ]
    .into_iter()
    .collect();
}

impl Token {
    /// Maps the twelve reserved words to keyword tokens, anything else to `Id`.
    pub fn lookup_word(word: &str) -> Self {
        KEYWORDS
            .get(word)
            .cloned()
            .unwrap_or_else(|| Self::Id(word.to_owned()))
    }

    pub fn is(&self, token_type: TokenType) -> bool {
        TokenType::from(self) == token_type
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(Token::lookup_word("class"), Token::Class);
        assert_eq!(Token::lookup_word("None"), Token::None);
        assert_eq!(Token::lookup_word("none"), Token::Id("none".to_owned()));
        assert_eq!(Token::lookup_word("classy"), Token::Id("classy".to_owned()));
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Token::Number(7), Token::Number(7));
        assert_ne!(Token::Number(7), Token::Number(8));
        assert_eq!(Token::Char(b'+'), Token::Char(b'+'));
        assert_ne!(Token::Char(b'+'), Token::Char(b'-'));
        assert!(Token::Id("x".to_owned()).is(TokenType::Id));
        assert!(!Token::Id("if".to_owned()).is(TokenType::If));
    }
}
