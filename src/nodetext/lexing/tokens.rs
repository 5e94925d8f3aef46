//! Wrapper token definitions
//!
//! Only the bracket characters are tokenized with logos; everything between them is
//! skipped in one run. Pointers, compact nodes and embedded regions are line or
//! pattern oriented and are matched with the regexes in the syntax table instead.
use logos::Logos;
use std::ops::Range;

/// Tokens produced by the wrapper scan
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
#[logos(skip r"[^{}\\]+")]
pub enum WrapperToken {
    /// `\{` or `\}`, never structural
    #[regex(r"\\[{}]")]
    Escaped,

    #[token("{")]
    Opening,

    #[token("}")]
    Closing,
}

/// Tokenize a string, keeping each token's byte span
pub fn tokenize_with_spans(source: &str) -> Vec<(WrapperToken, Range<usize>)> {
    let mut lexer = WrapperToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        if let Ok(token) = result {
            tokens.push((token, lexer.span()));
        }
    }

    tokens
}
