//! Directive call grammar
//!
//! The parameter string of a definition is a whitespace-separated list of calls:
//!
//! ```text
//! <calls>    = <call>*
//! <call>     = <name> <argument>?
//! <name>     = [A-Za-z0-9_]+ | "+" | "-" | ">"
//! <argument> = "(" (<text> | <argument>)* ")"
//! ```
//!
//! Arguments may contain balanced parentheses; the outer pair is dropped.

use crate::nodetext::error::DirectiveError;
use chumsky::prelude::*;
use std::ops::Range;

type ParserError = Simple<char>;

/// One `NAME(argument)` occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveCall {
    pub name: String,
    pub argument: String,
    /// Byte span within the parameter string
    pub span: Range<usize>,
}

fn name() -> impl Parser<char, String, Error = ParserError> {
    let word = filter::<char, _, ParserError>(|c: &char| c.is_ascii_alphanumeric() || *c == '_')
        .repeated()
        .at_least(1)
        .collect::<String>();
    let alias = one_of::<_, _, ParserError>("+->").map(|c: char| c.to_string());
    word.or(alias)
}

fn argument_body() -> impl Parser<char, String, Error = ParserError> {
    recursive(|body| {
        let nested = body
            .delimited_by(just('('), just(')'))
            .map(|inner: String| format!("({inner})"));
        let plain = none_of::<_, _, ParserError>("()").map(|c: char| c.to_string());
        nested
            .or(plain)
            .repeated()
            .map(|parts: Vec<String>| parts.concat())
    })
}

fn calls() -> impl Parser<char, Vec<DirectiveCall>, Error = ParserError> {
    let inline_space = one_of::<_, _, ParserError>(" \t").repeated();
    let call = name()
        .then_ignore(inline_space)
        .then(argument_body().delimited_by(just('('), just(')')).or_not())
        .map_with_span(|(name, argument), span| DirectiveCall {
            name,
            argument: argument.unwrap_or_default(),
            span,
        })
        .padded();

    text::whitespace()
        .ignore_then(call.repeated())
        .then_ignore(end())
}

/// Split a definition's parameter string into directive calls.
///
/// Arguments are returned as written; each directive trims what it reads.
pub fn parse_calls(parameters: &str) -> Result<Vec<DirectiveCall>, DirectiveError> {
    let mut parsed = calls().parse(parameters).map_err(|errors| {
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        DirectiveError::Syntax(message)
    })?;

    // The parser counts chars; callers index the text by bytes.
    let byte_offsets: Vec<usize> = parameters
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(parameters.len()))
        .collect();
    for call in &mut parsed {
        call.span = byte_offsets[call.span.start]..byte_offsets[call.span.end];
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_and_args(text: &str) -> Vec<(String, String)> {
        parse_calls(text)
            .expect("calls to parse")
            .into_iter()
            .map(|call| (call.name, call.argument))
            .collect()
    }

    #[test]
    fn test_pipeline() {
        assert_eq!(
            names_and_args(" INCLUDE(tag: status = done) SORT(date) LIMIT(3) "),
            vec![
                ("INCLUDE".to_string(), "tag: status = done".to_string()),
                ("SORT".to_string(), "date".to_string()),
                ("LIMIT".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_aliases_and_links() {
        assert_eq!(
            names_and_args("+(all) -(kind = note)\n>(| Results >)"),
            vec![
                ("+".to_string(), "all".to_string()),
                ("-".to_string(), "kind = note".to_string()),
                (">".to_string(), "| Results >".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_parentheses_are_kept() {
        assert_eq!(
            names_and_args("SHOW($title ($date))"),
            vec![("SHOW".to_string(), "$title ($date)".to_string())]
        );
    }

    #[test]
    fn test_call_without_argument() {
        assert_eq!(
            names_and_args("freeze"),
            vec![("freeze".to_string(), String::new())]
        );
    }

    #[test]
    fn test_empty_parameters() {
        assert!(parse_calls("   ").unwrap().is_empty());
    }

    #[test]
    fn test_span_excludes_padding() {
        let calls = parse_calls("  LIMIT(3)").unwrap();
        assert_eq!(calls[0].span, 2..10);
    }

    #[test]
    fn test_arguments_keep_their_spacing() {
        assert_eq!(
            names_and_args("SHOW($title ) LIMIT( 2 )"),
            vec![
                ("SHOW".to_string(), "$title ".to_string()),
                ("LIMIT".to_string(), " 2 ".to_string()),
            ]
        );
    }

    #[test]
    fn test_span_counts_bytes() {
        let parameters = "SHOW(né) LIMIT(3)";
        let calls = parse_calls(parameters).unwrap();
        assert_eq!(calls[1].span, 10..18);
        assert_eq!(&parameters[calls[1].span.clone()], "LIMIT(3)");
    }

    #[test]
    fn test_unbalanced_argument_is_a_syntax_error() {
        assert!(matches!(
            parse_calls("INCLUDE(a = b"),
            Err(DirectiveError::Syntax(_))
        ));
    }
}
