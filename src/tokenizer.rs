//! Lexical classification of raw arguments into flag and value tokens.
//!
//! The raw arguments are read in order as one logically space-joined
//! stream; the boundary between two raw arguments acts as the join
//! separator, so a token never spans two of them. Classification is
//! purely lexical: whether a flag exists, or needs a value, is decided by
//! the dispatch loop in [`crate::parser`].

use crate::config::ParserConfig;
use tracing::trace;

/// Characters allowed in flag names.
pub fn is_arg_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A classified piece of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `<long_prefix><name>`, with a value attached after the separator.
    Long {
        name: &'a str,
        attached: Option<&'a str>,
    },
    /// `<short_prefix><run>`; `raw` is the whole argument.
    Short { run: &'a str, raw: &'a str },
    /// Anything that is not a flag.
    Value(&'a str),
    /// The bare long prefix. Every later argument is a value.
    Terminator,
}

/// Sequential, non-backtracking scanner over the raw arguments.
pub struct Tokenizer<'a, S> {
    args: &'a [S],
    index: usize,
    config: &'a ParserConfig,
    terminated: bool,
}

impl<'a, S: AsRef<str>> Tokenizer<'a, S> {
    pub fn new(args: &'a [S], config: &'a ParserConfig) -> Self {
        Self {
            args,
            index: 0,
            config,
            terminated: false,
        }
    }

    /// Consume the next raw argument verbatim as a value.
    pub fn next_value(&mut self) -> Option<&'a str> {
        let value = self.peek_value()?;
        self.index += 1;
        Some(value)
    }

    /// Look at the next raw argument without consuming it.
    pub fn peek_value(&self) -> Option<&'a str> {
        let args: &'a [S] = self.args;
        args.get(self.index).map(AsRef::<str>::as_ref)
    }

    fn classify(&self, arg: &'a str) -> Token<'a> {
        let long = self.config.long_prefix.as_str();
        let short = self.config.short_prefix.as_str();

        if arg == long {
            return Token::Terminator;
        }
        // Long first: the short prefix may be a prefix of the long one.
        if let Some(token) = arg.strip_prefix(long).and_then(|rest| self.classify_long(rest)) {
            return token;
        }
        if let Some(run) = arg.strip_prefix(short) {
            if run.starts_with(is_arg_char) {
                return Token::Short { run, raw: arg };
            }
        }
        Token::Value(arg)
    }

    fn classify_long(&self, rest: &'a str) -> Option<Token<'a>> {
        let end = rest.find(|c: char| !is_arg_char(c)).unwrap_or(rest.len());
        if end == 0 {
            return None;
        }

        let (name, tail) = rest.split_at(end);
        if tail.is_empty() {
            return Some(Token::Long {
                name,
                attached: None,
            });
        }
        // Anything other than the separator after the name makes this a value.
        tail.strip_prefix(self.config.separator)
            .map(|value| Token::Long {
                name,
                attached: Some(value),
            })
    }
}

impl<'a, S: AsRef<str>> Iterator for Tokenizer<'a, S> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let arg = self.next_value()?;
        let token = if self.terminated {
            Token::Value(arg)
        } else {
            self.classify(arg)
        };
        if token == Token::Terminator {
            self.terminated = true;
        }
        trace!(?token, "classified token");
        Some(token)
    }
}
