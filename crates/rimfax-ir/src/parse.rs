//! Parser for the stim circuit text format.

use logos::Logos;

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::target::{GateTarget, Pauli};

/// Tokens of the circuit text format.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"#[^\n]*")]
enum Token {
    #[token("\n")]
    Newline,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[token("*")]
    Star,

    #[regex(r"rec\[-[0-9]+\]", |lex| {
        let s = lex.slice();
        s[4..s.len() - 1].parse::<i32>().ok()
    })]
    Rec(i32),

    #[regex(r"sweep\[[0-9]+\]", |lex| {
        let s = lex.slice();
        s[6..s.len() - 1].parse::<u32>().ok()
    })]
    Sweep(u32),

    // Higher priority than Identifier so `X0` lexes as a Pauli target.
    #[regex(r"[XYZ][0-9]+", |lex| {
        let s = lex.slice();
        let basis = Pauli::from_letter(s.chars().next()?)?;
        let qubit = s[1..].parse::<u32>().ok()?;
        Some((basis, qubit))
    }, priority = 5)]
    PauliTarget((Pauli, u32)),

    #[regex(r"-?[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"-?[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> IrResult<Self> {
        let mut lexer = Token::lexer(source);
        let mut tokens = Vec::new();
        let mut line = 1;
        while let Some(result) = lexer.next() {
            match result {
                Ok(token) => {
                    let is_newline = token == Token::Newline;
                    tokens.push((token, line));
                    if is_newline {
                        line += 1;
                    }
                }
                Err(()) => {
                    return Err(IrError::Parse {
                        line,
                        message: format!("unrecognized token '{}'", lexer.slice()),
                    });
                }
            }
        }
        Ok(Self { tokens, pos: 0 })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map_or(1, |(_, l)| *l)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> IrError {
        IrError::Parse {
            line: self.line(),
            message: message.into(),
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek() == Some(&Token::Newline) {
            self.pos += 1;
        }
    }

    fn parse_block(&mut self, inside_braces: bool) -> IrResult<Circuit> {
        let mut circuit = Circuit::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                None => {
                    if inside_braces {
                        return Err(self.error("unexpected end of input inside REPEAT block"));
                    }
                    return Ok(circuit);
                }
                Some(Token::RBrace) => {
                    if inside_braces {
                        self.pos += 1;
                        return Ok(circuit);
                    }
                    return Err(self.error("unexpected '}'"));
                }
                Some(Token::Ident(_)) => {
                    let Some(Token::Ident(name)) = self.bump() else {
                        unreachable!()
                    };
                    if name == "REPEAT" {
                        self.parse_repeat(&mut circuit)?;
                    } else {
                        self.parse_instruction(name, &mut circuit)?;
                    }
                }
                Some(other) => {
                    return Err(self.error(format!("expected instruction, found '{other:?}'")));
                }
            }
        }
    }

    fn parse_repeat(&mut self, circuit: &mut Circuit) -> IrResult<()> {
        let repetitions = match self.bump() {
            Some(Token::Int(n)) if n >= 0 => n as u64,
            _ => return Err(self.error("expected repetition count after REPEAT")),
        };
        if self.bump() != Some(Token::LBrace) {
            return Err(self.error("expected '{' after REPEAT count"));
        }
        let body = self.parse_block(true)?;
        circuit.append_repeat(body, repetitions);
        Ok(())
    }

    fn parse_instruction(&mut self, name: String, circuit: &mut Circuit) -> IrResult<()> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            loop {
                match self.bump() {
                    Some(Token::Float(x)) => args.push(x),
                    Some(Token::Int(n)) => args.push(n as f64),
                    _ => return Err(self.error("expected argument")),
                }
                match self.bump() {
                    Some(Token::Comma) => {}
                    Some(Token::RParen) => break,
                    _ => return Err(self.error("expected ',' or ')' in argument list")),
                }
            }
        }

        let mut targets = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Int(n)) => {
                    let n = *n;
                    if n < 0 || n > i64::from(u32::MAX) {
                        return Err(self.error(format!("invalid qubit index {n}")));
                    }
                    targets.push(GateTarget::Qubit(n as u32));
                    self.pos += 1;
                }
                Some(Token::PauliTarget((basis, qubit))) => {
                    targets.push(GateTarget::pauli(*basis, *qubit));
                    self.pos += 1;
                }
                Some(Token::Rec(k)) => {
                    targets.push(GateTarget::Rec(*k));
                    self.pos += 1;
                }
                Some(Token::Sweep(k)) => {
                    targets.push(GateTarget::Sweep(*k));
                    self.pos += 1;
                }
                Some(Token::Star) => {
                    targets.push(GateTarget::Combiner);
                    self.pos += 1;
                }
                Some(Token::Newline) | Some(Token::RBrace) | None => break,
                Some(other) => {
                    return Err(self.error(format!("unexpected target '{other:?}'")));
                }
            }
        }

        circuit.append(name, targets, args)
    }
}

/// Parse a circuit from its text form.
pub(crate) fn parse_circuit(source: &str) -> IrResult<Circuit> {
    Parser::new(source)?.parse_block(false)
}
