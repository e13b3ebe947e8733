//! Path descriptor serialization for outline polygons.
//!
//! The format is the subset of SVG path data the ink engine produces:
//! `M x y L x y ... Z` with coordinates written to two decimals.

use kurbo::Point;
use std::fmt::Write;

/// Serialize a polygon into a closed path descriptor.
pub fn to_path_string(polygon: &[Point]) -> String {
    if polygon.is_empty() {
        return String::new();
    }

    let mut d = String::with_capacity(polygon.len() * 16);
    for (i, p) in polygon.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        // Writing into a String cannot fail.
        let _ = write!(d, "{cmd} {:.2} {:.2} ", p.x, p.y);
    }
    d.push('Z');
    d
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
}

/// Splits path data into command letters and numbers.
///
/// Unknown letters become commands too, so the parser can skip them;
/// stray characters such as commas are treated as separators.
struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn scan_number(&mut self) -> Option<f64> {
        let bytes = self.src.as_bytes();
        let start = self.pos;
        let mut end = start;
        if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
            end += 1;
        }
        let mut seen_digit = false;
        let mut seen_dot = false;
        while end < bytes.len() {
            match bytes[end] {
                b'0'..=b'9' => seen_digit = true,
                b'.' if !seen_dot => seen_dot = true,
                _ => break,
            }
            end += 1;
        }
        if seen_digit && end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
            let mut exp_end = end + 1;
            if exp_end < bytes.len() && (bytes[exp_end] == b'-' || bytes[exp_end] == b'+') {
                exp_end += 1;
            }
            let digits_start = exp_end;
            while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                exp_end += 1;
            }
            if exp_end > digits_start {
                end = exp_end;
            }
        }
        // Always consume at least one byte so malformed input cannot stall.
        self.pos = end.max(start + 1);
        if !seen_digit {
            return None;
        }
        self.src[start..end].parse().ok()
    }
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let c = self.src[self.pos..].chars().next()?;
            if c.is_ascii_alphabetic() && c != 'e' && c != 'E' {
                self.pos += c.len_utf8();
                return Some(Token::Command(c));
            }
            if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' {
                if let Some(n) = self.scan_number() {
                    return Some(Token::Number(n));
                }
                continue;
            }
            self.pos += c.len_utf8();
        }
    }
}

/// Parse a path descriptor back into its polygon vertices.
///
/// Only move/line commands contribute vertices; both cases are read as
/// absolute coordinates. Other commands are ignored and parsing stops at the
/// first close command. Malformed data yields whatever vertices were readable.
pub fn parse_path(d: &str) -> Vec<Point> {
    let mut points = Vec::new();
    let mut tokens = Tokens::new(d).peekable();

    while let Some(token) = tokens.next() {
        match token {
            Token::Command('M' | 'L' | 'm' | 'l') => {
                let x = tokens.next_if(|t| matches!(t, Token::Number(_)));
                let y = tokens.next_if(|t| matches!(t, Token::Number(_)));
                if let (Some(Token::Number(x)), Some(Token::Number(y))) = (x, y) {
                    if x.is_finite() && y.is_finite() {
                        points.push(Point::new(x, y));
                    }
                }
            }
            Token::Command('Z' | 'z') => break,
            _ => {}
        }
    }

    points
}
