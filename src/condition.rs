//! MSBuild `Condition` attribute parsing.
//!
//! Visual Studio writes one condition per configuration-specific block:
//!
//! - `'$(Configuration)|$(Platform)'=='Debug|Win32'` (`.vcxproj`)
//! - ` '$(Configuration)|$(Platform)' == 'Release|AnyCPU' ` (`.csproj`)
//!
//! Block selection matches these strings literally (see [`crate::select`]).
//! The parser here only recognises that single comparison shape, to name the
//! configuration a block belongs to. Anything compound (`and`, `or`,
//! `Exists(...)`) is rejected and the block simply goes unlabelled.

use std::fmt;

use chumsky::prelude::*;

/// `'lhs' op 'rhs'`, both sides split into text and property references.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub lhs: Vec<Segment>,
    pub op: CompareOp,
    pub rhs: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
}

/// Piece of a quoted string: literal text or a `$(Property)` reference.
///
/// References are kept as names; nothing here ever expands them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Property(String),
}

fn split_segments(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = raw;

    while let Some(start) = rest.find("$(") {
        let name_start = start + 2;
        let Some(len) = rest[name_start..].find(')') else {
            break;
        };
        if start > 0 {
            segments.push(Segment::Text(rest[..start].to_string()));
        }
        segments.push(Segment::Property(rest[name_start..name_start + len].to_string()));
        rest = &rest[name_start + len + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }

    segments
}

type ParseErr<'a> = extra::Err<Simple<'a, char>>;

fn comparison_parser<'a>() -> impl Parser<'a, &'a str, Comparison, ParseErr<'a>> {
    let quoted = just('\'')
        .ignore_then(none_of('\'').repeated().to_slice())
        .then_ignore(just('\''))
        .map(split_segments);

    let op = choice((
        just("==").to(CompareOp::Equal),
        just("!=").to(CompareOp::NotEqual),
    ));

    quoted
        .clone()
        .padded()
        .then(op.padded())
        .then(quoted.padded())
        .then_ignore(end())
        .map(|((lhs, op), rhs)| Comparison { lhs, op, rhs })
}

/// Parse a `Condition` attribute holding one quoted comparison.
pub fn parse_comparison(input: &str) -> Result<Comparison, String> {
    comparison_parser()
        .parse(input)
        .into_result()
        .map_err(|errs| {
            let messages: Vec<String> = errs.iter().map(|e| format!("{e}")).collect();
            format!("Failed to parse condition '{input}': {}", messages.join("; "))
        })
}

/// The configuration/platform pair a block is scoped to, e.g. `Debug|Win32`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPlatform {
    pub configuration: String,
    pub platform: String,
}

impl ConfigPlatform {
    /// Extract the pair from a `'$(Configuration)|$(Platform)'=='X|Y'`
    /// condition. Anything else (other properties, `!=`, compound
    /// expressions, unparsable text) yields `None`.
    pub fn from_condition(condition: &str) -> Option<Self> {
        let Comparison { lhs, op, rhs } = parse_comparison(condition).ok()?;
        if op != CompareOp::Equal {
            return None;
        }

        let value = if is_config_platform_key(&lhs) {
            rhs
        } else if is_config_platform_key(&rhs) {
            lhs
        } else {
            return None;
        };

        let [Segment::Text(value)] = value.as_slice() else {
            return None;
        };
        let (configuration, platform) = value.split_once('|')?;

        Some(Self {
            configuration: configuration.to_string(),
            platform: platform.to_string(),
        })
    }
}

fn is_config_platform_key(segments: &[Segment]) -> bool {
    matches!(
        segments,
        [Segment::Property(c), Segment::Text(sep), Segment::Property(p)]
            if c == "Configuration" && sep == "|" && p == "Platform"
    )
}

impl fmt::Display for ConfigPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.configuration, self.platform)
    }
}
