//! Sample format descriptors and the `host_fmt[@wire_fmt]` mini-grammar.

use crate::error::{Result, StreamError};

/// A recognized sample-format literal.
///
/// `function_tag` is non-empty only when `bits == 0`, encoding a
/// hardware-side DSP function (currently only `cfftlpwri16`) rather than
/// a plain numeric sample layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleFormat {
    pub bits: u8,
    pub complex: bool,
    pub function_tag: String,
}

impl SampleFormat {
    const fn plain(bits: u8, complex: bool) -> Self {
        SampleFormat {
            bits,
            complex,
            function_tag: String::new(),
        }
    }

    /// True when this format names a hardware DSP function rather than a
    /// numeric sample layout (`bits == 0`).
    pub fn is_function(&self) -> bool {
        self.bits == 0 && !self.function_tag.is_empty()
    }

    /// Parses one of the recognized literal names (case-insensitive):
    /// `i8`, `i12`, `i16`, their complex variants (`ci8`, `ci12`, `ci16`),
    /// `f32`, `cf32`, and the DSP function name `cfftlpwri16`.
    pub fn parse(name: &str) -> Result<Self> {
        let lower = name.to_ascii_lowercase();
        Ok(match lower.as_str() {
            "i8" => SampleFormat::plain(8, false),
            "ci8" => SampleFormat::plain(8, true),
            "i12" => SampleFormat::plain(12, false),
            "ci12" => SampleFormat::plain(12, true),
            "i16" => SampleFormat::plain(16, false),
            "ci16" => SampleFormat::plain(16, true),
            "f32" => SampleFormat::plain(32, false),
            "cf32" => SampleFormat::plain(32, true),
            "cfftlpwri16" => SampleFormat {
                bits: 0,
                complex: true,
                function_tag: "cfftlpwri16".to_string(),
            },
            _ => return Err(StreamError::InvalidArg(format!("unrecognized sample format `{name}`"))),
        })
    }
}

/// The result of parsing the `host_fmt[@wire_fmt]` mini-grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDataFormat {
    pub host: SampleFormat,
    pub wire: Option<SampleFormat>,
    /// Set when `wire_fmt` carried a leading `&`, forcing a single-stream demultiplex.
    pub demux: bool,
}

/// Parses `host_fmt[@wire_fmt]`, where a leading `&` on `wire_fmt` forces
/// single-stream demultiplex (see `spec.md` §6).
pub fn parse_data_format(spec: &str) -> Result<ParsedDataFormat> {
    match spec.split_once('@') {
        None => Ok(ParsedDataFormat {
            host: SampleFormat::parse(spec)?,
            wire: None,
            demux: false,
        }),
        Some((host, wire)) => {
            let (demux, wire) = match wire.strip_prefix('&') {
                Some(rest) => (true, rest),
                None => (false, wire),
            };
            Ok(ParsedDataFormat {
                host: SampleFormat::parse(host)?,
                wire: Some(SampleFormat::parse(wire)?),
                demux,
            })
        }
    }
}
