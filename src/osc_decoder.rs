//! Decodes OSC 1.0 packets, the format the headset software streams its
//! readings in, one UDP datagram per packet.
//!
//! Everything in OSC is big-endian and aligned to 4 bytes. A packet is either
//! a single message (address, type tags, arguments) or a `#bundle` holding
//! size-prefixed elements, which may themselves be bundles. Bundles are
//! flattened here, since nothing downstream cares about time tags.

use nom::{
    bytes::complete::{tag, take, take_until},
    combinator::{all_consuming, map},
    error::{Error, ErrorKind},
    number::complete::{be_f32, be_f64, be_i32, be_i64, be_u32, be_u64},
    Finish, IResult,
};

use std::{error, fmt::Display};

const BUNDLE_TAG: &[u8] = b"#bundle\0";

/// A single OSC argument.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum OscArg {
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Str(String),
    Blob(Vec<u8>),
    Bool(bool),
    Nil,
    Impulse,
}

impl OscArg {
    /// The argument as a number, if it is one. Booleans count as 0 and 1.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            OscArg::Int(v) => Some(v as f64),
            OscArg::Float(v) => Some(v as f64),
            OscArg::Long(v) => Some(v as f64),
            OscArg::Double(v) => Some(v),
            OscArg::Bool(v) => Some(if v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

/// An address and its arguments, in the order they were sent.
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    /// e.g. `/muse/dsp/elements/alpha`
    pub address: String,
    #[allow(missing_docs)]
    pub args: Vec<OscArg>,
}

/// Why a datagram could not be decoded, and how far in it went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OscDecodeError {
    /// Bytes into the datagram where parsing gave up
    pub offset: usize,
    /// Which nom parser failed
    pub code: ErrorKind,
}

impl Display for OscDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "malformed OSC packet at byte {}: {}",
            self.offset,
            self.code.description()
        )
    }
}

impl error::Error for OscDecodeError {}

fn fail<T>(input: &[u8], code: ErrorKind) -> IResult<&[u8], T> {
    Err(nom::Err::Failure(Error::new(input, code)))
}

/// Strings are null terminated, then padded with more nulls to a multiple of
/// four bytes.
fn parse_string(s: &[u8]) -> IResult<&[u8], String> {
    let (rest, raw) = take_until(&b"\0"[..])(s)?;
    let padded_len = (raw.len() + 4) & !3;
    let (rest, _) = take(padded_len - raw.len())(rest)?;

    match std::str::from_utf8(raw) {
        Ok(text) => Ok((rest, text.to_owned())),
        Err(_) => fail(s, ErrorKind::Char),
    }
}

/// A big-endian `u32` size followed by that many bytes. A size running past
/// the end of the datagram is an error rather than a request for more input.
fn parse_sized(s: &[u8]) -> IResult<&[u8], &[u8]> {
    let (rest, len) = be_u32(s)?;
    take(len as usize)(rest)
}

fn parse_blob(s: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let (rest, data) = parse_sized(s)?;
    let padding = (4 - data.len() % 4) % 4;
    let (rest, _) = take(padding)(rest)?;
    Ok((rest, data.to_vec()))
}

fn parse_arg(type_tag: char, s: &[u8]) -> IResult<&[u8], OscArg> {
    match type_tag {
        'i' => map(be_i32, OscArg::Int)(s),
        'f' => map(be_f32, OscArg::Float)(s),
        'h' => map(be_i64, OscArg::Long)(s),
        'd' => map(be_f64, OscArg::Double)(s),
        's' => map(parse_string, OscArg::Str)(s),
        'b' => map(parse_blob, OscArg::Blob)(s),
        'T' => Ok((s, OscArg::Bool(true))),
        'F' => Ok((s, OscArg::Bool(false))),
        'N' => Ok((s, OscArg::Nil)),
        'I' => Ok((s, OscArg::Impulse)),
        _ => fail(s, ErrorKind::OneOf),
    }
}

fn parse_message(s: &[u8]) -> IResult<&[u8], OscMessage> {
    let (mut rest, address) = parse_string(s)?;
    if !address.starts_with('/') {
        return fail(s, ErrorKind::Tag);
    }

    let mut args = Vec::new();
    // Very old senders leave the type tags off entirely, which means no args
    if !rest.is_empty() {
        let tags_start = rest;
        let (after_tags, type_tags) = parse_string(rest)?;
        let Some(type_tags) = type_tags.strip_prefix(',') else {
            return fail(tags_start, ErrorKind::Tag);
        };

        rest = after_tags;
        for type_tag in type_tags.chars() {
            let (after_arg, arg) = parse_arg(type_tag, rest)?;
            args.push(arg);
            rest = after_arg;
        }
    }

    Ok((rest, OscMessage { address, args }))
}

fn parse_bundle(s: &[u8]) -> IResult<&[u8], Vec<OscMessage>> {
    let (s, _) = tag(BUNDLE_TAG)(s)?;
    let (mut rest, _time_tag) = be_u64(s)?;

    let mut messages = Vec::new();
    while !rest.is_empty() {
        let (after_element, element) = parse_sized(rest)?;
        let (_, mut inner) = all_consuming(parse_packet)(element)?;
        messages.append(&mut inner);
        rest = after_element;
    }

    Ok((rest, messages))
}

fn parse_packet(s: &[u8]) -> IResult<&[u8], Vec<OscMessage>> {
    if s.starts_with(BUNDLE_TAG) {
        parse_bundle(s)
    } else {
        map(parse_message, |m| vec![m])(s)
    }
}

/// Decodes one datagram into the messages it carries, in order.
pub fn decode_packet(bytes: &[u8]) -> Result<Vec<OscMessage>, OscDecodeError> {
    match all_consuming(parse_packet)(bytes).finish() {
        Ok((_remaining, messages)) => Ok(messages),
        Err(Error { input, code }) => Err(OscDecodeError {
            offset: bytes.len() - input.len(),
            code,
        }),
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;

    #[test]
    fn test_horseshoe_message() {
        let bytes = encode_message(
            "/muse/dsp/elements/horseshoe",
            &[
                OscArg::Float(1.0),
                OscArg::Float(2.0),
                OscArg::Float(1.0),
                OscArg::Float(3.0),
            ],
        );

        let res = decode_packet(&bytes).unwrap();

        assert_eq!(
            res,
            vec![OscMessage {
                address: "/muse/dsp/elements/horseshoe".to_owned(),
                args: vec![
                    OscArg::Float(1.0),
                    OscArg::Float(2.0),
                    OscArg::Float(1.0),
                    OscArg::Float(3.0),
                ],
            }]
        );
    }

    #[test]
    fn test_known_bytes() {
        // "/a" + pad, ",i" + pad, 7
        let bytes = [
            b'/', b'a', 0, 0, b',', b'i', 0, 0, 0, 0, 0, 7,
        ];
        let res = decode_packet(&bytes).unwrap();
        assert_eq!(res[0].address, "/a");
        assert_eq!(res[0].args, vec![OscArg::Int(7)]);
    }

    #[test]
    fn test_address_on_word_boundary() {
        // "/abc" is exactly 4 bytes so it needs a full extra word of nulls
        let bytes = encode_message("/abc", &[OscArg::Int(-2)]);
        assert_eq!(&bytes[..8], b"/abc\0\0\0\0");
        let res = decode_packet(&bytes).unwrap();
        assert_eq!(res[0].address, "/abc");
        assert_eq!(res[0].args, vec![OscArg::Int(-2)]);
    }

    #[test]
    fn test_mixed_arguments() {
        let args = vec![
            OscArg::Str("hello".to_owned()),
            OscArg::Blob(vec![1, 2, 3]),
            OscArg::Long(-5),
            OscArg::Double(0.25),
            OscArg::Bool(true),
            OscArg::Bool(false),
            OscArg::Nil,
            OscArg::Impulse,
            OscArg::Int(9),
        ];
        let bytes = encode_message("/mixed", &args);
        let res = decode_packet(&bytes).unwrap();
        assert_eq!(res[0].args, args);
    }

    #[test]
    fn test_no_type_tags() {
        let bytes = b"/ping\0\0\0";
        let res = decode_packet(bytes).unwrap();
        assert_eq!(res[0].address, "/ping");
        assert!(res[0].args.is_empty());
    }

    #[test]
    fn test_nested_bundle() {
        let alpha = encode_message("/alpha", &[OscArg::Float(0.5)]);
        let beta = encode_message("/beta", &[OscArg::Float(0.25)]);
        let fhead = encode_message("/touching_forehead", &[OscArg::Int(1)]);
        let inner = encode_bundle(&[beta]);
        let bytes = encode_bundle(&[alpha, inner, fhead]);

        let res = decode_packet(&bytes).unwrap();
        let addresses: Vec<_> = res.iter().map(|m| m.address.as_str()).collect();
        assert_eq!(addresses, vec!["/alpha", "/beta", "/touching_forehead"]);
    }

    #[test]
    fn test_truncated_argument() {
        let mut bytes = encode_message("/x", &[OscArg::Int(1)]);
        bytes.truncate(bytes.len() - 2);
        assert!(decode_packet(&bytes).is_err());
    }

    #[test]
    fn test_blob_size_overruns() {
        let mut bytes = b"/x\0\0,b\0\0".to_vec();
        bytes.extend_from_slice(&100u32.to_be_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 4]);

        let err = decode_packet(&bytes).unwrap_err();
        assert_eq!(err.offset, 12);
        assert_eq!(err.code, ErrorKind::Eof);
    }

    #[test]
    fn test_bundle_element_size_overruns() {
        let mut bytes = BUNDLE_TAG.to_vec();
        bytes.extend_from_slice(&1u64.to_be_bytes());
        bytes.extend_from_slice(&64u32.to_be_bytes());
        bytes.extend_from_slice(b"/x\0\0");
        assert!(decode_packet(&bytes).is_err());

        // A size prefix cut off halfway is just as broken
        let mut bytes = BUNDLE_TAG.to_vec();
        bytes.extend_from_slice(&1u64.to_be_bytes());
        bytes.extend_from_slice(&[0, 0]);
        assert!(decode_packet(&bytes).is_err());
    }

    #[test]
    fn test_unknown_type_tag() {
        let mut bytes = encode_message("/x", &[OscArg::Int(1)]);
        // ",i" -> ",q"
        bytes[5] = b'q';
        let err = decode_packet(&bytes).unwrap_err();
        assert_eq!(err.offset, 8);
        assert_eq!(err.code, ErrorKind::OneOf);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode_packet(b"").is_err());
        assert!(decode_packet(b"nope\0\0\0\0").is_err());
        let mut bytes = encode_message("/x", &[OscArg::Int(1)]);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert!(decode_packet(&bytes).is_err());
    }
}
