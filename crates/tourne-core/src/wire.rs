//! UDP wire codec
//!
//! The installation speaks an OSC 1.0 subset: NUL-terminated address padded
//! to a 4-byte boundary, a `,`-prefixed type tag string (only `i` and `f`
//! tags), then big-endian 4-byte arguments. Keeping the encoding
//! OSC-compatible means Pure Data and other off-the-shelf subscribers can
//! sit on the router's output without an adapter.

use crate::message::{Arg, Message};

/// Error type for wire encoding/decoding
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("datagram truncated ({0} bytes)")]
    Truncated(usize),

    #[error("address is not NUL-terminated")]
    UnterminatedAddress,

    #[error("address must start with '/', got {0:?}")]
    BadAddress(String),

    #[error("address is not valid UTF-8")]
    BadEncoding,

    #[error("missing type tag string")]
    MissingTypeTags,

    #[error("unsupported type tag '{0}'")]
    UnsupportedTag(char),

    #[error("argument payload truncated")]
    TruncatedArgs,
}

/// Pad a length up to the next 4-byte boundary (OSC strings always carry
/// at least one NUL, so an exact multiple still gains 4 bytes).
fn padded_len(len: usize) -> usize {
    (len + 4) & !3
}

/// Encode a message into a datagram.
pub fn encode(msg: &Message) -> Vec<u8> {
    let addr_len = padded_len(msg.topic.len());
    let tags_len = padded_len(1 + msg.args.len());
    let mut buf = Vec::with_capacity(addr_len + tags_len + msg.args.len() * 4);

    buf.extend_from_slice(msg.topic.as_bytes());
    buf.resize(addr_len, 0);

    buf.push(b',');
    for arg in &msg.args {
        buf.push(match arg {
            Arg::Int(_) => b'i',
            Arg::Float(_) => b'f',
        });
    }
    buf.resize(addr_len + tags_len, 0);

    for arg in &msg.args {
        match arg {
            Arg::Int(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Arg::Float(v) => buf.extend_from_slice(&v.to_be_bytes()),
        }
    }

    buf
}

/// Read a padded string starting at `offset`, returning the string and the
/// offset of the next field.
fn read_padded_str(buf: &[u8], offset: usize) -> Result<(&str, usize), WireError> {
    let rest = &buf[offset..];
    let nul = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(WireError::UnterminatedAddress)?;
    let s = std::str::from_utf8(&rest[..nul]).map_err(|_| WireError::BadEncoding)?;
    Ok((s, offset + padded_len(nul)))
}

/// Decode a datagram into a message.
pub fn decode(buf: &[u8]) -> Result<Message, WireError> {
    if buf.len() < 4 {
        return Err(WireError::Truncated(buf.len()));
    }

    let (topic, offset) = read_padded_str(buf, 0)?;
    if !topic.starts_with('/') {
        return Err(WireError::BadAddress(topic.to_string()));
    }
    let topic = topic.to_string();

    if offset >= buf.len() {
        // Message with no type tag string: treat as zero arguments.
        // pythonosc emits these for bare-topic sends.
        return Ok(Message { topic, args: Vec::new() });
    }

    let (tags, mut offset) = read_padded_str(buf, offset)?;
    let tags = tags.strip_prefix(',').ok_or(WireError::MissingTypeTags)?;

    let mut args = Vec::with_capacity(tags.len());
    for tag in tags.chars() {
        if buf.len() < offset + 4 {
            return Err(WireError::TruncatedArgs);
        }
        let raw: [u8; 4] = buf[offset..offset + 4].try_into().expect("4-byte slice");
        offset += 4;
        match tag {
            'i' => args.push(Arg::Int(i32::from_be_bytes(raw))),
            'f' => args.push(Arg::Float(f32::from_be_bytes(raw))),
            other => return Err(WireError::UnsupportedTag(other)),
        }
    }

    Ok(Message { topic, args })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_pads_to_four_bytes() {
        // "/ab" + NUL is exactly 4 bytes; ",i" needs two NULs of padding
        let buf = encode(&Message::int("/ab", 7));
        assert_eq!(
            buf,
            vec![b'/', b'a', b'b', 0, b',', b'i', 0, 0, 0, 0, 0, 7]
        );
    }

    #[test]
    fn exact_multiple_still_gets_a_nul() {
        // A 4-char address must grow to 8 bytes: OSC strings always terminate
        let buf = encode(&Message::new("/abc", []));
        assert_eq!(buf.len() % 4, 0);
        assert_eq!(&buf[..5], b"/abc\0");
    }

    #[test]
    fn decode_matches_encode() {
        let msg = Message::new(
            "/color/raw/rgb",
            [Arg::Int(120), Arg::Float(0.25), Arg::Int(-1)],
        );
        let decoded = decode(&encode(&msg)).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn decode_rejects_bad_address() {
        let buf = encode(&Message::int("/x", 1));
        let mut bad = buf.clone();
        bad[0] = b'x';
        assert!(matches!(decode(&bad), Err(WireError::BadAddress(_))));
    }

    #[test]
    fn decode_rejects_unknown_tag() {
        // Hand-build a datagram with a string tag
        let mut buf = Vec::new();
        buf.extend_from_slice(b"/x\0\0");
        buf.extend_from_slice(b",s\0\0");
        buf.extend_from_slice(b"hi\0\0");
        assert!(matches!(decode(&buf), Err(WireError::UnsupportedTag('s'))));
    }

    #[test]
    fn decode_rejects_truncated_args() {
        let buf = encode(&Message::int("/x", 1));
        assert!(matches!(
            decode(&buf[..buf.len() - 2]),
            Err(WireError::TruncatedArgs)
        ));
    }

    #[test]
    fn bare_topic_decodes_to_zero_args() {
        let buf = b"/ping\0\0\0";
        let msg = decode(buf).unwrap();
        assert_eq!(msg.topic, "/ping");
        assert!(msg.args.is_empty());
    }
}
