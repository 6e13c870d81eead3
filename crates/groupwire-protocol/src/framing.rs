//! Frame encode/decode.
//!
//! All widths are measured in characters rather than bytes: the relay
//! transports text bodies, not raw octets.

use crate::error::{FrameError, FrameResult};
use crate::{FILLER, FRAME_LEN, HEADER_LEN, LEN_WIDTH, MAX_PAYLOAD, SENDER_WIDTH};

/// A decoded application message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Sender identity from the header, padding stripped.
    pub sender: String,
    /// Payload, exactly as many characters as the length field declared.
    pub payload: String,
}

/// Encodes a sender identity and payload into a fixed-length frame.
///
/// The output is always exactly [`FRAME_LEN`] characters.
///
/// # Example
///
/// ```rust
/// use groupwire_protocol::encode;
///
/// let wire = encode("abc123", "hello").unwrap();
/// assert!(wire.starts_with("AAAAAAAAAAAAAAAAAAAAAAAAAAabc123005hello"));
/// ```
pub fn encode(sender: &str, payload: &str) -> FrameResult<String> {
    encode_with(sender, payload, |frame| frame)
}

/// Encodes a frame, then applies `transform` to the finished text.
///
/// The transform lets a caller substitute its own wire representation
/// (base64, say) without reimplementing the frame layout. The identity
/// transform gives [`encode`].
pub fn encode_with<F>(sender: &str, payload: &str, transform: F) -> FrameResult<String>
where
    F: FnOnce(String) -> String,
{
    let sender_len = sender.chars().count();
    if sender_len > SENDER_WIDTH {
        return Err(FrameError::IdentityTooLong {
            len: sender_len,
            max: SENDER_WIDTH,
        });
    }

    let payload_len = payload.chars().count();
    if payload_len > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            len: payload_len,
            max: MAX_PAYLOAD,
        });
    }

    let mut frame = String::with_capacity(FRAME_LEN);
    frame.extend(std::iter::repeat(FILLER).take(SENDER_WIDTH - sender_len));
    frame.push_str(sender);
    frame.push_str(&format!("{:0width$}", payload_len, width = LEN_WIDTH));
    frame.push_str(payload);
    frame.extend(std::iter::repeat(FILLER).take(MAX_PAYLOAD - payload_len));

    Ok(transform(frame))
}

/// Decodes a fixed-length frame back into sender identity and payload.
///
/// The payload is recovered by slicing exactly the declared number of
/// characters after the header. Trailing filler is never trimmed, so a
/// payload containing the filler character survives the round trip.
pub fn decode(frame: &str) -> FrameResult<Frame> {
    let chars: Vec<char> = frame.chars().collect();
    if chars.len() != FRAME_LEN {
        return Err(FrameError::BadFrameLength {
            len: chars.len(),
            expected: FRAME_LEN,
        });
    }

    let sender: String = chars[..SENDER_WIDTH]
        .iter()
        .skip_while(|&&c| c == FILLER)
        .collect();

    let mut declared = 0usize;
    for c in &chars[SENDER_WIDTH..HEADER_LEN] {
        let Some(digit) = c.to_digit(10) else {
            return Err(FrameError::BadLengthField {
                field: chars[SENDER_WIDTH..HEADER_LEN].iter().collect(),
            });
        };
        declared = declared * 10 + digit as usize;
    }

    if declared > MAX_PAYLOAD {
        return Err(FrameError::Truncated {
            declared,
            available: MAX_PAYLOAD,
        });
    }

    let payload: String = chars[HEADER_LEN..HEADER_LEN + declared].iter().collect();

    Ok(Frame { sender, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let wire = encode("abc123", "hello").unwrap();
        assert_eq!(wire.chars().count(), FRAME_LEN);

        let frame = decode(&wire).unwrap();
        assert_eq!(frame.sender, "abc123");
        assert_eq!(frame.payload, "hello");
    }

    #[test]
    fn encode_layout_is_exact() {
        let wire = encode("abc123", "hello").unwrap();

        // 26 fillers, the identity, the zero-padded length, the payload,
        // then filler to 500.
        let expected_header = format!("{}abc123005", "A".repeat(26));
        assert!(wire.starts_with(&expected_header));
        assert_eq!(&wire[HEADER_LEN..HEADER_LEN + 5], "hello");
        assert!(wire[HEADER_LEN + 5..].chars().all(|c| c == FILLER));
        assert_eq!(wire.len(), FRAME_LEN);
    }

    #[test]
    fn payload_containing_filler_survives() {
        let wire = encode("abc123", "AAA not padding AAA").unwrap();
        let frame = decode(&wire).unwrap();
        assert_eq!(frame.payload, "AAA not padding AAA");
    }

    #[test]
    fn empty_payload_roundtrip() {
        let wire = encode("abc123", "").unwrap();
        assert_eq!(wire.chars().count(), FRAME_LEN);

        let frame = decode(&wire).unwrap();
        assert_eq!(frame.payload, "");
    }

    #[test]
    fn max_payload_fills_frame() {
        let payload = "x".repeat(MAX_PAYLOAD);
        let wire = encode("abc123", &payload).unwrap();
        assert_eq!(wire.chars().count(), FRAME_LEN);
        assert_eq!(decode(&wire).unwrap().payload, payload);
    }

    #[test]
    fn full_width_sender_roundtrip() {
        let sender = "f".repeat(SENDER_WIDTH);
        let frame = decode(&encode(&sender, "hi").unwrap()).unwrap();
        assert_eq!(frame.sender, sender);
    }

    #[test]
    fn sender_too_long() {
        let sender = "x".repeat(SENDER_WIDTH + 1);
        let result = encode(&sender, "hi");
        assert!(matches!(
            result,
            Err(FrameError::IdentityTooLong { len: 33, .. })
        ));
    }

    #[test]
    fn payload_too_large() {
        let payload = "x".repeat(MAX_PAYLOAD + 1);
        let result = encode("abc123", &payload);
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[test]
    fn decode_wrong_length() {
        assert!(matches!(
            decode("short"),
            Err(FrameError::BadFrameLength { len: 5, .. })
        ));
    }

    #[test]
    fn decode_non_numeric_length_field() {
        let mut wire = encode("abc123", "hello").unwrap();
        wire.replace_range(SENDER_WIDTH..HEADER_LEN, "0x5");
        assert!(matches!(
            decode(&wire),
            Err(FrameError::BadLengthField { .. })
        ));
    }

    #[test]
    fn decode_overdeclared_length() {
        let mut wire = encode("abc123", "hello").unwrap();
        wire.replace_range(SENDER_WIDTH..HEADER_LEN, "999");
        assert!(matches!(
            decode(&wire),
            Err(FrameError::Truncated { declared: 999, .. })
        ));
    }

    #[test]
    fn transform_applies_after_framing() {
        let wire = encode_with("abc123", "hello", |frame| frame.to_lowercase()).unwrap();
        // The padding was lowercased along with everything else.
        assert!(wire.starts_with("aaaa"));
        assert_eq!(wire.chars().count(), FRAME_LEN);
    }

    #[test]
    fn multibyte_payload_counts_chars_not_bytes() {
        let payload = "résumé ✓";
        let wire = encode("abc123", payload).unwrap();
        assert_eq!(wire.chars().count(), FRAME_LEN);

        let frame = decode(&wire).unwrap();
        assert_eq!(frame.payload, payload);
    }
}
