//! Byte-to-text decoding by trial.
//!
//! The archive sheet is exported from a Japanese spreadsheet, so the bytes are
//! usually Shift_JIS (CP932), sometimes EUC-JP, and occasionally already UTF-8.
//! Each candidate is tried strictly, in order. When every candidate rejects the
//! input, a windows-1252 passthrough decodes it anyway so that a migration run
//! always completes; the result is flagged as lossy.

use encoding_rs::{Encoding, EUC_JP, SHIFT_JIS, UTF_8, WINDOWS_1252};

use crate::error::DecodeError;

/// Decoder candidate order.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Tried first (after BOM sniffing and the UTF-8 hint).
    pub preferred: &'static Encoding,
    /// Tried in order when the preferred encoding rejects the input.
    pub fallbacks: Vec<&'static Encoding>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            preferred: SHIFT_JIS,
            fallbacks: vec![UTF_8, EUC_JP],
        }
    }
}

impl DecodeOptions {
    /// Use the encoding named by a WHATWG label (`shift_jis`, `cp932`,
    /// `euc-jp`, `utf-8`, ...) as the preferred one.
    pub fn with_preferred_label(label: &str) -> Result<Self, DecodeError> {
        let normalized = match label.trim().to_lowercase().as_str() {
            // Not a WHATWG label, but what most Windows tooling calls it
            "cp932" => "windows-31j".to_string(),
            other => other.to_string(),
        };
        let preferred = Encoding::for_label(normalized.as_bytes())
            .ok_or_else(|| DecodeError::UnknownEncoding(label.to_string()))?;
        Ok(Self {
            preferred,
            ..Self::default()
        })
    }
}

/// Decoded text with the encoding that produced it.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub text: String,
    /// Canonical name of the encoding used.
    pub encoding: String,
    /// True when the passthrough last resort was used.
    pub lossy: bool,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "shift_jis" | "sjis" | "cp932" | "windows-31j" => "shift_jis".to_string(),
        "euc-jp" | "eucjp" => "euc-jp".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes, never failing.
pub fn decode_bytes(bytes: &[u8], options: &DecodeOptions) -> Decoded {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        if let Some(text) =
            encoding.decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        {
            return Decoded {
                text: text.into_owned(),
                encoding: encoding.name().to_string(),
                lossy: false,
            };
        }
    }

    for encoding in candidate_chain(bytes, options) {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            return Decoded {
                text: text.into_owned(),
                encoding: encoding.name().to_string(),
                lossy: false,
            };
        }
    }

    // windows-1252 maps every byte, so this cannot reject the input
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    Decoded {
        text: text.into_owned(),
        encoding: WINDOWS_1252.name().to_string(),
        lossy: true,
    }
}

/// Candidate encodings in trial order, deduplicated.
///
/// A chardet verdict of UTF-8/ASCII moves UTF-8 to the front: valid UTF-8
/// Japanese text also happens to be well-formed Shift_JIS, just garbled.
fn candidate_chain(bytes: &[u8], options: &DecodeOptions) -> Vec<&'static Encoding> {
    let mut chain: Vec<&'static Encoding> = Vec::with_capacity(options.fallbacks.len() + 2);

    if detect_encoding(bytes) == "utf-8" {
        chain.push(UTF_8);
    }

    for encoding in std::iter::once(options.preferred).chain(options.fallbacks.iter().copied()) {
        if !chain.contains(&encoding) {
            chain.push(encoding);
        }
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_jis_decoding() {
        let (bytes, _, _) = SHIFT_JIS.encode("YEAR,BAND\n2005,田中 太郎");
        let decoded = decode_bytes(&bytes, &DecodeOptions::default());

        assert_eq!(decoded.text, "YEAR,BAND\n2005,田中 太郎");
        assert_eq!(decoded.encoding, "Shift_JIS");
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_utf8_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("YEAR,BAND\n1998,鈴木".as_bytes());
        let decoded = decode_bytes(&bytes, &DecodeOptions::default());

        assert_eq!(decoded.text, "YEAR,BAND\n1998,鈴木");
        assert_eq!(decoded.encoding, "UTF-8");
    }

    #[test]
    fn test_euc_jp_fallback() {
        let (bytes, _, _) = EUC_JP.encode("鈴木 花子");
        let options = DecodeOptions {
            preferred: UTF_8,
            fallbacks: vec![EUC_JP],
        };
        let decoded = decode_bytes(&bytes, &options);
        assert_eq!(decoded.text, "鈴木 花子");
        assert_eq!(decoded.encoding, "EUC-JP");
    }

    #[test]
    fn test_lossy_last_resort() {
        // 0xA0 is not a valid lead byte in Shift_JIS or EUC-JP, nor valid UTF-8
        let bytes: &[u8] = &[b'a', 0xA0, b'b'];
        let decoded = decode_bytes(bytes, &DecodeOptions::default());

        assert!(decoded.lossy);
        assert_eq!(decoded.encoding, "windows-1252");
        assert!(decoded.text.starts_with('a'));
        assert!(decoded.text.ends_with('b'));
    }

    #[test]
    fn test_preferred_label() {
        let options = DecodeOptions::with_preferred_label("cp932").unwrap();
        assert_eq!(options.preferred, SHIFT_JIS);
        let options = DecodeOptions::with_preferred_label("sjis").unwrap();
        assert_eq!(options.preferred, SHIFT_JIS);
        assert!(DecodeOptions::with_preferred_label("klingon").is_err());
    }

    #[test]
    fn test_chain_is_deduplicated() {
        let options = DecodeOptions {
            preferred: UTF_8,
            fallbacks: vec![UTF_8, EUC_JP],
        };
        let chain = candidate_chain(b"plain ascii", &options);
        assert_eq!(chain, vec![UTF_8, EUC_JP]);
    }
}
