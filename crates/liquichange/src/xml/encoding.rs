//! Text encodings for rendered documents.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::ChangelogError;

/// Text encoding declared in the XML prolog and used for the output bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// UTF-8 (the default).
    #[default]
    Utf8,
    /// UTF-16, little-endian, with a byte order mark.
    Utf16,
    /// 7-bit US-ASCII.
    UsAscii,
    /// ISO-8859-1 (Latin-1).
    Iso8859_1,
}

impl Encoding {
    /// Returns the label written in the XML prolog.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16 => "UTF-16",
            Self::UsAscii => "US-ASCII",
            Self::Iso8859_1 => "ISO-8859-1",
        }
    }

    /// Highest code point representable as a single byte, for the 8-bit encodings.
    fn max_code_point(self) -> Option<u32> {
        match self {
            Self::Utf8 | Self::Utf16 => None,
            Self::UsAscii => Some(0x7F),
            Self::Iso8859_1 => Some(0xFF),
        }
    }

    /// Replaces characters this encoding cannot represent with numeric
    /// character references (`ü` becomes `&#252;` in US-ASCII).
    ///
    /// Only valid for character data and attribute values, which is all the
    /// document writer ever feeds through here besides ASCII markup.
    #[must_use]
    pub fn escape_unrepresentable(self, text: &str) -> Cow<'_, str> {
        let Some(max) = self.max_code_point() else {
            return Cow::Borrowed(text);
        };
        if text.chars().all(|c| u32::from(c) <= max) {
            return Cow::Borrowed(text);
        }

        let mut out = String::with_capacity(text.len() + 16);
        for c in text.chars() {
            if u32::from(c) <= max {
                out.push(c);
            } else {
                out.push_str(&format!("&#{};", u32::from(c)));
            }
        }
        Cow::Owned(out)
    }

    /// Encodes rendered text into bytes.
    #[must_use]
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf16 => {
                let mut bytes = Vec::with_capacity(2 + text.len() * 2);
                bytes.extend_from_slice(&[0xFF, 0xFE]);
                for unit in text.encode_utf16() {
                    bytes.extend_from_slice(&unit.to_le_bytes());
                }
                bytes
            }
            Self::UsAscii | Self::Iso8859_1 => self
                .escape_unrepresentable(text)
                .chars()
                // Every char left is within the single-byte range.
                .map(|c| u8::try_from(c).unwrap_or(b'?'))
                .collect(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Encoding {
    type Err = ChangelogError;

    /// Parses an encoding label, ignoring case, `-` and `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "utf8" => Ok(Self::Utf8),
            "utf16" | "utf16le" => Ok(Self::Utf16),
            "usascii" | "ascii" => Ok(Self::UsAscii),
            "iso88591" | "latin1" | "l1" => Ok(Self::Iso8859_1),
            _ => Err(ChangelogError::UnsupportedEncoding(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("utf8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("utf-16".parse::<Encoding>().unwrap(), Encoding::Utf16);
        assert_eq!("us-ascii".parse::<Encoding>().unwrap(), Encoding::UsAscii);
        assert_eq!("Latin-1".parse::<Encoding>().unwrap(), Encoding::Iso8859_1);
        assert_eq!("ISO_8859_1".parse::<Encoding>().unwrap(), Encoding::Iso8859_1);
    }

    #[test]
    fn test_unknown_label() {
        let err = "ebcdic".parse::<Encoding>().unwrap_err();
        assert!(matches!(err, ChangelogError::UnsupportedEncoding(ref l) if l == "ebcdic"));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for encoding in [
            Encoding::Utf8,
            Encoding::Utf16,
            Encoding::UsAscii,
            Encoding::Iso8859_1,
        ] {
            assert_eq!(encoding.to_string().parse::<Encoding>().unwrap(), encoding);
        }
    }

    #[test]
    fn test_latin1_bytes() {
        assert_eq!(Encoding::Iso8859_1.encode("Müller"), b"M\xFCller".to_vec());
        // Outside Latin-1: character reference.
        assert_eq!(Encoding::Iso8859_1.encode("€"), b"&#8364;".to_vec());
    }

    #[test]
    fn test_ascii_references() {
        assert_eq!(Encoding::UsAscii.escape_unrepresentable("Müller"), "M&#252;ller");
        assert!(matches!(
            Encoding::UsAscii.escape_unrepresentable("plain"),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_utf16_has_bom() {
        let bytes = Encoding::Utf16.encode("ü");
        assert_eq!(bytes, vec![0xFF, 0xFE, 0xFC, 0x00]);
    }

    #[test]
    fn test_utf8_is_passthrough() {
        assert_eq!(Encoding::Utf8.encode("ü"), "ü".as_bytes().to_vec());
        assert_eq!(Encoding::default(), Encoding::Utf8);
    }
}
