//! NFC Forum Record Type Definitions for Text (`T`) and URI (`U`) records

use super::{NdefError, NdefRecord, Tnf};

/// Well-known type of a Text record
pub const TEXT_TYPE: &[u8] = b"T";
/// Well-known type of a URI record
pub const URI_TYPE: &[u8] = b"U";

const STATUS_UTF16: u8 = 0x80;
const STATUS_LANG_MASK: u8 = 0x3F;

/// URI identifier codes, indexed by code value
const URI_PREFIXES: [&str; 36] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

/// Build a UTF-8 Text record
///
/// `lang` is an IANA language code such as `"en"`, at most 63 bytes.
pub fn text(lang: &str, text: &str) -> Result<NdefRecord, NdefError> {
    let lang = lang.as_bytes();
    if lang.len() > STATUS_LANG_MASK as usize {
        return Err(NdefError::InvalidText(format!(
            "language code of {} bytes exceeds 63",
            lang.len()
        )));
    }

    let mut payload = Vec::with_capacity(1 + lang.len() + text.len());
    payload.push(lang.len() as u8);
    payload.extend_from_slice(lang);
    payload.extend_from_slice(text.as_bytes());
    NdefRecord::new(Tnf::WellKnown, TEXT_TYPE.to_vec(), None, payload)
}

/// Decode a Text record into `(language, text)`
///
/// Returns `Ok(None)` if the record is not a well-known Text record.
pub fn parse_text(record: &NdefRecord) -> Result<Option<(String, String)>, NdefError> {
    if record.tnf() != Tnf::WellKnown || record.record_type() != TEXT_TYPE {
        return Ok(None);
    }
    let payload = record.payload();
    let status = *payload
        .first()
        .ok_or_else(|| NdefError::InvalidText("missing status byte".into()))?;
    let lang_len = (status & STATUS_LANG_MASK) as usize;
    if payload.len() < 1 + lang_len {
        return Err(NdefError::InvalidText(
            "language code runs past the payload".into(),
        ));
    }

    let lang = String::from_utf8_lossy(&payload[1..1 + lang_len]).into_owned();
    let body = &payload[1 + lang_len..];
    let text = if status & STATUS_UTF16 != 0 {
        decode_utf16(body)?
    } else {
        String::from_utf8(body.to_vec()).map_err(|e| NdefError::InvalidText(e.to_string()))?
    };
    Ok(Some((lang, text)))
}

fn decode_utf16(body: &[u8]) -> Result<String, NdefError> {
    if body.len() % 2 != 0 {
        return Err(NdefError::InvalidText("odd length UTF-16 text".into()));
    }
    let mut units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    // Byte order mark; little endian text is swapped back
    match units.first().copied() {
        Some(0xFEFF) => {
            units.remove(0);
        }
        Some(0xFFFE) => {
            units.remove(0);
            for unit in units.iter_mut() {
                *unit = unit.swap_bytes();
            }
        }
        _ => {}
    }
    String::from_utf16(&units).map_err(|e| NdefError::InvalidText(e.to_string()))
}

/// Build a URI record, abbreviating the longest known prefix
pub fn uri(uri: &str) -> Result<NdefRecord, NdefError> {
    let (code, prefix) = URI_PREFIXES
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, prefix)| uri.starts_with(*prefix))
        .max_by_key(|(_, prefix)| prefix.len())
        .map(|(code, prefix)| (code as u8, prefix.len()))
        .unwrap_or((0, 0));

    let mut payload = Vec::with_capacity(1 + uri.len() - prefix);
    payload.push(code);
    payload.extend_from_slice(&uri.as_bytes()[prefix..]);
    NdefRecord::new(Tnf::WellKnown, URI_TYPE.to_vec(), None, payload)
}

/// Expand a URI record back to its full form
///
/// Returns `None` if the record is not a URI record or uses an unknown code.
pub fn parse_uri(record: &NdefRecord) -> Option<String> {
    if record.tnf() != Tnf::WellKnown || record.record_type() != URI_TYPE {
        return None;
    }
    let (code, rest) = record.payload().split_first()?;
    let prefix = URI_PREFIXES.get(*code as usize)?;
    Some(format!("{}{}", prefix, String::from_utf8_lossy(rest)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_record() {
        let record = text("en", "Hello").unwrap();
        assert_eq!(record.payload(), b"\x02enHello");
        assert_eq!(
            parse_text(&record).unwrap(),
            Some(("en".to_string(), "Hello".to_string()))
        );
    }

    #[test]
    fn test_text_rejects_long_language() {
        assert!(matches!(
            text(&"x".repeat(64), "hi"),
            Err(NdefError::InvalidText(_))
        ));
    }

    #[test]
    fn test_parse_utf16_text() {
        // UTF-16, lang "en", BOM + "Hi"
        let payload = vec![0x82, b'e', b'n', 0xFE, 0xFF, 0x00, b'H', 0x00, b'i'];
        let record = NdefRecord::well_known("T", payload).unwrap();
        assert_eq!(
            parse_text(&record).unwrap(),
            Some(("en".to_string(), "Hi".to_string()))
        );
    }

    #[test]
    fn test_parse_text_ignores_other_types() {
        let record = uri("https://example.com").unwrap();
        assert_eq!(parse_text(&record).unwrap(), None);
    }

    #[test]
    fn test_uri_prefix_abbreviation() {
        let record = uri("https://www.example.com").unwrap();
        assert_eq!(record.payload()[0], 0x02);
        assert_eq!(&record.payload()[1..], b"example.com");
        assert_eq!(
            parse_uri(&record).as_deref(),
            Some("https://www.example.com")
        );

        let record = uri("tel:+123").unwrap();
        assert_eq!(record.payload(), b"\x05+123");

        let record = uri("geo:1,2").unwrap();
        assert_eq!(record.payload(), b"\x00geo:1,2");
        assert_eq!(parse_uri(&record).as_deref(), Some("geo:1,2"));
    }

    #[test]
    fn test_parse_uri_unknown_code() {
        let record = NdefRecord::well_known("U", vec![0x40, b'x']).unwrap();
        assert_eq!(parse_uri(&record), None);
    }
}
