//! APDU Response handling
//!
//! A Response contains optional data bytes plus the SW1/SW2 status word.

use super::status::StatusWord;
use super::ApduError;
use crate::field::{ByteField, CompositeField};

/// A response APDU
///
/// # Example
/// ```ignore
/// let response = Response::success(vec![0x01, 0x02]);
/// assert!(response.is_okay());
///
/// let error = Response::error(StatusWord::FILE_NOT_FOUND);
/// assert!(!error.is_okay());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    data: Option<Vec<u8>>,
    sw: StatusWord,
}

impl Response {
    /// Create a success response (0x9000) with data
    ///
    /// Empty data is omitted from the response entirely.
    pub fn success(data: Vec<u8>) -> Self {
        Self {
            data: if data.is_empty() { None } else { Some(data) },
            sw: StatusWord::OK,
        }
    }

    /// Create an empty success response (0x9000)
    pub fn ok() -> Self {
        Self {
            data: None,
            sw: StatusWord::OK,
        }
    }

    /// Create an error response (no data)
    ///
    /// # Panics
    /// If `sw` is 0x9000. Successful responses go through [`Response::success`].
    pub fn error(sw: StatusWord) -> Self {
        assert!(
            !sw.is_success(),
            "Response::error called with 9000, use Response::success"
        );
        Self { data: None, sw }
    }

    /// Parse a response APDU received from a card
    ///
    /// The last two bytes are the status word, anything before them is data.
    pub fn parse(raw: &[u8]) -> Result<Self, ApduError> {
        if raw.len() < 2 {
            return Err(ApduError::ResponseTooShort(raw.len()));
        }
        let (data, sw) = raw.split_at(raw.len() - 2);
        Ok(Self {
            data: if data.is_empty() {
                None
            } else {
                Some(data.to_vec())
            },
            sw: StatusWord::from_bytes(sw[0], sw[1]),
        })
    }

    /// Check if the response is okay (0x9000)
    pub fn is_okay(&self) -> bool {
        self.sw.is_success()
    }

    pub fn sw(&self) -> StatusWord {
        self.sw
    }

    /// Returns a copy of the data (empty if none)
    pub fn data(&self) -> Vec<u8> {
        self.data.clone().unwrap_or_default()
    }

    fn to_field(&self) -> CompositeField {
        CompositeField::with_children(
            "Response",
            vec![
                self.data
                    .as_ref()
                    .map(|data| ByteField::from_slice("Data", data)),
                Some(self.sw.to_field()),
            ],
        )
    }

    /// Convert to raw bytes for transmission (data + SW1 + SW2)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_field().bytes()
    }

    /// Get total length in bytes (data + 2 status bytes)
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len) + 2
    }

    /// Check if response has no data
    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::ok()
    }
}

impl From<StatusWord> for Response {
    /// Create a response from a bare status word
    fn from(sw: StatusWord) -> Self {
        if sw.is_success() {
            Self::ok()
        } else {
            Self::error(sw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let resp = Response::success(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(resp.is_okay());
        assert_eq!(resp.sw(), StatusWord::OK);
        assert_eq!(resp.data(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(resp.to_bytes(), vec![0xDE, 0xAD, 0xBE, 0xEF, 0x90, 0x00]);
        assert_eq!(resp.len(), 6);
    }

    #[test]
    fn test_success_omits_empty_data() {
        let resp = Response::success(Vec::new());
        assert!(resp.is_empty());
        assert_eq!(resp, Response::ok());
        assert_eq!(resp.to_bytes(), vec![0x90, 0x00]);
    }

    #[test]
    fn test_error_response() {
        let resp = Response::error(StatusWord::FILE_NOT_FOUND);
        assert!(!resp.is_okay());
        assert_eq!(resp.to_bytes(), vec![0x6A, 0x82]);
    }

    #[test]
    #[should_panic]
    fn test_error_rejects_success_sw() {
        Response::error(StatusWord::OK);
    }

    #[test]
    fn test_parse() {
        let resp = Response::parse(&[0x00, 0x0F, 0x90, 0x00]).unwrap();
        assert!(resp.is_okay());
        assert_eq!(resp.data(), vec![0x00, 0x0F]);

        let resp = Response::parse(&[0x6A, 0x82]).unwrap();
        assert_eq!(resp.sw(), StatusWord::FILE_NOT_FOUND);
        assert!(resp.is_empty());

        assert_eq!(
            Response::parse(&[0x90]),
            Err(ApduError::ResponseTooShort(1))
        );
    }

    #[test]
    fn test_from_sw() {
        let resp: Response = StatusWord::WRONG_OFFSET.into();
        assert_eq!(resp.to_bytes(), vec![0x6B, 0x00]);
        assert_eq!(Response::from(StatusWord::OK), Response::ok());
    }
}
