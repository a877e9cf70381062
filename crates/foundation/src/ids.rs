/// Validated industry identifier.
///
/// Ids become resource path segments, so the alphabet is closed: ASCII
/// alphanumerics plus `-` and `_`, nothing else. Construction is the only
/// place the check happens; everything downstream can trust the contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndustryId(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidIndustryId {
    pub raw: String,
}

impl std::fmt::Display for InvalidIndustryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid industry id: {:?}", self.raw)
    }
}

impl std::error::Error for InvalidIndustryId {}

impl IndustryId {
    pub fn parse(raw: &str) -> Result<Self, InvalidIndustryId> {
        if raw.is_empty() || !raw.bytes().all(is_allowed_byte) {
            return Err(InvalidIndustryId {
                raw: raw.to_string(),
            });
        }
        Ok(IndustryId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IndustryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IndustryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_allowed_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
