//! Whitespace/punctuation tokenizer used for both queries and documents.

/// Split text into alphanumeric tokens, preserving case.
///
/// Any non-alphanumeric character is a separator, so `"U.S.-based"` yields
/// `["U", "S", "based"]`. Case is kept because pretrained vocabularies such
/// as GoogleNews are case-sensitive; [`crate::WordVectors::token_id`] falls
/// back to the lowercase form on a miss.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}
