use crate::api::WireParentId;

/// The backend keys numeric ids as numbers; anything else stays a string.
pub(crate) fn wire_parent_id(id: &str) -> WireParentId {
    let trimmed = id.trim();
    match trimmed.parse::<i64>() {
        Ok(n) if n.to_string() == trimmed => WireParentId::Numeric(n),
        _ => WireParentId::Text(id.to_string()),
    }
}
