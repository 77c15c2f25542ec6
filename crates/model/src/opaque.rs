use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// A transcript item that the adapter doesn't understand, but must keep.
///
/// Providers may return items the unified model has no variant for
/// (reasoning traces, built-in tool activity, ...). Some of them expect
/// those items to be sent back untouched on the next request. An
/// `OpaqueItem` stores the raw JSON object so that it can be echoed to
/// the provider that produced it, and skipped by every other encoder.
#[derive(Clone)]
pub struct OpaqueItem(Arc<Value>);

impl OpaqueItem {
    /// Creates a new `OpaqueItem` from a raw JSON value.
    #[inline]
    pub fn new(value: Value) -> Self {
        Self(Arc::new(value))
    }

    /// Returns the `type` discriminator of the raw item, if any.
    #[inline]
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// Returns the raw item.
    #[inline]
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl Debug for OpaqueItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueItem")
            .field("kind", &self.kind())
            .finish()
    }
}

impl PartialEq for OpaqueItem {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Serialize for OpaqueItem {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_kind() {
        let item =
            OpaqueItem::new(json!({ "type": "reasoning", "id": "rs_1" }));
        assert_eq!(item.kind(), Some("reasoning"));

        let item = OpaqueItem::new(json!({ "role": "system" }));
        assert_eq!(item.kind(), None);
    }

    #[test]
    fn test_common_traits() {
        let item_0 = OpaqueItem::new(json!({ "type": "web_search_call" }));
        let item_1 = OpaqueItem::new(json!({ "type": "reasoning" }));

        let item_0_clone = item_0.clone();
        assert_eq!(item_0, item_0_clone);
        assert_ne!(item_0, item_1);
        assert_eq!(
            item_0,
            OpaqueItem::new(json!({ "type": "web_search_call" }))
        );
        assert_eq!(
            serde_json::to_value(&item_1).unwrap(),
            json!({ "type": "reasoning" })
        );
    }
}
