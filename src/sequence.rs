use crate::options::ResponseShape;
use serde_json::Value;

/// Splits a re-parsed list into a confirmed prefix and a pending tail.
///
/// Every item but the last is confirmed: once a later item has started, the
/// earlier ones cannot change anymore. The last item stays pending until
/// another item follows it or the stream ends.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SequenceTracker {
    confirmed: usize,
    items: Vec<Value>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current list with a freshly parsed one.
    #[must_use]
    pub fn update(self, items: Vec<Value>) -> Self {
        Self { items, ..self }
    }

    /// Snapshots for every index confirmed since the last `advance`, each
    /// truncated to `index + 1` items, in ascending order.
    pub fn pending(&self) -> Vec<Vec<Value>> {
        let stable = self.items.len().saturating_sub(1);
        (self.confirmed..stable)
            .map(|idx| self.items[..=idx].to_vec())
            .collect()
    }

    /// Mark everything except the last item as confirmed.
    #[must_use]
    pub fn advance(self) -> Self {
        let stable = self.items.len().saturating_sub(1);
        Self {
            confirmed: self.confirmed.max(stable),
            ..self
        }
    }

    /// The complete list, last item included.
    pub fn finalize(&self) -> Vec<Value> {
        self.items.clone()
    }

    #[must_use]
    pub fn reset(self) -> Self {
        Self::default()
    }

    pub fn confirmed_len(&self) -> usize {
        self.confirmed
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

/// The list inside a decoded value, if it is shaped like one.
///
/// Arrays always qualify (unless the shape is `Object`). With
/// `ResponseShape::Sequence`, an object whose only property is an array,
/// like `{"items": [...]}`, qualifies as well.
pub fn as_sequence(value: &Value, shape: ResponseShape) -> Option<&Vec<Value>> {
    match (shape, value) {
        (ResponseShape::Object, _) => None,
        (_, Value::Array(items)) => Some(items),
        (ResponseShape::Sequence, Value::Object(map)) if map.len() == 1 => {
            map.values().next().and_then(Value::as_array)
        }
        _ => None,
    }
}
