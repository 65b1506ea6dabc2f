use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A provider-specific message that the agent carries around without
/// looking into it.
///
/// Some providers need the exact assistant message they produced (for
/// example, one that contains tool call requests) to be sent back verbatim
/// in the next request. The provider wraps that message in an
/// `OpaqueMessage`, the agent puts it into the request history, and the
/// provider unwraps it again when building the payload.
///
/// Two opaque messages are equal when their ids are equal.
pub struct OpaqueMessage(Arc<dyn OpaqueValue>);

impl OpaqueMessage {
    /// Wraps `value` under the given id.
    ///
    /// The id should be unique within a conversation.
    #[inline]
    pub fn new<ID: Into<String>, T: Send + Sync + 'static>(
        id: ID,
        value: T,
    ) -> Self {
        Self(Arc::new(Tagged {
            id: id.into(),
            value,
        }))
    }

    /// Returns the id of this message.
    #[inline]
    pub fn id(&self) -> &str {
        self.0.id()
    }

    /// Returns the wrapped value if it is a `T`.
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }
}

impl Clone for OpaqueMessage {
    #[inline]
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl Debug for OpaqueMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OpaqueMessage").field(&self.id()).finish()
    }
}

impl PartialEq for OpaqueMessage {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for OpaqueMessage {}

impl Hash for OpaqueMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

trait OpaqueValue: Send + Sync {
    fn id(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}

struct Tagged<T> {
    id: String,
    value: T,
}

impl<T: Send + Sync + 'static> OpaqueValue for Tagged<T> {
    fn id(&self) -> &str {
        &self.id
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct ProviderMessage {
        content: String,
    }

    #[test]
    fn test_downcast() {
        let opaque = OpaqueMessage::new(
            "chatcmpl-1",
            ProviderMessage {
                content: "Paris".to_owned(),
            },
        );
        assert_eq!(opaque.id(), "chatcmpl-1");
        let msg = opaque.downcast_ref::<ProviderMessage>().unwrap();
        assert_eq!(msg.content, "Paris");
        assert!(opaque.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_identity_by_id() {
        let first = OpaqueMessage::new("a", 1u32);
        let same_id = OpaqueMessage::new("a", 2u32);
        let other = OpaqueMessage::new("b", 1u32);
        assert_eq!(first, same_id);
        assert_ne!(first, other);

        let set: HashSet<_> = [first.clone(), first, same_id, other]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }
}
