//! Representation tags and type-erased content.
//!
//! A reader produces content in its bound API, a writer consumes content in
//! its bound API, and a transform converts between two APIs. The API of a
//! value is its Rust type, captured as an [`ApiTag`].

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime identifier of a representation ("API").
#[derive(Clone, Copy)]
pub struct ApiTag {
    id: TypeId,
    name: &'static str,
}

impl ApiTag {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ApiTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ApiTag {}

impl Hash for ApiTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ApiTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Debug for ApiTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiTag({})", self.name)
    }
}

/// A value tagged with its representation.
pub struct Content {
    tag: ApiTag,
    value: Box<dyn Any + Send>,
}

impl Content {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            tag: ApiTag::of::<T>(),
            value: Box::new(value),
        }
    }

    pub fn tag(&self) -> ApiTag {
        self.tag
    }

    pub fn is<T: Any>(&self) -> bool {
        self.tag == ApiTag::of::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Unwrap the value, handing the content back when it is not a `T`.
    pub fn downcast<T: Any>(self) -> Result<T, Content> {
        let Content { tag, value } = self;
        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Content { tag, value }),
        }
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Content({})", self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_identity() {
        assert_eq!(ApiTag::of::<String>(), ApiTag::of::<String>());
        assert_ne!(ApiTag::of::<String>(), ApiTag::of::<&'static str>());
        assert_eq!(ApiTag::of::<Vec<u8>>().name(), "alloc::vec::Vec<u8>");
    }

    #[test]
    fn test_downcast() {
        let content = Content::new(String::from("a,b,c"));
        assert!(content.is::<String>());
        assert_eq!(content.downcast_ref::<String>().map(String::len), Some(5));

        let content = match content.downcast::<usize>() {
            Ok(_) => panic!("String content must not downcast to usize"),
            Err(back) => back,
        };
        assert_eq!(content.tag(), ApiTag::of::<String>());
        assert_eq!(content.downcast::<String>().unwrap(), "a,b,c");
    }
}
