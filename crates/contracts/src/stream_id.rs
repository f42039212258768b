//! Identity of a source stream.
//!
//! A stream id is created once, when a source shows up in the
//! configuration or pushes its first sample, and from then on it is cloned
//! into every queue slot and estimator-map key the buffer creates for that
//! source. Backing the id with `Arc<str>` makes those clones a reference
//! count bump instead of a string allocation.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Name of a source stream.
///
/// Equality, ordering and hashing all follow the underlying string, so a
/// `StreamId` works as a map key interchangeably with `&str` lookups. The
/// buffer itself is generic over the id type; `StreamId` is the default
/// and what the config layer produces.
///
/// ```
/// use contracts::StreamId;
///
/// let front = StreamId::new("camera/front");
/// let rear = StreamId::new("camera/rear");
/// assert!(front < rear);
/// assert_eq!(front.as_str(), "camera/front");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(Arc<str>);

impl StreamId {
    pub fn new(name: &str) -> Self {
        StreamId(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// conversions

impl From<&str> for StreamId {
    fn from(name: &str) -> Self {
        StreamId::new(name)
    }
}

impl From<String> for StreamId {
    fn from(name: String) -> Self {
        StreamId(Arc::from(name))
    }
}

// string-like access, also what lets `HashMap<StreamId, _>` be queried
// with a plain `&str`

impl Deref for StreamId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StreamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StreamId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for StreamId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // renders as the bare quoted name, ids show up in a lot of traces
        write!(f, "{:?}", &*self.0)
    }
}

impl Serialize for StreamId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StreamId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(StreamId::from)
    }
}
