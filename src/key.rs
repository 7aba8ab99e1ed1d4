//! Singleton handle keys.

use std::any::TypeId;
use std::fmt;

/// Opaque identity of one singleton's per-type slot.
///
/// A key pairs the payload's `TypeId`, which drives equality, hashing and
/// ordering, with its `type_name` for diagnostics.
///
/// # Examples
///
/// ```rust
/// use ferrous_lifecycle::{key_of, Key};
///
/// struct TextureCache;
/// struct AudioEngine;
///
/// let texture = key_of::<TextureCache>();
/// assert_eq!(texture, key_of::<TextureCache>());
/// assert_ne!(texture, key_of::<AudioEngine>());
/// assert!(texture.display_name().ends_with("TextureCache"));
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Get the payload type name for display
    pub fn display_name(&self) -> &'static str {
        self.name
    }

    /// Get the payload `TypeId`
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Type name without its module path, for compact graph labels.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(pos) if base.len() == self.name.len() => &self.name[pos + 2..],
            _ => self.name,
        }
    }
}

// TypeId-only comparison; the name is diagnostic
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Build the key for payload type `T`.
#[inline(always)]
pub fn key_of<T: 'static + ?Sized>() -> Key {
    Key {
        id: TypeId::of::<T>(),
        name: std::any::type_name::<T>(),
    }
}
