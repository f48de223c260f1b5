//! Named AES keys and the ordered store they are tried from.

use std::fmt;

use zeroize::Zeroize;

use crate::types::{CodecError, TrialOrder};

/// Raw AES key material. Wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyBytes {
    Aes128([u8; 16]),
    Aes256([u8; 32]),
}

impl KeyBytes {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            KeyBytes::Aes128(k) => k,
            KeyBytes::Aes256(k) => k,
        }
    }

    /// Key size in bits (128 or 256).
    pub fn bits(&self) -> usize {
        self.as_slice().len() * 8
    }

    pub fn is_aes256(&self) -> bool {
        matches!(self, KeyBytes::Aes256(_))
    }
}

impl fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyBytes::Aes{}(..)", self.bits())
    }
}

impl Drop for KeyBytes {
    fn drop(&mut self) {
        match self {
            KeyBytes::Aes128(k) => k.zeroize(),
            KeyBytes::Aes256(k) => k.zeroize(),
        }
    }
}

/// A key with the label used in output file names, e.g. `jp_ver169`.
#[derive(Clone, PartialEq, Eq)]
pub struct NamedKey {
    name: String,
    bytes: KeyBytes,
}

impl NamedKey {
    pub fn new(name: impl Into<String>, bytes: KeyBytes) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn aes128(name: impl Into<String>, key: [u8; 16]) -> Self {
        Self::new(name, KeyBytes::Aes128(key))
    }

    pub fn aes256(name: impl Into<String>, key: [u8; 32]) -> Self {
        Self::new(name, KeyBytes::Aes256(key))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &KeyBytes {
        &self.bytes
    }
}

impl fmt::Debug for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedKey")
            .field("name", &self.name)
            .field("bits", &self.bytes.bits())
            .finish_non_exhaustive()
    }
}

/// Ordered, read-only set of named keys. Loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    keys: Vec<NamedKey>,
    order: TrialOrder,
}

impl KeyStore {
    pub fn new(order: TrialOrder) -> Self {
        Self {
            keys: Vec::new(),
            order,
        }
    }

    /// Build a store from keys in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::KeyConfig` for an empty or duplicate
    /// (case-insensitive) name.
    pub fn from_keys(
        keys: impl IntoIterator<Item = NamedKey>,
        order: TrialOrder,
    ) -> Result<Self, CodecError> {
        let mut store = Self::new(order);
        for key in keys {
            store.push(key)?;
        }
        Ok(store)
    }

    /// Append a key at the end of the declaration order.
    pub fn push(&mut self, key: NamedKey) -> Result<(), CodecError> {
        if key.name().trim().is_empty() {
            return Err(CodecError::KeyConfig("key name must not be empty".into()));
        }
        if self.get(key.name()).is_some() {
            return Err(CodecError::KeyConfig(format!(
                "duplicate key name '{}'",
                key.name()
            )));
        }
        self.keys.push(key);
        Ok(())
    }

    pub fn order(&self) -> TrialOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Case-insensitive lookup by name.
    pub fn get(&self, name: &str) -> Option<&NamedKey> {
        self.keys.iter().find(|k| k.name.eq_ignore_ascii_case(name))
    }

    /// Keys in trial order.
    pub fn iter(&self) -> impl Iterator<Item = &NamedKey> + '_ {
        let n = self.keys.len();
        (0..n).map(move |i| match self.order {
            TrialOrder::Declared => &self.keys[i],
            TrialOrder::Reversed => &self.keys[n - 1 - i],
        })
    }
}
