//! Opaque identifier newtypes used throughout the index.
//!
//! Terms, documents, and class labels are all referred to by dense integer
//! ids once they enter the index. The newtypes prevent accidentally mixing
//! id spaces (a `TermId` is not a `DocId`, even though both wrap a `u64`).
//! Ids are assigned densely from 0 and never change once an index is built.

use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $repr:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($repr);

        impl $name {
            /// Wraps a raw id value.
            pub const fn new(raw: $repr) -> Self {
                Self(raw)
            }

            /// Returns the raw id value.
            pub const fn get(self) -> $repr {
                self.0
            }
        }

        impl From<$repr> for $name {
            fn from(raw: $repr) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for $repr {
            fn from(id: $name) -> $repr {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type! {
    /// Dense id for a vocabulary term.
    TermId, u64
}

id_type! {
    /// Dense id for a document within one corpus.
    DocId, u64
}

id_type! {
    /// Dense id for an interned class label.
    LabelId, u32
}
