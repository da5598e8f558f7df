//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. The hosted backend
//! keys every row by UUID, so IDs wrap [`uuid::Uuid`].

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `Uuid` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `random()`, `as_uuid()`
/// - `From<Uuid>`, `Into<Uuid>`, `Display` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use wozify_core::define_id;
/// define_id!(OwnerId);
/// define_id!(ItemId);
///
/// let owner_id = OwnerId::random();
/// let item_id = ItemId::new(owner_id.as_uuid());
///
/// // These are different types, so this won't compile:
/// // let _: OwnerId = item_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Generate a new random (v4) ID.
            #[must_use]
            pub fn random() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                ::uuid::Uuid::parse_str(s).map(Self)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(StoreId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_uuid() {
        let uuid = uuid::Uuid::new_v4();
        assert_eq!(UserId::new(uuid).to_string(), uuid.to_string());
    }

    #[test]
    fn test_from_str() {
        let id: StoreId = "6f1c2b1e-8d1a-4c55-9e43-2a6f7f0b9c11".parse().unwrap();
        assert_eq!(id.to_string(), "6f1c2b1e-8d1a-4c55-9e43-2a6f7f0b9c11");
        assert!("not-a-uuid".parse::<StoreId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id: UserId = "6f1c2b1e-8d1a-4c55-9e43-2a6f7f0b9c11".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"6f1c2b1e-8d1a-4c55-9e43-2a6f7f0b9c11\"");
    }
}
