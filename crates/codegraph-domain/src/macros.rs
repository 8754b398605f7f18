//! Domain macros.
//!
//! Used by `entities/` and `value_objects/` to cut down on boilerplate for
//! newtype identifiers, and by `registry/` for provider auto-registration.

/// Implement registry infrastructure for a provider type: a `linkme`
/// distributed slice of entries, plus `resolve`/`list` functions.
#[macro_export]
macro_rules! impl_registry {
    (
        provider_trait: $trait:path,
        config_type: $config:ty,
        entry_type: $entry:ident,
        slice_name: $slice:ident,
        resolve_fn: $resolve:ident,
        list_fn: $list:ident
    ) => {
        /// Registry entry for providers of this kind.
        pub struct $entry {
            /// Unique provider name.
            pub name: &'static str,
            /// Human-readable description.
            pub description: &'static str,
            /// Constructor function to create a provider instance.
            pub build: fn(&$config) -> std::result::Result<std::sync::Arc<dyn $trait>, String>,
        }

        #[linkme::distributed_slice]
        pub static $slice: [$entry] = [..];

        /// Resolve a provider by name from the registry.
        ///
        /// # Errors
        ///
        /// Returns an error if the requested provider name is not registered
        /// or if its constructor fails.
        pub fn $resolve(config: &$config) -> $crate::error::Result<std::sync::Arc<dyn $trait>> {
            let provider_name = &config.provider;

            for entry in $slice {
                if entry.name == provider_name {
                    return (entry.build)(config).map_err(|message| $crate::error::Error::Config { message });
                }
            }

            let available: Vec<&str> = $slice.iter().map(|e| e.name).collect();
            Err($crate::error::Error::Config {
                message: format!("unknown provider '{provider_name}'. available providers: {available:?}"),
            })
        }

        /// List every registered provider's name and description.
        pub fn $list() -> Vec<(&'static str, &'static str)> {
            $slice.iter().map(|e| (e.name, e.description)).collect()
        }
    };
}

/// Define a strong-typed UUID identifier for a domain entity.
///
/// Generates a newtype struct wrapping `uuid::Uuid` with `Display`, `From`,
/// `Into`, and `Serialize`/`Deserialize` derived, plus a deterministic v5
/// derivation via `from_name` so the same logical key always maps to the
/// same id across pipeline runs.
#[macro_export]
macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            derive_more::Display,
            derive_more::From,
            derive_more::Into,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[display("{_0}")]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Generate a new random UUID v4 identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Derive a deterministic v5 UUID from a human-readable name,
            /// namespaced per type so two id types never collide.
            #[must_use]
            pub fn from_name(name: &str) -> Self {
                let ns =
                    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, stringify!($name).as_bytes());
                Self(uuid::Uuid::new_v5(&ns, name.as_bytes()))
            }

            /// Access the inner [`uuid::Uuid`].
            #[must_use]
            pub fn inner(&self) -> uuid::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }
        }
    };
}
