//! Typed indices into the scene's flat arrays.
//!
//! Dots, hotspots and connectors all live in `Vec`s owned by a single
//! controller. Wrapping the raw position in a distinct type per array keeps an
//! index for one array from being used against another.

macro_rules! index_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Builds a handle from a `Vec` position. Scene arrays stay far
            /// below `u32::MAX` entries.
            pub fn from_usize(index: usize) -> Self {
                debug_assert!(index <= u32::MAX as usize);
                Self(index as u32)
            }

            pub const fn index(self) -> u32 {
                self.0
            }

            pub const fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

index_handle!(
    /// Position of a dot in `SceneState::dots`.
    DotId
);
index_handle!(
    /// Position of a hotspot in `SceneState::hotspots` (dataset order).
    HotspotId
);
index_handle!(
    /// Position of a connector in the connector set. The sequential connector,
    /// when present, is always `ConnectorId(0)`.
    ConnectorId
);

#[cfg(test)]
mod tests {
    use super::{DotId, HotspotId};

    #[test]
    fn round_trips_usize_positions() {
        let id = DotId::from_usize(42);
        assert_eq!(id.index(), 42);
        assert_eq!(id.as_usize(), 42);
    }

    #[test]
    fn orders_by_index() {
        assert!(HotspotId::new(1) < HotspotId::new(2));
        assert_eq!(format!("{}", HotspotId::new(3)), "HotspotId#3");
    }
}
