// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// `Display` for fieldless enums, one string per variant.
///
/// ```ignore
/// dl_core::simple_display! {
///     Platform {
///         Cluster => "cluster",
///         Podman => "podman",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident => $label:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let label = match self {
                    $( Self::$variant => $label, )+
                };
                f.write_str(label)
            }
        }
    };
}
