//! Kernel error types with stable numeric codes.
//!
//! Every subsystem declares its errors through [`define_kernel_error!`]. The
//! generated enum carries a one-byte subsystem id and a one-byte variant code,
//! which together form the 16-bit code printed in logs (`E0103: ...`).
//!
//! ## Usage
//!
//! ### Simple errors
//! ```ignore
//! define_kernel_error! {
//!     pub enum AllocError(0x01) {
//!         RequestTooLarge = 0x03 => "Request exceeds the allocator window",
//!         OutOfMemory = 0x05 => "No free block large enough",
//!     }
//! }
//! ```
//!
//! ### Wrapping another subsystem's error
//! ```ignore
//! define_kernel_error! {
//!     pub enum IpcError(0x02) {
//!         Alloc(AllocError) = 0x01 => "Payload allocation failed",
//!     }
//! }
//! ```

#![no_std]

/// Define a kernel error enum with a subsystem id, per-variant codes, and a
/// human-readable description.
///
/// Variants may wrap one inner error type; its `Display` output is appended
/// in parentheses.
#[macro_export]
macro_rules! define_kernel_error {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident($subsystem:literal) {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $(($inner:ty))? = $code:literal => $desc:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $(($inner))?,
            )*
        }

        impl $name {
            /// Subsystem identifier for this error type.
            pub const SUBSYSTEM: u8 = $subsystem;

            /// Numeric error code: subsystem in the high byte, variant in the low byte.
            pub const fn code(&self) -> u16 {
                match self {
                    $(
                        $crate::define_kernel_error!(@pattern $variant $(($inner))? _unused) => {
                            (($subsystem as u16) << 8) | $code
                        }
                    )*
                }
            }

            /// Static description, suitable for log lines.
            pub const fn name(&self) -> &'static str {
                match self {
                    $(
                        $crate::define_kernel_error!(@pattern $variant $(($inner))? _unused) => {
                            $desc
                        }
                    )*
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self {
                    $(
                        $crate::define_kernel_error!(@pattern $variant $(($inner))? inner) => {
                            $crate::define_kernel_error!(@display_body self f $desc $(($inner))? inner)
                        }
                    )*
                }
            }
        }

        impl core::error::Error for $name {}
    };

    (@pattern $variant:ident ($inner:ty) $bind:ident) => { Self::$variant($bind) };
    (@pattern $variant:ident $bind:ident) => { Self::$variant };

    (@display_body $self:ident $f:ident $desc:literal ($inner:ty) $bind:ident) => {
        write!($f, "E{:04X}: {} ({})", $self.code(), $desc, $bind)
    };
    (@display_body $self:ident $f:ident $desc:literal $bind:ident) => {
        write!($f, "E{:04X}: {}", $self.code(), $desc)
    };
}
