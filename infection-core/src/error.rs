//! Error types for the infection core library.
//!
//! The graph algorithms themselves are total; errors only arise when a
//! population is configured or loaded from inconsistent inputs.

use std::fmt;

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Error type produced when configuring or loading a [`crate::Population`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InfectionError {
    /// The graph referenced a user that has no version entry.
    #[error("graph references unknown user `{user}`")]
    UnknownUser {
        /// Identifier that could not be resolved.
        user: String,
    },
    /// Damping factor must lie within `[0, 1)`.
    #[error("damping factor must be within [0, 1) (got {got})")]
    InvalidDamping {
        /// The rejected damping factor.
        got: f64,
    },
    /// Convergence tolerance must be finite and positive.
    #[error("tolerance must be finite and positive (got {got})")]
    InvalidTolerance {
        /// The rejected tolerance.
        got: f64,
    },
    /// At least one rank sweep is required.
    #[error("max_sweeps must be at least 1 (got {got})")]
    InvalidMaxSweeps {
        /// The rejected sweep bound.
        got: usize,
    },
    /// Edge probability for generated populations must lie within `[0, 1]`.
    #[error("edge probability must be within [0, 1] (got {got})")]
    InvalidEdgeProbability {
        /// The rejected probability.
        got: f64,
    },
}

define_error_codes! {
    /// Stable codes describing [`InfectionError`] variants.
    enum InfectionErrorCode for InfectionError {
        /// The graph referenced a user that has no version entry.
        UnknownUser => UnknownUser { .. } => "INFECTION_UNKNOWN_USER",
        /// Damping factor must lie within `[0, 1)`.
        InvalidDamping => InvalidDamping { .. } => "INFECTION_INVALID_DAMPING",
        /// Convergence tolerance must be finite and positive.
        InvalidTolerance => InvalidTolerance { .. } => "INFECTION_INVALID_TOLERANCE",
        /// At least one rank sweep is required.
        InvalidMaxSweeps => InvalidMaxSweeps { .. } => "INFECTION_INVALID_MAX_SWEEPS",
        /// Edge probability for generated populations must lie within `[0, 1]`.
        InvalidEdgeProbability => InvalidEdgeProbability { .. } => "INFECTION_INVALID_EDGE_PROBABILITY",
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, InfectionError>;
