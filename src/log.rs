//! Logging shims.
//!
//! With the `defmt-03` feature the driver logs through `defmt`, otherwise the
//! macros expand to nothing.

#[cfg(feature = "defmt-03")]
macro_rules! trace {
    ($($arg:tt)*) => {
        ::defmt::trace!($($arg)*)
    };
}

#[cfg(feature = "defmt-03")]
macro_rules! debug {
    ($($arg:tt)*) => {
        ::defmt::debug!($($arg)*)
    };
}

#[cfg(feature = "defmt-03")]
macro_rules! warn {
    ($($arg:tt)*) => {
        ::defmt::warn!($($arg)*)
    };
}

// Without defmt the arguments are still evaluated as a tuple so they count as used.
#[cfg(not(feature = "defmt-03"))]
macro_rules! trace {
    ($($arg:tt)*) => {{
        let _ = ($($arg)*,);
    }};
}

#[cfg(not(feature = "defmt-03"))]
macro_rules! debug {
    ($($arg:tt)*) => {{
        let _ = ($($arg)*,);
    }};
}

#[cfg(not(feature = "defmt-03"))]
macro_rules! warn {
    ($($arg:tt)*) => {{
        let _ = ($($arg)*,);
    }};
}
