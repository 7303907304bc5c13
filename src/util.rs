/// Returns early with [`Error::InvalidConfig`](crate::Error::InvalidConfig) unless a numerical
/// value lies in the half-open interval `(a,b]`
///
/// ### Example
/// ```ignore
/// let alpha = 0.0;
/// ensure_interval!(alpha, 0.0, 1.0);
/// ```
/// This returns the error "Invalid value for \`alpha\`: 0. Must be in the interval (0, 1]."
#[macro_export]
macro_rules! ensure_interval {
    ($var:expr, $a:expr, $b:expr) => {
        if !($var > $a && $var <= $b) {
            return Err($crate::Error::InvalidConfig(format!(
                "Invalid value for `{}`: {}. Must be in the interval ({}, {}].",
                stringify!($var),
                $var,
                $a,
                $b,
            )));
        }
    };
}

/// Returns early with [`Error::InvalidConfig`](crate::Error::InvalidConfig) unless a count is nonzero
#[macro_export]
macro_rules! ensure_positive {
    ($var:expr) => {
        if $var == 0 {
            return Err($crate::Error::InvalidConfig(format!(
                "`{}` must be greater than zero.",
                stringify!($var),
            )));
        }
    };
}
