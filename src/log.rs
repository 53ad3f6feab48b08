//! Logging macros that forward to the `log` crate when the `log` feature is enabled.
//!
//! Without the feature, the macros expand to nothing and the arguments are not evaluated.

#[allow(unused)]
macro_rules! trace {
	($($args:tt)*) => {
		#[cfg(feature = "log")]
		{
			::log::trace!($($args)*);
		}
	};
}

#[allow(unused)]
macro_rules! debug {
	($($args:tt)*) => {
		#[cfg(feature = "log")]
		{
			::log::debug!($($args)*);
		}
	};
}

#[allow(unused)]
macro_rules! warn {
	($($args:tt)*) => {
		#[cfg(feature = "log")]
		{
			::log::warn!($($args)*);
		}
	};
}
