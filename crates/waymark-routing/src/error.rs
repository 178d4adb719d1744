//! Error types for route pattern compilation and batched updates.

use thiserror::Error;

/// Error type for path pattern compilation and interpolation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
	/// A `:` placeholder with no name, e.g. `/users/:`.
	#[error("empty parameter name in pattern {pattern:?}")]
	EmptyParamName {
		/// The offending pattern string.
		pattern: String,
	},
	/// The same placeholder name appears twice in one pattern.
	#[error("duplicate parameter {name:?} in pattern {pattern:?}")]
	DuplicateParam {
		/// The offending pattern string.
		pattern: String,
		/// The repeated placeholder name.
		name: String,
	},
	/// Interpolation was asked to fill a required placeholder with no value.
	#[error("missing required parameter {name:?} for pattern {pattern:?}")]
	MissingParam {
		/// The pattern being interpolated.
		pattern: String,
		/// The placeholder with no value.
		name: String,
	},
	/// The generated matcher failed to compile.
	#[error("pattern {pattern:?} failed to compile")]
	Compile {
		/// The offending pattern string.
		pattern: String,
		/// Underlying regex error.
		#[source]
		source: regex::Error,
	},
}

/// Error type for a batched route update flush.
///
/// These are programming errors at the call sites that fed the batch; they
/// are surfaced loudly to every caller of the batch and never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteUpdateError {
	/// The candidate pattern lists of the batched updates share no pattern.
	///
	/// Two parameters bound to disjoint route patterns were updated in the
	/// same batch; there is no single URL both can live on.
	#[error("could not resolve a common route pattern for the batched update")]
	NoCommonRoute,
	/// The chosen pattern could not be compiled or interpolated.
	#[error("route interpolation failed")]
	Interpolation {
		/// Underlying pattern error.
		#[source]
		source: PatternError,
	},
}

impl From<PatternError> for RouteUpdateError {
	fn from(source: PatternError) -> Self {
		Self::Interpolation { source }
	}
}
