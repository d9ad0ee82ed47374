use thiserror::Error;

/// A `Result` alias for router setup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring a [`Router`](crate::Router).
///
/// These are setup-time failures. Dispatching a request never produces one.
#[derive(Debug, Error)]
pub enum Error {
    /// The template does not start with `/`.
    #[error("expect path beginning with '/', found: '{0}'")]
    MissingLeadingSlash(String),

    /// A `:` or `*` marker was not followed by a parameter name.
    #[error("empty parameter name in '{template}'")]
    EmptyParamName { template: String },

    /// The same parameter name appears twice in one template.
    #[error("duplicate parameter `{name}` in '{template}'")]
    DuplicateParam { name: String, template: String },

    /// A parameter segment carries characters that are not part of its syntax.
    #[error("invalid parameter segment '{segment}' in '{template}'")]
    InvalidSegment { segment: String, template: String },

    /// A `*name` catch-all is followed by further segments.
    #[error("catch-all parameter `{name}` must be the final segment of '{template}'")]
    CatchAllNotLast { name: String, template: String },

    /// The generated matcher failed to compile, usually because of a bad `:name(regex)`.
    #[error("invalid pattern for '{template}': {source}")]
    Regex {
        template: String,
        #[source]
        source: regex::Error,
    },

    /// The method name is not one of the supported HTTP methods.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}
