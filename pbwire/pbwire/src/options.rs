/// Limits and checks applied while decoding.
///
/// ```
/// # use pbwire::DecodeOptions;
/// let options = DecodeOptions::default()
///     .with_recursion_limit(16)
///     .with_check_required(false);
/// assert_eq!(options.recursion_limit, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum nesting depth of sub-messages and groups, known or unknown.
    pub recursion_limit: u32,
    /// Fail with [`DecodeError::MissingRequired`](crate::DecodeError::MissingRequired)
    /// when the decoded message lacks a required field.
    pub check_required: bool,
}

impl DecodeOptions {
    pub const DEFAULT_RECURSION_LIMIT: u32 = 100;

    pub fn with_recursion_limit(mut self, recursion_limit: u32) -> Self {
        self.recursion_limit = recursion_limit;
        self
    }

    pub fn with_check_required(mut self, check_required: bool) -> Self {
        self.check_required = check_required;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            recursion_limit: Self::DEFAULT_RECURSION_LIMIT,
            check_required: true,
        }
    }
}
