use serde::{Deserialize, Serialize};

/// Policy flags attached to every node of a compiled schema.
///
/// Deserializes from the camelCase keys `strict`, `strictNumbers`,
/// `traceErrors`, `fullTrace` and `allowInvalid`; missing keys take their
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Data violations abort the triggering operation instead of being recorded.
    pub strict: bool,
    /// Enables the `integer` and `float` kinds.
    pub strict_numbers: bool,
    /// Attach the caller location to recorded errors.
    pub trace_errors: bool,
    /// Attach a captured backtrace to recorded errors.
    pub full_trace: bool,
    /// Commit invalid and unexpected writes after recording them.
    pub allow_invalid: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            strict: false,
            strict_numbers: false,
            trace_errors: false,
            full_trace: false,
            allow_invalid: true,
        }
    }
}

impl Options {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn strict_numbers(mut self, strict_numbers: bool) -> Self {
        self.strict_numbers = strict_numbers;
        self
    }

    pub fn trace_errors(mut self, trace_errors: bool) -> Self {
        self.trace_errors = trace_errors;
        self
    }

    pub fn full_trace(mut self, full_trace: bool) -> Self {
        self.full_trace = full_trace;
        self
    }

    pub fn allow_invalid(mut self, allow_invalid: bool) -> Self {
        self.allow_invalid = allow_invalid;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_keys_use_defaults() {
        let options: Options = serde_json::from_value(json!({"strict": true})).unwrap();
        assert!(options.strict);
        assert!(options.allow_invalid);
        assert!(!options.strict_numbers);
    }

    #[test]
    fn test_camel_case_keys() {
        let options: Options =
            serde_json::from_value(json!({"strictNumbers": true, "allowInvalid": false})).unwrap();
        assert_eq!(
            options,
            Options::default().strict_numbers(true).allow_invalid(false)
        );
    }
}
