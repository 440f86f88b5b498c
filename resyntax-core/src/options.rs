//! Dialect flags
//!
//! Only the parse-visible effect of each flag is modelled: free-spacing
//! changes what the lexer treats as trivia, explicit capture changes which
//! groups are numbered, ECMAScript changes how `\<digits>` and unknown escapes
//! are read. Right-to-left is tracked so lookaround scopes stack correctly.

use std::str::FromStr;

use bitflags::bitflags;

use crate::error::OptionsError;

bitflags! {
    /// Options that shape how a pattern is parsed
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RegexOptions: u16 {
        /// `i`
        const IGNORE_CASE = 1 << 0;
        /// `m`
        const MULTILINE = 1 << 1;
        /// `n`: plain `(...)` groups do not capture
        const EXPLICIT_CAPTURE = 1 << 2;
        /// `s`
        const SINGLELINE = 1 << 3;
        /// `x`: whitespace and `#` comments become trivia
        const FREE_SPACING = 1 << 4;
        const RIGHT_TO_LEFT = 1 << 5;
        /// Alternate backreference and escape rules
        const ECMA_SCRIPT = 1 << 6;
    }
}

impl RegexOptions {
    /// The flag an inline option letter stands for, if any
    pub fn from_letter(letter: char) -> Option<RegexOptions> {
        match letter.to_ascii_lowercase() {
            'i' => Some(RegexOptions::IGNORE_CASE),
            'm' => Some(RegexOptions::MULTILINE),
            'n' => Some(RegexOptions::EXPLICIT_CAPTURE),
            's' => Some(RegexOptions::SINGLELINE),
            'x' => Some(RegexOptions::FREE_SPACING),
            _ => None,
        }
    }

    /// Parse a set of option letters such as `"imx"`
    pub fn from_inline(letters: &str) -> Result<RegexOptions, OptionsError> {
        letters.chars().try_fold(RegexOptions::empty(), |acc, c| {
            RegexOptions::from_letter(c)
                .map(|flag| acc | flag)
                .ok_or(OptionsError::UnknownOption(c))
        })
    }

    /// Apply the text of an inline options token (`i-x`, `+s`, ...) to `self`.
    ///
    /// Letters after `-` switch a flag off until a `+` switches back to on.
    /// Characters that are not option letters are ignored.
    pub fn apply_inline(self, spec: &str) -> RegexOptions {
        let mut result = self;
        let mut on = true;
        for c in spec.chars() {
            match c {
                '-' => on = false,
                '+' => on = true,
                _ => {
                    if let Some(flag) = RegexOptions::from_letter(c) {
                        result.set(flag, on);
                    }
                }
            }
        }
        result
    }

    pub fn is_free_spacing(&self) -> bool {
        self.contains(RegexOptions::FREE_SPACING)
    }

    pub fn is_ecma_script(&self) -> bool {
        self.contains(RegexOptions::ECMA_SCRIPT)
    }

    pub fn is_explicit_capture(&self) -> bool {
        self.contains(RegexOptions::EXPLICIT_CAPTURE)
    }
}

impl Default for RegexOptions {
    fn default() -> Self {
        RegexOptions::empty()
    }
}

impl FromStr for RegexOptions {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegexOptions::from_inline(s)
    }
}

/// True for characters that may appear in an inline options token
pub(crate) fn is_option_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | 'i' | 'I' | 'm' | 'M' | 'n' | 'N' | 's' | 'S' | 'x' | 'X'
    )
}
