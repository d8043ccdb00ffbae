// SPDX-License-Identifier: Apache-2.0
//! Natural data formats, declared types and byte sizes.
//!
//! A [`DataType`] is a format letter plus a length. For the numeric formats
//! `N` and `P` the length is the total number of digits and `decimals` the
//! number of those digits after the decimal point, so `N12,7` has five
//! digits before and seven after the point.
//!
//! The byte-size rules in [`DataType::byte_size`] drive the truncation
//! analyzer and the `REDEFINE` size check.
//!
//! This module also carries the built-in tables for system variables and
//! system functions.

use std::fmt;

/// Size used for dynamic `A`/`B`/`U` variables.
pub const DYNAMIC_BYTE_SIZE: u32 = 1_073_741_824;

/// Maximum total digits of a numeric or packed field.
pub const MAX_NUMERIC_DIGITS: u32 = 29;

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

/// The format letter of a Natural data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataFormat {
    /// Alphanumeric.
    Alphanumeric,
    /// Binary.
    Binary,
    /// Attribute control.
    Control,
    /// Date.
    Date,
    /// Floating point.
    Float,
    /// Integer.
    Integer,
    /// Logical.
    Logical,
    /// Unpacked numeric.
    Numeric,
    /// Packed numeric.
    Packed,
    /// Time.
    Time,
    /// Unicode.
    Unicode,
}

impl DataFormat {
    /// Parse a format letter.
    pub fn from_char(c: char) -> Option<DataFormat> {
        match c.to_ascii_uppercase() {
            'A' => Some(DataFormat::Alphanumeric),
            'B' => Some(DataFormat::Binary),
            'C' => Some(DataFormat::Control),
            'D' => Some(DataFormat::Date),
            'F' => Some(DataFormat::Float),
            'I' => Some(DataFormat::Integer),
            'L' => Some(DataFormat::Logical),
            'N' => Some(DataFormat::Numeric),
            'P' => Some(DataFormat::Packed),
            'T' => Some(DataFormat::Time),
            'U' => Some(DataFormat::Unicode),
            _ => None,
        }
    }

    /// The format letter.
    pub fn letter(self) -> char {
        match self {
            DataFormat::Alphanumeric => 'A',
            DataFormat::Binary => 'B',
            DataFormat::Control => 'C',
            DataFormat::Date => 'D',
            DataFormat::Float => 'F',
            DataFormat::Integer => 'I',
            DataFormat::Logical => 'L',
            DataFormat::Numeric => 'N',
            DataFormat::Packed => 'P',
            DataFormat::Time => 'T',
            DataFormat::Unicode => 'U',
        }
    }

    /// N, P, I and F.
    pub fn is_numeric_family(self) -> bool {
        matches!(
            self,
            DataFormat::Numeric | DataFormat::Packed | DataFormat::Integer | DataFormat::Float
        )
    }

    /// A and U.
    pub fn is_alphanumeric_family(self) -> bool {
        matches!(self, DataFormat::Alphanumeric | DataFormat::Unicode)
    }

    /// Formats that may be declared `DYNAMIC`.
    pub fn can_be_dynamic(self) -> bool {
        matches!(
            self,
            DataFormat::Alphanumeric | DataFormat::Binary | DataFormat::Unicode
        )
    }

    /// Formats whose length is implied and must not be written.
    pub fn has_fixed_length(self) -> bool {
        matches!(
            self,
            DataFormat::Logical | DataFormat::Date | DataFormat::Time | DataFormat::Control
        )
    }

    /// Whether a value of format `self` can be stored into `target` without
    /// an explicit conversion.
    pub fn is_compatible_with(self, target: DataFormat) -> bool {
        if self == target {
            return true;
        }
        match target {
            DataFormat::Alphanumeric | DataFormat::Unicode => {
                self.is_alphanumeric_family() || self.is_numeric_family() || self == DataFormat::Binary
            }
            DataFormat::Numeric | DataFormat::Packed | DataFormat::Integer | DataFormat::Float => {
                self.is_numeric_family() || self == DataFormat::Binary
            }
            DataFormat::Binary => {
                self.is_numeric_family() || self.is_alphanumeric_family()
            }
            DataFormat::Date | DataFormat::Time => {
                matches!(self, DataFormat::Date | DataFormat::Time) || self.is_numeric_family()
            }
            DataFormat::Logical | DataFormat::Control => false,
        }
    }

    /// Whether the two formats share a storage representation for the
    /// truncation check.
    pub fn same_family(self, other: DataFormat) -> bool {
        self == other
            || (self.is_alphanumeric_family() && other.is_alphanumeric_family())
            || (matches!(self, DataFormat::Numeric | DataFormat::Packed)
                && matches!(other, DataFormat::Numeric | DataFormat::Packed))
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A declared or inferred data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DataType {
    /// Format letter.
    pub format: DataFormat,
    /// Declared length: bytes for A/B/U/I/F, total digits for N/P, 0 when
    /// the format has an implied length or the variable is dynamic.
    pub length: u32,
    /// Digits after the decimal point (N/P only).
    pub decimals: u32,
    /// `DYNAMIC` variable.
    pub dynamic: bool,
}

impl DataType {
    /// Create a type with a length and no decimals.
    pub fn new(format: DataFormat, length: u32) -> Self {
        Self {
            format,
            length,
            decimals: 0,
            dynamic: false,
        }
    }

    /// Create a numeric or packed type with decimals.
    pub fn with_decimals(format: DataFormat, length: u32, decimals: u32) -> Self {
        Self {
            format,
            length,
            decimals,
            dynamic: false,
        }
    }

    /// Create a dynamic type.
    pub fn dynamic(format: DataFormat) -> Self {
        Self {
            format,
            length: 0,
            decimals: 0,
            dynamic: true,
        }
    }

    /// Alphanumeric of `length` bytes.
    pub fn alphanumeric(length: u32) -> Self {
        Self::new(DataFormat::Alphanumeric, length)
    }

    /// Logical.
    pub fn logical() -> Self {
        Self::new(DataFormat::Logical, 0)
    }

    /// Parse a type specification such as `A10`, `N12,7`, `P7.2` or `L`.
    ///
    /// Returns `None` when the text does not start with a format letter or
    /// the length is not numeric.
    pub fn parse_spec(text: &str) -> Option<DataType> {
        let mut chars = text.chars();
        let format = DataFormat::from_char(chars.next()?)?;
        let rest = chars.as_str();
        if rest.is_empty() {
            return Some(DataType::new(format, 0));
        }
        let (whole, fraction) = match rest.find(['.', ',']) {
            Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
            None => (rest, None),
        };
        let length: u32 = whole.parse().ok()?;
        let decimals: u32 = match fraction {
            Some(f) => f.parse().ok()?,
            None => 0,
        };
        Some(DataType::with_decimals(format, length, decimals))
    }

    /// Digits before the decimal point (N/P).
    pub fn digits_before(&self) -> u32 {
        self.length.saturating_sub(self.decimals)
    }

    /// Digits after the decimal point (N/P).
    pub fn digits_after(&self) -> u32 {
        self.decimals
    }

    /// Storage size in bytes.
    pub fn byte_size(&self) -> u32 {
        match self.format {
            DataFormat::Alphanumeric | DataFormat::Binary | DataFormat::Unicode => {
                if self.dynamic {
                    DYNAMIC_BYTE_SIZE
                } else {
                    self.length
                }
            }
            DataFormat::Numeric => self.numeric_size(),
            DataFormat::Packed => packed_size(self.numeric_size()),
            DataFormat::Date => 4,
            DataFormat::Time => 7,
            DataFormat::Logical => 1,
            DataFormat::Control => 2,
            DataFormat::Float | DataFormat::Integer => self.length,
        }
    }

    fn numeric_size(&self) -> u32 {
        self.digits_before() + self.digits_after()
    }

    /// Validate the declared length for the format.
    ///
    /// Returns a message describing the problem.
    pub fn validate_length(&self) -> Result<(), String> {
        let fmt = self.format;
        if self.dynamic {
            return if fmt.can_be_dynamic() {
                Ok(())
            } else {
                Err(format!("DYNAMIC is not allowed for format {fmt}"))
            };
        }
        if self.decimals > 0 && !matches!(fmt, DataFormat::Numeric | DataFormat::Packed) {
            return Err(format!("Format {fmt} cannot have decimal digits"));
        }
        let ok = match fmt {
            DataFormat::Integer => matches!(self.length, 1 | 2 | 4 | 8),
            DataFormat::Float => matches!(self.length, 4 | 8),
            DataFormat::Logical | DataFormat::Date | DataFormat::Time | DataFormat::Control => {
                self.length == 0
            }
            DataFormat::Numeric | DataFormat::Packed => {
                (1..=MAX_NUMERIC_DIGITS).contains(&self.length) && self.decimals <= self.length
            }
            DataFormat::Alphanumeric | DataFormat::Binary | DataFormat::Unicode => {
                (1..=DYNAMIC_BYTE_SIZE).contains(&self.length)
            }
        };
        if ok {
            Ok(())
        } else {
            Err(format!("Invalid length for format {fmt}: {self}"))
        }
    }
}

/// Packed size for `numeric_size` digits: half, rounded up to an even
/// number of bytes.
pub fn packed_size(numeric_size: u32) -> u32 {
    let half = numeric_size.div_ceil(2);
    if half % 2 == 0 {
        half
    } else {
        half + 1
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dynamic {
            return write!(f, "({}) DYNAMIC", self.format);
        }
        if self.length == 0 {
            return write!(f, "({})", self.format);
        }
        if self.decimals > 0 {
            write!(f, "({}{},{})", self.format, self.length, self.decimals)
        } else {
            write!(f, "({}{})", self.format, self.length)
        }
    }
}

// ---------------------------------------------------------------------------
// System variables and functions
// ---------------------------------------------------------------------------

/// Built-in facts about a system variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemVariableInfo {
    /// Name including the leading `*`.
    pub name: &'static str,
    /// Type of the variable.
    pub data_type: DataType,
    /// Whether a program may assign to it.
    pub modifiable: bool,
}

const fn sysvar(name: &'static str, format: DataFormat, length: u32, modifiable: bool) -> SystemVariableInfo {
    SystemVariableInfo {
        name,
        data_type: DataType {
            format,
            length,
            decimals: 0,
            dynamic: false,
        },
        modifiable,
    }
}

use DataFormat::{Alphanumeric as A, Date as D, Integer as I, Logical as L, Numeric as N, Packed as P, Time as T};

static SYSTEM_VARIABLES: &[SystemVariableInfo] = &[
    // Date / time
    sysvar("*DATX", D, 0, false),
    sysvar("*DATN", N, 8, false),
    sysvar("*DATD", A, 8, false),
    sysvar("*DATE", A, 8, false),
    sysvar("*DATG", A, 15, false),
    sysvar("*DATI", A, 8, false),
    sysvar("*DATJ", A, 5, false),
    sysvar("*DATU", A, 8, false),
    sysvar("*DATV", A, 11, false),
    sysvar("*DAT4D", A, 10, false),
    sysvar("*DAT4E", A, 10, false),
    sysvar("*DAT4I", A, 10, false),
    sysvar("*DAT4J", A, 7, false),
    sysvar("*DAT4U", A, 10, false),
    sysvar("*TIMX", T, 0, false),
    sysvar("*TIMN", N, 7, false),
    sysvar("*TIME", A, 10, false),
    sysvar("*TIMD", N, 7, false),
    sysvar("*TIMESTMP", DataFormat::Binary, 8, false),
    // Session
    sysvar("*USER", A, 8, false),
    sysvar("*INIT-USER", A, 8, false),
    sysvar("*INIT-ID", A, 8, false),
    sysvar("*PROGRAM", A, 8, false),
    sysvar("*LIBRARY-ID", A, 8, false),
    sysvar("*STEPLIB", A, 8, false),
    sysvar("*LEVEL", N, 2, false),
    sysvar("*LANGUAGE", I, 1, true),
    sysvar("*MACHINE-CLASS", A, 16, false),
    sysvar("*OPSYS", A, 8, false),
    sysvar("*TPSYS", A, 8, false),
    sysvar("*DEVICE", A, 8, false),
    sysvar("*APPLIC-ID", A, 8, false),
    sysvar("*APPLIC-NAME", A, 32, false),
    sysvar("*NET-USER", A, 253, false),
    sysvar("*ETID", A, 8, false),
    sysvar("*STARTUP", A, 8, true),
    sysvar("*HARDCOPY", A, 8, true),
    // Error handling
    sysvar("*ERROR-NR", N, 7, true),
    sysvar("*ERROR-LINE", N, 4, false),
    sysvar("*ERROR-TA", A, 8, true),
    // Terminal and report
    sysvar("*PF-KEY", A, 4, false),
    sysvar("*PAGE-NUMBER", P, 5, true),
    sysvar("*LINE-COUNT", P, 5, false),
    sysvar("*LINESIZE", N, 7, false),
    sysvar("*PAGESIZE", N, 7, false),
    sysvar("*CURS-LINE", P, 3, true),
    sysvar("*CURS-COL", P, 3, true),
    sysvar("*CURS-FIELD", I, 4, false),
    sysvar("*CURSOR", N, 6, false),
    sysvar("*SCREEN-IO", L, 0, false),
    sysvar("*WINDOW-POS", P, 6, false),
    sysvar("*DATA", N, 3, false),
    sysvar("*CPU-TIME", I, 4, false),
    sysvar("*COUNTER", P, 10, false),
    sysvar("*NUMBER", P, 10, false),
    sysvar("*ISN", P, 10, true),
];

/// System functions; `*COUNTER`, `*NUMBER` and `*ISN` take an optional
/// label in parentheses and are listed as variables above as well.
static SYSTEM_FUNCTIONS: &[(&str, Option<DataType>)] = &[
    ("*OCC", Some(DataType::new_const(I, 4))),
    ("*OCCURRENCE", Some(DataType::new_const(I, 4))),
    ("*LENGTH", Some(DataType::new_const(I, 4))),
    ("*UBOUND", Some(DataType::new_const(I, 4))),
    ("*LBOUND", Some(DataType::new_const(I, 4))),
    ("*TRIM", Some(DataType::dynamic_const(A))),
    ("*TRANSLATE", Some(DataType::dynamic_const(A))),
    ("*MINVAL", None),
    ("*MAXVAL", None),
    ("*COUNTER", Some(DataType::new_const(P, 10))),
    ("*NUMBER", Some(DataType::new_const(P, 10))),
    ("*ISN", Some(DataType::new_const(P, 10))),
];

impl DataType {
    const fn new_const(format: DataFormat, length: u32) -> DataType {
        DataType {
            format,
            length,
            decimals: 0,
            dynamic: false,
        }
    }

    const fn dynamic_const(format: DataFormat) -> DataType {
        DataType {
            format,
            length: 0,
            decimals: 0,
            dynamic: true,
        }
    }
}

/// Look up a system variable by name (with leading `*`, any case).
pub fn system_variable(name: &str) -> Option<&'static SystemVariableInfo> {
    SYSTEM_VARIABLES
        .iter()
        .find(|v| v.name.eq_ignore_ascii_case(name))
}

/// Whether `name` is a system function.
pub fn is_system_function(name: &str) -> bool {
    SYSTEM_FUNCTIONS
        .iter()
        .any(|(n, _)| n.eq_ignore_ascii_case(name))
}

/// Result type of a system function, when it does not depend on the
/// arguments.
pub fn system_function_type(name: &str) -> Option<DataType> {
    SYSTEM_FUNCTIONS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .and_then(|(_, t)| *t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spec() {
        assert_eq!(DataType::parse_spec("A10"), Some(DataType::alphanumeric(10)));
        assert_eq!(
            DataType::parse_spec("N12,7"),
            Some(DataType::with_decimals(DataFormat::Numeric, 12, 7))
        );
        assert_eq!(
            DataType::parse_spec("p7.2"),
            Some(DataType::with_decimals(DataFormat::Packed, 7, 2))
        );
        assert_eq!(DataType::parse_spec("L"), Some(DataType::logical()));
        assert_eq!(DataType::parse_spec("X5"), None);
        assert_eq!(DataType::parse_spec("AB"), None);
    }

    #[test]
    fn test_byte_size_table() {
        let cases = [
            (DataType::with_decimals(DataFormat::Numeric, 12, 7), 12),
            (DataType::with_decimals(DataFormat::Packed, 8, 5), 4),
            (DataType::new(DataFormat::Packed, 7), 4),
            (DataType::new(DataFormat::Packed, 3), 2),
            (DataType::new(DataFormat::Packed, 1), 2),
            (DataType::new(DataFormat::Numeric, 5), 5),
            (DataType::alphanumeric(10), 10),
            (DataType::dynamic(DataFormat::Alphanumeric), DYNAMIC_BYTE_SIZE),
            (DataType::dynamic(DataFormat::Binary), DYNAMIC_BYTE_SIZE),
            (DataType::new(DataFormat::Unicode, 20), 20),
            (DataType::new(DataFormat::Integer, 2), 2),
            (DataType::new(DataFormat::Float, 8), 8),
            (DataType::new(DataFormat::Date, 0), 4),
            (DataType::new(DataFormat::Time, 0), 7),
            (DataType::logical(), 1),
            (DataType::new(DataFormat::Control, 0), 2),
        ];
        for (ty, size) in cases {
            assert_eq!(ty.byte_size(), size, "byte size of {ty}");
        }
    }

    #[test]
    fn test_digits_split() {
        let n = DataType::with_decimals(DataFormat::Numeric, 12, 7);
        assert_eq!(n.digits_before(), 5);
        assert_eq!(n.digits_after(), 7);
    }

    #[test]
    fn test_validate_length() {
        assert!(DataType::new(DataFormat::Integer, 4).validate_length().is_ok());
        assert!(DataType::new(DataFormat::Integer, 3).validate_length().is_err());
        assert!(DataType::new(DataFormat::Float, 4).validate_length().is_ok());
        assert!(DataType::new(DataFormat::Logical, 1).validate_length().is_err());
        assert!(DataType::new(DataFormat::Numeric, 30).validate_length().is_err());
        assert!(DataType::alphanumeric(0).validate_length().is_err());
        assert!(DataType::dynamic(DataFormat::Numeric).validate_length().is_err());
        assert!(DataType::dynamic(DataFormat::Unicode).validate_length().is_ok());
    }

    #[test]
    fn test_format_compatibility() {
        use DataFormat::*;
        assert!(Numeric.is_compatible_with(Packed));
        assert!(Integer.is_compatible_with(Alphanumeric));
        assert!(!Alphanumeric.is_compatible_with(Numeric));
        assert!(!Numeric.is_compatible_with(Logical));
        assert!(Logical.is_compatible_with(Logical));
        assert!(Numeric.same_family(Packed));
        assert!(!Numeric.same_family(Integer));
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::alphanumeric(10).to_string(), "(A10)");
        assert_eq!(
            DataType::with_decimals(DataFormat::Numeric, 7, 2).to_string(),
            "(N7,2)"
        );
        assert_eq!(DataType::dynamic(DataFormat::Alphanumeric).to_string(), "(A) DYNAMIC");
    }

    #[test]
    fn test_system_tables() {
        let datx = system_variable("*datx").map(|v| v.data_type.format);
        assert_eq!(datx, Some(DataFormat::Date));
        assert!(!system_variable("*USER").map(|v| v.modifiable).unwrap_or(true));
        assert!(system_variable("*ERROR-NR").map(|v| v.modifiable).unwrap_or(false));
        assert!(is_system_function("*OCC"));
        assert!(!is_system_function("*DATX"));
        assert_eq!(
            system_function_type("*TRIM"),
            Some(DataType::dynamic(DataFormat::Alphanumeric))
        );
        assert_eq!(system_function_type("*MAXVAL"), None);
    }
}
