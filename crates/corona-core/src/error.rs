//! Error types for the Corona PIC core.
//!
//! Organized by the taxonomy of the stepping core: expression parsing,
//! injector construction, species configuration (detected before the
//! timestep loop starts), and header persistence. Invariant violations are not represented here;
//! they abort via `panic!` at the point of detection.

/// Errors from compiling a user-supplied arithmetic expression.
///
/// Offsets are byte positions into the expression text.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// The expression text is empty or only whitespace.
    #[error("expression is empty")]
    Empty,
    /// A character that cannot start any token.
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar {
        /// Byte offset of the character.
        offset: usize,
        /// The offending character.
        ch: char,
    },
    /// A token that is not valid at this position.
    #[error("unexpected token '{found}' at offset {offset}")]
    UnexpectedToken {
        /// Byte offset of the token.
        offset: usize,
        /// Text of the token.
        found: String,
    },
    /// The expression ended where an operand or `)` was expected.
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    /// A numeric literal that does not parse as a real number.
    #[error("invalid number '{text}' at offset {offset}")]
    InvalidNumber {
        /// Byte offset of the literal.
        offset: usize,
        /// The literal text.
        text: String,
    },
    /// An identifier that is neither a coordinate nor a known constant.
    #[error("unknown identifier '{name}' at offset {offset}")]
    UnknownIdentifier {
        /// Byte offset of the identifier.
        offset: usize,
        /// The identifier.
        name: String,
    },
    /// A call to a function that does not exist.
    #[error("unknown function '{name}' at offset {offset}")]
    UnknownFunction {
        /// Byte offset of the function name.
        offset: usize,
        /// The function name.
        name: String,
    },
    /// A function called with the wrong number of arguments.
    #[error("function '{name}' at offset {offset} takes {expected} argument(s), got {found}")]
    WrongArity {
        /// Byte offset of the function name.
        offset: usize,
        /// The function name.
        name: String,
        /// Number of arguments the function takes.
        expected: usize,
        /// Number of arguments supplied.
        found: usize,
    },
    /// Operators or parentheses nested deeper than the evaluator allows.
    #[error("expression nests deeper than {limit} levels at offset {offset}")]
    TooDeep {
        /// Byte offset where the limit was crossed.
        offset: usize,
        /// The nesting limit.
        limit: usize,
    },
}

/// Errors detected while building a species from its configuration.
///
/// Every variant names the species and, where applicable, the parameter,
/// so the input can be fixed without reading source code.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A required parameter is absent.
    #[error("species '{species}': missing required parameter '{parameter}'")]
    MissingParameter {
        /// Species being configured.
        species: String,
        /// Parameter key (without the species prefix).
        parameter: String,
    },
    /// A parameter is present but its text does not have the expected form.
    #[error("species '{species}': parameter '{parameter}' = '{value}' is not {expected}")]
    MalformedParameter {
        /// Species being configured.
        species: String,
        /// Parameter key.
        parameter: String,
        /// The raw value text.
        value: String,
        /// Description of the expected form, e.g. `"a real number"`.
        expected: &'static str,
    },
    /// A parameter parsed but violates a constraint.
    #[error("species '{species}': invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Species being configured.
        species: String,
        /// Parameter key.
        parameter: String,
        /// What constraint was violated.
        reason: String,
    },
    /// A variant name (injector profile, pusher, injection style) is not recognised.
    #[error("species '{species}': parameter '{parameter}' = '{value}' must be one of {allowed}")]
    UnknownVariant {
        /// Species being configured.
        species: String,
        /// Parameter key.
        parameter: String,
        /// The unrecognised value.
        value: String,
        /// Comma-separated list of accepted values.
        allowed: &'static str,
    },
    /// A user expression failed to compile.
    #[error("species '{species}': expression in '{parameter}' failed to compile: {source}")]
    Expression {
        /// Species being configured.
        species: String,
        /// Parameter key holding the expression.
        parameter: String,
        /// The underlying parse failure.
        #[source]
        source: ParseError,
    },
    /// An injector rejected its configured coefficients.
    #[error("species '{species}': injector parameter '{parameter}': {source}")]
    Injector {
        /// Species being configured.
        species: String,
        /// Parameter key holding the coefficients.
        parameter: String,
        /// What the injector rejected.
        #[source]
        source: InjectorError,
    },
    /// Field ionization is enabled but the ionization energy table is empty.
    #[error("species '{species}': field ionization enabled with an empty ionization energy table")]
    EmptyIonizationTable {
        /// Species being configured.
        species: String,
    },
}

/// Errors from building a density or momentum injector.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum InjectorError {
    /// A Gaussian spread component is negative or not finite.
    #[error("momentum spread must be finite and >= 0, got {spread}")]
    InvalidSpread {
        /// The offending component.
        spread: crate::Real,
    },
    /// A custom profile received fewer coefficients than it reads.
    #[error("custom profile '{profile}' needs at least {needed} parameter(s), got {got}")]
    TooFewParameters {
        /// Registered profile name.
        profile: &'static str,
        /// Minimum coefficient count.
        needed: usize,
        /// Coefficients supplied.
        got: usize,
    },
}

/// Errors from reading or writing a species header.
#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    /// Underlying I/O failure.
    #[error("header i/o: {0}")]
    Io(#[from] std::io::Error),
    /// The stream does not start with the species header magic.
    #[error("not a species header (bad magic)")]
    BadMagic,
    /// The header was written by an incompatible format version.
    #[error("unsupported header version {found}")]
    UnsupportedVersion {
        /// The version found in the stream.
        found: u8,
    },
    /// The header content is structurally invalid.
    #[error("malformed header: {reason}")]
    Malformed {
        /// What was wrong.
        reason: String,
    },
}
