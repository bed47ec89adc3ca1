//! Named constants visible to every user expression.

use corona_core::constants::{C, EP0, M_E, M_P, MU0, PI, Q_E};
use corona_core::{ConfigError, ParameterTable, Real};
use corona_parser::{Constants, Expression};

/// Prefix of user-defined constants in the parameter table.
pub const USER_CONSTANTS: &str = "my_constants";

/// Physical constants plus every `my_constants.<name> = <value>` entry.
///
/// User values may themselves be constant expressions over the physical
/// constants and earlier user constants (`my_constants.n0 = 1e24 * q_e`).
pub fn expression_constants(table: &ParameterTable) -> Result<Constants, ConfigError> {
    let mut c = Constants::new();
    for (name, value) in [
        ("clight", C),
        ("epsilon0", EP0),
        ("mu0", MU0),
        ("q_e", Q_E),
        ("m_e", M_E),
        ("m_p", M_P),
        ("pi", PI),
    ] {
        c.insert(name.to_string(), value);
    }
    for (name, text) in table.section(USER_CONSTANTS) {
        let value = constant_value(USER_CONSTANTS, name, text, &c)?;
        c.insert(name.to_string(), value);
    }
    Ok(c)
}

/// Compile `text` and require it not to depend on `x`, `y`, `z`.
pub fn constant_value(
    species: &str,
    parameter: &str,
    text: &str,
    constants: &Constants,
) -> Result<Real, ConfigError> {
    let expr = compile(species, parameter, text, constants)?;
    expr.as_constant()
        .ok_or_else(|| ConfigError::MalformedParameter {
            species: species.to_string(),
            parameter: parameter.to_string(),
            value: text.to_string(),
            expected: "a constant expression",
        })
}

/// Compile `text`, attaching species and parameter to any parse failure.
pub fn compile(
    species: &str,
    parameter: &str,
    text: &str,
    constants: &Constants,
) -> Result<Expression, ConfigError> {
    Expression::compile_with_constants(text, constants).map_err(|source| ConfigError::Expression {
        species: species.to_string(),
        parameter: parameter.to_string(),
        source,
    })
}

/// Optional `species.parameter` as a constant expression.
pub fn get_constant(
    table: &ParameterTable,
    species: &str,
    parameter: &str,
    constants: &Constants,
) -> Result<Option<Real>, ConfigError> {
    table
        .get_str(species, parameter)
        .map(|text| constant_value(species, parameter, text, constants))
        .transpose()
}

/// Required `species.parameter` as a constant expression.
pub fn require_constant(
    table: &ParameterTable,
    species: &str,
    parameter: &str,
    constants: &Constants,
) -> Result<Real, ConfigError> {
    get_constant(table, species, parameter, constants)?.ok_or_else(|| {
        ConfigError::MissingParameter {
            species: species.to_string(),
            parameter: parameter.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_constants_are_predefined() {
        let c = expression_constants(&ParameterTable::new()).unwrap();
        assert_eq!(c.get("q_e"), Some(&Q_E));
        assert_eq!(c.get("clight"), Some(&C));
    }

    #[test]
    fn user_constants_may_reference_earlier_ones() {
        let t = ParameterTable::parse("my_constants.a = 2\nmy_constants.b = 3*a*m_e\n");
        let c = expression_constants(&t).unwrap();
        assert_eq!(c.get("b"), Some(&(3.0 * 2.0 * M_E)));
    }

    #[test]
    fn non_constant_value_rejected() {
        let t = ParameterTable::parse("electrons.charge = x*q_e\n");
        let c = expression_constants(&t).unwrap();
        let err = require_constant(&t, "electrons", "charge", &c).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedParameter { .. }));
    }

    #[test]
    fn parse_failure_names_parameter() {
        let t = ParameterTable::parse("electrons.mass = m_e *\n");
        let c = expression_constants(&t).unwrap();
        match require_constant(&t, "electrons", "mass", &c).unwrap_err() {
            ConfigError::Expression { parameter, .. } => assert_eq!(parameter, "mass"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
