//! Flat `species.key = value` parameter table.
//!
//! The surrounding driver owns input parsing; it hands the core a table of
//! already-split entries. Typed getters scope every lookup by species name
//! so failures come back as [`ConfigError`]s naming both the species and
//! the parameter.

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::Real;

/// Ordered `key → value` table of raw parameter text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParameterTable {
    entries: IndexMap<String, String>,
}

impl ParameterTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key = value` lines. Blank lines and `#` comments are skipped;
    /// lines without `=` are ignored. Later entries override earlier ones.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::new();
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if let Some((k, v)) = line.split_once('=') {
                let k = k.trim();
                if !k.is_empty() {
                    table.insert(k, v.trim());
                }
            }
        }
        table
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Raw value for a fully-qualified key.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Raw value of `species.parameter`.
    pub fn get_str(&self, species: &str, parameter: &str) -> Option<&str> {
        self.raw(&format!("{species}.{parameter}"))
    }

    /// Required string parameter.
    pub fn require_str(&self, species: &str, parameter: &str) -> Result<&str, ConfigError> {
        self.get_str(species, parameter)
            .ok_or_else(|| missing(species, parameter))
    }

    /// Optional real parameter.
    pub fn get_real(&self, species: &str, parameter: &str) -> Result<Option<Real>, ConfigError> {
        match self.get_str(species, parameter) {
            None => Ok(None),
            Some(v) => v
                .parse::<Real>()
                .map(Some)
                .map_err(|_| malformed(species, parameter, v, "a real number")),
        }
    }

    /// Required real parameter.
    pub fn require_real(&self, species: &str, parameter: &str) -> Result<Real, ConfigError> {
        self.get_real(species, parameter)?
            .ok_or_else(|| missing(species, parameter))
    }

    /// Optional whitespace-separated list of reals.
    pub fn get_reals(
        &self,
        species: &str,
        parameter: &str,
    ) -> Result<Option<Vec<Real>>, ConfigError> {
        match self.get_str(species, parameter) {
            None => Ok(None),
            Some(v) => v
                .split_whitespace()
                .map(|t| t.parse::<Real>())
                .collect::<Result<Vec<_>, _>>()
                .map(Some)
                .map_err(|_| malformed(species, parameter, v, "a list of real numbers")),
        }
    }

    /// Optional non-negative integer parameter.
    pub fn get_uint(&self, species: &str, parameter: &str) -> Result<Option<u64>, ConfigError> {
        match self.get_str(species, parameter) {
            None => Ok(None),
            Some(v) => v
                .parse::<u64>()
                .map(Some)
                .map_err(|_| malformed(species, parameter, v, "a non-negative integer")),
        }
    }

    /// Optional whitespace-separated list of non-negative integers.
    pub fn get_uints(
        &self,
        species: &str,
        parameter: &str,
    ) -> Result<Option<Vec<u64>>, ConfigError> {
        match self.get_str(species, parameter) {
            None => Ok(None),
            Some(v) => v
                .split_whitespace()
                .map(|t| t.parse::<u64>())
                .collect::<Result<Vec<_>, _>>()
                .map(Some)
                .map_err(|_| malformed(species, parameter, v, "a list of non-negative integers")),
        }
    }

    /// Optional boolean parameter. Accepts `0`/`1`/`true`/`false`.
    pub fn get_bool(&self, species: &str, parameter: &str) -> Result<Option<bool>, ConfigError> {
        match self.get_str(species, parameter) {
            None => Ok(None),
            Some("1") | Some("true") => Ok(Some(true)),
            Some("0") | Some("false") => Ok(Some(false)),
            Some(v) => Err(malformed(species, parameter, v, "a boolean (0, 1, true, false)")),
        }
    }

    /// Entries of the form `prefix.name = value`, as `(name, value)`
    /// pairs in insertion order.
    pub fn section<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.entries.iter().filter_map(move |(k, v)| {
            k.strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('.'))
                .map(|name| (name, v.as_str()))
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn missing(species: &str, parameter: &str) -> ConfigError {
    ConfigError::MissingParameter {
        species: species.to_string(),
        parameter: parameter.to_string(),
    }
}

fn malformed(species: &str, parameter: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::MalformedParameter {
        species: species.to_string(),
        parameter: parameter.to_string(),
        value: value.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = "
        # electrons
        electrons.charge = -q_e
        electrons.mass = 9.1e-31
        electrons.num_particles_per_cell_each_dim = 2 2 1
        electrons.custom_profile_params = 1e25 0.5
        electrons.do_field_ionization = 1
        electrons.bad_list = 1.0 nope
    ";

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let t = ParameterTable::parse(INPUT);
        assert_eq!(t.len(), 6);
        assert_eq!(t.get_str("electrons", "charge"), Some("-q_e"));
    }

    #[test]
    fn typed_getters() {
        let t = ParameterTable::parse(INPUT);
        assert_eq!(t.require_real("electrons", "mass").unwrap(), 9.1e-31);
        assert_eq!(
            t.get_uints("electrons", "num_particles_per_cell_each_dim")
                .unwrap(),
            Some(vec![2, 2, 1])
        );
        assert_eq!(
            t.get_reals("electrons", "custom_profile_params").unwrap(),
            Some(vec![1e25, 0.5])
        );
        assert_eq!(t.get_bool("electrons", "do_field_ionization").unwrap(), Some(true));
        assert_eq!(t.get_real("electrons", "absent").unwrap(), None);
    }

    #[test]
    fn malformed_value_names_species_and_parameter() {
        let t = ParameterTable::parse(INPUT);
        let err = t.require_real("electrons", "charge").unwrap_err();
        match err {
            ConfigError::MalformedParameter {
                species, parameter, ..
            } => {
                assert_eq!(species, "electrons");
                assert_eq!(parameter, "charge");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(t.get_reals("electrons", "bad_list").is_err());
    }

    #[test]
    fn section_strips_prefix() {
        let t = ParameterTable::parse("my_constants.n0 = 1e24\nmy_constants.w0 = 2\nmy_constantsx = 3\n");
        let names: Vec<_> = t.section("my_constants").collect();
        assert_eq!(names, vec![("n0", "1e24"), ("w0", "2")]);
    }

    #[test]
    fn missing_required_parameter() {
        let t = ParameterTable::new();
        let err = t.require_str("ions", "profile").unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingParameter {
                species: "ions".into(),
                parameter: "profile".into()
            }
        );
    }
}
