//! Particle attribute indices and the per-species name → column map.
//!
//! Particle storage is columnar: one contiguous sequence per attribute.
//! The built-in real columns occupy fixed indices given by [`RealComp`];
//! species-specific extra columns are appended after them and looked up
//! by name through an [`AttributeMap`] established once per species.

use indexmap::IndexMap;

/// Built-in real-valued particle columns, in storage order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RealComp {
    /// Position, x.
    X,
    /// Position, y.
    Y,
    /// Position, z.
    Z,
    /// Statistical weight.
    W,
    /// Momentum per unit mass (gamma * v), x.
    Ux,
    /// Momentum per unit mass, y.
    Uy,
    /// Momentum per unit mass, z.
    Uz,
    /// Gathered electric field, x.
    Ex,
    /// Gathered electric field, y.
    Ey,
    /// Gathered electric field, z.
    Ez,
    /// Gathered magnetic field, x.
    Bx,
    /// Gathered magnetic field, y.
    By,
    /// Gathered magnetic field, z.
    Bz,
}

impl RealComp {
    /// Number of built-in real columns.
    pub const COUNT: usize = 13;

    /// All built-in columns in storage order.
    pub const ALL: [RealComp; Self::COUNT] = [
        Self::X,
        Self::Y,
        Self::Z,
        Self::W,
        Self::Ux,
        Self::Uy,
        Self::Uz,
        Self::Ex,
        Self::Ey,
        Self::Ez,
        Self::Bx,
        Self::By,
        Self::Bz,
    ];

    /// Column index in tile storage.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Canonical attribute name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::W => "w",
            Self::Ux => "ux",
            Self::Uy => "uy",
            Self::Uz => "uz",
            Self::Ex => "Ex",
            Self::Ey => "Ey",
            Self::Ez => "Ez",
            Self::Bx => "Bx",
            Self::By => "By",
            Self::Bz => "Bz",
        }
    }
}

/// Built-in integer-valued particle columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntComp {
    /// Current ionization level. Only present for species with field
    /// ionization enabled.
    IonizationLevel,
}

impl IntComp {
    /// Canonical attribute name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::IonizationLevel => "ionization_level",
        }
    }
}

/// Name → column index mapping for one species.
///
/// Built once at species initialization. Indices are stable for the
/// lifetime of the species; extra components are appended in the order
/// they are added.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeMap {
    real: IndexMap<String, usize>,
    int: IndexMap<String, usize>,
}

impl AttributeMap {
    /// A map holding only the built-in real columns.
    pub fn new() -> Self {
        let real = RealComp::ALL
            .iter()
            .map(|c| (c.name().to_string(), c.index()))
            .collect();
        Self {
            real,
            int: IndexMap::new(),
        }
    }

    /// Register an extra real component. Returns its column index, or
    /// `None` if the name is already taken.
    pub fn add_real(&mut self, name: &str) -> Option<usize> {
        if self.real.contains_key(name) {
            return None;
        }
        let idx = self.real.len();
        self.real.insert(name.to_string(), idx);
        Some(idx)
    }

    /// Register an extra integer component. Returns its column index, or
    /// `None` if the name is already taken.
    pub fn add_int(&mut self, name: &str) -> Option<usize> {
        if self.int.contains_key(name) {
            return None;
        }
        let idx = self.int.len();
        self.int.insert(name.to_string(), idx);
        Some(idx)
    }

    /// Column index of a real component.
    pub fn real_index(&self, name: &str) -> Option<usize> {
        self.real.get(name).copied()
    }

    /// Column index of an integer component.
    pub fn int_index(&self, name: &str) -> Option<usize> {
        self.int.get(name).copied()
    }

    /// Column index of the ionization level, if the species carries one.
    pub fn ionization_level(&self) -> Option<usize> {
        self.int_index(IntComp::IonizationLevel.name())
    }

    /// Number of real columns (built-in plus extra).
    pub fn num_real(&self) -> usize {
        self.real.len()
    }

    /// Number of integer columns.
    pub fn num_int(&self) -> usize {
        self.int.len()
    }

    /// Real component names in column order.
    pub fn real_names(&self) -> impl Iterator<Item = &str> {
        self.real.keys().map(String::as_str)
    }

    /// Integer component names in column order.
    pub fn int_names(&self) -> impl Iterator<Item = &str> {
        self.int.keys().map(String::as_str)
    }
}

impl Default for AttributeMap {
    fn default() -> Self {
        Self::new()
    }
}
