//! Binary encode/decode of the species header.
//!
//! The header records a species' configuration and its particle count on
//! every level, so a restart can rebuild the container before particle
//! data is read back. All integers are little-endian; strings are
//! prefixed with a `u32` byte length.

use std::io::{Read, Write};

use corona_core::{Backend, HeaderError, Real, SpeciesId};
use corona_solver::ShapeOrder;

use crate::config::{BufferDeposit, IonizationConfig, SpeciesConfig};
use crate::pusher::PusherAlgo;

/// First four bytes of every species header.
pub const MAGIC: [u8; 4] = *b"CRSP";

/// Current header format version.
pub const FORMAT_VERSION: u8 = 1;

const FLAG_DEPOSIT_ON_MAIN_GRID: u8 = 1 << 0;
const FLAG_GATHER_FROM_MAIN_GRID: u8 = 1 << 1;
const FLAG_DEPOSIT_CHARGE: u8 = 1 << 2;
const FLAG_FILTER: u8 = 1 << 3;
const FLAG_IONIZATION: u8 = 1 << 4;
const FLAG_IONIZATION_PRODUCT: u8 = 1 << 5;
const KNOWN_FLAGS: u8 = 0x3f;

/// Longest string a header may carry, in bytes.
pub const MAX_STR_LEN: usize = 4096;

/// Species configuration plus committed particle count per level.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeciesHeader {
    /// Species configuration.
    pub config: SpeciesConfig,
    /// `(level, particles)` in increasing level order.
    pub particles_per_level: Vec<(u32, u64)>,
}

// ── Primitives ─────────────────────────────────────────────────────

fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), HeaderError> {
    w.write_all(&[v])?;
    Ok(())
}

fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), HeaderError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), HeaderError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_f64_le(w: &mut dyn Write, v: Real) -> Result<(), HeaderError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_str(w: &mut dyn Write, s: &str) -> Result<(), HeaderError> {
    if s.len() > MAX_STR_LEN {
        return Err(malformed(format!(
            "string of {} bytes exceeds {MAX_STR_LEN}",
            s.len()
        )));
    }
    write_u32_le(w, s.len() as u32)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn write_strs(w: &mut dyn Write, list: &[String]) -> Result<(), HeaderError> {
    write_u32_le(w, list.len() as u32)?;
    for s in list {
        write_str(w, s)?;
    }
    Ok(())
}

fn read_u8(r: &mut dyn Read) -> Result<u8, HeaderError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32_le(r: &mut dyn Read) -> Result<u32, HeaderError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64_le(r: &mut dyn Read) -> Result<u64, HeaderError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64_le(r: &mut dyn Read) -> Result<Real, HeaderError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(Real::from_le_bytes(buf))
}

fn read_str(r: &mut dyn Read) -> Result<String, HeaderError> {
    let len = read_u32_le(r)? as usize;
    if len > MAX_STR_LEN {
        return Err(malformed(format!("string length {len} exceeds {MAX_STR_LEN}")));
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| malformed(format!("invalid UTF-8 string: {e}")))
}

fn read_strs(r: &mut dyn Read) -> Result<Vec<String>, HeaderError> {
    let n = read_u32_le(r)?;
    (0..n).map(|_| read_str(r)).collect()
}

fn malformed(reason: impl Into<String>) -> HeaderError {
    HeaderError::Malformed {
        reason: reason.into(),
    }
}

// ── Enum tags ──────────────────────────────────────────────────────

fn pusher_tag(p: PusherAlgo) -> u8 {
    match p {
        PusherAlgo::Boris => 0,
        PusherAlgo::Vay => 1,
    }
}

fn pusher_from_tag(tag: u8) -> Result<PusherAlgo, HeaderError> {
    match tag {
        0 => Ok(PusherAlgo::Boris),
        1 => Ok(PusherAlgo::Vay),
        other => Err(malformed(format!("unknown pusher tag {other}"))),
    }
}

fn buffer_tag(b: BufferDeposit) -> u8 {
    match b {
        BufferDeposit::Instead => 0,
        BufferDeposit::Additionally => 1,
    }
}

fn buffer_from_tag(tag: u8) -> Result<BufferDeposit, HeaderError> {
    match tag {
        0 => Ok(BufferDeposit::Instead),
        1 => Ok(BufferDeposit::Additionally),
        other => Err(malformed(format!("unknown buffer deposition tag {other}"))),
    }
}

fn backend_tag(b: Backend) -> u8 {
    match b {
        Backend::Sequential => 0,
        Backend::Parallel => 1,
    }
}

fn backend_from_tag(tag: u8) -> Result<Backend, HeaderError> {
    match tag {
        0 => Ok(Backend::Sequential),
        1 => Ok(Backend::Parallel),
        other => Err(malformed(format!("unknown backend tag {other}"))),
    }
}

// ── Header encode/decode ───────────────────────────────────────────

/// Encode `header`.
pub fn write_header(w: &mut dyn Write, header: &SpeciesHeader) -> Result<(), HeaderError> {
    let c = &header.config;
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;

    // Identity and physics
    write_str(w, &c.name)?;
    write_u32_le(w, c.id.0)?;
    write_f64_le(w, c.charge)?;
    write_f64_le(w, c.mass)?;
    write_u8(w, pusher_tag(c.pusher))?;
    write_u8(w, c.shape.order() as u8)?;
    write_u8(w, buffer_tag(c.buffer_deposit))?;

    let mut flags = 0;
    if c.deposit_on_main_grid {
        flags |= FLAG_DEPOSIT_ON_MAIN_GRID;
    }
    if c.gather_from_main_grid {
        flags |= FLAG_GATHER_FROM_MAIN_GRID;
    }
    if c.deposit_charge {
        flags |= FLAG_DEPOSIT_CHARGE;
    }
    if c.filter.is_some() {
        flags |= FLAG_FILTER;
    }
    if let Some(ion) = &c.ionization {
        flags |= FLAG_IONIZATION;
        if ion.product.is_some() {
            flags |= FLAG_IONIZATION_PRODUCT;
        }
    }
    write_u8(w, flags)?;

    if let Some(npass) = c.filter {
        for n in npass {
            write_u32_le(w, n)?;
        }
    }
    if let Some(ion) = &c.ionization {
        write_u32_le(w, ion.initial_level)?;
        write_u32_le(w, ion.energies.len() as u32)?;
        for &e in &ion.energies {
            write_f64_le(w, e)?;
        }
        if let Some(product) = &ion.product {
            write_str(w, product)?;
        }
    }

    // Attributes and scheduling
    write_strs(w, &c.extra_real)?;
    write_strs(w, &c.extra_int)?;
    write_u8(w, backend_tag(c.backend))?;
    write_u64_le(w, c.seed)?;

    // Particle counts
    write_u32_le(w, header.particles_per_level.len() as u32)?;
    for &(level, n) in &header.particles_per_level {
        write_u32_le(w, level)?;
        write_u64_le(w, n)?;
    }
    Ok(())
}

/// Decode and validate a header written by [`write_header`].
///
/// The decoded configuration must pass [`SpeciesConfig::validate`].
pub fn read_header(r: &mut dyn Read) -> Result<SpeciesHeader, HeaderError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(HeaderError::BadMagic);
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(HeaderError::UnsupportedVersion { found: version });
    }

    let name = read_str(r)?;
    let id = SpeciesId(read_u32_le(r)?);
    let charge = read_f64_le(r)?;
    let mass = read_f64_le(r)?;
    let pusher = pusher_from_tag(read_u8(r)?)?;
    let order = read_u8(r)?;
    let shape = ShapeOrder::from_order(u64::from(order))
        .ok_or_else(|| malformed(format!("unsupported shape order {order}")))?;
    let buffer_deposit = buffer_from_tag(read_u8(r)?)?;

    let flags = read_u8(r)?;
    if flags & !KNOWN_FLAGS != 0 {
        return Err(malformed(format!("unknown flag bits {flags:#04x}")));
    }
    let filter = if flags & FLAG_FILTER != 0 {
        Some([read_u32_le(r)?, read_u32_le(r)?, read_u32_le(r)?])
    } else {
        None
    };
    let ionization = if flags & FLAG_IONIZATION != 0 {
        let initial_level = read_u32_le(r)?;
        let n = read_u32_le(r)?;
        let energies = (0..n).map(|_| read_f64_le(r)).collect::<Result<_, _>>()?;
        let product = if flags & FLAG_IONIZATION_PRODUCT != 0 {
            Some(read_str(r)?)
        } else {
            None
        };
        Some(IonizationConfig {
            energies,
            initial_level,
            product,
        })
    } else if flags & FLAG_IONIZATION_PRODUCT != 0 {
        return Err(malformed("ionization product without ionization"));
    } else {
        None
    };

    let extra_real = read_strs(r)?;
    let extra_int = read_strs(r)?;
    let backend = backend_from_tag(read_u8(r)?)?;
    let seed = read_u64_le(r)?;

    let levels = read_u32_le(r)?;
    let mut particles_per_level = Vec::with_capacity(levels.min(64) as usize);
    for _ in 0..levels {
        let level = read_u32_le(r)?;
        let n = read_u64_le(r)?;
        if particles_per_level.last().is_some_and(|&(prev, _)| prev >= level) {
            return Err(malformed(format!("level {level} out of order")));
        }
        particles_per_level.push((level, n));
    }

    let config = SpeciesConfig {
        name,
        id,
        charge,
        mass,
        pusher,
        shape,
        buffer_deposit,
        deposit_on_main_grid: flags & FLAG_DEPOSIT_ON_MAIN_GRID != 0,
        gather_from_main_grid: flags & FLAG_GATHER_FROM_MAIN_GRID != 0,
        filter,
        deposit_charge: flags & FLAG_DEPOSIT_CHARGE != 0,
        ionization,
        extra_real,
        extra_int,
        backend,
        seed,
    };
    config.validate().map_err(|e| malformed(e.to_string()))?;
    Ok(SpeciesHeader {
        config,
        particles_per_level,
    })
}
