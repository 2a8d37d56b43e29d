use std::fmt;

use glam::{IVec2, Vec2};

use crate::checksum::Crc32;
use crate::error::{ReplicaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    Int = 0,
    Float = 1,
    Vec2i = 2,
    Vec2f = 3,
    IntNoInterp = 4,
}

impl ValueType {
    /// Width of the fixed little-endian encoding.
    pub fn encoded_len(self) -> usize {
        match self {
            Self::Int | Self::Float | Self::IntNoInterp => 4,
            Self::Vec2i | Self::Vec2f => 8,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Vec2i => "vec2i",
            Self::Vec2f => "vec2f",
            Self::IntNoInterp => "int (no interpolation)",
        };
        f.write_str(name)
    }
}

/// A single replicated attribute.
///
/// Deltas are values of the same variant holding `next - prev`. Every binary
/// operation requires both operands to share a variant and fails with
/// [`ReplicaError::TypeMismatch`] otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameValue {
    Int(i32),
    Float(f32),
    Vec2i(IVec2),
    Vec2f(Vec2),
    /// Discrete quantity (team, state id) that snaps instead of blending.
    IntNoInterp(i32),
}

impl GameValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Vec2i(_) => ValueType::Vec2i,
            Self::Vec2f(_) => ValueType::Vec2f,
            Self::IntNoInterp(_) => ValueType::IntNoInterp,
        }
    }

    /// Returns `other - self` as a value of the same variant.
    ///
    /// Integer deltas wrap and always restore `other` exactly. Float deltas
    /// are rounded, so `self.apply(&self.get_delta(other)?)` can differ from
    /// `other` when the operands are far apart in magnitude. Replicas catch
    /// the drift through [`Snapshot::checksum`](crate::snapshot::Snapshot::checksum).
    pub fn get_delta(&self, other: &GameValue) -> Result<GameValue> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Ok(Self::Int(b.wrapping_sub(*a))),
            (Self::Float(a), Self::Float(b)) => Ok(Self::Float(b - a)),
            (Self::Vec2i(a), Self::Vec2i(b)) => Ok(Self::Vec2i(IVec2::new(
                b.x.wrapping_sub(a.x),
                b.y.wrapping_sub(a.y),
            ))),
            (Self::Vec2f(a), Self::Vec2f(b)) => Ok(Self::Vec2f(*b - *a)),
            (Self::IntNoInterp(a), Self::IntNoInterp(b)) => {
                Ok(Self::IntNoInterp(b.wrapping_sub(*a)))
            }
            _ => Err(self.mismatch(other)),
        }
    }

    /// Returns `self + delta * t`. The no-interpolation variant ignores both
    /// `delta` and `t` and yields `self`.
    pub fn interp(&self, delta: &GameValue, t: f32) -> Result<GameValue> {
        match (self, delta) {
            (Self::Int(v), Self::Int(d)) => Ok(Self::Int(v.wrapping_add(scale(*d, t)))),
            (Self::Float(v), Self::Float(d)) => Ok(Self::Float(v + d * t)),
            (Self::Vec2i(v), Self::Vec2i(d)) => Ok(Self::Vec2i(IVec2::new(
                v.x.wrapping_add(scale(d.x, t)),
                v.y.wrapping_add(scale(d.y, t)),
            ))),
            (Self::Vec2f(v), Self::Vec2f(d)) => Ok(Self::Vec2f(*v + *d * t)),
            (Self::IntNoInterp(v), Self::IntNoInterp(_)) => Ok(Self::IntNoInterp(*v)),
            _ => Err(self.mismatch(delta)),
        }
    }

    /// Commits a whole delta, including for the no-interpolation variant.
    pub fn apply(&self, delta: &GameValue) -> Result<GameValue> {
        match (self, delta) {
            (Self::IntNoInterp(v), Self::IntNoInterp(d)) => {
                Ok(Self::IntNoInterp(v.wrapping_add(*d)))
            }
            _ => self.interp(delta, 1.0),
        }
    }

    /// True for a delta that changes nothing.
    pub fn is_identity(&self) -> bool {
        match self {
            Self::Int(d) | Self::IntNoInterp(d) => *d == 0,
            Self::Float(d) => *d == 0.0,
            Self::Vec2i(d) => *d == IVec2::ZERO,
            Self::Vec2f(d) => *d == Vec2::ZERO,
        }
    }

    pub fn checksum(&self) -> u32 {
        let mut crc = Crc32::new();
        self.checksum_into(&mut crc);
        crc.finish()
    }

    pub(crate) fn checksum_into(&self, crc: &mut Crc32) {
        let (bytes, len) = self.canonical().raw_bytes();
        crc.update(&bytes[..len]);
    }

    /// Fixed-width little-endian encoding; vectors are `x` then `y`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let (bytes, len) = self.raw_bytes();
        bytes[..len].to_vec()
    }

    /// Decodes `bytes` as a value of the same variant as `self`. The receiver
    /// acts as the typed slot, which is how a kind's schema drives decoding.
    pub fn decode_like(&self, bytes: &[u8]) -> Result<GameValue> {
        let ty = self.value_type();
        if bytes.len() != ty.encoded_len() {
            return Err(ReplicaError::MalformedValue {
                ty,
                expected: ty.encoded_len(),
                actual: bytes.len(),
            });
        }

        let value = match ty {
            ValueType::Int => Self::Int(i32::from_le_bytes(word(bytes, 0))),
            ValueType::IntNoInterp => Self::IntNoInterp(i32::from_le_bytes(word(bytes, 0))),
            ValueType::Float => Self::Float(f32::from_le_bytes(word(bytes, 0))),
            ValueType::Vec2i => Self::Vec2i(IVec2::new(
                i32::from_le_bytes(word(bytes, 0)),
                i32::from_le_bytes(word(bytes, 4)),
            )),
            ValueType::Vec2f => Self::Vec2f(Vec2::new(
                f32::from_le_bytes(word(bytes, 0)),
                f32::from_le_bytes(word(bytes, 4)),
            )),
        };
        Ok(value)
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) | Self::IntNoInterp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec2i(&self) -> Option<IVec2> {
        match self {
            Self::Vec2i(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec2f(&self) -> Option<Vec2> {
        match self {
            Self::Vec2f(v) => Some(*v),
            _ => None,
        }
    }

    pub(crate) fn mismatch(&self, other: &GameValue) -> ReplicaError {
        ReplicaError::TypeMismatch {
            expected: self.value_type(),
            found: other.value_type(),
        }
    }

    fn canonical(&self) -> GameValue {
        match self {
            Self::Float(v) => Self::Float(positive_zero(*v)),
            Self::Vec2f(v) => Self::Vec2f(Vec2::new(positive_zero(v.x), positive_zero(v.y))),
            other => *other,
        }
    }

    fn raw_bytes(&self) -> ([u8; 8], usize) {
        let mut buf = [0u8; 8];
        match self {
            Self::Int(v) | Self::IntNoInterp(v) => buf[..4].copy_from_slice(&v.to_le_bytes()),
            Self::Float(v) => buf[..4].copy_from_slice(&v.to_le_bytes()),
            Self::Vec2i(v) => {
                buf[..4].copy_from_slice(&v.x.to_le_bytes());
                buf[4..].copy_from_slice(&v.y.to_le_bytes());
            }
            Self::Vec2f(v) => {
                buf[..4].copy_from_slice(&v.x.to_le_bytes());
                buf[4..].copy_from_slice(&v.y.to_le_bytes());
            }
        }
        (buf, self.value_type().encoded_len())
    }
}

impl From<i32> for GameValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for GameValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<IVec2> for GameValue {
    fn from(value: IVec2) -> Self {
        Self::Vec2i(value)
    }
}

impl From<Vec2> for GameValue {
    fn from(value: Vec2) -> Self {
        Self::Vec2f(value)
    }
}

fn scale(delta: i32, t: f32) -> i32 {
    (delta as f64 * t as f64) as i32
}

fn positive_zero(v: f32) -> f32 {
    if v == 0.0 { 0.0 } else { v }
}

fn word(bytes: &[u8], offset: usize) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&bytes[offset..offset + 4]);
    out
}
