use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural position of a branch in the arrangement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Main,
    Guest,
    Middle1,
    Middle2,
    Middle3,
    Middle4,
}

impl Role {
    /// Roles optimized by the base pass, in variable allocation order.
    pub const BASE: [Role; 4] = [Role::Main, Role::Guest, Role::Middle1, Role::Middle2];
    /// Roles added by the extension pass.
    pub const EXTENSION: [Role; 2] = [Role::Middle3, Role::Middle4];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Main => "main",
            Role::Guest => "guest",
            Role::Middle1 => "middle1",
            Role::Middle2 => "middle2",
            Role::Middle3 => "middle3",
            Role::Middle4 => "middle4",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Azimuth half-plane a middle branch is nudged towards.
///
/// Drawn once per optimization run and handed to the encoder explicitly, so
/// a fixed value reproduces a model exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn sign(self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// True when `azimuth` lies strictly inside this half-plane.
    pub fn prefers(self, azimuth: f64) -> bool {
        self.sign() * azimuth > 0.0
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Side {
        if rng.gen_bool(0.5) { Side::Right } else { Side::Left }
    }
}
