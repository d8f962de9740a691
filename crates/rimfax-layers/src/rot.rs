//! The 24 named single-qubit Clifford rotations.
//!
//! A single-qubit Clifford rotation is identified by the signed permutation
//! it induces on the Pauli axes under conjugation: it is enough to record
//! where X and Z go, the Y image follows from orientation. Composition and
//! inversion are exact, and every element of the group carries a canonical
//! gate name.

use rimfax_ir::Pauli;

/// A Pauli axis with a sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignedPauli {
    /// The axis.
    pub pauli: Pauli,
    /// Whether the axis is negated.
    pub negated: bool,
}

const fn sp(pauli: Pauli, negated: bool) -> SignedPauli {
    SignedPauli { pauli, negated }
}

/// The third axis of an anticommuting pair: `i * a * b` as a signed Pauli.
fn i_mul(a: Pauli, b: Pauli) -> SignedPauli {
    match (a, b) {
        (Pauli::X, Pauli::Z) => sp(Pauli::Y, false),
        (Pauli::Z, Pauli::X) => sp(Pauli::Y, true),
        (Pauli::X, Pauli::Y) => sp(Pauli::Z, true),
        (Pauli::Y, Pauli::X) => sp(Pauli::Z, false),
        (Pauli::Y, Pauli::Z) => sp(Pauli::X, true),
        (Pauli::Z, Pauli::Y) => sp(Pauli::X, false),
        _ => unreachable!("i_mul requires anticommuting Paulis"),
    }
}

/// One of the 24 single-qubit Clifford rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedRotation {
    x: SignedPauli,
    z: SignedPauli,
}

impl NamedRotation {
    pub const I: Self = Self { x: sp(Pauli::X, false), z: sp(Pauli::Z, false) };
    pub const X: Self = Self { x: sp(Pauli::X, false), z: sp(Pauli::Z, true) };
    pub const Y: Self = Self { x: sp(Pauli::X, true), z: sp(Pauli::Z, true) };
    pub const Z: Self = Self { x: sp(Pauli::X, true), z: sp(Pauli::Z, false) };
    pub const H: Self = Self { x: sp(Pauli::Z, false), z: sp(Pauli::X, false) };
    pub const H_XY: Self = Self { x: sp(Pauli::Y, false), z: sp(Pauli::Z, true) };
    pub const H_YZ: Self = Self { x: sp(Pauli::X, true), z: sp(Pauli::Y, false) };
    pub const H_NXY: Self = Self { x: sp(Pauli::Y, true), z: sp(Pauli::Z, true) };
    pub const H_NXZ: Self = Self { x: sp(Pauli::Z, true), z: sp(Pauli::X, true) };
    pub const H_NYZ: Self = Self { x: sp(Pauli::X, true), z: sp(Pauli::Y, true) };
    pub const S: Self = Self { x: sp(Pauli::Y, false), z: sp(Pauli::Z, false) };
    pub const S_DAG: Self = Self { x: sp(Pauli::Y, true), z: sp(Pauli::Z, false) };
    pub const SQRT_X: Self = Self { x: sp(Pauli::X, false), z: sp(Pauli::Y, true) };
    pub const SQRT_X_DAG: Self = Self { x: sp(Pauli::X, false), z: sp(Pauli::Y, false) };
    pub const SQRT_Y: Self = Self { x: sp(Pauli::Z, true), z: sp(Pauli::X, false) };
    pub const SQRT_Y_DAG: Self = Self { x: sp(Pauli::Z, false), z: sp(Pauli::X, true) };
    pub const C_XYZ: Self = Self { x: sp(Pauli::Y, false), z: sp(Pauli::X, false) };
    pub const C_ZYX: Self = Self { x: sp(Pauli::Z, false), z: sp(Pauli::Y, false) };
    pub const C_NXYZ: Self = Self { x: sp(Pauli::Y, true), z: sp(Pauli::X, true) };
    pub const C_XNYZ: Self = Self { x: sp(Pauli::Y, true), z: sp(Pauli::X, false) };
    pub const C_XYNZ: Self = Self { x: sp(Pauli::Y, false), z: sp(Pauli::X, true) };
    pub const C_ZYNX: Self = Self { x: sp(Pauli::Z, true), z: sp(Pauli::Y, false) };
    pub const C_ZNYX: Self = Self { x: sp(Pauli::Z, false), z: sp(Pauli::Y, true) };
    pub const C_NZYX: Self = Self { x: sp(Pauli::Z, true), z: sp(Pauli::Y, true) };

    /// All 24 rotations.
    pub const ALL: [Self; 24] = [
        Self::I,
        Self::X,
        Self::Y,
        Self::Z,
        Self::H,
        Self::H_XY,
        Self::H_YZ,
        Self::H_NXY,
        Self::H_NXZ,
        Self::H_NYZ,
        Self::S,
        Self::S_DAG,
        Self::SQRT_X,
        Self::SQRT_X_DAG,
        Self::SQRT_Y,
        Self::SQRT_Y_DAG,
        Self::C_XYZ,
        Self::C_ZYX,
        Self::C_NXYZ,
        Self::C_XNYZ,
        Self::C_XYNZ,
        Self::C_ZYNX,
        Self::C_ZNYX,
        Self::C_NZYX,
    ];

    /// Look up a rotation by gate name, accepting the registry's aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "I" => Self::I,
            "X" => Self::X,
            "Y" => Self::Y,
            "Z" => Self::Z,
            "H" | "H_XZ" => Self::H,
            "H_XY" => Self::H_XY,
            "H_YZ" => Self::H_YZ,
            "H_NXY" => Self::H_NXY,
            "H_NXZ" => Self::H_NXZ,
            "H_NYZ" => Self::H_NYZ,
            "S" | "SQRT_Z" => Self::S,
            "S_DAG" | "SQRT_Z_DAG" => Self::S_DAG,
            "SQRT_X" => Self::SQRT_X,
            "SQRT_X_DAG" => Self::SQRT_X_DAG,
            "SQRT_Y" => Self::SQRT_Y,
            "SQRT_Y_DAG" => Self::SQRT_Y_DAG,
            "C_XYZ" => Self::C_XYZ,
            "C_ZYX" => Self::C_ZYX,
            "C_NXYZ" => Self::C_NXYZ,
            "C_XNYZ" => Self::C_XNYZ,
            "C_XYNZ" => Self::C_XYNZ,
            "C_ZYNX" => Self::C_ZYNX,
            "C_ZNYX" => Self::C_ZNYX,
            "C_NZYX" => Self::C_NZYX,
            _ => return None,
        })
    }

    /// The canonical gate name.
    pub fn name(self) -> &'static str {
        match (self.x.pauli, self.x.negated, self.z.pauli, self.z.negated) {
            (Pauli::X, false, Pauli::Z, false) => "I",
            (Pauli::X, false, Pauli::Z, true) => "X",
            (Pauli::X, true, Pauli::Z, true) => "Y",
            (Pauli::X, true, Pauli::Z, false) => "Z",
            (Pauli::X, false, Pauli::Y, false) => "SQRT_X_DAG",
            (Pauli::X, false, Pauli::Y, true) => "SQRT_X",
            (Pauli::X, true, Pauli::Y, false) => "H_YZ",
            (Pauli::X, true, Pauli::Y, true) => "H_NYZ",
            (Pauli::Y, false, Pauli::Z, false) => "S",
            (Pauli::Y, false, Pauli::Z, true) => "H_XY",
            (Pauli::Y, true, Pauli::Z, false) => "S_DAG",
            (Pauli::Y, true, Pauli::Z, true) => "H_NXY",
            (Pauli::Y, false, Pauli::X, false) => "C_XYZ",
            (Pauli::Y, false, Pauli::X, true) => "C_XYNZ",
            (Pauli::Y, true, Pauli::X, false) => "C_XNYZ",
            (Pauli::Y, true, Pauli::X, true) => "C_NXYZ",
            (Pauli::Z, false, Pauli::X, false) => "H",
            (Pauli::Z, false, Pauli::X, true) => "SQRT_Y_DAG",
            (Pauli::Z, true, Pauli::X, false) => "SQRT_Y",
            (Pauli::Z, true, Pauli::X, true) => "H_NXZ",
            (Pauli::Z, false, Pauli::Y, false) => "C_ZYX",
            (Pauli::Z, false, Pauli::Y, true) => "C_ZNYX",
            (Pauli::Z, true, Pauli::Y, false) => "C_ZYNX",
            (Pauli::Z, true, Pauli::Y, true) => "C_NZYX",
            _ => unreachable!("X and Z images must be on different axes"),
        }
    }

    /// Where conjugation by this rotation sends a Pauli axis.
    pub fn image(self, pauli: Pauli) -> SignedPauli {
        match pauli {
            Pauli::X => self.x,
            Pauli::Z => self.z,
            Pauli::Y => {
                let base = i_mul(self.x.pauli, self.z.pauli);
                sp(base.pauli, base.negated ^ self.x.negated ^ self.z.negated)
            }
        }
    }

    fn image_signed(self, target: SignedPauli) -> SignedPauli {
        let img = self.image(target.pauli);
        sp(img.pauli, img.negated ^ target.negated)
    }

    /// The rotation equal to applying `self` and then `second`.
    #[must_use]
    pub fn then(self, second: Self) -> Self {
        Self {
            x: second.image_signed(self.x),
            z: second.image_signed(self.z),
        }
    }

    /// The inverse rotation.
    #[must_use]
    pub fn inverse(self) -> Self {
        Self {
            x: self.preimage_of(Pauli::X),
            z: self.preimage_of(Pauli::Z),
        }
    }

    fn preimage_of(self, target: Pauli) -> SignedPauli {
        for axis in [Pauli::X, Pauli::Y, Pauli::Z] {
            let img = self.image(axis);
            if img.pauli == target {
                return sp(axis, img.negated);
            }
        }
        unreachable!("a signed permutation is a bijection on axes")
    }

    /// Check if this is the identity rotation.
    pub fn is_identity(self) -> bool {
        self == Self::I
    }

    /// The rotation turning this basis' measurements and resets into Z-basis
    /// ones: H for X, H_YZ for Y, I for Z.
    pub fn basis_change_to_z(basis: Pauli) -> Self {
        match basis {
            Pauli::X => Self::H,
            Pauli::Y => Self::H_YZ,
            Pauli::Z => Self::I,
        }
    }
}
