use std::fmt;

/// The types of the IR.
///
/// The source language has exactly one numeric type, [Ty::Float64]. The
/// remaining types only exist inside the IR: comparison outcomes are `i1`
/// until they are explicitly widened, and storage slots are addressed by
/// `ptr`.
#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    Void,
    /// An integer type of the given width in bits.
    Int(u16),
    /// An IEEE 754 double precision floating point number.
    Float64,
    /// The address of a stack slot.
    Ptr,
}

impl Ty {
    pub fn void() -> Self { Ty::Void }

    pub fn bool() -> Self { Ty::Int(1) }

    pub fn float64() -> Self { Ty::Float64 }

    pub fn ptr() -> Self { Ty::Ptr }

    pub fn is_void(self) -> bool { matches!(self, Ty::Void) }

    pub fn is_integer(self) -> bool { matches!(self, Ty::Int(_)) }

    pub fn is_float(self) -> bool { matches!(self, Ty::Float64) }

    pub fn is_ptr(self) -> bool { matches!(self, Ty::Ptr) }

    /// Size in bytes when stored in memory.
    ///
    /// `ptr` is assumed to be 64-bit, the target is only consulted by the code
    /// generator.
    pub fn bytewidth(self) -> u32 {
        match self {
            Ty::Void => 0,
            Ty::Int(bits) => (bits as u32).div_ceil(8),
            Ty::Float64 | Ty::Ptr => 8,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Void => write!(f, "void"),
            Ty::Int(bits) => write!(f, "i{}", bits),
            Ty::Float64 => write!(f, "f64"),
            Ty::Ptr => write!(f, "ptr"),
        }
    }
}

/// The signature of a function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<Ty>,
    pub ret: Vec<Ty>,
}

impl Signature {
    pub fn new(params: Vec<Ty>, ret: Vec<Ty>) -> Signature { Signature { params, ret } }

    /// The single return type, `void` if nothing is returned.
    pub fn ret_ty(&self) -> Ty { self.ret.first().copied().unwrap_or(Ty::Void) }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") -> ")?;
        match self.ret.as_slice() {
            [] => write!(f, "void"),
            [ty] => write!(f, "{}", ty),
            tys => {
                write!(f, "(")?;
                for (i, ty) in tys.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ty)?;
                }
                write!(f, ")")
            }
        }
    }
}
