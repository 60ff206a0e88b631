use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::atom::Atom;
use crate::scope::Scope;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Qualifier {
    #[default]
    None,
    Const,
    Attribute,
    Varying,
    Uniform,
    Out,
    Inout,
    FixedOutput,
    FixedInput,
}

impl Qualifier {
    /// Passed by reference, with an extra address slot in the frame.
    pub fn is_reference(&self) -> bool {
        matches!(self, Qualifier::Out | Qualifier::Inout)
    }
}

#[derive(Debug, Clone, Default)]
pub enum TypeSpecifier {
    #[default]
    Void,
    Bool,
    BVec2,
    BVec3,
    BVec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler1D,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    Sampler1DShadow,
    Sampler2DShadow,
    Struct(Box<StructDef>),
    Array(Box<TypeSpecifier>),
}

/// A struct type. Equality compares the field layout, never the name.
#[derive(Debug, Clone, Default)]
pub struct StructDef {
    pub name: Option<Atom>,
    pub fields: Scope,
}

impl PartialEq for StructDef {
    fn eq(&self, other: &Self) -> bool {
        let (x, y) = (&self.fields.variables, &other.fields.variables);
        x.len() == y.len()
            && x.iter().zip(y).all(|(a, b)| {
                a.name == b.name
                    && a.ty.specifier == b.ty.specifier
                    && (!matches!(a.ty.specifier, TypeSpecifier::Array(_))
                        || a.array_len == b.array_len)
            })
    }
}

impl PartialEq for TypeSpecifier {
    fn eq(&self, other: &Self) -> bool {
        use TypeSpecifier::*;
        match (self, other) {
            (Struct(a), Struct(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Struct(_), _) | (Array(_), _) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl TypeSpecifier {
    /// Built-in type names usable as constructors, e.g. `vec4(...)`.
    pub fn from_name(name: &str) -> Option<Self> {
        use TypeSpecifier::*;
        Some(match name {
            "void" => Void,
            "bool" => Bool,
            "bvec2" => BVec2,
            "bvec3" => BVec3,
            "bvec4" => BVec4,
            "int" => Int,
            "ivec2" => IVec2,
            "ivec3" => IVec3,
            "ivec4" => IVec4,
            "float" => Float,
            "vec2" => Vec2,
            "vec3" => Vec3,
            "vec4" => Vec4,
            "mat2" => Mat2,
            "mat3" => Mat3,
            "mat4" => Mat4,
            "sampler1D" => Sampler1D,
            "sampler2D" => Sampler2D,
            "sampler3D" => Sampler3D,
            "samplerCube" => SamplerCube,
            "sampler1DShadow" => Sampler1DShadow,
            "sampler2DShadow" => Sampler2DShadow,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        use TypeSpecifier::*;
        match self {
            Void => "void",
            Bool => "bool",
            BVec2 => "bvec2",
            BVec3 => "bvec3",
            BVec4 => "bvec4",
            Int => "int",
            IVec2 => "ivec2",
            IVec3 => "ivec3",
            IVec4 => "ivec4",
            Float => "float",
            Vec2 => "vec2",
            Vec3 => "vec3",
            Vec4 => "vec4",
            Mat2 => "mat2",
            Mat3 => "mat3",
            Mat4 => "mat4",
            Sampler1D => "sampler1D",
            Sampler2D => "sampler2D",
            Sampler3D => "sampler3D",
            SamplerCube => "samplerCube",
            Sampler1DShadow => "sampler1DShadow",
            Sampler2DShadow => "sampler2DShadow",
            Struct(_) => "struct",
            Array(_) => "array",
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeSpecifier::Void)
    }

    pub fn is_vector(&self) -> bool {
        use TypeSpecifier::*;
        matches!(
            self,
            BVec2 | BVec3 | BVec4 | IVec2 | IVec3 | IVec4 | Vec2 | Vec3 | Vec4
        )
    }

    /// Scalar type of a vector or matrix; scalars and other types map to themselves.
    pub fn base(&self) -> TypeSpecifier {
        use TypeSpecifier::*;
        match self {
            BVec2 | BVec3 | BVec4 => Bool,
            IVec2 | IVec3 | IVec4 => Int,
            Vec2 | Vec3 | Vec4 | Mat2 | Mat3 | Mat4 => Float,
            other => other.clone(),
        }
    }

    /// Number of rows of a vector or matrix, 1 for scalars.
    pub fn dim(&self) -> u32 {
        use TypeSpecifier::*;
        match self {
            BVec2 | IVec2 | Vec2 | Mat2 => 2,
            BVec3 | IVec3 | Vec3 | Mat3 => 3,
            BVec4 | IVec4 | Vec4 | Mat4 => 4,
            _ => 1,
        }
    }

    /// `base` widened to `n` components; `n == 1` gives the scalar itself.
    pub fn vector(base: &TypeSpecifier, n: u32) -> Option<TypeSpecifier> {
        use TypeSpecifier::*;
        Some(match (base, n) {
            (Bool | Int | Float, 1) => base.clone(),
            (Bool, 2) => BVec2,
            (Bool, 3) => BVec3,
            (Bool, 4) => BVec4,
            (Int, 2) => IVec2,
            (Int, 3) => IVec3,
            (Int, 4) => IVec4,
            (Float, 2) => Vec2,
            (Float, 3) => Vec3,
            (Float, 4) => Vec4,
            _ => return None,
        })
    }

    /// Type of `self[i]` for vectors and matrices.
    pub fn row(&self) -> Option<TypeSpecifier> {
        use TypeSpecifier::*;
        match self {
            Mat2 => Some(Vec2),
            Mat3 => Some(Vec3),
            Mat4 => Some(Vec4),
            t if t.is_vector() => Some(t.base()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::AtomPool;
    use crate::scope::Variable;

    #[test]
    fn names_round_trip() {
        for name in ["void", "bvec3", "ivec2", "vec4", "mat3", "samplerCube", "sampler2DShadow"] {
            assert_eq!(TypeSpecifier::from_name(name).map(|t| t.name()), Some(name));
        }
        assert!(TypeSpecifier::from_name("vec5").is_none());
    }

    #[test]
    fn base_and_dim() {
        assert_eq!(TypeSpecifier::IVec3.base(), TypeSpecifier::Int);
        assert_eq!(TypeSpecifier::Mat4.base(), TypeSpecifier::Float);
        assert_eq!(TypeSpecifier::Mat3.dim(), 3);
        assert_eq!(TypeSpecifier::Float.dim(), 1);
        assert_eq!(TypeSpecifier::Mat2.row(), Some(TypeSpecifier::Vec2));
        assert_eq!(TypeSpecifier::BVec4.row(), Some(TypeSpecifier::Bool));
        assert_eq!(TypeSpecifier::Float.row(), None);
        assert_eq!(
            TypeSpecifier::vector(&TypeSpecifier::Float, 3),
            Some(TypeSpecifier::Vec3)
        );
    }

    #[test]
    fn struct_equality_ignores_name() {
        let mut atoms = AtomPool::new();
        let field = |atoms: &mut AtomPool, name: &str, spec| {
            Variable::new(Qualifier::None, spec, atoms.atom(name))
        };
        let mut a = StructDef {
            name: Some(atoms.atom("A")),
            ..Default::default()
        };
        a.fields.push(field(&mut atoms, "x", TypeSpecifier::Float));
        let mut b = a.clone();
        b.name = Some(atoms.atom("B"));
        assert_eq!(
            TypeSpecifier::Struct(Box::new(a.clone())),
            TypeSpecifier::Struct(Box::new(b.clone()))
        );
        b.fields.push(field(&mut atoms, "y", TypeSpecifier::Float));
        assert_ne!(a, b);

        let f = atoms.atom("f");
        let arr = |len| {
            let mut s = StructDef::default();
            let mut v = Variable::new(
                Qualifier::None,
                TypeSpecifier::Array(Box::new(TypeSpecifier::Float)),
                f,
            );
            v.array_len = len;
            s.fields.push(v);
            s
        };
        assert_eq!(arr(3), arr(3));
        assert_ne!(arr(3), arr(4));
    }

    #[test]
    fn array_equality_recurses() {
        let a = TypeSpecifier::Array(Box::new(TypeSpecifier::Vec2));
        assert_eq!(a, TypeSpecifier::Array(Box::new(TypeSpecifier::Vec2)));
        assert_ne!(a, TypeSpecifier::Array(Box::new(TypeSpecifier::Vec3)));
        assert_ne!(a, TypeSpecifier::Vec2);
    }
}
