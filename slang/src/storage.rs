//! Flattened storage layout of a type, used to drive per-leaf code generation.

use crate::types::TypeSpecifier;

/// Smallest unit moved by a single copy or deref instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    Bool,
    Int,
    Float,
    /// Only produced when the vec4 instructions are enabled.
    Vec4,
}

impl Leaf {
    pub fn size(self) -> u32 {
        match self {
            Leaf::Vec4 => 16,
            _ => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    Leaf(Leaf),
    Aggregate(Aggregate),
}

/// `length` consecutive copies of one storage element.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub storage: Storage,
    pub length: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregate {
    pub slots: Vec<Slot>,
}

impl Aggregate {
    /// Layout of a variable of type `spec`. `array_len` only applies to arrays.
    pub fn of(spec: &TypeSpecifier, array_len: u32, vec4: bool) -> Self {
        let mut agg = Aggregate::default();
        agg.append(spec, array_len, vec4);
        agg
    }

    fn leaf(&mut self, leaf: Leaf, length: u32) {
        self.slots.push(Slot {
            storage: Storage::Leaf(leaf),
            length,
        });
    }

    fn vector(&mut self, base: Leaf, n: u32, vec4: bool) {
        if vec4 && base == Leaf::Float && n == 4 {
            self.leaf(Leaf::Vec4, 1);
        } else {
            self.leaf(base, n);
        }
    }

    fn append(&mut self, spec: &TypeSpecifier, array_len: u32, vec4: bool) {
        use TypeSpecifier::*;
        match spec {
            Void => {}
            Bool | BVec2 | BVec3 | BVec4 => self.leaf(Leaf::Bool, spec.dim()),
            Int | IVec2 | IVec3 | IVec4 => self.leaf(Leaf::Int, spec.dim()),
            Float | Vec2 | Vec3 | Vec4 => self.vector(Leaf::Float, spec.dim(), vec4),
            Mat2 | Mat3 | Mat4 => {
                let mut column = Aggregate::default();
                column.vector(Leaf::Float, spec.dim(), vec4);
                self.slots.push(Slot {
                    storage: Storage::Aggregate(column),
                    length: spec.dim(),
                });
            }
            Sampler1D | Sampler2D | Sampler3D | SamplerCube | Sampler1DShadow
            | Sampler2DShadow => self.leaf(Leaf::Int, 1),
            Struct(def) => {
                for field in &def.fields.variables {
                    self.append(&field.ty.specifier, field.array_len, vec4);
                }
            }
            Array(elem) => self.slots.push(Slot {
                storage: Storage::Aggregate(Aggregate::of(elem, 0, vec4)),
                length: array_len,
            }),
        }
    }

    pub fn size(&self) -> u32 {
        self.slots
            .iter()
            .map(|slot| {
                slot.length
                    * match &slot.storage {
                        Storage::Leaf(leaf) => leaf.size(),
                        Storage::Aggregate(agg) => agg.size(),
                    }
            })
            .sum()
    }

    /// Every leaf in memory order, arrays expanded.
    pub fn leaves(&self) -> Vec<Leaf> {
        let mut out = vec![];
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut Vec<Leaf>) {
        for slot in &self.slots {
            for _ in 0..slot.length {
                match &slot.storage {
                    Storage::Leaf(leaf) => out.push(*leaf),
                    Storage::Aggregate(agg) => agg.collect(out),
                }
            }
        }
    }
}

/// Byte size of a variable of type `spec`.
pub fn size_of(spec: &TypeSpecifier, array_len: u32, vec4: bool) -> u32 {
    Aggregate::of(spec, array_len, vec4).size()
}
