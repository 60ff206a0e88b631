//! Host-facing tables of a compiled unit: where each global lives and where
//! the entry points start.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::atom::AtomPool;
use crate::scope::Variable;
use crate::storage::size_of;
use crate::types::{Qualifier, TypeSpecifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DataClass {
    Uniform,
    Attribute,
    /// Declared `varying`, or one of the fixed-function inputs and outputs.
    Varying,
    Const,
    /// Unqualified; the host has no interface to it.
    Private,
}

impl From<Qualifier> for DataClass {
    fn from(qualifier: Qualifier) -> Self {
        match qualifier {
            Qualifier::Uniform => DataClass::Uniform,
            Qualifier::Attribute => DataClass::Attribute,
            Qualifier::Varying | Qualifier::FixedInput | Qualifier::FixedOutput => DataClass::Varying,
            Qualifier::Const => DataClass::Const,
            Qualifier::None | Qualifier::Out | Qualifier::Inout => DataClass::Private,
        }
    }
}

/// Flattened type description of an exported variable or struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    pub name: String,
    pub size: u32,
    pub array_len: u32,
    /// Type name, `None` for structs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Quantity>,
}

impl Quantity {
    pub fn of(var: &Variable, atoms: &AtomPool, vec4: bool) -> Self {
        let spec = match &var.ty.specifier {
            TypeSpecifier::Array(elem) => elem.as_ref(),
            spec => spec,
        };
        let (basic, fields) = match spec {
            TypeSpecifier::Struct(def) => (
                None,
                def.fields
                    .variables
                    .iter()
                    .map(|field| Quantity::of(field, atoms, vec4))
                    .collect(),
            ),
            spec => (Some(spec.name().to_string()), vec![]),
        };
        Quantity {
            name: atoms.id(var.name).to_string(),
            size: size_of(&var.ty.specifier, var.array_len, vec4),
            array_len: var.array_len,
            basic,
            fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEntry {
    pub class: DataClass,
    pub quantity: Quantity,
    pub address: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exports {
    pub data: Vec<DataEntry>,
    pub code: IndexMap<String, u32>,
}

impl Exports {
    pub fn find_data(&self, name: &str) -> Option<&DataEntry> {
        self.data.iter().find(|e| e.quantity.name == name)
    }

    pub fn find_code(&self, name: &str) -> Option<u32> {
        self.code.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use crate::types::StructDef;

    #[test]
    fn struct_quantity_lists_fields() {
        let mut atoms = AtomPool::new();
        let mut fields = Scope::new();
        fields.push(Variable::new(Qualifier::None, TypeSpecifier::Vec3, atoms.atom("pos")));
        fields.push(
            Variable::new(
                Qualifier::None,
                TypeSpecifier::Array(Box::new(TypeSpecifier::Float)),
                atoms.atom("w"),
            )
            .with_array_len(2),
        );
        let light = TypeSpecifier::Struct(Box::new(StructDef {
            name: Some(atoms.atom("Light")),
            fields,
        }));
        let var = Variable::new(Qualifier::Uniform, light, atoms.atom("sun"));

        let q = Quantity::of(&var, &atoms, false);
        assert_eq!(q.name, "sun");
        assert_eq!(q.size, 20);
        assert_eq!(q.basic, None);
        assert_eq!(q.fields.len(), 2);
        assert_eq!(q.fields[0].basic.as_deref(), Some("vec3"));
        assert_eq!(q.fields[1].array_len, 2);
        assert_eq!(q.fields[1].basic.as_deref(), Some("float"));
        assert_eq!(DataClass::from(var.ty.qualifier), DataClass::Uniform);
    }

    #[test]
    fn only_interface_qualifiers_map_to_interface_classes() {
        assert_eq!(DataClass::from(Qualifier::Varying), DataClass::Varying);
        assert_eq!(DataClass::from(Qualifier::FixedOutput), DataClass::Varying);
        assert_eq!(DataClass::from(Qualifier::Const).to_string(), "const");
        assert_eq!(DataClass::from(Qualifier::None).to_string(), "private");
    }
}
