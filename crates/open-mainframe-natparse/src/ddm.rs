// SPDX-License-Identifier: Apache-2.0
//! Data definition modules (DDMs).
//!
//! A DDM describes the record layout of a database file. Views declared with
//! `VIEW OF ddm` take their field types from here.

use crate::types::{DataFormat, DataType};

/// Descriptor (index) kind of a DDM field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum DescriptorKind {
    #[default]
    None,
    Descriptor,
    Unique,
    Superdescriptor,
    Subdescriptor,
    Phonetic,
    Hyperdescriptor,
}

impl DescriptorKind {
    /// Whether the field can drive `READ ... BY` / `FIND ... WITH`.
    pub fn is_descriptor(self) -> bool {
        self != DescriptorKind::None
    }
}

/// One field of a DDM.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DdmField {
    /// Level number (1 for top-level fields).
    pub level: u32,
    /// Two-character Adabas short name.
    pub short_name: String,
    /// Long name used in programs.
    pub name: String,
    /// Format; `None` for groups.
    pub format: Option<DataFormat>,
    /// Length in bytes or total digits.
    pub length: u32,
    /// Digits after the decimal point.
    pub decimals: u32,
    /// Descriptor kind.
    pub descriptor: DescriptorKind,
    /// Group field (`G`).
    pub is_group: bool,
    /// Periodic group (`PE`).
    pub is_periodic: bool,
    /// Multiple-value field (`MU`).
    pub is_multiple: bool,
}

impl DdmField {
    /// Type of the field; `None` for groups.
    pub fn data_type(&self) -> Option<DataType> {
        let format = self.format?;
        if self.length == 0 && format.can_be_dynamic() {
            return Some(DataType::dynamic(format));
        }
        let length = if format.has_fixed_length() { 0 } else { self.length };
        Some(DataType::with_decimals(format, length, self.decimals))
    }
}

/// A parsed DDM.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct DataDefinitionModule {
    /// DDM name.
    pub name: String,
    /// Fields in definition order.
    pub fields: Vec<DdmField>,
}

impl DataDefinitionModule {
    /// Create an empty DDM.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field addition for scalar fields.
    pub fn with_field(mut self, name: &str, data_type: DataType) -> Self {
        self.fields.push(DdmField {
            level: 1,
            short_name: String::new(),
            name: name.to_ascii_uppercase(),
            format: Some(data_type.format),
            length: data_type.length,
            decimals: data_type.decimals,
            descriptor: DescriptorKind::None,
            is_group: false,
            is_periodic: false,
            is_multiple: false,
        });
        self
    }

    /// Field by long or short name, case-insensitive.
    pub fn find_field(&self, name: &str) -> Option<&DdmField> {
        self.fields.iter().find(|f| {
            f.name.eq_ignore_ascii_case(name)
                || (!f.short_name.is_empty() && f.short_name.eq_ignore_ascii_case(name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employees() -> DataDefinitionModule {
        DataDefinitionModule::new("employees")
            .with_field("NAME", DataType::alphanumeric(20))
            .with_field("SALARY", DataType::with_decimals(DataFormat::Packed, 9, 2))
            .with_field("BIRTH", DataType::new(DataFormat::Date, 0))
    }

    #[test]
    fn test_find_field_is_case_insensitive() {
        let ddm = employees();
        assert_eq!(ddm.name, "EMPLOYEES");
        assert!(ddm.find_field("name").is_some());
        assert!(ddm.find_field("CITY").is_none());
    }

    #[test]
    fn test_field_types() {
        let ddm = employees();
        let salary = ddm.find_field("SALARY").and_then(DdmField::data_type);
        assert_eq!(salary, Some(DataType::with_decimals(DataFormat::Packed, 9, 2)));
        let birth = ddm.find_field("BIRTH").and_then(DdmField::data_type);
        assert_eq!(birth, Some(DataType::new(DataFormat::Date, 0)));
    }

    #[test]
    fn test_deserialize_ddm() {
        let json = r#"{
            "name": "CARS",
            "fields": [{
                "level": 1, "short_name": "AA", "name": "MAKE",
                "format": "Alphanumeric", "length": 20, "decimals": 0,
                "descriptor": "Descriptor", "is_group": false,
                "is_periodic": false, "is_multiple": false
            }]
        }"#;
        let ddm: DataDefinitionModule = serde_json::from_str(json).unwrap();
        assert!(ddm.find_field("AA").is_some());
        assert!(ddm.fields[0].descriptor.is_descriptor());
    }
}
