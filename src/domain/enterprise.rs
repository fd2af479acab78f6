// ==========================================
// KBO Loader - Enterprise document model
// ==========================================
// Root document: one per enterprise, embedding its establishments
// and branches. Every owner carries the same four child lists.
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ENTERPRISE_ENTITY_TYPE: &str = "enterprise";

// ==========================================
// Child records
// ==========================================

/// Activity row (activity.csv)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub nace: Option<String>,             // "Nace" + NaceVersion, e.g. "Nace2008"
    pub nace_code: Option<String>,        // raw NACE code
    pub nace_description: Option<String>, // resolved under the `nace` category
    pub activity_group: Option<String>,
    pub classification: Option<String>,
}

/// Address row (address.csv)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub type_of_address: Option<String>,
    pub zipcode: Option<String>,
    pub municipality: Option<String>,
    pub street: Option<String>,
    pub country: Option<String>,
    pub house_number: Option<String>,
    pub r#box: Option<String>,
    pub extra_address_info: Option<String>,
    pub date_striking_off: Option<String>,
}

/// Contact row (contact.csv)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub entity_contact: Option<String>,
    pub contact_type: Option<String>,
    pub value: Option<String>,
}

/// Denomination row (denomination.csv)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denomination {
    pub language: Option<String>,
    pub type_of_denomination: Option<String>,
    pub denomination: Option<String>,
}

// ==========================================
// ChildContainers - ordered lists per child kind
// ==========================================
// Policy: duplicates allowed, insertion order = file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildContainers {
    pub activities: Vec<Activity>,
    pub addresses: Vec<Address>,
    pub contacts: Vec<Contact>,
    pub denominations: Vec<Denomination>,
}

impl ChildContainers {
    pub fn total(&self) -> usize {
        self.activities.len() + self.addresses.len() + self.contacts.len() + self.denominations.len()
    }
}

/// A child record kind and the container it is appended to
pub trait ChildRecord: Sized + Send {
    fn container_mut(children: &mut ChildContainers) -> &mut Vec<Self>;
}

impl ChildRecord for Activity {
    fn container_mut(children: &mut ChildContainers) -> &mut Vec<Self> {
        &mut children.activities
    }
}

impl ChildRecord for Address {
    fn container_mut(children: &mut ChildContainers) -> &mut Vec<Self> {
        &mut children.addresses
    }
}

impl ChildRecord for Contact {
    fn container_mut(children: &mut ChildContainers) -> &mut Vec<Self> {
        &mut children.contacts
    }
}

impl ChildRecord for Denomination {
    fn container_mut(children: &mut ChildContainers) -> &mut Vec<Self> {
        &mut children.denominations
    }
}

// ==========================================
// UnitDocument - embedded establishment / branch
// ==========================================
// Once folded, the unit's own key is the map key in its enterprise
// and no back-reference to the enterprise is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDocument {
    pub start_date: Option<String>,

    #[serde(flatten)]
    pub children: ChildContainers,
}

pub type Establishment = UnitDocument;
pub type Branch = UnitDocument;

/// Establishment or branch before it is folded into its enterprise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUnit {
    pub key: String,               // EstablishmentNumber / branch Id
    pub enterprise_number: String, // back-reference, dropped on fold
    pub line: u64,                 // physical line in its source file
    pub unit: UnitDocument,
}

impl PendingUnit {
    /// Splits into (own key, owning enterprise, embeddable body)
    pub fn into_parts(self) -> (String, String, UnitDocument) {
        (self.key, self.enterprise_number, self.unit)
    }
}

// ==========================================
// Enterprise - root document
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enterprise {
    // ===== Key =====
    pub entity_number: String,
    pub entity_type: String,

    // ===== Resolved scalars (independently nullable) =====
    pub status: Option<String>,
    pub juridical_situation: Option<String>,
    pub type_of_enterprise: Option<String>,
    pub juridical_form: Option<String>,
    pub juridical_form_cac: Option<String>,
    pub start_date: Option<String>,

    // ===== Child containers =====
    #[serde(flatten)]
    pub children: ChildContainers,

    // ===== Embedded units, keyed by their own registry key =====
    pub establishments: BTreeMap<String, Establishment>,
    pub branches: BTreeMap<String, Branch>,
}

impl Enterprise {
    pub fn new(entity_number: impl Into<String>) -> Self {
        Self {
            entity_number: entity_number.into(),
            entity_type: ENTERPRISE_ENTITY_TYPE.to_string(),
            status: None,
            juridical_situation: None,
            type_of_enterprise: None,
            juridical_form: None,
            juridical_form_cac: None,
            start_date: None,
            children: ChildContainers::default(),
            establishments: BTreeMap::new(),
            branches: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enterprise_document_shape() {
        let mut enterprise = Enterprise::new("0200.065.765");
        enterprise.status = Some("Actif".to_string());
        enterprise.children.denominations.push(Denomination {
            language: Some("FR".to_string()),
            type_of_denomination: Some("Dénomination".to_string()),
            denomination: Some("ACME".to_string()),
        });
        enterprise
            .establishments
            .insert("2.000.000.339".to_string(), UnitDocument::default());

        let json = serde_json::to_value(&enterprise).unwrap();
        assert_eq!(json["entity_number"], "0200.065.765");
        assert_eq!(json["entity_type"], "enterprise");
        assert_eq!(json["status"], "Actif");
        assert!(json["juridical_form"].is_null());
        // child lists are flattened into the document
        assert_eq!(json["denominations"][0]["denomination"], "ACME");
        assert!(json["activities"].as_array().unwrap().is_empty());
        // embedded units carry no back-reference
        let est = &json["establishments"]["2.000.000.339"];
        assert!(est.get("entity_number").is_none());
        assert!(est["addresses"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_address_box_field_name() {
        let address = Address {
            type_of_address: None,
            zipcode: None,
            municipality: None,
            street: None,
            country: None,
            house_number: None,
            r#box: Some("B12".to_string()),
            extra_address_info: None,
            date_striking_off: None,
        };
        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json["box"], "B12");
    }

    #[test]
    fn test_pending_unit_into_parts() {
        let pending = PendingUnit {
            key: "9.999.999.999".to_string(),
            enterprise_number: "0200.065.765".to_string(),
            line: 7,
            unit: UnitDocument::default(),
        };
        let (key, owner, unit) = pending.into_parts();
        assert_eq!(key, "9.999.999.999");
        assert_eq!(owner, "0200.065.765");
        assert_eq!(unit.children.total(), 0);
    }
}
