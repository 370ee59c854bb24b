use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A verification method within a DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMethod {
    /// Verification method identifier (e.g., "did:example:abc#keys-1").
    pub id: String,
    /// Type of the verification method (e.g., "Ed25519VerificationKey2020").
    #[serde(rename = "type")]
    pub method_type: String,
    /// The DID that controls this verification method.
    pub controller: String,
    /// Multibase-encoded public key material, if published inline.
    #[serde(
        rename = "publicKeyMultibase",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub public_key_multibase: Option<String>,
}

/// An entry in a verification relationship list: either a reference to a
/// method declared under `verificationMethod`, or an inline method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerificationMethodRef {
    /// Reference by verification method id.
    Reference(String),
    /// Inline verification method.
    Inline(VerificationMethod),
}

/// The named verification relationships a DID Document may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationRelationship {
    Authentication,
    AssertionMethod,
    KeyAgreement,
    CapabilityDelegation,
    CapabilityInvocation,
}

/// W3C-compatible DID Document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DidDocument {
    /// The DID subject.
    pub id: String,
    /// Verification methods (public keys) associated with this DID.
    #[serde(rename = "verificationMethod", default)]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<VerificationMethodRef>,
    #[serde(
        rename = "assertionMethod",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub assertion_method: Vec<VerificationMethodRef>,
    #[serde(rename = "keyAgreement", default, skip_serializing_if = "Vec::is_empty")]
    pub key_agreement: Vec<VerificationMethodRef>,
    #[serde(
        rename = "capabilityDelegation",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub capability_delegation: Vec<VerificationMethodRef>,
    #[serde(
        rename = "capabilityInvocation",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub capability_invocation: Vec<VerificationMethodRef>,
    /// When the document was created.
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    /// When the document was last updated.
    #[serde(default = "Utc::now")]
    pub updated: DateTime<Utc>,
}

impl DidDocument {
    /// Create a DID Document with a single Ed25519 verification method
    /// referenced from both `authentication` and `assertionMethod`.
    pub fn new(id: impl Into<String>, public_key_multibase: Option<String>) -> Self {
        let id = id.into();
        let now = Utc::now();
        let vm_id = format!("{}#keys-1", id);
        let vm = VerificationMethod {
            id: vm_id.clone(),
            method_type: "Ed25519VerificationKey2020".to_string(),
            controller: id.clone(),
            public_key_multibase,
        };
        Self {
            id,
            verification_method: vec![vm],
            authentication: vec![VerificationMethodRef::Reference(vm_id.clone())],
            assertion_method: vec![VerificationMethodRef::Reference(vm_id)],
            key_agreement: Vec::new(),
            capability_delegation: Vec::new(),
            capability_invocation: Vec::new(),
            created: now,
            updated: now,
        }
    }

    /// Add a verification method and return its id.
    pub fn add_verification_method(
        &mut self,
        method_type: &str,
        public_key_multibase: Option<String>,
    ) -> String {
        let idx = self.verification_method.len() + 1;
        let vm_id = format!("{}#keys-{}", self.id, idx);
        self.verification_method.push(VerificationMethod {
            id: vm_id.clone(),
            method_type: method_type.to_string(),
            controller: self.id.clone(),
            public_key_multibase,
        });
        self.updated = Utc::now();
        vm_id
    }

    /// Reference an existing verification method from a relationship list.
    pub fn add_relationship(&mut self, relationship: VerificationRelationship, vm_id: &str) {
        let entry = VerificationMethodRef::Reference(vm_id.to_string());
        match relationship {
            VerificationRelationship::Authentication => self.authentication.push(entry),
            VerificationRelationship::AssertionMethod => self.assertion_method.push(entry),
            VerificationRelationship::KeyAgreement => self.key_agreement.push(entry),
            VerificationRelationship::CapabilityDelegation => {
                self.capability_delegation.push(entry)
            }
            VerificationRelationship::CapabilityInvocation => {
                self.capability_invocation.push(entry)
            }
        }
        self.updated = Utc::now();
    }

    /// The entries of a named relationship list.
    pub fn relationship(&self, relationship: VerificationRelationship) -> &[VerificationMethodRef] {
        match relationship {
            VerificationRelationship::Authentication => &self.authentication,
            VerificationRelationship::AssertionMethod => &self.assertion_method,
            VerificationRelationship::KeyAgreement => &self.key_agreement,
            VerificationRelationship::CapabilityDelegation => &self.capability_delegation,
            VerificationRelationship::CapabilityInvocation => &self.capability_invocation,
        }
    }

    fn method_by_id(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| vm.id == id)
    }
}

/// Normalize a declared key identifier against the document's DID.
/// Accepts "did:method:id#fragment", "#fragment", and bare "fragment".
fn normalize_key_id(doc_id: &str, key_id: &str) -> String {
    if key_id.contains(':') {
        key_id.to_string()
    } else if key_id.starts_with('#') {
        format!("{}{}", doc_id, key_id)
    } else {
        format!("{}#{}", doc_id, key_id)
    }
}

/// Deterministic verification-method lookup.
///
/// Search order: the named relationship list first (inline entries, then
/// references resolved against `verificationMethod`), falling back to a scan
/// of all verification methods in the document.
pub fn find_verification_method<'a>(
    doc: &'a DidDocument,
    key_id: &str,
    relationship: VerificationRelationship,
) -> Option<&'a VerificationMethod> {
    if key_id.is_empty() {
        return None;
    }
    let search_id = normalize_key_id(&doc.id, key_id);

    for entry in doc.relationship(relationship) {
        match entry {
            VerificationMethodRef::Inline(vm) if vm.id == search_id => return Some(vm),
            VerificationMethodRef::Reference(id) if *id == search_id => {
                if let Some(vm) = doc.method_by_id(&search_id) {
                    return Some(vm);
                }
            }
            _ => {}
        }
    }

    doc.method_by_id(&search_id)
}

/// The first verification method usable for a relationship, falling back to
/// the first method in the document when the relationship list is empty.
pub fn primary_verification_method(
    doc: &DidDocument,
    relationship: VerificationRelationship,
) -> Option<&VerificationMethod> {
    for entry in doc.relationship(relationship) {
        match entry {
            VerificationMethodRef::Inline(vm) => return Some(vm),
            VerificationMethodRef::Reference(id) => {
                if let Some(vm) = doc.method_by_id(id) {
                    return Some(vm);
                }
            }
        }
    }
    doc.verification_method.first()
}
