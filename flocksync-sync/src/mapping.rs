//! Source-to-target field mapping.
//!
//! Source field names differ between API versions (`first_name` vs
//! `firstName`, flat vs nested addresses). Each target attribute lists its
//! alternate source fields in priority order; the first present, non-blank
//! scalar wins.

use crate::json::is_truthy;
use flocksync_types::{AttributeValue, MappedContact, SourceContact};
use serde_json::{Map, Value};

/// Direct email fields, in priority order.
pub const EMAIL_FIELDS: &[&str] = &["email", "email_address"];

/// Nested collection of email entries.
pub const EMAIL_COLLECTION: &str = "emails";

const EMAIL_ENTRY_FIELDS: &[&str] = &["address", "email"];
const DEFAULT_FLAG_FIELDS: &[&str] = &["default", "is_default", "primary"];

/// Target attribute carrying the joined address lines.
pub const ADDRESS_ATTRIBUTE: &str = "ADDRESS";

const ADDRESS_SEPARATOR: &str = ", ";

/// Nested address object, used when `address` is not a plain string.
const ADDRESS_OBJECT: &str = "address";

/// Maps one target attribute to its alternate source fields.
#[derive(Debug, Clone, Copy)]
pub struct AttributeRule {
    pub attribute: &'static str,
    pub fields: &'static [&'static str],
}

pub const ATTRIBUTE_RULES: &[AttributeRule] = &[
    AttributeRule {
        attribute: "FIRSTNAME",
        fields: &["first_name", "firstName"],
    },
    AttributeRule {
        attribute: "LASTNAME",
        fields: &["last_name", "lastName"],
    },
    AttributeRule {
        attribute: "SMS",
        fields: &["mobile", "mobile_number", "mobileNumber"],
    },
    AttributeRule {
        attribute: "LANDLINE",
        fields: &["telephone", "phone"],
    },
    AttributeRule {
        attribute: "BIRTHDAY",
        fields: &["date_of_birth", "dateOfBirth"],
    },
    AttributeRule {
        attribute: "SEX",
        fields: &["sex", "gender"],
    },
    AttributeRule {
        attribute: "CITY",
        fields: &["city", "town"],
    },
    AttributeRule {
        attribute: "COUNTY",
        fields: &["county"],
    },
    AttributeRule {
        attribute: "POSTCODE",
        fields: &["postcode", "post_code", "postCode"],
    },
    AttributeRule {
        attribute: "COUNTRY",
        fields: &["country"],
    },
    AttributeRule {
        attribute: "CHURCHSUITE_ID",
        fields: &["id"],
    },
];

struct AddressLine {
    fields: &'static [&'static str],
    nested: &'static [&'static str],
}

const ADDRESS_LINES: [AddressLine; 4] = [
    AddressLine {
        fields: &["address_line_1", "addressLine1", "address", "address1"],
        nested: &["line_1", "line1"],
    },
    AddressLine {
        fields: &["address_line_2", "addressLine2", "address2"],
        nested: &["line_2", "line2"],
    },
    AddressLine {
        fields: &["address_line_3", "addressLine3", "address3"],
        nested: &["line_3", "line3"],
    },
    AddressLine {
        fields: &["address_line_4", "addressLine4", "address4"],
        nested: &["line_4", "line4"],
    },
];

/// Maps a source contact into the target schema.
///
/// Returns `None` when no email can be resolved; such records are skipped,
/// not reported as failures.
pub fn map_contact(contact: &SourceContact) -> Option<MappedContact> {
    let email = resolve_email(contact)?;
    let mut mapped = MappedContact::new(email).ok()?;

    for rule in ATTRIBUTE_RULES {
        if let Some(value) = first_value(contact.fields(), rule.fields) {
            mapped.insert_attribute(rule.attribute, value);
        }
    }
    if let Some(address) = join_address(contact) {
        mapped.insert_attribute(ADDRESS_ATTRIBUTE, AttributeValue::Text(address));
    }

    Some(mapped)
}

/// Resolves the contact's email, lower-cased.
///
/// Order: direct fields, then the collection entry flagged as default, then
/// the first collection entry.
pub fn resolve_email(contact: &SourceContact) -> Option<String> {
    let entries = email_entries(contact);

    first_text(contact.fields(), EMAIL_FIELDS)
        .or_else(|| {
            entries
                .iter()
                .filter(|entry| is_default_entry(entry))
                .find_map(entry_email)
        })
        .or_else(|| entries.first().and_then(entry_email))
        .map(|email| email.to_lowercase())
}

/// Joins the present address lines 1-4 with `", "`, skipping blanks.
pub fn join_address(contact: &SourceContact) -> Option<String> {
    let nested = contact.get(ADDRESS_OBJECT).and_then(Value::as_object);

    let lines: Vec<String> = ADDRESS_LINES
        .iter()
        .filter_map(|line| {
            first_line(contact.fields(), line.fields)
                .or_else(|| nested.and_then(|object| first_line(object, line.nested)))
        })
        .collect();

    (!lines.is_empty()).then(|| lines.join(ADDRESS_SEPARATOR))
}

fn email_entries(contact: &SourceContact) -> &[Value] {
    contact
        .get(EMAIL_COLLECTION)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn entry_email(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) => non_blank(s),
        Value::Object(object) => first_text(object, EMAIL_ENTRY_FIELDS),
        _ => None,
    }
}

fn is_default_entry(entry: &Value) -> bool {
    entry.as_object().is_some_and(|object| {
        DEFAULT_FLAG_FIELDS
            .iter()
            .any(|flag| object.get(*flag).is_some_and(is_truthy))
    })
}

fn first_value(fields: &Map<String, Value>, names: &[&str]) -> Option<AttributeValue> {
    names
        .iter()
        .find_map(|name| fields.get(*name).and_then(AttributeValue::from_json))
}

fn first_text(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| fields.get(*name).and_then(Value::as_str).and_then(non_blank))
}

fn first_line(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match fields.get(*name)? {
        Value::String(s) => non_blank(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
