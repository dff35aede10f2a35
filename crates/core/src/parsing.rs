use crate::error::{MalformedDataError, MappingError, RequiredField};
use crate::graph::{Object, Value};
use crate::models::{AddressRecord, HotelRecord};
use crate::source::{compute_sha256_hex, DocumentSource};

pub const COLLECTION_ELEMENT: &str = "Hotels";
pub const RECORD_ELEMENT: &str = "Hotel";

fn child_elements<'a, 'input: 'a>(
    node: roxmltree::Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == name)
}

fn find_element<'a, 'input: 'a>(
    node: roxmltree::Node<'a, 'input>,
    name: &'a str,
) -> Option<roxmltree::Node<'a, 'input>> {
    child_elements(node, name).next()
}

/// Concatenated text of all descendant text nodes.
fn text_content(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn get_text(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    find_element(node, name).map(text_content)
}

fn parse_address(node: roxmltree::Node<'_, '_>) -> Result<AddressRecord, MalformedDataError> {
    let number = get_text(node, "Number");
    let street = get_text(node, "Street");
    let city = get_text(node, "City");
    let state = get_text(node, "State");
    let zip = get_text(node, "Zip");
    AddressRecord::new(
        number.as_deref(),
        street.as_deref(),
        city.as_deref(),
        state.as_deref(),
        zip.as_deref(),
        node.attribute("NearestAirport"),
    )
}

fn parse_hotel(node: roxmltree::Node<'_, '_>) -> Result<HotelRecord, MalformedDataError> {
    let name = get_text(node, "Name");
    let phones: Vec<String> = child_elements(node, "Phone").map(text_content).collect();
    let address = find_element(node, "Address")
        .ok_or_else(|| MalformedDataError::missing(RequiredField::Address))
        .and_then(parse_address);

    HotelRecord::new(
        name.as_deref(),
        phones.iter().map(String::as_str),
        address,
        node.attribute("Rating"),
    )
}

/// Loads a hotel collection and checks every record's required fields.
///
/// Records are the direct `<Hotel>` children of the `<Hotels>` root, in
/// document order. The first broken record aborts the whole load.
pub fn parse_hotels(xml: &str) -> Result<Vec<HotelRecord>, MappingError> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    if root.tag_name().name() != COLLECTION_ELEMENT {
        return Err(MalformedDataError::wrong_root(root.tag_name().name()).into());
    }

    let mut hotels = Vec::new();
    for (index, node) in child_elements(root, RECORD_ELEMENT).enumerate() {
        let hotel = parse_hotel(node).map_err(|e| e.in_record(index + 1))?;
        tracing::debug!(record = index + 1, name = %hotel.name, phones = hotel.phones.len(), "mapped hotel record");
        hotels.push(hotel);
    }
    Ok(hotels)
}

/// Builds `{"Hotels": {"Hotel": [...]}}` from already validated records.
pub fn build_object_graph(hotels: &[HotelRecord]) -> Value {
    let records: Vec<Value> = hotels.iter().map(Value::from).collect();
    Value::from(Object::new().with(
        COLLECTION_ELEMENT,
        Object::new().with(RECORD_ELEMENT, records),
    ))
}

/// Reads the source fully and projects it into the object graph.
pub fn to_object_graph(source: &DocumentSource) -> Result<Value, MappingError> {
    let xml = source.read_to_string()?;
    let hotels = parse_hotels(&xml)?;
    tracing::info!(
        source = %source.describe(),
        sha256 = %compute_sha256_hex(xml.as_bytes()),
        records = hotels.len(),
        "document mapped"
    );
    Ok(build_object_graph(&hotels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MalformedKind;

    const ADDRESS: &str = r#"<Address NearestAirport="PHX"><Number>1</Number><Street>Mill Ave</Street><City>Tempe</City><State>AZ</State><Zip>85281</Zip></Address>"#;

    fn hotels(body: &str) -> String {
        format!("<Hotels>{body}</Hotels>")
    }

    fn kind_of(xml: &str) -> Option<MalformedKind> {
        parse_hotels(xml).unwrap_err().malformed_kind()
    }

    #[test]
    fn wrong_root_is_rejected() {
        let xml = format!("<Catalog><Hotel><Name>A</Name><Phone>1</Phone>{ADDRESS}</Hotel></Catalog>");
        assert_eq!(kind_of(&xml), Some(MalformedKind::WrongRoot));
    }

    #[test]
    fn missing_name_is_reported() {
        let xml = hotels(&format!("<Hotel><Phone>1</Phone>{ADDRESS}</Hotel>"));
        assert_eq!(
            kind_of(&xml),
            Some(MalformedKind::MissingRequiredElement(RequiredField::Name))
        );
    }

    #[test]
    fn blank_phones_count_as_missing() {
        let xml = hotels(&format!("<Hotel><Name>A</Name><Phone> </Phone><Phone/>{ADDRESS}</Hotel>"));
        assert_eq!(
            kind_of(&xml),
            Some(MalformedKind::MissingRequiredElement(RequiredField::Phone))
        );
    }

    #[test]
    fn phone_is_checked_before_address() {
        let xml = hotels("<Hotel><Name>A</Name></Hotel>");
        assert_eq!(
            kind_of(&xml),
            Some(MalformedKind::MissingRequiredElement(RequiredField::Phone))
        );
    }

    #[test]
    fn missing_address_is_reported() {
        let xml = hotels("<Hotel><Name>A</Name><Phone>1</Phone></Hotel>");
        assert_eq!(
            kind_of(&xml),
            Some(MalformedKind::MissingRequiredElement(RequiredField::Address))
        );
    }

    #[test]
    fn address_without_zip_is_incomplete() {
        let xml = hotels(
            r#"<Hotel><Name>A</Name><Phone>1</Phone><Address NearestAirport="PHX"><Number>1</Number><Street>S</Street><City>C</City><State>AZ</State></Address></Hotel>"#,
        );
        assert_eq!(kind_of(&xml), Some(MalformedKind::IncompleteAddress));
    }

    #[test]
    fn error_message_names_the_record() {
        let xml = hotels(&format!(
            "<Hotel><Name>A</Name><Phone>1</Phone>{ADDRESS}</Hotel><Hotel><Phone>2</Phone>{ADDRESS}</Hotel>"
        ));
        let err = parse_hotels(&xml).unwrap_err();
        assert_eq!(err.to_string(), "Hotel #2: Hotel missing <Name>.");
    }

    #[test]
    fn doctype_is_not_accepted() {
        let xml = r#"<!DOCTYPE Hotels [<!ENTITY x "y">]><Hotels/>"#;
        assert!(matches!(parse_hotels(xml), Err(MappingError::Xml(_))));
    }

    #[test]
    fn empty_collection_still_has_hotel_key() {
        let graph = build_object_graph(&parse_hotels("<Hotels/>").unwrap());
        assert_eq!(
            serde_json::to_string(&graph).unwrap(),
            r#"{"Hotels":{"Hotel":[]}}"#
        );
    }

    #[test]
    fn non_record_children_are_ignored() {
        let xml = hotels(&format!(
            "<Note>skip</Note><Hotel><Name>A</Name><Phone>1</Phone>{ADDRESS}</Hotel>"
        ));
        assert_eq!(parse_hotels(&xml).unwrap().len(), 1);
    }
}
