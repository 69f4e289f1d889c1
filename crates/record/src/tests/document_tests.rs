use crate::*;

fn ext(kind: RecordKind, value: u16) -> Record {
    Record::new(kind, 0, value.to_be_bytes().to_vec(), None)
}

fn sample() -> Document {
    let mut doc = Document::new(HexFormat::I32Hex);
    doc.push(ext(RecordKind::ExtensionLinear, 0x0001));
    doc.push(Record::data(0x0010, vec![1, 2, 3], Some(0)));
    doc.push(ext(RecordKind::ExtensionLinear, 0x0003));
    doc.push(Record::data(0x0000, vec![4, 5], Some(2)));
    doc.push(Record::end_of_file());
    doc
}

#[test]
fn absolute_address_uses_linked_extension() {
    let doc = sample();
    assert_eq!(doc.absolute_address(&doc.records()[1]), Ok(0x1_0010));
    assert_eq!(doc.absolute_address(&doc.records()[3]), Ok(0x3_0000));
}

#[test]
fn absolute_address_without_extension_is_local() {
    let doc = Document::default();
    let r = Record::data(0x1234, vec![0], None);
    assert_eq!(doc.absolute_address(&r), Ok(0x1234));
}

#[test]
fn dangling_link_is_an_error() {
    let doc = sample();
    let r = Record::data(0, vec![0], Some(1)); // position 1 is a data record
    assert_eq!(doc.absolute_address(&r), Err(AddressError::DanglingExtension(1)));
    let r = Record::data(0, vec![0], Some(99));
    assert_eq!(doc.absolute_address(&r), Err(AddressError::DanglingExtension(99)));
}

#[test]
fn malformed_extension_is_an_error_not_an_address() {
    let mut doc = Document::new(HexFormat::I16Hex);
    doc.push(Record::new(RecordKind::ExtensionSegment, 0, vec![0xFF; 8], None));
    doc.push(Record::data(0x0010, vec![1, 2, 3, 4], Some(0)));
    assert_eq!(
        doc.absolute_address(&doc.records()[1]),
        Err(AddressError::MalformedExtension {
            kind: RecordKind::ExtensionSegment,
            len: 8
        })
    );
    assert!(!doc.contains(&doc.records()[1], 0x10));
}

#[test]
fn insert_shifts_links_past_insertion_point() {
    let mut doc = sample();
    doc.insert(1, Record::data(0x0000, vec![9], Some(0)));
    assert_eq!(doc.records()[2].extension, Some(0));
    assert_eq!(doc.records()[4].extension, Some(3));
    assert_eq!(doc.absolute_address(&doc.records()[4]), Ok(0x3_0000));
}

#[test]
fn insert_at_head_shifts_every_link() {
    let mut doc = sample();
    doc.insert(0, Record::data(0x0000, vec![9], None));
    assert_eq!(doc.records()[2].extension, Some(1));
    assert_eq!(doc.records()[4].extension, Some(3));
}

#[test]
fn insert_past_end_appends() {
    let mut doc = sample();
    let pos = doc.insert(100, Record::end_of_file());
    assert_eq!(pos, 5);
    assert_eq!(doc.len(), 6);
}

#[test]
fn relink_recomputes_from_order() {
    let mut doc = sample();
    for r in doc.records_mut().iter_mut() {
        r.extension = None;
    }
    doc.relink();
    let links: Vec<_> = doc.iter().map(|r| r.extension).collect();
    assert_eq!(links, vec![None, Some(0), Some(0), Some(2), Some(2)]);
}

#[test]
fn extension_before_scans_backwards() {
    let doc = sample();
    assert_eq!(doc.extension_before(0), None);
    assert_eq!(doc.extension_before(2), Some(0));
    assert_eq!(doc.extension_before(5), Some(2));
}

#[test]
fn contains_checks_data_coverage() {
    let doc = sample();
    let r = &doc.records()[1];
    assert!(doc.contains(r, 0x1_0010));
    assert!(doc.contains(r, 0x1_0012));
    assert!(!doc.contains(r, 0x1_0013));
    assert!(!doc.contains(&doc.records()[0], 0x1_0000));
}

#[test]
fn first_extension_kind_and_data_positions() {
    let doc = sample();
    assert_eq!(doc.first_extension_kind(), Some(RecordKind::ExtensionLinear));
    assert_eq!(doc.data_positions().collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(Document::default().first_extension_kind(), None);
}

#[test]
fn extension_offset_covers_both_kinds_of_record() {
    let doc = sample();
    assert_eq!(doc.extension_offset(0), Ok(0x1_0000));
    assert_eq!(doc.extension_offset(1), Ok(0x1_0000));
    assert_eq!(doc.extension_offset(3), Ok(0x3_0000));
    assert_eq!(doc.extension_offset(4), Ok(0));
    assert_eq!(doc.extension_offset(9), Err(AddressError::DanglingExtension(9)));
}
