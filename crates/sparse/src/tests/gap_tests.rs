use super::*;
use crate::*;
use anyhow::Result;
use record::AddressError;

/// The index kept by gap filling must match a fresh build.
fn assert_in_step(index: &SparseIndex, doc: &Document) -> Result<()> {
    assert_eq!(index, &SparseIndex::build(doc)?);
    Ok(())
}

/// Links must be what a re-parse of the serialized order would assign.
fn assert_links_follow_order(doc: &Document) {
    let mut relinked = doc.clone();
    relinked.relink();
    assert_eq!(&relinked, doc);
}

fn absolute_starts(doc: &Document) -> Result<Vec<u64>> {
    let mut starts = Vec::new();
    for r in doc.iter().filter(|r| r.is_data()) {
        starts.push(doc.absolute_address(r)?);
    }
    Ok(starts)
}

// -------------------- locate_gap --------------------

#[test]
fn locate_gap_is_none_inside_a_record() -> Result<()> {
    let index = SparseIndex::build(&contiguous())?;
    assert_eq!(index.locate_gap(0x00), None);
    assert_eq!(index.locate_gap(0x13), None);
    assert_eq!(index.locate_gap(0x1F), None);
    Ok(())
}

#[test]
fn locate_gap_between_records() -> Result<()> {
    let index = SparseIndex::build(&split())?;
    let gap = index.locate_gap(0x1_0025).expect("gap");
    assert_eq!(gap.lower.map(|e| (e.position, e.end)), Some((1, 0x1_001F)));
    assert_eq!(gap.upper.map(|e| (e.position, e.start)), Some((2, 0x1_0040)));
    assert_eq!(gap.size, Some(0x1B));
    Ok(())
}

#[test]
fn locate_gap_before_first_record() -> Result<()> {
    let index = SparseIndex::build(&split())?;
    let gap = index.locate_gap(0x100).expect("gap");
    assert_eq!(gap.lower, None);
    assert_eq!(gap.upper.map(|e| e.position), Some(1));
    assert_eq!(gap.size, Some(0x1_0010 - 0x100));
    Ok(())
}

#[test]
fn locate_gap_after_last_record_is_unbounded() -> Result<()> {
    let index = SparseIndex::build(&split())?;
    let gap = index.locate_gap(0x1_0050).expect("gap");
    assert_eq!(gap.lower.map(|e| e.position), Some(2));
    assert_eq!(gap.upper, None);
    assert_eq!(gap.size, None);
    Ok(())
}

#[test]
fn locate_gap_with_overlap_takes_furthest_reaching_lower() -> Result<()> {
    let mut doc = Document::default();
    doc.push(filled(0x0000, 0x20, None));
    doc.push(filled(0x0008, 4, None));
    doc.push(filled(0x0040, 4, None));
    let index = SparseIndex::build(&doc)?;
    let gap = index.locate_gap(0x30).expect("gap");
    assert_eq!(gap.lower.map(|e| e.position), Some(0));
    assert_eq!(gap.size, Some(0x10));
    Ok(())
}

// -------------------- Reusing extensions --------------------

#[test]
fn fill_after_lower_uses_its_extension() -> Result<()> {
    let mut doc = contiguous();
    let mut index = SparseIndex::build(&doc)?;

    let n = index.insert_into_gap(&mut doc, 0x21, &[0xAA, 0xBB, 0xCC], 0, 32)?;
    assert_eq!(n, 3);
    assert_eq!(doc.len(), 7);
    let r = &doc.records()[5];
    assert_eq!((r.address, r.extension), (0x21, Some(0)));
    assert_eq!(r.payload, vec![0xAA, 0xBB, 0xCC]);
    assert!(r.is_metadata_valid());
    assert_eq!(doc.records()[6].kind, RecordKind::EndOfFile);
    assert_in_step(&index, &doc)?;
    Ok(())
}

#[test]
fn fill_stops_at_upper_and_splits_chunks() -> Result<()> {
    let mut doc = split();
    let mut index = SparseIndex::build(&doc)?;

    let n = index.insert_into_gap(&mut doc, 0x1_0020, &[0x5A; 64], 0, 16)?;
    assert_eq!(n, 0x20);
    assert_eq!(
        absolute_starts(&doc)?,
        vec![0x1_0010, 0x1_0020, 0x1_0030, 0x1_0040]
    );
    assert!(doc.iter().filter(|r| r.is_data()).all(|r| r.len() == 16));
    assert_in_step(&index, &doc)?;
    assert_links_follow_order(&doc);
    Ok(())
}

#[test]
fn fill_reads_source_from_offset() -> Result<()> {
    let mut doc = contiguous();
    let mut index = SparseIndex::build(&doc)?;
    let n = index.insert_into_gap(&mut doc, 0x40, &[1, 2, 3, 4, 5], 3, 32)?;
    assert_eq!(n, 2);
    assert_eq!(doc.records()[5].payload, vec![4, 5]);

    let n = index.insert_into_gap(&mut doc, 0x80, &[1, 2], 9, 32)?;
    assert_eq!(n, 0);
    Ok(())
}

#[test]
fn fill_before_first_record_uses_upper_extension() -> Result<()> {
    let mut doc = split();
    let mut index = SparseIndex::build(&doc)?;

    let n = index.insert_into_gap(&mut doc, 0x1_0000, &[7; 8], 0, 32)?;
    assert_eq!(n, 8);
    let r = &doc.records()[1];
    assert_eq!((r.address, r.extension), (0x0000, Some(0)));
    assert_eq!(
        absolute_starts(&doc)?,
        vec![0x1_0000, 0x1_0010, 0x1_0040]
    );
    assert_in_step(&index, &doc)?;
    Ok(())
}

#[test]
fn fill_low_address_without_lower_goes_to_head() -> Result<()> {
    let mut doc = Document::default();
    doc.push(filled(0x0100, 4, None));
    let mut index = SparseIndex::build(&doc)?;

    index.insert_into_gap(&mut doc, 0x10, &[9; 4], 0, 32)?;
    let r = &doc.records()[0];
    assert_eq!((r.address, r.extension), (0x10, None));
    assert_eq!(doc.len(), 2);
    assert_in_step(&index, &doc)?;
    Ok(())
}

// -------------------- Synthesizing extensions --------------------

#[test]
fn fill_beyond_window_synthesizes_extension() -> Result<()> {
    let mut doc = contiguous();
    let mut index = SparseIndex::build(&doc)?;

    index.insert_into_gap(&mut doc, 0x1_0000, &[1; 16], 0, 32)?;
    let ext = &doc.records()[5];
    assert_eq!(ext.kind, RecordKind::ExtensionLinear);
    assert_eq!(ext.payload, vec![0x00, 0x01]);
    assert_eq!(ext.extension, Some(0));
    let r = &doc.records()[6];
    assert_eq!((r.address, r.extension), (0x0000, Some(5)));
    assert_eq!(doc.records()[7].kind, RecordKind::EndOfFile);
    assert_in_step(&index, &doc)?;
    assert_links_follow_order(&doc);
    Ok(())
}

#[test]
fn chunk_never_crosses_extension_window() -> Result<()> {
    let mut doc = contiguous();
    let mut index = SparseIndex::build(&doc)?;

    let n = index.insert_into_gap(&mut doc, 0xFFF0, &[3; 0x20], 0, 32)?;
    assert_eq!(n, 0x20);
    assert_eq!(doc.len(), 9);
    assert_eq!(
        absolute_starts(&doc)?,
        vec![0x00, 0x08, 0x10, 0x18, 0xFFF0, 0x1_0000]
    );
    assert_eq!(doc.records()[5].len(), 16);
    assert_eq!(doc.records()[6].kind, RecordKind::ExtensionLinear);
    assert_in_step(&index, &doc)?;
    Ok(())
}

#[test]
fn eight_bit_document_is_upgraded_to_linear() -> Result<()> {
    let mut doc = Document::new(HexFormat::I8Hex);
    doc.push(filled(0x0000, 4, None));
    let mut index = SparseIndex::build(&doc)?;

    index.insert_into_gap(&mut doc, 0x2_0000, &[1; 4], 0, 32)?;
    assert_eq!(doc.format(), HexFormat::I32Hex);
    assert_eq!(doc.records()[1].kind, RecordKind::ExtensionLinear);
    assert_eq!(doc.records()[1].payload, vec![0x00, 0x02]);
    Ok(())
}

#[test]
fn sixteen_bit_document_synthesizes_segment() -> Result<()> {
    let mut doc = Document::new(HexFormat::I16Hex);
    doc.push(filled(0x0000, 4, None));
    let mut index = SparseIndex::build(&doc)?;

    index.insert_into_gap(&mut doc, 0x1_2345, &[1, 2], 0, 32)?;
    let ext = &doc.records()[1];
    assert_eq!(ext.kind, RecordKind::ExtensionSegment);
    assert_eq!(ext.payload, vec![0x12, 0x34]);
    assert_eq!(doc.records()[2].address, 0x0005);
    assert_eq!(doc.format(), HexFormat::I16Hex);
    assert_eq!(absolute_starts(&doc)?, vec![0x0, 0x1_2345]);
    Ok(())
}

#[test]
fn existing_extension_kind_wins_over_format() -> Result<()> {
    let mut doc = Document::new(HexFormat::I32Hex);
    doc.push(Record::new(RecordKind::ExtensionSegment, 0, vec![0, 0], None));
    doc.push(filled(0x0000, 4, Some(0)));
    let mut index = SparseIndex::build(&doc)?;

    index.insert_into_gap(&mut doc, 0x5_0000, &[1], 0, 32)?;
    assert_eq!(doc.records()[2].kind, RecordKind::ExtensionSegment);
    assert_eq!(doc.records()[2].payload, vec![0x50, 0x00]);
    Ok(())
}

// -------------------- Re-anchoring --------------------

#[test]
fn reanchor_restores_previous_extension() -> Result<()> {
    let mut doc = Document::new(HexFormat::I32Hex);
    doc.push(linear(0));
    doc.push(filled(0xFFF0, 16, None));
    doc.push(filled(0x0000, 4, None));
    doc.push(Record::end_of_file());
    doc.relink();
    let mut index = SparseIndex::build(&doc)?;

    index.insert_into_gap(&mut doc, 0x1_0000, &[1, 2, 3, 4], 0, 32)?;

    let kinds: Vec<_> = doc.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RecordKind::ExtensionLinear,
            RecordKind::Data,
            RecordKind::ExtensionLinear,
            RecordKind::Data,
            RecordKind::ExtensionLinear,
            RecordKind::Data,
            RecordKind::EndOfFile,
        ]
    );
    assert_eq!(doc.records()[4].payload, vec![0x00, 0x00]);
    assert_eq!(absolute_starts(&doc)?, vec![0xFFF0, 0x1_0000, 0x0000]);
    assert_links_follow_order(&doc);
    assert_in_step(&index, &doc)?;
    Ok(())
}

#[test]
fn reanchor_without_previous_extension_uses_zero_offset() -> Result<()> {
    let mut doc = Document::new(HexFormat::I32Hex);
    doc.push(filled(0xFFF0, 16, None));
    doc.push(filled(0x0000, 4, None));
    doc.push(Record::end_of_file());
    let mut index = SparseIndex::build(&doc)?;

    index.insert_into_gap(&mut doc, 0x1_0000, &[1, 2], 0, 32)?;

    assert_eq!(doc.len(), 6);
    let anchor = &doc.records()[3];
    assert_eq!(anchor.kind, RecordKind::ExtensionLinear);
    assert_eq!(anchor.payload, vec![0x00, 0x00]);
    assert_eq!(absolute_starts(&doc)?, vec![0xFFF0, 0x1_0000, 0x0000]);
    assert_links_follow_order(&doc);
    assert_in_step(&index, &doc)?;
    Ok(())
}

// -------------------- Errors --------------------

#[test]
fn fill_on_covered_address_is_rejected() -> Result<()> {
    let mut doc = contiguous();
    let mut index = SparseIndex::build(&doc)?;
    assert_eq!(
        index.insert_into_gap(&mut doc, 0x04, &[1], 0, 32),
        Err(IndexError::NotAGap(0x04))
    );
    assert_eq!(doc, contiguous());
    Ok(())
}

#[test]
fn unrepresentable_segment_offset_is_out_of_range() -> Result<()> {
    let mut doc = Document::new(HexFormat::I16Hex);
    doc.push(Record::new(RecordKind::ExtensionSegment, 0, vec![0, 0], None));
    doc.push(filled(0x0000, 4, Some(0)));
    let mut index = SparseIndex::build(&doc)?;

    assert_eq!(
        index.insert_into_gap(&mut doc, 0x20_0000, &[1], 0, 32),
        Err(IndexError::Address(AddressError::AddressOutOfRange {
            kind: RecordKind::ExtensionSegment,
            address: 0x20_0000,
        }))
    );
    Ok(())
}

#[test]
fn stale_index_is_reported() -> Result<()> {
    let mut doc = contiguous();
    let mut index = SparseIndex::build(&doc)?;
    doc.records_mut().truncate(1);
    assert_eq!(
        index.insert_into_gap(&mut doc, 0x21, &[1], 0, 32),
        Err(IndexError::StalePosition(4))
    );
    Ok(())
}

#[test]
fn zero_record_len_places_nothing() -> Result<()> {
    let mut doc = contiguous();
    let mut index = SparseIndex::build(&doc)?;
    assert_eq!(index.insert_into_gap(&mut doc, 0x40, &[1, 2], 0, 0)?, 0);
    assert_eq!(doc, contiguous());
    Ok(())
}
