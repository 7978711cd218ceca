//! End-to-end properties: payloads built, canonicalized, text-encoded and
//! read back across module boundaries.

use toncast_core::{
    boc, dict, message, snake, Address, CellBuilder, ContentDict, DeepLink, Error,
    Metadata, StateInit,
};

fn owner() -> Address {
    Address::parse("EQCQMcvQkJaukQkocQUG2dnTAk-s2_WzAx8JOnxI7LKDKdm8").unwrap()
}

#[test]
fn snake_round_trip_across_boc() {
    // Chain through full container serialization, not just the tree.
    for len in [0usize, 1, 127, 128, 254, 255, 1000] {
        let data: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
        let cell = snake::write_bytes(&data).unwrap();
        let bytes = boc::serialize(&cell).unwrap();
        let parsed = boc::parse(&bytes).unwrap();
        assert_eq!(snake::read_bytes(&parsed).unwrap(), data, "len {len}");
    }
}

#[test]
fn dictionary_is_insertion_order_independent_through_boc() {
    let mut a = ContentDict::new();
    a.put_str("name", "TonCAST").unwrap();
    a.put_str("image", "https://example.org/i.png").unwrap();
    a.put_str("description", "stake NFT").unwrap();

    let mut b = ContentDict::new();
    b.put_str("description", "stake NFT").unwrap();
    b.put_str("name", "TonCAST").unwrap();
    b.put_str("image", "https://example.org/i.png").unwrap();

    assert_eq!(
        boc::serialize(&a.serialize().unwrap()).unwrap(),
        boc::serialize(&b.serialize().unwrap()).unwrap()
    );
}

#[test]
fn shared_cell_keeps_one_index_through_round_trip() {
    let shared = CellBuilder::new().store_bytes(b"code").unwrap().build_ref();
    let root = CellBuilder::new()
        .store_ref(shared.clone())
        .unwrap()
        .store_ref(shared)
        .unwrap()
        .build_ref();

    let bytes = boc::serialize(&root).unwrap();
    let parsed = boc::parse(&bytes).unwrap();
    assert_eq!(parsed.refs().len(), 2);
    assert!(std::sync::Arc::ptr_eq(&parsed.refs()[0], &parsed.refs()[1]));

    // Distinct-but-equal cells stay distinct entries, so the shared form
    // is strictly smaller.
    let dup_root = CellBuilder::new()
        .store_ref(CellBuilder::new().store_bytes(b"code").unwrap().build_ref())
        .unwrap()
        .store_ref(CellBuilder::new().store_bytes(b"code").unwrap().build_ref())
        .unwrap()
        .build_ref();
    assert!(bytes.len() < boc::serialize(&dup_root).unwrap().len());
}

#[test]
fn empty_cell_vector_matches_reference() {
    let bytes = boc::serialize_with(&CellBuilder::new().build_ref(), false).unwrap();
    assert_eq!(hex::encode(bytes), "b5ee9c72010101010002000000");
}

#[test]
fn transfer_link_end_to_end() {
    let body = message::transfer_body(0, None, None, 0, None).unwrap();
    let url = DeepLink::new(owner(), 50_000_000)
        .with_body(body)
        .to_url()
        .unwrap();

    assert!(url.starts_with("ton://transfer/"));
    assert!(url.contains("amount=50000000"));
    let bin = url.split_once("&bin=").unwrap().1;
    assert!(!bin.is_empty());
    assert!(!bin.contains('+') && !bin.contains('/') && !bin.contains('='));
}

#[test]
fn mint_link_carries_parsable_content() {
    let metadata = Metadata {
        name: Some("Test #0".into()),
        ..Default::default()
    };
    let body = message::mint_body(
        0,
        0,
        20_000_000,
        &owner(),
        metadata.to_cell().unwrap(),
    )
    .unwrap();

    let url = DeepLink::new(owner(), 100_000_000)
        .with_body(body.clone())
        .to_url()
        .unwrap();
    assert!(url.contains("&bin="));

    // Round-trip the body and dig out the dictionary keys again.
    let parsed = boc::parse(&boc::serialize(&body).unwrap()).unwrap();
    let init = &parsed.refs()[0];
    let content = &init.refs()[0];
    assert_eq!(
        dict::keys(content).unwrap(),
        vec![ContentDict::key_hash("name")]
    );
}

#[test]
fn mint_rejects_out_of_range_index() {
    let content = Metadata::default().to_cell().unwrap();
    let err = message::mint_body(0, 1u128 << 64, 0, &owner(), content).unwrap_err();
    assert!(matches!(err, Error::FieldOutOfRange { .. }));
}

#[test]
fn deploy_link_carries_state_init() {
    let codes = message::NftCodes {
        collection: CellBuilder::new().store_bytes(b"collection code").unwrap().build_ref(),
        item: CellBuilder::new().store_bytes(b"item code").unwrap().build_ref(),
    };
    let metadata = Metadata {
        name: Some("TonCAST Stake NFTs OnChain".into()),
        description: Some("Proof-of-stake NFTs".into()),
        social_links: vec!["https://test.toncast.me/".into()],
        ..Default::default()
    };
    let data = message::collection_data(&owner(), &metadata, codes.item).unwrap();
    let init = StateInit::new(codes.collection, data);
    let address = message::contract_address(0, &init).unwrap();

    let url = DeepLink::new(address, 100_000_000)
        .with_state_init(init.to_cell().unwrap())
        .to_url()
        .unwrap();
    assert!(url.starts_with("ton://transfer/"));
    assert!(url.contains("&init="));
    assert!(!url.contains("&bin="));
}

#[test]
fn change_owner_link_end_to_end() {
    let body = message::change_owner_body(0, &owner()).unwrap();
    let url = DeepLink::new(owner(), 50_000_000)
        .with_body(body)
        .to_url()
        .unwrap();
    assert!(url.contains("&bin="));
}

#[test]
fn deploy_address_depends_on_metadata() {
    let item = CellBuilder::new().store_bytes(b"item").unwrap().build_ref();
    let coll = CellBuilder::new().store_bytes(b"coll").unwrap().build_ref();

    let named = Metadata {
        name: Some("A".into()),
        ..Default::default()
    };
    let renamed = Metadata {
        name: Some("B".into()),
        ..Default::default()
    };

    let a = message::contract_address(
        0,
        &StateInit::new(
            coll.clone(),
            message::collection_data(&owner(), &named, item.clone()).unwrap(),
        ),
    )
    .unwrap();
    let b = message::contract_address(
        0,
        &StateInit::new(
            coll,
            message::collection_data(&owner(), &renamed, item).unwrap(),
        ),
    )
    .unwrap();
    assert_ne!(a, b);
}
