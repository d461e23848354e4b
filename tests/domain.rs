use ocean_sync::domain::{BoundingBox, RawPayload, SourceTag, classify_filename};

#[test]
fn classification_by_name() {
    assert_eq!(classify_filename("noaa_sst_20261014_20261016.csv"), Some(SourceTag::Noaa));
    assert_eq!(classify_filename("JPL_MUR.csv"), Some(SourceTag::Noaa));
    assert_eq!(classify_filename("copernicus_sst_20261016.csv"), Some(SourceTag::Copernicus));
    assert_eq!(classify_filename("argo_bio_profile_index.txt"), Some(SourceTag::Argo));
    assert_eq!(classify_filename("ghcnd_stations.txt"), Some(SourceTag::Ncei));
    assert_eq!(classify_filename("stations.txt"), Some(SourceTag::Ncei));
    assert_eq!(classify_filename("readme.txt"), None);
}

#[test]
fn ambiguous_names_follow_priority() {
    assert_eq!(classify_filename("noaa_copernicus.csv"), Some(SourceTag::Noaa));
    assert_eq!(classify_filename("jpl_argo.csv"), Some(SourceTag::Noaa));
    assert_eq!(classify_filename("copernicus_argo.csv"), Some(SourceTag::Copernicus));
    assert_eq!(classify_filename("argo_stations.txt"), Some(SourceTag::Argo));
}

#[test]
fn payload_carries_its_classification() {
    let payload = RawPayload::from_path("/tmp/raw/argo_bio_profile_index.txt");
    assert_eq!(payload.source(), Some(SourceTag::Argo));
    assert_eq!(payload.file_name(), "argo_bio_profile_index.txt");
    assert_eq!(payload.stem(), "argo_bio_profile_index");

    assert_eq!(RawPayload::from_path("/tmp/raw/notes.md").source(), None);
}

#[test]
fn source_tags_parse_and_print() {
    for source in SourceTag::ALL {
        assert_eq!(source.as_str().parse::<SourceTag>().unwrap(), source);
        assert_eq!(source.to_string(), source.as_str());
    }
    assert!("ghcn".parse::<SourceTag>().is_err());
    assert_eq!(SourceTag::Ncei.label(), "NCEI");
}

#[test]
fn region_must_be_ordered_and_in_range() {
    assert!(BoundingBox::default().validate().is_ok());
    let flipped = BoundingBox {
        lat_min: 35.0,
        lat_max: 32.0,
        ..BoundingBox::default()
    };
    assert!(flipped.validate().is_err());
    let off_globe = BoundingBox {
        lon_max: 190.0,
        ..BoundingBox::default()
    };
    assert!(off_globe.validate().is_err());
}
